// Copyright 2025 Cowboy AI, LLC.

//! Holons: the nodes of the semantic graph.
//!
//! Each holon type carries its own property shape. A loosely-typed
//! `HashMap<String, Value>` would let a `Task` accept a `Position`'s
//! fields with no compile-time signal, so `HolonProperties` is a tagged
//! union instead, one variant per [`HolonType`].

use crate::errors::{DomainError, DomainResult};
use crate::ids::{DocumentId, EventId, HolonId};
use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// The closed set of holon kinds recorded in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HolonType {
    /// An individual.
    Person,
    /// A billet or seat an organization maintains, independent of who
    /// occupies it.
    Position,
    /// A unit, command, or administrative grouping.
    Organization,
    /// A credential or certification a Person can hold.
    Qualification,
    /// A mission the organization pursues.
    Mission,
    /// A capability a Mission requires.
    Capability,
    /// A physical or logical asset.
    Asset,
    /// A measurable goal.
    Objective,
    /// A line of effort grouping objectives under a sponsoring echelon.
    Loe,
    /// An initiative contributing to a line of effort.
    Initiative,
    /// A unit of work within an initiative.
    Task,
    /// A deployed system tracked as a holon in its own right.
    System,
}

/// Lifecycle status of a holon. Inactive and archived holons remain
/// queryable; they only fail activity predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HolonStatus {
    /// Normal, in-force state.
    Active,
    /// Deactivated, typically by a failed downstream validation rolling
    /// back a partially-constructed holon.
    Inactive,
    /// Retired from active use but retained for history.
    Archived,
}

/// Person category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PersonCategory {
    /// Active duty service member.
    ActiveDuty,
    /// Reserve component member.
    Reserve,
    /// Civilian employee.
    Civilian,
    /// Contracted personnel.
    Contractor,
}

/// Mission or exercise type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissionKind {
    /// A training exercise.
    Training,
    /// A real-world operation.
    RealWorld,
}

/// Initiative lifecycle stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitiativeStage {
    /// Proposed, not yet reviewed.
    Proposed,
    /// Reviewed and approved for planning.
    Approved,
    /// Plan complete, not yet started.
    Planned,
    /// Underway.
    Active,
    /// Temporarily paused.
    Paused,
    /// Finished.
    Completed,
    /// Abandoned.
    Cancelled,
}

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskPriority {
    /// Drop everything.
    Critical,
    /// Urgent but not a fire drill.
    High,
    /// Default priority.
    Medium,
    /// Nice to have.
    Low,
}

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Recorded, not yet assigned.
    Created,
    /// Handed to an owner.
    Assigned,
    /// Work underway.
    Started,
    /// Blocked on an unmet dependency.
    Blocked,
    /// Finished.
    Completed,
    /// Abandoned.
    Cancelled,
}

/// Per-type holon payload. The variant must match the owning holon's
/// [`HolonType`]; [`Holon::new`] enforces this at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum HolonProperties {
    /// [`HolonType::Person`] payload.
    Person {
        /// DoD Electronic Data Interchange Personal Identifier.
        edipi: String,
        /// Service-specific identifier numbers.
        service_numbers: Vec<String>,
        /// Display name.
        name: String,
        /// Date of birth.
        dob: DateTime<Utc>,
        /// Service branch.
        service_branch: String,
        /// Designator or rating code.
        designator_rating: String,
        /// Person category.
        category: PersonCategory,
    },
    /// [`HolonType::Position`] payload.
    Position {
        /// Display title of the billet.
        title: String,
        /// Organization the position belongs to.
        organization: HolonId,
    },
    /// [`HolonType::Organization`] payload.
    Organization {
        /// Display name.
        name: String,
        /// Organization type or echelon.
        org_type: String,
    },
    /// [`HolonType::Qualification`] payload.
    Qualification {
        /// NEC, PQS id, course code, or certification id; at least one
        /// identifier must be present.
        identifiers: Vec<String>,
        /// Display name of the credential.
        name: String,
        /// How long an award of this qualification remains valid.
        validity_period_days: i64,
        /// Whether the qualification can be renewed rather than reawarded.
        renewable: bool,
    },
    /// [`HolonType::Mission`] payload.
    Mission {
        /// Operation name.
        operation_name: String,
        /// Operation number.
        operation_number: String,
        /// Training or real-world.
        mission_type: MissionKind,
        /// Classification marking.
        classification: String,
        /// Planned or actual start.
        start: DateTime<Utc>,
        /// Planned or actual end, if known.
        end: Option<DateTime<Utc>>,
    },
    /// [`HolonType::Capability`] payload.
    Capability {
        /// Display name.
        name: String,
        /// Free-text description.
        description: String,
    },
    /// [`HolonType::Asset`] payload.
    Asset {
        /// Display name.
        name: String,
        /// Asset classification (e.g. "vehicle", "facility", "system").
        asset_type: String,
    },
    /// [`HolonType::Objective`] payload.
    Objective {
        /// Display name.
        name: String,
        /// Free-text description.
        description: String,
    },
    /// [`HolonType::Loe`] payload.
    Loe {
        /// Display name.
        name: String,
        /// Sponsoring echelon.
        sponsor: String,
    },
    /// [`HolonType::Initiative`] payload.
    Initiative {
        /// Display name.
        name: String,
        /// Scope statement.
        scope: String,
        /// Sponsoring individual or organization.
        sponsor: String,
        /// Current lifecycle stage.
        stage: InitiativeStage,
    },
    /// [`HolonType::Task`] payload.
    Task {
        /// Free-text description.
        description: String,
        /// Task type classification.
        task_type: String,
        /// Priority.
        priority: TaskPriority,
        /// Due date.
        due_date: DateTime<Utc>,
        /// Current status.
        status: TaskStatus,
    },
    /// [`HolonType::System`] payload.
    System {
        /// Display name.
        name: String,
        /// System type or platform.
        system_type: String,
    },
}

impl crate::state_machine::State for TaskStatus {
    fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }
}

impl crate::state_machine::State for InitiativeStage {
    fn is_terminal(&self) -> bool {
        matches!(self, InitiativeStage::Completed | InitiativeStage::Cancelled)
    }
}

impl HolonProperties {
    /// The [`HolonType`] this payload belongs to.
    pub fn holon_type(&self) -> HolonType {
        match self {
            HolonProperties::Person { .. } => HolonType::Person,
            HolonProperties::Position { .. } => HolonType::Position,
            HolonProperties::Organization { .. } => HolonType::Organization,
            HolonProperties::Qualification { .. } => HolonType::Qualification,
            HolonProperties::Mission { .. } => HolonType::Mission,
            HolonProperties::Capability { .. } => HolonType::Capability,
            HolonProperties::Asset { .. } => HolonType::Asset,
            HolonProperties::Objective { .. } => HolonType::Objective,
            HolonProperties::Loe { .. } => HolonType::Loe,
            HolonProperties::Initiative { .. } => HolonType::Initiative,
            HolonProperties::Task { .. } => HolonType::Task,
            HolonProperties::System { .. } => HolonType::System,
        }
    }
}

/// A node in the semantic graph: a typed entity with lifecycle status and
/// provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holon {
    /// Unique identifier.
    pub id: HolonId,
    /// Type-specific payload.
    pub properties: HolonProperties,
    /// When this holon was created.
    pub created_at: DateTime<Utc>,
    /// The event that created this holon.
    pub created_by: EventId,
    /// Lifecycle status.
    pub status: HolonStatus,
    /// Documents this holon is grounded in. Every holon must carry at
    /// least one.
    pub source_documents: Vec<DocumentId>,
}

impl Holon {
    /// Construct a new, active holon. Fails if `source_documents` is
    /// empty — every holon must be grounded in at least one document.
    pub fn new(
        properties: HolonProperties,
        created_by: EventId,
        source_documents: Vec<DocumentId>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if source_documents.is_empty() {
            return Err(DomainError::Validation(
                "holon must carry at least one source document".into(),
            ));
        }
        Ok(Self {
            id: HolonId::new(),
            properties,
            created_at: now,
            created_by,
            status: HolonStatus::Active,
            source_documents,
        })
    }

    /// The [`HolonType`] of this holon.
    pub fn holon_type(&self) -> HolonType {
        self.properties.holon_type()
    }

    /// `true` if this holon is active.
    pub fn is_active(&self) -> bool {
        matches!(self.status, HolonStatus::Active)
    }
}

/// In-memory store of holons indexed by id and by type.
#[derive(Default)]
pub struct HolonRegistry {
    inner: RwLock<HolonInner>,
}

#[derive(Default)]
struct HolonInner {
    by_id: HashMap<HolonId, Holon>,
    by_type: HashMap<HolonType, IndexSet<HolonId>>,
}

impl HolonRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new holon, returning it with its assigned id.
    pub fn create_holon(&self, holon: Holon) -> Holon {
        let mut inner = self.inner.write().expect("holon registry poisoned");
        let id = holon.id;
        inner
            .by_type
            .entry(holon.holon_type())
            .or_default()
            .insert(id);
        inner.by_id.insert(id, holon.clone());
        holon
    }

    /// Fetch a holon by id.
    pub fn get_holon(&self, id: HolonId) -> DomainResult<Holon> {
        let inner = self.inner.read().expect("holon registry poisoned");
        inner
            .by_id
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::holon_not_found(id))
    }

    /// `true` if a holon with this id has been recorded.
    pub fn exists(&self, id: HolonId) -> bool {
        self.inner
            .read()
            .expect("holon registry poisoned")
            .by_id
            .contains_key(&id)
    }

    /// Mark a holon inactive, recording `reason` for audit purposes. Used
    /// to roll back a holon whose downstream validation failed; this does
    /// not delete the holon.
    pub fn mark_holon_inactive(&self, id: HolonId, _reason: &str) -> DomainResult<()> {
        let mut inner = self.inner.write().expect("holon registry poisoned");
        let holon = inner
            .by_id
            .get_mut(&id)
            .ok_or_else(|| DomainError::holon_not_found(id))?;
        holon.status = HolonStatus::Inactive;
        Ok(())
    }

    /// Mark a previously inactivated holon active again.
    pub fn mark_holon_active(&self, id: HolonId) -> DomainResult<()> {
        let mut inner = self.inner.write().expect("holon registry poisoned");
        let holon = inner
            .by_id
            .get_mut(&id)
            .ok_or_else(|| DomainError::holon_not_found(id))?;
        holon.status = HolonStatus::Active;
        Ok(())
    }

    /// Replace a holon's type-specific payload in place, e.g. to advance
    /// a Task's status or an Initiative's stage. Rejects a payload whose
    /// [`HolonType`] does not match the existing holon.
    pub fn update_properties(&self, id: HolonId, properties: HolonProperties, _now: DateTime<Utc>) -> DomainResult<()> {
        let mut inner = self.inner.write().expect("holon registry poisoned");
        let holon = inner
            .by_id
            .get_mut(&id)
            .ok_or_else(|| DomainError::holon_not_found(id))?;
        if holon.holon_type() != properties.holon_type() {
            return Err(DomainError::Validation(format!(
                "cannot change holon {id} from {:?} to {:?}",
                holon.holon_type(),
                properties.holon_type()
            )));
        }
        holon.properties = properties;
        Ok(())
    }

    /// All holons of a given type.
    pub fn get_by_type(&self, holon_type: HolonType) -> Vec<Holon> {
        let inner = self.inner.read().expect("holon registry poisoned");
        inner
            .by_type
            .get(&holon_type)
            .into_iter()
            .flatten()
            .filter_map(|id| inner.by_id.get(id).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person_properties() -> HolonProperties {
        HolonProperties::Person {
            edipi: "1234567890".into(),
            service_numbers: vec![],
            name: "Ada Lovelace".into(),
            dob: Utc::now(),
            service_branch: "Navy".into(),
            designator_rating: "1810".into(),
            category: PersonCategory::ActiveDuty,
        }
    }

    #[test]
    fn new_rejects_holon_with_no_source_documents() {
        let result = Holon::new(person_properties(), EventId::new(), vec![], Utc::now());
        assert!(result.is_err());
    }

    #[test]
    fn create_and_get_roundtrip() {
        let registry = HolonRegistry::new();
        let holon = Holon::new(
            person_properties(),
            EventId::new(),
            vec![DocumentId::new()],
            Utc::now(),
        )
        .unwrap();
        let id = holon.id;
        registry.create_holon(holon);
        let fetched = registry.get_holon(id).unwrap();
        assert!(fetched.is_active());
    }

    #[test]
    fn get_missing_returns_not_found() {
        let registry = HolonRegistry::new();
        let result = registry.get_holon(HolonId::new());
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[test]
    fn mark_inactive_then_active_roundtrips() {
        let registry = HolonRegistry::new();
        let holon = Holon::new(
            person_properties(),
            EventId::new(),
            vec![DocumentId::new()],
            Utc::now(),
        )
        .unwrap();
        let id = holon.id;
        registry.create_holon(holon);
        registry.mark_holon_inactive(id, "downstream validation failed").unwrap();
        assert!(!registry.get_holon(id).unwrap().is_active());
        registry.mark_holon_active(id).unwrap();
        assert!(registry.get_holon(id).unwrap().is_active());
    }

    #[test]
    fn get_by_type_filters_correctly() {
        let registry = HolonRegistry::new();
        let person = Holon::new(
            person_properties(),
            EventId::new(),
            vec![DocumentId::new()],
            Utc::now(),
        )
        .unwrap();
        let person_id = person.id;
        registry.create_holon(person);
        let mission = Holon::new(
            HolonProperties::Mission {
                operation_name: "Steel Curtain".into(),
                operation_number: "OP-1".into(),
                mission_type: MissionKind::Training,
                classification: "UNCLASSIFIED".into(),
                start: Utc::now(),
                end: None,
            },
            EventId::new(),
            vec![DocumentId::new()],
            Utc::now(),
        )
        .unwrap();
        registry.create_holon(mission);
        let people = registry.get_by_type(HolonType::Person);
        assert_eq!(people.len(), 1);
        assert_eq!(people[0].id, person_id);
    }
}
