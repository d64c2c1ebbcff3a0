// Copyright 2025 Cowboy AI, LLC.

//! Schema versioning: tracks the shape each holon type's properties must
//! conform to, and which version is currently active.

use crate::errors::{DomainError, DomainResult};
use crate::holon::HolonType;
use crate::ids::SchemaVersionId;
use crate::relationship::RelationshipType;
use chrono::{DateTime, Utc};
use schemars::schema::RootSchema;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

/// The shape of a holon type as of a particular schema version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HolonTypeDefinition {
    /// The holon type being defined.
    pub holon_type: HolonType,
    /// Display description of the type.
    pub description: String,
    /// Property names this type declares.
    pub property_names: HashSet<String>,
    /// The schema version string this definition was introduced in.
    pub introduced_in_version: String,
}

/// The shape of a relationship type as of a particular schema version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipTypeDefinition {
    /// The relationship type being defined.
    pub relationship_type: RelationshipType,
    /// Display description of the type.
    pub description: String,
    /// Property names this type declares.
    pub property_names: HashSet<String>,
    /// The schema version string this definition was introduced in.
    pub introduced_in_version: String,
}

/// Whether a proposed definition collides with an existing one, and why.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollisionReport {
    /// `true` if a same-named type with a different property set already
    /// exists.
    pub collides: bool,
    /// Human-readable explanation, present iff `collides`.
    pub detail: Option<String>,
}

/// Compare a proposed holon type definition's property set against an
/// existing definition with the same name; a mismatch is a collision.
pub fn detect_holon_type_collision(
    proposed: &HolonTypeDefinition,
    existing: &HolonTypeDefinition,
) -> CollisionReport {
    if proposed.holon_type != existing.holon_type {
        return CollisionReport {
            collides: false,
            detail: None,
        };
    }
    if proposed.property_names == existing.property_names {
        return CollisionReport {
            collides: false,
            detail: None,
        };
    }
    CollisionReport {
        collides: true,
        detail: Some(format!(
            "holon type {:?} already defined with a different property set (introduced in {})",
            existing.holon_type, existing.introduced_in_version
        )),
    }
}

/// Lifecycle stage of a schema version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaStatus {
    /// Proposed but not yet approved for use.
    Draft,
    /// The version holons of this type are currently validated against.
    Active,
    /// Superseded by a newer active version; existing holons may still
    /// reference it until migrated.
    Deprecated,
}

/// A recorded shape for a holon type's properties at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaVersionRecord {
    /// Unique identifier.
    pub id: SchemaVersionId,
    /// The holon type this schema governs.
    pub holon_type: HolonType,
    /// Monotonically increasing version number within `holon_type`.
    pub version: u32,
    /// JSON Schema describing the expected properties shape.
    pub shape: RootSchema,
    /// Lifecycle stage.
    pub status: SchemaStatus,
    /// When this version was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// In-memory registry of schema versions, one active version per type.
#[derive(Default)]
pub struct SchemaRegistry {
    inner: RwLock<SchemaInner>,
}

#[derive(Default)]
struct SchemaInner {
    versions: HashMap<SchemaVersionId, SchemaVersionRecord>,
    by_type: HashMap<HolonType, Vec<SchemaVersionId>>,
    active: HashMap<HolonType, SchemaVersionId>,
}

impl SchemaRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new draft version. The first version registered for a
    /// type is activated automatically; later ones stay `Draft` until
    /// [`SchemaRegistry::activate`] is called, typically after governance
    /// approval.
    pub fn register(&self, mut record: SchemaVersionRecord) -> SchemaVersionId {
        let mut inner = self.inner.write().expect("schema registry poisoned");
        let is_first = !inner.by_type.contains_key(&record.holon_type);
        if is_first {
            record.status = SchemaStatus::Active;
        }
        let id = record.id;
        inner.by_type.entry(record.holon_type).or_default().push(id);
        if is_first {
            inner.active.insert(record.holon_type, id);
        }
        inner.versions.insert(id, record);
        id
    }

    /// Promote a draft version to active, deprecating the previous active
    /// version for the same holon type.
    pub fn activate(&self, id: SchemaVersionId) -> DomainResult<()> {
        let mut inner = self.inner.write().expect("schema registry poisoned");
        let holon_type = inner
            .versions
            .get(&id)
            .ok_or_else(|| DomainError::NotFound {
                entity_type: "SchemaVersionRecord",
                id: id.to_string(),
            })?
            .holon_type;
        if let Some(previous) = inner.active.insert(holon_type, id) {
            if let Some(record) = inner.versions.get_mut(&previous) {
                record.status = SchemaStatus::Deprecated;
            }
        }
        if let Some(record) = inner.versions.get_mut(&id) {
            record.status = SchemaStatus::Active;
        }
        Ok(())
    }

    /// The currently active schema version for a holon type, if any has
    /// been registered.
    pub fn active_for(&self, holon_type: HolonType) -> Option<SchemaVersionRecord> {
        let inner = self.inner.read().expect("schema registry poisoned");
        inner
            .active
            .get(&holon_type)
            .and_then(|id| inner.versions.get(id))
            .cloned()
    }

    /// Fetch a specific version by id.
    pub fn get(&self, id: SchemaVersionId) -> DomainResult<SchemaVersionRecord> {
        self.inner
            .read()
            .expect("schema registry poisoned")
            .versions
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::NotFound {
                entity_type: "SchemaVersionRecord",
                id: id.to_string(),
            })
    }

    /// Every version ever registered for a holon type, oldest first.
    pub fn history_for(&self, holon_type: HolonType) -> Vec<SchemaVersionRecord> {
        let inner = self.inner.read().expect("schema registry poisoned");
        inner
            .by_type
            .get(&holon_type)
            .into_iter()
            .flatten()
            .filter_map(|id| inner.versions.get(id).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemars::schema_for;

    fn blank_shape() -> RootSchema {
        schema_for!(serde_json::Value)
    }

    fn record(holon_type: HolonType, version: u32) -> SchemaVersionRecord {
        SchemaVersionRecord {
            id: SchemaVersionId::new(),
            holon_type,
            version,
            shape: blank_shape(),
            status: SchemaStatus::Draft,
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn first_registration_is_activated_automatically() {
        let registry = SchemaRegistry::new();
        let id = registry.register(record(HolonType::Person, 1));
        let active = registry.active_for(HolonType::Person).unwrap();
        assert_eq!(active.id, id);
        assert_eq!(active.status, SchemaStatus::Active);
    }

    #[test]
    fn activating_new_version_deprecates_previous() {
        let registry = SchemaRegistry::new();
        let first = registry.register(record(HolonType::Task, 1));
        let second = registry.register(record(HolonType::Task, 2));
        registry.activate(second).unwrap();
        assert_eq!(registry.get(first).unwrap().status, SchemaStatus::Deprecated);
        assert_eq!(registry.active_for(HolonType::Task).unwrap().id, second);
    }

    #[test]
    fn history_lists_every_version() {
        let registry = SchemaRegistry::new();
        registry.register(record(HolonType::Mission, 1));
        registry.register(record(HolonType::Mission, 2));
        assert_eq!(registry.history_for(HolonType::Mission).len(), 2);
    }
}
