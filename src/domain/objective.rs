// Copyright 2025 Cowboy AI, LLC.

//! Objective and Line of Effort management: an Objective is grounded by
//! at least one measure, owned by exactly one holon, and grouped under
//! exactly one LOE. Measures are registration-only — the measure
//! calculation engine lives outside this core, so a measure reference is
//! any existing holon id.

use crate::errors::{DomainError, DomainResult};
use crate::event::{CausalLinks, Event, EventStore, EventType};
use crate::holon::HolonRegistry;
use crate::ids::{EventId, HolonId, RelationshipId};
use crate::relationship::{AuthorityLevel, Relationship, RelationshipFilter, RelationshipRegistry, RelationshipType};
use chrono::{DateTime, Utc};

/// Facade over Objective/LOE creation and linkage.
pub struct ObjectiveManager<'a> {
    holons: &'a HolonRegistry,
    relationships: &'a RelationshipRegistry,
    events: &'a EventStore,
}

impl<'a> ObjectiveManager<'a> {
    /// Bind a manager to its registries.
    pub fn new(
        holons: &'a HolonRegistry,
        relationships: &'a RelationshipRegistry,
        events: &'a EventStore,
    ) -> Self {
        Self {
            holons,
            relationships,
            events,
        }
    }

    /// Record that a Line of Effort holon was created.
    pub fn record_loe_created(&self, loe: HolonId, actor: HolonId, now: DateTime<Utc>) -> DomainResult<EventId> {
        let event = Event::new(
            EventType::LoeCreated,
            vec![loe],
            now,
            actor,
            serde_json::json!({}),
            CausalLinks::default(),
            now,
        )?;
        self.events.append(event)
    }

    /// Create an Objective, requiring at least one measure, exactly one
    /// owner, and exactly one LOE, all of which must reference existing
    /// holons. Creates the OWNED_BY and GROUPED_UNDER edges plus one
    /// MEASURED_BY edge per measure.
    pub fn create_objective(
        &self,
        objective: HolonId,
        measure_ids: Vec<HolonId>,
        owner: HolonId,
        loe: HolonId,
        actor: HolonId,
        now: DateTime<Utc>,
    ) -> DomainResult<EventId> {
        if measure_ids.is_empty() {
            return Err(DomainError::Validation(
                "objective requires at least one measure".into(),
            ));
        }
        if !self.holons.exists(owner) {
            return Err(DomainError::Validation(format!(
                "objective owner {owner} does not exist"
            )));
        }
        if !self.holons.exists(loe) {
            return Err(DomainError::Validation(format!(
                "objective LOE {loe} does not exist"
            )));
        }
        for measure in &measure_ids {
            if !self.holons.exists(*measure) {
                return Err(DomainError::Validation(format!(
                    "objective measure {measure} does not exist"
                )));
            }
        }
        if !self.holons.exists(objective) {
            return Err(DomainError::holon_not_found(objective));
        }

        let event = Event::new(
            EventType::ObjectiveCreated,
            vec![objective],
            now,
            actor,
            serde_json::json!({}),
            CausalLinks::default(),
            now,
        )?;
        let event_id = self.events.append(event)?;

        if let Err(err) = self
            .link(objective, owner, RelationshipType::OwnedBy, event_id, now)
            .and_then(|_| self.link(objective, loe, RelationshipType::GroupedUnder, event_id, now))
            .and_then(|_| {
                for measure in &measure_ids {
                    self.link(objective, *measure, RelationshipType::MeasuredBy, event_id, now)?;
                }
                Ok(())
            })
        {
            self.holons
                .mark_holon_inactive(objective, "objective edge creation failed")?;
            return Err(err);
        }
        Ok(event_id)
    }

    fn link(
        &self,
        source: HolonId,
        target: HolonId,
        relationship_type: RelationshipType,
        created_by: EventId,
        now: DateTime<Utc>,
    ) -> DomainResult<RelationshipId> {
        self.relationships.create_relationship(Relationship {
            id: RelationshipId::new(),
            relationship_type,
            source_holon_id: source,
            target_holon_id: target,
            properties: serde_json::json!({}),
            effective_start: now,
            effective_end: None,
            source_system: None,
            source_documents: vec![],
            created_by,
            ended_by: None,
            authority_level: AuthorityLevel::Authoritative,
            confidence_score: None,
        })
    }

    /// Record that `objective` depends on `dependency`, rejecting the
    /// edge if it would close a cycle in the Objective dependency graph.
    pub fn add_dependency(
        &self,
        objective: HolonId,
        dependency: HolonId,
        actor: HolonId,
        now: DateTime<Utc>,
    ) -> DomainResult<RelationshipId> {
        if !self.holons.exists(objective) {
            return Err(DomainError::holon_not_found(objective));
        }
        if !self.holons.exists(dependency) {
            return Err(DomainError::holon_not_found(dependency));
        }
        let event = Event::new(
            EventType::AssignmentStarted,
            vec![objective, dependency],
            now,
            actor,
            serde_json::json!({"relationshipType": "DependsOn"}),
            CausalLinks::default(),
            now,
        )?;
        let event_id = self.events.append(event)?;
        self.link(objective, dependency, RelationshipType::DependsOn, event_id, now)
    }

    /// The measures grounding `objective`, via its MEASURED_BY edges.
    pub fn measures_of(&self, objective: HolonId) -> Vec<HolonId> {
        self.relationships
            .get_relationships_from(objective, Some(RelationshipType::MeasuredBy), &RelationshipFilter::default())
            .into_iter()
            .map(|r| r.target_holon_id)
            .collect()
    }
}
