// Copyright 2025 Cowboy AI, LLC.

//! Mission management: missions, the capabilities they require, the
//! assets that support them, and the phase transitions a mission moves
//! through over its life.

use crate::errors::{DomainError, DomainResult};
use crate::event::{CausalLinks, Event, EventStore, EventType};
use crate::holon::{Holon, HolonProperties, HolonRegistry, MissionKind};
use crate::ids::{EventId, HolonId, RelationshipId};
use crate::relationship::{AuthorityLevel, Relationship, RelationshipFilter, RelationshipRegistry, RelationshipType};
use chrono::{DateTime, Utc};

/// Facade over Mission/Capability/Asset linkage and phase tracking.
pub struct MissionManager<'a> {
    holons: &'a HolonRegistry,
    relationships: &'a RelationshipRegistry,
    events: &'a EventStore,
}

impl<'a> MissionManager<'a> {
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

    /// Record that a Mission holon was created (planned).
    pub fn record_mission_planned(&self, mission: HolonId, actor: HolonId, now: DateTime<Utc>) -> DomainResult<EventId> {
        let event = Event::new(
            EventType::MissionPlanned,
            vec![mission],
            now,
            actor,
            serde_json::json!({}),
            CausalLinks::default(),
            now,
        )?;
        self.events.append(event)
    }

    /// Record that a Capability holon was created.
    pub fn record_capability_created(&self, capability: HolonId, actor: HolonId, now: DateTime<Utc>) -> DomainResult<EventId> {
        let event = Event::new(
            EventType::CapabilityCreated,
            vec![capability],
            now,
            actor,
            serde_json::json!({}),
            CausalLinks::default(),
            now,
        )?;
        self.events.append(event)
    }

    /// Record that an Asset holon was created.
    pub fn record_asset_created(&self, asset: HolonId, actor: HolonId, now: DateTime<Utc>) -> DomainResult<EventId> {
        let event = Event::new(
            EventType::AssetCreated,
            vec![asset],
            now,
            actor,
            serde_json::json!({}),
            CausalLinks::default(),
            now,
        )?;
        self.events.append(event)
    }

    /// Record that `mission` uses `capability`, a temporally-scoped edge.
    pub fn uses_capability(
        &self,
        mission: HolonId,
        capability: HolonId,
        actor: HolonId,
        now: DateTime<Utc>,
    ) -> DomainResult<RelationshipId> {
        self.bind(mission, capability, RelationshipType::Uses, actor, now)
    }

    /// Record that `asset` supports `mission`, a temporally-scoped edge.
    pub fn supports_mission(
        &self,
        asset: HolonId,
        mission: HolonId,
        actor: HolonId,
        now: DateTime<Utc>,
    ) -> DomainResult<RelationshipId> {
        self.bind(asset, mission, RelationshipType::Supports, actor, now)
    }

    fn bind(
        &self,
        source: HolonId,
        target: HolonId,
        relationship_type: RelationshipType,
        actor: HolonId,
        now: DateTime<Utc>,
    ) -> DomainResult<RelationshipId> {
        if !self.holons.exists(source) {
            return Err(DomainError::holon_not_found(source));
        }
        if !self.holons.exists(target) {
            return Err(DomainError::holon_not_found(target));
        }
        let event = Event::new(
            EventType::AssignmentStarted,
            vec![source, target],
            now,
            actor,
            serde_json::json!({"relationshipType": format!("{relationship_type:?}")}),
            CausalLinks::default(),
            now,
        )?;
        let event_id = self.events.append(event)?;
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
            created_by: event_id,
            ended_by: None,
            authority_level: AuthorityLevel::Authoritative,
            confidence_score: None,
        })
    }

    /// End an Uses/Supports binding.
    pub fn end_binding(&self, relationship: RelationshipId, actor: HolonId, now: DateTime<Utc>) -> DomainResult<()> {
        let edge = self.relationships.get_relationship(relationship)?;
        let event = Event::new(
            EventType::AssignmentEnded,
            vec![edge.source_holon_id, edge.target_holon_id],
            now,
            actor,
            serde_json::json!({}),
            CausalLinks::default(),
            now,
        )?;
        let event_id = self.events.append(event)?;
        self.relationships.end_relationship(relationship, now, "binding ended", event_id)
    }

    /// Record that `mission` transitioned from `from_phase` to `to_phase`.
    pub fn transition_phase(
        &self,
        mission: HolonId,
        from_phase: impl Into<String>,
        to_phase: impl Into<String>,
        reason: Option<String>,
        actor: HolonId,
        now: DateTime<Utc>,
    ) -> DomainResult<EventId> {
        if !self.holons.exists(mission) {
            return Err(DomainError::holon_not_found(mission));
        }
        let mut payload = serde_json::json!({
            "fromPhase": from_phase.into(),
            "toPhase": to_phase.into(),
        });
        if let Some(reason) = reason {
            payload["reason"] = serde_json::Value::String(reason);
        }
        let event = Event::new(
            EventType::MissionPhaseTransition,
            vec![mission],
            now,
            actor,
            payload,
            CausalLinks::default(),
            now,
        )?;
        self.events.append(event)
    }

    /// Every `MissionPhaseTransition` event recorded against `mission`,
    /// in recording order.
    pub fn get_mission_phase_history(&self, mission: HolonId) -> Vec<EventId> {
        self.events
            .for_subject(mission)
            .into_iter()
            .filter(|e| e.event_type == EventType::MissionPhaseTransition)
            .map(|e| e.id)
            .collect()
    }

    /// Build a validated Mission holon: operation name, operation number,
    /// and classification must be non-empty after trimming, and `end`
    /// (if present) must not precede `start`.
    #[allow(clippy::too_many_arguments)]
    pub fn new_mission(
        &self,
        operation_name: impl Into<String>,
        operation_number: impl Into<String>,
        mission_type: MissionKind,
        classification: impl Into<String>,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
        created_by: EventId,
        source_documents: Vec<crate::ids::DocumentId>,
        now: DateTime<Utc>,
    ) -> DomainResult<Holon> {
        let operation_name = operation_name.into();
        let operation_number = operation_number.into();
        let classification = classification.into();
        if operation_name.trim().is_empty() {
            return Err(DomainError::Validation("mission operation name must not be empty".into()));
        }
        if operation_number.trim().is_empty() {
            return Err(DomainError::Validation("mission operation number must not be empty".into()));
        }
        if classification.trim().is_empty() {
            return Err(DomainError::Validation("mission classification must not be empty".into()));
        }
        if let Some(end) = end {
            if end < start {
                return Err(DomainError::Temporal("mission end precedes start".into()));
            }
        }
        Holon::new(
            HolonProperties::Mission {
                operation_name,
                operation_number,
                mission_type,
                classification,
                start,
                end,
            },
            created_by,
            source_documents,
            now,
        )
    }

    /// Build a validated Capability holon: name must be non-empty after
    /// trimming.
    pub fn new_capability(
        &self,
        name: impl Into<String>,
        description: impl Into<String>,
        created_by: EventId,
        source_documents: Vec<crate::ids::DocumentId>,
        now: DateTime<Utc>,
    ) -> DomainResult<Holon> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::Validation("capability name must not be empty".into()));
        }
        Holon::new(
            HolonProperties::Capability {
                name,
                description: description.into(),
            },
            created_by,
            source_documents,
            now,
        )
    }

    /// Build a validated Asset holon: name and asset type must be
    /// non-empty after trimming.
    pub fn new_asset(
        &self,
        name: impl Into<String>,
        asset_type: impl Into<String>,
        created_by: EventId,
        source_documents: Vec<crate::ids::DocumentId>,
        now: DateTime<Utc>,
    ) -> DomainResult<Holon> {
        let name = name.into();
        let asset_type = asset_type.into();
        if name.trim().is_empty() {
            return Err(DomainError::Validation("asset name must not be empty".into()));
        }
        if asset_type.trim().is_empty() {
            return Err(DomainError::Validation("asset type must not be empty".into()));
        }
        Holon::new(
            HolonProperties::Asset { name, asset_type },
            created_by,
            source_documents,
            now,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holon::{Holon, HolonProperties, MissionKind};
    use crate::ids::DocumentId;

    fn mission(holons: &HolonRegistry, now: DateTime<Utc>) -> HolonId {
        let holon = Holon::new(
            HolonProperties::Mission {
                operation_name: "Steel Curtain".into(),
                operation_number: "OP-001".into(),
                mission_type: MissionKind::RealWorld,
                classification: "secret".into(),
                start: now,
                end: None,
            },
            EventId::new(),
            vec![DocumentId::new()],
            now,
        )
        .unwrap();
        let id = holon.id;
        holons.create_holon(holon);
        id
    }

    fn capability(holons: &HolonRegistry, now: DateTime<Utc>) -> HolonId {
        let holon = Holon::new(
            HolonProperties::Capability {
                name: "Airlift".into(),
                description: "heavy cargo transport".into(),
            },
            EventId::new(),
            vec![DocumentId::new()],
            now,
        )
        .unwrap();
        let id = holon.id;
        holons.create_holon(holon);
        id
    }

    fn asset(holons: &HolonRegistry, now: DateTime<Utc>) -> HolonId {
        let holon = Holon::new(
            HolonProperties::Asset {
                name: "C-130".into(),
                asset_type: "aircraft".into(),
            },
            EventId::new(),
            vec![DocumentId::new()],
            now,
        )
        .unwrap();
        let id = holon.id;
        holons.create_holon(holon);
        id
    }

    fn actor_holon(holons: &HolonRegistry, now: DateTime<Utc>) -> HolonId {
        let holon = Holon::new(
            HolonProperties::Organization {
                name: "Operations Center".into(),
                org_type: "command".into(),
            },
            EventId::new(),
            vec![DocumentId::new()],
            now,
        )
        .unwrap();
        let id = holon.id;
        holons.create_holon(holon);
        id
    }

    #[test]
    fn uses_and_supports_link_holons() {
        let holons = HolonRegistry::new();
        let relationships = RelationshipRegistry::new();
        let events = EventStore::new();
        let now = Utc::now();
        let manager = MissionManager::new(&holons, &relationships, &events);
        let actor = actor_holon(&holons, now);
        let mission = mission(&holons, now);
        let capability = capability(&holons, now);
        let asset = asset(&holons, now);
        manager.uses_capability(mission, capability, actor, now).unwrap();
        manager.supports_mission(asset, mission, actor, now).unwrap();
        assert_eq!(
            relationships
                .get_relationships_from(mission, Some(RelationshipType::Uses), &RelationshipFilter::default())
                .len(),
            1
        );
        assert_eq!(
            relationships
                .get_relationships_from(asset, Some(RelationshipType::Supports), &RelationshipFilter::default())
                .len(),
            1
        );
    }

    #[test]
    fn rejects_binding_to_missing_holon() {
        let holons = HolonRegistry::new();
        let relationships = RelationshipRegistry::new();
        let events = EventStore::new();
        let now = Utc::now();
        let manager = MissionManager::new(&holons, &relationships, &events);
        let actor = actor_holon(&holons, now);
        let mission = mission(&holons, now);
        let result = manager.uses_capability(mission, HolonId::new(), actor, now);
        assert!(result.is_err());
    }

    #[test]
    fn phase_history_returns_transitions_in_order() {
        let holons = HolonRegistry::new();
        let relationships = RelationshipRegistry::new();
        let events = EventStore::new();
        let now = Utc::now();
        let manager = MissionManager::new(&holons, &relationships, &events);
        let actor = actor_holon(&holons, now);
        let mission = mission(&holons, now);
        manager
            .transition_phase(mission, "planning", "execution", None, actor, now)
            .unwrap();
        manager
            .transition_phase(mission, "execution", "recovery", Some("objectives met".into()), actor, now)
            .unwrap();
        assert_eq!(manager.get_mission_phase_history(mission).len(), 2);
    }

    #[test]
    fn new_mission_rejects_end_before_start() {
        let holons = HolonRegistry::new();
        let relationships = RelationshipRegistry::new();
        let events = EventStore::new();
        let now = Utc::now();
        let manager = MissionManager::new(&holons, &relationships, &events);
        let result = manager.new_mission(
            "Steel Curtain",
            "OP-001",
            MissionKind::RealWorld,
            "secret",
            now,
            Some(now - chrono::Duration::days(1)),
            EventId::new(),
            vec![DocumentId::new()],
            now,
        );
        assert!(result.is_err());
    }

    #[test]
    fn new_capability_rejects_blank_name() {
        let holons = HolonRegistry::new();
        let relationships = RelationshipRegistry::new();
        let events = EventStore::new();
        let now = Utc::now();
        let manager = MissionManager::new(&holons, &relationships, &events);
        let result = manager.new_capability("  ", "heavy cargo transport", EventId::new(), vec![DocumentId::new()], now);
        assert!(result.unwrap_err().to_string().contains("capability name"));
    }

    #[test]
    fn new_asset_rejects_blank_type() {
        let holons = HolonRegistry::new();
        let relationships = RelationshipRegistry::new();
        let events = EventStore::new();
        let now = Utc::now();
        let manager = MissionManager::new(&holons, &relationships, &events);
        let result = manager.new_asset("C-130", "  ", EventId::new(), vec![DocumentId::new()], now);
        assert!(result.unwrap_err().to_string().contains("asset type"));
    }
}
