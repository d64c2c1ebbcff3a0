// Copyright 2025 Cowboy AI, LLC.

//! Person and Position management: assigning people to positions within
//! the concurrent-assignment limit, and revoking qualifications that
//! unwind their downstream HAS_QUAL/HELD_BY edges.

use crate::config::PersonManagerConfig;
use crate::errors::{DomainError, DomainResult};
use crate::event::{CausalLinks, Event, EventStore, EventType};
use crate::holon::{Holon, HolonProperties, HolonRegistry, PersonCategory};
use crate::ids::{EventId, HolonId, RelationshipId};
use crate::relationship::{AuthorityLevel, Relationship, RelationshipFilter, RelationshipRegistry, RelationshipType};
use chrono::{DateTime, Utc};

/// Facade over Person/Position creation and OCCUPIES assignment.
pub struct PersonManager<'a> {
    config: PersonManagerConfig,
    holons: &'a HolonRegistry,
    relationships: &'a RelationshipRegistry,
    events: &'a EventStore,
}

impl<'a> PersonManager<'a> {
    /// Bind a manager to its registries and configuration.
    pub fn new(
        config: PersonManagerConfig,
        holons: &'a HolonRegistry,
        relationships: &'a RelationshipRegistry,
        events: &'a EventStore,
    ) -> Self {
        Self {
            config,
            holons,
            relationships,
            events,
        }
    }

    /// Number of positions `person` currently occupies (OCCUPIES edges
    /// still in force at `now`).
    pub fn current_assignment_count(&self, person: HolonId, now: DateTime<Utc>) -> usize {
        self.relationships
            .get_relationships_from(
                person,
                Some(RelationshipType::Occupies),
                &RelationshipFilter {
                    effective_at: Some(now),
                    ..Default::default()
                },
            )
            .len()
    }

    /// Qualifications REQUIRED_FOR `position` at `now` that `person` does
    /// not currently HELD_BY at `now`.
    pub fn missing_required_qualifications(&self, person: HolonId, position: HolonId, now: DateTime<Utc>) -> Vec<HolonId> {
        let required = self
            .relationships
            .get_relationships_to(
                position,
                Some(RelationshipType::RequiredFor),
                &RelationshipFilter {
                    effective_at: Some(now),
                    ..Default::default()
                },
            )
            .into_iter()
            .map(|r| r.source_holon_id);
        required
            .filter(|qualification| {
                !self
                    .relationships
                    .get_relationships_from(
                        *qualification,
                        Some(RelationshipType::HeldBy),
                        &RelationshipFilter {
                            effective_at: Some(now),
                            ..Default::default()
                        },
                    )
                    .into_iter()
                    .any(|r| r.target_holon_id == person)
            })
            .collect()
    }

    /// Assign `person` to occupy `position`, recording `AssignmentStarted`
    /// and rejecting the assignment if it would exceed
    /// [`PersonManagerConfig::max_concurrent_positions`].
    pub fn assign_to_position(
        &self,
        person: HolonId,
        position: HolonId,
        actor: HolonId,
        now: DateTime<Utc>,
    ) -> DomainResult<RelationshipId> {
        if !self.holons.exists(person) {
            return Err(DomainError::holon_not_found(person));
        }
        if !self.holons.exists(position) {
            return Err(DomainError::holon_not_found(position));
        }
        if self.current_assignment_count(person, now) >= self.config.max_concurrent_positions {
            return Err(DomainError::Validation(format!(
                "person {person} already holds {} concurrent position assignments",
                self.config.max_concurrent_positions
            )));
        }
        let missing = self.missing_required_qualifications(person, position, now);
        if !missing.is_empty() {
            return Err(DomainError::Consistency(format!(
                "person {person} is missing qualifications required for position {position}: {missing:?}"
            )));
        }
        let event = Event::new(
            EventType::AssignmentStarted,
            vec![person, position],
            now,
            actor,
            serde_json::json!({"relationshipType": "Occupies"}),
            CausalLinks::default(),
            now,
        )?;
        let event_id = self.events.append(event)?;
        self.relationships.create_relationship(Relationship {
            id: RelationshipId::new(),
            relationship_type: RelationshipType::Occupies,
            source_holon_id: person,
            target_holon_id: position,
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

    /// End a position assignment, recording `AssignmentEnded`.
    pub fn end_assignment(
        &self,
        assignment: RelationshipId,
        actor: HolonId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        let edge = self.relationships.get_relationship(assignment)?;
        let event = Event::new(
            EventType::AssignmentEnded,
            vec![edge.source_holon_id, edge.target_holon_id],
            now,
            actor,
            serde_json::json!({"reason": reason}),
            CausalLinks::default(),
            now,
        )?;
        let event_id = self.events.append(event)?;
        self.relationships.end_relationship(assignment, now, reason, event_id)
    }

    /// Revoke a qualification award held by `person`, ending the HAS_QUAL
    /// and HELD_BY edges and recording `QualificationRevoked` with a
    /// causal link back to the original award event.
    pub fn revoke_qualification(
        &self,
        person: HolonId,
        qualification: HolonId,
        actor: HolonId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<EventId> {
        let held_by = self
            .relationships
            .get_relationships_from(
                qualification,
                Some(RelationshipType::HeldBy),
                &RelationshipFilter {
                    effective_at: Some(now),
                    ..Default::default()
                },
            )
            .into_iter()
            .find(|r| r.target_holon_id == person)
            .ok_or_else(|| DomainError::Consistency(format!(
                "person {person} does not currently hold qualification {qualification}"
            )))?;
        let has_qual = self
            .relationships
            .get_relationships_from(
                person,
                Some(RelationshipType::HasQual),
                &RelationshipFilter {
                    effective_at: Some(now),
                    ..Default::default()
                },
            )
            .into_iter()
            .find(|r| r.target_holon_id == qualification);

        let award_event = held_by.created_by;
        let event = Event::new(
            EventType::QualificationRevoked,
            vec![person, qualification],
            now,
            actor,
            serde_json::json!({"reason": reason}),
            CausalLinks {
                preceded_by: vec![],
                caused_by: vec![award_event],
            },
            now,
        )?;
        let event_id = self.events.append(event)?;
        self.relationships.end_relationship(held_by.id, now, reason, event_id)?;
        if let Some(has_qual) = has_qual {
            self.relationships.end_relationship(has_qual.id, now, reason, event_id)?;
        }
        Ok(event_id)
    }

    /// Record that a Position holon was created.
    pub fn record_position_created(
        &self,
        position: HolonId,
        actor: HolonId,
        now: DateTime<Utc>,
    ) -> DomainResult<EventId> {
        let event = Event::new(
            EventType::PositionCreated,
            vec![position],
            now,
            actor,
            serde_json::json!({}),
            CausalLinks::default(),
            now,
        )?;
        self.events.append(event)
    }

    /// Record that an Organization holon was created.
    pub fn record_organization_created(
        &self,
        organization: HolonId,
        actor: HolonId,
        now: DateTime<Utc>,
    ) -> DomainResult<EventId> {
        let event = Event::new(
            EventType::OrganizationCreated,
            vec![organization],
            now,
            actor,
            serde_json::json!({}),
            CausalLinks::default(),
            now,
        )?;
        self.events.append(event)
    }

    /// Build a validated Person holon: edipi, name, service branch, and
    /// designator/rating must be non-empty after trimming.
    #[allow(clippy::too_many_arguments)]
    pub fn new_person(
        &self,
        edipi: impl Into<String>,
        service_numbers: Vec<String>,
        name: impl Into<String>,
        dob: DateTime<Utc>,
        service_branch: impl Into<String>,
        designator_rating: impl Into<String>,
        category: PersonCategory,
        created_by: EventId,
        source_documents: Vec<crate::ids::DocumentId>,
        now: DateTime<Utc>,
    ) -> DomainResult<Holon> {
        let edipi = edipi.into();
        let name = name.into();
        let service_branch = service_branch.into();
        let designator_rating = designator_rating.into();
        if edipi.trim().is_empty() {
            return Err(DomainError::Validation("person edipi must not be empty".into()));
        }
        if name.trim().is_empty() {
            return Err(DomainError::Validation("person name must not be empty".into()));
        }
        if service_branch.trim().is_empty() {
            return Err(DomainError::Validation("person service branch must not be empty".into()));
        }
        if designator_rating.trim().is_empty() {
            return Err(DomainError::Validation(
                "person designator/rating must not be empty".into(),
            ));
        }
        Holon::new(
            HolonProperties::Person {
                edipi,
                service_numbers,
                name,
                dob,
                service_branch,
                designator_rating,
                category,
            },
            created_by,
            source_documents,
            now,
        )
    }

    /// Build a validated Position holon: title must be non-empty after
    /// trimming and `organization` must reference an existing holon.
    pub fn new_position(
        &self,
        title: impl Into<String>,
        organization: HolonId,
        created_by: EventId,
        source_documents: Vec<crate::ids::DocumentId>,
        now: DateTime<Utc>,
    ) -> DomainResult<Holon> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(DomainError::Validation("position title must not be empty".into()));
        }
        if !self.holons.exists(organization) {
            return Err(DomainError::Validation(format!(
                "position organization {organization} does not exist"
            )));
        }
        Holon::new(
            HolonProperties::Position { title, organization },
            created_by,
            source_documents,
            now,
        )
    }

    /// Build a validated Organization holon: name and org type must be
    /// non-empty after trimming.
    pub fn new_organization(
        &self,
        name: impl Into<String>,
        org_type: impl Into<String>,
        created_by: EventId,
        source_documents: Vec<crate::ids::DocumentId>,
        now: DateTime<Utc>,
    ) -> DomainResult<Holon> {
        let name = name.into();
        let org_type = org_type.into();
        if name.trim().is_empty() {
            return Err(DomainError::Validation("organization name must not be empty".into()));
        }
        if org_type.trim().is_empty() {
            return Err(DomainError::Validation("organization type must not be empty".into()));
        }
        Holon::new(
            HolonProperties::Organization { name, org_type },
            created_by,
            source_documents,
            now,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holon::{HolonProperties, PersonCategory};
    use crate::ids::DocumentId;

    fn person(holons: &HolonRegistry, now: DateTime<Utc>) -> HolonId {
        let holon = Holon::new(
            HolonProperties::Person {
                edipi: "1234567890".into(),
                service_numbers: vec![],
                name: "Ada Lovelace".into(),
                dob: now,
                service_branch: "Navy".into(),
                designator_rating: "1810".into(),
                category: PersonCategory::ActiveDuty,
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

    fn position(holons: &HolonRegistry, organization: HolonId, now: DateTime<Utc>) -> HolonId {
        let holon = Holon::new(
            HolonProperties::Position {
                title: "Officer of the Deck".into(),
                organization,
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

    fn organization(holons: &HolonRegistry, now: DateTime<Utc>) -> HolonId {
        let holon = Holon::new(
            HolonProperties::Organization {
                name: "USS Example".into(),
                org_type: "ship".into(),
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
    fn assignment_rejected_when_required_qualification_not_held() {
        let holons = HolonRegistry::new();
        let relationships = RelationshipRegistry::new();
        let events = EventStore::new();
        let manager = PersonManager::new(PersonManagerConfig::default(), &holons, &relationships, &events);
        let now = Utc::now();
        let actor = person(&holons, now);
        let person_id = person(&holons, now);
        let org = organization(&holons, now);
        let position_id = position(&holons, org, now);
        let qualification = crate::domain::qualification::tests_support::qualification_holon(&holons, now);

        let link_event = Event::new(
            EventType::AssignmentStarted,
            vec![qualification, position_id],
            now,
            actor,
            serde_json::json!({"relationshipType": "RequiredFor"}),
            CausalLinks::default(),
            now,
        )
        .unwrap();
        let link_event_id = events.append(link_event).unwrap();
        relationships
            .create_relationship(Relationship {
                id: RelationshipId::new(),
                relationship_type: RelationshipType::RequiredFor,
                source_holon_id: qualification,
                target_holon_id: position_id,
                properties: serde_json::json!({}),
                effective_start: now,
                effective_end: None,
                source_system: None,
                source_documents: vec![],
                created_by: link_event_id,
                ended_by: None,
                authority_level: AuthorityLevel::Authoritative,
                confidence_score: None,
            })
            .unwrap();

        let result = manager.assign_to_position(person_id, position_id, actor, now);
        assert!(result.is_err());
    }

    #[test]
    fn assignment_succeeds_within_limit() {
        let holons = HolonRegistry::new();
        let relationships = RelationshipRegistry::new();
        let events = EventStore::new();
        let manager = PersonManager::new(PersonManagerConfig::default(), &holons, &relationships, &events);
        let now = Utc::now();
        let actor = person(&holons, now);
        let person_id = person(&holons, now);
        let org = organization(&holons, now);
        for _ in 0..3 {
            let pos = position(&holons, org, now);
            manager.assign_to_position(person_id, pos, actor, now).unwrap();
        }
    }

    #[test]
    fn fourth_assignment_rejected_by_default_limit() {
        let holons = HolonRegistry::new();
        let relationships = RelationshipRegistry::new();
        let events = EventStore::new();
        let manager = PersonManager::new(PersonManagerConfig::default(), &holons, &relationships, &events);
        let now = Utc::now();
        let actor = person(&holons, now);
        let person_id = person(&holons, now);
        let org = organization(&holons, now);
        for _ in 0..3 {
            let pos = position(&holons, org, now);
            manager.assign_to_position(person_id, pos, actor, now).unwrap();
        }
        let fourth = position(&holons, org, now);
        assert!(manager.assign_to_position(person_id, fourth, actor, now).is_err());
    }

    #[test]
    fn configured_limit_is_honored() {
        let holons = HolonRegistry::new();
        let relationships = RelationshipRegistry::new();
        let events = EventStore::new();
        let manager = PersonManager::new(
            PersonManagerConfig {
                max_concurrent_positions: 1,
            },
            &holons,
            &relationships,
            &events,
        );
        let now = Utc::now();
        let actor = person(&holons, now);
        let person_id = person(&holons, now);
        let org = organization(&holons, now);
        let first = position(&holons, org, now);
        manager.assign_to_position(person_id, first, actor, now).unwrap();
        let second = position(&holons, org, now);
        assert!(manager.assign_to_position(person_id, second, actor, now).is_err());
    }

    #[test]
    fn revoking_qualification_ends_held_by_and_has_qual() {
        let holons = HolonRegistry::new();
        let relationships = RelationshipRegistry::new();
        let events = EventStore::new();
        let manager = PersonManager::new(PersonManagerConfig::default(), &holons, &relationships, &events);
        let now = Utc::now();
        let actor = person(&holons, now);
        let person_id = person(&holons, now);
        let qual = crate::domain::qualification::tests_support::qualification_holon(&holons, now);

        let award_event = Event::new(
            EventType::QualificationAwarded,
            vec![person_id, qual],
            now,
            actor,
            serde_json::json!({}),
            CausalLinks::default(),
            now,
        )
        .unwrap();
        let award_event_id = events.append(award_event).unwrap();

        relationships
            .create_relationship(Relationship {
                id: RelationshipId::new(),
                relationship_type: RelationshipType::HeldBy,
                source_holon_id: qual,
                target_holon_id: person_id,
                properties: serde_json::json!({}),
                effective_start: now,
                effective_end: None,
                source_system: None,
                source_documents: vec![],
                created_by: award_event_id,
                ended_by: None,
                authority_level: AuthorityLevel::Authoritative,
                confidence_score: None,
            })
            .unwrap();
        relationships
            .create_relationship(Relationship {
                id: RelationshipId::new(),
                relationship_type: RelationshipType::HasQual,
                source_holon_id: person_id,
                target_holon_id: qual,
                properties: serde_json::json!({}),
                effective_start: now,
                effective_end: None,
                source_system: None,
                source_documents: vec![],
                created_by: award_event_id,
                ended_by: None,
                authority_level: AuthorityLevel::Authoritative,
                confidence_score: None,
            })
            .unwrap();

        manager
            .revoke_qualification(person_id, qual, actor, "lapsed conduct standard", now)
            .unwrap();

        assert!(relationships
            .get_relationships_from(person_id, Some(RelationshipType::HasQual), &RelationshipFilter::default())
            .is_empty());
        assert!(relationships
            .get_relationships_from(qual, Some(RelationshipType::HeldBy), &RelationshipFilter::default())
            .is_empty());
    }

    #[test]
    fn new_person_rejects_blank_edipi() {
        let holons = HolonRegistry::new();
        let relationships = RelationshipRegistry::new();
        let events = EventStore::new();
        let now = Utc::now();
        let manager = PersonManager::new(PersonManagerConfig::default(), &holons, &relationships, &events);
        let result = manager.new_person(
            "   ",
            vec![],
            "Ada Lovelace",
            now,
            "Navy",
            "1810",
            PersonCategory::ActiveDuty,
            EventId::new(),
            vec![DocumentId::new()],
            now,
        );
        assert!(result.unwrap_err().to_string().contains("edipi"));
    }

    #[test]
    fn new_position_rejects_missing_organization() {
        let holons = HolonRegistry::new();
        let relationships = RelationshipRegistry::new();
        let events = EventStore::new();
        let now = Utc::now();
        let manager = PersonManager::new(PersonManagerConfig::default(), &holons, &relationships, &events);
        let result = manager.new_position("Officer of the Deck", HolonId::new(), EventId::new(), vec![DocumentId::new()], now);
        assert!(result.unwrap_err().to_string().contains("does not exist"));
    }

    #[test]
    fn new_organization_rejects_blank_name() {
        let holons = HolonRegistry::new();
        let relationships = RelationshipRegistry::new();
        let events = EventStore::new();
        let now = Utc::now();
        let manager = PersonManager::new(PersonManagerConfig::default(), &holons, &relationships, &events);
        let result = manager.new_organization("  ", "ship", EventId::new(), vec![DocumentId::new()], now);
        assert!(result.unwrap_err().to_string().contains("name"));
    }
}
