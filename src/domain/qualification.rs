// Copyright 2025 Cowboy AI, LLC.

//! Qualification management: awarding and expiring credentials, and the
//! DEPENDS_ON prerequisite graph between qualifications.

use crate::config::QualificationManagerConfig;
use crate::errors::{DomainError, DomainResult};
use crate::event::{CausalLinks, Event, EventStore, EventType};
use crate::holon::{Holon, HolonProperties, HolonRegistry};
use crate::ids::{EventId, HolonId, RelationshipId};
use crate::relationship::{AuthorityLevel, Relationship, RelationshipFilter, RelationshipRegistry, RelationshipType};
use chrono::{DateTime, Utc};

/// Facade over Qualification award/expiration and prerequisite management.
pub struct QualificationManager<'a> {
    config: QualificationManagerConfig,
    holons: &'a HolonRegistry,
    relationships: &'a RelationshipRegistry,
    events: &'a EventStore,
}

impl<'a> QualificationManager<'a> {
    /// Bind a manager to its registries and configuration.
    pub fn new(
        config: QualificationManagerConfig,
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

    /// Days until `person`'s award of `qualification` expires, if a
    /// HELD_BY edge with a known end date exists.
    pub fn days_until_expiration(&self, person: HolonId, qualification: HolonId, now: DateTime<Utc>) -> Option<i64> {
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
            .find(|r| r.target_holon_id == person)?;
        held_by.effective_end.map(|end| (end - now).num_days())
    }

    /// `true` if the award is due a renewal warning:
    /// [`QualificationManagerConfig::renewal_warning_days`] or fewer days
    /// remain before expiration.
    pub fn needs_renewal_warning(&self, person: HolonId, qualification: HolonId, now: DateTime<Utc>) -> bool {
        self.days_until_expiration(person, qualification, now)
            .is_some_and(|days| days <= self.config.renewal_warning_days)
    }

    /// Declare that `prerequisite` must be held before `qualification` can
    /// be pursued, rejecting the edge if it would close a cycle (including
    /// a qualification naming itself as its own prerequisite).
    pub fn add_prerequisite(
        &self,
        qualification: HolonId,
        prerequisite: HolonId,
        actor: HolonId,
        now: DateTime<Utc>,
    ) -> DomainResult<RelationshipId> {
        let event = Event::new(
            EventType::AssignmentCorrected,
            vec![qualification, prerequisite],
            now,
            actor,
            serde_json::json!({"relationshipType": "DependsOn", "reason": "prerequisite declared"}),
            CausalLinks::default(),
            now,
        )?;
        let event_id = self.events.append(event)?;
        self.relationships.create_relationship(Relationship {
            id: RelationshipId::new(),
            relationship_type: RelationshipType::DependsOn,
            source_holon_id: qualification,
            target_holon_id: prerequisite,
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

    /// Award `qualification` to `person`, creating the materialized
    /// HELD_BY edge (qualification -> person) and the HAS_QUAL edge
    /// (person -> qualification), both bounded by the qualification's
    /// `validity_period_days` unless it is marked non-expiring (zero
    /// days), and recording `QualificationAwarded`.
    pub fn award_qualification(
        &self,
        person: HolonId,
        qualification: HolonId,
        actor: HolonId,
        now: DateTime<Utc>,
    ) -> DomainResult<EventId> {
        let holon = self.holons.get_holon(qualification)?;
        let validity_days = match &holon.properties {
            HolonProperties::Qualification { validity_period_days, .. } => *validity_period_days,
            _ => {
                return Err(DomainError::Validation(format!(
                    "{qualification} is not a Qualification holon"
                )))
            }
        };
        let effective_end = if validity_days > 0 {
            Some(now + chrono::Duration::days(validity_days))
        } else {
            None
        };

        let event = Event::new(
            EventType::QualificationAwarded,
            vec![person, qualification],
            now,
            actor,
            serde_json::json!({}),
            CausalLinks::default(),
            now,
        )?;
        let event_id = self.events.append(event)?;

        self.relationships.create_relationship(Relationship {
            id: RelationshipId::new(),
            relationship_type: RelationshipType::HeldBy,
            source_holon_id: qualification,
            target_holon_id: person,
            properties: serde_json::json!({}),
            effective_start: now,
            effective_end,
            source_system: None,
            source_documents: vec![],
            created_by: event_id,
            ended_by: None,
            authority_level: AuthorityLevel::Authoritative,
            confidence_score: None,
        })?;
        self.relationships.create_relationship(Relationship {
            id: RelationshipId::new(),
            relationship_type: RelationshipType::HasQual,
            source_holon_id: person,
            target_holon_id: qualification,
            properties: serde_json::json!({}),
            effective_start: now,
            effective_end,
            source_system: None,
            source_documents: vec![],
            created_by: event_id,
            ended_by: None,
            authority_level: AuthorityLevel::Authoritative,
            confidence_score: None,
        })?;
        Ok(event_id)
    }

    /// Expire `person`'s award of `qualification` by passage of time,
    /// ending the HELD_BY/HAS_QUAL edges and recording
    /// `QualificationExpired` with a causal link to the award event.
    pub fn expire_qualification(
        &self,
        person: HolonId,
        qualification: HolonId,
        actor: HolonId,
        now: DateTime<Utc>,
    ) -> DomainResult<EventId> {
        let held_by = self
            .relationships
            .get_relationships_from(
                qualification,
                Some(RelationshipType::HeldBy),
                &RelationshipFilter {
                    include_ended: true,
                    ..Default::default()
                },
            )
            .into_iter()
            .find(|r| r.target_holon_id == person && r.effective_end.is_none())
            .ok_or_else(|| DomainError::Consistency(format!(
                "person {person} does not currently hold qualification {qualification}"
            )))?;
        let has_qual = self
            .relationships
            .get_relationships_from(
                person,
                Some(RelationshipType::HasQual),
                &RelationshipFilter::default(),
            )
            .into_iter()
            .find(|r| r.target_holon_id == qualification);

        let award_event = held_by.created_by;
        let event = Event::new(
            EventType::QualificationExpired,
            vec![person, qualification],
            now,
            actor,
            serde_json::json!({}),
            CausalLinks {
                preceded_by: vec![],
                caused_by: vec![award_event],
            },
            now,
        )?;
        let event_id = self.events.append(event)?;
        self.relationships.end_relationship(held_by.id, now, "expired", event_id)?;
        if let Some(has_qual) = has_qual {
            self.relationships.end_relationship(has_qual.id, now, "expired", event_id)?;
        }
        Ok(event_id)
    }

    /// Build a validated Qualification holon: at least one identifier
    /// (NEC, PQS id, course code, or certification id) and a non-empty
    /// name are required.
    pub fn new_qualification(
        &self,
        identifiers: Vec<String>,
        name: impl Into<String>,
        validity_period_days: i64,
        renewable: bool,
        created_by: EventId,
        source_documents: Vec<crate::ids::DocumentId>,
        now: DateTime<Utc>,
    ) -> DomainResult<Holon> {
        if identifiers.is_empty() {
            return Err(DomainError::Validation(
                "qualification requires at least one identifier".into(),
            ));
        }
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::Validation("qualification name must not be empty".into()));
        }
        Holon::new(
            HolonProperties::Qualification {
                identifiers,
                name,
                validity_period_days,
                renewable,
            },
            created_by,
            source_documents,
            now,
        )
    }
}

/// Shared qualification-holon fixture used by this module's and sibling
/// domain modules' tests.
#[cfg(test)]
pub(crate) mod tests_support {
    use super::*;
    use crate::ids::DocumentId;

    pub fn qualification_holon(holons: &HolonRegistry, now: DateTime<Utc>) -> HolonId {
        let holon = Holon::new(
            HolonProperties::Qualification {
                identifiers: vec!["NEC-1234".into()],
                name: "Surface Warfare Qualification".into(),
                validity_period_days: 365,
                renewable: true,
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
}
