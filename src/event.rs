// Copyright 2025 Cowboy AI, LLC.

//! Events: the append-only, bitemporal record of everything that happened.
//!
//! Every event carries two timestamps: `occurred_at`, when the real-world
//! fact became true, and `recorded_at`, when the core learned about it.
//! The two diverge whenever a fact is reported late; both are kept so a
//! reconstruction "as of" either axis is possible.

use crate::errors::{DomainError, DomainResult};
use crate::ids::{DocumentId, EventId, HolonId};
use chrono::{DateTime, Duration, Utc};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// How far in the past an `occurred_at` may lag the recording instant.
pub const MAX_OCCURRENCE_LAG: Duration = Duration::days(365);
/// How far in the future an `occurred_at` may lead the recording instant,
/// to tolerate clock skew between reporting systems.
pub const MAX_OCCURRENCE_LEAD: Duration = Duration::hours(1);

/// The closed set of event kinds the core records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// An Objective was created.
    ObjectiveCreated,
    /// A key result was defined under an Objective.
    KeyResultDefined,
    /// A Person began occupying a Position, or a Qualification assignment
    /// began.
    AssignmentStarted,
    /// An assignment ended.
    AssignmentEnded,
    /// A Qualification was awarded to a Person.
    QualificationAwarded,
    /// A Qualification award expired by passage of time.
    QualificationExpired,
    /// A Qualification award was revoked before its natural expiration.
    QualificationRevoked,
    /// A Mission was planned.
    MissionPlanned,
    /// A Mission moved between phases.
    MissionPhaseTransition,
    /// A Position was created.
    PositionCreated,
    /// A Position's properties were modified.
    PositionModified,
    /// An Organization was created.
    OrganizationCreated,
    /// A System holon was deployed.
    SystemDeployed,
    /// A Task began.
    TaskStarted,
    /// A Task completed.
    TaskCompleted,
    /// A Task was cancelled.
    TaskCancelled,
    /// An assignment was corrected after the fact.
    AssignmentCorrected,
    /// A Line of Effort was created.
    LoeCreated,
    /// A Capability was created.
    CapabilityCreated,
    /// An Asset was created.
    AssetCreated,
    /// An Initiative was created.
    InitiativeCreated,
    /// A Task was created.
    TaskCreated,
}

/// The causal provenance of an event: which events it supersedes and
/// which events it was brought about by.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CausalLinks {
    /// Events this one directly precedes in a causal chain (e.g. the
    /// event this one compensates for).
    pub preceded_by: Vec<EventId>,
    /// Events that caused this one to be recorded.
    pub caused_by: Vec<EventId>,
}

/// One immutable fact in the event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier.
    pub id: EventId,
    /// Event kind.
    pub event_type: EventType,
    /// Holons this event concerns, in no particular order.
    pub subjects: Vec<HolonId>,
    /// When the fact became true in the world.
    pub occurred_at: DateTime<Utc>,
    /// When the core recorded this event.
    pub recorded_at: DateTime<Utc>,
    /// The holon responsible for causing this event.
    pub actor: HolonId,
    /// Event-specific payload.
    pub payload: serde_json::Value,
    /// This event's causal relationship to other events.
    pub causal_links: CausalLinks,
    /// The upstream system this event was sourced from, if not this core.
    pub source_system: Option<String>,
    /// The document, if any, that evidences this event.
    pub source_document: Option<DocumentId>,
    /// The window during which this event's fact is considered valid,
    /// for events describing time-bounded states.
    pub validity_window: Option<(DateTime<Utc>, Option<DateTime<Utc>>)>,
}

impl Event {
    /// Construct an event, stamping `recorded_at` to `now`.
    ///
    /// Rejects `occurred_at` outside `[now - 1 year, now + 1 hour]`: too
    /// far in the past to plausibly still be getting reported, or in the
    /// future, which would mean recording a fact before it happens.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        event_type: EventType,
        subjects: Vec<HolonId>,
        occurred_at: DateTime<Utc>,
        actor: HolonId,
        payload: serde_json::Value,
        causal_links: CausalLinks,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        validate_occurrence_bounds(occurred_at, now)?;
        Ok(Self {
            id: EventId::new(),
            event_type,
            subjects,
            occurred_at,
            recorded_at: now,
            actor,
            payload,
            causal_links,
            source_system: None,
            source_document: None,
            validity_window: None,
        })
    }
}

/// Check `occurred_at` falls within the tolerated window around `now`.
pub fn validate_occurrence_bounds(occurred_at: DateTime<Utc>, now: DateTime<Utc>) -> DomainResult<()> {
    if occurred_at < now - MAX_OCCURRENCE_LAG {
        return Err(DomainError::Temporal(
            "occurredAt is more than one year in the past".into(),
        ));
    }
    if occurred_at > now + MAX_OCCURRENCE_LEAD {
        return Err(DomainError::Temporal(
            "occurredAt is more than one hour in the future".into(),
        ));
    }
    Ok(())
}

/// Append-only event log, indexed by subject holon and by type.
#[derive(Default)]
pub struct EventStore {
    inner: RwLock<EventInner>,
}

#[derive(Default)]
struct EventInner {
    by_id: HashMap<EventId, Event>,
    order: Vec<EventId>,
    by_subject: HashMap<HolonId, IndexSet<EventId>>,
}

impl EventStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event, rejecting ids already present, and rejecting any
    /// `caused_by` predecessor that does not exist yet or that occurred
    /// after this event.
    pub fn append(&self, event: Event) -> DomainResult<EventId> {
        let mut inner = self.inner.write().expect("event store poisoned");
        if inner.by_id.contains_key(&event.id) {
            return Err(DomainError::AlreadyExists(format!(
                "event {} already recorded",
                event.id
            )));
        }
        for predecessor_id in &event.causal_links.caused_by {
            let predecessor =
                inner
                    .by_id
                    .get(predecessor_id)
                    .ok_or_else(|| DomainError::Consistency(format!(
                        "causal predecessor {predecessor_id} does not exist"
                    )))?;
            if predecessor.occurred_at > event.occurred_at {
                return Err(DomainError::Temporal(format!(
                    "causal predecessor {predecessor_id} occurred after this event"
                )));
            }
        }
        let id = event.id;
        for subject in &event.subjects {
            inner.by_subject.entry(*subject).or_default().insert(id);
        }
        inner.order.push(id);
        inner.by_id.insert(id, event);
        Ok(id)
    }

    /// Fetch a single event by id.
    pub fn get(&self, id: EventId) -> DomainResult<Event> {
        let inner = self.inner.read().expect("event store poisoned");
        inner
            .by_id
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::event_not_found(id))
    }

    /// All events concerning `subject`, in recording order.
    pub fn for_subject(&self, subject: HolonId) -> Vec<Event> {
        let inner = self.inner.read().expect("event store poisoned");
        inner
            .by_subject
            .get(&subject)
            .into_iter()
            .flatten()
            .filter_map(|id| inner.by_id.get(id).cloned())
            .collect()
    }

    /// All events concerning `subject` that had occurred (by occurrence
    /// time) as of `at`, i.e. an "as of occurrence" reconstruction.
    pub fn for_subject_as_of_occurrence(&self, subject: HolonId, at: DateTime<Utc>) -> Vec<Event> {
        self.for_subject(subject)
            .into_iter()
            .filter(|e| e.occurred_at <= at)
            .collect()
    }

    /// All events concerning `subject` that had been recorded as of `at`,
    /// i.e. "what the core knew" reconstruction.
    pub fn for_subject_as_of_recording(&self, subject: HolonId, at: DateTime<Utc>) -> Vec<Event> {
        self.for_subject(subject)
            .into_iter()
            .filter(|e| e.recorded_at <= at)
            .collect()
    }

    /// The full log, in recording order.
    pub fn all(&self) -> Vec<Event> {
        let inner = self.inner.read().expect("event store poisoned");
        inner
            .order
            .iter()
            .filter_map(|id| inner.by_id.get(id).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_with(
        event_type: EventType,
        occurred_at: DateTime<Utc>,
        now: DateTime<Utc>,
        causal_links: CausalLinks,
    ) -> DomainResult<Event> {
        Event::new(
            event_type,
            vec![],
            occurred_at,
            HolonId::new(),
            serde_json::json!({}),
            causal_links,
            now,
        )
    }

    #[test]
    fn rejects_event_occurring_more_than_an_hour_in_the_future() {
        let now = Utc::now();
        let result = event_with(
            EventType::ObjectiveCreated,
            now + Duration::hours(2),
            now,
            CausalLinks::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn accepts_event_within_thirty_minutes_of_the_future() {
        let now = Utc::now();
        let result = event_with(
            EventType::ObjectiveCreated,
            now + Duration::minutes(30),
            now,
            CausalLinks::default(),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn rejects_event_occurring_more_than_a_year_in_the_past() {
        let now = Utc::now();
        let result = event_with(
            EventType::ObjectiveCreated,
            now - Duration::days(366),
            now,
            CausalLinks::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn append_rejects_duplicate_id() {
        let store = EventStore::new();
        let now = Utc::now();
        let event = event_with(EventType::ObjectiveCreated, now, now, CausalLinks::default()).unwrap();
        store.append(event.clone()).unwrap();
        assert!(store.append(event).is_err());
    }

    #[test]
    fn append_rejects_missing_causal_predecessor() {
        let store = EventStore::new();
        let now = Utc::now();
        let event = event_with(
            EventType::QualificationRevoked,
            now,
            now,
            CausalLinks {
                preceded_by: vec![],
                caused_by: vec![EventId::new()],
            },
        )
        .unwrap();
        assert!(store.append(event).is_err());
    }

    #[test]
    fn append_rejects_predecessor_that_occurred_later() {
        let store = EventStore::new();
        let now = Utc::now();
        let earlier_event = event_with(
            EventType::QualificationAwarded,
            now - Duration::days(1),
            now,
            CausalLinks::default(),
        )
        .unwrap();
        let predecessor_id = earlier_event.id;
        store.append(earlier_event).unwrap();
        let later_occurring_but_causally_prior = Event::new(
            EventType::QualificationRevoked,
            vec![],
            now - Duration::days(2),
            HolonId::new(),
            serde_json::json!({}),
            CausalLinks {
                preceded_by: vec![],
                caused_by: vec![predecessor_id],
            },
            now,
        )
        .unwrap();
        assert!(store.append(later_occurring_but_causally_prior).is_err());
    }

    #[test]
    fn as_of_occurrence_excludes_later_facts() {
        let store = EventStore::new();
        let subject = HolonId::new();
        let early = Utc::now() - Duration::days(10);
        let late = Utc::now();
        store
            .append(
                Event::new(
                    EventType::ObjectiveCreated,
                    vec![subject],
                    early,
                    HolonId::new(),
                    serde_json::json!({}),
                    CausalLinks::default(),
                    early,
                )
                .unwrap(),
            )
            .unwrap();
        store
            .append(
                Event::new(
                    EventType::KeyResultDefined,
                    vec![subject],
                    late,
                    HolonId::new(),
                    serde_json::json!({}),
                    CausalLinks::default(),
                    late,
                )
                .unwrap(),
            )
            .unwrap();
        let as_of_early = store.for_subject_as_of_occurrence(subject, early);
        assert_eq!(as_of_early.len(), 1);
        assert_eq!(store.for_subject(subject).len(), 2);
    }

    #[test]
    fn compensating_event_references_original_via_preceded_by() {
        let now = Utc::now();
        let original = event_with(
            EventType::QualificationAwarded,
            now,
            now,
            CausalLinks::default(),
        )
        .unwrap();
        let compensation = event_with(
            EventType::QualificationRevoked,
            now,
            now,
            CausalLinks {
                preceded_by: vec![original.id],
                caused_by: vec![],
            },
        )
        .unwrap();
        assert_eq!(compensation.causal_links.preceded_by, vec![original.id]);
    }
}
