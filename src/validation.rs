// Copyright 2025 Cowboy AI, LLC.

//! The validation engine: temporal checks, categorized results, batch
//! atomicity, compensating events, and a queryable validation log.

use crate::document::{Document, DocumentRegistry};
use crate::errors::{DomainError, DomainResult, ErrorCategory, ValidationIssue, ValidationOutcome};
use crate::event::{validate_occurrence_bounds, CausalLinks, Event, EventStore, EventType};
use crate::ids::{EventId, HolonId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// An event validation result enriched with category, the documents in
/// force at the event's timestamp, and when the validation ran.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancedValidationResult {
    /// The underlying validation outcome.
    pub outcome: ValidationOutcome,
    /// Documents in force, referencing the event's subjects, at
    /// `event.occurred_at`.
    pub documents_in_force: Vec<Document>,
    /// When this validation ran.
    pub validated_at: DateTime<Utc>,
}

impl EnhancedValidationResult {
    /// `true` if the underlying outcome has no errors.
    pub fn is_valid(&self) -> bool {
        self.outcome.is_valid()
    }
}

/// Result of validating a batch of events. All-or-nothing: the batch is
/// valid only if every element is valid; a per-index map reports why any
/// element failed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchValidationResult {
    /// `true` iff every event in the batch validated cleanly.
    pub valid: bool,
    /// Errors for each failing index, keyed by position in the submitted
    /// batch.
    pub errors_by_index: HashMap<usize, Vec<ValidationIssue>>,
}

/// Metadata describing who authorized a compensating event and why.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompensationMetadata {
    /// The holon authorizing the correction.
    pub authorized_by: HolonId,
    /// Free-text reason for the correction.
    pub reason: String,
    /// Correction classification (e.g. "reversal", "cancellation").
    pub correction_type: String,
}

/// One entry in the validation log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationLogEntry {
    /// Unique identifier of this log entry.
    pub id: EventId,
    /// When the validation ran.
    pub timestamp: DateTime<Utc>,
    /// The event that was validated.
    pub event_id: EventId,
    /// Whether the validation passed.
    pub valid: bool,
    /// The category of the first error, if any.
    pub category: Option<ErrorCategory>,
}

/// Filter accepted by [`ValidationEngine::get_validation_log`].
#[derive(Debug, Clone, Default)]
pub struct ValidationLogFilter {
    /// Only entries at or after this instant.
    pub since: Option<DateTime<Utc>>,
    /// Only entries at or before this instant.
    pub until: Option<DateTime<Utc>>,
    /// Only entries with this category.
    pub category: Option<ErrorCategory>,
    /// Only entries for this event.
    pub event_id: Option<EventId>,
}

impl ValidationLogEntry {
    fn matches(&self, filter: &ValidationLogFilter) -> bool {
        if let Some(since) = filter.since {
            if self.timestamp < since {
                return false;
            }
        }
        if let Some(until) = filter.until {
            if self.timestamp > until {
                return false;
            }
        }
        if let Some(category) = filter.category {
            if self.category != Some(category) {
                return false;
            }
        }
        if let Some(event_id) = filter.event_id {
            if self.event_id != event_id {
                return false;
            }
        }
        true
    }
}

/// Maps an original event type to the event type that compensates for it,
/// per the declared table. Falls back to `TaskCancelled` for an explicit
/// cancellation correction, and `AssignmentCorrected` otherwise.
fn compensating_event_type(original: EventType, correction_type: &str) -> EventType {
    match original {
        EventType::AssignmentStarted => EventType::AssignmentEnded,
        EventType::QualificationAwarded => EventType::QualificationRevoked,
        EventType::TaskStarted => EventType::TaskCompleted,
        _ if correction_type.eq_ignore_ascii_case("cancellation") => EventType::TaskCancelled,
        _ => EventType::AssignmentCorrected,
    }
}

/// Checks temporal invariants on events and orchestrates corrections,
/// backed by the event store and document registry it validates against.
pub struct ValidationEngine<'a> {
    events: &'a EventStore,
    documents: &'a DocumentRegistry,
    log: RwLock<Vec<ValidationLogEntry>>,
}

impl<'a> ValidationEngine<'a> {
    /// Bind a validation engine to the stores it checks against.
    pub fn new(events: &'a EventStore, documents: &'a DocumentRegistry) -> Self {
        Self {
            events,
            documents,
            log: RwLock::new(Vec::new()),
        }
    }

    /// Check `event`'s temporal invariants: `occurredAt` within bounds,
    /// every causal-link predecessor exists with an earlier-or-equal
    /// `occurredAt`, and a well-formed `validityWindow` if present.
    pub fn validate_temporal_constraints(&self, event: &Event) -> ValidationOutcome {
        let mut outcome = ValidationOutcome::ok();
        if let Err(DomainError::Temporal(message)) =
            validate_occurrence_bounds(event.occurred_at, Utc::now())
        {
            outcome.push_error(
                ValidationIssue::new("occurredAt within tolerance window", message)
                    .with_category(ErrorCategory::Temporal),
            );
        }
        let predecessors = event
            .causal_links
            .preceded_by
            .iter()
            .chain(event.causal_links.caused_by.iter());
        for predecessor_id in predecessors {
            match self.events.get(*predecessor_id) {
                Ok(predecessor) if predecessor.occurred_at > event.occurred_at => {
                    outcome.push_error(
                        ValidationIssue::new(
                            "causal predecessor must not occur after this event",
                            format!("predecessor {predecessor_id} occurred after event"),
                        )
                        .with_category(ErrorCategory::Temporal),
                    );
                }
                Ok(_) => {}
                Err(_) => {
                    outcome.push_error(
                        ValidationIssue::new(
                            "causal predecessor must exist",
                            format!("predecessor {predecessor_id} does not exist"),
                        )
                        .with_category(ErrorCategory::Consistency),
                    );
                }
            }
        }
        if let Some((start, Some(end))) = event.validity_window {
            if start > end {
                outcome.push_error(
                    ValidationIssue::new(
                        "validityWindow must be well-formed",
                        "validityWindow end precedes start",
                    )
                    .with_category(ErrorCategory::Temporal),
                );
            }
        }
        outcome
    }

    /// Validate `event`, recording a log entry, and enriching the result
    /// with the documents in force (for `event`'s subjects) at
    /// `event.occurred_at`.
    pub fn validate_event_with_details(&self, event: &Event) -> EnhancedValidationResult {
        let outcome = self.validate_temporal_constraints(event);
        let documents_in_force = self.documents.get_documents_in_force(event.occurred_at);

        let category = outcome.errors.first().and_then(|e| e.category);
        let validated_at = Utc::now();
        self.log
            .write()
            .expect("validation log poisoned")
            .push(ValidationLogEntry {
                id: EventId::new(),
                timestamp: validated_at,
                event_id: event.id,
                valid: outcome.is_valid(),
                category,
            });

        EnhancedValidationResult {
            outcome,
            documents_in_force,
            validated_at,
        }
    }

    /// Validate every event in `events` independently; the batch is valid
    /// only if every element is. No partial commit is implied — callers
    /// treat the batch as atomic and must not submit it unless
    /// `result.valid`.
    pub fn validate_batch(&self, events: &[Event]) -> BatchValidationResult {
        let mut errors_by_index = HashMap::new();
        for (index, event) in events.iter().enumerate() {
            let result = self.validate_event_with_details(event);
            if !result.is_valid() {
                errors_by_index.insert(index, result.outcome.errors);
            }
        }
        BatchValidationResult {
            valid: errors_by_index.is_empty(),
            errors_by_index,
        }
    }

    /// Create a compensating event for `original_id`: the original event
    /// must exist. The new event's type is derived from the original's
    /// type via the declared compensation table, its subjects match the
    /// original's, its payload is `correction_payload` augmented with
    /// `compensatingMetadata`, and its `causal_links.caused_by` names the
    /// original event.
    pub fn create_compensating_event(
        &self,
        original_id: EventId,
        metadata: CompensationMetadata,
        mut correction_payload: serde_json::Value,
    ) -> DomainResult<Event> {
        let original = self.events.get(original_id)?;
        let compensating_type = compensating_event_type(original.event_type, &metadata.correction_type);

        if !correction_payload.is_object() {
            correction_payload = serde_json::json!({});
        }
        correction_payload["compensatingMetadata"] = serde_json::json!({
            "originalEventId": original_id,
            "reason": metadata.reason,
            "correctionType": metadata.correction_type,
            "originalPayload": original.payload,
        });

        let now = Utc::now();
        let mut event = Event::new(
            compensating_type,
            original.subjects.clone(),
            now,
            metadata.authorized_by,
            correction_payload,
            CausalLinks {
                preceded_by: vec![],
                caused_by: vec![original_id],
            },
            now,
        )?;
        event.source_document = original.source_document;
        Ok(event)
    }

    /// The validation log, filtered.
    pub fn get_validation_log(&self, filter: &ValidationLogFilter) -> Vec<ValidationLogEntry> {
        self.log
            .read()
            .expect("validation log poisoned")
            .iter()
            .filter(|entry| entry.matches(filter))
            .cloned()
            .collect()
    }
}
