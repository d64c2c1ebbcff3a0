// Copyright 2025 Cowboy AI, LLC.

//! Error types for core operations.

use crate::ids::{ConstraintId, DocumentId, EventId, HolonId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The category a validation issue or domain error falls into.
///
/// Mirrors the failure taxonomy every engine reports against: a
/// constraint failure is `Validation`, a clock or causal-ordering problem
/// is `Temporal`, a cycle or orphan reference is `Consistency`, an
/// unenforced actor-permission rule is `Authorization`, and a failure
/// reaching an external collaborator is `Integration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// A domain rule or completeness check failed.
    Validation,
    /// Timestamps, causal ordering, or effective-date ranges violated.
    Temporal,
    /// Cycle detected, orphan reference, or other structural conflict.
    Consistency,
    /// Placeholder category for actor-permission rules.
    Authorization,
    /// Failure reaching an external collaborator.
    Integration,
}

/// One validation failure or warning, as returned by constraint validators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// The constraint that produced this issue, if any.
    pub constraint_id: Option<ConstraintId>,
    /// Human-readable message.
    pub message: String,
    /// The name of the rule that was violated, used for categorization.
    pub violated_rule: String,
    /// Holons implicated in the violation.
    pub affected_holons: Vec<HolonId>,
    /// Category of the issue, assigned by the caller or by categorization.
    pub category: Option<ErrorCategory>,
    /// When the issue was produced.
    pub timestamp: Option<DateTime<Utc>>,
    /// Free-form additional context.
    pub context: Option<serde_json::Value>,
}

impl ValidationIssue {
    /// Construct a bare issue with only a rule name and message.
    pub fn new(violated_rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            constraint_id: None,
            message: message.into(),
            violated_rule: violated_rule.into(),
            affected_holons: Vec::new(),
            category: None,
            timestamp: None,
            context: None,
        }
    }

    /// Attach the holons this issue implicates.
    pub fn with_affected_holons(mut self, holons: Vec<HolonId>) -> Self {
        self.affected_holons = holons;
        self
    }

    /// Attach an explicit category, overriding heuristic categorization.
    pub fn with_category(mut self, category: ErrorCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Attach the constraint this issue was raised by.
    pub fn with_constraint(mut self, id: ConstraintId) -> Self {
        self.constraint_id = Some(id);
        self
    }

    /// Heuristically categorize this issue from its `violated_rule` text,
    /// unless a category has already been assigned.
    ///
    /// Mentions of time/date/temporal map to [`ErrorCategory::Temporal`];
    /// cycle/circular/orphan map to [`ErrorCategory::Consistency`];
    /// permission/authorization/access map to [`ErrorCategory::Authorization`];
    /// everything else is [`ErrorCategory::Validation`].
    pub fn categorize(&self) -> ErrorCategory {
        if let Some(category) = self.category {
            return category;
        }
        let haystack = format!("{} {}", self.violated_rule, self.message).to_lowercase();
        if haystack.contains("time") || haystack.contains("date") || haystack.contains("temporal")
        {
            ErrorCategory::Temporal
        } else if haystack.contains("cycle")
            || haystack.contains("circular")
            || haystack.contains("orphan")
        {
            ErrorCategory::Consistency
        } else if haystack.contains("permission")
            || haystack.contains("authorization")
            || haystack.contains("access")
        {
            ErrorCategory::Authorization
        } else {
            ErrorCategory::Validation
        }
    }
}

/// Outcome of running a set of constraint validators against a holon,
/// relationship, or event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationOutcome {
    /// Errors that make the subject invalid.
    pub errors: Vec<ValidationIssue>,
    /// Non-fatal warnings.
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationOutcome {
    /// An outcome with no errors or warnings.
    pub fn ok() -> Self {
        Self::default()
    }

    /// Valid iff there are no errors (warnings do not affect validity).
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Merge another outcome's errors and warnings into this one.
    pub fn extend(&mut self, other: ValidationOutcome) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Push a single error.
    pub fn push_error(&mut self, issue: ValidationIssue) {
        self.errors.push(issue);
    }

    /// Push a single warning.
    pub fn push_warning(&mut self, issue: ValidationIssue) {
        self.warnings.push(issue);
    }
}

/// Errors that can occur in core operations.
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    /// Entity not found.
    #[error("{entity_type} not found: {id}")]
    NotFound {
        /// Type of entity that wasn't found.
        entity_type: &'static str,
        /// ID that was searched for.
        id: String,
    },

    /// A domain rule or completeness check failed.
    #[error("validation error: {0}")]
    Validation(String),

    /// Timestamps, causal ordering, or effective-date ranges were violated.
    #[error("temporal error: {0}")]
    Temporal(String),

    /// A cycle, orphan reference, or other structural conflict was detected.
    #[error("consistency error: {0}")]
    Consistency(String),

    /// Placeholder for actor-permission rules, not enforced in the core.
    #[error("authorization error: {0}")]
    Authorization(String),

    /// Failure reaching an external collaborator.
    #[error("integration error: {0}")]
    Integration(String),

    /// The requested operation would duplicate existing state.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The requested operation is not implemented in the reference core.
    #[error("not implemented: {0}")]
    NotImplemented(String),
}

/// Result type for core operations.
pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Construct a [`DomainError::NotFound`] for a holon.
    pub fn holon_not_found(id: HolonId) -> Self {
        DomainError::NotFound {
            entity_type: "Holon",
            id: id.to_string(),
        }
    }

    /// Construct a [`DomainError::NotFound`] for an event.
    pub fn event_not_found(id: EventId) -> Self {
        DomainError::NotFound {
            entity_type: "Event",
            id: id.to_string(),
        }
    }

    /// Construct a [`DomainError::NotFound`] for a document.
    pub fn document_not_found(id: DocumentId) -> Self {
        DomainError::NotFound {
            entity_type: "Document",
            id: id.to_string(),
        }
    }

    /// Category this error would be logged under.
    pub fn category(&self) -> ErrorCategory {
        match self {
            DomainError::NotFound { .. } => ErrorCategory::Consistency,
            DomainError::Validation(_) => ErrorCategory::Validation,
            DomainError::Temporal(_) => ErrorCategory::Temporal,
            DomainError::Consistency(_) => ErrorCategory::Consistency,
            DomainError::Authorization(_) => ErrorCategory::Authorization,
            DomainError::Integration(_) => ErrorCategory::Integration,
            DomainError::AlreadyExists(_) => ErrorCategory::Validation,
            DomainError::NotImplemented(_) => ErrorCategory::Integration,
        }
    }
}

impl From<ValidationOutcome> for DomainError {
    /// Collapse a failed [`ValidationOutcome`] into a single error, joining
    /// every error message. Callers that need the structured issues should
    /// inspect the outcome directly instead of converting it.
    fn from(outcome: ValidationOutcome) -> Self {
        let joined = outcome
            .errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        DomainError::Validation(joined)
    }
}
