// Copyright 2025 Cowboy AI, LLC.

//! Documents: versioned, period-of-force authoritative sources that
//! ground constraints, holons, and governance decisions.
//!
//! Document content is opaque to the core: it is stored and returned as a
//! plain string blob, with no structure imposed on it beyond what callers
//! choose to put there. Documents do not reference holons; the reverse
//! direction (holon -> document) is carried on the holon's
//! `source_documents`, and the constraint -> document link is carried the
//! same way on constraints.

use crate::errors::{DomainError, DomainResult};
use crate::ids::{ConstraintId, DocumentId, EventId};
use crate::temporal::EffectiveRange;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// The closed set of document kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    /// A policy or directive.
    Policy,
    /// A certificate evidencing a qualification award.
    Certificate,
    /// A report filed against one or more holons.
    Report,
    /// A contract or agreement.
    Contract,
    /// A governance decision record.
    DecisionRecord,
    /// Escape hatch for document kinds not yet promoted to the closed set.
    Custom(String),
}

/// A filed document, in force over an effective-date range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier.
    pub id: DocumentId,
    /// Document kind.
    pub document_type: DocumentType,
    /// Display title.
    pub title: String,
    /// External reference numbers (e.g. directive or contract numbers).
    pub reference_numbers: Vec<String>,
    /// Opaque document content.
    pub content: String,
    /// Monotonically increasing revision number.
    pub version: u32,
    /// Free-form classification or handling metadata.
    pub classification_metadata: serde_json::Value,
    /// When this document is (or was) in force.
    pub effective: EffectiveRange,
    /// The event that filed this document.
    pub created_by_event: EventId,
    /// Constraints this document grounds, if any.
    pub linked_constraint_ids: Vec<ConstraintId>,
    /// When this document was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl Document {
    /// `true` if this document is in force at `at`.
    pub fn in_force_at(&self, at: DateTime<Utc>) -> bool {
        self.effective.contains_half_open(at)
    }
}

/// In-memory store of documents.
#[derive(Default)]
pub struct DocumentRegistry {
    inner: RwLock<HashMap<DocumentId, Document>>,
}

impl DocumentRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// File a new document, requiring a well-formed effective range.
    pub fn file(&self, document: Document) -> DomainResult<DocumentId> {
        if !document.effective.is_well_formed() {
            return Err(DomainError::Temporal(
                "document effectiveEnd precedes effectiveStart".into(),
            ));
        }
        let mut inner = self.inner.write().expect("document registry poisoned");
        let id = document.id;
        inner.insert(id, document);
        Ok(id)
    }

    /// Fetch a document by id.
    pub fn get(&self, id: DocumentId) -> DomainResult<Document> {
        self.inner
            .read()
            .expect("document registry poisoned")
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::document_not_found(id))
    }

    /// Every document in force at `at`.
    pub fn get_documents_in_force(&self, at: DateTime<Utc>) -> Vec<Document> {
        self.inner
            .read()
            .expect("document registry poisoned")
            .values()
            .filter(|d| d.in_force_at(at))
            .cloned()
            .collect()
    }

    /// Append constraint ids this document grounds.
    pub fn link_to_constraints(
        &self,
        id: DocumentId,
        constraint_ids: Vec<ConstraintId>,
    ) -> DomainResult<()> {
        let mut inner = self.inner.write().expect("document registry poisoned");
        let document = inner
            .get_mut(&id)
            .ok_or_else(|| DomainError::document_not_found(id))?;
        document.linked_constraint_ids.extend(constraint_ids);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(effective: EffectiveRange) -> Document {
        Document {
            id: DocumentId::new(),
            document_type: DocumentType::Report,
            title: "Quarterly Review".into(),
            reference_numbers: vec![],
            content: "opaque blob".into(),
            version: 1,
            classification_metadata: serde_json::json!({}),
            effective,
            created_by_event: EventId::new(),
            linked_constraint_ids: vec![],
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn rejects_malformed_effective_range() {
        let registry = DocumentRegistry::new();
        let start = Utc::now();
        let end = start - chrono::Duration::days(1);
        let result = registry.file(doc(EffectiveRange::new(start, Some(end))));
        assert!(result.is_err());
    }

    #[test]
    fn file_and_fetch_by_id() {
        let registry = DocumentRegistry::new();
        let id = registry.file(doc(EffectiveRange::open(Utc::now()))).unwrap();
        let document = registry.get(id).unwrap();
        assert_eq!(document.id, id);
    }

    #[test]
    fn in_force_filter_excludes_expired() {
        let registry = DocumentRegistry::new();
        let past_start = Utc::now() - chrono::Duration::days(30);
        let past_end = Utc::now() - chrono::Duration::days(1);
        registry
            .file(doc(EffectiveRange::new(past_start, Some(past_end))))
            .unwrap();
        assert!(registry.get_documents_in_force(Utc::now()).is_empty());
    }

    #[test]
    fn in_force_filter_includes_open_ended_document() {
        let registry = DocumentRegistry::new();
        let id = registry
            .file(doc(EffectiveRange::open(Utc::now() - chrono::Duration::days(1))))
            .unwrap();
        let in_force = registry.get_documents_in_force(Utc::now());
        assert!(in_force.iter().any(|d| d.id == id));
    }

    #[test]
    fn link_to_constraints_appends() {
        let registry = DocumentRegistry::new();
        let id = registry.file(doc(EffectiveRange::open(Utc::now()))).unwrap();
        let constraint_id = ConstraintId::new();
        registry.link_to_constraints(id, vec![constraint_id]).unwrap();
        let document = registry.get(id).unwrap();
        assert_eq!(document.linked_constraint_ids, vec![constraint_id]);
    }
}
