// Copyright (c) 2025 - Cowboy AI, LLC.

//! # Semantic Operating Model core
//!
//! An event-sourced, bitemporal knowledge graph recording enterprise state
//! as Holons, Relationships, Events, and Documents, governed by a
//! Constraint Engine and a versioned schema.
//!
//! This crate is a reference implementation: in-memory, synchronous, and
//! single-process. It defines the data model, the engines that enforce
//! its invariants, and the domain managers that compose them into
//! per-area operations:
//! - **Holons & Relationships**: the typed nodes and edges of the graph
//! - **Events**: the append-only, bitemporal record everything else is
//!   derived from
//! - **Documents**: evidentiary records filed against holons
//! - **Constraints**: named, scoped validation rules with precedence-based
//!   inheritance
//! - **Schema & Governance**: versioned property shapes and the proposal
//!   workflow that changes them
//! - **Domain managers**: Person, Qualification, Mission, Objective, and
//!   Initiative, each a thin facade composing the above
//! - **Monitoring**: percentile metrics and threshold-triggered alerts
//!
//! ## Design Principles
//!
//! 1. **Type Safety**: phantom-typed identifiers distinguish holon kinds
//!    at compile time
//! 2. **Bitemporal**: every fact carries both occurrence time and
//!    recording time
//! 3. **Append-only**: wrong facts are corrected with compensating
//!    events, never edited or deleted
//! 4. **Per-registry concurrency**: each registry is guarded by its own
//!    reader-writer lock; no global lock serializes unrelated operations
//! 5. **Controlled state**: task/initiative/proposal lifecycles are Moore
//!    machines with closed transition tables

#![warn(missing_docs)]

pub mod config;
pub mod constraint;
pub mod document;
pub mod domain;
pub mod entity;
pub mod errors;
pub mod event;
pub mod governance;
pub mod holon;
pub mod ids;
pub mod monitoring;
pub mod relationship;
pub mod schema;
pub mod state_machine;
pub mod temporal;
pub mod validation;

pub use constraint::{Constraint, ConstraintEngine, ConstraintRule, ConstraintScope};
pub use document::{Document, DocumentRegistry, DocumentType};
pub use entity::EntityId;
pub use errors::{DomainError, DomainResult, ErrorCategory, ValidationIssue, ValidationOutcome};
pub use event::{Event, EventStore, EventType};
pub use governance::{GovernanceEngine, ProposalStatus, SchemaChangeProposal};
pub use holon::{Holon, HolonProperties, HolonRegistry, HolonType};
pub use ids::{
    AlertHandlerId, AlertId, ConstraintId, DocumentId, EventId, HolonId, ProposalId,
    RelationshipId, SchemaVersionId,
};
pub use monitoring::{Alert, AlertHandler, Monitoring, Percentiles};
pub use relationship::{Relationship, RelationshipRegistry, RelationshipType};
pub use schema::{SchemaRegistry, SchemaStatus, SchemaVersionRecord};
pub use temporal::EffectiveRange;
pub use validation::ValidationEngine;
