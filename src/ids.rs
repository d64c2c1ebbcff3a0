// Copyright 2025 Cowboy AI, LLC.

//! Type aliases binding [`EntityId`](crate::entity::EntityId) to each marker.

use crate::entity::{
    AlertHandlerMarker, AlertMarker, ConstraintMarker, DocumentMarker, EntityId, EventMarker,
    HolonMarker, ProposalMarker, RelationshipMarker, SchemaVersionMarker,
};

/// Identifies a [`crate::holon::Holon`].
pub type HolonId = EntityId<HolonMarker>;

/// Identifies a [`crate::relationship::Relationship`].
pub type RelationshipId = EntityId<RelationshipMarker>;

/// Identifies a [`crate::event::Event`].
pub type EventId = EntityId<EventMarker>;

/// Identifies a [`crate::document::Document`].
pub type DocumentId = EntityId<DocumentMarker>;

/// Identifies a [`crate::constraint::Constraint`].
pub type ConstraintId = EntityId<ConstraintMarker>;

/// Identifies a [`crate::governance::SchemaChangeProposal`].
pub type ProposalId = EntityId<ProposalMarker>;

/// Identifies a [`crate::schema::SchemaVersionRecord`].
pub type SchemaVersionId = EntityId<SchemaVersionMarker>;

/// Handle returned by [`crate::monitoring::Monitoring::register_alert_handler`].
pub type AlertHandlerId = EntityId<AlertHandlerMarker>;

/// Identifies a raised [`crate::monitoring::Alert`].
pub type AlertId = EntityId<AlertMarker>;
