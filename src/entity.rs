// Copyright 2025 Cowboy AI, LLC.

//! Typed identifiers for the entities that make up the semantic model.
//!
//! Every holon, relationship, event, document, constraint and proposal is
//! addressed by an [`EntityId`] carrying a phantom marker type. The marker
//! makes it impossible to pass a `HolonId` where an `EventId` is expected
//! without an explicit [`EntityId::cast`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use uuid::Uuid;

/// A typed identifier using phantom types for compile-time safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId<T> {
    id: Uuid,
    #[serde(skip)]
    _phantom: PhantomData<T>,
}

impl<T> EntityId<T> {
    /// Create a new random identifier.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            _phantom: PhantomData,
        }
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self {
            id,
            _phantom: PhantomData,
        }
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.id
    }

    /// Reinterpret this id under a different marker type.
    pub fn cast<U>(self) -> EntityId<U> {
        EntityId {
            id: self.id,
            _phantom: PhantomData,
        }
    }
}

impl<T> Default for EntityId<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Display for EntityId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl<T> From<EntityId<T>> for Uuid {
    fn from(id: EntityId<T>) -> Self {
        id.id
    }
}

impl<T> From<&EntityId<T>> for Uuid {
    fn from(id: &EntityId<T>) -> Self {
        id.id
    }
}

/// Marker for [`crate::holon::Holon`] identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HolonMarker;

/// Marker for [`crate::relationship::Relationship`] identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationshipMarker;

/// Marker for [`crate::event::Event`] identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventMarker;

/// Marker for [`crate::document::Document`] identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentMarker;

/// Marker for [`crate::constraint::Constraint`] identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstraintMarker;

/// Marker for [`crate::governance::SchemaChangeProposal`] identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProposalMarker;

/// Marker for [`crate::schema::SchemaVersionRecord`] identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaVersionMarker;

/// Marker for registered alert handler handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertHandlerMarker;

/// Marker for raised [`crate::monitoring::Alert`] identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertMarker;
