// Copyright 2025 Cowboy AI, LLC.

//! Domain managers: the per-area facade each external caller drives.
//!
//! Each manager owns no state itself beyond its configuration; it borrows
//! the shared [`crate::holon::HolonRegistry`], [`crate::relationship::RelationshipRegistry`],
//! and [`crate::event::EventStore`] and exposes one method per operation,
//! keeping validation and event recording together at the call site.

pub mod initiative;
pub mod mission;
pub mod objective;
pub mod person;
pub mod qualification;
