// Copyright 2025 Cowboy AI, LLC.

//! Relationships: typed, temporally-scoped directed edges between holons.

use crate::errors::{DomainError, DomainResult};
use crate::ids::{DocumentId, EventId, HolonId, RelationshipId};
use crate::temporal::EffectiveRange;
use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::RwLock;

/// The closed set of relationship types connecting holons.
///
/// `DependsOn` is reused across Task, Qualification, and Objective
/// dependency graphs; each must remain acyclic, enforced by
/// [`RelationshipRegistry::would_create_cycle`] at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipType {
    /// Person occupies a Position.
    Occupies,
    /// Person is pursuing or holds a Qualification.
    HasQual,
    /// Qualification is required for a Position.
    RequiredFor,
    /// Qualification -> Person: the canonical materialized award edge.
    HeldBy,
    /// Mission uses a Capability.
    Uses,
    /// Asset supports a Mission.
    Supports,
    /// Holon is owned by another holon.
    OwnedBy,
    /// Objective is grouped under a LOE.
    GroupedUnder,
    /// A dependency that must be satisfied before the source can proceed.
    /// Enforced acyclic within each holon type it connects.
    DependsOn,
    /// Task is part of an Initiative.
    PartOf,
    /// Initiative is aligned to an Objective.
    AlignedTo,
    /// Objective is measured by a Measure.
    MeasuredBy,
    /// Escape hatch for relationship kinds not yet promoted to the closed set.
    Custom(String),
}

impl RelationshipType {
    /// `true` for relationship types whose graph must stay acyclic.
    pub fn must_be_acyclic(&self) -> bool {
        matches!(self, RelationshipType::DependsOn)
    }
}

/// How directly a relationship was asserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorityLevel {
    /// Directly asserted by a source document or domain manager.
    Authoritative,
    /// Computed from other assertions.
    Derived,
    /// Produced by a heuristic.
    Inferred,
}

impl Default for AuthorityLevel {
    fn default() -> Self {
        AuthorityLevel::Authoritative
    }
}

/// A typed, time-bounded edge between two holons.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    /// Unique identifier.
    pub id: RelationshipId,
    /// Edge type.
    pub relationship_type: RelationshipType,
    /// Source holon.
    pub source_holon_id: HolonId,
    /// Target holon.
    pub target_holon_id: HolonId,
    /// Free-form edge properties.
    pub properties: serde_json::Value,
    /// When this edge came into force.
    pub effective_start: DateTime<Utc>,
    /// When this edge went out of force, if it has been closed. Once set,
    /// immutable.
    pub effective_end: Option<DateTime<Utc>>,
    /// The upstream system this edge was sourced from, if not this core.
    pub source_system: Option<String>,
    /// Documents grounding this edge's assertion.
    pub source_documents: Vec<DocumentId>,
    /// The event that established this edge.
    pub created_by: EventId,
    /// The event that closed this edge, if it has been closed.
    pub ended_by: Option<EventId>,
    /// How directly this edge was asserted.
    pub authority_level: AuthorityLevel,
    /// Confidence in this edge's correctness, for derived or inferred
    /// edges.
    pub confidence_score: Option<f64>,
}

impl Relationship {
    /// `true` if this edge is in force at `at` (inclusive of both
    /// endpoints, per the "start <= at <= end or open" semantics used by
    /// relationship effectiveness filters).
    pub fn is_effective_at(&self, at: DateTime<Utc>) -> bool {
        EffectiveRange::new(self.effective_start, self.effective_end).contains_inclusive(at)
    }
}

/// Filters accepted by relationship queries.
#[derive(Debug, Clone, Default)]
pub struct RelationshipFilter {
    /// Only edges effective at this instant.
    pub effective_at: Option<DateTime<Utc>>,
    /// Include edges that have already ended. Defaults to `false`.
    pub include_ended: bool,
    /// Only edges with this authority level.
    pub authority_level: Option<AuthorityLevel>,
}

impl Relationship {
    fn matches(&self, filter: &RelationshipFilter) -> bool {
        if !filter.include_ended && self.effective_end.is_some() {
            if let Some(at) = filter.effective_at {
                if !self.is_effective_at(at) {
                    return false;
                }
            } else {
                return false;
            }
        }
        if let Some(at) = filter.effective_at {
            if !self.is_effective_at(at) {
                return false;
            }
        }
        if let Some(level) = filter.authority_level {
            if self.authority_level != level {
                return false;
            }
        }
        true
    }
}

/// In-memory store of relationships with source/target/type indices.
///
/// Guarded by a single [`RwLock`]; readers and writers each take the whole
/// registry's lock rather than locking individual edges, matching the
/// per-registry concurrency discipline used throughout the core.
#[derive(Default)]
pub struct RelationshipRegistry {
    inner: RwLock<RelationshipInner>,
}

#[derive(Default)]
struct RelationshipInner {
    by_id: HashMap<RelationshipId, Relationship>,
    by_source: HashMap<HolonId, IndexSet<RelationshipId>>,
    by_target: HashMap<HolonId, IndexSet<RelationshipId>>,
}

impl RelationshipRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new edge, rejecting it if its effective range is
    /// malformed or it would close a cycle in an acyclic-constrained
    /// relationship type.
    pub fn create_relationship(&self, relationship: Relationship) -> DomainResult<RelationshipId> {
        if let Some(end) = relationship.effective_end {
            if relationship.effective_start > end {
                return Err(DomainError::Temporal(
                    "effectiveEnd precedes effectiveStart".into(),
                ));
            }
        }
        let mut inner = self.inner.write().expect("relationship registry poisoned");
        if relationship.relationship_type.must_be_acyclic()
            && would_create_cycle(
                &inner,
                &relationship.relationship_type,
                relationship.source_holon_id,
                relationship.target_holon_id,
            )
        {
            return Err(DomainError::Consistency(format!(
                "relationship {:?} from {} to {} would create a cycle",
                relationship.relationship_type,
                relationship.source_holon_id,
                relationship.target_holon_id
            )));
        }
        let id = relationship.id;
        inner
            .by_source
            .entry(relationship.source_holon_id)
            .or_default()
            .insert(id);
        inner
            .by_target
            .entry(relationship.target_holon_id)
            .or_default()
            .insert(id);
        inner.by_id.insert(id, relationship);
        Ok(id)
    }

    /// End an edge, refusing if it is already ended or if `end_date`
    /// precedes `effectiveStart`.
    pub fn end_relationship(
        &self,
        id: RelationshipId,
        end_date: DateTime<Utc>,
        _reason: &str,
        ended_by: EventId,
    ) -> DomainResult<()> {
        let mut inner = self.inner.write().expect("relationship registry poisoned");
        let edge = inner
            .by_id
            .get_mut(&id)
            .ok_or_else(|| DomainError::NotFound {
                entity_type: "Relationship",
                id: id.to_string(),
            })?;
        if edge.effective_end.is_some() {
            return Err(DomainError::Temporal(format!(
                "relationship {id} has already ended"
            )));
        }
        if end_date < edge.effective_start {
            return Err(DomainError::Temporal(
                "relationship cannot end before it started".into(),
            ));
        }
        edge.effective_end = Some(end_date);
        edge.ended_by = Some(ended_by);
        Ok(())
    }

    /// Fetch a single relationship by id.
    pub fn get_relationship(&self, id: RelationshipId) -> DomainResult<Relationship> {
        let inner = self.inner.read().expect("relationship registry poisoned");
        inner
            .by_id
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::NotFound {
                entity_type: "Relationship",
                id: id.to_string(),
            })
    }

    /// Edges with `source` as their source holon, optionally narrowed by
    /// type, matching `filter`.
    pub fn get_relationships_from(
        &self,
        source: HolonId,
        relationship_type: Option<RelationshipType>,
        filter: &RelationshipFilter,
    ) -> Vec<Relationship> {
        let inner = self.inner.read().expect("relationship registry poisoned");
        inner
            .by_source
            .get(&source)
            .into_iter()
            .flatten()
            .filter_map(|id| inner.by_id.get(id))
            .filter(|r| relationship_type.is_none_or(|t| r.relationship_type == t))
            .filter(|r| r.matches(filter))
            .cloned()
            .collect()
    }

    /// Edges with `target` as their target holon, optionally narrowed by
    /// type, matching `filter`.
    pub fn get_relationships_to(
        &self,
        target: HolonId,
        relationship_type: Option<RelationshipType>,
        filter: &RelationshipFilter,
    ) -> Vec<Relationship> {
        let inner = self.inner.read().expect("relationship registry poisoned");
        inner
            .by_target
            .get(&target)
            .into_iter()
            .flatten()
            .filter_map(|id| inner.by_id.get(id))
            .filter(|r| relationship_type.is_none_or(|t| r.relationship_type == t))
            .filter(|r| r.matches(filter))
            .cloned()
            .collect()
    }

    /// Every edge of a given type matching `filter`.
    pub fn get_relationships_by_type(
        &self,
        relationship_type: RelationshipType,
        filter: &RelationshipFilter,
    ) -> Vec<Relationship> {
        let inner = self.inner.read().expect("relationship registry poisoned");
        inner
            .by_id
            .values()
            .filter(|r| r.relationship_type == relationship_type)
            .filter(|r| r.matches(filter))
            .cloned()
            .collect()
    }
}

trait OptionExt<T> {
    fn is_none_or(self, f: impl FnOnce(T) -> bool) -> bool;
}

impl<T: Copy> OptionExt<T> for Option<T> {
    fn is_none_or(self, f: impl FnOnce(T) -> bool) -> bool {
        match self {
            Some(value) => f(value),
            None => true,
        }
    }
}

/// `true` if adding an edge `source -> target` of `relationship_type` would
/// close a cycle, found by a breadth-first walk backward from `target`
/// looking for a path that already reaches `source`.
fn would_create_cycle(
    inner: &RelationshipInner,
    relationship_type: &RelationshipType,
    source: HolonId,
    target: HolonId,
) -> bool {
    if source == target {
        return true;
    }
    let mut visited: HashSet<HolonId> = HashSet::new();
    let mut queue: VecDeque<HolonId> = VecDeque::new();
    queue.push_back(target);
    visited.insert(target);
    while let Some(node) = queue.pop_front() {
        let edges = inner
            .by_source
            .get(&node)
            .into_iter()
            .flatten()
            .filter_map(|id| inner.by_id.get(id));
        for edge in edges {
            if &edge.relationship_type != relationship_type {
                continue;
            }
            if edge.target_holon_id == source {
                return true;
            }
            if visited.insert(edge.target_holon_id) {
                queue.push_back(edge.target_holon_id);
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::seq::SliceRandom;

    fn edge(source: HolonId, target: HolonId, rt: RelationshipType) -> Relationship {
        Relationship {
            id: RelationshipId::new(),
            relationship_type: rt,
            source_holon_id: source,
            target_holon_id: target,
            properties: serde_json::json!({}),
            effective_start: Utc::now(),
            effective_end: None,
            source_system: None,
            source_documents: vec![],
            created_by: EventId::new(),
            ended_by: None,
            authority_level: AuthorityLevel::Authoritative,
            confidence_score: None,
        }
    }

    #[test]
    fn rejects_self_loop_on_acyclic_type() {
        let registry = RelationshipRegistry::new();
        let a = HolonId::new();
        let result = registry.create_relationship(edge(a, a, RelationshipType::DependsOn));
        assert!(result.is_err());
    }

    #[test]
    fn rejects_cycle_across_three_nodes() {
        let registry = RelationshipRegistry::new();
        let (a, b, c) = (HolonId::new(), HolonId::new(), HolonId::new());
        registry
            .create_relationship(edge(a, b, RelationshipType::DependsOn))
            .unwrap();
        registry
            .create_relationship(edge(b, c, RelationshipType::DependsOn))
            .unwrap();
        let result = registry.create_relationship(edge(c, a, RelationshipType::DependsOn));
        assert!(result.is_err());
    }

    #[test]
    fn allows_diamond_shaped_dag() {
        let registry = RelationshipRegistry::new();
        let (a, b, c, d) = (
            HolonId::new(),
            HolonId::new(),
            HolonId::new(),
            HolonId::new(),
        );
        registry
            .create_relationship(edge(a, b, RelationshipType::DependsOn))
            .unwrap();
        registry
            .create_relationship(edge(a, c, RelationshipType::DependsOn))
            .unwrap();
        registry
            .create_relationship(edge(b, d, RelationshipType::DependsOn))
            .unwrap();
        registry
            .create_relationship(edge(c, d, RelationshipType::DependsOn))
            .unwrap();
    }

    #[test]
    fn end_relationship_rejects_second_close() {
        let registry = RelationshipRegistry::new();
        let (a, b) = (HolonId::new(), HolonId::new());
        let id = registry
            .create_relationship(edge(a, b, RelationshipType::HeldBy))
            .unwrap();
        registry
            .end_relationship(id, Utc::now(), "expired", EventId::new())
            .unwrap();
        let result = registry.end_relationship(id, Utc::now(), "expired again", EventId::new());
        assert!(result.is_err());
    }

    #[test]
    fn end_relationship_rejects_end_before_start() {
        let registry = RelationshipRegistry::new();
        let (a, b) = (HolonId::new(), HolonId::new());
        let id = registry
            .create_relationship(edge(a, b, RelationshipType::HeldBy))
            .unwrap();
        let past = Utc::now() - chrono::Duration::days(365);
        assert!(registry
            .end_relationship(id, past, "bad", EventId::new())
            .is_err());
    }

    #[test]
    fn include_ended_controls_visibility_of_closed_edges() {
        let registry = RelationshipRegistry::new();
        let (a, b) = (HolonId::new(), HolonId::new());
        let id = registry
            .create_relationship(edge(a, b, RelationshipType::HeldBy))
            .unwrap();
        registry
            .end_relationship(id, Utc::now(), "expired", EventId::new())
            .unwrap();
        let excluding = registry.get_relationships_from(a, None, &RelationshipFilter::default());
        assert!(excluding.is_empty());
        let including = registry.get_relationships_from(
            a,
            None,
            &RelationshipFilter {
                include_ended: true,
                ..Default::default()
            },
        );
        assert_eq!(including.len(), 1);
    }

    proptest! {
        #[test]
        fn depends_on_edges_in_topological_order_never_cycle(n in 2usize..8) {
            let nodes: Vec<HolonId> = (0..n).map(|_| HolonId::new()).collect();
            let mut edges: Vec<(usize, usize)> = Vec::new();
            for i in 0..n {
                for j in (i + 1)..n {
                    edges.push((i, j));
                }
            }
            edges.shuffle(&mut rand::thread_rng());

            let registry = RelationshipRegistry::new();
            for (i, j) in edges {
                registry
                    .create_relationship(edge(nodes[i], nodes[j], RelationshipType::DependsOn))
                    .expect("an edge respecting a fixed topological order must never close a cycle");
            }
        }
    }
}
