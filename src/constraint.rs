// Copyright 2025 Cowboy AI, LLC.

//! The constraint engine: named, scoped validation rules with
//! precedence-based inheritance.
//!
//! A constraint's scope is a subset of holon types, relationship types,
//! and event types — any combination. Holon-type constraints additionally
//! support inheritance: a constraint whose `inheritance_rules.inherits_from`
//! names a holon type applies to that type even if not directly scoped to
//! it, and may be overridden by a same-named direct constraint if the
//! inherited constraint allows it.

use crate::document::DocumentRegistry;
use crate::errors::ValidationOutcome;
use crate::event::{Event, EventType};
use crate::holon::{Holon, HolonType};
use crate::ids::{ConstraintId, DocumentId};
use crate::relationship::{Relationship, RelationshipType};
use crate::temporal::EffectiveRange;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::RwLock;

/// The kind of rule a constraint enforces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintType {
    /// Shape/field-presence rules.
    Structural,
    /// Business-policy rules.
    Policy,
    /// Rules over timestamps or effective ranges.
    Temporal,
    /// Escape hatch for kinds not yet promoted to the closed set.
    Custom(String),
}

/// Which holon/relationship/event types a constraint applies to. A
/// constraint may be scoped to any combination; an empty set for a given
/// entity kind means the constraint does not apply to that kind at all.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConstraintScope {
    /// Holon types this constraint directly applies to.
    pub holon_types: HashSet<HolonType>,
    /// Relationship types this constraint applies to.
    pub relationship_types: HashSet<RelationshipType>,
    /// Event types this constraint applies to.
    pub event_types: HashSet<EventType>,
}

/// Inheritance behavior for a holon-type-scoped constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InheritanceRules {
    /// Holon types that inherit this constraint even when not in
    /// `ConstraintScope::holon_types`.
    pub inherits_from: Vec<HolonType>,
    /// Whether a same-named direct constraint may replace this one.
    pub can_override: bool,
    /// The minimum precedence a direct constraint must carry to replace
    /// this one.
    pub override_precedence: i32,
}

/// A named, scoped validation rule. A rule need only implement the
/// evaluation hooks relevant to the entity kinds in its scope; the
/// defaults pass everything.
pub trait ConstraintRule: Send + Sync {
    /// Evaluate this rule against a holon.
    fn evaluate_holon(&self, _holon: &Holon) -> ValidationOutcome {
        ValidationOutcome::ok()
    }

    /// Evaluate this rule against a relationship.
    fn evaluate_relationship(&self, _relationship: &Relationship) -> ValidationOutcome {
        ValidationOutcome::ok()
    }

    /// Evaluate this rule against an event.
    fn evaluate_event(&self, _event: &Event) -> ValidationOutcome {
        ValidationOutcome::ok()
    }
}

/// A constraint registered in the engine: a rule plus its scope,
/// precedence, and inheritance policy.
pub struct Constraint {
    /// Unique identifier.
    pub id: ConstraintId,
    /// Kind of rule this constraint enforces.
    pub constraint_type: ConstraintType,
    /// Human-readable name, unique within the engine.
    pub name: String,
    /// Free-form description of what this constraint checks.
    pub definition: String,
    /// Where this constraint applies.
    pub scope: ConstraintScope,
    /// When this constraint is in force.
    pub effective: EffectiveRange,
    /// Documents that ground this constraint's authority.
    pub source_documents: Vec<DocumentId>,
    /// Precedence among constraints with the same name; higher wins.
    pub precedence: i32,
    /// Inheritance policy, for holon-type constraints only.
    pub inheritance_rules: Option<InheritanceRules>,
    /// The validation logic itself.
    pub rule: Box<dyn ConstraintRule>,
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constraint")
            .field("id", &self.id)
            .field("constraint_type", &self.constraint_type)
            .field("name", &self.name)
            .field("scope", &self.scope)
            .field("precedence", &self.precedence)
            .finish()
    }
}

impl Constraint {
    fn effective_at(&self, at: DateTime<Utc>) -> bool {
        self.effective.contains_half_open(at)
    }
}

/// Registry of constraints, queryable by scope.
#[derive(Default)]
pub struct ConstraintEngine {
    inner: RwLock<Vec<Constraint>>,
}

impl ConstraintEngine {
    /// An empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constraint, linking its source documents into
    /// `documents`, and returning its id.
    pub fn register(&self, constraint: Constraint, documents: &DocumentRegistry) -> ConstraintId {
        let id = constraint.id;
        for document_id in &constraint.source_documents {
            let _ = documents.link_to_constraints(*document_id, vec![id]);
        }
        self.inner
            .write()
            .expect("constraint engine poisoned")
            .push(constraint);
        id
    }

    /// Unregister a constraint by id.
    pub fn unregister(&self, id: ConstraintId) {
        self.inner
            .write()
            .expect("constraint engine poisoned")
            .retain(|c| c.id != id);
    }

    /// Constraints directly scoped to `holon_type` and effective at `at`.
    pub fn applicable_for_holon_type(
        &self,
        holon_type: HolonType,
        at: DateTime<Utc>,
    ) -> Vec<ConstraintId> {
        self.inner
            .read()
            .expect("constraint engine poisoned")
            .iter()
            .filter(|c| c.scope.holon_types.contains(&holon_type) && c.effective_at(at))
            .map(|c| c.id)
            .collect()
    }

    /// Constraints directly scoped to `relationship_type` and effective at
    /// `at`.
    pub fn applicable_for_relationship_type(
        &self,
        relationship_type: RelationshipType,
        at: DateTime<Utc>,
    ) -> Vec<ConstraintId> {
        self.inner
            .read()
            .expect("constraint engine poisoned")
            .iter()
            .filter(|c| {
                c.scope.relationship_types.contains(&relationship_type) && c.effective_at(at)
            })
            .map(|c| c.id)
            .collect()
    }

    /// Constraints directly scoped to `event_type` and effective at `at`.
    pub fn applicable_for_event_type(
        &self,
        event_type: EventType,
        at: DateTime<Utc>,
    ) -> Vec<ConstraintId> {
        self.inner
            .read()
            .expect("constraint engine poisoned")
            .iter()
            .filter(|c| c.scope.event_types.contains(&event_type) && c.effective_at(at))
            .map(|c| c.id)
            .collect()
    }

    /// Validate a holon against every directly-applicable and inherited
    /// constraint, merged per the five-step algorithm: direct constraints
    /// for the holon's type, inherited constraints from constraints whose
    /// `inheritance_rules.inherits_from` names the type, merged keyed by
    /// name with direct replacing inherited only when the inherited entry
    /// allows an override at or below the direct constraint's precedence,
    /// sorted by descending precedence, then run in order.
    pub fn validate_holon(&self, holon: &Holon, at: DateTime<Utc>) -> ValidationOutcome {
        let inner = self.inner.read().expect("constraint engine poisoned");
        let holon_type = holon.holon_type();

        let direct: Vec<&Constraint> = inner
            .iter()
            .filter(|c| c.scope.holon_types.contains(&holon_type) && c.effective_at(at))
            .collect();
        let inherited: Vec<&Constraint> = inner
            .iter()
            .filter(|c| {
                c.effective_at(at)
                    && c.inheritance_rules
                        .as_ref()
                        .is_some_and(|r| r.inherits_from.contains(&holon_type))
            })
            .collect();

        let mut merged: Vec<&Constraint> = Vec::new();
        for inherited_constraint in inherited {
            let overridden = direct.iter().find(|d| d.name == inherited_constraint.name);
            match (overridden, &inherited_constraint.inheritance_rules) {
                (Some(direct_constraint), Some(rules))
                    if rules.can_override && direct_constraint.precedence >= rules.override_precedence =>
                {
                    merged.push(direct_constraint);
                }
                _ => merged.push(inherited_constraint),
            }
        }
        for direct_constraint in &direct {
            if !merged.iter().any(|c| c.name == direct_constraint.name) {
                merged.push(direct_constraint);
            }
        }
        merged.sort_by(|a, b| b.precedence.cmp(&a.precedence));

        let mut outcome = ValidationOutcome::ok();
        for constraint in merged {
            outcome.extend(constraint.rule.evaluate_holon(holon));
        }
        outcome
    }

    /// Validate a relationship against every directly-applicable
    /// constraint, sorted by descending precedence. Relationship
    /// constraints do not participate in inheritance.
    pub fn validate_relationship(
        &self,
        relationship: &Relationship,
        at: DateTime<Utc>,
    ) -> ValidationOutcome {
        let inner = self.inner.read().expect("constraint engine poisoned");
        let mut applicable: Vec<&Constraint> = inner
            .iter()
            .filter(|c| {
                c.scope
                    .relationship_types
                    .contains(&relationship.relationship_type)
                    && c.effective_at(at)
            })
            .collect();
        applicable.sort_by(|a, b| b.precedence.cmp(&a.precedence));
        let mut outcome = ValidationOutcome::ok();
        for constraint in applicable {
            outcome.extend(constraint.rule.evaluate_relationship(relationship));
        }
        outcome
    }

    /// Validate an event against every directly-applicable constraint,
    /// sorted by descending precedence. Event constraints do not
    /// participate in inheritance.
    pub fn validate_event(&self, event: &Event, at: DateTime<Utc>) -> ValidationOutcome {
        let inner = self.inner.read().expect("constraint engine poisoned");
        let mut applicable: Vec<&Constraint> = inner
            .iter()
            .filter(|c| c.scope.event_types.contains(&event.event_type) && c.effective_at(at))
            .collect();
        applicable.sort_by(|a, b| b.precedence.cmp(&a.precedence));
        let mut outcome = ValidationOutcome::ok();
        for constraint in applicable {
            outcome.extend(constraint.rule.evaluate_event(event));
        }
        outcome
    }

    /// Number of registered constraints, for diagnostics.
    pub fn len(&self) -> usize {
        self.inner.read().expect("constraint engine poisoned").len()
    }

    /// `true` if no constraints are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ValidationIssue;
    use crate::holon::HolonProperties;
    use crate::ids::EventId;

    struct AlwaysFails(&'static str);
    impl ConstraintRule for AlwaysFails {
        fn evaluate_holon(&self, _holon: &Holon) -> ValidationOutcome {
            let mut outcome = ValidationOutcome::ok();
            outcome.push_error(ValidationIssue::new(self.0, "failed"));
            outcome
        }
    }

    struct AlwaysPasses;
    impl ConstraintRule for AlwaysPasses {}

    fn person_holon() -> Holon {
        Holon::new(
            HolonProperties::Person {
                edipi: "1234567890".into(),
                service_numbers: vec![],
                name: "Ada".into(),
                dob: Utc::now(),
                service_branch: "Navy".into(),
                designator_rating: "1810".into(),
                category: crate::holon::PersonCategory::ActiveDuty,
            },
            EventId::new(),
            vec![DocumentId::new()],
            Utc::now(),
        )
        .unwrap()
    }

    fn base_constraint(
        name: &str,
        holon_types: HashSet<HolonType>,
        precedence: i32,
        rule: Box<dyn ConstraintRule>,
    ) -> Constraint {
        Constraint {
            id: ConstraintId::new(),
            constraint_type: ConstraintType::Policy,
            name: name.into(),
            definition: "test constraint".into(),
            scope: ConstraintScope {
                holon_types,
                relationship_types: HashSet::new(),
                event_types: HashSet::new(),
            },
            effective: EffectiveRange::open(Utc::now() - chrono::Duration::days(1)),
            source_documents: vec![],
            precedence,
            inheritance_rules: None,
            rule,
        }
    }

    fn register_direct(engine: &ConstraintEngine, constraint: Constraint) {
        let documents = DocumentRegistry::new();
        engine.register(constraint, &documents);
    }

    #[test]
    fn type_scoped_constraint_only_applies_to_matching_type() {
        let engine = ConstraintEngine::new();
        register_direct(
            &engine,
            base_constraint(
                "mission-only",
                HashSet::from([HolonType::Mission]),
                0,
                Box::new(AlwaysFails("mission-only")),
            ),
        );
        let outcome = engine.validate_holon(&person_holon(), Utc::now());
        assert!(outcome.is_valid());
    }

    #[test]
    fn unscoped_holon_type_fails_when_constraint_matches() {
        let engine = ConstraintEngine::new();
        register_direct(
            &engine,
            base_constraint(
                "must-have-name",
                HashSet::from([HolonType::Person]),
                0,
                Box::new(AlwaysFails("must-have-name")),
            ),
        );
        let outcome = engine.validate_holon(&person_holon(), Utc::now());
        assert!(!outcome.is_valid());
    }

    #[test]
    fn inherited_constraint_overridden_by_direct_when_allowed() {
        let engine = ConstraintEngine::new();
        let documents = DocumentRegistry::new();
        let inherited = Constraint {
            inheritance_rules: Some(InheritanceRules {
                inherits_from: vec![HolonType::Person],
                can_override: true,
                override_precedence: 5,
            }),
            ..base_constraint(
                "shared-rule",
                HashSet::new(),
                0,
                Box::new(AlwaysFails("inherited-fails")),
            )
        };
        engine.register(inherited, &documents);
        let direct = base_constraint(
            "shared-rule",
            HashSet::from([HolonType::Person]),
            10,
            Box::new(AlwaysPasses),
        );
        engine.register(direct, &documents);
        let outcome = engine.validate_holon(&person_holon(), Utc::now());
        assert!(outcome.is_valid());
    }

    #[test]
    fn inherited_constraint_not_overridden_when_precedence_too_low() {
        let engine = ConstraintEngine::new();
        let documents = DocumentRegistry::new();
        let inherited = Constraint {
            inheritance_rules: Some(InheritanceRules {
                inherits_from: vec![HolonType::Person],
                can_override: true,
                override_precedence: 50,
            }),
            ..base_constraint(
                "shared-rule",
                HashSet::new(),
                0,
                Box::new(AlwaysFails("inherited-fails")),
            )
        };
        engine.register(inherited, &documents);
        let direct = base_constraint(
            "shared-rule",
            HashSet::from([HolonType::Person]),
            10,
            Box::new(AlwaysPasses),
        );
        engine.register(direct, &documents);
        let outcome = engine.validate_holon(&person_holon(), Utc::now());
        assert!(!outcome.is_valid());
    }

    #[test]
    fn expired_constraint_does_not_apply() {
        let engine = ConstraintEngine::new();
        let documents = DocumentRegistry::new();
        let past_start = Utc::now() - chrono::Duration::days(30);
        let past_end = Utc::now() - chrono::Duration::days(1);
        let constraint = Constraint {
            effective: EffectiveRange::new(past_start, Some(past_end)),
            ..base_constraint(
                "expired",
                HashSet::from([HolonType::Person]),
                0,
                Box::new(AlwaysFails("expired")),
            )
        };
        engine.register(constraint, &documents);
        let outcome = engine.validate_holon(&person_holon(), Utc::now());
        assert!(outcome.is_valid());
    }
}
