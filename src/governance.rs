// Copyright 2025 Cowboy AI, LLC.

//! Governance: the proposal workflow that gates schema changes, producing
//! a decision document for every approval or rejection.

use crate::document::{Document, DocumentRegistry, DocumentType};
use crate::errors::{DomainError, DomainResult, ValidationIssue, ValidationOutcome};
use crate::holon::HolonType;
use crate::ids::{DocumentId, EventId, ProposalId, SchemaVersionId};
use crate::schema::{detect_holon_type_collision, CollisionReport, HolonTypeDefinition, SchemaRegistry};
use crate::temporal::EffectiveRange;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// The kind of schema change a proposal requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalType {
    /// Introduce a new holon type.
    AddHolonType,
    /// Introduce a new constraint.
    AddConstraint,
    /// Introduce a new measure.
    AddMeasure,
    /// Introduce a new lens.
    AddLens,
    /// Modify an existing type.
    ModifyType,
    /// Deprecate an existing type.
    DeprecateType,
}

/// Status of a schema change proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    /// Submitted, awaiting a decision.
    Proposed,
    /// Approved; the change has been applied.
    Approved,
    /// Rejected; no change was applied.
    Rejected,
}

impl crate::state_machine::State for ProposalStatus {
    fn is_terminal(&self) -> bool {
        matches!(self, ProposalStatus::Approved | ProposalStatus::Rejected)
    }
}

/// Whether a change would break existing holons/relationships, and the
/// scope of what it affects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactAnalysis {
    /// Whether applying the proposal is a breaking change.
    pub breaking: bool,
    /// Free-text description of what is affected.
    pub notes: String,
}

/// A request to change the schema: add a type, constraint, measure, or
/// lens, or modify/deprecate an existing type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaChangeProposal {
    /// Unique identifier.
    pub id: ProposalId,
    /// Kind of change requested.
    pub proposal_type: ProposalType,
    /// Current status.
    pub status: ProposalStatus,
    /// Definition of the holon type being added, for `AddHolonType`.
    pub holon_type_definition: Option<HolonTypeDefinition>,
    /// The existing type targeted, for `ModifyType` / `DeprecateType`.
    pub target_type: Option<HolonType>,
    /// Documents supporting this proposal.
    pub reference_documents: Vec<DocumentId>,
    /// Example use cases, required for `AddHolonType`.
    pub example_use_cases: Vec<String>,
    /// Result of comparing the proposed definition against existing ones.
    pub collision_analysis: Option<CollisionReport>,
    /// Result of assessing what the change would affect.
    pub impact_analysis: Option<ImpactAnalysis>,
    /// Free-text description of a constraint/measure/lens payload, used
    /// for proposal types that do not carry a typed definition.
    pub payload_description: Option<String>,
    /// Rationale for the change.
    pub rationale: String,
    /// Identifier of the actor who submitted this proposal.
    pub proposed_by: String,
    /// When the proposal was submitted.
    pub submitted_at: DateTime<Utc>,
    /// When the proposal was decided, if it has been.
    pub decided_at: Option<DateTime<Utc>>,
    /// Identifier of the actor who decided this proposal, if it has been.
    pub decided_by: Option<String>,
    /// The decision document recorded when this proposal was decided.
    pub decision_document: Option<DocumentId>,
}

/// Governs the lifecycle of schema change proposals, applying approved
/// `AddHolonType`/`ModifyType`/`DeprecateType` proposals to the schema
/// registry and recording a decision document for every outcome.
pub struct GovernanceEngine<'a> {
    schema_registry: &'a SchemaRegistry,
    documents: &'a DocumentRegistry,
    proposals: RwLock<HashMap<ProposalId, SchemaChangeProposal>>,
    known_holon_types: RwLock<HashMap<HolonType, HolonTypeDefinition>>,
}

impl<'a> GovernanceEngine<'a> {
    /// Bind a governance engine to the schema registry it approves changes
    /// into and the document registry it files decisions in.
    pub fn new(schema_registry: &'a SchemaRegistry, documents: &'a DocumentRegistry) -> Self {
        Self {
            schema_registry,
            documents,
            proposals: RwLock::new(HashMap::new()),
            known_holon_types: RwLock::new(HashMap::new()),
        }
    }

    /// Submit a proposal. Runs no validation itself — call
    /// [`GovernanceEngine::validate_proposal`] before acting on the result.
    pub fn create_proposal(&self, mut proposal: SchemaChangeProposal) -> ProposalId {
        proposal.id = ProposalId::new();
        proposal.status = ProposalStatus::Proposed;
        proposal.decided_at = None;
        proposal.decided_by = None;
        proposal.decision_document = None;
        let id = proposal.id;
        self.proposals
            .write()
            .expect("governance engine poisoned")
            .insert(id, proposal);
        id
    }

    /// Compare a proposed holon type definition against every previously
    /// registered holon type definition with the same type.
    pub fn perform_collision_analysis(&self, definition: &HolonTypeDefinition) -> CollisionReport {
        let known = self.known_holon_types.read().expect("governance engine poisoned");
        match known.get(&definition.holon_type) {
            Some(existing) => detect_holon_type_collision(definition, existing),
            None => CollisionReport {
                collides: false,
                detail: None,
            },
        }
    }

    /// Assess what a proposal would affect. The reference implementation
    /// treats any `AddHolonType` whose collision analysis found a
    /// property-set mismatch as breaking; `ModifyType`/`DeprecateType` are
    /// always breaking; everything else is additive.
    pub fn perform_impact_analysis(&self, proposal: &SchemaChangeProposal) -> ImpactAnalysis {
        match proposal.proposal_type {
            ProposalType::AddHolonType => {
                let breaking = proposal
                    .collision_analysis
                    .as_ref()
                    .is_some_and(|c| c.collides);
                ImpactAnalysis {
                    breaking,
                    notes: if breaking {
                        "redefines an existing holon type's property set".into()
                    } else {
                        "introduces a new holon type".into()
                    },
                }
            }
            ProposalType::ModifyType | ProposalType::DeprecateType => ImpactAnalysis {
                breaking: true,
                notes: "modifies or retires an existing type".into(),
            },
            _ => ImpactAnalysis {
                breaking: false,
                notes: "additive change".into(),
            },
        }
    }

    /// Check a proposal's completeness per the rules keyed by its
    /// `proposal_type`. Every proposal type requires at least one
    /// reference document; an absent impact analysis is a warning for
    /// additive changes and an error for `AddConstraint`/`ModifyType`/
    /// `DeprecateType`.
    pub fn validate_proposal(&self, proposal: &SchemaChangeProposal) -> ValidationOutcome {
        let mut outcome = ValidationOutcome::ok();

        if proposal.reference_documents.is_empty() {
            outcome.push_error(ValidationIssue::new(
                "proposal completeness",
                "proposal must carry at least one reference document",
            ));
        }

        let impact_required = matches!(
            proposal.proposal_type,
            ProposalType::AddConstraint | ProposalType::ModifyType | ProposalType::DeprecateType
        );
        if proposal.impact_analysis.is_none() {
            if impact_required {
                outcome.push_error(ValidationIssue::new(
                    "impact analysis required",
                    "this proposal type requires an impact analysis",
                ));
            } else {
                outcome.push_warning(ValidationIssue::new(
                    "impact analysis recommended",
                    "no impact analysis was attached",
                ));
            }
        }

        match proposal.proposal_type {
            ProposalType::AddHolonType => {
                match &proposal.holon_type_definition {
                    None => outcome.push_error(ValidationIssue::new(
                        "holon type definition required",
                        "add_holon_type proposal carries no holon type definition",
                    )),
                    Some(definition) => {
                        if definition.description.trim().len() < 10 {
                            outcome.push_error(ValidationIssue::new(
                                "definition description too short",
                                "holon type description must be at least 10 characters",
                            ));
                        }
                        if definition.property_names.is_empty() {
                            outcome.push_warning(ValidationIssue::new(
                                "no required properties declared",
                                "consider declaring at least one required property",
                            ));
                        }
                    }
                }
                if proposal.example_use_cases.is_empty() {
                    outcome.push_error(ValidationIssue::new(
                        "example use case required",
                        "add_holon_type proposal must include at least one example use case",
                    ));
                }
                if proposal.collision_analysis.is_none() {
                    outcome.push_error(ValidationIssue::new(
                        "collision analysis required",
                        "add_holon_type proposal must include a collision analysis",
                    ));
                }
            }
            ProposalType::AddConstraint => match &proposal.payload_description {
                None => outcome.push_error(ValidationIssue::new(
                    "constraint definition required",
                    "add_constraint proposal carries no constraint definition",
                )),
                Some(description) if description.trim().len() < 10 => {
                    outcome.push_error(ValidationIssue::new(
                        "constraint definition too short",
                        "constraint definition must be at least 10 characters",
                    ));
                }
                Some(_) => {}
            },
            ProposalType::AddMeasure | ProposalType::AddLens => {
                if proposal
                    .payload_description
                    .as_ref()
                    .map(|d| d.trim().is_empty())
                    .unwrap_or(true)
                {
                    outcome.push_error(ValidationIssue::new(
                        "definition required",
                        "add_measure/add_lens proposal must include a meaningful description",
                    ));
                }
            }
            ProposalType::ModifyType | ProposalType::DeprecateType => {
                if proposal.target_type.is_none() {
                    outcome.push_error(ValidationIssue::new(
                        "target type required",
                        "modify_type/deprecate_type proposal must name a target type",
                    ));
                }
            }
        }

        outcome
    }

    /// Approve a proposal: re-validates it, applies the change, records a
    /// decision document, and marks the proposal approved.
    pub fn approve_proposal(
        &self,
        id: ProposalId,
        decided_by: impl Into<String>,
        rationale: impl Into<String>,
        event_id: EventId,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        let proposal = self.get_proposal(id)?;
        let outcome = self.validate_proposal(&proposal);
        if !outcome.is_valid() {
            return Err(DomainError::from(outcome));
        }

        if let (ProposalType::AddHolonType, Some(definition)) =
            (proposal.proposal_type, &proposal.holon_type_definition)
        {
            self.known_holon_types
                .write()
                .expect("governance engine poisoned")
                .insert(definition.holon_type, definition.clone());
        }
        if matches!(
            proposal.proposal_type,
            ProposalType::AddHolonType | ProposalType::ModifyType | ProposalType::DeprecateType
        ) {
            if let Some(schema_id) = self.schema_version_for(&proposal) {
                self.schema_registry.activate(schema_id)?;
            }
        }

        let decided_by = decided_by.into();
        let rationale = rationale.into();
        let decision_document = self.file_decision_document(
            &proposal,
            "approved",
            &rationale,
            &decided_by,
            event_id,
            now,
        )?;

        let mut proposals = self.proposals.write().expect("governance engine poisoned");
        let proposal = proposals
            .get_mut(&id)
            .ok_or_else(|| DomainError::NotFound {
                entity_type: "SchemaChangeProposal",
                id: id.to_string(),
            })?;
        proposal.status = ProposalStatus::Approved;
        proposal.decided_at = Some(now);
        proposal.decided_by = Some(decided_by);
        proposal.decision_document = Some(decision_document);
        Ok(())
    }

    /// Reject a proposal, recording a decision document with `rationale`
    /// as the reason.
    pub fn reject_proposal(
        &self,
        id: ProposalId,
        decided_by: impl Into<String>,
        rationale: impl Into<String>,
        event_id: EventId,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        let proposal = self.get_proposal(id)?;
        let decided_by = decided_by.into();
        let rationale = rationale.into();
        let decision_document = self.file_decision_document(
            &proposal,
            "rejected",
            &rationale,
            &decided_by,
            event_id,
            now,
        )?;

        let mut proposals = self.proposals.write().expect("governance engine poisoned");
        let proposal = proposals
            .get_mut(&id)
            .ok_or_else(|| DomainError::NotFound {
                entity_type: "SchemaChangeProposal",
                id: id.to_string(),
            })?;
        proposal.status = ProposalStatus::Rejected;
        proposal.decided_at = Some(now);
        proposal.decided_by = Some(decided_by);
        proposal.decision_document = Some(decision_document);
        Ok(())
    }

    fn schema_version_for(&self, proposal: &SchemaChangeProposal) -> Option<SchemaVersionId> {
        let holon_type = proposal
            .holon_type_definition
            .as_ref()
            .map(|d| d.holon_type)
            .or(proposal.target_type)?;
        self.schema_registry
            .history_for(holon_type)
            .into_iter()
            .max_by_key(|v| v.version)
            .map(|v| v.id)
    }

    fn file_decision_document(
        &self,
        proposal: &SchemaChangeProposal,
        decision: &str,
        rationale: &str,
        decided_by: &str,
        event_id: EventId,
        now: DateTime<Utc>,
    ) -> DomainResult<DocumentId> {
        let content = serde_json::json!({
            "proposalId": proposal.id,
            "proposalType": proposal.proposal_type,
            "decision": decision,
            "rationale": rationale,
            "decidedBy": decided_by,
            "decidedAt": now,
            "referenceDocuments": proposal.reference_documents,
            "impactAnalysis": proposal.impact_analysis,
            "collisionAnalysis": proposal.collision_analysis,
        })
        .to_string();

        let document = Document {
            id: DocumentId::new(),
            document_type: DocumentType::DecisionRecord,
            title: format!("Governance decision for proposal {}", proposal.id),
            reference_numbers: vec![],
            content,
            version: 1,
            classification_metadata: serde_json::json!({}),
            effective: EffectiveRange::open(now),
            created_by_event: event_id,
            linked_constraint_ids: vec![],
            recorded_at: now,
        };
        let id = document.id;
        self.documents.file(document)?;
        Ok(id)
    }

    /// Fetch a proposal by id.
    pub fn get_proposal(&self, id: ProposalId) -> DomainResult<SchemaChangeProposal> {
        self.proposals
            .read()
            .expect("governance engine poisoned")
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::NotFound {
                entity_type: "SchemaChangeProposal",
                id: id.to_string(),
            })
    }

    /// All proposals with the given status.
    pub fn get_proposals_by_status(&self, status: ProposalStatus) -> Vec<SchemaChangeProposal> {
        self.proposals
            .read()
            .expect("governance engine poisoned")
            .values()
            .filter(|p| p.status == status)
            .cloned()
            .collect()
    }
}
