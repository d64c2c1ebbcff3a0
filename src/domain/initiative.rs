// Copyright 2025 Cowboy AI, LLC.

//! Initiative and Task management: the ALIGNED_TO/PART_OF hierarchy
//! tying tasks to initiatives to objectives, the Task dependency DAG,
//! and the Moore-table status/stage lifecycles governing both.

use crate::errors::{DomainError, DomainResult};
use crate::event::{CausalLinks, Event, EventStore, EventType};
use crate::holon::{Holon, HolonProperties, HolonRegistry, InitiativeStage, TaskPriority, TaskStatus};
use crate::ids::{EventId, HolonId, RelationshipId};
use crate::relationship::{AuthorityLevel, Relationship, RelationshipFilter, RelationshipRegistry, RelationshipType};
use crate::state_machine::Transitions;
use chrono::{DateTime, Utc};

/// The legal Task status transitions: created -> assigned -> started ->
/// {blocked -> started, completed, cancelled}.
pub struct TaskStatusTable;

impl Transitions for TaskStatusTable {
    type State = TaskStatus;
    type Input = TaskStatus;

    fn transition(&self, current: &TaskStatus, input: &TaskStatus) -> Result<TaskStatus, String> {
        use TaskStatus::*;
        let allowed = matches!(
            (current, input),
            (Created, Assigned)
                | (Created, Cancelled)
                | (Assigned, Started)
                | (Assigned, Cancelled)
                | (Started, Blocked)
                | (Started, Completed)
                | (Started, Cancelled)
                | (Blocked, Started)
                | (Blocked, Cancelled)
        );
        if allowed {
            Ok(*input)
        } else {
            Err(format!("cannot move task from {current:?} to {input:?}"))
        }
    }
}

/// The legal Initiative stage transitions: proposed -> approved ->
/// planned -> active -> {paused -> active, completed, cancelled}.
pub struct InitiativeStageTable;

impl Transitions for InitiativeStageTable {
    type State = InitiativeStage;
    type Input = InitiativeStage;

    fn transition(&self, current: &InitiativeStage, input: &InitiativeStage) -> Result<InitiativeStage, String> {
        use InitiativeStage::*;
        let allowed = matches!(
            (current, input),
            (Proposed, Approved)
                | (Proposed, Cancelled)
                | (Approved, Planned)
                | (Approved, Cancelled)
                | (Planned, Active)
                | (Planned, Cancelled)
                | (Active, Paused)
                | (Active, Completed)
                | (Active, Cancelled)
                | (Paused, Active)
                | (Paused, Cancelled)
        );
        if allowed {
            Ok(*input)
        } else {
            Err(format!("cannot move initiative from {current:?} to {input:?}"))
        }
    }
}

/// Facade over Initiative/Task creation, alignment, and lifecycle.
pub struct InitiativeManager<'a> {
    holons: &'a HolonRegistry,
    relationships: &'a RelationshipRegistry,
    events: &'a EventStore,
}

impl<'a> InitiativeManager<'a> {
    /// Bind a manager to its registries.
    pub fn new(
        holons: &'a HolonRegistry,
        relationships: &'a RelationshipRegistry,
        events: &'a EventStore,
    ) -> Self {
        Self {
            holons,
            relationships,
            events,
        }
    }

    /// Record that an Initiative holon was created.
    pub fn record_initiative_created(&self, initiative: HolonId, actor: HolonId, now: DateTime<Utc>) -> DomainResult<EventId> {
        let event = Event::new(
            EventType::InitiativeCreated,
            vec![initiative],
            now,
            actor,
            serde_json::json!({}),
            CausalLinks::default(),
            now,
        )?;
        self.events.append(event)
    }

    /// Record that a Task holon was created.
    pub fn record_task_created(&self, task: HolonId, actor: HolonId, now: DateTime<Utc>) -> DomainResult<EventId> {
        let event = Event::new(
            EventType::TaskCreated,
            vec![task],
            now,
            actor,
            serde_json::json!({}),
            CausalLinks::default(),
            now,
        )?;
        self.events.append(event)
    }

    /// Align `initiative` to `objective`.
    pub fn align_to_objective(
        &self,
        initiative: HolonId,
        objective: HolonId,
        actor: HolonId,
        now: DateTime<Utc>,
    ) -> DomainResult<RelationshipId> {
        if !self.holons.exists(initiative) {
            return Err(DomainError::holon_not_found(initiative));
        }
        if !self.holons.exists(objective) {
            return Err(DomainError::holon_not_found(objective));
        }
        self.link(initiative, objective, RelationshipType::AlignedTo, actor, now)
    }

    /// Place `task` as part of `initiative`.
    pub fn place_in_initiative(
        &self,
        task: HolonId,
        initiative: HolonId,
        actor: HolonId,
        now: DateTime<Utc>,
    ) -> DomainResult<RelationshipId> {
        if !self.holons.exists(task) {
            return Err(DomainError::holon_not_found(task));
        }
        if !self.holons.exists(initiative) {
            return Err(DomainError::holon_not_found(initiative));
        }
        self.link(task, initiative, RelationshipType::PartOf, actor, now)
    }

    /// Record that `task` depends on `dependency`, rejecting the edge if
    /// it would close a cycle in the Task dependency graph.
    pub fn add_task_dependency(
        &self,
        task: HolonId,
        dependency: HolonId,
        actor: HolonId,
        now: DateTime<Utc>,
    ) -> DomainResult<RelationshipId> {
        if !self.holons.exists(task) {
            return Err(DomainError::holon_not_found(task));
        }
        if !self.holons.exists(dependency) {
            return Err(DomainError::holon_not_found(dependency));
        }
        self.link(task, dependency, RelationshipType::DependsOn, actor, now)
    }

    fn link(
        &self,
        source: HolonId,
        target: HolonId,
        relationship_type: RelationshipType,
        actor: HolonId,
        now: DateTime<Utc>,
    ) -> DomainResult<RelationshipId> {
        let event = Event::new(
            EventType::AssignmentStarted,
            vec![source, target],
            now,
            actor,
            serde_json::json!({"relationshipType": format!("{relationship_type:?}")}),
            CausalLinks::default(),
            now,
        )?;
        let event_id = self.events.append(event)?;
        self.relationships.create_relationship(Relationship {
            id: RelationshipId::new(),
            relationship_type,
            source_holon_id: source,
            target_holon_id: target,
            properties: serde_json::json!({}),
            effective_start: now,
            effective_end: None,
            source_system: None,
            source_documents: vec![],
            created_by: event_id,
            ended_by: None,
            authority_level: AuthorityLevel::Authoritative,
            confidence_score: None,
        })
    }

    /// Move a Task to a new status, validating against [`TaskStatusTable`]
    /// and recording the corresponding start/completion/cancellation
    /// event where one exists in the closed set.
    pub fn transition_task(
        &self,
        task: HolonId,
        to: TaskStatus,
        actor: HolonId,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        let holon = self.holons.get_holon(task)?;
        let (description, task_type, priority, due_date, current) = match holon.properties {
            HolonProperties::Task {
                description,
                task_type,
                priority,
                due_date,
                status,
            } => (description, task_type, priority, due_date, status),
            _ => return Err(DomainError::Validation(format!("holon {task} is not a Task"))),
        };
        TaskStatusTable
            .transition(&current, &to)
            .map_err(DomainError::Validation)?;
        self.holons.update_properties(
            task,
            HolonProperties::Task {
                description,
                task_type,
                priority,
                due_date,
                status: to,
            },
            now,
        )?;
        if let Some(event_type) = match to {
            TaskStatus::Started => Some(EventType::TaskStarted),
            TaskStatus::Completed => Some(EventType::TaskCompleted),
            TaskStatus::Cancelled => Some(EventType::TaskCancelled),
            TaskStatus::Created | TaskStatus::Assigned | TaskStatus::Blocked => None,
        } {
            let event = Event::new(
                event_type,
                vec![task],
                now,
                actor,
                serde_json::json!({"from": format!("{current:?}"), "to": format!("{to:?}"), "priority": format!("{priority:?}")}),
                CausalLinks::default(),
                now,
            )?;
            self.events.append(event)?;
        }
        Ok(())
    }

    /// Move an Initiative to a new stage, validating against
    /// [`InitiativeStageTable`].
    pub fn transition_initiative(
        &self,
        initiative: HolonId,
        to: InitiativeStage,
        actor: HolonId,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        let holon = self.holons.get_holon(initiative)?;
        let (name, scope, sponsor, current) = match holon.properties {
            HolonProperties::Initiative {
                name,
                scope,
                sponsor,
                stage,
            } => (name, scope, sponsor, stage),
            _ => {
                return Err(DomainError::Validation(format!(
                    "holon {initiative} is not an Initiative"
                )))
            }
        };
        InitiativeStageTable
            .transition(&current, &to)
            .map_err(DomainError::Validation)?;
        self.holons.update_properties(
            initiative,
            HolonProperties::Initiative {
                name,
                scope,
                sponsor,
                stage: to,
            },
            now,
        )?;
        let event = Event::new(
            EventType::AssignmentCorrected,
            vec![initiative],
            now,
            actor,
            serde_json::json!({"from": format!("{current:?}"), "to": format!("{to:?}")}),
            CausalLinks::default(),
            now,
        )?;
        self.events.append(event)?;
        Ok(())
    }

    /// Create a Task holon with the required non-empty fields, starting
    /// in [`TaskStatus::Created`].
    pub fn new_task(
        &self,
        description: impl Into<String>,
        task_type: impl Into<String>,
        priority: TaskPriority,
        due_date: DateTime<Utc>,
        created_by: EventId,
        source_documents: Vec<crate::ids::DocumentId>,
        now: DateTime<Utc>,
    ) -> DomainResult<Holon> {
        let description = description.into();
        let task_type = task_type.into();
        if description.trim().is_empty() {
            return Err(DomainError::Validation("task description must not be empty".into()));
        }
        if task_type.trim().is_empty() {
            return Err(DomainError::Validation("task type must not be empty".into()));
        }
        Holon::new(
            HolonProperties::Task {
                description,
                task_type,
                priority,
                due_date,
                status: TaskStatus::Created,
            },
            created_by,
            source_documents,
            now,
        )
    }

    /// Create an Initiative holon with the required non-empty fields,
    /// starting in [`InitiativeStage::Proposed`].
    pub fn new_initiative(
        &self,
        name: impl Into<String>,
        scope: impl Into<String>,
        sponsor: impl Into<String>,
        created_by: EventId,
        source_documents: Vec<crate::ids::DocumentId>,
        now: DateTime<Utc>,
    ) -> DomainResult<Holon> {
        let name = name.into();
        let scope = scope.into();
        let sponsor = sponsor.into();
        if name.trim().is_empty() {
            return Err(DomainError::Validation("initiative name must not be empty".into()));
        }
        if scope.trim().is_empty() {
            return Err(DomainError::Validation("initiative scope must not be empty".into()));
        }
        if sponsor.trim().is_empty() {
            return Err(DomainError::Validation("initiative sponsor must not be empty".into()));
        }
        Holon::new(
            HolonProperties::Initiative {
                name,
                scope,
                sponsor,
                stage: InitiativeStage::Proposed,
            },
            created_by,
            source_documents,
            now,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::DocumentId;
    use test_case::test_case;

    #[test_case(TaskStatus::Created, TaskStatus::Assigned, true; "created to assigned")]
    #[test_case(TaskStatus::Created, TaskStatus::Started, false; "created cannot skip to started")]
    #[test_case(TaskStatus::Assigned, TaskStatus::Started, true; "assigned to started")]
    #[test_case(TaskStatus::Started, TaskStatus::Blocked, true; "started to blocked")]
    #[test_case(TaskStatus::Blocked, TaskStatus::Started, true; "blocked back to started")]
    #[test_case(TaskStatus::Started, TaskStatus::Completed, true; "started to completed")]
    #[test_case(TaskStatus::Completed, TaskStatus::Started, false; "completed is terminal")]
    #[test_case(TaskStatus::Cancelled, TaskStatus::Started, false; "cancelled is terminal")]
    fn task_status_table_matches_allowed_moves(current: TaskStatus, input: TaskStatus, allowed: bool) {
        assert_eq!(TaskStatusTable.can_transition(&current, &input), allowed);
    }

    #[test_case(InitiativeStage::Proposed, InitiativeStage::Approved, true; "proposed to approved")]
    #[test_case(InitiativeStage::Proposed, InitiativeStage::Active, false; "proposed cannot skip to active")]
    #[test_case(InitiativeStage::Approved, InitiativeStage::Planned, true; "approved to planned")]
    #[test_case(InitiativeStage::Planned, InitiativeStage::Active, true; "planned to active")]
    #[test_case(InitiativeStage::Active, InitiativeStage::Paused, true; "active to paused")]
    #[test_case(InitiativeStage::Paused, InitiativeStage::Active, true; "paused back to active")]
    #[test_case(InitiativeStage::Completed, InitiativeStage::Active, false; "completed is terminal")]
    #[test_case(InitiativeStage::Cancelled, InitiativeStage::Active, false; "cancelled is terminal")]
    fn initiative_stage_table_matches_allowed_moves(current: InitiativeStage, input: InitiativeStage, allowed: bool) {
        assert_eq!(InitiativeStageTable.can_transition(&current, &input), allowed);
    }

    fn actor_holon(holons: &HolonRegistry, now: DateTime<Utc>) -> HolonId {
        let holon = Holon::new(
            HolonProperties::Organization {
                name: "Program Office".into(),
                org_type: "staff".into(),
            },
            EventId::new(),
            vec![DocumentId::new()],
            now,
        )
        .unwrap();
        let id = holon.id;
        holons.create_holon(holon);
        id
    }

    fn task(manager: &InitiativeManager, holons: &HolonRegistry, now: DateTime<Utc>) -> HolonId {
        let holon = manager
            .new_task("inspect hull", "maintenance", TaskPriority::Medium, now, EventId::new(), vec![DocumentId::new()], now)
            .unwrap();
        let id = holon.id;
        holons.create_holon(holon);
        id
    }

    #[test]
    fn task_dependency_cycle_rejected() {
        let holons = HolonRegistry::new();
        let relationships = RelationshipRegistry::new();
        let events = EventStore::new();
        let now = Utc::now();
        let manager = InitiativeManager::new(&holons, &relationships, &events);
        let actor = actor_holon(&holons, now);
        let a = task(&manager, &holons, now);
        let b = task(&manager, &holons, now);
        manager.add_task_dependency(a, b, actor, now).unwrap();
        assert!(manager.add_task_dependency(b, a, actor, now).is_err());
    }

    #[test]
    fn task_status_transitions_follow_table() {
        let holons = HolonRegistry::new();
        let relationships = RelationshipRegistry::new();
        let events = EventStore::new();
        let now = Utc::now();
        let manager = InitiativeManager::new(&holons, &relationships, &events);
        let actor = actor_holon(&holons, now);
        let task = task(&manager, &holons, now);
        manager.transition_task(task, TaskStatus::Assigned, actor, now).unwrap();
        manager.transition_task(task, TaskStatus::Started, actor, now).unwrap();
        manager.transition_task(task, TaskStatus::Completed, actor, now).unwrap();
        assert!(manager
            .transition_task(task, TaskStatus::Started, actor, now)
            .is_err());
    }

    #[test]
    fn initiative_stage_transitions_follow_table() {
        let holons = HolonRegistry::new();
        let relationships = RelationshipRegistry::new();
        let events = EventStore::new();
        let now = Utc::now();
        let manager = InitiativeManager::new(&holons, &relationships, &events);
        let actor = actor_holon(&holons, now);
        let holon = manager
            .new_initiative("Modernize the fleet", "surface fleet readiness", "N4", EventId::new(), vec![DocumentId::new()], now)
            .unwrap();
        let initiative = holon.id;
        holons.create_holon(holon);
        manager
            .transition_initiative(initiative, InitiativeStage::Approved, actor, now)
            .unwrap();
        assert!(manager
            .transition_initiative(initiative, InitiativeStage::Active, actor, now)
            .is_err());
    }

    #[test]
    fn empty_task_description_rejected() {
        let holons = HolonRegistry::new();
        let relationships = RelationshipRegistry::new();
        let events = EventStore::new();
        let now = Utc::now();
        let manager = InitiativeManager::new(&holons, &relationships, &events);
        let result = manager.new_task("   ", "maintenance", TaskPriority::Low, now, EventId::new(), vec![DocumentId::new()], now);
        assert!(result.is_err());
    }
}
