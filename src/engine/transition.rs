use crate::error::EngineError;
use crate::models::{Actor, Role, Task, TaskStatus};

use TaskStatus::{Cancelled, Completed, InProgress, Todo};

/// Which column of the transition table an actor acts under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    Assignee,
    Managerial,
}

/// Edges an assignee may walk on their own task.
const ASSIGNEE_EDGES: &[(TaskStatus, &[TaskStatus])] = &[
    (Todo, &[InProgress]),
    (InProgress, &[Completed, Todo]),
];

/// Edges for managers (own department), HR, and admins. Includes the
/// reverse edges out of the terminal-looking states.
const MANAGERIAL_EDGES: &[(TaskStatus, &[TaskStatus])] = &[
    (Todo, &[InProgress, Cancelled]),
    (InProgress, &[Completed, Todo, Cancelled]),
    (Completed, &[InProgress]),
    (Cancelled, &[Todo]),
];

pub fn allowed_targets(authority: Authority, from: TaskStatus) -> &'static [TaskStatus] {
    let table = match authority {
        Authority::Assignee => ASSIGNEE_EDGES,
        Authority::Managerial => MANAGERIAL_EDGES,
    };
    table
        .iter()
        .find(|(status, _)| *status == from)
        .map_or(&[], |(_, targets)| targets)
}

/// Resolve the column the actor acts under for this task, or reject the
/// attempt outright. Employees only ever act on their own tasks; managers
/// only inside their department.
pub fn resolve_authority(actor: &Actor, task: &Task) -> Result<Authority, EngineError> {
    match actor.role {
        Role::Employee => {
            if task.assigned_to == actor.id {
                Ok(Authority::Assignee)
            } else {
                Err(EngineError::forbidden(
                    "Only the assignee may act on this task",
                ))
            }
        }
        Role::Manager => {
            if actor.manages(&task.department_id) {
                Ok(Authority::Managerial)
            } else {
                Err(EngineError::forbidden(
                    "Managers may only act on tasks in their own department",
                ))
            }
        }
        Role::Hr | Role::Admin => Ok(Authority::Managerial),
    }
}

pub fn check(authority: Authority, from: TaskStatus, to: TaskStatus) -> Result<(), EngineError> {
    if allowed_targets(authority, from).contains(&to) {
        Ok(())
    } else {
        Err(EngineError::invalid_transition(from.as_str(), to.as_str()))
    }
}

/// Human-readable label recorded on the activity-log entry of a transition.
pub fn change_label(from: TaskStatus, to: TaskStatus) -> String {
    format!("{} → {}", from.as_str(), to.as_str())
}
