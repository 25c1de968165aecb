use rusqlite::Connection;
use serde::Serialize;

use crate::db::task_repo;
use crate::error::EngineError;
use crate::models::{Actor, Priority, Role, Task, TaskStatus};

/// Task lists are served in fixed pages of ten, matching the portal tables.
pub const PAGE_SIZE: usize = 10;

/// Optional filters, AND-combined on top of the actor's visibility scope.
#[derive(Debug, Default, Clone)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub department_id: Option<String>,
    pub assigned_to: Option<String>,
}

impl TaskFilter {
    fn matches(&self, task: &Task) -> bool {
        self.status.map_or(true, |s| task.status == s)
            && self.priority.map_or(true, |p| task.priority == p)
            && self
                .department_id
                .as_deref()
                .map_or(true, |d| task.department_id == d)
            && self
                .assigned_to
                .as_deref()
                .map_or(true, |a| task.assigned_to == a)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Deadline ascending: most pressing first.
    Deadline,
    /// Creation time descending: newest first.
    Created,
    /// Urgent > high > medium > low, ties broken by deadline ascending.
    Priority,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deadline => "deadline",
            Self::Created => "created",
            Self::Priority => "priority",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "deadline" => Some(Self::Deadline),
            "created" => Some(Self::Created),
            "priority" => Some(Self::Priority),
            _ => None,
        }
    }
}

impl Default for SortKey {
    fn default() -> Self {
        Self::Created
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: usize,
    pub total_pages: usize,
    pub total: usize,
}

/// Load every task the actor is allowed to see and apply the filters.
/// Employees see their own tasks, managers their department, HR/admin
/// everything.
pub fn visible_tasks(
    conn: &Connection,
    actor: &Actor,
    filter: &TaskFilter,
) -> Result<Vec<Task>, EngineError> {
    let scoped = match actor.role {
        Role::Employee => task_repo::list_by_assignee(conn, &actor.id)?,
        Role::Manager => {
            let department = actor.department_id.as_deref().ok_or_else(|| {
                EngineError::validation("Manager claims must include a department")
            })?;
            task_repo::list_by_department(conn, department)?
        }
        Role::Hr | Role::Admin => task_repo::list_all(conn)?,
    };
    Ok(scoped.into_iter().filter(|t| filter.matches(t)).collect())
}

pub fn sort_tasks(tasks: &mut [Task], key: SortKey) {
    match key {
        SortKey::Deadline => tasks.sort_by(|a, b| a.deadline.cmp(&b.deadline)),
        SortKey::Created => tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortKey::Priority => tasks.sort_by(|a, b| {
            a.priority
                .rank()
                .cmp(&b.priority.rank())
                .then(a.deadline.cmp(&b.deadline))
        }),
    }
}

/// Slice one page out of the sorted set. Pages below 1 are a caller error;
/// pages past the end return empty items with the totals intact.
pub fn paginate<T>(items: Vec<T>, page: usize) -> Result<Page<T>, EngineError> {
    if page < 1 {
        return Err(EngineError::validation("Page number must be 1 or greater"));
    }
    let total = items.len();
    let total_pages = total.div_ceil(PAGE_SIZE);
    let start = (page - 1) * PAGE_SIZE;
    let items = if start >= total {
        Vec::new()
    } else {
        items
            .into_iter()
            .skip(start)
            .take(PAGE_SIZE)
            .collect()
    };
    Ok(Page {
        items,
        current_page: page,
        total_pages,
        total,
    })
}
