use chrono::NaiveDate;
use rusqlite::{params, Connection, ToSql};

use crate::error::EngineError;
use crate::models::{Priority, Task, TaskStatus, TaskUpdate};

const TASK_COLUMNS: &str = "id, title, description, priority, status,
                assigned_to, assigned_by, department_id, deadline,
                estimated_hours, actual_hours, tags, cancel_reason,
                version, created_at, updated_at";

/// Partial update applied by `set_fields`. `None` leaves a column alone;
/// the nested `Option` on nullable columns distinguishes "set" from "clear".
#[derive(Debug, Default, Clone)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub status: Option<TaskStatus>,
    pub deadline: Option<NaiveDate>,
    pub estimated_hours: Option<Option<f64>>,
    pub actual_hours: Option<Option<f64>>,
    pub tags: Option<Vec<String>>,
    pub cancel_reason: Option<Option<String>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.status.is_none()
            && self.deadline.is_none()
            && self.estimated_hours.is_none()
            && self.actual_hours.is_none()
            && self.tags.is_none()
            && self.cancel_reason.is_none()
    }
}

pub fn insert_task(conn: &Connection, task: &Task) -> Result<Task, EngineError> {
    conn.execute(
        "INSERT INTO tasks (id, title, description, priority, status,
                            assigned_to, assigned_by, department_id, deadline,
                            estimated_hours, tags)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            task.id,
            task.title,
            task.description,
            task.priority.as_str(),
            task.status.as_str(),
            task.assigned_to,
            task.assigned_by,
            task.department_id,
            task.deadline.to_string(),
            task.estimated_hours,
            tags_to_json(&task.tags),
        ],
    )?;
    get_task_by_id(conn, &task.id)
}

pub fn get_task_by_id(conn: &Connection, id: &str) -> Result<Task, EngineError> {
    conn.query_row(
        &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
        params![id],
        row_to_task,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => EngineError::task_not_found(id),
        _ => EngineError::from(e),
    })
}

pub fn list_all(conn: &Connection) -> Result<Vec<Task>, EngineError> {
    let mut stmt = conn.prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks"))?;
    let tasks = stmt
        .query_map([], row_to_task)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tasks)
}

pub fn list_by_department(conn: &Connection, department_id: &str) -> Result<Vec<Task>, EngineError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE department_id = ?1"
    ))?;
    let tasks = stmt
        .query_map(params![department_id], row_to_task)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tasks)
}

pub fn list_by_assignee(conn: &Connection, assignee: &str) -> Result<Vec<Task>, EngineError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE assigned_to = ?1"
    ))?;
    let tasks = stmt
        .query_map(params![assignee], row_to_task)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tasks)
}

/// Apply a partial update guarded by the optimistic version check. Returns
/// false when no row matched, i.e. the task is gone or `expected_version`
/// is stale. Every applied patch bumps `version` and `updated_at`.
pub fn set_fields(
    conn: &Connection,
    id: &str,
    expected_version: i64,
    patch: &TaskPatch,
) -> Result<bool, EngineError> {
    let mut sets: Vec<String> = Vec::new();
    let mut values: Vec<Box<dyn ToSql>> = Vec::new();

    let mut push = |sets: &mut Vec<String>, column: &str, value: Box<dyn ToSql>| {
        sets.push(format!("{column} = ?{}", values.len() + 1));
        values.push(value);
    };

    if let Some(ref title) = patch.title {
        push(&mut sets, "title", Box::new(title.clone()));
    }
    if let Some(ref description) = patch.description {
        push(&mut sets, "description", Box::new(description.clone()));
    }
    if let Some(priority) = patch.priority {
        push(&mut sets, "priority", Box::new(priority.as_str()));
    }
    if let Some(status) = patch.status {
        push(&mut sets, "status", Box::new(status.as_str()));
    }
    if let Some(deadline) = patch.deadline {
        push(&mut sets, "deadline", Box::new(deadline.to_string()));
    }
    if let Some(estimated) = patch.estimated_hours {
        push(&mut sets, "estimated_hours", Box::new(estimated));
    }
    if let Some(actual) = patch.actual_hours {
        push(&mut sets, "actual_hours", Box::new(actual));
    }
    if let Some(ref tags) = patch.tags {
        push(&mut sets, "tags", Box::new(tags_to_json(tags)));
    }
    if let Some(ref reason) = patch.cancel_reason {
        push(&mut sets, "cancel_reason", Box::new(reason.clone()));
    }

    if sets.is_empty() {
        return Ok(false);
    }

    let sql = format!(
        "UPDATE tasks SET {}, version = version + 1, updated_at = datetime('now')
         WHERE id = ?{} AND version = ?{}",
        sets.join(", "),
        values.len() + 1,
        values.len() + 2,
    );
    values.push(Box::new(id.to_string()));
    values.push(Box::new(expected_version));

    let params: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
    let changed = conn.execute(&sql, params.as_slice())?;
    Ok(changed == 1)
}

/// Bump `version` and `updated_at` without touching any other column. Used
/// by log appends, which mutate the task without changing its fields.
pub fn touch(conn: &Connection, id: &str) -> Result<(), EngineError> {
    let changed = conn.execute(
        "UPDATE tasks SET version = version + 1, updated_at = datetime('now') WHERE id = ?1",
        params![id],
    )?;
    if changed == 0 {
        return Err(EngineError::task_not_found(id));
    }
    Ok(())
}

pub fn delete_task(conn: &Connection, id: &str) -> Result<(), EngineError> {
    let changed = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(EngineError::task_not_found(id));
    }
    Ok(())
}

/// Append one entry to the task's activity log. The log is insert-only:
/// nothing in the crate updates or deletes `task_updates` rows.
pub fn append_update(
    conn: &Connection,
    task_id: &str,
    updated_by: &str,
    message: &str,
    status_change: Option<&str>,
) -> Result<(), EngineError> {
    // FK enforcement alone would surface a generic constraint error.
    get_task_by_id(conn, task_id)?;
    conn.execute(
        "INSERT INTO task_updates (task_id, updated_by, message, status_change)
         VALUES (?1, ?2, ?3, ?4)",
        params![task_id, updated_by, message, status_change],
    )?;
    Ok(())
}

pub fn list_updates(conn: &Connection, task_id: &str) -> Result<Vec<TaskUpdate>, EngineError> {
    let mut stmt = conn.prepare(
        "SELECT seq, task_id, updated_by, message, status_change, updated_at
         FROM task_updates WHERE task_id = ?1 ORDER BY seq ASC",
    )?;
    let updates = stmt
        .query_map(params![task_id], |row| {
            Ok(TaskUpdate {
                seq: row.get(0)?,
                task_id: row.get(1)?,
                updated_by: row.get(2)?,
                message: row.get(3)?,
                status_change: row.get(4)?,
                updated_at: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(updates)
}

fn tags_to_json(tags: &[String]) -> String {
    serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_string())
}

fn tags_from_json(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<Task> {
    let deadline: String = row.get(8)?;
    let tags: String = row.get(11)?;
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        priority: Priority::from_str(&row.get::<_, String>(3)?).unwrap_or(Priority::Medium),
        status: TaskStatus::from_str(&row.get::<_, String>(4)?).unwrap_or(TaskStatus::Todo),
        assigned_to: row.get(5)?,
        assigned_by: row.get(6)?,
        department_id: row.get(7)?,
        deadline: deadline.parse().unwrap_or_default(),
        estimated_hours: row.get(9)?,
        actual_hours: row.get(10)?,
        tags: tags_from_json(&tags),
        cancel_reason: row.get(12)?,
        version: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}
