use chrono::NaiveDate;
use rusqlite::Connection;

use crate::db::task_repo::{self, TaskPatch};
use crate::engine::query::{self, Page, SortKey, TaskFilter};
use crate::engine::summary::{self, BreakdownRow, Summary};
use crate::engine::transition as transition_mod;
use crate::error::EngineError;
use crate::models::{Actor, Priority, Role, Task, TaskStatus, TaskUpdate};

const TITLE_MIN: usize = 3;
const TITLE_MAX: usize = 150;
const DESCRIPTION_MAX: usize = 2000;
const MESSAGE_MIN: usize = 3;
const MESSAGE_MAX: usize = 500;
const TAGS_MAX: usize = 5;
const TAG_LEN_MAX: usize = 20;

const DEFAULT_TRANSITION_MESSAGE: &str = "Status updated";

#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub assigned_to: String,
    pub department_id: String,
    pub deadline: NaiveDate,
    pub estimated_hours: Option<f64>,
    pub tags: Vec<String>,
}

#[derive(Debug, Default, Clone)]
pub struct TransitionPayload {
    pub message: Option<String>,
    pub actual_hours: Option<f64>,
    pub cancel_reason: Option<String>,
}

/// Caller-editable fields, all optional.
#[derive(Debug, Default, Clone)]
pub struct EditFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub deadline: Option<NaiveDate>,
    pub estimated_hours: Option<f64>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct TaskDetail {
    pub task: Task,
    pub updates: Vec<TaskUpdate>,
}

#[derive(Debug, Clone)]
pub struct TaskListing {
    pub page: Page<Task>,
    pub summary: Summary,
    pub breakdown: Option<Vec<BreakdownRow>>,
}

/// Create a task in `todo`. Managers create inside their own department
/// only; HR and admin anywhere; employees not at all.
pub fn create_task(
    conn: &Connection,
    actor: &Actor,
    input: NewTask,
    today: NaiveDate,
) -> Result<Task, EngineError> {
    match actor.role {
        Role::Employee => {
            return Err(EngineError::forbidden("Employees may not create tasks"));
        }
        Role::Manager => {
            if !actor.manages(&input.department_id) {
                return Err(EngineError::forbidden(
                    "Managers may only create tasks in their own department",
                ));
            }
        }
        Role::Hr | Role::Admin => {}
    }

    validate_title(&input.title)?;
    validate_description(input.description.as_deref())?;
    validate_tags(&input.tags)?;
    validate_estimated_hours(input.estimated_hours)?;
    if input.assigned_to.trim().is_empty() {
        return Err(EngineError::validation("Task assignee is required"));
    }
    if input.department_id.trim().is_empty() {
        return Err(EngineError::validation("Task department is required"));
    }
    if input.deadline < today {
        return Err(EngineError::validation(
            "Deadline must not be before the creation date",
        ));
    }

    let task = Task {
        id: ulid::Ulid::new().to_string(),
        title: input.title,
        description: input.description,
        priority: input.priority,
        status: TaskStatus::Todo,
        assigned_to: input.assigned_to,
        assigned_by: actor.id.clone(),
        department_id: input.department_id,
        deadline: input.deadline,
        estimated_hours: input.estimated_hours,
        actual_hours: None,
        tags: input.tags,
        cancel_reason: None,
        version: 1,
        // Filled in by the store on insert.
        created_at: String::new(),
        updated_at: String::new(),
    };
    task_repo::insert_task(conn, &task)
}

/// Fetch a task with its activity log. Tasks outside the caller's scope
/// report the same `NOT_FOUND` as unknown ids.
pub fn get_task(conn: &Connection, actor: &Actor, id: &str) -> Result<TaskDetail, EngineError> {
    let task = task_repo::get_task_by_id(conn, id)?;
    if !can_see(actor, &task) {
        return Err(EngineError::task_not_found(id));
    }
    let updates = task_repo::list_updates(conn, id)?;
    Ok(TaskDetail { task, updates })
}

/// Move a task to `to`, reading the current row first. See
/// `apply_transition` for the write path.
pub fn transition(
    conn: &Connection,
    actor: &Actor,
    id: &str,
    to: TaskStatus,
    payload: TransitionPayload,
) -> Result<Task, EngineError> {
    let snapshot = task_repo::get_task_by_id(conn, id)?;
    apply_transition(conn, actor, &snapshot, to, payload)
}

/// Validate a transition against the caller's snapshot and apply it. The
/// field mutation and the log append share one transaction, and the write
/// is guarded by the snapshot's version: if another writer got there first
/// the task row no longer matches and the call fails with `CONFLICT`,
/// leaving the task untouched.
pub fn apply_transition(
    conn: &Connection,
    actor: &Actor,
    snapshot: &Task,
    to: TaskStatus,
    payload: TransitionPayload,
) -> Result<Task, EngineError> {
    let authority = transition_mod::resolve_authority(actor, snapshot)?;
    let from = snapshot.status;
    transition_mod::check(authority, from, to)?;

    let mut patch = TaskPatch {
        status: Some(to),
        ..TaskPatch::default()
    };
    match to {
        TaskStatus::Completed => {
            let hours = payload.actual_hours.ok_or_else(|| {
                EngineError::validation("Completing a task requires actual hours")
            })?;
            if !hours.is_finite() || hours < 0.0 {
                return Err(EngineError::validation(
                    "Actual hours must be zero or greater",
                ));
            }
            patch.actual_hours = Some(Some(hours));
        }
        TaskStatus::Cancelled => {
            let reason = payload
                .cancel_reason
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .ok_or_else(|| {
                    EngineError::validation("Cancelling a task requires a reason")
                })?;
            patch.cancel_reason = Some(Some(reason.to_string()));
        }
        TaskStatus::Todo => {
            // Reopening a cancelled task withdraws the cancellation; hours
            // recorded by an earlier completion are kept.
            if from == TaskStatus::Cancelled {
                patch.cancel_reason = Some(None);
            }
        }
        TaskStatus::InProgress => {}
    }

    let message = match payload.message {
        Some(m) => {
            validate_message(&m)?;
            m
        }
        None => DEFAULT_TRANSITION_MESSAGE.to_string(),
    };
    let label = transition_mod::change_label(from, to);

    conn.execute_batch("BEGIN IMMEDIATE")?;
    let result = (|| -> Result<(), EngineError> {
        if !task_repo::set_fields(conn, &snapshot.id, snapshot.version, &patch)? {
            // No row matched: the task is gone, or the version moved on.
            task_repo::get_task_by_id(conn, &snapshot.id)?;
            return Err(EngineError::conflict(&snapshot.id));
        }
        task_repo::append_update(conn, &snapshot.id, &actor.id, &message, Some(&label))?;
        Ok(())
    })();

    match result {
        Ok(()) => {
            conn.execute_batch("COMMIT")?;
            task_repo::get_task_by_id(conn, &snapshot.id)
        }
        Err(e) => {
            let _ = conn.execute_batch("ROLLBACK");
            Err(e)
        }
    }
}

/// Append a free-text entry to the activity log. Allowed for the assignee,
/// the department's manager, and HR/admin, on any task not cancelled.
pub fn add_update(
    conn: &Connection,
    actor: &Actor,
    id: &str,
    message: &str,
) -> Result<TaskDetail, EngineError> {
    let task = task_repo::get_task_by_id(conn, id)?;
    if task.assigned_to != actor.id && !actor.manages(&task.department_id) {
        return Err(EngineError::forbidden(
            "Only the assignee, their manager, or HR may update this task",
        ));
    }
    if task.status == TaskStatus::Cancelled {
        return Err(EngineError::invalid_state(
            "Cancelled tasks no longer accept updates",
        ));
    }
    validate_message(message)?;

    conn.execute_batch("BEGIN IMMEDIATE")?;
    let result = (|| -> Result<(), EngineError> {
        task_repo::append_update(conn, id, &actor.id, message, None)?;
        task_repo::touch(conn, id)?;
        Ok(())
    })();

    match result {
        Ok(()) => {
            conn.execute_batch("COMMIT")?;
            get_task(conn, actor, id)
        }
        Err(e) => {
            let _ = conn.execute_batch("ROLLBACK");
            Err(e)
        }
    }
}

/// Edit descriptive fields of a non-terminal task. Management-side only.
pub fn edit_task(
    conn: &Connection,
    actor: &Actor,
    id: &str,
    fields: EditFields,
) -> Result<Task, EngineError> {
    let task = task_repo::get_task_by_id(conn, id)?;
    if !actor.manages(&task.department_id) {
        return Err(EngineError::forbidden(
            "Only the department's manager or HR may edit this task",
        ));
    }
    if task.status.is_terminal() {
        return Err(EngineError::invalid_state(
            "Completed or cancelled tasks cannot be edited",
        ));
    }

    if let Some(ref title) = fields.title {
        validate_title(title)?;
    }
    if let Some(ref description) = fields.description {
        validate_description(Some(description))?;
    }
    if let Some(ref tags) = fields.tags {
        validate_tags(tags)?;
    }
    validate_estimated_hours(fields.estimated_hours)?;

    let patch = TaskPatch {
        title: fields.title,
        description: fields.description.map(Some),
        priority: fields.priority,
        deadline: fields.deadline,
        estimated_hours: fields.estimated_hours.map(Some),
        tags: fields.tags,
        ..TaskPatch::default()
    };
    if patch.is_empty() {
        return Err(EngineError::validation("Nothing to edit"));
    }

    if !task_repo::set_fields(conn, id, task.version, &patch)? {
        task_repo::get_task_by_id(conn, id)?;
        return Err(EngineError::conflict(id));
    }
    task_repo::get_task_by_id(conn, id)
}

/// Hard delete, HR/admin only, and only while the task is still `todo`.
pub fn delete_task(conn: &Connection, actor: &Actor, id: &str) -> Result<(), EngineError> {
    let task = task_repo::get_task_by_id(conn, id)?;
    if !actor.is_elevated() {
        return Err(EngineError::forbidden("Only HR or admin may delete tasks"));
    }
    if task.status != TaskStatus::Todo {
        return Err(EngineError::invalid_state(
            "Only tasks still in todo can be deleted",
        ));
    }
    task_repo::delete_task(conn, id)
}

/// Scoped, filtered, aggregated, sorted, paginated listing. The summary and
/// breakdown cover the whole filtered set, not just the returned page, and
/// every overdue count uses the one `today` supplied with the request.
pub fn list_tasks(
    conn: &Connection,
    actor: &Actor,
    filter: &TaskFilter,
    sort: SortKey,
    page: usize,
    today: NaiveDate,
) -> Result<TaskListing, EngineError> {
    let mut tasks = query::visible_tasks(conn, actor, filter)?;
    let summary = summary::summarize(&tasks, today);
    let breakdown = summary::breakdown_for(actor.role, &tasks, today);
    query::sort_tasks(&mut tasks, sort);
    let page = query::paginate(tasks, page)?;
    Ok(TaskListing {
        page,
        summary,
        breakdown,
    })
}

fn can_see(actor: &Actor, task: &Task) -> bool {
    match actor.role {
        Role::Employee => task.assigned_to == actor.id,
        Role::Manager => actor.manages(&task.department_id),
        Role::Hr | Role::Admin => true,
    }
}

fn validate_title(title: &str) -> Result<(), EngineError> {
    let len = title.trim().chars().count();
    if !(TITLE_MIN..=TITLE_MAX).contains(&len) {
        return Err(EngineError::validation(format!(
            "Title must be {TITLE_MIN}-{TITLE_MAX} characters"
        )));
    }
    Ok(())
}

fn validate_description(description: Option<&str>) -> Result<(), EngineError> {
    if let Some(d) = description {
        if d.chars().count() > DESCRIPTION_MAX {
            return Err(EngineError::validation(format!(
                "Description must be at most {DESCRIPTION_MAX} characters"
            )));
        }
    }
    Ok(())
}

fn validate_message(message: &str) -> Result<(), EngineError> {
    let len = message.trim().chars().count();
    if !(MESSAGE_MIN..=MESSAGE_MAX).contains(&len) {
        return Err(EngineError::validation(format!(
            "Update message must be {MESSAGE_MIN}-{MESSAGE_MAX} characters"
        )));
    }
    Ok(())
}

fn validate_tags(tags: &[String]) -> Result<(), EngineError> {
    if tags.len() > TAGS_MAX {
        return Err(EngineError::validation(format!(
            "At most {TAGS_MAX} tags are allowed"
        )));
    }
    for tag in tags {
        let len = tag.chars().count();
        if len == 0 || len > TAG_LEN_MAX {
            return Err(EngineError::validation(format!(
                "Tags must be 1-{TAG_LEN_MAX} characters"
            )));
        }
    }
    for (i, tag) in tags.iter().enumerate() {
        if tags[..i].contains(tag) {
            return Err(EngineError::validation(format!("Duplicate tag: {tag}")));
        }
    }
    Ok(())
}

fn validate_estimated_hours(hours: Option<f64>) -> Result<(), EngineError> {
    if let Some(h) = hours {
        if !h.is_finite() || h <= 0.0 {
            return Err(EngineError::validation(
                "Estimated hours must be greater than zero",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations;
    use crate::error::ErrorCode;

    fn mem_conn() -> Connection {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
        migrations::run_migrations(&conn).unwrap();
        conn
    }

    fn employee(id: &str, dept: &str) -> Actor {
        Actor::new(id, Role::Employee, Some(dept.to_string()))
    }

    fn manager(id: &str, dept: &str) -> Actor {
        Actor::new(id, Role::Manager, Some(dept.to_string()))
    }

    fn hr() -> Actor {
        Actor::new("hr-1", Role::Hr, None)
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn new_task(assignee: &str, dept: &str, deadline: &str) -> NewTask {
        NewTask {
            title: "Prepare onboarding pack".to_string(),
            description: None,
            priority: Priority::Medium,
            assigned_to: assignee.to_string(),
            department_id: dept.to_string(),
            deadline: date(deadline),
            estimated_hours: None,
            tags: Vec::new(),
        }
    }

    fn seed(conn: &Connection, assignee: &str, dept: &str, deadline: &str) -> Task {
        create_task(
            conn,
            &manager("mgr-eng", dept),
            new_task(assignee, dept, deadline),
            date("2026-01-01"),
        )
        .unwrap()
    }

    #[test]
    fn employee_cannot_create() {
        let conn = mem_conn();
        let err = create_task(
            &conn,
            &employee("e1", "eng"),
            new_task("e1", "eng", "2026-02-01"),
            date("2026-01-01"),
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[test]
    fn manager_creates_in_own_department_only() {
        let conn = mem_conn();
        let err = create_task(
            &conn,
            &manager("m-sales", "sales"),
            new_task("e1", "eng", "2026-02-01"),
            date("2026-01-01"),
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let task = seed(&conn, "e1", "eng", "2026-02-01");
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.assigned_by, "mgr-eng");
        assert_eq!(task.version, 1);
    }

    #[test]
    fn create_validates_fields() {
        let conn = mem_conn();
        let hr = hr();
        let today = date("2026-01-01");

        let mut input = new_task("e1", "eng", "2026-02-01");
        input.title = "ab".to_string();
        let err = create_task(&conn, &hr, input, today).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let mut input = new_task("e1", "eng", "2025-12-31");
        input.title = "Past deadline".to_string();
        let err = create_task(&conn, &hr, input, today).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let mut input = new_task("e1", "eng", "2026-02-01");
        input.tags = (0..6).map(|i| format!("tag{i}")).collect();
        let err = create_task(&conn, &hr, input, today).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let mut input = new_task("e1", "eng", "2026-02-01");
        input.tags = vec!["ops".to_string(), "ops".to_string()];
        let err = create_task(&conn, &hr, input, today).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let mut input = new_task("e1", "eng", "2026-02-01");
        input.estimated_hours = Some(0.0);
        let err = create_task(&conn, &hr, input, today).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[test]
    fn assignee_start_appends_labelled_entry() {
        let conn = mem_conn();
        let task = seed(&conn, "e1", "eng", "2026-02-01");
        let updated = transition(
            &conn,
            &employee("e1", "eng"),
            &task.id,
            TaskStatus::InProgress,
            TransitionPayload::default(),
        )
        .unwrap();
        assert_eq!(updated.status, TaskStatus::InProgress);
        assert_eq!(updated.version, 2);

        let updates = task_repo::list_updates(&conn, &task.id).unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].status_change.as_deref(), Some("todo → in_progress"));
        assert_eq!(updates[0].updated_by, "e1");
        assert_eq!(updates[0].message, DEFAULT_TRANSITION_MESSAGE);
    }

    #[test]
    fn assignee_cannot_cancel() {
        let conn = mem_conn();
        let task = seed(&conn, "e1", "eng", "2026-02-01");
        let err = transition(
            &conn,
            &employee("e1", "eng"),
            &task.id,
            TaskStatus::Cancelled,
            TransitionPayload {
                cancel_reason: Some("no longer needed".to_string()),
                ..TransitionPayload::default()
            },
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTransition);

        // And the task is unchanged.
        let task = task_repo::get_task_by_id(&conn, &task.id).unwrap();
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.version, 1);
    }

    #[test]
    fn foreign_manager_is_forbidden() {
        let conn = mem_conn();
        let task = seed(&conn, "e1", "eng", "2026-02-01");
        let err = transition(
            &conn,
            &manager("m-sales", "sales"),
            &task.id,
            TaskStatus::Cancelled,
            TransitionPayload {
                cancel_reason: Some("scope cut".to_string()),
                ..TransitionPayload::default()
            },
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[test]
    fn other_employee_is_forbidden() {
        let conn = mem_conn();
        let task = seed(&conn, "e1", "eng", "2026-02-01");
        let err = transition(
            &conn,
            &employee("e2", "eng"),
            &task.id,
            TaskStatus::InProgress,
            TransitionPayload::default(),
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[test]
    fn completion_requires_hours() {
        let conn = mem_conn();
        let task = seed(&conn, "e1", "eng", "2026-02-01");
        let e1 = employee("e1", "eng");
        transition(
            &conn,
            &e1,
            &task.id,
            TaskStatus::InProgress,
            TransitionPayload::default(),
        )
        .unwrap();

        let err = transition(
            &conn,
            &e1,
            &task.id,
            TaskStatus::Completed,
            TransitionPayload::default(),
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let done = transition(
            &conn,
            &e1,
            &task.id,
            TaskStatus::Completed,
            TransitionPayload {
                actual_hours: Some(4.5),
                ..TransitionPayload::default()
            },
        )
        .unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
        assert_eq!(done.actual_hours, Some(4.5));
    }

    #[test]
    fn cancellation_requires_reason_and_reopen_clears_it() {
        let conn = mem_conn();
        let task = seed(&conn, "e1", "eng", "2026-02-01");
        let mgr = manager("mgr-eng", "eng");

        let err = transition(
            &conn,
            &mgr,
            &task.id,
            TaskStatus::Cancelled,
            TransitionPayload::default(),
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let cancelled = transition(
            &conn,
            &mgr,
            &task.id,
            TaskStatus::Cancelled,
            TransitionPayload {
                cancel_reason: Some("duplicate of another task".to_string()),
                ..TransitionPayload::default()
            },
        )
        .unwrap();
        assert_eq!(cancelled.status, TaskStatus::Cancelled);
        assert_eq!(
            cancelled.cancel_reason.as_deref(),
            Some("duplicate of another task")
        );

        let reopened = transition(
            &conn,
            &mgr,
            &task.id,
            TaskStatus::Todo,
            TransitionPayload::default(),
        )
        .unwrap();
        assert_eq!(reopened.status, TaskStatus::Todo);
        assert_eq!(reopened.cancel_reason, None);
    }

    #[test]
    fn manager_reverses_completed_and_hours_survive() {
        let conn = mem_conn();
        let task = seed(&conn, "e1", "eng", "2026-02-01");
        let mgr = manager("mgr-eng", "eng");
        transition(
            &conn,
            &mgr,
            &task.id,
            TaskStatus::InProgress,
            TransitionPayload::default(),
        )
        .unwrap();
        transition(
            &conn,
            &mgr,
            &task.id,
            TaskStatus::Completed,
            TransitionPayload {
                actual_hours: Some(8.0),
                ..TransitionPayload::default()
            },
        )
        .unwrap();

        // Assignee cannot reverse a completed task.
        let err = transition(
            &conn,
            &employee("e1", "eng"),
            &task.id,
            TaskStatus::InProgress,
            TransitionPayload::default(),
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTransition);

        let reopened = transition(
            &conn,
            &mgr,
            &task.id,
            TaskStatus::InProgress,
            TransitionPayload::default(),
        )
        .unwrap();
        assert_eq!(reopened.status, TaskStatus::InProgress);
        assert_eq!(reopened.actual_hours, Some(8.0));
    }

    #[test]
    fn stale_snapshot_loses_with_conflict() {
        let conn = mem_conn();
        let task = seed(&conn, "e1", "eng", "2026-02-01");
        let e1 = employee("e1", "eng");

        // Two callers read the same todo row.
        let snapshot_a = task_repo::get_task_by_id(&conn, &task.id).unwrap();
        let snapshot_b = task_repo::get_task_by_id(&conn, &task.id).unwrap();

        apply_transition(
            &conn,
            &e1,
            &snapshot_a,
            TaskStatus::InProgress,
            TransitionPayload::default(),
        )
        .unwrap();

        let err = apply_transition(
            &conn,
            &e1,
            &snapshot_b,
            TaskStatus::InProgress,
            TransitionPayload::default(),
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);

        // Exactly one transition landed: one log entry, one version bump.
        let updates = task_repo::list_updates(&conn, &task.id).unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(
            task_repo::get_task_by_id(&conn, &task.id).unwrap().version,
            2
        );
    }

    #[test]
    fn comments_append_in_order() {
        let conn = mem_conn();
        let task = seed(&conn, "e1", "eng", "2026-02-01");
        let e1 = employee("e1", "eng");
        add_update(&conn, &e1, &task.id, "Started gathering requirements").unwrap();
        let detail = add_update(&conn, &e1, &task.id, "Blocked on finance sign-off").unwrap();
        assert_eq!(detail.updates.len(), 2);
        assert_eq!(detail.updates[0].message, "Started gathering requirements");
        assert_eq!(detail.updates[1].message, "Blocked on finance sign-off");
        assert!(detail.updates[0].status_change.is_none());
        assert!(detail.updates[0].seq < detail.updates[1].seq);
    }

    #[test]
    fn comments_rejected_on_cancelled_tasks() {
        let conn = mem_conn();
        let task = seed(&conn, "e1", "eng", "2026-02-01");
        let mgr = manager("mgr-eng", "eng");
        transition(
            &conn,
            &mgr,
            &task.id,
            TaskStatus::Cancelled,
            TransitionPayload {
                cancel_reason: Some("descoped".to_string()),
                ..TransitionPayload::default()
            },
        )
        .unwrap();
        let err = add_update(&conn, &mgr, &task.id, "too late").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidState);
    }

    #[test]
    fn unrelated_employee_cannot_comment() {
        let conn = mem_conn();
        let task = seed(&conn, "e1", "eng", "2026-02-01");
        let err = add_update(&conn, &employee("e2", "eng"), &task.id, "drive-by note").unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[test]
    fn delete_guards_role_then_state() {
        let conn = mem_conn();
        let task = seed(&conn, "e1", "eng", "2026-02-01");
        let err = delete_task(&conn, &manager("mgr-eng", "eng"), &task.id).unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        transition(
            &conn,
            &employee("e1", "eng"),
            &task.id,
            TaskStatus::InProgress,
            TransitionPayload::default(),
        )
        .unwrap();
        let err = delete_task(&conn, &hr(), &task.id).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidState);

        let fresh = seed(&conn, "e2", "eng", "2026-02-01");
        delete_task(&conn, &hr(), &fresh.id).unwrap();
        let err = task_repo::get_task_by_id(&conn, &fresh.id).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[test]
    fn out_of_scope_reads_look_like_missing_tasks() {
        let conn = mem_conn();
        let task = seed(&conn, "e1", "eng", "2026-02-01");

        let err = get_task(&conn, &employee("e2", "eng"), &task.id).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        let err = get_task(&conn, &manager("m-sales", "sales"), &task.id).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        assert!(get_task(&conn, &employee("e1", "eng"), &task.id).is_ok());
        assert!(get_task(&conn, &hr(), &task.id).is_ok());
    }

    #[test]
    fn edit_rejected_on_terminal_tasks() {
        let conn = mem_conn();
        let task = seed(&conn, "e1", "eng", "2026-02-01");
        let mgr = manager("mgr-eng", "eng");
        let edited = edit_task(
            &conn,
            &mgr,
            &task.id,
            EditFields {
                priority: Some(Priority::Urgent),
                ..EditFields::default()
            },
        )
        .unwrap();
        assert_eq!(edited.priority, Priority::Urgent);

        transition(
            &conn,
            &mgr,
            &task.id,
            TaskStatus::Cancelled,
            TransitionPayload {
                cancel_reason: Some("cut".to_string()),
                ..TransitionPayload::default()
            },
        )
        .unwrap();
        let err = edit_task(
            &conn,
            &mgr,
            &task.id,
            EditFields {
                priority: Some(Priority::Low),
                ..EditFields::default()
            },
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidState);
    }

    #[test]
    fn listing_scopes_and_aggregates() {
        let conn = mem_conn();
        // Three eng tasks for e1 (one already past deadline), one sales task.
        seed(&conn, "e1", "eng", "2026-01-05");
        seed(&conn, "e1", "eng", "2026-03-01");
        seed(&conn, "e2", "eng", "2026-03-01");
        create_task(
            &conn,
            &hr(),
            new_task("s1", "sales", "2026-03-01"),
            date("2026-01-01"),
        )
        .unwrap();

        let today = date("2026-02-01");

        let listing = list_tasks(
            &conn,
            &employee("e1", "eng"),
            &TaskFilter::default(),
            SortKey::default(),
            1,
            today,
        )
        .unwrap();
        assert_eq!(listing.page.total, 2);
        assert_eq!(listing.summary.overdue, 1);
        assert!(listing.breakdown.is_none());

        let listing = list_tasks(
            &conn,
            &manager("mgr-eng", "eng"),
            &TaskFilter::default(),
            SortKey::default(),
            1,
            today,
        )
        .unwrap();
        assert_eq!(listing.page.total, 3);
        let rows = listing.breakdown.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().any(|r| r.key == "e1" && r.total == 2));

        let listing = list_tasks(
            &conn,
            &hr(),
            &TaskFilter {
                department_id: Some("eng".to_string()),
                ..TaskFilter::default()
            },
            SortKey::Deadline,
            1,
            today,
        )
        .unwrap();
        assert_eq!(listing.page.total, 3);
        assert_eq!(listing.page.items[0].deadline, date("2026-01-05"));
        let rows = listing.breakdown.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key, "eng");
    }

    #[test]
    fn priority_sort_breaks_ties_by_deadline() {
        let conn = mem_conn();
        let hr = hr();
        let today = date("2026-01-01");
        let mut input = new_task("e1", "eng", "2026-03-01");
        input.title = "Low first".to_string();
        input.priority = Priority::Low;
        create_task(&conn, &hr, input, today).unwrap();
        let mut input = new_task("e1", "eng", "2026-02-15");
        input.title = "Urgent late deadline".to_string();
        input.priority = Priority::Urgent;
        create_task(&conn, &hr, input, today).unwrap();
        let mut input = new_task("e1", "eng", "2026-01-20");
        input.title = "Urgent early deadline".to_string();
        input.priority = Priority::Urgent;
        create_task(&conn, &hr, input, today).unwrap();

        let listing = list_tasks(
            &conn,
            &hr,
            &TaskFilter::default(),
            SortKey::Priority,
            1,
            today,
        )
        .unwrap();
        let titles: Vec<&str> = listing
            .page
            .items
            .iter()
            .map(|t| t.title.as_str())
            .collect();
        assert_eq!(
            titles,
            vec!["Urgent early deadline", "Urgent late deadline", "Low first"]
        );
    }
}
