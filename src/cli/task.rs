use serde_json::json;

use crate::cli::commands::TaskCommands;
use crate::cli::identity::Claims;
use crate::db::connection;
use crate::engine::{self, EditFields, NewTask, SortKey, TaskFilter, TransitionPayload};
use crate::error::EngineError;
use crate::models::{Priority, TaskStatus};
use crate::output;

pub fn run(cmd: TaskCommands, json_output: bool, claims: &Claims) -> i32 {
    let result = match cmd {
        TaskCommands::Add {
            title,
            description,
            priority,
            assignee,
            department,
            deadline,
            estimated_hours,
            tag,
        } => run_add(
            claims,
            &title,
            description,
            &priority,
            &assignee,
            department,
            &deadline,
            estimated_hours,
            tag,
            json_output,
        ),
        TaskCommands::List {
            status,
            priority,
            department,
            assignee,
            sort,
            page,
        } => run_list(
            claims,
            status.as_deref(),
            priority.as_deref(),
            department,
            assignee,
            &sort,
            page,
            json_output,
        ),
        TaskCommands::Show { id } => run_show(claims, &id, json_output),
        TaskCommands::Start { id, message } => {
            run_transition(claims, &id, TaskStatus::InProgress, message, None, None, json_output)
        }
        TaskCommands::Complete { id, hours, message } => run_transition(
            claims,
            &id,
            TaskStatus::Completed,
            message,
            hours,
            None,
            json_output,
        ),
        TaskCommands::Reopen { id, message } => {
            run_transition(claims, &id, TaskStatus::Todo, message, None, None, json_output)
        }
        TaskCommands::Cancel { id, reason, message } => run_transition(
            claims,
            &id,
            TaskStatus::Cancelled,
            message,
            None,
            reason,
            json_output,
        ),
        TaskCommands::Comment { id, message } => run_comment(claims, &id, &message, json_output),
        TaskCommands::Edit {
            id,
            title,
            description,
            priority,
            deadline,
            estimated_hours,
            tag,
        } => run_edit(
            claims,
            &id,
            title,
            description,
            priority.as_deref(),
            deadline.as_deref(),
            estimated_hours,
            tag,
            json_output,
        ),
        TaskCommands::Delete { id } => run_delete(claims, &id, json_output),
    };
    match result {
        Ok(code) => code,
        Err(e) => {
            if json_output {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output::json::error(&e)).unwrap()
                );
            } else {
                eprintln!("Error: {}", e.message);
            }
            1
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_add(
    claims: &Claims,
    title: &str,
    description: Option<String>,
    priority: &str,
    assignee: &str,
    department: Option<String>,
    deadline: &str,
    estimated_hours: Option<f64>,
    tags: Vec<String>,
    json_output: bool,
) -> Result<i32, EngineError> {
    let conn = connection::open_db()?;
    let actor = claims.resolve_actor()?;
    let today = claims.resolve_as_of()?;

    let department_id = department
        .or_else(|| actor.department_id.clone())
        .ok_or_else(|| EngineError::validation("Task department is required"))?;

    let input = NewTask {
        title: title.to_string(),
        description,
        priority: parse_priority(priority)?,
        assigned_to: assignee.to_string(),
        department_id,
        deadline: parse_date(deadline)?,
        estimated_hours,
        tags,
    };
    let task = engine::create_task(&conn, &actor, input, today)?;

    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({
                "task": output::json::task_detail(&task)
            })))
            .unwrap()
        );
    } else {
        println!("Added task: {} ({})", task.title, task.id);
    }
    Ok(0)
}

#[allow(clippy::too_many_arguments)]
fn run_list(
    claims: &Claims,
    status: Option<&str>,
    priority: Option<&str>,
    department: Option<String>,
    assignee: Option<String>,
    sort: &str,
    page: usize,
    json_output: bool,
) -> Result<i32, EngineError> {
    let conn = connection::open_db()?;
    let actor = claims.resolve_actor()?;
    let today = claims.resolve_as_of()?;

    let filter = TaskFilter {
        status: status.map(parse_status).transpose()?,
        priority: priority.map(parse_priority).transpose()?,
        department_id: department,
        assigned_to: assignee,
    };
    let sort = SortKey::from_str(sort).ok_or_else(|| {
        EngineError::validation(format!(
            "Unknown sort key '{sort}' (expected deadline, created, or priority)"
        ))
    })?;

    let listing = engine::list_tasks(&conn, &actor, &filter, sort, page, today)?;

    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(output::json::listing_json(
                &listing
            )))
            .unwrap()
        );
    } else {
        output::text::print_listing(&listing);
    }
    Ok(0)
}

fn run_show(claims: &Claims, id: &str, json_output: bool) -> Result<i32, EngineError> {
    let conn = connection::open_db()?;
    let actor = claims.resolve_actor()?;
    let detail = engine::get_task(&conn, &actor, id)?;

    if json_output {
        let updates: Vec<_> = detail.updates.iter().map(output::json::update_json).collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({
                "task": output::json::task_detail(&detail.task),
                "updates": updates
            })))
            .unwrap()
        );
    } else {
        output::text::print_task(&detail.task);
        output::text::print_updates(&detail.updates);
    }
    Ok(0)
}

fn run_transition(
    claims: &Claims,
    id: &str,
    to: TaskStatus,
    message: Option<String>,
    actual_hours: Option<f64>,
    cancel_reason: Option<String>,
    json_output: bool,
) -> Result<i32, EngineError> {
    let conn = connection::open_db()?;
    let actor = claims.resolve_actor()?;

    let payload = TransitionPayload {
        message,
        actual_hours,
        cancel_reason,
    };
    let task = engine::transition(&conn, &actor, id, to, payload)?;

    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({
                "task": output::json::task_detail(&task)
            })))
            .unwrap()
        );
    } else {
        println!("Task {} → {}", task.id, task.status.as_str());
    }
    Ok(0)
}

fn run_comment(
    claims: &Claims,
    id: &str,
    message: &str,
    json_output: bool,
) -> Result<i32, EngineError> {
    let conn = connection::open_db()?;
    let actor = claims.resolve_actor()?;
    let detail = engine::add_update(&conn, &actor, id, message)?;

    if json_output {
        let updates: Vec<_> = detail.updates.iter().map(output::json::update_json).collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({
                "task": output::json::task_summary(&detail.task),
                "updates": updates
            })))
            .unwrap()
        );
    } else {
        println!(
            "Added update to {} ({} entries)",
            detail.task.id,
            detail.updates.len()
        );
    }
    Ok(0)
}

#[allow(clippy::too_many_arguments)]
fn run_edit(
    claims: &Claims,
    id: &str,
    title: Option<String>,
    description: Option<String>,
    priority: Option<&str>,
    deadline: Option<&str>,
    estimated_hours: Option<f64>,
    tags: Vec<String>,
    json_output: bool,
) -> Result<i32, EngineError> {
    let conn = connection::open_db()?;
    let actor = claims.resolve_actor()?;

    let fields = EditFields {
        title,
        description,
        priority: priority.map(parse_priority).transpose()?,
        deadline: deadline.map(parse_date).transpose()?,
        estimated_hours,
        tags: if tags.is_empty() { None } else { Some(tags) },
    };
    let task = engine::edit_task(&conn, &actor, id, fields)?;

    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({
                "task": output::json::task_detail(&task)
            })))
            .unwrap()
        );
    } else {
        println!("Updated task: {} ({})", task.title, task.id);
    }
    Ok(0)
}

fn run_delete(claims: &Claims, id: &str, json_output: bool) -> Result<i32, EngineError> {
    let conn = connection::open_db()?;
    let actor = claims.resolve_actor()?;
    engine::delete_task(&conn, &actor, id)?;

    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({
                "deleted": { "id": id }
            })))
            .unwrap()
        );
    } else {
        println!("Deleted task {id}");
    }
    Ok(0)
}

fn parse_status(s: &str) -> Result<TaskStatus, EngineError> {
    TaskStatus::from_str(s).ok_or_else(|| {
        EngineError::validation(format!(
            "Unknown status '{s}' (expected todo, in_progress, completed, or cancelled)"
        ))
    })
}

fn parse_priority(s: &str) -> Result<Priority, EngineError> {
    Priority::from_str(s).ok_or_else(|| {
        EngineError::validation(format!(
            "Unknown priority '{s}' (expected low, medium, high, or urgent)"
        ))
    })
}

fn parse_date(s: &str) -> Result<chrono::NaiveDate, EngineError> {
    s.parse()
        .map_err(|_| EngineError::validation(format!("Invalid date '{s}' (expected YYYY-MM-DD)")))
}
