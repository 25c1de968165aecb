use serde_json::{json, Value};

use crate::engine::{BreakdownRow, Page, Summary, TaskListing};
use crate::error::EngineError;
use crate::models::{Task, TaskUpdate};

pub fn success(data: Value) -> Value {
    json!({
        "success": true,
        "data": data
    })
}

pub fn error(err: &EngineError) -> Value {
    json!({
        "success": false,
        "error": {
            "code": err.code.as_str(),
            "message": err.message
        }
    })
}

pub fn task_summary(t: &Task) -> Value {
    json!({
        "id": t.id,
        "title": t.title,
        "status": t.status.as_str(),
        "priority": t.priority.as_str(),
        "assigned_to": t.assigned_to,
        "department_id": t.department_id,
        "deadline": t.deadline.to_string()
    })
}

pub fn task_detail(t: &Task) -> Value {
    json!({
        "id": t.id,
        "title": t.title,
        "description": t.description,
        "priority": t.priority.as_str(),
        "status": t.status.as_str(),
        "assigned_to": t.assigned_to,
        "assigned_by": t.assigned_by,
        "department_id": t.department_id,
        "deadline": t.deadline.to_string(),
        "estimated_hours": t.estimated_hours,
        "actual_hours": t.actual_hours,
        "tags": t.tags,
        "cancel_reason": t.cancel_reason,
        "version": t.version,
        "created_at": t.created_at,
        "updated_at": t.updated_at
    })
}

pub fn update_json(u: &TaskUpdate) -> Value {
    json!({
        "seq": u.seq,
        "updated_by": u.updated_by,
        "message": u.message,
        "status_change": u.status_change,
        "updated_at": u.updated_at
    })
}

pub fn summary_json(s: &Summary) -> Value {
    json!({
        "total": s.total,
        "todo": s.todo,
        "in_progress": s.in_progress,
        "completed": s.completed,
        "cancelled": s.cancelled,
        "overdue": s.overdue
    })
}

pub fn breakdown_json(rows: &[BreakdownRow]) -> Value {
    Value::Array(
        rows.iter()
            .map(|r| {
                json!({
                    "key": r.key,
                    "total": r.total,
                    "in_progress": r.in_progress,
                    "completed": r.completed,
                    "overdue": r.overdue
                })
            })
            .collect(),
    )
}

pub fn pagination_json(page: &Page<Task>) -> Value {
    json!({
        "current_page": page.current_page,
        "total_pages": page.total_pages,
        "total": page.total
    })
}

pub fn listing_json(listing: &TaskListing) -> Value {
    json!({
        "tasks": listing.page.items.iter().map(task_summary).collect::<Vec<_>>(),
        "summary": summary_json(&listing.summary),
        "breakdown": listing.breakdown.as_deref().map(breakdown_json),
        "pagination": pagination_json(&listing.page)
    })
}
