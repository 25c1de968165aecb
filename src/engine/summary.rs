use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::engine::overdue;
use crate::models::{Role, Task, TaskStatus};

/// Status counters over one scoped, filtered task set.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Summary {
    pub total: i64,
    pub todo: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub cancelled: i64,
    pub overdue: i64,
}

/// One breakdown row, keyed by department (HR/admin view) or by assignee
/// (manager view).
#[derive(Debug, Clone, Serialize)]
pub struct BreakdownRow {
    pub key: String,
    pub total: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub overdue: i64,
}

/// Fold the task set into counters. `today` is captured once per request so
/// every overdue count in one response agrees on the date.
pub fn summarize(tasks: &[Task], today: NaiveDate) -> Summary {
    let mut summary = Summary::default();
    for task in tasks {
        summary.total += 1;
        match task.status {
            TaskStatus::Todo => summary.todo += 1,
            TaskStatus::InProgress => summary.in_progress += 1,
            TaskStatus::Completed => summary.completed += 1,
            TaskStatus::Cancelled => summary.cancelled += 1,
        }
        if overdue::task_is_overdue(task, today) {
            summary.overdue += 1;
        }
    }
    summary
}

/// Breakdown for the caller's vantage point: HR/admin see departments,
/// managers see the people on their team, employees get none.
pub fn breakdown_for(role: Role, tasks: &[Task], today: NaiveDate) -> Option<Vec<BreakdownRow>> {
    match role {
        Role::Hr | Role::Admin => Some(breakdown_by(tasks, today, |t| &t.department_id)),
        Role::Manager => Some(breakdown_by(tasks, today, |t| &t.assigned_to)),
        Role::Employee => None,
    }
}

fn breakdown_by<'a, F>(tasks: &'a [Task], today: NaiveDate, key: F) -> Vec<BreakdownRow>
where
    F: Fn(&'a Task) -> &'a str,
{
    let mut rows: BTreeMap<&str, BreakdownRow> = BTreeMap::new();
    for task in tasks {
        let row = rows.entry(key(task)).or_insert_with(|| BreakdownRow {
            key: key(task).to_string(),
            total: 0,
            in_progress: 0,
            completed: 0,
            overdue: 0,
        });
        row.total += 1;
        match task.status {
            TaskStatus::InProgress => row.in_progress += 1,
            TaskStatus::Completed => row.completed += 1,
            _ => {}
        }
        if overdue::task_is_overdue(task, today) {
            row.overdue += 1;
        }
    }
    rows.into_values().collect()
}
