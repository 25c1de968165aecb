use chrono::NaiveDate;

use crate::models::{Task, TaskStatus};

/// A task is overdue when it is still open and its deadline has passed.
/// `today` is always supplied by the caller so one date serves a whole
/// request and tests control the clock.
pub fn is_overdue(status: TaskStatus, deadline: NaiveDate, today: NaiveDate) -> bool {
    status.is_open() && deadline < today
}

pub fn task_is_overdue(task: &Task, today: NaiveDate) -> bool {
    is_overdue(task.status, task.deadline, today)
}
