use crate::engine::{BreakdownRow, Summary, TaskListing};
use crate::models::{Task, TaskUpdate};

pub fn print_task(t: &Task) {
    println!("Task: {} ({})", t.title, t.id);
    if let Some(ref desc) = t.description {
        println!("  Description: {desc}");
    }
    println!("  Status: {}", t.status.as_str());
    println!("  Priority: {}", t.priority.as_str());
    println!("  Assigned to: {} (by {})", t.assigned_to, t.assigned_by);
    println!("  Department: {}", t.department_id);
    println!("  Deadline: {}", t.deadline);
    if let Some(est) = t.estimated_hours {
        println!("  Estimated hours: {est}");
    }
    if let Some(actual) = t.actual_hours {
        println!("  Actual hours: {actual}");
    }
    if !t.tags.is_empty() {
        println!("  Tags: {}", t.tags.join(", "));
    }
    if let Some(ref reason) = t.cancel_reason {
        println!("  Cancel reason: {reason}");
    }
    println!("  Created: {}", t.created_at);
    println!("  Updated: {}", t.updated_at);
}

pub fn print_task_list(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }
    for t in tasks {
        println!(
            "  [{}] {} ({}) {} due {} @{}",
            t.status.as_str(),
            t.title,
            &t.id[..std::cmp::min(8, t.id.len())],
            t.priority.as_str(),
            t.deadline,
            t.assigned_to
        );
    }
}

pub fn print_updates(updates: &[TaskUpdate]) {
    if updates.is_empty() {
        return;
    }
    println!("\nActivity:");
    for u in updates {
        match u.status_change.as_deref() {
            Some(change) => println!(
                "  [{}] {}: {} ({})",
                u.updated_at, change, u.message, u.updated_by
            ),
            None => println!("  [{}] {} ({})", u.updated_at, u.message, u.updated_by),
        }
    }
}

pub fn print_summary(s: &Summary) {
    println!(
        "Summary: total={} todo={} in_progress={} completed={} cancelled={} overdue={}",
        s.total, s.todo, s.in_progress, s.completed, s.cancelled, s.overdue
    );
}

pub fn print_breakdown(rows: &[BreakdownRow]) {
    if rows.is_empty() {
        return;
    }
    println!("Breakdown:");
    for r in rows {
        println!(
            "  {}: total={} in_progress={} completed={} overdue={}",
            r.key, r.total, r.in_progress, r.completed, r.overdue
        );
    }
}

pub fn print_listing(listing: &TaskListing) {
    print_summary(&listing.summary);
    if let Some(ref rows) = listing.breakdown {
        print_breakdown(rows);
    }
    println!(
        "Page {}/{} ({} tasks)",
        listing.page.current_page, listing.page.total_pages, listing.page.total
    );
    print_task_list(&listing.page.items);
}
