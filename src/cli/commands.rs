use clap::{Parser, Subcommand};

const VERSION: &str = env!("GIT_VERSION");

#[derive(Parser)]
#[command(
    name = "taskdesk",
    version = VERSION,
    about = "Task lifecycle engine for the employee portal",
    after_help = "\
NOTE:
  DB is stored at <workspace-root>/.taskdesk/taskdesk.db
  Run `taskdesk init` before any other command.
  Every command except `init` needs identity claims: --actor and --role
  (plus --dept for employees and managers). Claims come from the portal's
  identity provider; the engine never looks them up itself.

EXIT CODES:
  0  Success
  1  Error (validation, forbidden, invalid transition, conflict, etc.)

TRANSITIONS:
  Assignees:        todo → in_progress, in_progress → completed|todo
  Managers/HR:      those plus → cancelled, completed → in_progress,
                    cancelled → todo (managers inside their department only)
  `complete` requires --hours; `cancel` requires --reason.

VISIBILITY:
  Employees see their own tasks, managers their department, HR/admin all.
  Task lists are paged 10 at a time; summary counters always cover the
  whole filtered set, not just the page."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Acting person id
    #[arg(long, global = true)]
    pub actor: Option<String>,

    /// Acting role: employee, manager, hr, admin
    #[arg(long, global = true)]
    pub role: Option<String>,

    /// Acting person's department id
    #[arg(long, global = true)]
    pub dept: Option<String>,

    /// Reporting date override, YYYY-MM-DD (defaults to today)
    #[arg(long, global = true)]
    pub as_of: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize taskdesk in this directory
    Init,

    /// Task management
    #[command(subcommand)]
    Task(TaskCommands),

    /// Summary and breakdown for the caller's scope
    Status,
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Create a task (managers in their own department, HR/admin anywhere)
    Add {
        /// Task title (3-150 characters)
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// low, medium, high, or urgent
        #[arg(long, default_value = "medium")]
        priority: String,
        /// Assignee person id
        #[arg(long)]
        assignee: String,
        /// Department the task belongs to (defaults to the actor's)
        #[arg(long)]
        department: Option<String>,
        /// Deadline, YYYY-MM-DD
        #[arg(long)]
        deadline: String,
        #[arg(long)]
        estimated_hours: Option<f64>,
        /// Tag (repeatable, at most 5)
        #[arg(long)]
        tag: Vec<String>,
    },
    /// List visible tasks with summary, breakdown, and pagination
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        assignee: Option<String>,
        /// Sort key: deadline, created, or priority
        #[arg(long, default_value = "created")]
        sort: String,
        #[arg(long, default_value = "1")]
        page: usize,
    },
    /// Show task details and its activity log
    Show {
        id: String,
    },
    /// Move a task to in_progress
    Start {
        id: String,
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Move a task to completed (requires --hours)
    Complete {
        id: String,
        /// Actual hours spent
        #[arg(long)]
        hours: Option<f64>,
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Move a task back to todo
    Reopen {
        id: String,
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Move a task to cancelled (requires --reason)
    Cancel {
        id: String,
        /// Why the task is being cancelled
        #[arg(long)]
        reason: Option<String>,
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Append a free-text update to the activity log
    Comment {
        id: String,
        message: String,
    },
    /// Edit descriptive fields of a non-terminal task
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        /// New deadline, YYYY-MM-DD
        #[arg(long)]
        deadline: Option<String>,
        #[arg(long)]
        estimated_hours: Option<f64>,
        /// Replace the tag set (repeatable)
        #[arg(long)]
        tag: Vec<String>,
    },
    /// Delete a task still in todo (HR/admin only)
    Delete {
        id: String,
    },
}
