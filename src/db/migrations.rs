use rusqlite::Connection;

use crate::error::EngineError;

pub fn run_migrations(conn: &Connection) -> Result<(), EngineError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS tasks (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT,
            priority TEXT NOT NULL DEFAULT 'medium'
                CHECK (priority IN ('low', 'medium', 'high', 'urgent')),
            status TEXT NOT NULL DEFAULT 'todo'
                CHECK (status IN ('todo', 'in_progress', 'completed', 'cancelled')),
            assigned_to TEXT NOT NULL,
            assigned_by TEXT NOT NULL,
            department_id TEXT NOT NULL,
            deadline TEXT NOT NULL,
            estimated_hours REAL,
            actual_hours REAL,
            tags TEXT NOT NULL DEFAULT '[]',
            cancel_reason TEXT,
            version INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS task_updates (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            task_id TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
            updated_by TEXT NOT NULL,
            message TEXT NOT NULL,
            status_change TEXT,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_tasks_department_status ON tasks(department_id, status);
        CREATE INDEX IF NOT EXISTS idx_tasks_assignee_status ON tasks(assigned_to, status);
        CREATE INDEX IF NOT EXISTS idx_updates_task ON task_updates(task_id);
        ",
    )?;
    Ok(())
}
