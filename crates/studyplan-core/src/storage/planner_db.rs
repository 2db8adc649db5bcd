//! SQLite-based storage for courses, tasks, events, and time blocks.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use super::data_dir;
use crate::error::DatabaseError;
use crate::model::{
    parse_datetime_fallback, BlockKind, Course, CourseSession, Event, EventKind, Task, TaskKind,
    TaskStatus, TimeBlock,
};

/// Build a Task from a database row.
fn row_to_task(row: &rusqlite::Row) -> Result<Task, rusqlite::Error> {
    let kind_str: String = row.get(2)?;
    let due_str: String = row.get(4)?;
    let status_str: String = row.get(9)?;
    let created_str: String = row.get(11)?;
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        kind: TaskKind::parse(&kind_str),
        course_id: row.get(3)?,
        due_date: parse_datetime_fallback(&due_str),
        difficulty: row.get::<_, i64>(5)? as u8,
        estimated_hours: row.get(6)?,
        is_hard_deadline: row.get(7)?,
        buffer_days: row.get(8)?,
        status: TaskStatus::parse(&status_str),
        description: row.get(10)?,
        created_at: parse_datetime_fallback(&created_str),
    })
}

/// Build an Event from a database row.
fn row_to_event(row: &rusqlite::Row) -> Result<Event, rusqlite::Error> {
    let kind_str: String = row.get(2)?;
    let start_str: String = row.get(4)?;
    let end_str: String = row.get(5)?;
    Ok(Event {
        id: row.get(0)?,
        title: row.get(1)?,
        kind: EventKind::parse(&kind_str),
        course_id: row.get(3)?,
        start_time: parse_datetime_fallback(&start_str),
        end_time: parse_datetime_fallback(&end_str),
        location: row.get(6)?,
        task_id: row.get(7)?,
    })
}

/// Build a TimeBlock from a database row.
fn row_to_block(row: &rusqlite::Row) -> Result<TimeBlock, rusqlite::Error> {
    let start_str: String = row.get(2)?;
    let end_str: String = row.get(3)?;
    let kind_str: String = row.get(5)?;
    Ok(TimeBlock {
        id: row.get(0)?,
        task_id: row.get(1)?,
        start_time: parse_datetime_fallback(&start_str),
        end_time: parse_datetime_fallback(&end_str),
        completed: row.get(4)?,
        kind: BlockKind::parse(&kind_str),
        is_manual: row.get(6)?,
    })
}

/// SQLite database for planner storage.
///
/// Stores courses, tasks, calendar events, and scheduled time blocks.
pub struct PlannerDb {
    conn: Connection,
}

impl PlannerDb {
    /// Open the planner database at `~/.config/studyplan/studyplan.db`.
    ///
    /// Creates tables if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, DatabaseError> {
        let path = data_dir()
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?
            .join("studyplan.db");
        Self::open_at(&path)
    }

    /// Open (or create) the database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    #[cfg(test)]
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory().map_err(|source| DatabaseError::OpenFailed {
            path: std::path::PathBuf::from(":memory:"),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS courses (
                    id       TEXT PRIMARY KEY,
                    name     TEXT NOT NULL,
                    code     TEXT NOT NULL,
                    color    TEXT,
                    credits  INTEGER NOT NULL DEFAULT 0,
                    sessions TEXT NOT NULL DEFAULT '[]'
                );

                CREATE TABLE IF NOT EXISTS tasks (
                    id               TEXT PRIMARY KEY,
                    title            TEXT NOT NULL,
                    kind             TEXT NOT NULL,
                    course_id        TEXT NOT NULL,
                    due_date         TEXT NOT NULL,
                    difficulty       INTEGER NOT NULL DEFAULT 3,
                    estimated_hours  REAL NOT NULL DEFAULT 0,
                    is_hard_deadline INTEGER NOT NULL DEFAULT 0,
                    buffer_days      INTEGER,
                    status           TEXT NOT NULL DEFAULT 'not-started',
                    description      TEXT,
                    created_at       TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS events (
                    id         TEXT PRIMARY KEY,
                    title      TEXT NOT NULL,
                    kind       TEXT NOT NULL,
                    course_id  TEXT,
                    start_time TEXT NOT NULL,
                    end_time   TEXT NOT NULL,
                    location   TEXT,
                    task_id    TEXT
                );

                CREATE TABLE IF NOT EXISTS time_blocks (
                    id         TEXT PRIMARY KEY,
                    task_id    TEXT NOT NULL,
                    start_time TEXT NOT NULL,
                    end_time   TEXT NOT NULL,
                    completed  INTEGER NOT NULL DEFAULT 0,
                    kind       TEXT NOT NULL DEFAULT 'study',
                    is_manual  INTEGER NOT NULL DEFAULT 0
                );

                CREATE INDEX IF NOT EXISTS idx_tasks_course ON tasks(course_id);
                CREATE INDEX IF NOT EXISTS idx_blocks_task ON time_blocks(task_id);
                CREATE INDEX IF NOT EXISTS idx_events_task ON events(task_id);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    // === Course CRUD ===

    pub fn upsert_course(&self, course: &Course) -> Result<(), DatabaseError> {
        let sessions = serde_json::to_string(&course.sessions)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        self.conn.execute(
            "INSERT INTO courses (id, name, code, color, credits, sessions)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 code = excluded.code,
                 color = excluded.color,
                 credits = excluded.credits,
                 sessions = excluded.sessions",
            params![
                course.id,
                course.name,
                course.code,
                course.color,
                course.credits as i64,
                sessions,
            ],
        )?;
        Ok(())
    }

    pub fn get_course(&self, id: &str) -> Result<Option<Course>, DatabaseError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, code, color, credits, sessions FROM courses WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()?;
        Ok(row.map(|(id, name, code, color, credits, sessions_json)| {
            let sessions: Vec<CourseSession> =
                serde_json::from_str(&sessions_json).unwrap_or_default();
            Course { id, name, code, color, credits: credits as u32, sessions }
        }))
    }

    pub fn list_courses(&self) -> Result<Vec<Course>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, code, color, credits, sessions FROM courses ORDER BY code")?;
        let mut rows = stmt.query([])?;
        let mut courses = Vec::new();
        while let Some(row) = rows.next()? {
            let sessions_json: String = row.get(5)?;
            let sessions: Vec<CourseSession> =
                serde_json::from_str(&sessions_json).unwrap_or_default();
            courses.push(Course {
                id: row.get(0)?,
                name: row.get(1)?,
                code: row.get(2)?,
                color: row.get(3)?,
                credits: row.get::<_, i64>(4)? as u32,
                sessions,
            });
        }
        Ok(courses)
    }

    /// Delete a course and everything hanging off it: its tasks (with their
    /// blocks and deadline events) and its events.
    pub fn delete_course(&mut self, id: &str) -> Result<(), DatabaseError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM time_blocks WHERE task_id IN (SELECT id FROM tasks WHERE course_id = ?1)",
            params![id],
        )?;
        tx.execute(
            "DELETE FROM events WHERE course_id = ?1
             OR task_id IN (SELECT id FROM tasks WHERE course_id = ?1)",
            params![id],
        )?;
        tx.execute("DELETE FROM tasks WHERE course_id = ?1", params![id])?;
        tx.execute("DELETE FROM courses WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(())
    }

    // === Task CRUD ===

    pub fn upsert_task(&self, task: &Task) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO tasks (id, title, kind, course_id, due_date, difficulty,
                                estimated_hours, is_hard_deadline, buffer_days, status,
                                description, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT(id) DO UPDATE SET
                 title = excluded.title,
                 kind = excluded.kind,
                 course_id = excluded.course_id,
                 due_date = excluded.due_date,
                 difficulty = excluded.difficulty,
                 estimated_hours = excluded.estimated_hours,
                 is_hard_deadline = excluded.is_hard_deadline,
                 buffer_days = excluded.buffer_days,
                 status = excluded.status,
                 description = excluded.description",
            params![
                task.id,
                task.title,
                task.kind.as_str(),
                task.course_id,
                task.due_date.to_rfc3339(),
                task.difficulty as i64,
                task.estimated_hours,
                task.is_hard_deadline,
                task.buffer_days,
                task.status.as_str(),
                task.description,
                task.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_task(&self, id: &str) -> Result<Option<Task>, DatabaseError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, title, kind, course_id, due_date, difficulty, estimated_hours,
                        is_hard_deadline, buffer_days, status, description, created_at
                 FROM tasks WHERE id = ?1",
                params![id],
                row_to_task,
            )
            .optional()?)
    }

    pub fn list_tasks(&self) -> Result<Vec<Task>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, kind, course_id, due_date, difficulty, estimated_hours,
                    is_hard_deadline, buffer_days, status, description, created_at
             FROM tasks ORDER BY due_date",
        )?;
        let mut rows = stmt.query([])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(row_to_task(row)?);
        }
        Ok(tasks)
    }

    pub fn set_task_status(&self, id: &str, status: TaskStatus) -> Result<bool, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE tasks SET status = ?2 WHERE id = ?1",
            params![id, status.as_str()],
        )?;
        Ok(changed > 0)
    }

    /// Delete a task together with its time blocks and its deadline event.
    pub fn delete_task(&mut self, id: &str) -> Result<bool, DatabaseError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM time_blocks WHERE task_id = ?1", params![id])?;
        tx.execute("DELETE FROM events WHERE task_id = ?1", params![id])?;
        let deleted = tx.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(deleted > 0)
    }

    // === Event CRUD ===

    pub fn upsert_event(&self, event: &Event) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO events (id, title, kind, course_id, start_time, end_time, location, task_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
                 title = excluded.title,
                 kind = excluded.kind,
                 course_id = excluded.course_id,
                 start_time = excluded.start_time,
                 end_time = excluded.end_time,
                 location = excluded.location,
                 task_id = excluded.task_id",
            params![
                event.id,
                event.title,
                event.kind.as_str(),
                event.course_id,
                event.start_time.to_rfc3339(),
                event.end_time.to_rfc3339(),
                event.location,
                event.task_id,
            ],
        )?;
        Ok(())
    }

    pub fn list_events(&self) -> Result<Vec<Event>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, kind, course_id, start_time, end_time, location, task_id
             FROM events ORDER BY start_time",
        )?;
        let mut rows = stmt.query([])?;
        let mut events = Vec::new();
        while let Some(row) = rows.next()? {
            events.push(row_to_event(row)?);
        }
        Ok(events)
    }

    pub fn delete_event(&self, id: &str) -> Result<bool, DatabaseError> {
        let deleted = self
            .conn
            .execute("DELETE FROM events WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    // === Time block CRUD ===

    pub fn insert_block(&self, block: &TimeBlock) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO time_blocks (id, task_id, start_time, end_time, completed, kind, is_manual)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                block.id,
                block.task_id,
                block.start_time.to_rfc3339(),
                block.end_time.to_rfc3339(),
                block.completed,
                block.kind.as_str(),
                block.is_manual,
            ],
        )?;
        Ok(())
    }

    pub fn list_blocks(&self) -> Result<Vec<TimeBlock>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, task_id, start_time, end_time, completed, kind, is_manual
             FROM time_blocks ORDER BY start_time",
        )?;
        let mut rows = stmt.query([])?;
        let mut blocks = Vec::new();
        while let Some(row) = rows.next()? {
            blocks.push(row_to_block(row)?);
        }
        Ok(blocks)
    }

    pub fn list_blocks_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<TimeBlock>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, task_id, start_time, end_time, completed, kind, is_manual
             FROM time_blocks
             WHERE start_time < ?2 AND end_time > ?1
             ORDER BY start_time",
        )?;
        let mut rows = stmt.query(params![from.to_rfc3339(), to.to_rfc3339()])?;
        let mut blocks = Vec::new();
        while let Some(row) = rows.next()? {
            blocks.push(row_to_block(row)?);
        }
        Ok(blocks)
    }

    pub fn set_block_completed(&self, id: &str, completed: bool) -> Result<bool, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE time_blocks SET completed = ?2 WHERE id = ?1",
            params![id, completed],
        )?;
        Ok(changed > 0)
    }

    /// Replace every generated block with the given set in one transaction.
    /// Manual blocks survive untouched; `keep_task_ids` preserves the old
    /// generated blocks of tasks whose scheduling failed this run.
    pub fn replace_generated_blocks(
        &mut self,
        blocks: &[TimeBlock],
        keep_task_ids: &[String],
    ) -> Result<(), DatabaseError> {
        let tx = self.conn.transaction()?;
        if keep_task_ids.is_empty() {
            tx.execute("DELETE FROM time_blocks WHERE is_manual = 0", [])?;
        } else {
            let placeholders = vec!["?"; keep_task_ids.len()].join(", ");
            let sql = format!(
                "DELETE FROM time_blocks WHERE is_manual = 0 AND task_id NOT IN ({placeholders})"
            );
            tx.execute(&sql, rusqlite::params_from_iter(keep_task_ids))?;
        }
        for block in blocks {
            tx.execute(
                "INSERT INTO time_blocks (id, task_id, start_time, end_time, completed, kind, is_manual)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    block.id,
                    block.task_id,
                    block.start_time.to_rfc3339(),
                    block.end_time.to_rfc3339(),
                    block.completed,
                    block.kind.as_str(),
                    block.is_manual,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Replace the generated blocks of one task, leaving everything else.
    pub fn replace_task_blocks(
        &mut self,
        task_id: &str,
        blocks: &[TimeBlock],
    ) -> Result<(), DatabaseError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM time_blocks WHERE task_id = ?1 AND is_manual = 0",
            params![task_id],
        )?;
        for block in blocks {
            tx.execute(
                "INSERT INTO time_blocks (id, task_id, start_time, end_time, completed, kind, is_manual)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    block.id,
                    block.task_id,
                    block.start_time.to_rfc3339(),
                    block.end_time.to_rfc3339(),
                    block.completed,
                    block.kind.as_str(),
                    block.is_manual,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}
