use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};
use std::path::PathBuf;
use thiserror::Error;

use crate::models::{Priority, Task, User};

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Failed to create database directory: {0}")]
    DirectoryError(String),
    #[error("Uniqueness conflict: {0}")]
    Conflict(String),
}

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Create a new database connection and initialize the schema
    pub fn new(path: &str) -> Result<Self, DatabaseError> {
        let db_path = PathBuf::from(path);

        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DatabaseError::DirectoryError(e.to_string()))?;
            }
        }

        let conn = Connection::open(&db_path)?;

        let db = Database { conn };
        db.initialize_schema()?;

        Ok(db)
    }

    /// Open an in-memory database, used by tests and the `--ephemeral` flag
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Initialize the database schema (tables and indexes)
    fn initialize_schema(&self) -> Result<(), DatabaseError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                username        TEXT NOT NULL UNIQUE,
                email           TEXT NOT NULL UNIQUE,
                password_hash   TEXT NOT NULL,
                created_at      TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS tasks (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                description     TEXT NOT NULL,
                completed       INTEGER NOT NULL DEFAULT 0,
                created_at      TEXT NOT NULL,
                priority        TEXT NOT NULL DEFAULT 'Média',
                due_date        TEXT,
                category        TEXT,
                user_id         INTEGER NOT NULL REFERENCES users(id)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_tasks_user_id ON tasks(user_id)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_tasks_due_date ON tasks(due_date)",
            [],
        )?;

        Ok(())
    }

    /// Map a constraint violation onto the dedicated conflict variant
    fn map_conflict(err: rusqlite::Error, what: &str) -> DatabaseError {
        match &err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                DatabaseError::Conflict(what.to_string())
            }
            _ => DatabaseError::SqliteError(err),
        }
    }

    /// Insert a user and return its ID
    pub fn insert_user(&self, user: &User) -> Result<i64, DatabaseError> {
        self.conn
            .execute(
                "INSERT INTO users (username, email, password_hash, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![
                    user.username,
                    user.email,
                    user.password_hash,
                    user.created_at
                ],
            )
            .map_err(|e| Self::map_conflict(e, "username or email already registered"))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn row_to_user(row: &rusqlite::Row) -> Result<User, rusqlite::Error> {
        Ok(User {
            id: Some(row.get(0)?),
            username: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    pub fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, username, email, password_hash, created_at
             FROM users WHERE username = ?1",
        )?;
        let user = stmt
            .query_row(rusqlite::params![username], Self::row_to_user)
            .optional()?;
        Ok(user)
    }

    pub fn find_user_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, username, email, password_hash, created_at
             FROM users WHERE id = ?1",
        )?;
        let user = stmt
            .query_row(rusqlite::params![id], Self::row_to_user)
            .optional()?;
        Ok(user)
    }

    pub fn username_taken(&self, username: &str) -> Result<bool, DatabaseError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM users WHERE username = ?1",
            rusqlite::params![username],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn email_taken(&self, email: &str) -> Result<bool, DatabaseError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM users WHERE email = ?1",
            rusqlite::params![email],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Insert a task into the database and return its ID
    pub fn insert_task(&self, task: &Task) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO tasks (description, completed, created_at, priority, due_date, category, user_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                task.description,
                if task.completed { 1 } else { 0 },
                task.created_at,
                task.priority.as_str(),
                task.due_date,
                task.category,
                task.user_id
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Helper function to map a row to a Task
    fn row_to_task(row: &rusqlite::Row) -> Result<Task, rusqlite::Error> {
        let priority: String = row.get(4)?;
        let priority = priority.parse::<Priority>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok(Task {
            id: Some(row.get(0)?),
            description: row.get(1)?,
            completed: row.get::<_, i64>(2)? != 0,
            created_at: row.get(3)?,
            priority,
            due_date: row.get(5)?,
            category: row.get(6)?,
            user_id: row.get(7)?,
        })
    }

    /// Get a single task by ID
    pub fn get_task(&self, id: i64) -> Result<Option<Task>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, description, completed, created_at, priority, due_date, category, user_id
             FROM tasks WHERE id = ?1",
        )?;
        let task = stmt
            .query_row(rusqlite::params![id], Self::row_to_task)
            .optional()?;
        Ok(task)
    }

    /// Get all tasks owned by a user, in insertion order
    pub fn tasks_for_user(&self, user_id: i64) -> Result<Vec<Task>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, description, completed, created_at, priority, due_date, category, user_id
             FROM tasks WHERE user_id = ?1 ORDER BY id ASC",
        )?;
        let tasks = stmt
            .query_map(rusqlite::params![user_id], Self::row_to_task)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    /// Update a task's editable fields. The completion flag, creation
    /// timestamp and owner are never touched here.
    pub fn update_task(
        &self,
        id: i64,
        description: &str,
        priority: Priority,
        due_date: Option<NaiveDate>,
        category: Option<&str>,
    ) -> Result<(), DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE tasks SET description = ?1, priority = ?2, due_date = ?3, category = ?4
             WHERE id = ?5",
            rusqlite::params![description, priority.as_str(), due_date, category, id],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Set a task's completion flag
    pub fn set_completed(&self, id: i64, completed: bool) -> Result<(), DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE tasks SET completed = ?1 WHERE id = ?2",
            rusqlite::params![if completed { 1 } else { 0 }, id],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Delete a task by ID, reporting whether a row was actually removed
    pub fn delete_task(&self, id: i64) -> Result<bool, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let removed = tx.execute("DELETE FROM tasks WHERE id = ?1", rusqlite::params![id])?;
        tx.commit()?;
        Ok(removed > 0)
    }

    /// Distinct non-null categories for a user, sorted, for the filter dropdown
    pub fn task_categories(&self, user_id: i64) -> Result<Vec<String>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT category FROM tasks
             WHERE user_id = ?1 AND category IS NOT NULL
             ORDER BY category ASC",
        )?;
        let categories = stmt
            .query_map(rusqlite::params![user_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(categories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn test_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn add_user(db: &Database, username: &str, email: &str) -> i64 {
        let mut user = User::new(username.to_string(), email.to_string());
        user.password_hash = "hash".to_string();
        db.insert_user(&user).unwrap()
    }

    #[test]
    fn insert_and_find_user() {
        let db = test_db();
        let id = add_user(&db, "alice", "alice@example.com");

        let found = db.find_user_by_username("alice").unwrap().unwrap();
        assert_eq!(found.id, Some(id));
        assert_eq!(found.email, "alice@example.com");

        assert!(db.find_user_by_username("bob").unwrap().is_none());
        assert!(db.username_taken("alice").unwrap());
        assert!(db.email_taken("alice@example.com").unwrap());
        assert!(!db.username_taken("bob").unwrap());
    }

    #[test]
    fn duplicate_username_is_a_conflict() {
        let db = test_db();
        add_user(&db, "alice", "alice@example.com");

        let mut dup = User::new("alice".to_string(), "other@example.com".to_string());
        dup.password_hash = "hash".to_string();
        match db.insert_user(&dup) {
            Err(DatabaseError::Conflict(_)) => {}
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_email_is_a_conflict() {
        let db = test_db();
        add_user(&db, "alice", "alice@example.com");

        let mut dup = User::new("bob".to_string(), "alice@example.com".to_string());
        dup.password_hash = "hash".to_string();
        assert!(matches!(db.insert_user(&dup), Err(DatabaseError::Conflict(_))));
    }

    #[test]
    fn insert_and_get_task() {
        let db = test_db();
        let uid = add_user(&db, "alice", "alice@example.com");

        let mut task = Task::new("buy milk".to_string(), uid);
        task.priority = Priority::Alta;
        task.due_date = NaiveDate::from_ymd_opt(2025, 3, 10);
        task.category = Some("errands".to_string());
        let id = db.insert_task(&task).unwrap();

        let stored = db.get_task(id).unwrap().unwrap();
        assert_eq!(stored.description, "buy milk");
        assert!(!stored.completed);
        assert_eq!(stored.priority, Priority::Alta);
        assert_eq!(stored.due_date, NaiveDate::from_ymd_opt(2025, 3, 10));
        assert_eq!(stored.category.as_deref(), Some("errands"));
        assert_eq!(stored.user_id, uid);
        assert_eq!(stored.created_at, task.created_at);
    }

    #[test]
    fn update_never_touches_created_at_completed_or_owner() {
        let db = test_db();
        let uid = add_user(&db, "alice", "alice@example.com");
        let id = db.insert_task(&Task::new("original".to_string(), uid)).unwrap();

        let before = db.get_task(id).unwrap().unwrap();
        db.set_completed(id, true).unwrap();
        db.update_task(id, "edited", Priority::Baixa, None, Some("work"))
            .unwrap();

        let after = db.get_task(id).unwrap().unwrap();
        assert_eq!(after.description, "edited");
        assert_eq!(after.priority, Priority::Baixa);
        assert_eq!(after.category.as_deref(), Some("work"));
        assert_eq!(after.created_at, before.created_at);
        assert_eq!(after.user_id, uid);
        assert!(after.completed, "update must not reset the completion flag");
    }

    #[test]
    fn delete_task_reports_missing_rows() {
        let db = test_db();
        let uid = add_user(&db, "alice", "alice@example.com");
        let id = db.insert_task(&Task::new("gone soon".to_string(), uid)).unwrap();

        assert!(db.delete_task(id).unwrap());
        assert!(db.get_task(id).unwrap().is_none());
        assert!(db.tasks_for_user(uid).unwrap().is_empty());
        assert!(!db.delete_task(id).unwrap());
    }

    #[test]
    fn tasks_are_scoped_to_their_owner() {
        let db = test_db();
        let alice = add_user(&db, "alice", "alice@example.com");
        let bob = add_user(&db, "bob", "bob@example.com");

        db.insert_task(&Task::new("hers".to_string(), alice)).unwrap();
        db.insert_task(&Task::new("his".to_string(), bob)).unwrap();

        let hers = db.tasks_for_user(alice).unwrap();
        assert_eq!(hers.len(), 1);
        assert_eq!(hers[0].description, "hers");
    }

    #[test]
    fn categories_are_distinct_and_sorted() {
        let db = test_db();
        let uid = add_user(&db, "alice", "alice@example.com");

        for cat in ["work", "errands", "work", "home"] {
            let mut task = Task::new(format!("task in {cat}"), uid);
            task.category = Some(cat.to_string());
            db.insert_task(&task).unwrap();
        }
        db.insert_task(&Task::new("uncategorized".to_string(), uid)).unwrap();

        let categories = db.task_categories(uid).unwrap();
        assert_eq!(categories, vec!["errands", "home", "work"]);
    }
}
