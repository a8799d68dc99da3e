use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum accepted length for a task description, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Option<i64>,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// A new user starts with an empty password hash; callers are expected
    /// to set a password before persisting (see `auth::Credentials`).
    pub fn new(username: String, email: String) -> Self {
        Self {
            id: None,
            username,
            email,
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }
}

/// Task priority. Wire and display values keep the original application's
/// Portuguese labels: `Baixa`, `Média`, `Alta`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Priority {
    Baixa,
    #[default]
    Media,
    Alta,
}

impl Priority {
    /// Fixed ordering rank: Alta > Média > Baixa.
    pub fn rank(self) -> u8 {
        match self {
            Priority::Baixa => 1,
            Priority::Media => 2,
            Priority::Alta => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Baixa => "Baixa",
            Priority::Media => "Média",
            Priority::Alta => "Alta",
        }
    }

    pub const ALL: [Priority; 3] = [Priority::Baixa, Priority::Media, Priority::Alta];
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid priority: {0}")]
pub struct ParsePriorityError(pub String);

impl FromStr for Priority {
    type Err = ParsePriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "Media" without the accent is accepted as a plain-ASCII form.
        match s {
            "Baixa" => Ok(Priority::Baixa),
            "Média" | "Media" => Ok(Priority::Media),
            "Alta" => Ok(Priority::Alta),
            other => Err(ParsePriorityError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Option<i64>,
    pub description: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub category: Option<String>,
    pub user_id: i64,
}

impl Task {
    pub fn new(description: String, user_id: i64) -> Self {
        Self {
            id: None,
            description,
            completed: false,
            created_at: Utc::now(),
            priority: Priority::default(),
            due_date: None,
            category: None,
            user_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_parses_known_labels() {
        assert_eq!("Alta".parse::<Priority>().unwrap(), Priority::Alta);
        assert_eq!("Média".parse::<Priority>().unwrap(), Priority::Media);
        assert_eq!("Media".parse::<Priority>().unwrap(), Priority::Media);
        assert_eq!("Baixa".parse::<Priority>().unwrap(), Priority::Baixa);
    }

    #[test]
    fn priority_rejects_unknown_labels() {
        assert!("Urgent".parse::<Priority>().is_err());
        assert!("".parse::<Priority>().is_err());
        assert!("alta".parse::<Priority>().is_err());
    }

    #[test]
    fn priority_rank_orders_alta_first() {
        assert!(Priority::Alta.rank() > Priority::Media.rank());
        assert!(Priority::Media.rank() > Priority::Baixa.rank());
    }

    #[test]
    fn new_task_defaults() {
        let task = Task::new("buy milk".to_string(), 1);
        assert!(!task.completed);
        assert_eq!(task.priority, Priority::Media);
        assert!(task.due_date.is_none());
        assert!(task.category.is_none());
    }
}
