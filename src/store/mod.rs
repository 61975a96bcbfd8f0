pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::PgStore;

// MODELS

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct TaskRecord {
    pub id: Uuid,
    pub owner_id: Option<String>,
    pub task: String,
    pub creation_date: DateTime<Utc>,
    pub due_date: Option<NaiveDate>,
    pub completed: bool,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub owner_id: Option<String>,
    pub task: String,
    pub creation_date: DateTime<Utc>,
    pub due_date: Option<NaiveDate>,
}

/// Fields to overwrite on an existing task. `None` leaves a field alone;
/// `due_date: Some(None)` clears the due date.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub task: Option<String>,
    pub creation_date: Option<DateTime<Utc>>,
    pub due_date: Option<Option<NaiveDate>>,
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub fn apply(&self, record: &mut TaskRecord) {
        if let Some(task) = &self.task {
            record.task = task.clone();
        }
        if let Some(creation_date) = self.creation_date {
            record.creation_date = creation_date;
        }
        if let Some(due_date) = self.due_date {
            record.due_date = due_date;
        }
        if let Some(completed) = self.completed {
            record.completed = completed;
        }
    }
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct GithubUser {
    pub github_id: String,
    pub username: String,
    pub display_name: String,
    pub avatar: String,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Session {
    pub id: Uuid,
    pub github_id: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

pub type Result<T> = std::result::Result<T, StoreError>;

// TRAITS

/// Persistence for tasks. Every call is scoped by `owner`: a task is only
/// visible to the owner it was created with (`None` in open mode).
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// All of the owner's tasks, oldest first
    async fn list(&self, owner: Option<&str>) -> Result<Vec<TaskRecord>>;

    async fn insert(&self, task: NewTask) -> Result<TaskRecord>;

    /// Returns `false` when no task with that id belongs to the owner
    async fn update(&self, owner: Option<&str>, id: Uuid, patch: TaskPatch) -> Result<bool>;

    /// Returns `false` when no task with that id belongs to the owner
    async fn delete(&self, owner: Option<&str>, id: Uuid) -> Result<bool>;
}

/// Users and login sessions for the GitHub sign-in flow
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert on first login, refresh profile fields afterwards
    async fn upsert_user(&self, user: GithubUser) -> Result<GithubUser>;

    async fn create_session(&self, session: Session) -> Result<()>;

    /// Live session by id; expired sessions are treated as missing
    async fn find_session(&self, id: Uuid, now: DateTime<Utc>) -> Result<Option<Session>>;

    async fn delete_session(&self, id: Uuid) -> Result<()>;
}
