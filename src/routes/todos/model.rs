use chrono::DateTime;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// A task as the client sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskView {
    pub id: String,
    pub task: String,
    pub creation_date: DateTime<Utc>,
    pub due_date: Option<String>,
    pub completed: bool,
    pub days_until_due: Option<i64>,
}
