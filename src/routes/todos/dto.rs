use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Keeps an explicit `null` distinct from a missing field
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[derive(Deserialize, Default)]
pub struct CreateTodo {
    #[serde(default)]
    pub task: Option<Value>,
    #[serde(default)]
    pub due_date: Option<Value>,
    #[serde(default)]
    pub creation_date: Option<Value>,
}

#[derive(Deserialize, Default)]
pub struct UpdateTodo {
    /// Only read by the body-addressed `PUT /todos` form
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub task: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub due_date: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub creation_date: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub completed: Option<Value>,
}

#[derive(Deserialize, Default)]
pub struct DeleteTodo {
    #[serde(default)]
    pub id: Option<Value>,
}
