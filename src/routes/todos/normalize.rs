use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use uuid::Uuid;

use super::dto::{CreateTodo, UpdateTodo};
use super::model::TaskView;
use crate::due_date::{days_until_due, format_date, parse_creation_date, parse_due_date};
use crate::error::AppError;
use crate::store::{NewTask, TaskPatch, TaskRecord};

/// JavaScript-style truthiness, so `"completed": 1` and `"completed": "yes"`
/// both mark a task done
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Trimmed task text; blank text is rejected
pub fn task_text(value: Option<&Value>) -> Result<String, AppError> {
    let text = value.map(stringify).unwrap_or_default();
    let text = text.trim();

    if text.is_empty() {
        return Err(AppError::validation("Task is required"));
    }
    Ok(text.to_string())
}

pub fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::invalid_id())
}

/// Id carried in a request body by the legacy body-addressed routes
pub fn body_id(value: Option<&Value>) -> Result<Uuid, AppError> {
    match value {
        Some(Value::String(s)) => parse_id(s),
        _ => Err(AppError::invalid_id()),
    }
}

pub fn new_task(body: &CreateTodo, owner: Option<&str>, now: DateTime<Utc>) -> Result<NewTask, AppError> {
    let task = task_text(body.task.as_ref())?;

    Ok(NewTask {
        owner_id: owner.map(str::to_string),
        task,
        creation_date: parse_creation_date(body.creation_date.as_ref(), now),
        due_date: parse_due_date(body.due_date.as_ref()),
    })
}

pub fn patch(body: &UpdateTodo, now: DateTime<Utc>) -> Result<TaskPatch, AppError> {
    let task = match &body.task {
        Some(value) => Some(task_text(Some(value))?),
        None => None,
    };

    Ok(TaskPatch {
        task,
        creation_date: body
            .creation_date
            .as_ref()
            .map(|v| parse_creation_date(Some(v), now)),
        due_date: body.due_date.as_ref().map(|v| parse_due_date(Some(v))),
        completed: body.completed.as_ref().map(truthy),
    })
}

pub fn to_view(record: TaskRecord, today: NaiveDate) -> TaskView {
    TaskView {
        id: record.id.to_string(),
        task: record.task,
        creation_date: record.creation_date,
        due_date: record.due_date.map(format_date),
        completed: record.completed,
        days_until_due: days_until_due(record.due_date, today),
    }
}
