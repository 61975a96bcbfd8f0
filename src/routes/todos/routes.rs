use axum::{
    body::Bytes,
    extract::{FromRequest, Path, Request, State},
    http::{header::CONTENT_TYPE, HeaderMap},
    Json,
};
use chrono::Utc;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::dto::{CreateTodo, DeleteTodo, UpdateTodo};
use super::model::TaskView;
use super::normalize;
use crate::due_date::today;
use crate::error::{AppError, StoreContext};
use crate::routes::middleware_auth::Caller;
use crate::state::AppState;

type TodoList = Result<Json<Vec<TaskView>>, AppError>;

/// JSON request body where a missing or empty body, or one not sent as JSON,
/// reads as `{}`
pub struct JsonBody<T>(pub T);

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let json = is_json(req.headers());
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| AppError::validation(rejection.body_text()))?;

        if !json || bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }

        serde_json::from_slice(&bytes)
            .map(Self)
            .map_err(|e| AppError::validation(format!("Failed to parse the request body as JSON: {}", e)))
    }
}

/// Every operation answers with the caller's whole list, derived fields attached
pub async fn fetch_all(state: &AppState, caller: &Caller, context: &'static str) -> Result<Vec<TaskView>, AppError> {
    let records = state.tasks.list(caller.owner()).await.context(context)?;
    let today = today();

    Ok(records
        .into_iter()
        .map(|r| normalize::to_view(r, today))
        .collect())
}

pub async fn list(State(state): State<AppState>, caller: Caller) -> TodoList {
    Ok(Json(fetch_all(&state, &caller, "Failed to fetch todos").await?))
}

pub async fn create(
    State(state): State<AppState>,
    caller: Caller,
    JsonBody(body): JsonBody<CreateTodo>,
) -> TodoList {
    const CONTEXT: &str = "Failed to add todo";

    let task = normalize::new_task(&body, caller.owner(), Utc::now())?;

    let record = state.tasks.insert(task).await.context(CONTEXT)?;
    tracing::debug!(id = %record.id, "todo created");

    Ok(Json(fetch_all(&state, &caller, CONTEXT).await?))
}

async fn apply_update(state: &AppState, caller: &Caller, id: Uuid, body: &UpdateTodo) -> TodoList {
    const CONTEXT: &str = "Failed to update todo";

    let patch = normalize::patch(body, Utc::now())?;
    let matched = state
        .tasks
        .update(caller.owner(), id, patch)
        .await
        .context(CONTEXT)?;

    if !matched {
        return Err(AppError::no_todo(id));
    }

    Ok(Json(fetch_all(state, caller, CONTEXT).await?))
}

pub async fn update(
    State(state): State<AppState>,
    caller: Caller,
    Path(raw_id): Path<String>,
    JsonBody(body): JsonBody<UpdateTodo>,
) -> TodoList {
    let id = normalize::parse_id(&raw_id)?;

    apply_update(&state, &caller, id, &body).await
}

/// `PUT /todos` with the id inside the body
pub async fn update_by_body(
    State(state): State<AppState>,
    caller: Caller,
    JsonBody(body): JsonBody<UpdateTodo>,
) -> TodoList {
    let id = normalize::body_id(body.id.as_ref())?;

    apply_update(&state, &caller, id, &body).await
}

async fn apply_delete(state: &AppState, caller: &Caller, id: Uuid) -> TodoList {
    const CONTEXT: &str = "Failed to delete todo";

    let deleted = state
        .tasks
        .delete(caller.owner(), id)
        .await
        .context(CONTEXT)?;

    if !deleted {
        return Err(AppError::no_todo(id));
    }
    tracing::debug!(%id, "todo deleted");

    Ok(Json(fetch_all(state, caller, CONTEXT).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    caller: Caller,
    Path(raw_id): Path<String>,
) -> TodoList {
    let id = normalize::parse_id(&raw_id)?;
    apply_delete(&state, &caller, id).await
}

/// `DELETE /todos` with `{id}` in the body
pub async fn delete_by_body(
    State(state): State<AppState>,
    caller: Caller,
    JsonBody(body): JsonBody<DeleteTodo>,
) -> TodoList {
    let id = normalize::body_id(body.id.as_ref())?;

    apply_delete(&state, &caller, id).await
}
