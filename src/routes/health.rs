use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthData {
    status: u16,
    storage: &'static str,
    auth: bool,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthData> {
    let storage = if state.config.database_url.is_some() {
        "postgres"
    } else {
        "memory"
    };

    Json(HealthData {
        status: StatusCode::OK.as_u16(),
        storage,
        auth: state.config.auth_enabled(),
    })
}
