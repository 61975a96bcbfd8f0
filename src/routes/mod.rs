use axum::{
    handler::HandlerWithoutStateExt,
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

mod auth;
mod health;
pub mod middleware_auth;
mod pages;
pub mod todos;

pub use health::health;

use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    let todo_router = Router::new()
        .route(
            "/",
            post(todos::routes::create)
                .get(todos::routes::list)
                .put(todos::routes::update_by_body)
                .delete(todos::routes::delete_by_body),
        )
        .route("/board", get(pages::board))
        .route(
            "/{id}",
            put(todos::routes::update).delete(todos::routes::delete),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middleware_auth::require_auth,
        ));

    let public = ServeDir::new(&state.config.public_dir).not_found_service(not_found.into_service());

    Router::new()
        .route("/", get(pages::index))
        .route("/login.html", get(pages::login))
        .route("/health", get(health))
        .route("/auth/github", get(auth::github_login))
        .route("/auth/github/callback", get(auth::github_callback))
        .route("/logout", post(auth::logout))
        .nest("/todos", todo_router)
        .fallback_service(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "404 Not Found")
}
