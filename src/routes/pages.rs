use askama::Template;
use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Html,
};
use serde::Deserialize;

use super::middleware_auth::{current_session, Caller};
use super::todos::routes::fetch_all;
use crate::error::AppError;
use crate::presentation::Board;
use crate::state::AppState;

#[derive(Deserialize, Default)]
pub struct LoginParams {
    error: Option<String>,
    loggedout: Option<String>,
}

#[derive(Template, Debug)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub notice: Option<&'static str>,
}

impl LoginTemplate {
    fn new(params: &LoginParams) -> Self {
        let notice = if params.error.is_some() {
            Some("Sign-in with GitHub failed, please try again.")
        } else if params.loggedout.is_some() {
            Some("You have been signed out.")
        } else {
            None
        };

        Self { notice }
    }
}

/// Full page; `board` is the already rendered fragment
#[derive(Template, Debug)]
#[template(path = "index.html")]
pub struct IndexTemplate<'a> {
    pub signed_in_as: Option<&'a str>,
    pub board: String,
}

async fn board_for(state: &AppState, caller: &Caller) -> Result<Board, AppError> {
    let tasks = fetch_all(state, caller, "Failed to fetch todos").await?;
    Ok(Board::new(tasks))
}

fn board_page(board: &Board, signed_in_as: Option<&str>) -> Result<Html<String>, AppError> {
    let template = IndexTemplate {
        signed_in_as,
        board: board.render()?,
    };
    template.render().map(Html).map_err(AppError::from)
}

/// Board for a signed-in caller (or anyone in open mode), login page otherwise
pub async fn index(State(state): State<AppState>, headers: HeaderMap) -> Result<Html<String>, AppError> {
    if !state.config.auth_enabled() {
        let board = board_for(&state, &Caller(None)).await?;
        return board_page(&board, None);
    }

    match current_session(&state, &headers).await? {
        Some(session) => {
            let board = board_for(&state, &Caller(Some(session.github_id))).await?;
            board_page(&board, Some(&session.username))
        }
        None => login(Query(LoginParams::default())).await,
    }
}

pub async fn login(Query(params): Query<LoginParams>) -> Result<Html<String>, AppError> {
    LoginTemplate::new(&params).render().map(Html).map_err(AppError::from)
}

/// Fragment the browser script swaps in after each change
pub async fn board(State(state): State<AppState>, caller: Caller) -> Result<Html<String>, AppError> {
    board_for(&state, &caller).await?.render().map(Html).map_err(AppError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_notices() {
        let failed = LoginTemplate::new(&LoginParams {
            error: Some("oauth".into()),
            loggedout: None,
        });
        assert!(failed.render().unwrap().contains("failed"));

        let out = LoginTemplate::new(&LoginParams {
            error: None,
            loggedout: Some("1".into()),
        })
        .render()
        .unwrap();
        assert!(out.contains("signed out"));
        assert!(out.contains(r#"href="/auth/github""#));

        let plain = LoginTemplate::new(&LoginParams::default()).render().unwrap();
        assert!(!plain.contains(r#"class="notice""#));
    }

    #[test]
    fn test_board_page_escapes_username() {
        let Html(html) = board_page(&Board::new(vec![]), Some("<evil>")).unwrap();
        assert!(html.contains("&lt;evil&gt;"));
        assert!(!html.contains("<evil>"));
        assert!(html.contains(r#"<div id="board-container"><section id="board""#));
        assert!(html.contains("/js/app.js"));
    }
}
