use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use rand::Rng;
use serde::Deserialize;
use tracing::{info, warn};

use super::middleware_auth::{
    cookie_value, current_session, issue_token, new_session, SESSION_COOKIE, SESSION_DAYS,
};
use crate::github::GithubClient;
use crate::state::AppState;

const STATE_COOKIE: &str = "oauth_state";
const LOGIN_FAILED: &str = "/login.html?error=oauth";
const LOGGED_OUT: &str = "/login.html?loggedout=1";

#[derive(Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// Random token tying the GitHub callback to the browser that started it
fn generate_state() -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    const STATE_LENGTH: usize = 32;

    let mut rng = rand::thread_rng();
    (0..STATE_LENGTH)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

fn cookie(state: &AppState, name: &str, value: &str, max_age_secs: i64) -> String {
    let mut c = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        name, value, max_age_secs
    );
    if state.config.production {
        c.push_str("; Secure");
    }
    c
}

pub async fn github_login(State(state): State<AppState>) -> Response {
    let Some(github) = &state.github else {
        return Redirect::to("/").into_response();
    };

    let oauth_state = generate_state();
    let authorize = match github.authorize_url(&oauth_state) {
        Ok(url) => url,
        Err(err) => {
            warn!(error = %err, "could not build GitHub authorize URL");
            return Redirect::to(LOGIN_FAILED).into_response();
        }
    };
    let set_state = cookie(&state, STATE_COOKIE, &oauth_state, 10 * 60);

    (
        AppendHeaders([(header::SET_COOKIE, set_state)]),
        Redirect::to(authorize.as_str()),
    )
        .into_response()
}

async fn sign_in(state: &AppState, github: &GithubClient, code: &str) -> anyhow::Result<String> {
    let access_token = github.exchange_code(code).await?;
    let profile = github.fetch_user(&access_token).await?;
    let user = state.accounts.upsert_user(profile).await?;

    let session = new_session(user.github_id, user.username);
    state.accounts.create_session(session.clone()).await?;
    info!(github_id = %session.github_id, "signed in");

    Ok(issue_token(&session, &state.config.session_secret)?)
}

pub async fn github_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Response {
    let clear_state = cookie(&state, STATE_COOKIE, "", 0);
    let fail = |reason: &str| {
        warn!("GitHub sign-in failed: {}", reason);
        (
            AppendHeaders([(header::SET_COOKIE, clear_state.clone())]),
            Redirect::to(LOGIN_FAILED),
        )
            .into_response()
    };

    let Some(github) = &state.github else {
        return fail("sign-in is not configured");
    };

    let expected = cookie_value(&headers, STATE_COOKIE);
    if expected.is_none() || expected != params.state.as_deref() {
        return fail("state mismatch");
    }

    let Some(code) = params.code.as_deref() else {
        return fail("missing code");
    };

    match sign_in(&state, github, code).await {
        Ok(token) => {
            let set_session = cookie(&state, SESSION_COOKIE, &token, SESSION_DAYS * 24 * 60 * 60);
            (
                AppendHeaders([
                    (header::SET_COOKIE, clear_state.clone()),
                    (header::SET_COOKIE, set_session),
                ]),
                Redirect::to("/"),
            )
                .into_response()
        }
        Err(e) => fail(&e.to_string()),
    }
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match current_session(&state, &headers).await {
        Ok(Some(session)) => {
            if let Err(e) = state.accounts.delete_session(session.id).await {
                warn!("could not delete session {}: {}", session.id, e);
            }
        }
        Ok(None) => {}
        Err(e) => warn!("could not look up session on logout: {}", e),
    }

    (
        AppendHeaders([(header::SET_COOKIE, cookie(&state, SESSION_COOKIE, "", 0))]),
        Redirect::to(LOGGED_OUT),
    )
        .into_response()
}
