use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{AppError, StoreContext};
use crate::state::AppState;
use crate::store::Session;

pub const SESSION_COOKIE: &str = "sid";
pub const SESSION_DAYS: i64 = 7;

/// Identity of whoever is making the request. `None` in open mode, where
/// every task is unowned.
#[derive(Clone, Debug, PartialEq)]
pub struct Caller(pub Option<String>);

impl Caller {
    pub fn owner(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Caller>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    sid: String,
    exp: usize,
    iat: usize,
}

pub fn issue_token(session: &Session, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: session.github_id.clone(),
        sid: session.id.to_string(),
        exp: session.expires_at.timestamp() as usize,
        iat: session.created_at.timestamp() as usize,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
}

pub fn new_session(github_id: String, username: String) -> Session {
    let now = Utc::now();
    Session {
        id: Uuid::new_v4(),
        github_id,
        username,
        created_at: now,
        expires_at: now + Duration::days(SESSION_DAYS),
    }
}

pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
}

/// Session token from the `sid` cookie, or a bearer token for API clients
fn session_token(headers: &HeaderMap) -> Option<&str> {
    cookie_value(headers, SESSION_COOKIE).or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
    })
}

/// Decoded, unexpired token whose session still exists in the account store
pub async fn current_session(state: &AppState, headers: &HeaderMap) -> Result<Option<Session>, AppError> {
    let Some(token) = session_token(headers) else {
        return Ok(None);
    };

    let token_data = match decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.config.session_secret.as_bytes()),
        &Validation::default(),
    ) {
        Ok(data) => data,
        Err(e) => {
            debug!("session token rejected: {}", e);
            return Ok(None);
        }
    };

    let Ok(sid) = Uuid::parse_str(&token_data.claims.sid) else {
        return Ok(None);
    };

    let session = state
        .accounts
        .find_session(sid, Utc::now())
        .await
        .context("Failed to verify session")?;

    Ok(session.filter(|s| s.github_id == token_data.claims.sub))
}

/// Resolve the caller for the request, rejecting with 401 when sign-in is
/// enabled and there is no live session.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let caller = if state.config.auth_enabled() {
        match current_session(&state, req.headers()).await? {
            Some(session) => Caller(Some(session.github_id)),
            None => return Err(AppError::Unauthorized),
        }
    } else {
        Caller(None)
    };

    req.extensions_mut().insert(caller);
    Ok(next.run(req).await)
}
