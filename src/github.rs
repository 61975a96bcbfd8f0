//! Minimal GitHub OAuth client: builds the authorize URL, trades the
//! callback code for an access token and reads the signed-in user.

use reqwest::{header, Client};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::config::GithubConfig;
use crate::store::GithubUser;

const AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const USER_URL: &str = "https://api.github.com/user";
const SCOPE: &str = "read:user";

#[derive(Error, Debug)]
pub enum GithubError {
    #[error("request to GitHub failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid authorize URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("GitHub refused the code: {0}")]
    Denied(String),
}

#[derive(Clone)]
pub struct GithubClient {
    client: Client,
    config: GithubConfig,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Deserialize)]
struct Profile {
    id: u64,
    login: Option<String>,
    name: Option<String>,
    avatar_url: Option<String>,
}

impl GithubClient {
    pub fn new(config: GithubConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn authorize_url(&self, state: &str) -> Result<Url, GithubError> {
        let url = Url::parse_with_params(
            AUTHORIZE_URL,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.callback_url.as_str()),
                ("scope", SCOPE),
                ("state", state),
            ],
        )?;
        Ok(url)
    }

    pub async fn exchange_code(&self, code: &str) -> Result<String, GithubError> {
        let res: TokenResponse = self
            .client
            .post(TOKEN_URL)
            .header(header::ACCEPT, "application/json")
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.config.callback_url.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match res.access_token {
            Some(token) => Ok(token),
            None => Err(GithubError::Denied(
                res.error_description
                    .or(res.error)
                    .unwrap_or_else(|| "no access token".to_string()),
            )),
        }
    }

    pub async fn fetch_user(&self, access_token: &str) -> Result<GithubUser, GithubError> {
        let profile: Profile = self
            .client
            .get(USER_URL)
            .bearer_auth(access_token)
            .header(header::USER_AGENT, "taskboard")
            .header(header::ACCEPT, "application/vnd.github+json")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(GithubUser {
            github_id: profile.id.to_string(),
            username: profile.login.unwrap_or_default(),
            display_name: profile.name.unwrap_or_default(),
            avatar: profile.avatar_url.unwrap_or_default(),
        })
    }
}
