use dotenvy::dotenv;
use std::{env, fmt::Display, str::FromStr};
use tracing::{info, warn};

#[derive(Clone, Debug)]
pub struct GithubConfig {
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub base_url: String,
    /// Absent means tasks live in process memory only
    pub database_url: Option<String>,
    pub session_secret: String,
    /// Absent means auth is off and every caller shares one task list
    pub github: Option<GithubConfig>,
    pub public_dir: String,
    pub production: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let _ = dotenv().is_ok();

        let host: String = try_load("HOST", "127.0.0.1");
        let port: u16 = try_load("PORT", "3000");
        let base_url = optional("BASE_URL").unwrap_or_else(|| format!("http://localhost:{}", port));
        let production = optional("APP_ENV").is_some_and(|v| v == "production");

        let github = match (optional("GITHUB_CLIENT_ID"), optional("GITHUB_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(GithubConfig {
                client_id,
                client_secret,
                callback_url: optional("GITHUB_CALLBACK_URL")
                    .unwrap_or_else(|| format!("{}/auth/github/callback", base_url)),
            }),
            _ => {
                info!("GitHub credentials not set, running without sign-in");
                None
            }
        };

        let session_secret = match optional("SESSION_SECRET") {
            Some(secret) => secret,
            None if github.is_some() => panic!("SESSION_SECRET missing, it is required with GitHub sign-in"),
            None => String::new(),
        };

        Self {
            host,
            port,
            base_url,
            database_url: optional("DATABASE_URL"),
            session_secret,
            github,
            public_dir: try_load("PUBLIC_DIR", "public"),
            production,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn auth_enabled(&self) -> bool {
        self.github.is_some()
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    optional(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

#[cfg(test)]
impl Config {
    pub fn for_tests(github: Option<GithubConfig>) -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            base_url: "http://localhost:3000".into(),
            database_url: None,
            session_secret: "test-secret".into(),
            github,
            public_dir: "public".into(),
            production: false,
        }
    }
}
