use std::sync::Arc;

use tracing::info;

use crate::config::Config;
use crate::github::GithubClient;
use crate::store::{AccountStore, MemoryStore, PgStore, StoreError, TaskStore};

#[derive(Clone)]
pub struct AppState {
    pub tasks: Arc<dyn TaskStore>,
    pub accounts: Arc<dyn AccountStore>,
    pub config: Arc<Config>,
    pub github: Option<GithubClient>,
}

impl AppState {
    pub async fn from_config(config: Config) -> Result<Self, StoreError> {
        match &config.database_url {
            Some(url) => {
                let store = Arc::new(PgStore::connect(url).await?);
                info!("Connected to Postgres");
                Ok(Self::with_store(config, store.clone(), store))
            }
            None => {
                info!("DATABASE_URL not set, tasks will be kept in memory");
                let store = Arc::new(MemoryStore::new());
                Ok(Self::with_store(config, store.clone(), store))
            }
        }
    }

    pub fn with_store(
        config: Config,
        tasks: Arc<dyn TaskStore>,
        accounts: Arc<dyn AccountStore>,
    ) -> Self {
        let github = config.github.clone().map(GithubClient::new);

        Self {
            tasks,
            accounts,
            config: Arc::new(config),
            github,
        }
    }
}
