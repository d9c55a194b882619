use crate::config::AppConfig;
use crate::provider::{ContributionProvider, FixtureProvider, GitHubProvider};
use crate::snapshot::SnapshotStore;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn ContributionProvider>,
    pub snapshots: Arc<SnapshotStore>,
    pub chart_height: f64,
}

impl AppState {
    pub fn new(provider: Arc<dyn ContributionProvider>, chart_height: f64) -> Self {
        Self {
            provider,
            snapshots: Arc::new(SnapshotStore::new()),
            chart_height,
        }
    }

    pub async fn from_config(config: &AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let provider: Arc<dyn ContributionProvider> = match &config.fixture_path {
            Some(path) => {
                info!("serving contributions from fixture {}", path.display());
                Arc::new(FixtureProvider::load(path).await?)
            }
            None => {
                info!("serving contributions from {}", config.graphql_url);
                Arc::new(GitHubProvider::new(config)?)
            }
        };
        Ok(Self::new(provider, config.chart_height))
    }
}
