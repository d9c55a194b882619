use crate::chart::DEFAULT_CHART_HEIGHT;
use std::{env, path::PathBuf};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_GRAPHQL_URL: &str = "https://api.github.com/graphql";
pub const DEFAULT_WINDOW_DAYS: i64 = 370;
const MAX_WINDOW_DAYS: i64 = 3660;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub github_token: Option<String>,
    pub graphql_url: String,
    pub window_days: i64,
    pub chart_height: f64,
    pub fixture_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            github_token: None,
            graphql_url: DEFAULT_GRAPHQL_URL.to_string(),
            window_days: DEFAULT_WINDOW_DAYS,
            chart_height: DEFAULT_CHART_HEIGHT,
            fixture_path: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Unset, blank or unparseable values fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        Self {
            port: get("PORT")
                .and_then(|value| value.parse::<u16>().ok())
                .unwrap_or(defaults.port),
            github_token: get("GITHUB_TOKEN"),
            graphql_url: get("GITHUB_GRAPHQL_URL").unwrap_or(defaults.graphql_url),
            window_days: get("GRASS_WINDOW_DAYS")
                .and_then(|value| value.parse::<i64>().ok())
                .filter(|days| (1..=MAX_WINDOW_DAYS).contains(days))
                .unwrap_or(defaults.window_days),
            chart_height: get("GRASS_CHART_HEIGHT")
                .and_then(|value| value.parse::<f64>().ok())
                .filter(|height| height.is_finite() && *height > 0.0)
                .unwrap_or(defaults.chart_height),
            fixture_path: get("GRASS_FIXTURE_PATH").map(PathBuf::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = config_from(&[]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.github_token, None);
        assert_eq!(config.graphql_url, DEFAULT_GRAPHQL_URL);
        assert_eq!(config.window_days, 370);
        assert_eq!(config.chart_height, 180.0);
        assert!(config.fixture_path.is_none());
    }

    #[test]
    fn reads_overrides_and_ignores_garbage() {
        let config = config_from(&[
            ("PORT", "9000"),
            ("GITHUB_TOKEN", "  "),
            ("GRASS_WINDOW_DAYS", "-3"),
            ("GRASS_CHART_HEIGHT", "240"),
            ("GRASS_FIXTURE_PATH", "fixtures/users.json"),
        ]);
        assert_eq!(config.port, 9000);
        assert_eq!(config.github_token, None);
        assert_eq!(config.window_days, 370);
        assert_eq!(config.chart_height, 240.0);
        assert_eq!(config.fixture_path, Some(PathBuf::from("fixtures/users.json")));
    }
}
