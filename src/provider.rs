//! Upstream contribution data.
//!
//! Providers resolve a username to a payload shaped
//! `{ "total": n, "contributions": [[{date, count, color?}; 7], ...] }`,
//! oldest week first. "Nothing to show" outcomes (no such user, no
//! credentials, empty calendar) resolve to the empty payload; only transport
//! and status failures are errors.

use crate::config::AppConfig;
use crate::errors::ProviderError;
use chrono::{Duration, SecondsFormat, Utc};
use serde_json::{Value, json};
use std::{collections::HashMap, future::Future, path::Path, pin::Pin};
use tracing::{debug, info, warn};

const USER_AGENT: &str = concat!("contribution_grass/", env!("CARGO_PKG_VERSION"));
const GITHUB_API_VERSION: &str = "2022-11-28";
const REQUEST_TIMEOUT_SECS: u64 = 15;

const CONTRIBUTIONS_QUERY: &str = r#"
query($login: String!, $from: DateTime!, $to: DateTime!) {
  user(login: $login) {
    contributionsCollection(from: $from, to: $to) {
      contributionCalendar {
        totalContributions
        weeks {
          contributionDays {
            date
            contributionCount
            color
          }
        }
      }
    }
  }
}
"#;

pub type ProviderFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, ProviderError>> + Send + 'a>>;

pub trait ContributionProvider: Send + Sync {
    fn fetch<'a>(&'a self, username: &'a str) -> ProviderFuture<'a>;
}

pub fn empty_payload() -> Value {
    json!({ "total": 0, "contributions": [] })
}

/// Trims the username and short-circuits blank input without touching the
/// provider.
pub async fn fetch_contributions(
    provider: &dyn ContributionProvider,
    username: &str,
) -> Result<Value, ProviderError> {
    let username = username.trim();
    if username.is_empty() {
        debug!("blank username, skipping provider call");
        return Ok(empty_payload());
    }
    provider.fetch(username).await
}

pub struct GitHubProvider {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
    window_days: i64,
}

impl GitHubProvider {
    pub fn new(config: &AppConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.graphql_url.clone(),
            token: config.github_token.clone(),
            window_days: config.window_days,
        })
    }

    async fn query(&self, username: &str) -> Result<Value, ProviderError> {
        let Some(token) = self.token.as_deref() else {
            warn!("GITHUB_TOKEN is not set, returning an empty calendar for {username}");
            return Ok(empty_payload());
        };

        let to = Utc::now();
        let from = to - Duration::days(self.window_days);
        let body = json!({
            "query": CONTRIBUTIONS_QUERY,
            "variables": {
                "login": username,
                "from": from.to_rfc3339_opts(SecondsFormat::Millis, true),
                "to": to.to_rfc3339_opts(SecondsFormat::Millis, true),
            }
        });

        info!("fetching contributions for {username}");
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let document: Value = response
            .json()
            .await
            .map_err(|err| ProviderError::Decode(err.to_string()))?;
        Ok(payload_from_graphql(&document))
    }
}

impl ContributionProvider for GitHubProvider {
    fn fetch<'a>(&'a self, username: &'a str) -> ProviderFuture<'a> {
        Box::pin(self.query(username))
    }
}

/// Flattens a GraphQL contribution calendar into the provider payload shape.
pub fn payload_from_graphql(document: &Value) -> Value {
    if user_not_found(document) {
        return empty_payload();
    }
    let Some(calendar) = document
        .pointer("/data/user/contributionsCollection/contributionCalendar")
        .filter(|calendar| calendar.is_object())
    else {
        return empty_payload();
    };

    let contributions: Vec<Value> = calendar
        .get("weeks")
        .and_then(Value::as_array)
        .map(|weeks| {
            weeks
                .iter()
                .map(|week| {
                    let days = week
                        .get("contributionDays")
                        .and_then(Value::as_array)
                        .map(|days| {
                            days.iter()
                                .map(|day| {
                                    json!({
                                        "date": day.get("date"),
                                        "count": day.get("contributionCount"),
                                        "color": day.get("color"),
                                    })
                                })
                                .collect()
                        })
                        .unwrap_or_default();
                    Value::Array(days)
                })
                .collect()
        })
        .unwrap_or_default();

    json!({
        "total": calendar.get("totalContributions").and_then(Value::as_u64).unwrap_or(0),
        "contributions": contributions,
    })
}

fn user_not_found(document: &Value) -> bool {
    let Some(errors) = document.get("errors").and_then(Value::as_array) else {
        return false;
    };
    errors.iter().any(|error| {
        error.get("type").and_then(Value::as_str) == Some("NOT_FOUND")
            || error
                .get("message")
                .and_then(Value::as_str)
                .is_some_and(|message| message.contains("Could not resolve to a User"))
            || error
                .get("path")
                .and_then(Value::as_array)
                .is_some_and(|path| path.iter().any(|segment| segment == "user"))
    })
}

/// Serves canned payloads keyed by username; unknown users get the empty
/// payload.
pub struct FixtureProvider {
    payloads: HashMap<String, Value>,
}

impl FixtureProvider {
    pub fn new(payloads: HashMap<String, Value>) -> Self {
        Self { payloads }
    }

    pub async fn load(path: &Path) -> Result<Self, std::io::Error> {
        let bytes = tokio::fs::read(path).await?;
        let payloads: HashMap<String, Value> = serde_json::from_slice(&bytes)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
        info!("loaded {} fixture users from {}", payloads.len(), path.display());
        Ok(Self::new(payloads))
    }

    fn lookup(&self, username: &str) -> Value {
        self.payloads
            .get(username)
            .or_else(|| {
                self.payloads
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(username))
                    .map(|(_, payload)| payload)
            })
            .cloned()
            .unwrap_or_else(empty_payload)
    }
}

impl ContributionProvider for FixtureProvider {
    fn fetch<'a>(&'a self, username: &'a str) -> ProviderFuture<'a> {
        Box::pin(async move { Ok(self.lookup(username)) })
    }
}
