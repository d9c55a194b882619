//! Immutable per-query view state.
//!
//! A [`Snapshot`] bundles a calendar with everything derived from it and is
//! never patched after it is built. [`SnapshotStore`] keeps the latest
//! snapshot per query key and tracks the current key of each client session,
//! so that a slow response for an older key cannot overwrite the state of a
//! newer one in the same session.

use crate::colors::coerce_count;
use crate::errors::ProviderError;
use crate::growth::{growth_series, trim_recent, weekly_totals};
use crate::models::{Calendar, GrowthPoint, MonthLabel, WeeklyTotal};
use crate::months::{month_boundaries, month_labels};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

const MAX_SESSIONS: usize = 1024;
const MAX_SNAPSHOTS: usize = 128;

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub query_key: String,
    pub total: u64,
    pub calendar: Calendar,
    pub month_labels: Vec<MonthLabel>,
    pub month_boundaries: Vec<usize>,
    pub weekly_totals: Vec<WeeklyTotal>,
    pub growth: Vec<GrowthPoint>,
}

impl Snapshot {
    pub fn build(query_key: impl Into<String>, payload: &Value) -> Self {
        let calendar = Calendar::from_payload(payload);
        let month_labels = month_labels(&calendar);
        let month_boundaries = month_boundaries(&month_labels);
        let weekly_totals = weekly_totals(&calendar);
        let growth = growth_series(trim_recent(&weekly_totals));
        let total = payload.get("total").map(coerce_count).unwrap_or(0);

        Self {
            query_key: query_key.into(),
            total,
            calendar,
            month_labels,
            month_boundaries,
            weekly_totals,
            growth,
        }
    }

    pub fn placeholder(query_key: impl Into<String>) -> Self {
        Self::build(query_key, &Value::Null)
    }
}

#[derive(Debug)]
pub struct QueryTicket {
    session: Option<String>,
    key: String,
}

impl QueryTicket {
    pub fn key(&self) -> &str {
        &self.key
    }
}

#[derive(Debug)]
pub enum QueryOutcome {
    /// The response belongs to the session's current query and is now the
    /// latest state for its key.
    Fresh(Arc<Snapshot>),
    /// The session moved on to a newer query while this one was in flight;
    /// nothing was stored.
    Superseded(Arc<Snapshot>),
    /// The provider failed; `fallback` is what should stay on screen.
    Failed {
        error: ProviderError,
        fallback: Arc<Snapshot>,
    },
}

impl QueryOutcome {
    pub fn snapshot(&self) -> &Arc<Snapshot> {
        match self {
            Self::Fresh(snapshot) | Self::Superseded(snapshot) => snapshot,
            Self::Failed { fallback, .. } => fallback,
        }
    }
}

/// String-keyed map that forgets its oldest insertions past `capacity`.
struct BoundedMap<V> {
    capacity: usize,
    entries: HashMap<String, V>,
    order: VecDeque<String>,
}

impl<V> BoundedMap<V> {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    fn insert(&mut self, key: &str, value: V) {
        if self.entries.insert(key.to_string(), value).is_none() {
            self.order.push_back(key.to_string());
        }
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }
}

struct StoreState {
    current: BoundedMap<String>,
    snapshots: BoundedMap<Arc<Snapshot>>,
}

pub struct SnapshotStore {
    state: Mutex<StoreState>,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::with_capacity(MAX_SESSIONS, MAX_SNAPSHOTS)
    }
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_capacity(sessions: usize, snapshots: usize) -> Self {
        Self {
            state: Mutex::new(StoreState {
                current: BoundedMap::new(sessions),
                snapshots: BoundedMap::new(snapshots),
            }),
        }
    }

    /// Marks `key` as the current query of `session`. Queries without a
    /// session are never superseded.
    pub async fn begin(&self, session: Option<&str>, key: &str) -> QueryTicket {
        let session = session.map(str::trim).filter(|id| !id.is_empty());
        if let Some(id) = session {
            self.state.lock().await.current.insert(id, key.to_string());
        }
        QueryTicket {
            session: session.map(str::to_string),
            key: key.to_string(),
        }
    }

    pub async fn complete(
        &self,
        ticket: QueryTicket,
        result: Result<Value, ProviderError>,
    ) -> QueryOutcome {
        let built = result.map(|payload| Arc::new(Snapshot::build(ticket.key.as_str(), &payload)));

        let mut state = self.state.lock().await;
        match built {
            Ok(snapshot) => {
                let current = ticket
                    .session
                    .as_deref()
                    .and_then(|id| state.current.get(id))
                    .cloned();
                match current {
                    Some(current) if current != ticket.key => {
                        debug!(
                            "discarding stale response for {:?}, session moved on to {current:?}",
                            ticket.key
                        );
                        QueryOutcome::Superseded(snapshot)
                    }
                    _ => {
                        state.snapshots.insert(&ticket.key, Arc::clone(&snapshot));
                        QueryOutcome::Fresh(snapshot)
                    }
                }
            }
            Err(error) => {
                warn!("query for {:?} failed: {error}", ticket.key);
                let stored = state.snapshots.get(&ticket.key).map(Arc::clone);
                let fallback = match stored {
                    Some(latest) => latest,
                    None => {
                        let placeholder = Arc::new(Snapshot::placeholder(ticket.key.as_str()));
                        state.snapshots.insert(&ticket.key, Arc::clone(&placeholder));
                        placeholder
                    }
                };
                QueryOutcome::Failed { error, fallback }
            }
        }
    }

    /// The latest snapshot stored for `key`, including failure fallbacks.
    pub async fn latest_for(&self, key: &str) -> Option<Arc<Snapshot>> {
        self.state.lock().await.snapshots.get(key).map(Arc::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(total: u64) -> Value {
        json!({
            "total": total,
            "contributions": [[{ "date": "2024-06-02", "count": total }]]
        })
    }

    fn failure() -> ProviderError {
        ProviderError::Status {
            status: 502,
            body: "upstream down".to_string(),
        }
    }

    #[test]
    fn end_to_end_derivations() {
        let mut first_week: Vec<Value> = (0..6)
            .map(|_| json!({ "date": "2024-01-01", "count": 0 }))
            .collect();
        first_week.push(json!({ "date": "2024-01-07", "count": 2 }));
        let second_week: Vec<Value> = (0..7)
            .map(|day| {
                let count = if day == 3 { 5 } else { 0 };
                json!({ "date": format!("2024-02-{:02}", day + 4), "count": count })
            })
            .collect();
        let payload = json!({ "total": 3, "contributions": [first_week, second_week] });

        let snapshot = Snapshot::build("octocat", &payload);
        assert_eq!(snapshot.total, 3);

        let labels: Vec<_> = snapshot
            .month_labels
            .iter()
            .map(|label| (label.label.as_str(), label.week_index))
            .collect();
        assert_eq!(labels, vec![("Jan", 0), ("Feb", 1)]);
        assert_eq!(snapshot.month_boundaries, vec![1]);

        let totals: Vec<_> = snapshot.weekly_totals.iter().map(|week| week.total).collect();
        assert_eq!(totals, vec![2, 5]);
        assert_eq!(snapshot.growth[0].value, None);
        assert_eq!(snapshot.growth[1].value, Some(150.0));
        assert_eq!(snapshot.growth[1].label, "2024-02-10");
    }

    #[test]
    fn empty_result_is_a_placeholder_grid() {
        let snapshot = Snapshot::build("ghost", &json!({ "total": 0, "contributions": [] }));
        assert!(snapshot.calendar.is_placeholder());
        assert_eq!(snapshot.calendar.weeks().len(), 53);
        assert!(snapshot.month_labels.is_empty());
    }

    #[tokio::test]
    async fn stale_responses_are_discarded() {
        let store = SnapshotStore::new();
        let alice = store.begin(Some("tab-1"), "alice").await;
        let bob = store.begin(Some("tab-1"), "bob").await;

        let outcome = store.complete(alice, Ok(payload(4))).await;
        assert!(matches!(outcome, QueryOutcome::Superseded(_)));
        assert!(store.latest_for("alice").await.is_none());

        let outcome = store.complete(bob, Ok(payload(9))).await;
        assert!(matches!(outcome, QueryOutcome::Fresh(_)));
        let latest = store.latest_for("bob").await.unwrap();
        assert_eq!(latest.total, 9);
    }

    #[tokio::test]
    async fn sessions_do_not_supersede_each_other() {
        let store = SnapshotStore::new();
        let alice = store.begin(Some("tab-a"), "alice").await;
        let bob = store.begin(Some("tab-b"), "bob").await;
        let anonymous = store.begin(None, "carol").await;

        assert!(matches!(
            store.complete(alice, Ok(payload(4))).await,
            QueryOutcome::Fresh(_)
        ));
        assert!(matches!(
            store.complete(bob, Ok(payload(9))).await,
            QueryOutcome::Fresh(_)
        ));
        assert!(matches!(
            store.complete(anonymous, Ok(payload(1))).await,
            QueryOutcome::Fresh(_)
        ));
        assert_eq!(store.latest_for("alice").await.unwrap().total, 4);
        assert_eq!(store.latest_for("bob").await.unwrap().total, 9);
    }

    #[tokio::test]
    async fn failures_keep_last_known_snapshot() {
        let store = SnapshotStore::new();
        let ticket = store.begin(Some("tab-1"), "alice").await;
        let QueryOutcome::Fresh(stored) = store.complete(ticket, Ok(payload(4))).await else {
            panic!("expected fresh outcome");
        };

        let retry = store.begin(Some("tab-1"), "alice").await;
        let outcome = store.complete(retry, Err(failure())).await;
        match &outcome {
            QueryOutcome::Failed { fallback, .. } => assert!(Arc::ptr_eq(fallback, &stored)),
            other => panic!("unexpected outcome {other:?}"),
        }
        let latest = store.latest_for("alice").await.unwrap();
        assert!(Arc::ptr_eq(&latest, &stored));
    }

    #[tokio::test]
    async fn failures_for_new_keys_store_a_placeholder() {
        let store = SnapshotStore::new();
        let ticket = store.begin(Some("tab-1"), "alice").await;
        store.complete(ticket, Ok(payload(4))).await;

        let ticket = store.begin(Some("tab-1"), "carol").await;
        let outcome = store.complete(ticket, Err(failure())).await;
        let fallback = Arc::clone(outcome.snapshot());
        assert_eq!(fallback.query_key, "carol");
        assert!(fallback.calendar.is_placeholder());

        let stored = store.latest_for("carol").await.unwrap();
        assert!(Arc::ptr_eq(&stored, &fallback));
    }

    #[tokio::test]
    async fn oldest_snapshots_are_evicted() {
        let store = SnapshotStore::with_capacity(2, 2);
        for (key, total) in [("a", 1), ("b", 2), ("c", 3)] {
            let ticket = store.begin(None, key).await;
            store.complete(ticket, Ok(payload(total))).await;
        }
        assert!(store.latest_for("a").await.is_none());
        assert_eq!(store.latest_for("c").await.unwrap().total, 3);
    }
}
