//! Refresh cycle - seed, fetch, merge, publish
//!
//! One call to [`Loader::refresh`] runs a full cycle:
//!
//! ```text
//! baseline → normalize → seed (provisional, silent)
//!                           ↓
//!                  fetch remote (bounded by timeout)
//!                           ↓
//!   array     → drop unidentified → normalize → merge_by_id → publish(Merged)
//!   non-array → publish(Baseline)
//!   error     → publish(Baseline)
//! ```
//!
//! Publishing notifies subscribers exactly once per cycle. Failures never
//! escape a cycle; they are logged and returned in the [`RefreshReport`].
//!
//! Cycles on the same loader are serialized: a second `refresh` waits for the
//! first to publish before seeding, so the last cycle started is also the
//! last one to publish.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::baseline::baseline_records;
use crate::config::LoaderConfig;
use crate::merge::merge_by_id;
use crate::normalizer::{has_identity, normalize, normalize_all};
use crate::record::Restaurant;
use crate::source::RemoteSource;
use crate::store::{Origin, RestaurantStore, Snapshot};
use crate::{Error, Result};

/// How the remote half of a cycle went
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// Remote list fetched and merged over the baseline
    Merged {
        /// Remote records kept after the identity filter
        remote: usize,
        /// Remote records dropped for lacking both `id` and `name`
        discarded: usize,
    },
    /// Remote answered with JSON that is not a list; treated as empty
    MalformedPayload,
    /// Remote unreachable, non-success status, bad JSON or timeout
    Failed(Error),
}

/// Result of one refresh cycle
#[derive(Debug, Clone)]
pub struct RefreshReport {
    pub cycle: u64,
    pub outcome: RefreshOutcome,
    /// The snapshot published at the end of the cycle
    pub snapshot: Arc<Snapshot>,
}

/// Drives refresh cycles against a remote source and a store
pub struct Loader<S> {
    source: S,
    store: Arc<RestaurantStore>,
    config: LoaderConfig,
    baseline: Vec<Value>,
    gate: Mutex<()>,
    cycles: AtomicU64,
}

impl<S: RemoteSource> Loader<S> {
    /// Create a loader using the bundled baseline list
    pub fn new(source: S, store: Arc<RestaurantStore>, config: LoaderConfig) -> Self {
        Loader {
            source,
            store,
            config,
            baseline: baseline_records(),
            gate: Mutex::new(()),
            cycles: AtomicU64::new(0),
        }
    }

    /// Replace the baseline records
    pub fn with_baseline(mut self, records: Vec<Value>) -> Self {
        self.baseline = records;
        self
    }

    /// The store this loader publishes to
    pub fn store(&self) -> &Arc<RestaurantStore> {
        &self.store
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Run one refresh cycle. Never fails; see [`RefreshOutcome`].
    pub async fn refresh(&self) -> RefreshReport {
        let _cycle_guard = self.gate.lock().await;
        let cycle = self.cycles.fetch_add(1, Ordering::SeqCst) + 1;

        let baseline = normalize_all(&self.baseline);
        self.store.seed(baseline.clone(), cycle);
        debug!(cycle, count = baseline.len(), "seeded baseline");

        let (restaurants, origin, outcome) = match self.fetch_raw(&self.config.status).await {
            Ok(Value::Array(items)) => {
                let (remote, discarded) = accept_remote(&items);
                if discarded > 0 {
                    debug!(cycle, discarded, "dropped remote records without id or name");
                }
                let outcome = RefreshOutcome::Merged {
                    remote: remote.len(),
                    discarded,
                };
                (merge_by_id(baseline, remote), Origin::Merged, outcome)
            }
            Ok(other) => {
                warn!(
                    cycle,
                    kind = json_kind(&other),
                    "remote payload is not a list; keeping baseline"
                );
                (baseline, Origin::Baseline, RefreshOutcome::MalformedPayload)
            }
            Err(err) => {
                warn!(cycle, error = %err, "remote fetch failed; keeping baseline");
                (baseline, Origin::Baseline, RefreshOutcome::Failed(err))
            }
        };

        let snapshot = self.store.publish(restaurants, origin, cycle);
        info!(
            cycle,
            count = snapshot.len(),
            origin = ?snapshot.origin,
            "published restaurants"
        );

        RefreshReport {
            cycle,
            outcome,
            snapshot,
        }
    }

    /// Fetch and normalize one status partition without merging or
    /// publishing. Records lacking both `id` and `name` are dropped; a
    /// non-list payload yields an empty list.
    pub async fn fetch_restaurants(&self, status: &str) -> Result<Vec<Restaurant>> {
        match self.fetch_raw(status).await? {
            Value::Array(items) => Ok(accept_remote(&items).0),
            _ => Ok(Vec::new()),
        }
    }

    async fn fetch_raw(&self, status: &str) -> Result<Value> {
        tokio::time::timeout(self.config.timeout, self.source.fetch(status))
            .await
            .map_err(|_| Error::Timeout(self.config.timeout))?
    }
}

/// Normalize identified remote records; returns them with the discard count
fn accept_remote(items: &[Value]) -> (Vec<Restaurant>, usize) {
    let (kept, dropped): (Vec<&Value>, Vec<&Value>) =
        items.iter().partition(|raw| has_identity(raw));
    (kept.into_iter().map(normalize).collect(), dropped.len())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
