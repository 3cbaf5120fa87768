//! Published collection store
//!
//! Holds the current best-known restaurant collection as an immutable
//! [`Snapshot`] and notifies subscribers when a refresh cycle publishes its
//! final result. A new snapshot always replaces the previous one entirely.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use sha2::{Digest, Sha256};

use crate::record::Restaurant;

/// Where the published collection came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Nothing seeded yet
    Empty,
    /// Bundled baseline only (seed, or remote unavailable)
    Baseline,
    /// Baseline merged with the remote list
    Merged,
}

/// An immutable published collection
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Snapshot {
    pub restaurants: Vec<Restaurant>,
    pub origin: Origin,
    /// SHA-256 of the collection's JSON form, for cheap change detection
    pub fingerprint: String,
    /// Refresh cycle that produced this snapshot (0 before any cycle)
    pub cycle: u64,
}

impl Snapshot {
    fn new(restaurants: Vec<Restaurant>, origin: Origin, cycle: u64) -> Self {
        let fingerprint = fingerprint(&restaurants);
        Snapshot {
            restaurants,
            origin,
            fingerprint,
            cycle,
        }
    }

    fn empty() -> Self {
        Snapshot::new(Vec::new(), Origin::Empty, 0)
    }

    /// Number of restaurants in the collection
    pub fn len(&self) -> usize {
        self.restaurants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.restaurants.is_empty()
    }

    /// Look up a restaurant by id
    pub fn get(&self, id: &str) -> Option<&Restaurant> {
        self.restaurants.iter().find(|r| r.id == id)
    }

    /// Whether the collection content differs from another snapshot's
    pub fn differs_from(&self, other: &Snapshot) -> bool {
        self.fingerprint != other.fingerprint
    }
}

/// Compute the SHA-256 fingerprint of a collection
pub fn fingerprint(restaurants: &[Restaurant]) -> String {
    // Serialization of plain data structs cannot fail
    let bytes = serde_json::to_vec(restaurants).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    format!("{:x}", hasher.finalize())
}

/// Handle returned by [`RestaurantStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Arc<dyn Fn(&Snapshot) + Send + Sync>;

/// Owned store for the published collection.
///
/// Readers get an `Arc<Snapshot>` and are never blocked by a publish for
/// longer than a pointer swap. Subscribers are called synchronously, outside
/// of any lock, after the new snapshot is in place.
pub struct RestaurantStore {
    current: RwLock<Arc<Snapshot>>,
    subscribers: Mutex<Vec<(SubscriptionId, Callback)>>,
    next_subscription: AtomicU64,
}

impl Default for RestaurantStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RestaurantStore {
    /// Create an empty store
    pub fn new() -> Self {
        RestaurantStore {
            current: RwLock::new(Arc::new(Snapshot::empty())),
            subscribers: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
        }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the collection with a provisional baseline result, without
    /// notifying subscribers
    pub fn seed(&self, restaurants: Vec<Restaurant>, cycle: u64) -> Arc<Snapshot> {
        self.replace(Snapshot::new(restaurants, Origin::Baseline, cycle))
    }

    /// Replace the collection with a cycle's final result and notify
    /// every subscriber once
    pub fn publish(
        &self,
        restaurants: Vec<Restaurant>,
        origin: Origin,
        cycle: u64,
    ) -> Arc<Snapshot> {
        let snapshot = self.replace(Snapshot::new(restaurants, origin, cycle));

        let callbacks: Vec<Callback> = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();
        for callback in callbacks {
            callback(&snapshot);
        }

        snapshot
    }

    /// Register a readiness callback, invoked with each published snapshot
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(callback)));
        id
    }

    /// Remove a callback; returns whether it was registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        subscribers.len() != before
    }

    fn replace(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&snapshot);
        snapshot
    }
}
