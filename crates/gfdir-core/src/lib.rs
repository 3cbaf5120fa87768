//! gfdir core - record pipeline for a small gluten-free restaurant directory
//!
//! Reconciles a bundled list of curated restaurants with submissions served by
//! a spreadsheet-backed endpoint, and publishes one consistent collection for
//! a rendering layer.
//!
//! # Architecture
//!
//! ```text
//! Baseline literal ─┐
//!                   ├→ Normalizer → merge_by_id → RestaurantStore → subscribers
//! Remote endpoint ──┘        (Loader::refresh drives one cycle)
//! ```
//!
//! # Guarantees
//!
//! - **Total normalization**: any JSON value normalizes to a valid record
//! - **Remote precedence**: on an id conflict the remote record wins
//! - **Never empty after seeding**: a failed fetch keeps the baseline
//! - **One notification per cycle**: subscribers hear once, after the final publish

pub mod baseline;
pub mod config;
pub mod error;
pub mod loader;
pub mod merge;
pub mod normalizer;
pub mod prefs;
pub mod present;
pub mod record;
pub mod source;
pub mod store;

pub use config::LoaderConfig;
pub use error::{Error, Result};
pub use loader::{Loader, RefreshOutcome, RefreshReport};
pub use merge::merge_by_id;
pub use normalizer::{infer_safety, normalize, normalize_tags};
pub use record::{Coordinates, GfSafety, Restaurant};
pub use source::{DisabledSource, HttpSource, RemoteSource, StaticSource};
pub use store::{Origin, RestaurantStore, Snapshot, SubscriptionId};
