//! Identity merge of baseline and remote collections
//!
//! Policy: entries-only-overwrite. A remote record whose `id` matches a
//! baseline record replaces it wholesale; fields are never combined.
//! Ordering follows the first insertion of each distinct id.

use indexmap::IndexMap;

use crate::record::Restaurant;

/// Merge `overrides` on top of `base`, keyed by `id`.
///
/// The result holds one entry per distinct id: baseline order first, then
/// ids introduced only by `overrides`, in their order. When an id repeats,
/// the last record wins but keeps the position of the first.
pub fn merge_by_id(base: Vec<Restaurant>, overrides: Vec<Restaurant>) -> Vec<Restaurant> {
    let mut by_id: IndexMap<String, Restaurant> =
        IndexMap::with_capacity(base.len() + overrides.len());

    for record in base.into_iter().chain(overrides) {
        if record.id.is_empty() {
            continue;
        }
        // IndexMap::insert keeps the original slot for an existing key
        by_id.insert(record.id.clone(), record);
    }

    by_id.into_values().collect()
}
