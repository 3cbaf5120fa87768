//! Presentation helpers for the rendering layer
//!
//! Pure lookups and formatting: tag and safety labels, badge colors,
//! great-circle distance, and accent-insensitive text matching.

use indexmap::IndexSet;

use crate::normalizer::strip_accents;
use crate::record::{Coordinates, GfSafety, Restaurant};

/// Mean Earth radius used for distances
pub const EARTH_RADIUS_KM: f64 = 6371.0;

const TAG_LABELS: &[(&str, &str)] = &[
    ("dedicated_gf", "Dédié GF"),
    ("brunch", "Brunch"),
    ("takeout", "Takeout"),
    ("pizza", "Pizza"),
    ("vegan", "Vegan"),
    ("wifi", "Wi-Fi"),
    ("happy_hour", "Happy hour"),
];

const SYNONYMS: &[(&str, &[&str])] = &[
    ("gf", &["sans gluten", "gluten free"]),
    ("gluten", &["sans gluten", "gluten free"]),
    ("pate", &["pates", "pasta"]),
    ("pates", &["pasta"]),
    ("italien", &["pizza", "pates"]),
    ("pizza", &["italien"]),
    ("dej", &["brunch", "dejeuner"]),
    ("brunch", &["dejeuner"]),
    ("centre", &["centre-ville", "centre ville"]),
    ("takeout", &["a emporter", "emporter"]),
];

// ── Labels ────────────────────────────────────────────────

/// Display label for a tag keyword; unknown tags are shown as-is
pub fn tag_label(tag: &str) -> &str {
    TAG_LABELS
        .iter()
        .find(|(key, _)| *key == tag)
        .map(|(_, label)| *label)
        .unwrap_or(tag)
}

pub fn safety_label(level: GfSafety) -> &'static str {
    match level {
        GfSafety::Dedicated => "Dédié sans gluten",
        GfSafety::Option => "Option sans gluten",
        GfSafety::Risk => "Risque contamination",
    }
}

/// Badge color (hex) for a safety level
pub fn safety_color(level: GfSafety) -> &'static str {
    match level {
        GfSafety::Dedicated => "#10b981",
        GfSafety::Option => "#f59e0b",
        GfSafety::Risk => "#ef4444",
    }
}

// ── Distance ──────────────────────────────────────────────

/// Great-circle distance in kilometres (haversine)
pub fn haversine_km(from: Coordinates, to: Coordinates) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lon = (to.lon - from.lon).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

/// Human distance: metres under 1 km, one decimal under 10 km, whole
/// kilometres beyond. Non-finite input formats as an empty string.
pub fn format_distance(km: f64) -> String {
    if !km.is_finite() {
        String::new()
    } else if km < 1.0 {
        format!("{} m", (km * 1000.0).round())
    } else if km < 10.0 {
        format!("{:.1} km", km)
    } else {
        format!("{:.0} km", km)
    }
}

/// Distance from a point to a restaurant, if the restaurant is placed
pub fn distance_to(from: Coordinates, restaurant: &Restaurant) -> Option<f64> {
    restaurant.position().map(|to| haversine_km(from, to))
}

// ── Text matching ─────────────────────────────────────────

/// Lowercase, strip accents, collapse whitespace runs, trim
pub fn fold_text(text: &str) -> String {
    strip_accents(&text.to_lowercase())
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Folded query words plus their synonyms, deduplicated, words first
pub fn expand_query(query: &str) -> Vec<String> {
    let folded = fold_text(query);
    let mut expanded: IndexSet<String> = folded
        .split(' ')
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect();
    for word in folded.split(' ') {
        for synonym in synonyms(word) {
            expanded.insert(fold_text(synonym));
        }
    }
    expanded.into_iter().collect()
}

/// Whether every query word (or one of its synonyms) appears in the
/// restaurant's searchable text. An empty query matches everything.
pub fn matches_query(restaurant: &Restaurant, query: &str) -> bool {
    let haystack = fold_text(&searchable_text(restaurant));
    let folded = fold_text(query);
    folded
        .split(' ')
        .filter(|w| !w.is_empty())
        .all(|word| {
            haystack.contains(word)
                || synonyms(word)
                    .iter()
                    .any(|s| haystack.contains(&fold_text(s)))
        })
}

fn synonyms(word: &str) -> &'static [&'static str] {
    SYNONYMS
        .iter()
        .find(|(key, _)| *key == word)
        .map(|(_, list)| *list)
        .unwrap_or(&[])
}

fn searchable_text(r: &Restaurant) -> String {
    let raw_tags = r.tags.join(" ");
    let tag_labels = r
        .tags
        .iter()
        .map(|t| tag_label(t))
        .collect::<Vec<_>>()
        .join(" ");
    [
        r.name.as_str(),
        r.city.as_str(),
        r.neighborhood.as_str(),
        r.address.as_str(),
        r.note.as_str(),
        raw_tags.as_str(),
        tag_labels.as_str(),
        safety_label(r.gf_safety),
    ]
    .join(" ")
}
