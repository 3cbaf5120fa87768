//! Canonical record types
//!
//! A [`Restaurant`] is the only shape the rest of the system sees. It is
//! produced by [`crate::normalizer::normalize`] from loosely-typed input and
//! serializes back to JSON with the same field names, so a serialized
//! restaurant is itself a valid raw record.

use std::fmt;

/// Gluten-free safety level of a restaurant
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum GfSafety {
    /// Fully dedicated gluten-free kitchen
    Dedicated,
    /// Gluten-free options available
    #[default]
    Option,
    /// Cross-contamination risk
    Risk,
}

impl GfSafety {
    /// All levels, in display order
    pub const ALL: [GfSafety; 3] = [GfSafety::Dedicated, GfSafety::Option, GfSafety::Risk];

    /// Parse an explicit level name (case-insensitive, surrounding whitespace ignored)
    pub fn from_text(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "dedicated" => Some(GfSafety::Dedicated),
            "option" => Some(GfSafety::Option),
            "risk" => Some(GfSafety::Risk),
            _ => None,
        }
    }

    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            GfSafety::Dedicated => "dedicated",
            GfSafety::Option => "option",
            GfSafety::Risk => "risk",
        }
    }
}

impl fmt::Display for GfSafety {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Canonical restaurant record
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    /// Stable identifier, never empty; the merge key
    pub id: String,
    pub name: String,
    pub city: String,
    pub neighborhood: String,
    pub address: String,
    /// `None` when absent, unparseable or non-finite
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub score: f64,
    pub score_label: String,
    /// Directly fetchable image URL (or a relative asset path)
    pub image: String,
    pub note: String,
    /// Trimmed, non-empty, deduplicated, first-seen order
    pub tags: Vec<String>,
    pub price: String,
    pub website: String,
    pub gmaps: String,
    pub gf_safety: GfSafety,
}

impl Restaurant {
    /// Map position of this restaurant, if it can be placed on a map.
    ///
    /// A record is kept in the collection even without a position; it is
    /// only suppressed from spatial views. Missing axes and the `(0, 0)`
    /// placeholder both count as "no position".
    pub fn position(&self) -> Option<Coordinates> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) if !(lat == 0.0 && lon == 0.0) => {
                Some(Coordinates { lat, lon })
            }
            _ => None,
        }
    }

    /// Whether the record carries a given tag (exact match)
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Restaurants that can be placed on a map, in collection order
pub fn mappable(restaurants: &[Restaurant]) -> impl Iterator<Item = (&Restaurant, Coordinates)> {
    restaurants
        .iter()
        .filter_map(|r| r.position().map(|pos| (r, pos)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(lat: Option<f64>, lon: Option<f64>) -> Restaurant {
        Restaurant {
            id: "sample".into(),
            name: "Sample".into(),
            city: String::new(),
            neighborhood: String::new(),
            address: String::new(),
            lat,
            lon,
            score: 0.0,
            score_label: String::new(),
            image: String::new(),
            note: String::new(),
            tags: vec!["pizza".into()],
            price: String::new(),
            website: String::new(),
            gmaps: String::new(),
            gf_safety: GfSafety::Option,
        }
    }

    #[test]
    fn test_safety_from_text() {
        assert_eq!(GfSafety::from_text(" Dedicated "), Some(GfSafety::Dedicated));
        assert_eq!(GfSafety::from_text("RISK"), Some(GfSafety::Risk));
        assert_eq!(GfSafety::from_text("option"), Some(GfSafety::Option));
        assert_eq!(GfSafety::from_text("maybe"), None);
        assert_eq!(GfSafety::default(), GfSafety::Option);
    }

    #[test]
    fn test_position_requires_both_axes() {
        assert!(sample(Some(45.5), None).position().is_none());
        assert!(sample(None, Some(-73.5)).position().is_none());
        assert_eq!(
            sample(Some(45.5), Some(-73.5)).position(),
            Some(Coordinates { lat: 45.5, lon: -73.5 })
        );
    }

    #[test]
    fn test_zero_zero_is_unmapped() {
        assert!(sample(Some(0.0), Some(0.0)).position().is_none());
        // A single zero axis is a real place (equator or prime meridian)
        assert!(sample(Some(0.0), Some(10.0)).position().is_some());
    }

    #[test]
    fn test_mappable_skips_unplaced_records() {
        let list = vec![
            sample(Some(45.5), Some(-73.5)),
            sample(Some(0.0), Some(0.0)),
            sample(None, None),
        ];
        assert_eq!(mappable(&list).count(), 1);
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(sample(None, None)).unwrap();
        assert_eq!(json["gfSafety"], "option");
        assert_eq!(json["scoreLabel"], "");
        assert!(json["lat"].is_null());
        assert!(sample(None, None).has_tag("pizza"));
    }
}
