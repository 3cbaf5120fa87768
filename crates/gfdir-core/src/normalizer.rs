//! Record normalizer - converts loosely-typed input into a canonical [`Restaurant`]
//!
//! Raw records come from two places: the bundled baseline literal and a
//! spreadsheet-backed endpoint filled in by a web form. Neither is trusted to
//! use consistent field names or types, so every field goes through a
//! coercion step that degrades to a default instead of failing.
//!
//! # Guarantees
//!
//! - **Total**: `normalize` accepts any JSON value and never fails
//! - **Deterministic**: same input always produces the same record
//! - **Idempotent**: `normalize(to_json(normalize(x))) == normalize(x)`
//! - **Identified**: the output `id` is never empty

use indexmap::IndexSet;
use serde_json::Value;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;
use url::Url;

use crate::record::{GfSafety, Restaurant};

/// Identifier used when neither `id` nor `name` yields a usable slug
pub const PLACEHOLDER_ID: &str = "restaurant";

const IMAGE_FIELDS: &[&str] = &["image", "photo_url", "photo"];
const SAFETY_FIELDS: &[&str] = &["gfSafety", "gf_safety"];
const SAFETY_NOTE_FIELDS: &[&str] = &["gf", "gfNotes", "gf_notes"];

const DEDICATED_MARKERS: &[&str] = &["dédi", "dedicated", "100%", "exclusi"];
const RISK_MARKERS: &[&str] = &["risque", "risk", "contamination"];

const DRIVE_HOST: &str = "drive.google.com";

// ── Public API ─────────────────────────────────────────────

/// Normalize one raw record into a canonical [`Restaurant`].
///
/// Non-object input is treated as an empty mapping, so the result is a
/// record made entirely of defaults with the placeholder id.
pub fn normalize(raw: &Value) -> Restaurant {
    let name = text_field(raw, "name");
    let id = match text_field(raw, "id") {
        id if !id.is_empty() => id,
        _ => slugify(&name),
    };

    let score_raw = field(raw, "score");
    let score = score_raw.and_then(coerce_number).unwrap_or(0.0);
    let score_label = match text_field(raw, "scoreLabel") {
        label if !label.is_empty() => label,
        _ if score != 0.0 => score_raw.map(coerce_text).unwrap_or_default(),
        _ => String::new(),
    };

    Restaurant {
        id,
        name,
        city: text_field(raw, "city"),
        neighborhood: text_field(raw, "neighborhood"),
        address: text_field(raw, "address"),
        lat: field(raw, "lat").and_then(coerce_number),
        lon: field(raw, "lon").and_then(coerce_number),
        score,
        score_label,
        image: resolve_image_url(&first_text(raw, IMAGE_FIELDS)),
        note: text_field(raw, "note"),
        tags: normalize_tags(field(raw, "tags").unwrap_or(&Value::Null)),
        price: text_field(raw, "price"),
        website: text_field(raw, "website"),
        gmaps: text_field(raw, "gmaps"),
        gf_safety: resolve_safety(raw),
    }
}

/// Normalize every record of a list, preserving order
pub fn normalize_all(raws: &[Value]) -> Vec<Restaurant> {
    raws.iter().map(normalize).collect()
}

/// Whether a raw record carries enough to be identified (an `id` or a `name`)
pub fn has_identity(raw: &Value) -> bool {
    !text_field(raw, "id").is_empty() || !text_field(raw, "name").is_empty()
}

/// Normalize a tag field.
///
/// Accepts a list (elements coerced to text, `null` skipped) or a single
/// comma-separated string. Entries are trimmed, empty entries dropped, and
/// duplicates removed case-sensitively, keeping first-seen order.
pub fn normalize_tags(value: &Value) -> Vec<String> {
    let candidates: Vec<String> = match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .iter()
            .filter(|item| !item.is_null())
            .map(coerce_text)
            .collect(),
        other => coerce_text(other).split(',').map(str::to_string).collect(),
    };

    candidates
        .into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect::<IndexSet<String>>()
        .into_iter()
        .collect()
}

/// Infer a safety level from free-text notes.
///
/// Dedication markers are checked before risk markers; text matching
/// neither yields [`GfSafety::Option`].
pub fn infer_safety(text: &str) -> GfSafety {
    // Form submissions are not guaranteed to arrive precomposed
    let lower: String = text.to_lowercase().nfc().collect();
    if DEDICATED_MARKERS.iter().any(|m| lower.contains(m)) {
        GfSafety::Dedicated
    } else if RISK_MARKERS.iter().any(|m| lower.contains(m)) {
        GfSafety::Risk
    } else {
        GfSafety::Option
    }
}

/// Rewrite file-hosting "view" links into directly fetchable image URLs.
///
/// Google Drive share links (`/file/d/<id>/view` and `/open?id=<id>`) become
/// `https://drive.google.com/uc?export=view&id=<id>`. Anything else,
/// including relative asset paths, is returned trimmed but unchanged.
pub fn resolve_image_url(raw: &str) -> String {
    let trimmed = raw.trim();
    match drive_file_id(trimmed) {
        Some(id) => format!("https://{DRIVE_HOST}/uc?export=view&id={id}"),
        None => trimmed.to_string(),
    }
}

/// Deterministic slug: lowercase, accents stripped, runs of anything that is
/// not an ASCII letter or digit collapsed into one `-`, no leading or
/// trailing `-`. Empty results yield [`PLACEHOLDER_ID`].
pub fn slugify(text: &str) -> String {
    let folded = strip_accents(&text.to_lowercase());

    let mut slug = String::with_capacity(folded.len());
    let mut pending_dash = false;
    for ch in folded.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(ch);
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        PLACEHOLDER_ID.to_string()
    } else {
        slug
    }
}

/// Decompose and drop combining marks (`é` → `e`)
pub(crate) fn strip_accents(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

// ── Coercion helpers ───────────────────────────────────────

/// Coerce a JSON value to trimmed text.
///
/// Numbers and booleans use their display form; `null`, arrays and objects
/// carry no usable text and become empty.
pub fn coerce_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

/// Coerce a JSON value to a finite number, if it holds one
pub fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn field<'a>(raw: &'a Value, key: &str) -> Option<&'a Value> {
    raw.as_object()?.get(key)
}

fn text_field(raw: &Value, key: &str) -> String {
    field(raw, key).map(coerce_text).unwrap_or_default()
}

/// First non-empty text among several alias fields
fn first_text(raw: &Value, keys: &[&str]) -> String {
    keys.iter()
        .map(|key| text_field(raw, key))
        .find(|text| !text.is_empty())
        .unwrap_or_default()
}

fn resolve_safety(raw: &Value) -> GfSafety {
    let explicit = first_text(raw, SAFETY_FIELDS);
    if let Some(level) = GfSafety::from_text(&explicit) {
        return level;
    }

    // An unrecognized explicit value is still free text worth inspecting
    let notes = first_text(raw, SAFETY_NOTE_FIELDS);
    if notes.is_empty() {
        infer_safety(&explicit)
    } else {
        infer_safety(&notes)
    }
}

fn drive_file_id(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    if url.host_str()? != DRIVE_HOST {
        return None;
    }

    let segments: Vec<&str> = url.path_segments()?.collect();
    let id = match segments.as_slice() {
        ["file", "d", id, ..] => id.to_string(),
        ["open"] => url
            .query_pairs()
            .find(|(key, _)| key == "id")
            .map(|(_, value)| value.into_owned())?,
        _ => return None,
    };

    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid.then_some(id)
}
