use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use unicode_normalization::UnicodeNormalization;

pub const MIN_TERM_LEN: usize = 2;
pub const MAX_TERM_LEN: usize = 20;

lazy_static! {
    // CJK ideographs, kana, hangul syllables, ASCII alphanumerics, Latin-1 letters.
    static ref SEGMENT: Regex = Regex::new(
        r"[\x{4E00}-\x{9FFF}\x{3040}-\x{30FF}\x{AC00}-\x{D7AF}A-Za-z0-9\x{00C0}-\x{00FF}]+"
    )
    .expect("valid regex");
}

/// NFC normalization applied to both indexed text and queries.
pub fn normalize(text: &str) -> String {
    text.nfc().collect()
}

/// Split text into searchable terms.
///
/// Pure ASCII segments only yield their prefixes (`"abc"` -> `ab`, `abc`);
/// anything else yields every window, since CJK text has no word delimiter.
/// Lengths are counted in chars and capped by [`MIN_TERM_LEN`]/[`MAX_TERM_LEN`].
pub fn extract_full_text_terms(text: &str) -> Vec<String> {
    let normalized = normalize(text);
    let mut terms = Vec::new();
    for segment in SEGMENT.find_iter(&normalized).map(|m| m.as_str()) {
        push_segment_terms(segment, &mut terms);
    }
    terms
}

/// Occurrence count of every term of `text`.
pub fn term_counts(text: &str) -> BTreeMap<String, u32> {
    let mut counts = BTreeMap::new();
    for term in extract_full_text_terms(text) {
        *counts.entry(term).or_insert(0) += 1;
    }
    counts
}

fn push_segment_terms(segment: &str, out: &mut Vec<String>) {
    // byte offset of every char boundary, including the end
    let bounds: Vec<usize> = segment
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(segment.len()))
        .collect();
    let char_len = bounds.len() - 1;
    let max_len = MAX_TERM_LEN.min(char_len);

    if segment.bytes().all(|b| b.is_ascii_alphanumeric()) {
        for len in MIN_TERM_LEN..=max_len {
            out.push(segment[..bounds[len]].to_string());
        }
    } else {
        for len in MIN_TERM_LEN..=max_len {
            for start in 0..=(char_len - len) {
                out.push(segment[bounds[start]..bounds[start + len]].to_string());
            }
        }
    }
}

/// Flatten a metadata tree into `path -> values`.
///
/// Paths join object keys with `/`. Arrays become one entry holding every
/// element; scalars become a one-element list. `null` and empty objects emit
/// nothing, and so does a non-object root.
pub fn extract_properties(metadata: &Value) -> BTreeMap<String, Vec<String>> {
    let mut out = BTreeMap::new();
    if let Value::Object(map) = metadata {
        for (key, value) in map {
            collect_properties(value, key.clone(), &mut out);
        }
    }
    out
}

fn collect_properties(value: &Value, path: String, out: &mut BTreeMap<String, Vec<String>>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                collect_properties(child, format!("{path}/{key}"), out);
            }
        }
        Value::Array(items) => {
            out.insert(path, items.iter().filter_map(property_string).collect());
        }
        Value::Null => {}
        scalar => {
            if let Some(s) = property_string(scalar) {
                out.insert(path, vec![s]);
            }
        }
    }
}

fn property_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(_) | Value::Number(_) => Some(value.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}
