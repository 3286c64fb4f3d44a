//! Embedding normalization for the vector store.
//!
//! Stored embeddings arrive in three shapes depending on which client wrote
//! them: a plain numeric sequence, a bracketed comma-delimited string, or a
//! map of index-like keys to values. Everything funnels through
//! [`RawEmbedding::normalize`] before a vector ever reaches the ANN query.

use serde::Deserialize;
use serde::Serialize;

/// A stored embedding before normalization.
///
/// Deserialization is untagged, so the variant is picked from the JSON
/// shape: arrays become [`Sequence`](Self::Sequence), strings become
/// [`DelimitedText`](Self::DelimitedText) and objects become
/// [`SparseMap`](Self::SparseMap).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawEmbedding {
    /// Already-numeric vector, e.g. `[0.1, 0.2, 0.3]`
    Sequence(Vec<f64>),
    /// Comma-delimited text, possibly wrapped in brackets or parentheses,
    /// e.g. `"[0.1, 0.2, 0.3]"`. This is how pgvector columns read back as
    /// text.
    DelimitedText(String),
    /// Index-keyed object, e.g. `{"0": 0.1, "1": 0.2}`
    SparseMap(serde_json::Map<String, serde_json::Value>),
}

impl RawEmbedding {
    /// Normalize a stored embedding into a dense numeric vector.
    ///
    /// - Sequences pass through with non-finite entries replaced by `0.0`.
    /// - Delimited text is stripped of `[` `]` `(` `)` anywhere in the
    ///   string, split on commas, and each token parsed; tokens that fail to
    ///   parse or parse to a non-finite value are dropped.
    /// - Sparse maps take their values in iteration order with the same
    ///   numeric coercion a JS runtime would apply, then map non-finite
    ///   results to `0.0`.
    ///
    /// Always returns a vector, never fails; unusable input normalizes to an
    /// empty vector.
    #[must_use]
    pub fn normalize(self) -> Vec<f64> {
        match self {
            Self::Sequence(values) => values
                .into_iter()
                .map(|v| if v.is_finite() { v } else { 0.0 })
                .collect(),
            Self::DelimitedText(text) => {
                let cleaned: String = text
                    .chars()
                    .filter(|c| !matches!(c, '[' | ']' | '(' | ')'))
                    .collect();
                cleaned
                    .split(',')
                    .filter_map(|token| token.trim().parse::<f64>().ok())
                    .filter(|v| v.is_finite())
                    .collect()
            }
            Self::SparseMap(map) => map
                .values()
                .map(|value| {
                    let n = coerce_number(value);
                    if n.is_finite() {
                        n
                    } else {
                        0.0
                    }
                })
                .collect(),
        }
    }

    /// True when normalization would produce no usable vector.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Sequence(values) => values.is_empty(),
            Self::DelimitedText(text) => text.trim().is_empty(),
            Self::SparseMap(map) => map.is_empty(),
        }
    }
}

/// Loose numeric coercion for sparse-map values: numbers pass through,
/// numeric strings parse, everything else becomes NaN.
fn coerce_number(value: &serde_json::Value) -> f64 {
    match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        serde_json::Value::String(s) => s.trim().parse::<f64>().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

/// Drop non-finite entries from an already-normalized vector.
///
/// Applied once more at the query boundary so no NaN or infinity can reach
/// the distance operator, whatever path the vector took to get here.
#[must_use]
pub fn sanitize_vector(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| v.is_finite()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn from_json(value: serde_json::Value) -> RawEmbedding {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_sequence_passes_through() {
        let raw = from_json(json!([0.1, 0.2, 0.3]));
        assert_eq!(raw.normalize(), vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_sequence_zeroes_non_finite() {
        let raw = RawEmbedding::Sequence(vec![0.5, f64::NAN, f64::INFINITY, -0.5]);
        assert_eq!(raw.normalize(), vec![0.5, 0.0, 0.0, -0.5]);
    }

    #[test]
    fn test_delimited_text_with_brackets() {
        let raw = from_json(json!("[0.1, 0.2, 0.3]"));
        assert_eq!(raw.normalize(), vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_delimited_text_with_parentheses() {
        let raw = from_json(json!("(0.25,-0.75)"));
        assert_eq!(raw.normalize(), vec![0.25, -0.75]);
    }

    #[test]
    fn test_delimited_text_drops_unparseable_tokens() {
        let raw = from_json(json!("[0.1, 0.2, NaN, 0.4]"));
        assert_eq!(raw.normalize(), vec![0.1, 0.2, 0.4]);
    }

    #[test]
    fn test_delimited_text_drops_infinite_and_garbage() {
        let raw = from_json(json!("0.1, inf, hello, 0.9"));
        assert_eq!(raw.normalize(), vec![0.1, 0.9]);
    }

    #[test]
    fn test_delimited_text_scientific_notation() {
        let raw = from_json(json!("[1e-3, -2.5E2]"));
        assert_eq!(raw.normalize(), vec![0.001, -250.0]);
    }

    #[test]
    fn test_empty_text_normalizes_to_empty() {
        assert!(from_json(json!("")).normalize().is_empty());
        assert!(from_json(json!("[]")).normalize().is_empty());
        assert!(from_json(json!("  ")).normalize().is_empty());
    }

    #[test]
    fn test_sparse_map_takes_values_with_coercion() {
        let raw = from_json(json!({"0": 0.1, "1": "0.2", "2": null}));
        assert_eq!(raw.normalize(), vec![0.1, 0.2, 0.0]);
    }

    #[test]
    fn test_sparse_map_non_numeric_values_become_zero() {
        let raw = from_json(json!({"0": "not a number", "1": true, "2": 0.7}));
        assert_eq!(raw.normalize(), vec![0.0, 0.0, 0.7]);
    }

    #[test]
    fn test_empty_inputs_normalize_to_empty_not_error() {
        assert!(RawEmbedding::Sequence(vec![]).normalize().is_empty());
        assert!(from_json(json!({})).normalize().is_empty());
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let raw = from_json(json!("[0.1, 0.2, NaN, 0.4]"));
        let once = raw.normalize();
        let twice = RawEmbedding::Sequence(once.clone()).normalize();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_is_empty_matches_normalize() {
        assert!(RawEmbedding::DelimitedText(String::new()).is_empty());
        assert!(RawEmbedding::Sequence(vec![]).is_empty());
        assert!(!RawEmbedding::Sequence(vec![0.1]).is_empty());
    }

    #[test]
    fn test_sanitize_vector_filters_without_coercing() {
        let sanitized = sanitize_vector(&[0.1, f64::NAN, 0.3, f64::NEG_INFINITY]);
        assert_eq!(sanitized, vec![0.1, 0.3]);
    }

    #[test]
    fn test_sanitize_vector_empty_input() {
        assert!(sanitize_vector(&[]).is_empty());
        assert!(sanitize_vector(&[f64::NAN]).is_empty());
    }

    #[test]
    fn test_untagged_deserialization_picks_variants() {
        assert!(matches!(from_json(json!([1.0])), RawEmbedding::Sequence(_)));
        assert!(matches!(from_json(json!("1.0")), RawEmbedding::DelimitedText(_)));
        assert!(matches!(from_json(json!({"0": 1.0})), RawEmbedding::SparseMap(_)));
    }
}
