//! Annotation and manifest types.
//!
//! # The Offset Contract
//!
//! Offsets are **character** positions into the UTF-8 decoded document text,
//! not byte positions. An annotation covers `text[start..end)` counted in
//! chars:
//!
//! ```text
//! Text:  c a l l   1 2 3 - 4 5 6 - 7 8 9 0 !
//! Char:  0 1 2 3 4 5 6 7 8 9 ...         17 18
//!                  └────── [5, 17) ──────┘
//! ```
//!
//! Manifests in the wild carry offsets as JSON strings *or* integers; both
//! are accepted on read and always written back as integers. Platform-side
//! bookkeeping fields (`languageCode`, `dataItemResourceLabels`,
//! `annotationResourceLabels`) are dropped during deserialization — values
//! are constructed clean rather than scrubbed in place afterwards.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// A labeled character span within a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Label for the span (e.g. `phone_num`).
    #[serde(rename = "displayName")]
    pub display_name: String,
    /// Start position (char offset, inclusive).
    #[serde(rename = "startOffset", deserialize_with = "offset_from_str_or_int")]
    pub start_offset: usize,
    /// End position (char offset, exclusive).
    #[serde(rename = "endOffset", deserialize_with = "offset_from_str_or_int")]
    pub end_offset: usize,
    /// Prediction confidence in `[0.0, 1.0]`, when the span came from a
    /// predictor rather than a human label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl Annotation {
    /// Create a new annotation without a confidence score.
    #[must_use]
    pub fn new(display_name: impl Into<String>, start_offset: usize, end_offset: usize) -> Self {
        Self {
            display_name: display_name.into(),
            start_offset,
            end_offset,
            confidence: None,
        }
    }

    /// Create an annotation carrying a predictor confidence.
    #[must_use]
    pub fn with_confidence(
        display_name: impl Into<String>,
        start_offset: usize,
        end_offset: usize,
        confidence: f64,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            start_offset,
            end_offset,
            confidence: Some(confidence.clamp(0.0, 1.0)),
        }
    }

    /// Drop the confidence score (manifest import files carry bare spans).
    #[must_use]
    pub fn without_confidence(mut self) -> Self {
        self.confidence = None;
        self
    }

    /// Span length in chars.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end_offset.saturating_sub(self.start_offset)
    }

    /// Check if the span is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start_offset >= self.end_offset
    }

    /// Extract the covered text. Returns `None` when the span does not fit
    /// inside `text` (offsets are char positions).
    #[must_use]
    pub fn slice(&self, text: &str) -> Option<String> {
        if self.start_offset > self.end_offset {
            return None;
        }
        let collected: String = text
            .chars()
            .skip(self.start_offset)
            .take(self.len())
            .collect();
        if collected.chars().count() == self.len() {
            Some(collected)
        } else {
            None
        }
    }

    /// Validate the span against a document length in chars.
    pub fn validate(&self, doc_len: usize) -> Result<()> {
        if self.start_offset > self.end_offset || self.end_offset > doc_len {
            return Err(Error::SpanOutOfBounds {
                label: self.display_name.clone(),
                start: self.start_offset,
                end: self.end_offset,
                len: doc_len,
            });
        }
        Ok(())
    }
}

/// One line of a JSON-lines annotation manifest.
///
/// Reading tolerates a missing `textSegmentAnnotations` array (treated as
/// empty); a missing `textGcsUri` is a parse error — callers report the
/// offending line number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Storage URI of the document text this entry annotates.
    #[serde(rename = "textGcsUri")]
    pub text_gcs_uri: String,
    /// Annotated spans, in the order they were labeled or accepted.
    #[serde(rename = "textSegmentAnnotations", default)]
    pub text_segment_annotations: Vec<Annotation>,
}

impl ManifestEntry {
    /// Create an entry for a URI with its annotations.
    #[must_use]
    pub fn new(text_gcs_uri: impl Into<String>, annotations: Vec<Annotation>) -> Self {
        Self {
            text_gcs_uri: text_gcs_uri.into(),
            text_segment_annotations: annotations,
        }
    }
}

/// A document under annotation: its full text, the accepted annotation set,
/// and the URI it came from.
///
/// The text buffer is read once, owned exclusively while the document is
/// processed, and dropped afterwards; nothing is shared across documents.
#[derive(Debug, Clone)]
pub struct Document {
    /// Source URI (manifest `textGcsUri`).
    pub uri: String,
    /// Full document text.
    pub text: String,
    /// Accepted annotations, existing labels first.
    pub annotations: Vec<Annotation>,
}

impl Document {
    /// Create a document from its text and pre-existing annotations.
    #[must_use]
    pub fn new(uri: impl Into<String>, text: impl Into<String>, annotations: Vec<Annotation>) -> Self {
        Self {
            uri: uri.into(),
            text: text.into(),
            annotations,
        }
    }

    /// Document length in chars (the unit all offsets use).
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Accept an offset encoded as either a JSON integer or a decimal string.
fn offset_from_str_or_int<'de, D>(deserializer: D) -> std::result::Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u64),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(n) => Ok(n as usize),
        Raw::Str(s) => s.trim().parse::<usize>().map_err(|_| {
            serde::de::Error::custom(format!("offset is not a non-negative integer: {s:?}"))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_accept_strings_and_integers() {
        let from_int: Annotation =
            serde_json::from_str(r#"{"displayName":"phone_num","startOffset":5,"endOffset":17}"#)
                .unwrap();
        let from_str: Annotation = serde_json::from_str(
            r#"{"displayName":"phone_num","startOffset":"5","endOffset":"17"}"#,
        )
        .unwrap();
        assert_eq!(from_int, from_str);
        assert_eq!(from_int.start_offset, 5);
        assert_eq!(from_int.end_offset, 17);
    }

    #[test]
    fn non_numeric_offset_is_rejected() {
        let result: std::result::Result<Annotation, _> = serde_json::from_str(
            r#"{"displayName":"phone_num","startOffset":"abc","endOffset":10}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn platform_bookkeeping_fields_are_dropped() {
        let entry: ManifestEntry = serde_json::from_str(
            r#"{"textGcsUri":"gs://b/f.txt","languageCode":"en",
                "dataItemResourceLabels":{"env":"prod"},
                "textSegmentAnnotations":[
                  {"displayName":"phone_num","startOffset":0,"endOffset":12,
                   "annotationResourceLabels":{"who":"model"}}]}"#,
        )
        .unwrap();
        let out = serde_json::to_string(&entry).unwrap();
        assert!(!out.contains("languageCode"));
        assert!(!out.contains("dataItemResourceLabels"));
        assert!(!out.contains("annotationResourceLabels"));
    }

    #[test]
    fn missing_annotations_default_to_empty() {
        let entry: ManifestEntry =
            serde_json::from_str(r#"{"textGcsUri":"gs://b/f.txt"}"#).unwrap();
        assert!(entry.text_segment_annotations.is_empty());
    }

    #[test]
    fn missing_uri_is_a_parse_error() {
        let result: std::result::Result<ManifestEntry, _> =
            serde_json::from_str(r#"{"textSegmentAnnotations":[]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn confidence_is_omitted_when_absent() {
        let ann = Annotation::new("phone_num", 0, 12);
        let out = serde_json::to_string(&ann).unwrap();
        assert!(!out.contains("confidence"));

        let scored = Annotation::with_confidence("phone_num", 0, 12, 0.92);
        let out = serde_json::to_string(&scored).unwrap();
        assert!(out.contains("confidence"));
    }

    #[test]
    fn slice_counts_chars_not_bytes() {
        // "é" is 2 bytes but 1 char; offsets are chars.
        let ann = Annotation::new("word", 5, 9);
        assert_eq!(ann.slice("café rené").as_deref(), Some("rené"));
    }

    #[test]
    fn slice_out_of_range_is_none() {
        let ann = Annotation::new("word", 3, 10);
        assert_eq!(ann.slice("abcd"), None);
    }

    #[test]
    fn validate_checks_document_bounds() {
        let ann = Annotation::new("phone_num", 5, 17);
        assert!(ann.validate(17).is_ok());
        assert!(ann.validate(16).is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn confidence_always_clamped(conf in -10.0f64..10.0) {
            let ann = Annotation::with_confidence("x", 0, 4, conf);
            let c = ann.confidence.unwrap();
            prop_assert!((0.0..=1.0).contains(&c));
        }

        #[test]
        fn string_and_int_offsets_agree(start in 0usize..100_000, len in 0usize..1_000) {
            let end = start + len;
            let as_int = format!(
                r#"{{"displayName":"x","startOffset":{start},"endOffset":{end}}}"#
            );
            let as_str = format!(
                r#"{{"displayName":"x","startOffset":"{start}","endOffset":"{end}"}}"#
            );
            let a: Annotation = serde_json::from_str(&as_int).unwrap();
            let b: Annotation = serde_json::from_str(&as_str).unwrap();
            prop_assert_eq!(a, b);
        }

        #[test]
        fn validate_accepts_exactly_in_bounds_spans(
            start in 0usize..1_000,
            len in 0usize..1_000,
            slack in 0usize..100,
        ) {
            let end = start + len;
            let ann = Annotation::new("x", start, end);
            prop_assert!(ann.validate(end + slack).is_ok());
            if end > 0 {
                prop_assert!(ann.validate(end - 1).is_err());
            }
        }
    }
}
