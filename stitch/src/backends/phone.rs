//! Regex phone-number backend.
//!
//! Matches the two formats the annotation datasets use, `123-456-7890` and
//! `123.456.7890`. Anything fuzzier (parenthesized area codes, country
//! prefixes) is deliberately out: labels produced here feed training
//! manifests, so precision beats recall.

use once_cell::sync::Lazy;
use regex::Regex;
use stitch_core::Annotation;

use super::{PredictError, Prediction, Predictor};
use crate::offset::bytes_to_chars;

/// Label attached to every phone-number span.
pub const PHONE_LABEL: &str = "phone_num";

static PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{3}-\d{3}-\d{4}|\d{3}\.\d{3}\.\d{4}").expect("valid regex"));

/// Scan text for phone numbers, returning annotations with char offsets.
#[must_use]
pub fn scan_phone_numbers(text: &str) -> Vec<Annotation> {
    PHONE
        .find_iter(text)
        .map(|m| {
            let (start, end) = bytes_to_chars(text, m.start(), m.end());
            Annotation::new(PHONE_LABEL, start, end)
        })
        .collect()
}

/// Offline `Predictor` over the phone regex.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhoneScanner;

impl PhoneScanner {
    /// Create a new scanner.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Predictor for PhoneScanner {
    fn predict(&self, chunk: &str) -> Result<Vec<Prediction>, PredictError> {
        Ok(scan_phone_numbers(chunk)
            .into_iter()
            .map(|a| Prediction::new(a.display_name, a.start_offset, a.end_offset, 1.0))
            .collect())
    }

    fn name(&self) -> &'static str {
        "phone-regex"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_dashed_number_at_exact_offsets() {
        let text = "a\nb\nc123-456-7890d";
        let found = scan_phone_numbers(text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].display_name, PHONE_LABEL);
        assert_eq!(found[0].start_offset, 5);
        assert_eq!(found[0].end_offset, 17);
        assert_eq!(found[0].slice(text).as_deref(), Some("123-456-7890"));
    }

    #[test]
    fn finds_dotted_numbers() {
        let found = scan_phone_numbers("call 555.123.4567 now");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].start_offset, 5);
        assert_eq!(found[0].end_offset, 17);
    }

    #[test]
    fn finds_every_occurrence_in_order() {
        let text = "123-456-7890 or 987.654.3210";
        let found = scan_phone_numbers(text);
        let starts: Vec<usize> = found.iter().map(|a| a.start_offset).collect();
        assert_eq!(starts, vec![0, 16]);
    }

    #[test]
    fn offsets_are_chars_after_multibyte_prefix() {
        // "téléphone: " is 11 chars but 13 bytes.
        let text = "téléphone: 123-456-7890";
        let found = scan_phone_numbers(text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].start_offset, 11);
        assert_eq!(found[0].end_offset, 23);
        assert_eq!(found[0].slice(text).as_deref(), Some("123-456-7890"));
    }

    #[test]
    fn plain_digits_do_not_match() {
        assert!(scan_phone_numbers("1234567890").is_empty());
        assert!(scan_phone_numbers("123-4567").is_empty());
    }

    #[test]
    fn scanner_predictions_carry_full_confidence() {
        let preds = PhoneScanner::new().predict("x 123-456-7890").unwrap();
        assert_eq!(preds.len(), 1);
        assert_eq!(preds[0].label, PHONE_LABEL);
        assert_eq!(preds[0].confidence, 1.0);
        assert_eq!((preds[0].start, preds[0].end), (2, 14));
    }
}
