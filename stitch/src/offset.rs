//! Chunk-to-document offset translation.
//!
//! # The Two Ingestion Artifacts
//!
//! Annotated spans go wrong in two distinct ways on their path through the
//! external platform, and this module is where both are undone:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │ 1. REQUEST SIZE CAP                                                │
//! │                                                                    │
//! │    Document:  [..............................................]     │
//! │    Requests:  [── chunk 0 ──)[── chunk 1 ──)[─ chunk 2 ─)          │
//! │                              ▲                                     │
//! │                   predictions come back relative to the            │
//! │                   chunk start, not the document start              │
//! │                                                                    │
//! │    fix: global = chars_read + raw                                  │
//! ├────────────────────────────────────────────────────────────────────┤
//! │ 2. DOUBLED NEWLINES                                                │
//! │                                                                    │
//! │    Submitted:  "a\nb\nc123-456-7890"                               │
//! │    Ingested:   "a\n\nb\n\nc123-456-7890"                           │
//! │                                                                    │
//! │    The platform duplicates each newline on ingestion, so every     │
//! │    offset that points past k newlines lands k chars short.         │
//! │                                                                    │
//! │    fix: global += count of '\n' in text[0..global_start]           │
//! │         (counted BEFORE the shift is applied)                      │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The alternative to correction 2 is rewriting the document so it has no
//! newlines before submission (see [`crate::ingest::TextPreparer`]); the two
//! strategies are mutually exclusive and the pipeline configuration encodes
//! that as a single enum choice.
//!
//! All offsets here are **char** offsets. [`bytes_to_chars`] converts the
//! byte positions the `regex` crate reports into that coordinate system.

use thiserror::Error;

/// A corrected span that no longer fits inside its document.
///
/// Raised instead of silently truncating: the caller knows which document
/// and label the span belongs to and attaches that context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("corrected span [{start}, {end}) exceeds document length {len}")]
pub struct SpanOutOfRange {
    /// Corrected start offset (chars).
    pub start: usize,
    /// Corrected end offset (chars, exclusive).
    pub end: usize,
    /// Document length (chars).
    pub len: usize,
}

/// Translates chunk-relative spans into document coordinates.
///
/// Pure computation; holds only a borrow of the document text (needed for
/// the newline count and the length bound).
#[derive(Debug, Clone)]
pub struct OffsetTranslator<'a> {
    text: &'a str,
    char_len: usize,
    correct_newlines: bool,
}

impl<'a> OffsetTranslator<'a> {
    /// Translator without newline correction.
    #[must_use]
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            char_len: text.chars().count(),
            correct_newlines: false,
        }
    }

    /// Translator that compensates for the doubled-newline ingestion
    /// artifact.
    #[must_use]
    pub fn with_newline_correction(text: &'a str) -> Self {
        Self {
            correct_newlines: true,
            ..Self::new(text)
        }
    }

    /// Whether newline correction is applied.
    #[must_use]
    pub const fn corrects_newlines(&self) -> bool {
        self.correct_newlines
    }

    /// Map a chunk-relative `[raw_start, raw_end)` pair to document-global
    /// offsets, given the chunk's start position `chars_read`.
    ///
    /// With correction enabled, both offsets are shifted by the number of
    /// newlines in the document before the *uncorrected* global start.
    /// A corrected end past the document length is an error, never a
    /// truncation.
    pub fn translate(
        &self,
        chars_read: usize,
        raw_start: usize,
        raw_end: usize,
    ) -> Result<(usize, usize), SpanOutOfRange> {
        let global_start = chars_read + raw_start;
        let shift = if self.correct_newlines {
            newlines_before(self.text, global_start)
        } else {
            0
        };
        let start = global_start + shift;
        let end = chars_read + raw_end + shift;
        if end > self.char_len {
            return Err(SpanOutOfRange {
                start,
                end,
                len: self.char_len,
            });
        }
        Ok((start, end))
    }
}

/// Count newline chars in `text[..char_pos)` (char positions).
#[must_use]
pub fn newlines_before(text: &str, char_pos: usize) -> usize {
    text.chars().take(char_pos).filter(|&c| c == '\n').count()
}

/// Convert a byte-offset span (as reported by `regex`) to char offsets.
///
/// Both offsets must lie on char boundaries, which regex match bounds
/// always do.
#[must_use]
pub fn bytes_to_chars(text: &str, byte_start: usize, byte_end: usize) -> (usize, usize) {
    let char_start = text[..byte_start].chars().count();
    let char_end = char_start + text[byte_start..byte_end].chars().count();
    (char_start, char_end)
}
