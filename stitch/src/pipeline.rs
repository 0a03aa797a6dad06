//! The chunked annotation pipeline.
//!
//! Per document: partition the text into char windows, obtain candidate
//! spans for each window from a [`Predictor`], translate the chunk-relative
//! offsets into document coordinates, and reconcile each candidate against
//! the accepted set (seeded with the document's existing annotations).
//!
//! ```text
//! read text ─► chunks ─► predict ─► translate ─► reconcile ─► manifest line
//!                │          │            │            │
//!                │          └ retried on │            └ overlap ⇒ discard
//!                │            transient  │
//!                │            failures   └ optional doubled-newline
//!                └ [chars_read,            correction; out-of-range ⇒ error
//!                   chars_read+MAX_LEN)
//! ```
//!
//! Strictly sequential: one document finishes all its chunks before the next
//! begins, and the only blocking point is the predictor call itself. Output
//! is deterministic given a deterministic predictor — candidates keep
//! discovery order (chunk order, then within-chunk order) and are never
//! re-sorted.

use std::fs;
use std::path::{Path, PathBuf};

use stitch_core::{Annotation, Document};

use crate::backends::{predict_with_retry, Predictor, RetryPolicy};
use crate::chunk::{chunks, DEFAULT_MAX_CHUNK_LEN};
use crate::error::{Error, Result};
use crate::manifest::{modified_path, read_manifest, resolve_text_path, write_manifest};
use crate::offset::OffsetTranslator;
use crate::reconcile::reconcile;

/// How to defend annotation offsets against the doubled-newline ingestion
/// artifact.
///
/// The two defenses are mutually exclusive by construction: correcting
/// offsets assumes the submitted text still has its newlines, stripping
/// newlines removes the thing being corrected for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NewlineHandling {
    /// Submit text as-is, keep offsets raw.
    #[default]
    Keep,
    /// Submit text as-is, shift offsets by the newline count before each
    /// span.
    AdjustOffsets,
    /// Rewrite the text without newlines before submission (see
    /// [`crate::ingest::TextPreparer`]); offsets then need no correction.
    StripNewlines,
}

/// Pipeline configuration.
///
/// Everything the run depends on is carried here explicitly — chunk cap,
/// newline strategy, retry policy — so tests drive the pipeline with fakes
/// and zero-delay retries.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Per-request char cap (default [`DEFAULT_MAX_CHUNK_LEN`]).
    pub max_chunk_len: usize,
    /// Newline artifact strategy.
    pub newline_handling: NewlineHandling,
    /// Retry policy for transient predictor failures.
    pub retry: RetryPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_chunk_len: DEFAULT_MAX_CHUNK_LEN,
            newline_handling: NewlineHandling::Keep,
            retry: RetryPolicy::default(),
        }
    }
}

/// Counters from one document run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Chunks submitted.
    pub chunks: usize,
    /// Candidate spans the predictor returned.
    pub predicted: usize,
    /// Candidates appended to the accepted set.
    pub accepted: usize,
    /// Candidates discarded as overlapping.
    pub rejected: usize,
}

/// Run the pipeline over one document, appending accepted candidates to
/// `doc.annotations` in place.
///
/// The accepted set starts as the document's existing annotations; they are
/// never reordered or removed. A candidate whose corrected span falls
/// outside the document aborts the run with
/// [`Error::OffsetOutOfRange`] naming the document and label.
pub fn annotate_document(
    doc: &mut Document,
    predictor: &dyn Predictor,
    config: &PipelineConfig,
) -> Result<RunStats> {
    let translator = match config.newline_handling {
        NewlineHandling::AdjustOffsets => OffsetTranslator::with_newline_correction(&doc.text),
        NewlineHandling::Keep | NewlineHandling::StripNewlines => OffsetTranslator::new(&doc.text),
    };

    let mut stats = RunStats::default();
    for chunk in chunks(&doc.text, config.max_chunk_len) {
        log::info!(
            "checking characters {} to {}",
            chunk.start,
            chunk.end.saturating_sub(1)
        );
        let predictions = predict_with_retry(predictor, chunk.text, &config.retry)?;
        stats.chunks += 1;
        stats.predicted += predictions.len();

        for p in predictions {
            let (start, end) = translator
                .translate(chunk.start, p.start, p.end)
                .map_err(|e| Error::offset_out_of_range(&doc.uri, &p.label, e))?;
            let candidate =
                Annotation::with_confidence(p.label, start, end, p.confidence);
            if reconcile(&mut doc.annotations, candidate) {
                stats.accepted += 1;
            } else {
                stats.rejected += 1;
            }
        }
    }
    Ok(stats)
}

/// Run the pipeline over every entry of a manifest and write the merged
/// result next to the input as `<stem>_modified.<ext>`.
///
/// Entries keep their input order. The first fatal error on any document
/// aborts the whole run before anything is written — output either reflects
/// a complete pass or does not exist.
pub fn run_merge(
    manifest_path: &Path,
    datasets_dir: &Path,
    gcs_root: &str,
    predictor: &dyn Predictor,
    config: &PipelineConfig,
) -> Result<PathBuf> {
    let mut entries = read_manifest(manifest_path)?;

    for entry in &mut entries {
        let text_path = resolve_text_path(&entry.text_gcs_uri, gcs_root, datasets_dir);
        let text = fs::read_to_string(&text_path)?;
        let mut doc = Document::new(
            entry.text_gcs_uri.clone(),
            text,
            std::mem::take(&mut entry.text_segment_annotations),
        );
        log::info!(
            "{}: {} chars, {} existing annotations",
            text_path.display(),
            doc.char_len(),
            doc.annotations.len()
        );
        let stats = annotate_document(&mut doc, predictor, config)?;
        log::info!(
            "{}: accepted {} of {} predicted spans",
            text_path.display(),
            stats.accepted,
            stats.predicted
        );
        entry.text_segment_annotations = doc.annotations;
    }

    let output_path = modified_path(manifest_path);
    write_manifest(&output_path, &entries)?;
    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{PredictError, Prediction};

    /// Returns scripted predictions for successive chunks.
    struct Scripted {
        per_chunk: Vec<Vec<Prediction>>,
        calls: std::cell::Cell<usize>,
    }

    impl Scripted {
        fn new(per_chunk: Vec<Vec<Prediction>>) -> Self {
            Self {
                per_chunk,
                calls: std::cell::Cell::new(0),
            }
        }
    }

    impl Predictor for Scripted {
        fn predict(&self, _chunk: &str) -> std::result::Result<Vec<Prediction>, PredictError> {
            let idx = self.calls.get();
            self.calls.set(idx + 1);
            Ok(self.per_chunk.get(idx).cloned().unwrap_or_default())
        }
    }

    fn config(max_chunk_len: usize) -> PipelineConfig {
        PipelineConfig {
            max_chunk_len,
            newline_handling: NewlineHandling::Keep,
            retry: RetryPolicy::capped(1),
        }
    }

    #[test]
    fn chunk_offsets_are_rebased_to_the_document() {
        // Two chunks of 10; a hit at chunk-relative [2, 6) in each.
        let mut doc = Document::new("u", "abcdefghijklmnopqrst", vec![]);
        let backend = Scripted::new(vec![
            vec![Prediction::new("x", 2, 6, 1.0)],
            vec![Prediction::new("x", 2, 6, 1.0)],
        ]);
        let stats = annotate_document(&mut doc, &backend, &config(10)).unwrap();
        assert_eq!(stats.chunks, 2);
        assert_eq!(stats.accepted, 2);
        let spans: Vec<(usize, usize)> = doc
            .annotations
            .iter()
            .map(|a| (a.start_offset, a.end_offset))
            .collect();
        assert_eq!(spans, vec![(2, 6), (12, 16)]);
    }

    #[test]
    fn existing_annotations_seed_the_accepted_set() {
        let mut doc = Document::new(
            "u",
            "abcdefghij",
            vec![Annotation::new("gold", 2, 5)],
        );
        // Candidate [4, 7) overlaps the gold span; [7, 9) does not
        // (boundary-inclusive, so a start of 5 would still touch).
        let backend = Scripted::new(vec![vec![
            Prediction::new("x", 4, 7, 1.0),
            Prediction::new("x", 7, 9, 1.0),
        ]]);
        let stats = annotate_document(&mut doc, &backend, &config(100)).unwrap();
        assert_eq!(stats.accepted, 1);
        assert_eq!(stats.rejected, 1);
        assert_eq!(doc.annotations.len(), 2);
        assert_eq!(doc.annotations[0].display_name, "gold");
        assert_eq!(doc.annotations[1].start_offset, 7);
    }

    #[test]
    fn out_of_range_correction_names_the_document() {
        let mut doc = Document::new("gs://b/bad.txt", "a\nb\nc", vec![]);
        let backend = Scripted::new(vec![vec![Prediction::new("x", 3, 5, 1.0)]]);
        let mut cfg = config(100);
        cfg.newline_handling = NewlineHandling::AdjustOffsets;
        let err = annotate_document(&mut doc, &backend, &cfg).unwrap_err();
        match err {
            Error::OffsetOutOfRange { uri, end, len, .. } => {
                assert_eq!(uri, "gs://b/bad.txt");
                assert_eq!(end, 6);
                assert_eq!(len, 5);
            }
            other => panic!("expected OffsetOutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn empty_document_runs_zero_chunks() {
        let mut doc = Document::new("u", "", vec![Annotation::new("gold", 0, 0)]);
        let backend = Scripted::new(vec![]);
        let stats = annotate_document(&mut doc, &backend, &config(10)).unwrap();
        assert_eq!(stats, RunStats::default());
        assert_eq!(doc.annotations.len(), 1);
    }
}
