//! # stitch
//!
//! Offline toolkit for text-entity-extraction annotation pipelines:
//! merge machine-predicted spans into human-labeled manifests without
//! overlaps, translate chunk-relative prediction offsets back into document
//! coordinates, and undo a known newline-duplication artifact from the
//! upstream ingestion platform.
//!
//! - **Reconciliation**: [`reconcile`] — append-only merging with a
//!   boundary-inclusive overlap test
//! - **Offset translation**: [`offset`] — chunk→document rebasing with
//!   optional doubled-newline correction
//! - **Pipeline**: [`pipeline`] — chunk, predict (with retry), translate,
//!   reconcile, per manifest entry
//! - **Backends**: [`backends`] — the [`Predictor`] seam and the regex
//!   phone scanner
//! - **Sidecars**: [`manifest`] I/O, [`ingest`] (text prep, email
//!   extraction), [`embedding`] (word-vector document embeddings)
//!
//! Batch, single-pass, single-threaded by design: one document is processed
//! fully before the next begins, and nothing is shared across documents.

#![warn(missing_docs)]

pub mod backends;
pub mod chunk;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod manifest;
pub mod offset;
pub mod pipeline;
pub mod reconcile;

// Re-export error types
pub use error::{Error, Result};

// Re-export stitch-core types so downstream crates need only one import.
pub use stitch_core::{Annotation, Document, ManifestEntry};

// Re-export commonly used items
pub use backends::{
    predict_with_retry, scan_phone_numbers, PhoneScanner, PredictError, Prediction, Predictor,
    RetryPolicy, PHONE_LABEL,
};
pub use chunk::{chunks, Chunk, DEFAULT_MAX_CHUNK_LEN};
pub use embedding::{
    cosine_similarity, document_embedding, nearest_neighbors, process_text, WordEmbeddings,
};
pub use ingest::{NewlineStrip, PreparedText, TextPreparer};
pub use manifest::{
    is_modified_path, modified_path, read_manifest, resolve_text_path, write_manifest,
};
pub use offset::{bytes_to_chars, newlines_before, OffsetTranslator, SpanOutOfRange};
pub use pipeline::{annotate_document, run_merge, NewlineHandling, PipelineConfig, RunStats};
pub use reconcile::{overlaps, overlaps_any, reconcile};
