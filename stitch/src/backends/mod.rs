//! Prediction backends.
//!
//! The pipeline talks to whatever produces candidate spans through the
//! [`Predictor`] trait: the shipped [`PhoneScanner`] regex backend, a test
//! double, or a wrapper around a remote entity-extraction service. The
//! trait deals in chunk-relative offsets; translation to document
//! coordinates is the pipeline's job.

pub mod phone;

pub use phone::{scan_phone_numbers, PhoneScanner, PHONE_LABEL};

use std::time::Duration;

use thiserror::Error;

use crate::error::{Error, Result};

/// A candidate span reported by a backend, relative to the submitted chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Label for the span.
    pub label: String,
    /// Start offset within the chunk (chars).
    pub start: usize,
    /// End offset within the chunk (chars, exclusive).
    pub end: usize,
    /// Backend confidence in `[0.0, 1.0]`.
    pub confidence: f64,
}

impl Prediction {
    /// Create a prediction.
    #[must_use]
    pub fn new(label: impl Into<String>, start: usize, end: usize, confidence: f64) -> Self {
        Self {
            label: label.into(),
            start,
            end,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Errors a backend may raise for one chunk.
#[derive(Debug, Clone, Error)]
pub enum PredictError {
    /// Transient condition; the caller retries under its [`RetryPolicy`].
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// The request itself is unacceptable. Fatal — never retried.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Produces candidate spans for one chunk of text.
pub trait Predictor {
    /// Predict spans for `chunk` (at most the configured chunk length),
    /// with offsets relative to the chunk.
    fn predict(&self, chunk: &str) -> std::result::Result<Vec<Prediction>, PredictError>;

    /// Backend name for progress output.
    fn name(&self) -> &'static str {
        "predictor"
    }
}

/// Retry behavior for transient backend failures.
///
/// The default matches the production loop: retry forever with a fixed one
/// second delay. Tests inject a zero-delay, capped policy instead of
/// sleeping for real.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Fixed delay between attempts.
    pub delay: Duration,
    /// Give up after this many failed attempts (`None` = retry forever).
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(1),
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    /// Policy that retries immediately, up to `max_attempts` attempts.
    #[must_use]
    pub fn capped(max_attempts: u32) -> Self {
        Self {
            delay: Duration::ZERO,
            max_attempts: Some(max_attempts),
        }
    }
}

/// Call a backend for one chunk, retrying transient unavailability per the
/// policy.
///
/// Each retry is logged; `InvalidArgument` propagates immediately and a
/// retry budget running out surfaces as [`Error::Unavailable`].
pub fn predict_with_retry(
    predictor: &dyn Predictor,
    chunk: &str,
    policy: &RetryPolicy,
) -> Result<Vec<Prediction>> {
    let mut attempt: u32 = 0;
    loop {
        match predictor.predict(chunk) {
            Ok(predictions) => return Ok(predictions),
            Err(PredictError::Unavailable(msg)) => {
                attempt += 1;
                if let Some(max) = policy.max_attempts {
                    if attempt >= max {
                        return Err(Error::Unavailable(format!(
                            "{msg} (giving up after {attempt} attempts)"
                        )));
                    }
                }
                log::warn!(
                    "{} unavailable (attempt {attempt}): {msg}; retrying in {:?}",
                    predictor.name(),
                    policy.delay
                );
                if !policy.delay.is_zero() {
                    std::thread::sleep(policy.delay);
                }
            }
            Err(PredictError::InvalidArgument(msg)) => {
                return Err(Error::InvalidArgument(msg));
            }
        }
    }
}
