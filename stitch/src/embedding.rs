//! Document embeddings via word-vector averaging.
//!
//! A document embedding here is just the sum of the GloVe vectors of its
//! cleaned tokens. Cleaning follows the social-media lineage of the word
//! vectors: drop `$TICKER` cashtags, a leading `RT` marker, URLs and
//! `@handles`, un-prefix hashtags, lowercase, then filter stopwords and
//! bare punctuation.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};

static TICKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\w*").expect("valid regex"));
static RETWEET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^RT\s+").expect("valid regex"));
// URLs swallow the rest of their line: tracking-parameter tails are noise
// all the way to the newline.
static URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://[^\r\n]*[\r\n]*").expect("valid regex"));
static HANDLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@\w+").expect("valid regex"));

/// English stopwords, filtered before embedding lookup.
static STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "did", "do", "does", "doing", "down", "during", "each", "few", "for", "from",
    "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself", "him",
    "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just", "me",
    "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once", "only",
    "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same", "she", "should",
    "so", "some", "such", "than", "that", "the", "their", "theirs", "them", "themselves", "then",
    "there", "these", "they", "this", "those", "through", "to", "too", "under", "until", "up",
    "very", "was", "we", "were", "what", "when", "where", "which", "while", "who", "whom", "why",
    "will", "with", "you", "your", "yours", "yourself", "yourselves",
];

/// Words that dominate email bodies without carrying content: MIME
/// bookkeeping and markup residue, skipped during embedding lookup.
static BOILERPLATE: &[&str] = &[
    "transfer", "type", "html", "utf", "content", "text", "div", "http", "www", "org",
];

fn is_stopword(word: &str) -> bool {
    STOPWORDS.binary_search(&word).is_ok()
}

/// A word-vector table loaded from a GloVe-format text file.
#[derive(Debug, Clone, Default)]
pub struct WordEmbeddings {
    vectors: HashMap<String, Vec<f32>>,
    dim: usize,
}

impl WordEmbeddings {
    /// Load a GloVe text file: one `word v1 v2 ... vN` record per line.
    ///
    /// The first record fixes the dimension; any later record with a
    /// different width is an error naming its line.
    pub fn load_glove(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut vectors = HashMap::new();
        let mut dim = 0;
        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.split_whitespace();
            let word = fields
                .next()
                .ok_or_else(|| Error::embedding(format!("line {}: empty record", idx + 1)))?;
            let values: Vec<f32> = fields
                .map(str::parse)
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| Error::embedding(format!("line {}: {e}", idx + 1)))?;
            if dim == 0 {
                dim = values.len();
            }
            if values.is_empty() || values.len() != dim {
                return Err(Error::embedding(format!(
                    "line {}: expected {dim} values, found {}",
                    idx + 1,
                    values.len()
                )));
            }
            vectors.insert(word.to_string(), values);
        }
        Ok(Self { vectors, dim })
    }

    /// Build a table from word/vector pairs (test seam).
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<f32>)>,
        S: Into<String>,
    {
        let mut vectors = HashMap::new();
        let mut dim = 0;
        for (word, values) in pairs {
            if dim == 0 {
                dim = values.len();
            }
            if values.is_empty() || values.len() != dim {
                return Err(Error::embedding(format!(
                    "expected {dim}-dimensional vectors"
                )));
            }
            vectors.insert(word.into(), values);
        }
        Ok(Self { vectors, dim })
    }

    /// Vector for a word, if known.
    #[must_use]
    pub fn get(&self, word: &str) -> Option<&[f32]> {
        self.vectors.get(word).map(Vec::as_slice)
    }

    /// Vector dimension.
    #[must_use]
    pub const fn dim(&self) -> usize {
        self.dim
    }

    /// Number of words in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

/// Clean a document into lookup tokens.
#[must_use]
pub fn process_text(text: &str) -> Vec<String> {
    let cleaned = TICKER.replace_all(text, "");
    let cleaned = RETWEET.replace(&cleaned, "");
    let cleaned = URL.replace_all(&cleaned, "");
    let cleaned = HANDLE.replace_all(&cleaned, "");
    let cleaned = cleaned.replace('#', "");

    cleaned
        .to_lowercase()
        .split_whitespace()
        .map(|token| token.trim_matches(|c: char| c.is_ascii_punctuation()))
        .filter(|token| !token.is_empty() && !is_stopword(token))
        .map(str::to_string)
        .collect()
}

/// Sum the word vectors of a document's cleaned tokens.
///
/// Tokens without a vector contribute nothing; boilerplate words are skipped
/// outright. A document with no known words yields the zero vector.
#[must_use]
pub fn document_embedding(text: &str, embeddings: &WordEmbeddings) -> Vec<f32> {
    let mut doc = vec![0.0f32; embeddings.dim()];
    for word in process_text(text) {
        if BOILERPLATE.contains(&word.as_str()) {
            continue;
        }
        if let Some(vector) = embeddings.get(&word) {
            for (acc, v) in doc.iter_mut().zip(vector) {
                *acc += v;
            }
        }
    }
    doc
}

/// Cosine similarity of two vectors. `None` on length mismatch, empty
/// input, or a zero-magnitude side.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f64> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let x = f64::from(x);
        let y = f64::from(y);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }
    Some(dot / (norm_a.sqrt() * norm_b.sqrt()))
}

/// Indices of the `k` candidates most similar to `v`, descending; ties and
/// incomparable candidates resolve to the lower index.
#[must_use]
pub fn nearest_neighbors(v: &[f32], candidates: &[Vec<f32>], k: usize) -> Vec<usize> {
    let mut scored: Vec<(usize, f64)> = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| (i, cosine_similarity(v, c).unwrap_or(f64::NEG_INFINITY)))
        .collect();
    scored.sort_by(|(ia, sa), (ib, sb)| {
        sb.partial_cmp(sa)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(ia.cmp(ib))
    });
    scored.into_iter().take(k).map(|(i, _)| i).collect()
}
