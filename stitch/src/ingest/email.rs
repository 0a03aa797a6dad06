//! Plain-text extraction from RFC822 email archives.
//!
//! Feeds the embedding side of the pipeline: each message is reduced to its
//! distinct alphabetic words (word *presence* is all a summed word-vector
//! embedding can see), one output file per message.

use std::collections::HashSet;
use std::fs;
use std::io::Cursor;
use std::path::Path;

use mail_parser::MessageParser;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[a-zA-Z']+\b").expect("valid regex"));

/// Width for HTML-to-text rendering.
const HTML_RENDER_WIDTH: usize = 80;

/// Extract the readable text of one raw RFC822 message.
///
/// Concatenates every `text/plain` part, then every `text/html` part run
/// through an HTML-to-text rendering. Returns `None` for input that does not
/// parse as an email carrying headers.
#[must_use]
pub fn extract_message_text(raw: &[u8]) -> Option<String> {
    let message = MessageParser::default().parse(raw)?;
    // Headerless "messages" are junk files the parser was merely polite to.
    if message.subject().is_none() && message.from().is_none() && message.to().is_none() {
        return None;
    }

    let mut text = String::new();
    let mut idx = 0;
    while let Some(part) = message.body_text(idx) {
        text.push_str(&part);
        text.push('\n');
        idx += 1;
    }
    idx = 0;
    while let Some(html) = message.body_html(idx) {
        // html2text expects bytes; fall back to the raw markup on render
        // failure rather than dropping the part.
        let rendered = html2text::from_read(Cursor::new(html.as_bytes()), HTML_RENDER_WIDTH)
            .unwrap_or_else(|_| html.to_string());
        text.push_str(&rendered);
        text.push('\n');
        idx += 1;
    }
    Some(text)
}

/// Reduce text to its distinct alphabetic words, space-joined in
/// first-occurrence order.
#[must_use]
pub fn distinct_words(text: &str) -> String {
    let mut seen = HashSet::new();
    let mut words = Vec::new();
    for m in WORD.find_iter(text) {
        if seen.insert(m.as_str()) {
            words.push(m.as_str());
        }
    }
    words.join(" ")
}

/// Walk `input_dir` recursively, extract words from every parseable email,
/// and write one `<index>.txt` per non-empty result into `output_dir`.
///
/// Returns the number of files written. Unparseable files are skipped, not
/// fatal — mail archives are full of junk.
pub fn extract_mailbox_dir(input_dir: &Path, output_dir: &Path) -> Result<usize> {
    fs::create_dir_all(output_dir)?;
    let pattern = format!("{}/**/*", input_dir.display());
    let mut paths: Vec<_> = glob::glob(&pattern)
        .map_err(|e| Error::email(e.to_string()))?
        .filter_map(std::result::Result::ok)
        .filter(|p| p.is_file())
        .collect();
    paths.sort();

    let mut index = 0;
    for path in paths {
        let raw = fs::read(&path)?;
        let Some(text) = extract_message_text(&raw) else {
            log::warn!("{}: not a parseable email, skipping", path.display());
            continue;
        };
        let words = distinct_words(&text);
        if words.is_empty() {
            continue;
        }
        fs::write(output_dir.join(format!("{index}.txt")), words)?;
        index += 1;
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAIN_EMAIL: &str = "From: alice@example.com\r\n\
        To: bob@example.com\r\n\
        Subject: lunch\r\n\
        Content-Type: text/plain\r\n\
        \r\n\
        see you at noon, noon sharp\r\n";

    const HTML_EMAIL: &str = "From: carol@example.com\r\n\
        To: bob@example.com\r\n\
        Subject: news\r\n\
        Content-Type: text/html\r\n\
        \r\n\
        <html><body><p>quarterly report attached</p></body></html>\r\n";

    #[test]
    fn plain_part_text_is_extracted() {
        let text = extract_message_text(PLAIN_EMAIL.as_bytes()).unwrap();
        assert!(text.contains("see you at noon"));
    }

    #[test]
    fn html_part_is_rendered_without_tags() {
        let text = extract_message_text(HTML_EMAIL.as_bytes()).unwrap();
        assert!(text.contains("quarterly report attached"));
        assert!(!text.contains("<p>"));
    }

    #[test]
    fn distinct_words_keeps_first_occurrence_order() {
        assert_eq!(
            distinct_words("see you at noon, noon sharp 123"),
            "see you at noon sharp"
        );
    }

    #[test]
    fn distinct_words_keeps_apostrophes() {
        assert_eq!(distinct_words("don't don't stop"), "don't stop");
    }

    #[test]
    fn mailbox_dir_writes_indexed_outputs() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        fs::write(input.path().join("a.eml"), PLAIN_EMAIL).unwrap();
        fs::write(input.path().join("b.eml"), HTML_EMAIL).unwrap();
        fs::write(input.path().join("junk.bin"), b"\x00\x01\x02").unwrap();

        let written = extract_mailbox_dir(input.path(), output.path()).unwrap();
        assert_eq!(written, 2);
        assert!(output.path().join("0.txt").exists());
        assert!(output.path().join("1.txt").exists());
        assert!(!output.path().join("2.txt").exists());
    }
}
