//! Fixed-size document chunking.
//!
//! The prediction collaborator caps request size, so document text is
//! submitted as contiguous char windows of at most [`DEFAULT_MAX_CHUNK_LEN`]
//! chars. Chunks fully partition the document; the last one may be shorter.

/// Default per-request char cap (external-service constraint).
pub const DEFAULT_MAX_CHUNK_LEN: usize = 9900;

/// A contiguous char window of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// Char offset of the chunk start within the document (`chars_read`).
    pub start: usize,
    /// Char offset one past the chunk's last char.
    pub end: usize,
    /// The chunk text.
    pub text: &'a str,
}

/// Iterate `text` in windows of at most `max_len` chars.
///
/// Empty text yields no chunks.
///
/// # Panics
///
/// Panics if `max_len` is zero.
#[must_use]
pub fn chunks(text: &str, max_len: usize) -> Chunks<'_> {
    assert!(max_len > 0, "chunk length must be positive");
    Chunks {
        remaining: text,
        char_pos: 0,
        max_len,
    }
}

/// Iterator returned by [`chunks`].
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    remaining: &'a str,
    char_pos: usize,
    max_len: usize,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Chunk<'a>> {
        if self.remaining.is_empty() {
            return None;
        }
        // Byte index of the (max_len+1)-th char, or the end of the text.
        let byte_end = self
            .remaining
            .char_indices()
            .nth(self.max_len)
            .map_or(self.remaining.len(), |(b, _)| b);
        let text = &self.remaining[..byte_end];
        let char_count = text.chars().count();
        let chunk = Chunk {
            start: self.char_pos,
            end: self.char_pos + char_count,
            text,
        };
        self.char_pos += char_count;
        self.remaining = &self.remaining[byte_end..];
        Some(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_of_20000_chars_makes_three_chunks() {
        let text = "x".repeat(20_000);
        let got: Vec<(usize, usize)> = chunks(&text, 9900).map(|c| (c.start, c.end)).collect();
        assert_eq!(got, vec![(0, 9900), (9900, 19_800), (19_800, 20_000)]);
    }

    #[test]
    fn short_document_is_a_single_chunk() {
        let got: Vec<_> = chunks("hello", 9900).collect();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].start, 0);
        assert_eq!(got[0].end, 5);
        assert_eq!(got[0].text, "hello");
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert_eq!(chunks("", 10).count(), 0);
    }

    #[test]
    fn windows_are_counted_in_chars_not_bytes() {
        // Each char is multi-byte; windows must still hold 2 chars.
        let text = "ééééé";
        let got: Vec<_> = chunks(text, 2).collect();
        assert_eq!(got.len(), 3);
        assert_eq!(got[0].text, "éé");
        assert_eq!(got[2].text, "é");
        assert_eq!(got[2].start, 4);
        assert_eq!(got[2].end, 5);
    }

    #[test]
    #[should_panic(expected = "chunk length must be positive")]
    fn zero_chunk_length_panics() {
        let _ = chunks("abc", 0);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn chunks_partition_the_document(text in "\\PC{0,500}", max_len in 1usize..64) {
            let reassembled: String = chunks(&text, max_len).map(|c| c.text).collect();
            prop_assert_eq!(&reassembled, &text);

            let mut expected_start = 0;
            for chunk in chunks(&text, max_len) {
                prop_assert_eq!(chunk.start, expected_start);
                prop_assert!(chunk.end - chunk.start <= max_len);
                prop_assert_eq!(chunk.end - chunk.start, chunk.text.chars().count());
                expected_start = chunk.end;
            }
            prop_assert_eq!(expected_start, text.chars().count());
        }

        #[test]
        fn only_the_last_chunk_may_be_short(text in "\\PC{1,300}", max_len in 1usize..32) {
            let all: Vec<_> = chunks(&text, max_len).collect();
            for chunk in &all[..all.len() - 1] {
                prop_assert_eq!(chunk.end - chunk.start, max_len);
            }
        }
    }
}
