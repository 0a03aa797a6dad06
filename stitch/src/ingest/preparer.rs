//! Text preparation before submission or scanning.
//!
//! Two rewrites, both optional: prepend the filename as a header line, and
//! strip newlines (the alternative to offset correction — see
//! [`crate::offset`]). Rewritten text is persisted by callers as a sibling
//! `<stem>_modified.<ext>` file so the manifest can reference what was
//! actually submitted.

/// What to do with newline chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NewlineStrip {
    /// Leave the text alone.
    #[default]
    Keep,
    /// Delete newlines outright (directory-scan flow).
    Remove,
    /// Replace each newline with a space (prediction flow; keeps offsets of
    /// following text stable relative to char count).
    Space,
}

/// Prepared text plus whether preparation changed anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedText {
    /// The (possibly rewritten) text.
    pub text: String,
    /// True when the output differs from the input.
    pub changed: bool,
}

/// Options-struct preparer, applied header-first so a stripped run also
/// strips the header's own newline.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextPreparer {
    /// Prepend `{filename}\n` before anything else.
    pub add_header: bool,
    /// Newline strategy.
    pub newline: NewlineStrip,
}

impl TextPreparer {
    /// Preparer that changes nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepare `text`, using `filename` for the optional header line.
    #[must_use]
    pub fn prepare(&self, text: &str, filename: &str) -> PreparedText {
        let mut prepared = if self.add_header {
            format!("{filename}\n{text}")
        } else {
            text.to_string()
        };
        prepared = match self.newline {
            NewlineStrip::Keep => prepared,
            NewlineStrip::Remove => prepared.replace('\n', ""),
            NewlineStrip::Space => prepared.replace('\n', " "),
        };
        let changed = prepared != text;
        PreparedText {
            text: prepared,
            changed,
        }
    }
}
