//! Document ingestion: text preparation and email extraction.

pub mod email;
pub mod preparer;

pub use email::{distinct_words, extract_mailbox_dir, extract_message_text};
pub use preparer::{NewlineStrip, PreparedText, TextPreparer};
