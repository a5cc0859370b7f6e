//! Extracted sentence frames

use std::fmt;

/// One complete sentence lifted out of the byte stream.
///
/// Holds the text between the leading `$` and the line terminator, e.g.
/// `WIMDA,29.92,I,...`. Frames are produced by the extractor and consumed
/// once by the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    text: String,
}

impl Frame {
    /// Create a frame from sentence text (without `$` and terminator)
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Raw sentence text
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Sentence tag, everything before the first comma
    pub fn tag(&self) -> &str {
        self.text.split(',').next().unwrap_or_default()
    }

    /// Comma-separated fields following the tag
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.text.split(',').skip(1)
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
