//! Word segmentation for read-along playback

use once_cell::sync::Lazy;
use regex::Regex;

/// Anything between whitespace counts as a word, punctuation included,
/// so that danda (।) and quotes stay attached to the word they follow.
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+").expect("word pattern is valid"));

/// Byte span of one word inside a text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordSpan {
    pub offset: usize,
    pub length: usize,
}

impl WordSpan {
    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    /// The word itself
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.offset..self.end()]
    }
}

/// Split text into words in reading order
pub fn words(text: &str) -> Vec<WordSpan> {
    WORD.find_iter(text)
        .map(|m| WordSpan {
            offset: m.start(),
            length: m.len(),
        })
        .collect()
}
