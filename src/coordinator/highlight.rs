//! Splitting the story around the spoken word

use super::params::WordRange;

/// Story text cut into the part before the spoken word, the word, and the rest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Highlight<'a> {
    pub before: &'a str,
    /// `None` when nothing is highlighted
    pub word: Option<&'a str>,
    pub after: &'a str,
}

impl<'a> Highlight<'a> {
    /// The whole text, unhighlighted
    pub fn plain(text: &'a str) -> Self {
        Self {
            before: text,
            word: None,
            after: "",
        }
    }

    /// Segments in display order, each tagged with whether it is highlighted
    pub fn segments(&self) -> Vec<(&'a str, bool)> {
        let mut segments = Vec::with_capacity(3);
        if !self.before.is_empty() {
            segments.push((self.before, false));
        }
        if let Some(word) = self.word {
            segments.push((word, true));
        }
        if !self.after.is_empty() {
            segments.push((self.after, false));
        }
        segments
    }
}

/// Largest char boundary not above `index`
fn floor_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Split `text` around `range`
///
/// The range may be stale (the text was edited after the word was
/// announced), so it is clamped to the text and snapped to char
/// boundaries. An empty range yields plain text.
pub fn split<'a>(text: &'a str, range: WordRange) -> Highlight<'a> {
    let start = floor_boundary(text, range.start);
    let end = floor_boundary(text, range.end.max(start));

    if start == end {
        return Highlight::plain(text);
    }

    Highlight {
        before: &text[..start],
        word: Some(&text[start..end]),
        after: &text[end..],
    }
}
