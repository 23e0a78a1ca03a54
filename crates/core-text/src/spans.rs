//! Byte/char index translation and named capture spans.
//!
//! Rule patterns run on UTF-8 `&str` and report byte offsets, while every
//! index the engine hands to callers is a char index. `CharOffsets` bridges
//! the two for one string; `named_spans` turns a regex match into the list of
//! participating named groups, in the order they are declared in the pattern.

use std::ops::Range;

use regex::{Captures, Regex};

/// Byte offset to char index table for one string.
#[derive(Debug, Clone)]
pub struct CharOffsets {
    /// Byte offset of every char boundary, including the end of the string.
    boundaries: Vec<usize>,
}

impl CharOffsets {
    pub fn new(text: &str) -> Self {
        let mut boundaries: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
        boundaries.push(text.len());
        Self { boundaries }
    }

    pub fn char_len(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Char index of a byte offset that lies on a char boundary. Offsets
    /// inside a char resolve to the char containing them.
    pub fn char_index(&self, byte: usize) -> usize {
        match self.boundaries.binary_search(&byte) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        }
    }

    /// Byte offset of a char index, clamped to the end of the string.
    pub fn byte_offset(&self, char_index: usize) -> usize {
        let last = self.boundaries.len() - 1;
        self.boundaries[char_index.min(last)]
    }

    pub fn char_range(&self, bytes: Range<usize>) -> Range<usize> {
        self.char_index(bytes.start)..self.char_index(bytes.end)
    }
}

/// A named group that took part in a match, as a char range of the haystack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedSpan<'r> {
    pub name: &'r str,
    pub range: Range<usize>,
}

impl NamedSpan<'_> {
    pub fn first(&self) -> usize {
        self.range.start
    }
}

/// Participating named groups of `caps` in declaration order. `base_byte` is
/// added to every offset for matches made on a suffix of the indexed string.
pub fn named_spans<'r>(
    regex: &'r Regex,
    caps: &Captures<'_>,
    offsets: &CharOffsets,
    base_byte: usize,
) -> Vec<NamedSpan<'r>> {
    regex
        .capture_names()
        .flatten()
        .filter_map(|name| {
            let m = caps.name(name)?;
            Some(NamedSpan {
                name,
                range: offsets.char_range(base_byte + m.start()..base_byte + m.end()),
            })
        })
        .collect()
}
