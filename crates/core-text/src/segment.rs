//! Line segmentation into words and classified spaces.
//!
//! Contract:
//! - Input: one rendering line (already assigned to its visual line upstream,
//!   no line breaks). Words are separated by single ASCII spaces.
//! - Output: `LineTextInfo` whose `word_infos` always holds
//!   `space_types.len() + 1` entries; leading, trailing or doubled spaces
//!   produce empty words.
//! - Indices are char (code point) indices into the line, never bytes.
//! - Total: every `&str` is accepted.

use std::collections::BTreeMap;
use std::ops::Range;

use crate::letters::{VERSE_END, is_arabic_indic_digit, is_base};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpaceType {
    Simple,
    /// Space next to a verse number or the verse-end sign.
    VerseBoundary,
}

/// One word of a line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WordInfo {
    /// First char index of the word in the line.
    pub start_index: usize,
    /// One past the last char index (half-open). See [`WordInfo::last_index`]
    /// for the inclusive end.
    pub end_index: usize,
    pub text: String,
    /// Base letters only; diacritics and signs are dropped.
    pub base_text: String,
}

impl WordInfo {
    fn starting_at(start_index: usize) -> Self {
        Self {
            start_index,
            end_index: start_index,
            ..Self::default()
        }
    }

    pub fn char_range(&self) -> Range<usize> {
        self.start_index..self.end_index
    }

    /// Char index of the last char of the word, `None` for an empty word.
    pub fn last_index(&self) -> Option<usize> {
        (!self.is_empty()).then(|| self.end_index - 1)
    }

    pub fn char_len(&self) -> usize {
        self.end_index - self.start_index
    }

    pub fn is_empty(&self) -> bool {
        self.start_index == self.end_index
    }

    pub fn base_len(&self) -> usize {
        self.base_text.chars().count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineTextInfo {
    pub word_infos: Vec<WordInfo>,
    /// Space classification keyed by the space's char index.
    pub space_types: BTreeMap<usize, SpaceType>,
}

impl LineTextInfo {
    pub fn space_count(&self) -> usize {
        self.space_types.len()
    }

    pub fn simple_space_count(&self) -> usize {
        self.count_of(SpaceType::Simple)
    }

    pub fn verse_space_count(&self) -> usize {
        self.count_of(SpaceType::VerseBoundary)
    }

    /// Type of the space that directly follows `word`, if any.
    pub fn space_after(&self, word: &WordInfo) -> Option<SpaceType> {
        self.space_types.get(&word.end_index).copied()
    }

    fn count_of(&self, kind: SpaceType) -> usize {
        self.space_types.values().filter(|t| **t == kind).count()
    }
}

fn classify_space(prev: Option<char>, next: Option<char>) -> SpaceType {
    if prev.is_some_and(is_arabic_indic_digit) || next == Some(VERSE_END) {
        SpaceType::VerseBoundary
    } else {
        SpaceType::Simple
    }
}

/// Split `line` into words and classify every space.
pub fn segment(line: &str) -> LineTextInfo {
    let chars: Vec<char> = line.chars().collect();
    let mut word_infos = Vec::new();
    let mut space_types = BTreeMap::new();
    let mut current = WordInfo::starting_at(0);

    for (i, &c) in chars.iter().enumerate() {
        if c == ' ' {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            space_types.insert(i, classify_space(prev, next));
            word_infos.push(std::mem::replace(&mut current, WordInfo::starting_at(i + 1)));
        } else {
            current.text.push(c);
            if is_base(c) {
                current.base_text.push(c);
            }
            current.end_index += 1;
        }
    }
    word_infos.push(current);

    LineTextInfo {
        word_infos,
        space_types,
    }
}
