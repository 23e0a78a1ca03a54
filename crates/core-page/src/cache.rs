//! Caller-owned cache of laid-out lines.
//!
//! Entries are keyed by `(page, line)` and carry a fingerprint of everything
//! the layout depends on: the line text and its layout context. A lookup
//! whose fingerprint differs from the stored one is a miss, so edited text
//! or a changed width override is recomputed without explicit invalidation.
//!
//! Hashing strategy: (len, ahash64) over the UTF-8 text followed by the
//! layout context fields (floats by bit pattern).

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use ahash::{AHashMap, AHasher};
use core_justify::LineLayoutContext;
use tracing::trace;

use crate::layout::LaidOutLine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineFingerprint {
    pub hash: u64,
    pub len: usize,
}

impl LineFingerprint {
    pub fn compute(text: &str, layout: &LineLayoutContext) -> Self {
        let mut hasher = AHasher::default();
        text.hash(&mut hasher);
        layout.desired_width_ratio.to_bits().hash(&mut hasher);
        layout.font_to_line_ratio.to_bits().hash(&mut hasher);
        layout.kind.hash(&mut hasher);
        layout.centered.hash(&mut hasher);
        Self {
            hash: hasher.finish(),
            len: text.len(),
        }
    }
}

#[derive(Debug)]
struct Entry {
    fingerprint: LineFingerprint,
    line: Arc<LaidOutLine>,
}

#[derive(Debug, Default)]
pub struct LineCache {
    entries: AHashMap<(u16, u16), Entry>,
    hits: u64,
    misses: u64,
}

impl LineCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached layout for `(page, line)` if it was computed from the same
    /// fingerprint. Counts a hit or a miss.
    pub fn get(
        &mut self,
        page: u16,
        line: u16,
        fingerprint: LineFingerprint,
    ) -> Option<Arc<LaidOutLine>> {
        match self.entries.get(&(page, line)) {
            Some(entry) if entry.fingerprint == fingerprint => {
                self.hits += 1;
                trace!(target: "page.cache", page, line, "cache_hit");
                Some(entry.line.clone())
            }
            stale => {
                self.misses += 1;
                trace!(target: "page.cache", page, line, stale = stale.is_some(), "cache_miss");
                None
            }
        }
    }

    pub fn insert(
        &mut self,
        page: u16,
        line: u16,
        fingerprint: LineFingerprint,
        laid_out: Arc<LaidOutLine>,
    ) {
        self.entries.insert(
            (page, line),
            Entry {
                fingerprint,
                line: laid_out,
            },
        );
    }

    pub fn invalidate(&mut self, page: u16, line: u16) -> bool {
        self.entries.remove(&(page, line)).is_some()
    }

    /// Drop every line of `page`; returns how many entries were removed.
    pub fn invalidate_page(&mut self, page: u16) -> usize {
        let before = self.entries.len();
        self.entries.retain(|&(p, _), _| p != page);
        before - self.entries.len()
    }

    /// Fully clear entries and counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
