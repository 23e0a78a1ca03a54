//! OpenType feature values attached to individual characters.
//!
//! The mushaf font exposes its stretching machinery through character
//! variant features: `cv01`/`cv02` widen the joining stroke before/after a
//! letter, `cv03` swaps the kaf form, `cv10` tightens beh teeth and
//! `cv11`..`cv18` decompose specific letter pairs. A character carries at
//! most a handful of them, hence the inline `SmallVec`.

use std::collections::BTreeMap;
use std::fmt;

use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureTag {
    Cv01,
    Cv02,
    Cv03,
    Cv10,
    Cv11,
    Cv12,
    Cv13,
    Cv14,
    Cv15,
    Cv16,
    Cv17,
    Cv18,
    /// Whole-line basmallah ligature set.
    Basm,
}

impl FeatureTag {
    pub const ALL: [FeatureTag; 13] = [
        FeatureTag::Cv01,
        FeatureTag::Cv02,
        FeatureTag::Cv03,
        FeatureTag::Cv10,
        FeatureTag::Cv11,
        FeatureTag::Cv12,
        FeatureTag::Cv13,
        FeatureTag::Cv14,
        FeatureTag::Cv15,
        FeatureTag::Cv16,
        FeatureTag::Cv17,
        FeatureTag::Cv18,
        FeatureTag::Basm,
    ];

    /// Four-letter OpenType tag.
    pub const fn as_str(self) -> &'static str {
        match self {
            FeatureTag::Cv01 => "cv01",
            FeatureTag::Cv02 => "cv02",
            FeatureTag::Cv03 => "cv03",
            FeatureTag::Cv10 => "cv10",
            FeatureTag::Cv11 => "cv11",
            FeatureTag::Cv12 => "cv12",
            FeatureTag::Cv13 => "cv13",
            FeatureTag::Cv14 => "cv14",
            FeatureTag::Cv15 => "cv15",
            FeatureTag::Cv16 => "cv16",
            FeatureTag::Cv17 => "cv17",
            FeatureTag::Cv18 => "cv18",
            FeatureTag::Basm => "basm",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == tag)
    }
}

impl fmt::Display for FeatureTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontFeature {
    pub tag: FeatureTag,
    pub value: u16,
}

impl FontFeature {
    pub const fn new(tag: FeatureTag, value: u16) -> Self {
        Self { tag, value }
    }
}

/// Features of one character, in first-application order.
pub type FeatureList = SmallVec<[FontFeature; 4]>;

/// Features keyed by char index. Line-level maps use line indices; maps
/// handed to a measurer for a single word use indices into that word.
pub type FeatureMap = BTreeMap<usize, FeatureList>;

/// How a newly applied value combines with the value already present for the
/// same tag. `prev` is `None` when the tag is not yet set on the character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    Replace,
    Sum,
    /// Sum capped at the given maximum.
    ClampedSum(u16),
    /// `prev + weight * curr`.
    Weighted(u16),
    /// Ignore both operands.
    Fixed(u16),
    /// Lengthening on a fatha-bearing final: grows fast at first, then
    /// converges (1, 2, 3, 3, ...).
    FathaBlend,
}

impl Reducer {
    pub fn reduce(self, prev: Option<u16>, curr: u16) -> u16 {
        match self {
            Reducer::Replace => curr,
            Reducer::Sum => prev.unwrap_or(0).saturating_add(curr),
            Reducer::ClampedSum(max) => prev.unwrap_or(0).saturating_add(curr).min(max),
            Reducer::Weighted(weight) => prev
                .unwrap_or(0)
                .saturating_add(weight.saturating_mul(curr)),
            Reducer::Fixed(value) => value,
            Reducer::FathaBlend => match prev {
                None | Some(0) => 1 + curr / 3,
                Some(p) => {
                    let blended = (f64::from(p) * 2.5 + f64::from(curr)) / 3.0;
                    1 + blended.floor() as u16
                }
            },
        }
    }
}

pub fn value_of(list: &[FontFeature], tag: FeatureTag) -> Option<u16> {
    list.iter().find(|f| f.tag == tag).map(|f| f.value)
}

/// Fold `value` for `tag` into `list` with `reducer`. New tags are appended.
pub fn merge(list: &mut FeatureList, tag: FeatureTag, value: u16, reducer: Reducer) {
    match list.iter_mut().find(|f| f.tag == tag) {
        Some(existing) => existing.value = reducer.reduce(Some(existing.value), value),
        None => list.push(FontFeature::new(tag, reducer.reduce(None, value))),
    }
}

/// Features of `range` rebased so the first index of the range becomes 0.
pub fn slice_rebased(map: &FeatureMap, range: std::ops::Range<usize>) -> FeatureMap {
    let start = range.start;
    map.range(range)
        .map(|(&index, list)| (index - start, list.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use smallvec::smallvec;

    #[test]
    fn clamped_sum_saturates_at_six() {
        let mut value = None;
        for _ in 0..10 {
            value = Some(Reducer::ClampedSum(6).reduce(value, 1));
        }
        assert_eq!(value, Some(6));
    }

    #[test]
    fn weighted_adds_twice_the_level() {
        assert_eq!(Reducer::Weighted(2).reduce(None, 1), 2);
        assert_eq!(Reducer::Weighted(2).reduce(Some(2), 1), 4);
    }

    #[test]
    fn fatha_blend_converges() {
        let mut seq = Vec::new();
        let mut prev = None;
        for _ in 0..5 {
            let next = Reducer::FathaBlend.reduce(prev, 1);
            seq.push(next);
            prev = Some(next);
        }
        assert_eq!(seq, vec![1, 2, 3, 3, 3]);
    }

    #[test]
    fn merge_appends_then_reduces() {
        let mut list: FeatureList = smallvec![];
        merge(&mut list, FeatureTag::Cv01, 1, Reducer::Sum);
        merge(&mut list, FeatureTag::Cv10, 1, Reducer::Replace);
        merge(&mut list, FeatureTag::Cv01, 1, Reducer::Sum);
        assert_eq!(
            list.as_slice(),
            &[
                FontFeature::new(FeatureTag::Cv01, 2),
                FontFeature::new(FeatureTag::Cv10, 1)
            ]
        );
        assert_eq!(value_of(&list, FeatureTag::Cv02), None);
    }

    #[test]
    fn slice_rebases_indices() {
        let mut map = FeatureMap::new();
        map.insert(3, smallvec![FontFeature::new(FeatureTag::Cv01, 1)]);
        map.insert(9, smallvec![FontFeature::new(FeatureTag::Cv02, 2)]);
        let word = slice_rebased(&map, 2..6);
        assert_eq!(word.keys().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn tags_round_trip_through_text() {
        for tag in FeatureTag::ALL {
            assert_eq!(FeatureTag::from_tag(tag.as_str()), Some(tag));
        }
        assert_eq!(FeatureTag::from_tag("liga"), None);
    }
}
