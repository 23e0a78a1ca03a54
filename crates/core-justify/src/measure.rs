//! Width measurement seam.
//!
//! The engine never shapes glyphs itself. Every width it reasons about comes
//! from a `TextMeasurer`: the embedding application wires in its shaper, and
//! `AdvanceTable` provides a deterministic stand-in driven by per-character
//! advances and per-feature gains.

use std::collections::BTreeMap;

use core_text::letters::{is_base, is_mark};

use crate::features::{FeatureMap, FeatureTag};

pub trait TextMeasurer {
    /// Advance width of `text` set at `font_size`. `features` is keyed by char
    /// index into `text`.
    fn measure(&self, text: &str, font_size: f64, features: &FeatureMap) -> f64;
}

impl<T: TextMeasurer + ?Sized> TextMeasurer for &T {
    fn measure(&self, text: &str, font_size: f64, features: &FeatureMap) -> f64 {
        (**self).measure(text, font_size, features)
    }
}

/// Additive advance model in font design units.
///
/// A character's advance is its table entry (or the default for its class)
/// plus `gain(tag) * value` for every feature it carries. The sum is scaled by
/// `font_size / units_per_em`.
#[derive(Debug, Clone)]
pub struct AdvanceTable {
    units_per_em: f64,
    space: f64,
    letter: f64,
    other: f64,
    advances: BTreeMap<char, f64>,
    gains: BTreeMap<FeatureTag, f64>,
}

impl Default for AdvanceTable {
    fn default() -> Self {
        Self::uniform(250.0)
    }
}

impl AdvanceTable {
    /// Every base letter advances by `letter` units, marks by zero, the space
    /// by 100 units and anything else (digits, verse sign) by `letter`.
    pub fn uniform(letter: f64) -> Self {
        let gains = [
            (FeatureTag::Cv01, 40.0),
            (FeatureTag::Cv02, 40.0),
            (FeatureTag::Cv03, 20.0),
            (FeatureTag::Cv10, 10.0),
            (FeatureTag::Cv11, 15.0),
            (FeatureTag::Cv12, 15.0),
            (FeatureTag::Cv13, 15.0),
            (FeatureTag::Cv14, 15.0),
            (FeatureTag::Cv15, 15.0),
            (FeatureTag::Cv16, 15.0),
            (FeatureTag::Cv17, 15.0),
            (FeatureTag::Cv18, 15.0),
        ]
        .into_iter()
        .collect();
        Self {
            units_per_em: 1000.0,
            space: 100.0,
            letter,
            other: letter,
            advances: BTreeMap::new(),
            gains,
        }
    }

    pub fn with_units_per_em(mut self, units_per_em: f64) -> Self {
        self.units_per_em = units_per_em;
        self
    }

    pub fn with_space(mut self, units: f64) -> Self {
        self.space = units;
        self
    }

    pub fn with_advance(mut self, c: char, units: f64) -> Self {
        self.advances.insert(c, units);
        self
    }

    pub fn with_gain(mut self, tag: FeatureTag, units: f64) -> Self {
        self.gains.insert(tag, units);
        self
    }

    pub fn gain(&self, tag: FeatureTag) -> f64 {
        self.gains.get(&tag).copied().unwrap_or(0.0)
    }

    fn advance(&self, c: char) -> f64 {
        if let Some(&units) = self.advances.get(&c) {
            return units;
        }
        match c {
            ' ' => self.space,
            c if is_base(c) => self.letter,
            c if is_mark(c) => 0.0,
            _ => self.other,
        }
    }
}

impl TextMeasurer for AdvanceTable {
    fn measure(&self, text: &str, font_size: f64, features: &FeatureMap) -> f64 {
        let units: f64 = text
            .chars()
            .enumerate()
            .map(|(i, c)| {
                let stretch: f64 = features
                    .get(&i)
                    .map(|list| {
                        list.iter()
                            .map(|f| self.gain(f.tag) * f64::from(f.value))
                            .sum()
                    })
                    .unwrap_or(0.0);
                self.advance(c) + stretch
            })
            .sum();
        units * font_size / self.units_per_em
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FontFeature;
    use smallvec::smallvec;

    #[test]
    fn marks_are_zero_width() {
        let table = AdvanceTable::uniform(200.0);
        let plain = table.measure("بسم", 1000.0, &FeatureMap::new());
        let voweled = table.measure("بِسْمِ", 1000.0, &FeatureMap::new());
        assert_eq!(plain, 600.0);
        assert_eq!(voweled, plain);
    }

    #[test]
    fn features_add_scaled_gain() {
        let table = AdvanceTable::uniform(200.0);
        let mut features = FeatureMap::new();
        features.insert(1, smallvec![FontFeature::new(FeatureTag::Cv01, 2)]);
        // (3 * 200 + 2 * 40) * 500 / 1000
        assert_eq!(table.measure("بسم", 500.0, &features), 340.0);
    }

    #[test]
    fn space_and_overrides() {
        let table = AdvanceTable::uniform(200.0).with_advance('ا', 80.0);
        assert_eq!(table.measure("ا ب", 1000.0, &FeatureMap::new()), 380.0);
        assert_eq!(table.gain(FeatureTag::Basm), 0.0);
    }

    #[test]
    fn reference_impl_forwards() {
        let table = AdvanceTable::default();
        let by_ref: &dyn TextMeasurer = &table;
        assert_eq!(
            (&by_ref).measure("ب", 1000.0, &FeatureMap::new()),
            table.measure("ب", 1000.0, &FeatureMap::new())
        );
    }
}
