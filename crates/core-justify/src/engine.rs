//! Line justification.
//!
//! Flow for one line:
//! 1. Surah-name and basmallah lines bypass the engine (neutral result).
//! 2. The whole line is measured at the layout font size; a line wider than
//!    the desired width is shrunk uniformly and never stretched.
//! 3. Otherwise spaces are widened up to their per-type bound, in proportion
//!    to the bounds.
//! 4. If a gap remains, the stretch schedule folds letter features into the
//!    line word by word, keeping only changes that alter the word width
//!    while the line stays narrower than the desired width.
//! 5. Whatever is still missing is spread evenly over all spaces.
//!
//! Space widths are reported in font design units so the renderer can derive
//! letter spacing at any final font size.

use core_config::JustifySettings;
use core_text::{CharOffsets, LineTextInfo, SpaceType, WordInfo, named_spans};
use tracing::{debug, trace};

use crate::features::{FeatureMap, FontFeature, slice_rebased};
use crate::measure::TextMeasurer;
use crate::rules::{Lookup, LookupContext, StretchRules};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineKind {
    #[default]
    Ayah,
    SurahName,
    Basmallah,
}

impl LineKind {
    /// Decorative lines are laid out as-is.
    pub fn bypasses_justification(self) -> bool {
        matches!(self, LineKind::SurahName | LineKind::Basmallah)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineLayoutContext {
    /// Desired line width as a fraction of the reference line width.
    pub desired_width_ratio: f64,
    /// Font size as a fraction of the reference line width.
    pub font_to_line_ratio: f64,
    pub kind: LineKind,
    pub centered: bool,
}

impl LineLayoutContext {
    pub fn ayah(desired_width_ratio: f64, font_to_line_ratio: f64) -> Self {
        Self {
            desired_width_ratio,
            font_to_line_ratio,
            kind: LineKind::Ayah,
            centered: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JustificationResult {
    /// Letter features keyed by char index in the line.
    pub features: FeatureMap,
    /// Width of a simple space in font design units.
    pub simple_space_width: f64,
    /// Width of a verse-boundary space in font design units.
    pub verse_space_width: f64,
    /// Uniform font scale; below 1 only for lines that had to shrink.
    pub font_size_ratio: f64,
}

impl JustificationResult {
    pub fn neutral(settings: &JustifySettings) -> Self {
        Self {
            features: FeatureMap::new(),
            simple_space_width: settings.space_width,
            verse_space_width: settings.space_width,
            font_size_ratio: 1.0,
        }
    }

    pub fn space_width(&self, kind: SpaceType) -> f64 {
        match kind {
            SpaceType::Simple => self.simple_space_width,
            SpaceType::VerseBoundary => self.verse_space_width,
        }
    }

    pub fn features_at(&self, index: usize) -> &[FontFeature] {
        self.features
            .get(&index)
            .map(|list| list.as_slice())
            .unwrap_or(&[])
    }
}

/// Stretch accumulator threaded through the schedule.
#[derive(Debug, Clone)]
pub(crate) struct StretchState {
    pub features: FeatureMap,
    pub line_width: f64,
    pub word_widths: Vec<f64>,
}

/// A proposed feature map for the whole line, differing from the committed
/// one only inside `word`.
#[derive(Debug)]
pub(crate) struct Candidate {
    pub word: usize,
    pub features: FeatureMap,
    pub width: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verdict {
    Accepted,
    /// Width did not change.
    Unchanged,
    /// Line would reach or exceed the desired width.
    Overshoot,
}

impl StretchState {
    /// Commit `candidate` if it changes the word width and the line stays
    /// strictly narrower than `desired`; otherwise return the state untouched.
    pub(crate) fn reduce(mut self, candidate: Candidate, desired: f64) -> (Self, Verdict) {
        let old = self.word_widths[candidate.word];
        if candidate.width == old {
            return (self, Verdict::Unchanged);
        }
        let line_width = self.line_width + candidate.width - old;
        if line_width >= desired {
            return (self, Verdict::Overshoot);
        }
        self.line_width = line_width;
        self.word_widths[candidate.word] = candidate.width;
        self.features = candidate.features;
        (self, Verdict::Accepted)
    }
}

pub struct Justifier<M> {
    measurer: M,
    settings: JustifySettings,
    rules: &'static StretchRules,
}

impl<M: TextMeasurer> Justifier<M> {
    pub fn new(measurer: M, settings: JustifySettings) -> Self {
        Self {
            measurer,
            settings,
            rules: StretchRules::standard(),
        }
    }

    pub fn settings(&self) -> &JustifySettings {
        &self.settings
    }

    pub fn measurer(&self) -> &M {
        &self.measurer
    }

    /// Font size used to measure a line laid out with `layout`.
    pub fn font_size(&self, layout: &LineLayoutContext) -> f64 {
        layout.font_to_line_ratio * self.settings.reference_line_width
    }

    /// Justify `line` (segmented as `info`) to the width requested by `layout`.
    pub fn justify(
        &self,
        info: &LineTextInfo,
        layout: &LineLayoutContext,
        line: &str,
    ) -> JustificationResult {
        let neutral = JustificationResult::neutral(&self.settings);
        if layout.kind.bypasses_justification() {
            return neutral;
        }

        let desired = layout.desired_width_ratio * self.settings.reference_line_width;
        let font_size = self.font_size(layout);
        let scale = font_size / self.settings.units_per_em;
        if !(desired.is_finite() && desired > 0.0 && scale.is_finite() && scale > 0.0) {
            debug!(target: "justify", desired, font_size, "degenerate_layout");
            return neutral;
        }

        let no_features = FeatureMap::new();
        let natural = self.measurer.measure(line, font_size, &no_features);
        if !natural.is_finite() || natural < 0.0 {
            debug!(target: "justify", natural, "degenerate_measure");
            return neutral;
        }

        let default_space = self.settings.space_width * scale;
        let word_widths: Vec<f64> = info
            .word_infos
            .iter()
            .map(|w| self.measurer.measure(&w.text, font_size, &no_features))
            .collect();
        debug!(
            target: "justify",
            natural,
            by_word = word_widths.iter().sum::<f64>() + default_space * info.space_count() as f64,
            desired,
            "line_measured"
        );

        if desired - natural <= 0.0 {
            let font_size_ratio = if natural > 0.0 { desired / natural } else { 1.0 };
            debug!(target: "justify", font_size_ratio, "line_shrunk");
            return JustificationResult {
                font_size_ratio,
                ..neutral
            };
        }

        // Proportional space widening up to the per-type bounds.
        let max_simple = default_space * self.settings.simple_space_stretch;
        let max_verse = default_space * self.settings.verse_space_stretch;
        let max_stretch = max_simple * info.simple_space_count() as f64
            + max_verse * info.verse_space_count() as f64;
        let stretch = (desired - natural).min(max_stretch);
        let ratio = if max_stretch > 0.0 { stretch / max_stretch } else { 0.0 };
        let space = self.settings.space_width;
        let mut simple = space * (1.0 + ratio * self.settings.simple_space_stretch);
        let mut verse = space * (1.0 + ratio * self.settings.verse_space_stretch);
        let mut line_width = natural + stretch;

        let mut features = FeatureMap::new();
        if desired > line_width {
            let state = StretchState {
                features,
                line_width,
                word_widths,
            };
            let state = self.stretch(info, font_size, desired, state);
            line_width = state.line_width;
            features = state.features;
        }

        // Spread the remainder evenly, in design units.
        let residual = desired - line_width;
        if residual > 0.0 && info.space_count() > 0 {
            let extra = residual / info.space_count() as f64 / scale;
            simple += extra;
            verse += extra;
        }

        debug!(
            target: "justify",
            features = features.len(),
            simple_space = simple,
            verse_space = verse,
            residual,
            "line_justified"
        );
        JustificationResult {
            features,
            simple_space_width: simple,
            verse_space_width: verse,
            font_size_ratio: 1.0,
        }
    }

    fn stretch(
        &self,
        info: &LineTextInfo,
        font_size: f64,
        desired: f64,
        mut state: StretchState,
    ) -> StretchState {
        let words: Vec<Vec<char>> = info
            .word_infos
            .iter()
            .map(|w| w.text.chars().collect())
            .collect();

        for (lookup, levels) in self.rules.passes() {
            for _ in 0..levels {
                for (index, word) in info.word_infos.iter().enumerate() {
                    let Some(features) = candidate_for(lookup, word, &words[index], &state.features)
                    else {
                        continue;
                    };
                    let word_features = slice_rebased(&features, word.char_range());
                    let width = self.measurer.measure(&word.text, font_size, &word_features);
                    let candidate = Candidate {
                        word: index,
                        features,
                        width,
                    };
                    let (next, verdict) = state.reduce(candidate, desired);
                    state = next;
                    trace!(
                        target: "justify.stretch",
                        lookup = lookup.name(),
                        word = index,
                        ?verdict,
                        line_width = state.line_width,
                        "stretch_candidate"
                    );
                }
            }
        }
        state
    }
}

/// Line feature map with `lookup` applied to `word`, or `None` when the
/// lookup does not apply or would not touch any character.
fn candidate_for(
    lookup: &Lookup,
    word: &WordInfo,
    chars: &[char],
    committed: &FeatureMap,
) -> Option<FeatureMap> {
    if word.is_empty() {
        return None;
    }
    let offsets = CharOffsets::new(&word.text);
    for regex in lookup.patterns() {
        let Some(caps) = regex.captures(&word.text) else {
            continue;
        };
        let spans = named_spans(regex, &caps, &offsets, 0);
        let ctx = LookupContext {
            word,
            chars,
            spans: &spans,
            committed,
        };
        if !lookup.accepts(&ctx) {
            continue;
        }
        if !lookup.admits(&ctx) {
            return None;
        }

        let mut features = committed.clone();
        let mut touched = false;
        for span in &spans {
            for &action in lookup.actions_for(span.name) {
                let list = features.entry(word.start_index + span.first()).or_default();
                action.apply(list, chars[span.first()]);
                touched = true;
            }
        }
        return touched.then_some(features);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureTag;
    use crate::measure::AdvanceTable;
    use core_text::segment;

    fn justifier() -> Justifier<AdvanceTable> {
        Justifier::new(AdvanceTable::uniform(250.0), JustifySettings::default())
    }

    fn layout(ratio: f64) -> LineLayoutContext {
        LineLayoutContext::ayah(ratio, 1.0 / 14.0)
    }

    #[test]
    fn reduce_rejects_overshoot_and_unchanged() {
        let state = StretchState {
            features: FeatureMap::new(),
            line_width: 90.0,
            word_widths: vec![40.0, 50.0],
        };
        let candidate = |width| Candidate {
            word: 0,
            features: FeatureMap::new(),
            width,
        };
        let (state, verdict) = state.reduce(candidate(40.0), 100.0);
        assert_eq!(verdict, Verdict::Unchanged);
        let (state, verdict) = state.reduce(candidate(51.0), 100.0);
        assert_eq!(verdict, Verdict::Overshoot);
        assert_eq!(state.line_width, 90.0);
        // landing exactly on the desired width is rejected too
        let (state, verdict) = state.reduce(candidate(50.0), 100.0);
        assert_eq!(verdict, Verdict::Overshoot);
        let (state, verdict) = state.reduce(candidate(49.5), 100.0);
        assert_eq!(verdict, Verdict::Accepted);
        assert_eq!(state.line_width, 99.5);
        assert_eq!(state.word_widths, vec![49.5, 50.0]);
    }

    #[test]
    fn small_gap_is_absorbed_by_spaces() {
        let j = justifier();
        let line = "الرحمن الرحيم";
        let info = segment(line);
        let scale = j.font_size(&layout(1.0)) / 1000.0;
        let natural = (12.0 * 250.0 + 100.0) * scale;
        // two units of gap; the single simple space may grow by 50 units
        let ratio = (natural + 2.0) / 2000.0;
        let result = j.justify(&info, &layout(ratio), line);
        assert!(result.features.is_empty());
        assert!((result.simple_space_width - (100.0 + 2.0 / scale)).abs() < 1e-9);
        assert_eq!(result.font_size_ratio, 1.0);
    }

    #[test]
    fn candidate_skips_vetoed_words() {
        let info = segment("الرحمن");
        let word = &info.word_infos[0];
        let chars: Vec<char> = word.text.chars().collect();
        let kashida = StretchRules::standard()
            .lookups()
            .iter()
            .find(|l| l.name() == "general_kashida")
            .expect("lookup exists");
        assert!(candidate_for(kashida, word, &chars, &FeatureMap::new()).is_none());
    }

    fn lookup(name: &str) -> &'static Lookup {
        StretchRules::standard()
            .lookups()
            .iter()
            .find(|l| l.name() == name)
            .expect("lookup exists")
    }

    #[test]
    fn beh_sequence_word_is_left_to_its_own_lookup() {
        // alef wasl, lam, sad shadda fatha, meem fatha, dal damma
        let info = segment("\u{0671}\u{0644}\u{0635}\u{0651}\u{064E}\u{0645}\u{064E}\u{062F}\u{064F}");
        let word = &info.word_infos[0];
        let chars: Vec<char> = word.text.chars().collect();
        let none = FeatureMap::new();
        assert!(candidate_for(lookup("final_ascendant"), word, &chars, &none).is_none());
        assert!(candidate_for(lookup("general_kashida"), word, &chars, &none).is_none());

        let features = candidate_for(lookup("beh_sequence"), word, &chars, &none).expect("applies");
        assert_eq!(features.keys().copied().collect::<Vec<_>>(), vec![2, 5]);
    }

    #[test]
    fn kashida_lookups_apply_without_beh_sequence() {
        // beh, alef, lam: no joining run before the beh
        let info = segment("\u{0628}\u{0627}\u{0644}");
        let word = &info.word_infos[0];
        let chars: Vec<char> = word.text.chars().collect();
        let none = FeatureMap::new();
        assert!(candidate_for(lookup("beh_sequence"), word, &chars, &none).is_none());
        let features =
            candidate_for(lookup("final_ascendant"), word, &chars, &none).expect("applies");
        assert_eq!(features.keys().copied().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn candidate_applies_decomposition_levels() {
        let info = segment("نحمده");
        let word = &info.word_infos[0];
        let chars: Vec<char> = word.text.chars().collect();
        let decomp = StretchRules::standard()
            .lookups()
            .iter()
            .find(|l| l.name() == "decomp_jeem_meem")
            .expect("lookup exists");
        let features = candidate_for(decomp, word, &chars, &FeatureMap::new()).expect("applies");
        assert_eq!(
            features[&1].as_slice(),
            &[
                FontFeature::new(FeatureTag::Cv18, 1),
                FontFeature::new(FeatureTag::Cv01, 1)
            ]
        );
        assert_eq!(
            features[&2].as_slice(),
            &[
                FontFeature::new(FeatureTag::Cv18, 1),
                FontFeature::new(FeatureTag::Cv02, 2)
            ]
        );
    }

    #[test]
    fn features_at_defaults_to_empty() {
        let result = JustificationResult::neutral(&JustifySettings::default());
        assert!(result.features_at(3).is_empty());
        assert_eq!(result.space_width(SpaceType::VerseBoundary), 100.0);
    }
}
