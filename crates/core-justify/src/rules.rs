//! Contextual stretch rules and the pass schedule.
//!
//! A `Lookup` is an ordered list of whole-word patterns plus actions keyed by
//! named group. For a word, the first pattern that matches and satisfies the
//! lookup's matching filter is used; its participating groups are visited in
//! declaration order and every action registered for a group folds a feature
//! into the character at the group's first index. A lookup may additionally
//! carry a veto that drops the word altogether once a pattern was chosen.
//!
//! The schedule replays lookups in a fixed sequence. Later passes only see
//! the width budget that earlier passes left, so the sequence is part of the
//! visual result and must not be reordered.

use std::sync::LazyLock;

use regex::Regex;
use smallvec::{SmallVec, smallvec};

use core_text::letters::{
    DUAL_JOINING, FINAL_ALTERNATES, RIGHT_JOINING, is_beh_shaped, is_last_base,
};
use core_text::{NamedSpan, WordInfo};

use crate::features::{FeatureList, FeatureMap, FeatureTag, Reducer, merge, value_of};

/// Letters that can carry a kashida towards the next letter.
const KASHIDA_START: &str = "بتثنيئجحخسشصضطظعغفقلمه";
/// Letters that accept an incoming kashida.
const KASHIDA_END: &str = "ئبتثنيجحخطظعغفقةلمر";

/// Value every action contributes per application.
const STEP: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// `cv01` clamped at 6, plus `cv10` on beh-shaped letters.
    Kashida,
    Feature { tag: FeatureTag, reducer: Reducer },
}

impl Action {
    const fn feature(tag: FeatureTag, reducer: Reducer) -> Self {
        Action::Feature { tag, reducer }
    }

    pub fn apply(self, list: &mut FeatureList, letter: char) {
        match self {
            Action::Kashida => {
                merge(list, FeatureTag::Cv01, STEP, Reducer::ClampedSum(6));
                if is_beh_shaped(letter) {
                    merge(list, FeatureTag::Cv10, 1, Reducer::Replace);
                }
            }
            Action::Feature { tag, reducer } => merge(list, tag, STEP, reducer),
        }
    }
}

/// What a filter sees about the word being stretched.
pub struct LookupContext<'a> {
    pub word: &'a WordInfo,
    /// Chars of `word.text`; span indices point into this slice.
    pub chars: &'a [char],
    pub spans: &'a [NamedSpan<'a>],
    /// Committed line features (line indices).
    pub committed: &'a FeatureMap,
}

impl LookupContext<'_> {
    fn span(&self, name: &str) -> Option<&NamedSpan<'_>> {
        self.spans.iter().find(|s| s.name == name)
    }

    fn letter(&self, span: &NamedSpan<'_>) -> char {
        self.chars[span.first()]
    }
}

type Filter = fn(&LookupContext<'_>) -> bool;

pub struct Lookup {
    name: &'static str,
    patterns: Vec<Regex>,
    actions: Vec<(&'static str, SmallVec<[Action; 2]>)>,
    matching: Option<Filter>,
    veto: Option<Filter>,
}

impl Lookup {
    fn new(name: &'static str, patterns: &[String]) -> Self {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(p).expect("stretch pattern compiles"))
            .collect();
        Self {
            name,
            patterns,
            actions: Vec::new(),
            matching: None,
            veto: None,
        }
    }

    fn on(mut self, group: &'static str, actions: SmallVec<[Action; 2]>) -> Self {
        self.actions.push((group, actions));
        self
    }

    fn matching(mut self, filter: Filter) -> Self {
        self.matching = Some(filter);
        self
    }

    fn veto(mut self, filter: Filter) -> Self {
        self.veto = Some(filter);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn patterns(&self) -> &[Regex] {
        &self.patterns
    }

    pub fn actions_for(&self, group: &str) -> &[Action] {
        self.actions
            .iter()
            .find(|(g, _)| *g == group)
            .map(|(_, a)| a.as_slice())
            .unwrap_or(&[])
    }

    /// Whether the chosen pattern may be used for this word; `false` moves on
    /// to the next pattern.
    pub fn accepts(&self, ctx: &LookupContext<'_>) -> bool {
        self.matching.is_none_or(|f| f(ctx))
    }

    /// Whether the word stays eligible after a pattern was chosen; `false`
    /// abandons the lookup for the word.
    pub fn admits(&self, ctx: &LookupContext<'_>) -> bool {
        self.veto.is_none_or(|f| f(ctx))
    }
}

impl std::fmt::Debug for Lookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lookup")
            .field("name", &self.name)
            .field("patterns", &self.patterns.len())
            .finish()
    }
}

/// One entry of the schedule: run `lookup` over every word `levels` times.
#[derive(Debug, Clone, Copy)]
pub struct Pass {
    pub lookup: usize,
    pub levels: u8,
}

#[derive(Debug)]
pub struct StretchRules {
    lookups: Vec<Lookup>,
    passes: Vec<Pass>,
}

static STANDARD: LazyLock<StretchRules> = LazyLock::new(StretchRules::build);

impl StretchRules {
    pub fn standard() -> &'static StretchRules {
        &STANDARD
    }

    pub fn lookups(&self) -> &[Lookup] {
        &self.lookups
    }

    /// Schedule entries resolved to their lookups, in execution order.
    pub fn passes(&self) -> impl Iterator<Item = (&Lookup, u8)> + '_ {
        self.passes
            .iter()
            .map(|p| (&self.lookups[p.lookup], p.levels))
    }

    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    fn build() -> Self {
        let mut lookups = Vec::new();
        let mut add = |lookup: Lookup| {
            lookups.push(lookup);
            lookups.len() - 1
        };

        let beh = add(beh_sequence());
        let final_asc = add(final_ascendant());
        let kashida = add(general_kashida());
        let kaf = add(kaf_alternate());
        let alt_beh_kaf = add(alternates("alternates_beh_kaf", "بتثكن"));
        let alt_final = add(alternates("alternates_final", "ىصضسشفقيئ"));
        let decomp: Vec<usize> = [
            ("decomp_jeem_heh", "جحخ", "هكلذداة", FeatureTag::Cv16, 2, 4),
            ("decomp_heh_meem", "ه", "م", FeatureTag::Cv11, 1, 2),
            ("decomp_beh_jeem", "بتثني", "جحخ", FeatureTag::Cv12, 1, 2),
            ("decomp_meem_jeem", "م", "جحخ", FeatureTag::Cv13, 1, 2),
            ("decomp_feh_jeem", "فق", "جحخ", FeatureTag::Cv14, 1, 2),
            ("decomp_lam_jeem", "ل", "جحخ", FeatureTag::Cv15, 1, 2),
            ("decomp_seen_reh", "سشصض", "ر", FeatureTag::Cv17, 1, 2),
            ("decomp_jeem_meem", "جحخ", "م", FeatureTag::Cv18, 1, 2),
            ("decomp_ain_dal", "عغ", "دذا", FeatureTag::Cv16, 1, 1),
        ]
        .into_iter()
        .map(|(name, first, second, tag, l1, l2)| add(decomposition(name, first, second, tag, l1, l2)))
        .collect();

        let pass = |lookup: usize, levels: u8| Pass { lookup, levels };
        let mut passes = vec![
            pass(beh, 2),
            pass(alt_beh_kaf, 2),
            pass(final_asc, 2),
            pass(kashida, 1),
        ];
        passes.extend(decomp.iter().map(|&d| pass(d, 1)));
        passes.extend([
            pass(alt_final, 2),
            pass(kaf, 1),
            pass(beh, 1),
            pass(alt_beh_kaf, 1),
            pass(final_asc, 1),
            pass(kashida, 1),
            pass(alt_final, 1),
            pass(beh, 2),
            pass(alt_beh_kaf, 2),
            pass(alt_final, 2),
            pass(kashida, 2),
        ]);

        Self { lookups, passes }
    }
}

/// Beh-like letter followed by beh/meem inside a word, with letters on both sides.
fn beh_sequence_pattern() -> String {
    format!(
        r"^.*(?:[{DUAL_JOINING}]\p{{Mn}}*)+(?<k1>[بتثنيسشصض])\p{{Mn}}*(?<k2>[بتثنيم])\p{{Mn}}*(?:\p{{L}}\p{{Mn}}*)+$"
    )
}

/// Letter pairs ending on a tall letter (alef family, or kaf/lam/heh before
/// a non-joining letter).
fn final_ascendant_patterns() -> [String; 2] {
    [
        format!(r"^.*(?<k3>[{KASHIDA_START}])\p{{Mn}}*(?<k4>[آادذٱأإ]).*$"),
        format!(r"^.*(?<k3>[{KASHIDA_START}])\p{{Mn}}*(?<k4>[كله])\p{{Mn}}[{RIGHT_JOINING}].*$"),
    ]
}

fn beh_sequence() -> Lookup {
    Lookup::new("beh_sequence", &[beh_sequence_pattern()])
        .on("k1", smallvec![Action::Kashida])
        .on("k2", smallvec![Action::feature(FeatureTag::Cv02, Reducer::Weighted(2))])
}

/// The kashida lookups try the beh-sequence pattern first. A word it matches
/// is claimed by the beh-sequence lookup: the match carries no `k3`..`k5`
/// span, so the lookup stops there without touching the word.
fn final_ascendant() -> Lookup {
    let [first, second] = final_ascendant_patterns();
    Lookup::new("final_ascendant", &[beh_sequence_pattern(), first, second])
        .matching(kashida_context)
        .on("k3", smallvec![Action::Kashida])
        .on("k4", smallvec![Action::feature(FeatureTag::Cv02, Reducer::ClampedSum(6))])
}

fn general_kashida() -> Lookup {
    let [first, second] = final_ascendant_patterns();
    let patterns = [
        beh_sequence_pattern(),
        first,
        second,
        format!(r"^.*(?<k3>[{KASHIDA_START}])\p{{Mn}}*(?<k5>[ل]).*$"),
        format!(r"^.*(?<k3>[{KASHIDA_START}])\p{{Mn}}*(?<k5>[{KASHIDA_END}]).*$"),
    ];
    Lookup::new("general_kashida", &patterns)
        .matching(kashida_context)
        .veto(no_final_alternate_target)
        .on("k3", smallvec![Action::Kashida])
        .on("k4", smallvec![Action::feature(FeatureTag::Cv02, Reducer::ClampedSum(6))])
        .on("k5", smallvec![Action::feature(FeatureTag::Cv02, Reducer::Weighted(2))])
}

fn kaf_alternate() -> Lookup {
    let fixed = Action::feature(FeatureTag::Cv03, Reducer::Fixed(1));
    Lookup::new("kaf_alternate", &[r"^.*(?<k1>[ك])\p{Mn}*(?<k2>\p{L}).*$".to_string()])
        .on("k1", smallvec![fixed])
        .on("k2", smallvec![fixed])
}

/// Final letter from `letters`, optionally followed by a fatha among its marks.
fn alternates(name: &'static str, letters: &str) -> Lookup {
    let pattern =
        format!(r"^.*(?<expa>[{letters}])(?:\p{{Mn}}*(?<fatha>\x{{064E}})\p{{Mn}}*|\p{{Mn}}*)$");
    Lookup::new(name, &[pattern])
        .on("expa", smallvec![Action::feature(FeatureTag::Cv01, Reducer::Sum)])
        .on("fatha", smallvec![Action::feature(FeatureTag::Cv01, Reducer::FathaBlend)])
}

fn decomposition(
    name: &'static str,
    first: &str,
    second: &str,
    tag: FeatureTag,
    first_level: u16,
    second_level: u16,
) -> Lookup {
    let pattern = format!(r"^.*(?<k1>[{first}])\p{{Mn}}*(?<k2>[{second}]).*$");
    let pair = Action::feature(tag, Reducer::Fixed(1));
    Lookup::new(name, &[pattern])
        .on(
            "k1",
            smallvec![pair, Action::feature(FeatureTag::Cv01, Reducer::Fixed(first_level))],
        )
        .on(
            "k2",
            smallvec![pair, Action::feature(FeatureTag::Cv02, Reducer::Fixed(second_level))],
        )
}

/// Filters shared by the kashida lookups.
///
/// Two-letter words are left alone except `سش`. Lam never stretches into
/// kaf/dal/thal. The jeem family and ain/ghain only stretch into a tall or
/// closing letter once they were decomposed with `cv16`.
fn kashida_context(ctx: &LookupContext<'_>) -> bool {
    if ctx.word.base_len() == 2 && ctx.word.base_text != "سش" {
        return false;
    }
    let (Some(k3), Some(k4)) = (ctx.span("k3"), ctx.span("k4").or_else(|| ctx.span("k5")))
    else {
        return true;
    };
    let first = ctx.letter(k3);
    let second = ctx.letter(k4);
    if first == 'ل' && matches!(second, 'ك' | 'د' | 'ذ') {
        return false;
    }
    if "عغجحخ".contains(first) {
        let decomposed = ctx
            .committed
            .get(&(ctx.word.start_index + k3.first()))
            .and_then(|list| value_of(list, FeatureTag::Cv16))
            .is_some();
        let closing = "كلذداة".contains(second)
            || (second == 'ه' && is_last_base(ctx.chars, k4.first()));
        if !decomposed && closing {
            return false;
        }
    }
    true
}

/// A final-form alternate at the word end already provides the extension.
fn no_final_alternate_target(ctx: &LookupContext<'_>) -> bool {
    match ctx.span("k5") {
        Some(k5) => {
            let letter = ctx.letter(k5);
            !(FINAL_ALTERNATES.contains(letter) && is_last_base(ctx.chars, k5.first()))
        }
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_text::{CharOffsets, named_spans, segment};
    use pretty_assertions::assert_eq;

    fn spans_of<'r>(regex: &'r Regex, text: &str) -> Vec<(&'r str, usize)> {
        let caps = regex.captures(text).expect("pattern matches");
        named_spans(regex, &caps, &CharOffsets::new(text), 0)
            .into_iter()
            .map(|s| (s.name, s.first()))
            .collect()
    }

    fn lookup(name: &str) -> &'static Lookup {
        StretchRules::standard()
            .lookups()
            .iter()
            .find(|l| l.name() == name)
            .expect("lookup exists")
    }

    #[test]
    fn schedule_has_twenty_four_passes_in_order() {
        let rules = StretchRules::standard();
        assert_eq!(rules.pass_count(), 24);
        let names: Vec<(&str, u8)> = rules.passes().map(|(l, n)| (l.name(), n)).collect();
        assert_eq!(names[0], ("beh_sequence", 2));
        assert_eq!(names[4], ("decomp_jeem_heh", 1));
        assert_eq!(names[12], ("decomp_ain_dal", 1));
        assert_eq!(names[13], ("alternates_final", 2));
        assert_eq!(names[23], ("general_kashida", 2));
    }

    #[test]
    fn every_pattern_compiles() {
        let total: usize = StretchRules::standard()
            .lookups()
            .iter()
            .map(|l| l.patterns().len())
            .sum();
        // beh 1 + final 3 + kashida 5 + kaf 1 + alternates 2 + decomposition 9
        assert_eq!(total, 21);
    }

    #[test]
    fn beh_sequence_finds_inner_pair() {
        let regex = &lookup("beh_sequence").patterns()[0];
        // "يتبين": ya-teh-beh-ya-noon, the last beh/ya pair with a letter after wins
        assert_eq!(spans_of(regex, "يتبين"), vec![("k1", 2), ("k2", 3)]);
        assert!(!regex.is_match("الرحيم"));
    }

    #[test]
    fn alternates_capture_final_letter_and_fatha() {
        let regex = &lookup("alternates_beh_kaf").patterns()[0];
        assert_eq!(spans_of(regex, "مِن"), vec![("expa", 2)]);
        assert_eq!(spans_of(regex, "بَ"), vec![("expa", 0), ("fatha", 1)]);
        assert!(!regex.is_match("بر"));
    }

    #[test]
    fn kashida_pattern_prefers_last_pair() {
        let regex = &lookup("general_kashida").patterns()[4];
        assert_eq!(spans_of(regex, "الرحيم"), vec![("k3", 4), ("k5", 5)]);
    }

    #[test]
    fn kashida_action_adds_cv10_on_beh_shapes() {
        let mut list = FeatureList::new();
        Action::Kashida.apply(&mut list, 'ي');
        Action::Kashida.apply(&mut list, 'ي');
        assert_eq!(value_of(&list, FeatureTag::Cv01), Some(2));
        assert_eq!(value_of(&list, FeatureTag::Cv10), Some(1));

        let mut meem = FeatureList::new();
        Action::Kashida.apply(&mut meem, 'م');
        assert_eq!(value_of(&meem, FeatureTag::Cv10), None);
    }

    fn context_for<'a>(
        word: &'a WordInfo,
        chars: &'a [char],
        spans: &'a [NamedSpan<'a>],
        committed: &'a FeatureMap,
    ) -> LookupContext<'a> {
        LookupContext {
            word,
            chars,
            spans,
            committed,
        }
    }

    #[test]
    fn veto_skips_final_alternate_at_word_end() {
        let info = segment("الرحمن");
        let word = &info.word_infos[0];
        let chars: Vec<char> = word.text.chars().collect();
        let spans = [
            NamedSpan { name: "k3", range: 4..5 },
            NamedSpan { name: "k5", range: 5..6 },
        ];
        let committed = FeatureMap::new();
        let ctx = context_for(word, &chars, &spans, &committed);
        assert!(kashida_context(&ctx));
        assert!(!no_final_alternate_target(&ctx));
    }

    #[test]
    fn two_letter_words_only_stretch_seen_sheen() {
        let committed = FeatureMap::new();
        for (text, expected) in [("من", false), ("سش", true)] {
            let info = segment(text);
            let word = &info.word_infos[0];
            let chars: Vec<char> = word.text.chars().collect();
            let ctx = context_for(word, &chars, &[], &committed);
            assert_eq!(kashida_context(&ctx), expected, "{text}");
        }
    }

    #[test]
    fn jeem_family_needs_cv16_before_closing_letter() {
        let info = segment("الحد");
        let word = &info.word_infos[0];
        let chars: Vec<char> = word.text.chars().collect();
        let spans = [
            NamedSpan { name: "k3", range: 2..3 },
            NamedSpan { name: "k4", range: 3..4 },
        ];
        let mut committed = FeatureMap::new();
        assert!(!kashida_context(&context_for(word, &chars, &spans, &committed)));

        let mut list = FeatureList::new();
        merge(&mut list, FeatureTag::Cv16, 1, Reducer::Fixed(1));
        committed.insert(2, list);
        assert!(kashida_context(&context_for(word, &chars, &spans, &committed)));
    }
}
