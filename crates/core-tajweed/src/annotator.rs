//! Tajweed annotation of a rendering line.
//!
//! Two rule groups run over the line independently. The heavy-letter group
//! runs first; the recitation group (silent letters, ghunnah, madd,
//! qalqalah) runs second and its classes replace heavy-letter classes on the
//! same index.

use std::ops::Range;
use std::sync::LazyLock;

use tracing::trace;

use crate::palette::ColorClass;
use crate::pattern::{Alternative, Anchor, Guard, Mark, RuleSet, TajweedColorMap};

// Harakat and signs spelled out inside patterns:
// U+0650 kasra, U+064E fatha, U+064F damma, U+0651 shadda, U+0652 sukun,
// U+08F0..U+08F2 open tanween, U+0670 dagger alef, U+06E5/U+06E6 small
// waw/yeh, U+0653 madda, U+06E2 small meem (iqlab), U+06ED small low meem,
// U+06DF rounded zero, U+06DD end of ayah.

static TAFKHEEM: LazyLock<RuleSet> = LazyLock::new(tafkheem_rules);
static RECITATION: LazyLock<RuleSet> = LazyLock::new(recitation_rules);

fn tafkheem_rules() -> RuleSet {
    use ColorClass::Tafkheem;
    RuleSet::new(
        "tafkheem",
        vec![
            Alternative::new(
                "heavy_letter",
                r"(?<heavy>[طقصخغضظ]\x{0651}?[\x{0652}\x{064E}\x{08F0}\x{0650}\x{08F2}\x{064F}\x{08F1}])",
            )
            .mark(Mark::span("heavy", Tafkheem)),
            // light reh at a verse end after kasra or yeh
            Alternative::new(
                "light_reh_at_verse_end",
                r"(?:\x{0650}|ي\x{0652}?)ر\p{Mn}+\s\x{06DD}",
            ),
            Alternative::new("reh_open", r"(?<reh>ر\x{0651}?[\x{064E}\x{064F}])")
                .mark(Mark::span("reh", Tafkheem)),
            Alternative::new(
                "reh_sukun_after_open",
                r"(?:ٱ|[\x{064E}\x{064F}](?:\p{L}\x{0652}|[او]?))(?<reh>ر\x{0652})",
            )
            .mark(Mark::span("reh", Tafkheem)),
            Alternative::new(
                "reh_at_verse_end_after_open",
                r"[\x{064E}\x{064F}](?:\p{L}\x{0652}|[او]?)(?<reh>ر)\p{Mn}+\s\x{06DD}",
            )
            .mark(Mark::span("reh", Tafkheem)),
            Alternative::new(
                "reh_sukun_before_heavy",
                r"\x{0650}(?<reh>ر\x{0652})[صطغخق]",
            )
            .mark(Mark::span("reh", Tafkheem)),
        ],
    )
}

fn recitation_rules() -> RuleSet {
    use ColorClass::{Ghunnah, Madd1, Madd2, Madd3, Madd4, Qalqalah, Silent};
    const TANWEEN: &str = r"\x{08F0}\x{08F1}\x{08F2}";
    const ALLAH_TAIL: &str = r"\p{Mn}*ل\p{Mn}*ه\p{Mn}*(?:\s|$)";

    RuleSet::new(
        "recitation",
        vec![
            // silent letters
            Alternative::new("hamzat_wasl", r"\p{L}\p{Mn}*(?<wasl>ٱ)")
                .guard(Guard::not_followed_by(Anchor::MatchEnd, &format!("ل{ALLAH_TAIL}")))
                .mark(Mark::first("wasl", Silent)),
            Alternative::new("lam_shamsiyya", r"ٱ(?<lam>ل)\p{L}")
                .guard(Guard::not_followed_by(Anchor::GroupEnd("lam"), ALLAH_TAIL))
                .mark(Mark::first("lam", Silent)),
            Alternative::new("rounded_zero", r"(?<zero>\p{L}\x{06DF})")
                .mark(Mark::span("zero", Silent)),
            Alternative::new("waw_before_dagger_alef", r"(?<waw>و)")
                .guard(Guard::followed_by(Anchor::MatchEnd, r"\x{0670}"))
                .mark(Mark::first("waw", Silent)),
            Alternative::new("maqsura_before_dagger_alef", r"(?<maqsura>ى)")
                .guard(Guard::followed_by(Anchor::MatchEnd, r"\x{0670}\p{L}"))
                .mark(Mark::first("maqsura", Silent)),
            Alternative::new("noon_before_idgham", r"(?<noon>ن)")
                .guard(Guard::followed_by(Anchor::MatchEnd, " [نيمورل]"))
                .mark(Mark::first("noon", Silent)),
            Alternative::new("letter_before_shadda", r"[\x{064E}\x{064F}\x{0650}](?<letter>\p{L})")
                .guard(Guard::followed_by(Anchor::MatchEnd, r"\s?\p{L}\x{0651}"))
                .mark(Mark::first("letter", Silent)),
            // ghunnah
            Alternative::new("noon_small_meem", r"(?<noon>ن)(?<meem>[\x{06E2}\x{06ED}])")
                .mark(Mark::first("noon", Silent))
                .mark(Mark::first("meem", Ghunnah)),
            Alternative::new("noon_shadda", r"(?<nasal>ن\x{0651}\p{Mn})")
                .mark(Mark::span("nasal", Ghunnah)),
            Alternative::new("small_meem_before_noon", r"(?<meem>[\x{06E2}\x{06ED}] ن)")
                .mark(Mark::first("meem", Ghunnah)),
            Alternative::new("meem_before_beh", r"(?<meem>م ب)").mark(Mark::first("meem", Ghunnah)),
            Alternative::new("noon_before_letter", r"(?<noon>ن\p{L})")
                .mark(Mark::first("noon", Ghunnah)),
            Alternative::new(
                "idgham_with_ghunnah",
                &format!(r"(?<tanween>[{TANWEEN}ن])\p{{L}}? (?<target>[يوم]\p{{Mn}}\p{{Mn}}?)"),
            )
            .mark(Mark::first("tanween", Silent))
            .mark(Mark::span("target", Ghunnah)),
            Alternative::new(
                "idgham_without_ghunnah",
                &format!(r"(?<tanween>[{TANWEEN}ن])\p{{L}}? [لر]\x{{0651}}"),
            )
            .mark(Mark::first("tanween", Silent)),
            Alternative::new("ikhfa", &format!(r"(?<tanween>[{TANWEEN}ن])\p{{L}}? \p{{L}}"))
                .mark(Mark::first("tanween", Ghunnah)),
            Alternative::new("meem_noon_shadda", r"(?<nasal>[من]\x{0651}\p{Mn})")
                .mark(Mark::span("nasal", Ghunnah)),
            // madd
            Alternative::new("madd_lazim", r"(?<madd>[او\x{0670}\x{06E5}\x{06E6}]\x{0653})")
                .guard(Guard::followed_by(Anchor::MatchEnd, r"\p{L}\x{0651}"))
                .mark(Mark::span("madd", Madd4)),
            Alternative::new("madd_small_letter", r"(?<madd>[\x{0670}\x{06E5}\x{06E6}])")
                .mark(Mark::first("madd", Madd1)),
            Alternative::new(
                "madd_before_verse_end",
                r"[او\x{0670}\x{06E5}\x{06E6}]\x{0653}\s\x{06DD}",
            ),
            Alternative::new("madd_huruf", r"(?<madd>[لم]\x{0653})").mark(Mark::span("madd", Madd4)),
            Alternative::new("madd_wajib", r"(?<madd>[اويى\x{0670}\x{06E5}\x{06E6}]\x{0653})")
                .mark(Mark::span("madd", Madd3)),
            Alternative::new("madd_arid", r"(?<madd>[ياو\x{0670}]\x{0652}?)")
                .guard(Guard::followed_by(Anchor::MatchEnd, r"\p{L}\p{Mn}\p{Mn}?\s\x{06DD}"))
                .mark(Mark::span("madd", Madd2)),
            // qalqalah
            Alternative::new("qalqalah_sukun", r"(?<echo>[طقدجب]\x{0652})")
                .mark(Mark::span("echo", Qalqalah)),
            Alternative::new("qalqalah_verse_end", r"(?<echo>[طقدجب]) \x{06DD}")
                .mark(Mark::first("echo", Qalqalah)),
        ],
    )
}

/// The two rule groups in application order.
pub fn rule_groups() -> [&'static RuleSet; 2] {
    [&*TAFKHEEM, &*RECITATION]
}

/// Color classes for `line`, keyed by char index. Pure and total.
pub fn annotate(line: &str) -> TajweedColorMap {
    let mut colors = TajweedColorMap::new();
    TAFKHEEM.scan(line, &mut colors);
    let mut recitation = TajweedColorMap::new();
    RECITATION.scan(line, &mut recitation);
    trace!(
        target: "tajweed",
        heavy = colors.len(),
        recitation = recitation.len(),
        "line_annotated"
    );
    colors.extend(recitation);
    colors
}

/// A run of consecutive chars sharing one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorSpan {
    pub range: Range<usize>,
    pub class: ColorClass,
}

/// Collapse `colors` into maximal runs of adjacent indices with equal class.
pub fn color_spans(colors: &TajweedColorMap) -> Vec<ColorSpan> {
    let mut spans: Vec<ColorSpan> = Vec::new();
    for (&index, &class) in colors {
        match spans.last_mut() {
            Some(last) if last.class == class && last.range.end == index => last.range.end += 1,
            _ => spans.push(ColorSpan {
                range: index..index + 1,
                class,
            }),
        }
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pairs(line: &str) -> Vec<(usize, ColorClass)> {
        annotate(line).into_iter().collect()
    }

    #[test]
    fn every_alternative_compiles() {
        let [heavy, recitation] = rule_groups();
        assert_eq!(heavy.alternatives().len(), 6);
        assert_eq!(recitation.alternatives().len(), 24);
    }

    #[test]
    fn spans_merge_adjacent_equal_classes() {
        let colors = TajweedColorMap::from([
            (0, ColorClass::Tafkheem),
            (1, ColorClass::Tafkheem),
            (2, ColorClass::Qalqalah),
            (5, ColorClass::Qalqalah),
        ]);
        assert_eq!(
            color_spans(&colors),
            vec![
                ColorSpan { range: 0..2, class: ColorClass::Tafkheem },
                ColorSpan { range: 2..3, class: ColorClass::Qalqalah },
                ColorSpan { range: 5..6, class: ColorClass::Qalqalah },
            ]
        );
    }

    #[test]
    fn heavy_letter_then_qalqalah() {
        // qaf fatha dal sukun
        assert_eq!(
            pairs("\u{0642}\u{064E}\u{062F}\u{0652}"),
            vec![
                (0, ColorClass::Tafkheem),
                (1, ColorClass::Tafkheem),
                (2, ColorClass::Qalqalah),
                (3, ColorClass::Qalqalah),
            ]
        );
    }

    #[test]
    fn empty_line_has_no_colors() {
        assert!(annotate("").is_empty());
    }
}
