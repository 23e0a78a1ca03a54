//! Ordered-alternative scanner.
//!
//! A `RuleSet` walks a line left to right. At each position its alternatives
//! are tried in declaration order; the first one that matches there (and
//! whose guard holds) wins, its marks are recorded and scanning resumes right
//! after the match. When nothing matches the scanner advances by one char.
//!
//! Guards stand in for lookaround: a second pattern tested at the end of the
//! match or at the end of a named group, optionally negated.

use std::collections::BTreeMap;

use core_text::{CharOffsets, named_spans};
use regex::{Captures, Regex};

use crate::palette::ColorClass;

/// Color classes keyed by char index in the line.
pub type TajweedColorMap = BTreeMap<usize, ColorClass>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    MatchEnd,
    GroupEnd(&'static str),
}

#[derive(Debug, Clone)]
pub struct Guard {
    anchor: Anchor,
    regex: Regex,
    negate: bool,
}

impl Guard {
    fn new(anchor: Anchor, pattern: &str, negate: bool) -> Self {
        Self {
            anchor,
            regex: anchored(pattern),
            negate,
        }
    }

    /// Text at the anchor must start with `pattern`.
    pub fn followed_by(anchor: Anchor, pattern: &str) -> Self {
        Self::new(anchor, pattern, false)
    }

    /// Text at the anchor must not start with `pattern`.
    pub fn not_followed_by(anchor: Anchor, pattern: &str) -> Self {
        Self::new(anchor, pattern, true)
    }

    fn holds(&self, rest: &str, caps: &Captures<'_>) -> bool {
        let at = match self.anchor {
            Anchor::MatchEnd => caps.get(0).map(|m| m.end()),
            Anchor::GroupEnd(name) => caps.name(name).map(|m| m.end()),
        };
        let Some(at) = at else {
            return false;
        };
        self.regex.is_match(&rest[at..]) != self.negate
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extent {
    /// Every char of the group.
    Span,
    /// Only the group's first char.
    First,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    pub group: &'static str,
    pub extent: Extent,
    pub class: ColorClass,
}

impl Mark {
    pub const fn span(group: &'static str, class: ColorClass) -> Self {
        Self {
            group,
            extent: Extent::Span,
            class,
        }
    }

    pub const fn first(group: &'static str, class: ColorClass) -> Self {
        Self {
            group,
            extent: Extent::First,
            class,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Alternative {
    name: &'static str,
    regex: Regex,
    guard: Option<Guard>,
    marks: Vec<Mark>,
}

impl Alternative {
    pub fn new(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            regex: anchored(pattern),
            guard: None,
            marks: Vec::new(),
        }
    }

    pub fn guard(mut self, guard: Guard) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn mark(mut self, mark: Mark) -> Self {
        self.marks.push(mark);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Captures when the alternative applies at the start of `rest`.
    fn match_at<'h>(&self, rest: &'h str) -> Option<Captures<'h>> {
        let caps = self.regex.captures(rest)?;
        match &self.guard {
            Some(guard) if !guard.holds(rest, &caps) => None,
            _ => Some(caps),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RuleSet {
    name: &'static str,
    alternatives: Vec<Alternative>,
}

impl RuleSet {
    pub fn new(name: &'static str, alternatives: Vec<Alternative>) -> Self {
        Self { name, alternatives }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn alternatives(&self) -> &[Alternative] {
        &self.alternatives
    }

    /// Scan `line` and record marks into `out`. An index already present in
    /// `out` keeps its class.
    pub fn scan(&self, line: &str, out: &mut TajweedColorMap) {
        let offsets = CharOffsets::new(line);
        let mut pos = 0;
        while pos < line.len() {
            let rest = &line[pos..];
            let hit = self
                .alternatives
                .iter()
                .find_map(|alt| alt.match_at(rest).map(|caps| (alt, caps)));
            let Some((alt, caps)) = hit else {
                pos += rest.chars().next().map_or(1, char::len_utf8);
                continue;
            };
            for span in named_spans(&alt.regex, &caps, &offsets, pos) {
                for mark in alt.marks.iter().filter(|m| m.group == span.name) {
                    let indices = match mark.extent {
                        Extent::Span => span.range.clone(),
                        Extent::First => span.first()..span.first() + 1,
                    };
                    for index in indices {
                        out.entry(index).or_insert(mark.class);
                    }
                }
            }
            let len = caps.get(0).map_or(0, |m| m.end());
            pos += if len > 0 {
                len
            } else {
                rest.chars().next().map_or(1, char::len_utf8)
            };
        }
    }
}

fn anchored(pattern: &str) -> Regex {
    Regex::new(&format!("^(?:{pattern})")).expect("tajweed pattern compiles")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn first_alternative_wins_at_a_position() {
        let rules = RuleSet::new(
            "demo",
            vec![
                Alternative::new("long", "(?<a>ab)").mark(Mark::span("a", ColorClass::Madd1)),
                Alternative::new("short", "(?<b>a)").mark(Mark::span("b", ColorClass::Madd2)),
            ],
        );
        let mut out = TajweedColorMap::new();
        rules.scan("abac", &mut out);
        assert_eq!(
            out.into_iter().collect::<Vec<_>>(),
            vec![
                (0, ColorClass::Madd1),
                (1, ColorClass::Madd1),
                (2, ColorClass::Madd2)
            ]
        );
    }

    #[test]
    fn guards_act_as_lookahead() {
        let rules = RuleSet::new(
            "demo",
            vec![
                Alternative::new("n", "(?<n>n)")
                    .guard(Guard::followed_by(Anchor::MatchEnd, " m"))
                    .mark(Mark::first("n", ColorClass::Silent)),
            ],
        );
        let mut out = TajweedColorMap::new();
        rules.scan("n m n x", &mut out);
        assert_eq!(out.keys().copied().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn negative_group_guard() {
        let rules = RuleSet::new(
            "demo",
            vec![
                Alternative::new("l", "a(?<l>l)b")
                    .guard(Guard::not_followed_by(Anchor::GroupEnd("l"), "bb"))
                    .mark(Mark::first("l", ColorClass::Silent)),
            ],
        );
        let mut out = TajweedColorMap::new();
        rules.scan("alb albb", &mut out);
        assert_eq!(out.keys().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn existing_entries_are_kept() {
        let rules = RuleSet::new(
            "demo",
            vec![Alternative::new("x", "(?<x>x)").mark(Mark::span("x", ColorClass::Madd1))],
        );
        let mut out = TajweedColorMap::from([(0, ColorClass::Ghunnah)]);
        rules.scan("xx", &mut out);
        assert_eq!(out[&0], ColorClass::Ghunnah);
        assert_eq!(out[&1], ColorClass::Madd1);
    }

    #[test]
    fn indices_are_chars_not_bytes() {
        let rules = RuleSet::new(
            "demo",
            vec![Alternative::new("noon", "(?<n>ن)").mark(Mark::first("n", ColorClass::Ghunnah))],
        );
        let mut out = TajweedColorMap::new();
        rules.scan("مِن", &mut out);
        assert_eq!(out.keys().copied().collect::<Vec<_>>(), vec![2]);
    }
}
