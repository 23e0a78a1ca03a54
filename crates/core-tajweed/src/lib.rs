//! Tajweed color annotation for mushaf lines.
//!
//! `annotate` maps char indices of a line to a `ColorClass`; `Palette` turns
//! classes into display colors. The pattern machinery lives in `pattern` and
//! is reusable for other ordered rule tables.

pub mod annotator;
pub mod palette;
pub mod pattern;

pub use annotator::{ColorSpan, annotate, color_spans, rule_groups};
pub use palette::{ColorClass, Palette, Rgb};
pub use pattern::{RuleSet, TajweedColorMap};
