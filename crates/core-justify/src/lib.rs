//! Line justification for mushaf text.
//!
//! `Justifier::justify` turns a segmented line and its layout context into a
//! `JustificationResult`: per-character stretch features, widths for the two
//! space types and a font size ratio. Widths come from a caller-provided
//! `TextMeasurer`.

pub mod engine;
pub mod features;
pub mod measure;
pub mod rules;

pub use engine::{JustificationResult, Justifier, LineKind, LineLayoutContext};
pub use features::{FeatureList, FeatureMap, FeatureTag, FontFeature, Reducer};
pub use measure::{AdvanceTable, TextMeasurer};
pub use rules::StretchRules;
