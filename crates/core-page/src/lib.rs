//! Page-level layout of mushaf lines.
//!
//! Derives each line's layout context, lays lines out in parallel through an
//! explicit caller-owned `LineCache`, and converts justification results into
//! page coordinates.

pub mod cache;
pub mod layout;
pub mod line;
pub mod placement;

pub use cache::{LineCache, LineFingerprint};
pub use layout::{LaidOutLine, PageLayouter};
pub use line::{PageLine, line_width_ratio};
pub use placement::{PageGeometry, letter_spacing, line_features, x_origin};
