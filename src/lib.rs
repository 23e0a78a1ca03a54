//! Mushaf line layout.
//!
//! Facade over the workspace crates: segmentation (`text`), configuration
//! (`config`), line justification (`justify`), tajweed coloring (`tajweed`)
//! and page-level layout (`page`).

pub use core_config as config;
pub use core_justify as justify;
pub use core_page as page;
pub use core_tajweed as tajweed;
pub use core_text as text;

pub use core_justify::{JustificationResult, Justifier, LineKind, LineLayoutContext};
pub use core_page::{LineCache, PageLayouter, PageLine};
pub use core_tajweed::{ColorClass, TajweedColorMap, annotate};
pub use core_text::{LineTextInfo, segment};
