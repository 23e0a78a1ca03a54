//! Placement of justified lines on a page.
//!
//! These helpers translate a `JustificationResult`, which is expressed in
//! font design units relative to the reference line, into page coordinates
//! for a renderer that draws right-to-left lines.

use core_config::{JustifySettings, PageSettings};
use core_justify::{FeatureList, FeatureTag, FontFeature, JustificationResult, LineKind};
use core_text::SpaceType;
use smallvec::smallvec;

/// Fraction of the interline above the baseline.
const BASELINE_OFFSET: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub page_width: f64,
    pub page_height: f64,
    pub top_padding: f64,
    pub bottom_padding: f64,
    pub lines_per_page: u16,
    margin_ratio: f64,
    font_to_line_ratio: f64,
}

impl PageGeometry {
    pub fn new(
        page_width: f64,
        page_height: f64,
        lines_per_page: u16,
        settings: &PageSettings,
    ) -> Self {
        Self {
            page_width,
            page_height,
            top_padding: 0.0,
            bottom_padding: 0.0,
            lines_per_page,
            margin_ratio: settings.margin_ratio,
            font_to_line_ratio: settings.font_to_line_ratio,
        }
    }

    pub fn with_padding(mut self, top: f64, bottom: f64) -> Self {
        self.top_padding = top;
        self.bottom_padding = bottom;
        self
    }

    pub fn margin(&self) -> f64 {
        self.page_width * self.margin_ratio
    }

    pub fn line_width(&self) -> f64 {
        self.page_width - 2.0 * self.margin()
    }

    pub fn font_size(&self) -> f64 {
        self.line_width() * self.font_to_line_ratio
    }

    pub fn interline(&self) -> f64 {
        let content = self.page_height - self.top_padding - self.bottom_padding;
        content / f64::from(self.lines_per_page.max(1))
    }

    /// Baseline of the 1-based `line`.
    pub fn baseline_y(&self, line: u16) -> f64 {
        let row = f64::from(line.saturating_sub(1));
        self.top_padding + (row + BASELINE_OFFSET) * self.interline()
    }

    /// Glyph scale (pixels per design unit) of a justified line.
    pub fn glyph_scale(&self, result: &JustificationResult, settings: &JustifySettings) -> f64 {
        self.font_size() * result.font_size_ratio / settings.units_per_em
    }
}

/// Extra advance to add after a space of `kind`, in page pixels.
pub fn letter_spacing(
    result: &JustificationResult,
    kind: SpaceType,
    scale: f64,
    settings: &JustifySettings,
) -> f64 {
    (result.space_width(kind) - settings.space_width) * scale
}

/// Left edge of a line box `rendered_width` wide.
///
/// Surah names, basmallah and explicitly centered lines are centered on the
/// page; ayah lines hang from the right margin.
pub fn x_origin(
    geometry: &PageGeometry,
    kind: LineKind,
    centered: bool,
    rendered_width: f64,
) -> f64 {
    if centered || kind.bypasses_justification() {
        (geometry.page_width - rendered_width) / 2.0
    } else {
        geometry.page_width - geometry.margin() - rendered_width
    }
}

/// Features applied to the whole line regardless of justification.
pub fn line_features(kind: LineKind) -> FeatureList {
    match kind {
        LineKind::Basmallah => smallvec![FontFeature::new(FeatureTag::Basm, 1)],
        LineKind::Ayah | LineKind::SurahName => FeatureList::new(),
    }
}
