//! Page lines and their layout context.

use core_config::PageSettings;
use core_justify::{LineKind, LineLayoutContext};

/// Lines 2..=8 of the two opening pages are drawn inside a decorative frame
/// that narrows towards top and bottom.
const OPENING_PAGE_WIDTH: f64 = 0.9;
const OPENING_PAGE_PROFILE: [(u16, f64); 7] = [
    (2, 0.5),
    (3, 0.7),
    (4, 0.9),
    (5, 1.0),
    (6, 0.9),
    (7, 0.7),
    (8, 0.4),
];

/// Desired width ratio of a line (page and line numbers are 1-based).
///
/// Configured overrides win over the opening-page profile; every other line
/// uses the full width. Page 0 is not a page and gets the full width.
pub fn line_width_ratio(page: u16, line: u16, settings: &PageSettings) -> f64 {
    if let Some(ratio) = settings.line_width_override(page, line) {
        return ratio;
    }
    if (1..=2).contains(&page) {
        if let Some(&(_, factor)) = OPENING_PAGE_PROFILE.iter().find(|(l, _)| *l == line) {
            return OPENING_PAGE_WIDTH * factor;
        }
    }
    1.0
}

/// One line of a page as handed over by the text source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLine {
    /// 1-based page number.
    pub page: u16,
    /// 1-based line number within the page.
    pub line: u16,
    pub text: String,
    pub kind: LineKind,
    pub centered: bool,
}

impl PageLine {
    pub fn ayah(page: u16, line: u16, text: impl Into<String>) -> Self {
        Self {
            page,
            line,
            text: text.into(),
            kind: LineKind::Ayah,
            centered: false,
        }
    }

    pub fn with_kind(mut self, kind: LineKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn centered(mut self, centered: bool) -> Self {
        self.centered = centered;
        self
    }

    pub fn layout_context(&self, settings: &PageSettings) -> LineLayoutContext {
        LineLayoutContext {
            desired_width_ratio: line_width_ratio(self.page, self.line, settings),
            font_to_line_ratio: settings.font_to_line_ratio,
            kind: self.kind,
            centered: self.centered,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_config::LineWidthOverride;

    #[test]
    fn opening_pages_follow_the_frame_profile() {
        let settings = PageSettings::default();
        assert_eq!(line_width_ratio(1, 1, &settings), 1.0);
        assert!((line_width_ratio(1, 2, &settings) - 0.45).abs() < 1e-12);
        assert!((line_width_ratio(2, 5, &settings) - 0.9).abs() < 1e-12);
        assert!((line_width_ratio(2, 8, &settings) - 0.36).abs() < 1e-12);
        assert_eq!(line_width_ratio(2, 9, &settings), 1.0);
        assert_eq!(line_width_ratio(3, 2, &settings), 1.0);
        assert_eq!(line_width_ratio(0, 2, &settings), 1.0);
    }

    #[test]
    fn closing_pages_use_the_override_table() {
        let settings = PageSettings::default();
        assert_eq!(line_width_ratio(604, 15, &settings), 0.54);
        assert_eq!(line_width_ratio(602, 5, &settings), 0.61);
        assert_eq!(line_width_ratio(604, 1, &settings), 1.0);
    }

    #[test]
    fn overrides_beat_the_profile() {
        let settings = PageSettings {
            line_widths: vec![LineWidthOverride::new(1, 2, 0.3)],
            ..PageSettings::default()
        };
        assert_eq!(line_width_ratio(1, 2, &settings), 0.3);
    }

    #[test]
    fn context_carries_kind_and_ratio() {
        let line = PageLine::ayah(1, 3, "بِسْمِ")
            .with_kind(LineKind::Basmallah)
            .centered(true);
        let ctx = line.layout_context(&PageSettings::default());
        assert_eq!(ctx.kind, LineKind::Basmallah);
        assert!(ctx.centered);
        assert!((ctx.desired_width_ratio - 0.63).abs() < 1e-12);
        assert!((ctx.font_to_line_ratio - 1.0 / 14.0).abs() < 1e-12);
    }
}
