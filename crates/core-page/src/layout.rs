//! Line and page layout.
//!
//! A laid-out line bundles the three per-line results the renderer needs:
//! the word/space segmentation, the justification and the tajweed colors.
//! Lines are independent, so a page is laid out by computing every cache
//! miss on the rayon pool and merging the results back by position.

use std::sync::Arc;

use core_config::{Config, JustifySettings, PageSettings};
use core_justify::{JustificationResult, Justifier, LineLayoutContext, TextMeasurer};
use core_tajweed::TajweedColorMap;
use core_text::LineTextInfo;
use rayon::prelude::*;
use tracing::debug;

use crate::cache::{LineCache, LineFingerprint};
use crate::line::PageLine;

#[derive(Debug, Clone, PartialEq)]
pub struct LaidOutLine {
    pub page: u16,
    pub line: u16,
    pub info: LineTextInfo,
    pub justification: JustificationResult,
    pub tajweed: TajweedColorMap,
}

pub struct PageLayouter<M> {
    justifier: Justifier<M>,
    settings: PageSettings,
}

impl<M: TextMeasurer> PageLayouter<M> {
    pub fn new(measurer: M, config: &Config) -> Self {
        Self::with_settings(measurer, config.justify().clone(), config.page().clone())
    }

    pub fn with_settings(measurer: M, justify: JustifySettings, page: PageSettings) -> Self {
        Self {
            justifier: Justifier::new(measurer, justify),
            settings: page,
        }
    }

    pub fn justifier(&self) -> &Justifier<M> {
        &self.justifier
    }

    pub fn page_settings(&self) -> &PageSettings {
        &self.settings
    }

    /// Lay out a single line without consulting any cache.
    pub fn layout_line(&self, line: &PageLine) -> LaidOutLine {
        let context = line.layout_context(&self.settings);
        self.layout_with(line, &context)
    }

    fn layout_with(&self, line: &PageLine, context: &LineLayoutContext) -> LaidOutLine {
        let info = core_text::segment(&line.text);
        let justification = self.justifier.justify(&info, context, &line.text);
        let tajweed = core_tajweed::annotate(&line.text);
        LaidOutLine {
            page: line.page,
            line: line.line,
            info,
            justification,
            tajweed,
        }
    }
}

impl<M: TextMeasurer + Sync> PageLayouter<M> {
    /// Lay out `lines`, reusing cached results whose fingerprint still
    /// matches. The output has one entry per input line, in input order.
    pub fn layout_page(
        &self,
        lines: &[PageLine],
        cache: &mut LineCache,
    ) -> Vec<Arc<LaidOutLine>> {
        let keyed: Vec<(LineLayoutContext, LineFingerprint)> = lines
            .iter()
            .map(|line| {
                let context = line.layout_context(&self.settings);
                (context, LineFingerprint::compute(&line.text, &context))
            })
            .collect();

        let mut slots: Vec<Option<Arc<LaidOutLine>>> = lines
            .iter()
            .zip(&keyed)
            .map(|(line, (_, fingerprint))| cache.get(line.page, line.line, *fingerprint))
            .collect();

        let misses: Vec<usize> = slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.is_none().then_some(index))
            .collect();
        debug!(
            target: "page",
            lines = lines.len(),
            misses = misses.len(),
            "page_layout_start"
        );

        let computed: Vec<(usize, Arc<LaidOutLine>)> = misses
            .par_iter()
            .map(|&index| {
                let laid_out = self.layout_with(&lines[index], &keyed[index].0);
                (index, Arc::new(laid_out))
            })
            .collect();

        for (index, laid_out) in computed {
            let line = &lines[index];
            cache.insert(line.page, line.line, keyed[index].1, Arc::clone(&laid_out));
            slots[index] = Some(laid_out);
        }

        debug!(target: "page", cached = cache.len(), "page_layout_done");
        slots.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_justify::{AdvanceTable, LineKind};

    fn layouter() -> PageLayouter<AdvanceTable> {
        PageLayouter::new(AdvanceTable::uniform(250.0), &Config::default())
    }

    #[test]
    fn layout_line_combines_all_results() {
        let line = PageLine::ayah(3, 1, "\u{0642}\u{0652} \u{0642}\u{0652}");
        let laid_out = layouter().layout_line(&line);
        assert_eq!((laid_out.page, laid_out.line), (3, 1));
        assert_eq!(laid_out.info.word_infos.len(), 2);
        assert!(!laid_out.tajweed.is_empty());
        assert_eq!(laid_out.justification.font_size_ratio, 1.0);
    }

    #[test]
    fn surah_name_line_is_neutral_but_annotated() {
        let layouter = layouter();
        let line = PageLine::ayah(3, 1, "\u{0642}\u{0652}").with_kind(LineKind::SurahName);
        let laid_out = layouter.layout_line(&line);
        assert_eq!(
            laid_out.justification,
            JustificationResult::neutral(layouter.justifier().settings())
        );
        assert!(!laid_out.tajweed.is_empty());
    }

    #[test]
    fn second_pass_is_served_from_cache() {
        let layouter = layouter();
        let lines = vec![
            PageLine::ayah(3, 1, "\u{0628}\u{0633}\u{0645}"),
            PageLine::ayah(3, 2, "\u{0627}\u{0644}\u{0644}\u{0647}"),
        ];
        let mut cache = LineCache::new();
        let first = layouter.layout_page(&lines, &mut cache);
        let second = layouter.layout_page(&lines, &mut cache);
        assert_eq!(cache.misses(), 2);
        assert_eq!(cache.hits(), 2);
        assert!(first.iter().zip(&second).all(|(a, b)| Arc::ptr_eq(a, b)));
    }
}
