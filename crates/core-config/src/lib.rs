//! Configuration loading and parsing.
//!
//! Parses `mushaf.toml` (or an override path supplied by the embedding
//! application) into three sections:
//!
//! * `[justify]` tuning values of the line justification engine. They are
//!   tied to the glyph design of one font (space advance, stretch bounds) and
//!   are therefore data, not code.
//! * `[page]` page geometry and the desired-width overrides of decorative
//!   lines (`[[page.line_widths]]`).
//! * `[tajweed.palette]` per-class color overrides as `#rrggbb` literals.
//!
//! Every field has a default equal to the reference layout, so an absent
//! file, an absent section or an absent key all behave identically. Unknown
//! keys are ignored (TOML deserialization tolerance). A file that fails to
//! parse or validate falls back to defaults with a warning on target
//! `config`; the layout engine itself never sees an invalid value.

use anyhow::Result;
use serde::Deserialize;
use std::{fs, path::PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be a positive finite number, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("width ratio for page {page} line {line} must be in (0, 1], got {ratio}")]
    RatioOutOfRange { page: u16, line: u16, ratio: f64 },

    #[error("invalid color for {class}: {value:?} (expected #rrggbb)")]
    InvalidColor { class: &'static str, value: String },
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct JustifySettings {
    /// Width of a full line in layout units.
    #[serde(default = "JustifySettings::default_reference_line_width")]
    pub reference_line_width: f64,
    /// Font design units per em.
    #[serde(default = "JustifySettings::default_units_per_em")]
    pub units_per_em: f64,
    /// Advance of a plain space in design units.
    #[serde(default = "JustifySettings::default_space_width")]
    pub space_width: f64,
    /// Maximum extra width of a simple space, in multiples of the default space.
    #[serde(default = "JustifySettings::default_simple_space_stretch")]
    pub simple_space_stretch: f64,
    /// Maximum extra width of a verse-boundary space, in multiples of the default space.
    #[serde(default = "JustifySettings::default_verse_space_stretch")]
    pub verse_space_stretch: f64,
}

impl Default for JustifySettings {
    fn default() -> Self {
        Self {
            reference_line_width: Self::default_reference_line_width(),
            units_per_em: Self::default_units_per_em(),
            space_width: Self::default_space_width(),
            simple_space_stretch: Self::default_simple_space_stretch(),
            verse_space_stretch: Self::default_verse_space_stretch(),
        }
    }
}

impl JustifySettings {
    const fn default_reference_line_width() -> f64 {
        2000.0
    }
    const fn default_units_per_em() -> f64 {
        1000.0
    }
    const fn default_space_width() -> f64 {
        100.0
    }
    const fn default_simple_space_stretch() -> f64 {
        0.5
    }
    const fn default_verse_space_stretch() -> f64 {
        2.0
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("justify.reference_line_width", self.reference_line_width)?;
        positive("justify.units_per_em", self.units_per_em)?;
        positive("justify.space_width", self.space_width)?;
        non_negative("justify.simple_space_stretch", self.simple_space_stretch)?;
        non_negative("justify.verse_space_stretch", self.verse_space_stretch)?;
        Ok(())
    }
}

/// Desired-width ratio override for one line of one page (both 1-based).
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct LineWidthOverride {
    pub page: u16,
    pub line: u16,
    pub ratio: f64,
}

impl LineWidthOverride {
    pub const fn new(page: u16, line: u16, ratio: f64) -> Self {
        Self { page, line, ratio }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PageSettings {
    /// Horizontal margin as a fraction of the page width.
    #[serde(default = "PageSettings::default_margin_ratio")]
    pub margin_ratio: f64,
    /// Font size as a fraction of the line width.
    #[serde(default = "PageSettings::default_font_to_line_ratio")]
    pub font_to_line_ratio: f64,
    #[serde(default = "PageSettings::default_line_widths")]
    pub line_widths: Vec<LineWidthOverride>,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            margin_ratio: Self::default_margin_ratio(),
            font_to_line_ratio: Self::default_font_to_line_ratio(),
            line_widths: Self::default_line_widths(),
        }
    }
}

impl PageSettings {
    const fn default_margin_ratio() -> f64 {
        0.02
    }
    fn default_font_to_line_ratio() -> f64 {
        1.0 / 14.0
    }
    /// Short closing lines of the last pages.
    fn default_line_widths() -> Vec<LineWidthOverride> {
        vec![
            LineWidthOverride::new(600, 9, 0.84),
            LineWidthOverride::new(602, 5, 0.61),
            LineWidthOverride::new(602, 15, 0.59),
            LineWidthOverride::new(603, 10, 0.68),
            LineWidthOverride::new(604, 4, 0.836),
            LineWidthOverride::new(604, 9, 0.836),
            LineWidthOverride::new(604, 14, 0.717),
            LineWidthOverride::new(604, 15, 0.54),
        ]
    }

    pub fn line_width_override(&self, page: u16, line: u16) -> Option<f64> {
        self.line_widths
            .iter()
            .find(|o| o.page == page && o.line == line)
            .map(|o| o.ratio)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("page.margin_ratio", self.margin_ratio)?;
        positive("page.font_to_line_ratio", self.font_to_line_ratio)?;
        for o in &self.line_widths {
            if !(o.ratio.is_finite() && o.ratio > 0.0 && o.ratio <= 1.0) {
                return Err(ConfigError::RatioOutOfRange {
                    page: o.page,
                    line: o.line,
                    ratio: o.ratio,
                });
            }
        }
        Ok(())
    }
}

/// Optional `#rrggbb` override per tajweed class.
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct PaletteOverrides {
    pub ghunnah: Option<String>,
    pub tafkheem: Option<String>,
    pub silent: Option<String>,
    pub qalqalah: Option<String>,
    pub madd1: Option<String>,
    pub madd2: Option<String>,
    pub madd3: Option<String>,
    pub madd4: Option<String>,
}

impl PaletteOverrides {
    /// Overrides that are set, keyed by class name.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("ghunnah", &self.ghunnah),
            ("tafkheem", &self.tafkheem),
            ("silent", &self.silent),
            ("qalqalah", &self.qalqalah),
            ("madd1", &self.madd1),
            ("madd2", &self.madd2),
            ("madd3", &self.madd3),
            ("madd4", &self.madd4),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|v| (name, v)))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (class, value) in self.entries() {
            parse_hex_color(class, value)?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct TajweedSettings {
    #[serde(default)]
    pub palette: PaletteOverrides,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct ConfigFile {
    #[serde(default)]
    pub justify: JustifySettings,
    #[serde(default)]
    pub page: PageSettings,
    #[serde(default)]
    pub tajweed: TajweedSettings,
}

impl ConfigFile {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.justify.validate()?;
        self.page.validate()?;
        self.tajweed.palette.validate()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>, // raw file contents, if a file was read
    pub file: ConfigFile,    // parsed (or default) data
}

impl Config {
    pub fn justify(&self) -> &JustifySettings {
        &self.file.justify
    }

    pub fn page(&self) -> &PageSettings {
        &self.file.page
    }

    pub fn tajweed(&self) -> &TajweedSettings {
        &self.file.tajweed
    }

    /// Parse configuration text. Errors are returned to the caller; see
    /// `load_from` for the fallback policy applied to files.
    pub fn from_toml(content: &str) -> Result<Self> {
        let file = toml::from_str::<ConfigFile>(content)?;
        file.validate()?;
        Ok(Self {
            raw: Some(content.to_string()),
            file,
        })
    }
}

/// Parse a `#rrggbb` literal. `class` names the palette entry for errors.
pub fn parse_hex_color(class: &'static str, value: &str) -> Result<[u8; 3], ConfigError> {
    let invalid = || ConfigError::InvalidColor {
        class,
        value: value.to_string(),
    };
    let hex = value.strip_prefix('#').ok_or_else(invalid)?;
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(invalid());
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
    Ok([channel(0)?, channel(2)?, channel(4)?])
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

/// Best-effort config path following platform conventions (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    let local = PathBuf::from("mushaf.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("mushaf").join("mushaf.toml");
    }
    PathBuf::from("mushaf.toml")
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        return Ok(Config::default());
    };
    match Config::from_toml(&content) {
        Ok(cfg) => {
            info!(
                target: "config",
                path = %path.display(),
                line_width_overrides = cfg.file.page.line_widths.len(),
                "config_loaded"
            );
            Ok(cfg)
        }
        Err(e) => {
            // Invalid files fall back to the reference layout.
            warn!(target: "config", path = %path.display(), error = %e, "config_rejected_using_defaults");
            Ok(Config::default())
        }
    }
}
