//! Tajweed color classes and their display colors.

use std::fmt;

use core_config::{ConfigError, TajweedSettings, parse_hex_color};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorClass {
    /// Nasalization.
    Ghunnah,
    /// Heavy pronunciation.
    Tafkheem,
    /// Written but not pronounced.
    Silent,
    /// Echoing stop.
    Qalqalah,
    /// Natural prolongation (two counts).
    Madd1,
    /// Permissible prolongation.
    Madd2,
    /// Obligatory prolongation.
    Madd3,
    /// Necessary prolongation (six counts).
    Madd4,
}

impl ColorClass {
    pub const ALL: [ColorClass; 8] = [
        ColorClass::Ghunnah,
        ColorClass::Tafkheem,
        ColorClass::Silent,
        ColorClass::Qalqalah,
        ColorClass::Madd1,
        ColorClass::Madd2,
        ColorClass::Madd3,
        ColorClass::Madd4,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            ColorClass::Ghunnah => "ghunnah",
            ColorClass::Tafkheem => "tafkheem",
            ColorClass::Silent => "silent",
            ColorClass::Qalqalah => "qalqalah",
            ColorClass::Madd1 => "madd1",
            ColorClass::Madd2 => "madd2",
            ColorClass::Madd3 => "madd3",
            ColorClass::Madd4 => "madd4",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    const fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ColorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: [Rgb; 8],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: [
                Rgb(0, 166, 80),
                Rgb(0, 102, 148),
                Rgb(156, 154, 155),
                Rgb(0, 173, 239),
                Rgb(195, 138, 8),
                Rgb(244, 114, 22),
                Rgb(236, 0, 140),
                Rgb(140, 0, 0),
            ],
        }
    }
}

impl Palette {
    /// Default palette with the configured overrides applied.
    pub fn from_settings(settings: &TajweedSettings) -> Result<Self, ConfigError> {
        let mut palette = Self::default();
        for (name, value) in settings.palette.entries() {
            let [r, g, b] = parse_hex_color(name, value)?;
            if let Some(class) = ColorClass::from_name(name) {
                palette.set(class, Rgb(r, g, b));
            }
        }
        Ok(palette)
    }

    pub fn set(&mut self, class: ColorClass, color: Rgb) {
        self.colors[class.slot()] = color;
    }

    pub fn rgb(&self, class: ColorClass) -> Rgb {
        self.colors[class.slot()]
    }

    pub fn hex(&self, class: ColorClass) -> String {
        self.rgb(class).hex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_config::PaletteOverrides;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_colors() {
        let palette = Palette::default();
        assert_eq!(palette.rgb(ColorClass::Ghunnah), Rgb(0, 166, 80));
        assert_eq!(palette.hex(ColorClass::Qalqalah), "#00adef");
        assert_eq!(palette.hex(ColorClass::Madd4), "#8c0000");
    }

    #[test]
    fn overrides_replace_single_classes() {
        let settings = TajweedSettings {
            palette: PaletteOverrides {
                silent: Some("#101010".to_string()),
                ..PaletteOverrides::default()
            },
        };
        let palette = Palette::from_settings(&settings).unwrap();
        assert_eq!(palette.rgb(ColorClass::Silent), Rgb(16, 16, 16));
        assert_eq!(palette.rgb(ColorClass::Madd1), Rgb(195, 138, 8));
    }

    #[test]
    fn invalid_override_is_an_error() {
        let settings = TajweedSettings {
            palette: PaletteOverrides {
                madd2: Some("orange".to_string()),
                ..PaletteOverrides::default()
            },
        };
        assert!(Palette::from_settings(&settings).is_err());
    }

    #[test]
    fn names_round_trip() {
        for class in ColorClass::ALL {
            assert_eq!(ColorClass::from_name(class.name()), Some(class));
            assert_eq!(class.to_string(), class.name());
        }
    }

    #[test]
    fn serde_uses_snake_case_names() {
        #[derive(Deserialize)]
        struct Doc {
            class: ColorClass,
        }
        let doc: Doc = toml::from_str("class = \"madd3\"").unwrap();
        assert_eq!(doc.class, ColorClass::Madd3);
    }
}
