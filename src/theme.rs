//! Named visual presets
//!
//! A [`Theme`] is a plain value handed to the renderer for one chart; there is
//! no process-wide "current style".

use crate::error::{ChartError, Result};
use plotters::style::RGBColor;

/// Resolved colours for one chart
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub name: &'static str,
    pub background: RGBColor,
    /// Text, axes and outlines
    pub foreground: RGBColor,
    pub grid: RGBColor,
    /// Series colours, cycled
    pub palette: Vec<RGBColor>,
}

const PRESETS: [&str; 7] = [
    "default",
    "ggplot",
    "dark_background",
    "grayscale",
    "fivethirtyeight",
    "bmh",
    "seaborn",
];

impl Theme {
    /// Names accepted by [`Theme::by_name`]
    pub fn available() -> &'static [&'static str] {
        &PRESETS
    }

    /// Look up a preset by name
    pub fn by_name(name: &str) -> Result<Self> {
        let theme = match name.trim().to_lowercase().as_str() {
            "default" => Self::default(),
            "ggplot" => Theme {
                name: "ggplot",
                background: RGBColor(229, 229, 229),
                foreground: RGBColor(85, 85, 85),
                grid: RGBColor(255, 255, 255),
                palette: vec![
                    RGBColor(226, 74, 51),
                    RGBColor(52, 138, 189),
                    RGBColor(152, 142, 213),
                    RGBColor(119, 119, 119),
                    RGBColor(251, 193, 94),
                    RGBColor(142, 186, 66),
                    RGBColor(255, 181, 184),
                ],
            },
            "dark_background" => Theme {
                name: "dark_background",
                background: RGBColor(0, 0, 0),
                foreground: RGBColor(255, 255, 255),
                grid: RGBColor(68, 68, 68),
                palette: vec![
                    RGBColor(141, 211, 199),
                    RGBColor(254, 255, 179),
                    RGBColor(191, 187, 217),
                    RGBColor(250, 129, 116),
                    RGBColor(129, 177, 210),
                    RGBColor(253, 180, 98),
                    RGBColor(179, 222, 105),
                ],
            },
            "grayscale" => Theme {
                name: "grayscale",
                background: RGBColor(255, 255, 255),
                foreground: RGBColor(0, 0, 0),
                grid: RGBColor(204, 204, 204),
                palette: vec![
                    RGBColor(0, 0, 0),
                    RGBColor(64, 64, 64),
                    RGBColor(128, 128, 128),
                    RGBColor(160, 160, 160),
                    RGBColor(192, 192, 192),
                ],
            },
            "fivethirtyeight" => Theme {
                name: "fivethirtyeight",
                background: RGBColor(240, 240, 240),
                foreground: RGBColor(60, 60, 60),
                grid: RGBColor(203, 203, 203),
                palette: vec![
                    RGBColor(0, 143, 213),
                    RGBColor(252, 79, 48),
                    RGBColor(229, 174, 56),
                    RGBColor(109, 144, 79),
                    RGBColor(139, 139, 139),
                    RGBColor(129, 15, 124),
                ],
            },
            "bmh" => Theme {
                name: "bmh",
                background: RGBColor(238, 238, 238),
                foreground: RGBColor(77, 77, 77),
                grid: RGBColor(178, 178, 178),
                palette: vec![
                    RGBColor(52, 138, 189),
                    RGBColor(166, 6, 40),
                    RGBColor(122, 104, 166),
                    RGBColor(70, 120, 33),
                    RGBColor(213, 94, 0),
                    RGBColor(204, 121, 167),
                    RGBColor(86, 180, 233),
                ],
            },
            "seaborn" => Theme {
                name: "seaborn",
                background: RGBColor(234, 234, 242),
                foreground: RGBColor(38, 38, 38),
                grid: RGBColor(255, 255, 255),
                palette: vec![
                    RGBColor(76, 114, 176),
                    RGBColor(221, 132, 82),
                    RGBColor(85, 168, 104),
                    RGBColor(196, 78, 82),
                    RGBColor(129, 114, 179),
                    RGBColor(147, 120, 96),
                ],
            },
            _ => {
                return Err(ChartError::UnknownStyle {
                    name: name.to_string(),
                    available: PRESETS.to_vec(),
                })
            }
        };
        Ok(theme)
    }

    /// Colour of the `index`-th series
    pub fn series_color(&self, index: usize) -> RGBColor {
        self.palette[index % self.palette.len()]
    }
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            name: "default",
            background: RGBColor(255, 255, 255),
            foreground: RGBColor(0, 0, 0),
            grid: RGBColor(221, 221, 221),
            palette: vec![
                RGBColor(31, 119, 180),
                RGBColor(255, 127, 14),
                RGBColor(44, 160, 44),
                RGBColor(214, 39, 40),
                RGBColor(148, 103, 189),
                RGBColor(140, 86, 75),
                RGBColor(227, 119, 194),
                RGBColor(127, 127, 127),
                RGBColor(188, 189, 34),
                RGBColor(23, 190, 207),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_preset_resolves() {
        for name in Theme::available() {
            let theme = Theme::by_name(name).unwrap();
            assert_eq!(&theme.name, name);
            assert!(!theme.palette.is_empty());
        }
    }

    #[test]
    fn test_unknown_style() {
        let err = Theme::by_name("neon").unwrap_err();
        assert!(err.to_string().starts_with("Unknown style 'neon'"));
        assert!(err.to_string().contains("ggplot"));
    }

    #[test]
    fn test_series_color_cycles() {
        let theme = Theme::by_name("grayscale").unwrap();
        assert_eq!(theme.series_color(0), theme.series_color(5));
    }

    #[test]
    fn test_preset_colors() {
        let theme = Theme::default();
        assert_eq!(theme.background, RGBColor(255, 255, 255));
        assert_eq!(theme.series_color(0), RGBColor(31, 119, 180));
        assert_eq!(theme.series_color(10), theme.series_color(0));

        let dark = Theme::by_name(" Dark_Background ").unwrap();
        assert_eq!(dark.background, RGBColor(0, 0, 0));
        assert_eq!(dark.foreground, RGBColor(255, 255, 255));
    }
}
