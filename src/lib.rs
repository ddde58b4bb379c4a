// Library exports for chartroom

pub mod caption;
pub mod command;
pub mod data;
pub mod error;
pub mod graph;
pub mod loader;
pub mod output;
pub mod resolve;
pub mod runtime;
pub mod sniff;
pub mod theme;

use std::fmt;

pub use error::{ChartError, ErrorKind, Result};

/// The kinds of chart that can be drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    Bar,
    Line,
    Scatter,
    Pie,
    Histogram,
    Radar,
}

impl ChartKind {
    /// Human readable name used to open captions
    pub fn label(&self) -> &'static str {
        match self {
            ChartKind::Bar => "Bar chart",
            ChartKind::Line => "Line chart",
            ChartKind::Scatter => "Scatter plot",
            ChartKind::Pie => "Pie chart",
            ChartKind::Histogram => "Histogram",
            ChartKind::Radar => "Radar chart",
        }
    }

    /// Whether x/y axis labels apply to this kind
    pub fn has_axes(&self) -> bool {
        !matches!(self, ChartKind::Pie | ChartKind::Radar)
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
            ChartKind::Scatter => "scatter",
            ChartKind::Pie => "pie",
            ChartKind::Histogram => "histogram",
            ChartKind::Radar => "radar",
        };
        f.write_str(name)
    }
}

/// Largest image side in pixels
pub const MAX_PIXEL_SIDE: u32 = 65_535;

/// Largest image area in pixels
pub const MAX_PIXELS: u64 = 1 << 27;

/// Largest histogram bucket count
pub const MAX_BINS: usize = 10_000;

/// Styling knobs passed to the renderer
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Figure width in inches
    pub width: f64,
    /// Figure height in inches
    pub height: f64,
    pub dpi: u32,
    pub title: Option<String>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub theme: theme::Theme,
    /// Histogram bucket count
    pub bins: usize,
    /// Fill radar polygons
    pub fill: bool,
}

impl RenderOptions {
    /// Output size in pixels
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            (self.width * self.dpi as f64).round() as u32,
            (self.height * self.dpi as f64).round() as u32,
        )
    }

    /// Reject sizes and counts the renderer cannot work with
    pub fn validate(&self) -> Result<()> {
        if !(self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()) {
            return Err(ChartError::Config(format!(
                "Width and height must be positive numbers (got {} x {})",
                self.width, self.height
            )));
        }
        if self.dpi == 0 {
            return Err(ChartError::Config("DPI must be at least 1".to_string()));
        }

        let w = self.width * self.dpi as f64;
        let h = self.height * self.dpi as f64;
        let limit = MAX_PIXEL_SIDE as f64;
        if w.round() > limit || h.round() > limit || (w.round() * h.round()) > MAX_PIXELS as f64 {
            return Err(ChartError::Config(format!(
                "Image size {:.0}x{:.0} pixels is too large; each side must be at most {} and the area at most {} pixels",
                w, h, MAX_PIXEL_SIDE, MAX_PIXELS
            )));
        }
        let (w, h) = self.pixel_size();
        if w == 0 || h == 0 {
            return Err(ChartError::Config(format!(
                "Chart would be {}x{} pixels; increase the size or DPI",
                w, h
            )));
        }

        if self.bins == 0 || self.bins > MAX_BINS {
            return Err(ChartError::Config(format!(
                "--bins must be between 1 and {} (got {})",
                MAX_BINS, self.bins
            )));
        }
        Ok(())
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 10.0,
            height: 6.0,
            dpi: 100,
            title: None,
            x_label: None,
            y_label: None,
            theme: theme::Theme::default(),
            bins: 10,
            fill: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pixel_size() {
        assert_eq!(RenderOptions::default().pixel_size(), (1000, 600));
        assert!(RenderOptions::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_sizes() {
        let opts = RenderOptions {
            width: 0.0,
            ..Default::default()
        };
        assert_eq!(opts.validate().unwrap_err().kind(), ErrorKind::Configuration);

        let opts = RenderOptions {
            bins: 0,
            ..Default::default()
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_images() {
        for (width, height, dpi) in [
            (f64::INFINITY, 6.0, 100),
            (10.0, f64::NAN, 100),
            (100_000.0, 6.0, 100),
            (10.0, 6.0, 10_000),
            (600.0, 600.0, 100),
        ] {
            let opts = RenderOptions {
                width,
                height,
                dpi,
                ..Default::default()
            };
            let err = opts.validate().unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Configuration, "{} x {} @ {}", width, height, dpi);
        }

        let opts = RenderOptions {
            width: 655.0,
            height: 1.0,
            dpi: 100,
            ..Default::default()
        };
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_huge_bin_counts() {
        let opts = RenderOptions {
            bins: MAX_BINS + 1,
            ..Default::default()
        };
        assert!(opts.validate().unwrap_err().to_string().contains("--bins"));

        let opts = RenderOptions {
            bins: MAX_BINS,
            ..Default::default()
        };
        assert!(opts.validate().is_ok());
    }
}
