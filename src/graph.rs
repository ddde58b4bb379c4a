use crate::theme::Theme;
use crate::RenderOptions;
use anyhow::{bail, Context, Result};
use image::ImageEncoder;
use plotters::chart::ChartContext;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontDesc, FontFamily, FontStyle, TextStyle};
use std::f64::consts::{FRAC_PI_2, TAU};
use std::ops::Range;

type Backend<'a> = BitMapBackend<'a>;
type Area<'a> = DrawingArea<Backend<'a>, Shift>;
type XYChart<'a, 'b> = ChartContext<'a, Backend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// One named column of numbers
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

/// Everything about a chart's look that is not data
struct Decor {
    theme: Theme,
    /// Multiplier from 100 dpi reference sizes to pixels
    scale: f64,
    title: Option<String>,
    x_label: Option<String>,
    y_label: Option<String>,
}

impl Decor {
    fn text(&self, size: f64) -> TextStyle<'static> {
        FontDesc::new(FontFamily::SansSerif, size * self.scale, FontStyle::Normal)
            .color(&self.theme.foreground)
    }

    fn px(&self, size: f64) -> u32 {
        (size * self.scale).round().max(1.0) as u32
    }
}

/// Canvas for a single chart, drawn into an RGB buffer
pub struct Canvas {
    buffer: Vec<u8>,
    width: u32,
    height: u32,
    decor: Decor,
}

impl Canvas {
    /// Create a blank canvas sized from `options`.
    ///
    /// Axis labels are dropped when `with_axes` is false.
    pub fn new(options: &RenderOptions, with_axes: bool) -> Result<Self> {
        let (width, height) = options.pixel_size();
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(3))
            .with_context(|| format!("Image size {}x{} pixels is too large", width, height))?;
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(len)
            .with_context(|| format!("Cannot allocate a {}x{} pixel image", width, height))?;
        buffer.resize(len, 0u8);

        Ok(Canvas {
            buffer,
            width,
            height,
            decor: Decor {
                theme: options.theme.clone(),
                scale: options.dpi as f64 / 100.0,
                title: options.title.clone(),
                x_label: options.x_label.clone().filter(|_| with_axes),
                y_label: options.y_label.clone().filter(|_| with_axes),
            },
        })
    }

    fn split(&mut self) -> (&Decor, Area<'_>) {
        let root = BitMapBackend::with_buffer(&mut self.buffer, (self.width, self.height))
            .into_drawing_area();
        (&self.decor, root)
    }

    /// Bars per category; several series are placed side by side
    pub fn draw_bars(&mut self, categories: &[String], series: &[Series]) -> Result<()> {
        check_series(categories.len(), series)?;
        let (decor, root) = self.split();
        root.fill(&decor.theme.background)
            .context("Failed to fill background")?;

        let values = series.iter().flat_map(|s| s.values.iter().copied());
        let mut chart = build_chart(decor, &root, category_range(categories.len()), padded_range(values, true))?;
        draw_mesh(decor, &mut chart, Some(categories))?;

        let bar_width = 0.8 / series.len() as f64;
        for (series_idx, s) in series.iter().enumerate() {
            let color = decor.theme.series_color(series_idx);
            let offset = (series_idx as f64 - (series.len() as f64 - 1.0) / 2.0) * bar_width;

            let anno = chart
                .draw_series(s.values.iter().enumerate().map(|(cat_idx, &y_val)| {
                    let x_center = cat_idx as f64 + offset;
                    Rectangle::new(
                        [
                            (x_center - bar_width / 2.0, 0.0),
                            (x_center + bar_width / 2.0, y_val),
                        ],
                        color.filled(),
                    )
                }))
                .context("Failed to draw bars")?;

            if series.len() > 1 {
                anno.label(&s.name).legend(move |(x, y)| {
                    Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled())
                });
            }
        }

        if series.len() > 1 {
            draw_legend(decor, &mut chart)?;
        }
        root.present().context("Failed to present drawing")?;
        Ok(())
    }

    /// One line with point markers per series over categorical x positions
    pub fn draw_lines(&mut self, categories: &[String], series: &[Series]) -> Result<()> {
        check_series(categories.len(), series)?;
        let (decor, root) = self.split();
        root.fill(&decor.theme.background)
            .context("Failed to fill background")?;

        let values = series.iter().flat_map(|s| s.values.iter().copied());
        let mut chart = build_chart(decor, &root, category_range(categories.len()), padded_range(values, false))?;
        draw_mesh(decor, &mut chart, Some(categories))?;

        let stroke = decor.px(2.0);
        let marker = decor.px(4.0) as i32;
        for (series_idx, s) in series.iter().enumerate() {
            let color = decor.theme.series_color(series_idx);
            let points: Vec<(f64, f64)> = s
                .values
                .iter()
                .enumerate()
                .map(|(i, &y)| (i as f64, y))
                .collect();

            let anno = chart
                .draw_series(LineSeries::new(points.clone(), color.stroke_width(stroke)))
                .context("Failed to draw line series")?;
            if series.len() > 1 {
                anno.label(&s.name).legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(stroke))
                });
            }

            chart
                .draw_series(points.into_iter().map(|p| Circle::new(p, marker, color.filled())))
                .context("Failed to draw line markers")?;
        }

        if series.len() > 1 {
            draw_legend(decor, &mut chart)?;
        }
        root.present().context("Failed to present drawing")?;
        Ok(())
    }

    /// Points at numeric (x, y) positions, one colour per series
    pub fn draw_scatter(&mut self, x_data: &[f64], series: &[Series]) -> Result<()> {
        check_series(x_data.len(), series)?;
        let (decor, root) = self.split();
        root.fill(&decor.theme.background)
            .context("Failed to fill background")?;

        let x_range = padded_range(x_data.iter().copied(), false);
        let y_range = padded_range(series.iter().flat_map(|s| s.values.iter().copied()), false);
        let mut chart = build_chart(decor, &root, x_range, y_range)?;
        draw_mesh(decor, &mut chart, None)?;

        let size = decor.px(4.0) as i32;
        for (series_idx, s) in series.iter().enumerate() {
            let color = decor.theme.series_color(series_idx);
            let anno = chart
                .draw_series(
                    x_data
                        .iter()
                        .zip(&s.values)
                        .map(|(&x, &y)| Circle::new((x, y), size, color.filled())),
                )
                .context("Failed to draw point series")?;
            if series.len() > 1 {
                anno.label(&s.name)
                    .legend(move |(x, y)| Circle::new((x + 5, y), 4, color.filled()));
            }
        }

        if series.len() > 1 {
            draw_legend(decor, &mut chart)?;
        }
        root.present().context("Failed to present drawing")?;
        Ok(())
    }

    /// Equal-width buckets over `values`
    pub fn draw_histogram(&mut self, values: &[f64], bins: usize) -> Result<()> {
        let histogram = Histogram::compute(values, bins)?;
        let (decor, root) = self.split();
        root.fill(&decor.theme.background)
            .context("Failed to fill background")?;

        let max_count = histogram.counts.iter().copied().max().unwrap_or(0).max(1) as f64;
        let mut chart = build_chart(decor, &root, histogram.start..histogram.end(), 0.0..max_count * 1.05)?;
        draw_mesh(decor, &mut chart, None)?;

        let color = decor.theme.series_color(0);
        let outline = decor.theme.background;
        chart
            .draw_series(histogram.counts.iter().enumerate().map(|(i, &count)| {
                let left = histogram.start + i as f64 * histogram.width;
                Rectangle::new([(left, 0.0), (left + histogram.width, count as f64)], color.filled())
            }))
            .context("Failed to draw histogram")?;
        chart
            .draw_series(histogram.counts.iter().enumerate().map(|(i, &count)| {
                let left = histogram.start + i as f64 * histogram.width;
                Rectangle::new([(left, 0.0), (left + histogram.width, count as f64)], outline.stroke_width(1))
            }))
            .context("Failed to draw histogram outlines")?;

        root.present().context("Failed to present drawing")?;
        Ok(())
    }

    /// Slices proportional to `values`, labelled and annotated with percentages
    pub fn draw_pie(&mut self, labels: &[String], values: &[f64]) -> Result<()> {
        if labels.len() != values.len() {
            bail!(
                "Labels and values must have the same length (labels: {}, values: {})",
                labels.len(),
                values.len()
            );
        }
        if let Some(negative) = values.iter().find(|v| **v < 0.0) {
            bail!("Pie chart values must not be negative (found {})", negative);
        }
        let total: f64 = values.iter().sum();
        if !(total > 0.0) || !total.is_finite() {
            bail!("Pie chart values must sum to a positive number");
        }

        let (decor, root) = self.split();
        root.fill(&decor.theme.background)
            .context("Failed to fill background")?;
        let area = titled_area(decor, &root)?;

        let (w, h) = area.dim_in_pixel();
        let center = (w as i32 / 2, h as i32 / 2);
        let radius = w.min(h) as f64 * 0.35;
        let centered = decor.text(11.0).pos(Pos::new(HPos::Center, VPos::Center));

        let mut start = 0.0;
        for (i, (label, &value)) in labels.iter().zip(values).enumerate() {
            let sweep = value / total * TAU;
            if sweep <= 0.0 {
                continue;
            }
            let color = decor.theme.series_color(i);

            let steps = (sweep.to_degrees().ceil() as usize).max(2);
            let mut points = Vec::with_capacity(steps + 2);
            points.push(center);
            points.extend((0..=steps).map(|s| polar(center, radius, start + sweep * s as f64 / steps as f64)));
            area.draw(&Polygon::new(points, color.filled()))
                .context("Failed to draw slice")?;

            let mid = start + sweep / 2.0;
            area.draw(&Text::new(
                label.clone(),
                polar(center, radius * 1.12, mid),
                decor.text(12.0).pos(outer_anchor(mid)),
            ))
            .context("Failed to draw slice label")?;
            area.draw(&Text::new(
                format!("{:.1}%", value / total * 100.0),
                polar(center, radius * 0.6, mid),
                centered.clone(),
            ))
            .context("Failed to draw slice percentage")?;

            start += sweep;
        }

        root.present().context("Failed to present drawing")?;
        Ok(())
    }

    /// One spoke per label, one polygon per series
    pub fn draw_radar(&mut self, labels: &[String], series: &[Series], fill: bool) -> Result<()> {
        check_series(labels.len(), series)?;
        let (decor, root) = self.split();
        root.fill(&decor.theme.background)
            .context("Failed to fill background")?;
        let area = titled_area(decor, &root)?;

        let (w, h) = area.dim_in_pixel();
        let center = (w as i32 / 2, h as i32 / 2);
        let radius = w.min(h) as f64 * 0.36;
        let spokes = labels.len();
        let angle = |k: usize| FRAC_PI_2 - TAU * k as f64 / spokes as f64;

        let max_value = series
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .filter(|v| v.is_finite())
            .fold(0.0_f64, f64::max);
        let max_value = if max_value > 0.0 { max_value } else { 1.0 };

        // rings and spokes
        let grid = decor.theme.grid.stroke_width(1);
        for ring in 1..=4 {
            let r = radius * ring as f64 / 4.0;
            let mut outline: Vec<(i32, i32)> = (0..spokes).map(|k| polar(center, r, angle(k))).collect();
            outline.push(outline[0]);
            area.draw(&PathElement::new(outline, grid))
                .context("Failed to draw radar grid")?;
            area.draw(&Text::new(
                crate::caption::fmt_num(max_value * ring as f64 / 4.0),
                polar(center, r, angle(0)),
                decor.text(9.0).pos(Pos::new(HPos::Left, VPos::Bottom)),
            ))
            .context("Failed to draw radar scale")?;
        }
        for (k, label) in labels.iter().enumerate() {
            area.draw(&PathElement::new(vec![center, polar(center, radius, angle(k))], grid))
                .context("Failed to draw radar spoke")?;
            area.draw(&Text::new(
                label.clone(),
                polar(center, radius * 1.1, angle(k)),
                decor.text(12.0).pos(outer_anchor(angle(k))),
            ))
            .context("Failed to draw radar label")?;
        }

        let stroke = decor.px(2.0);
        for (series_idx, s) in series.iter().enumerate() {
            let color = decor.theme.series_color(series_idx);
            let mut vertices: Vec<(i32, i32)> = s
                .values
                .iter()
                .enumerate()
                .map(|(k, &v)| {
                    let share = if v.is_finite() { (v / max_value).clamp(0.0, 1.0) } else { 0.0 };
                    polar(center, radius * share, angle(k))
                })
                .collect();

            if fill {
                area.draw(&Polygon::new(vertices.clone(), color.mix(0.25).filled()))
                    .context("Failed to fill radar series")?;
            }
            for &v in &vertices {
                area.draw(&Circle::new(v, decor.px(3.0) as i32, color.filled()))
                    .context("Failed to draw radar marker")?;
            }
            vertices.push(vertices[0]);
            area.draw(&PathElement::new(vertices, color.stroke_width(stroke)))
                .context("Failed to draw radar series")?;
        }

        if series.len() > 1 {
            let row_height = decor.px(18.0) as i32;
            let swatch = decor.px(10.0) as i32;
            for (series_idx, s) in series.iter().enumerate() {
                let y = row_height * (series_idx as i32 + 1);
                let color = decor.theme.series_color(series_idx);
                area.draw(&Rectangle::new([(10, y - swatch / 2), (10 + swatch, y + swatch / 2)], color.filled()))
                    .context("Failed to draw legend swatch")?;
                area.draw(&Text::new(
                    s.name.clone(),
                    (16 + swatch, y),
                    decor.text(11.0).pos(Pos::new(HPos::Left, VPos::Center)),
                ))
                .context("Failed to draw legend label")?;
            }
        }

        root.present().context("Failed to present drawing")?;
        Ok(())
    }

    /// Finalize and encode the canvas as PNG
    pub fn render(self) -> Result<Vec<u8>> {
        let mut png_bytes = Vec::new();
        {
            let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
            encoder
                .write_image(
                    &self.buffer,
                    self.width,
                    self.height,
                    image::ColorType::Rgb8,
                )
                .context("Failed to encode PNG")?;
        }

        Ok(png_bytes)
    }
}

/// Bucket counts for a histogram
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub start: f64,
    pub width: f64,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Split the value range into `bins` equal buckets; the last bucket is closed on the right
    pub fn compute(values: &[f64], bins: usize) -> Result<Self> {
        if bins == 0 {
            bail!("Histogram needs at least one bin");
        }
        if values.is_empty() {
            bail!("Cannot draw a histogram with no values");
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            bail!("Histogram values must be finite (found {})", bad);
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let (start, end) = if min == max { (min - 0.5, max + 0.5) } else { (min, max) };
        let width = (end - start) / bins as f64;

        let mut counts = vec![0usize; bins];
        for &v in values {
            let idx = (((v - start) / width).floor() as usize).min(bins - 1);
            counts[idx] += 1;
        }

        Ok(Histogram { start, width, counts })
    }

    pub fn end(&self) -> f64 {
        self.start + self.width * self.counts.len() as f64
    }
}

fn check_series(expected: usize, series: &[Series]) -> Result<()> {
    if expected == 0 {
        bail!("Cannot create a chart with no data points");
    }
    if series.is_empty() {
        bail!("Cannot create a chart with no series");
    }
    for s in series {
        if s.values.len() != expected {
            bail!(
                "Series '{}' has {} values but there are {} categories",
                s.name,
                s.values.len(),
                expected
            );
        }
    }
    Ok(())
}

fn build_chart<'a, 'b>(
    decor: &Decor,
    root: &'a Area<'b>,
    x_range: Range<f64>,
    y_range: Range<f64>,
) -> Result<XYChart<'a, 'b>> {
    let mut builder = ChartBuilder::on(root);
    builder
        .margin(decor.px(10.0))
        .x_label_area_size(decor.px(40.0))
        .y_label_area_size(decor.px(60.0));
    if let Some(title) = &decor.title {
        builder.caption(title, decor.text(20.0));
    }
    builder
        .build_cartesian_2d(x_range, y_range)
        .context("Failed to build chart")
}

fn draw_mesh(decor: &Decor, chart: &mut XYChart<'_, '_>, categories: Option<&[String]>) -> Result<()> {
    let formatter = |x: &f64| {
        categories
            .map(|categories| category_label(categories, *x))
            .unwrap_or_default()
    };

    let mut mesh = chart.configure_mesh();
    mesh.axis_style(decor.theme.foreground.stroke_width(1))
        .bold_line_style(decor.theme.grid.stroke_width(1))
        .light_line_style(decor.theme.background.stroke_width(1))
        .label_style(decor.text(12.0))
        .axis_desc_style(decor.text(14.0));
    if let Some(categories) = categories {
        mesh.x_labels(categories.len())
            .x_label_formatter(&formatter)
            .disable_x_mesh();
    }
    if let Some(label) = &decor.x_label {
        mesh.x_desc(label.as_str());
    }
    if let Some(label) = &decor.y_label {
        mesh.y_desc(label.as_str());
    }
    mesh.draw().context("Failed to draw mesh")?;
    Ok(())
}

fn draw_legend<'a, 'b: 'a>(decor: &Decor, chart: &mut XYChart<'a, 'b>) -> Result<()> {
    chart
        .configure_series_labels()
        .background_style(decor.theme.background.mix(0.8).filled())
        .border_style(decor.theme.foreground.stroke_width(1))
        .label_font(decor.text(12.0))
        .position(SeriesLabelPosition::UpperRight)
        .draw()
        .context("Failed to draw legend")?;
    Ok(())
}

fn titled_area<'a>(decor: &Decor, root: &Area<'a>) -> Result<Area<'a>> {
    match &decor.title {
        Some(title) => root
            .titled(title, decor.text(20.0))
            .context("Failed to draw title"),
        None => Ok(root.clone()),
    }
}

/// Categories sit at integer positions with half a slot either side
fn category_range(count: usize) -> Range<f64> {
    -0.5..(count as f64 - 0.5)
}

/// Tick label for a categorical axis; ticks between categories stay blank
fn category_label(categories: &[String], x: f64) -> String {
    let nearest = x.round();
    if (x - nearest).abs() > 1e-6 || nearest < 0.0 {
        return String::new();
    }
    categories.get(nearest as usize).cloned().unwrap_or_default()
}

/// Data range padded by 5% on each side, optionally stretched to include zero
fn padded_range(values: impl Iterator<Item = f64>, include_zero: bool) -> Range<f64> {
    let (mut min, mut max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if min > max {
        return 0.0..1.0;
    }
    if include_zero {
        min = min.min(0.0);
        max = max.max(0.0);
    }

    if min == max {
        return (min - 1.0)..(max + 1.0);
    }
    let padding = (max - min) * 0.05;
    let lo = if include_zero && min == 0.0 { 0.0 } else { min - padding };
    let hi = if include_zero && max == 0.0 { 0.0 } else { max + padding };
    lo..hi
}

fn polar(center: (i32, i32), radius: f64, angle: f64) -> (i32, i32) {
    (
        center.0 + (radius * angle.cos()).round() as i32,
        center.1 - (radius * angle.sin()).round() as i32,
    )
}

/// Anchor for text placed outside a circle at `angle`
fn outer_anchor(angle: f64) -> Pos {
    let cos = angle.cos();
    let h = if cos > 0.1 {
        HPos::Left
    } else if cos < -0.1 {
        HPos::Right
    } else {
        HPos::Center
    };
    Pos::new(h, VPos::Center)
}
