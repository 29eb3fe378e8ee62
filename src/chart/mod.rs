/// CO2 trajectory chart
///
/// Renders concentration vs. calendar year into a PNG, with reference lines for
/// the current level and the toxicity threshold and a marker at the crossing year.

pub mod glyphs;

use crate::constants::{CHART_YEARS_AFTER_CROSSING, DEFAULT_CHART_PATH, MAX_CHART_YEARS_AFTER_CROSSING};
use crate::error::{ProjectionError, ProjectionResult};
use crate::projection::{Projection, ProjectionEngine, ThresholdCrossing, YearRecord};
use crate::projection_params::ProjectionParams;
use glyphs::{GLYPH_HEIGHT, draw_text, text_width};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Colors used by the chart, as RGB triples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartPalette {
    pub background: [u8; 3],
    pub trajectory: [u8; 3],
    pub threshold: [u8; 3],
    pub current_level: [u8; 3],
    pub crossing_marker: [u8; 3],
    pub grid: [u8; 3],
    pub axis: [u8; 3],
}

impl Default for ChartPalette {
    fn default() -> Self {
        Self {
            background: [255, 255, 255],
            trajectory: [220, 20, 20],
            threshold: [139, 0, 0],
            current_level: [0, 128, 0],
            crossing_marker: [0, 0, 0],
            grid: [215, 215, 215],
            axis: [60, 60, 60],
        }
    }
}

/// Layout of the trajectory chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
    pub margin_left: u32,
    pub margin_right: u32,
    pub margin_top: u32,
    pub margin_bottom: u32,
    /// Years drawn past the crossing before the plot is cut off, capped at
    /// `MAX_CHART_YEARS_AFTER_CROSSING`
    pub years_after_crossing: u32,
    pub line_thickness: u32,
    pub text_scale: u32,
    pub palette: ChartPalette,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 800,
            margin_left: 110,
            margin_right: 40,
            margin_top: 60,
            margin_bottom: 150,
            years_after_crossing: CHART_YEARS_AFTER_CROSSING,
            line_thickness: 3,
            text_scale: 2,
            palette: ChartPalette::default(),
        }
    }
}

impl ChartConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_years_after_crossing(mut self, years: u32) -> Self {
        self.years_after_crossing = years;
        self
    }

    fn plot_width(&self) -> u32 {
        self.width.saturating_sub(self.margin_left + self.margin_right)
    }

    fn plot_height(&self) -> u32 {
        self.height.saturating_sub(self.margin_top + self.margin_bottom)
    }
}

/// Maps calendar years and ppm onto pixel coordinates inside the plot area
#[derive(Debug, Clone, Copy)]
struct PlotFrame {
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

impl PlotFrame {
    fn x(&self, year: f64) -> f32 {
        let t = (year - self.x_min) / (self.x_max - self.x_min);
        self.left + (t as f32) * (self.right - self.left)
    }

    fn y(&self, ppm: f64) -> f32 {
        let t = (ppm - self.y_min) / (self.y_max - self.y_min);
        self.bottom - (t as f32) * (self.bottom - self.top)
    }
}

/// Tick spacing of 1, 2 or 5 times a power of ten giving roughly `target` ticks
fn nice_step(span: f64, target: u32) -> f64 {
    let raw = span / target.max(1) as f64;
    if raw <= 0.0 || !raw.is_finite() {
        return 1.0;
    }
    let magnitude = 10f64.powf(raw.log10().floor());
    let normalized = raw / magnitude;
    let nice = if normalized <= 1.0 {
        1.0
    } else if normalized <= 2.0 {
        2.0
    } else if normalized <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

fn ticks(min: f64, max: f64, step: f64) -> Vec<f64> {
    let mut out = Vec::new();
    let mut t = (min / step).ceil() * step;
    while t <= max + step * 1e-9 {
        out.push(t);
        t += step;
    }
    out
}

fn draw_thick_segment(image: &mut RgbImage, a: (f32, f32), b: (f32, f32), thickness: u32, color: Rgb<u8>) {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len = (dx * dx + dy * dy).sqrt();
    if thickness <= 1 || len == 0.0 {
        draw_line_segment_mut(image, a, b, color);
        return;
    }
    // Offset copies of the segment along its normal
    let (nx, ny) = (-dy / len, dx / len);
    let half = (thickness as f32 - 1.0) / 2.0;
    for i in 0..thickness {
        let o = i as f32 - half;
        draw_line_segment_mut(
            image,
            (a.0 + nx * o, a.1 + ny * o),
            (b.0 + nx * o, b.1 + ny * o),
            color,
        );
    }
}

fn draw_dashed_segment(
    image: &mut RgbImage,
    a: (f32, f32),
    b: (f32, f32),
    dash: f32,
    gap: f32,
    thickness: u32,
    color: Rgb<u8>,
) {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 {
        return;
    }
    let (ux, uy) = (dx / len, dy / len);
    let mut pos = 0.0;
    while pos < len {
        let end = (pos + dash).min(len);
        draw_thick_segment(
            image,
            (a.0 + ux * pos, a.1 + uy * pos),
            (a.0 + ux * end, a.1 + uy * end),
            thickness,
            color,
        );
        pos += dash + gap;
    }
}

/// Records to plot: the projection, extended past the crossing when it stopped there
fn plotted_records(
    params: &ProjectionParams,
    projection: &Projection,
    config: &ChartConfig,
) -> ProjectionResult<Vec<YearRecord>> {
    match projection.crossing() {
        ThresholdCrossing::Reached { year } if config.years_after_crossing > 0 => {
            let tail = config.years_after_crossing.min(MAX_CHART_YEARS_AFTER_CROSSING);
            Ok(ProjectionEngine::through_year(params, year.saturating_add(tail))?.collect())
        }
        _ => Ok(projection.records().to_vec()),
    }
}

fn frame_for(records: &[YearRecord], params: &ProjectionParams, config: &ChartConfig) -> PlotFrame {
    let base = params.baseline_year as f64;
    let last_year = records.last().map(|r| r.year).unwrap_or(0).max(1) as f64;

    let (lo, hi) = records.iter().fold(
        (params.initial_concentration_ppm, params.toxicity_threshold_ppm),
        |(lo, hi), r| (lo.min(r.concentration_ppm), hi.max(r.concentration_ppm)),
    );
    let pad = ((hi - lo) * 0.05).max(1.0);

    PlotFrame {
        left: config.margin_left as f32,
        top: config.margin_top as f32,
        right: (config.margin_left + config.plot_width()) as f32,
        bottom: (config.margin_top + config.plot_height()) as f32,
        x_min: base,
        x_max: base + last_year,
        y_min: (lo - pad).max(0.0),
        y_max: hi + pad,
    }
}

fn draw_axes(image: &mut RgbImage, frame: &PlotFrame, config: &ChartConfig) {
    let grid = Rgb(config.palette.grid);
    let axis = Rgb(config.palette.axis);
    let scale = config.text_scale;
    let glyph_h = (GLYPH_HEIGHT * scale) as f32;

    let x_step = nice_step(frame.x_max - frame.x_min, 10);
    for year in ticks(frame.x_min, frame.x_max, x_step) {
        let x = frame.x(year);
        draw_dashed_segment(image, (x, frame.top), (x, frame.bottom), 6.0, 4.0, 1, grid);
        draw_line_segment_mut(image, (x, frame.bottom), (x, frame.bottom + 6.0), axis);
        let label = format!("{year:.0}");
        let w = text_width(&label, scale) as f32;
        draw_text(image, (x - w / 2.0) as i32, (frame.bottom + 12.0) as i32, &label, scale, axis);
    }

    let y_step = nice_step(frame.y_max - frame.y_min, 8);
    for ppm in ticks(frame.y_min, frame.y_max, y_step) {
        let y = frame.y(ppm);
        draw_dashed_segment(image, (frame.left, y), (frame.right, y), 6.0, 4.0, 1, grid);
        draw_line_segment_mut(image, (frame.left - 6.0, y), (frame.left, y), axis);
        let label = format!("{ppm:.0}");
        let w = text_width(&label, scale) as f32;
        draw_text(
            image,
            (frame.left - 12.0 - w) as i32,
            (y - glyph_h / 2.0) as i32,
            &label,
            scale,
            axis,
        );
    }

    draw_hollow_rect_mut(
        image,
        Rect::at(frame.left as i32, frame.top as i32).of_size(
            (frame.right - frame.left) as u32 + 1,
            (frame.bottom - frame.top) as u32 + 1,
        ),
        axis,
    );

    let title = "PROJECTED ATMOSPHERIC CO2 LEVELS";
    let title_w = text_width(title, scale + 1) as f32;
    draw_text(
        image,
        ((frame.left + frame.right - title_w) / 2.0) as i32,
        (frame.top - glyph_h - 24.0) as i32,
        title,
        scale + 1,
        axis,
    );

    let x_label = "YEAR";
    let x_label_w = text_width(x_label, scale) as f32;
    draw_text(
        image,
        ((frame.left + frame.right - x_label_w) / 2.0) as i32,
        (frame.bottom + 20.0 + glyph_h) as i32,
        x_label,
        scale,
        axis,
    );
    draw_text(image, 8, (frame.top - glyph_h - 4.0) as i32, "CO2 PPM", scale, axis);
}

const CAPTION: [&str; 2] = [
    "MODEL ASSUMES EMISSIONS CONTINUE TO GROW BUT AT A DECREASING RATE, WHILE NATURAL SEQUESTRATION SLOWLY DECLINES.",
    "ACTUAL TRAJECTORY WILL DEPEND ON POLICY, TECHNOLOGY, AND NATURAL FEEDBACK LOOPS.",
];

/// Greedy word wrap so no line is wider than `max_width` px at `scale`
fn wrap_to_width(text: &str, max_width: u32, scale: u32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        let candidate = if line.is_empty() {
            word.to_string()
        } else {
            format!("{line} {word}")
        };
        if text_width(&candidate, scale) > max_width && !line.is_empty() {
            lines.push(std::mem::replace(&mut line, word.to_string()));
        } else {
            line = candidate;
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Assumption caption centered below the x-axis label
fn draw_caption(image: &mut RgbImage, frame: &PlotFrame, config: &ChartConfig) {
    let scale = config.text_scale;
    let glyph_h = (GLYPH_HEIGHT * scale) as f32;
    let width = (frame.right - frame.left) as u32;
    let mut y = frame.bottom + 40.0 + 2.0 * glyph_h;
    for line in CAPTION.iter().flat_map(|text| wrap_to_width(text, width, scale)) {
        let w = text_width(&line, scale) as f32;
        draw_text(
            image,
            ((frame.left + frame.right - w) / 2.0) as i32,
            y as i32,
            &line,
            scale,
            Rgb(config.palette.axis),
        );
        y += glyph_h + 8.0;
    }
}

struct LegendEntry {
    color: Rgb<u8>,
    dashed: bool,
    label: String,
}

fn draw_legend(image: &mut RgbImage, frame: &PlotFrame, entries: &[LegendEntry], config: &ChartConfig) {
    let scale = config.text_scale;
    let row_h = (GLYPH_HEIGHT * scale + 10) as i32;
    let swatch_w = 36;
    let label_w = entries
        .iter()
        .map(|e| text_width(&e.label, scale))
        .max()
        .unwrap_or(0) as i32;

    let x0 = frame.left as i32 + 14;
    let y0 = frame.top as i32 + 14;
    let box_w = (swatch_w + 10 + label_w + 20) as u32;
    let box_h = (row_h * entries.len() as i32 + 10) as u32;
    draw_filled_rect_mut(image, Rect::at(x0, y0).of_size(box_w, box_h), Rgb(config.palette.background));
    draw_hollow_rect_mut(image, Rect::at(x0, y0).of_size(box_w, box_h), Rgb(config.palette.grid));

    for (i, entry) in entries.iter().enumerate() {
        let y = y0 + 10 + row_h * i as i32;
        let mid = (y + (GLYPH_HEIGHT * scale) as i32 / 2) as f32;
        let a = ((x0 + 10) as f32, mid);
        let b = ((x0 + 10 + swatch_w) as f32, mid);
        if entry.dashed {
            draw_dashed_segment(image, a, b, 8.0, 4.0, config.line_thickness, entry.color);
        } else {
            draw_thick_segment(image, a, b, config.line_thickness, entry.color);
        }
        draw_text(image, x0 + 20 + swatch_w, y, &entry.label, scale, Rgb(config.palette.axis));
    }
}

/// Draw the trajectory chart for a finished projection. Pure: no file I/O.
pub fn render_trajectory(
    params: &ProjectionParams,
    projection: &Projection,
    config: &ChartConfig,
) -> ProjectionResult<RgbImage> {
    if projection.is_empty() {
        return Err(ProjectionError::Render("projection has no records".to_string()));
    }
    if config.plot_width() < 10 || config.plot_height() < 10 {
        return Err(ProjectionError::Render(format!(
            "{}x{} px leaves no room for the plot area",
            config.width, config.height
        )));
    }

    let records = plotted_records(params, projection, config)?;
    let frame = frame_for(&records, params, config);
    let palette = &config.palette;
    let thickness = config.line_thickness;
    let base = params.baseline_year as f64;

    let mut image = RgbImage::from_pixel(config.width, config.height, Rgb(palette.background));
    draw_axes(&mut image, &frame, config);

    let current_y = frame.y(params.initial_concentration_ppm);
    draw_thick_segment(
        &mut image,
        (frame.left, current_y),
        (frame.right, current_y),
        thickness,
        Rgb(palette.current_level),
    );

    let threshold_y = frame.y(params.toxicity_threshold_ppm);
    draw_dashed_segment(
        &mut image,
        (frame.left, threshold_y),
        (frame.right, threshold_y),
        14.0,
        8.0,
        thickness,
        Rgb(palette.threshold),
    );

    if let Some(year) = projection.crossing_year() {
        let x = frame.x(base + year as f64);
        draw_dashed_segment(
            &mut image,
            (x, frame.top),
            (x, frame.bottom),
            14.0,
            8.0,
            thickness,
            Rgb(palette.crossing_marker),
        );
    }

    let points: Vec<(f32, f32)> = records
        .iter()
        .map(|r| (frame.x(base + r.year as f64), frame.y(r.concentration_ppm)))
        .collect();
    for pair in points.windows(2) {
        draw_thick_segment(&mut image, pair[0], pair[1], thickness, Rgb(palette.trajectory));
    }

    let mut legend = vec![
        LegendEntry {
            color: Rgb(palette.trajectory),
            dashed: false,
            label: "PROJECTED CO2 PPM".to_string(),
        },
        LegendEntry {
            color: Rgb(palette.threshold),
            dashed: true,
            label: format!("TOXIC LEVEL {:.0} PPM", params.toxicity_threshold_ppm),
        },
        LegendEntry {
            color: Rgb(palette.current_level),
            dashed: false,
            label: format!("CURRENT LEVEL {:.0} PPM", params.initial_concentration_ppm),
        },
    ];
    if let Some(year) = projection.crossing_year() {
        legend.push(LegendEntry {
            color: Rgb(palette.crossing_marker),
            dashed: true,
            label: match params.calendar_year(year) {
                Some(calendar_year) => format!("YEAR {calendar_year} TOXIC LEVELS REACHED"),
                None => "TOXIC LEVELS REACHED".to_string(),
            },
        });
    }
    draw_legend(&mut image, &frame, &legend, config);
    draw_caption(&mut image, &frame, config);

    log::debug!(
        "rendered {} points into {}x{} chart",
        points.len(),
        config.width,
        config.height
    );
    Ok(image)
}

/// Render the chart and write it as a PNG to `path`
pub fn save_trajectory_png<P: AsRef<Path>>(
    params: &ProjectionParams,
    projection: &Projection,
    config: &ChartConfig,
    path: P,
) -> ProjectionResult<()> {
    let image = render_trajectory(params, projection, config)?;
    image.save(path.as_ref())?;
    log::info!(
        "wrote {} ({}x{} pixels)",
        path.as_ref().display(),
        config.width,
        config.height
    );
    Ok(())
}

/// Render the default chart to `co2_trajectory.png` in the working directory
pub fn save_default_chart(params: &ProjectionParams, projection: &Projection) -> ProjectionResult<()> {
    save_trajectory_png(params, projection, &ChartConfig::default(), DEFAULT_CHART_PATH)
}
