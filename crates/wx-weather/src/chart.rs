//! Hourly temperature line chart.
//!
//! [`render_chart`] draws onto anything implementing [`Surface`]: a
//! [`RecordingSurface`] that keeps the draw calls in memory, or a
//! [`BackendSurface`] wrapping a `plotters` drawing backend (SVG, bitmap).
//!
//! Layout: fixed margins around an inner plotting area, horizontal gridlines
//! at quarter heights, y labels for max/mid/min on the left and an hour label
//! under every third sample.

use plotters_backend::text_anchor::{HPos, Pos, VPos};
use plotters_backend::{
    BackendColor, BackendCoord, BackendStyle, BackendTextStyle, DrawingBackend,
    DrawingErrorKind, FontFamily,
};

use crate::format::{fmt_hour, round_half_up};
use crate::types::{HourlyPoint, TemperatureUnit};

/// Surface position in pixels, origin top-left.
pub type Point = (f64, f64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

pub const GRID_COLOR: Rgb = Rgb(0x24, 0x32, 0x44);
pub const LABEL_COLOR: Rgb = Rgb(0x94, 0xa3, 0xb8);
pub const LINE_COLOR: Rgb = Rgb(0x38, 0xbd, 0xf8);

const AXIS_FONT_SIZE: f64 = 12.0;
const HOUR_FONT_SIZE: f64 = 11.0;
const LINE_WIDTH: u32 = 2;
const MARKER_RADIUS: f64 = 2.0;
const GRID_BANDS: usize = 4;
const HOUR_LABEL_EVERY: usize = 3;

/// Space between the surface edge and the plotting area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

pub const MARGINS: Margins = Margins {
    left: 36.0,
    right: 12.0,
    top: 10.0,
    bottom: 28.0,
};

/// A fixed-size 2D drawing target.
pub trait Surface {
    fn size(&self) -> (u32, u32);
    fn clear(&mut self);
    fn stroke_segments(&mut self, segments: &[(Point, Point)], color: Rgb, width: u32);
    fn stroke_polyline(&mut self, points: &[Point], color: Rgb, width: u32);
    fn fill_circle(&mut self, center: Point, radius: f64, color: Rgb);
    /// `at` is the left end of the text baseline.
    fn fill_text(&mut self, text: &str, at: Point, color: Rgb, size: f64);
}

/// What [`render_chart`] drew.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartFrame {
    pub y_min: f64,
    pub y_max: f64,
    /// One point per sample, in sample order
    pub points: Vec<Point>,
    /// x position and text of every hour label
    pub hour_ticks: Vec<(f64, String)>,
}

/// Padded vertical range for already-converted temperatures.
///
/// Pads by 15% of the span (at least one degree) and widens to whole
/// degrees, so the result strictly contains `[min, max]`.
pub fn vertical_range(temps: &[f64]) -> (f64, f64) {
    let min = temps.iter().copied().fold(f64::INFINITY, f64::min);
    let max = temps.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let pad = ((max - min) * 0.15).max(1.0);
    ((min - pad).floor(), (max + pad).ceil())
}

/// Draw `samples` (Celsius) as a line chart in `unit`.
///
/// `samples` must be non-empty; an empty slice only clears the surface.
pub fn render_chart<S: Surface + ?Sized>(
    surface: &mut S,
    samples: &[HourlyPoint],
    unit: TemperatureUnit,
) -> ChartFrame {
    surface.clear();
    if samples.is_empty() {
        return ChartFrame::default();
    }

    let temps: Vec<f64> = samples.iter().map(|s| unit.convert(s.temperature)).collect();
    let (w, h) = surface.size();
    let (w, h) = (f64::from(w), f64::from(h));
    let m = MARGINS;
    let inner_w = w - m.left - m.right;
    let inner_h = h - m.top - m.bottom;

    let (y_min, y_max) = vertical_range(&temps);
    let last = (temps.len() - 1) as f64;
    let x_at = |i: usize| {
        if temps.len() == 1 {
            m.left + inner_w / 2.0
        } else {
            m.left + inner_w * i as f64 / last
        }
    };
    let y_at = |t: f64| m.top + inner_h * (1.0 - (t - y_min) / (y_max - y_min));

    let grid: Vec<(Point, Point)> = (0..=GRID_BANDS)
        .map(|i| {
            let y = m.top + inner_h * i as f64 / GRID_BANDS as f64;
            ((m.left, y), (w - m.right, y))
        })
        .collect();
    surface.stroke_segments(&grid, GRID_COLOR, 1);

    let axis_labels = [y_max, (y_max + y_min) / 2.0, y_min];
    for (i, value) in axis_labels.iter().enumerate() {
        let y = m.top + inner_h * i as f64 / 2.0;
        let text = format!("{}°", round_half_up(*value));
        surface.fill_text(&text, (4.0, y + 4.0), LABEL_COLOR, AXIS_FONT_SIZE);
    }

    let points: Vec<Point> = temps
        .iter()
        .enumerate()
        .map(|(i, t)| (x_at(i), y_at(*t)))
        .collect();
    surface.stroke_polyline(&points, LINE_COLOR, LINE_WIDTH);
    for p in &points {
        surface.fill_circle(*p, MARKER_RADIUS, LINE_COLOR);
    }

    let mut hour_ticks = Vec::new();
    for (i, sample) in samples.iter().enumerate().step_by(HOUR_LABEL_EVERY) {
        let x = x_at(i);
        let label = fmt_hour(sample.time);
        surface.fill_text(&label, (x - 8.0, h - 8.0), LABEL_COLOR, HOUR_FONT_SIZE);
        hour_ticks.push((x, label));
    }

    ChartFrame {
        y_min,
        y_max,
        points,
        hour_ticks,
    }
}

/// A recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Clear,
    Segments {
        segments: Vec<(Point, Point)>,
        color: Rgb,
        width: u32,
    },
    Polyline {
        points: Vec<Point>,
        color: Rgb,
        width: u32,
    },
    Circle {
        center: Point,
        radius: f64,
        color: Rgb,
    },
    Text {
        text: String,
        at: Point,
        color: Rgb,
        size: f64,
    },
}

/// Surface that only remembers what was drawn.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    pub ops: Vec<DrawOp>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    /// Texts drawn with the given font size, in draw order.
    pub fn texts_of_size(&self, size: f64) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, size: s, .. } if *s == size => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn hour_labels(&self) -> Vec<&str> {
        self.texts_of_size(HOUR_FONT_SIZE)
    }

    pub fn axis_labels(&self) -> Vec<&str> {
        self.texts_of_size(AXIS_FONT_SIZE)
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.ops.clear();
        self.ops.push(DrawOp::Clear);
    }

    fn stroke_segments(&mut self, segments: &[(Point, Point)], color: Rgb, width: u32) {
        self.ops.push(DrawOp::Segments {
            segments: segments.to_vec(),
            color,
            width,
        });
    }

    fn stroke_polyline(&mut self, points: &[Point], color: Rgb, width: u32) {
        self.ops.push(DrawOp::Polyline {
            points: points.to_vec(),
            color,
            width,
        });
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Rgb) {
        self.ops.push(DrawOp::Circle {
            center,
            radius,
            color,
        });
    }

    fn fill_text(&mut self, text: &str, at: Point, color: Rgb, size: f64) {
        self.ops.push(DrawOp::Text {
            text: text.to_string(),
            at,
            color,
            size,
        });
    }
}

fn backend_color(c: Rgb) -> BackendColor {
    BackendColor {
        alpha: 1.0,
        rgb: (c.0, c.1, c.2),
    }
}

fn backend_coord(p: Point) -> BackendCoord {
    (p.0.round() as i32, p.1.round() as i32)
}

struct Pen {
    color: BackendColor,
    width: u32,
}

impl BackendStyle for Pen {
    fn color(&self) -> BackendColor {
        self.color
    }

    fn stroke_width(&self) -> u32 {
        self.width
    }
}

struct Label {
    color: BackendColor,
    size: f64,
}

impl BackendTextStyle for Label {
    type FontError = std::convert::Infallible;

    fn color(&self) -> BackendColor {
        self.color
    }

    fn size(&self) -> f64 {
        self.size
    }

    fn family(&self) -> FontFamily<'_> {
        FontFamily::SansSerif
    }

    // Backends default to a top-left anchor; surface positions are baselines.
    fn anchor(&self) -> Pos {
        Pos::new(HPos::Left, VPos::Bottom)
    }

    // Vector backends never rasterise glyphs; a rough box is enough.
    fn layout_box(&self, text: &str) -> Result<((i32, i32), (i32, i32)), Self::FontError> {
        let width = (text.chars().count() as f64 * self.size * 0.6).round() as i32;
        Ok(((0, -(self.size.round() as i32)), (width, 0)))
    }

    fn draw<E, DrawFunc: FnMut(i32, i32, BackendColor) -> Result<(), E>>(
        &self,
        _text: &str,
        _pos: BackendCoord,
        _draw: DrawFunc,
    ) -> Result<Result<(), E>, Self::FontError> {
        Ok(Ok(()))
    }
}

/// [`Surface`] over a `plotters` drawing backend.
///
/// Backend failures don't interrupt drawing; the first one is reported by
/// [`BackendSurface::finish`].
pub struct BackendSurface<DB: DrawingBackend> {
    backend: DB,
    background: Rgb,
    error: Option<DrawingErrorKind<DB::ErrorType>>,
}

impl<DB: DrawingBackend> BackendSurface<DB> {
    pub fn new(backend: DB, background: Rgb) -> Self {
        let mut surface = Self {
            backend,
            background,
            error: None,
        };
        let prepared = surface.backend.ensure_prepared();
        surface.keep(prepared);
        surface
    }

    fn keep(&mut self, result: Result<(), DrawingErrorKind<DB::ErrorType>>) {
        if let Err(e) = result {
            tracing::warn!("Chart backend error: {}", e);
            self.error.get_or_insert(e);
        }
    }

    /// Flush the backend and report the first drawing error, if any.
    pub fn finish(mut self) -> Result<(), DrawingErrorKind<DB::ErrorType>> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.backend.present()
    }
}

impl<DB: DrawingBackend> Surface for BackendSurface<DB> {
    fn size(&self) -> (u32, u32) {
        self.backend.get_size()
    }

    fn clear(&mut self) {
        let (w, h) = self.backend.get_size();
        let pen = Pen {
            color: backend_color(self.background),
            width: 1,
        };
        let result = self.backend.draw_rect((0, 0), (w as i32, h as i32), &pen, true);
        self.keep(result);
    }

    fn stroke_segments(&mut self, segments: &[(Point, Point)], color: Rgb, width: u32) {
        let pen = Pen {
            color: backend_color(color),
            width,
        };
        for (from, to) in segments {
            let result = self
                .backend
                .draw_line(backend_coord(*from), backend_coord(*to), &pen);
            self.keep(result);
        }
    }

    fn stroke_polyline(&mut self, points: &[Point], color: Rgb, width: u32) {
        let pen = Pen {
            color: backend_color(color),
            width,
        };
        let path: Vec<BackendCoord> = points.iter().copied().map(backend_coord).collect();
        let result = self.backend.draw_path(path, &pen);
        self.keep(result);
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Rgb) {
        let pen = Pen {
            color: backend_color(color),
            width: 1,
        };
        let result = self.backend.draw_circle(
            backend_coord(center),
            radius.round().max(1.0) as u32,
            &pen,
            true,
        );
        self.keep(result);
    }

    fn fill_text(&mut self, text: &str, at: Point, color: Rgb, size: f64) {
        let style = Label {
            color: backend_color(color),
            size,
        };
        let result = self.backend.draw_text(text, &style, backend_coord(at));
        self.keep(result);
    }
}
