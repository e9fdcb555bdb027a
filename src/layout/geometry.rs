use chrono::NaiveDate;

use super::types::{GradientStop, LinearGradient, PolylinePrimitive, Primitive};
use crate::config::TimelineConfig;
use crate::ir::DAYS_IN_YEAR;

/// The single date-to-pixel law of the timeline:
/// `x(date) = (date - origin).days * x_scale + x_offset`.
#[derive(Debug, Clone, Copy)]
pub struct DateScale {
    origin: NaiveDate,
    x_scale: f32,
    x_offset: f32,
}

impl DateScale {
    pub fn new(origin: NaiveDate, config: &TimelineConfig) -> Self {
        Self {
            origin,
            x_scale: config.x_scale,
            x_offset: config.x_offset,
        }
    }

    pub fn x(&self, date: NaiveDate) -> f32 {
        (date - self.origin).num_days() as f32 * self.x_scale + self.x_offset
    }

    /// Width of a span of days, without the offset.
    pub fn span(&self, days: i64) -> f32 {
        days as f32 * self.x_scale
    }

    pub fn span_years(&self, years: u32) -> f32 {
        self.span(i64::from(years) * DAYS_IN_YEAR)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerDirection {
    /// Apex above the base.
    Down,
    /// Apex below the base.
    Up,
}

/// Open triangle marking a family member's row on a family connector.
pub fn marker_triangle(
    x: f32,
    y: f32,
    direction: MarkerDirection,
    config: &TimelineConfig,
    stroke: &str,
) -> Primitive {
    let half = config.marker_width / 2.0;
    let apex_y = match direction {
        MarkerDirection::Down => y - config.marker_height,
        MarkerDirection::Up => y + config.marker_height,
    };
    polyline(
        vec![(x - half, y), (x + half, y), (x, apex_y), (x - half, y)],
        stroke,
        config.line_width,
    )
}

pub fn polyline(points: Vec<(f32, f32)>, stroke: &str, stroke_width: f32) -> Primitive {
    Primitive::Polyline(PolylinePrimitive {
        points,
        stroke: stroke.to_string(),
        stroke_width,
    })
}

pub fn segment(from: (f32, f32), to: (f32, f32), stroke: &str, stroke_width: f32) -> Primitive {
    polyline(vec![from, to], stroke, stroke_width)
}

/// Gradient fading in from `fade` to `color` across `[x_start, x_end]`.
pub fn fade_in(x_start: f32, x_end: f32, y: f32, height: f32, color: &str, fade: &str) -> LinearGradient {
    LinearGradient {
        x1: x_start,
        y1: y,
        x2: x_end,
        y2: y + height,
        stops: vec![
            GradientStop {
                offset: 0.0,
                color: fade.to_string(),
                opacity: 0.0,
            },
            GradientStop {
                offset: 1.0,
                color: color.to_string(),
                opacity: 1.0,
            },
        ],
    }
}

/// Gradient fading out from `color` to `fade` across `[x_start, x_end]`.
pub fn fade_out(x_start: f32, x_end: f32, y: f32, height: f32, color: &str, fade: &str) -> LinearGradient {
    LinearGradient {
        x1: x_start,
        y1: y,
        x2: x_end,
        y2: y + height,
        stops: vec![
            GradientStop {
                offset: 0.0,
                color: color.to_string(),
                opacity: 1.0,
            },
            GradientStop {
                offset: 1.0,
                color: fade.to_string(),
                opacity: 0.0,
            },
        ],
    }
}

/// Rough label width: a fixed fraction of the font size per character.
pub fn approx_text_width(text: &str, font_size: f32, char_width: f32) -> f32 {
    font_size * char_width * text.chars().count() as f32
}
