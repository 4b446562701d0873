//! Trend chart geometry
//!
//! Maps an ordered list of (month, value) points onto SVG coordinates.
//! Producer order is not trusted: points are sorted by month before any
//! computation. Points are spaced evenly by index; a missing month is not
//! detected or corrected.

use chrono::NaiveDate;
use coinscope_core::coin::HistoricalPoint;

pub const SVG_WIDTH: f64 = 500.0;
pub const SVG_HEIGHT: f64 = 250.0;

/// Plot-area padding inside the SVG frame
#[derive(Debug, Clone, Copy)]
pub struct Padding {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

pub const PADDING: Padding = Padding {
    top: 20.0,
    right: 30.0,
    bottom: 40.0,
    left: 50.0,
};

const CHART_WIDTH: f64 = SVG_WIDTH - PADDING.left - PADDING.right;
const CHART_HEIGHT: f64 = SVG_HEIGHT - PADDING.top - PADDING.bottom;

/// Number of evenly spaced value-axis labels
const VALUE_LABEL_COUNT: usize = 5;

/// A chart, or the explanation of why there isn't one
#[derive(Debug, Clone)]
pub enum PriceChart {
    /// Fewer than 2 points: nothing to draw but a placeholder
    InsufficientData,
    Trend(TrendChart),
}

impl PriceChart {
    /// Build a chart from producer-ordered points.
    pub fn build(points: &[HistoricalPoint]) -> Self {
        let mut sorted = points.to_vec();
        // "YYYY-MM" strings order chronologically
        sorted.sort_by(|a, b| a.month.cmp(&b.month));

        if sorted.len() < 2 {
            return PriceChart::InsufficientData;
        }

        let observed_min = sorted.iter().map(|p| p.value).fold(f64::INFINITY, f64::min);
        let observed_max = sorted
            .iter()
            .map(|p| p.value)
            .fold(f64::NEG_INFINITY, f64::max);

        // Pad the value axis so the line stays off the frame edges. A flat
        // series (range 0) gets a default band instead of a zero-height
        // plot; values are currency, so the floor never goes below zero.
        let range = observed_max - observed_min;
        let band = if range == 0.0 {
            (observed_max.abs() * 0.1).max(1.0)
        } else {
            range * 0.1
        };

        PriceChart::Trend(TrendChart {
            points: sorted,
            min: (observed_min - band).max(0.0),
            max: observed_max + band,
        })
    }
}

/// Geometry for a drawable trend: at least 2 month-sorted points and
/// value-axis bounds with `min < max`.
#[derive(Debug, Clone)]
pub struct TrendChart {
    points: Vec<HistoricalPoint>,
    min: f64,
    max: f64,
}

/// A value-axis label and its vertical position
#[derive(Debug, Clone, PartialEq)]
pub struct ValueLabel {
    pub value: f64,
    pub y: f64,
}

/// A date-axis label and its horizontal position
#[derive(Debug, Clone, PartialEq)]
pub struct DateLabel {
    /// Raw "YYYY-MM" month
    pub month: String,
    /// Short display form, e.g. "Jan 24"
    pub label: String,
    pub x: f64,
}

/// The point under the pointer, in SVG coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct HoverPoint {
    pub x: f64,
    pub y: f64,
    pub month: String,
    pub value: f64,
}

impl TrendChart {
    /// Month-sorted points backing the chart
    pub fn points(&self) -> &[HistoricalPoint] {
        &self.points
    }

    /// Value-axis bounds (padded, floored at zero)
    pub fn bounds(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    /// Horizontal position of point `index`, evenly spaced across the plot
    pub fn x_at(&self, index: usize) -> f64 {
        PADDING.left + (index as f64 / (self.points.len() - 1) as f64) * CHART_WIDTH
    }

    /// Vertical position of `value` between the axis bounds
    pub fn y_at(&self, value: f64) -> f64 {
        PADDING.top + CHART_HEIGHT - ((value - self.min) / (self.max - self.min)) * CHART_HEIGHT
    }

    /// SVG path for the value line
    pub fn line_path(&self) -> String {
        self.points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                format!(
                    "{} {:.2} {:.2}",
                    if i == 0 { "M" } else { "L" },
                    self.x_at(i),
                    self.y_at(p.value)
                )
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// SVG path for the filled area beneath the line
    pub fn area_path(&self) -> String {
        format!(
            "{} V {:.2} H {:.2} Z",
            self.line_path(),
            PADDING.top + CHART_HEIGHT,
            PADDING.left
        )
    }

    /// Evenly spaced value-axis labels, bottom to top
    pub fn value_labels(&self) -> Vec<ValueLabel> {
        let step = (self.max - self.min) / (VALUE_LABEL_COUNT - 1) as f64;
        (0..VALUE_LABEL_COUNT)
            .map(|i| {
                let value = self.min + step * i as f64;
                ValueLabel {
                    value,
                    y: self.y_at(value),
                }
            })
            .collect()
    }

    /// Date-axis labels for the first, middle, and last points
    pub fn date_labels(&self) -> Vec<DateLabel> {
        let mut indices = vec![0, self.points.len() / 2, self.points.len() - 1];
        indices.dedup();

        indices
            .into_iter()
            .map(|i| {
                let point = &self.points[i];
                DateLabel {
                    month: point.month.clone(),
                    label: month_label(&point.month),
                    x: self.x_at(i),
                }
            })
            .collect()
    }

    /// Map a horizontal pixel coordinate back to the nearest point.
    ///
    /// Coordinates outside the plot area return `None`: no tooltip, no
    /// out-of-bounds index.
    pub fn hover(&self, x: f64) -> Option<HoverPoint> {
        if x < PADDING.left || x > PADDING.left + CHART_WIDTH {
            return None;
        }

        let ratio = (x - PADDING.left) / CHART_WIDTH;
        let index = (ratio * (self.points.len() - 1) as f64).round() as usize;
        let point = self.points.get(index)?;

        Some(HoverPoint {
            x: self.x_at(index),
            y: self.y_at(point.value),
            month: point.month.clone(),
            value: point.value,
        })
    }
}

/// Short axis form of a "YYYY-MM" month, e.g. "Jan 24". Falls back to the
/// raw string if the month does not parse.
pub fn month_label(month: &str) -> String {
    NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d")
        .map(|d| d.format("%b %y").to_string())
        .unwrap_or_else(|_| month.to_string())
}

/// Long tooltip form, e.g. "Jan 2024"
pub fn month_label_long(month: &str) -> String {
    NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d")
        .map(|d| d.format("%b %Y").to_string())
        .unwrap_or_else(|_| month.to_string())
}
