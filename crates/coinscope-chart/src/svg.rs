//! SVG document emission

use crate::trend::{
    PADDING, PriceChart, SVG_HEIGHT, SVG_WIDTH, TrendChart, month_label_long,
};
use std::fmt::Write as _;

/// Placeholder shown when there are fewer than 2 points to draw.
pub const INSUFFICIENT_DATA_MESSAGE: &str = "Not enough historical data to display a trend.";

const LINE_COLOR: &str = "#6366f1";
const GRADIENT_COLOR: &str = "#4f46e5";
const AXIS_COLOR: &str = "#64748b";

/// Render a chart (or its placeholder) as a standalone SVG document.
pub fn render(chart: &PriceChart) -> String {
    match chart {
        PriceChart::InsufficientData => render_placeholder(),
        PriceChart::Trend(trend) => render_trend(trend),
    }
}

fn document_open() -> String {
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {SVG_WIDTH} {SVG_HEIGHT}\" \
         width=\"{SVG_WIDTH}\" height=\"{SVG_HEIGHT}\">\n"
    )
}

fn render_placeholder() -> String {
    let mut svg = document_open();
    let _ = write!(
        svg,
        "  <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" fill=\"{}\" font-size=\"14\">{}</text>\n",
        SVG_WIDTH / 2.0,
        SVG_HEIGHT / 2.0,
        AXIS_COLOR,
        INSUFFICIENT_DATA_MESSAGE
    );
    svg.push_str("</svg>\n");
    svg
}

fn render_trend(trend: &TrendChart) -> String {
    let mut svg = document_open();

    // Gradient for the area fill
    svg.push_str("  <defs>\n");
    let _ = write!(
        svg,
        "    <linearGradient id=\"areaGradient\" x1=\"0\" y1=\"0\" x2=\"0\" y2=\"1\">\n      \
         <stop offset=\"0%\" stop-color=\"{GRADIENT_COLOR}\" stop-opacity=\"0.4\"/>\n      \
         <stop offset=\"100%\" stop-color=\"{GRADIENT_COLOR}\" stop-opacity=\"0\"/>\n    \
         </linearGradient>\n"
    );
    svg.push_str("  </defs>\n");

    // Value-axis grid lines and labels
    for label in trend.value_labels() {
        let _ = write!(
            svg,
            "  <line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{}\" \
             stroke-width=\"0.5\" stroke-dasharray=\"2,2\"/>\n",
            PADDING.left,
            label.y,
            SVG_WIDTH - PADDING.right,
            label.y,
            AXIS_COLOR
        );
        let _ = write!(
            svg,
            "  <text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"end\" fill=\"{}\" font-size=\"10\">${:.2}</text>\n",
            PADDING.left - 8.0,
            label.y + 4.0,
            AXIS_COLOR,
            label.value
        );
    }

    // Date-axis labels
    for label in trend.date_labels() {
        let _ = write!(
            svg,
            "  <text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" fill=\"{}\" font-size=\"10\">{}</text>\n",
            label.x,
            SVG_HEIGHT - PADDING.bottom + 16.0,
            AXIS_COLOR,
            label.label
        );
    }

    // Area beneath the line, then the line itself
    let _ = write!(
        svg,
        "  <path d=\"{}\" fill=\"url(#areaGradient)\" stroke=\"none\"/>\n",
        trend.area_path()
    );
    let _ = write!(
        svg,
        "  <path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\" \
         stroke-linecap=\"round\" stroke-linejoin=\"round\"/>\n",
        trend.line_path(),
        LINE_COLOR
    );

    svg.push_str("</svg>\n");
    svg
}

/// Tooltip text for a hovered point, e.g. "Jan 2024: $12.50"
pub fn tooltip_text(month: &str, value: f64) -> String {
    format!("{}: ${:.2}", month_label_long(month), value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinscope_core::coin::HistoricalPoint;

    fn point(month: &str, value: f64) -> HistoricalPoint {
        HistoricalPoint {
            month: month.to_string(),
            value,
        }
    }

    #[test]
    fn test_render_placeholder_for_single_point() {
        let svg = render(&PriceChart::build(&[point("2023-01", 5.0)]));
        assert!(svg.contains(INSUFFICIENT_DATA_MESSAGE));
        assert!(!svg.contains("<path"));
    }

    #[test]
    fn test_render_trend_document() {
        let chart = PriceChart::build(&[
            point("2023-01", 1.0),
            point("2023-02", 2.0),
            point("2023-03", 3.0),
        ]);
        let svg = render(&chart);

        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<path").count(), 2); // area + line
        assert!(svg.contains("areaGradient"));
        assert!(svg.contains("Jan 23"));
        // 5 grid lines for 5 value labels
        assert_eq!(svg.matches("<line x1=").count(), 5);
    }

    #[test]
    fn test_render_flat_series_has_no_nan() {
        let chart = PriceChart::build(&[point("2023-01", 5.0), point("2023-02", 5.0)]);
        let svg = render(&chart);
        assert!(!svg.contains("NaN"));
        assert!(!svg.contains("inf"));
    }

    #[test]
    fn test_tooltip_text() {
        assert_eq!(tooltip_text("2024-01", 12.5), "Jan 2024: $12.50");
    }
}
