//! Coinscope Chart Renderer
//!
//! Pure time-series chart construction for a coin's 12-month value trend:
//! - `trend`: geometry (paths, axis labels, pointer hover lookup)
//! - `svg`: standalone SVG document emission
//!
//! The renderer is stateless; given the same points it always produces the
//! same geometry.

pub mod svg;
pub mod trend;

pub use trend::{
    DateLabel, HoverPoint, PADDING, Padding, PriceChart, SVG_HEIGHT, SVG_WIDTH, TrendChart,
    ValueLabel,
};
