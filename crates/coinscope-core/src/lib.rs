//! Coinscope Core Types and Traits
//!
//! This crate provides the fundamental types and traits used throughout Coinscope:
//! - Coin analysis record types (the AI wire contract)
//! - Vision analyzer trait abstraction
//! - Core error types

pub mod coin;
pub mod error;
pub mod provider;

pub use coin::{CoinAnalysis, HistoricalPoint, MarketplaceValue};
pub use error::{Error, Result};
pub use provider::VisionAnalyzer;
