//! Coin analysis record types
//!
//! These shapes are the wire contract with the vision model and the
//! persisted history contract, so they serialize with camelCase keys.

use serde::{Deserialize, Serialize};

/// One identified coin: attributes and valuation as returned by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinAnalysis {
    /// Specific type of the coin (e.g. "Washington Quarter")
    pub coin_type: String,

    /// Year the coin was minted
    pub year: i32,

    /// Mint mark ("P", "D", "S", "W", or "None")
    pub mint_mark: String,

    /// Estimated condition or grade (e.g. "Good", "Fine", "Uncirculated", "Proof")
    pub condition: String,

    /// One-paragraph description of the coin and its identifying features
    pub description: String,

    /// Estimated values from online marketplaces
    pub market_values: Vec<MarketplaceValue>,

    /// Estimated average market value for each of the past 12 months
    pub historical_values: Vec<HistoricalPoint>,

    /// Overall identification certainty in [0.0, 1.0]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
}

/// A value estimate from one marketplace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketplaceValue {
    /// Marketplace name (e.g. "eBay", "Heritage Auctions", "APMEX")
    pub marketplace: String,

    /// Direct search link for similar coins
    pub url: String,

    /// Human-readable estimate, possibly a range (e.g. "$5 - $10", "Approx. $25")
    pub value: String,

    /// Confidence in the estimate in [0.0, 1.0], based on pricing data consistency
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_confidence: Option<f64>,
}

/// One month of estimated market value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    /// Month of the value point, formatted "YYYY-MM"
    #[serde(rename = "date")]
    pub month: String,

    /// Average estimated market value in USD for that month, non-negative
    pub value: f64,
}
