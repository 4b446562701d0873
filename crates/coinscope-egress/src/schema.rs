//! Analysis instruction and response schema
//!
//! The schema is the authoritative contract the model must satisfy: an
//! array of coin-analysis objects. Anything the model returns that cannot
//! be parsed against it is rejected by the normalizer in `gemini`.

use serde_json::{Value, json};

/// Natural-language instruction sent alongside every image.
pub const ANALYSIS_INSTRUCTION: &str = "\
Thoroughly analyze the provided image of coin(s). For each coin visible:
1.  Identify its specific type (e.g., 'Washington Quarter'), year, and mint mark ('P', 'D', 'S', 'W', or 'None').
2.  Estimate its condition or grade (e.g., 'Good', 'Fine', 'Uncirculated', 'Proof').
3.  Provide a brief, one-paragraph description of the coin, its history, and key identifying features.
4.  Assign an overall confidence score (from 0.0 to 1.0) for the identification. This score should reflect how clearly the coin's features (date, mint mark, design details) are visible in the image. 1.0 is absolute certainty.
5.  Perform a comprehensive web search to research its current market value. Cross-reference data from multiple sources to improve accuracy. Provide value estimates from at least three distinct sources, prioritizing major auction sites (eBay, Heritage Auctions, GreatCollections), reputable coin dealers (APMEX, JM Bullion), and official price guides (PCGS, NGC). For each source:
    - Provide a direct search URL for similar coins.
    - Provide the estimated value or a realistic price range.
    - Provide a value confidence score (from 0.0 to 1.0). This score should be based on the volume of recent, comparable sales data found and the consistency of the prices across those sales. A high score means many consistent listings were found.
6.  Provide a historical price trend with estimated average market values for each of the past 12 months.
Structure the entire response as an array of objects according to the provided JSON schema. If no coins are found, return an empty array.";

/// Schema for one identified coin.
fn single_coin_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "coinType": {
                "type": "STRING",
                "description": "The specific type of the coin (e.g., 'Washington Quarter', 'Standing Liberty Quarter')."
            },
            "year": {
                "type": "INTEGER",
                "description": "The year the coin was minted."
            },
            "mintMark": {
                "type": "STRING",
                "description": "The mint mark of the coin (e.g., 'P', 'D', 'S', 'W', or 'None')."
            },
            "condition": {
                "type": "STRING",
                "description": "An estimated condition or grade of the coin (e.g., 'Good', 'Fine', 'Uncirculated', 'Proof')."
            },
            "description": {
                "type": "STRING",
                "description": "A brief, one-paragraph description of the coin, its history, and key identifying features."
            },
            "confidenceScore": {
                "type": "NUMBER",
                "description": "A confidence score from 0.0 to 1.0 representing the AI's certainty in the overall identification (type, year, mint mark, condition). 1.0 is highest confidence."
            },
            "marketValues": {
                "type": "ARRAY",
                "description": "A list of estimated market values from popular online marketplaces.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "marketplace": {
                            "type": "STRING",
                            "description": "The name of the marketplace (e.g., 'eBay', 'Heritage Auctions', 'APMEX')."
                        },
                        "url": {
                            "type": "STRING",
                            "description": "A direct search link to the marketplace for similar coins."
                        },
                        "value": {
                            "type": "STRING",
                            "description": "The estimated value or price range on that marketplace (e.g., '$5 - $10', 'Approx. $25')."
                        },
                        "valueConfidence": {
                            "type": "NUMBER",
                            "description": "A confidence score from 0.0 to 1.0 for the estimated value, based on the availability and consistency of pricing data from that source."
                        }
                    },
                    "required": ["marketplace", "url", "value", "valueConfidence"]
                }
            },
            "historicalValues": {
                "type": "ARRAY",
                "description": "An array of estimated monthly average market values for the past 12 months.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "date": {
                            "type": "STRING",
                            "description": "The month and year of the value point, formatted as 'YYYY-MM'."
                        },
                        "value": {
                            "type": "NUMBER",
                            "description": "The average estimated market value in USD for that month."
                        }
                    },
                    "required": ["date", "value"]
                }
            }
        },
        "required": [
            "coinType",
            "year",
            "mintMark",
            "condition",
            "description",
            "marketValues",
            "historicalValues",
            "confidenceScore"
        ]
    })
}

/// Full response schema: an array of identified coins.
pub fn response_schema() -> Value {
    json!({
        "type": "ARRAY",
        "description": "An array of all coins identified in the image.",
        "items": single_coin_schema()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_schema_is_array_of_coins() {
        let schema = response_schema();
        assert_eq!(schema["type"], "ARRAY");
        assert_eq!(schema["items"]["type"], "OBJECT");
    }

    #[test]
    fn test_coin_schema_requires_all_fields() {
        let schema = response_schema();
        let required = schema["items"]["required"].as_array().unwrap();
        for field in [
            "coinType",
            "year",
            "mintMark",
            "condition",
            "description",
            "marketValues",
            "historicalValues",
            "confidenceScore",
        ] {
            assert!(
                required.iter().any(|v| v == field),
                "missing required field {}",
                field
            );
        }
    }

    #[test]
    fn test_market_value_schema_requires_confidence() {
        let schema = response_schema();
        let required = schema["items"]["properties"]["marketValues"]["items"]["required"]
            .as_array()
            .unwrap();
        assert!(required.iter().any(|v| v == "valueConfidence"));
    }

    #[test]
    fn test_historical_point_schema_fields() {
        let schema = response_schema();
        let items = &schema["items"]["properties"]["historicalValues"]["items"];
        assert_eq!(items["properties"]["date"]["type"], "STRING");
        assert_eq!(items["properties"]["value"]["type"], "NUMBER");
    }

    #[test]
    fn test_instruction_requests_empty_array_when_no_coins() {
        assert!(ANALYSIS_INSTRUCTION.contains("return an empty array"));
    }
}
