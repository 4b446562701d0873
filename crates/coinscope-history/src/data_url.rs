//! Data-URL encoding of image bytes
//!
//! Saved sessions must survive reload without any external file reference,
//! so the transient image handle is replaced by a `data:<mime>;base64,...`
//! string that carries the bytes themselves.

use crate::{HistoryError, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

/// Encode image bytes as a self-contained data URL.
pub fn encode(bytes: &[u8], mime_type: &str) -> String {
    format!("data:{};base64,{}", mime_type, BASE64.encode(bytes))
}

/// Decode a data URL back into (bytes, mime type).
pub fn decode(data_url: &str) -> Result<(Vec<u8>, String)> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or_else(|| HistoryError::InvalidDataUrl("missing data: prefix".to_string()))?;

    let (mime_type, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| HistoryError::InvalidDataUrl("missing base64 marker".to_string()))?;

    let bytes = BASE64.decode(payload)?;
    Ok((bytes, mime_type.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let bytes = b"\x89PNG\r\n\x1a\nfake image";
        let url = encode(bytes, "image/png");
        assert!(url.starts_with("data:image/png;base64,"));

        let (decoded, mime_type) = decode(&url).unwrap();
        assert_eq!(decoded, bytes);
        assert_eq!(mime_type, "image/png");
    }

    #[test]
    fn test_decode_rejects_non_data_url() {
        assert!(decode("https://example.com/coin.png").is_err());
    }

    #[test]
    fn test_decode_rejects_missing_marker() {
        assert!(decode("data:image/png,rawdata").is_err());
    }

    #[test]
    fn test_decode_rejects_bad_base64() {
        let result = decode("data:image/png;base64,!!!not-base64!!!");
        assert!(matches!(result, Err(HistoryError::Decode(_))));
    }
}
