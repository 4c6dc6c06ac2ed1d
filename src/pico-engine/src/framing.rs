//! Framing of text across the engine boundary.
//!
//! Requests are always sent as base64 of their UTF-8 bytes. Responses come
//! back either base64-encoded again ([`ResponseEncoding::Base64`], used by
//! the conversion calls of the libXray build) or as plain text
//! ([`ResponseEncoding::Plain`], used by its geo-data call). Which one a call
//! uses is a property of the engine build, so it is configurable.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use crate::error::BoundaryError;

/// How an engine response is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseEncoding {
    /// Base64 of UTF-8 text.
    Base64,
    /// UTF-8 text as-is.
    Plain,
}

impl std::fmt::Display for ResponseEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseEncoding::Base64 => write!(f, "base64"),
            ResponseEncoding::Plain => write!(f, "plain"),
        }
    }
}

impl std::str::FromStr for ResponseEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "base64" => Ok(ResponseEncoding::Base64),
            "plain" | "raw" | "text" => Ok(ResponseEncoding::Plain),
            _ => Err(format!("Unknown response encoding: {}", s)),
        }
    }
}

/// Encode request bytes for an engine call.
pub fn encode_request(bytes: impl AsRef<[u8]>) -> String {
    BASE64.encode(bytes)
}

/// Turn a raw engine response into text.
///
/// A null or empty response is [`BoundaryError::NoResponse`]; an empty
/// payload after base64 decoding is valid and yields `""`.
pub fn decode_response(
    response: Option<String>,
    encoding: ResponseEncoding,
) -> Result<String, BoundaryError> {
    let raw = response
        .filter(|r| !r.is_empty())
        .ok_or(BoundaryError::NoResponse)?;

    match encoding {
        ResponseEncoding::Plain => Ok(raw),
        ResponseEncoding::Base64 => {
            let bytes = BASE64.decode(raw.trim())?;
            Ok(String::from_utf8(bytes)?)
        }
    }
}

/// The `{success, error}` envelope some engine builds wrap their results in.
#[derive(Debug, Deserialize)]
struct CallEnvelope {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Look for an explicit rejection in a run/stop status.
///
/// Returns the engine's message when the status is a call envelope (plain
/// JSON or base64 JSON) with `success: false`. Anything else, including a
/// bare status code or no status at all, is not a rejection.
pub fn rejection_message(status: Option<&str>) -> Option<String> {
    let status = status?.trim();
    if status.is_empty() {
        return None;
    }

    let envelope = serde_json::from_str::<CallEnvelope>(status).ok().or_else(|| {
        let bytes = BASE64.decode(status).ok()?;
        serde_json::from_slice::<CallEnvelope>(&bytes).ok()
    })?;

    if envelope.success {
        None
    } else {
        Some(
            envelope
                .error
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| "no reason given".to_string()),
        )
    }
}
