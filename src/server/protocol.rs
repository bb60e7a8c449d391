//! Inbound subscriber messages

use serde::Deserialize;
use thiserror::Error;

/// A request from the subscriber
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    StartCrawl { url: String, user_id: String },
}

/// Why an inbound message was rejected; the message is sent back verbatim
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Invalid JSON format")]
    InvalidJson,

    #[error("Unknown message type")]
    UnknownType,

    #[error("Missing required fields: url and userId")]
    MissingFields,
}

#[derive(Deserialize)]
struct RawMessage {
    #[serde(rename = "type")]
    kind: Option<String>,
    url: Option<String>,
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

/// Parses one text frame
pub fn parse_inbound(text: &str) -> Result<Inbound, ProtocolError> {
    let raw: RawMessage = serde_json::from_str(text).map_err(|_| ProtocolError::InvalidJson)?;

    match raw.kind.as_deref() {
        Some("start-crawl") => {
            let url = present(raw.url).ok_or(ProtocolError::MissingFields)?;
            let user_id = present(raw.user_id).ok_or(ProtocolError::MissingFields)?;
            Ok(Inbound::StartCrawl { url, user_id })
        }
        _ => Err(ProtocolError::UnknownType),
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
