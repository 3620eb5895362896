//! Hyperliquid websocket message structures

use crate::{AdapterError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::str::FromStr;

pub const ALL_MIDS_CHANNEL: &str = "allMids";

pub fn subscribe_all_mids() -> Value {
    json!({
        "method": "subscribe",
        "subscription": { "type": "allMids" }
    })
}

pub fn ping() -> Value {
    json!({ "method": "ping" })
}

/// Envelope of every server push: `{"channel": ..., "data": ...}`
#[derive(Debug, Deserialize)]
pub struct Envelope {
    pub channel: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Deserialize)]
pub struct AllMidsData {
    pub mids: HashMap<String, String>,
}

/// A decoded frame
#[derive(Debug)]
pub enum FeedMessage {
    /// Mid prices keyed by coin; entries that failed to parse are reported separately
    Mids {
        prices: Vec<(String, Decimal)>,
        rejected: Vec<AdapterError>,
    },
    SubscriptionAck,
    Pong,
    Other(String),
}

/// Decode one text frame
pub fn parse_frame(text: &str) -> Result<FeedMessage> {
    let envelope: Envelope = serde_json::from_str(text)?;

    match envelope.channel.as_str() {
        ALL_MIDS_CHANNEL => {
            let data: AllMidsData = serde_json::from_value(envelope.data)?;
            let mut prices = Vec::with_capacity(data.mids.len());
            let mut rejected = Vec::new();

            for (symbol, raw) in data.mids {
                match Decimal::from_str(raw.trim()) {
                    Ok(price) => prices.push((symbol, price)),
                    Err(_) => rejected.push(AdapterError::ParseError {
                        symbol,
                        value: raw,
                    }),
                }
            }

            Ok(FeedMessage::Mids { prices, rejected })
        }
        "subscriptionResponse" => Ok(FeedMessage::SubscriptionAck),
        "pong" => Ok(FeedMessage::Pong),
        other => Ok(FeedMessage::Other(other.to_string())),
    }
}
