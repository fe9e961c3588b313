//! Incoming message decoding.
//!
//! Turns one raw text frame from the feed into a [`Trade`]. A frame is
//! rejected with a [`DecodeError`] only if it is not JSON, is not a
//! `tokenTrade` event, has no payload, or has no usable price; the caller
//! drops it and keeps reading. Every other payload field is read
//! leniently.

use serde::Deserialize;
use serde_json::Value;

use crate::models::trade::{Side, TokenTradeData, TokenTradeMessage, Trade};
use crate::models::{Channel, FeedNotice};

/// Why a frame could not be turned into a trade.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The frame is not a JSON object.
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The frame is JSON but not a `tokenTrade` event (acknowledgements,
    /// other channels).
    #[error("not a trade event (channel: {channel:?})")]
    NotTradeEvent { channel: Option<String> },

    /// A `tokenTrade` frame without a `data` object.
    #[error("trade event has no payload")]
    MissingPayload,

    /// The price is missing, not numeric, or not strictly positive.
    #[error("invalid price: {0}")]
    InvalidPrice(String),

    /// The payload itself has the wrong shape.
    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl DecodeError {
    /// Returns `true` for frames that are expected on the wire but carry
    /// no trade, as opposed to damaged trade frames.
    pub fn is_ignorable(&self) -> bool {
        matches!(self, DecodeError::NotTradeEvent { .. })
    }
}

/// Decodes a frame, stamping trades without `ts` with the current time.
///
/// # Errors
///
/// See [`decode_frame_at`].
pub fn decode_frame(text: &str) -> Result<Trade, DecodeError> {
    decode_frame_at(text, chrono::Utc::now().timestamp_millis())
}

/// Decodes a frame, stamping trades without `ts` with `now_ms`.
///
/// # Errors
///
/// Returns a [`DecodeError`] if the frame is not a JSON object, is not on
/// the `tokenTrade` channel, has a null, missing or non-object `data`, or
/// carries no finite, strictly positive price.
pub fn decode_frame_at(text: &str, now_ms: i64) -> Result<Trade, DecodeError> {
    let message: TokenTradeMessage = serde_json::from_str(text)?;

    if message.channel.as_deref() != Some(Channel::TokenTrade.as_str()) {
        return Err(DecodeError::NotTradeEvent {
            channel: message.channel,
        });
    }

    let data = match message.data {
        None | Some(Value::Null) => return Err(DecodeError::MissingPayload),
        Some(data @ Value::Object(_)) => data,
        Some(data) => {
            return Err(DecodeError::InvalidField {
                field: "data",
                reason: format!("expected an object, got {data}"),
            });
        }
    };

    let data = TokenTradeData::deserialize(data).map_err(|e| DecodeError::InvalidField {
        field: "data",
        reason: e.to_string(),
    })?;
    normalize(data, now_ms)
}

/// Extracts the feed's plain-text notice (e.g. subscription
/// acknowledgements) from a frame, if it is one.
pub fn feed_notice(text: &str) -> Option<FeedNotice> {
    serde_json::from_str(text).ok()
}

/// Builds a trade from the raw payload.
///
/// `ts` that is absent, zero or not numeric becomes `now_ms`. `size` that
/// is absent, negative or not numeric becomes `0`. An unknown `side` is
/// kept as [`Side::Unknown`] and an absent `tx` as the empty string.
fn normalize(data: TokenTradeData, now_ms: i64) -> Result<Trade, DecodeError> {
    let price = match &data.price {
        None => return Err(DecodeError::InvalidPrice("missing".to_string())),
        Some(raw) => raw
            .to_f64()
            .filter(|p| *p > 0.0)
            .ok_or_else(|| DecodeError::InvalidPrice(format!("{raw:?}")))?,
    };

    let size = data
        .size
        .as_ref()
        .and_then(|raw| raw.to_f64())
        .filter(|s| *s >= 0.0)
        .unwrap_or(0.0);

    let timestamp = data
        .ts
        .as_ref()
        .and_then(|raw| raw.to_f64())
        .filter(|ts| *ts != 0.0)
        .map_or(now_ms, |ts| ts as i64);

    Ok(Trade::new(
        timestamp,
        price,
        size,
        Side::from_wire(data.side.as_deref()),
        data.tx.unwrap_or_default(),
    ))
}
