//! Token trade channel models.

use std::fmt;

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A feed frame as it arrives on the wire.
///
/// Only the envelope is typed here: `data` is kept as raw JSON so the
/// decoder can tell a missing payload from one that is not an object.
#[derive(Debug, Deserialize)]
pub struct TokenTradeMessage {
    #[serde(default, deserialize_with = "lenient")]
    pub channel: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Raw trade payload.
///
/// Every field is optional and a value of the wrong JSON type reads as
/// absent, so one odd field never costs the whole trade.
#[derive(Debug, Default, Deserialize)]
pub struct TokenTradeData {
    /// Trade time in milliseconds since the Unix epoch.
    #[serde(default, deserialize_with = "lenient")]
    pub ts: Option<NumberOrString>,
    #[serde(default, deserialize_with = "lenient")]
    pub price: Option<NumberOrString>,
    #[serde(default, deserialize_with = "lenient")]
    pub size: Option<NumberOrString>,
    /// Trade direction: `"buy"` or `"sell"`.
    #[serde(default, deserialize_with = "lenient")]
    pub side: Option<String>,
    /// Transaction signature.
    #[serde(default, deserialize_with = "lenient")]
    pub tx: Option<String>,
}

/// Reads a field as `T`, or as `None` if it is null or of another type.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

/// A numeric field the feed may send either as a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumberOrString {
    Number(f64),
    Text(String),
}

impl NumberOrString {
    /// Coerces the value to a finite `f64`, or `None` if it is not numeric.
    pub fn to_f64(&self) -> Option<f64> {
        let value = match self {
            NumberOrString::Number(n) => *n,
            NumberOrString::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

/// Taker side of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
    /// The feed sent no side, or one this crate does not know.
    Unknown,
}

impl Side {
    /// Parses `buy` or `sell`, ignoring ASCII case and surrounding blanks.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("buy") {
            Some(Side::Buy)
        } else if raw.eq_ignore_ascii_case("sell") {
            Some(Side::Sell)
        } else {
            None
        }
    }

    /// Reads a wire side leniently; anything unrecognized is
    /// [`Side::Unknown`].
    pub fn from_wire(raw: Option<&str>) -> Self {
        raw.and_then(Side::parse).unwrap_or(Side::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
            Side::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized trade. Immutable once built by the decoder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    #[serde(rename = "ts")]
    timestamp: i64,
    price: f64,
    size: f64,
    side: Side,
    #[serde(rename = "tx")]
    tx_id: String,
}

impl Trade {
    /// Builds a trade from already normalized parts.
    #[must_use]
    pub fn new(timestamp: i64, price: f64, size: f64, side: Side, tx_id: impl Into<String>) -> Self {
        Self {
            timestamp,
            price,
            size,
            side,
            tx_id: tx_id.into(),
        }
    }

    /// Trade time in milliseconds since the Unix epoch.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Trade time in whole seconds since the Unix epoch.
    pub fn timestamp_secs(&self) -> i64 {
        self.timestamp.div_euclid(1_000)
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn tx_id(&self) -> &str {
        &self.tx_id
    }
}
