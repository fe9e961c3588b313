//! Token trade subscription and unsubscription requests.

use futures_util::SinkExt;
use tracing::{debug, info};
use tungstenite::Message;

use super::WsWriter;
use crate::Result;
use crate::models::{Channel, SubscribeRequest, UnsubscribeRequest};

/// Subscribes to trades for the given token mints.
///
/// # Errors
///
/// Returns a [`PerpboardError`](crate::PerpboardError) if sending the subscription message fails.
pub async fn subscribe(write: &mut WsWriter, keys: &[String]) -> Result<()> {
    let request = SubscribeRequest::new(keys);
    let json = serde_json::to_string(&request)?;
    debug!("Sending subscribe request: {}", json);
    write.send(Message::Text(json.into())).await?;
    info!(
        channel = Channel::TokenTrade.as_str(),
        ?keys,
        "Subscribed to channel"
    );

    Ok(())
}

/// Unsubscribes from trades for the given token mints.
///
/// # Errors
///
/// Returns a [`PerpboardError`](crate::PerpboardError) if sending the unsubscribe message fails.
pub async fn unsubscribe(write: &mut WsWriter, keys: &[String]) -> Result<()> {
    let request = UnsubscribeRequest::new(keys);
    let json = serde_json::to_string(&request)?;
    debug!("Sending unsubscribe request: {}", json);
    write.send(Message::Text(json.into())).await?;
    info!(
        channel = Channel::TokenTrade.as_str(),
        ?keys,
        "Unsubscribed from channel"
    );

    Ok(())
}
