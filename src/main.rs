use perpboard::PerpboardError;
use perpboard::StreamManager;
use perpboard::config::fetch_config;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), PerpboardError> {
    // Initialize tracing subscriber for logging output.
    tracing_subscriber::fmt::init();

    let app_config = fetch_config()?;

    let url = &app_config.feed.websocket_url;
    let mint = app_config
        .feed
        .mint
        .as_deref()
        .ok_or_else(|| PerpboardError::Config("PERPBOARD_MINT is not set".to_string()))?;

    let mut manager = StreamManager::new();
    if let Some(policy) = app_config.feed.reconnect {
        manager = manager.with_reconnect(policy);
    }

    let _subscription = manager.subscribe(|snapshot| {
        let best_bid = snapshot.depth.bids.first().map(|l| l.price);
        let best_ask = snapshot.depth.asks.first().map(|l| l.price);
        match snapshot.updated_candle {
            Some(candle) => info!(
                state = %snapshot.connection_state,
                last_price = snapshot.last_price,
                trades = snapshot.tape.len(),
                candles = snapshot.candles.len(),
                time = candle.time,
                open = candle.open,
                high = candle.high,
                low = candle.low,
                close = candle.close,
                best_bid,
                best_ask,
                "Board update"
            ),
            None => info!(
                state = %snapshot.connection_state,
                connected = snapshot.is_connected(),
                trades = snapshot.tape.len(),
                "Board status"
            ),
        }
    });

    manager.start(url, mint).await?;

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {e}");
    }

    manager.stop().await;
    info!(
        last_price = manager.last_price(),
        candles = manager.candles().len(),
        "Shut down"
    );

    Ok(())
}
