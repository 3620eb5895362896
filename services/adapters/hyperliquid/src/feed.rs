//! WebSocket mids feed with automatic reconnection

use crate::messages::{self, FeedMessage};
use crate::router::{FeedMetrics, TickRouter};
use crate::{AdapterError, FeedConfig, Result};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval, timeout, Instant, MissedTickBehavior};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Connection states for the feed lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

/// How a session ended
#[derive(Debug)]
enum SessionEnd {
    Shutdown,
    Failed(AdapterError),
}

/// Hyperliquid `allMids` feed
pub struct MidsFeed {
    config: FeedConfig,
    router: TickRouter,
    metrics: Arc<FeedMetrics>,
    state: ConnectionState,
    backoff_attempt: u32,
}

impl MidsFeed {
    pub fn new(config: FeedConfig) -> Result<Self> {
        config.validate()?;
        let metrics = Arc::new(FeedMetrics::default());
        Ok(Self {
            config,
            router: TickRouter::new(metrics.clone()),
            metrics,
            state: ConnectionState::Disconnected,
            backoff_attempt: 0,
        })
    }

    /// Register a symbol; ticks for it arrive on the returned receiver
    pub fn subscribe(&mut self, symbol: &str) -> tokio::sync::mpsc::Receiver<types::Tick> {
        self.router.subscribe(symbol, self.config.channel_capacity)
    }

    pub fn metrics(&self) -> Arc<FeedMetrics> {
        self.metrics.clone()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Run until `shutdown` flips to true, reconnecting on any failure
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        if self.router.is_empty() {
            return Err(AdapterError::Configuration("no symbols subscribed".to_string()));
        }

        info!(
            symbols = ?self.router.symbols().collect::<Vec<_>>(),
            url = %self.config.websocket_url,
            "Starting Hyperliquid mids feed"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            match self.session(&mut shutdown).await {
                SessionEnd::Shutdown => break,
                SessionEnd::Failed(e) => {
                    self.state = ConnectionState::Reconnecting;
                    self.metrics.reconnects.fetch_add(1, Ordering::Relaxed);

                    let backoff = self.config.reconnect_backoff(self.backoff_attempt);
                    self.backoff_attempt = (self.backoff_attempt + 1).min(6);
                    warn!(
                        error = %e,
                        "Feed disconnected, reconnecting in {}ms",
                        backoff.as_millis()
                    );

                    tokio::select! {
                        _ = tokio::time::sleep(backoff) => {}
                        changed = shutdown.changed() => {
                            if changed.is_err() {
                                break;
                            }
                        }
                    }
                }
            }
        }

        self.state = ConnectionState::Disconnected;
        let stats = self.metrics.snapshot();
        info!(
            frames = stats.frames_received,
            ticks = stats.ticks_routed,
            dropped = stats.ticks_dropped,
            parse_errors = stats.parse_errors,
            reconnects = stats.reconnects,
            "Hyperliquid feed stopped"
        );
        Ok(())
    }

    async fn connect(&mut self) -> Result<WsStream> {
        self.state = ConnectionState::Connecting;
        info!("Connecting to {}", self.config.websocket_url);

        match timeout(self.config.connect_timeout(), connect_async(&self.config.websocket_url)).await {
            Ok(Ok((ws, response))) => {
                info!("Connected with response: {:?}", response.status());
                Ok(ws)
            }
            Ok(Err(e)) => {
                error!("WebSocket connection error: {}", e);
                Err(AdapterError::ConnectionFailed {
                    url: self.config.websocket_url.clone(),
                    reason: e.to_string(),
                })
            }
            Err(_) => Err(AdapterError::ConnectionTimeout {
                url: self.config.websocket_url.clone(),
                timeout_ms: self.config.connect_timeout_ms,
            }),
        }
    }

    /// One connect-subscribe-read cycle
    async fn session(&mut self, shutdown: &mut watch::Receiver<bool>) -> SessionEnd {
        let ws = match self.connect().await {
            Ok(ws) => ws,
            Err(e) => return SessionEnd::Failed(e),
        };
        let (mut sink, mut stream) = ws.split();

        let subscribe = messages::subscribe_all_mids().to_string();
        if let Err(e) = sink.send(Message::Text(subscribe)).await {
            return SessionEnd::Failed(e.into());
        }
        self.state = ConnectionState::Connected;

        let mut ping = interval(self.config.ping_interval());
        ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ping.tick().await;

        let mut last_message = Instant::now();

        loop {
            let idle_deadline = last_message + self.config.message_timeout();

            tokio::select! {
                _ = shutdown.changed() => {
                    let _ = sink.send(Message::Close(None)).await;
                    return SessionEnd::Shutdown;
                }
                _ = ping.tick() => {
                    if let Err(e) = sink.send(Message::Text(messages::ping().to_string())).await {
                        return SessionEnd::Failed(e.into());
                    }
                }
                _ = tokio::time::sleep_until(idle_deadline) => {
                    return SessionEnd::Failed(AdapterError::Stale {
                        idle_ms: self.config.message_timeout_ms,
                    });
                }
                frame = stream.next() => {
                    last_message = Instant::now();
                    match frame {
                        Some(Ok(Message::Text(text))) => self.handle_text(&text),
                        Some(Ok(Message::Ping(payload))) => {
                            if let Err(e) = sink.send(Message::Pong(payload)).await {
                                return SessionEnd::Failed(e.into());
                            }
                        }
                        Some(Ok(Message::Close(frame))) => {
                            debug!("Close frame received: {:?}", frame);
                            return SessionEnd::Failed(AdapterError::Closed);
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => return SessionEnd::Failed(e.into()),
                        None => return SessionEnd::Failed(AdapterError::Closed),
                    }
                }
            }
        }
    }

    fn handle_text(&mut self, text: &str) {
        self.metrics.frames_received.fetch_add(1, Ordering::Relaxed);

        match messages::parse_frame(text) {
            Ok(FeedMessage::Mids { prices, rejected }) => {
                // Healthy data flowing again
                self.backoff_attempt = 0;

                let received_at = Utc::now();
                for (symbol, price) in prices {
                    self.router.route(&symbol, price, received_at);
                }
                for err in rejected {
                    self.metrics.parse_errors.fetch_add(1, Ordering::Relaxed);
                    debug!("Dropping mid: {}", err);
                }
            }
            Ok(FeedMessage::SubscriptionAck) => info!("Subscribed to allMids"),
            Ok(FeedMessage::Pong) => debug!("pong"),
            Ok(FeedMessage::Other(channel)) => debug!(channel = %channel, "Ignoring frame"),
            Err(e) => {
                self.metrics.parse_errors.fetch_add(1, Ordering::Relaxed);
                warn!("Failed to parse frame: {}", e);
            }
        }
    }
}
