use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use super::backoff::ReconnectPolicy;
use crate::config::ConnectionConfig;

/// Connection lifecycle notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Socket opened (initial connect or successful reconnect).
    Open,
    /// Socket closed; a reconnect may follow.
    Closed,
    /// Reconnect budget exhausted or reconnect disabled; terminal.
    Failed,
}

/// Raw inbound frame, passed through uninterpreted. Classification is the
/// message router's job.
#[derive(Debug, Clone)]
pub enum WireFrame {
    Text(String),
    Binary(Vec<u8>),
}

/// Send-side handle to the single WebSocket.
///
/// This is the only way to reach the socket; it is constructed solely by
/// [`ConnectionManager::start`], which keeps every other component behind the
/// router's send primitives. Sends fail fast when the socket is not open;
/// nothing is queued, since stale audio has no value in a live session.
#[derive(Clone)]
pub struct ConnectionHandle {
    outbound: mpsc::UnboundedSender<Message>,
    open: Arc<AtomicBool>,
}

impl ConnectionHandle {
    /// A handle with no driver behind it; every send fails closed. Lets a
    /// router exist before any connection does.
    pub fn detached() -> Self {
        let (outbound, _discard) = mpsc::unbounded_channel();
        Self {
            outbound,
            open: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    pub fn send_text(&self, text: String) -> bool {
        if !self.is_open() {
            warn!("dropping outbound text frame: connection not open");
            return false;
        }
        self.outbound.send(Message::Text(text)).is_ok()
    }

    pub fn send_binary(&self, bytes: Vec<u8>) -> bool {
        if !self.is_open() {
            warn!("dropping outbound binary frame: connection not open");
            return false;
        }
        self.outbound.send(Message::Binary(bytes)).is_ok()
    }
}

/// Owns the WebSocket lifecycle: dial, read/write pumping, and bounded
/// auto-reconnect with a fixed delay.
pub struct ConnectionManager {
    config: ConnectionConfig,
}

impl ConnectionManager {
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    /// Spawn the connection driver. Returns the sealed send handle, the raw
    /// inbound frame stream, and the lifecycle event stream.
    pub fn start(
        self,
    ) -> (
        ConnectionHandle,
        mpsc::UnboundedReceiver<WireFrame>,
        mpsc::UnboundedReceiver<ConnectionEvent>,
    ) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (frame_tx, frame_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let open = Arc::new(AtomicBool::new(false));

        let handle = ConnectionHandle {
            outbound: outbound_tx,
            open: Arc::clone(&open),
        };

        tokio::spawn(drive_connection(
            self.config,
            open,
            outbound_rx,
            frame_tx,
            event_tx,
        ));

        (handle, frame_rx, event_rx)
    }
}

async fn drive_connection(
    config: ConnectionConfig,
    open: Arc<AtomicBool>,
    mut outbound_rx: mpsc::UnboundedReceiver<Message>,
    frame_tx: mpsc::UnboundedSender<WireFrame>,
    event_tx: mpsc::UnboundedSender<ConnectionEvent>,
) {
    let mut policy = ReconnectPolicy::new(
        config.max_reconnect_attempts,
        Duration::from_millis(config.reconnect_delay_ms),
    );

    loop {
        match connect_async(&config.url).await {
            Ok((ws, _response)) => {
                info!("websocket connected: {}", config.url);
                policy.reset();
                open.store(true, Ordering::SeqCst);
                let _ = event_tx.send(ConnectionEvent::Open);

                let (mut sink, mut stream) = ws.split();

                loop {
                    tokio::select! {
                        outbound = outbound_rx.recv() => {
                            match outbound {
                                Some(msg) => {
                                    if let Err(e) = sink.send(msg).await {
                                        warn!("websocket send failed: {}", e);
                                        break;
                                    }
                                }
                                // All handles dropped: shut the driver down.
                                None => {
                                    open.store(false, Ordering::SeqCst);
                                    let _ = sink.close().await;
                                    let _ = event_tx.send(ConnectionEvent::Closed);
                                    return;
                                }
                            }
                        }
                        inbound = stream.next() => {
                            match inbound {
                                Some(Ok(Message::Text(text))) => {
                                    let _ = frame_tx.send(WireFrame::Text(text));
                                }
                                Some(Ok(Message::Binary(bytes))) => {
                                    let _ = frame_tx.send(WireFrame::Binary(bytes));
                                }
                                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {
                                    debug!("ignoring websocket control frame");
                                }
                                Some(Ok(Message::Close(_))) | None => {
                                    info!("websocket closed by peer");
                                    break;
                                }
                                Some(Err(e)) => {
                                    warn!("websocket read error: {}", e);
                                    break;
                                }
                            }
                        }
                    }
                }

                open.store(false, Ordering::SeqCst);
                let _ = event_tx.send(ConnectionEvent::Closed);
            }
            Err(e) => {
                warn!("failed to connect to {}: {}", config.url, e);
            }
        }

        if !config.auto_reconnect {
            let _ = event_tx.send(ConnectionEvent::Failed);
            return;
        }

        match policy.next_delay() {
            Some(delay) => {
                info!(
                    "reconnecting in {}ms (attempt {} of {})",
                    delay.as_millis(),
                    policy.attempts(),
                    config.max_reconnect_attempts
                );
                tokio::time::sleep(delay).await;
            }
            None => {
                error!(
                    "max reconnection attempts ({}) reached, giving up",
                    config.max_reconnect_attempts
                );
                let _ = event_tx.send(ConnectionEvent::Failed);
                return;
            }
        }
    }
}
