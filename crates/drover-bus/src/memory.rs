use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};
use tracing::debug;

use drover_core::BusPublisher;

use crate::adapter::{BusConnector, BusMessage};

/// In-process broker backed by a broadcast channel. Every subscriber sees
/// every topic; filtering is the consumer's job, mirroring a wildcard
/// subscription on a real broker.
pub struct LocalBus {
    sender: broadcast::Sender<BusMessage>,
    connected: Arc<AtomicBool>,
}

impl LocalBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            connected: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Subscribe to the full message stream.
    pub fn subscribe(&self) -> broadcast::Receiver<BusMessage> {
        self.sender.subscribe()
    }

    /// Inject a raw message, as a remote peer would.
    pub fn send_raw(&self, topic: impl Into<String>, payload: impl Into<String>) {
        // Ignore send errors (no subscribers).
        let _ = self.sender.send(BusMessage {
            topic: topic.into(),
            payload: payload.into(),
        });
    }
}

impl Default for LocalBus {
    fn default() -> Self {
        Self::new(4096)
    }
}

impl BusPublisher for LocalBus {
    fn publish(&self, topic: &str, payload: serde_json::Value) {
        self.send_raw(topic, payload.to_string());
    }
}

#[async_trait]
impl BusConnector for LocalBus {
    fn id(&self) -> &str {
        "local"
    }

    async fn start(&mut self) -> drover_core::Result<mpsc::Receiver<BusMessage>> {
        let (tx, rx) = mpsc::channel(256);
        let mut source = self.sender.subscribe();
        self.connected.store(true, Ordering::SeqCst);
        let connected = self.connected.clone();
        tokio::spawn(async move {
            loop {
                match source.recv().await {
                    Ok(msg) => {
                        if tx.send(msg).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        debug!(dropped = n, "local bus subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            connected.store(false, Ordering::SeqCst);
        });
        Ok(rx)
    }

    async fn publish(&self, topic: &str, payload: serde_json::Value) -> drover_core::Result<()> {
        self.send_raw(topic, payload.to_string());
        Ok(())
    }

    async fn stop(&mut self) -> drover_core::Result<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
