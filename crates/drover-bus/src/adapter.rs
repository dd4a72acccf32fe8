use async_trait::async_trait;
use tokio::sync::mpsc;

/// One message seen on the bus.
#[derive(Debug, Clone)]
pub struct BusMessage {
    pub topic: String,
    pub payload: String,
}

/// Trait implemented by each bus transport (in-process broker, MQTT, …).
///
/// The runtime only ever consumes the receiver returned by `start` and
/// publishes JSON payloads; connection management, reconnects, and
/// last-will semantics stay inside the implementation.
#[async_trait]
pub trait BusConnector: Send + Sync {
    /// Unique identifier for this connector instance.
    fn id(&self) -> &str;

    /// Start the connector. Returns a receiver for inbound messages on the
    /// topics this connector subscribes to.
    async fn start(&mut self) -> drover_core::Result<mpsc::Receiver<BusMessage>>;

    /// Publish a message through this connector.
    async fn publish(&self, topic: &str, payload: serde_json::Value) -> drover_core::Result<()>;

    /// Stop the connector gracefully.
    async fn stop(&mut self) -> drover_core::Result<()>;

    /// Whether the connector is currently connected.
    fn is_connected(&self) -> bool;
}
