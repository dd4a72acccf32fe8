//! Collaborator traits at the bridge's two outer seams: the live environment
//! it drives and the pub/sub bus it reports on. Both are called from the
//! tick loop and must not block.

use crate::Result;
use crate::position::Position;

/// Where an outbound command line originated. Sends issued by the bridge are
/// tagged `Internal` so the command-echo observer does not re-arm the bridge
/// on its own output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOrigin {
    /// Typed or scripted by someone else through normal environment channels.
    External,
    /// Issued by the bridge itself.
    Internal,
}

/// The environment surface the bridge drives: observe the agent, push
/// command lines at it.
pub trait WorldLink: Send + Sync {
    /// Current agent position, if an agent session is live and observable.
    fn position(&self) -> Option<Position>;

    /// Whether an agent session exists and can receive commands.
    fn has_agent(&self) -> bool;

    /// Send one command line into the environment. Implementations must tag
    /// any echo of this line with [`CommandOrigin::Internal`].
    fn send_command(&self, cmd: &str) -> Result<()>;
}

/// Outbound publish surface of the pub/sub bus, callable from the tick loop.
pub trait BusPublisher: Send + Sync {
    /// Fire-and-forget publish of one JSON payload to a topic. Delivery
    /// failures are the transport's problem, never the tick loop's.
    fn publish(&self, topic: &str, payload: serde_json::Value);

    /// Best-effort flush of queued publishes, bounded by `timeout`. Returns
    /// false if messages may still be in flight. Used once, at shutdown.
    fn flush(&self, timeout: std::time::Duration) -> bool {
        let _ = timeout;
        true
    }
}
