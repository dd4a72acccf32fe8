//! # drover-bus
//!
//! The pub/sub boundary of the bridge. The transport itself (MQTT and
//! friends, with their reconnect and last-will handling) is deliberately out
//! of scope here; concrete transports implement [`BusConnector`] and hand
//! the runtime a stream of inbound messages.
//!
//! [`LocalBus`] is the in-process broker used by the harness binary and the
//! test suites.

pub mod adapter;
pub mod memory;

pub use adapter::{BusConnector, BusMessage};
pub use memory::LocalBus;
