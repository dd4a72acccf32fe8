//! # drover-core
//!
//! Core types, traits, and primitives for the Drover bridge runtime.
//! This crate defines the shared vocabulary used by every other crate in the
//! workspace: the command vocabulary the bridge understands, world position
//! primitives, outbound event envelopes, and the collaborator traits behind
//! which the live environment and the pub/sub transport sit.

pub mod command;
pub mod error;
pub mod event;
pub mod link;
pub mod position;

pub use command::{COMMAND_PREFIX, MAX_COMMAND_LEN, StepKind, is_cancel, parse_goto_target, parse_wait_ms};
pub use error::{DroverError, Result};
pub use event::EventEnvelope;
pub use link::{BusPublisher, CommandOrigin, WorldLink};
pub use position::{BlockPos, Position};
