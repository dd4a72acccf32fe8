//! # drover-engine
//!
//! Best-effort adapter to the third-party pathfinding/building engine the
//! bridge drives. The engine is an optional capability, not a dependency:
//! binding to it may fail, individual capability queries may fail, and in
//! both cases the rest of the bridge keeps running with every query
//! reporting "inactive".

pub mod facade;

pub use facade::{EngineBinder, EngineFacade, EngineProbe};
