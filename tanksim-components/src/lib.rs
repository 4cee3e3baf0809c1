//! Process models for `tanksim`.
//!
//! The [`tank`] module provides a liquid tank drained through a control
//! valve, the default level-control scenario, and a snapshot view for
//! reporting.

pub mod tank;

pub use tank::{
    TankModel, TankParameterError, TankParameters, TankSimConfig, TankSimError, TankSnapshot,
};
