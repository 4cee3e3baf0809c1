//! Fixed-step process simulation under closed-loop PID control.
//!
//! `tanksim-core` provides the three numerically significant pieces of a
//! process simulator:
//!
//! - [`Rk4`], a classic fourth-order Runge-Kutta step over any [`Derivative`],
//! - [`PidController`], a discrete PID law with output clamping and
//!   anti-windup,
//! - [`Simulator`], which binds a [`ProcessModel`] to a set of control loops
//!   and advances both together one tick at a time.
//!
//! Concrete process models live outside this crate.
//! Any closure can act as a model through [`FnModel`].

pub mod integrator;
mod model;
mod pid;
pub mod simulator;
mod time_increment;

pub use integrator::Rk4;
pub use model::{Derivative, FnModel, ProcessModel, TryFn};
pub use pid::{Gains, PidController};
pub use simulator::{
    ConfigError, ControllerConfig, IndexError, IndexKind, Simulator, SimulatorConfig, StepError,
    Stepping,
};
pub use time_increment::{TimeIncrement, TimeIncrementError};
