#[cfg(feature = "serde-derive")]
use serde::{Deserialize, Serialize};
use uom::si::f64::Time;

use crate::{Gains, PidController};

/// Configuration for one feedback loop in a [`Simulator`](crate::Simulator).
///
/// The loop measures `state[measured_index]`, compares it to its setpoint,
/// and writes the controller output to `inputs[output_index]`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-derive", derive(Serialize, Deserialize))]
pub struct ControllerConfig {
    pub gains: Gains,
    /// Output at zero error.
    pub bias: f64,
    pub min_output: f64,
    pub max_output: f64,
    /// Bound on the magnitude of the integral accumulator.
    pub max_integral: f64,
    /// Index of the state entry this loop controls.
    pub measured_index: usize,
    /// Index of the input entry this loop drives.
    pub output_index: usize,
    pub initial_setpoint: f64,
}

impl ControllerConfig {
    /// Builds a fresh controller with an empty accumulator.
    pub(crate) fn controller(&self) -> PidController {
        PidController::new(
            self.gains,
            self.bias,
            self.min_output,
            self.max_output,
            self.max_integral,
        )
    }
}

/// Everything a [`Simulator`](crate::Simulator) needs besides its model.
///
/// The configuration is cloned into the simulator at construction, so
/// changing it afterwards does not affect a running simulation.
/// An empty `controllers` list runs the model open loop.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-derive", derive(Serialize, Deserialize))]
pub struct SimulatorConfig {
    pub initial_state: Vec<f64>,
    pub initial_inputs: Vec<f64>,
    /// Fixed timestep, serialized in seconds.
    pub dt: Time,
    #[cfg_attr(feature = "serde-derive", serde(default))]
    pub controllers: Vec<ControllerConfig>,
}
