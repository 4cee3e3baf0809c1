use serde::{Deserialize, Serialize};
use tanksim_core::{IndexError, Simulator};
use uom::si::{
    f64::{Length, Time, VolumeRate},
    length::meter,
    volume_rate::cubic_meter_per_second,
};

use super::TankModel;

/// A read-only view of a tank simulation at one instant.
///
/// Quantities serialize in SI base units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TankSnapshot {
    pub time: Time,
    pub level: Length,
    pub setpoint: Length,
    pub inlet_flow: VolumeRate,
    pub outlet_flow: VolumeRate,
    pub valve_position: f64,
    /// Setpoint minus level.
    pub error: Length,
    /// The value applied at the controller's output.
    pub controller_output: f64,
}

impl TankSnapshot {
    /// Captures the current state of `sim`, as seen by `controller`.
    ///
    /// # Errors
    ///
    /// Returns an [`IndexError`] if `controller` is not a valid controller
    /// index.
    pub fn capture(sim: &Simulator<TankModel>, controller: usize) -> Result<Self, IndexError> {
        let state = sim.state();
        let inputs = sim.inputs();

        let level = Length::new::<meter>(state[TankModel::LEVEL]);
        let valve_position = inputs[TankModel::VALVE_POSITION];

        Ok(Self {
            time: sim.time(),
            level,
            setpoint: Length::new::<meter>(sim.setpoint(controller)?),
            inlet_flow: VolumeRate::new::<cubic_meter_per_second>(inputs[TankModel::INLET_FLOW]),
            outlet_flow: sim.model().outlet_flow(level, valve_position),
            valve_position,
            error: Length::new::<meter>(sim.error(controller)?),
            controller_output: sim.controller_output(controller)?,
        })
    }
}
