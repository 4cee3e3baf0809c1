//! Shared models and fixtures for the cross-crate tests.

use std::convert::Infallible;

use tanksim_components::{TankModel, TankSimConfig};
use tanksim_core::{Derivative, ProcessModel, Simulator};
use uom::si::{
    f64::{Length, Velocity, VolumeRate},
    length::meter,
    velocity::meter_per_second,
    volume_rate::cubic_meter_per_second,
};

/// Builds the default tank scenario.
///
/// # Panics
///
/// Panics if the default scenario is invalid.
#[must_use]
pub fn default_tank() -> Simulator<TankModel> {
    TankSimConfig::default()
        .build()
        .expect("default scenario is valid")
}

/// Steps `sim` `ticks` times and returns the level after each tick.
///
/// # Panics
///
/// Panics if a step fails.
pub fn levels<M: ProcessModel>(sim: &mut Simulator<M>, ticks: usize) -> Vec<f64> {
    (0..ticks)
        .map(|_| {
            sim.step().expect("step succeeds");
            sim.state()[0]
        })
        .collect()
}

/// Two identical tanks in series: the first drains into the second.
///
/// State is `[upper level, lower level]`.
/// Inputs are `[inlet flow, upper valve, lower valve]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TankCascade {
    pub tank: TankModel,
}

impl Derivative for TankCascade {
    type Error = Infallible;

    fn derivative(
        &self,
        _time: f64,
        state: &[f64],
        input: &[f64],
        dxdt: &mut [f64],
    ) -> Result<(), Self::Error> {
        let upper = Length::new::<meter>(state[0]);
        let lower = Length::new::<meter>(state[1]);
        let inlet = VolumeRate::new::<cubic_meter_per_second>(input[0]);

        let transfer = self.tank.outlet_flow(upper, input[1]);
        let drain = self.tank.outlet_flow(lower, input[2]);

        let upper_rate: Velocity = (inlet - transfer) / self.tank.area();
        let lower_rate: Velocity = (transfer - drain) / self.tank.area();

        dxdt[0] = upper_rate.get::<meter_per_second>();
        dxdt[1] = lower_rate.get::<meter_per_second>();
        Ok(())
    }
}

impl ProcessModel for TankCascade {
    fn state_len(&self) -> usize {
        2
    }

    fn input_len(&self) -> usize {
        3
    }
}
