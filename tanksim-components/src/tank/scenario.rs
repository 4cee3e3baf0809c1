use serde::{Deserialize, Serialize};
use tanksim_core::{ConfigError, ControllerConfig, Gains, Simulator, SimulatorConfig};
use thiserror::Error;
use tracing::debug;
use uom::si::{f64::Time, time::second};

use super::{
    NOMINAL_INLET_FLOW, NOMINAL_LEVEL, NOMINAL_VALVE_POSITION, TankModel, TankParameterError,
    TankParameters,
};

/// A complete tank simulation setup: physical parameters plus the simulator
/// configuration that drives them.
///
/// The [`Default`] scenario starts the tank at steady state at its nominal
/// level, with one reverse-acting level controller that throttles the outlet
/// valve:
///
/// | Setting          | Value                                  |
/// |------------------|----------------------------------------|
/// | Level            | 2.5 m                                  |
/// | Inlet flow       | 1.0 m^3/s                              |
/// | Valve position   | 0.5                                    |
/// | Gains            | `kc = -1.0`, `tau_i = 10 s`, `tau_d = 1 s` |
/// | Bias and limits  | 0.5, clamped to 0..1                   |
/// | Integral bound   | 10                                     |
/// | Timestep         | 1 s                                    |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TankSimConfig {
    pub parameters: TankParameters,
    pub simulator: SimulatorConfig,
}

/// Errors returned by [`TankSimConfig::build`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TankSimError {
    #[error("invalid tank parameters: {0}")]
    Parameters(#[from] TankParameterError),

    #[error("invalid simulator configuration: {0}")]
    Simulator(#[from] ConfigError),
}

impl TankSimConfig {
    /// Returns the default level controller.
    #[must_use]
    pub fn level_controller() -> ControllerConfig {
        ControllerConfig {
            gains: Gains::new(-1.0, 10.0, 1.0),
            bias: NOMINAL_VALVE_POSITION,
            min_output: 0.0,
            max_output: 1.0,
            max_integral: 10.0,
            measured_index: TankModel::LEVEL,
            output_index: TankModel::VALVE_POSITION,
            initial_setpoint: NOMINAL_LEVEL,
        }
    }

    /// Validates the parameters and builds a simulator for this scenario.
    ///
    /// # Errors
    ///
    /// Returns a [`TankSimError`] if the tank parameters or the simulator
    /// configuration are invalid.
    pub fn build(&self) -> Result<Simulator<TankModel>, TankSimError> {
        let model = TankModel::new(self.parameters)?;
        let simulator = Simulator::new(model, self.simulator.clone())?;

        debug!(parameters = ?self.parameters, "tank simulator built");
        Ok(simulator)
    }
}

impl Default for TankSimConfig {
    fn default() -> Self {
        Self {
            parameters: TankParameters::default(),
            simulator: SimulatorConfig {
                controllers: vec![Self::level_controller()],
                initial_state: vec![NOMINAL_LEVEL],
                initial_inputs: vec![NOMINAL_INLET_FLOW, NOMINAL_VALVE_POSITION],
                dt: Time::new::<second>(1.0),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use tanksim_core::{Stepping, TimeIncrementError};
    use uom::si::{area::square_meter, f64::Area};

    #[test]
    fn default_scenario_starts_at_steady_state() {
        let mut sim = TankSimConfig::default().build().unwrap();

        assert_eq!(sim.controller_count(), 1);
        assert_eq!(sim.state(), &[2.5]);
        assert_eq!(sim.inputs(), &[1.0, 0.5]);
        assert_eq!(sim.setpoint(0), Ok(2.5));
        assert_relative_eq!(sim.dt().seconds(), 1.0);

        sim.advance(Stepping::FixedSteps { num_steps: 100 }).unwrap();
        assert_relative_eq!(sim.state()[0], 2.5, epsilon = 1e-3);
        assert_relative_eq!(sim.controller_output(0).unwrap(), 0.5, epsilon = 1e-3);
    }

    #[test]
    fn level_controller_is_reverse_acting() {
        let controller = TankSimConfig::level_controller();
        assert!(controller.gains.kc < 0.0);
        assert_eq!(controller.measured_index, TankModel::LEVEL);
        assert_eq!(controller.output_index, TankModel::VALVE_POSITION);
    }

    #[test]
    fn invalid_parameters_are_reported_before_the_simulator_is_built() {
        let mut config = TankSimConfig::default();
        config.parameters.area = Area::new::<square_meter>(-1.0);
        config.simulator.dt = Time::new::<second>(0.0);

        assert_eq!(
            config.build().unwrap_err(),
            TankSimError::Parameters(TankParameterError::Area(-1.0))
        );
    }

    #[test]
    fn invalid_simulator_configuration_is_reported() {
        let mut config = TankSimConfig::default();
        config.simulator.dt = Time::new::<second>(0.0);

        assert_eq!(
            config.build().unwrap_err(),
            TankSimError::Simulator(ConfigError::TimeStep(TimeIncrementError::NotPositive(0.0)))
        );
    }

    #[test]
    fn wrong_input_count_is_rejected() {
        let mut config = TankSimConfig::default();
        config.simulator.initial_inputs = vec![1.0];

        assert!(matches!(
            config.build(),
            Err(TankSimError::Simulator(ConfigError::InputDimension {
                expected: 2,
                actual: 1
            }))
        ));
    }
}
