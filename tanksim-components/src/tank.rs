mod scenario;
mod snapshot;

use std::convert::Infallible;

pub use scenario::{TankSimConfig, TankSimError};
pub use snapshot::TankSnapshot;

use serde::{Deserialize, Serialize};
use tanksim_core::{Derivative, ProcessModel};
use thiserror::Error;
use uom::si::{
    area::square_meter,
    f64::{Area, Length, Velocity, VolumeRate},
    length::meter,
    velocity::meter_per_second,
    volume_rate::cubic_meter_per_second,
};

/// Default cross-sectional area, in square meters.
pub const DEFAULT_AREA: f64 = 120.0;

/// Default valve coefficient, in m^2.5/s.
///
/// Chosen so the outlet passes 1 m^3/s at the nominal level with the valve
/// half open.
pub const DEFAULT_VALVE_COEFFICIENT: f64 = 1.2649;

/// Default tank height, in meters.
pub const DEFAULT_MAX_HEIGHT: f64 = 5.0;

/// Nominal operating level, in meters.
pub const NOMINAL_LEVEL: f64 = 2.5;

/// Nominal inlet flow, in m^3/s.
pub const NOMINAL_INLET_FLOW: f64 = 1.0;

/// Nominal valve position, as a fraction of fully open.
pub const NOMINAL_VALVE_POSITION: f64 = 0.5;

/// Physical parameters of a [`TankModel`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TankParameters {
    /// Cross-sectional area, constant with height.
    pub area: Area,
    /// Outlet valve coefficient `k_v`, in m^2.5/s.
    pub valve_coefficient: f64,
    pub max_height: Length,
}

impl Default for TankParameters {
    fn default() -> Self {
        Self {
            area: Area::new::<square_meter>(DEFAULT_AREA),
            valve_coefficient: DEFAULT_VALVE_COEFFICIENT,
            max_height: Length::new::<meter>(DEFAULT_MAX_HEIGHT),
        }
    }
}

/// Errors returned when building a [`TankModel`] from invalid parameters.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TankParameterError {
    #[error("tank area must be positive and finite, got {0} m^2")]
    Area(f64),

    #[error("valve coefficient must be non-negative and finite, got {0}")]
    ValveCoefficient(f64),

    #[error("tank height must be positive and finite, got {0} m")]
    MaxHeight(f64),
}

/// A liquid tank drained through a control valve.
///
/// The tank has a constant cross-sectional area `A`.
/// Its level `h` follows the material balance
///
/// ```text
///   dh/dt = (q_in - q_out) / A
///   q_out = k_v * x * sqrt(h)    for h > 0, otherwise 0
/// ```
///
/// where `x` is the valve position, from 0 (closed) to 1 (fully open).
///
/// As a [`ProcessModel`], the state vector is `[level]` in meters and the
/// input vector is `[inlet flow, valve position]` with the flow in m^3/s.
/// The model does not clamp the level to the tank height; overflow is left
/// to the caller to detect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TankModel {
    area: Area,
    valve_coefficient: f64,
    max_height: Length,
}

impl TankModel {
    /// State index of the liquid level.
    pub const LEVEL: usize = 0;

    /// Input index of the inlet flow.
    pub const INLET_FLOW: usize = 0;

    /// Input index of the outlet valve position.
    pub const VALVE_POSITION: usize = 1;

    /// Creates a tank from validated parameters.
    ///
    /// # Errors
    ///
    /// Returns a [`TankParameterError`] if the area or height is not strictly
    /// positive and finite, or if the valve coefficient is negative or not
    /// finite.
    pub fn new(parameters: TankParameters) -> Result<Self, TankParameterError> {
        let TankParameters {
            area,
            valve_coefficient,
            max_height,
        } = parameters;

        let area_m2 = area.get::<square_meter>();
        if !(area_m2 > 0.0 && area_m2.is_finite()) {
            return Err(TankParameterError::Area(area_m2));
        }
        if !(valve_coefficient >= 0.0 && valve_coefficient.is_finite()) {
            return Err(TankParameterError::ValveCoefficient(valve_coefficient));
        }
        let height_m = max_height.get::<meter>();
        if !(height_m > 0.0 && height_m.is_finite()) {
            return Err(TankParameterError::MaxHeight(height_m));
        }

        Ok(Self {
            area,
            valve_coefficient,
            max_height,
        })
    }

    /// Returns the parameters this tank was built from.
    #[must_use]
    pub fn parameters(&self) -> TankParameters {
        TankParameters {
            area: self.area,
            valve_coefficient: self.valve_coefficient,
            max_height: self.max_height,
        }
    }

    #[must_use]
    pub fn area(&self) -> Area {
        self.area
    }

    #[must_use]
    pub fn max_height(&self) -> Length {
        self.max_height
    }

    /// Returns the flow through the outlet valve.
    ///
    /// An empty tank, or one with a negative level, has no outflow.
    #[must_use]
    pub fn outlet_flow(&self, level: Length, valve_position: f64) -> VolumeRate {
        let h = level.get::<meter>();
        let flow = if h > 0.0 {
            self.valve_coefficient * valve_position * h.sqrt()
        } else {
            0.0
        };
        VolumeRate::new::<cubic_meter_per_second>(flow)
    }

    /// Returns the rate of change of the level.
    #[must_use]
    pub fn level_rate(&self, level: Length, inlet_flow: VolumeRate, valve_position: f64) -> Velocity {
        (inlet_flow - self.outlet_flow(level, valve_position)) / self.area
    }
}

impl Default for TankModel {
    fn default() -> Self {
        let TankParameters {
            area,
            valve_coefficient,
            max_height,
        } = TankParameters::default();

        Self {
            area,
            valve_coefficient,
            max_height,
        }
    }
}

impl Derivative for TankModel {
    type Error = Infallible;

    fn derivative(
        &self,
        _time: f64,
        state: &[f64],
        input: &[f64],
        dxdt: &mut [f64],
    ) -> Result<(), Self::Error> {
        let level = Length::new::<meter>(state[Self::LEVEL]);
        let inlet_flow = VolumeRate::new::<cubic_meter_per_second>(input[Self::INLET_FLOW]);
        let valve_position = input[Self::VALVE_POSITION];

        dxdt[Self::LEVEL] = self
            .level_rate(level, inlet_flow, valve_position)
            .get::<meter_per_second>();
        Ok(())
    }
}

impl ProcessModel for TankModel {
    fn state_len(&self) -> usize {
        1
    }

    fn input_len(&self) -> usize {
        2
    }
}
