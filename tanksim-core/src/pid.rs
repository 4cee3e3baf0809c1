#[cfg(feature = "serde-derive")]
use serde::{Deserialize, Serialize};

/// Tuning parameters for a [`PidController`].
///
/// A zero `tau_i` disables integral action and a zero `tau_d` disables
/// derivative action.
///
/// The sign of `kc` sets the control direction.
/// A reverse-acting loop, where raising the output lowers the measurement,
/// needs a negative `kc`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde-derive", derive(Serialize, Deserialize))]
pub struct Gains {
    /// Proportional gain.
    pub kc: f64,
    /// Integral time constant, in seconds.
    pub tau_i: f64,
    /// Derivative time constant, in seconds.
    pub tau_d: f64,
}

impl Gains {
    /// Creates a gain set.
    #[must_use]
    pub const fn new(kc: f64, tau_i: f64, tau_d: f64) -> Self {
        Self { kc, tau_i, tau_d }
    }
}

/// A discrete PID control law with output saturation and anti-windup.
///
/// Each call to [`compute`](PidController::compute) evaluates
///
/// ```text
///   integral += (kc / tau_i) * error * dt          (skipped when tau_i == 0)
///   integral  = clamp(integral, -max_integral, max_integral)
///   raw       = bias + kc * error + integral + kc * tau_d * error_rate
///   output    = clamp(raw, min_output, max_output)
/// ```
///
/// The accumulator is clamped before it contributes to the output.
/// Once it reaches its bound, further error of the same sign cannot grow it,
/// so the controller recovers as soon as the error changes sign.
///
/// The error rate is supplied by the caller; the controller keeps no error
/// history of its own.
/// Inputs are taken as given: a degenerate `dt` or gain set is the caller's
/// responsibility.
#[derive(Debug, Clone, PartialEq)]
pub struct PidController {
    gains: Gains,
    bias: f64,
    min_output: f64,
    max_output: f64,
    max_integral: f64,
    integral: f64,
}

impl PidController {
    /// Creates a controller with an empty integral accumulator.
    #[must_use]
    pub fn new(
        gains: Gains,
        bias: f64,
        min_output: f64,
        max_output: f64,
        max_integral: f64,
    ) -> Self {
        Self {
            gains,
            bias,
            min_output,
            max_output,
            max_integral,
            integral: 0.0,
        }
    }

    /// Computes the saturated controller output for one sample.
    pub fn compute(&mut self, error: f64, error_rate: f64, dt: f64) -> f64 {
        let Gains { kc, tau_i, tau_d } = self.gains;

        let proportional = kc * error;

        if tau_i != 0.0 {
            self.integral += (kc / tau_i) * error * dt;
        }
        self.integral = self.integral.max(-self.max_integral).min(self.max_integral);

        let derivative = if tau_d == 0.0 {
            0.0
        } else {
            kc * tau_d * error_rate
        };

        let raw = self.bias + proportional + self.integral + derivative;
        raw.max(self.min_output).min(self.max_output)
    }

    /// Replaces the gains while keeping the integral accumulator.
    ///
    /// Preserving the accumulator keeps the output continuous across a
    /// retune. The new gains apply from the next call to `compute`.
    pub fn set_gains(&mut self, gains: Gains) {
        self.gains = gains;
    }

    /// Empties the integral accumulator.
    ///
    /// Gains, bias, and limits are left untouched.
    pub fn reset(&mut self) {
        self.integral = 0.0;
    }

    /// Returns the current gains.
    #[must_use]
    pub fn gains(&self) -> Gains {
        self.gains
    }

    /// Returns the output at zero error.
    #[must_use]
    pub fn bias(&self) -> f64 {
        self.bias
    }

    /// Returns the `[min, max]` output limits.
    #[must_use]
    pub fn output_limits(&self) -> [f64; 2] {
        [self.min_output, self.max_output]
    }

    /// Returns the bound on the integral accumulator's magnitude.
    #[must_use]
    pub fn max_integral(&self) -> f64 {
        self.max_integral
    }

    /// Returns the current integral accumulator.
    #[must_use]
    pub fn integral(&self) -> f64 {
        self.integral
    }
}
