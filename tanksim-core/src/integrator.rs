mod error;

pub use error::Error;

use crate::Derivative;

/// The classic fixed-step, fourth-order explicit Runge-Kutta method.
///
/// `Rk4` advances a state vector of a fixed dimension by one time increment.
/// Its stage buffers are allocated once in [`Rk4::new`] and reused by every
/// call to [`step`](Rk4::step), so an integrator is tied to a single state
/// dimension.
/// No simulation state survives between calls beyond that workspace, which
/// makes an `Rk4` safe to reuse across ticks with varying `dt`.
///
/// The workspace is owned exclusively: `Rk4` can be moved but not cloned.
///
/// # Method
///
/// ```text
///   k1 = f(t,        x,             u)
///   k2 = f(t + dt/2, x + dt/2 * k1, u)
///   k3 = f(t + dt/2, x + dt/2 * k2, u)
///   k4 = f(t + dt,   x + dt * k3,   u)
///
///   x_next = x + dt/6 * (k1 + 2*k2 + 2*k3 + k4)
/// ```
///
/// The input `u` is held constant across all four stages (zero-order hold).
/// Local truncation error is `O(dt^5)` and global error is `O(dt^4)` for
/// smooth derivatives.
#[derive(Debug)]
pub struct Rk4 {
    dimension: usize,
    k1: Vec<f64>,
    k2: Vec<f64>,
    k3: Vec<f64>,
    k4: Vec<f64>,
    stage: Vec<f64>,
}

impl Rk4 {
    /// Creates an integrator for state vectors with `dimension` entries.
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            k1: vec![0.0; dimension],
            k2: vec![0.0; dimension],
            k3: vec![0.0; dimension],
            k4: vec![0.0; dimension],
            stage: vec![0.0; dimension],
        }
    }

    /// Returns the state dimension this integrator was built for.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Advances `state` from time `t` by `dt` and returns the new state.
    ///
    /// `model` is evaluated exactly four times, at `t`, `t + dt/2`,
    /// `t + dt/2`, and `t + dt`, always with the same `input`.
    ///
    /// # Errors
    ///
    /// - [`Error::DimensionMismatch`] if `state` does not have
    ///   [`dimension`](Rk4::dimension) entries.
    /// - [`Error::Derivative`] if any stage evaluation of `model` fails.
    /// - [`Error::NonFiniteState`] if the resulting state contains a NaN or
    ///   infinite value.
    pub fn step<D: Derivative>(
        &mut self,
        t: f64,
        dt: f64,
        state: &[f64],
        input: &[f64],
        model: &D,
    ) -> Result<Vec<f64>, Error> {
        if state.len() != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual: state.len(),
            });
        }

        let half_dt = 0.5 * dt;
        let t_mid = t + half_dt;
        let t_end = t + dt;

        evaluate(model, t, state, input, &mut self.k1)?;

        offset(&mut self.stage, state, half_dt, &self.k1);
        evaluate(model, t_mid, &self.stage, input, &mut self.k2)?;

        offset(&mut self.stage, state, half_dt, &self.k2);
        evaluate(model, t_mid, &self.stage, input, &mut self.k3)?;

        offset(&mut self.stage, state, dt, &self.k3);
        evaluate(model, t_end, &self.stage, input, &mut self.k4)?;

        let sixth_dt = dt / 6.0;
        let mut next = Vec::with_capacity(self.dimension);
        for i in 0..self.dimension {
            let weighted = self.k1[i] + 2.0 * self.k2[i] + 2.0 * self.k3[i] + self.k4[i];
            let value = state[i] + sixth_dt * weighted;
            if !value.is_finite() {
                return Err(Error::NonFiniteState {
                    time: t,
                    index: i,
                    value,
                });
            }
            next.push(value);
        }

        Ok(next)
    }
}

/// Evaluates one stage derivative into `dxdt`.
fn evaluate<D: Derivative>(
    model: &D,
    time: f64,
    state: &[f64],
    input: &[f64],
    dxdt: &mut [f64],
) -> Result<(), Error> {
    dxdt.fill(0.0);
    model
        .derivative(time, state, input, dxdt)
        .map_err(|source| Error::Derivative {
            time,
            source: Box::new(source),
        })
}

/// Writes `base + scale * slope` into `out`.
fn offset(out: &mut [f64], base: &[f64], scale: f64, slope: &[f64]) {
    for ((o, b), k) in out.iter_mut().zip(base).zip(slope) {
        *o = b + scale * k;
    }
}
