use std::error::Error as StdError;

use thiserror::Error;

/// Errors that can occur during a Runge-Kutta step.
#[derive(Debug, Error)]
pub enum Error {
    #[error("state has {actual} entries but the integrator was built for {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("derivative evaluation failed at t = {time}")]
    Derivative {
        time: f64,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("non-finite value {value} at state index {index} after step from t = {time}")]
    NonFiniteState { time: f64, index: usize, value: f64 },
}
