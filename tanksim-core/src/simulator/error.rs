use std::fmt;

use thiserror::Error;

use crate::{TimeIncrementError, integrator};

/// Errors that prevent a [`Simulator`](crate::Simulator) from being built.
///
/// Checks run in declaration order and the first violation is reported.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("initial state has {actual} entries but the model expects {expected}")]
    StateDimension { expected: usize, actual: usize },

    #[error("initial inputs have {actual} entries but the model expects {expected}")]
    InputDimension { expected: usize, actual: usize },

    #[error("invalid time step: {0}")]
    TimeStep(#[from] TimeIncrementError),

    #[error("controller {controller} measures state index {index}, but the state has {len} entries")]
    MeasuredIndex {
        controller: usize,
        index: usize,
        len: usize,
    },

    #[error("controller {controller} drives input index {index}, but there are {len} inputs")]
    OutputIndex {
        controller: usize,
        index: usize,
        len: usize,
    },
}

/// The kind of index passed to a simulator accessor or mutator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Controller,
    Input,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKind::Controller => f.write_str("controller"),
            IndexKind::Input => f.write_str("input"),
        }
    }
}

/// An out-of-range index passed to a simulator accessor or mutator.
///
/// The call that returns this error leaves the simulator unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{kind} index {index} is out of range for {len} {kind}(s)")]
pub struct IndexError {
    pub kind: IndexKind,
    pub index: usize,
    pub len: usize,
}

/// Errors returned by [`Simulator::step`](crate::Simulator::step) and
/// [`Simulator::advance`](crate::Simulator::advance).
#[derive(Debug, Error)]
pub enum StepError {
    #[error("integration failed on the tick starting at t = {time} s")]
    Integrator {
        time: f64,
        #[source]
        source: integrator::Error,
    },

    #[error("a previous step failed; reset the simulator before stepping again")]
    Faulted,

    #[error("cannot advance to a non-finite end time ({0} s)")]
    NonFiniteEndTime(f64),
}
