mod config;
mod error;

pub use config::{ControllerConfig, SimulatorConfig};
pub use error::{ConfigError, IndexError, IndexKind, StepError};

use tracing::{debug, error, trace, warn};
use uom::si::{f64::Time, time::second};

use crate::{Gains, PidController, ProcessModel, Rk4, TimeIncrement};

/// Advances a process model under closed-loop PID control, one fixed tick
/// at a time.
///
/// A `Simulator` owns the canonical state and input vectors, the simulation
/// clock, an [`Rk4`] integrator sized for the model, and one
/// [`PidController`] per configured loop.
///
/// # Tick sequence
///
/// Each call to [`step`](Simulator::step):
///
/// 1. Integrates the model over `dt` with the *current* inputs, which are
///    the controller outputs from the previous tick.
/// 2. Advances the clock by `dt`.
/// 3. For each loop, in configuration order:
///    - `error = setpoint - state[measured_index]`, read from the new state,
///    - `rate = (error - previous_error) / dt`,
///    - writes the controller output to `inputs[output_index]`,
///    - remembers `error` for the next tick.
///
/// If two loops drive the same input, the one configured later wins.
///
/// # Faults
///
/// A failed integration discards the tick and marks the simulator faulted.
/// While faulted, `step` and `advance` return [`StepError::Faulted`];
/// [`reset`](Simulator::reset) clears the fault.
pub struct Simulator<M: ProcessModel> {
    model: M,
    rk4: Rk4,
    dt: TimeIncrement,
    time: Time,
    state: Vec<f64>,
    inputs: Vec<f64>,
    loops: Vec<ControlLoop>,
    config: SimulatorConfig,
    faulted: bool,
}

/// A controller plus its wiring and runtime bookkeeping.
#[derive(Debug, Clone)]
struct ControlLoop {
    controller: PidController,
    measured_index: usize,
    output_index: usize,
    setpoint: f64,
    previous_error: f64,
}

impl ControlLoop {
    fn new(config: &ControllerConfig) -> Self {
        Self {
            controller: config.controller(),
            measured_index: config.measured_index,
            output_index: config.output_index,
            setpoint: config.initial_setpoint,
            previous_error: 0.0,
        }
    }
}

/// Defines how [`Simulator::advance`] repeats [`Simulator::step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stepping {
    /// Take exactly `num_steps` ticks.
    FixedSteps { num_steps: usize },

    /// Tick until the clock reaches or passes `end_time` (may overstep).
    UntilTime { end_time: Time },
}

impl<M: ProcessModel> Simulator<M> {
    /// Creates a simulator bound to `model`.
    ///
    /// The configuration is validated in this order, and the first violation
    /// is returned:
    ///
    /// 1. `initial_state` has `model.state_len()` entries,
    /// 2. `initial_inputs` has `model.input_len()` entries,
    /// 3. `dt` is a valid [`TimeIncrement`],
    /// 4. every controller's `measured_index` is a valid state index,
    /// 5. every controller's `output_index` is a valid input index.
    ///
    /// Checks 4 and 5 run controller by controller, in configuration order.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] describing the first failed check.
    pub fn new(model: M, config: SimulatorConfig) -> Result<Self, ConfigError> {
        let dt = validate(&model, &config)
            .inspect_err(|err| warn!(%err, "rejected simulator configuration"))?;

        let loops = config.controllers.iter().map(ControlLoop::new).collect();

        debug!(
            state_len = config.initial_state.len(),
            input_len = config.initial_inputs.len(),
            controllers = config.controllers.len(),
            %dt,
            "simulator constructed"
        );

        Ok(Self {
            rk4: Rk4::new(model.state_len()),
            model,
            dt,
            time: Time::new::<second>(0.0),
            state: config.initial_state.clone(),
            inputs: config.initial_inputs.clone(),
            loops,
            config,
            faulted: false,
        })
    }

    /// Advances the simulation by one tick.
    ///
    /// # Errors
    ///
    /// - [`StepError::Integrator`] if the integrator fails. The tick is
    ///   discarded and the simulator becomes faulted.
    /// - [`StepError::Faulted`] if an earlier step failed and the simulator
    ///   has not been reset since.
    pub fn step(&mut self) -> Result<(), StepError> {
        if self.faulted {
            return Err(StepError::Faulted);
        }

        let t = self.time.get::<second>();
        let dt = self.dt.seconds();

        self.state = match self
            .rk4
            .step(t, dt, &self.state, &self.inputs, &self.model)
        {
            Ok(next) => next,
            Err(source) => {
                self.faulted = true;
                error!(time = t, error = %source, "simulation step failed");
                return Err(StepError::Integrator { time: t, source });
            }
        };
        self.time += self.dt;

        for control in &mut self.loops {
            let error = control.setpoint - self.state[control.measured_index];
            let error_rate = (error - control.previous_error) / dt;

            self.inputs[control.output_index] = control.controller.compute(error, error_rate, dt);
            control.previous_error = error;
        }

        trace!(
            time = self.time.get::<second>(),
            state = ?self.state,
            inputs = ?self.inputs,
            "tick"
        );

        Ok(())
    }

    /// Repeats [`step`](Simulator::step) according to `stepping`.
    ///
    /// Stops at the first failed step.
    /// With [`Stepping::UntilTime`], no step is taken if the clock has
    /// already reached `end_time`.
    ///
    /// # Errors
    ///
    /// Returns the first [`StepError`] encountered, or
    /// [`StepError::NonFiniteEndTime`] if `end_time` is NaN or infinite.
    pub fn advance(&mut self, stepping: Stepping) -> Result<&mut Self, StepError> {
        match stepping {
            Stepping::FixedSteps { num_steps } => {
                for _ in 0..num_steps {
                    self.step()?;
                }
            }
            Stepping::UntilTime { end_time } => {
                let end = end_time.get::<second>();
                if !end.is_finite() {
                    return Err(StepError::NonFiniteEndTime(end));
                }
                while self.time < end_time {
                    self.step()?;
                }
            }
        }

        Ok(self)
    }

    /// Restores the simulator to its construction-time conditions.
    ///
    /// The clock returns to zero, state and inputs return to their initial
    /// values, every setpoint returns to its configured initial value, and
    /// every integral accumulator and previous error is zeroed.
    /// Controller gains are kept. A fault is cleared.
    pub fn reset(&mut self) {
        self.time = Time::new::<second>(0.0);
        self.state.clone_from(&self.config.initial_state);
        self.inputs.clone_from(&self.config.initial_inputs);

        for (control, config) in self.loops.iter_mut().zip(&self.config.controllers) {
            control.controller.reset();
            control.setpoint = config.initial_setpoint;
            control.previous_error = 0.0;
        }

        self.faulted = false;
        debug!("simulator reset");
    }

    /// Returns the simulation clock.
    pub fn time(&self) -> Time {
        self.time
    }

    /// Returns the fixed timestep.
    pub fn dt(&self) -> TimeIncrement {
        self.dt
    }

    pub fn state(&self) -> &[f64] {
        &self.state
    }

    pub fn inputs(&self) -> &[f64] {
        &self.inputs
    }

    /// Returns the bound process model.
    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn controller_count(&self) -> usize {
        self.loops.len()
    }

    /// Returns `true` if a step has failed since the last reset.
    pub fn is_faulted(&self) -> bool {
        self.faulted
    }

    /// Returns controller `index`, for inspecting its gains or accumulator.
    ///
    /// # Errors
    ///
    /// Returns an [`IndexError`] if `index` is not a valid controller index.
    pub fn controller(&self, index: usize) -> Result<&PidController, IndexError> {
        Ok(&self.control_loop(index)?.controller)
    }

    /// Returns the current setpoint of controller `index`.
    ///
    /// # Errors
    ///
    /// Returns an [`IndexError`] if `index` is not a valid controller index.
    pub fn setpoint(&self, index: usize) -> Result<f64, IndexError> {
        Ok(self.control_loop(index)?.setpoint)
    }

    /// Returns the value currently applied at controller `index`'s output.
    ///
    /// This reads the input vector, so it reports the clamped output that
    /// will drive the next tick, or a later overwrite by another loop or by
    /// [`set_input`](Simulator::set_input).
    ///
    /// # Errors
    ///
    /// Returns an [`IndexError`] if `index` is not a valid controller index.
    pub fn controller_output(&self, index: usize) -> Result<f64, IndexError> {
        let control = self.control_loop(index)?;
        Ok(self.inputs[control.output_index])
    }

    /// Returns `setpoint - measured value` for controller `index`, from the
    /// current state.
    ///
    /// # Errors
    ///
    /// Returns an [`IndexError`] if `index` is not a valid controller index.
    pub fn error(&self, index: usize) -> Result<f64, IndexError> {
        let control = self.control_loop(index)?;
        Ok(control.setpoint - self.state[control.measured_index])
    }

    /// Overwrites input `index`, for disturbances or operator overrides.
    ///
    /// A controller driving the same input replaces the value at the end of
    /// the next tick.
    ///
    /// # Errors
    ///
    /// Returns an [`IndexError`] if `index` is not a valid input index.
    pub fn set_input(&mut self, index: usize, value: f64) -> Result<(), IndexError> {
        let len = self.inputs.len();
        let input = self.inputs.get_mut(index).ok_or(IndexError {
            kind: IndexKind::Input,
            index,
            len,
        })?;

        *input = value;
        trace!(index, value, "input set");
        Ok(())
    }

    /// Changes the target of controller `index`.
    ///
    /// # Errors
    ///
    /// Returns an [`IndexError`] if `index` is not a valid controller index.
    pub fn set_setpoint(&mut self, index: usize, value: f64) -> Result<(), IndexError> {
        self.control_loop_mut(index)?.setpoint = value;
        trace!(index, value, "setpoint set");
        Ok(())
    }

    /// Retunes controller `index` without disturbing its accumulator.
    ///
    /// # Errors
    ///
    /// Returns an [`IndexError`] if `index` is not a valid controller index.
    pub fn set_controller_gains(&mut self, index: usize, gains: Gains) -> Result<(), IndexError> {
        self.control_loop_mut(index)?.controller.set_gains(gains);
        trace!(index, ?gains, "controller retuned");
        Ok(())
    }

    fn control_loop(&self, index: usize) -> Result<&ControlLoop, IndexError> {
        self.loops.get(index).ok_or(IndexError {
            kind: IndexKind::Controller,
            index,
            len: self.loops.len(),
        })
    }

    fn control_loop_mut(&mut self, index: usize) -> Result<&mut ControlLoop, IndexError> {
        let len = self.loops.len();
        self.loops.get_mut(index).ok_or(IndexError {
            kind: IndexKind::Controller,
            index,
            len,
        })
    }
}

impl<M: ProcessModel + std::fmt::Debug> std::fmt::Debug for Simulator<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("model", &self.model)
            .field("dt", &self.dt)
            .field("time", &self.time)
            .field("state", &self.state)
            .field("inputs", &self.inputs)
            .field("loops", &self.loops)
            .field("faulted", &self.faulted)
            .finish_non_exhaustive()
    }
}

/// Runs the construction checks in order and returns the validated timestep.
fn validate<M: ProcessModel>(
    model: &M,
    config: &SimulatorConfig,
) -> Result<TimeIncrement, ConfigError> {
    let state_len = model.state_len();
    if config.initial_state.len() != state_len {
        return Err(ConfigError::StateDimension {
            expected: state_len,
            actual: config.initial_state.len(),
        });
    }

    let input_len = model.input_len();
    if config.initial_inputs.len() != input_len {
        return Err(ConfigError::InputDimension {
            expected: input_len,
            actual: config.initial_inputs.len(),
        });
    }

    let dt = TimeIncrement::from_time(config.dt)?;

    for (controller, loop_config) in config.controllers.iter().enumerate() {
        if loop_config.measured_index >= state_len {
            return Err(ConfigError::MeasuredIndex {
                controller,
                index: loop_config.measured_index,
                len: state_len,
            });
        }
        if loop_config.output_index >= input_len {
            return Err(ConfigError::OutputIndex {
                controller,
                index: loop_config.output_index,
                len: input_len,
            });
        }
    }

    Ok(dt)
}
