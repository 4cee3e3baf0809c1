use std::{convert::Infallible, fmt, marker::PhantomData};

/// A trait for evaluating the time derivative of a state vector.
///
/// `Derivative` is the contract between an integrator and the physics it
/// advances.
/// Given the current time, state, and input, an implementation writes
/// `d(state)/dt` into `dxdt`, which always has the same length as `state`.
///
/// Implementations must be pure: the same arguments always produce the same
/// derivative, and evaluation has no side effects.
///
/// Closures with the signature `Fn(f64, &[f64], &[f64], &mut [f64])`
/// implement this trait automatically and never fail:
///
/// ```
/// use tanksim_core::Derivative;
///
/// let decay = |_t: f64, x: &[f64], _u: &[f64], dxdt: &mut [f64]| {
///     dxdt[0] = -x[0];
/// };
///
/// let mut dxdt = [0.0];
/// decay.derivative(0.0, &[2.0], &[], &mut dxdt).unwrap();
/// assert_eq!(dxdt, [-2.0]);
/// ```
pub trait Derivative {
    /// The error type returned if the derivative cannot be evaluated.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Writes the time derivative of `state` into `dxdt`.
    ///
    /// # Errors
    ///
    /// Returns `Err(Self::Error)` if the model cannot be evaluated at the
    /// given point.
    fn derivative(
        &self,
        time: f64,
        state: &[f64],
        input: &[f64],
        dxdt: &mut [f64],
    ) -> Result<(), Self::Error>;
}

/// Blanket implementation for derivative closures.
impl<F> Derivative for F
where
    F: Fn(f64, &[f64], &[f64], &mut [f64]),
{
    type Error = Infallible;

    fn derivative(
        &self,
        time: f64,
        state: &[f64],
        input: &[f64],
        dxdt: &mut [f64],
    ) -> Result<(), Self::Error> {
        self(time, state, input, dxdt);
        Ok(())
    }
}

/// A process model with fixed state and input dimensions.
///
/// A `ProcessModel` is a [`Derivative`] that also declares how many state
/// and input entries it expects.
/// A [`Simulator`](crate::Simulator) binds one model at construction and
/// validates its initial vectors against these dimensions.
pub trait ProcessModel: Derivative {
    /// Number of entries in the state vector.
    fn state_len(&self) -> usize;

    /// Number of entries in the input vector.
    fn input_len(&self) -> usize;
}

/// A [`ProcessModel`] backed by a derivative closure.
///
/// Closures carry no dimension information, so `FnModel` pairs one with the
/// state and input lengths it is written for.
///
/// ```
/// use tanksim_core::{FnModel, ProcessModel};
///
/// // A first-order lag driven by its single input.
/// let lag = FnModel::new(1, 1, |_t, x: &[f64], u: &[f64], dxdt: &mut [f64]| {
///     dxdt[0] = u[0] - x[0];
/// });
///
/// assert_eq!(lag.state_len(), 1);
/// assert_eq!(lag.input_len(), 1);
/// ```
#[derive(Clone, Copy)]
pub struct FnModel<D> {
    state_len: usize,
    input_len: usize,
    derivative: D,
}

impl<F> FnModel<F>
where
    F: Fn(f64, &[f64], &[f64], &mut [f64]),
{
    /// Creates a model from an infallible derivative closure.
    pub fn new(state_len: usize, input_len: usize, function: F) -> Self {
        Self {
            state_len,
            input_len,
            derivative: function,
        }
    }
}

impl<F, E> FnModel<TryFn<F, E>>
where
    F: Fn(f64, &[f64], &[f64], &mut [f64]) -> Result<(), E>,
    E: std::error::Error + Send + Sync + 'static,
{
    /// Creates a model from a derivative closure that can fail.
    pub fn fallible(state_len: usize, input_len: usize, function: F) -> Self {
        Self {
            state_len,
            input_len,
            derivative: TryFn {
                function,
                _marker: PhantomData,
            },
        }
    }
}

impl<D> fmt::Debug for FnModel<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnModel")
            .field("state_len", &self.state_len)
            .field("input_len", &self.input_len)
            .finish_non_exhaustive()
    }
}

impl<D: Derivative> Derivative for FnModel<D> {
    type Error = D::Error;

    fn derivative(
        &self,
        time: f64,
        state: &[f64],
        input: &[f64],
        dxdt: &mut [f64],
    ) -> Result<(), Self::Error> {
        self.derivative.derivative(time, state, input, dxdt)
    }
}

impl<D: Derivative> ProcessModel for FnModel<D> {
    fn state_len(&self) -> usize {
        self.state_len
    }

    fn input_len(&self) -> usize {
        self.input_len
    }
}

/// A derivative closure that reports failures through `Result`.
///
/// Built by [`FnModel::fallible`].
#[derive(Clone, Copy)]
pub struct TryFn<F, E> {
    function: F,
    _marker: PhantomData<fn() -> E>,
}

impl<F, E> Derivative for TryFn<F, E>
where
    F: Fn(f64, &[f64], &[f64], &mut [f64]) -> Result<(), E>,
    E: std::error::Error + Send + Sync + 'static,
{
    type Error = E;

    fn derivative(
        &self,
        time: f64,
        state: &[f64],
        input: &[f64],
        dxdt: &mut [f64],
    ) -> Result<(), Self::Error> {
        (self.function)(time, state, input, dxdt)
    }
}
