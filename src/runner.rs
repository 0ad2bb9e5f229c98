//! Capability traits shared by the execution engines.
//!
//! The Turing machine, the two-tag engine and the canonical rewriter share no state, only
//! the contract of loading an input, stepping to a terminal configuration and reporting a
//! result. Each step can be observed through a caller-supplied sink.

use crate::types::{Error, Step};

/// An engine that can advance by one step.
pub trait Stepper {
    /// Structured record describing the engine's configuration at a point in time.
    type Trace;

    /// Executes a single step.
    fn step(&mut self) -> Result<Step, Error>;

    /// Returns a record of the current configuration.
    fn trace(&self) -> Self::Trace;
}

/// An engine that can be loaded with an input and run until it halts.
pub trait Runner: Stepper {
    type Input: ?Sized;
    type Output;

    /// Resets the engine and places `input` as its initial configuration.
    fn load(&mut self, input: &Self::Input) -> Result<(), Error>;

    /// The result of the run so far.
    fn output(&self) -> Self::Output;

    /// Loads `input` and steps until the engine halts.
    ///
    /// No step bound is applied; callers that need one drive [`Stepper::step`] themselves.
    fn run(&mut self, input: &Self::Input) -> Result<Self::Output, Error> {
        self.load(input)?;
        while self.step()? == Step::Continue {}

        Ok(self.output())
    }

    /// Like [`Runner::run`], returning `None` if the engine takes more than `max_steps` steps.
    fn run_bounded(
        &mut self,
        input: &Self::Input,
        max_steps: usize,
    ) -> Result<Option<Self::Output>, Error> {
        self.load(input)?;

        let mut steps = 0;
        while self.step()? == Step::Continue {
            steps += 1;
            if steps > max_steps {
                return Ok(None);
            }
        }

        Ok(Some(self.output()))
    }

    /// Like [`Runner::run`], handing the initial configuration and the configuration after
    /// every step to `sink`.
    fn run_traced(
        &mut self,
        input: &Self::Input,
        sink: &mut dyn FnMut(&Self::Trace),
    ) -> Result<Self::Output, Error> {
        self.load(input)?;
        sink(&self.trace());

        while self.step()? == Step::Continue {
            sink(&self.trace());
        }

        Ok(self.output())
    }
}
