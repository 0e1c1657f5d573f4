use std::path::PathBuf;

use crate::model::DdeModel;

type V = nalgebra::DVector<f64>;

/// Outcome of a single trial step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepAttempt {
    /// Whether the local error estimate was within tolerance
    pub accepted: bool,
    /// Step size the engine proposes for the next attempt
    pub next_dt: f64,
}

impl StepAttempt {
    pub fn accepted(next_dt: f64) -> Self {
        Self {
            accepted: true,
            next_dt,
        }
    }

    pub fn rejected(next_dt: f64) -> Self {
        Self {
            accepted: false,
            next_dt,
        }
    }
}

/// The generated kernel, as handed to the engine for compilation and loading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelSource {
    pub module_name: String,
    pub path: PathBuf,
    pub code: String,
}

/// Primitives of an adaptive, Hermite-interpolating DDE engine.
///
/// The controller never steps or interpolates by itself; it only sequences
/// these calls. Errors are returned unmodified to the caller of
/// [`IntegrationController::integrate`](crate::IntegrationController::integrate).
pub trait DdeEngine {
    /// Called once when the controller is built. The engine may append
    /// internal helpers to `model`, but must leave the existing ones in place.
    fn prepare(&mut self, _model: &mut DdeModel) -> anyhow::Result<()> {
        Ok(())
    }

    /// Compile and load the kernel. Called once, before the first step.
    fn initiate(&mut self, kernel: &KernelSource) -> anyhow::Result<()>;

    /// Time of the last accepted step
    fn get_t(&self) -> f64;

    /// Attempt one step of size `dt` without committing it
    fn try_single_step(&mut self, dt: f64) -> anyhow::Result<StepAttempt>;

    /// Commit the last attempted step to the history
    fn accept_step(&mut self);

    /// State at `t`, interpolated or extrapolated from the most recent step.
    /// The engine also evaluates its helpers at `t`.
    fn get_recent_state(&mut self, t: f64) -> V;

    /// Drop history older than `delay` before the current time
    fn forget(&mut self, delay: f64);

    /// Values of all helpers, internal ones included, at the time passed to
    /// the last [`get_recent_state`](DdeEngine::get_recent_state) call
    fn get_helpers(&self) -> Vec<f64>;
}
