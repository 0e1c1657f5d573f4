//! Guarded integration loop around a DDE engine
//!
//! [`IntegrationController`] owns an engine implementing [`DdeEngine`] and
//! the model it integrates. On the first call to
//! [`integrate`](IntegrationController::integrate) it renders the kernel
//! source and hands it to the engine; afterwards every call steps the engine
//! forward until the target time is reached, reconstructs the state at
//! exactly that time and trims history the delays can no longer reach.

pub mod config;
pub mod engine;

use std::fmt;

pub use config::ControllerConfig;
pub use engine::{DdeEngine, KernelSource, StepAttempt};

use crate::codegen::{module_name_for, CodeRenderer};
use crate::error::DdeError;
use crate::helpers::HelperRegistry;
use crate::model::DdeModel;
use crate::template::TemplateSource;

type V = nalgebra::DVector<f64>;

/// Non-fatal conditions noticed during [`IntegrationController::integrate`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IntegrationWarning {
    /// The engine was already past the target time; no step was taken and
    /// the returned state is extrapolated from the last step's interpolant.
    BackwardOrNoOp { current_time: f64, target_time: f64 },
    /// The initial discontinuities were never acknowledged
    UnhandledDiscontinuity,
}

impl fmt::Display for IntegrationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrationWarning::BackwardOrNoOp {
                current_time,
                target_time,
            } => write!(
                f,
                "The target time {} is smaller than the current time {}. No integration step \
                 will happen and the returned state is extrapolated from the interpolating \
                 Hermite polynomial of the last integration step. If you are integrating \
                 backwards in time, this is a mistake. If your sampling step is just small, \
                 there is nothing to worry about, though you may want to increase it.",
                target_time, current_time
            ),
            IntegrationWarning::UnhandledDiscontinuity => f.write_str(
                "Initial discontinuities were not handled explicitly. This is only fine if the \
                 initial past was chosen so that the derivative at the last anchor complies \
                 with the DDE. In that case call `acknowledge_initial_discontinuities()` (or set \
                 `initial_discontinuities_handled` in the configuration) to silence this warning.",
            ),
        }
    }
}

/// The clock and bookkeeping of a controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegrationState {
    pub current_time: f64,
    pub max_delay: f64,
    pub initial_discontinuities_handled: bool,
}

/// Result of one [`IntegrationController::integrate`] call
#[derive(Debug, Clone, PartialEq)]
pub struct Integration {
    /// State at the target time
    pub state: V,
    /// Reportable helper values at the target time
    pub helpers: Vec<f64>,
    /// Advisories raised during the call
    pub warnings: Vec<IntegrationWarning>,
}

/// States and helper values sampled at a sequence of times
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    pub times: Vec<f64>,
    pub states: Vec<V>,
    pub helpers: Vec<Vec<f64>>,
    pub warnings: Vec<IntegrationWarning>,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    fn push(&mut self, time: f64, integration: Integration) {
        self.times.push(time);
        self.states.push(integration.state);
        self.helpers.push(integration.helpers);
        self.warnings.extend(integration.warnings);
    }
}

/// Drives a [`DdeEngine`] to requested times
pub struct IntegrationController<E: DdeEngine> {
    engine: E,
    model: DdeModel,
    renderer: CodeRenderer,
    registry: HelperRegistry,
    config: ControllerConfig,
    state: IntegrationState,
    dt: f64,
    kernel: Option<KernelSource>,
}

impl<E: DdeEngine> IntegrationController<E> {
    /// Build a controller for `model`.
    ///
    /// The kernel template is loaded before the engine sees the model, so a
    /// missing template fails here without any engine work.
    pub fn new(mut model: DdeModel, mut engine: E, config: ControllerConfig) -> Result<Self, DdeError> {
        config.validate()?;
        model.validate()?;

        let source = TemplateSource::load(&config.template_dir, &config.template_file)?;
        let renderer = CodeRenderer::new(source, config.include_dir())?;

        let registry = HelperRegistry::new(&model.helpers);
        let supplied = model.helpers.clone();

        engine.prepare(&mut model).map_err(DdeError::engine)?;

        if !registry.prefix_preserved(&supplied, &model.helpers) {
            let found_len = registry.len().min(model.helpers.len());
            return Err(DdeError::HelperPrefixChanged {
                expected: registry.names(&supplied),
                found: crate::helpers::helper_names(&model.helpers, found_len),
            });
        }

        tracing::debug!(
            dimension = model.dimension(),
            reportable_helpers = registry.len(),
            total_helpers = model.helpers.len(),
            max_delay = model.max_delay(),
            "prepared integration controller"
        );

        let state = IntegrationState {
            current_time: engine.get_t(),
            max_delay: model.max_delay(),
            initial_discontinuities_handled: config.initial_discontinuities_handled,
        };

        Ok(Self {
            dt: config.initial_dt,
            engine,
            model,
            renderer,
            registry,
            config,
            state,
            kernel: None,
        })
    }

    /// Names of the caller-supplied helpers, in declaration order
    pub fn helper_names(&self) -> Vec<String> {
        self.registry.names(&self.model.helpers)
    }

    /// Confirm that the initial past is consistent with the equations at
    /// the last anchor, silencing [`IntegrationWarning::UnhandledDiscontinuity`]
    pub fn acknowledge_initial_discontinuities(&mut self) {
        self.state.initial_discontinuities_handled = true;
    }

    pub fn state(&self) -> &IntegrationState {
        &self.state
    }

    /// Step size that will be proposed next
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// The model after engine preparation, internal helpers included
    pub fn model(&self) -> &DdeModel {
        &self.model
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The rendered kernel, once the engine has been initiated
    pub fn kernel(&self) -> Option<&KernelSource> {
        self.kernel.as_ref()
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    fn initiate(&mut self) -> Result<(), DdeError> {
        if self.kernel.is_some() {
            return Ok(());
        }

        let module_name = self
            .config
            .module_name
            .clone()
            .unwrap_or_else(|| module_name_for(&self.model));
        let code = self.renderer.render_to(
            &self.model,
            &module_name,
            &self.config.options,
            &self.config.source_path,
        )?;
        let kernel = KernelSource {
            module_name,
            path: self.config.source_path.clone(),
            code,
        };

        self.engine.initiate(&kernel).map_err(DdeError::engine)?;
        tracing::debug!(module = %kernel.module_name, "initiated engine");
        self.kernel = Some(kernel);
        Ok(())
    }

    /// Evolve the system to at least `target_time`.
    ///
    /// Returns the state and reportable helper values at exactly
    /// `target_time`, reconstructed from the engine's interpolant. Calling
    /// this with a target behind the current time performs no step; see
    /// [`IntegrationWarning::BackwardOrNoOp`].
    pub fn integrate(&mut self, target_time: f64) -> Result<Integration, DdeError> {
        self.initiate()?;

        let mut warnings = Vec::new();

        let current_time = self.engine.get_t();
        if current_time > target_time {
            let warning = IntegrationWarning::BackwardOrNoOp {
                current_time,
                target_time,
            };
            tracing::warn!("{}", warning);
            warnings.push(warning);
        }

        if !self.state.initial_discontinuities_handled {
            let warning = IntegrationWarning::UnhandledDiscontinuity;
            tracing::warn!("{}", warning);
            warnings.push(warning);
        }

        let mut rejected = 0;
        while self.engine.get_t() < target_time {
            let attempt = self
                .engine
                .try_single_step(self.dt)
                .map_err(DdeError::engine)?;
            tracing::trace!(
                t = self.engine.get_t(),
                dt = self.dt,
                accepted = attempt.accepted,
                next_dt = attempt.next_dt,
                "step attempt"
            );
            self.dt = attempt.next_dt;

            if attempt.accepted {
                self.engine.accept_step();
                self.state.current_time = self.engine.get_t();
                rejected = 0;
            } else {
                rejected += 1;
                if let Some(max) = self.config.max_rejected_steps {
                    if rejected >= max {
                        return Err(DdeError::StepRejected {
                            time: self.engine.get_t(),
                            attempts: rejected,
                        });
                    }
                }
            }
        }

        let state = self.engine.get_recent_state(target_time);
        self.engine.forget(self.state.max_delay);
        let all_helpers = self.engine.get_helpers();
        let helpers = self
            .registry
            .values(&all_helpers)
            .ok_or_else(|| DdeError::missing_helpers(self.registry.len(), all_helpers.len()))?;
        self.state.current_time = self.engine.get_t();

        Ok(Integration {
            state,
            helpers,
            warnings,
        })
    }

    /// Integrate through `times` in order, collecting every result
    pub fn sample(&mut self, times: impl IntoIterator<Item = f64>) -> Result<Trajectory, DdeError> {
        let mut trajectory = Trajectory::default();
        for time in times {
            let integration = self.integrate(time)?;
            trajectory.push(time, integration);
        }
        Ok(trajectory)
    }
}

impl<E: DdeEngine + fmt::Debug> fmt::Debug for IntegrationController<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntegrationController")
            .field("engine", &self.engine)
            .field("state", &self.state)
            .field("dt", &self.dt)
            .field("helpers", &self.helper_names())
            .finish()
    }
}
