//! Custom kernel generation and a guarded integration loop for delay
//! differential equation engines.
//!
//! The crate sits between a symbolic model description and an adaptive DDE
//! engine:
//!
//! - [`codegen`] renders the model into kernel source through a text
//!   [`template`] and writes it for external compilation.
//! - [`helpers`] keeps track of which helper subexpressions belong to the
//!   caller, as opposed to ones the engine adds for itself.
//! - [`integrator`] sequences the engine's stepping primitives up to a target
//!   time and reports the state and helper values there.
//!
//! ```ignore
//! use ddekernel::prelude::*;
//!
//! let model = DdeModel::new(vec!["-past_y(0, t - 1.0)".into()], vec![1.0])
//!     .with_helpers([("lagged", "past_y(0, t - 1.0)")]);
//! let config = ControllerConfig::default().with_source_path("build/kernel.c");
//!
//! let mut controller = IntegrationController::new(model, MyEngine::new(), config)?;
//! controller.acknowledge_initial_discontinuities();
//! let result = controller.integrate(5.0)?;
//! ```

pub mod codegen;
pub mod error;
pub mod helpers;
pub mod integrator;
pub mod model;
pub mod template;

pub use crate::codegen::{module_name_for, CodeRenderer};
pub use crate::error::DdeError;
pub use crate::helpers::{helper_names, HelperRegistry};
pub use crate::integrator::{
    ControllerConfig, DdeEngine, Integration, IntegrationController, IntegrationState,
    IntegrationWarning, KernelSource, StepAttempt, Trajectory,
};
pub use crate::model::{DdeModel, Helper, ModelError};
pub use crate::template::{RenderContext, Template, TemplateError, TemplateSource};
pub use nalgebra::DVector;

pub mod prelude {
    pub use crate::codegen::{module_name_for, CodeRenderer};
    pub use crate::integrator::{
        ControllerConfig, DdeEngine, Integration, IntegrationController, IntegrationWarning,
        KernelSource, StepAttempt,
    };
    pub use crate::model::{DdeModel, Helper};
    pub use crate::DdeError;
}
