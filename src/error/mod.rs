use thiserror::Error;

use crate::model::ModelError;
use crate::template::TemplateError;

#[derive(Error, Debug)]
pub enum DdeError {
    #[error("Error in the kernel template: {0}")]
    Template(#[from] TemplateError),
    #[error("Error in the model: {0}")]
    Model(#[from] ModelError),
    #[error("Invalid controller configuration: {0}")]
    Config(String),
    #[error(
        "The engine changed the caller-supplied helpers while preparing: expected {expected:?} \
         at the start of the helper list, found {found:?}"
    )]
    HelperPrefixChanged {
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("Integration engine failure: {0}")]
    Engine(#[source] anyhow::Error),
    #[error("Step rejected {attempts} times in a row at t = {time}")]
    StepRejected { time: f64, attempts: usize },
}

impl DdeError {
    pub(crate) fn engine(err: anyhow::Error) -> Self {
        Self::Engine(err)
    }

    pub(crate) fn missing_helpers(expected: usize, found: usize) -> Self {
        Self::Engine(anyhow::anyhow!(
            "engine reported {found} helper values, expected at least {expected}"
        ))
    }
}
