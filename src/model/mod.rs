//! Delay differential equation model description
//!
//! A [`DdeModel`] holds everything the kernel template needs: one right-hand
//! side expression per state component, the ordered helper subexpressions and
//! the delay constants. Expressions are already printed by the symbolic layer
//! and are forwarded to the template verbatim.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Errors raised while parsing or validating a [`DdeModel`]
#[derive(Debug, Error)]
pub enum ModelError {
    /// Failed to parse JSON
    #[error("Failed to parse model JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Failed to read the model file
    #[error("Failed to read model file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The model has no state components
    #[error("Model must define at least one equation")]
    NoEquations,

    /// An equation or helper expression is blank
    #[error("Empty expression in {context}")]
    EmptyExpression { context: String },

    /// A helper has an empty name
    #[error("Helper at position {index} has an empty name")]
    EmptyHelperName { index: usize },

    /// Two helpers share a name
    #[error("Duplicate helper name: '{name}'")]
    DuplicateHelper { name: String },

    /// A delay is negative, NaN or infinite
    #[error("Invalid delay {value} at position {index}: delays must be finite and non-negative")]
    InvalidDelay { index: usize, value: f64 },
}

/// A named auxiliary subexpression computed alongside the vector field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Helper {
    pub name: String,
    pub expression: String,
}

impl Helper {
    pub fn new(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expression: expression.into(),
        }
    }
}

impl fmt::Display for Helper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl<N: Into<String>, E: Into<String>> From<(N, E)> for Helper {
    fn from((name, expression): (N, E)) -> Self {
        Helper::new(name, expression)
    }
}

/// A delay differential equation system
///
/// # Example
///
/// ```ignore
/// use ddekernel::DdeModel;
///
/// let model = DdeModel::from_str(r#"{
///     "equations": ["-y(0, t - 1.0)"],
///     "helpers": [{ "name": "lag", "expression": "y(0, t - 1.0)" }],
///     "delays": [1.0]
/// }"#)?;
/// assert_eq!(model.max_delay(), 1.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DdeModel {
    /// Right-hand side of `dy[i]/dt`, one entry per state component
    pub equations: Vec<String>,

    /// Ordered helper subexpressions
    #[serde(default)]
    pub helpers: Vec<Helper>,

    /// Delay constants referenced by the equations
    #[serde(default)]
    pub delays: Vec<f64>,
}

impl DdeModel {
    /// Create a model from equations and delays, without helpers
    pub fn new(equations: Vec<String>, delays: Vec<f64>) -> Self {
        Self {
            equations,
            helpers: Vec::new(),
            delays,
        }
    }

    /// Attach the ordered helper subexpressions
    pub fn with_helpers<H: Into<Helper>>(mut self, helpers: impl IntoIterator<Item = H>) -> Self {
        self.helpers = helpers.into_iter().map(Into::into).collect();
        self
    }

    /// Parse and validate a model from a JSON string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(json: &str) -> Result<Self, ModelError> {
        let model: DdeModel = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    /// Read, parse and validate a model from a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_str(&json)
    }

    /// Number of state components
    pub fn dimension(&self) -> usize {
        self.equations.len()
    }

    /// The longest delay, or `0.0` for a model without delays
    pub fn max_delay(&self) -> f64 {
        self.delays.iter().copied().fold(0.0, f64::max)
    }

    /// Check structural consistency of the model
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.equations.is_empty() {
            return Err(ModelError::NoEquations);
        }

        for (i, eq) in self.equations.iter().enumerate() {
            if eq.trim().is_empty() {
                return Err(ModelError::EmptyExpression {
                    context: format!("equation {}", i),
                });
            }
        }

        let mut seen = HashSet::new();
        for (i, helper) in self.helpers.iter().enumerate() {
            if helper.name.trim().is_empty() {
                return Err(ModelError::EmptyHelperName { index: i });
            }
            if helper.expression.trim().is_empty() {
                return Err(ModelError::EmptyExpression {
                    context: format!("helper '{}'", helper.name),
                });
            }
            if !seen.insert(helper.name.as_str()) {
                return Err(ModelError::DuplicateHelper {
                    name: helper.name.clone(),
                });
            }
        }

        for (i, &delay) in self.delays.iter().enumerate() {
            if !delay.is_finite() || delay < 0.0 {
                return Err(ModelError::InvalidDelay {
                    index: i,
                    value: delay,
                });
            }
        }

        Ok(())
    }
}
