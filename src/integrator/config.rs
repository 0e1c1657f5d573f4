use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::error::DdeError;
use crate::template::{bundled_template_dir, KERNEL_TEMPLATE};

fn default_template_file() -> String {
    KERNEL_TEMPLATE.to_string()
}

fn default_source_path() -> PathBuf {
    std::env::temp_dir().join("ddekernel").join("kernel.c")
}

fn default_initial_dt() -> f64 {
    1.0
}

/// Settings for an [`IntegrationController`](crate::IntegrationController)
///
/// # Example
///
/// ```ignore
/// use ddekernel::ControllerConfig;
///
/// let config = ControllerConfig::from_json_str(r#"{
///     "source_path": "build/kernel.c",
///     "initial_dt": 0.1,
///     "options": { "precision": "long double" }
/// }"#)?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControllerConfig {
    /// Directory containing the kernel template
    pub template_dir: PathBuf,

    /// Kernel template file name inside `template_dir`
    pub template_file: String,

    /// Directory `{% include %}` tags resolve against; defaults to `template_dir`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_dir: Option<PathBuf>,

    /// Where the rendered kernel source is written
    pub source_path: PathBuf,

    /// Module name override; derived from the model when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,

    /// First step size proposed to the engine
    pub initial_dt: f64,

    /// Give up after this many consecutive rejected steps; unbounded when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_rejected_steps: Option<usize>,

    /// Start with the initial discontinuities acknowledged
    pub initial_discontinuities_handled: bool,

    /// Extra template options, passed through verbatim
    pub options: Map<String, Value>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            template_dir: bundled_template_dir(),
            template_file: default_template_file(),
            include_dir: None,
            source_path: default_source_path(),
            module_name: None,
            initial_dt: default_initial_dt(),
            max_rejected_steps: None,
            initial_discontinuities_handled: false,
            options: Map::new(),
        }
    }
}

impl ControllerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, DdeError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| DdeError::Config(format!("failed to parse configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DdeError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            DdeError::Config(format!("failed to read '{}': {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    pub fn with_template(mut self, dir: impl Into<PathBuf>, file: impl Into<String>) -> Self {
        self.template_dir = dir.into();
        self.template_file = file.into();
        self
    }

    pub fn with_include_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.include_dir = Some(dir.into());
        self
    }

    pub fn with_source_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_path = path.into();
        self
    }

    pub fn with_module_name(mut self, name: impl Into<String>) -> Self {
        self.module_name = Some(name.into());
        self
    }

    pub fn with_initial_dt(mut self, dt: f64) -> Self {
        self.initial_dt = dt;
        self
    }

    pub fn with_max_rejected_steps(mut self, max: usize) -> Self {
        self.max_rejected_steps = Some(max);
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Effective include directory
    pub fn include_dir(&self) -> &Path {
        self.include_dir.as_deref().unwrap_or(&self.template_dir)
    }

    pub fn validate(&self) -> Result<(), DdeError> {
        if !(self.initial_dt.is_finite() && self.initial_dt > 0.0) {
            return Err(DdeError::Config(format!(
                "initial_dt must be a positive number, got {}",
                self.initial_dt
            )));
        }
        if self.max_rejected_steps == Some(0) {
            return Err(DdeError::Config(
                "max_rejected_steps must be at least 1".to_string(),
            ));
        }
        if let Some(name) = &self.module_name {
            let valid = name
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !valid {
                return Err(DdeError::Config(format!(
                    "module_name '{}' is not a valid identifier",
                    name
                )));
            }
        }
        Ok(())
    }
}
