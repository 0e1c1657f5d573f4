//! Error types for loading and rendering kernel templates

use std::path::{Path, PathBuf};
use thiserror::Error;

use minijinja::ErrorKind;

/// Errors that can occur when loading or rendering a template
#[derive(Debug, Error)]
pub enum TemplateError {
    // ─────────────────────────────────────────────────────────────────────────
    // Resource Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// The kernel template does not exist
    #[error("Template not found: {}", path.display())]
    MissingResource { path: PathBuf },

    /// A template named by `{% include %}` or `{% import %}` does not exist
    #[error("Included template not found: {message}")]
    IncludeNotFound { message: String },

    /// The template exists but could not be read or written
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The rendered source could not be moved over the target file
    #[error("Failed to persist generated source to '{}': {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Syntax Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Malformed tag or unbalanced block
    #[error("Template syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Render Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// The template used a value that is not in the render context
    #[error("Undefined template value on line {line}: {message}")]
    UndefinedVariable { line: usize, message: String },

    /// Any other failure reported by the template engine
    #[error("Failed to render template: {0}")]
    Render(#[source] minijinja::Error),
}

impl TemplateError {
    /// Create a missing resource error
    pub fn missing(path: impl AsRef<Path>) -> Self {
        Self::MissingResource {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Map an I/O error, turning `NotFound` into [`TemplateError::MissingResource`]
    pub(crate) fn from_io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::MissingResource { path }
        } else {
            Self::Io { path, source }
        }
    }
}

impl From<minijinja::Error> for TemplateError {
    fn from(err: minijinja::Error) -> Self {
        // line 0 when the engine could not attribute the error to a line
        let line = err.line().unwrap_or(0);
        match err.kind() {
            ErrorKind::SyntaxError => Self::Syntax {
                line,
                message: err.detail().unwrap_or("invalid syntax").to_string(),
            },
            ErrorKind::UndefinedError => Self::UndefinedVariable {
                line,
                message: err.to_string(),
            },
            ErrorKind::TemplateNotFound => Self::IncludeNotFound {
                message: err.to_string(),
            },
            _ => Self::Render(err),
        }
    }
}
