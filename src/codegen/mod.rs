//! Kernel source generation
//!
//! [`CodeRenderer`] fills the kernel template with a [`DdeModel`] and writes
//! the result where the external toolchain expects it. The model data is
//! handed to the template under these keys:
//!
//! | Key | Value |
//! |-----|-------|
//! | `module_name` | deterministic module name, see [`module_name_for`] |
//! | `n` | number of state components |
//! | `equations` | right-hand side expressions, in component order |
//! | `helpers` | `{ name, expression }` objects, in declaration order |
//! | `n_helpers` | number of helpers |
//! | `delays` | delay constants |
//! | `max_delay` | the longest delay |
//!
//! Any extra option is passed through untouched, but cannot shadow these keys.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::{json, Map, Value};

use crate::model::DdeModel;
use crate::template::{RenderContext, Template, TemplateError, TemplateSource};

/// Prefix of every generated module name
pub const MODULE_PREFIX: &str = "dde_";

/// Derive a module name from the model content.
///
/// Identical models always map to the same name, so a kernel compiled for one
/// run can be recognised and reused by the next.
pub fn module_name_for(model: &DdeModel) -> String {
    // Serializing a plain struct of strings and floats cannot fail
    let canonical = serde_json::to_vec(model).unwrap_or_default();
    let hash = blake3::hash(&canonical);
    format!("{}{}", MODULE_PREFIX, &hash.to_hex()[..16])
}

/// Renders the kernel template for a model
#[derive(Debug, Clone)]
pub struct CodeRenderer {
    source: TemplateSource,
    template: Template,
    include_dir: PathBuf,
}

impl CodeRenderer {
    /// Create a renderer that resolves `{% include %}` tags inside `include_dir`
    pub fn new(source: TemplateSource, include_dir: impl Into<PathBuf>) -> Result<Self, TemplateError> {
        let include_dir = include_dir.into();
        let template = source.compile(&include_dir)?;
        Ok(Self {
            source,
            template,
            include_dir,
        })
    }

    pub fn source(&self) -> &TemplateSource {
        &self.source
    }

    pub fn include_dir(&self) -> &Path {
        &self.include_dir
    }

    /// Build the render context for `model`
    pub fn context(
        &self,
        model: &DdeModel,
        module_name: &str,
        extra_options: &Map<String, Value>,
    ) -> RenderContext {
        let mut ctx = RenderContext::from_options(extra_options);
        let helpers: Vec<Value> = model
            .helpers
            .iter()
            .map(|h| json!({ "name": h.name, "expression": h.expression }))
            .collect();

        ctx.insert("n", model.dimension());
        ctx.insert("equations", model.equations.clone());
        ctx.insert("n_helpers", model.helpers.len());
        ctx.insert("helpers", helpers);
        ctx.insert("delays", model.delays.clone());
        ctx.insert("max_delay", model.max_delay());
        ctx.insert("module_name", module_name);
        ctx
    }

    /// Render the kernel source text
    pub fn render(
        &self,
        model: &DdeModel,
        module_name: &str,
        extra_options: &Map<String, Value>,
    ) -> Result<String, TemplateError> {
        let ctx = self.context(model, module_name, extra_options);
        self.template.render(&ctx)
    }

    /// Render the kernel source and write it to `path`.
    ///
    /// Nothing is written unless rendering succeeds. The text goes to a
    /// temporary file next to `path` that then replaces `path`, so readers
    /// never observe a partially written kernel.
    pub fn render_to(
        &self,
        model: &DdeModel,
        module_name: &str,
        extra_options: &Map<String, Value>,
        path: impl AsRef<Path>,
    ) -> Result<String, TemplateError> {
        let path = path.as_ref();
        let code = self.render(model, module_name, extra_options)?;
        write_atomic(path, &code)?;
        tracing::debug!(
            module = module_name,
            path = %path.display(),
            bytes = code.len(),
            "wrote kernel source"
        );
        Ok(code)
    }
}

fn write_atomic(path: &Path, contents: &str) -> Result<(), TemplateError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|e| TemplateError::from_io(&dir, e))?;

    let mut file = tempfile::NamedTempFile::new_in(&dir).map_err(|e| TemplateError::from_io(&dir, e))?;
    let written = file.write_all(contents.as_bytes()).and_then(|_| file.flush());
    written.map_err(|e| TemplateError::from_io(file.path(), e))?;
    file.persist(path).map_err(|e| TemplateError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}
