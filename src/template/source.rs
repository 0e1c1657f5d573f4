use std::path::{Path, PathBuf};

use crate::template::errors::TemplateError;
use crate::template::Template;

/// File name of the kernel template shipped with the crate
pub const KERNEL_TEMPLATE: &str = "dde_kernel.c";

/// Directory holding the templates shipped with the crate
pub fn bundled_template_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("templates")
}

/// Template text loaded once from disk and kept for the lifetime of the instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSource {
    path: PathBuf,
    text: String,
}

impl TemplateSource {
    /// Load `file_name` from `dir`.
    ///
    /// A missing file is reported as [`TemplateError::MissingResource`] with the
    /// full path that was expected.
    pub fn load(dir: impl AsRef<Path>, file_name: impl AsRef<Path>) -> Result<Self, TemplateError> {
        let path = dir.as_ref().join(file_name);
        if !path.is_file() {
            return Err(TemplateError::missing(&path));
        }
        let text = std::fs::read_to_string(&path).map_err(|e| TemplateError::from_io(&path, e))?;
        tracing::debug!(path = %path.display(), bytes = text.len(), "loaded kernel template");
        Ok(Self { path, text })
    }

    /// Load the kernel template shipped in the crate's `templates/` directory
    pub fn bundled() -> Result<Self, TemplateError> {
        Self::load(bundled_template_dir(), KERNEL_TEMPLATE)
    }

    /// Wrap template text that did not come from a file
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            path: PathBuf::new(),
            text: text.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory the template was loaded from, if any
    pub fn dir(&self) -> Option<&Path> {
        self.path.parent().filter(|p| !p.as_os_str().is_empty())
    }

    /// Compile the cached text, resolving includes inside `include_dir`
    pub fn compile(&self, include_dir: &Path) -> Result<Template, TemplateError> {
        Template::new(self, include_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_template_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = TemplateSource::load(dir.path(), "absent.c").unwrap_err();
        match err {
            TemplateError::MissingResource { path } => {
                assert_eq!(path, dir.path().join("absent.c"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_load_caches_text() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("k.c");
        std::fs::write(&file, "int {{ module_name }};").unwrap();

        let source = TemplateSource::load(dir.path(), "k.c").unwrap();
        std::fs::remove_file(&file).unwrap();

        assert_eq!(source.text(), "int {{ module_name }};");
        assert_eq!(source.dir(), Some(dir.path()));
    }

    #[test]
    fn test_bundled_template_loads() {
        let source = TemplateSource::bundled().unwrap();
        assert!(source.text().contains("module_name"));
        assert!(source.compile(&bundled_template_dir()).is_ok());
    }

    #[test]
    fn test_from_text_has_no_dir() {
        assert_eq!(TemplateSource::from_text("x").dir(), None);
    }
}
