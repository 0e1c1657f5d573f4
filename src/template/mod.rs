//! Kernel templates
//!
//! The compiled evaluation kernel is produced from a Jinja template. This
//! module loads that template ([`TemplateSource`]) and renders it against a
//! [`RenderContext`] with `minijinja`. The environment is configured for
//! generated source code:
//!
//! - undefined values are errors, so a template that needs an option the
//!   caller did not pass fails instead of emitting a hole;
//! - `{% include %}` and `{% import %}` resolve against an explicit include
//!   directory, letting a custom template reuse the shipped fragments;
//! - the first newline after a block tag is removed and a trailing newline
//!   is kept.

pub mod context;
pub mod errors;
pub mod source;

use std::path::Path;

use minijinja::{Environment, UndefinedBehavior};

pub use context::RenderContext;
pub use errors::TemplateError;
pub use source::{bundled_template_dir, TemplateSource, KERNEL_TEMPLATE};

/// Name the kernel template is registered under when it has no file name
const INLINE_TEMPLATE: &str = "kernel";

/// A compiled template together with the environment that resolves its includes
#[derive(Debug, Clone)]
pub struct Template {
    env: Environment<'static>,
    name: String,
}

impl Template {
    /// Compile the text of `source`, resolving includes inside `include_dir`
    pub fn new(source: &TemplateSource, include_dir: &Path) -> Result<Self, TemplateError> {
        let mut env = Environment::new();
        env.set_loader(minijinja::path_loader(include_dir));
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_trim_blocks(true);
        env.set_keep_trailing_newline(true);

        let name = source
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| INLINE_TEMPLATE.to_string());
        env.add_template_owned(name.clone(), source.text().to_string())?;

        Ok(Self { env, name })
    }

    /// Compile template text that did not come from a file
    pub fn from_text(text: &str, include_dir: &Path) -> Result<Self, TemplateError> {
        Self::new(&TemplateSource::from_text(text), include_dir)
    }

    pub fn render(&self, ctx: &RenderContext) -> Result<String, TemplateError> {
        let template = self.env.get_template(&self.name)?;
        Ok(template.render(ctx.values())?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(src: &str, ctx: &RenderContext) -> Result<String, TemplateError> {
        Template::from_text(src, Path::new("."))?.render(ctx)
    }

    #[test]
    fn test_substitution() {
        let ctx = RenderContext::new()
            .with("module_name", "dde_abc")
            .with("n", 3)
            .with("max_delay", 1.5);
        assert_eq!(
            render("{{ module_name }}:{{n}}:{{ max_delay }}", &ctx).unwrap(),
            "dde_abc:3:1.5"
        );
    }

    #[test]
    fn test_jinja_expressions() {
        let ctx = RenderContext::new().with("module_name", "dde_abc").with("n", 3);
        let out = render(
            "{% if n > 1 %}{{ module_name|upper }}{% endif %}:{% for i in range(n) %}{{ i }}{% endfor %}",
            &ctx,
        )
        .unwrap();
        assert_eq!(out, "DDE_ABC:012");
    }

    #[test]
    fn test_for_loop_with_loop_info() {
        let ctx = RenderContext::new().with("delays", json!([1.0, 2.5]));
        let out = render(
            "{% for d in delays %}{{ loop.index0 }}={{ d }}{% if loop.last %}.{% else %},{% endif %}{% endfor %}",
            &ctx,
        )
        .unwrap();
        assert_eq!(out, "0=1.0,1=2.5.");
    }

    #[test]
    fn test_trim_blocks() {
        let ctx = RenderContext::new().with("xs", json!(["a", "b"]));
        let out = render("{% for x in xs %}\n{{ x }}\n{% endfor %}\n", &ctx).unwrap();
        assert_eq!(out, "a\nb\n");
    }

    #[test]
    fn test_undefined_is_an_error() {
        assert!(matches!(
            render("int {{ chunk_size }};", &RenderContext::new()),
            Err(TemplateError::UndefinedVariable { .. })
        ));
        assert_eq!(
            render(
                "{% if precision is defined %}p{% else %}d{% endif %}",
                &RenderContext::new()
            )
            .unwrap(),
            "d"
        );
    }

    #[test]
    fn test_syntax_error() {
        assert!(matches!(
            Template::from_text("{% for x in xs %}", Path::new(".")),
            Err(TemplateError::Syntax { .. })
        ));
    }

    #[test]
    fn test_include_resolves_against_include_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("part.c"), "/* {{ module_name }} */\n").unwrap();

        let template = Template::from_text("{% include \"part.c\" %}int x;", dir.path()).unwrap();
        let ctx = RenderContext::new().with("module_name", "m");
        assert_eq!(template.render(&ctx).unwrap(), "/* m */\nint x;");
    }

    #[test]
    fn test_missing_include() {
        let dir = tempfile::tempdir().unwrap();
        let template = Template::from_text("{% include \"nope.c\" %}", dir.path()).unwrap();
        assert!(matches!(
            template.render(&RenderContext::new()),
            Err(TemplateError::IncludeNotFound { .. })
        ));
    }

    #[test]
    fn test_name_follows_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("k.c"), "x").unwrap();
        let source = TemplateSource::load(dir.path(), "k.c").unwrap();
        assert_eq!(Template::new(&source, dir.path()).unwrap().name(), "k.c");
        assert_eq!(Template::from_text("x", dir.path()).unwrap().name(), INLINE_TEMPLATE);
    }
}
