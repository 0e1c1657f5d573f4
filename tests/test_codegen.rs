//! Integration tests for kernel source generation
//!
//! These exercise the bundled kernel template and the file-writing
//! guarantees of `CodeRenderer`.

use ddekernel::template::{bundled_template_dir, KERNEL_TEMPLATE};
use ddekernel::*;
use serde_json::{json, Map};

fn model() -> DdeModel {
    DdeModel::from_str(
        r#"{
            "equations": ["-past_y(0, t - tau)", "current_y(0) - gain * current_y(1)"],
            "helpers": [
                { "name": "tau", "expression": "2.0" },
                { "name": "gain", "expression": "0.5 * tau" }
            ],
            "delays": [2.0]
        }"#,
    )
    .unwrap()
}

fn bundled_renderer() -> CodeRenderer {
    CodeRenderer::new(TemplateSource::bundled().unwrap(), bundled_template_dir()).unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════════
// Bundled template
// ═══════════════════════════════════════════════════════════════════════════════

mod bundled {
    use super::*;

    #[test]
    fn test_render_bundled_kernel() {
        let model = model();
        let name = module_name_for(&model);
        let code = bundled_renderer().render(&model, &name, &Map::new()).unwrap();

        assert!(code.contains(&format!("Generated kernel for module {}", name)));
        assert!(code.contains("#define DDE_DIMENSION 2"));
        assert!(code.contains("#define DDE_N_HELPERS 2"));
        assert!(code.contains("#define DDE_MAX_DELAY 2.0"));
        assert!(code.contains("typedef double dde_real;"));
        assert!(code.contains("\tdY[0] = -past_y(0, t - tau);"));
        assert!(code.contains("\tdY[1] = current_y(0) - gain * current_y(1);"));
        // helpers come from the included fragment, in declaration order
        let tau = code.find("const dde_real tau = 2.0;").unwrap();
        let gain = code.find("const dde_real gain = 0.5 * tau;").unwrap();
        assert!(tau < gain);
        // comments never reach the output
        assert!(!code.contains("{#"));
        assert!(!code.contains("{%"));
    }

    #[test]
    fn test_precision_option() {
        let extra = json!({ "precision": "long double" });
        let code = bundled_renderer()
            .render(&model(), "dde_prec", extra.as_object().unwrap())
            .unwrap();
        assert!(code.contains("typedef long double dde_real;"));
        assert!(!code.contains("typedef double dde_real;"));
    }

    #[test]
    fn test_model_without_helpers() {
        let model = DdeModel::new(vec!["-current_y(0)".into()], vec![]);
        let code = bundled_renderer().render(&model, "dde_plain", &Map::new()).unwrap();
        assert!(code.contains("#define DDE_N_HELPERS 0"));
        assert!(code.contains("#define DDE_MAX_DELAY 0.0"));
        assert!(code.contains("(void) helper_values;"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let renderer = bundled_renderer();
        let model = model();
        let extra = json!({ "precision": "float", "chunk_size": 64 });
        let first = renderer
            .render(&model, &module_name_for(&model), extra.as_object().unwrap())
            .unwrap();
        let second = renderer
            .render(&model, &module_name_for(&model), extra.as_object().unwrap())
            .unwrap();
        assert_eq!(first.as_bytes(), second.as_bytes());
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Writing
// ═══════════════════════════════════════════════════════════════════════════════

mod writing {
    use super::*;

    #[test]
    fn test_render_to_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("kernel.c");
        std::fs::write(&target, "stale").unwrap();

        let code = bundled_renderer()
            .render_to(&model(), "dde_fresh", &Map::new(), &target)
            .unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), code);
    }

    #[test]
    fn test_failed_render_leaves_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("needs_option.c"), "{{ module_name }} uses {{ chunk_size }}").unwrap();
        let renderer = CodeRenderer::new(
            TemplateSource::load(dir.path(), "needs_option.c").unwrap(),
            dir.path(),
        )
        .unwrap();

        let target = dir.path().join("kernel.c");
        std::fs::write(&target, "previous kernel").unwrap();

        let err = renderer
            .render_to(&model(), "dde_x", &Map::new(), &target)
            .unwrap_err();
        assert!(matches!(
            err,
            TemplateError::UndefinedVariable { line: 1, .. }
        ));
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "previous kernel");

        // nothing else was left behind
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_custom_template_includes_sibling_fragment() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("custom.c"),
            "/* {{ module_name }} */\n{% include \"helpers.c\" %}",
        )
        .unwrap();

        // the custom template lives elsewhere but reuses the shipped fragment
        let renderer = CodeRenderer::new(
            TemplateSource::load(dir.path(), "custom.c").unwrap(),
            bundled_template_dir(),
        )
        .unwrap();
        let code = renderer.render(&model(), "dde_mix", &Map::new()).unwrap();
        assert!(code.starts_with("/* dde_mix */\n"));
        assert!(code.contains("helper_values[1] = gain;"));
    }

    #[test]
    fn test_custom_template_uses_jinja_expressions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("jinja.c"),
            "{% if n > 1 %}#define {{ module_name|upper }}_SYSTEM\n{% endif %}\
             {% for i in range(n) %}y[{{ i }}] = {{ equations[i] }};\n{% endfor %}",
        )
        .unwrap();
        let renderer = CodeRenderer::new(
            TemplateSource::load(dir.path(), "jinja.c").unwrap(),
            dir.path(),
        )
        .unwrap();

        let code = renderer.render(&model(), "dde_jinja", &Map::new()).unwrap();
        let equations = &model().equations;
        assert_eq!(
            code,
            format!(
                "#define DDE_JINJA_SYSTEM\ny[0] = {};\ny[1] = {};\n",
                equations[0], equations[1]
            )
        );
    }

    #[test]
    fn test_bundled_file_name() {
        assert!(bundled_template_dir().join(KERNEL_TEMPLATE).is_file());
    }
}
