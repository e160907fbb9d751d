//! Script rendering.
//!
//! Templates are minijinja. The context exposes `node_index`,
//! `concurrency`, `total_seconds`, `test_lines` (each with `package`,
//! `binary`, `test_pattern`, `flags`), `flags`, `report_dir` and
//! `binaries_dir`.

use std::path::{Path, PathBuf};

use minijinja::Environment;
use serde::Serialize;
use tracing::info;

use crate::error::{EmitError, EmitResult};
use crate::node::{NodeTests, TestLine};

/// Built-in bash template: runs each test line through `go tool test2json`
/// with `xargs -P <concurrency>`, writing JSON reports per node.
pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/node.sh.j2");

/// Settings shared by every generated script.
#[derive(Debug, Clone)]
pub struct ScriptOptions {
    pub scripts_dir: PathBuf,
    pub concurrency: usize,
    pub max_functions: usize,
    pub test_flags: Vec<String>,
    pub report_dir: PathBuf,
    pub binaries_dir: PathBuf,
}

/// Context handed to the template for one node.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateData {
    pub node_index: usize,
    pub concurrency: usize,
    pub total_seconds: u64,
    pub test_lines: Vec<TestLine>,
    pub flags: String,
    pub report_dir: String,
    pub binaries_dir: String,
}

/// Read a template file, or return the built-in one.
pub fn load_template(path: Option<&Path>) -> EmitResult<String> {
    match path {
        Some(path) => std::fs::read_to_string(path).map_err(|source| EmitError::ReadTemplate {
            path: path.to_path_buf(),
            source,
        }),
        None => Ok(DEFAULT_TEMPLATE.to_string()),
    }
}

fn environment<'source>() -> Environment<'source> {
    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    env
}

/// Render one script.
pub fn render_script(template: &str, data: &TemplateData) -> EmitResult<String> {
    let env = environment();
    let tmpl = env.template_from_str(template)?;
    Ok(tmpl.render(data)?)
}

fn absolute_string(path: &Path) -> EmitResult<String> {
    let abs = std::path::absolute(path).map_err(|source| EmitError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(abs.to_string_lossy().trim_end_matches('/').to_string())
}

/// Render and write `test-node-<i>.sh` for every node, marked executable.
pub fn write_scripts(
    nodes: &[NodeTests],
    template: &str,
    opts: &ScriptOptions,
) -> EmitResult<Vec<PathBuf>> {
    std::fs::create_dir_all(&opts.scripts_dir).map_err(|source| EmitError::Io {
        path: opts.scripts_dir.clone(),
        source,
    })?;

    let env = environment();
    let tmpl = env.template_from_str(template)?;
    let flags = opts.test_flags.join(" ");
    let report_dir = absolute_string(&opts.report_dir)?;
    let binaries_dir = absolute_string(&opts.binaries_dir)?;

    let mut written = Vec::with_capacity(nodes.len());
    for node in nodes {
        let data = TemplateData {
            node_index: node.node_index,
            concurrency: opts.concurrency,
            total_seconds: node.total_seconds,
            test_lines: node.test_lines(opts.max_functions, &flags),
            flags: flags.clone(),
            report_dir: report_dir.clone(),
            binaries_dir: binaries_dir.clone(),
        };
        let script = tmpl.render(&data)?;

        let path = opts.scripts_dir.join(format!("test-node-{}.sh", node.node_index));
        std::fs::write(&path, script).map_err(|source| EmitError::Io {
            path: path.clone(),
            source,
        })?;
        make_executable(&path)?;

        info!(
            file = %path.display(),
            functions = node.function_count(),
            total_seconds = node.total_seconds,
            "generated script"
        );
        written.push(path);
    }
    Ok(written)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> EmitResult<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).map_err(|source| {
        EmitError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> EmitResult<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsplit_partition::Chunk;

    fn nodes() -> Vec<NodeTests> {
        NodeTests::from_chunks(&[
            Chunk {
                keys: vec![
                    "pkg1:TestA".into(),
                    "pkg1:TestB".into(),
                    "pkg2/sub:TestC".into(),
                ],
                total: 12,
            },
            Chunk::default(),
        ])
    }

    fn options(dir: &Path) -> ScriptOptions {
        ScriptOptions {
            scripts_dir: dir.join("scripts"),
            concurrency: 3,
            max_functions: 0,
            test_flags: vec!["-test.timeout=20m".into(), "-test.count=1".into()],
            report_dir: dir.join("reports"),
            binaries_dir: dir.join("bin"),
        }
    }

    #[test]
    fn test_render_custom_template() {
        let data = TemplateData {
            node_index: 2,
            concurrency: 4,
            total_seconds: 9,
            test_lines: nodes()[0].test_lines(0, "-v"),
            flags: "-v".into(),
            report_dir: "/r".into(),
            binaries_dir: "/b".into(),
        };
        let template = "node={{ node_index }}\n{% for l in test_lines %}{{ l.binary }} {{ l.test_pattern }} {{ l.flags }}\n{% endfor %}";
        let out = render_script(template, &data).unwrap();
        assert_eq!(
            out,
            "node=2\npkg1.test ^(TestA|TestB)$ -v\npkg2.sub.test ^(TestC)$ -v\n"
        );
    }

    #[test]
    fn test_render_rejects_bad_template() {
        let data = TemplateData {
            node_index: 0,
            concurrency: 1,
            total_seconds: 0,
            test_lines: vec![],
            flags: String::new(),
            report_dir: String::new(),
            binaries_dir: String::new(),
        };
        assert!(matches!(
            render_script("{% for x in %}", &data),
            Err(EmitError::Template(_))
        ));
    }

    #[test]
    fn test_write_scripts_with_default_template() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path());

        let written = write_scripts(&nodes(), DEFAULT_TEMPLATE, &opts).unwrap();

        assert_eq!(written.len(), 2);
        assert_eq!(written[0], opts.scripts_dir.join("test-node-0.sh"));

        let script = std::fs::read_to_string(&written[0]).unwrap();
        assert!(script.starts_with("#!/usr/bin/env bash\n"));
        assert!(script.contains("xargs -r -P 3"));
        assert!(script.contains(
            "1 pkg1 pkg1.test '^(TestA|TestB)$' -test.timeout=20m -test.count=1\n"
        ));
        assert!(script.contains("2 pkg2/sub pkg2.sub.test '^(TestC)$'"));
        assert!(script.contains(&format!("BINARIES_DIR=\"{}\"", dir.path().join("bin").display())));

        let empty = std::fs::read_to_string(&written[1]).unwrap();
        assert!(empty.contains("<<'TESTS' || status=$?\nTESTS\n"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&written[0]).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[test]
    fn test_load_template() {
        assert_eq!(load_template(None).unwrap(), DEFAULT_TEMPLATE);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.sh");
        std::fs::write(&path, "echo {{ node_index }}").unwrap();
        assert_eq!(load_template(Some(&path)).unwrap(), "echo {{ node_index }}");

        assert!(matches!(
            load_template(Some(&dir.path().join("missing"))),
            Err(EmitError::ReadTemplate { .. })
        ));
    }
}
