//! VCL template rendering.
//!
//! Templates are plain VCL text with `${name}` placeholder tokens, expanded
//! from the resolved [`Settings`] variable table. Rendering is deterministic:
//! identical settings always yield byte-identical output. An unresolved
//! placeholder is an error, never silently emitted, and a failed render
//! writes nothing to disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::config::Settings;

/// Result type for VCL rendering operations.
pub type VclResult<T> = Result<T, VclError>;

/// Errors that can occur while rendering a VCL template.
#[derive(Debug, Error)]
pub enum VclError {
    /// The template file does not exist.
    #[error("VCL template not found: {}", path.display())]
    TemplateNotFound { path: PathBuf },

    /// The template file exists but could not be read.
    #[error("failed to read VCL template {}: {source}", path.display())]
    ReadFailed { path: PathBuf, source: io::Error },

    /// A `${name}` token has no value in the settings variable table.
    #[error("unresolved placeholder '${{{name}}}' in {}", path.display())]
    UnresolvedPlaceholder { name: String, path: PathBuf },

    /// A `${` opener has no closing brace.
    #[error("unterminated placeholder in {}", path.display())]
    UnterminatedPlaceholder { path: PathBuf },

    /// The rendered output could not be written.
    #[error("failed to write rendered VCL to {}: {source}", path.display())]
    WriteFailed { path: PathBuf, source: io::Error },
}

/// Render the template at `template_path` using `settings`.
///
/// The template's presence is checked here, at render time, not when the
/// configuration is resolved.
pub fn render(template_path: &Path, settings: &Settings) -> VclResult<String> {
    if !template_path.exists() {
        return Err(VclError::TemplateNotFound {
            path: template_path.to_path_buf(),
        });
    }
    let template = fs::read_to_string(template_path).map_err(|source| VclError::ReadFailed {
        path: template_path.to_path_buf(),
        source,
    })?;
    substitute(&template, &settings.template_vars(), template_path)
}

/// Render the configured template and write the result to the transient
/// VCL path consumed by `-f`, creating the artifact directory if needed.
///
/// Returns the written path. The render completes in memory before any file
/// is touched.
pub fn write(settings: &Settings) -> VclResult<PathBuf> {
    let rendered = render(&settings.vcl_template_path(), settings)?;
    let output = settings.vcl_path();
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).map_err(|source| VclError::WriteFailed {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(&output, &rendered).map_err(|source| VclError::WriteFailed {
        path: output.clone(),
        source,
    })?;
    debug!(path = %output.display(), bytes = rendered.len(), "wrote rendered VCL");
    Ok(output)
}

fn substitute(
    template: &str,
    vars: &[(&'static str, String)],
    path: &Path,
) -> VclResult<String> {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .ok_or_else(|| VclError::UnterminatedPlaceholder {
                path: path.to_path_buf(),
            })?;
        let name = &after[..end];
        let value = vars
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
            .ok_or_else(|| VclError::UnresolvedPlaceholder {
                name: name.to_string(),
                path: path.to_path_buf(),
            })?;
        output.push_str(value);
        rest = &after[end + 1..];
    }

    output.push_str(rest);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use tempfile::{NamedTempFile, TempDir};

    use crate::config::Settings;

    const BACKEND_TEMPLATE: &str = "\
backend default {
  .host = \"${backend_host}\";
  .port = \"${backend_port}\";
}
";

    fn settings(root: &Path) -> Settings {
        Settings::builder("test", root)
            .backend_host("0.0.0.0")
            .backend_port("3000")
            .build()
            .unwrap()
    }

    fn template(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_render_substitutes_backend_host_and_port() {
        let file = template(BACKEND_TEMPLATE);
        let rendered = render(file.path(), &settings(Path::new("/srv/app"))).unwrap();
        assert!(rendered.contains(".host = \"0.0.0.0\""));
        assert!(rendered.contains(".port = \"3000\""));
    }

    #[test]
    fn test_render_is_deterministic() {
        let file = template(BACKEND_TEMPLATE);
        let settings = settings(Path::new("/srv/app"));
        let first = render(file.path(), &settings).unwrap();
        let second = render(file.path(), &settings).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_render_leaves_plain_vcl_untouched() {
        let file = template("sub vcl_recv {\n  return (lookup);\n}\n");
        let rendered = render(file.path(), &settings(Path::new("/srv/app"))).unwrap();
        assert_eq!(rendered, "sub vcl_recv {\n  return (lookup);\n}\n");
    }

    #[test]
    fn test_missing_template_is_an_error() {
        let result = render(
            Path::new("config/file_not_found.vcl"),
            &settings(Path::new("/srv/app")),
        );
        assert!(matches!(result, Err(VclError::TemplateNotFound { .. })));
    }

    #[test]
    fn test_unresolved_placeholder_is_an_error() {
        let file = template("backend default { .host = \"${no_such_var}\"; }");
        let result = render(file.path(), &settings(Path::new("/srv/app")));
        assert!(matches!(
            result,
            Err(VclError::UnresolvedPlaceholder { ref name, .. }) if name == "no_such_var"
        ));
    }

    #[test]
    fn test_telnet_placeholder_requires_telnet_setting() {
        let file = template("# admin at ${telnet}\n");
        let without = settings(Path::new("/srv/app"));
        assert!(render(file.path(), &without).is_err());

        let with = Settings::builder("test", "/srv/app")
            .telnet("localhost:6082")
            .build()
            .unwrap();
        assert_eq!(render(file.path(), &with).unwrap(), "# admin at localhost:6082\n");
    }

    #[test]
    fn test_unterminated_placeholder_is_an_error() {
        let file = template("backend default { .host = \"${backend_host\"; }");
        let result = render(file.path(), &settings(Path::new("/srv/app")));
        assert!(matches!(result, Err(VclError::UnterminatedPlaceholder { .. })));
    }

    #[test]
    fn test_write_renders_into_log_dir() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("config")).unwrap();
        fs::write(root.path().join("config/varnishd.vcl"), BACKEND_TEMPLATE).unwrap();

        let settings = settings(root.path());
        let written = write(&settings).unwrap();

        assert_eq!(written, root.path().join("log/varnishd.test.vcl"));
        let contents = fs::read_to_string(&written).unwrap();
        assert!(contents.contains(".host = \"0.0.0.0\""));
    }

    #[test]
    fn test_failed_render_writes_nothing() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("config")).unwrap();
        fs::write(
            root.path().join("config/varnishd.vcl"),
            "bad ${not_a_var} template",
        )
        .unwrap();

        let settings = settings(root.path());
        assert!(write(&settings).is_err());
        assert!(!settings.vcl_path().exists());
    }
}
