//! Chart module - Wiring an optional image pull secret into a Helm chart.
//!
//! Deployment templates get a conditional `imagePullSecrets` block, and the
//! chart's `values.yaml` gets the `image.imagePullSecret` key that drives it.

use std::fs;
use std::path::{Path as FsPath, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::value::{self, Map, Value};

/// Values key, under `image`, that holds the pull secret name.
pub const PULL_SECRET_KEY: &str = "imagePullSecret";

const TEMPLATE_SUFFIX: &str = "deployment.yaml";

/// InjectSummary reports which files were changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InjectSummary {
    pub templates_updated: Vec<PathBuf>,
    pub values_updated: bool,
}

/// Injects the pull secret block into the chart at `chart_dir`.
///
/// Every `templates/**/*deployment.yaml` that does not yet mention
/// `imagePullSecrets` is rewritten, then `values.yaml` is given an empty
/// `image.imagePullSecret` if it has none. Running this twice changes nothing
/// the second time.
pub fn inject_image_pull_secrets(chart_dir: impl AsRef<FsPath>) -> Result<InjectSummary> {
    let chart_dir = chart_dir.as_ref();
    let mut summary = InjectSummary::default();

    let templates = chart_dir.join("templates");
    if templates.is_dir() {
        for entry in WalkDir::new(&templates).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().map(FsPath::to_path_buf).unwrap_or_else(|| templates.clone());
                Error::io(path, e.into())
            })?;
            let is_deployment = entry.file_type().is_file()
                && entry.file_name().to_string_lossy().ends_with(TEMPLATE_SUFFIX);
            if !is_deployment {
                continue;
            }

            let path = entry.path();
            let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
            match inject_into_template(&content) {
                Some(updated) => {
                    info!("injecting imagePullSecrets into {}", path.display());
                    fs::write(path, updated).map_err(|e| Error::io(path, e))?;
                    summary.templates_updated.push(path.to_path_buf());
                }
                None => debug!("{} left unchanged", path.display()),
            }
        }
    } else {
        warn!("chart has no templates directory: {}", templates.display());
    }

    summary.values_updated = ensure_pull_secret_value(&chart_dir.join("values.yaml"))?;
    Ok(summary)
}

/// Returns `template` with the pull secret block inserted under the pod
/// template's `spec:`, or None if the template already has one or has no
/// such `spec:` line.
///
/// The block is indented two spaces deeper than the `spec:` line.
pub fn inject_into_template(template: &str) -> Option<String> {
    if template.contains("imagePullSecrets") {
        return None;
    }

    let mut out = String::with_capacity(template.len() + 160);
    let mut inside_template = false;
    let mut injected = false;

    for line in template.split_inclusive('\n') {
        out.push_str(line);
        let trimmed = line.trim();

        if trimmed.starts_with("template:") {
            inside_template = true;
            continue;
        }

        if inside_template && !injected && trimmed == "spec:" {
            if !line.ends_with('\n') {
                out.push('\n');
            }
            let indent = &line[..line.len() - line.trim_start().len()];
            for block_line in [
                "{{- if .Values.image.imagePullSecret }}",
                "imagePullSecrets:",
                "  - name: {{ .Values.image.imagePullSecret }}",
                "{{- end }}",
            ] {
                out.push_str(indent);
                out.push_str("  ");
                out.push_str(block_line);
                out.push('\n');
            }
            injected = true;
        }
    }

    injected.then_some(out)
}

/// Makes sure `values.yaml` has `image.imagePullSecret`. Returns true if the
/// file was rewritten.
fn ensure_pull_secret_value(values_path: &FsPath) -> Result<bool> {
    if !values_path.is_file() {
        return Err(Error::MissingValuesFile {
            path: values_path.to_path_buf(),
        });
    }
    let content = fs::read_to_string(values_path).map_err(|e| Error::io(values_path, e))?;

    let mut root = if content.trim().is_empty() {
        Map::new()
    } else {
        match value::from_yaml(&content)? {
            Value::Map(m) => m,
            Value::Null => Map::new(),
            other => {
                return Err(Error::invalid_document(
                    values_path.display().to_string(),
                    format!("expected a map, got {}", other.type_name()),
                ))
            }
        }
    };

    match root.get("image") {
        Some(Value::Map(_)) => {}
        existing => {
            if let Some(other) = existing {
                warn!("replacing non-map image value ({}) in {}", other.type_name(), values_path.display());
            }
            root.set("image", Value::Map(Map::new()));
        }
    }
    let image = root
        .get_mut("image")
        .and_then(Value::as_map_mut)
        .ok_or_else(|| Error::invalid_document(".image", "not a map"))?;

    if image.has(PULL_SECRET_KEY) {
        info!("image.{} already exists in {}", PULL_SECRET_KEY, values_path.display());
        return Ok(false);
    }

    info!("adding image.{} to {}", PULL_SECRET_KEY, values_path.display());
    image.set(PULL_SECRET_KEY, Value::from(""));
    let yaml = value::to_yaml(&Value::Map(root))?;
    fs::write(values_path, yaml).map_err(|e| Error::io(values_path, e))?;
    Ok(true)
}
