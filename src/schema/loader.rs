//! Filesystem loading for the onboarding schema

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use super::OnboardingSchema;

/// Errors raised while reading or parsing a schema document
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read schema file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported schema format: {0}")]
    UnsupportedFormat(String),
}

/// Parse a schema from YAML text
pub fn from_yaml_str(yaml: &str) -> Result<OnboardingSchema, SchemaError> {
    Ok(serde_yaml::from_str(yaml)?)
}

/// Parse a schema from JSON text
pub fn from_json_str(json: &str) -> Result<OnboardingSchema, SchemaError> {
    Ok(serde_json::from_str(json)?)
}

/// Load a schema file, choosing the parser from the file extension
///
/// `.yaml`/`.yml` are parsed as YAML and `.json` as JSON.
pub fn load_schema(path: &Path) -> Result<OnboardingSchema, SchemaError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let contents = fs::read_to_string(path).map_err(|source| SchemaError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let schema = match extension.as_str() {
        "yaml" | "yml" => from_yaml_str(&contents)?,
        "json" => from_json_str(&contents)?,
        other => return Err(SchemaError::UnsupportedFormat(other.to_string())),
    };

    debug!(
        "Loaded schema v{} from {} ({} fields, {} steps)",
        schema.version,
        path.display(),
        schema.fields.len(),
        schema.steps.len()
    );
    Ok(schema)
}
