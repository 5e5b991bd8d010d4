use std::fs;
use std::io::Read;
use std::path::Path;

use thiserror::Error;

use crate::bundle::BundleData;

/// Errors raised while turning a bundle document into [`BundleData`].
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decode a YAML bundle document.
pub fn from_yaml_str(document: &str) -> Result<BundleData, DecodeError> {
    let bundle: BundleData = serde_yaml::from_str(document)?;
    trace_decoded(&bundle, "yaml");
    Ok(bundle)
}

/// Decode a JSON bundle document.
pub fn from_json_str(document: &str) -> Result<BundleData, DecodeError> {
    let bundle: BundleData = serde_json::from_str(document)?;
    trace_decoded(&bundle, "json");
    Ok(bundle)
}

/// Decode a YAML bundle document from a reader.
pub fn from_reader(mut reader: impl Read) -> Result<BundleData, DecodeError> {
    let mut document = String::new();
    reader.read_to_string(&mut document)?;
    from_yaml_str(&document)
}

/// Read a bundle file; `.json` files are decoded as JSON, anything else as YAML.
pub fn read_bundle_file(path: &Path) -> Result<BundleData, DecodeError> {
    let document = fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        from_json_str(&document)
    } else {
        from_yaml_str(&document)
    }
}

fn trace_decoded(bundle: &BundleData, format: &'static str) {
    tracing::debug!(
        event = "bundle_decoded",
        format,
        services = bundle.services.len(),
        machines = bundle.machines.len(),
        relations = bundle.relations.len()
    );
}
