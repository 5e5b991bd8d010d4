//! Resource constraints such as `arch=amd64 mem=4G`, used as the default
//! constraints validator.

use thiserror::Error;

use crate::names::is_identifier;

const ARCHES: &[&str] = &["amd64", "i386", "armhf", "arm64", "ppc64el"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintsError {
    #[error("malformed constraint {0:?}")]
    Malformed(String),
    #[error("unknown constraint {0:?}")]
    Unknown(String),
    #[error("bad {key:?} constraint: {reason}")]
    BadValue { key: String, reason: String },
    #[error("{0:?} constraint specified more than once")]
    Duplicate(String),
}

/// Parsed constraints. `None` means the constraint was not given or was
/// given with an empty value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Constraints {
    pub arch: Option<String>,
    pub container: Option<String>,
    pub cpu_cores: Option<u64>,
    pub cpu_power: Option<u64>,
    /// Megabytes.
    pub mem: Option<u64>,
    /// Megabytes.
    pub root_disk: Option<u64>,
    pub tags: Option<Vec<String>>,
    pub instance_type: Option<String>,
}

impl Constraints {
    pub fn parse(value: &str) -> Result<Self, ConstraintsError> {
        let mut constraints = Constraints::default();
        let mut seen: Vec<&str> = Vec::new();

        for item in value.split_whitespace() {
            let Some((key, raw)) = item.split_once('=') else {
                return Err(ConstraintsError::Malformed(item.to_string()));
            };
            if seen.contains(&key) {
                return Err(ConstraintsError::Duplicate(key.to_string()));
            }
            seen.push(key);

            let bad = |reason: String| ConstraintsError::BadValue {
                key: key.to_string(),
                reason,
            };

            match key {
                "arch" => constraints.arch = optional(raw, parse_arch).map_err(bad)?,
                "container" => constraints.container = optional(raw, parse_container).map_err(bad)?,
                "cpu-cores" => constraints.cpu_cores = optional(raw, parse_count).map_err(bad)?,
                "cpu-power" => constraints.cpu_power = optional(raw, parse_count).map_err(bad)?,
                "mem" => constraints.mem = optional(raw, parse_size).map_err(bad)?,
                "root-disk" => constraints.root_disk = optional(raw, parse_size).map_err(bad)?,
                "tags" => {
                    constraints.tags = non_empty(raw)
                        .map(|raw| raw.split(',').map(str::to_string).collect())
                }
                "instance-type" => constraints.instance_type = non_empty(raw).map(str::to_string),
                _ => return Err(ConstraintsError::Unknown(key.to_string())),
            }
        }

        Ok(constraints)
    }
}

/// Collaborator form of [`Constraints::parse`] for [`crate::verify`].
pub fn validate_constraints(value: &str) -> Result<(), ConstraintsError> {
    Constraints::parse(value).map(|_| ())
}

fn non_empty(raw: &str) -> Option<&str> {
    if raw.is_empty() { None } else { Some(raw) }
}

fn optional<T>(
    raw: &str,
    parse: impl Fn(&str) -> Result<T, String>,
) -> Result<Option<T>, String> {
    non_empty(raw).map(parse).transpose()
}

fn parse_arch(raw: &str) -> Result<String, String> {
    if ARCHES.contains(&raw) {
        Ok(raw.to_string())
    } else {
        Err(format!("{raw:?} not recognized"))
    }
}

fn parse_container(raw: &str) -> Result<String, String> {
    if is_identifier(raw) {
        Ok(raw.to_string())
    } else {
        Err(format!("invalid container type {raw:?}"))
    }
}

fn parse_count(raw: &str) -> Result<u64, String> {
    raw.parse::<u64>()
        .map_err(|_| "must be a non-negative integer".to_string())
}

/// Size in megabytes; accepts an optional `M`, `G`, `T` or `P` suffix.
fn parse_size(raw: &str) -> Result<u64, String> {
    let invalid = || "must be a non-negative float with optional M/G/T/P suffix".to_string();
    let (number, multiplier) = match raw.char_indices().last() {
        Some((idx, suffix)) if suffix.is_ascii_alphabetic() => {
            let multiplier = match suffix.to_ascii_uppercase() {
                'M' => 1.0,
                'G' => 1024.0,
                'T' => 1024.0 * 1024.0,
                'P' => 1024.0 * 1024.0 * 1024.0,
                _ => return Err(invalid()),
            };
            (&raw[..idx], multiplier)
        }
        _ => (raw, 1.0),
    };
    let value: f64 = number.parse().map_err(|_| invalid())?;
    if !value.is_finite() || value < 0.0 {
        return Err(invalid());
    }
    Ok((value * multiplier).ceil() as u64)
}
