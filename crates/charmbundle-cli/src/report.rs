use std::io::{self, Write};

use charmbundle_core::{UnitPlacement, VerificationError, VerificationIssue};
use serde::Serialize;

/// Machine-readable verification outcome for `--output json`.
#[derive(Debug, Serialize)]
pub struct VerifyReport<'a> {
    pub bundle: &'a str,
    pub valid: bool,
    pub issues: &'a [VerificationIssue],
}

impl<'a> VerifyReport<'a> {
    pub fn new(bundle: &'a str, outcome: &'a Result<(), VerificationError>) -> Self {
        let issues = match outcome {
            Ok(()) => &[][..],
            Err(err) => err.issues(),
        };
        Self {
            bundle,
            valid: issues.is_empty(),
            issues,
        }
    }
}

/// Flat view of a parsed placement, one JSON object per line.
#[derive(Debug, Serialize)]
pub struct PlacementRow<'a> {
    pub placement: &'a str,
    pub container_type: Option<&'a str>,
    pub service: Option<&'a str>,
    pub unit: Option<u32>,
    pub machine: Option<&'a str>,
}

impl<'a> PlacementRow<'a> {
    pub fn new(placement: &'a str, parsed: &'a UnitPlacement) -> Self {
        Self {
            placement,
            container_type: parsed.container_type.as_deref(),
            service: parsed.service(),
            unit: parsed.unit(),
            machine: parsed.machine().map(|machine| machine.as_str()),
        }
    }
}

pub fn print_issues(out: &mut impl Write, issues: &[VerificationIssue]) -> io::Result<()> {
    for issue in issues {
        writeln!(out, "error {} {}: {}", issue.code, issue.path, issue.message)?;
    }
    Ok(())
}
