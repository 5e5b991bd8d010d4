use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::decode::DecodeError;

/// Which consistency check produced an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    InvalidSeries,
    InvalidMachineId,
    InvalidMachineConstraints,
    UnreferencedMachine,
    InvalidCharmUrl,
    InvalidServiceConstraints,
    NegativeUnits,
    TooManyPlacements,
    InvalidPlacementSyntax,
    UnknownPlacementService,
    PlacementUnitOutOfRange,
    UnknownPlacementMachine,
    RelationArity,
    InvalidRelationSyntax,
    UnknownRelationService,
    SelfRelation,
    DuplicateRelation,
}

impl IssueCode {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueCode::InvalidSeries => "invalid_series",
            IssueCode::InvalidMachineId => "invalid_machine_id",
            IssueCode::InvalidMachineConstraints => "invalid_machine_constraints",
            IssueCode::UnreferencedMachine => "unreferenced_machine",
            IssueCode::InvalidCharmUrl => "invalid_charm_url",
            IssueCode::InvalidServiceConstraints => "invalid_service_constraints",
            IssueCode::NegativeUnits => "negative_units",
            IssueCode::TooManyPlacements => "too_many_placements",
            IssueCode::InvalidPlacementSyntax => "invalid_placement_syntax",
            IssueCode::UnknownPlacementService => "unknown_placement_service",
            IssueCode::PlacementUnitOutOfRange => "placement_unit_out_of_range",
            IssueCode::UnknownPlacementMachine => "unknown_placement_machine",
            IssueCode::RelationArity => "relation_arity",
            IssueCode::InvalidRelationSyntax => "invalid_relation_syntax",
            IssueCode::UnknownRelationService => "unknown_relation_service",
            IssueCode::SelfRelation => "self_relation",
            IssueCode::DuplicateRelation => "duplicate_relation",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One inconsistency found in a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationIssue {
    pub code: IssueCode,
    /// Location in the bundle, e.g. `/services/mysql/to/2`.
    pub path: String,
    pub message: String,
}

impl VerificationIssue {
    pub fn new(code: IssueCode, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for VerificationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Every issue found by one verification run. Never empty when returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationError {
    issues: Vec<VerificationIssue>,
}

impl VerificationError {
    /// `Ok(())` when nothing was found, the aggregate otherwise.
    pub fn from_issues(
        issues: Vec<VerificationIssue>,
    ) -> std::result::Result<(), VerificationError> {
        if issues.is_empty() {
            Ok(())
        } else {
            Err(VerificationError { issues })
        }
    }

    pub fn issues(&self) -> &[VerificationIssue] {
        &self.issues
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.issues.iter().map(|issue| issue.message.as_str())
    }

    pub fn codes(&self) -> impl Iterator<Item = IssueCode> + '_ {
        self.issues.iter().map(|issue| issue.code)
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

impl fmt::Display for VerificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.issues.split_first() {
            Some((only, [])) => f.write_str(&only.message),
            Some((first, rest)) => write!(f, "{} (and {} more errors)", first.message, rest.len()),
            None => Ok(()),
        }
    }
}

impl std::error::Error for VerificationError {}

/// Errors from loading and verifying a bundle in one step.
#[derive(Debug, Error)]
pub enum Error {
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
    #[error("bundle verification failed: {0}")]
    Verification(#[from] VerificationError),
}

/// Result type for charmbundle operations.
pub type Result<T> = std::result::Result<T, Error>;
