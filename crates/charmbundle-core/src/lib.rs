//! Bundle contracts and consistency verification.
//!
//! A bundle describes services, the machines they run on, the relations
//! between them and where each unit is placed. [`verify`] cross-checks all of
//! it and reports every inconsistency in one [`VerificationError`].

pub mod bundle;
pub mod charm_url;
pub mod constraints;
pub mod decode;
pub mod errors;
pub mod names;
pub mod placement;
pub mod schema;
pub mod verify;

use std::path::Path;

pub use bundle::{BundleData, MachineSpec, ServiceSpec};
pub use charm_url::{CharmSchema, CharmUrl, CharmUrlError, validate_charm_url};
pub use constraints::{Constraints, ConstraintsError, validate_constraints};
pub use decode::{DecodeError, from_json_str, from_reader, from_yaml_str, read_bundle_file};
pub use errors::{Error, IssueCode, Result, VerificationError, VerificationIssue};
pub use placement::{
    MachineRef, NEW_MACHINE, PlacementSyntaxError, PlacementTarget, UnitPlacement, parse_placement,
};
pub use schema::bundle_json_schema;
pub use verify::verify;

/// Read a bundle file and verify it with the built-in validators.
pub fn load_and_verify(path: &Path) -> Result<BundleData> {
    let bundle = read_bundle_file(path)?;
    bundle.verify_with_defaults()?;
    Ok(bundle)
}
