use schemars::schema::RootSchema;
use schemars::schema_for;

use crate::bundle::BundleData;

/// Emit the JSON Schema for a bundle document.
pub fn bundle_json_schema() -> RootSchema {
    schema_for!(BundleData)
}
