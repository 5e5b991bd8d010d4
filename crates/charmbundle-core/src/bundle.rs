use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A decoded bundle: services, the machines they run on and the relations
/// wiring them together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct BundleData {
    /// Default series for every service in the bundle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    /// Services keyed by service name.
    #[serde(default)]
    pub services: BTreeMap<String, ServiceSpec>,
    /// Machines keyed by machine id. A null body decodes as an empty spec.
    #[serde(default, deserialize_with = "scalar::machine_map")]
    pub machines: BTreeMap<String, MachineSpec>,
    /// Endpoint pairs such as `["mediawiki:db", "mysql:db"]`.
    #[serde(default)]
    pub relations: Vec<Vec<String>>,
}

/// A single service in the bundle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ServiceSpec {
    /// Charm reference, e.g. `cs:precise/mysql-28`. Missing decodes as empty
    /// so the charm URL check reports it.
    #[serde(default)]
    pub charm: String,
    /// Number of units to start.
    #[serde(default)]
    pub num_units: i64,
    /// Placement directives, one per unit at most.
    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "scalar::string_seq")]
    pub to: Vec<String>,
    /// Charm option values.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty", deserialize_with = "scalar::string_map")]
    pub annotations: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub constraints: String,
}

/// A machine declared by the bundle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MachineSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub constraints: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty", deserialize_with = "scalar::string_map")]
    pub annotations: BTreeMap<String, String>,
}

impl BundleData {
    /// Series, treating an empty string as unset.
    pub fn declared_series(&self) -> Option<&str> {
        self.series.as_deref().filter(|series| !series.is_empty())
    }
}

/// Deserializers that accept any scalar where the model stores a string.
mod scalar {
    use std::collections::BTreeMap;
    use std::fmt;

    use serde::de::{self, Deserializer, Visitor};
    use serde::Deserialize;

    use super::MachineSpec;

    #[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
    struct ScalarString(String);

    impl<'de> Deserialize<'de> for ScalarString {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_any(ScalarVisitor)
        }
    }

    struct ScalarVisitor;

    impl<'de> Visitor<'de> for ScalarVisitor {
        type Value = ScalarString;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string, number, boolean or null")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            Ok(ScalarString(value.to_string()))
        }

        fn visit_string<E: de::Error>(self, value: String) -> Result<Self::Value, E> {
            Ok(ScalarString(value))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
            Ok(ScalarString(value.to_string()))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
            Ok(ScalarString(value.to_string()))
        }

        // `{:?}` keeps the fraction, so `1.0` never collapses into the numeral `1`.
        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
            Ok(ScalarString(format!("{value:?}")))
        }

        fn visit_bool<E: de::Error>(self, value: bool) -> Result<Self::Value, E> {
            Ok(ScalarString(value.to_string()))
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(ScalarString(String::new()))
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(ScalarString(String::new()))
        }
    }

    pub fn string_seq<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let values = Option::<Vec<ScalarString>>::deserialize(deserializer)?;
        Ok(values
            .unwrap_or_default()
            .into_iter()
            .map(|ScalarString(value)| value)
            .collect())
    }

    pub fn string_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let values = Option::<BTreeMap<ScalarString, ScalarString>>::deserialize(deserializer)?;
        Ok(values
            .unwrap_or_default()
            .into_iter()
            .map(|(ScalarString(key), ScalarString(value))| (key, value))
            .collect())
    }

    pub fn machine_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, MachineSpec>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let values =
            Option::<BTreeMap<ScalarString, Option<MachineSpec>>>::deserialize(deserializer)?;
        Ok(values
            .unwrap_or_default()
            .into_iter()
            .map(|(ScalarString(id), spec)| (id, spec.unwrap_or_default()))
            .collect())
    }
}
