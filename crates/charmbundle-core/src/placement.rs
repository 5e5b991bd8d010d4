//! Unit placement directives.
//!
//! A placement string tells the orchestrator where a unit should run:
//!
//! ```text
//! placement   := [container ":"] target
//! target      := "new" | numeral | identifier ["/" numeral]
//! ```
//!
//! `lxc:mysql/0` places the unit in an lxc container next to unit 0 of
//! `mysql`, `99` places it on machine 99 and `new` asks for a fresh machine.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::names::{is_identifier, is_numeral};

/// Marker for a machine that the deployment creates.
pub const NEW_MACHINE: &str = "new";

/// Syntax error for a placement string, echoing the input verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid placement syntax {placement:?}")]
pub struct PlacementSyntaxError {
    pub placement: String,
}

/// Machine named by a placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MachineRef {
    /// A machine created for this unit.
    New,
    /// A machine declared in the bundle, by id.
    Id(String),
}

impl MachineRef {
    pub fn as_str(&self) -> &str {
        match self {
            MachineRef::New => NEW_MACHINE,
            MachineRef::Id(id) => id.as_str(),
        }
    }
}

/// What a unit is placed on or next to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementTarget {
    /// Co-locate with a service, optionally with one specific unit of it.
    Service { name: String, unit: Option<u32> },
    /// Place on a machine.
    Machine(MachineRef),
}

/// Parsed form of a placement string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitPlacement {
    /// Container type such as `lxc` or `kvm`, if any.
    pub container_type: Option<String>,
    pub target: PlacementTarget,
}

impl UnitPlacement {
    pub fn service(&self) -> Option<&str> {
        match &self.target {
            PlacementTarget::Service { name, .. } => Some(name.as_str()),
            PlacementTarget::Machine(_) => None,
        }
    }

    pub fn machine(&self) -> Option<&MachineRef> {
        match &self.target {
            PlacementTarget::Machine(machine) => Some(machine),
            PlacementTarget::Service { .. } => None,
        }
    }

    pub fn unit(&self) -> Option<u32> {
        match &self.target {
            PlacementTarget::Service { unit, .. } => *unit,
            PlacementTarget::Machine(_) => None,
        }
    }

    /// Unit index with `-1` standing for "no unit given".
    pub fn unit_index(&self) -> i64 {
        self.unit().map_or(-1, i64::from)
    }
}

impl fmt::Display for UnitPlacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(container) = &self.container_type {
            write!(f, "{container}:")?;
        }
        match &self.target {
            PlacementTarget::Service { name, unit: Some(unit) } => write!(f, "{name}/{unit}"),
            PlacementTarget::Service { name, unit: None } => f.write_str(name),
            PlacementTarget::Machine(machine) => f.write_str(machine.as_str()),
        }
    }
}

impl FromStr for UnitPlacement {
    type Err = PlacementSyntaxError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_placement(value)
    }
}

/// Parse a placement directive such as `lxc:service/0`, `99` or `new`.
pub fn parse_placement(placement: &str) -> Result<UnitPlacement, PlacementSyntaxError> {
    let syntax_error = || PlacementSyntaxError {
        placement: placement.to_string(),
    };

    let (container_type, target) = match placement.split_once(':') {
        Some((container, target)) => {
            if !is_identifier(container) {
                return Err(syntax_error());
            }
            (Some(container.to_string()), target)
        }
        None => (None, placement),
    };

    let target = parse_target(target).ok_or_else(syntax_error)?;
    Ok(UnitPlacement {
        container_type,
        target,
    })
}

fn parse_target(target: &str) -> Option<PlacementTarget> {
    if target == NEW_MACHINE {
        return Some(PlacementTarget::Machine(MachineRef::New));
    }
    if is_numeral(target) {
        return Some(PlacementTarget::Machine(MachineRef::Id(target.to_string())));
    }

    let (name, unit) = match target.split_once('/') {
        Some((name, unit)) => (name, Some(unit)),
        None => (target, None),
    };
    // "new" is reserved for machines even when a unit suffix follows.
    if name == NEW_MACHINE || !is_identifier(name) {
        return None;
    }
    let unit = match unit {
        Some(unit) if is_numeral(unit) => Some(unit.parse::<u32>().ok()?),
        Some(_) => return None,
        None => None,
    };

    Some(PlacementTarget::Service {
        name: name.to_string(),
        unit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(container: Option<&str>, name: &str, unit: Option<u32>) -> UnitPlacement {
        UnitPlacement {
            container_type: container.map(str::to_string),
            target: PlacementTarget::Service {
                name: name.to_string(),
                unit,
            },
        }
    }

    fn machine(container: Option<&str>, machine: MachineRef) -> UnitPlacement {
        UnitPlacement {
            container_type: container.map(str::to_string),
            target: PlacementTarget::Machine(machine),
        }
    }

    #[test]
    fn parses_valid_placements() {
        let cases = [
            ("lxc:service/0", service(Some("lxc"), "service", Some(0))),
            ("lxc:service", service(Some("lxc"), "service", None)),
            ("lxc:99", machine(Some("lxc"), MachineRef::Id("99".to_string()))),
            ("lxc:new", machine(Some("lxc"), MachineRef::New)),
            ("service/0", service(None, "service", Some(0))),
            ("service", service(None, "service", None)),
            ("service45", service(None, "service45", None)),
            ("kvm:my-db/12", service(Some("kvm"), "my-db", Some(12))),
            ("99", machine(None, MachineRef::Id("99".to_string()))),
            ("0", machine(None, MachineRef::Id("0".to_string()))),
            ("new", machine(None, MachineRef::New)),
        ];

        for (input, expected) in cases {
            let parsed = parse_placement(input)
                .unwrap_or_else(|err| panic!("placement {input:?} should parse: {err}"));
            assert_eq!(parsed, expected, "placement {input:?}");
        }
    }

    #[test]
    fn rejects_malformed_placements() {
        for input in [
            ":0",
            "05",
            "new/2",
            "3/1",
            "",
            "lxc:",
            "bad placement",
            "service/",
            "service/01",
            "service/0/1",
            "lxc:kvm:0",
            "9lxc:0",
            "service/99999999999",
        ] {
            let err = parse_placement(input).expect_err("placement should be rejected");
            assert_eq!(err.to_string(), format!("invalid placement syntax {input:?}"));
        }
    }

    #[test]
    fn service_and_machine_are_exclusive() {
        let placement = parse_placement("lxc:mysql/3").expect("parse");
        assert_eq!(placement.service(), Some("mysql"));
        assert!(placement.machine().is_none());
        assert_eq!(placement.unit_index(), 3);

        let placement = parse_placement("new").expect("parse");
        assert!(placement.service().is_none());
        assert_eq!(placement.machine(), Some(&MachineRef::New));
        assert_eq!(placement.unit_index(), -1);
    }

    #[test]
    fn displays_canonical_form() {
        for input in ["lxc:service/0", "service", "kvm:7", "new"] {
            let placement: UnitPlacement = input.parse().expect("parse");
            assert_eq!(placement.to_string(), input);
        }
    }
}
