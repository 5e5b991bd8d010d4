use std::collections::HashSet;
use std::fmt;

use crate::bundle::BundleData;
use crate::errors::{IssueCode, VerificationError, VerificationIssue};
use crate::names::{is_identifier, is_valid_machine_id, is_valid_series, quoted};
use crate::placement::{MachineRef, PlacementSyntaxError, UnitPlacement, parse_placement};

/// Check a bundle for internal consistency, reporting every problem found.
///
/// `validate_charm_url` is called once per service and `validate_constraints`
/// once per non-empty constraints string. Their error messages are embedded
/// verbatim in the resulting issues.
pub fn verify<U, UE, C, CE>(
    bundle: &BundleData,
    validate_charm_url: U,
    validate_constraints: C,
) -> Result<(), VerificationError>
where
    U: Fn(&str) -> Result<(), UE>,
    UE: fmt::Display,
    C: Fn(&str) -> Result<(), CE>,
    CE: fmt::Display,
{
    let placements = parse_all_placements(bundle);
    let mut issues = Vec::new();

    record(&mut issues, "series", check_series(bundle));
    record(&mut issues, "machine_ids", check_machine_ids(bundle));
    record(
        &mut issues,
        "machine_constraints",
        check_machine_constraints(bundle, &validate_constraints),
    );
    record(
        &mut issues,
        "machine_references",
        check_machine_references(bundle, &placements),
    );
    record(
        &mut issues,
        "charm_urls",
        check_charm_urls(bundle, &validate_charm_url),
    );
    record(
        &mut issues,
        "service_constraints",
        check_service_constraints(bundle, &validate_constraints),
    );
    record(&mut issues, "unit_counts", check_unit_counts(bundle));
    record(&mut issues, "placements", check_placements(bundle, &placements));
    record(&mut issues, "relations", check_relations(bundle));

    tracing::debug!(
        event = "bundle_verified",
        services = bundle.services.len(),
        machines = bundle.machines.len(),
        relations = bundle.relations.len(),
        issues = issues.len()
    );

    VerificationError::from_issues(issues)
}

impl BundleData {
    /// See [`verify`].
    pub fn verify<U, UE, C, CE>(
        &self,
        validate_charm_url: U,
        validate_constraints: C,
    ) -> Result<(), VerificationError>
    where
        U: Fn(&str) -> Result<(), UE>,
        UE: fmt::Display,
        C: Fn(&str) -> Result<(), CE>,
        CE: fmt::Display,
    {
        verify(self, validate_charm_url, validate_constraints)
    }

    /// Verify with the built-in charm URL and constraints validators.
    pub fn verify_with_defaults(&self) -> Result<(), VerificationError> {
        verify(
            self,
            crate::charm_url::validate_charm_url,
            crate::constraints::validate_constraints,
        )
    }
}

fn record(
    issues: &mut Vec<VerificationIssue>,
    check: &'static str,
    found: Vec<VerificationIssue>,
) {
    tracing::debug!(event = "check_finished", check, issues = found.len());
    issues.extend(found);
}

/// A `to` entry together with its parse result.
struct ParsedPlacement<'a> {
    service: &'a str,
    index: usize,
    raw: &'a str,
    parsed: Result<UnitPlacement, PlacementSyntaxError>,
}

impl ParsedPlacement<'_> {
    fn path(&self) -> String {
        format!("/services/{}/to/{}", self.service, self.index)
    }
}

fn parse_all_placements(bundle: &BundleData) -> Vec<ParsedPlacement<'_>> {
    bundle
        .services
        .iter()
        .flat_map(|(service, spec)| {
            spec.to.iter().enumerate().map(move |(index, raw)| ParsedPlacement {
                service: service.as_str(),
                index,
                raw: raw.as_str(),
                parsed: parse_placement(raw),
            })
        })
        .collect()
}

fn check_series(bundle: &BundleData) -> Vec<VerificationIssue> {
    match bundle.declared_series() {
        Some(series) if !is_valid_series(series) => vec![VerificationIssue::new(
            IssueCode::InvalidSeries,
            "/series",
            format!("bundle declares an invalid series {}", quoted(series)),
        )],
        _ => Vec::new(),
    }
}

fn check_machine_ids(bundle: &BundleData) -> Vec<VerificationIssue> {
    bundle
        .machines
        .keys()
        .filter(|id| !is_valid_machine_id(id))
        .map(|id| {
            VerificationIssue::new(
                IssueCode::InvalidMachineId,
                format!("/machines/{id}"),
                format!("invalid machine id {} found in machines", quoted(id)),
            )
        })
        .collect()
}

fn check_machine_constraints<C, CE>(bundle: &BundleData, validate: &C) -> Vec<VerificationIssue>
where
    C: Fn(&str) -> Result<(), CE>,
    CE: fmt::Display,
{
    let mut issues = Vec::new();
    for (id, machine) in &bundle.machines {
        if machine.constraints.is_empty() {
            continue;
        }
        if let Err(err) = validate(machine.constraints.as_str()) {
            issues.push(VerificationIssue::new(
                IssueCode::InvalidMachineConstraints,
                format!("/machines/{id}/constraints"),
                format!(
                    "invalid constraints {} in machine {}: {err}",
                    quoted(&machine.constraints),
                    quoted(id)
                ),
            ));
        }
    }
    issues
}

fn check_machine_references(
    bundle: &BundleData,
    placements: &[ParsedPlacement<'_>],
) -> Vec<VerificationIssue> {
    let referenced: HashSet<&str> = placements
        .iter()
        .filter_map(|placement| match &placement.parsed {
            Ok(parsed) => match parsed.machine() {
                Some(MachineRef::Id(id)) => Some(id.as_str()),
                _ => None,
            },
            Err(_) => None,
        })
        .collect();

    bundle
        .machines
        .keys()
        .filter(|id| !referenced.contains(id.as_str()))
        .map(|id| {
            VerificationIssue::new(
                IssueCode::UnreferencedMachine,
                format!("/machines/{id}"),
                format!(
                    "machine {} is not referred to by a placement directive",
                    quoted(id)
                ),
            )
        })
        .collect()
}

fn check_charm_urls<U, UE>(bundle: &BundleData, validate: &U) -> Vec<VerificationIssue>
where
    U: Fn(&str) -> Result<(), UE>,
    UE: fmt::Display,
{
    let mut issues = Vec::new();
    for (name, service) in &bundle.services {
        if let Err(err) = validate(service.charm.as_str()) {
            issues.push(VerificationIssue::new(
                IssueCode::InvalidCharmUrl,
                format!("/services/{name}/charm"),
                format!("invalid charm URL in service {}: {err}", quoted(name)),
            ));
        }
    }
    issues
}

fn check_service_constraints<C, CE>(bundle: &BundleData, validate: &C) -> Vec<VerificationIssue>
where
    C: Fn(&str) -> Result<(), CE>,
    CE: fmt::Display,
{
    let mut issues = Vec::new();
    for (name, service) in &bundle.services {
        if service.constraints.is_empty() {
            continue;
        }
        if let Err(err) = validate(service.constraints.as_str()) {
            issues.push(VerificationIssue::new(
                IssueCode::InvalidServiceConstraints,
                format!("/services/{name}/constraints"),
                format!(
                    "invalid constraints {} in service {}: {err}",
                    quoted(&service.constraints),
                    quoted(name)
                ),
            ));
        }
    }
    issues
}

fn check_unit_counts(bundle: &BundleData) -> Vec<VerificationIssue> {
    let mut issues = Vec::new();
    for (name, service) in &bundle.services {
        if service.num_units < 0 {
            issues.push(VerificationIssue::new(
                IssueCode::NegativeUnits,
                format!("/services/{name}/num_units"),
                format!(
                    "negative number of units specified on service {}",
                    quoted(name)
                ),
            ));
        } else if usize::try_from(service.num_units).is_ok_and(|units| service.to.len() > units) {
            issues.push(VerificationIssue::new(
                IssueCode::TooManyPlacements,
                format!("/services/{name}/to"),
                format!(
                    "too many units specified in unit placement for service {}",
                    quoted(name)
                ),
            ));
        }
    }
    issues
}

fn check_placements(
    bundle: &BundleData,
    placements: &[ParsedPlacement<'_>],
) -> Vec<VerificationIssue> {
    let mut issues = Vec::new();

    for placement in placements {
        let parsed = match &placement.parsed {
            Ok(parsed) => parsed,
            Err(err) => {
                issues.push(VerificationIssue::new(
                    IssueCode::InvalidPlacementSyntax,
                    placement.path(),
                    err.to_string(),
                ));
                continue;
            }
        };

        if let Some(service) = parsed.service() {
            match bundle.services.get(service) {
                None => issues.push(VerificationIssue::new(
                    IssueCode::UnknownPlacementService,
                    placement.path(),
                    format!(
                        "placement {} refers to a service not defined in this bundle",
                        quoted(placement.raw)
                    ),
                )),
                Some(target) => {
                    if let Some(unit) = parsed.unit()
                        && i64::from(unit) >= target.num_units
                    {
                        issues.push(VerificationIssue::new(
                            IssueCode::PlacementUnitOutOfRange,
                            placement.path(),
                            format!(
                                "placement {} specifies a unit greater than the {} unit(s) started by the target service",
                                quoted(placement.raw),
                                target.num_units
                            ),
                        ));
                    }
                }
            }
        }

        if let Some(MachineRef::Id(id)) = parsed.machine()
            && !bundle.machines.contains_key(id)
        {
            issues.push(VerificationIssue::new(
                IssueCode::UnknownPlacementMachine,
                placement.path(),
                format!(
                    "placement {} refers to a machine not defined in this bundle",
                    quoted(placement.raw)
                ),
            ));
        }
    }

    issues
}

/// `service:relation` half of a relation.
struct Endpoint<'a> {
    raw: &'a str,
    service: &'a str,
}

fn parse_endpoint(raw: &str) -> Option<Endpoint<'_>> {
    let (service, relation) = raw.split_once(':')?;
    if is_identifier(service) && is_identifier(relation) {
        Some(Endpoint { raw, service })
    } else {
        None
    }
}

/// Renders a relation the way the messages quote it: `["a:x" "b:y"]`.
fn format_relation(relation: &[String]) -> String {
    let endpoints: Vec<String> = relation.iter().map(|endpoint| quoted(endpoint)).collect();
    format!("[{}]", endpoints.join(" "))
}

fn check_relations(bundle: &BundleData) -> Vec<VerificationIssue> {
    let mut issues = Vec::new();
    let mut resolved = Vec::new();

    for (idx, relation) in bundle.relations.iter().enumerate() {
        if let Some(pair) = resolve_relation(bundle, idx, relation, &mut issues) {
            resolved.push((idx, relation, pair));
        }
    }

    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    for (idx, relation, [first, second]) in resolved {
        let path = format!("/relations/{idx}");
        if first.service == second.service {
            issues.push(VerificationIssue::new(
                IssueCode::SelfRelation,
                path.clone(),
                format!(
                    "relation {} relates a service to itself",
                    format_relation(relation)
                ),
            ));
        }

        let key = if second.raw < first.raw {
            (second.raw, first.raw)
        } else {
            (first.raw, second.raw)
        };
        if !seen.insert(key) {
            issues.push(VerificationIssue::new(
                IssueCode::DuplicateRelation,
                path,
                format!(
                    "relation {} is defined more than once",
                    format_relation(relation)
                ),
            ));
        }
    }

    issues
}

/// Arity, endpoint syntax and service references for one relation.
/// Returns the endpoints only when all three hold.
fn resolve_relation<'a>(
    bundle: &BundleData,
    idx: usize,
    relation: &'a [String],
    issues: &mut Vec<VerificationIssue>,
) -> Option<[Endpoint<'a>; 2]> {
    let [first, second] = relation else {
        issues.push(VerificationIssue::new(
            IssueCode::RelationArity,
            format!("/relations/{idx}"),
            format!(
                "relation {} has {} endpoint(s), not 2",
                format_relation(relation),
                relation.len()
            ),
        ));
        return None;
    };

    let mut endpoints = Vec::with_capacity(2);
    let mut syntax_ok = true;
    for (pos, raw) in [first, second].into_iter().enumerate() {
        match parse_endpoint(raw) {
            Some(endpoint) => endpoints.push(endpoint),
            None => {
                syntax_ok = false;
                issues.push(VerificationIssue::new(
                    IssueCode::InvalidRelationSyntax,
                    format!("/relations/{idx}/{pos}"),
                    format!("invalid relation syntax {}", quoted(raw)),
                ));
            }
        }
    }
    if !syntax_ok {
        return None;
    }

    let mut references_ok = true;
    for (pos, endpoint) in endpoints.iter().enumerate() {
        if !bundle.services.contains_key(endpoint.service) {
            references_ok = false;
            issues.push(VerificationIssue::new(
                IssueCode::UnknownRelationService,
                format!("/relations/{idx}/{pos}"),
                format!(
                    "relation {} refers to service {} not defined in this bundle",
                    format_relation(relation),
                    quoted(endpoint.service)
                ),
            ));
        }
    }
    if !references_ok {
        return None;
    }

    let second = endpoints.pop()?;
    let first = endpoints.pop()?;
    Some([first, second])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::{MachineSpec, ServiceSpec};

    fn accept(_: &str) -> Result<(), String> {
        Ok(())
    }

    fn service(charm: &str, num_units: i64, to: &[&str]) -> ServiceSpec {
        ServiceSpec {
            charm: charm.to_string(),
            num_units,
            to: to.iter().map(|value| value.to_string()).collect(),
            ..ServiceSpec::default()
        }
    }

    fn bundle_with_relations(relations: &[&[&str]]) -> BundleData {
        let mut bundle = BundleData::default();
        bundle
            .services
            .insert("wordpress".to_string(), service("cs:wordpress", 1, &[]));
        bundle
            .services
            .insert("mysql".to_string(), service("cs:mysql", 1, &[]));
        bundle.relations = relations
            .iter()
            .map(|relation| relation.iter().map(|value| value.to_string()).collect())
            .collect();
        bundle
    }

    fn messages(bundle: &BundleData) -> Vec<String> {
        match verify(bundle, accept, accept) {
            Ok(()) => Vec::new(),
            Err(err) => err.messages().map(str::to_string).collect(),
        }
    }

    #[test]
    fn reversed_relation_is_one_duplicate() {
        let bundle = bundle_with_relations(&[
            &["wordpress:db", "mysql:server"],
            &["mysql:server", "wordpress:db"],
        ]);
        assert_eq!(
            messages(&bundle),
            vec![r#"relation ["mysql:server" "wordpress:db"] is defined more than once"#]
        );
    }

    #[test]
    fn triple_relation_reports_each_repeat() {
        let bundle = bundle_with_relations(&[
            &["wordpress:db", "mysql:server"],
            &["mysql:server", "wordpress:db"],
            &["wordpress:db", "mysql:server"],
        ]);
        assert_eq!(messages(&bundle).len(), 2);
    }

    #[test]
    fn malformed_relations_skip_pair_checks() {
        let bundle = bundle_with_relations(&[
            &["wordpress:db"],
            &["wordpress:db", "mysql:server", "mysql:other"],
            &["ghost:db", "ghost:db"],
            &["wordpress/db", "wordpress:db"],
        ]);
        assert_eq!(
            messages(&bundle),
            vec![
                r#"relation ["wordpress:db"] has 1 endpoint(s), not 2"#,
                r#"relation ["wordpress:db" "mysql:server" "mysql:other"] has 3 endpoint(s), not 2"#,
                r#"relation ["ghost:db" "ghost:db"] refers to service "ghost" not defined in this bundle"#,
                r#"relation ["ghost:db" "ghost:db"] refers to service "ghost" not defined in this bundle"#,
                r#"invalid relation syntax "wordpress/db""#,
            ]
        );
    }

    #[test]
    fn negative_units_do_not_report_too_many_placements() {
        let mut bundle = BundleData::default();
        bundle
            .services
            .insert("wordpress".to_string(), service("cs:wordpress", -1, &[]));
        assert_eq!(
            messages(&bundle),
            vec![r#"negative number of units specified on service "wordpress""#]
        );
    }

    #[test]
    fn new_machine_placement_needs_no_declaration() {
        let mut bundle = BundleData::default();
        bundle.services.insert(
            "wordpress".to_string(),
            service("cs:wordpress", 3, &["new", "lxc:new", "kvm:0"]),
        );
        bundle
            .machines
            .insert("0".to_string(), MachineSpec::default());
        assert!(verify(&bundle, accept, accept).is_ok());
    }

    #[test]
    fn container_placement_references_machine() {
        let mut bundle = BundleData::default();
        bundle.services.insert(
            "wordpress".to_string(),
            service("cs:wordpress", 1, &["lxc:4"]),
        );
        bundle
            .machines
            .insert("3".to_string(), MachineSpec::default());
        assert_eq!(
            messages(&bundle),
            vec![
                r#"machine "3" is not referred to by a placement directive"#,
                r#"placement "lxc:4" refers to a machine not defined in this bundle"#,
            ]
        );
    }

    #[test]
    fn unit_index_is_checked_against_target_service() {
        let mut bundle = BundleData::default();
        bundle
            .services
            .insert("mysql".to_string(), service("cs:mysql", 2, &[]));
        bundle.services.insert(
            "wordpress".to_string(),
            service("cs:wordpress", 2, &["mysql/1", "lxc:mysql/2"]),
        );
        assert_eq!(
            messages(&bundle),
            vec![
                r#"placement "lxc:mysql/2" specifies a unit greater than the 2 unit(s) started by the target service"#
            ]
        );
    }

    #[test]
    fn empty_constraints_skip_the_collaborator() {
        let mut bundle = BundleData::default();
        bundle
            .services
            .insert("wordpress".to_string(), service("cs:wordpress", 1, &["0"]));
        bundle
            .machines
            .insert("0".to_string(), MachineSpec::default());
        let reject = |value: &str| -> Result<(), String> { Err(format!("rejected {value:?}")) };
        assert!(verify(&bundle, accept, reject).is_ok());
    }

    #[test]
    fn issues_carry_codes_and_paths() {
        let mut bundle = BundleData::default();
        bundle.series = Some("9wrong".to_string());
        bundle
            .services
            .insert("wordpress".to_string(), service("cs:wordpress", 1, &["05"]));
        let err = verify(&bundle, accept, accept).expect_err("bundle should fail");
        let found: Vec<(IssueCode, &str)> = err
            .issues()
            .iter()
            .map(|issue| (issue.code, issue.path.as_str()))
            .collect();
        assert_eq!(
            found,
            vec![
                (IssueCode::InvalidSeries, "/series"),
                (IssueCode::InvalidPlacementSyntax, "/services/wordpress/to/0"),
            ]
        );
    }
}
