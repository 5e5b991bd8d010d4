use charmbundle_core::{MachineRef, PlacementTarget, UnitPlacement, parse_placement};

#[test]
fn container_service_placement() {
    let placement = parse_placement("lxc:service/0").expect("parse");
    assert_eq!(
        placement,
        UnitPlacement {
            container_type: Some("lxc".to_string()),
            target: PlacementTarget::Service {
                name: "service".to_string(),
                unit: Some(0),
            },
        }
    );
}

#[test]
fn machine_placements_have_no_unit() {
    let placement = parse_placement("99").expect("parse");
    assert_eq!(placement.container_type, None);
    assert_eq!(placement.machine(), Some(&MachineRef::Id("99".to_string())));
    assert_eq!(placement.unit_index(), -1);

    let placement = parse_placement("new").expect("parse");
    assert_eq!(placement.machine(), Some(&MachineRef::New));
    assert_eq!(placement.unit_index(), -1);
}

#[test]
fn service_unit_suffixes_parse_for_any_numeral() {
    for name in ["wordpress", "my-db", "svc9"] {
        for unit in [0u32, 1, 9, 10, 42, 4_000_000_000] {
            let input = format!("{name}/{unit}");
            let placement = parse_placement(&input).expect("parse");
            assert_eq!(placement.service(), Some(name), "placement {input:?}");
            assert_eq!(placement.unit(), Some(unit), "placement {input:?}");
        }
    }
}

#[test]
fn new_never_takes_a_unit() {
    for unit in ["0", "1", "2", "17", "05", "x"] {
        let input = format!("new/{unit}");
        let err = parse_placement(&input).expect_err("new/<n> must fail");
        assert_eq!(err.placement, input);
    }
}

#[test]
fn leading_zero_numerals_fail() {
    for input in ["05", "00", "007", "lxc:05", "svc/01", "lxc:svc/00"] {
        assert!(parse_placement(input).is_err(), "placement {input:?}");
    }
}
