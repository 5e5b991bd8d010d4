//! Name grammars shared by the placement parser, the verifier and the
//! default collaborators.

/// `letter (letter | digit | "-")*`, ASCII only.
pub fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '-')
}

/// `"0" | nonZeroDigit digit*`.
pub fn is_numeral(value: &str) -> bool {
    match value.as_bytes() {
        [] => false,
        [b'0'] => true,
        [first, rest @ ..] => {
            (b'1'..=b'9').contains(first) && rest.iter().all(|byte| byte.is_ascii_digit())
        }
    }
}

/// Series names are lowercase ASCII letters only.
pub fn is_valid_series(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|byte| byte.is_ascii_lowercase())
}

/// Machine ids are numerals: non-negative, no leading zero except `0`.
pub fn is_valid_machine_id(value: &str) -> bool {
    is_numeral(value)
}

/// Go-style `%q` rendering used throughout the verification messages.
pub(crate) fn quoted(value: &str) -> String {
    format!("{value:?}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numerals_reject_leading_zeros() {
        assert!(is_numeral("0"));
        assert!(is_numeral("10"));
        assert!(is_numeral("99"));
        assert!(!is_numeral("05"));
        assert!(!is_numeral("00"));
        assert!(!is_numeral(""));
        assert!(!is_numeral("-1"));
        assert!(!is_numeral("1a"));
    }

    #[test]
    fn identifiers_start_with_a_letter() {
        assert!(is_identifier("service45"));
        assert!(is_identifier("my-service"));
        assert!(is_identifier("lxc"));
        assert!(!is_identifier("45service"));
        assert!(!is_identifier("-svc"));
        assert!(!is_identifier("bad placement"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn series_is_lowercase_letters() {
        assert!(is_valid_series("precise"));
        assert!(!is_valid_series("9wrong"));
        assert!(!is_valid_series("trusty64"));
        assert!(!is_valid_series("Precise"));
        assert!(!is_valid_series(""));
    }
}
