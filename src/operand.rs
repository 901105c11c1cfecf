//! Evaluation of a single `custom_variable` comparison.
//!
//! Operands use a compact syntax: `type(value)` where `type` is one of `wildcard`, `regex`,
//! `lower`, or `equals`. A bare value is an `equals` comparison.
use regex::Regex;

use crate::attributes::{to_comparable_string, AttributeValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OperandKind {
    Equals,
    Lower,
    Regex,
    Contains,
    StartsWith,
    EndsWith,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Operand {
    pub kind: OperandKind,
    pub literal: String,
}

impl Operand {
    /// Parse operand text. Unrecognized syntax degrades to `equals` against the whole text.
    pub fn parse(operand: &str) -> Operand {
        let Some((type_name, value)) = split_grouping(operand) else {
            return Operand::equals(operand);
        };

        match type_name {
            "wildcard" => Operand::wildcard(value),
            "regex" => Operand {
                kind: OperandKind::Regex,
                literal: value.to_owned(),
            },
            "lower" => Operand {
                kind: OperandKind::Lower,
                literal: value.to_owned(),
            },
            "equals" => Operand::equals(value),
            _ => Operand::equals(operand),
        }
    }

    fn equals(literal: &str) -> Operand {
        Operand {
            kind: OperandKind::Equals,
            literal: literal.to_owned(),
        }
    }

    fn wildcard(value: &str) -> Operand {
        let (leading, rest) = match value.strip_prefix('*') {
            Some(rest) => (true, rest),
            None => (false, value),
        };
        let (trailing, literal) = match rest.strip_suffix('*') {
            Some(literal) => (true, literal),
            None => (false, rest),
        };

        let kind = match (leading, trailing) {
            (true, true) => OperandKind::Contains,
            (true, false) => OperandKind::EndsWith,
            (false, true) => OperandKind::StartsWith,
            (false, false) => OperandKind::Equals,
        };

        Operand {
            kind,
            literal: literal.to_owned(),
        }
    }

    /// Compare this operand against a user attribute.
    pub fn matches(&self, attribute: Option<&AttributeValue>) -> bool {
        let attribute = to_comparable_string(attribute);
        let (literal, attribute) = coerce_numbers(&self.literal, attribute);

        match self.kind {
            OperandKind::Equals => attribute == literal,
            OperandKind::Lower => attribute.to_lowercase() == literal.to_lowercase(),
            OperandKind::Contains => attribute.contains(literal.as_str()),
            OperandKind::StartsWith => attribute.starts_with(literal.as_str()),
            OperandKind::EndsWith => attribute.ends_with(literal.as_str()),
            OperandKind::Regex => match Regex::new(&literal) {
                Ok(regex) => regex.is_match(&attribute),
                Err(err) => {
                    log::warn!(target: "vwo", pattern = literal.as_str(); "invalid regex in segment operand: {err}");
                    false
                }
            },
        }
    }
}

/// Evaluate `operand` text against a user attribute.
pub(crate) fn evaluate_operand(operand: &str, attribute: Option<&AttributeValue>) -> bool {
    Operand::parse(operand).matches(attribute)
}

/// Split `type(value)` into its parts. The value runs up to the last closing parenthesis.
fn split_grouping(operand: &str) -> Option<(&str, &str)> {
    let (type_name, rest) = operand.split_once('(')?;
    if type_name.is_empty() {
        return None;
    }
    let end = rest.rfind(')')?;
    Some((type_name, &rest[..end]))
}

/// When both sides are numbers, rewrite them in a canonical form so that `"10"` and `"10.0"`
/// compare equal. Integral values are rendered through `i64`.
fn coerce_numbers(literal: &str, attribute: String) -> (String, String) {
    match (parse_number(literal), parse_number(&attribute)) {
        (Some(l), Some(a)) => (canonical_number(l), canonical_number(a)),
        _ => (literal.to_owned(), attribute),
    }
}

fn parse_number(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn canonical_number(n: f64) -> String {
    if n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 {
        (n as i64).to_string()
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::{evaluate_operand, Operand, OperandKind};
    use crate::AttributeValue;

    fn parsed(operand: &str) -> (OperandKind, String) {
        let Operand { kind, literal } = Operand::parse(operand);
        (kind, literal)
    }

    #[test]
    fn parses_operand_kinds() {
        assert_eq!(parsed("chrome"), (OperandKind::Equals, "chrome".to_owned()));
        assert_eq!(
            parsed("equals(chrome)"),
            (OperandKind::Equals, "chrome".to_owned())
        );
        assert_eq!(parsed("lower(Chrome)"), (OperandKind::Lower, "Chrome".to_owned()));
        assert_eq!(parsed("regex(^a.*)"), (OperandKind::Regex, "^a.*".to_owned()));
    }

    #[test]
    fn parses_wildcards() {
        assert_eq!(
            parsed("wildcard(*123*)"),
            (OperandKind::Contains, "123".to_owned())
        );
        assert_eq!(
            parsed("wildcard(*123)"),
            (OperandKind::EndsWith, "123".to_owned())
        );
        assert_eq!(
            parsed("wildcard(123*)"),
            (OperandKind::StartsWith, "123".to_owned())
        );
        assert_eq!(
            parsed("wildcard(123)"),
            (OperandKind::Equals, "123".to_owned())
        );
    }

    #[test]
    fn unknown_syntax_is_literal_equals() {
        assert_eq!(
            parsed("unknown(abc)"),
            (OperandKind::Equals, "unknown(abc)".to_owned())
        );
        assert_eq!(parsed("(abc)"), (OperandKind::Equals, "(abc)".to_owned()));
        assert_eq!(parsed("lower(abc"), (OperandKind::Equals, "lower(abc".to_owned()));
        assert!(evaluate_operand("unknown(abc)", Some(&"unknown(abc)".into())));
    }

    #[test]
    fn wildcard_contains() {
        assert!(evaluate_operand("wildcard(*123*)", Some(&"a123b".into())));
        assert!(!evaluate_operand("wildcard(*123*)", Some(&"ab".into())));
    }

    #[test]
    fn wildcard_prefix_and_suffix() {
        assert!(evaluate_operand("wildcard(chr*)", Some(&"chrome".into())));
        assert!(!evaluate_operand("wildcard(chr*)", Some(&"firefox".into())));
        assert!(evaluate_operand("wildcard(*fox)", Some(&"firefox".into())));
        assert!(!evaluate_operand("wildcard(*fox)", Some(&"foxes".into())));
    }

    #[test]
    fn regex_is_unanchored_and_case_sensitive() {
        assert!(evaluate_operand("regex(world)", Some(&"hello world".into())));
        assert!(!evaluate_operand("regex(World)", Some(&"hello world".into())));
        assert!(evaluate_operand("regex(^hel+o)", Some(&"hello world".into())));
    }

    #[test]
    fn invalid_regex_does_not_match() {
        assert!(!evaluate_operand("regex(a(b)", Some(&"a(b".into())));
    }

    #[test]
    fn lower_ignores_case() {
        assert!(evaluate_operand("lower(ChRoMe)", Some(&"CHROME".into())));
        assert!(!evaluate_operand("lower(chrome)", Some(&"chromium".into())));
    }

    #[test]
    fn numbers_compare_numerically() {
        assert!(evaluate_operand("10", Some(&10.0.into())));
        assert!(evaluate_operand("10.0", Some(&"10".into())));
        assert!(evaluate_operand("equals(1.5)", Some(&1.5.into())));
        assert!(!evaluate_operand("10", Some(&10.5.into())));
    }

    #[test]
    fn integral_values_beyond_16_bits_compare_correctly() {
        assert!(evaluate_operand("40000", Some(&40000.0.into())));
        assert!(evaluate_operand("-70000.0", Some(&(-70000.0).into())));
        assert!(!evaluate_operand("40000", Some(&40001.0.into())));
    }

    #[test]
    fn booleans_and_missing_values() {
        assert!(evaluate_operand("true", Some(&true.into())));
        assert!(evaluate_operand("false", Some(&false.into())));
        assert!(!evaluate_operand("true", None));
        assert!(evaluate_operand("", None));
        assert!(evaluate_operand("equals()", Some(&AttributeValue::Null)));
    }
}
