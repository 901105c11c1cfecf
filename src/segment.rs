//! Campaign pre-segmentation.
//!
//! A segment is a tree of single-key JSON objects. The key names a combinator (`and`, `or`,
//! `not`) or a leaf (`custom_variable`):
//!
//! ```json
//! {"or": [
//!   {"custom_variable": {"browser": "wildcard(*chrome*)"}},
//!   {"not": {"custom_variable": {"country": "lower(in)"}}}
//! ]}
//! ```
use serde::Deserialize;
use serde_json::Value;

use crate::{attributes::AttributeValue, operand::evaluate_operand, Attributes};

/// Boolean predicate tree over user attributes.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "serde_json::Value")]
pub enum Segment {
    /// No segmentation: everyone qualifies.
    #[default]
    Empty,
    /// True if every child is true.
    And(Vec<Segment>),
    /// True if any child is true.
    Or(Vec<Segment>),
    /// Negation of the child.
    Not(Box<Segment>),
    /// Compare the attribute `name` against `operand`.
    CustomVariable { name: String, operand: String },
    /// A combinator this SDK does not know about. Admits everyone.
    Unknown(String),
}

impl Segment {
    pub fn is_empty(&self) -> bool {
        matches!(self, Segment::Empty)
    }

    /// Evaluate the tree against `attributes`.
    pub fn eval(&self, attributes: &Attributes) -> bool {
        self.eval_with(&|name: &str, operand: &str| {
            evaluate_operand(operand, attributes.get(name))
        })
    }

    /// Evaluate the tree, delegating each `custom_variable` leaf to `leaf`.
    ///
    /// `and`/`or` stop at the first child that decides the result.
    pub(crate) fn eval_with(&self, leaf: &dyn Fn(&str, &str) -> bool) -> bool {
        match self {
            Segment::Empty | Segment::Unknown(_) => true,
            Segment::And(children) => children.iter().all(|child| child.eval_with(leaf)),
            Segment::Or(children) => children.iter().any(|child| child.eval_with(leaf)),
            Segment::Not(child) => !child.eval_with(leaf),
            Segment::CustomVariable { name, operand } => leaf(name, operand),
        }
    }
}

impl From<Value> for Segment {
    fn from(value: Value) -> Self {
        let map = match value {
            Value::Object(map) => map,
            Value::Null => return Segment::Empty,
            other => return Segment::Unknown(other.to_string()),
        };

        let Some((key, value)) = map.into_iter().next() else {
            return Segment::Empty;
        };

        match key.as_str() {
            "and" => match value {
                Value::Array(children) => Segment::And(children.into_iter().map(Into::into).collect()),
                _ => Segment::Unknown(key),
            },
            "or" => match value {
                Value::Array(children) => Segment::Or(children.into_iter().map(Into::into).collect()),
                _ => Segment::Unknown(key),
            },
            "not" => {
                let child = match value {
                    Value::Array(children) => children.into_iter().next().unwrap_or(Value::Null),
                    other => other,
                };
                Segment::Not(Box::new(child.into()))
            }
            "custom_variable" => match value {
                Value::Object(operand) => match operand.into_iter().next() {
                    Some((name, Value::String(operand))) => Segment::CustomVariable { name, operand },
                    Some((name, other)) => Segment::CustomVariable {
                        name,
                        operand: comparable_operand(other),
                    },
                    None => Segment::Unknown(key),
                },
                _ => Segment::Unknown(key),
            },
            _ => Segment::Unknown(key),
        }
    }
}

/// Operands are normally strings; tolerate numbers and booleans written without quotes.
fn comparable_operand(value: Value) -> String {
    match serde_json::from_value::<AttributeValue>(value.clone()) {
        Ok(AttributeValue::Number(n)) => n.to_string(),
        Ok(AttributeValue::Boolean(b)) => b.to_string(),
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::Segment;
    use crate::Attributes;

    fn segment(value: serde_json::Value) -> Segment {
        serde_json::from_value(value).unwrap()
    }

    fn attributes(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).into()))
            .collect()
    }

    #[test]
    fn empty_tree_admits_everyone() {
        let tree = segment(json!({}));
        assert!(tree.is_empty());
        assert!(tree.eval(&HashMap::new()));
        assert!(tree.eval(&attributes(&[("browser", "chrome")])));
        assert!(Segment::default().eval(&HashMap::new()));
    }

    #[test]
    fn parses_nested_tree() {
        let tree = segment(json!({
            "or": [
                {"custom_variable": {"browser": "wildcard(*chrome*)"}},
                {"not": {"custom_variable": {"country": "lower(in)"}}}
            ]
        }));
        assert_eq!(
            tree,
            Segment::Or(vec![
                Segment::CustomVariable {
                    name: "browser".into(),
                    operand: "wildcard(*chrome*)".into()
                },
                Segment::Not(Box::new(Segment::CustomVariable {
                    name: "country".into(),
                    operand: "lower(in)".into()
                })),
            ])
        );
    }

    #[test]
    fn and_requires_every_child() {
        let tree = segment(json!({
            "and": [
                {"custom_variable": {"browser": "chrome"}},
                {"custom_variable": {"country": "IN"}}
            ]
        }));
        assert!(tree.eval(&attributes(&[("browser", "chrome"), ("country", "IN")])));
        assert!(!tree.eval(&attributes(&[("browser", "chrome"), ("country", "US")])));
        assert!(!tree.eval(&attributes(&[])));
    }

    #[test]
    fn not_negates_conjunction() {
        let conjunction = json!({
            "and": [
                {"custom_variable": {"browser": "chrome"}},
                {"custom_variable": {"country": "IN"}}
            ]
        });
        let and = segment(conjunction.clone());
        let not = segment(json!({ "not": conjunction }));

        for attrs in [
            attributes(&[("browser", "chrome"), ("country", "IN")]),
            attributes(&[("browser", "chrome"), ("country", "US")]),
            attributes(&[]),
        ] {
            assert_eq!(not.eval(&attrs), !and.eval(&attrs));
        }
    }

    #[test]
    fn or_short_circuits() {
        let tree = segment(json!({
            "or": [
                {"custom_variable": {"browser": "chrome"}},
                {"custom_variable": {"poison": "x"}}
            ]
        }));
        let leaf = |name: &str, operand: &str| {
            assert_ne!(name, "poison", "evaluated a child after the result was decided");
            name == "browser" && operand == "chrome"
        };
        assert!(tree.eval_with(&leaf));
    }

    #[test]
    fn and_short_circuits() {
        let tree = segment(json!({
            "and": [
                {"custom_variable": {"browser": "firefox"}},
                {"custom_variable": {"poison": "x"}}
            ]
        }));
        let leaf = |name: &str, _operand: &str| {
            assert_ne!(name, "poison", "evaluated a child after the result was decided");
            false
        };
        assert!(!tree.eval_with(&leaf));
    }

    #[test]
    fn unknown_combinator_admits() {
        let tree = segment(json!({ "xor": [] }));
        assert_eq!(tree, Segment::Unknown("xor".into()));
        assert!(tree.eval(&HashMap::new()));
    }

    #[test]
    fn malformed_combinators_degrade_to_admit() {
        assert!(segment(json!({ "and": "oops" })).eval(&HashMap::new()));
        assert!(segment(json!({ "custom_variable": [] })).eval(&HashMap::new()));
        assert!(segment(json!(null)).is_empty());
    }

    #[test]
    fn non_string_operands_are_stringified() {
        let tree = segment(json!({ "custom_variable": { "age": 10 } }));
        assert!(tree.eval(&[("age".to_owned(), 10.0.into())].into_iter().collect()));
    }
}
