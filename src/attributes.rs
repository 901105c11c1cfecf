use std::collections::HashMap;

use derive_more::From;
use serde::{Deserialize, Serialize};

/// Custom variables describing a user, used by campaign segmentation.
///
/// # Examples
/// ```
/// # use vwo::Attributes;
/// let attributes: Attributes = [
///     ("browser".to_owned(), "chrome".into()),
///     ("age".to_owned(), 42.0.into()),
///     ("beta".to_owned(), true.into()),
/// ]
/// .into_iter()
/// .collect();
/// ```
pub type Attributes = HashMap<String, AttributeValue>;

/// Value of a single custom variable.
#[derive(Debug, Serialize, Deserialize, PartialEq, PartialOrd, From, Clone)]
#[serde(untagged)]
pub enum AttributeValue {
    /// A string value.
    String(String),
    /// A numeric value.
    Number(f64),
    /// A boolean value.
    Boolean(bool),
    /// Explicitly absent value. Behaves the same as a missing attribute.
    Null,
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

/// Render an attribute the way segmentation compares it: missing values become an empty string
/// and booleans become `"true"`/`"false"`.
pub(crate) fn to_comparable_string(value: Option<&AttributeValue>) -> String {
    match value {
        None | Some(AttributeValue::Null) => String::new(),
        Some(AttributeValue::Boolean(b)) => b.to_string(),
        Some(AttributeValue::Number(n)) => n.to_string(),
        Some(AttributeValue::String(s)) => s.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::{to_comparable_string, AttributeValue};

    #[test]
    fn comparable_strings() {
        assert_eq!(to_comparable_string(None), "");
        assert_eq!(to_comparable_string(Some(&AttributeValue::Null)), "");
        assert_eq!(to_comparable_string(Some(&true.into())), "true");
        assert_eq!(to_comparable_string(Some(&false.into())), "false");
        assert_eq!(to_comparable_string(Some(&10.0.into())), "10");
        assert_eq!(to_comparable_string(Some(&1.5.into())), "1.5");
        assert_eq!(to_comparable_string(Some(&"chrome".into())), "chrome");
    }

    #[test]
    fn deserializes_untagged() {
        let values: Vec<AttributeValue> =
            serde_json::from_str(r#"["a", 1, true, null]"#).unwrap();
        assert_eq!(
            values,
            vec![
                AttributeValue::from("a"),
                AttributeValue::from(1.0),
                AttributeValue::from(true),
                AttributeValue::Null,
            ]
        );
    }
}
