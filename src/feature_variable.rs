//! Feature variables attached to feature campaigns and their variations.
use derive_more::From;
use serde::{Deserialize, Serialize};

/// Declared type of a feature variable.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    String,
    Integer,
    Double,
    Boolean,
}

/// Raw variable value as stored in settings. The final type is only known once combined with
/// [`VariableType`].
#[derive(Debug, Serialize, Deserialize, PartialEq, From, Clone)]
#[serde(untagged)]
pub enum RawValue {
    Boolean(bool),
    Number(f64),
    String(String),
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

/// A feature variable definition.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    #[serde(default)]
    pub id: u64,
    pub key: String,
    #[serde(rename = "type")]
    pub variable_type: VariableType,
    pub value: RawValue,
}

impl Variable {
    /// Cast the stored value to the declared type. Returns `None` if the value cannot be
    /// represented as that type.
    pub fn typed_value(&self) -> Option<VariableValue> {
        let value = cast(&self.value, self.variable_type);
        if value.is_none() {
            log::warn!(target: "vwo",
                       variable_key:display = self.key,
                       variable_type:debug = self.variable_type;
                       "unable to type-cast feature variable value: {:?}", self.value);
        }
        value
    }
}

/// A typed feature variable value returned to the host.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub enum VariableValue {
    String(String),
    Integer(i64),
    Double(f64),
    Boolean(bool),
}

impl VariableValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            VariableValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            VariableValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            VariableValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

fn cast(value: &RawValue, variable_type: VariableType) -> Option<VariableValue> {
    match variable_type {
        VariableType::String => Some(VariableValue::String(match value {
            RawValue::String(s) => s.clone(),
            RawValue::Number(n) => n.to_string(),
            RawValue::Boolean(b) => b.to_string(),
        })),
        VariableType::Integer => {
            let n = match value {
                RawValue::Number(n) => *n,
                RawValue::String(s) => s.trim().parse::<f64>().ok()?,
                RawValue::Boolean(_) => return None,
            };
            if !n.is_finite() || n < i64::MIN as f64 || n >= i64::MAX as f64 {
                return None;
            }
            Some(VariableValue::Integer(n.trunc() as i64))
        }
        VariableType::Double => match value {
            RawValue::Number(n) => Some(VariableValue::Double(*n)),
            RawValue::String(s) => s.trim().parse().ok().map(VariableValue::Double),
            RawValue::Boolean(_) => None,
        },
        VariableType::Boolean => match value {
            RawValue::Boolean(b) => Some(VariableValue::Boolean(*b)),
            RawValue::String(s) => s.trim().parse().ok().map(VariableValue::Boolean),
            RawValue::Number(_) => None,
        },
    }
}
