use std::collections::BTreeMap;
use std::fmt;

use braid_core::Vector;
use thiserror::Error;

/// The kind of value a parameter holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    Bool,
    Int,
    Float,
    Str,
    Vector,
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "string",
            Self::Vector => "vector",
        };
        f.write_str(name)
    }
}

/// A solver parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Vector(Vector),
}

impl ParameterValue {
    #[must_use]
    pub fn kind(&self) -> ParameterKind {
        match self {
            Self::Bool(_) => ParameterKind::Bool,
            Self::Int(_) => ParameterKind::Int,
            Self::Float(_) => ParameterKind::Float,
            Self::Str(_) => ParameterKind::Str,
            Self::Vector(_) => ParameterKind::Vector,
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v}"),
            Self::Vector(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for ParameterValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<i64> for ParameterValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Vector> for ParameterValue {
    fn from(value: Vector) -> Self {
        Self::Vector(value)
    }
}

/// Types that can be read out of a [`ParameterValue`].
pub trait FromParameter<'a>: Sized {
    const KIND: ParameterKind;

    fn from_parameter(value: &'a ParameterValue) -> Option<Self>;
}

macro_rules! from_parameter {
    ($ty:ty, $kind:ident, $value:ident => $extract:expr) => {
        impl<'a> FromParameter<'a> for $ty {
            const KIND: ParameterKind = ParameterKind::$kind;

            fn from_parameter(value: &'a ParameterValue) -> Option<Self> {
                match value {
                    ParameterValue::$kind($value) => Some($extract),
                    _ => None,
                }
            }
        }
    };
}

from_parameter!(bool, Bool, v => *v);
from_parameter!(i64, Int, v => *v);
from_parameter!(f64, Float, v => *v);
from_parameter!(&'a str, Str, v => v.as_str());
from_parameter!(&'a Vector, Vector, v => v);

/// A named solver setting with a description and its default value.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub description: String,
    pub value: ParameterValue,
    pub default: ParameterValue,
}

impl Parameter {
    pub fn new(description: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        let value = value.into();
        Self {
            description: description.into(),
            default: value.clone(),
            value,
        }
    }
}

/// Errors that can occur when reading or writing parameters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParameterError {
    #[error("unknown parameter `{key}`")]
    Unknown { key: String },

    #[error("parameter `{key}` holds a {expected}, got a {actual}")]
    KindMismatch {
        key: String,
        expected: ParameterKind,
        actual: ParameterKind,
    },
}

/// Solver parameters keyed by name, iterated in key order.
///
/// Backends declare their parameters with [`Parameters::declare`]; callers
/// then change values with [`Parameters::set`], which keeps each parameter's
/// kind fixed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    entries: BTreeMap<String, Parameter>,
}

impl Parameters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a parameter, replacing any previous declaration of `key`.
    pub fn declare(
        &mut self,
        key: impl Into<String>,
        description: impl Into<String>,
        value: impl Into<ParameterValue>,
    ) {
        self.entries
            .insert(key.into(), Parameter::new(description, value));
    }

    /// Changes the value of a declared parameter.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` is not declared or if `value` has a
    /// different kind than the declared default.
    pub fn set(
        &mut self,
        key: &str,
        value: impl Into<ParameterValue>,
    ) -> Result<(), ParameterError> {
        let value = value.into();
        let parameter = self.entries.get_mut(key).ok_or_else(|| unknown(key))?;
        if parameter.default.kind() != value.kind() {
            return Err(ParameterError::KindMismatch {
                key: key.to_owned(),
                expected: parameter.default.kind(),
                actual: value.kind(),
            });
        }
        parameter.value = value;
        Ok(())
    }

    /// Restores the default value of `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` is not declared.
    pub fn reset(&mut self, key: &str) -> Result<(), ParameterError> {
        let parameter = self.entries.get_mut(key).ok_or_else(|| unknown(key))?;
        parameter.value = parameter.default.clone();
        Ok(())
    }

    /// Reads the value of `key` as `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` is not declared or holds another kind.
    pub fn get<'a, T: FromParameter<'a>>(&'a self, key: &str) -> Result<T, ParameterError> {
        let value = self.value(key).ok_or_else(|| unknown(key))?;
        T::from_parameter(value).ok_or_else(|| ParameterError::KindMismatch {
            key: key.to_owned(),
            expected: T::KIND,
            actual: value.kind(),
        })
    }

    #[must_use]
    pub fn parameter(&self, key: &str) -> Option<&Parameter> {
        self.entries.get(key)
    }

    #[must_use]
    pub fn value(&self, key: &str) -> Option<&ParameterValue> {
        self.entries.get(key).map(|p| &p.value)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Parameter)> {
        self.entries.iter().map(|(k, p)| (k.as_str(), p))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn unknown(key: &str) -> ParameterError {
    ParameterError::Unknown {
        key: key.to_owned(),
    }
}

impl fmt::Display for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Parameters:")?;
        for (key, parameter) in self.iter() {
            write!(f, "  {key} ({}): {}", parameter.value.kind(), parameter.value)?;
            if !parameter.description.is_empty() {
                write!(f, " ({})", parameter.description)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ndarray::array;

    fn sample() -> Parameters {
        let mut parameters = Parameters::new();
        parameters.declare("max-iterations", "iteration cap", 3000);
        parameters.declare("tolerance", "stopping tolerance", 1e-6);
        parameters.declare("linear-solver", "", "ma57");
        parameters.declare("warm-start", "reuse multipliers", false);
        parameters.declare("weights", "", array![1.0, 2.0]);
        parameters
    }

    #[test]
    fn typed_reads() {
        let parameters = sample();

        assert_eq!(parameters.get::<i64>("max-iterations"), Ok(3000));
        assert_eq!(parameters.get::<f64>("tolerance"), Ok(1e-6));
        assert_eq!(parameters.get::<&str>("linear-solver"), Ok("ma57"));
        assert_eq!(parameters.get::<bool>("warm-start"), Ok(false));
        assert_eq!(parameters.get::<&Vector>("weights").unwrap()[1], 2.0);
    }

    #[test]
    fn wrong_kind_or_key_is_an_error() {
        let parameters = sample();

        assert_eq!(
            parameters.get::<f64>("max-iterations"),
            Err(ParameterError::KindMismatch {
                key: "max-iterations".into(),
                expected: ParameterKind::Float,
                actual: ParameterKind::Int,
            })
        );
        assert!(matches!(
            parameters.get::<f64>("missing"),
            Err(ParameterError::Unknown { .. })
        ));
    }

    #[test]
    fn set_keeps_kind_and_reset_restores_default() {
        let mut parameters = sample();

        parameters.set("tolerance", 1e-3).unwrap();
        assert_eq!(parameters.get::<f64>("tolerance"), Ok(1e-3));
        assert!(parameters.set("tolerance", "small").is_err());
        assert!(parameters.set("unknown", 1.0).is_err());

        parameters.reset("tolerance").unwrap();
        assert_eq!(parameters.get::<f64>("tolerance"), Ok(1e-6));
    }

    #[test]
    fn iterates_in_key_order() {
        let parameters = sample();
        let keys: Vec<_> = parameters.iter().map(|(k, _)| k).collect();

        assert_eq!(
            keys,
            ["linear-solver", "max-iterations", "tolerance", "warm-start", "weights"]
        );
        assert!(parameters.to_string().contains("tolerance (float): 0.000001"));
    }
}
