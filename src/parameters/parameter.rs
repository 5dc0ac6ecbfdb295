//! Parameter definition and implementation
//!
//! This module provides the [`Parameter`] tagged variant. A literal parameter
//! holds a bounded, directly editable value; a derived parameter holds only
//! the expression its value is computed from.

use crate::error::{ParamError, Result};
use crate::parameters::bounds::Bounds;
use crate::parameters::path::ParamPath;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Largest magnitude at which every integer is exactly representable.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Fields that only a literal item carries.
const LITERAL_FIELDS: [&str; 4] = ["value", "lower", "upper", "unit"];

/// A directly editable parameter with a declared range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LiteralParam {
    /// Current value, always inside `[lower, upper]`
    #[serde(serialize_with = "serialize_number")]
    pub(crate) value: f64,

    #[serde(serialize_with = "serialize_number")]
    pub(crate) lower: f64,

    #[serde(serialize_with = "serialize_number")]
    pub(crate) upper: f64,

    /// Display unit code
    #[serde(serialize_with = "serialize_number")]
    pub unit: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl LiteralParam {
    /// Create a literal parameter
    ///
    /// # Returns
    ///
    /// The parameter, or `MalformedInput` if the bounds are inverted or the value
    /// lies outside them
    ///
    /// # Examples
    ///
    /// ```
    /// use paramtree::parameters::LiteralParam;
    ///
    /// let param = LiteralParam::new(10.0, 0.0, 100.0, 1.0).unwrap();
    /// assert_eq!(param.value(), 10.0);
    /// assert!(LiteralParam::new(200.0, 0.0, 100.0, 1.0).is_err());
    /// ```
    pub fn new(value: f64, lower: f64, upper: f64, unit: f64) -> Result<Self> {
        let param = Self {
            value,
            lower,
            upper,
            unit,
            help: None,
        };
        param.validate()?;
        Ok(param)
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn bounds(&self) -> Bounds {
        Bounds {
            lower: self.lower,
            upper: self.upper,
        }
    }

    /// Replace the value after checking it against the range
    pub(crate) fn set_value(&mut self, path: &ParamPath, value: f64) -> Result<f64> {
        self.bounds().check(path, value)?;
        Ok(std::mem::replace(&mut self.value, value))
    }

    fn validate(&self) -> Result<()> {
        let bounds = Bounds::new(self.lower, self.upper)?;
        if !bounds.contains(self.value) {
            return Err(ParamError::malformed(format!(
                "value {} is outside bounds [{}, {}]",
                self.value, self.lower, self.upper
            )));
        }
        if !self.unit.is_finite() {
            return Err(ParamError::malformed("unit must be a finite number"));
        }
        Ok(())
    }
}

/// A parameter whose value is computed from an expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DerivedParam {
    pub(crate) expr: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl DerivedParam {
    pub fn new(expr: impl Into<String>) -> Self {
        Self {
            expr: expr.into(),
            help: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// The raw expression text
    pub fn expr(&self) -> &str {
        &self.expr
    }
}

/// A parameter in the tree
///
/// The variant tag decides editability: only [`Parameter::Literal`] accepts writes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Parameter {
    Literal(LiteralParam),
    Derived(DerivedParam),
}

impl Parameter {
    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    pub fn is_derived(&self) -> bool {
        matches!(self, Self::Derived(_))
    }

    pub fn as_literal(&self) -> Option<&LiteralParam> {
        match self {
            Self::Literal(literal) => Some(literal),
            Self::Derived(_) => None,
        }
    }

    pub fn as_derived(&self) -> Option<&DerivedParam> {
        match self {
            Self::Derived(derived) => Some(derived),
            Self::Literal(_) => None,
        }
    }

    /// Help text, empty when none was declared
    pub fn help(&self) -> &str {
        let help = match self {
            Self::Literal(literal) => &literal.help,
            Self::Derived(derived) => &derived.help,
        };
        help.as_deref().unwrap_or("")
    }

    /// Classify a raw item object as literal or derived
    ///
    /// Items carrying `expr` are derived; everything else must be a complete
    /// literal. Unknown fields and mixed items are rejected.
    pub fn from_fields(fields: Map<String, Value>) -> Result<Self> {
        if fields.contains_key("expr") {
            if let Some(field) = LITERAL_FIELDS.iter().find(|f| fields.contains_key(**f)) {
                return Err(ParamError::malformed(format!(
                    "item has both 'expr' and '{}'",
                    field
                )));
            }
            let derived: DerivedParam = serde_json::from_value(Value::Object(fields))
                .map_err(|e| ParamError::malformed(format!("derived item: {}", e)))?;
            Ok(Self::Derived(derived))
        } else {
            let literal: LiteralParam = serde_json::from_value(Value::Object(fields))
                .map_err(|e| ParamError::malformed(format!("literal item: {}", e)))?;
            literal.validate()?;
            Ok(Self::Literal(literal))
        }
    }
}

impl From<LiteralParam> for Parameter {
    fn from(literal: LiteralParam) -> Self {
        Self::Literal(literal)
    }
}

impl From<DerivedParam> for Parameter {
    fn from(derived: DerivedParam) -> Self {
        Self::Derived(derived)
    }
}

impl<'de> Deserialize<'de> for Parameter {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let fields = Map::<String, Value>::deserialize(deserializer)?;
        Parameter::from_fields(fields).map_err(serde::de::Error::custom)
    }
}

/// Emit integral values as JSON integers so integer-written snapshots
/// serialize back to the same text.
fn serialize_number<S>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if value.fract() == 0.0 && value.abs() <= MAX_EXACT_INTEGER {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}
