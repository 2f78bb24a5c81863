//! Typed parameter bags for operators.
//!
//! Each operator type declares its properties once as a static table of
//! [`PropertyDef`]s. An [`OperatorProperties`] bag is built from that table
//! and is what gets stored for redo and edited by manipulators.

use super::OperatorError;
use crate::geometry::Vector3;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Vector([f64; 3]),
}

impl PropertyValue {
    fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Bool(_) => "bool",
            PropertyValue::Int(_) => "int",
            PropertyValue::Float(_) => "float",
            PropertyValue::Vector(_) => "vector",
        }
    }
}

/// Declaration of one operator property.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropertyDef {
    pub name: &'static str,
    pub default: PropertyValue,
    /// Values are clamped into this range on set.
    pub hard_min: f64,
    pub hard_max: f64,
    /// Range a UI slider should offer.
    pub soft_min: f64,
    pub soft_max: f64,
}

impl PropertyDef {
    pub const fn bool(name: &'static str, default: bool) -> Self {
        Self {
            name,
            default: PropertyValue::Bool(default),
            hard_min: 0.0,
            hard_max: 1.0,
            soft_min: 0.0,
            soft_max: 1.0,
        }
    }

    pub const fn int(name: &'static str, default: i64, hard: (f64, f64), soft: (f64, f64)) -> Self {
        Self {
            name,
            default: PropertyValue::Int(default),
            hard_min: hard.0,
            hard_max: hard.1,
            soft_min: soft.0,
            soft_max: soft.1,
        }
    }

    pub const fn float(name: &'static str, default: f64, hard: (f64, f64), soft: (f64, f64)) -> Self {
        Self {
            name,
            default: PropertyValue::Float(default),
            hard_min: hard.0,
            hard_max: hard.1,
            soft_min: soft.0,
            soft_max: soft.1,
        }
    }

    /// A 3D vector defaulting to zero.
    pub const fn vector(name: &'static str, hard: (f64, f64), soft: (f64, f64)) -> Self {
        Self {
            name,
            default: PropertyValue::Vector([0.0; 3]),
            hard_min: hard.0,
            hard_max: hard.1,
            soft_min: soft.0,
            soft_max: soft.1,
        }
    }

    /// Coerce `value` to this property's type and clamp it to the hard range.
    fn coerce(&self, value: PropertyValue) -> Result<PropertyValue, OperatorError> {
        let clamp = |x: f64| x.clamp(self.hard_min, self.hard_max);
        let coerced = match (self.default, value) {
            (PropertyValue::Bool(_), PropertyValue::Bool(b)) => PropertyValue::Bool(b),
            (PropertyValue::Int(_), PropertyValue::Int(i)) => PropertyValue::Int(clamp(i as f64) as i64),
            (PropertyValue::Float(_), PropertyValue::Float(x)) => PropertyValue::Float(clamp(x)),
            (PropertyValue::Float(_), PropertyValue::Int(i)) => PropertyValue::Float(clamp(i as f64)),
            (PropertyValue::Vector(_), PropertyValue::Vector(v)) => {
                PropertyValue::Vector([clamp(v[0]), clamp(v[1]), clamp(v[2])])
            }
            (expected, _) => {
                return Err(OperatorError::PropertyType {
                    name: self.name.to_string(),
                    expected: expected.type_name(),
                })
            }
        };
        Ok(coerced)
    }
}

/// Parameter values of one operator invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperatorProperties {
    #[serde(skip)]
    defs: &'static [PropertyDef],
    values: BTreeMap<String, PropertyValue>,
    /// Names given a value explicitly rather than left at their default.
    #[serde(skip)]
    explicit: BTreeSet<String>,
}

impl OperatorProperties {
    pub fn new(defs: &'static [PropertyDef]) -> Self {
        Self {
            defs,
            values: defs.iter().map(|d| (d.name.to_string(), d.default)).collect(),
            explicit: BTreeSet::new(),
        }
    }

    pub fn defs(&self) -> &'static [PropertyDef] {
        self.defs
    }

    pub fn def(&self, name: &str) -> Result<&'static PropertyDef, OperatorError> {
        self.defs
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| OperatorError::MissingProperty(name.to_string()))
    }

    /// Whether the property was assigned rather than left at its default.
    pub fn is_set(&self, name: &str) -> bool {
        self.explicit.contains(name)
    }

    pub fn set(&mut self, name: &str, value: PropertyValue) -> Result<(), OperatorError> {
        let def = self.def(name)?;
        let value = def.coerce(value)?;
        self.values.insert(def.name.to_string(), value);
        self.explicit.insert(def.name.to_string());
        Ok(())
    }

    pub fn with(mut self, name: &str, value: PropertyValue) -> Result<Self, OperatorError> {
        self.set(name, value)?;
        Ok(self)
    }

    /// Assign several values at once, e.g. from a deserialized request.
    pub fn apply(&mut self, values: &BTreeMap<String, PropertyValue>) -> Result<(), OperatorError> {
        for (name, value) in values {
            self.set(name, *value)?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<PropertyValue, OperatorError> {
        self.values
            .get(name)
            .copied()
            .ok_or_else(|| OperatorError::MissingProperty(name.to_string()))
    }

    pub fn get_bool(&self, name: &str) -> Result<bool, OperatorError> {
        match self.get(name)? {
            PropertyValue::Bool(b) => Ok(b),
            _ => Err(self.type_error(name, "bool")),
        }
    }

    pub fn get_int(&self, name: &str) -> Result<i64, OperatorError> {
        match self.get(name)? {
            PropertyValue::Int(i) => Ok(i),
            _ => Err(self.type_error(name, "int")),
        }
    }

    pub fn get_float(&self, name: &str) -> Result<f64, OperatorError> {
        match self.get(name)? {
            PropertyValue::Float(x) => Ok(x),
            _ => Err(self.type_error(name, "float")),
        }
    }

    pub fn get_vector(&self, name: &str) -> Result<Vector3, OperatorError> {
        match self.get(name)? {
            PropertyValue::Vector(v) => Ok(Vector3::from(v)),
            _ => Err(self.type_error(name, "vector")),
        }
    }

    pub fn set_float(&mut self, name: &str, value: f64) -> Result<(), OperatorError> {
        self.set(name, PropertyValue::Float(value))
    }

    pub fn set_vector(&mut self, name: &str, value: &Vector3) -> Result<(), OperatorError> {
        self.set(name, PropertyValue::Vector([value.x, value.y, value.z]))
    }

    pub fn values(&self) -> &BTreeMap<String, PropertyValue> {
        &self.values
    }

    fn type_error(&self, name: &str, expected: &'static str) -> OperatorError {
        OperatorError::PropertyType {
            name: name.to_string(),
            expected,
        }
    }
}
