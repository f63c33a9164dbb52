//! SDS Types - Core Data Types
//!
//! Schema and record types shared by the store engine, the client and the
//! sample coordinator. A `TypeDefinition` describes the shape of the events a
//! `Stream` holds; exactly one property of every type is a timestamp key that
//! orders the events of a stream.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use crate::error::{Result, SdsError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// Type Code
// =============================================================================

/// Value type of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeCode {
    Boolean,
    Int64,
    Double,
    String,
    DateTime,
}

impl TypeCode {
    /// Numeric types take part in summaries.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int64 | Self::Double)
    }

    /// The value substituted when a default-filled read has no stored event.
    pub fn zero_value(&self) -> Value {
        match self {
            Self::Boolean => Value::Bool(false),
            Self::Int64 => Value::Int(0),
            Self::Double => Value::Double(0.0),
            Self::String => Value::String(String::new()),
            Self::DateTime => Value::DateTime(DateTime::<Utc>::default()),
        }
    }

    /// Convert a value into this type, widening ints into doubles and
    /// parsing RFC 3339 strings into timestamps. Returns None on mismatch.
    pub fn coerce(&self, value: &Value) -> Option<Value> {
        match (self, value) {
            (Self::Boolean, Value::Bool(b)) => Some(Value::Bool(*b)),
            (Self::Int64, Value::Int(i)) => Some(Value::Int(*i)),
            (Self::Double, Value::Double(d)) => Some(Value::Double(*d)),
            (Self::Double, Value::Int(i)) => Some(Value::Double(*i as f64)),
            (Self::String, Value::String(s)) => Some(Value::String(s.clone())),
            (Self::String, Value::DateTime(t)) => {
                Some(Value::String(crate::utils::format_timestamp(t)))
            }
            (Self::DateTime, Value::DateTime(t)) => Some(Value::DateTime(*t)),
            (Self::DateTime, Value::String(s)) => {
                s.parse::<DateTime<Utc>>().ok().map(Value::DateTime)
            }
            _ => None,
        }
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Boolean => "Boolean",
            Self::Int64 => "Int64",
            Self::Double => "Double",
            Self::String => "String",
            Self::DateTime => "DateTime",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Value
// =============================================================================

/// A single property value of an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Double(f64),
    DateTime(DateTime<Utc>),
    String(String),
}

impl Value {
    /// Try to get as f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(d) => Some(*d),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get as timestamp.
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::DateTime(t) => Some(*t),
            _ => None,
        }
    }

    /// Try to get as string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::DateTime(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

// =============================================================================
// Property Definition
// =============================================================================

/// A named, typed property of a type definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PropertyDefinition {
    pub name: String,
    pub type_code: TypeCode,
    pub is_key: bool,
}

impl PropertyDefinition {
    /// A non-key property.
    pub fn value(name: impl Into<String>, type_code: TypeCode) -> Self {
        Self {
            name: name.into(),
            type_code,
            is_key: false,
        }
    }

    /// The timestamp key property.
    pub fn key(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_code: TypeCode::DateTime,
            is_key: true,
        }
    }
}

// =============================================================================
// Type Definition
// =============================================================================

/// Schema of the events held by a stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TypeDefinition {
    pub name: String,
    pub description: Option<String>,
    pub properties: Vec<PropertyDefinition>,
}

impl TypeDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            properties: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_property(mut self, property: PropertyDefinition) -> Self {
        self.properties.push(property);
        self
    }

    /// The key property, if the definition has exactly one.
    pub fn key(&self) -> Option<&PropertyDefinition> {
        let mut keys = self.properties.iter().filter(|p| p.is_key);
        match (keys.next(), keys.next()) {
            (Some(key), None) => Some(key),
            _ => None,
        }
    }

    /// Look up a property by name.
    pub fn property(&self, name: &str) -> Option<&PropertyDefinition> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Non-key properties in declaration order.
    pub fn value_properties(&self) -> impl Iterator<Item = &PropertyDefinition> {
        self.properties.iter().filter(|p| !p.is_key)
    }

    /// Non-key numeric properties in declaration order.
    pub fn numeric_properties(&self) -> impl Iterator<Item = &PropertyDefinition> {
        self.value_properties().filter(|p| p.type_code.is_numeric())
    }

    /// Check the structural invariants of the definition.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(SdsError::InvalidArgument("type name is empty".to_string()));
        }

        let mut seen = std::collections::HashSet::new();
        for property in &self.properties {
            if property.name.trim().is_empty() {
                return Err(SdsError::InvalidArgument(format!(
                    "type {} has a property with an empty name",
                    self.name
                )));
            }
            if !seen.insert(property.name.as_str()) {
                return Err(SdsError::InvalidArgument(format!(
                    "type {} declares property {} twice",
                    self.name, property.name
                )));
            }
        }

        let key_count = self.properties.iter().filter(|p| p.is_key).count();
        if key_count != 1 {
            return Err(SdsError::InvalidArgument(format!(
                "type {} must have exactly one key property, found {}",
                self.name, key_count
            )));
        }

        if let Some(key) = self.key() {
            if key.type_code != TypeCode::DateTime {
                return Err(SdsError::InvalidArgument(format!(
                    "key property {} of type {} must be DateTime, found {}",
                    key.name, self.name, key.type_code
                )));
            }
        }

        Ok(())
    }

    /// Two definitions are compatible when they declare the same property
    /// set, regardless of declaration order and description.
    pub fn is_compatible_with(&self, other: &TypeDefinition) -> bool {
        if self.name != other.name || self.properties.len() != other.properties.len() {
            return false;
        }
        self.properties
            .iter()
            .all(|p| other.property(&p.name) == Some(p))
    }
}

// =============================================================================
// Stream
// =============================================================================

/// A named sequence of events of one type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Stream {
    pub id: String,
    pub type_id: String,
    pub description: Option<String>,
}

impl Stream {
    pub fn new(id: impl Into<String>, type_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_id: type_id.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.description = if description.is_empty() {
            None
        } else {
            Some(description)
        };
        self
    }

    /// Stream identifiers become path segments of self links.
    pub fn validate(&self) -> Result<()> {
        validate_identifier("stream", &self.id)?;
        validate_identifier("type", &self.type_id)
    }
}

/// Reject identifiers that cannot be used as a path segment.
pub fn validate_identifier(kind: &str, id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(SdsError::InvalidArgument(format!("{} identifier is empty", kind)));
    }
    if id.contains('/') {
        return Err(SdsError::InvalidArgument(format!(
            "{} identifier {} contains '/'",
            kind, id
        )));
    }
    Ok(())
}

// =============================================================================
// Event
// =============================================================================

/// A record of property values; the key property positions it in time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event {
    values: BTreeMap<String, Value>,
}

impl Event {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    /// Numeric value of a property.
    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    /// Timestamp value of a property.
    pub fn timestamp(&self, name: &str) -> Option<DateTime<Utc>> {
        self.get(name).and_then(Value::as_timestamp)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// =============================================================================
// Window Mode
// =============================================================================

/// Fill policy of a window read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WindowMode {
    /// Only stored events are returned, and non-key properties holding
    /// their type's zero value are left out.
    #[default]
    Sparse,
    /// Every property is returned. Window boundaries without a stored event
    /// come back with every non-key property set to its zero value.
    Filled,
}

// =============================================================================
// Summaries
// =============================================================================

/// Aggregate statistics of one numeric property over one interval.
///
/// `count == 0` means the interval held no sample; every statistic is then
/// `None` rather than zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PropertySummary {
    pub count: usize,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub mean: Option<f64>,
    pub total: Option<f64>,
    pub first: Option<f64>,
    pub last: Option<f64>,
    pub standard_deviation: Option<f64>,
}

impl PropertySummary {
    pub fn has_samples(&self) -> bool {
        self.count > 0
    }
}

/// Summaries of a stream for one sub-interval of a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SummaryInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub summaries: BTreeMap<String, PropertySummary>,
}

// =============================================================================
// Tests
// =============================================================================
