// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Codec value type system.
//!
//! Provides the value representation produced by decode programs. Immediate
//! programs produce fully materialized values; lazy programs produce objects
//! whose properties are [`PropertySlot::Deferred`] and collections that are
//! [`LazySequence`]s. [`CodecValue::force`] turns either into the former.
//!
//! # Design Principles
//!
//! - **Cheap clones**: objects and sequences are shared behind `Arc`, so a
//!   clone of a lazy proxy shares its memoized property values
//! - **Ordered**: dicts and object properties keep input/declaration order
//! - **Thread-safe**: every variant is `Send + Sync`, including deferred ones

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::error::{CodecError, Result};
use super::thunk::Thunk;

/// Position of a child inside a list or dict.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// Zero-based list position
    Index(usize),
    /// Decoded dict key
    Name(String),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Index(i) => write!(f, "{i}"),
            Key::Name(n) => write!(f, "{n}"),
        }
    }
}

/// A decoded enum case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    /// Enum class identity
    pub class: String,
    /// Case label
    pub case: String,
}

/// Unified value type for decoded JSON.
#[derive(Debug, Clone)]
pub enum CodecValue {
    // Null value for nullable types
    Null,

    Bool(bool),

    // Integers outside i64 are rejected by `int` and widened to float by `mixed`
    Int(i64),

    Float(f64),

    String(String),

    // Enum case resolved from its backing value or label
    Enum(EnumValue),

    // Ordered, integer-indexed collection
    List(Vec<CodecValue>),

    // String-keyed collection in input order
    Dict(IndexMap<String, CodecValue>),

    // Constructed class instance (eager value or lazy proxy)
    Object(Arc<ObjectValue>),

    // Collection decoded item by item while iterating
    Sequence(LazySequence),
}

impl CodecValue {
    // ========================================================================
    // Type Checking Predicates
    // ========================================================================

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, CodecValue::Null)
    }

    /// Check if this value is a container type (list, dict or sequence).
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            CodecValue::List(_) | CodecValue::Dict(_) | CodecValue::Sequence(_)
        )
    }

    /// Check if this value still holds deferred work.
    pub fn is_lazy(&self) -> bool {
        match self {
            CodecValue::Sequence(_) => true,
            CodecValue::Object(obj) => obj.is_lazy(),
            _ => false,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Try to get the inner bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CodecValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get the inner integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CodecValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to convert this value to f64 (for numeric values only).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CodecValue::Int(v) => Some(*v as f64),
            CodecValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get the inner string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CodecValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get the inner enum case.
    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            CodecValue::Enum(e) => Some(e),
            _ => None,
        }
    }

    /// Try to get the inner list.
    pub fn as_list(&self) -> Option<&[CodecValue]> {
        match self {
            CodecValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Try to get the inner dict.
    pub fn as_dict(&self) -> Option<&IndexMap<String, CodecValue>> {
        match self {
            CodecValue::Dict(map) => Some(map),
            _ => None,
        }
    }

    /// Try to get the inner object.
    pub fn as_object(&self) -> Option<&ObjectValue> {
        match self {
            CodecValue::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Try to get the inner lazy sequence.
    pub fn as_sequence(&self) -> Option<&LazySequence> {
        match self {
            CodecValue::Sequence(seq) => Some(seq),
            _ => None,
        }
    }

    /// Get the runtime type name of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            CodecValue::Null => "null",
            CodecValue::Bool(_) => "bool",
            CodecValue::Int(_) => "int",
            CodecValue::Float(_) => "float",
            CodecValue::String(_) => "string",
            CodecValue::Enum(_) => "enum",
            CodecValue::List(_) => "list",
            CodecValue::Dict(_) => "dict",
            CodecValue::Object(_) => "object",
            CodecValue::Sequence(_) => "iterable",
        }
    }

    // ========================================================================
    // Conversions
    // ========================================================================

    /// Convert a raw JSON value without any type direction.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => CodecValue::Null,
            serde_json::Value::Bool(b) => CodecValue::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => CodecValue::Int(i),
                None => CodecValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => CodecValue::String(s.clone()),
            serde_json::Value::Array(arr) => {
                CodecValue::List(arr.iter().map(CodecValue::from_json).collect())
            }
            serde_json::Value::Object(obj) => CodecValue::Dict(
                obj.iter()
                    .map(|(k, v)| (k.clone(), CodecValue::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Resolve every deferred property and sequence, recursively.
    ///
    /// Errors raised by deferred decodes surface here.
    pub fn force(&self) -> Result<CodecValue> {
        match self {
            CodecValue::List(items) => Ok(CodecValue::List(
                items.iter().map(CodecValue::force).collect::<Result<_>>()?,
            )),
            CodecValue::Dict(map) => Ok(CodecValue::Dict(
                map.iter()
                    .map(|(k, v)| Ok((k.clone(), v.force()?)))
                    .collect::<Result<_>>()?,
            )),
            CodecValue::Object(obj) => Ok(CodecValue::Object(Arc::new(obj.force()?))),
            CodecValue::Sequence(seq) => seq.force(),
            other => Ok(other.clone()),
        }
    }

    /// Convert to a JSON value, forcing deferred work along the way.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(match self.force()? {
            CodecValue::Null => serde_json::Value::Null,
            CodecValue::Bool(b) => serde_json::Value::Bool(b),
            CodecValue::Int(i) => serde_json::Value::Number(i.into()),
            CodecValue::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .ok_or_else(|| {
                    CodecError::unexpected_value("finite float", f.to_string(), "to_json")
                })?,
            CodecValue::String(s) => serde_json::Value::String(s),
            CodecValue::Enum(e) => serde_json::Value::String(e.case),
            CodecValue::List(items) => serde_json::Value::Array(
                items
                    .iter()
                    .map(CodecValue::to_json)
                    .collect::<Result<_>>()?,
            ),
            CodecValue::Dict(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| Ok((k.clone(), v.to_json()?)))
                    .collect::<Result<_>>()?,
            ),
            CodecValue::Object(obj) => {
                let mut out = serde_json::Map::new();
                for name in obj.property_names() {
                    if let Some(value) = obj.get(name)? {
                        out.insert(name.to_string(), value.to_json()?);
                    }
                }
                serde_json::Value::Object(out)
            }
            CodecValue::Sequence(_) => serde_json::Value::Null,
        })
    }
}

impl PartialEq for CodecValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CodecValue::Null, CodecValue::Null) => true,
            (CodecValue::Bool(a), CodecValue::Bool(b)) => a == b,
            (CodecValue::Int(a), CodecValue::Int(b)) => a == b,
            (CodecValue::Float(a), CodecValue::Float(b)) => a == b,
            (CodecValue::String(a), CodecValue::String(b)) => a == b,
            (CodecValue::Enum(a), CodecValue::Enum(b)) => a == b,
            (CodecValue::List(a), CodecValue::List(b)) => a == b,
            (CodecValue::Dict(a), CodecValue::Dict(b)) => a == b,
            (CodecValue::Object(a), CodecValue::Object(b)) => Arc::ptr_eq(a, b) || a == b,
            (CodecValue::Sequence(a), CodecValue::Sequence(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for CodecValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecValue::Null => write!(f, "null"),
            CodecValue::Bool(v) => write!(f, "{v}"),
            CodecValue::Int(v) => write!(f, "{v}"),
            CodecValue::Float(v) => write!(f, "{v}"),
            CodecValue::String(v) => write!(f, "\"{v}\""),
            CodecValue::Enum(v) => write!(f, "{}::{}", v.class, v.case),
            CodecValue::List(v) => write!(f, "[{} elements]", v.len()),
            CodecValue::Dict(v) => write!(f, "{{{} entries}}", v.len()),
            CodecValue::Object(v) => write!(f, "{}{{{} properties}}", v.class(), v.len()),
            CodecValue::Sequence(_) => write!(f, "<iterable>"),
        }
    }
}

// =============================================================================
// Objects
// =============================================================================

/// Storage for one object property.
#[derive(Debug, Clone)]
pub enum PropertySlot {
    /// Value assigned at construction
    Ready(CodecValue),
    /// Value resolved on first read
    Deferred(Thunk),
}

impl PropertySlot {
    /// Read the value, running the thunk on first access.
    pub fn get(&self) -> Result<CodecValue> {
        match self {
            PropertySlot::Ready(v) => Ok(v.clone()),
            PropertySlot::Deferred(thunk) => thunk.force(),
        }
    }

    /// Whether reading this slot would not run any deferred work.
    pub fn is_resolved(&self) -> bool {
        match self {
            PropertySlot::Ready(_) => true,
            PropertySlot::Deferred(thunk) => thunk.is_forced(),
        }
    }
}

impl PartialEq for PropertySlot {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropertySlot::Ready(a), PropertySlot::Ready(b)) => a == b,
            (PropertySlot::Deferred(a), PropertySlot::Deferred(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

/// A constructed class instance.
///
/// When built by a lazy instantiator this is the lazy proxy: its slots are
/// [`PropertySlot::Deferred`] and each resolves on first read.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectValue {
    class: String,
    slots: IndexMap<String, PropertySlot>,
}

impl ObjectValue {
    /// Create an object from already-decoded property values.
    pub fn new(class: impl Into<String>, properties: IndexMap<String, CodecValue>) -> Self {
        Self {
            class: class.into(),
            slots: properties
                .into_iter()
                .map(|(k, v)| (k, PropertySlot::Ready(v)))
                .collect(),
        }
    }

    /// Create a lazy proxy from deferred property computations.
    pub fn lazy(class: impl Into<String>, properties: IndexMap<String, Thunk>) -> Self {
        Self {
            class: class.into(),
            slots: properties
                .into_iter()
                .map(|(k, t)| (k, PropertySlot::Deferred(t)))
                .collect(),
        }
    }

    /// Class identity.
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Number of properties present.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if no property is present.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether the property was present at construction.
    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Names of present properties, in declaration order.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    /// Read a property; `Ok(None)` if it was omitted.
    pub fn get(&self, name: &str) -> Result<Option<CodecValue>> {
        self.slots.get(name).map(PropertySlot::get).transpose()
    }

    /// Whether reading `name` would not run any deferred work.
    pub fn is_resolved(&self, name: &str) -> bool {
        self.slots.get(name).map_or(true, PropertySlot::is_resolved)
    }

    /// Whether any property still has deferred work pending.
    pub fn is_lazy(&self) -> bool {
        self.slots.values().any(|s| !s.is_resolved())
    }

    /// Resolve every property recursively into an eager object.
    pub fn force(&self) -> Result<ObjectValue> {
        let mut properties = IndexMap::with_capacity(self.slots.len());
        for (name, slot) in &self.slots {
            properties.insert(name.clone(), slot.get()?.force()?);
        }
        Ok(ObjectValue::new(self.class.clone(), properties))
    }
}

// =============================================================================
// Lazy sequences
// =============================================================================

/// Iterator over decoded collection items.
pub type SequenceIter<'a> = Box<dyn Iterator<Item = Result<(Key, CodecValue)>> + 'a>;

/// Producer behind a [`LazySequence`].
///
/// Each call to `items` restarts from the first child, so a sequence can be
/// iterated any number of times.
pub trait SequenceSource: Send + Sync + fmt::Debug {
    /// Whether items are keyed by position rather than by name.
    fn is_list(&self) -> bool;

    /// Iterate over items, decoding each one as it is reached.
    fn items(&self) -> Result<SequenceIter<'_>>;
}

/// A collection whose items are decoded on demand while iterating.
#[derive(Debug, Clone)]
pub struct LazySequence {
    inner: Arc<dyn SequenceSource>,
}

impl LazySequence {
    /// Wrap a sequence producer.
    pub fn new(inner: Arc<dyn SequenceSource>) -> Self {
        Self { inner }
    }

    /// Whether items are keyed by position.
    pub fn is_list(&self) -> bool {
        self.inner.is_list()
    }

    /// Iterate over `(key, value)` pairs.
    pub fn iter(&self) -> Result<SequenceIter<'_>> {
        self.inner.items()
    }

    /// Whether two sequences share the same producer.
    pub fn ptr_eq(&self, other: &LazySequence) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Drain into a concrete list or dict, forcing each item.
    pub fn force(&self) -> Result<CodecValue> {
        if self.is_list() {
            let mut items = Vec::new();
            for item in self.iter()? {
                let (_, value) = item?;
                items.push(value.force()?);
            }
            Ok(CodecValue::List(items))
        } else {
            let mut map = IndexMap::new();
            for item in self.iter()? {
                let (key, value) = item?;
                map.insert(key.to_string(), value.force()?);
            }
            Ok(CodecValue::Dict(map))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Counting(Vec<i64>);

    impl SequenceSource for Counting {
        fn is_list(&self) -> bool {
            true
        }

        fn items(&self) -> Result<SequenceIter<'_>> {
            Ok(Box::new(
                self.0
                    .iter()
                    .enumerate()
                    .map(|(i, v)| Ok((Key::Index(i), CodecValue::Int(*v)))),
            ))
        }
    }

    #[test]
    fn test_from_json() {
        let json: serde_json::Value =
            serde_json::from_str(r#"{"b": [1, 2.5, null], "a": "x"}"#).unwrap();
        let value = CodecValue::from_json(&json);
        let dict = value.as_dict().unwrap();
        assert_eq!(dict.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(
            dict["b"],
            CodecValue::List(vec![
                CodecValue::Int(1),
                CodecValue::Float(2.5),
                CodecValue::Null
            ])
        );
        assert_eq!(dict["a"].as_str(), Some("x"));
    }

    #[test]
    fn test_type_name() {
        assert_eq!(CodecValue::Null.type_name(), "null");
        assert_eq!(CodecValue::Int(1).type_name(), "int");
        assert_eq!(CodecValue::Float(1.0).type_name(), "float");
        assert_eq!(CodecValue::List(vec![]).type_name(), "list");
        assert_eq!(CodecValue::Dict(IndexMap::new()).type_name(), "dict");
    }

    #[test]
    fn test_as_f64_widens_int() {
        assert_eq!(CodecValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(CodecValue::String("3".into()).as_f64(), None);
    }

    #[test]
    fn test_lazy_object_resolves_on_read() {
        let mut props = IndexMap::new();
        props.insert("id".to_string(), Thunk::new(|| Ok(CodecValue::Int(1))));
        let obj = ObjectValue::lazy("User", props);

        assert!(obj.is_lazy());
        assert!(!obj.is_resolved("id"));
        assert_eq!(obj.get("id").unwrap(), Some(CodecValue::Int(1)));
        assert!(obj.is_resolved("id"));
        assert!(!obj.is_lazy());
        assert_eq!(obj.get("name").unwrap(), None);
    }

    #[test]
    fn test_forced_lazy_object_equals_eager() {
        let mut thunks = IndexMap::new();
        thunks.insert("id".to_string(), Thunk::new(|| Ok(CodecValue::Int(1))));
        let lazy = CodecValue::Object(Arc::new(ObjectValue::lazy("User", thunks)));

        let mut values = IndexMap::new();
        values.insert("id".to_string(), CodecValue::Int(1));
        let eager = CodecValue::Object(Arc::new(ObjectValue::new("User", values)));

        assert_ne!(lazy, eager);
        assert_eq!(lazy.force().unwrap(), eager);
    }

    #[test]
    fn test_sequence_force_is_repeatable() {
        let seq = LazySequence::new(Arc::new(Counting(vec![1, 2])));
        let expected = CodecValue::List(vec![CodecValue::Int(1), CodecValue::Int(2)]);
        assert_eq!(seq.force().unwrap(), expected);
        assert_eq!(seq.force().unwrap(), expected);
        assert!(CodecValue::Sequence(seq).is_lazy());
    }

    #[test]
    fn test_to_json_object() {
        let mut values = IndexMap::new();
        values.insert("id".to_string(), CodecValue::Int(1));
        values.insert(
            "tags".to_string(),
            CodecValue::List(vec![CodecValue::String("a".into())]),
        );
        let obj = CodecValue::Object(Arc::new(ObjectValue::new("User", values)));
        assert_eq!(
            obj.to_json().unwrap(),
            serde_json::json!({"id": 1, "tags": ["a"]})
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(CodecValue::Int(4).to_string(), "4");
        assert_eq!(CodecValue::String("a".into()).to_string(), "\"a\"");
        let e = CodecValue::Enum(EnumValue {
            class: "Suit".into(),
            case: "Hearts".into(),
        });
        assert_eq!(e.to_string(), "Suit::Hearts");
    }
}
