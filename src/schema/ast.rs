// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Type descriptions consumed by the decode pipeline.
//!
//! A [`Type`] describes the shape of the value a program decodes. Its
//! [`signature`](Type::signature) is canonical: two types have the same
//! signature exactly when they decode the same way.

use std::fmt;

use crate::core::{CodecError, Result};

/// Signatures of the scalar kinds; no class or enum may take these names.
const SCALAR_NAMES: &[&str] = &["null", "bool", "int", "float", "string", "mixed"];

/// Check that `name` can identify a class or enum.
///
/// Names must be non-empty, must not be a scalar signature, and must not
/// contain the characters signatures are composed with.
pub fn check_type_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(CodecError::invalid_type(name, "empty type name"));
    }
    if SCALAR_NAMES.contains(&name) {
        return Err(CodecError::invalid_type(
            name,
            "type name is reserved for a scalar",
        ));
    }
    if let Some(c) = name
        .chars()
        .find(|c| matches!(c, '<' | '>' | '|' | '?' | ',') || c.is_whitespace())
    {
        return Err(CodecError::invalid_type(
            name,
            format!("type name contains '{c}'"),
        ));
    }
    Ok(())
}

/// How an enum's cases are represented in JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackingKind {
    /// Cases carry an integer backing value (the ordinal)
    Int,
    /// Cases carry a string backing value
    String,
    /// Cases are written as their label
    Unit,
}

/// A list or dict type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionType {
    /// Declared key type; `None` means positions for lists and strings for dicts
    pub key: Option<Box<Type>>,
    /// Item type
    pub item: Box<Type>,
    /// Integer-indexed and order-significant
    pub list: bool,
    /// Declared consumption is "iterable" rather than a concrete container
    pub iterable: bool,
}

/// Kind of a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Null,
    Bool,
    Int,
    Float,
    String,
    /// Any JSON value, decoded without type direction
    Mixed,
    /// Enum identified by class name
    Enum {
        /// Enum class identity
        class: String,
        /// JSON representation of the cases
        backing: BackingKind,
    },
    /// Class instance identified by class name
    Object {
        /// Class identity
        class: String,
    },
    Collection(CollectionType),
    /// One of several member types
    Union(Vec<Type>),
}

/// A value shape: kind plus nullability.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Type {
    /// Kind of the type
    pub kind: TypeKind,
    /// Whether JSON `null` is accepted in place of the value
    pub nullable: bool,
}

impl Type {
    /// Create a non-nullable type of the given kind.
    pub fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            nullable: false,
        }
    }

    /// The null type.
    pub fn null() -> Self {
        Self::new(TypeKind::Null)
    }

    /// Boolean.
    pub fn bool() -> Self {
        Self::new(TypeKind::Bool)
    }

    /// 64-bit integer.
    pub fn int() -> Self {
        Self::new(TypeKind::Int)
    }

    /// 64-bit float; accepts JSON integers.
    pub fn float() -> Self {
        Self::new(TypeKind::Float)
    }

    /// UTF-8 string.
    pub fn string() -> Self {
        Self::new(TypeKind::String)
    }

    /// Any JSON value.
    pub fn mixed() -> Self {
        Self::new(TypeKind::Mixed)
    }

    /// Enum class.
    pub fn enumeration(class: impl Into<String>, backing: BackingKind) -> Self {
        Self::new(TypeKind::Enum {
            class: class.into(),
            backing,
        })
    }

    /// Class instance.
    pub fn object(class: impl Into<String>) -> Self {
        Self::new(TypeKind::Object {
            class: class.into(),
        })
    }

    /// List drained into a concrete container.
    pub fn list(item: Type) -> Self {
        Self::collection(None, item, true, false)
    }

    /// String-keyed dict drained into a concrete container.
    pub fn dict(item: Type) -> Self {
        Self::collection(None, item, false, false)
    }

    /// Dict with an explicit key type.
    pub fn dict_with_key(key: Type, item: Type) -> Self {
        Self::collection(Some(key), item, false, false)
    }

    /// List consumed as an iterable.
    pub fn iterable_list(item: Type) -> Self {
        Self::collection(None, item, true, true)
    }

    /// Dict consumed as an iterable.
    pub fn iterable_dict(item: Type) -> Self {
        Self::collection(None, item, false, true)
    }

    fn collection(key: Option<Type>, item: Type, list: bool, iterable: bool) -> Self {
        Self::new(TypeKind::Collection(CollectionType {
            key: key.map(Box::new),
            item: Box::new(item),
            list,
            iterable,
        }))
    }

    /// Union of member types.
    ///
    /// Nested unions are flattened, duplicate members removed, and a
    /// single-member union collapses to that member.
    pub fn union(members: impl IntoIterator<Item = Type>) -> Self {
        let mut flat: Vec<Type> = Vec::new();
        for member in members {
            match member.kind {
                TypeKind::Union(inner) if !member.nullable => {
                    for m in inner {
                        if !flat.contains(&m) {
                            flat.push(m);
                        }
                    }
                }
                _ => {
                    if !flat.contains(&member) {
                        flat.push(member);
                    }
                }
            }
        }
        if flat.len() == 1 {
            return flat.remove(0);
        }
        Self::new(TypeKind::Union(flat))
    }

    /// This type, accepting `null`.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// This type with nullability stripped.
    pub fn non_nullable(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            nullable: false,
        }
    }

    /// Whether `null` is a legal value, through the flag or the kind.
    pub fn accepts_null(&self) -> bool {
        match &self.kind {
            TypeKind::Null | TypeKind::Mixed => true,
            TypeKind::Union(members) => self.nullable || members.iter().any(Type::accepts_null),
            _ => self.nullable,
        }
    }

    /// Whether this is a union type.
    pub fn is_union(&self) -> bool {
        matches!(self.kind, TypeKind::Union(_))
    }

    /// Class identity for object and enum types.
    pub fn class_name(&self) -> Option<&str> {
        match &self.kind {
            TypeKind::Object { class } | TypeKind::Enum { class, .. } => Some(class),
            _ => None,
        }
    }

    /// Canonical textual signature, unique per distinct shape.
    pub fn signature(&self) -> String {
        let base = match &self.kind {
            TypeKind::Null => return "null".to_string(),
            TypeKind::Mixed => return "mixed".to_string(),
            TypeKind::Bool => "bool".to_string(),
            TypeKind::Int => "int".to_string(),
            TypeKind::Float => "float".to_string(),
            TypeKind::String => "string".to_string(),
            TypeKind::Enum { class, .. } => format!("enum<{class}>"),
            TypeKind::Object { class } => class.clone(),
            TypeKind::Collection(c) => {
                let item = c.item.signature();
                let key = c
                    .key
                    .as_ref()
                    .map(|k| k.signature())
                    .unwrap_or_else(|| "string".to_string());
                match (c.list, c.iterable) {
                    (true, false) => format!("list<{item}>"),
                    (true, true) => format!("iterable<{item}>"),
                    (false, false) => format!("array<{key}, {item}>"),
                    (false, true) => format!("iterable<{key}, {item}>"),
                }
            }
            TypeKind::Union(members) => {
                let mut parts: Vec<String> = members.iter().map(Type::signature).collect();
                parts.sort();
                parts.dedup();
                if self.nullable && !parts.iter().any(|p| p == "null") {
                    parts.push("null".to_string());
                }
                return parts.join("|");
            }
        };
        if self.nullable {
            format!("?{base}")
        } else {
            base
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature())
    }
}
