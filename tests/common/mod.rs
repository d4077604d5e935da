// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common utilities for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use jsonplan::core::CodecError;
use jsonplan::schema::{BackingKind, ClassDef, EnumDef, PropertyDef, Type, TypeCatalog};
use jsonplan::{ByteSource, CodecValue, JsonReader, Result};

// ============================================================================
// Fixture Catalog
// ============================================================================

/// Catalog shared by the integration tests.
///
/// - `User { id: int, name: string, email: ?string, active: bool = true }`
/// - `Node { value: int = 0, next: ?Node }`
/// - `Tagged { kind: Kind, tags: list<string> }` (eager)
/// - `Kind` string-backed enum, `Level` int-backed enum
/// - `Event { at: string ("timestamp"), payload: mixed }`
pub fn catalog() -> Arc<TypeCatalog> {
    let catalog = TypeCatalog::new();
    catalog
        .register_class(
            ClassDef::new("User")
                .property(PropertyDef::new("id", Type::int()))
                .property(PropertyDef::new("name", Type::string()))
                .property(PropertyDef::new("email", Type::string().nullable()))
                .property(
                    PropertyDef::new("active", Type::bool()).with_default(CodecValue::Bool(true)),
                ),
        )
        .expect("register User");
    catalog
        .register_class(
            ClassDef::new("Node")
                .property(PropertyDef::new("value", Type::int()).with_default(CodecValue::Int(0)))
                .property(PropertyDef::new("next", Type::object("Node").nullable())),
        )
        .expect("register Node");
    catalog
        .register_class(
            ClassDef::new("Tagged")
                .property(PropertyDef::new(
                    "kind",
                    Type::enumeration("Kind", BackingKind::String),
                ))
                .property(PropertyDef::new("tags", Type::list(Type::string())))
                .eager(),
        )
        .expect("register Tagged");
    catalog
        .register_class(
            ClassDef::new("Event")
                .property(PropertyDef::new("at", Type::string()).encoded_as("timestamp"))
                .property(PropertyDef::new("payload", Type::mixed())),
        )
        .expect("register Event");
    catalog
        .register_enum(EnumDef::string_backed("Kind", [("Alpha", "a"), ("Beta", "b")]))
        .expect("register Kind");
    catalog
        .register_enum(EnumDef::int_backed("Level", [("Low", 1), ("High", 2)]))
        .expect("register Level");
    Arc::new(catalog)
}

/// Reader over the fixture catalog.
pub fn reader() -> JsonReader {
    JsonReader::new(catalog())
}

/// Wrap a text as an in-memory byte source.
pub fn source(text: &str) -> Arc<dyn ByteSource> {
    Arc::new(text.to_string())
}

// ============================================================================
// Mode Helpers
// ============================================================================

/// Decode immediately.
pub fn immediate(reader: &JsonReader, text: &str, ty: &Type) -> Result<CodecValue> {
    reader.read_str(text, ty)
}

/// Decode lazily and force every deferred value.
pub fn lazy_forced(reader: &JsonReader, text: &str, ty: &Type) -> Result<CodecValue> {
    reader.read_source(source(text), ty)?.force()
}

/// Decode in both modes and assert the results agree.
pub fn assert_modes_agree(reader: &JsonReader, text: &str, ty: &Type) -> CodecValue {
    let eager = immediate(reader, text, ty)
        .unwrap_or_else(|e| panic!("immediate decode of {text} as {ty} failed: {e}"));
    let lazy = lazy_forced(reader, text, ty)
        .unwrap_or_else(|e| panic!("lazy decode of {text} as {ty} failed: {e}"));
    assert_eq!(eager, lazy, "modes disagree on {text} as {ty}");
    eager
}

/// Read a property of an object value.
pub fn prop(value: &CodecValue, name: &str) -> Option<CodecValue> {
    value
        .as_object()
        .expect("object value")
        .get(name)
        .unwrap_or_else(|e| panic!("reading '{name}' failed: {e}"))
}

/// Error name used in assertion messages.
pub fn error_kind(error: &CodecError) -> &'static str {
    match error {
        CodecError::MalformedInput { .. } => "MalformedInput",
        CodecError::UnexpectedUnionValue { .. } => "UnexpectedUnionValue",
        CodecError::MissingRequiredProperty { .. } => "MissingRequiredProperty",
        CodecError::UnexpectedValue { .. } => "UnexpectedValue",
        CodecError::UnknownEnumCase { .. } => "UnknownEnumCase",
        CodecError::TypeNotFound { .. } => "TypeNotFound",
        CodecError::InvalidType { .. } => "InvalidType",
        CodecError::DepthExceeded { .. } => "DepthExceeded",
        CodecError::Transform { .. } => "Transform",
        CodecError::Io { .. } => "Io",
    }
}
