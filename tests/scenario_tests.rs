// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! End-to-end decoding scenarios.
//!
//! Tests cover:
//! - Lists of scalars in both modes
//! - Splitter boundaries of a small dict
//! - Nullable objects given `null`
//! - Union discrimination without coercion
//! - Missing required properties
//! - Self-referential classes

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;

use jsonplan::core::{Key, Thunk};
use jsonplan::encoding::{SplitMode, Splitter};
use jsonplan::instantiate::{
    CatalogInstantiator, EagerInstantiator, Instantiators, LazyInstantiator,
};
use jsonplan::model::{DataModelBuilder, DataModelNode, NodeId, NodeRef};
use jsonplan::{Boundary, CodecError, CodecValue, DecodeOptions, JsonReader, Result, Type};

use common::{assert_modes_agree, catalog, immediate, prop, reader, source};

// ============================================================================
// Test Helpers
// ============================================================================

/// Catalog instantiator that counts how often it is invoked.
struct CountingInstantiator {
    inner: CatalogInstantiator,
    calls: AtomicUsize,
}

impl CountingInstantiator {
    fn new() -> Self {
        Self {
            inner: CatalogInstantiator::new(catalog()),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EagerInstantiator for CountingInstantiator {
    fn instantiate(
        &self,
        class: &str,
        properties: IndexMap<String, CodecValue>,
    ) -> Result<CodecValue> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        EagerInstantiator::instantiate(&self.inner, class, properties)
    }
}

impl LazyInstantiator for CountingInstantiator {
    fn instantiate(&self, class: &str, properties: IndexMap<String, Thunk>) -> Result<CodecValue> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        LazyInstantiator::instantiate(&self.inner, class, properties)
    }
}

fn counting_reader() -> (JsonReader, Arc<CountingInstantiator>) {
    let counter = Arc::new(CountingInstantiator::new());
    let instantiators = Instantiators::new(counter.clone(), counter.clone());
    (reader().with_instantiators(instantiators), counter)
}

// ============================================================================
// Scenario A: list of int
// ============================================================================

#[test]
fn test_list_of_int() {
    let reader = reader();
    let ty = Type::list(Type::int());
    let value = assert_modes_agree(&reader, "[1,2,3]", &ty);
    assert_eq!(
        value,
        CodecValue::List(vec![
            CodecValue::Int(1),
            CodecValue::Int(2),
            CodecValue::Int(3)
        ])
    );
}

#[test]
fn test_list_of_int_rejects_strings() {
    let reader = reader();
    let ty = Type::list(Type::int());
    let err = immediate(&reader, r#"[1,"2"]"#, &ty).unwrap_err();
    match err {
        CodecError::UnexpectedValue {
            observed, context, ..
        } => {
            assert_eq!(observed, "string");
            assert_eq!(context, "$[1]");
        }
        other => panic!("expected UnexpectedValue, got {other}"),
    }
}

// ============================================================================
// Scenario B: splitter boundaries
// ============================================================================

#[test]
fn test_dict_boundaries() {
    let splitter = Splitter::new(&DecodeOptions::default());
    let text = source(r#"{"a":1,"b":2}"#);
    let boundaries = splitter
        .split(&text, Boundary::whole(), SplitMode::Dict)
        .unwrap()
        .expect("not null");

    let entries: Vec<(Key, Boundary)> = boundaries.iter().collect::<Result<_>>().unwrap();
    assert_eq!(
        entries,
        vec![
            (Key::Name("a".to_string()), Boundary::new(5, Some(1))),
            (Key::Name("b".to_string()), Boundary::new(11, Some(1))),
        ]
    );
}

#[test]
fn test_dict_of_int_decodes() {
    let reader = reader();
    let ty = Type::dict(Type::int());
    let value = assert_modes_agree(&reader, r#"{"a":1,"b":2}"#, &ty);
    let dict = value.as_dict().unwrap();
    assert_eq!(dict.get("a"), Some(&CodecValue::Int(1)));
    assert_eq!(dict.get("b"), Some(&CodecValue::Int(2)));
}

// ============================================================================
// Scenario C: nullable object given null
// ============================================================================

#[test]
fn test_nullable_object_null_immediate() {
    let (reader, counter) = counting_reader();
    let value = reader
        .read_str("null", &Type::object("User").nullable())
        .unwrap();
    assert_eq!(value, CodecValue::Null);
    assert_eq!(counter.calls(), 0);
}

#[test]
fn test_nullable_object_null_lazy() {
    let (reader, counter) = counting_reader();
    let value = reader
        .read_source(source("  null "), &Type::object("User").nullable())
        .unwrap();
    assert_eq!(value, CodecValue::Null);
    assert_eq!(counter.calls(), 0);
}

#[test]
fn test_non_nullable_object_rejects_null() {
    let reader = reader();
    let ty = Type::object("User");
    assert!(matches!(
        reader.read_str("null", &ty).unwrap_err(),
        CodecError::UnexpectedValue { .. }
    ));
    assert!(matches!(
        reader.read_source(source("null"), &ty).unwrap_err(),
        CodecError::UnexpectedValue { .. }
    ));
}

// ============================================================================
// Scenario D: union discrimination
// ============================================================================

#[test]
fn test_union_string_is_not_coerced() {
    let reader = reader();
    let ty = Type::union([Type::int(), Type::string()]);
    let value = assert_modes_agree(&reader, r#""5""#, &ty);
    assert_eq!(value, CodecValue::String("5".to_string()));
}

#[test]
fn test_union_int_member() {
    let reader = reader();
    let ty = Type::union([Type::int(), Type::string()]);
    let value = assert_modes_agree(&reader, "5", &ty);
    assert_eq!(value, CodecValue::Int(5));
}

#[test]
fn test_union_unmatched_value() {
    let reader = reader();
    let ty = Type::union([Type::int(), Type::string()]);
    for err in [
        reader.read_str("true", &ty).unwrap_err(),
        reader.read_source(source("true"), &ty).unwrap_err(),
    ] {
        match err {
            CodecError::UnexpectedUnionValue { observed, .. } => assert_eq!(observed, "bool"),
            other => panic!("expected UnexpectedUnionValue, got {other}"),
        }
    }
}

// ============================================================================
// Scenario E: missing required property
// ============================================================================

#[test]
fn test_missing_required_property() {
    let reader = reader();
    let ty = Type::object("User");
    for err in [
        reader.read_str(r#"{"id":1}"#, &ty).unwrap_err(),
        reader.read_source(source(r#"{"id":1}"#), &ty).unwrap_err(),
    ] {
        match err {
            CodecError::MissingRequiredProperty { class, property } => {
                assert_eq!(class, "User");
                assert_eq!(property, "name");
            }
            other => panic!("expected MissingRequiredProperty, got {other}"),
        }
    }
}

#[test]
fn test_absent_is_not_null() {
    let reader = reader();
    let ty = Type::object("User");

    let absent = assert_modes_agree(&reader, r#"{"id":1,"name":"ada"}"#, &ty);
    assert!(!absent.as_object().unwrap().contains("email"));
    assert_eq!(prop(&absent, "email"), None);
    assert_eq!(prop(&absent, "active"), Some(CodecValue::Bool(true)));

    let null = assert_modes_agree(&reader, r#"{"id":1,"name":"ada","email":null}"#, &ty);
    assert_eq!(prop(&null, "email"), Some(CodecValue::Null));
}

#[test]
fn test_null_for_required_property() {
    let reader = reader();
    let err = reader
        .read_str(r#"{"id":1,"name":null}"#, &Type::object("User"))
        .unwrap_err();
    match err {
        CodecError::UnexpectedValue { context, .. } => assert_eq!(context, "$.name"),
        other => panic!("expected UnexpectedValue, got {other}"),
    }
}

// ============================================================================
// Scenario F: self-referential class
// ============================================================================

#[test]
fn test_recursive_model_shares_node() {
    let model = DataModelBuilder::new(catalog())
        .build(&Type::object("Node"))
        .unwrap();
    let node_ids: Vec<&str> = model.nodes.keys().map(NodeId::as_str).collect();
    assert_eq!(node_ids.iter().filter(|id| **id == "Node").count(), 1);

    let DataModelNode::Object(node) = &**model.node(&NodeId::new("Node")).unwrap() else {
        panic!("expected object node");
    };
    assert_eq!(
        node.properties["next"].value,
        NodeRef::node(NodeId::new("Node"), true)
    );
}

#[test]
fn test_recursive_decode_two_levels() {
    let reader = reader();
    let ty = Type::object("Node");
    let value = assert_modes_agree(&reader, r#"{"next":{"next":null}}"#, &ty);

    let inner = prop(&value, "next").expect("first level");
    assert_eq!(inner.as_object().unwrap().class(), "Node");
    assert_eq!(prop(&inner, "next"), Some(CodecValue::Null));
    assert_eq!(prop(&inner, "value"), Some(CodecValue::Int(0)));
}

#[test]
fn test_recursive_decode_lazy_levels() {
    let reader = reader();
    let value = reader
        .read_source(
            source(r#"{"value":1,"next":{"value":2,"next":{"value":3,"next":null}}}"#),
            &Type::object("Node"),
        )
        .unwrap();

    let mut values = Vec::new();
    let mut current = Some(value);
    while let Some(node) = current {
        if node.is_null() {
            break;
        }
        values.push(prop(&node, "value").unwrap().as_i64().unwrap());
        current = prop(&node, "next");
    }
    assert_eq!(values, vec![1, 2, 3]);
}
