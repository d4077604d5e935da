// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Type to data model translation.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::core::{CodecError, Result};
use crate::schema::{check_type_name, CollectionType, Type, TypeCatalog, TypeKind};

use super::node::{
    CollectionNode, DataModel, DataModelNode, NodeId, NodeRef, ObjectNode, PropertyInfo,
    RefTarget, ScalarNode,
};

/// Builds [`DataModel`]s from types, resolving classes and enums in a catalog.
#[derive(Debug, Clone)]
pub struct DataModelBuilder {
    catalog: Arc<TypeCatalog>,
}

/// Per-build state.
#[derive(Default)]
struct BuildState {
    nodes: IndexMap<NodeId, Arc<DataModelNode>>,
    /// Nodes whose children are still being visited
    in_progress: HashSet<NodeId>,
}

impl DataModelBuilder {
    /// Create a builder over a catalog.
    pub fn new(catalog: Arc<TypeCatalog>) -> Self {
        Self { catalog }
    }

    /// Build the node graph for `ty`.
    pub fn build(&self, ty: &Type) -> Result<DataModel> {
        let mut state = BuildState::default();
        let root = self.visit(ty, &mut state)?;
        let signature = ty.signature();
        tracing::debug!(
            signature = %signature,
            nodes = state.nodes.len(),
            "Built data model"
        );
        Ok(DataModel {
            root,
            signature,
            nodes: state.nodes,
        })
    }

    fn visit(&self, ty: &Type, state: &mut BuildState) -> Result<NodeRef> {
        if let TypeKind::Union(members) = &ty.kind {
            return self.visit_union(ty, members, state);
        }

        if let Some(class) = ty.class_name() {
            check_type_name(class)?;
        }
        let id = NodeId::new(ty.non_nullable().signature());
        // An in-progress id is a back edge of a recursive type: link, never re-enter.
        if !state.nodes.contains_key(&id) && !state.in_progress.contains(&id) {
            state.in_progress.insert(id.clone());
            let node = self.make_node(ty, state);
            state.in_progress.remove(&id);
            state.nodes.insert(id.clone(), Arc::new(node?));
        }
        Ok(NodeRef::node(id, ty.nullable))
    }

    fn visit_union(&self, ty: &Type, members: &[Type], state: &mut BuildState) -> Result<NodeRef> {
        let signature = ty.signature();
        if members.is_empty() {
            return Err(CodecError::invalid_type(signature, "union has no members"));
        }
        let mut flat = Vec::new();
        let mut wants_null = ty.nullable;
        flatten_union(members, &mut flat, &mut wants_null);

        let mut refs: Vec<NodeRef> = Vec::with_capacity(flat.len() + 1);
        for member in flat {
            let r = self.visit(&member.non_nullable(), state)?;
            if !refs.contains(&r) {
                refs.push(r);
            }
        }
        if wants_null {
            let null = self.visit(&Type::null(), state)?;
            if !refs.contains(&null) {
                refs.push(null);
            }
        }

        if refs.len() == 1 {
            let mut only = refs.remove(0);
            only.nullable = ty.nullable;
            return Ok(only);
        }
        Ok(NodeRef {
            target: RefTarget::Union {
                signature,
                members: refs,
            },
            nullable: false,
        })
    }

    fn make_node(&self, ty: &Type, state: &mut BuildState) -> Result<DataModelNode> {
        let scalar = match &ty.kind {
            TypeKind::Null => ScalarNode::Null,
            TypeKind::Bool => ScalarNode::Bool,
            TypeKind::Int => ScalarNode::Int,
            TypeKind::Float => ScalarNode::Float,
            TypeKind::String => ScalarNode::String,
            TypeKind::Mixed => ScalarNode::Mixed,
            TypeKind::Enum { class, backing } => {
                let def = self.catalog.enum_def(class)?;
                if def.backing != *backing {
                    return Err(CodecError::invalid_type(
                        ty.signature(),
                        format!(
                            "declared {backing:?} backing, registered enum has {:?}",
                            def.backing
                        ),
                    ));
                }
                ScalarNode::Enum(def)
            }
            TypeKind::Object { class } => return self.object_node(class, state),
            TypeKind::Collection(c) => return self.collection_node(ty, c, state),
            TypeKind::Union(_) => {
                return Err(CodecError::invalid_type(
                    ty.signature(),
                    "unions are not nodes",
                ))
            }
        };
        Ok(DataModelNode::Scalar(scalar))
    }

    fn object_node(&self, class: &str, state: &mut BuildState) -> Result<DataModelNode> {
        let def = self.catalog.class(class)?;
        let mut properties = IndexMap::with_capacity(def.properties.len());
        for prop in &def.properties {
            let value = self.visit(&prop.ty, state)?;
            let value_transform = match &prop.transformer {
                Some(name) => Some((name.clone(), self.catalog.transformer(name)?)),
                None => None,
            };
            let info = PropertyInfo {
                target_name: prop.name.clone(),
                value,
                value_transform,
            };
            if properties.insert(prop.encoded_name.clone(), info).is_some() {
                return Err(CodecError::invalid_type(
                    class,
                    format!("duplicate encoded name '{}'", prop.encoded_name),
                ));
            }
        }
        Ok(DataModelNode::Object(ObjectNode {
            class: def.name.clone(),
            properties,
            is_lazy_proxy: def.lazy,
        }))
    }

    fn collection_node(
        &self,
        ty: &Type,
        c: &CollectionType,
        state: &mut BuildState,
    ) -> Result<DataModelNode> {
        let int_keys = match c.key.as_deref() {
            None => false,
            Some(key) if key.nullable => {
                return Err(CodecError::invalid_type(
                    ty.signature(),
                    "collection keys cannot be nullable",
                ))
            }
            Some(Type {
                kind: TypeKind::Int,
                ..
            }) => true,
            Some(Type {
                kind: TypeKind::String,
                ..
            }) if !c.list => false,
            Some(key) => {
                return Err(CodecError::invalid_type(
                    ty.signature(),
                    format!("unsupported key type {}", key.signature()),
                ))
            }
        };
        let item = self.visit(&c.item, state)?;
        Ok(DataModelNode::Collection(CollectionNode {
            item,
            is_list: c.list,
            // List positions are integers already.
            int_keys: int_keys && !c.list,
            iterable: c.iterable,
        }))
    }
}

fn flatten_union(members: &[Type], out: &mut Vec<Type>, wants_null: &mut bool) {
    for member in members {
        if member.nullable {
            *wants_null = true;
        }
        match &member.kind {
            TypeKind::Union(inner) => flatten_union(inner, out, wants_null),
            TypeKind::Null => *wants_null = true,
            _ => out.push(member.non_nullable()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CodecValue;
    use crate::schema::{BackingKind, ClassDef, EnumDef, PropertyDef};

    fn catalog() -> Arc<TypeCatalog> {
        let catalog = TypeCatalog::new();
        catalog
            .register_class(
                ClassDef::new("Node")
                    .property(PropertyDef::new("next", Type::object("Node").nullable())),
            )
            .unwrap();
        catalog
            .register_class(
                ClassDef::new("Pair")
                    .property(PropertyDef::new("left", Type::int()))
                    .property(PropertyDef::new("right", Type::int().nullable()))
                    .property(
                        PropertyDef::new("label", Type::string())
                            .encoded_as("lbl")
                            .with_transformer("upper"),
                    ),
            )
            .unwrap();
        catalog
            .register_enum(EnumDef::int_backed("Level", [("Low", 1), ("High", 2)]))
            .unwrap();
        catalog
            .register_transformer("upper", |v: CodecValue| -> Result<CodecValue> {
                Ok(CodecValue::String(v.as_str().unwrap_or_default().to_uppercase()))
            })
            .unwrap();
        Arc::new(catalog)
    }

    #[test]
    fn test_scalar_model() {
        let model = DataModelBuilder::new(catalog()).build(&Type::int()).unwrap();
        assert_eq!(model.len(), 1);
        assert_eq!(model.root, NodeRef::node(NodeId::new("int"), false));
        assert_eq!(
            **model.node(&NodeId::new("int")).unwrap(),
            DataModelNode::Scalar(ScalarNode::Int)
        );
    }

    #[test]
    fn test_nullable_shares_node() {
        let model = DataModelBuilder::new(catalog())
            .build(&Type::object("Pair"))
            .unwrap();
        // Pair, int (left and ?int right) and string.
        assert_eq!(model.len(), 3);
        let DataModelNode::Object(pair) = &**model.node(&NodeId::new("Pair")).unwrap() else {
            panic!("expected object node");
        };
        assert_eq!(pair.properties["left"].value.target, RefTarget::Node("int".into()));
        assert_eq!(pair.properties["right"].value.target, RefTarget::Node("int".into()));
        assert!(pair.properties["right"].value.nullable);
        assert!(!pair.properties["left"].value.nullable);
    }

    #[test]
    fn test_encoded_names_and_transformers() {
        let model = DataModelBuilder::new(catalog())
            .build(&Type::object("Pair"))
            .unwrap();
        let DataModelNode::Object(pair) = &**model.node(&NodeId::new("Pair")).unwrap() else {
            panic!("expected object node");
        };
        let label = &pair.properties["lbl"];
        assert_eq!(label.target_name, "label");
        assert_eq!(label.value_transform.as_ref().unwrap().0, "upper");
        assert!(pair.is_lazy_proxy);
    }

    #[test]
    fn test_recursive_type_terminates() {
        let model = DataModelBuilder::new(catalog())
            .build(&Type::object("Node"))
            .unwrap();
        assert_eq!(model.len(), 1);
        let DataModelNode::Object(node) = &**model.node(&NodeId::new("Node")).unwrap() else {
            panic!("expected object node");
        };
        assert_eq!(
            node.properties["next"].value,
            NodeRef::node(NodeId::new("Node"), true)
        );
    }

    #[test]
    fn test_union_members() {
        let ty = Type::union(vec![Type::int(), Type::string().nullable()]);
        let model = DataModelBuilder::new(catalog()).build(&ty).unwrap();
        match &model.root.target {
            RefTarget::Union { signature, members } => {
                assert_eq!(signature, "?string|int");
                assert_eq!(members.len(), 3);
                assert_eq!(members[2].target, RefTarget::Node("null".into()));
            }
            other => panic!("expected union, got {other:?}"),
        }
    }

    #[test]
    fn test_union_of_one_collapses() {
        let ty = Type::new(TypeKind::Union(vec![Type::int(), Type::int()])).nullable();
        let model = DataModelBuilder::new(catalog()).build(&ty).unwrap();
        assert!(matches!(model.root.target, RefTarget::Union { .. }));

        let ty = Type::new(TypeKind::Union(vec![Type::int(), Type::int()]));
        let model = DataModelBuilder::new(catalog()).build(&ty).unwrap();
        assert_eq!(model.root, NodeRef::node(NodeId::new("int"), false));
    }

    #[test]
    fn test_empty_union_rejected() {
        let ty = Type::new(TypeKind::Union(Vec::new()));
        let err = DataModelBuilder::new(catalog()).build(&ty).unwrap_err();
        assert!(matches!(err, CodecError::InvalidType { .. }));
    }

    #[test]
    fn test_unknown_class() {
        let err = DataModelBuilder::new(catalog())
            .build(&Type::list(Type::object("Missing")))
            .unwrap_err();
        assert!(matches!(err, CodecError::TypeNotFound { ref type_name } if type_name == "Missing"));
    }

    #[test]
    fn test_class_and_enum_with_one_name() {
        let catalog = catalog();
        catalog
            .register_class(ClassDef::new("Status").property(PropertyDef::new(
                "code",
                Type::enumeration("Status", BackingKind::Int),
            )))
            .unwrap();
        catalog
            .register_enum(EnumDef::int_backed("Status", [("Ok", 1)]))
            .unwrap();
        let model = DataModelBuilder::new(catalog)
            .build(&Type::object("Status"))
            .unwrap();
        assert_eq!(model.len(), 2);
        let DataModelNode::Object(status) = &**model.node(&NodeId::new("Status")).unwrap() else {
            panic!("expected object node");
        };
        assert_eq!(
            status.properties["code"].value,
            NodeRef::node(NodeId::new("enum<Status>"), false)
        );
        assert!(matches!(
            **model.node(&NodeId::new("enum<Status>")).unwrap(),
            DataModelNode::Scalar(ScalarNode::Enum(_))
        ));
    }

    #[test]
    fn test_scalar_named_class_rejected() {
        let err = DataModelBuilder::new(catalog())
            .build(&Type::union(vec![Type::int(), Type::object("int")]))
            .unwrap_err();
        assert!(matches!(err, CodecError::InvalidType { .. }));
    }

    #[test]
    fn test_enum_backing_mismatch() {
        let builder = DataModelBuilder::new(catalog());
        assert!(builder
            .build(&Type::enumeration("Level", BackingKind::Int))
            .is_ok());
        let err = builder
            .build(&Type::enumeration("Level", BackingKind::String))
            .unwrap_err();
        assert!(matches!(err, CodecError::InvalidType { .. }));
    }

    #[test]
    fn test_collection_keys() {
        let builder = DataModelBuilder::new(catalog());
        let model = builder
            .build(&Type::dict_with_key(Type::int(), Type::string()))
            .unwrap();
        let DataModelNode::Collection(c) = &**model.node(&NodeId::new("array<int, string>")).unwrap()
        else {
            panic!("expected collection node");
        };
        assert!(c.int_keys);
        assert!(!c.is_list);

        let err = builder
            .build(&Type::dict_with_key(Type::float(), Type::string()))
            .unwrap_err();
        assert!(matches!(err, CodecError::InvalidType { .. }));
    }
}
