// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Program generation from a data model.
//!
//! The builder walks the node graph from the root and binds one provider per
//! node. A node is emitted at most once per pass: the `emitted` set is
//! updated before a node's children are visited, which is what terminates
//! recursive classes.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::core::{CodecError, Result};
use crate::model::{DataModel, DataModelNode, NodeId, NodeRef, RefTarget, ScalarNode};

use super::plan::{
    DecodeMode, Program, PropertyBinding, Provider, Target, UnionChain, Validator, ValueRef,
};

/// State of one build pass.
#[derive(Debug, Default)]
pub struct BuildContext {
    emitted: HashSet<NodeId>,
    order: Vec<NodeId>,
    providers: IndexMap<NodeId, Provider>,
    unions: HashMap<String, Arc<UnionChain>>,
}

impl BuildContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a provider for `id` was already emitted in this pass.
    pub fn is_emitted(&self, id: &NodeId) -> bool {
        self.emitted.contains(id)
    }

    /// Providers bound so far.
    pub fn providers(&self) -> &IndexMap<NodeId, Provider> {
        &self.providers
    }
}

/// Builds [`Program`]s for one decode mode.
#[derive(Debug, Clone, Copy)]
pub struct ProgramBuilder {
    mode: DecodeMode,
}

impl ProgramBuilder {
    /// Create a builder for `mode`.
    pub fn new(mode: DecodeMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> DecodeMode {
        self.mode
    }

    /// Build a complete program for a data model.
    pub fn build(&self, model: &DataModel) -> Result<Program> {
        let mut ctx = BuildContext::new();
        let entry = self.value_ref(model, &model.root, &mut ctx)?;
        tracing::debug!(
            signature = %model.signature,
            mode = %self.mode,
            providers = ctx.providers.len(),
            "Built program"
        );
        Ok(Program::new(
            model.signature.clone(),
            self.mode,
            entry,
            ctx.providers,
        ))
    }

    /// Emit the provider for `id` and everything it references.
    ///
    /// Returns the identifiers emitted by this call, in emission order; empty
    /// if `id` was already emitted in this pass.
    pub fn build_node(
        &self,
        model: &DataModel,
        id: &NodeId,
        ctx: &mut BuildContext,
    ) -> Result<Vec<NodeId>> {
        if !ctx.emitted.insert(id.clone()) {
            return Ok(Vec::new());
        }
        let start = ctx.order.len();
        ctx.order.push(id.clone());

        let node = model
            .node(id)
            .ok_or_else(|| CodecError::type_not_found(id.as_str()))?;

        let provider = match &**node {
            DataModelNode::Scalar(scalar) => match scalar {
                ScalarNode::Null => Provider::Null,
                ScalarNode::Bool => Provider::Bool,
                ScalarNode::Int => Provider::Int,
                ScalarNode::Float => Provider::Float,
                ScalarNode::String => Provider::String,
                ScalarNode::Mixed => Provider::Mixed,
                ScalarNode::Enum(def) => Provider::Enum(Arc::clone(def)),
            },
            DataModelNode::Collection(c) => Provider::Collection {
                item: self.value_ref(model, &c.item, ctx)?,
                is_list: c.is_list,
                int_keys: c.int_keys,
                iterable: c.iterable,
            },
            DataModelNode::Object(o) => {
                let mut properties = IndexMap::with_capacity(o.properties.len());
                for (encoded, info) in &o.properties {
                    let binding = PropertyBinding {
                        target_name: info.target_name.clone(),
                        value: self.value_ref(model, &info.value, ctx)?,
                        transform: info.value_transform.clone(),
                    };
                    properties.insert(encoded.clone(), binding);
                }
                Provider::Object {
                    class: o.class.clone(),
                    properties,
                    lazy_proxy: o.is_lazy_proxy && self.mode == DecodeMode::Lazy,
                }
            }
        };

        tracing::trace!(node = %id, provider = %provider, "Emitted provider");
        ctx.providers.insert(id.clone(), provider);
        Ok(ctx.order[start..].to_vec())
    }

    fn value_ref(
        &self,
        model: &DataModel,
        r: &NodeRef,
        ctx: &mut BuildContext,
    ) -> Result<ValueRef> {
        let target = match &r.target {
            RefTarget::Node(id) => {
                self.build_node(model, id, ctx)?;
                Target::Provider(id.clone())
            }
            RefTarget::Union { signature, members } => {
                Target::Union(self.union_chain(model, signature, members, ctx)?)
            }
        };
        Ok(ValueRef {
            target,
            nullable: r.nullable,
        })
    }

    fn union_chain(
        &self,
        model: &DataModel,
        signature: &str,
        members: &[NodeRef],
        ctx: &mut BuildContext,
    ) -> Result<Arc<UnionChain>> {
        if let Some(chain) = ctx.unions.get(signature) {
            return Ok(Arc::clone(chain));
        }

        let mut ranked = Vec::with_capacity(members.len());
        for member in members {
            let (id, validator) = validator_for(model, signature, member)?;
            ranked.push((id, validator, self.value_ref(model, member, ctx)?));
        }
        // Equal ranks order by node id, so the chain depends only on the signature.
        ranked.sort_by(|(a_id, a, _), (b_id, b, _)| {
            a.rank()
                .cmp(&b.rank())
                .then_with(|| a_id.as_str().cmp(b_id.as_str()))
        });
        let mut ordered: Vec<(Validator, ValueRef)> =
            ranked.into_iter().map(|(_, v, r)| (v, r)).collect();

        let (default_validator, default) = ordered
            .pop()
            .ok_or_else(|| CodecError::invalid_type(signature, "union has no members"))?;
        let default_guard = (!default_validator.is_open()).then_some(default_validator);

        let chain = Arc::new(UnionChain {
            signature: signature.to_string(),
            members: ordered,
            default,
            default_guard,
        });
        ctx.unions.insert(signature.to_string(), Arc::clone(&chain));
        Ok(chain)
    }
}

fn validator_for(
    model: &DataModel,
    signature: &str,
    member: &NodeRef,
) -> Result<(NodeId, Validator)> {
    let id = match &member.target {
        RefTarget::Node(id) => id,
        RefTarget::Union { .. } => {
            return Err(CodecError::invalid_type(signature, "nested union member"))
        }
    };
    let node = model
        .node(id)
        .ok_or_else(|| CodecError::type_not_found(id.as_str()))?;
    let validator = match &**node {
        DataModelNode::Scalar(scalar) => match scalar {
            ScalarNode::Null => Validator::Null,
            ScalarNode::Bool => Validator::Bool,
            ScalarNode::Int => Validator::Int,
            ScalarNode::Float => Validator::Float,
            ScalarNode::String => Validator::String,
            ScalarNode::Mixed => Validator::Mixed,
            ScalarNode::Enum(def) => Validator::Enum(Arc::clone(def)),
        },
        DataModelNode::Collection(c) if c.is_list => Validator::List,
        DataModelNode::Collection(_) => Validator::Dict,
        DataModelNode::Object(o) => Validator::Object(o.class.clone()),
    };
    Ok((id.clone(), validator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DataModelBuilder;
    use crate::schema::{ClassDef, EnumDef, PropertyDef, Type, TypeCatalog};

    fn catalog() -> Arc<TypeCatalog> {
        let catalog = TypeCatalog::new();
        catalog
            .register_class(
                ClassDef::new("Node")
                    .property(PropertyDef::new("next", Type::object("Node").nullable()))
                    .property(PropertyDef::new("tags", Type::list(Type::string()))),
            )
            .unwrap();
        catalog
            .register_class(ClassDef::new("Point").eager())
            .unwrap();
        catalog
            .register_enum(EnumDef::int_backed("Level", [("Low", 1), ("High", 2)]))
            .unwrap();
        Arc::new(catalog)
    }

    fn program(ty: &Type, mode: DecodeMode) -> Program {
        let model = DataModelBuilder::new(catalog()).build(ty).unwrap();
        ProgramBuilder::new(mode).build(&model).unwrap()
    }

    fn chain(program: &Program) -> Arc<UnionChain> {
        match &program.entry().target {
            Target::Union(chain) => Arc::clone(chain),
            other => panic!("expected union entry, got {other:?}"),
        }
    }

    #[test]
    fn test_list_program() {
        let program = program(&Type::list(Type::int()), DecodeMode::Immediate);
        assert_eq!(program.len(), 2);
        assert_eq!(program.signature(), "list<int>");
        let ids: Vec<_> = program.node_ids().map(NodeId::as_str).collect();
        assert_eq!(ids, vec!["int", "list<int>"]);
        assert_eq!(
            program.provider(&NodeId::new("list<int>")).unwrap(),
            &Provider::Collection {
                item: ValueRef {
                    target: Target::Provider(NodeId::new("int")),
                    nullable: false,
                },
                is_list: true,
                int_keys: false,
                iterable: false,
            }
        );
    }

    #[test]
    fn test_recursive_program() {
        let program = program(&Type::object("Node").nullable(), DecodeMode::Lazy);
        assert!(program.entry().nullable);
        // Node, list<string>, string
        assert_eq!(program.len(), 3);
        match program.provider(&NodeId::new("Node")).unwrap() {
            Provider::Object {
                properties,
                lazy_proxy,
                ..
            } => {
                assert!(*lazy_proxy);
                assert_eq!(
                    properties["next"].value.target,
                    Target::Provider(NodeId::new("Node"))
                );
                assert!(properties["next"].value.nullable);
            }
            other => panic!("expected object provider, got {other:?}"),
        }
    }

    #[test]
    fn test_build_node_is_idempotent() {
        let model = DataModelBuilder::new(catalog())
            .build(&Type::object("Node"))
            .unwrap();
        let builder = ProgramBuilder::new(DecodeMode::Immediate);
        let mut ctx = BuildContext::new();
        let first = builder
            .build_node(&model, &NodeId::new("Node"), &mut ctx)
            .unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(first[0], NodeId::new("Node"));
        assert!(ctx.is_emitted(&NodeId::new("string")));

        let second = builder
            .build_node(&model, &NodeId::new("Node"), &mut ctx)
            .unwrap();
        assert!(second.is_empty());
        assert_eq!(ctx.providers().len(), 3);
    }

    #[test]
    fn test_proxy_only_in_lazy_mode() {
        let immediate = program(&Type::object("Node"), DecodeMode::Immediate);
        assert!(matches!(
            immediate.provider(&NodeId::new("Node")).unwrap(),
            Provider::Object { lazy_proxy: false, .. }
        ));

        let eager_class = program(&Type::object("Point"), DecodeMode::Lazy);
        assert!(matches!(
            eager_class.provider(&NodeId::new("Point")).unwrap(),
            Provider::Object { lazy_proxy: false, .. }
        ));
    }

    #[test]
    fn test_union_precedence() {
        let ty = Type::union(vec![
            Type::string(),
            Type::int(),
            Type::list(Type::int()),
            Type::enumeration("Level", crate::schema::BackingKind::Int),
        ])
        .nullable();
        let program = program(&ty, DecodeMode::Immediate);
        let chain = chain(&program);
        let validators: Vec<String> = chain.members.iter().map(|(v, _)| v.to_string()).collect();
        assert_eq!(
            validators,
            vec!["is_case(Level)", "is_null", "is_list", "is_int"]
        );
        assert_eq!(
            chain.default.target,
            Target::Provider(NodeId::new("string"))
        );
        assert_eq!(chain.default_guard, Some(Validator::String));
    }

    #[test]
    fn test_union_object_default_is_unguarded() {
        let ty = Type::union(vec![Type::object("Point"), Type::int()]);
        let program = program(&ty, DecodeMode::Immediate);
        let chain = chain(&program);
        assert_eq!(chain.members.len(), 1);
        assert_eq!(chain.default.target, Target::Provider(NodeId::new("Point")));
        assert!(chain.default_guard.is_none());
    }

    #[test]
    fn test_equal_ranks_order_by_node_id() {
        let forward = program(
            &Type::union(vec![Type::object("Point"), Type::object("Node")]),
            DecodeMode::Immediate,
        );
        let reverse = program(
            &Type::union(vec![Type::object("Node"), Type::object("Point")]),
            DecodeMode::Immediate,
        );
        for program in [&forward, &reverse] {
            let chain = chain(program);
            let validators: Vec<String> =
                chain.members.iter().map(|(v, _)| v.to_string()).collect();
            assert_eq!(validators, vec!["instance_of(Node)"]);
            assert_eq!(chain.default.target, Target::Provider(NodeId::new("Point")));
        }
    }

    #[test]
    fn test_shared_union_chain() {
        let catalog = catalog();
        catalog
            .register_class(
                ClassDef::new("Cell")
                    .property(PropertyDef::new("a", Type::union(vec![Type::int(), Type::string()])))
                    .property(PropertyDef::new("b", Type::union(vec![Type::string(), Type::int()]))),
            )
            .unwrap();
        let model = DataModelBuilder::new(catalog)
            .build(&Type::object("Cell"))
            .unwrap();
        let program = ProgramBuilder::new(DecodeMode::Immediate)
            .build(&model)
            .unwrap();
        let Provider::Object { properties, .. } = program.provider(&NodeId::new("Cell")).unwrap()
        else {
            panic!("expected object provider");
        };
        match (&properties["a"].value.target, &properties["b"].value.target) {
            (Target::Union(a), Target::Union(b)) => assert!(Arc::ptr_eq(a, b)),
            other => panic!("expected unions, got {other:?}"),
        }
    }
}
