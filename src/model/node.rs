// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Data model nodes.
//!
//! One node exists per distinct non-union, non-nullable type signature. Nodes
//! point at each other through [`NodeRef`]s, which carry the nullability of
//! the referencing site, so the same node serves `Foo` and `?Foo`.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::schema::{EnumDef, ValueTransformer};

/// Identifier of a node: the signature of its non-nullable type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(String);

impl NodeId {
    /// Wrap a signature.
    pub fn new(signature: impl Into<String>) -> Self {
        Self(signature.into())
    }

    /// The signature text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A use of a node or union at one call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRef {
    /// What is decoded
    pub target: RefTarget,
    /// Whether this site accepts `null`
    pub nullable: bool,
}

impl NodeRef {
    /// Reference to a node.
    pub fn node(id: NodeId, nullable: bool) -> Self {
        Self {
            target: RefTarget::Node(id),
            nullable,
        }
    }
}

/// Target of a [`NodeRef`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefTarget {
    Node(NodeId),
    /// Union members in declaration order; ordering is the program's concern
    Union {
        /// Signature of the union type
        signature: String,
        /// Member references; a nullable union carries an explicit null member
        members: Vec<NodeRef>,
    },
}

/// Scalar shapes.
#[derive(Debug, Clone)]
pub enum ScalarNode {
    Null,
    Bool,
    Int,
    Float,
    String,
    /// Any JSON value
    Mixed,
    /// Enum resolved from the catalog
    Enum(Arc<EnumDef>),
}

impl ScalarNode {
    /// Short label used in program listings.
    pub fn label(&self) -> &str {
        match self {
            ScalarNode::Null => "null",
            ScalarNode::Bool => "bool",
            ScalarNode::Int => "int",
            ScalarNode::Float => "float",
            ScalarNode::String => "string",
            ScalarNode::Mixed => "mixed",
            ScalarNode::Enum(def) => &def.name,
        }
    }
}

impl PartialEq for ScalarNode {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ScalarNode::Enum(a), ScalarNode::Enum(b)) => a.name == b.name,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

/// A list or dict of one item shape.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionNode {
    /// Item reference
    pub item: NodeRef,
    /// List when true, dict when false
    pub is_list: bool,
    /// Dict keys must parse as integers
    pub int_keys: bool,
    /// Declared as an iterable rather than a concrete container
    pub iterable: bool,
}

/// A declared property of an object node.
#[derive(Clone)]
pub struct PropertyInfo {
    /// Property name on the constructed value
    pub target_name: String,
    /// Value reference
    pub value: NodeRef,
    /// Post-decode mapping, with its registered name
    pub value_transform: Option<(String, Arc<dyn ValueTransformer>)>,
}

impl fmt::Debug for PropertyInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyInfo")
            .field("target_name", &self.target_name)
            .field("value", &self.value)
            .field(
                "value_transform",
                &self.value_transform.as_ref().map(|(name, _)| name),
            )
            .finish()
    }
}

impl PartialEq for PropertyInfo {
    fn eq(&self, other: &Self) -> bool {
        self.target_name == other.target_name
            && self.value == other.value
            && self.value_transform.as_ref().map(|(n, _)| n)
                == other.value_transform.as_ref().map(|(n, _)| n)
    }
}

/// A class node.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectNode {
    /// Class identity
    pub class: String,
    /// Properties keyed by encoded (JSON) name, in declaration order
    pub properties: IndexMap<String, PropertyInfo>,
    /// Lazy programs return a proxy for this class
    pub is_lazy_proxy: bool,
}

/// A data model node.
#[derive(Debug, Clone, PartialEq)]
pub enum DataModelNode {
    Scalar(ScalarNode),
    Collection(CollectionNode),
    Object(ObjectNode),
}

impl DataModelNode {
    /// Short kind label.
    pub fn kind(&self) -> &'static str {
        match self {
            DataModelNode::Scalar(_) => "scalar",
            DataModelNode::Collection(_) => "collection",
            DataModelNode::Object(_) => "object",
        }
    }
}

/// The node graph built for one type.
#[derive(Debug, Clone)]
pub struct DataModel {
    /// Entry reference
    pub root: NodeRef,
    /// Signature of the type the model was built for
    pub signature: String,
    /// Every node, shared by identifier
    pub nodes: IndexMap<NodeId, Arc<DataModelNode>>,
}

impl DataModel {
    /// Look up a node.
    pub fn node(&self, id: &NodeId) -> Option<&Arc<DataModelNode>> {
        self.nodes.get(id)
    }

    /// Number of distinct nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the model has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
