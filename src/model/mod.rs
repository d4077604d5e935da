// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Data model: the node graph a program is compiled against.
//!
//! [`DataModelBuilder`] turns a [`Type`](crate::schema::Type) into a
//! [`DataModel`]. Each distinct non-nullable signature becomes exactly one
//! [`DataModelNode`], shared by every reference to it. Recursive classes are
//! terminated by linking back to a node that is still being built.
//!
//! # Example
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use jsonplan::model::DataModelBuilder;
//! use jsonplan::schema::{ClassDef, PropertyDef, Type, TypeCatalog};
//!
//! let catalog = TypeCatalog::new();
//! catalog.register_class(
//!     ClassDef::new("Node").property(PropertyDef::new("next", Type::object("Node").nullable())),
//! )?;
//!
//! let model = DataModelBuilder::new(Arc::new(catalog)).build(&Type::object("Node"))?;
//! assert_eq!(model.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod node;

pub use builder::DataModelBuilder;
pub use node::{
    CollectionNode, DataModel, DataModelNode, NodeId, NodeRef, ObjectNode, PropertyInfo,
    RefTarget, ScalarNode,
};
