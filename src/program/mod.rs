// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Decode programs: building, running and caching.
//!
//! - [`plan`] - providers, union chains and the [`Program`] table
//! - [`builder`] - [`ProgramBuilder`], one provider per data model node
//! - [`runtime`] - immediate and lazy execution
//! - [`cache`] - [`ProgramCache`] keyed by signature and mode
//!
//! # Example
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use jsonplan::model::DataModelBuilder;
//! use jsonplan::program::{DecodeMode, ProgramBuilder, Runtime};
//! use jsonplan::schema::{Type, TypeCatalog};
//!
//! let catalog = Arc::new(TypeCatalog::new());
//! let model = DataModelBuilder::new(Arc::clone(&catalog)).build(&Type::list(Type::int()))?;
//! let program = ProgramBuilder::new(DecodeMode::Immediate).build(&model)?;
//!
//! let value = program.run_text("[1,2,3]", &Runtime::from_catalog(catalog))?;
//! assert_eq!(value.as_list().map(|items| items.len()), Some(3));
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod cache;
pub mod plan;
pub mod runtime;

pub use builder::{BuildContext, ProgramBuilder};
pub use cache::ProgramCache;
pub use plan::{
    cache_key, DecodeMode, Program, PropertyBinding, Provider, Target, UnionChain, Validator,
    ValueRef,
};
pub use runtime::Runtime;
