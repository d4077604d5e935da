// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # jsonplan
//!
//! Type-directed JSON decoding through reusable decode programs.
//!
//! A [`Type`] describes the value shape to produce. The pipeline turns it into
//! a program once and runs that program for every input:
//!
//! `Type -> DataModelBuilder -> DataModel -> ProgramBuilder(mode) -> Program -> run`
//!
//! Two modes are supported:
//! - **Immediate** - decode a complete text and materialize the whole result
//! - **Lazy** - return proxies from a seekable byte source; nested values are
//!   decoded on first access, and values never read are never decoded
//!
//! ## Architecture
//!
//! - `core/` - values, errors, options, memoized thunks
//! - `schema/` - the [`Type`] contract and the class/enum [`TypeCatalog`]
//! - `io/` - byte sources and [`Boundary`] ranges
//! - `encoding/json/` - native decoder and the boundary splitter
//! - `model/` - the node graph built from a type
//! - `program/` - providers, program building, execution and caching
//! - `instantiate/` - eager and lazy result construction
//! - `reader` - the [`JsonReader`] facade
//!
//! ## Example: Lazy decoding
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use jsonplan::schema::{ClassDef, PropertyDef, Type, TypeCatalog};
//! use jsonplan::JsonReader;
//!
//! let catalog = TypeCatalog::new();
//! catalog.register_class(
//!     ClassDef::new("Event")
//!         .property(PropertyDef::new("kind", Type::string()))
//!         .property(PropertyDef::new("payload", Type::mixed())),
//! )?;
//! let reader = JsonReader::new(Arc::new(catalog));
//!
//! let events = reader.read_file("events.json", &Type::iterable_list(Type::object("Event")))?;
//! for item in events.as_sequence().expect("iterable").iter()? {
//!     let (_, event) = item?;
//!     let event = event.as_object().expect("object");
//!     // Only `kind` is decoded; `payload` stays undecoded bytes.
//!     println!("{:?}", event.get("kind")?);
//! }
//! # Ok(())
//! # }
//! ```

// Core types
pub mod core;

// Re-export core types for convenience
pub use crate::core::{CodecError, CodecValue, DecodeOptions, ObjectValue, Result};

// Type contract and catalog
pub mod schema;

pub use schema::{Type, TypeCatalog};

// Byte sources
pub mod io;

pub use io::{Boundary, ByteSource};

// JSON decoding primitives
pub mod encoding;

// Data model
pub mod model;

// Programs
pub mod program;

pub use program::{DecodeMode, Program};

// Instantiation strategies
pub mod instantiate;

// Facade
pub mod reader;

pub use reader::JsonReader;
