// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! High-level reading facade.
//!
//! [`JsonReader`] ties the pipeline together: it builds data models and
//! programs on first use of a (type, mode) pair, caches the programs, and
//! runs them with catalog-backed instantiators.
//!
//! # Example
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use jsonplan::core::CodecValue;
//! use jsonplan::schema::{ClassDef, PropertyDef, Type, TypeCatalog};
//! use jsonplan::JsonReader;
//!
//! let catalog = TypeCatalog::new();
//! catalog.register_class(
//!     ClassDef::new("User")
//!         .property(PropertyDef::new("id", Type::int()))
//!         .property(PropertyDef::new("name", Type::string())),
//! )?;
//! let reader = JsonReader::new(Arc::new(catalog));
//!
//! let user = reader.read_str(r#"{"id": 1, "name": "ada"}"#, &Type::object("User"))?;
//! let user = user.as_object().expect("object");
//! assert_eq!(user.get("id")?, Some(CodecValue::Int(1)));
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::sync::Arc;

use crate::core::{CodecValue, DecodeOptions, Result};
use crate::instantiate::Instantiators;
use crate::io::{ByteSource, MmapSource};
use crate::model::DataModelBuilder;
use crate::program::{DecodeMode, Program, ProgramBuilder, ProgramCache, Runtime};
use crate::schema::{Type, TypeCatalog};

/// Type-directed JSON reader with a program cache.
#[derive(Debug)]
pub struct JsonReader {
    catalog: Arc<TypeCatalog>,
    runtime: Runtime,
    cache: ProgramCache,
}

impl JsonReader {
    /// Create a reader with default options and catalog instantiators.
    pub fn new(catalog: Arc<TypeCatalog>) -> Self {
        Self {
            runtime: Runtime::from_catalog(Arc::clone(&catalog)),
            catalog,
            cache: ProgramCache::new(),
        }
    }

    /// Create a reader with custom options.
    ///
    /// # Errors
    ///
    /// Returns an error if the options fail validation.
    pub fn with_options(catalog: Arc<TypeCatalog>, options: DecodeOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            runtime: Runtime::new(Instantiators::from_catalog(Arc::clone(&catalog)), options),
            catalog,
            cache: ProgramCache::new(),
        })
    }

    /// Replace the instantiators objects are constructed with.
    pub fn with_instantiators(mut self, instantiators: Instantiators) -> Self {
        self.runtime = Runtime::new(instantiators, self.runtime.options().clone());
        self
    }

    pub fn catalog(&self) -> &Arc<TypeCatalog> {
        &self.catalog
    }

    pub fn options(&self) -> &DecodeOptions {
        self.runtime.options()
    }

    pub fn cache(&self) -> &ProgramCache {
        &self.cache
    }

    /// Get the program for `ty` in `mode`, building it on first use.
    ///
    /// Programs built before the catalog last changed are rebuilt.
    pub fn program(&self, ty: &Type, mode: DecodeMode) -> Result<Program> {
        let signature = ty.signature();
        let generation = self.catalog.generation();
        self.cache.get_or_build_at(generation, &signature, mode, || {
            let model = DataModelBuilder::new(Arc::clone(&self.catalog)).build(ty)?;
            ProgramBuilder::new(mode).build(&model)
        })
    }

    /// Decode a complete text immediately.
    pub fn read_str(&self, text: &str, ty: &Type) -> Result<CodecValue> {
        self.program(ty, DecodeMode::Immediate)?
            .run_text(text, &self.runtime)
    }

    /// Decode a byte source lazily.
    pub fn read_source(&self, source: Arc<dyn ByteSource>, ty: &Type) -> Result<CodecValue> {
        self.program(ty, DecodeMode::Lazy)?
            .run_source(source, &self.runtime)
    }

    /// Memory-map a file and decode it lazily.
    pub fn read_file<P: AsRef<Path>>(&self, path: P, ty: &Type) -> Result<CodecValue> {
        let source = MmapSource::open(path)?;
        self.read_source(Arc::new(source), ty)
    }
}
