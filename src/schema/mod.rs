// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Type descriptions for the decode pipeline.
//!
//! This module provides:
//! - [`Type`] - the canonical description of a value shape
//! - [`TypeCatalog`] - registered classes, enums and value transformers

pub mod ast;
pub mod catalog;

pub use ast::{check_type_name, BackingKind, CollectionType, Type, TypeKind};
pub use catalog::{
    ClassDef, EnumBacking, EnumCase, EnumDef, PropertyDef, TypeCatalog, ValueTransformer,
};
