// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! JSON decoding primitives.
//!
//! - [`native`] - full-grammar decoding of a text or a byte range
//! - [`splitter`] - child boundary scanning for lists and objects

pub mod native;
pub mod splitter;

pub use native::{json_type_name, NativeDecoder};
pub use splitter::{Boundaries, BoundaryIter, SplitMode, Splitter};
