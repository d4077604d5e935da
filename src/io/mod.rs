// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! I/O layer for lazy decoding.
//!
//! This module provides the byte sources a lazy program reads from.

pub mod source;

// Re-exports
pub use source::{read_range, Boundary, ByteSource, FileSource, MmapSource};
