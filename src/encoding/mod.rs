// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Wire format support.
//!
//! JSON is the only format; see [`json`].

pub mod json;

pub use json::{NativeDecoder, SplitMode, Splitter};
