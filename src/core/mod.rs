// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core types used throughout jsonplan.
//!
//! This module provides the foundational types for the library:
//! - [`CodecError`] - Error handling for build and decode
//! - [`CodecValue`] - Decoded value representation, eager and lazy
//! - [`Thunk`] - Deferred, memoized property computation
//! - [`DecodeOptions`] - Decode configuration

pub mod config;
pub mod error;
pub mod thunk;
pub mod value;

pub use config::DecodeOptions;
pub use error::{CodecError, Result};
pub use thunk::Thunk;
pub use value::{
    CodecValue, EnumValue, Key, LazySequence, ObjectValue, PropertySlot, SequenceIter,
    SequenceSource,
};
