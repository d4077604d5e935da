// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Decode configuration.
//!
//! Options can be built in code or loaded from a TOML document:
//!
//! ```toml
//! chunk_size = 16384
//! max_depth = 128
//! ```

use serde::Deserialize;

use super::error::{CodecError, Result};

/// Default number of bytes the splitter reads per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Default nesting limit enforced while splitting.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Default number of input bytes quoted in malformed input errors.
pub const DEFAULT_MAX_SNIPPET: usize = 64;

/// Options shared by every decode call of a program.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecodeOptions {
    /// Bytes pulled from a byte source per read while splitting
    pub chunk_size: usize,
    /// Maximum bracket nesting accepted by the splitter
    pub max_depth: usize,
    /// Bytes of offending input quoted in errors
    pub max_snippet: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
            max_snippet: DEFAULT_MAX_SNIPPET,
        }
    }
}

impl DecodeOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from TOML, filling unspecified keys with defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let options: DecodeOptions = toml::from_str(text).map_err(|e| {
            CodecError::invalid_type("DecodeOptions", format!("invalid TOML: {e}"))
        })?;
        options.validate()?;
        Ok(options)
    }

    /// Set the splitter chunk size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the nesting limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Check that the options are usable.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(CodecError::invalid_type(
                "DecodeOptions",
                "chunk_size must be greater than 0",
            ));
        }
        if self.max_depth == 0 {
            return Err(CodecError::invalid_type(
                "DecodeOptions",
                "max_depth must be greater than 0",
            ));
        }
        Ok(())
    }
}
