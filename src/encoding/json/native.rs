// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # Native JSON decoder
//!
//! The only place that runs a full JSON grammar parser. Everything else in
//! the pipeline either walks values this decoder produced (immediate mode)
//! or hands it the exact byte range of one value (lazy mode).
//!
//! ## Example
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use jsonplan::encoding::json::NativeDecoder;
//!
//! let decoder = NativeDecoder::new();
//! let value = decoder.decode_text(r#"{"x": 1, "y": 2}"#)?;
//! assert_eq!(value["y"], 2);
//! # Ok(())
//! # }
//! ```

use crate::core::{DecodeOptions, Result as CoreResult};
use crate::io::source::{read_range, Boundary, ByteSource};
use crate::CodecError;

/// Runtime type name of a raw JSON value, as reported in errors.
pub fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(n) if n.is_i64() => "int",
        serde_json::Value::Number(n) if n.is_u64() => "int (out of range)",
        serde_json::Value::Number(_) => "float",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "list",
        serde_json::Value::Object(_) => "dict",
    }
}

/// JSON decoder for whole texts and byte ranges.
#[derive(Debug, Clone)]
pub struct NativeDecoder {
    /// Bytes of offending input quoted in errors
    max_snippet: usize,
}

impl NativeDecoder {
    /// Create a new JSON decoder.
    pub fn new() -> Self {
        Self::with_options(&DecodeOptions::default())
    }

    /// Create a decoder using the snippet length from `options`.
    pub fn with_options(options: &DecodeOptions) -> Self {
        Self {
            max_snippet: options.max_snippet,
        }
    }

    /// Decode a complete JSON text.
    ///
    /// # Arguments
    ///
    /// * `text` - The JSON string to decode
    pub fn decode_text(&self, text: &str) -> CoreResult<serde_json::Value> {
        self.decode_bytes(text.as_bytes(), Boundary::new(0, Some(text.len())))
    }

    /// Decode JSON bytes that were read from `range`.
    ///
    /// # Arguments
    ///
    /// * `data` - The JSON bytes to decode
    /// * `range` - Where `data` came from, for diagnostics
    pub fn decode_bytes(&self, data: &[u8], range: Boundary) -> CoreResult<serde_json::Value> {
        serde_json::from_slice(data)
            .map_err(|e| CodecError::malformed(range, e.to_string(), data, self.max_snippet))
    }

    /// Decode the value stored at `boundary` in a byte source.
    ///
    /// # Arguments
    ///
    /// * `source` - The byte source
    /// * `boundary` - Offset and optional length of the value
    pub fn decode_range(
        &self,
        source: &dyn ByteSource,
        boundary: Boundary,
    ) -> CoreResult<serde_json::Value> {
        let end = boundary.end(source.len());
        let range = Boundary::new(boundary.offset, Some(end.saturating_sub(boundary.offset)));
        if let Some(data) = source.as_slice() {
            let data = data.get(boundary.offset..end).unwrap_or_default();
            return self.decode_bytes(data, range);
        }
        let data = read_range(source, boundary)?;
        self.decode_bytes(&data, range)
    }

    /// Decode a JSON string literal, quotes included.
    pub fn decode_key(&self, data: &[u8], range: Boundary) -> CoreResult<String> {
        serde_json::from_slice(data)
            .map_err(|e| CodecError::malformed(range, e.to_string(), data, self.max_snippet))
    }
}

impl Default for NativeDecoder {
    fn default() -> Self {
        Self::new()
    }
}
