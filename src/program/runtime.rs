// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Program execution.
//!
//! Immediate programs decode the whole input once with the native decoder
//! and walk the resulting value. Lazy programs walk byte boundaries instead:
//! objects become proxies whose properties decode on first read, and iterable
//! collections become sequences that decode each item as it is reached.
//!
//! Errors in immediate mode surface from the `run_*` call. In lazy mode an
//! error inside a property or item surfaces when that property is first read
//! or that item is reached, possibly long after the `run_*` call returned.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::core::{
    CodecError, CodecValue, DecodeOptions, Key, LazySequence, Result, SequenceIter,
    SequenceSource, Thunk,
};
use crate::encoding::json::{json_type_name, Boundaries, NativeDecoder, SplitMode, Splitter};
use crate::instantiate::Instantiators;
use crate::io::{Boundary, ByteSource};
use crate::model::NodeId;
use crate::schema::TypeCatalog;

use super::plan::{DecodeMode, Program, Provider, Target, ValueRef};

const ROOT_PATH: &str = "$";

/// Collaborators and options a program runs with.
#[derive(Debug, Clone)]
pub struct Runtime {
    instantiators: Instantiators,
    options: DecodeOptions,
}

impl Runtime {
    /// Create a runtime from instantiators and options.
    pub fn new(instantiators: Instantiators, options: DecodeOptions) -> Self {
        Self {
            instantiators,
            options,
        }
    }

    /// Runtime using catalog instantiators and default options.
    pub fn from_catalog(catalog: Arc<TypeCatalog>) -> Self {
        Self::new(
            Instantiators::from_catalog(catalog),
            DecodeOptions::default(),
        )
    }

    pub fn instantiators(&self) -> &Instantiators {
        &self.instantiators
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }
}

impl Program {
    /// Decode a complete JSON text.
    ///
    /// A lazy program wraps the text in an in-memory source.
    pub fn run_text(&self, text: &str, runtime: &Runtime) -> Result<CodecValue> {
        match self.mode() {
            DecodeMode::Immediate => {
                let raw = NativeDecoder::with_options(&runtime.options).decode_text(text)?;
                self.run_raw(&raw, runtime)
            }
            DecodeMode::Lazy => self.run_source(Arc::new(text.as_bytes().to_vec()), runtime),
        }
    }

    /// Decode the JSON document held by a byte source.
    ///
    /// An immediate program reads and decodes the whole source first.
    pub fn run_source(&self, source: Arc<dyn ByteSource>, runtime: &Runtime) -> Result<CodecValue> {
        tracing::trace!(
            signature = %self.signature(),
            mode = %self.mode(),
            bytes = source.len(),
            "Running program"
        );
        match self.mode() {
            DecodeMode::Immediate => {
                let raw = NativeDecoder::with_options(&runtime.options)
                    .decode_range(source.as_ref(), Boundary::whole())?;
                self.run_raw(&raw, runtime)
            }
            DecodeMode::Lazy => {
                let run = Arc::new(LazyRun::new(self.clone(), runtime.clone(), source));
                run.decode(self.entry(), Boundary::whole(), ROOT_PATH)
            }
        }
    }

    /// Decode an already parsed JSON value, regardless of mode.
    pub fn run_raw(&self, raw: &serde_json::Value, runtime: &Runtime) -> Result<CodecValue> {
        ImmediateRun {
            program: self,
            runtime,
        }
        .decode(self.entry(), raw, ROOT_PATH)
    }
}

// =============================================================================
// Shared pieces
// =============================================================================

/// Outcome of resolving one declared property.
///
/// `Missing` is only ever produced for an absent key, so it cannot collide
/// with any decoded value, `null` included.
enum Resolved {
    Missing,
    Value(CodecValue),
}

impl Resolved {
    fn into_value(self) -> Option<CodecValue> {
        match self {
            Resolved::Missing => None,
            Resolved::Value(v) => Some(v),
        }
    }
}

fn child_path(path: &str, name: &str) -> String {
    format!("{path}.{name}")
}

fn index_path(path: &str, index: usize) -> String {
    format!("{path}[{index}]")
}

fn mismatch(provider: &Provider, raw: &serde_json::Value, path: &str) -> CodecError {
    CodecError::unexpected_value(provider.expected(), json_type_name(raw), path)
}

fn check_int_key(key: &str, path: &str) -> Result<()> {
    key.parse::<i64>()
        .map(|_| ())
        .map_err(|_| CodecError::unexpected_value("int key", format!("\"{key}\""), path))
}

/// Decode a raw value with a scalar provider.
fn decode_scalar(provider: &Provider, raw: &serde_json::Value, path: &str) -> Result<CodecValue> {
    let value = match provider {
        Provider::Null => Some(CodecValue::Null),
        Provider::Bool => raw.as_bool().map(CodecValue::Bool),
        Provider::Int => raw.as_i64().map(CodecValue::Int),
        Provider::Float => raw.as_f64().map(CodecValue::Float),
        Provider::String => raw.as_str().map(|s| CodecValue::String(s.to_string())),
        Provider::Mixed => Some(CodecValue::from_json(raw)),
        Provider::Enum(def) if !raw.is_null() => {
            return def.from_raw(raw).map(CodecValue::Enum);
        }
        Provider::Enum(_) | Provider::Collection { .. } | Provider::Object { .. } => None,
    };
    value.ok_or_else(|| mismatch(provider, raw, path))
}

fn is_scalar(provider: &Provider) -> bool {
    !matches!(
        provider,
        Provider::Collection { .. } | Provider::Object { .. }
    )
}

// =============================================================================
// Immediate mode
// =============================================================================

struct ImmediateRun<'a> {
    program: &'a Program,
    runtime: &'a Runtime,
}

impl ImmediateRun<'_> {
    fn decode(&self, r: &ValueRef, raw: &serde_json::Value, path: &str) -> Result<CodecValue> {
        if r.nullable && raw.is_null() {
            return Ok(CodecValue::Null);
        }
        match &r.target {
            Target::Union(chain) => self.decode(chain.select(raw)?, raw, path),
            Target::Provider(id) => self.run(id, raw, path),
        }
    }

    fn run(&self, id: &NodeId, raw: &serde_json::Value, path: &str) -> Result<CodecValue> {
        let provider = self.program.provider(id)?;
        match provider {
            Provider::Collection {
                item,
                is_list: true,
                ..
            } => {
                let items = raw
                    .as_array()
                    .ok_or_else(|| mismatch(provider, raw, path))?;
                let mut out = Vec::with_capacity(items.len());
                for (idx, value) in items.iter().enumerate() {
                    out.push(self.decode(item, value, &index_path(path, idx))?);
                }
                Ok(CodecValue::List(out))
            }
            Provider::Collection { item, int_keys, .. } => {
                let map = raw
                    .as_object()
                    .ok_or_else(|| mismatch(provider, raw, path))?;
                let mut out = IndexMap::with_capacity(map.len());
                for (key, value) in map {
                    if *int_keys {
                        check_int_key(key, path)?;
                    }
                    let decoded = self.decode(item, value, &child_path(path, key))?;
                    out.insert(key.clone(), decoded);
                }
                Ok(CodecValue::Dict(out))
            }
            Provider::Object {
                class, properties, ..
            } => {
                let map = raw
                    .as_object()
                    .ok_or_else(|| mismatch(provider, raw, path))?;
                let mut resolved = Vec::with_capacity(properties.len());
                for (encoded, binding) in properties {
                    let value = match map.get(encoded) {
                        None => Resolved::Missing,
                        Some(value) => {
                            let decoded =
                                self.decode(&binding.value, value, &child_path(path, encoded))?;
                            Resolved::Value(binding.apply(decoded)?)
                        }
                    };
                    resolved.push((binding.target_name.as_str(), value));
                }
                let values: IndexMap<String, CodecValue> = resolved
                    .into_iter()
                    .filter_map(|(name, r)| r.into_value().map(|v| (name.to_string(), v)))
                    .collect();
                self.runtime
                    .instantiators
                    .eager()
                    .instantiate(class, values)
            }
            scalar => decode_scalar(scalar, raw, path),
        }
    }
}

// =============================================================================
// Lazy mode
// =============================================================================

/// Shared state of one lazy run; captured by every thunk and sequence.
struct LazyRun {
    program: Program,
    runtime: Runtime,
    source: Arc<dyn ByteSource>,
    splitter: Splitter,
    native: NativeDecoder,
}

impl LazyRun {
    fn new(program: Program, runtime: Runtime, source: Arc<dyn ByteSource>) -> Self {
        let splitter = Splitter::new(&runtime.options);
        let native = NativeDecoder::with_options(&runtime.options);
        Self {
            program,
            runtime,
            source,
            splitter,
            native,
        }
    }

    fn decode(self: &Arc<Self>, r: &ValueRef, at: Boundary, path: &str) -> Result<CodecValue> {
        if r.nullable && self.splitter.is_null(self.source.as_ref(), at)? {
            return Ok(CodecValue::Null);
        }
        match &r.target {
            Target::Union(chain) => {
                let raw = self.native.decode_range(self.source.as_ref(), at)?;
                let member = chain.select(&raw)?;
                if member.nullable && raw.is_null() {
                    return Ok(CodecValue::Null);
                }
                // Scalars reuse the value already decoded for discrimination.
                if let Target::Provider(id) = &member.target {
                    let provider = self.program.provider(id)?;
                    if is_scalar(provider) {
                        return decode_scalar(provider, &raw, path);
                    }
                }
                self.decode(member, at, path)
            }
            Target::Provider(id) => self.run(id, at, path),
        }
    }

    fn split(
        &self,
        at: Boundary,
        mode: SplitMode,
        expected: String,
        path: &str,
    ) -> Result<Boundaries> {
        match self.splitter.split(&self.source, at, mode) {
            Ok(Some(boundaries)) => Ok(boundaries),
            Ok(None) => Err(CodecError::unexpected_value(expected, "null", path)),
            Err(CodecError::UnexpectedValue { observed, .. }) => {
                Err(CodecError::unexpected_value(expected, observed, path))
            }
            Err(e) => Err(e),
        }
    }

    fn run(self: &Arc<Self>, id: &NodeId, at: Boundary, path: &str) -> Result<CodecValue> {
        let provider = self.program.provider(id)?;
        match provider {
            Provider::Null => Ok(CodecValue::Null),
            Provider::Collection {
                item,
                is_list,
                int_keys,
                iterable,
            } => {
                let mode = if *is_list {
                    SplitMode::List
                } else {
                    SplitMode::Dict
                };
                let items = LazyItems {
                    boundaries: self.split(at, mode, provider.expected(), path)?,
                    run: Arc::clone(self),
                    item: item.clone(),
                    is_list: *is_list,
                    int_keys: *int_keys,
                    path: path.to_string(),
                };
                if *iterable {
                    Ok(CodecValue::Sequence(LazySequence::new(Arc::new(items))))
                } else {
                    items.drain()
                }
            }
            Provider::Object {
                class,
                properties,
                lazy_proxy,
            } => {
                let boundaries = self.split(at, SplitMode::Dict, class.clone(), path)?;
                let mut found: HashMap<String, Boundary> = HashMap::new();
                for entry in boundaries.iter() {
                    let (key, child) = entry?;
                    if let Key::Name(name) = key {
                        if properties.contains_key(&name) {
                            found.insert(name, child);
                        }
                    }
                }
                tracing::trace!(class = %class, path, present = found.len(), "Binding properties");

                let mut thunks = IndexMap::with_capacity(found.len());
                for (encoded, binding) in properties {
                    let Some(child) = found.remove(encoded) else {
                        continue;
                    };
                    let name = binding.target_name.clone();
                    let run = Arc::clone(self);
                    let binding = binding.clone();
                    let prop_path = child_path(path, encoded);
                    let thunk = Thunk::new(move || {
                        let value = run.decode(&binding.value, child, &prop_path)?;
                        binding.apply(value)
                    });
                    thunks.insert(name, thunk);
                }

                let instantiators = &self.runtime.instantiators;
                if *lazy_proxy {
                    instantiators.lazy().instantiate(class, thunks)
                } else {
                    let mut values = IndexMap::with_capacity(thunks.len());
                    for (name, thunk) in thunks {
                        values.insert(name, thunk.force()?);
                    }
                    instantiators.eager().instantiate(class, values)
                }
            }
            scalar => {
                let raw = self.native.decode_range(self.source.as_ref(), at)?;
                decode_scalar(scalar, &raw, path)
            }
        }
    }
}

/// Items of one list or dict in lazy mode.
struct LazyItems {
    run: Arc<LazyRun>,
    boundaries: Boundaries,
    item: ValueRef,
    is_list: bool,
    int_keys: bool,
    path: String,
}

impl LazyItems {
    fn decode_item(&self, key: Key, at: Boundary) -> Result<(Key, CodecValue)> {
        let path = match &key {
            Key::Index(idx) => index_path(&self.path, *idx),
            Key::Name(name) => {
                if self.int_keys {
                    check_int_key(name, &self.path)?;
                }
                child_path(&self.path, name)
            }
        };
        let value = self.run.decode(&self.item, at, &path)?;
        Ok((key, value))
    }

    /// Decode every item into a concrete container.
    fn drain(&self) -> Result<CodecValue> {
        if self.is_list {
            let mut out = Vec::new();
            for entry in self.boundaries.iter() {
                let (key, at) = entry?;
                out.push(self.decode_item(key, at)?.1);
            }
            Ok(CodecValue::List(out))
        } else {
            let mut out = IndexMap::new();
            for entry in self.boundaries.iter() {
                let (key, at) = entry?;
                let (key, value) = self.decode_item(key, at)?;
                out.insert(key.to_string(), value);
            }
            Ok(CodecValue::Dict(out))
        }
    }
}

impl SequenceSource for LazyItems {
    fn is_list(&self) -> bool {
        self.is_list
    }

    fn items(&self) -> Result<SequenceIter<'_>> {
        Ok(Box::new(self.boundaries.iter().map(move |entry| {
            let (key, at) = entry?;
            self.decode_item(key, at)
        })))
    }
}

impl fmt::Debug for LazyItems {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyItems")
            .field("range", &self.boundaries.range())
            .field("item", &self.item)
            .field("path", &self.path)
            .finish()
    }
}
