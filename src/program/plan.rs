// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Decode programs.
//!
//! A program is a table of decode providers, one per data model node, plus an
//! entry reference. Programs are built once per (type signature, mode) and
//! shared freely; running one never mutates it.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use sha2::{Digest, Sha256};

use crate::core::{CodecError, Result};
use crate::model::NodeId;
use crate::schema::{EnumDef, ValueTransformer};

/// Execution strategy of a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeMode {
    /// Fully materialize from a complete text
    Immediate,
    /// Return proxies and sequences that decode from a byte source on demand
    Lazy,
}

impl DecodeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecodeMode::Immediate => "immediate",
            DecodeMode::Lazy => "lazy",
        }
    }
}

impl fmt::Display for DecodeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque cache key for a (signature, mode) pair: SHA-256, hex encoded.
pub fn cache_key(signature: &str, mode: DecodeMode) -> String {
    let mut hasher = Sha256::new();
    hasher.update(signature.as_bytes());
    hasher.update([0u8]);
    hasher.update(mode.as_str().as_bytes());
    hex::encode(hasher.finalize())
}

// =============================================================================
// Value references and unions
// =============================================================================

/// A use of a provider or union at one call site.
///
/// The null guard lives here rather than in the provider, so a shared
/// provider serves both nullable and non-nullable sites.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueRef {
    /// What is decoded
    pub target: Target,
    /// Short-circuit a JSON `null` to null before running the target
    pub nullable: bool,
}

/// Target of a [`ValueRef`].
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Provider(NodeId),
    Union(Arc<UnionChain>),
}

impl fmt::Display for ValueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            f.write_str("?")?;
        }
        match &self.target {
            Target::Provider(id) => write!(f, "@{id}"),
            Target::Union(chain) => write!(f, "union({})", chain.signature),
        }
    }
}

/// Runtime type check for union discrimination.
#[derive(Debug, Clone, PartialEq)]
pub enum Validator {
    /// Raw value matches a case of the enum
    Enum(Arc<EnumDef>),
    Null,
    List,
    Dict,
    Bool,
    /// Integer that fits in `i64`
    Int,
    /// Any number
    Float,
    String,
    /// Any JSON object, checked as an instance of the named class
    Object(String),
    /// Anything
    Mixed,
}

impl Validator {
    /// Discrimination precedence; lower ranks are tried first.
    pub fn rank(&self) -> u8 {
        match self {
            Validator::Enum(_) => 0,
            Validator::Null => 1,
            Validator::List => 2,
            Validator::Dict => 3,
            Validator::Bool => 4,
            Validator::Int => 5,
            Validator::Float => 6,
            Validator::String => 7,
            Validator::Object(_) => 8,
            Validator::Mixed => 9,
        }
    }

    /// Whether the raw value passes this check.
    pub fn accepts(&self, raw: &serde_json::Value) -> bool {
        use serde_json::Value;
        match self {
            Validator::Enum(def) => def.accepts(raw),
            Validator::Null => raw.is_null(),
            Validator::List => raw.is_array(),
            Validator::Dict | Validator::Object(_) => raw.is_object(),
            Validator::Bool => raw.is_boolean(),
            Validator::Int => raw.is_i64(),
            Validator::Float => raw.is_number(),
            Validator::String => matches!(raw, Value::String(_)),
            Validator::Mixed => true,
        }
    }

    /// Whether a default member with this validator can take any value.
    ///
    /// Closed scalars cannot; dispatching a mismatched value to them is
    /// reported as an unexpected union value instead.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            Validator::List | Validator::Dict | Validator::Object(_) | Validator::Mixed
        )
    }
}

impl fmt::Display for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validator::Enum(def) => write!(f, "is_case({})", def.name),
            Validator::Null => f.write_str("is_null"),
            Validator::List => f.write_str("is_list"),
            Validator::Dict => f.write_str("is_dict"),
            Validator::Bool => f.write_str("is_bool"),
            Validator::Int => f.write_str("is_int"),
            Validator::Float => f.write_str("is_float"),
            Validator::String => f.write_str("is_string"),
            Validator::Object(class) => write!(f, "instance_of({class})"),
            Validator::Mixed => f.write_str("any"),
        }
    }
}

/// Ordered discrimination chain for a union type.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionChain {
    /// Signature of the union, for errors
    pub signature: String,
    /// Validated members, in precedence order
    pub members: Vec<(Validator, ValueRef)>,
    /// Member used when no validator matches; never validated itself
    pub default: ValueRef,
    /// Check used only to detect that there is no safe default
    pub default_guard: Option<Validator>,
}

impl UnionChain {
    /// Pick the member for a raw value.
    pub fn select(&self, raw: &serde_json::Value) -> Result<&ValueRef> {
        if let Some((_, member)) = self.members.iter().find(|(v, _)| v.accepts(raw)) {
            return Ok(member);
        }
        match &self.default_guard {
            Some(guard) if !guard.accepts(raw) => Err(CodecError::unexpected_union_value(
                &self.signature,
                crate::encoding::json::json_type_name(raw),
            )),
            _ => Ok(&self.default),
        }
    }
}

// =============================================================================
// Providers
// =============================================================================

/// A declared property as the object provider sees it.
#[derive(Clone)]
pub struct PropertyBinding {
    /// Property name on the constructed value
    pub target_name: String,
    /// How the JSON value is decoded
    pub value: ValueRef,
    /// Post-decode mapping, with its registered name
    pub transform: Option<(String, Arc<dyn ValueTransformer>)>,
}

impl PropertyBinding {
    /// Apply the transformer, if any.
    pub fn apply(&self, value: crate::core::CodecValue) -> Result<crate::core::CodecValue> {
        match &self.transform {
            Some((_, transformer)) => transformer.transform(value),
            None => Ok(value),
        }
    }
}

impl fmt::Debug for PropertyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyBinding")
            .field("target_name", &self.target_name)
            .field("value", &self.value)
            .field("transform", &self.transform.as_ref().map(|(n, _)| n))
            .finish()
    }
}

impl PartialEq for PropertyBinding {
    fn eq(&self, other: &Self) -> bool {
        self.target_name == other.target_name
            && self.value == other.value
            && self.transform.as_ref().map(|(n, _)| n) == other.transform.as_ref().map(|(n, _)| n)
    }
}

/// Decode provider for one node.
#[derive(Debug, Clone, PartialEq)]
pub enum Provider {
    /// Always null
    Null,
    Bool,
    Int,
    Float,
    String,
    /// Any JSON value, undirected
    Mixed,
    /// Strict case lookup from the raw value
    Enum(Arc<EnumDef>),
    /// List or dict
    Collection {
        /// Item reference
        item: ValueRef,
        /// List when true, dict when false
        is_list: bool,
        /// Dict keys must parse as integers
        int_keys: bool,
        /// Lazy mode returns a sequence instead of draining
        iterable: bool,
    },
    /// Class instance
    Object {
        /// Class identity
        class: String,
        /// Properties keyed by encoded name
        properties: IndexMap<String, PropertyBinding>,
        /// Lazy mode returns a proxy
        lazy_proxy: bool,
    },
}

impl Provider {
    /// Signature-like label for listings and errors.
    pub fn expected(&self) -> String {
        match self {
            Provider::Null => "null".to_string(),
            Provider::Bool => "bool".to_string(),
            Provider::Int => "int".to_string(),
            Provider::Float => "float".to_string(),
            Provider::String => "string".to_string(),
            Provider::Mixed => "mixed".to_string(),
            Provider::Enum(def) => def.name.clone(),
            Provider::Collection { is_list: true, .. } => "list".to_string(),
            Provider::Collection { is_list: false, .. } => "dict".to_string(),
            Provider::Object { class, .. } => class.clone(),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Collection {
                item,
                is_list,
                int_keys,
                iterable,
            } => {
                let kind = if *is_list { "list" } else { "dict" };
                write!(f, "{kind}(item={item}")?;
                if *int_keys {
                    f.write_str(", int_keys")?;
                }
                if *iterable {
                    f.write_str(", iterable")?;
                }
                f.write_str(")")
            }
            Provider::Object {
                class,
                properties,
                lazy_proxy,
            } => {
                write!(f, "object {class}{{")?;
                for (idx, (encoded, binding)) in properties.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{encoded}->{}: {}", binding.target_name, binding.value)?;
                }
                f.write_str("}")?;
                if *lazy_proxy {
                    f.write_str(" proxy")?;
                }
                Ok(())
            }
            other => f.write_str(&other.expected()),
        }
    }
}

// =============================================================================
// Program
// =============================================================================

/// A built decode program for one (type, mode) pair.
#[derive(Debug, Clone)]
pub struct Program {
    inner: Arc<ProgramInner>,
}

#[derive(Debug)]
struct ProgramInner {
    signature: String,
    mode: DecodeMode,
    entry: ValueRef,
    providers: IndexMap<NodeId, Provider>,
}

impl Program {
    /// Assemble a program from its parts.
    pub fn new(
        signature: impl Into<String>,
        mode: DecodeMode,
        entry: ValueRef,
        providers: IndexMap<NodeId, Provider>,
    ) -> Self {
        Self {
            inner: Arc::new(ProgramInner {
                signature: signature.into(),
                mode,
                entry,
                providers,
            }),
        }
    }

    /// Signature of the type this program decodes.
    pub fn signature(&self) -> &str {
        &self.inner.signature
    }

    pub fn mode(&self) -> DecodeMode {
        self.inner.mode
    }

    /// Entry reference.
    pub fn entry(&self) -> &ValueRef {
        &self.inner.entry
    }

    /// Look up the provider bound to a node.
    pub fn provider(&self, id: &NodeId) -> Result<&Provider> {
        self.inner
            .providers
            .get(id)
            .ok_or_else(|| CodecError::type_not_found(id.as_str()))
    }

    /// Bound node identifiers, in emission order.
    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.inner.providers.keys()
    }

    /// Number of providers.
    pub fn len(&self) -> usize {
        self.inner.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.providers.is_empty()
    }

    /// Opaque content hash of signature and mode.
    pub fn cache_key(&self) -> String {
        cache_key(&self.inner.signature, self.inner.mode)
    }

    /// Whether two handles share the same program.
    pub fn ptr_eq(&self, other: &Program) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "Program for '{}' ({}), entry {}:",
            self.inner.signature, self.inner.mode, self.inner.entry
        )?;
        for (idx, (id, provider)) in self.inner.providers.iter().enumerate() {
            writeln!(f, "  {idx:3}: {id} = {provider}")?;
        }
        Ok(())
    }
}
