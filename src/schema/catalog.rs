// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Class, enum and value transformer registry.
//!
//! Whatever discovers types (reflection, annotations, hand-written
//! descriptions) registers its results here; the data model builder and the
//! default instantiator read from it.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::core::{CodecError, CodecValue, EnumValue, Result};

use super::ast::{check_type_name, BackingKind, Type};

/// Post-decode mapping applied to a property value.
pub trait ValueTransformer: Send + Sync {
    /// Map the decoded raw value to the property value.
    fn transform(&self, value: CodecValue) -> Result<CodecValue>;
}

impl<F> ValueTransformer for F
where
    F: Fn(CodecValue) -> Result<CodecValue> + Send + Sync,
{
    fn transform(&self, value: CodecValue) -> Result<CodecValue> {
        self(value)
    }
}

/// A declared class property.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDef {
    /// Property name on the class
    pub name: String,
    /// Key used in JSON
    pub encoded_name: String,
    /// Type of the JSON value (before any transformer runs)
    pub ty: Type,
    /// Value used when the key is absent
    pub default: Option<CodecValue>,
    /// Name of a registered value transformer
    pub transformer: Option<String>,
}

impl PropertyDef {
    /// Create a property whose JSON key equals its name.
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        let name = name.into();
        Self {
            encoded_name: name.clone(),
            name,
            ty,
            default: None,
            transformer: None,
        }
    }

    /// Read the property from a different JSON key.
    pub fn encoded_as(mut self, encoded_name: impl Into<String>) -> Self {
        self.encoded_name = encoded_name.into();
        self
    }

    /// Use `value` when the key is absent.
    pub fn with_default(mut self, value: CodecValue) -> Self {
        self.default = Some(value);
        self
    }

    /// Apply a registered value transformer after decoding.
    pub fn with_transformer(mut self, name: impl Into<String>) -> Self {
        self.transformer = Some(name.into());
        self
    }

    /// Whether construction fails when the key is absent.
    pub fn is_required(&self) -> bool {
        self.default.is_none() && !self.ty.accepts_null()
    }
}

/// A class description.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    /// Class identity
    pub name: String,
    /// Properties in declaration order
    pub properties: Vec<PropertyDef>,
    /// Whether lazy programs may return a proxy for this class
    pub lazy: bool,
}

impl ClassDef {
    /// Create a class with no properties.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
            lazy: true,
        }
    }

    /// Add a property.
    pub fn property(mut self, property: PropertyDef) -> Self {
        self.properties.push(property);
        self
    }

    /// Always construct this class eagerly, even in lazy programs.
    pub fn eager(mut self) -> Self {
        self.lazy = false;
        self
    }

    /// Look up a property by name.
    pub fn get_property(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Backing value of an enum case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EnumBacking {
    Int(i64),
    String(String),
}

/// An enum case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumCase {
    /// Case label
    pub label: String,
    /// Backing value, for backed enums
    pub value: Option<EnumBacking>,
}

/// An enum description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDef {
    /// Enum class identity
    pub name: String,
    /// How cases are written in JSON
    pub backing: BackingKind,
    /// Cases in declaration order
    pub cases: Vec<EnumCase>,
}

impl EnumDef {
    /// Enum whose cases are written as their label.
    pub fn unit<I, S>(name: impl Into<String>, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            backing: BackingKind::Unit,
            cases: labels
                .into_iter()
                .map(|l| EnumCase {
                    label: l.into(),
                    value: None,
                })
                .collect(),
        }
    }

    /// Enum backed by integers.
    pub fn int_backed<I, S>(name: impl Into<String>, cases: I) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            backing: BackingKind::Int,
            cases: cases
                .into_iter()
                .map(|(l, v)| EnumCase {
                    label: l.into(),
                    value: Some(EnumBacking::Int(v)),
                })
                .collect(),
        }
    }

    /// Enum backed by strings.
    pub fn string_backed<I, S, V>(name: impl Into<String>, cases: I) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<String>,
    {
        Self {
            name: name.into(),
            backing: BackingKind::String,
            cases: cases
                .into_iter()
                .map(|(l, v)| EnumCase {
                    label: l.into(),
                    value: Some(EnumBacking::String(v.into())),
                })
                .collect(),
        }
    }

    fn find(&self, raw: &serde_json::Value) -> Option<&EnumCase> {
        match self.backing {
            BackingKind::Int => {
                let n = raw.as_i64()?;
                self.cases
                    .iter()
                    .find(|c| c.value == Some(EnumBacking::Int(n)))
            }
            BackingKind::String => {
                let s = raw.as_str()?;
                self.cases
                    .iter()
                    .find(|c| matches!(&c.value, Some(EnumBacking::String(v)) if v == s))
            }
            BackingKind::Unit => {
                let s = raw.as_str()?;
                self.cases.iter().find(|c| c.label == s)
            }
        }
    }

    /// Whether a raw JSON value names one of the cases.
    pub fn accepts(&self, raw: &serde_json::Value) -> bool {
        self.find(raw).is_some()
    }

    /// Construct the case named by a raw JSON value, strictly.
    pub fn from_raw(&self, raw: &serde_json::Value) -> Result<EnumValue> {
        self.find(raw)
            .map(|case| EnumValue {
                class: self.name.clone(),
                case: case.label.clone(),
            })
            .ok_or_else(|| CodecError::unknown_enum_case(&self.name, raw.to_string()))
    }
}

/// Thread-safe registry of classes, enums and value transformers.
///
/// Uses RwLock for concurrent read access with exclusive write access.
/// Every registration bumps the [`generation`](TypeCatalog::generation), so
/// anything built from earlier definitions can tell it is stale.
#[derive(Default)]
pub struct TypeCatalog {
    inner: RwLock<CatalogInner>,
    generation: AtomicU64,
}

#[derive(Default)]
struct CatalogInner {
    classes: HashMap<String, Arc<ClassDef>>,
    enums: HashMap<String, Arc<EnumDef>>,
    transformers: HashMap<String, Arc<dyn ValueTransformer>>,
}

impl TypeCatalog {
    /// Create a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, CatalogInner>> {
        self.inner
            .read()
            .map_err(|e| CodecError::Io {
                message: format!("Catalog lock poisoned: {e}"),
            })
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, CatalogInner>> {
        self.inner
            .write()
            .map_err(|e| CodecError::Io {
                message: format!("Catalog lock poisoned: {e}"),
            })
    }

    /// Register a class, replacing any previous definition.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidType`] if the name is not a valid type name.
    pub fn register_class(&self, class: ClassDef) -> Result<()> {
        check_type_name(&class.name)?;
        let mut inner = self.write()?;
        inner.classes.insert(class.name.clone(), Arc::new(class));
        self.bump();
        Ok(())
    }

    /// Register an enum, replacing any previous definition.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidType`] if the name is not a valid type name.
    pub fn register_enum(&self, def: EnumDef) -> Result<()> {
        check_type_name(&def.name)?;
        let mut inner = self.write()?;
        inner.enums.insert(def.name.clone(), Arc::new(def));
        self.bump();
        Ok(())
    }

    /// Register a value transformer under `name`.
    pub fn register_transformer(
        &self,
        name: impl Into<String>,
        transformer: impl ValueTransformer + 'static,
    ) -> Result<()> {
        let mut inner = self.write()?;
        inner.transformers.insert(name.into(), Arc::new(transformer));
        self.bump();
        Ok(())
    }

    /// Number of registrations so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    fn bump(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Get a class by name.
    pub fn class(&self, name: &str) -> Result<Arc<ClassDef>> {
        self.read()?
            .classes
            .get(name)
            .cloned()
            .ok_or_else(|| CodecError::type_not_found(name))
    }

    /// Get an enum by name.
    pub fn enum_def(&self, name: &str) -> Result<Arc<EnumDef>> {
        self.read()?
            .enums
            .get(name)
            .cloned()
            .ok_or_else(|| CodecError::type_not_found(name))
    }

    /// Get a value transformer by name.
    pub fn transformer(&self, name: &str) -> Result<Arc<dyn ValueTransformer>> {
        self.read()?
            .transformers
            .get(name)
            .cloned()
            .ok_or_else(|| CodecError::type_not_found(name))
    }

    /// Check if a class is registered.
    pub fn contains_class(&self, name: &str) -> Result<bool> {
        Ok(self.read()?.classes.contains_key(name))
    }
}

impl fmt::Debug for TypeCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.read() {
            Ok(inner) => f
                .debug_struct("TypeCatalog")
                .field("classes", &inner.classes.keys().collect::<Vec<_>>())
                .field("enums", &inner.enums.keys().collect::<Vec<_>>())
                .field("transformers", &inner.transformers.keys().collect::<Vec<_>>())
                .field("generation", &self.generation())
                .finish(),
            Err(_) => f.write_str("TypeCatalog(<poisoned>)"),
        }
    }
}
