// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Default instantiator backed by the type catalog.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::core::{CodecError, CodecValue, ObjectValue, Result, Thunk};
use crate::schema::{ClassDef, TypeCatalog};

use super::{EagerInstantiator, LazyInstantiator};

/// Builds [`ObjectValue`]s for classes registered in a [`TypeCatalog`].
///
/// For every declared property, in declaration order:
/// - a supplied value is used as is
/// - an absent property with a default gets the default
/// - an absent property that is neither defaulted nor nullable fails with
///   `MissingRequiredProperty`
/// - any other absent property is omitted
///
/// Supplied names the class does not declare are dropped.
#[derive(Debug, Clone)]
pub struct CatalogInstantiator {
    catalog: Arc<TypeCatalog>,
}

impl CatalogInstantiator {
    /// Create an instantiator over a catalog.
    pub fn new(catalog: Arc<TypeCatalog>) -> Self {
        Self { catalog }
    }

    fn fill<T>(
        &self,
        class: &ClassDef,
        mut supplied: IndexMap<String, T>,
        from_default: impl Fn(&CodecValue) -> T,
    ) -> Result<IndexMap<String, T>> {
        let mut out = IndexMap::with_capacity(class.properties.len());
        for prop in &class.properties {
            if let Some(value) = supplied.swap_remove(&prop.name) {
                out.insert(prop.name.clone(), value);
            } else if let Some(default) = &prop.default {
                out.insert(prop.name.clone(), from_default(default));
            } else if prop.is_required() {
                return Err(CodecError::missing_property(&class.name, &prop.name));
            }
        }
        if !supplied.is_empty() {
            tracing::trace!(
                class = %class.name,
                dropped = supplied.len(),
                "Dropping undeclared properties"
            );
        }
        Ok(out)
    }
}

impl EagerInstantiator for CatalogInstantiator {
    fn instantiate(
        &self,
        class: &str,
        properties: IndexMap<String, CodecValue>,
    ) -> Result<CodecValue> {
        let def = self.catalog.class(class)?;
        let properties = self.fill(&def, properties, CodecValue::clone)?;
        Ok(CodecValue::Object(Arc::new(ObjectValue::new(
            def.name.clone(),
            properties,
        ))))
    }
}

impl LazyInstantiator for CatalogInstantiator {
    fn instantiate(&self, class: &str, properties: IndexMap<String, Thunk>) -> Result<CodecValue> {
        let def = self.catalog.class(class)?;
        let properties = self.fill(&def, properties, |v| Thunk::ready(v.clone()))?;
        Ok(CodecValue::Object(Arc::new(ObjectValue::lazy(
            def.name.clone(),
            properties,
        ))))
    }
}
