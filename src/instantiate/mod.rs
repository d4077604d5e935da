// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Result construction from decoded properties.
//!
//! Object providers hand their property values to an instantiator:
//! - [`EagerInstantiator`] receives decoded values and builds the result now
//! - [`LazyInstantiator`] receives [`Thunk`]s and returns a proxy whose
//!   properties resolve on first read
//!
//! Absent JSON keys never reach an instantiator: the property is simply not
//! in the map, which is how "absent" is told apart from "present but null".
//! [`CatalogInstantiator`] is the default implementation of both traits.

pub mod catalog;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::core::{CodecValue, Result};
use crate::schema::TypeCatalog;

pub use crate::core::Thunk;
pub use catalog::CatalogInstantiator;

/// Builds a value from decoded property values.
pub trait EagerInstantiator: Send + Sync {
    /// Construct an instance of `class` from the supplied properties only.
    fn instantiate(
        &self,
        class: &str,
        properties: IndexMap<String, CodecValue>,
    ) -> Result<CodecValue>;
}

/// Builds a proxy value from deferred property computations.
pub trait LazyInstantiator: Send + Sync {
    /// Construct a proxy for `class` without forcing any thunk.
    fn instantiate(&self, class: &str, properties: IndexMap<String, Thunk>) -> Result<CodecValue>;
}

/// The instantiator pair a program runs with.
#[derive(Clone)]
pub struct Instantiators {
    eager: Arc<dyn EagerInstantiator>,
    lazy: Arc<dyn LazyInstantiator>,
}

impl Instantiators {
    /// Combine an eager and a lazy instantiator.
    pub fn new(eager: Arc<dyn EagerInstantiator>, lazy: Arc<dyn LazyInstantiator>) -> Self {
        Self { eager, lazy }
    }

    /// Use a [`CatalogInstantiator`] for both strategies.
    pub fn from_catalog(catalog: Arc<TypeCatalog>) -> Self {
        let instantiator = Arc::new(CatalogInstantiator::new(catalog));
        Self {
            eager: instantiator.clone(),
            lazy: instantiator,
        }
    }

    pub fn eager(&self) -> &dyn EagerInstantiator {
        self.eager.as_ref()
    }

    pub fn lazy(&self) -> &dyn LazyInstantiator {
        self.lazy.as_ref()
    }
}

impl fmt::Debug for Instantiators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instantiators").finish_non_exhaustive()
    }
}
