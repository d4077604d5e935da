// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Deferred, memoized property computations.

use std::fmt;
use std::sync::{Arc, Mutex};

use once_cell::sync::OnceCell;

use super::error::{CodecError, Result};
use super::value::CodecValue;

type ThunkFn = Box<dyn FnOnce() -> Result<CodecValue> + Send>;

/// A zero-argument computation that runs at most once.
///
/// The first call to [`Thunk::force`] runs the computation and caches its
/// outcome, errors included; every later call returns the cached outcome.
/// The computation, and whatever it captured, is dropped once it has run.
/// Clones share the cache.
#[derive(Clone)]
pub struct Thunk {
    inner: Arc<ThunkInner>,
}

struct ThunkInner {
    cell: OnceCell<Result<CodecValue>>,
    /// Taken on first force
    init: Mutex<Option<ThunkFn>>,
}

impl Thunk {
    /// Create a thunk around a deferred computation.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() -> Result<CodecValue> + Send + 'static,
    {
        Self {
            inner: Arc::new(ThunkInner {
                cell: OnceCell::new(),
                init: Mutex::new(Some(Box::new(f))),
            }),
        }
    }

    /// Create an already-resolved thunk.
    pub fn ready(value: CodecValue) -> Self {
        Self {
            inner: Arc::new(ThunkInner {
                cell: OnceCell::with_value(Ok(value)),
                init: Mutex::new(None),
            }),
        }
    }

    /// Run the computation on first call and return the memoized outcome.
    pub fn force(&self) -> Result<CodecValue> {
        self.inner
            .cell
            .get_or_init(|| {
                let init = match self.inner.init.lock() {
                    Ok(mut slot) => slot.take(),
                    Err(e) => {
                        return Err(CodecError::Io {
                            message: format!("Thunk lock poisoned: {e}"),
                        })
                    }
                };
                match init {
                    Some(init) => init(),
                    None => Ok(CodecValue::Null),
                }
            })
            .clone()
    }

    /// Whether the computation has already run.
    pub fn is_forced(&self) -> bool {
        self.inner.cell.get().is_some()
    }

    /// Whether two thunks share the same computation.
    pub fn ptr_eq(&self, other: &Thunk) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Thunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.cell.get() {
            Some(Ok(value)) => f.debug_tuple("Thunk").field(value).finish(),
            Some(Err(err)) => f.debug_tuple("Thunk").field(err).finish(),
            None => f.write_str("Thunk(<deferred>)"),
        }
    }
}
