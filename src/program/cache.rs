// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! In-memory program cache.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::core::{CodecError, Result};

use super::plan::{cache_key, DecodeMode, Program};

/// Built programs keyed by [`Program::cache_key`].
///
/// The lock is never held while a program is built, so two callers missing
/// on the same key may both build it; the last insert wins. Building is
/// deterministic, so either result is correct.
///
/// Entries belong to one catalog generation. A lookup at a newer generation
/// drops every entry first; a build at an older one is returned but not
/// stored.
#[derive(Debug, Default)]
pub struct ProgramCache {
    inner: Mutex<CacheInner>,
}

#[derive(Debug, Default)]
struct CacheInner {
    generation: u64,
    programs: HashMap<String, Program>,
}

impl ProgramCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a program.
    pub fn get(&self, signature: &str, mode: DecodeMode) -> Result<Option<Program>> {
        let key = cache_key(signature, mode);
        Ok(self.lock_cache()?.programs.get(&key).cloned())
    }

    /// Store a program under its own key.
    pub fn insert(&self, program: Program) -> Result<()> {
        self.lock_cache()?
            .programs
            .insert(program.cache_key(), program);
        Ok(())
    }

    /// Return the cached program or build, store and return a new one.
    pub fn get_or_build<F>(&self, signature: &str, mode: DecodeMode, build: F) -> Result<Program>
    where
        F: FnOnce() -> Result<Program>,
    {
        let generation = self.generation()?;
        self.get_or_build_at(generation, signature, mode, build)
    }

    /// Like [`get_or_build`](Self::get_or_build), for programs built from
    /// catalog `generation`.
    pub fn get_or_build_at<F>(
        &self,
        generation: u64,
        signature: &str,
        mode: DecodeMode,
        build: F,
    ) -> Result<Program>
    where
        F: FnOnce() -> Result<Program>,
    {
        let key = cache_key(signature, mode);
        {
            let mut inner = self.lock_cache()?;
            if generation > inner.generation {
                if !inner.programs.is_empty() {
                    tracing::debug!(
                        from = inner.generation,
                        to = generation,
                        dropped = inner.programs.len(),
                        "Program cache invalidated"
                    );
                }
                inner.programs.clear();
                inner.generation = generation;
            }
            if generation == inner.generation {
                if let Some(program) = inner.programs.get(&key) {
                    tracing::debug!(signature, mode = %mode, "Program cache hit");
                    return Ok(program.clone());
                }
            }
        }

        tracing::debug!(signature, mode = %mode, "Program cache miss");
        let program = build()?;
        let mut inner = self.lock_cache()?;
        if inner.generation == generation {
            inner.programs.insert(key, program.clone());
        }
        Ok(program)
    }

    /// Catalog generation the cached programs were built from.
    pub fn generation(&self) -> Result<u64> {
        Ok(self.lock_cache()?.generation)
    }

    /// Number of cached programs.
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock_cache()?.programs.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock_cache()?.programs.is_empty())
    }

    /// Drop every cached program.
    pub fn clear(&self) -> Result<()> {
        self.lock_cache()?.programs.clear();
        Ok(())
    }

    /// Lock the cache, centralizing error handling.
    fn lock_cache(&self) -> Result<MutexGuard<'_, CacheInner>> {
        self.inner.lock().map_err(|e| CodecError::Io {
            message: format!("Program cache lock poisoned: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeId;
    use crate::program::plan::{Provider, Target, ValueRef};
    use indexmap::IndexMap;

    fn int_program(mode: DecodeMode) -> Program {
        let mut providers = IndexMap::new();
        providers.insert(NodeId::new("int"), Provider::Int);
        Program::new(
            "int",
            mode,
            ValueRef {
                target: Target::Provider(NodeId::new("int")),
                nullable: false,
            },
            providers,
        )
    }

    #[test]
    fn test_get_or_build_builds_once() {
        let cache = ProgramCache::new();
        let mut builds = 0;
        let first = cache
            .get_or_build("int", DecodeMode::Lazy, || {
                builds += 1;
                Ok(int_program(DecodeMode::Lazy))
            })
            .unwrap();
        let second = cache
            .get_or_build("int", DecodeMode::Lazy, || {
                builds += 1;
                Ok(int_program(DecodeMode::Lazy))
            })
            .unwrap();
        assert_eq!(builds, 1);
        assert!(first.ptr_eq(&second));
        assert_eq!(cache.len().unwrap(), 1);
    }

    #[test]
    fn test_modes_are_separate_entries() {
        let cache = ProgramCache::new();
        cache.insert(int_program(DecodeMode::Immediate)).unwrap();
        assert!(cache.get("int", DecodeMode::Immediate).unwrap().is_some());
        assert!(cache.get("int", DecodeMode::Lazy).unwrap().is_none());
    }

    #[test]
    fn test_build_failure_is_not_cached() {
        let cache = ProgramCache::new();
        let err = cache
            .get_or_build("Missing", DecodeMode::Immediate, || {
                Err(CodecError::type_not_found("Missing"))
            })
            .unwrap_err();
        assert!(matches!(err, CodecError::TypeNotFound { .. }));
        assert!(cache.is_empty().unwrap());
    }

    #[test]
    fn test_newer_generation_drops_entries() {
        let cache = ProgramCache::new();
        let old = cache
            .get_or_build_at(1, "int", DecodeMode::Lazy, || Ok(int_program(DecodeMode::Lazy)))
            .unwrap();
        let rebuilt = cache
            .get_or_build_at(2, "int", DecodeMode::Lazy, || Ok(int_program(DecodeMode::Lazy)))
            .unwrap();
        assert!(!old.ptr_eq(&rebuilt));
        assert_eq!(cache.generation().unwrap(), 2);
        assert_eq!(cache.len().unwrap(), 1);

        // A build from an older generation is not stored.
        let stale = cache
            .get_or_build_at(1, "int", DecodeMode::Immediate, || {
                Ok(int_program(DecodeMode::Immediate))
            })
            .unwrap();
        assert_eq!(stale.mode(), DecodeMode::Immediate);
        assert!(cache.get("int", DecodeMode::Immediate).unwrap().is_none());
        assert_eq!(cache.generation().unwrap(), 2);
    }

    #[test]
    fn test_clear() {
        let cache = ProgramCache::new();
        cache.insert(int_program(DecodeMode::Lazy)).unwrap();
        cache.clear().unwrap();
        assert_eq!(cache.len().unwrap(), 0);
    }
}
