// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dependency-gated memoization for pipeline stages.
//!
//! A [`Memo`] holds the last dependency value and the output computed from it. Asking for the
//! output with equal dependencies returns a clone of the cached output, so stages that produce
//! `Arc`s hand back the very same allocation. Large shared inputs are compared by identity via
//! [`ByPtr`] rather than by deep equality.

extern crate alloc;

use alloc::sync::Arc;
use core::ops::Deref;

/// An `Arc` compared by pointer identity.
#[derive(Debug)]
pub struct ByPtr<T: ?Sized>(pub Arc<T>);

impl<T: ?Sized> Clone for ByPtr<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: ?Sized> PartialEq for ByPtr<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: ?Sized> Eq for ByPtr<T> {}

impl<T: ?Sized> Deref for ByPtr<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: ?Sized> From<Arc<T>> for ByPtr<T> {
    fn from(value: Arc<T>) -> Self {
        Self(value)
    }
}

/// A single-slot cache keyed by a dependency value.
#[derive(Debug)]
pub struct Memo<D, T> {
    name: &'static str,
    slot: Option<(D, T)>,
    generation: u64,
}

impl<D: PartialEq, T: Clone> Memo<D, T> {
    /// Creates an empty memo. `name` identifies the stage in log output.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            slot: None,
            generation: 0,
        }
    }

    /// Stage name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Number of times the output has been (re)computed.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the cached output if `deps` equals the stored dependencies, otherwise computes,
    /// stores and returns a new one.
    pub fn get_or_update(&mut self, deps: D, compute: impl FnOnce(&D) -> T) -> T {
        match self.try_get_or_update(deps, |d| Ok::<T, core::convert::Infallible>(compute(d))) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Fallible form of [`Memo::get_or_update`].
    ///
    /// On error the previous dependencies and output are kept.
    pub fn try_get_or_update<E>(
        &mut self,
        deps: D,
        compute: impl FnOnce(&D) -> Result<T, E>,
    ) -> Result<T, E> {
        if let Some((cached_deps, value)) = &self.slot
            && *cached_deps == deps
        {
            return Ok(value.clone());
        }
        let value = compute(&deps)?;
        self.generation += 1;
        log::trace!("recomputed {} (generation {})", self.name, self.generation);
        self.slot = Some((deps, value.clone()));
        Ok(value)
    }

    /// Drops the cached output so the next request recomputes.
    pub fn clear(&mut self) {
        self.slot = None;
    }
}
