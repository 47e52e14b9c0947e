// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::any::{type_name, Any};
use std::collections::HashMap;
use thiserror::Error;

/// A type whose instances can be parked in an [`ObjectPool`] and reinitialized.
pub trait Recyclable: Sized + 'static {
    /// Initialization arguments shared by `create` and `reuse`.
    type Args;

    /// Builds a fresh instance.
    fn create(args: Self::Args) -> Self;

    /// Reinitializes a pooled instance.
    fn reuse(&mut self, args: Self::Args);

    /// Drops every reference the instance holds before it is parked.
    fn unuse(&mut self);
}

/// A recycler operation failed. Nothing was acquired or released.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// No pool is registered under the kind.
    #[error("no pool registered for kind '{0}'")]
    NoSuchPool(String),
    /// A pool is already registered under the kind.
    #[error("pool kind '{0}' is already registered")]
    AlreadyRegistered(String),
    /// The kind is registered for another type.
    #[error("pool kind '{kind}' does not hold values of type {requested}")]
    KindMismatch {
        /// The kind that was looked up.
        kind: String,
        /// The type the caller asked for.
        requested: &'static str,
    },
}

/// A free list of parked instances of one type.
#[derive(Debug)]
pub struct ObjectPool<T: Recyclable> {
    free: Vec<T>,
    created: usize,
}

impl<T: Recyclable> Default for ObjectPool<T> {
    fn default() -> Self {
        Self {
            free: Vec::new(),
            created: 0,
        }
    }
}

impl<T: Recyclable> ObjectPool<T> {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pops a parked instance and reuses it, or creates a new one.
    pub fn acquire(&mut self, args: T::Args) -> T {
        match self.free.pop() {
            Some(mut obj) => {
                obj.reuse(args);
                obj
            }
            None => {
                self.created += 1;
                T::create(args)
            }
        }
    }

    /// Unuses `obj` and parks it.
    pub fn release(&mut self, mut obj: T) {
        obj.unuse();
        self.free.push(obj);
    }

    /// Number of parked instances.
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Number of instances ever constructed by this pool.
    pub fn created_count(&self) -> usize {
        self.created
    }

    /// Drops every parked instance.
    pub fn clear(&mut self) {
        self.free.clear();
    }
}

/// A registry of [`ObjectPool`]s keyed by kind name.
#[derive(Default)]
pub struct ObjectRecycler {
    pools: HashMap<String, Box<dyn Any>>,
}

impl std::fmt::Debug for ObjectRecycler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectRecycler")
            .field("kinds", &self.pools.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ObjectRecycler {
    /// Creates a recycler with no pools.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an empty pool of `T` under `kind`.
    pub fn register<T: Recyclable>(&mut self, kind: &str) -> Result<(), PoolError> {
        if self.pools.contains_key(kind) {
            return Err(PoolError::AlreadyRegistered(kind.to_string()));
        }
        self.pools
            .insert(kind.to_string(), Box::new(ObjectPool::<T>::new()));
        log::trace!("Registered object pool '{}' for {}.", kind, type_name::<T>());
        Ok(())
    }

    /// Acquires an instance from the pool registered under `kind`.
    pub fn acquire<T: Recyclable>(&mut self, kind: &str, args: T::Args) -> Result<T, PoolError> {
        Ok(self.pool_mut::<T>(kind)?.acquire(args))
    }

    /// Returns `obj` to the pool registered under `kind`. Ownership moves to the pool.
    pub fn release<T: Recyclable>(&mut self, kind: &str, obj: T) -> Result<(), PoolError> {
        self.pool_mut::<T>(kind)?.release(obj);
        Ok(())
    }

    /// Number of parked instances of `kind`, or `None` if unregistered.
    pub fn free_count<T: Recyclable>(&self, kind: &str) -> Option<usize> {
        self.pools
            .get(kind)?
            .downcast_ref::<ObjectPool<T>>()
            .map(ObjectPool::free_count)
    }

    /// Drops every pool.
    pub fn clear(&mut self) {
        self.pools.clear();
    }

    fn pool_mut<T: Recyclable>(&mut self, kind: &str) -> Result<&mut ObjectPool<T>, PoolError> {
        self.pools
            .get_mut(kind)
            .ok_or_else(|| PoolError::NoSuchPool(kind.to_string()))?
            .downcast_mut::<ObjectPool<T>>()
            .ok_or_else(|| PoolError::KindMismatch {
                kind: kind.to_string(),
                requested: type_name::<T>(),
            })
    }
}
