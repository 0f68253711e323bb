/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

//! Reference-counted backing blocks.
//!
//! Every buffer lives in a [`Block`] behind an `Arc<RwLock<_>>`. Strong references are
//! held by the owning handle, by a non-owning handle that received a private copy, and by
//! descriptors built with `BufferView::from_vec` (which may be cloned). Views hold a
//! `Weak` reference together with the block generation they observed on creation.
//!
//! ```text
//!   owner (Held) ──Arc──▶ Block { data, generation: 2 }
//!                             ▲          ▲
//!   view A (Borrowed, gen 2) ─┘          └─ view B (Borrowed, gen 1)  -> Restructured
//! ```
//!
//! Restructuring a block (resize, transpose, delete) bumps its generation, so that views
//! created earlier fail with [`Error::Restructured`] instead of reading a layout they do
//! not understand. Dropping the owner releases the block and views fail with
//! [`Error::Released`].

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use crate::error::{Error, Result};

#[derive(Debug)]
pub(crate) struct Block {
    data: Vec<f32>,
    generation: u64,
}

type Shared = Arc<RwLock<Block>>;

#[derive(Debug, Clone)]
enum Kind {
    Held(Shared),
    Borrowed {
        block: Weak<RwLock<Block>>,
        generation: u64,
    },
}

/// A strong or weak reference to a backing block.
#[derive(Debug, Clone)]
pub(crate) struct StorageRef {
    kind: Kind,
}

fn read(block: &RwLock<Block>) -> RwLockReadGuard<'_, Block> {
    block.read().unwrap_or_else(PoisonError::into_inner)
}

fn write(block: &RwLock<Block>) -> RwLockWriteGuard<'_, Block> {
    block.write().unwrap_or_else(PoisonError::into_inner)
}

impl StorageRef {
    /// Take ownership of `data` in a fresh block.
    pub(crate) fn allocate(data: Vec<f32>) -> Self {
        Self {
            kind: Kind::Held(Arc::new(RwLock::new(Block {
                data,
                generation: 0,
            }))),
        }
    }

    /// Return whether some other reference can reach the same block.
    ///
    /// A weak back-reference always shares its block. A strong reference shares it only
    /// with other strong references: an owner does not count as aliased by its views.
    pub(crate) fn is_shared(&self) -> bool {
        match &self.kind {
            Kind::Held(block) => Arc::strong_count(block) > 1,
            Kind::Borrowed { .. } => true,
        }
    }

    /// Return whether `self` and `other` refer to the same block.
    pub(crate) fn same_block(&self, other: &Self) -> bool {
        match (self.upgrade(), other.upgrade()) {
            (Ok(a), Ok(b)) => Arc::ptr_eq(&a, &b),
            _ => false,
        }
    }

    fn upgrade(&self) -> Result<Shared> {
        match &self.kind {
            Kind::Held(block) => Ok(block.clone()),
            Kind::Borrowed { block, .. } => block.upgrade().ok_or(Error::Released),
        }
    }

    fn check_generation(&self, block: &Block) -> Result<()> {
        match self.kind {
            Kind::Held(_) => Ok(()),
            Kind::Borrowed { generation, .. } => {
                if generation == block.generation {
                    Ok(())
                } else {
                    Err(Error::Restructured {
                        observed: generation,
                        current: block.generation,
                    })
                }
            }
        }
    }

    /// Create a weak back-reference to the same block.
    ///
    /// Fails if `self` has already expired.
    pub(crate) fn borrow(&self) -> Result<Self> {
        let block = self.upgrade()?;
        let generation = {
            let guard = read(&block);
            self.check_generation(&guard)?;
            guard.generation
        };
        Ok(Self {
            kind: Kind::Borrowed {
                block: Arc::downgrade(&block),
                generation,
            },
        })
    }

    /// Invoke `f` on the block contents under a read lock.
    pub(crate) fn read<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&[f32]) -> R,
    {
        let block = self.upgrade()?;
        let guard = read(&block);
        self.check_generation(&guard)?;
        Ok(f(&guard.data))
    }

    /// Invoke `f` on the block contents under a write lock.
    ///
    /// The length of the block cannot change through this path.
    pub(crate) fn write<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut [f32]) -> R,
    {
        let block = self.upgrade()?;
        let mut guard = write(&block);
        self.check_generation(&guard)?;
        Ok(f(&mut guard.data))
    }

    /// Replace the layout of a held block and bump its generation, expiring every
    /// outstanding view.
    ///
    /// Returns the new generation.
    ///
    /// # Panics
    ///
    /// Panics if `self` is a borrowed reference. Callers gate this path on ownership.
    pub(crate) fn restructure<F, R>(&self, f: F) -> (R, u64)
    where
        F: FnOnce(&mut Vec<f32>) -> R,
    {
        let Kind::Held(block) = &self.kind else {
            panic!("only held storage can be restructured");
        };
        let mut guard = write(block);
        let result = f(&mut guard.data);
        guard.generation += 1;
        (result, guard.generation)
    }
}
