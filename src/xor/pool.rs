// Copyright (c) 2024-present, amq-filters
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use std::{
    ops::{Deref, DerefMut},
    sync::Mutex,
};

/// Transient arrays of one xor filter build
#[derive(Debug, Default)]
pub struct Scratch {
    /// Key hashes in bucketed order, later the peel order
    pub reverse_order: Vec<u64>,

    /// Which of its 3 slots a peeled key was assigned to
    pub reverse_h: Vec<u8>,

    /// Stack of slots with degree 1
    pub alone: Vec<u32>,

    /// Per slot: `degree << 2 | xor of slot discriminators`
    pub t2count: Vec<u8>,

    /// Per slot: xor of all key hashes touching the slot
    pub t2hash: Vec<u64>,

    /// Per hash block: next free position in `reverse_order`
    pub start_pos: Vec<u32>,
}

impl Scratch {
    /// Resizes all arrays for `size` keys and `capacity` slots.
    pub fn prepare(&mut self, size: usize, capacity: usize, blocks: usize) {
        fn refit<T: Copy + Default>(v: &mut Vec<T>, len: usize) {
            v.clear();
            v.resize(len, T::default());
        }

        refit(&mut self.reverse_order, size + 1);
        refit(&mut self.reverse_h, size);
        refit(&mut self.alone, capacity);
        refit(&mut self.t2count, capacity);
        refit(&mut self.t2hash, capacity);
        refit(&mut self.start_pos, blocks);
    }

    /// Zeroes the per-attempt state, keeping the sizes.
    pub fn clear(&mut self) {
        self.reverse_order.fill(0);
        self.reverse_h.fill(0);
        self.t2count.fill(0);
        self.t2hash.fill(0);
    }

    fn byte_size(&self) -> usize {
        self.reverse_order.capacity() * std::mem::size_of::<u64>()
            + self.reverse_h.capacity()
            + self.alone.capacity() * std::mem::size_of::<u32>()
            + self.t2count.capacity()
            + self.t2hash.capacity() * std::mem::size_of::<u64>()
            + self.start_pos.capacity() * std::mem::size_of::<u32>()
    }
}

/// Pool of build scratch space
///
/// Building many xor filters one after another reuses the same
/// allocations instead of growing fresh arrays every time.
#[derive(Debug, Default)]
pub struct ScratchPool {
    free: Mutex<Vec<Scratch>>,
}

impl ScratchPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes scratch space out of the pool, allocating if it is empty.
    ///
    /// The space is handed back when the guard is dropped.
    pub fn acquire(&self) -> ScratchGuard<'_> {
        #[expect(clippy::expect_used)]
        let scratch = self.free.lock().expect("lock is poisoned").pop();

        ScratchGuard {
            pool: self,
            scratch: scratch.unwrap_or_default(),
        }
    }

    fn release(&self, scratch: Scratch) {
        log::trace!("Returning {} B of xor build scratch space", scratch.byte_size());

        #[expect(clippy::expect_used)]
        self.free.lock().expect("lock is poisoned").push(scratch);
    }

    /// Number of idle scratch spaces.
    #[must_use]
    pub fn idle(&self) -> usize {
        #[expect(clippy::expect_used)]
        let free = self.free.lock().expect("lock is poisoned");
        free.len()
    }
}

/// Scratch space borrowed from a [`ScratchPool`]
pub struct ScratchGuard<'a> {
    pool: &'a ScratchPool,
    scratch: Scratch,
}

impl Deref for ScratchGuard<'_> {
    type Target = Scratch;

    fn deref(&self) -> &Self::Target {
        &self.scratch
    }
}

impl DerefMut for ScratchGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.scratch
    }
}

impl Drop for ScratchGuard<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.scratch));
    }
}
