//! Reusable string buffers for query compilation
//!
//! Compiling deep filters builds many short strings. Buffers are borrowed
//! from a process-wide pool through [`PooledBuffer`], which hands the buffer
//! back exactly once when it is dropped.

use parking_lot::Mutex;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Default number of idle buffers kept around
pub const DEFAULT_MAX_BUFFERS: usize = 64;

/// Buffers that grew beyond this many bytes are dropped instead of pooled
pub const DEFAULT_MAX_CAPACITY: usize = 16 * 1024;

static POOL: Mutex<Vec<String>> = parking_lot::const_mutex(Vec::new());
static MAX_BUFFERS: AtomicUsize = AtomicUsize::new(DEFAULT_MAX_BUFFERS);
static MAX_CAPACITY: AtomicUsize = AtomicUsize::new(DEFAULT_MAX_CAPACITY);

/// Adjust the pool limits. Already pooled buffers beyond the new count are
/// released.
pub fn configure(max_buffers: usize, max_capacity: usize) {
    MAX_BUFFERS.store(max_buffers, Ordering::Relaxed);
    MAX_CAPACITY.store(max_capacity, Ordering::Relaxed);
    let mut pool = POOL.lock();
    pool.truncate(max_buffers);
    pool.retain(|buf| buf.capacity() <= max_capacity);
}

/// Serializes tests that change the global limits
#[cfg(test)]
pub(crate) static LIMITS_LOCK: Mutex<()> = parking_lot::const_mutex(());

/// Number of idle buffers currently held by the pool
pub fn idle_buffers() -> usize {
    POOL.lock().len()
}

/// A buffer on loan from the pool.
///
/// The buffer is cleared on acquisition and returned on drop. Anything that
/// must outlive the guard has to be copied out first (see [`PooledBuffer::to_owned_string`]).
pub struct PooledBuffer {
    buf: Option<String>,
}

impl PooledBuffer {
    /// Take a cleared buffer from the pool, allocating if it is empty
    pub fn acquire() -> Self {
        let mut buf = POOL.lock().pop().unwrap_or_default();
        buf.clear();
        Self { buf: Some(buf) }
    }

    /// Copy the contents out; the guard still returns the buffer on drop
    pub fn to_owned_string(&self) -> String {
        self.as_str().to_owned()
    }

    fn release(&mut self) {
        let Some(buf) = self.buf.take() else {
            return;
        };
        if buf.capacity() > MAX_CAPACITY.load(Ordering::Relaxed) {
            return;
        }
        let mut pool = POOL.lock();
        if pool.len() < MAX_BUFFERS.load(Ordering::Relaxed) {
            pool.push(buf);
        }
    }
}

impl Deref for PooledBuffer {
    type Target = String;

    fn deref(&self) -> &String {
        // Only `release` empties the slot, and it runs from `drop`.
        match &self.buf {
            Some(buf) => buf,
            None => unreachable!("pooled buffer used after release"),
        }
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut String {
        match &mut self.buf {
            Some(buf) => buf,
            None => unreachable!("pooled buffer used after release"),
        }
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        self.release();
    }
}
