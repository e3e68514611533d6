//! Pool of scratch buffers for building block bodies.
//!
//! A block's length precedes its payload, so writers assemble each payload in
//! a scratch buffer first. Buffers are borrowed from a [`BufferPool`] through a
//! [`PooledBuffer`] guard that hands the buffer back when dropped, including
//! when an error unwinds the caller with `?`.

use std::ops::{Deref, DerefMut};

use once_cell::sync::Lazy;
use parking_lot::Mutex;

/// Buffers larger than this are dropped instead of pooled.
const MAX_POOLED_CAPACITY: usize = 1 << 20;

/// Idle buffers kept per pool.
const MAX_IDLE: usize = 16;

static SHARED: Lazy<BufferPool> = Lazy::new(BufferPool::new);

/// A free list of reusable byte buffers.
#[derive(Debug, Default)]
pub struct BufferPool {
    idle: Mutex<Vec<Vec<u8>>>,
}

impl BufferPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide pool used by the format writers.
    #[inline]
    pub fn shared() -> &'static BufferPool {
        &SHARED
    }

    /// Borrow an empty buffer.
    pub fn acquire(&self) -> PooledBuffer<'_> {
        let buf = self.idle.lock().pop().unwrap_or_default();
        PooledBuffer { buf, pool: self }
    }

    /// Number of buffers currently waiting for reuse.
    pub fn idle(&self) -> usize {
        self.idle.lock().len()
    }

    fn release(&self, mut buf: Vec<u8>) {
        if buf.capacity() > MAX_POOLED_CAPACITY {
            return;
        }
        buf.clear();
        let mut idle = self.idle.lock();
        if idle.len() < MAX_IDLE {
            idle.push(buf);
        }
    }
}

/// A buffer on loan from a [`BufferPool`].
#[derive(Debug)]
pub struct PooledBuffer<'p> {
    buf: Vec<u8>,
    pool: &'p BufferPool,
}

impl Deref for PooledBuffer<'_> {
    type Target = Vec<u8>;

    #[inline]
    fn deref(&self) -> &Vec<u8> {
        &self.buf
    }
}

impl DerefMut for PooledBuffer<'_> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buf));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_returns_cleared() {
        let pool = BufferPool::new();
        {
            let mut buf = pool.acquire();
            buf.extend_from_slice(b"scratch");
            assert_eq!(pool.idle(), 0);
        }
        assert_eq!(pool.idle(), 1);
        let buf = pool.acquire();
        assert!(buf.is_empty());
        assert!(buf.capacity() >= 7);
    }

    #[test]
    fn test_oversized_buffer_not_kept() {
        let pool = BufferPool::new();
        {
            let mut buf = pool.acquire();
            buf.reserve(MAX_POOLED_CAPACITY + 1);
        }
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn test_idle_list_is_bounded() {
        let pool = BufferPool::new();
        let loans: Vec<_> = (0..MAX_IDLE + 4).map(|_| pool.acquire()).collect();
        drop(loans);
        assert_eq!(pool.idle(), MAX_IDLE);
    }
}
