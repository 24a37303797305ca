//! # Shared Buffer Handle
//!
//! The ingest worker is the only writer; display consumers read from other
//! tasks. Each operation takes the lock once, so a reader never observes a
//! half-applied append or reset.

use std::sync::{Arc, PoisonError, RwLock};

use super::buffer::RollingBuffer;

/// Cloneable, thread-safe handle to a [`RollingBuffer`]
#[derive(Debug, Clone)]
pub struct SharedBuffer {
    inner: Arc<RwLock<RollingBuffer>>,
}

impl SharedBuffer {
    pub fn new(buffer: RollingBuffer) -> Self {
        Self {
            inner: Arc::new(RwLock::new(buffer)),
        }
    }

    /// Run `f` against a consistent view of the buffer
    pub fn read<R>(&self, f: impl FnOnce(&RollingBuffer) -> R) -> R {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// Run `f` with exclusive access to the buffer
    pub fn write<R>(&self, f: impl FnOnce(&mut RollingBuffer) -> R) -> R {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn window(&self, field: &str, count: usize) -> Vec<Option<f64>> {
        self.read(|b| b.window(field, count))
    }

    pub fn last(&self, field: &str) -> Option<f64> {
        self.read(|b| b.last(field))
    }

    pub fn min(&self, field: &str) -> Option<f64> {
        self.read(|b| b.min(field))
    }

    pub fn avg(&self, field: &str) -> Option<f64> {
        self.read(|b| b.avg(field))
    }

    pub fn max(&self, field: &str) -> Option<f64> {
        self.read(|b| b.max(field))
    }

    pub fn len(&self) -> usize {
        self.read(RollingBuffer::len)
    }

    pub fn is_empty(&self) -> bool {
        self.read(RollingBuffer::is_empty)
    }

    /// Clear the buffer contents only
    ///
    /// The pipeline's previous arrival time lives with the ingest worker; use
    /// `IngestWorker::reset` to also restart delta timing.
    pub fn reset(&self) {
        self.write(RollingBuffer::reset)
    }
}
