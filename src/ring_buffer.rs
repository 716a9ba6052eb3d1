use crate::error::{Result, TelemetryError};
use std::sync::Mutex;

/// Fixed-capacity FIFO sample store with overwrite-oldest eviction.
///
/// Producers call `append` from their own threads while the renderer and
/// stats consumers call `snapshot` concurrently; the mutex is held only for
/// a single append-and-possible-evict (or one copy-out), never for a batch.
pub struct RingBuffer<T> {
    core: Mutex<RingCore<T>>,
    capacity: usize,
}

impl<T: Clone> RingBuffer<T> {
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Self {
            core: Mutex::new(RingCore::new(capacity)?),
            capacity,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append one value, evicting the oldest if full. O(1), never blocks
    /// beyond the short critical section.
    pub fn append(&self, value: T) {
        self.core.lock().unwrap().append(value);
    }

    /// Consistent copy of the current contents, oldest first.
    pub fn snapshot(&self) -> Vec<T> {
        self.core.lock().unwrap().snapshot()
    }

    pub fn len(&self) -> usize {
        self.core.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resets to empty. Session teardown only.
    pub fn clear(&self) {
        self.core.lock().unwrap().clear();
    }
}

/// Unsynchronized ring storage: a contiguous array plus head/len indices.
/// `StreamBuffer` keeps several of these under one lock for lock-step
/// appends; `RingBuffer` wraps a single one with its own mutex.
pub(crate) struct RingCore<T> {
    slots: Vec<T>,
    head: usize,
    len: usize,
    capacity: usize,
}

impl<T: Clone> RingCore<T> {
    pub(crate) fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(TelemetryError::Config(
                "ring buffer capacity must be non-zero".to_string(),
            ));
        }
        Ok(Self {
            slots: Vec::with_capacity(capacity),
            head: 0,
            len: 0,
            capacity,
        })
    }

    pub(crate) fn append(&mut self, value: T) {
        if self.slots.len() < self.capacity {
            // Still filling the backing store.
            self.slots.push(value);
            self.len += 1;
        } else {
            // Full: overwrite the oldest slot and advance the head.
            self.slots[self.head] = value;
            self.head = (self.head + 1) % self.capacity;
        }
    }

    pub(crate) fn snapshot(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len);
        for i in 0..self.len {
            out.push(self.slots[(self.head + i) % self.capacity].clone());
        }
        out
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.head = 0;
        self.len = 0;
    }
}
