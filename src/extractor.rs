//! Bounded batching for cursor walks
//!
//! The extraction passes stream store-internal ids (or whole rows) out
//! of a forward-only cursor and hand them downstream in fixed-size
//! batches. `Batcher` keeps that boundary logic in one place: `push`
//! returns a full batch exactly when capacity is reached, `finish`
//! drains the final partial batch once the cursor is exhausted. No
//! peek-ahead on the cursor is needed, so the exact-multiple boundary
//! cannot double-flush or drop the last row.

pub struct Batcher<T> {
    capacity: usize,
    buf: Vec<T>,
}

impl<T> Batcher<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "batch capacity must be positive");
        Batcher {
            capacity,
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Append one item, returning a batch if it is now full.
    pub fn push(&mut self, item: T) -> Option<Vec<T>> {
        self.buf.push(item);
        if self.buf.len() == self.capacity {
            Some(std::mem::replace(
                &mut self.buf,
                Vec::with_capacity(self.capacity),
            ))
        } else {
            None
        }
    }

    /// Take whatever remains. `None` when nothing was buffered, so an
    /// empty result set emits zero batches.
    pub fn finish(self) -> Option<Vec<T>> {
        if self.buf.is_empty() {
            None
        } else {
            Some(self.buf)
        }
    }
}
