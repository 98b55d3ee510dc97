use std::{collections::VecDeque, convert::TryFrom as _};

/// Double-ended queue of samples with optional capacity.
///
/// Items live in a monotonic index space. Pushing at the front decrements
/// `front_index`, pushing at the back increments `back_index`, and popping
/// moves the respective end inwards. Indices are only reset by `clear`.
///
/// When `max_size` is non-zero, a push that exceeds capacity evicts one item
/// from the opposite end.
#[derive(Clone, Debug)]
pub struct SequenceBuffer<T> {
    items: VecDeque<T>,
    front: i64,
    max_size: usize,
}

impl<T> Default for SequenceBuffer<T> {
    fn default() -> Self {
        SequenceBuffer::new()
    }
}

impl<T> SequenceBuffer<T> {
    /// Creates unbounded buffer.
    pub fn new() -> Self {
        SequenceBuffer::with_max_size(0)
    }

    /// Creates buffer that holds at most `max_size` items.
    /// Zero means unbounded.
    pub fn with_max_size(max_size: usize) -> Self {
        SequenceBuffer {
            items: VecDeque::new(),
            front: 0,
            max_size,
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn front_index(&self) -> i64 {
        self.front
    }

    /// Index of the back item. Equals `front_index() - 1` when empty.
    pub fn back_index(&self) -> i64 {
        self.front + self.items.len() as i64 - 1
    }

    /// Pushes item at the front.
    /// Returns item evicted from the back, if capacity was exceeded.
    pub fn push_front(&mut self, item: T) -> Option<T> {
        self.front -= 1;
        self.items.push_front(item);

        if self.over_capacity() {
            self.pop_back()
        } else {
            None
        }
    }

    /// Pushes item at the back.
    /// Returns item evicted from the front, if capacity was exceeded.
    pub fn push_back(&mut self, item: T) -> Option<T> {
        self.items.push_back(item);

        if self.over_capacity() {
            self.pop_front()
        } else {
            None
        }
    }

    pub fn pop_front(&mut self) -> Option<T> {
        let item = self.items.pop_front()?;
        self.front += 1;
        Some(item)
    }

    pub fn pop_back(&mut self) -> Option<T> {
        self.items.pop_back()
    }

    pub fn peek_front(&self) -> Option<&T> {
        self.items.front()
    }

    pub fn peek_back(&self) -> Option<&T> {
        self.items.back()
    }

    /// Returns item at `index` in the buffer's own index space,
    /// i.e. `front_index()..=back_index()`, not a zero-based offset.
    pub fn peek_at(&self, index: i64) -> Option<&T> {
        let offset = index.checked_sub(self.front)?;
        let offset = usize::try_from(offset).ok()?;
        self.items.get(offset)
    }

    /// Iterates items from front to back.
    pub fn iter(
        &self,
    ) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.items.iter()
    }

    /// Snapshot of items from front to back.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.items.iter().cloned().collect()
    }

    /// Drops all items and resets index origin.
    pub fn clear(&mut self) {
        self.items.clear();
        self.front = 0;
    }

    fn over_capacity(&self) -> bool {
        self.max_size > 0 && self.items.len() > self.max_size
    }
}

impl<T> Extend<T> for SequenceBuffer<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push_back(item);
        }
    }
}
