//! Fixed-capacity ring buffer of recent event tags
//!
//! Enqueueing into a full buffer overwrites the oldest entry, so the buffer
//! always holds the most recent `capacity` tags.

/// Ring buffer over a fixed slot array
#[derive(Debug, Clone)]
pub struct CircularEventBuffer<T> {
    slots: Box<[Option<T>]>,
    /// Index of the oldest entry
    head: usize,
    /// Index of the next write
    tail: usize,
    full: bool,
}

impl<T: Copy + PartialEq> CircularEventBuffer<T> {
    /// Create an empty buffer
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: vec![None; capacity].into_boxed_slice(),
            head: 0,
            tail: 0,
            full: false,
        }
    }

    /// Fixed number of slots
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        if self.full {
            self.capacity()
        } else if self.tail >= self.head {
            self.tail - self.head
        } else {
            self.capacity() - self.head + self.tail
        }
    }

    /// Whether the buffer holds no entries
    pub fn is_empty(&self) -> bool {
        self.head == self.tail && !self.full
    }

    /// Whether the next enqueue will evict the oldest entry
    pub fn is_full(&self) -> bool {
        self.full
    }

    /// Append a tag, evicting the oldest one when full
    pub fn enqueue(&mut self, tag: T) {
        self.slots[self.tail] = Some(tag);
        if self.full {
            self.head = self.advance(self.head);
        }
        self.tail = self.advance(self.tail);
        self.full = self.tail == self.head;
    }

    /// Remove and return the oldest tag
    pub fn dequeue(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let tag = self.slots[self.head].take();
        self.head = self.advance(self.head);
        self.full = false;
        tag
    }

    /// Oldest tag without removing it
    pub fn peek(&self) -> Option<T> {
        if self.is_empty() {
            None
        } else {
            self.slots[self.head]
        }
    }

    /// Whether any stored entry equals `tag`
    pub fn contains(&self, tag: T) -> bool {
        self.iter().any(|stored| stored == tag)
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.head = 0;
        self.tail = 0;
        self.full = false;
    }

    /// Iterate from oldest to newest
    ///
    /// Visits at most one full lap of the slot array.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        let capacity = self.capacity();
        (0..self.len()).filter_map(move |offset| self.slots[(self.head + offset) % capacity])
    }

    fn advance(&self, index: usize) -> usize {
        (index + 1) % self.capacity()
    }
}
