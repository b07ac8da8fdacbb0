// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Binary min-heap keyed by `f64` priority.
//!
//! There is no decrease-key: traversals enqueue a node again whenever its
//! cost improves and skip stale entries on dequeue, so the same value may
//! sit in the heap several times.

/// Min-heap of `(priority, value)` pairs.
///
/// Sifting swaps only on strictly smaller priorities, and on sift-down a
/// tie between the two children goes to the left one.
#[derive(Debug, Clone)]
pub struct PriorityQueue<T> {
    entries: Vec<(f64, T)>,
}

impl<T> Default for PriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PriorityQueue<T> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Creates an empty queue with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Number of queued entries, stale duplicates included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Smallest priority currently queued.
    pub fn peek_priority(&self) -> Option<f64> {
        self.entries.first().map(|(p, _)| *p)
    }

    /// Adds `value` and sifts it up past every parent with a larger priority.
    ///
    /// The same value may be queued more than once; callers skip stale
    /// entries on dequeue.
    pub fn enqueue(&mut self, value: T, priority: f64) {
        self.entries.push((priority, value));
        self.bubble_up(self.entries.len() - 1);
    }

    /// Removes the value with the smallest priority.
    pub fn dequeue(&mut self) -> Option<T> {
        self.dequeue_with_priority().map(|(_, value)| value)
    }

    /// Like [`dequeue`](Self::dequeue), also returning the priority.
    pub fn dequeue_with_priority(&mut self) -> Option<(f64, T)> {
        if self.entries.is_empty() {
            return None;
        }
        let min = self.entries.swap_remove(0);
        if !self.entries.is_empty() {
            self.sink_down(0);
        }
        Some(min)
    }

    fn bubble_up(&mut self, mut idx: usize) {
        while idx > 0 {
            let parent = (idx - 1) / 2;
            if self.entries[idx].0 >= self.entries[parent].0 || self.entries[idx].0.is_nan() {
                break;
            }
            self.entries.swap(idx, parent);
            idx = parent;
        }
    }

    fn sink_down(&mut self, mut idx: usize) {
        let len = self.entries.len();
        loop {
            let priority = self.entries[idx].0;
            let left = 2 * idx + 1;
            let right = left + 1;
            let mut swap = None;

            if left < len && self.entries[left].0 < priority {
                swap = Some(left);
            }
            if right < len {
                let r = self.entries[right].0;
                let better = match swap {
                    None => r < priority,
                    Some(l) => r < self.entries[l].0,
                };
                if better {
                    swap = Some(right);
                }
            }

            match swap {
                Some(child) => {
                    self.entries.swap(idx, child);
                    idx = child;
                }
                None => break,
            }
        }
    }
}
