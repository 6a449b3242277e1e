//! Binary min-heap used by the corridor search
//!
//! Items and priorities live in two parallel vectors so the heap stays
//! compact and can be reused between searches without reallocating.

/// Min-heap of `(item, priority)` pairs with in-place priority updates
#[derive(Debug, Clone, Default)]
pub struct PriorityQueue {
    items: Vec<u32>,
    priorities: Vec<f32>,
}

impl PriorityQueue {
    /// Creates an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty queue with room for `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            priorities: Vec::with_capacity(capacity),
        }
    }

    /// Removes all entries, keeping the allocation
    pub fn clear(&mut self) {
        self.items.clear();
        self.priorities.clear();
    }

    /// Checks if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of queued entries
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Lowest-priority entry without removing it
    pub fn peek(&self) -> Option<(u32, f32)> {
        Some((*self.items.first()?, self.priorities[0]))
    }

    /// Pushes an entry
    pub fn put(&mut self, item: u32, priority: f32) {
        self.items.push(item);
        self.priorities.push(priority);
        self.bubble_up(self.items.len() - 1);
    }

    /// Pops the entry with the lowest priority
    pub fn get(&mut self) -> Option<u32> {
        if self.items.is_empty() {
            return None;
        }
        let result = self.items.swap_remove(0);
        self.priorities.swap_remove(0);
        if !self.items.is_empty() {
            self.trickle_down(0);
        }
        Some(result)
    }

    /// Changes the priority of a queued item, or pushes it if absent.
    ///
    /// The lookup is linear; open sets in corridor searches stay small.
    pub fn update_priority(&mut self, item: u32, priority: f32) {
        let Some(i) = self.items.iter().position(|&it| it == item) else {
            self.put(item, priority);
            return;
        };
        let old = self.priorities[i];
        self.priorities[i] = priority;
        if priority < old {
            self.bubble_up(i);
        } else if priority > old {
            self.trickle_down(i);
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.items.swap(a, b);
        self.priorities.swap(a, b);
    }

    fn bubble_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.priorities[i] >= self.priorities[parent] {
                break;
            }
            self.swap(i, parent);
            i = parent;
        }
    }

    fn trickle_down(&mut self, mut i: usize) {
        let size = self.items.len();
        loop {
            let child1 = 2 * i + 1;
            if child1 >= size {
                break;
            }
            let child2 = child1 + 1;
            let mut min_child = child1;
            if child2 < size && self.priorities[child2] < self.priorities[child1] {
                min_child = child2;
            }
            if self.priorities[i] <= self.priorities[min_child] {
                break;
            }
            self.swap(i, min_child);
            i = min_child;
        }
    }
}
