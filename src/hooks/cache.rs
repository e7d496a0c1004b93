use std::collections::VecDeque;

/// Bounded FIFO of message ids that were already handled.
#[derive(Debug, Clone)]
pub struct MessageIdCache {
    ids: VecDeque<String>,
    capacity: usize,
}

impl MessageIdCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            ids: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|cached| cached == id)
    }

    /// Returns false if the id was already present. Evicts the oldest entry on overflow.
    pub fn insert(&mut self, id: &str) -> bool {
        if self.contains(id) {
            return false;
        }
        self.ids.push_back(id.to_string());
        while self.ids.len() > self.capacity {
            self.ids.pop_front();
        }
        true
    }
}
