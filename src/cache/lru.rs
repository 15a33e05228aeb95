//! Fixed-capacity cache with least-recently-used eviction.
//!
//! The recency chain is a doubly-linked list stored arena-style: a slot
//! vector plus a free list of recycled indices, with a key -> slot map for
//! direct access. `get`, `put`, `remove` and eviction are all O(1) because
//! no operation ever walks the chain.

use std::collections::HashMap;

/// One slot in the recency chain. `prev` points toward the least recently
/// used end, `next` toward the most recently used end.
#[derive(Debug)]
struct Slot<V> {
    key: String,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Debug)]
pub struct LruCache<V> {
    limit: usize,
    slots: Vec<Option<Slot<V>>>,
    free: Vec<usize>,
    map: HashMap<String, usize>,
    /// Most recently used slot.
    head: Option<usize>,
    /// Least recently used slot, evicted first.
    tail: Option<usize>,
}

impl<V> LruCache<V> {
    /// Create a cache holding at most `limit` entries.
    ///
    /// # Panics
    ///
    /// Panics if `limit` is zero.
    pub fn new(limit: usize) -> Self {
        assert!(limit >= 1, "cache limit must be at least 1");
        Self {
            limit,
            slots: Vec::with_capacity(limit),
            free: Vec::new(),
            map: HashMap::with_capacity(limit),
            head: None,
            tail: None,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Insert or replace. Replacing an existing key refreshes its recency
    /// without changing size. Returns the evicted `(key, value)` pair when
    /// the insert pushed the cache past its limit.
    pub fn put(&mut self, key: impl Into<String>, value: V) -> Option<(String, V)> {
        let key = key.into();
        if let Some(&idx) = self.map.get(&key) {
            if let Some(slot) = self.slots[idx].as_mut() {
                slot.value = value;
            }
            self.promote(idx);
            return None;
        }

        let evicted = if self.map.len() == self.limit {
            self.evict_oldest()
        } else {
            None
        };

        let idx = self.alloc(Slot {
            key: key.clone(),
            value,
            prev: None,
            next: None,
        });
        self.attach_front(idx);
        self.map.insert(key, idx);
        evicted
    }

    /// Look up a key and mark it most recently used.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let idx = *self.map.get(key)?;
        self.promote(idx);
        self.slots[idx].as_ref().map(|slot| &slot.value)
    }

    /// Look up a key without touching recency.
    pub fn peek(&self, key: &str) -> Option<&V> {
        let idx = *self.map.get(key)?;
        self.slots[idx].as_ref().map(|slot| &slot.value)
    }

    /// Detach a key from the chain and the lookup map.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let idx = self.map.remove(key)?;
        self.detach(idx);
        let slot = self.slots[idx].take()?;
        self.free.push(idx);
        Some(slot.value)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.map.clear();
        self.head = None;
        self.tail = None;
    }

    /// Current keys, arbitrary order.
    pub fn keys(&self) -> Vec<String> {
        self.map.keys().cloned().collect()
    }

    fn evict_oldest(&mut self) -> Option<(String, V)> {
        let idx = self.tail?;
        self.detach(idx);
        let slot = self.slots[idx].take()?;
        self.free.push(idx);
        self.map.remove(&slot.key);
        Some((slot.key, slot.value))
    }

    fn alloc(&mut self, slot: Slot<V>) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(slot);
                idx
            }
            None => {
                self.slots.push(Some(slot));
                self.slots.len() - 1
            }
        }
    }

    fn promote(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }
        self.detach(idx);
        self.attach_front(idx);
    }

    /// Unlink a slot from the chain, patching its neighbors.
    fn detach(&mut self, idx: usize) {
        let (prev, next) = match self.slots[idx].as_ref() {
            Some(slot) => (slot.prev, slot.next),
            None => return,
        };
        match prev {
            Some(p) => {
                if let Some(slot) = self.slots[p].as_mut() {
                    slot.next = next;
                }
            }
            None => self.tail = next,
        }
        match next {
            Some(n) => {
                if let Some(slot) = self.slots[n].as_mut() {
                    slot.prev = prev;
                }
            }
            None => self.head = prev,
        }
        if let Some(slot) = self.slots[idx].as_mut() {
            slot.prev = None;
            slot.next = None;
        }
    }

    /// Link a detached slot in as most recently used.
    fn attach_front(&mut self, idx: usize) {
        if let Some(slot) = self.slots[idx].as_mut() {
            slot.prev = self.head;
            slot.next = None;
        }
        match self.head {
            Some(h) => {
                if let Some(slot) = self.slots[h].as_mut() {
                    slot.next = Some(idx);
                }
            }
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }
}
