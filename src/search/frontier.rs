use {
    super::SearchError,
    std::{
        cmp::Ordering,
        collections::{hash_map::Entry, BinaryHeap, HashMap},
        hash::Hash,
    },
};

/// The authoritative record for a live vertex: its current priority and the sequence number of the
/// upsert that produced it. A heap entry whose fields disagree with this record is stale.
#[derive(Clone)]
struct LiveEntry<C> {
    priority: C,
    sequence: u64,
}

struct HeapEntry<V, C> {
    vertex: V,
    priority: C,
    sequence: u64,
}

impl<V, C: Ord> PartialEq for HeapEntry<V, C> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<V, C: Ord> Eq for HeapEntry<V, C> {}

impl<V, C: Ord> PartialOrd for HeapEntry<V, C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<V, C: Ord> Ord for HeapEntry<V, C> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse the order so that priority is minimized when popping from the heap, with the
        // earlier sequence number winning ties for a stable pop order
        other
            .priority
            .cmp(&self.priority)
            .then(other.sequence.cmp(&self.sequence))
    }
}

/// A min-priority queue over unique vertices that supports lowering the priority of a pending
/// vertex without removing its old heap entry.
///
/// `BinaryHeap` has no efficient decrease-key, so a side map from vertex to its authoritative
/// priority is kept instead, and the heap is allowed to accumulate stale `(vertex, priority)`
/// entries. Stale entries are discarded when they surface at the heap top. Whenever an upsert
/// would grow the heap to twice the live vertex count, the heap is rebuilt from the authoritative
/// map, bounding memory and keeping operations amortized logarithmic.
pub struct Frontier<V: Clone + Eq + Hash, C: Clone + Ord> {
    heap: BinaryHeap<HeapEntry<V, C>>,
    priorities: HashMap<V, LiveEntry<C>>,
    next_sequence: u64,
}

impl<V: Clone + Eq + Hash, C: Clone + Ord> Frontier<V, C> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            priorities: HashMap::new(),
            next_sequence: 0_u64,
        }
    }

    /// The number of live vertices, ignoring any stale heap entries.
    pub fn len(&self) -> usize {
        self.priorities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.priorities.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.priorities.clear();
    }

    /// Inserts `vertex` with `priority`, or lowers the priority of an already-pending `vertex`.
    ///
    /// An update to a priority greater than or equal to the current one is a no-op. Returns
    /// whether the frontier changed.
    pub fn upsert(&mut self, vertex: V, priority: C) -> bool {
        let sequence: u64 = self.next_sequence;

        match self.priorities.entry(vertex.clone()) {
            Entry::Occupied(mut entry) => {
                if priority < entry.get().priority {
                    entry.insert(LiveEntry {
                        priority: priority.clone(),
                        sequence,
                    });
                } else {
                    return false;
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(LiveEntry {
                    priority: priority.clone(),
                    sequence,
                });
            }
        }

        self.next_sequence += 1_u64;

        // Leave stale entries in the heap until it has bloated to twice the live count, then
        // rebuild it from the authoritative map (which already reflects this upsert)
        if self.heap.len() < 2_usize * self.priorities.len() {
            self.heap.push(HeapEntry {
                vertex,
                priority,
                sequence,
            });
        } else {
            self.rebuild();
        }

        true
    }

    fn rebuild(&mut self) {
        self.heap = self
            .priorities
            .iter()
            .map(|(vertex, live)| HeapEntry {
                vertex: vertex.clone(),
                priority: live.priority.clone(),
                sequence: live.sequence,
            })
            .collect();
    }

    fn discard_stale(&mut self) {
        while self.heap.peek().map_or(false, |entry| {
            self.priorities.get(&entry.vertex).map_or(true, |live| {
                live.priority != entry.priority || live.sequence != entry.sequence
            })
        }) {
            self.heap.pop();
        }
    }

    /// A reference to the vertex with the smallest priority, without removing it.
    pub fn peek_min(&mut self) -> Result<&V, SearchError> {
        self.discard_stale();

        self.heap
            .peek()
            .map(|entry| &entry.vertex)
            .ok_or(SearchError::EmptyFrontier)
    }

    /// Removes and returns the vertex with the smallest priority, along with that priority.
    pub fn pop_min(&mut self) -> Result<(V, C), SearchError> {
        self.discard_stale();

        let entry: HeapEntry<V, C> = self.heap.pop().ok_or(SearchError::EmptyFrontier)?;

        self.priorities.remove(&entry.vertex);

        Ok((entry.vertex, entry.priority))
    }
}

impl<V: Clone + Eq + Hash, C: Clone + Ord> Default for Frontier<V, C> {
    fn default() -> Self {
        Self::new()
    }
}
