use rand::Rng;

use crate::iterator::MemTableIterator;
use crate::types::{InternalKey, Value};

/// Maximum height of the skip list. LevelDB uses 12.
pub const MAX_HEIGHT: usize = 12;

/// Default branching factor: each level holds ~1/4 of the level below.
pub const DEFAULT_BRANCHING_FACTOR: u32 = 4;

/// A single node in the skip list.
///
/// Each node has `height` forward pointers. Level 0 contains all nodes
/// (a regular linked list). Higher levels skip over nodes, enabling
/// O(log n) average-case search.
///
/// ```text
/// Level 3:  HEAD ──────────────────────────────► 50 ──────────► NIL
/// Level 2:  HEAD ──────────► 20 ────────────────► 50 ──────────► NIL
/// Level 1:  HEAD ──► 10 ──► 20 ────► 35 ────────► 50 ──► 60 ──► NIL
/// Level 0:  HEAD ──► 10 ──► 20 ──► 25 ──► 35 ──► 50 ──► 60 ──► 70 ► NIL
/// ```
struct SkipNode {
    key: InternalKey,
    value: Value,
    forward: Vec<Option<usize>>, // indices into SkipList.nodes
}

/// Single-owner sorted container keyed by internal key.
///
/// Nodes live in one arena (`nodes`) and link to each other by index, so the
/// whole list is released at once when it is dropped and never frees an
/// individual node. Used for the private snapshot behind a full-order
/// write-buffer iterator.
///
/// Average case: O(log n) insert, O(log n) lookup, O(n) iteration.
pub struct SkipList {
    nodes: Vec<SkipNode>,
    head: Vec<Option<usize>>,
    height: usize,
    max_height: usize,
    branching_factor: u32,
    size_bytes: usize,
}

impl Default for SkipList {
    fn default() -> Self {
        Self::new()
    }
}

impl SkipList {
    /// Create a new empty skip list.
    pub fn new() -> Self {
        Self::with_shape(MAX_HEIGHT, DEFAULT_BRANCHING_FACTOR)
    }

    /// Create a skip list whose nodes are at most `max_height` tall and grow a
    /// level with probability `1 / branching_factor`.
    pub fn with_shape(max_height: usize, branching_factor: u32) -> Self {
        let max_height = max_height.clamp(1, MAX_HEIGHT);
        SkipList {
            nodes: Vec::new(),
            head: vec![None; max_height],
            height: 1,
            max_height,
            branching_factor: branching_factor.max(2),
            size_bytes: 0,
        }
    }

    /// Insert a key-value pair. Overwrites if key already exists.
    ///
    /// Algorithm:
    ///   1. Find the insertion point at each level (track predecessors)
    ///   2. Generate a random height for the new node
    ///   3. Splice into the list at each level up to the node's height
    pub fn insert(&mut self, key: InternalKey, value: Value) {
        let mut prev = [None; MAX_HEIGHT];
        let mut x = None;
        for level in (0..self.height).rev() {
            while let Some(n) = self.next(x, level) {
                if self.nodes[n].key < key {
                    x = Some(n);
                } else {
                    break;
                }
            }
            prev[level] = x;
        }

        if let Some(n) = self.next(prev[0], 0) {
            if self.nodes[n].key == key {
                self.size_bytes = self.size_bytes - self.nodes[n].value.len() + value.len();
                self.nodes[n].value = value;
                return;
            }
        }

        let height = self.random_height();
        if height > self.height {
            // prev[level] is already None (head) for the new levels
            self.height = height;
        }

        let idx = self.nodes.len();
        self.size_bytes += key.encoded_len() + value.len() + height * size_of::<Option<usize>>();
        let forward = (0..height).map(|level| self.next(prev[level], level)).collect();
        self.nodes.push(SkipNode { key, value, forward });
        for (level, p) in prev.iter().enumerate().take(height) {
            self.set_next(*p, level, Some(idx));
        }
    }

    /// Look up an exact internal key.
    pub fn get(&self, key: &InternalKey) -> Option<&Value> {
        let n = self.find_greater_or_equal(key)?;
        let node = &self.nodes[n];
        (node.key == *key).then_some(&node.value)
    }

    pub fn contains(&self, key: &InternalKey) -> bool {
        self.get(key).is_some()
    }

    /// Number of entries in the skip list.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Approximate memory usage in bytes.
    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    /// Iterator positioned at the first entry.
    pub fn iter(&self) -> SkipListIterator<'_> {
        SkipListIterator {
            list: self,
            node: self.first(),
        }
    }

    // Cursor primitives. A position is an arena index; `None` is past-the-end
    // (or the head, for the search helpers).

    pub(crate) fn first(&self) -> Option<usize> {
        self.head[0]
    }

    pub(crate) fn last(&self) -> Option<usize> {
        let mut x = None;
        for level in (0..self.height).rev() {
            while let Some(n) = self.next(x, level) {
                x = Some(n);
            }
        }
        x
    }

    pub(crate) fn successor(&self, node: usize) -> Option<usize> {
        self.nodes[node].forward[0]
    }

    /// Nodes only link forward: stepping back searches for the last node
    /// smaller than the current key.
    pub(crate) fn predecessor(&self, node: usize) -> Option<usize> {
        self.find_less_than(&self.nodes[node].key)
    }

    pub(crate) fn find_greater_or_equal(&self, key: &InternalKey) -> Option<usize> {
        let mut x = None;
        let mut level = self.height - 1;
        loop {
            let next = self.next(x, level);
            match next {
                Some(n) if self.nodes[n].key < *key => x = Some(n),
                _ if level == 0 => return next,
                _ => level -= 1,
            }
        }
    }

    fn find_less_than(&self, key: &InternalKey) -> Option<usize> {
        let mut x = None;
        for level in (0..self.height).rev() {
            while let Some(n) = self.next(x, level) {
                if self.nodes[n].key < *key {
                    x = Some(n);
                } else {
                    break;
                }
            }
        }
        x
    }

    pub(crate) fn key_at(&self, node: usize) -> &InternalKey {
        &self.nodes[node].key
    }

    pub(crate) fn value_at(&self, node: usize) -> &Value {
        &self.nodes[node].value
    }

    fn next(&self, node: Option<usize>, level: usize) -> Option<usize> {
        match node {
            None => self.head[level],
            Some(n) => self.nodes[n].forward[level],
        }
    }

    fn set_next(&mut self, node: Option<usize>, level: usize, to: Option<usize>) {
        match node {
            None => self.head[level] = to,
            Some(n) => self.nodes[n].forward[level] = to,
        }
    }

    /// Each extra level has a 1/branching_factor probability.
    fn random_height(&self) -> usize {
        let mut rng = rand::thread_rng();
        let mut height = 1;
        while height < self.max_height && rng.gen_ratio(1, self.branching_factor) {
            height += 1;
        }
        height
    }
}

/// Iterator over skip list entries in sorted order.
pub struct SkipListIterator<'a> {
    list: &'a SkipList,
    node: Option<usize>,
}

impl MemTableIterator for SkipListIterator<'_> {
    fn is_valid(&self) -> bool {
        self.node.is_some()
    }

    fn key(&self) -> &InternalKey {
        let n = self.node.expect("iterator is not valid");
        self.list.key_at(n)
    }

    fn value(&self) -> &Value {
        let n = self.node.expect("iterator is not valid");
        self.list.value_at(n)
    }

    fn next(&mut self) {
        debug_assert!(self.is_valid());
        self.node = self.node.and_then(|n| self.list.successor(n));
    }

    fn prev(&mut self) {
        debug_assert!(self.is_valid());
        self.node = self.node.and_then(|n| self.list.predecessor(n));
    }

    fn seek(&mut self, target: &InternalKey) {
        self.node = self.list.find_greater_or_equal(target);
    }

    fn seek_to_first(&mut self) {
        self.node = self.list.first();
    }

    fn seek_to_last(&mut self) {
        self.node = self.list.last();
    }
}
