//! Skiplist memtable
//!
//! Each level is its own singly linked list. A key inserted with height `h`
//! gets a leaf node on level 0 and a tower node on each of levels 1..h; a
//! tower points down to the node with the same key one level below.
//!
//! ```text
//! level 2:  [c] ---------------------------> [k]
//!            |                                 |
//! level 1:  [c] ----------> [g] ------------> [k]
//!            |               |                 |
//! level 0:  [c] -> [e] ---> [g] -> [h] -----> [k] -> [m]
//! ```
//!
//! Key and value bytes live in the [`Arena`]; nodes live in a typed pool
//! addressed by [`NodeId`], so the list itself only stores indices.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use crate::comparator::{BytewiseComparator, Comparator};
use crate::config::{Config, MAX_SUPPORTED_HEIGHT};
use crate::error::{Result, SdbError};

use super::arena::{Arena, ArenaSlice};
use super::level::LevelGenerator;

/// Index of a node in the skiplist's node pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NodeId(usize);

enum Node {
    /// Level-0 node carrying the value
    Leaf {
        key: ArenaSlice,
        value: ArenaSlice,
        next: Option<NodeId>,
    },
    /// Skip link on levels >= 1
    Tower {
        key: ArenaSlice,
        next: Option<NodeId>,
        child: NodeId,
    },
}

impl Node {
    fn key(&self) -> ArenaSlice {
        match self {
            Node::Leaf { key, .. } | Node::Tower { key, .. } => *key,
        }
    }

    fn next(&self) -> Option<NodeId> {
        match self {
            Node::Leaf { next, .. } | Node::Tower { next, .. } => *next,
        }
    }

    fn set_next(&mut self, link: Option<NodeId>) {
        match self {
            Node::Leaf { next, .. } | Node::Tower { next, .. } => *next = link,
        }
    }

    fn child(&self) -> NodeId {
        match self {
            Node::Tower { child, .. } => *child,
            Node::Leaf { .. } => panic!("leaf nodes have no child"),
        }
    }

    fn value(&self) -> ArenaSlice {
        match self {
            Node::Leaf { value, .. } => *value,
            Node::Tower { .. } => panic!("tower nodes carry no value"),
        }
    }
}

/// Result of a top-down search: per level, the node equal to the key or its
/// immediate predecessor (None = the key sorts before the level's head).
struct Trace {
    preds: [Option<NodeId>; MAX_SUPPORTED_HEIGHT],
    /// Level-0 node holding the key, if present
    found: Option<NodeId>,
}

/// Insert-only ordered map over byte keys
pub struct Skiplist {
    /// Head of each level's list; `levels[0]` holds every key
    levels: Vec<Option<NodeId>>,
    /// Node pool
    nodes: Vec<Node>,
    /// Backing store for key and value bytes
    arena: Arena,
    generator: LevelGenerator,
    comparator: Arc<dyn Comparator>,
    /// Number of distinct keys
    len: usize,
}

impl Skiplist {
    /// Create an empty skiplist with the default configuration
    pub fn new() -> Self {
        let config = Config::default();
        Self {
            levels: Vec::new(),
            nodes: Vec::new(),
            arena: Arena::from_config(&config),
            generator: LevelGenerator::new(config.max_height),
            comparator: Arc::new(BytewiseComparator),
            len: 0,
        }
    }

    /// Create an empty skiplist from a validated config
    pub fn with_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let generator = match config.level_seed {
            Some(seed) => LevelGenerator::with_seed(config.max_height, seed),
            None => LevelGenerator::new(config.max_height),
        };
        Ok(Self {
            levels: Vec::new(),
            nodes: Vec::new(),
            arena: Arena::from_config(config),
            generator,
            comparator: Arc::clone(&config.comparator),
            len: 0,
        })
    }

    /// Insert `key` if absent.
    ///
    /// Returns `Ok(None)` when the key was inserted. When the key is already
    /// present the stored value is returned as `Ok(Some(old))` and left
    /// unchanged: a second put never overwrites.
    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Result<Option<&[u8]>> {
        let trace = self.trace(key);
        if let Some(id) = trace.found {
            let existing = self.nodes[id.0].value();
            return Ok(Some(self.arena.get(existing)));
        }

        let height = self.generator.next_height();
        if height > self.levels.len() {
            tracing::trace!(from = self.levels.len(), to = height, "skiplist grew taller");
            self.levels.resize(height, None);
        }

        let key_slice = self.arena.alloc_copy(key)?;
        let value_slice = self.arena.alloc_copy(value)?;

        let mut below: Option<NodeId> = None;
        for level in 0..height {
            let pred = trace.preds[level];
            let next = match pred {
                Some(p) => self.nodes[p.0].next(),
                None => self.levels[level],
            };

            let node = match below {
                None => Node::Leaf {
                    key: key_slice,
                    value: value_slice,
                    next,
                },
                Some(child) => Node::Tower {
                    key: key_slice,
                    next,
                    child,
                },
            };
            let id = NodeId(self.nodes.len());
            self.nodes.push(node);

            match pred {
                Some(p) => self.nodes[p.0].set_next(Some(id)),
                None => self.levels[level] = Some(id),
            }
            below = Some(id);
        }

        self.len += 1;
        Ok(None)
    }

    /// Look up the value stored for `key`
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.trace(key)
            .found
            .map(|id| self.arena.get(self.nodes[id.0].value()))
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.trace(key).found.is_some()
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of levels currently linked
    pub fn height(&self) -> usize {
        self.levels.len()
    }

    /// Approximate memory held: arena bytes plus the node pool
    pub fn memory_usage(&self) -> usize {
        self.arena.allocated_bytes() + self.nodes.len() * std::mem::size_of::<Node>()
    }

    /// Ascending iteration over level 0, used to flush into a table
    pub fn iter(&self) -> SkiplistIter<'_> {
        SkiplistIter {
            list: self,
            cur: self.levels.first().copied().flatten(),
        }
    }

    /// Drop every entry and release the arena
    pub fn clear(&mut self) {
        self.levels.clear();
        self.nodes.clear();
        self.arena.reset_all();
        self.len = 0;
    }

    /// Walk every level and check the structure: keys strictly ascending on
    /// each level, level 0 made of leaves holding `len` keys, and every tower
    /// pointing at a node with the same key on the level below.
    #[doc(hidden)]
    pub fn check_invariants(&self) -> Result<()> {
        let mut below: HashSet<usize> = HashSet::new();
        for (level, head) in self.levels.iter().enumerate() {
            let mut members = HashSet::new();
            let mut prev: Option<NodeId> = None;
            let mut cur = *head;
            while let Some(id) = cur {
                let node = &self.nodes[id.0];
                if let Some(p) = prev {
                    if self.comparator.compare(self.key_of(p), self.key_of(id)) != Ordering::Less {
                        return Err(SdbError::Corruption(format!(
                            "level {} not strictly ascending at node {}",
                            level, id.0
                        )));
                    }
                }
                match (level, node) {
                    (0, Node::Leaf { .. }) => {}
                    (0, Node::Tower { .. }) => {
                        return Err(SdbError::Corruption(format!(
                            "tower node {} linked on level 0",
                            id.0
                        )));
                    }
                    (_, Node::Leaf { .. }) => {
                        return Err(SdbError::Corruption(format!(
                            "leaf node {} linked on level {}",
                            id.0, level
                        )));
                    }
                    (_, Node::Tower { key, child, .. }) => {
                        if !below.contains(&child.0) || self.nodes[child.0].key() != *key {
                            return Err(SdbError::Corruption(format!(
                                "tower node {} on level {} has no matching node below",
                                id.0, level
                            )));
                        }
                    }
                }
                members.insert(id.0);
                prev = Some(id);
                cur = node.next();
            }
            if level == 0 && members.len() != self.len {
                return Err(SdbError::Corruption(format!(
                    "level 0 holds {} keys, expected {}",
                    members.len(),
                    self.len
                )));
            }
            below = members;
        }
        Ok(())
    }

    fn key_of(&self, id: NodeId) -> &[u8] {
        self.arena.get(self.nodes[id.0].key())
    }

    /// Top-down search shared by `get` and `put`.
    ///
    /// On each level walk forward while keys are smaller than `key`. On an
    /// equal key record it and descend through its child. Otherwise record
    /// the last smaller node and descend through its child, or restart at the
    /// lower level's head when there was none.
    fn trace(&self, key: &[u8]) -> Trace {
        let mut trace = Trace {
            preds: [None; MAX_SUPPORTED_HEIGHT],
            found: None,
        };
        let Some(mut level) = self.levels.len().checked_sub(1) else {
            return trace;
        };

        let mut cur = self.levels[level];
        let mut prev: Option<NodeId> = None;

        loop {
            let ordering = match cur {
                Some(id) => self.comparator.compare(self.key_of(id), key),
                None => Ordering::Greater,
            };

            match (ordering, cur) {
                (Ordering::Less, Some(id)) => {
                    prev = Some(id);
                    cur = self.nodes[id.0].next();
                    continue;
                }
                (Ordering::Equal, Some(id)) => {
                    trace.preds[level] = Some(id);
                    if level == 0 {
                        trace.found = Some(id);
                        break;
                    }
                    level -= 1;
                    cur = Some(self.nodes[id.0].child());
                }
                _ => {
                    trace.preds[level] = prev;
                    if level == 0 {
                        break;
                    }
                    level -= 1;
                    cur = match prev {
                        Some(p) => Some(self.nodes[p.0].child()),
                        None => self.levels[level],
                    };
                }
            }
            prev = None;
        }

        trace
    }
}

impl Default for Skiplist {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over skiplist entries in key order
pub struct SkiplistIter<'a> {
    list: &'a Skiplist,
    cur: Option<NodeId>,
}

impl<'a> Iterator for SkiplistIter<'a> {
    type Item = (&'a [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cur?;
        let node = &self.list.nodes[id.0];
        self.cur = node.next();
        Some((
            self.list.arena.get(node.key()),
            self.list.arena.get(node.value()),
        ))
    }
}
