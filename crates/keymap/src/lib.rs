//! # keymap
//!
//! ## Overview
//!
//! This crate provides a mode-keyed table of key sequences, used for tracking both user-defined
//! mappings and the built-in command keys of a modal editor.
//!
//! Each mode has its own root node, and every key in a sequence follows an edge to the next node.
//! A node may hold a value, have further edges, or both. Looking up a typed sequence with
//! [MappingTable::lookup] tells the caller whether it is [Lookup::Unmapped], a
//! [Lookup::Complete] entry, a [Lookup::Partial] prefix of longer entries, or both a complete
//! entry and a prefix ([Lookup::Ambiguous]), which is the case that needs a timeout to resolve.
//!
//! ## Example
//!
//! ```
//! use keymap::{Lookup, MappingTable};
//!
//! #[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
//! enum ProgMode {
//!     Normal,
//!     Insert,
//! }
//!
//! let mut table = MappingTable::<ProgMode, char, &str>::default();
//!
//! table.insert(ProgMode::Normal, &['d'], "delete");
//! table.insert(ProgMode::Normal, &['d', 'd'], "delete-line");
//! table.insert(ProgMode::Insert, &['j', 'k'], "escape");
//!
//! assert_eq!(table.lookup(ProgMode::Normal, &['d']), Lookup::Ambiguous(&"delete"));
//! assert_eq!(table.lookup(ProgMode::Normal, &['d', 'd']), Lookup::Complete(&"delete-line"));
//! assert_eq!(table.lookup(ProgMode::Normal, &['x']), Lookup::Unmapped);
//! assert_eq!(table.lookup(ProgMode::Insert, &['j']), Lookup::Partial);
//!
//! // Removing an entry prunes the nodes that no longer lead anywhere.
//! table.remove(ProgMode::Insert, &['j', 'k']);
//! assert_eq!(table.lookup(ProgMode::Insert, &['j']), Lookup::Unmapped);
//! ```

// Require docs for public APIs, and disable the more annoying clippy lints.
#![deny(missing_docs)]
#![allow(clippy::bool_to_int_with_if)]
#![allow(clippy::field_reassign_with_default)]
#![allow(clippy::len_without_is_empty)]
#![allow(clippy::manual_range_contains)]
#![allow(clippy::match_like_matches_macro)]
#![allow(clippy::needless_return)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Trait for keys that can be stored in a [MappingTable].
pub trait InputKey: Clone + Hash + Eq {
    /// The error type returned when parsing a macro string fails.
    type Error;

    /// If the input that produced this key could possibly represent two keys, split out the first
    /// key.
    ///
    /// For example, this can occur in Unix terminals where ^[ is used to represent when Alt has
    /// been pressed. Rapidly typing Escape + "b" will produce ^[b, which may then be parsed as a
    /// single Alt-b keypress.
    fn decompose(&mut self) -> Option<Self>;

    /// Parse a string representing a series of keypresses.
    fn from_macro_str(mstr: &str) -> Result<Vec<Self>, Self::Error>;

    /// Return this key's representation as a single, printable codepoint, if it exists.
    fn get_char(&self) -> Option<char>;
}

impl InputKey for char {
    type Error = std::convert::Infallible;

    fn decompose(&mut self) -> Option<Self> {
        None
    }

    fn from_macro_str(mstr: &str) -> Result<Vec<Self>, Self::Error> {
        Ok(mstr.chars().collect())
    }

    fn get_char(&self) -> Option<char> {
        Some(*self)
    }
}

/// The result of looking up a key sequence in a [MappingTable].
#[derive(Debug, Eq, PartialEq)]
pub enum Lookup<'a, V> {
    /// Neither the sequence nor any longer sequence starting with it is mapped.
    Unmapped,

    /// The sequence is mapped, and no longer sequence starts with it.
    Complete(&'a V),

    /// The sequence isn't mapped, but is the start of one or more longer sequences.
    Partial,

    /// The sequence is mapped, and is also the start of one or more longer sequences.
    Ambiguous(&'a V),
}

impl<'a, V> Lookup<'a, V> {
    /// Whether more keys could still lead to a different entry.
    pub fn needs_more(&self) -> bool {
        matches!(self, Lookup::Partial | Lookup::Ambiguous(_))
    }

    /// The value mapped to the exact sequence, if there is one.
    pub fn value(&self) -> Option<&'a V> {
        match self {
            Lookup::Complete(v) | Lookup::Ambiguous(v) => Some(v),
            Lookup::Unmapped | Lookup::Partial => None,
        }
    }
}

#[derive(Debug, Default)]
struct IdGenerator {
    next_id: u64,
}

impl IdGenerator {
    fn next(&mut self) -> NodeId {
        let id = self.next_id;

        // Node IDs are never reused, and a u64 won't run out.
        self.next_id = self.next_id.wrapping_add(1);

        return NodeId(id);
    }
}

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
struct NodeId(u64);

struct Node<K, V> {
    parent: Option<(NodeId, K)>,
    value: Option<V>,
}

/// A table mapping key sequences to values, with a separate namespace per mode.
///
/// There is never more than one value for the same mode and key sequence: inserting again
/// replaces the old value.
pub struct MappingTable<M, K, V> {
    idgen: IdGenerator,
    modes: HashMap<M, NodeId>,
    nodes: HashMap<NodeId, Node<K, V>>,
    edges: HashMap<NodeId, HashMap<K, NodeId>>,
}

impl<M, K, V> MappingTable<M, K, V>
where
    M: Copy + Hash + Eq,
    K: Clone + Hash + Eq,
{
    fn add_node(&mut self, parent: Option<(NodeId, K)>) -> NodeId {
        let id = self.idgen.next();

        self.nodes.insert(id, Node { parent, value: None });

        return id;
    }

    fn get_mode(&mut self, mode: M) -> NodeId {
        match self.modes.get(&mode) {
            Some(id) => *id,
            None => {
                let id = self.add_node(None);
                self.modes.insert(mode, id);
                id
            },
        }
    }

    fn follow(&self, id: NodeId, key: &K) -> Option<NodeId> {
        self.edges.get(&id)?.get(key).copied()
    }

    fn has_edges(&self, id: NodeId) -> bool {
        self.edges.get(&id).map(|es| !es.is_empty()).unwrap_or(false)
    }

    fn find(&self, mode: M, keys: &[K]) -> Option<NodeId> {
        let mut id = *self.modes.get(&mode)?;

        for key in keys {
            id = self.follow(id, key)?;
        }

        Some(id)
    }

    /// Map a key sequence in a mode to a value, returning the value it replaced.
    ///
    /// An empty key sequence is never mapped, and inserting one does nothing.
    pub fn insert(&mut self, mode: M, keys: &[K], value: V) -> Option<V> {
        if keys.is_empty() {
            return None;
        }

        let mut id = self.get_mode(mode);

        for key in keys {
            id = match self.follow(id, key) {
                Some(next) => next,
                None => {
                    let next = self.add_node(Some((id, key.clone())));
                    self.edges.entry(id).or_default().insert(key.clone(), next);
                    next
                },
            };
        }

        self.nodes.get_mut(&id).and_then(|node| node.value.replace(value))
    }

    /// Remove the value mapped to a key sequence, returning it if there was one.
    ///
    /// Nodes left with neither a value nor any further edges are removed too.
    pub fn remove(&mut self, mode: M, keys: &[K]) -> Option<V> {
        let mut id = self.find(mode, keys)?;
        let old = self.nodes.get_mut(&id)?.value.take()?;

        loop {
            if self.has_edges(id) {
                break;
            }

            let Some(node) = self.nodes.get(&id) else {
                break;
            };

            if node.value.is_some() {
                break;
            }

            let Some((parent, key)) = node.parent.clone() else {
                break;
            };

            self.nodes.remove(&id);
            self.edges.remove(&id);

            if let Some(es) = self.edges.get_mut(&parent) {
                es.remove(&key);
            }

            id = parent;
        }

        Some(old)
    }

    /// Look up a typed key sequence.
    pub fn lookup(&self, mode: M, keys: &[K]) -> Lookup<'_, V> {
        let Some(id) = self.find(mode, keys) else {
            return Lookup::Unmapped;
        };

        let more = self.has_edges(id);
        let value = self.nodes.get(&id).and_then(|node| node.value.as_ref());

        match (value, more) {
            (None, false) => Lookup::Unmapped,
            (None, true) => Lookup::Partial,
            (Some(v), false) => Lookup::Complete(v),
            (Some(v), true) => Lookup::Ambiguous(v),
        }
    }

    /// Get the value mapped to exactly this key sequence.
    pub fn get(&self, mode: M, keys: &[K]) -> Option<&V> {
        let id = self.find(mode, keys)?;

        self.nodes.get(&id)?.value.as_ref()
    }

    /// Whether a mode has any entries.
    pub fn is_mode_empty(&self, mode: M) -> bool {
        self.modes.get(&mode).map(|id| !self.has_edges(*id)).unwrap_or(true)
    }

    /// Return every key sequence mapped in a mode, along with its value.
    pub fn entries(&self, mode: M) -> Vec<(Vec<K>, &V)> {
        let mut res = vec![];

        let Some(root) = self.modes.get(&mode) else {
            return res;
        };

        let mut stack = vec![(*root, vec![])];

        while let Some((id, keys)) = stack.pop() {
            if let Some(v) = self.nodes.get(&id).and_then(|node| node.value.as_ref()) {
                res.push((keys.clone(), v));
            }

            if let Some(es) = self.edges.get(&id) {
                for (key, next) in es.iter() {
                    let mut keys = keys.clone();
                    keys.push(key.clone());
                    stack.push((*next, keys));
                }
            }
        }

        return res;
    }

    /// The number of mapped key sequences across all modes.
    pub fn len(&self) -> usize {
        self.nodes.values().filter(|node| node.value.is_some()).count()
    }

    /// Remove every entry in a mode.
    pub fn clear_mode(&mut self, mode: M) {
        let Some(root) = self.modes.remove(&mode) else {
            return;
        };

        let mut stack = vec![root];

        while let Some(id) = stack.pop() {
            self.nodes.remove(&id);

            if let Some(es) = self.edges.remove(&id) {
                stack.extend(es.into_values());
            }
        }
    }

    /// Remove every entry in every mode.
    pub fn clear(&mut self) {
        self.modes.clear();
        self.nodes.clear();
        self.edges.clear();
    }
}

impl<M, K, V> Default for MappingTable<M, K, V> {
    fn default() -> Self {
        MappingTable {
            idgen: IdGenerator::default(),
            modes: HashMap::new(),
            nodes: HashMap::new(),
            edges: HashMap::new(),
        }
    }
}

impl<M: Debug, K, V> Debug for MappingTable<M, K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappingTable")
            .field("modes", &self.modes.keys().collect::<Vec<_>>())
            .field("nodes", &self.nodes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
    enum TestMode {
        Normal,
        Insert,
    }

    type TestTable = MappingTable<TestMode, char, u32>;

    macro_rules! keys {
        ($s: expr) => {
            $s.chars().collect::<Vec<char>>().as_slice()
        };
    }

    #[test]
    fn test_lookup() {
        let mut table = TestTable::default();

        table.insert(TestMode::Normal, keys!("d"), 1);
        table.insert(TestMode::Normal, keys!("dd"), 2);
        table.insert(TestMode::Normal, keys!("gqq"), 3);

        assert_eq!(table.lookup(TestMode::Normal, keys!("d")), Lookup::Ambiguous(&1));
        assert_eq!(table.lookup(TestMode::Normal, keys!("dd")), Lookup::Complete(&2));
        assert_eq!(table.lookup(TestMode::Normal, keys!("g")), Lookup::Partial);
        assert_eq!(table.lookup(TestMode::Normal, keys!("gq")), Lookup::Partial);
        assert_eq!(table.lookup(TestMode::Normal, keys!("gqq")), Lookup::Complete(&3));
        assert_eq!(table.lookup(TestMode::Normal, keys!("gqqq")), Lookup::Unmapped);
        assert_eq!(table.lookup(TestMode::Normal, keys!("x")), Lookup::Unmapped);

        // Modes don't share entries.
        assert_eq!(table.lookup(TestMode::Insert, keys!("d")), Lookup::Unmapped);
        assert_eq!(table.is_mode_empty(TestMode::Insert), true);
        assert_eq!(table.is_mode_empty(TestMode::Normal), false);
    }

    #[test]
    fn test_insert_replaces() {
        let mut table = TestTable::default();

        assert_eq!(table.insert(TestMode::Insert, keys!("jk"), 1), None);
        assert_eq!(table.insert(TestMode::Insert, keys!("jk"), 2), Some(1));
        assert_eq!(table.get(TestMode::Insert, keys!("jk")), Some(&2));
        assert_eq!(table.len(), 1);

        // Empty sequences are ignored.
        assert_eq!(table.insert(TestMode::Insert, &[], 5), None);
        assert_eq!(table.get(TestMode::Insert, &[]), None);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_remove_prunes() {
        let mut table = TestTable::default();

        table.insert(TestMode::Normal, keys!("abc"), 1);
        table.insert(TestMode::Normal, keys!("a"), 2);

        assert_eq!(table.remove(TestMode::Normal, keys!("ab")), None);
        assert_eq!(table.remove(TestMode::Normal, keys!("abc")), Some(1));

        // "a" still has a value, so it's kept, but is no longer a prefix.
        assert_eq!(table.lookup(TestMode::Normal, keys!("a")), Lookup::Complete(&2));
        assert_eq!(table.lookup(TestMode::Normal, keys!("ab")), Lookup::Unmapped);

        assert_eq!(table.remove(TestMode::Normal, keys!("a")), Some(2));
        assert_eq!(table.is_mode_empty(TestMode::Normal), true);
        assert_eq!(table.nodes.len(), 1);
    }

    #[test]
    fn test_entries_and_clear() {
        let mut table = TestTable::default();

        table.insert(TestMode::Normal, keys!("a"), 1);
        table.insert(TestMode::Normal, keys!("ab"), 2);
        table.insert(TestMode::Insert, keys!("jj"), 3);

        let mut entries = table.entries(TestMode::Normal);
        entries.sort();
        assert_eq!(entries, vec![(vec!['a'], &1), (vec!['a', 'b'], &2)]);

        table.clear_mode(TestMode::Normal);
        assert_eq!(table.entries(TestMode::Normal), vec![]);
        assert_eq!(table.get(TestMode::Insert, keys!("jj")), Some(&3));

        table.clear();
        assert_eq!(table.len(), 0);
    }
}
