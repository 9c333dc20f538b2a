//! Character trie for dictionary lookups.
//!
//! Nodes live in an arena owned by the [`Trie`]. Children are owning edges
//! (parent → child ids); every node also keeps a non-owning link back to its
//! parent, which is only used to rebuild the word a node spells and to reject
//! cyclic attachments.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};

/// Index of a node inside its trie
pub type NodeId = usize;

/// The root node id of every trie
pub const ROOT: NodeId = 0;

/// Character stored on the root node; never part of a word
const ROOT_CHAR: char = '\u{00FB}';

/// Result of looking a string up in the trie
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// No path spells the string
    NotFound,
    /// A path exists but does not end on a complete word
    PrefixOnly,
    /// The string is a dictionary word
    CompleteWord,
}

/// A node in the Trie
#[derive(Debug, Clone)]
pub struct TrieNode {
    ch: char,
    children: HashMap<char, NodeId>,
    parent: Option<NodeId>,
    is_word: bool,
}

impl TrieNode {
    fn new(ch: char) -> Self {
        TrieNode {
            ch,
            children: HashMap::new(),
            parent: None,
            is_word: false,
        }
    }

    /// The character on this node
    pub fn ch(&self) -> char {
        self.ch
    }

    /// Whether the path to this node spells a complete word
    pub fn is_word(&self) -> bool {
        self.is_word
    }

    /// Parent node, `None` for the root and for detached nodes
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Check if this node has any children
    pub fn can_walk(&self) -> bool {
        !self.children.is_empty()
    }
}

/// A character-keyed prefix tree
#[derive(Debug, Clone)]
pub struct Trie {
    nodes: Vec<TrieNode>,
    word_count: usize,
}

impl Default for Trie {
    fn default() -> Self {
        Trie {
            nodes: vec![TrieNode::new(ROOT_CHAR)],
            word_count: 0,
        }
    }
}

impl Trie {
    /// Create a new empty Trie
    pub fn new() -> Self {
        Trie::default()
    }

    /// Number of complete words
    pub fn len(&self) -> usize {
        self.word_count
    }

    /// Check if the trie holds no words
    pub fn is_empty(&self) -> bool {
        self.word_count == 0
    }

    /// Number of nodes, root included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Borrow a node by id
    pub fn node(&self, id: NodeId) -> &TrieNode {
        &self.nodes[id]
    }

    /// Add a word. Returns `false` if it was already present.
    ///
    /// The part of the word that has no path yet is built bottom-up, leaf
    /// first, and attached to the existing path as one subtree, so the
    /// ancestry check on attach runs once per word instead of once per node.
    ///
    /// # Panics
    ///
    /// Panics if `word` is empty.
    pub fn insert(&mut self, word: &str) -> bool {
        assert!(!word.is_empty(), "cannot insert an empty word into a trie");

        let chars: Vec<char> = word.chars().collect();
        let mut current = ROOT;
        let mut depth = 0;
        while depth < chars.len() {
            match self.nodes[current].children.get(&chars[depth]) {
                Some(&child) => {
                    current = child;
                    depth += 1;
                }
                None => break,
            }
        }

        if depth == chars.len() {
            if self.nodes[current].is_word {
                return false;
            }
            self.nodes[current].is_word = true;
            self.word_count += 1;
            return true;
        }

        let last = chars.len() - 1;
        let mut subtree = self.push_node(chars[last]);
        self.nodes[subtree].is_word = true;
        for &ch in chars[depth..last].iter().rev() {
            let node = self.push_node(ch);
            self.attach(node, subtree);
            subtree = node;
        }
        self.attach(current, subtree);

        self.word_count += 1;
        true
    }

    fn push_node(&mut self, ch: char) -> NodeId {
        self.nodes.push(TrieNode::new(ch));
        self.nodes.len() - 1
    }

    /// Link a detached subtree under `parent`.
    fn attach(&mut self, parent: NodeId, child: NodeId) {
        assert!(
            self.nodes[child].parent.is_none(),
            "node still belongs to another parent"
        );
        let ch = self.nodes[child].ch;
        assert!(
            !self.nodes[parent].children.contains_key(&ch),
            "duplicate child '{}' under the same parent",
            ch
        );
        assert!(
            !self.is_descendant(parent, child),
            "cannot attach a node below itself"
        );

        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.insert(ch, child);
    }

    /// True if `node` is `ancestor` or lies below it.
    fn is_descendant(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes[id].parent;
        }
        false
    }

    /// Walk the trie by one character
    pub fn walk(&self, node: NodeId, ch: char) -> Option<NodeId> {
        self.nodes[node].children.get(&ch).copied()
    }

    /// Node reached by spelling `text` from the root
    pub fn find(&self, text: &str) -> Option<NodeId> {
        text.chars().try_fold(ROOT, |node, ch| self.walk(node, ch))
    }

    /// Look `text` up
    pub fn classify(&self, text: &str) -> Lookup {
        match self.find(text) {
            None => Lookup::NotFound,
            Some(id) if self.nodes[id].is_word => Lookup::CompleteWord,
            Some(_) => Lookup::PrefixOnly,
        }
    }

    /// Check if a word exists in the trie
    pub fn contains(&self, word: &str) -> bool {
        self.classify(word) == Lookup::CompleteWord
    }

    /// Whether some path starts with `prefix`
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.find(prefix).is_some()
    }

    /// All complete words starting with `prefix`. Order is not significant.
    pub fn words_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut words = Vec::new();
        let Some(start) = self.find(prefix) else {
            return words;
        };

        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            if node.is_word {
                words.push(self.word_at(id));
            }
            stack.extend(node.children.values().copied());
        }
        words
    }

    /// The string spelled from the root down to `node`
    pub fn word_at(&self, node: NodeId) -> String {
        let mut chars = Vec::new();
        let mut current = node;
        while let Some(parent) = self.nodes[current].parent {
            chars.push(self.nodes[current].ch);
            current = parent;
        }
        chars.iter().rev().collect()
    }

    /// Number of edges between `node` and the root
    pub fn height(&self, node: NodeId) -> usize {
        let mut height = 0;
        let mut current = node;
        while let Some(parent) = self.nodes[current].parent {
            height += 1;
            current = parent;
        }
        height
    }
}

/// Builder for loading a Trie from dictionary files
pub struct TrieBuilder {
    trie: Trie,
}

impl TrieBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        TrieBuilder { trie: Trie::new() }
    }

    /// Start from an existing trie
    pub fn from_trie(trie: Trie) -> Self {
        TrieBuilder { trie }
    }

    /// Add one word; blank input is ignored
    pub fn add(&mut self, word: &str) -> bool {
        let word: String = word.trim().nfc().collect();
        if word.is_empty() {
            return false;
        }
        self.trie.insert(&word)
    }

    /// Load words from dictionary text, one entry per line.
    ///
    /// Returns the number of new words.
    pub fn load_lines(&mut self, content: &str) -> usize {
        content.lines().filter(|line| self.add(line)).count()
    }

    /// Load a dictionary file
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let added = self.load_lines(&content);
        log::info!("loaded {} words from {}", added, path.display());
        Ok(added)
    }

    /// Build and return the Trie
    pub fn build(self) -> Trie {
        self.trie
    }
}

impl Default for TrieBuilder {
    fn default() -> Self {
        Self::new()
    }
}
