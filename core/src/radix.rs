//! Compressed prefix tree over normalized terms, used for suggestions.
//!
//! Every edge carries a non-empty label. Children are keyed by the first
//! character of their label, so siblings never share a leading character and
//! traversal visits them in lexicographic order.

use crate::error::{Result, SearchError};
use crate::tokenizer::normalize_term;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Default)]
struct RadixNode {
    label: String,
    terminal: bool,
    children: BTreeMap<char, RadixNode>,
}

impl RadixNode {
    fn leaf(label: &str) -> Self {
        Self { label: label.to_string(), terminal: true, children: BTreeMap::new() }
    }

    /// Copy of this node without its children.
    fn shallow(&self) -> Self {
        Self { label: self.label.clone(), terminal: self.terminal, children: BTreeMap::new() }
    }

    /// Cut this edge after `at` bytes; the tail becomes the single child that
    /// inherits the old terminal flag and children.
    fn split(&mut self, at: usize) {
        let tail = self.label.split_off(at);
        let first = first_char(&tail);
        let old = RadixNode {
            label: tail,
            terminal: std::mem::replace(&mut self.terminal, false),
            children: std::mem::take(&mut self.children),
        };
        self.children.insert(first, old);
    }
}

fn first_char(s: &str) -> char {
    s.chars().next().unwrap_or_default()
}

/// Byte length of the longest common prefix, always on a char boundary.
fn common_prefix_len(a: &str, b: &str) -> usize {
    a.char_indices()
        .zip(b.chars())
        .find(|((_, ca), cb)| ca != cb)
        .map(|((i, _), _)| i)
        .unwrap_or_else(|| a.len().min(b.len()))
}

#[derive(Default)]
pub struct RadixTree {
    root: RadixNode,
    len: usize,
}

impl RadixTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a word. Returns `true` if it was not already present; empty
    /// words are ignored.
    pub fn insert(&mut self, word: &str) -> bool {
        let word = normalize_term(word);
        if word.is_empty() {
            return false;
        }
        let mut node = &mut self.root;
        let mut rest = word.as_str();
        loop {
            let first = first_char(rest);
            let child = match node.children.entry(first) {
                Entry::Vacant(slot) => {
                    slot.insert(RadixNode::leaf(rest));
                    self.len += 1;
                    return true;
                }
                Entry::Occupied(slot) => slot.into_mut(),
            };
            let common = common_prefix_len(&child.label, rest);
            if common < child.label.len() {
                child.split(common);
                let remainder = &rest[common..];
                if remainder.is_empty() {
                    child.terminal = true;
                } else {
                    debug_assert!(!child.children.contains_key(&first_char(remainder)));
                    child.children.insert(first_char(remainder), RadixNode::leaf(remainder));
                }
                self.len += 1;
                return true;
            }
            rest = &rest[common..];
            if rest.is_empty() {
                let added = !child.terminal;
                child.terminal = true;
                if added {
                    self.len += 1;
                }
                return added;
            }
            node = child;
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        let word = normalize_term(word);
        let mut node = &self.root;
        let mut rest = word.as_str();
        while !rest.is_empty() {
            match node.children.get(&first_char(rest)) {
                Some(child) if rest.starts_with(child.label.as_str()) => {
                    rest = &rest[child.label.len()..];
                    node = child;
                }
                _ => return false,
            }
        }
        node.terminal && !word.is_empty()
    }

    /// Every stored word starting with `prefix`, in lexicographic order.
    /// A prefix that matches nothing yields an empty vector.
    pub fn autocomplete(&self, prefix: &str) -> Vec<String> {
        let prefix = normalize_term(prefix);
        let mut node = &self.root;
        let mut path = String::new();
        let mut rest = prefix.as_str();
        while !rest.is_empty() {
            let Some(child) = node.children.get(&first_char(rest)) else {
                return Vec::new();
            };
            if rest.starts_with(child.label.as_str()) {
                rest = &rest[child.label.len()..];
            } else if child.label.starts_with(rest) {
                // prefix ends inside this edge
                rest = "";
            } else {
                return Vec::new();
            }
            path.push_str(&child.label);
            node = child;
        }
        collect_words(node, path)
    }

    pub fn words(&self) -> Vec<String> {
        self.autocomplete("")
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Walk the whole tree and report the first structural defect.
    pub fn validate(&self) -> Result<()> {
        let mut words = 0usize;
        let mut stack = vec![(&self.root, true)];
        while let Some((node, is_root)) = stack.pop() {
            if node.terminal {
                words += 1;
            }
            if !is_root {
                if node.label.is_empty() {
                    return Err(SearchError::InvariantViolation("empty edge label".into()));
                }
                if node.children.is_empty() && !node.terminal {
                    return Err(SearchError::InvariantViolation(format!(
                        "dangling edge {:?} ends no word",
                        node.label
                    )));
                }
                if node.children.len() == 1 && !node.terminal {
                    return Err(SearchError::InvariantViolation(format!(
                        "edge {:?} has a single child and should be merged with it",
                        node.label
                    )));
                }
            }
            for (key, child) in &node.children {
                if !child.label.starts_with(*key) {
                    return Err(SearchError::InvariantViolation(format!(
                        "edge {:?} filed under {:?}",
                        child.label, key
                    )));
                }
                stack.push((child, false));
            }
        }
        if words != self.len {
            return Err(SearchError::InvariantViolation(format!(
                "tree holds {words} words, expected {}",
                self.len
            )));
        }
        Ok(())
    }
}

impl Clone for RadixTree {
    // rebuilt with an explicit stack; derived Clone would recurse per level
    fn clone(&self) -> Self {
        // nodes under construction, one per depth, with the key they go under
        let mut building: Vec<(char, RadixNode)> = vec![('\0', self.root.shallow())];
        let mut todo: Vec<(char, &RadixNode, usize)> =
            self.root.children.iter().rev().map(|(k, c)| (*k, c, 1)).collect();
        while let Some((key, node, depth)) = todo.pop() {
            while building.len() > depth {
                attach_last(&mut building);
            }
            building.push((key, node.shallow()));
            todo.extend(node.children.iter().rev().map(|(k, c)| (*k, c, depth + 1)));
        }
        while building.len() > 1 {
            attach_last(&mut building);
        }
        let root = building.pop().map(|(_, node)| node).unwrap_or_default();
        RadixTree { root, len: self.len }
    }
}

fn attach_last(building: &mut Vec<(char, RadixNode)>) {
    if let Some((key, done)) = building.pop() {
        if let Some((_, parent)) = building.last_mut() {
            parent.children.insert(key, done);
        }
    }
}

impl fmt::Debug for RadixTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RadixTree")
            .field("len", &self.len)
            .field("edges", &self.root.children.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Drop for RadixTree {
    // iterative so long single-child chains don't recurse through drop glue
    fn drop(&mut self) {
        let mut stack: Vec<RadixNode> = std::mem::take(&mut self.root.children).into_values().collect();
        while let Some(mut node) = stack.pop() {
            stack.extend(std::mem::take(&mut node.children).into_values());
        }
    }
}

/// Depth-first collection with an explicit stack so deep chains cannot
/// overflow the call stack.
fn collect_words(start: &RadixNode, path: String) -> Vec<String> {
    let mut out = Vec::new();
    let mut stack = vec![(start, path)];
    while let Some((node, path)) = stack.pop() {
        if node.terminal {
            out.push(path.clone());
        }
        for child in node.children.values().rev() {
            let mut next = path.clone();
            next.push_str(&child.label);
            stack.push((child, next));
        }
    }
    out
}

impl<S: AsRef<str>> Extend<S> for RadixTree {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for word in iter {
            self.insert(word.as_ref());
        }
    }
}

impl<S: AsRef<str>> FromIterator<S> for RadixTree {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut tree = RadixTree::new();
        tree.extend(iter);
        tree
    }
}
