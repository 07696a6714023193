//! Traversals over the category forest.
//!
//! Every recursive walk threads a visited-id set and skips ids it has seen,
//! so cyclic or duplicate-id input from the backend degrades to "each id at
//! most once" instead of an infinite loop or duplicated rows. Runtime is
//! O(distinct ids) per call.

use std::collections::HashSet;

use crate::models::{Category, CategoryRow};

/// The set of category ids currently shown expanded.
///
/// Initialized from a freshly loaded forest (root-level categories only),
/// toggled per row, and filled or cleared wholesale by expand-all /
/// collapse-all. A refetch keeps the existing set; only an initial load
/// resets it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpandedKeys {
    keys: HashSet<String>,
}

impl ExpandedKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh-load state: every root-level category starts expanded.
    pub fn for_initial_load(forest: &[Category]) -> Self {
        Self {
            keys: forest.iter().map(|root| root.id.clone()).collect(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.keys.contains(id)
    }

    pub fn expand(&mut self, id: impl Into<String>) {
        self.keys.insert(id.into());
    }

    pub fn collapse(&mut self, id: &str) {
        self.keys.remove(id);
    }

    /// Flips one node between expanded and collapsed.
    pub fn toggle(&mut self, id: &str) {
        if !self.keys.remove(id) {
            self.keys.insert(id.to_string());
        }
    }

    pub fn expand_all(&mut self, forest: &[Category]) {
        self.keys = collect_ids(forest);
    }

    pub fn collapse_all(&mut self) {
        self.keys.clear();
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

fn collect_ids(forest: &[Category]) -> HashSet<String> {
    fn collect(node: &Category, acc: &mut HashSet<String>) {
        if !acc.insert(node.id.clone()) {
            return;
        }
        for child in node.children() {
            collect(child, acc);
        }
    }
    let mut acc = HashSet::new();
    for root in forest {
        collect(root, &mut acc);
    }
    acc
}

/// Flattens the forest into display rows, pre-order, recursing only into
/// expanded nodes.
pub fn flatten<'a>(forest: &'a [Category], expanded: &ExpandedKeys) -> Vec<CategoryRow<'a>> {
    let mut rows = Vec::new();
    let mut visited = HashSet::new();
    for root in forest {
        flatten_into(root, None, 0, expanded, &mut visited, &mut rows);
    }
    rows
}

fn flatten_into<'a>(
    node: &'a Category,
    parent_key: Option<&'a str>,
    level: usize,
    expanded: &ExpandedKeys,
    visited: &mut HashSet<&'a str>,
    rows: &mut Vec<CategoryRow<'a>>,
) {
    if !visited.insert(node.id.as_str()) {
        return;
    }
    rows.push(CategoryRow::for_node(node, parent_key, level));
    if node.has_children() && expanded.contains(&node.id) {
        for child in node.children() {
            flatten_into(child, Some(&node.id), level + 1, expanded, visited, rows);
        }
    }
}

/// Case-insensitive substring search over category names.
///
/// A match pulls its whole ancestor chain into the result so the tree
/// context stays visible. An empty query behaves as a plain flatten over
/// all nodes; a query matching nothing yields an empty sequence.
pub fn search<'a>(forest: &'a [Category], query: &str) -> Vec<CategoryRow<'a>> {
    let mut rows = Vec::new();
    let mut visited = HashSet::new();

    if query.is_empty() {
        for root in forest {
            walk_filtered(root, None, 0, None, &mut visited, &mut rows);
        }
        return rows;
    }

    let needle = query.to_lowercase();
    let mut keep = HashSet::new();
    let mut seen = HashSet::new();
    for root in forest {
        mark_matches(root, &needle, &mut seen, &mut keep);
    }

    for root in forest {
        walk_filtered(root, None, 0, Some(&keep), &mut visited, &mut rows);
    }
    rows
}

/// Pass 1: records each node whose name matches, or which is an ancestor of
/// a match. Returns whether this subtree contributed anything.
fn mark_matches<'a>(
    node: &'a Category,
    needle: &str,
    visited: &mut HashSet<&'a str>,
    keep: &mut HashSet<&'a str>,
) -> bool {
    if !visited.insert(node.id.as_str()) {
        return false;
    }
    let mut included = node.name.to_lowercase().contains(needle);
    for child in node.children() {
        if mark_matches(child, needle, visited, keep) {
            included = true;
        }
    }
    if included {
        keep.insert(node.id.as_str());
    }
    included
}

/// Pass 2: re-flattens, emitting only kept nodes but still recursing through
/// every kept node's children. With no filter, emits everything.
fn walk_filtered<'a>(
    node: &'a Category,
    parent_key: Option<&'a str>,
    level: usize,
    keep: Option<&HashSet<&str>>,
    visited: &mut HashSet<&'a str>,
    rows: &mut Vec<CategoryRow<'a>>,
) {
    if !visited.insert(node.id.as_str()) {
        return;
    }
    if let Some(keep) = keep {
        if !keep.contains(node.id.as_str()) {
            return;
        }
    }
    rows.push(CategoryRow::for_node(node, parent_key, level));
    for child in node.children() {
        walk_filtered(child, Some(&node.id), level + 1, keep, visited, rows);
    }
}

/// Counts all descendants of `node`, not including the node itself.
pub fn count_descendants(node: &Category) -> usize {
    fn count<'a>(node: &'a Category, visited: &mut HashSet<&'a str>) -> usize {
        let mut total = 0;
        for child in node.children() {
            if visited.insert(child.id.as_str()) {
                total += 1 + count(child, visited);
            }
        }
        total
    }
    let mut visited = HashSet::new();
    visited.insert(node.id.as_str());
    count(node, &mut visited)
}

/// Locates a category anywhere in the forest by id.
pub fn find_by_id<'a>(forest: &'a [Category], id: &str) -> Option<&'a Category> {
    fn find<'a>(
        nodes: &'a [Category],
        id: &str,
        visited: &mut HashSet<&'a str>,
    ) -> Option<&'a Category> {
        for node in nodes {
            if !visited.insert(node.id.as_str()) {
                continue;
            }
            if node.id == id {
                return Some(node);
            }
            if let Some(found) = find(node.children(), id, visited) {
                return Some(found);
            }
        }
        None
    }
    let mut visited = HashSet::new();
    find(forest, id, &mut visited)
}

/// True when `candidate_id` sits strictly below `ancestor_id` in the forest.
/// Returns `false` when the ancestor cannot be located, or for a node asked
/// about itself.
pub fn is_descendant_of(candidate_id: &str, ancestor_id: &str, forest: &[Category]) -> bool {
    fn contains<'a>(node: &'a Category, target: &str, visited: &mut HashSet<&'a str>) -> bool {
        for child in node.children() {
            if !visited.insert(child.id.as_str()) {
                continue;
            }
            if child.id == target || contains(child, target, visited) {
                return true;
            }
        }
        false
    }
    match find_by_id(forest, ancestor_id) {
        Some(ancestor) => {
            let mut visited = HashSet::new();
            visited.insert(ancestor.id.as_str());
            contains(ancestor, candidate_id, &mut visited)
        }
        None => false,
    }
}

/// Every node eligible to become the new parent of `id`: the full forest
/// minus the node itself and its descendants, so re-parenting can never
/// introduce a cycle.
pub fn reparent_candidates<'a>(forest: &'a [Category], id: &str) -> Vec<CategoryRow<'a>> {
    let mut rows = Vec::new();
    let mut visited = HashSet::new();
    for root in forest {
        walk_filtered(root, None, 0, None, &mut visited, &mut rows);
    }
    rows.retain(|row| row.id != id && !is_descendant_of(row.id, id, forest));
    rows
}
