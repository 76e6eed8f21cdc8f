//! core::graph
//!
//! Forest representation and operations.
//!
//! # Architecture
//!
//! A label forest is an arena of nodes plus a child -> parent index:
//! - Nodes are label identities (any ordered key)
//! - Edges point from child to parent (stored as a parent pointer)
//! - Roots are nodes without a parent pointer
//!
//! # Invariants
//!
//! - Every node has at most one parent
//! - The forest is acyclic: walking parent pointers always ends at a root
//!
//! Both invariants are enforced by [`ForestGraph::attach`]; nothing else in
//! this module creates edges.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use thiserror::Error;

use super::types::MaxDepth;

/// Reasons an edge cannot be added to the forest.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AttachError<K: std::fmt::Debug> {
    /// One of the endpoints is not a node of this forest.
    #[error("node not found: {0:?}")]
    UnknownNode(K),

    /// The child already has a parent.
    #[error("node {child:?} already has parent {existing:?}")]
    AlreadyParented { child: K, existing: K },

    /// The parent is the child itself or one of its descendants.
    #[error("attaching {child:?} under {parent:?} would create a cycle")]
    WouldCycle { parent: K, child: K },
}

/// One row of a depth-first-by-level walk: the node, its depth below the
/// walk root, and its parent (`None` for the walk root).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkRow<K> {
    pub node: K,
    pub depth: u32,
    pub parent: Option<K>,
}

/// An in-memory forest.
///
/// # Example
///
/// ```
/// use msm::core::graph::ForestGraph;
///
/// let mut forest = ForestGraph::new();
/// forest.insert("lang");
/// forest.insert("python");
/// forest.attach("python", "lang").unwrap();
///
/// assert_eq!(forest.parent(&"python"), Some(&"lang"));
/// assert_eq!(forest.roots().collect::<Vec<_>>(), vec![&"lang"]);
/// assert!(forest.attach("python", "lang").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct ForestGraph<K: Ord + Clone> {
    /// Every node in the forest
    nodes: BTreeSet<K>,
    /// Parent pointer for each non-root node
    parents: BTreeMap<K, K>,
    /// Cached children sets (derived from parents)
    children: BTreeMap<K, BTreeSet<K>>,
}

impl<K: Ord + Clone> Default for ForestGraph<K> {
    fn default() -> Self {
        Self {
            nodes: BTreeSet::new(),
            parents: BTreeMap::new(),
            children: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Clone + std::fmt::Debug> ForestGraph<K> {
    /// Create an empty forest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node as a new root. Returns `false` if it was already present.
    pub fn insert(&mut self, node: K) -> bool {
        self.nodes.insert(node)
    }

    /// Check whether a node is present.
    pub fn contains(&self, node: &K) -> bool {
        self.nodes.contains(node)
    }

    /// Number of nodes in the forest.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check whether the forest has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Make `parent` the parent of `child`.
    ///
    /// The child must currently be a root and must not be an ancestor of
    /// `parent`. The check and the write happen together, so a caller that
    /// holds the forest exclusively cannot race itself into two parents.
    ///
    /// # Errors
    ///
    /// - [`AttachError::UnknownNode`] if either endpoint is absent
    /// - [`AttachError::AlreadyParented`] if the child has a parent
    /// - [`AttachError::WouldCycle`] if `parent` is `child` or lies below it
    pub fn attach(&mut self, child: K, parent: K) -> Result<(), AttachError<K>> {
        if !self.nodes.contains(&child) {
            return Err(AttachError::UnknownNode(child));
        }
        if !self.nodes.contains(&parent) {
            return Err(AttachError::UnknownNode(parent));
        }
        if let Some(existing) = self.parents.get(&child) {
            return Err(AttachError::AlreadyParented {
                child,
                existing: existing.clone(),
            });
        }
        // A childless node has no descendants, so only `parent == child` can cycle.
        if parent == child || (self.children.contains_key(&child) && self.reaches(&parent, &child)) {
            return Err(AttachError::WouldCycle { parent, child });
        }

        self.children
            .entry(parent.clone())
            .or_default()
            .insert(child.clone());
        self.parents.insert(child, parent);
        Ok(())
    }

    /// Remove the edge `parent -> child`.
    ///
    /// Returns `false` (and changes nothing) if that exact edge is absent.
    pub fn detach(&mut self, parent: &K, child: &K) -> bool {
        if self.parents.get(child) != Some(parent) {
            return false;
        }
        self.parents.remove(child);
        if let Some(siblings) = self.children.get_mut(parent) {
            siblings.remove(child);
            if siblings.is_empty() {
                self.children.remove(parent);
            }
        }
        true
    }

    /// Remove a node and every edge touching it.
    ///
    /// Its children become roots; they are returned in order. Removing an
    /// absent node returns an empty list.
    pub fn remove(&mut self, node: &K) -> Vec<K> {
        if !self.nodes.remove(node) {
            return Vec::new();
        }
        if let Some(parent) = self.parents.remove(node) {
            if let Some(siblings) = self.children.get_mut(&parent) {
                siblings.remove(node);
                if siblings.is_empty() {
                    self.children.remove(&parent);
                }
            }
        }
        let orphans: Vec<K> = self
            .children
            .remove(node)
            .map(|set| set.into_iter().collect())
            .unwrap_or_default();
        for orphan in &orphans {
            self.parents.remove(orphan);
        }
        orphans
    }

    /// Get the parent of a node.
    pub fn parent(&self, node: &K) -> Option<&K> {
        self.parents.get(node)
    }

    /// Get the children of a node, in key order.
    pub fn children(&self, node: &K) -> impl Iterator<Item = &K> {
        self.children.get(node).into_iter().flatten()
    }

    /// Iterate over nodes without a parent, in key order.
    pub fn roots(&self) -> impl Iterator<Item = &K> {
        self.nodes.iter().filter(|n| !self.parents.contains_key(*n))
    }

    /// Iterate over every node, in key order.
    pub fn nodes(&self) -> impl Iterator<Item = &K> {
        self.nodes.iter()
    }

    /// Get all ancestors of a node (parent, grandparent, etc.).
    ///
    /// Returns ancestors in order from immediate parent to root.
    ///
    /// # Example
    ///
    /// ```
    /// use msm::core::graph::ForestGraph;
    ///
    /// let mut forest = ForestGraph::new();
    /// for n in ["a", "b", "c"] {
    ///     forest.insert(n);
    /// }
    /// forest.attach("b", "a").unwrap();
    /// forest.attach("c", "b").unwrap();
    ///
    /// assert_eq!(forest.ancestors(&"c"), vec!["b", "a"]);
    /// ```
    pub fn ancestors(&self, node: &K) -> Vec<K> {
        let mut result = Vec::new();
        let mut seen = BTreeSet::new();
        let mut current = self.parent(node);

        while let Some(parent) = current {
            // A corrupted index could loop; stop once we come back around.
            if parent == node || !seen.insert(parent) {
                break;
            }
            result.push(parent.clone());
            current = self.parent(parent);
        }

        result
    }

    /// Whether `target` is `from` or one of its ancestors.
    ///
    /// The walk is capped at the node count, so a corrupted index ends it.
    fn reaches(&self, from: &K, target: &K) -> bool {
        let mut current = Some(from);
        for _ in 0..=self.nodes.len() {
            match current {
                Some(node) if node == target => return true,
                Some(node) => current = self.parent(node),
                None => return false,
            }
        }
        false
    }

    /// Path from the root of `node`'s tree down to `node`, inclusive.
    pub fn path_from_root(&self, node: &K) -> Vec<K> {
        let mut path = self.ancestors(node);
        path.reverse();
        path.push(node.clone());
        path
    }

    /// Walk the tree below `root` level by level.
    ///
    /// Rows come out ordered by depth (root first), children in key order.
    /// Nodes deeper than `max_depth` are never visited. An absent root
    /// yields no rows.
    ///
    /// # Example
    ///
    /// ```
    /// use msm::core::graph::ForestGraph;
    /// use msm::core::types::MaxDepth;
    ///
    /// let mut forest = ForestGraph::new();
    /// for n in ["a", "b", "c"] {
    ///     forest.insert(n);
    /// }
    /// forest.attach("b", "a").unwrap();
    /// forest.attach("c", "b").unwrap();
    ///
    /// let rows = forest.walk(&"a", MaxDepth::Limited(1));
    /// assert_eq!(rows.len(), 2);
    /// assert_eq!(rows[1].parent, Some("a"));
    /// ```
    pub fn walk(&self, root: &K, max_depth: MaxDepth) -> Vec<WalkRow<K>> {
        let mut rows = Vec::new();
        if !self.nodes.contains(root) {
            return rows;
        }

        let mut queue = VecDeque::new();
        queue.push_back((root.clone(), 0u32, None));

        while let Some((node, depth, parent)) = queue.pop_front() {
            if max_depth.allows(depth + 1) {
                for child in self.children(&node) {
                    queue.push_back((child.clone(), depth + 1, Some(node.clone())));
                }
            }
            rows.push(WalkRow {
                node,
                depth,
                parent,
            });
        }

        rows
    }

    /// Check if the parent index contains a cycle.
    ///
    /// Returns `Some(node)` if a cycle is reachable from that node. A forest
    /// built only through [`attach`](Self::attach) never has one; this is
    /// for verifying data loaded from elsewhere.
    pub fn find_cycle(&self) -> Option<K> {
        let mut visited = BTreeSet::new();

        for start in self.parents.keys() {
            if visited.contains(start) {
                continue;
            }
            let mut path = BTreeSet::new();
            let mut current = Some(start);
            while let Some(node) = current {
                if path.contains(node) {
                    return Some(node.clone());
                }
                if visited.contains(node) {
                    break;
                }
                path.insert(node.clone());
                current = self.parents.get(node);
            }
            visited.extend(path);
        }
        None
    }

    /// Insert a parent pointer without any checks.
    ///
    /// Used to load edges that were written elsewhere so they can be
    /// verified; an existing parent pointer is overwritten.
    pub fn insert_edge_unchecked(&mut self, child: K, parent: K) {
        self.nodes.insert(child.clone());
        self.nodes.insert(parent.clone());
        if let Some(old) = self.parents.insert(child.clone(), parent.clone()) {
            if let Some(siblings) = self.children.get_mut(&old) {
                siblings.remove(&child);
            }
        }
        self.children.entry(parent).or_default().insert(child);
    }
}
