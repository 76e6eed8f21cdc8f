//! core::tree
//!
//! Nested label trees: flattening caller input into `(name, parent)` pairs
//! and rebuilding nested trees from flat traversal rows.
//!
//! # Flattening
//!
//! Tree input arrives nested to any depth. It is flattened with an explicit
//! depth-first walk before any store interaction, so duplicate names are
//! caught without asking the store anything.
//!
//! # Depth
//!
//! Nested input is accepted up to [`MAX_INPUT_LEVELS`] levels per request,
//! which keeps every request inside `serde_json`'s nesting limit. Stored
//! trees have no such bound; deeper trees are built level by level. Every
//! walk here is iterative, and so is dropping a [`TreeNode`].
//!
//! # Reconstruction
//!
//! A traversal returns one [`TraversalRow`] per node: its name, depth below
//! the root, and the name of its parent on the path (absent for the root).
//! [`assemble`] turns those rows back into a [`TreeNode`]. Rows that do not
//! describe exactly one tree mean the stored forest is broken, which is a
//! [`TreeError`], not a missing-label condition.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{Category, LabelName};

/// Most levels a single piece of nested tree input may have, root included.
pub const MAX_INPUT_LEVELS: u32 = 60;

/// A node of a label tree, with its children in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TreeNode {
    pub name: LabelName,
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Create a leaf node.
    pub fn leaf(name: LabelName) -> Self {
        Self {
            name,
            children: Vec::new(),
        }
    }

    /// Create a node with children.
    pub fn with_children(name: LabelName, children: Vec<TreeNode>) -> Self {
        Self { name, children }
    }

    /// Every name in this tree, root included.
    pub fn names(&self) -> BTreeSet<LabelName> {
        let mut names = BTreeSet::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            names.insert(node.name.clone());
            stack.extend(node.children.iter());
        }
        names
    }

    /// Number of nodes in this tree, root included.
    pub fn len(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }

    /// A tree always holds at least its root.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Height of the tree in edges (a leaf has depth 0).
    pub fn depth(&self) -> u32 {
        let mut max = 0;
        let mut stack = vec![(self, 0u32)];
        while let Some((node, depth)) = stack.pop() {
            max = max.max(depth);
            stack.extend(node.children.iter().map(|c| (c, depth + 1)));
        }
        max
    }
}

impl Drop for TreeNode {
    fn drop(&mut self) {
        // Unlink children first so a deep chain drops without recursing.
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// A tree together with the category all of its labels share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetadataTree {
    pub category: Category,
    pub root: TreeNode,
}

/// One label of flattened tree input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatNode {
    pub name: LabelName,
    pub parent_name: Option<LabelName>,
}

impl FlatNode {
    /// A node with no parent.
    pub fn root(name: LabelName) -> Self {
        Self {
            name,
            parent_name: None,
        }
    }

    /// A node hanging under `parent`.
    pub fn child(name: LabelName, parent: LabelName) -> Self {
        Self {
            name,
            parent_name: Some(parent),
        }
    }
}

/// One node reported by a tree traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraversalRow {
    pub name: LabelName,
    pub depth: u32,
    pub parent_name: Option<LabelName>,
}

impl TraversalRow {
    /// Create a traversal row.
    pub fn new(name: LabelName, depth: u32, parent_name: Option<LabelName>) -> Self {
        Self {
            name,
            depth,
            parent_name,
        }
    }
}

/// Traversal rows that do not form a single tree.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("traversal returned no root row")]
    NoRoot,

    #[error("traversal returned more than one root row: '{0}' and '{1}'")]
    MultipleRoots(LabelName, LabelName),

    #[error("label '{0}' appears more than once in the traversal")]
    DuplicateNode(LabelName),

    #[error("label '{node}' names parent '{parent}' which is not in the traversal")]
    MissingParent { node: LabelName, parent: LabelName },

    #[error("{0} traversal rows are not connected to the root")]
    Disconnected(usize),
}

/// Flatten a nested tree into `(name, parent)` pairs, root first.
///
/// The walk is depth-first pre-order, so every parent precedes its children.
///
/// # Example
///
/// ```
/// use msm::core::tree::{flatten, TreeNode};
/// use msm::core::types::LabelName;
///
/// let n = |s: &str| LabelName::new(s).unwrap();
/// let tree = TreeNode::with_children(
///     n("lang"),
///     vec![TreeNode::with_children(n("python"), vec![TreeNode::leaf(n("django"))])],
/// );
///
/// let flat = flatten(&tree);
/// assert_eq!(flat.len(), 3);
/// assert_eq!(flat[0].parent_name, None);
/// assert_eq!(flat[2].parent_name, Some(n("python")));
/// ```
pub fn flatten(root: &TreeNode) -> Vec<FlatNode> {
    let mut flat = Vec::new();
    push_preorder(root, None, &mut flat);
    flat
}

/// Flatten `children` as if they hung below an existing label `root`.
///
/// The root itself is not part of the output; the top-level children name
/// it as their parent.
pub fn flatten_under(root: &LabelName, children: &[TreeNode]) -> Vec<FlatNode> {
    let mut flat = Vec::new();
    for child in children {
        push_preorder(child, Some(root), &mut flat);
    }
    flat
}

fn push_preorder(node: &TreeNode, parent: Option<&LabelName>, out: &mut Vec<FlatNode>) {
    let mut stack: Vec<(&TreeNode, Option<&LabelName>)> = vec![(node, parent)];
    while let Some((node, parent)) = stack.pop() {
        out.push(FlatNode {
            name: node.name.clone(),
            parent_name: parent.cloned(),
        });
        for child in node.children.iter().rev() {
            stack.push((child, Some(&node.name)));
        }
    }
}

/// Find the first name that occurs twice in flattened input.
pub fn first_duplicate(flat: &[FlatNode]) -> Option<&LabelName> {
    let mut seen = HashSet::with_capacity(flat.len());
    flat.iter()
        .map(|node| &node.name)
        .find(|name| !seen.insert(*name))
}

/// Rebuild a nested tree from traversal rows.
///
/// Every row becomes a node; each non-root row is appended under the row
/// its `parent_name` points at, in row order. The single row without a
/// parent is the root.
///
/// # Errors
///
/// Any [`TreeError`]: no root row, several root rows, repeated names,
/// dangling parent names, or rows unreachable from the root.
///
/// # Example
///
/// ```
/// use msm::core::tree::{assemble, TraversalRow};
/// use msm::core::types::LabelName;
///
/// let n = |s: &str| LabelName::new(s).unwrap();
/// let rows = vec![
///     TraversalRow::new(n("lang"), 0, None),
///     TraversalRow::new(n("python"), 1, Some(n("lang"))),
///     TraversalRow::new(n("rust"), 1, Some(n("lang"))),
/// ];
///
/// let root = assemble(rows).unwrap();
/// assert_eq!(root.name, n("lang"));
/// assert_eq!(root.children.len(), 2);
/// ```
pub fn assemble(rows: Vec<TraversalRow>) -> Result<TreeNode, TreeError> {
    let mut root: Option<LabelName> = None;
    let mut seen: HashSet<&LabelName> = HashSet::with_capacity(rows.len());
    let mut children: HashMap<&LabelName, Vec<&LabelName>> = HashMap::new();

    for row in &rows {
        if !seen.insert(&row.name) {
            return Err(TreeError::DuplicateNode(row.name.clone()));
        }
        match &row.parent_name {
            None => {
                if let Some(existing) = &root {
                    return Err(TreeError::MultipleRoots(existing.clone(), row.name.clone()));
                }
                root = Some(row.name.clone());
            }
            Some(parent) => children.entry(parent).or_default().push(&row.name),
        }
    }

    for row in &rows {
        if let Some(parent) = &row.parent_name {
            if !seen.contains(parent) {
                return Err(TreeError::MissingParent {
                    node: row.name.clone(),
                    parent: parent.clone(),
                });
            }
        }
    }

    let root = root.ok_or(TreeError::NoRoot)?;
    let built = build_node(&root, &children);
    let placed = built.len();
    if placed != rows.len() {
        return Err(TreeError::Disconnected(rows.len() - placed));
    }
    Ok(built)
}

/// Build the subtree under `name` from the children index, without
/// recursion so deep chains cannot exhaust the stack.
fn build_node(name: &LabelName, children: &HashMap<&LabelName, Vec<&LabelName>>) -> TreeNode {
    // Post-order: a node is finished once all of its children are.
    let mut stack: Vec<(&LabelName, Vec<TreeNode>, usize)> = vec![(name, Vec::new(), 0)];
    loop {
        let Some((current, _, next)) = stack.last() else {
            // The loop only exits through the return below.
            return TreeNode::leaf(name.clone());
        };
        let kids = children.get(*current).map(Vec::as_slice).unwrap_or(&[]);
        if let Some(child) = kids.get(*next) {
            let child = *child;
            if let Some(top) = stack.last_mut() {
                top.2 += 1;
            }
            stack.push((child, Vec::new(), 0));
            continue;
        }

        let (finished, built_children, _) = match stack.pop() {
            Some(frame) => frame,
            None => return TreeNode::leaf(name.clone()),
        };
        let node = TreeNode::with_children(finished.clone(), built_children);
        match stack.last_mut() {
            Some(parent) => parent.1.push(node),
            None => return node,
        }
    }
}
