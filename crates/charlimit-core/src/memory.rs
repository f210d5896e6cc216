//! In-memory document implementing the host capability traits.
//!
//! [`MemoryDocument`] is a flat node table with parent/child links. It is
//! serializable, so a document snapshot can be checked without a live host,
//! and it records every notification and the close signal for inspection.
//! Node positions are stored relative to their parent; absolute bounds are
//! the sum of the offsets up to the page.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HostError, HostResult};
use crate::host::{Bounds, DocumentTree, Host, NodeId, NodeKind, Paint, Rgb};

/// A single node in a [`MemoryDocument`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryNode {
    /// Type tag.
    pub kind: NodeKind,
    /// Display name.
    pub name: String,
    /// Parent node, `None` for the page.
    #[serde(default)]
    pub parent: Option<NodeId>,
    /// Child ids in document order. `None` for leaves.
    #[serde(default)]
    pub children: Option<Vec<NodeId>>,
    /// Text content (text nodes only).
    #[serde(default)]
    pub characters: String,
    /// Position relative to the parent, and size.
    #[serde(default)]
    pub bounds: Bounds,
    /// Fill list.
    #[serde(default)]
    pub fills: Vec<Paint>,
    /// Layer opacity.
    #[serde(default = "full_opacity")]
    pub opacity: f64,
    /// Persisted key-value store.
    #[serde(default)]
    pub plugin_data: BTreeMap<String, String>,
}

const fn full_opacity() -> f64 {
    1.0
}

impl MemoryNode {
    fn new(kind: NodeKind, name: &str) -> Self {
        let children = matches!(
            kind,
            NodeKind::Document | NodeKind::Page | NodeKind::Frame | NodeKind::Group
        )
        .then(Vec::new);
        Self {
            kind,
            name: name.to_string(),
            parent: None,
            children,
            characters: String::new(),
            bounds: Bounds::default(),
            fills: Vec::new(),
            opacity: full_opacity(),
            plugin_data: BTreeMap::new(),
        }
    }
}

/// A notification shown through [`Host::notify`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Message text.
    pub message: String,
    /// Requested display duration.
    pub timeout: Duration,
}

/// A self-contained document with one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryDocument {
    page: NodeId,
    nodes: HashMap<NodeId, MemoryNode>,
    #[serde(default)]
    selection: Vec<NodeId>,
    #[serde(default)]
    next_id: u64,
    #[serde(skip)]
    notifications: Vec<Notification>,
    #[serde(skip)]
    close_count: usize,
    #[serde(skip)]
    read_only: HashSet<NodeId>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Create a document holding an empty page.
    pub fn new() -> Self {
        let page = NodeId::from("0:1");
        let mut nodes = HashMap::new();
        nodes.insert(page.clone(), MemoryNode::new(NodeKind::Page, "Page 1"));
        Self {
            page,
            nodes,
            selection: Vec::new(),
            next_id: 1,
            notifications: Vec::new(),
            close_count: 0,
            read_only: HashSet::new(),
        }
    }

    /// Load a document snapshot from JSON.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Id of the page.
    pub fn page(&self) -> NodeId {
        self.page.clone()
    }

    /// Borrow a node by id.
    pub fn node(&self, id: &NodeId) -> Option<&MemoryNode> {
        self.nodes.get(id)
    }

    /// Add a frame under `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is missing or cannot hold children.
    pub fn add_frame(&mut self, parent: &NodeId, name: &str, bounds: Bounds) -> NodeId {
        let id = self.insert(parent, MemoryNode::new(NodeKind::Frame, name));
        self.node_mut(&id).bounds = bounds;
        id
    }

    /// Add a group under `parent`. Groups add no positional offset.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is missing or cannot hold children.
    pub fn add_group(&mut self, parent: &NodeId, name: &str) -> NodeId {
        self.insert(parent, MemoryNode::new(NodeKind::Group, name))
    }

    /// Add a text node under `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is missing or cannot hold children.
    pub fn add_text(
        &mut self,
        parent: &NodeId,
        name: &str,
        characters: &str,
        bounds: Bounds,
    ) -> NodeId {
        let id = self.insert(parent, MemoryNode::new(NodeKind::Text, name));
        let node = self.node_mut(&id);
        node.characters = characters.to_string();
        node.bounds = bounds;
        id
    }

    /// Add a non-container leaf of the given kind under `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is missing or cannot hold children.
    pub fn add_shape(
        &mut self,
        parent: &NodeId,
        name: &str,
        kind: NodeKind,
        bounds: Bounds,
    ) -> NodeId {
        let mut node = MemoryNode::new(kind, name);
        node.children = None;
        let id = self.insert(parent, node);
        self.node_mut(&id).bounds = bounds;
        id
    }

    /// Replace a text node's content.
    ///
    /// # Panics
    ///
    /// Panics if `id` is missing.
    pub fn set_characters(&mut self, id: &NodeId, characters: &str) {
        self.node_mut(id).characters = characters.to_string();
    }

    /// Rename a node outside of a run.
    ///
    /// # Panics
    ///
    /// Panics if `id` is missing.
    pub fn rename(&mut self, id: &NodeId, name: &str) {
        self.node_mut(id).name = name.to_string();
    }

    /// Move a node relative to its parent outside of a run.
    ///
    /// # Panics
    ///
    /// Panics if `id` is missing.
    pub fn set_bounds(&mut self, id: &NodeId, bounds: Bounds) {
        self.node_mut(id).bounds = bounds;
    }

    /// Replace the current selection.
    pub fn select(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        self.selection = ids.into_iter().collect();
    }

    /// Make every write to `id` fail with [`HostError::Rejected`].
    pub fn make_read_only(&mut self, id: &NodeId) {
        self.read_only.insert(id.clone());
    }

    /// Notifications shown so far, oldest first.
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// How many times the close signal fired.
    pub const fn close_count(&self) -> usize {
        self.close_count
    }

    /// Ids of all rectangles directly on the page whose name starts with
    /// `prefix`, in layer order.
    pub fn markers(&self, prefix: &str) -> Vec<NodeId> {
        self.nodes
            .get(&self.page)
            .and_then(|page| page.children.as_ref())
            .into_iter()
            .flatten()
            .filter(|id| {
                self.nodes.get(*id).is_some_and(|n| {
                    n.kind == NodeKind::Rectangle && n.name.starts_with(prefix)
                })
            })
            .cloned()
            .collect()
    }

    fn insert(&mut self, parent: &NodeId, mut node: MemoryNode) -> NodeId {
        let id = self.allocate_id();
        node.parent = Some(parent.clone());
        self.node_mut(parent)
            .children
            .as_mut()
            .expect("parent node cannot hold children")
            .push(id.clone());
        self.nodes.insert(id.clone(), node);
        id
    }

    fn allocate_id(&mut self) -> NodeId {
        let id = NodeId::new(format!("1:{}", self.next_id));
        self.next_id += 1;
        id
    }

    fn node_mut(&mut self, id: &NodeId) -> &mut MemoryNode {
        self.nodes.get_mut(id).expect("node should exist")
    }

    fn get(&self, id: &NodeId) -> HostResult<&MemoryNode> {
        self.nodes
            .get(id)
            .ok_or_else(|| HostError::NodeNotFound(id.clone()))
    }

    fn get_writable(
        &mut self,
        id: &NodeId,
        operation: &'static str,
    ) -> HostResult<&mut MemoryNode> {
        if self.read_only.contains(id) {
            return Err(HostError::Rejected {
                node: id.clone(),
                operation,
                reason: "node is read-only".to_string(),
            });
        }
        self.nodes
            .get_mut(id)
            .ok_or_else(|| HostError::NodeNotFound(id.clone()))
    }

    /// Sum of relative offsets from the page down to, but excluding, `id`.
    fn parent_offset(&self, id: &NodeId) -> HostResult<(f64, f64)> {
        let (mut x, mut y) = (0.0, 0.0);
        let mut current = self.get(id)?.parent.clone();
        while let Some(ancestor) = current {
            let node = self.get(&ancestor)?;
            x += node.bounds.x;
            y += node.bounds.y;
            current = node.parent.clone();
        }
        Ok((x, y))
    }

    fn detach(&mut self, id: &NodeId) {
        let parent = self.nodes.get(id).and_then(|n| n.parent.clone());
        if let Some(parent) = parent
            && let Some(children) = self.nodes.get_mut(&parent).and_then(|p| p.children.as_mut())
        {
            children.retain(|child| child != id);
        }
    }

    fn remove_subtree(&mut self, id: &NodeId) {
        let mut stack = vec![id.clone()];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                stack.extend(node.children.into_iter().flatten());
            }
        }
    }
}

impl DocumentTree for MemoryDocument {
    fn kind(&self, node: &NodeId) -> HostResult<NodeKind> {
        Ok(self.get(node)?.kind)
    }

    fn name(&self, node: &NodeId) -> HostResult<String> {
        Ok(self.get(node)?.name.clone())
    }

    fn children(&self, node: &NodeId) -> HostResult<Option<Vec<NodeId>>> {
        Ok(self.get(node)?.children.clone())
    }

    fn characters(&self, node: &NodeId) -> HostResult<String> {
        let n = self.get(node)?;
        if !n.kind.is_text() {
            return Err(HostError::Unsupported {
                node: node.clone(),
                operation: "characters",
            });
        }
        Ok(n.characters.clone())
    }

    fn absolute_bounds(&self, node: &NodeId) -> HostResult<Bounds> {
        let own = self.get(node)?.bounds;
        let (dx, dy) = self.parent_offset(node)?;
        Ok(Bounds::new(own.x + dx, own.y + dy, own.width, own.height))
    }
}

impl Host for MemoryDocument {
    fn selection(&self) -> Vec<NodeId> {
        self.selection.clone()
    }

    fn current_page(&self) -> NodeId {
        self.page.clone()
    }

    fn plugin_data(&self, node: &NodeId, key: &str) -> HostResult<String> {
        Ok(self
            .get(node)?
            .plugin_data
            .get(key)
            .cloned()
            .unwrap_or_default())
    }

    fn set_plugin_data(&mut self, node: &NodeId, key: &str, value: &str) -> HostResult<()> {
        self.get_writable(node, "set_plugin_data")?
            .plugin_data
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn node_by_id(&self, id: &str) -> Option<NodeId> {
        self.nodes.get_key_value(id).map(|(key, _)| key.clone())
    }

    fn create_rectangle(&mut self) -> HostResult<NodeId> {
        let id = self.allocate_id();
        let mut node = MemoryNode::new(NodeKind::Rectangle, "Rectangle");
        node.bounds = Bounds::new(0.0, 0.0, 100.0, 100.0);
        node.fills = vec![Paint::solid(Rgb::default())];
        self.nodes.insert(id.clone(), node);
        Ok(id)
    }

    fn append_to_page(&mut self, node: &NodeId) -> HostResult<()> {
        self.get(node)?;
        self.detach(node);
        let page = self.page.clone();
        self.node_mut(node).parent = Some(page.clone());
        self.get_writable(&page, "append_child")?
            .children
            .get_or_insert_with(Vec::new)
            .push(node.clone());
        Ok(())
    }

    fn set_name(&mut self, node: &NodeId, name: &str) -> HostResult<()> {
        self.get_writable(node, "set_name")?.name = name.to_string();
        Ok(())
    }

    fn move_to(&mut self, node: &NodeId, x: f64, y: f64) -> HostResult<()> {
        let (dx, dy) = self.parent_offset(node)?;
        let bounds = &mut self.get_writable(node, "move_to")?.bounds;
        bounds.x = x - dx;
        bounds.y = y - dy;
        Ok(())
    }

    fn resize(&mut self, node: &NodeId, width: f64, height: f64) -> HostResult<()> {
        let bounds = &mut self.get_writable(node, "resize")?.bounds;
        bounds.width = width;
        bounds.height = height;
        Ok(())
    }

    fn fills(&self, node: &NodeId) -> HostResult<Vec<Paint>> {
        Ok(self.get(node)?.fills.clone())
    }

    fn set_fills(&mut self, node: &NodeId, fills: Vec<Paint>) -> HostResult<()> {
        self.get_writable(node, "set_fills")?.fills = fills;
        Ok(())
    }

    fn set_opacity(&mut self, node: &NodeId, opacity: f64) -> HostResult<()> {
        self.get_writable(node, "set_opacity")?.opacity = opacity;
        Ok(())
    }

    fn remove(&mut self, node: &NodeId) -> HostResult<()> {
        self.get_writable(node, "remove")?;
        self.detach(node);
        self.remove_subtree(node);
        self.selection.retain(|id| id != node);
        Ok(())
    }

    fn notify(&mut self, message: &str, timeout: Duration) {
        self.notifications.push(Notification {
            message: message.to_string(),
            timeout,
        });
    }

    fn close(&mut self) {
        self.close_count += 1;
    }
}
