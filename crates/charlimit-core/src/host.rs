//! Capability interface onto the host document.
//!
//! The checker never owns document nodes. It reads the tree through
//! [`DocumentTree`] and performs every mutation, lookup, and notification
//! through [`Host`]. Nodes are addressed by opaque [`NodeId`] strings, which
//! is also the form in which a text layer remembers its flag marker.

use std::borrow::Borrow;
use std::fmt;
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::HostResult;

/// Opaque identifier of a node in the host document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Wrap a host-issued identifier.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Type tag of a document node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    /// The document root.
    Document,
    /// A page (canvas) holding top-level layers.
    Page,
    /// A frame container.
    Frame,
    /// A group container.
    Group,
    /// A text layer.
    Text,
    /// A plain rectangle.
    Rectangle,
    /// Any other leaf shape.
    Shape,
}

impl NodeKind {
    /// Returns `true` for text layers.
    pub const fn is_text(self) -> bool {
        matches!(self, Self::Text)
    }
}

/// Absolute position and size of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Bounds {
    /// Horizontal position of the top-left corner.
    pub x: f64,
    /// Vertical position of the top-left corner.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Bounds {
    /// Construct bounds from position and size.
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// An RGB color with channels in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Rgb {
    /// Red channel.
    pub r: f64,
    /// Green channel.
    pub g: f64,
    /// Blue channel.
    pub b: f64,
}

impl Rgb {
    /// Construct a color from its channels.
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }
}

/// One entry of a node's fill list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Paint {
    /// Paint type as reported by the host (e.g. `SOLID`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Paint color.
    pub color: Rgb,
    /// Whether the paint is rendered.
    #[serde(default = "default_visible")]
    pub visible: bool,
}

const fn default_visible() -> bool {
    true
}

impl Paint {
    /// A visible solid paint of the given color.
    pub fn solid(color: Rgb) -> Self {
        Self {
            kind: "SOLID".to_string(),
            color,
            visible: true,
        }
    }
}

/// Read access to the node tree.
///
/// This is all the traversal needs, so the walker can run over any tree-like
/// structure, including synthetic ones in tests.
pub trait DocumentTree {
    /// Type tag of `node`.
    fn kind(&self, node: &NodeId) -> HostResult<NodeKind>;

    /// Display name of `node`.
    fn name(&self, node: &NodeId) -> HostResult<String>;

    /// Children of `node` in document order, or `None` if the node cannot
    /// hold children.
    fn children(&self, node: &NodeId) -> HostResult<Option<Vec<NodeId>>>;

    /// Text content of a text node.
    fn characters(&self, node: &NodeId) -> HostResult<String>;

    /// Absolute position and size of `node`.
    fn absolute_bounds(&self, node: &NodeId) -> HostResult<Bounds>;
}

/// The full set of host capabilities a check run consumes.
pub trait Host: DocumentTree {
    /// Roots of the current selection, in selection order. May be empty.
    fn selection(&self) -> Vec<NodeId>;

    /// Root of the current page.
    fn current_page(&self) -> NodeId;

    /// Read a value from the node's persisted key-value store.
    ///
    /// Missing keys read as the empty string.
    fn plugin_data(&self, node: &NodeId, key: &str) -> HostResult<String>;

    /// Write a value to the node's persisted key-value store.
    fn set_plugin_data(&mut self, node: &NodeId, key: &str, value: &str) -> HostResult<()>;

    /// Resolve an identifier to a live node, or `None` if nothing by that id
    /// exists any more.
    fn node_by_id(&self, id: &str) -> Option<NodeId>;

    /// Create a new rectangle node. The host decides its initial fills.
    fn create_rectangle(&mut self) -> HostResult<NodeId>;

    /// Append `node` as the last (topmost) child of the current page.
    fn append_to_page(&mut self, node: &NodeId) -> HostResult<()>;

    /// Rename `node`.
    fn set_name(&mut self, node: &NodeId, name: &str) -> HostResult<()>;

    /// Move `node` to an absolute position.
    fn move_to(&mut self, node: &NodeId, x: f64, y: f64) -> HostResult<()>;

    /// Resize `node`.
    fn resize(&mut self, node: &NodeId, width: f64, height: f64) -> HostResult<()>;

    /// A copy of the node's fill list.
    fn fills(&self, node: &NodeId) -> HostResult<Vec<Paint>>;

    /// Replace the node's fill list.
    fn set_fills(&mut self, node: &NodeId, fills: Vec<Paint>) -> HostResult<()>;

    /// Set the node's layer opacity.
    fn set_opacity(&mut self, node: &NodeId, opacity: f64) -> HostResult<()>;

    /// Remove `node` from the document.
    fn remove(&mut self, node: &NodeId) -> HostResult<()>;

    /// Show a message to the user for roughly `timeout`.
    fn notify(&mut self, message: &str, timeout: Duration);

    /// Signal that the run is over. Called exactly once per run.
    fn close(&mut self);
}
