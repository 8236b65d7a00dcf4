//! Fixture pages.
//!
//! A fixture is a declarative page description, written by hand in YAML or
//! JSON or produced by one of the pathological generators, that builds into
//! a [`Dom`]. Nodes can carry a `key`, a test handle bound in the built
//! document so callers can name nodes without adding DOM attributes.
//!
//! ```yaml
//! title: Shadow upload
//! body:
//!   - tag: div
//!     attrs: { id: host-1 }
//!     shadow:
//!       - tag: input
//!         attrs: { type: file }
//!         key: target
//!         position: { top: 120, left: 40 }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::dom::{Dom, NodeId, Position};
use crate::result::{HealError, HealResult};

// =============================================================================
// NODES
// =============================================================================

/// Content document of an iframe node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureFrame {
    /// Whether the frame is cross-origin (opaque to queries)
    #[serde(default)]
    pub cross_origin: bool,
    /// Children of the frame document
    #[serde(default)]
    pub children: Vec<FixtureNode>,
}

/// One element of a fixture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureNode {
    /// Tag name
    pub tag: String,
    /// Attributes
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    /// Test handle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Rendered offset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// Light-DOM children
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FixtureNode>,
    /// Children of an attached shadow root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<Vec<FixtureNode>>,
    /// Content document, iframes only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<FixtureFrame>,
}

impl FixtureNode {
    /// Create a node with no attributes
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: BTreeMap::new(),
            key: None,
            position: None,
            children: Vec::new(),
            shadow: None,
            frame: None,
        }
    }

    /// `<input type="file">`
    #[must_use]
    pub fn file_input() -> Self {
        Self::new("input").with_attr("type", "file")
    }

    /// Set an attribute
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Set the `id` attribute
    #[must_use]
    pub fn with_id(self, id: impl Into<String>) -> Self {
        self.with_attr("id", id)
    }

    /// Bind a test handle
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Set the rendered offset
    #[must_use]
    pub const fn at(mut self, top: i32, left: i32) -> Self {
        self.position = Some(Position::new(top, left));
        self
    }

    /// Append a light-DOM child
    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Attach a shadow root holding `children`
    #[must_use]
    pub fn with_shadow(mut self, children: Vec<Self>) -> Self {
        self.shadow = Some(children);
        self
    }

    /// Attach a content document holding `children`
    #[must_use]
    pub fn with_frame(mut self, cross_origin: bool, children: Vec<Self>) -> Self {
        self.frame = Some(FixtureFrame { cross_origin, children });
        self
    }

    /// Build this node under `parent`
    ///
    /// # Errors
    ///
    /// Returns an error if a frame is declared on a non-iframe element
    pub fn build_into(&self, dom: &mut Dom, parent: NodeId) -> HealResult<NodeId> {
        let node = dom.create_element(&self.tag);
        for (name, value) in &self.attrs {
            dom.set_attribute(node, name, value)?;
        }
        if let Some(position) = self.position {
            dom.set_offset(node, position)?;
        }
        if let Some(key) = &self.key {
            dom.bind_key(key.clone(), node);
        }
        dom.append_child(parent, node)?;

        for child in &self.children {
            child.build_into(dom, node)?;
        }
        if let Some(shadow) = &self.shadow {
            let root = dom.attach_shadow(node)?;
            for child in shadow {
                child.build_into(dom, root)?;
            }
        }
        if let Some(frame) = &self.frame {
            let doc = dom
                .attach_frame_document(node, frame.cross_origin)
                .map_err(|e| HealError::fixture(format!("<{}> cannot hold a frame: {e}", self.tag)))?;
            for child in &frame.children {
                child.build_into(dom, doc)?;
            }
        }
        Ok(node)
    }
}

// =============================================================================
// PAGES
// =============================================================================

/// A fixture page: `html > body` plus the declared body content
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixturePage {
    /// Page title
    #[serde(default)]
    pub title: String,
    /// Children of `body`
    #[serde(default)]
    pub body: Vec<FixtureNode>,
}

impl FixturePage {
    /// Create an empty page
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: Vec::new(),
        }
    }

    /// Append a body child
    #[must_use]
    pub fn with_node(mut self, node: FixtureNode) -> Self {
        self.body.push(node);
        self
    }

    /// Build the document. `html` and `body` are bound to the keys of the
    /// same names.
    ///
    /// # Errors
    ///
    /// Returns an error if a node cannot be built
    pub fn build(&self) -> HealResult<Dom> {
        let mut dom = Dom::new();
        let html = dom.create_element("html");
        let body = dom.create_element("body");
        dom.append_child(dom.document(), html)?;
        dom.append_child(html, body)?;
        dom.bind_key("html", html);
        dom.bind_key("body", body);
        for node in &self.body {
            node.build_into(&mut dom, body)?;
        }
        Ok(dom)
    }

    /// Parse YAML
    ///
    /// # Errors
    ///
    /// Returns a YAML error on malformed input
    pub fn from_yaml_str(yaml: &str) -> HealResult<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Parse JSON
    ///
    /// # Errors
    ///
    /// Returns a JSON error on malformed input
    pub fn from_json_str(json: &str) -> HealResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a `.yaml`, `.yml` or `.json` fixture
    ///
    /// # Errors
    ///
    /// Returns an I/O or parse error, or a fixture error for other extensions
    pub fn load(path: impl AsRef<Path>) -> HealResult<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("yaml" | "yml") => Self::from_yaml_str(&std::fs::read_to_string(path)?),
            Some("json") => Self::from_json_str(&std::fs::read_to_string(path)?),
            _ => Err(HealError::fixture(format!(
                "{}: expected a .yaml, .yml or .json fixture",
                path.display()
            ))),
        }
    }

    /// Serialize to YAML
    ///
    /// # Errors
    ///
    /// Returns a YAML error
    pub fn to_yaml(&self) -> HealResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }
}

// =============================================================================
// GENERATORS
// =============================================================================

/// `leaf` nested under `depth` anonymous `div`s
#[must_use]
pub fn deep_nesting(depth: usize, leaf: FixtureNode) -> FixtureNode {
    (0..depth).fold(leaf, |inner, _| FixtureNode::new("div").with_child(inner))
}

/// A list of `width` identical items; the item at `target_index`
/// (0-based) has its `span` keyed `target`
#[must_use]
pub fn wide_branching(width: usize, target_index: usize) -> FixtureNode {
    (0..width).fold(FixtureNode::new("div").with_attr("class", "list"), |list, i| {
        let mut span = FixtureNode::new("span");
        if i == target_index {
            span = span.with_key("target");
        }
        list.with_child(FixtureNode::new("div").with_attr("class", "item").with_child(span))
    })
}

/// A `div#host_id` whose shadow root holds `inner`
#[must_use]
pub fn shadow_host(host_id: &str, inner: Vec<FixtureNode>) -> FixtureNode {
    FixtureNode::new("div").with_id(host_id).with_shadow(inner)
}

/// An `iframe#frame_id` whose content document holds `inner`
#[must_use]
pub fn iframe_host(frame_id: &str, cross_origin: bool, inner: Vec<FixtureNode>) -> FixtureNode {
    FixtureNode::new("iframe").with_id(frame_id).with_frame(cross_origin, inner)
}

/// A host whose shadow root only holds a `slot`; `light` stays in the light
/// tree and is projected through the slot
#[must_use]
pub fn slotted(host_id: &str, light: FixtureNode) -> FixtureNode {
    FixtureNode::new("div")
        .with_id(host_id)
        .with_shadow(vec![FixtureNode::new("slot")])
        .with_child(light)
}

/// A logical owner and, as its sibling, the container its content is
/// actually rendered in
#[must_use]
pub fn portal(owner_id: &str, content: FixtureNode) -> Vec<FixtureNode> {
    vec![
        FixtureNode::new("div").with_id(owner_id),
        FixtureNode::new("div")
            .with_id(format!("{owner_id}-portal"))
            .with_attr("class", "portal")
            .with_child(content),
    ]
}
