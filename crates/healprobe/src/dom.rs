//! In-memory document model for locator fixtures.
//!
//! An arena of nodes addressed by [`NodeId`]. Besides ordinary elements the
//! arena holds three kinds of *scope root*: the top-level document (always
//! node 0), shadow roots attached to host elements, and the content documents
//! of iframes. Queries run inside one scope root and never pierce into nested
//! ones, which is exactly the encapsulation the locator code has to cope with.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::result::{HealError, HealResult};

/// Handle to a node in a [`Dom`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    /// Arena index of this node
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Rendered offset of an element, in whole pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Offset from the top edge
    pub top: i32,
    /// Offset from the left edge
    pub left: i32,
}

impl Position {
    /// Create a new position
    #[must_use]
    pub const fn new(top: i32, left: i32) -> Self {
        Self { top, left }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "top={}px, left={}px", self.top, self.left)
    }
}

/// Kind of scope root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScopeKind {
    /// The top-level document
    Document,
    /// A shadow root attached to a host element
    ShadowRoot,
    /// The content document of an iframe
    FrameDocument,
}

impl ScopeKind {
    /// Marker used when a locator is rooted in this kind of scope
    #[must_use]
    pub const fn marker(self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::ShadowRoot => "shadow-root",
            Self::FrameDocument => "iframe-document",
        }
    }
}

/// An element node
#[derive(Debug, Clone)]
pub struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    shadow_root: Option<NodeId>,
    content_document: Option<NodeId>,
    offset: Position,
    scroll_count: u32,
    activation_count: u32,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.trim().to_ascii_lowercase(),
            attrs: Vec::new(),
            shadow_root: None,
            content_document: None,
            offset: Position::default(),
            scroll_count: 0,
            activation_count: 0,
        }
    }

    /// Lower-case tag name
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Attribute value by (case-insensitive) name
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// All attributes in insertion order
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `id` attribute, if present and not blank
    #[must_use]
    pub fn stable_id(&self) -> Option<&str> {
        non_blank(self.attribute("id"))
    }

    /// `name` attribute, if present and not blank
    #[must_use]
    pub fn stable_name(&self) -> Option<&str> {
        non_blank(self.attribute("name"))
    }

    /// Whitespace-normalised `class` attribute, if any class is set
    #[must_use]
    pub fn class_name(&self) -> Option<String> {
        let classes: Vec<&str> = self.attribute("class")?.split_whitespace().collect();
        if classes.is_empty() {
            None
        } else {
            Some(classes.join(" "))
        }
    }

    /// Whether this is an `<input type="file">`
    #[must_use]
    pub fn is_file_input(&self) -> bool {
        self.tag == "input"
            && self
                .attribute("type")
                .is_some_and(|t| t.trim().eq_ignore_ascii_case("file"))
    }

    /// Current rendered offset
    #[must_use]
    pub const fn offset(&self) -> Position {
        self.offset
    }

    /// Times the element was scrolled into view
    #[must_use]
    pub const fn scroll_count(&self) -> u32 {
        self.scroll_count
    }

    /// Times the element was activated (clicked)
    #[must_use]
    pub const fn activation_count(&self) -> u32 {
        self.activation_count
    }

    /// Attached shadow root
    #[must_use]
    pub const fn shadow_root(&self) -> Option<NodeId> {
        self.shadow_root
    }

    fn set_attr(&mut self, name: &str, value: &str) {
        let name = name.trim().to_ascii_lowercase();
        if let Some(slot) = self.attrs.iter_mut().find(|(key, _)| *key == name) {
            slot.1 = value.to_string();
        } else {
            self.attrs.push((name, value.to_string()));
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone)]
enum NodeKind {
    Document,
    ShadowRoot { host: NodeId },
    FrameDocument { frame: NodeId, cross_origin: bool },
    Element(Element),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

impl Node {
    const fn new(kind: NodeKind) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            kind,
        }
    }
}

/// Arena document model
#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<Node>,
    keys: HashMap<String, NodeId>,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    /// Create an empty top-level document
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Document)],
            keys: HashMap::new(),
        }
    }

    /// The top-level document
    #[must_use]
    pub const fn document(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes in the arena, detached ones included
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena holds only the document
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    fn node(&self, id: NodeId) -> HealResult<&Node> {
        self.nodes.get(id.0).ok_or_else(|| invalid(id, "no such node"))
    }

    /// Element data for a node, `None` for scope roots and unknown ids
    #[must_use]
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes.get(id.0)?.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> HealResult<&mut Element> {
        match self.nodes.get_mut(id.0).map(|n| &mut n.kind) {
            Some(NodeKind::Element(element)) => Ok(element),
            Some(_) => Err(invalid(id, "not an element")),
            None => Err(invalid(id, "no such node")),
        }
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(NodeKind::Element(Element::new(tag))));
        id
    }

    /// Append `child` to `parent` (an element or a scope root), moving it if
    /// it already has a parent.
    ///
    /// # Errors
    ///
    /// Returns error for unknown ids, non-element children, and cycles
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> HealResult<()> {
        self.node(parent)?;
        if self.element(child).is_none() {
            return Err(invalid(child, "only elements can be appended"));
        }

        let mut cursor = Some(parent);
        while let Some(node) = cursor {
            if node == child {
                return Err(HealError::invalid_operation(format!(
                    "appending {child} under {parent} would create a cycle"
                )));
            }
            cursor = self.parent(node).or_else(|| self.host_of(node));
        }

        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        Ok(())
    }

    /// Detach a node from its parent. The subtree stays in the arena.
    ///
    /// # Errors
    ///
    /// Returns error for unknown ids and scope roots
    pub fn remove(&mut self, node: NodeId) -> HealResult<()> {
        if self.element(node).is_none() {
            return Err(invalid(node, "only elements can be removed"));
        }
        self.detach(node);
        Ok(())
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(old_parent) = self.nodes[node.0].parent.take() {
            self.nodes[old_parent.0].children.retain(|c| *c != node);
        }
    }

    /// Parent node (an element or a scope root)
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|n| n.parent)
    }

    /// Child nodes in order
    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Attach a shadow root to `host`
    ///
    /// # Errors
    ///
    /// Returns error if `host` is not an element or already has a shadow root
    pub fn attach_shadow(&mut self, host: NodeId) -> HealResult<NodeId> {
        let root = NodeId(self.nodes.len());
        let element = self.element_mut(host)?;
        if element.shadow_root.is_some() {
            return Err(HealError::invalid_operation(format!(
                "{host} already hosts a shadow root"
            )));
        }
        element.shadow_root = Some(root);
        self.nodes.push(Node::new(NodeKind::ShadowRoot { host }));
        Ok(root)
    }

    /// Attach the content document of an iframe
    ///
    /// # Errors
    ///
    /// Returns error if `frame` is not an iframe or already has a document
    pub fn attach_frame_document(&mut self, frame: NodeId, cross_origin: bool) -> HealResult<NodeId> {
        let root = NodeId(self.nodes.len());
        let element = self.element_mut(frame)?;
        if element.tag != "iframe" {
            return Err(invalid(frame, "only iframes have content documents"));
        }
        if element.content_document.is_some() {
            return Err(HealError::invalid_operation(format!(
                "{frame} already has a content document"
            )));
        }
        element.content_document = Some(root);
        self.nodes
            .push(Node::new(NodeKind::FrameDocument { frame, cross_origin }));
        Ok(root)
    }

    /// Set an attribute
    ///
    /// # Errors
    ///
    /// Returns error if `node` is not an element
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> HealResult<()> {
        self.element_mut(node)?.set_attr(name, value);
        Ok(())
    }

    /// Remove an attribute; absent attributes are ignored
    ///
    /// # Errors
    ///
    /// Returns error if `node` is not an element
    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> HealResult<()> {
        self.element_mut(node)?
            .attrs
            .retain(|(key, _)| !key.eq_ignore_ascii_case(name));
        Ok(())
    }

    /// Attribute value of an element
    #[must_use]
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?.attribute(name)
    }

    /// Tag name of an element
    #[must_use]
    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(Element::tag)
    }

    /// Kind of scope root, `None` for elements
    #[must_use]
    pub fn scope_kind(&self, node: NodeId) -> Option<ScopeKind> {
        match self.nodes.get(node.0)?.kind {
            NodeKind::Document => Some(ScopeKind::Document),
            NodeKind::ShadowRoot { .. } => Some(ScopeKind::ShadowRoot),
            NodeKind::FrameDocument { .. } => Some(ScopeKind::FrameDocument),
            NodeKind::Element(_) => None,
        }
    }

    /// Whether `node` is a scope root
    #[must_use]
    pub fn is_scope_root(&self, node: NodeId) -> bool {
        self.scope_kind(node).is_some()
    }

    /// Element owning a nested scope root: the shadow host or the iframe
    #[must_use]
    pub fn host_of(&self, root: NodeId) -> Option<NodeId> {
        match self.nodes.get(root.0)?.kind {
            NodeKind::ShadowRoot { host } => Some(host),
            NodeKind::FrameDocument { frame, .. } => Some(frame),
            _ => None,
        }
    }

    /// Whether a scope root is a cross-origin frame document
    #[must_use]
    pub fn is_cross_origin(&self, root: NodeId) -> bool {
        matches!(
            self.nodes.get(root.0).map(|n| &n.kind),
            Some(NodeKind::FrameDocument {
                cross_origin: true,
                ..
            })
        )
    }

    /// Scope root a node lives in; a scope root is its own scope.
    /// `None` when the node is detached.
    #[must_use]
    pub fn scope_of(&self, node: NodeId) -> Option<NodeId> {
        let mut cursor = node;
        loop {
            if self.is_scope_root(cursor) {
                return Some(cursor);
            }
            cursor = self.parent(cursor)?;
        }
    }

    /// Whether the node is reachable from the top-level document
    #[must_use]
    pub fn is_connected(&self, node: NodeId) -> bool {
        match self.scope_of(node) {
            Some(root) => match self.host_of(root) {
                Some(host) => self.is_connected(host),
                None => root == self.document(),
            },
            None => false,
        }
    }

    /// Whether the node lives directly in the top-level document
    #[must_use]
    pub fn is_top_level(&self, node: NodeId) -> bool {
        self.scope_of(node) == Some(self.document())
    }

    /// Nested scope roots between the top-level document and `node`,
    /// outermost first. Empty for top-level nodes.
    #[must_use]
    pub fn boundary_chain(&self, node: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut scope = self.scope_of(node);
        while let Some(root) = scope {
            let Some(host) = self.host_of(root) else {
                break;
            };
            chain.push(root);
            scope = self.scope_of(host);
        }
        chain.reverse();
        chain
    }

    /// Elements under `scope` in document order. Does not enter nested
    /// shadow roots or frame documents.
    #[must_use]
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(scope).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// First element under `scope` matching `predicate`, in document order
    pub fn query<F>(&self, scope: NodeId, predicate: F) -> Option<NodeId>
    where
        F: Fn(&Element) -> bool,
    {
        self.descendants(scope)
            .into_iter()
            .find(|n| self.element(*n).is_some_and(&predicate))
    }

    /// All elements under `scope` matching `predicate`, in document order
    pub fn query_all<F>(&self, scope: NodeId, predicate: F) -> Vec<NodeId>
    where
        F: Fn(&Element) -> bool,
    {
        self.descendants(scope)
            .into_iter()
            .filter(|n| self.element(*n).is_some_and(&predicate))
            .collect()
    }

    /// First element with the given id under `scope`
    #[must_use]
    pub fn get_element_by_id(&self, scope: NodeId, id: &str) -> Option<NodeId> {
        self.query(scope, |e| e.attribute("id") == Some(id))
    }

    /// Shadow root attached to `host`
    #[must_use]
    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        self.element(host)?.shadow_root
    }

    /// Content document of an iframe, `Ok(None)` while not yet loaded
    ///
    /// # Errors
    ///
    /// Returns `BoundaryInaccessible` for cross-origin frames
    pub fn content_document(&self, frame: NodeId) -> HealResult<Option<NodeId>> {
        let Some(root) = self.element(frame).and_then(|e| e.content_document) else {
            return Ok(None);
        };
        if self.is_cross_origin(root) {
            return Err(HealError::BoundaryInaccessible {
                container: self.describe(frame),
                reason: "cross-origin frame".to_string(),
            });
        }
        Ok(Some(root))
    }

    /// Set the rendered offset of an element
    ///
    /// # Errors
    ///
    /// Returns error if `node` is not an element
    pub fn set_offset(&mut self, node: NodeId, position: Position) -> HealResult<()> {
        self.element_mut(node)?.offset = position;
        Ok(())
    }

    /// Rendered offset of an element as of now
    #[must_use]
    pub fn offset(&self, node: NodeId) -> Option<Position> {
        self.element(node).map(Element::offset)
    }

    /// Scroll an element into view
    ///
    /// # Errors
    ///
    /// Returns error if `node` is not an element
    pub fn scroll_into_view(&mut self, node: NodeId) -> HealResult<()> {
        self.element_mut(node)?.scroll_count += 1;
        Ok(())
    }

    /// Activate (click) an element
    ///
    /// # Errors
    ///
    /// Returns error if `node` is not an element
    pub fn activate(&mut self, node: NodeId) -> HealResult<()> {
        self.element_mut(node)?.activation_count += 1;
        Ok(())
    }

    /// Number of earlier element siblings with the same tag
    #[must_use]
    pub fn preceding_same_tag(&self, node: NodeId) -> usize {
        let (Some(parent), Some(tag)) = (self.parent(node), self.tag(node)) else {
            return 0;
        };
        self.children(parent)
            .iter()
            .take_while(|sibling| **sibling != node)
            .filter(|sibling| self.tag(**sibling) == Some(tag))
            .count()
    }

    /// Name a node with a test handle
    pub fn bind_key(&mut self, key: impl Into<String>, node: NodeId) {
        self.keys.insert(key.into(), node);
    }

    /// Node bound to a test handle
    #[must_use]
    pub fn by_key(&self, key: &str) -> Option<NodeId> {
        self.keys.get(key).copied()
    }

    /// Short description for logs: `tag#id`, `tag[name=..]`, or `tag`
    #[must_use]
    pub fn describe(&self, node: NodeId) -> String {
        match self.element(node) {
            Some(e) => match (e.stable_id(), e.stable_name()) {
                (Some(id), _) => format!("{}#{id}", e.tag()),
                (None, Some(name)) => format!("{}[name={name}]", e.tag()),
                (None, None) => e.tag().to_string(),
            },
            None => match self.scope_kind(node) {
                Some(kind) => kind.marker().to_string(),
                None => node.to_string(),
            },
        }
    }
}

fn invalid(node: NodeId, message: &str) -> HealError {
    HealError::InvalidNode {
        node: node.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn page() -> (Dom, NodeId) {
        let mut dom = Dom::new();
        let html = dom.create_element("html");
        let body = dom.create_element("BODY");
        dom.append_child(dom.document(), html).unwrap();
        dom.append_child(html, body).unwrap();
        (dom, body)
    }

    mod tree_tests {
        use super::*;

        #[test]
        fn test_tags_are_lowercased() {
            let (dom, body) = page();
            assert_eq!(dom.tag(body), Some("body"));
        }

        #[test]
        fn test_append_moves_node() {
            let (mut dom, body) = page();
            let a = dom.create_element("div");
            let b = dom.create_element("div");
            let child = dom.create_element("span");
            dom.append_child(body, a).unwrap();
            dom.append_child(body, b).unwrap();
            dom.append_child(a, child).unwrap();
            dom.append_child(b, child).unwrap();
            assert!(dom.children(a).is_empty());
            assert_eq!(dom.children(b), &[child]);
            assert_eq!(dom.parent(child), Some(b));
        }

        #[test]
        fn test_append_rejects_cycle() {
            let (mut dom, body) = page();
            let outer = dom.create_element("div");
            let inner = dom.create_element("div");
            dom.append_child(body, outer).unwrap();
            dom.append_child(outer, inner).unwrap();
            assert!(dom.append_child(inner, outer).is_err());
        }

        #[test]
        fn test_append_rejects_host_into_own_shadow_root() {
            let (mut dom, body) = page();
            let host = dom.create_element("div");
            dom.append_child(body, host).unwrap();
            let root = dom.attach_shadow(host).unwrap();
            let inner = dom.create_element("div");
            dom.append_child(root, inner).unwrap();

            assert!(dom.append_child(root, host).is_err());
            assert!(dom.append_child(inner, body).is_err());
            assert!(dom.is_connected(host));
            assert_eq!(dom.boundary_chain(inner), vec![root]);
        }

        #[test]
        fn test_append_rejects_frame_into_own_document() {
            let (mut dom, body) = page();
            let frame = dom.create_element("iframe");
            dom.append_child(body, frame).unwrap();
            let doc = dom.attach_frame_document(frame, false).unwrap();

            assert!(dom.append_child(doc, frame).is_err());
            assert!(dom.append_child(doc, body).is_err());
            assert!(dom.is_connected(frame));
        }

        #[test]
        fn test_append_rejects_scope_root_child() {
            let (mut dom, body) = page();
            let doc = dom.document();
            assert!(dom.append_child(body, doc).is_err());
        }

        #[test]
        fn test_remove_disconnects() {
            let (mut dom, body) = page();
            let div = dom.create_element("div");
            dom.append_child(body, div).unwrap();
            assert!(dom.is_connected(div));
            dom.remove(div).unwrap();
            assert!(!dom.is_connected(div));
            assert_eq!(dom.scope_of(div), None);
        }

        #[test]
        fn test_descendants_document_order() {
            let (mut dom, body) = page();
            let a = dom.create_element("div");
            let a1 = dom.create_element("span");
            let b = dom.create_element("p");
            dom.append_child(body, a).unwrap();
            dom.append_child(a, a1).unwrap();
            dom.append_child(body, b).unwrap();
            let order = dom.descendants(dom.document());
            let tags: Vec<&str> = order.iter().map(|n| dom.tag(*n).unwrap()).collect();
            assert_eq!(tags, vec!["html", "body", "div", "span", "p"]);
        }

        #[test]
        fn test_preceding_same_tag() {
            let (mut dom, body) = page();
            let d1 = dom.create_element("div");
            let p = dom.create_element("p");
            let d2 = dom.create_element("div");
            for n in [d1, p, d2] {
                dom.append_child(body, n).unwrap();
            }
            assert_eq!(dom.preceding_same_tag(d1), 0);
            assert_eq!(dom.preceding_same_tag(p), 0);
            assert_eq!(dom.preceding_same_tag(d2), 1);
        }
    }

    mod attribute_tests {
        use super::*;

        #[test]
        fn test_set_replaces_and_is_case_insensitive() {
            let (mut dom, body) = page();
            dom.set_attribute(body, "ID", "main").unwrap();
            dom.set_attribute(body, "id", "other").unwrap();
            assert_eq!(dom.attribute(body, "Id"), Some("other"));
            assert_eq!(dom.element(body).unwrap().attributes().count(), 1);
        }

        #[test]
        fn test_blank_id_is_not_stable() {
            let (mut dom, body) = page();
            dom.set_attribute(body, "id", "  ").unwrap();
            assert_eq!(dom.element(body).unwrap().stable_id(), None);
        }

        #[test]
        fn test_class_name_normalised() {
            let (mut dom, body) = page();
            dom.set_attribute(body, "class", "  a   b ").unwrap();
            assert_eq!(dom.element(body).unwrap().class_name().as_deref(), Some("a b"));
        }

        #[test]
        fn test_file_input_detection() {
            let (mut dom, body) = page();
            let input = dom.create_element("input");
            dom.append_child(body, input).unwrap();
            assert!(!dom.element(input).unwrap().is_file_input());
            dom.set_attribute(input, "type", "FILE").unwrap();
            assert!(dom.element(input).unwrap().is_file_input());
        }

        #[test]
        fn test_remove_attribute() {
            let (mut dom, body) = page();
            dom.set_attribute(body, "name", "n").unwrap();
            dom.remove_attribute(body, "NAME").unwrap();
            assert_eq!(dom.attribute(body, "name"), None);
        }
    }

    mod scope_tests {
        use super::*;

        #[test]
        fn test_shadow_root_is_encapsulated() {
            let (mut dom, body) = page();
            let host = dom.create_element("div");
            dom.append_child(body, host).unwrap();
            let root = dom.attach_shadow(host).unwrap();
            let inner = dom.create_element("input");
            dom.set_attribute(inner, "id", "inner").unwrap();
            dom.append_child(root, inner).unwrap();

            assert_eq!(dom.get_element_by_id(dom.document(), "inner"), None);
            assert_eq!(dom.get_element_by_id(root, "inner"), Some(inner));
            assert_eq!(dom.scope_of(inner), Some(root));
            assert_eq!(dom.scope_kind(root), Some(ScopeKind::ShadowRoot));
            assert!(dom.is_connected(inner));
            assert!(!dom.is_top_level(inner));
        }

        #[test]
        fn test_second_shadow_root_rejected() {
            let (mut dom, body) = page();
            dom.attach_shadow(body).unwrap();
            assert!(dom.attach_shadow(body).is_err());
        }

        #[test]
        fn test_frame_document_requires_iframe() {
            let (mut dom, body) = page();
            assert!(dom.attach_frame_document(body, false).is_err());
            let frame = dom.create_element("iframe");
            dom.append_child(body, frame).unwrap();
            let doc = dom.attach_frame_document(frame, false).unwrap();
            assert_eq!(dom.content_document(frame).unwrap(), Some(doc));
            assert!(dom.attach_frame_document(frame, false).is_err());
        }

        #[test]
        fn test_cross_origin_frame_is_inaccessible() {
            let (mut dom, body) = page();
            let frame = dom.create_element("iframe");
            dom.set_attribute(frame, "id", "ads").unwrap();
            dom.append_child(body, frame).unwrap();
            dom.attach_frame_document(frame, true).unwrap();
            let err = dom.content_document(frame).unwrap_err();
            assert!(matches!(err, HealError::BoundaryInaccessible { .. }));
            assert!(err.to_string().contains("iframe#ads"));
        }

        #[test]
        fn test_unloaded_frame_has_no_document() {
            let (mut dom, body) = page();
            let frame = dom.create_element("iframe");
            dom.append_child(body, frame).unwrap();
            assert_eq!(dom.content_document(frame).unwrap(), None);
        }

        #[test]
        fn test_boundary_chain_outermost_first() {
            let (mut dom, body) = page();
            let frame = dom.create_element("iframe");
            dom.append_child(body, frame).unwrap();
            let frame_doc = dom.attach_frame_document(frame, false).unwrap();
            let host = dom.create_element("div");
            dom.append_child(frame_doc, host).unwrap();
            let shadow = dom.attach_shadow(host).unwrap();
            let leaf = dom.create_element("input");
            dom.append_child(shadow, leaf).unwrap();

            assert_eq!(dom.boundary_chain(leaf), vec![frame_doc, shadow]);
            assert!(dom.boundary_chain(body).is_empty());
        }

        #[test]
        fn test_detached_host_disconnects_shadow_content() {
            let (mut dom, body) = page();
            let host = dom.create_element("div");
            dom.append_child(body, host).unwrap();
            let root = dom.attach_shadow(host).unwrap();
            let inner = dom.create_element("span");
            dom.append_child(root, inner).unwrap();
            dom.remove(host).unwrap();
            assert!(!dom.is_connected(inner));
        }
    }

    mod interaction_tests {
        use super::*;

        #[test]
        fn test_offsets_and_counters() {
            let (mut dom, body) = page();
            dom.set_offset(body, Position::new(10, 20)).unwrap();
            dom.scroll_into_view(body).unwrap();
            dom.activate(body).unwrap();
            dom.activate(body).unwrap();
            let element = dom.element(body).unwrap();
            assert_eq!(element.offset(), Position::new(10, 20));
            assert_eq!(element.scroll_count(), 1);
            assert_eq!(element.activation_count(), 2);
        }

        #[test]
        fn test_scope_roots_cannot_be_activated() {
            let mut dom = Dom::new();
            let doc = dom.document();
            assert!(dom.activate(doc).is_err());
        }

        #[test]
        fn test_keys() {
            let (mut dom, body) = page();
            dom.bind_key("body", body);
            assert_eq!(dom.by_key("body"), Some(body));
            assert_eq!(dom.by_key("missing"), None);
        }

        #[test]
        fn test_position_display() {
            assert_eq!(Position::new(3, -4).to_string(), "top=3px, left=-4px");
        }
    }
}
