//! Arena-backed document tree that marking mutates in place
pub mod frame;
pub mod markup;
pub mod selector;

use crate::error::{MarkError, Result};
pub use frame::{Frame, FrameHandle, FrameState};
pub use selector::{Selector, SelectorScope};

/// Origin assigned to documents that do not name one.
pub const DEFAULT_ORIGIN: &str = "local";

/// Handle to a node inside a [`Document`] arena.
///
/// Handles stay valid for the lifetime of the document; detached nodes remain
/// in the arena but are no longer reachable from the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub enum NodeData {
    Document { origin: String },
    Element(Element),
    Text(String),
    Comment(String),
    /// XML declaration, doctype or processing instruction, kept verbatim.
    Prolog(String),
}

#[derive(Debug, Clone)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    /// Written as `<name/>` while it has no children.
    pub self_closing: bool,
    pub(crate) frame: Option<Frame>,
}

impl Element {
    fn new(name: &str) -> Self {
        let frame = name.eq_ignore_ascii_case("iframe").then(Frame::default);
        Self {
            name: name.to_string(),
            attrs: Vec::new(),
            self_closing: false,
            frame,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }
}

#[derive(Debug)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::with_origin(DEFAULT_ORIGIN)
    }
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_origin(origin: impl Into<String>) -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Document {
                    origin: origin.into(),
                },
            }],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.data(id), NodeData::Text(_))
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.data(id) {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.name.as_str())
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attr(name)
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(element) = self.element_mut(id) {
            match element.attrs.iter_mut().find(|(key, _)| key == name) {
                Some((_, existing)) => *existing = value.to_string(),
                None => element.attrs.push((name.to_string(), value.to_string())),
            }
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id).is_some_and(|e| e.has_class(class))
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.data(id) {
            NodeData::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, value: impl Into<String>) -> Result<()> {
        match &mut self.nodes[id.0].data {
            NodeData::Text(text) => {
                *text = value.into();
                Ok(())
            }
            _ => Err(MarkError::NotText(id)),
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// First element child of `id`, e.g. the `<html>` element of a document node.
    pub fn document_element(&self, id: NodeId) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|child| self.element(*child).is_some())
    }

    /// Origin of the document (or sub-document) that owns `id`.
    pub fn origin_of(&self, id: NodeId) -> &str {
        let mut current = Some(id);
        while let Some(node) = current {
            if let NodeData::Document { origin } = self.data(node) {
                return origin;
            }
            current = self.parent(node);
        }
        DEFAULT_ORIGIN
    }

    pub fn create_prolog(&mut self, raw: impl Into<String>) -> NodeId {
        self.push(NodeData::Prolog(raw.into()))
    }

    /// Topmost ancestor of `id`: its document node, or the root of the
    /// detached subtree holding it.
    pub fn tree_root(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            data,
        });
        id
    }

    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push(NodeData::Element(Element::new(name)))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Text(text.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Comment(text.into()))
    }

    fn position_in_parent(&self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(id)?;
        let position = self.children(parent).iter().position(|c| *c == id)?;
        Some((parent, position))
    }

    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|child| *child != id);
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) -> Result<()> {
        if self.parent(reference).is_none() {
            return Err(MarkError::Detached(reference));
        }
        self.detach(node);
        let (parent, position) = self
            .position_in_parent(reference)
            .ok_or(MarkError::Detached(reference))?;
        self.nodes[parent.0].children.insert(position + 1, node);
        self.nodes[node.0].parent = Some(parent);
        Ok(())
    }

    /// Puts `new` in the slot of `old`, leaving `old` detached.
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> Result<()> {
        if self.parent(old).is_none() {
            return Err(MarkError::Detached(old));
        }
        self.detach(new);
        let (parent, position) = self
            .position_in_parent(old)
            .ok_or(MarkError::Detached(old))?;
        self.nodes[parent.0].children[position] = new;
        self.nodes[new.0].parent = Some(parent);
        self.nodes[old.0].parent = None;
        Ok(())
    }

    /// Moves the children of `id` into its slot, leaving `id` detached and
    /// empty. Returns the former parent.
    pub fn replace_with_children(&mut self, id: NodeId) -> Result<NodeId> {
        let (parent, position) = self.position_in_parent(id).ok_or(MarkError::Detached(id))?;
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for child in &children {
            self.nodes[child.0].parent = Some(parent);
        }
        self.nodes[parent.0]
            .children
            .splice(position..=position, children);
        self.nodes[id.0].parent = None;
        Ok(parent)
    }

    /// All nodes below `id` in document order (pre-order), `id` excluded.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Inclusive ancestry check: a node contains itself.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|node| self.text(node))
            .collect()
    }

    /// Elements below `id` matching `selector`, in document order.
    pub fn select(&self, id: NodeId, selector: &Selector) -> Vec<NodeId> {
        let matched = SelectorScope::of(self, id).matching(selector);
        self.descendants(id)
            .into_iter()
            .filter(|node| matched.contains(node))
            .collect()
    }

    /// Splits a text node at a byte offset. The node keeps the prefix and the
    /// returned sibling, inserted right after it, holds the suffix.
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> Result<NodeId> {
        let suffix = match &mut self.nodes[id.0].data {
            NodeData::Text(text) => {
                if !text.is_char_boundary(offset) {
                    return Err(MarkError::InvalidOffset {
                        offset,
                        len: text.len(),
                    });
                }
                text.split_off(offset)
            }
            _ => return Err(MarkError::NotText(id)),
        };
        let node = self.create_text(suffix);
        if self.parent(id).is_some() {
            self.insert_after(id, node)?;
        }
        Ok(node)
    }

    /// Merges adjacent text children and drops empty text nodes, recursively.
    pub fn normalize(&mut self, id: NodeId) {
        let children = self.nodes[id.0].children.clone();
        let mut kept = Vec::with_capacity(children.len());
        let mut last_text: Option<NodeId> = None;

        for child in children {
            match self.text(child).map(str::to_owned) {
                Some(text) if text.is_empty() => {
                    self.nodes[child.0].parent = None;
                    continue;
                }
                Some(text) => {
                    if let Some(previous) = last_text {
                        if let NodeData::Text(merged) = &mut self.nodes[previous.0].data {
                            merged.push_str(&text);
                        }
                        self.nodes[child.0].parent = None;
                        continue;
                    }
                    last_text = Some(child);
                }
                None => {
                    last_text = None;
                    self.normalize(child);
                }
            }
            kept.push(child);
        }

        self.nodes[id.0].children = kept;
    }

    pub fn frame(&self, iframe: NodeId) -> Option<&Frame> {
        self.element(iframe)?.frame.as_ref()
    }

    pub fn frame_handle(&self, iframe: NodeId) -> Option<FrameHandle> {
        self.frame(iframe).map(|frame| frame.handle().clone())
    }

    /// Adopts `content` into this arena as the sub-document of `iframe`.
    /// Readiness is left untouched; signal it through the returned handle.
    pub fn attach_frame(&mut self, iframe: NodeId, content: Document) -> Result<FrameHandle> {
        if self.frame(iframe).is_none() {
            return Err(MarkError::NotFrame(iframe));
        }
        let root = self.adopt(content);
        let frame = self
            .element_mut(iframe)
            .and_then(|element| element.frame.as_mut())
            .ok_or(MarkError::NotFrame(iframe))?;
        frame.content = Some(root);
        Ok(frame.handle.clone())
    }

    pub fn load_frame(&mut self, iframe: NodeId, content: Document) -> Result<()> {
        self.attach_frame(iframe, content)?.set_ready();
        Ok(())
    }

    /// Access probe for a ready frame: the content must exist and share the
    /// owning document's origin. Yields the sub-document's document element.
    pub fn frame_root(&self, iframe: NodeId) -> Result<NodeId> {
        let src = self.attr(iframe, "src").unwrap_or_default().to_string();
        let content = self
            .frame(iframe)
            .and_then(Frame::content)
            .ok_or_else(|| MarkError::FrameInaccessible(src.clone()))?;
        if self.origin_of(content) != self.origin_of(iframe) {
            return Err(MarkError::FrameInaccessible(src));
        }
        Ok(self.document_element(content).unwrap_or(content))
    }

    fn adopt(&mut self, other: Document) -> NodeId {
        let Document { nodes, root } = other;
        let offset = self.nodes.len();
        let shift = |id: NodeId| NodeId(id.0 + offset);

        for node in nodes {
            let mut data = node.data;
            if let NodeData::Element(element) = &mut data {
                if let Some(frame) = element.frame.as_mut() {
                    frame.content = frame.content.map(shift);
                }
            }
            self.nodes.push(Node {
                parent: node.parent.map(shift),
                children: node.children.into_iter().map(shift).collect(),
                data,
            });
        }

        shift(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(doc: &mut Document, text: &str) -> (NodeId, NodeId) {
        let p = doc.create_element("p");
        let t = doc.create_text(text);
        doc.append_child(doc.root(), p);
        doc.append_child(p, t);
        (p, t)
    }

    #[test]
    fn split_text_keeps_prefix_in_place() {
        let mut doc = Document::new();
        let (p, t) = paragraph(&mut doc, "hello world");

        let suffix = doc.split_text(t, 5).unwrap();

        assert_eq!(doc.text(t), Some("hello"));
        assert_eq!(doc.text(suffix), Some(" world"));
        assert_eq!(doc.children(p), &[t, suffix]);
        assert_eq!(doc.text_content(p), "hello world");
    }

    #[test]
    fn split_text_rejects_bad_offsets() {
        let mut doc = Document::new();
        let (_, t) = paragraph(&mut doc, "café");

        assert!(matches!(
            doc.split_text(t, 4),
            Err(MarkError::InvalidOffset { offset: 4, .. })
        ));
        assert!(doc.split_text(t, 42).is_err());
        assert!(matches!(
            doc.split_text(doc.root(), 0),
            Err(MarkError::NotText(_))
        ));
    }

    #[test]
    fn split_at_end_creates_empty_sibling() {
        let mut doc = Document::new();
        let (p, t) = paragraph(&mut doc, "abc");

        let suffix = doc.split_text(t, 3).unwrap();

        assert_eq!(doc.text(suffix), Some(""));
        assert_eq!(doc.children(p).len(), 2);
    }

    #[test]
    fn normalize_merges_and_drops_empty_text() {
        let mut doc = Document::new();
        let (p, t) = paragraph(&mut doc, "ab");
        let c = doc.create_text("");
        let d = doc.create_text("cd");
        doc.append_child(p, c);
        doc.append_child(p, d);

        doc.normalize(p);

        assert_eq!(doc.children(p), &[t]);
        assert_eq!(doc.text(t), Some("abcd"));
        assert_eq!(doc.parent(d), None);
    }

    #[test]
    fn replace_and_contains() {
        let mut doc = Document::new();
        let (p, t) = paragraph(&mut doc, "x");
        let b = doc.create_element("b");

        doc.replace(t, b).unwrap();
        doc.append_child(b, t);

        assert_eq!(doc.children(p), &[b]);
        assert!(doc.contains(p, t));
        assert!(doc.contains(t, t));
        assert!(!doc.contains(t, p));
        assert!(doc.replace(doc.root(), b).is_err());
    }

    #[test]
    fn replace_with_children_splices_in_place() {
        let mut doc = Document::new();
        let (p, t1) = paragraph(&mut doc, "a");
        let b = doc.create_element("b");
        let t2 = doc.create_text("b");
        let t3 = doc.create_text("c");
        let i = doc.create_element("i");
        doc.append_child(p, b);
        doc.append_child(b, t2);
        doc.append_child(b, i);
        doc.append_child(p, t3);

        assert_eq!(doc.replace_with_children(b).unwrap(), p);

        assert_eq!(doc.children(p), &[t1, t2, i, t3]);
        assert_eq!(doc.parent(i), Some(p));
        assert_eq!(doc.parent(b), None);
        assert!(doc.children(b).is_empty());
        assert!(doc.replace_with_children(b).is_err());
    }

    #[test]
    fn descendants_are_in_document_order() {
        let mut doc = Document::new();
        let (p, t1) = paragraph(&mut doc, "one");
        let b = doc.create_element("b");
        let t2 = doc.create_text("two");
        let t3 = doc.create_text("three");
        doc.append_child(p, b);
        doc.append_child(b, t2);
        doc.append_child(p, t3);

        assert_eq!(doc.descendants(p), vec![t1, b, t2, t3]);
        assert_eq!(doc.text_content(doc.root()), "onetwothree");
    }

    #[test]
    fn attached_frames_keep_their_origin() {
        let mut doc = Document::with_origin("https://a.example");
        let iframe = doc.create_element("iframe");
        doc.append_child(doc.root(), iframe);

        let mut sub = Document::with_origin("https://a.example");
        let html = sub.create_element("html");
        sub.append_child(sub.root(), html);
        doc.load_frame(iframe, sub).unwrap();

        let root = doc.frame_root(iframe).unwrap();
        assert_eq!(doc.tag_name(root), Some("html"));
        assert_eq!(doc.origin_of(root), "https://a.example");

        let foreign = doc.create_element("iframe");
        doc.append_child(doc.root(), foreign);
        doc.load_frame(foreign, Document::with_origin("https://b.example"))
            .unwrap();
        assert!(matches!(
            doc.frame_root(foreign),
            Err(MarkError::FrameInaccessible(_))
        ));
    }

    #[test]
    fn attach_frame_requires_an_iframe() {
        let mut doc = Document::new();
        let (p, _) = paragraph(&mut doc, "x");
        assert!(matches!(
            doc.attach_frame(p, Document::new()),
            Err(MarkError::NotFrame(_))
        ));
    }
}
