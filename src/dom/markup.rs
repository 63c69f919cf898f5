//! XML/XHTML markup reading and writing for [`Document`]
use super::{Document, NodeData, NodeId, DEFAULT_ORIGIN};
use crate::error::{MarkError, Result};
use quick_xml::escape::{partial_escape, resolve_html5_entity};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

impl Document {
    pub fn parse(markup: &str) -> Result<Self> {
        Self::parse_with_origin(markup, DEFAULT_ORIGIN)
    }

    pub fn parse_with_origin(markup: &str, origin: impl Into<String>) -> Result<Self> {
        let mut doc = Document::with_origin(origin);
        let mut reader = Reader::from_str(markup);
        reader.config_mut().trim_text(false);
        let mut open = vec![doc.root()];

        loop {
            let parent = open.last().copied().unwrap_or(doc.root);
            let before = reader.buffer_position() as usize;
            match reader.read_event()? {
                Event::Start(e) => {
                    let element = doc.element_from_tag(&e)?;
                    doc.append_child(parent, element);
                    open.push(element);
                }
                Event::Empty(e) => {
                    let element = doc.element_from_tag(&e)?;
                    if let Some(element) = doc.element_mut(element) {
                        element.self_closing = true;
                    }
                    doc.append_child(parent, element);
                }
                Event::End(e) => {
                    if open.len() < 2 {
                        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                        return Err(MarkError::UnbalancedMarkup(format!(
                            "unexpected closing tag </{name}>"
                        )));
                    }
                    open.pop();
                }
                Event::Text(t) => {
                    let text = t.unescape_with(resolve_html5_entity)?;
                    if !text.is_empty() {
                        let node = doc.create_text(text.into_owned());
                        doc.append_child(parent, node);
                    }
                }
                Event::CData(c) => {
                    let text = String::from_utf8_lossy(&c.into_inner()).into_owned();
                    let node = doc.create_text(text);
                    doc.append_child(parent, node);
                }
                Event::Comment(c) => {
                    let text = String::from_utf8_lossy(&c.into_inner()).into_owned();
                    let node = doc.create_comment(text);
                    doc.append_child(parent, node);
                }
                Event::Decl(_) | Event::PI(_) => {
                    let after = reader.buffer_position() as usize;
                    let raw = raw_markup(markup, before, after, "<?")?;
                    let node = doc.create_prolog(raw);
                    doc.append_child(parent, node);
                }
                Event::DocType(_) => {
                    let after = reader.buffer_position() as usize;
                    let raw = raw_markup(markup, before, after, "<!")?;
                    let node = doc.create_prolog(raw);
                    doc.append_child(parent, node);
                }
                Event::Eof => break,
            }
        }

        if let Some(unclosed) = open.get(1).and_then(|id| doc.tag_name(*id)) {
            return Err(MarkError::UnbalancedMarkup(format!(
                "element <{unclosed}> is never closed"
            )));
        }

        Ok(doc)
    }

    fn element_from_tag(&mut self, tag: &BytesStart<'_>) -> Result<NodeId> {
        let name = String::from_utf8_lossy(tag.name().as_ref()).into_owned();
        let element = self.create_element(&name);
        for attr in tag.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value_with(resolve_html5_entity)?;
            self.set_attr(element, &key, &value);
        }
        Ok(element)
    }

    pub fn to_markup(&self) -> String {
        self.markup_of(self.root())
    }

    /// Serializes `id` and its subtree. Frame content is not inlined.
    pub fn markup_of(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match self.data(id) {
            NodeData::Document { .. } => {
                for child in self.children(id) {
                    self.write_node(*child, out);
                }
            }
            NodeData::Element(element) => {
                out.push('<');
                out.push_str(&element.name);
                for (key, value) in &element.attrs {
                    out.push(' ');
                    out.push_str(key);
                    out.push_str("=\"");
                    out.push_str(&partial_escape(value.as_str()).replace('"', "&quot;"));
                    out.push('"');
                }
                if element.self_closing && self.children(id).is_empty() {
                    out.push_str("/>");
                    return;
                }
                out.push('>');
                for child in self.children(id) {
                    self.write_node(*child, out);
                }
                out.push_str("</");
                out.push_str(&element.name);
                out.push('>');
            }
            NodeData::Text(text) => out.push_str(&partial_escape(text.as_str())),
            NodeData::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeData::Prolog(raw) => out.push_str(raw),
        }
    }
}

/// Source text of the declaration that ended at `after`. The reader may
/// already have stepped past its `<` when `before` was taken.
fn raw_markup(markup: &str, before: usize, after: usize, opener: &str) -> Result<String> {
    let from = before.saturating_sub(1);
    markup
        .get(from..after)
        .and_then(|window| window.find(opener).map(|start| window[start..].to_string()))
        .ok_or_else(|| MarkError::UnbalancedMarkup(format!("unreadable declaration at byte {from}")))
}
