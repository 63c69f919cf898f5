//! CSS selectors for exclusion rules and marker lookup, evaluated by
//! `scraper`.
//!
//! The arena is not a scraper tree, so selection runs against a
//! [`SelectorScope`]: the tree that owns a node, rendered once as HTML with
//! every element tagged by its arena index and parsed back with
//! `Html::parse_document`. Matches map back to [`NodeId`]s via that tag.
use super::{Document, NodeData, NodeId};
use crate::error::{MarkError, Result};
use quick_xml::escape::partial_escape;
use scraper::Html;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

const NODE_ATTRIBUTE: &str = "data-treemark-node";

/// Elements the HTML parser never gives an end tag.
const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

#[derive(Debug, Clone)]
pub struct Selector {
    source: String,
    compiled: scraper::Selector,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self> {
        let compiled = scraper::Selector::parse(source).map_err(|err| MarkError::Selector {
            selector: source.to_string(),
            reason: err.to_string(),
        })?;
        Ok(Self {
            source: source.to_string(),
            compiled,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// One-off check. Builds a scope for the owning tree, so prefer
    /// [`SelectorScope::matching`] when testing many nodes.
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        doc.element(node).is_some() && SelectorScope::of(doc, node).matching(self).contains(&node)
    }
}

impl FromStr for Selector {
    type Err = MarkError;

    fn from_str(source: &str) -> Result<Self> {
        Self::parse(source)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Scraper view of the tree owning some node, reflecting the arena at the
/// time it was built.
pub struct SelectorScope {
    html: Html,
}

impl SelectorScope {
    pub fn of(doc: &Document, node: NodeId) -> Self {
        let mut markup = String::new();
        write_tagged(doc, doc.tree_root(node), &mut markup);
        Self {
            html: Html::parse_document(&markup),
        }
    }

    /// Every arena element of the scope that `selector` matches.
    pub fn matching(&self, selector: &Selector) -> HashSet<NodeId> {
        self.html
            .select(&selector.compiled)
            .filter_map(|element| element.value().attr(NODE_ATTRIBUTE))
            .filter_map(|index| index.parse().ok())
            .map(NodeId)
            .collect()
    }
}

fn write_tagged(doc: &Document, id: NodeId, out: &mut String) {
    match doc.data(id) {
        NodeData::Document { .. } => {
            for child in doc.children(id) {
                write_tagged(doc, *child, out);
            }
        }
        NodeData::Element(element) => {
            out.push('<');
            out.push_str(&element.name);
            for (key, value) in &element.attrs {
                if key == NODE_ATTRIBUTE {
                    continue;
                }
                out.push_str(&format!(" {key}=\"{}\"", partial_escape(value).replace('"', "&quot;")));
            }
            out.push_str(&format!(" {NODE_ATTRIBUTE}=\"{}\">", id.0));
            for child in doc.children(id) {
                write_tagged(doc, *child, out);
            }
            if !VOID_ELEMENTS.iter().any(|v| element.name.eq_ignore_ascii_case(v)) {
                out.push_str(&format!("</{}>", element.name));
            }
        }
        NodeData::Text(text) => out.push_str(&partial_escape(text.as_str())),
        NodeData::Comment(_) | NodeData::Prolog(_) => {}
    }
}
