//! Matching and wrapping engine: per-leaf and cross-fragment matchers
pub mod across;
pub mod cache;
pub mod fragment;
pub mod index;

use crate::dom::{Document, NodeId};
use crate::error::{MarkError, Result};
use crate::options::{MarkOptions, MARKER_ATTRIBUTE};

pub use across::mark_across;
pub use cache::PatternCache;
pub use fragment::mark_within;
pub use index::{IndexEntry, TextIndex};

/// Receives every candidate match of a matcher run: `accept` decides whether
/// the piece in `leaf` gets wrapped, `record` sees each created marker.
pub trait MatchSink {
    fn accept(&mut self, doc: &Document, leaf: NodeId, matched: &str) -> bool;
    fn record(&mut self, doc: &Document, marker: NodeId);
}

/// Accepts everything and counts nothing; handy for tests and benches.
impl MatchSink for () {
    fn accept(&mut self, _: &Document, _: NodeId, _: &str) -> bool {
        true
    }

    fn record(&mut self, _: &Document, _: NodeId) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wrapped {
    pub marker: NodeId,
    pub suffix: NodeId,
}

/// Wraps bytes `start..end` of `leaf` in a new marker element. `leaf` keeps
/// the prefix; the returned suffix node holds whatever followed the match.
pub fn wrap_range(
    doc: &mut Document,
    leaf: NodeId,
    start: usize,
    end: usize,
    options: &MarkOptions,
) -> Result<Wrapped> {
    let text = doc.text(leaf).ok_or(MarkError::NotText(leaf))?;
    for offset in [start, end] {
        if !text.is_char_boundary(offset) {
            return Err(MarkError::InvalidOffset {
                offset,
                len: text.len(),
            });
        }
    }
    if start > end {
        return Err(MarkError::InvalidOffset {
            offset: start,
            len: text.len(),
        });
    }
    if doc.parent(leaf).is_none() {
        return Err(MarkError::Detached(leaf));
    }

    let middle = doc.split_text(leaf, start)?;
    let suffix = doc.split_text(middle, end - start)?;

    let marker = doc.create_element(options.marker_element());
    doc.set_attr(marker, MARKER_ATTRIBUTE, "true");
    if !options.class_name.is_empty() {
        doc.set_attr(marker, "class", &options.class_name);
    }
    doc.replace(middle, marker)?;
    doc.append_child(marker, middle);

    Ok(Wrapped { marker, suffix })
}
