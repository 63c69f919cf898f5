//! Virtual text buffer over many leaves, repaired in place as leaves are
//! split and wrapped.
use crate::dom::{Document, NodeId};

/// Half-open byte range of one leaf inside the virtual buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    pub start: usize,
    pub end: usize,
    pub node: NodeId,
}

#[derive(Debug, Clone, Default)]
pub struct TextIndex {
    value: String,
    entries: Vec<IndexEntry>,
}

impl TextIndex {
    pub fn build(doc: &Document, leaves: &[NodeId]) -> Self {
        let mut value = String::new();
        let mut entries = Vec::with_capacity(leaves.len());
        for &node in leaves {
            let start = value.len();
            value.push_str(doc.text(node).unwrap_or_default());
            entries.push(IndexEntry {
                start,
                end: value.len(),
                node,
            });
        }
        Self { value, entries }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Entry covering `offset`: the first one whose successor starts after
    /// it, or the last entry.
    pub fn locate(&self, offset: usize) -> Option<usize> {
        if self.entries.is_empty() {
            return None;
        }
        let after = self.entries.partition_point(|entry| entry.start <= offset);
        Some(after.saturating_sub(1))
    }

    /// Records that the first `consumed` bytes of entry `i` left the buffer
    /// and that the entry's remaining text now lives in `suffix`.
    pub fn consume(&mut self, i: usize, consumed: usize, suffix: NodeId) {
        let start = self.entries[i].start;
        self.value.replace_range(start..start + consumed, "");

        for (j, entry) in self.entries.iter_mut().enumerate().skip(i) {
            if j > i {
                entry.start -= consumed;
            }
            entry.end -= consumed;
        }
        self.entries[i].node = suffix;
    }

    /// Every entry's slice of the buffer equals its leaf's live text.
    pub fn is_consistent(&self, doc: &Document) -> bool {
        self.entries.iter().all(|entry| {
            self.value.get(entry.start..entry.end) == doc.text(entry.node)
        })
    }
}
