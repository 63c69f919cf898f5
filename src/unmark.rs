//! Marker removal
use crate::dom::{Document, NodeId, Selector};
use crate::error::Result;
use crate::options::{MarkOptions, MARKER_ATTRIBUTE};
use crate::traversal::TreeWalker;
use log::Level;

/// Selector matching the markers a pass with `options` would have created:
/// `<element or *>[data-markjs]`, narrowed by class when one is set.
pub fn marker_selector(options: &MarkOptions) -> String {
    let mut selector = if options.element.is_empty() {
        "*".to_string()
    } else {
        options.element.clone()
    };
    selector.push_str(&format!("[{MARKER_ATTRIBUTE}]"));
    if !options.class_name.is_empty() {
        selector.push('.');
        selector.push_str(&options.class_name);
    }
    selector
}

/// Replaces `marker` with its children and merges the text around it.
pub fn unwrap_marker(doc: &mut Document, marker: NodeId) -> Result<()> {
    let parent = doc.replace_with_children(marker)?;
    doc.normalize(parent);
    Ok(())
}

/// Unwraps every non-excluded marker below `roots`; returns how many went.
pub fn remove_markers(doc: &mut Document, roots: &[NodeId], options: &MarkOptions) -> usize {
    let source = marker_selector(options);
    options.log(Level::Debug, format!("Removal selector \"{source}\""));

    let selector = match Selector::parse(&source) {
        Ok(selector) => selector,
        Err(err) => {
            options.log(Level::Warn, err);
            return 0;
        }
    };

    let walker = TreeWalker::new(options, false);
    let mut removed = 0;
    for root in walker.roots(doc, roots) {
        let excluded = walker.exclusions().excluded(doc, &[root]);
        for marker in doc.select(root, &selector) {
            if excluded.contains(&marker) {
                continue;
            }
            match unwrap_marker(doc, marker) {
                Ok(()) => removed += 1,
                Err(err) => options.log(Level::Warn, err),
            }
        }
    }
    removed
}
