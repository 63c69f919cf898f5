use super::{wrap_range, MatchSink};
use crate::dom::{Document, NodeId};
use crate::error::Result;
use crate::options::MarkOptions;
use crate::pattern::Pattern;

/// Matches `pattern` inside each leaf on its own. After a wrap the scan goes
/// on in the suffix node from offset zero, since the old offset no longer
/// points into live text.
pub fn mark_within<S: MatchSink>(
    doc: &mut Document,
    pattern: &Pattern,
    leaves: &[NodeId],
    options: &MarkOptions,
    sink: &mut S,
) -> Result<usize> {
    let mut created = 0;

    for &leaf in leaves {
        let mut node = leaf;
        let mut cursor = 0;

        loop {
            let text = doc.text(node).unwrap_or_default();
            let Some(found) = pattern.find_at(text, cursor) else {
                break;
            };
            let matched = text[found.start..found.end].to_string();

            if !sink.accept(doc, node, &matched) {
                cursor = found.end;
                continue;
            }

            let wrapped = wrap_range(doc, node, found.start, found.end, options)?;
            created += 1;
            sink.record(doc, wrapped.marker);
            node = wrapped.suffix;
            cursor = 0;
        }
    }

    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(doc: &Document) -> Vec<NodeId> {
        doc.descendants(doc.root())
            .into_iter()
            .filter(|n| doc.is_text(*n))
            .collect()
    }

    #[test]
    fn wraps_repeated_matches_in_one_leaf() {
        let mut doc = Document::parse("<p>cat cat cat</p>").unwrap();
        let options = MarkOptions::default();
        let pattern = Pattern::for_keyword("cat", &options).unwrap();
        let leaves = leaves(&doc);

        let created = mark_within(&mut doc, &pattern, &leaves, &options, &mut ()).unwrap();

        assert_eq!(created, 3);
        assert_eq!(doc.text_content(doc.root()), "cat cat cat");
    }

    #[test]
    fn never_crosses_leaf_boundaries() {
        let mut doc = Document::parse("<p>wor<b>ld</b></p>").unwrap();
        let options = MarkOptions::default();
        let pattern = Pattern::for_keyword("world", &options).unwrap();
        let leaves = leaves(&doc);

        let created = mark_within(&mut doc, &pattern, &leaves, &options, &mut ()).unwrap();

        assert_eq!(created, 0);
        assert_eq!(doc.to_markup(), "<p>wor<b>ld</b></p>");
    }
}
