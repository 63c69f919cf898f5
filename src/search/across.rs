//! Cross-fragment matching over a [`TextIndex`].
//!
//! A match found in the virtual buffer may cover several leaves. Each covered
//! piece is wrapped separately, left to right, and the index is repaired after
//! every wrap so the remaining entries keep describing live text.
use super::{wrap_range, MatchSink, TextIndex};
use crate::dom::Document;
use crate::error::Result;
use crate::options::MarkOptions;
use crate::pattern::Pattern;

/// Runs `pattern` over `index` and returns the number of markers created.
pub fn mark_across<S: MatchSink>(
    doc: &mut Document,
    pattern: &Pattern,
    index: &mut TextIndex,
    options: &MarkOptions,
    sink: &mut S,
) -> Result<usize> {
    let mut created = 0;
    let mut cursor = 0;

    while let Some(found) = pattern.find_at(index.value(), cursor) {
        let matched = index.value()[found.start..found.end].to_string();
        cursor = found.end;

        let mut start = found.start;
        let mut end = found.end;
        let Some(mut i) = index.locate(start) else {
            break;
        };

        loop {
            let entry = index.entries()[i];
            let local_start = start - entry.start;
            let local_end = end.min(entry.end) - entry.start;
            if local_end <= local_start {
                break;
            }
            // a rejected piece ends this match; pieces wrapped so far stay
            if !sink.accept(doc, entry.node, &matched) {
                break;
            }

            let wrapped = wrap_range(doc, entry.node, local_start, local_end, options)?;
            index.consume(i, local_end, wrapped.suffix);
            debug_assert!(
                index.is_consistent(doc),
                "text index out of step with the tree after wrapping {matched:?}"
            );
            end -= local_end;
            cursor = entry.start;
            created += 1;
            sink.record(doc, wrapped.marker);

            let covered_to = index.entries()[i].end;
            if end <= covered_to {
                break;
            }
            start = covered_to;
            match index.locate(start) {
                Some(next) if next > i => i = next,
                _ => break,
            }
        }
    }

    Ok(created)
}
