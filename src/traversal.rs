//! Context enumeration and eligible text leaf collection.
//!
//! A pass first resolves its contexts: the caller's roots plus, when frame
//! descent is on, the document element of every reachable same-origin
//! sub-document, each visited before the context that embeds it. Leaves are
//! then collected per context in document order.
use crate::dom::{Document, FrameState, NodeId, Selector, SelectorScope};
use crate::error::{MarkError, Result};
use crate::options::{MarkOptions, MARKER_ATTRIBUTE};
use log::Level;
use std::collections::HashSet;

const BUILTIN_EXCLUSIONS: [&str; 3] = ["script", "style", "title"];

/// Selectors whose matching element hides its direct text children.
#[derive(Debug, Clone)]
pub struct ExclusionRules {
    selectors: Vec<Selector>,
}

impl ExclusionRules {
    /// Built-in containers plus the caller's selectors. With `exclude_markers`
    /// existing markers are skipped too, so a second pass never nests them.
    pub fn new(options: &MarkOptions, exclude_markers: bool) -> Self {
        let mut sources: Vec<String> = options.exclude.clone();
        sources.extend(BUILTIN_EXCLUSIONS.iter().map(|s| s.to_string()));
        if exclude_markers {
            sources.push(format!("*[{MARKER_ATTRIBUTE}='true']"));
        }

        let selectors = sources
            .iter()
            .filter_map(|source| match Selector::parse(source) {
                Ok(selector) => Some(selector),
                Err(err) => {
                    options.log(Level::Warn, format!("Ignoring exclusion: {err}"));
                    None
                }
            })
            .collect();

        Self { selectors }
    }

    pub fn matches(&self, doc: &Document, element: NodeId) -> bool {
        self.selectors.iter().any(|s| s.matches(doc, element))
    }

    /// Every element matching a rule in the trees that own `roots`. Each
    /// tree is rendered for selection once.
    pub fn excluded(&self, doc: &Document, roots: &[NodeId]) -> HashSet<NodeId> {
        let mut trees = Vec::new();
        let mut excluded = HashSet::new();
        for root in roots {
            let tree = doc.tree_root(*root);
            if trees.contains(&tree) {
                continue;
            }
            trees.push(tree);
            let scope = SelectorScope::of(doc, tree);
            for selector in &self.selectors {
                excluded.extend(scope.matching(selector));
            }
        }
        excluded
    }

    /// A leaf is excluded when its immediate container matches a rule.
    pub fn excludes_leaf(&self, doc: &Document, leaf: NodeId) -> bool {
        doc.parent(leaf)
            .is_some_and(|container| self.matches(doc, container))
    }
}

pub struct TreeWalker<'o> {
    options: &'o MarkOptions,
    exclusions: ExclusionRules,
}

impl<'o> TreeWalker<'o> {
    pub fn new(options: &'o MarkOptions, exclude_markers: bool) -> Self {
        Self {
            options,
            exclusions: ExclusionRules::new(options, exclude_markers),
        }
    }

    pub fn exclusions(&self) -> &ExclusionRules {
        &self.exclusions
    }

    /// Drops duplicate roots and roots nested in another root; the ancestor
    /// wins no matter which one was listed first.
    pub fn roots(&self, doc: &Document, roots: &[NodeId]) -> Vec<NodeId> {
        if roots.is_empty() {
            self.options.log(Level::Warn, "Empty context");
            return Vec::new();
        }

        let mut kept: Vec<NodeId> = Vec::with_capacity(roots.len());
        for (i, root) in roots.iter().enumerate() {
            let covered = roots.iter().enumerate().any(|(j, other)| {
                if other == root {
                    j < i
                } else {
                    doc.contains(*other, *root)
                }
            });
            if !covered {
                kept.push(*root);
            }
        }
        kept
    }

    /// Every context of the pass, sub-documents before their hosts. Waits on
    /// each frame's readiness; inaccessible frames are reported and skipped.
    pub async fn contexts(&self, doc: &Document, roots: &[NodeId]) -> Vec<NodeId> {
        let mut visited = Vec::new();
        for root in self.roots(doc, roots) {
            self.visit(doc, root, &mut visited).await;
        }

        let mut handled: Vec<NodeId> = Vec::with_capacity(visited.len());
        for context in visited {
            if !handled.iter().any(|h| doc.contains(*h, context)) {
                handled.push(context);
            }
        }
        handled
    }

    async fn visit(&self, doc: &Document, context: NodeId, out: &mut Vec<NodeId>) {
        if self.options.iframes {
            let frames: Vec<NodeId> = doc
                .descendants(context)
                .into_iter()
                .filter(|node| doc.frame(*node).is_some())
                .collect();

            for iframe in frames {
                match self.open_frame(doc, iframe).await {
                    Ok(sub) => Box::pin(self.visit(doc, sub, out)).await,
                    Err(err) => {
                        let src = doc.attr(iframe, "src").unwrap_or_default();
                        self.options.log(
                            Level::Warn,
                            format!("iframe \"{src}\" could not be accessed"),
                        );
                        self.options.log(Level::Debug, err);
                    }
                }
            }
        }
        out.push(context);
    }

    async fn open_frame(&self, doc: &Document, iframe: NodeId) -> Result<NodeId> {
        let handle = doc
            .frame_handle(iframe)
            .ok_or(MarkError::NotFrame(iframe))?;
        match handle.ready(self.options.frame_timeout()).await? {
            FrameState::Ready => doc.frame_root(iframe),
            _ => Err(MarkError::FrameInaccessible(
                doc.attr(iframe, "src").unwrap_or_default().to_string(),
            )),
        }
    }

    /// Eligible text leaves of the given contexts, in traversal order.
    pub fn leaves(&self, doc: &Document, contexts: &[NodeId]) -> Vec<NodeId> {
        let excluded = self.exclusions.excluded(doc, contexts);
        let hidden = |leaf: NodeId| doc.parent(leaf).is_some_and(|c| excluded.contains(&c));

        let mut leaves = Vec::new();
        for context in contexts {
            let nodes = std::iter::once(*context).chain(doc.descendants(*context));
            leaves.extend(nodes.filter(|node| doc.is_text(*node) && !hidden(*node)));
        }
        leaves
    }
}
