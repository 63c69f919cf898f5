//! Public marking entry points.
//!
//! A [`Mark`] is bound to a [`Context`] (the roots to search) and sequences a
//! pass: normalize keywords, build one pattern per keyword, run the matcher
//! chosen by the options, report through a [`MarkHandler`]. Failures never
//! escape these entry points; they end up as diagnostics and zero-match
//! completions.
use crate::dom::{Document, NodeId};
use crate::error::Result;
use crate::keywords::{Keywords, Terms};
use crate::options::MarkOptions;
use crate::pattern::{Pattern, PatternBuilder};
use crate::search::{mark_across, mark_within, MatchSink, PatternCache, TextIndex};
use crate::traversal::TreeWalker;
use crate::unmark::remove_markers;
use log::Level;
use regex::Regex;
use std::sync::Arc;

/// Roots a pass searches: one node, several, or none.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context(Vec<NodeId>);

impl Context {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn as_slice(&self) -> &[NodeId] {
        &self.0
    }
}

impl From<NodeId> for Context {
    fn from(node: NodeId) -> Self {
        Context(vec![node])
    }
}

impl From<Option<NodeId>> for Context {
    fn from(node: Option<NodeId>) -> Self {
        Context(node.into_iter().collect())
    }
}

impl From<Vec<NodeId>> for Context {
    fn from(nodes: Vec<NodeId>) -> Self {
        Context(nodes)
    }
}

impl From<&[NodeId]> for Context {
    fn from(nodes: &[NodeId]) -> Self {
        Context(nodes.to_vec())
    }
}

/// Observer of a marking pass. Every method has a no-op default; `filter`
/// accepts everything unless overridden.
pub trait MarkHandler {
    /// Called once per created marker.
    fn each(&mut self, _doc: &Document, _marker: NodeId) {}

    fn no_match(&mut self, _term: &str) {}

    /// Decides whether the match found in `leaf` gets wrapped. `term_matches`
    /// counts markers created so far for `term`, `total` those of the pass.
    fn filter(
        &mut self,
        _doc: &Document,
        _leaf: NodeId,
        _term: &str,
        _term_matches: usize,
        _total: usize,
    ) -> bool {
        true
    }

    /// Called exactly once, after the last keyword.
    fn done(&mut self, _total: usize) {}
}

impl MarkHandler for () {}

type EachFn<'a> = Box<dyn FnMut(&Document, NodeId) + 'a>;
type NoMatchFn<'a> = Box<dyn FnMut(&str) + 'a>;
type FilterFn<'a> = Box<dyn FnMut(&Document, NodeId, &str, usize, usize) -> bool + 'a>;
type DoneFn<'a> = Box<dyn FnMut(usize) + 'a>;

/// Closure-backed [`MarkHandler`].
#[derive(Default)]
pub struct Callbacks<'a> {
    each: Option<EachFn<'a>>,
    no_match: Option<NoMatchFn<'a>>,
    filter: Option<FilterFn<'a>>,
    done: Option<DoneFn<'a>>,
}

impl<'a> Callbacks<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_each(mut self, f: impl FnMut(&Document, NodeId) + 'a) -> Self {
        self.each = Some(Box::new(f));
        self
    }

    pub fn on_no_match(mut self, f: impl FnMut(&str) + 'a) -> Self {
        self.no_match = Some(Box::new(f));
        self
    }

    pub fn on_filter(
        mut self,
        f: impl FnMut(&Document, NodeId, &str, usize, usize) -> bool + 'a,
    ) -> Self {
        self.filter = Some(Box::new(f));
        self
    }

    pub fn on_done(mut self, f: impl FnMut(usize) + 'a) -> Self {
        self.done = Some(Box::new(f));
        self
    }
}

impl MarkHandler for Callbacks<'_> {
    fn each(&mut self, doc: &Document, marker: NodeId) {
        if let Some(f) = self.each.as_mut() {
            f(doc, marker);
        }
    }

    fn no_match(&mut self, term: &str) {
        if let Some(f) = self.no_match.as_mut() {
            f(term);
        }
    }

    fn filter(
        &mut self,
        doc: &Document,
        leaf: NodeId,
        term: &str,
        term_matches: usize,
        total: usize,
    ) -> bool {
        match self.filter.as_mut() {
            Some(f) => f(doc, leaf, term, term_matches, total),
            None => true,
        }
    }

    fn done(&mut self, total: usize) {
        if let Some(f) = self.done.as_mut() {
            f(total);
        }
    }
}

/// Bridges one keyword's matcher run to the handler.
struct KeywordPass<'h, H> {
    handler: &'h mut H,
    keyword: &'h str,
    matches: usize,
    total: usize,
}

impl<H: MarkHandler> MatchSink for KeywordPass<'_, H> {
    fn accept(&mut self, doc: &Document, leaf: NodeId, _matched: &str) -> bool {
        self.handler
            .filter(doc, leaf, self.keyword, self.matches, self.total)
    }

    fn record(&mut self, doc: &Document, marker: NodeId) {
        self.matches += 1;
        self.total += 1;
        self.handler.each(doc, marker);
    }
}

/// Custom expressions hand the matched text to the filter and use the pass
/// total for both counters.
struct RegexPass<'h, H> {
    handler: &'h mut H,
    total: usize,
}

impl<H: MarkHandler> MatchSink for RegexPass<'_, H> {
    fn accept(&mut self, doc: &Document, leaf: NodeId, matched: &str) -> bool {
        self.handler
            .filter(doc, leaf, matched, self.total, self.total)
    }

    fn record(&mut self, doc: &Document, marker: NodeId) {
        self.total += 1;
        self.handler.each(doc, marker);
    }
}

pub struct Mark {
    context: Context,
    cache: Arc<PatternCache>,
}

impl Mark {
    pub fn new(context: impl Into<Context>) -> Self {
        Self {
            context: context.into(),
            cache: Arc::new(PatternCache::default()),
        }
    }

    /// Shares a pattern cache between instances, e.g. across files.
    pub fn with_cache(mut self, cache: Arc<PatternCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Marks every keyword derived from `terms`, longest first. Returns the
    /// number of markers created, which is also what `done` receives.
    pub async fn mark<H: MarkHandler>(
        &self,
        doc: &mut Document,
        terms: impl Into<Terms>,
        options: &MarkOptions,
        handler: &mut H,
    ) -> usize {
        let keywords = Keywords::normalize(&terms.into(), options.separate_word_search);
        if keywords.is_empty() {
            handler.done(0);
            return 0;
        }

        let walker = TreeWalker::new(options, true);
        let contexts = walker.contexts(doc, self.context.as_slice()).await;
        let mut total = 0;

        for keyword in keywords.iter() {
            let source = PatternBuilder::new(options).build(keyword);
            options.log(
                Level::Debug,
                format!("Searching with expression \"{source}\""),
            );

            let mut pass = KeywordPass {
                handler: &mut *handler,
                keyword,
                matches: 0,
                total,
            };
            let outcome = self
                .cache
                .get_or_compile(&source, options.case_sensitive)
                .and_then(|pattern| run(doc, &pattern, &walker, &contexts, options, &mut pass));
            if let Err(err) = outcome {
                options.log(Level::Warn, format!("Keyword \"{keyword}\" skipped: {err}"));
            }

            let matches = pass.matches;
            total = pass.total;
            if matches == 0 {
                handler.no_match(keyword);
            }
        }

        handler.done(total);
        total
    }

    /// Marks every match of a caller-built expression; the whole match is
    /// wrapped and the regex's own flags apply.
    pub async fn mark_regex<H: MarkHandler>(
        &self,
        doc: &mut Document,
        regex: &Regex,
        options: &MarkOptions,
        handler: &mut H,
    ) -> usize {
        options.log(
            Level::Debug,
            format!("Searching with expression \"{}\"", regex.as_str()),
        );

        let walker = TreeWalker::new(options, true);
        let contexts = walker.contexts(doc, self.context.as_slice()).await;
        let pattern = Pattern::from_regex(regex.clone());

        let mut pass = RegexPass {
            handler: &mut *handler,
            total: 0,
        };
        if let Err(err) = run(doc, &pattern, &walker, &contexts, options, &mut pass) {
            options.log(Level::Warn, err);
        }
        let total = pass.total;

        if total == 0 {
            handler.no_match(regex.as_str());
        }
        handler.done(total);
        total
    }

    /// Removes markers matching the options' element and class. `on_done`
    /// fires once; the count of removed markers is returned.
    pub fn unmark(&self, doc: &mut Document, options: &MarkOptions, on_done: impl FnOnce()) -> usize {
        let removed = remove_markers(doc, self.context.as_slice(), options);
        on_done();
        removed
    }
}

fn run<S: MatchSink>(
    doc: &mut Document,
    pattern: &Pattern,
    walker: &TreeWalker<'_>,
    contexts: &[NodeId],
    options: &MarkOptions,
    sink: &mut S,
) -> Result<usize> {
    let leaves = walker.leaves(doc, contexts);
    if options.across_elements {
        let mut index = TextIndex::build(doc, &leaves);
        mark_across(doc, pattern, &mut index, options, sink)
    } else {
        mark_within(doc, pattern, &leaves, options, sink)
    }
}
