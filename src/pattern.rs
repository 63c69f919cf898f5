//! Translation of a raw keyword into a search expression, and the compiled
//! [`Pattern`] the matchers run.
//!
//! Building happens in fixed steps, each skipped when its option is off:
//! escaping, synonym alternation, diacritic classes, blank merging and
//! accuracy anchoring. Keyword expressions always carry two leading groups:
//! group 1 is the consumed left boundary and group 2 is the term that gets
//! wrapped.
use crate::error::Result;
use crate::options::{AccuracyMode, MarkOptions};
use lazy_static::lazy_static;
use regex::{NoExpand, Regex, RegexBuilder};

lazy_static! {
    static ref BLANKS: Regex = Regex::new(r"\s+").unwrap();
}

/// Equivalence classes used for diacritic folding. Upper and lower case are
/// separate classes; case folding is left to the regex flags.
const DIACRITIC_CLASSES: [&str; 28] = [
    "aàáâãäåāą",
    "AÀÁÂÃÄÅĀĄ",
    "cçćč",
    "CÇĆČ",
    "dđď",
    "DĐĎ",
    "eèéêëěēę",
    "EÈÉÊËĚĒĘ",
    "iìíîïī",
    "IÌÍÎÏĪ",
    "lł",
    "LŁ",
    "nñňń",
    "NÑŇŃ",
    "oòóôõöøō",
    "OÒÓÔÕÖØŌ",
    "rř",
    "RŘ",
    "sšś",
    "SŠŚ",
    "tť",
    "TŤ",
    "uùúûüůū",
    "UÙÚÛÜŮŪ",
    "yÿý",
    "YŸÝ",
    "zžżź",
    "ZŽŻŹ",
];

pub struct PatternBuilder<'a> {
    options: &'a MarkOptions,
}

impl<'a> PatternBuilder<'a> {
    pub fn new(options: &'a MarkOptions) -> Self {
        Self { options }
    }

    pub fn build(&self, keyword: &str) -> String {
        let mut pattern = regex::escape(keyword);
        if !self.options.synonyms.is_empty() {
            pattern = self.synonyms(&pattern);
        }
        if self.options.diacritics {
            pattern = fold_diacritics(&pattern);
        }
        pattern = merge_blanks(&pattern);
        self.accuracy(&pattern)
    }

    /// Rewrites every occurrence of either side of a synonym pair into an
    /// alternation of both. Pairs apply in map order, so a later pair also
    /// sees the alternations produced by earlier ones.
    fn synonyms(&self, pattern: &str) -> String {
        let mut pattern = pattern.to_string();
        for (term, synonym) in &self.options.synonyms {
            if term.is_empty() || synonym.is_empty() {
                continue;
            }
            let left = regex::escape(term);
            let right = regex::escape(synonym);
            // the pattern text is already escaped, so look for the escaped forms
            let finder = format!("{}|{}", regex::escape(&left), regex::escape(&right));
            let finder = match RegexBuilder::new(&finder)
                .case_insensitive(!self.options.case_sensitive)
                .build()
            {
                Ok(finder) => finder,
                Err(_) => continue,
            };
            let alternation = format!("(?:{left}|{right})");
            pattern = finder
                .replace_all(&pattern, NoExpand(&alternation))
                .into_owned();
        }
        pattern
    }

    fn accuracy(&self, pattern: &str) -> String {
        let accuracy = &self.options.accuracy;
        let limiters = accuracy.limiters();

        match accuracy.mode() {
            AccuracyMode::Partially => format!("()({pattern})"),
            AccuracyMode::Complementary => {
                let class: String = limiters
                    .iter()
                    .flat_map(|limiter| limiter.chars())
                    .map(|c| regex::escape(c.encode_utf8(&mut [0; 4])))
                    .collect();
                format!(r"()([^\s{class}]*{pattern}[^\s{class}]*)")
            }
            AccuracyMode::Exactly => {
                let alternatives: String = limiters
                    .iter()
                    .filter(|limiter| !limiter.is_empty())
                    .map(|limiter| format!("|{}", regex::escape(limiter)))
                    .collect();
                // the trailing boundary is consumed; matchers resume at the
                // end of the term group, so it behaves like a lookahead
                format!(r"(^|\s{alternatives})({pattern})(?:$|\s{alternatives})")
            }
        }
    }
}

fn fold_diacritics(pattern: &str) -> String {
    let mut folded = String::with_capacity(pattern.len() * 4);
    for ch in pattern.chars() {
        match DIACRITIC_CLASSES.iter().find(|class| class.contains(ch)) {
            Some(class) => {
                folded.push('[');
                folded.push_str(class);
                folded.push(']');
            }
            None => folded.push(ch),
        }
    }
    folded
}

fn merge_blanks(pattern: &str) -> String {
    BLANKS.replace_all(pattern, NoExpand(r"\s*")).into_owned()
}

/// A compiled search expression plus the capture group holding the text to
/// wrap (2 for keyword patterns, 0 for caller-supplied expressions).
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
    group: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternMatch {
    pub start: usize,
    pub end: usize,
}

impl Pattern {
    pub const TERM_GROUP: usize = 2;

    pub fn compile(source: &str, case_sensitive: bool) -> Result<Self> {
        let regex = RegexBuilder::new(source)
            .case_insensitive(!case_sensitive)
            .multi_line(true)
            .build()?;
        Ok(Self {
            regex,
            group: Self::TERM_GROUP,
        })
    }

    pub fn for_keyword(keyword: &str, options: &MarkOptions) -> Result<Self> {
        let source = PatternBuilder::new(options).build(keyword);
        Self::compile(&source, options.case_sensitive)
    }

    pub fn from_regex(regex: Regex) -> Self {
        Self { regex, group: 0 }
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Next non-empty match whose wrapped group starts at or after `from`.
    /// Boundary groups still see the text before `from`.
    pub fn find_at(&self, text: &str, mut from: usize) -> Option<PatternMatch> {
        while from <= text.len() {
            let captures = self.regex.captures_at(text, from)?;
            let found = captures.get(self.group)?;
            if found.start() < found.end() {
                return Some(PatternMatch {
                    start: found.start(),
                    end: found.end(),
                });
            }
            let at = found.end().max(from);
            from = at + text[at..].chars().next().map_or(1, char::len_utf8);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Accuracy;

    fn matches(options: &MarkOptions, keyword: &str, text: &str) -> Vec<String> {
        let pattern = Pattern::for_keyword(keyword, options).unwrap();
        let mut found = Vec::new();
        let mut from = 0;
        while let Some(m) = pattern.find_at(text, from) {
            found.push(text[m.start..m.end].to_string());
            from = m.end;
        }
        found
    }

    fn with_accuracy(mode: AccuracyMode) -> MarkOptions {
        MarkOptions {
            accuracy: Accuracy::Mode(mode),
            ..MarkOptions::default()
        }
    }

    #[test]
    fn escapes_meta_characters() {
        let options = MarkOptions {
            diacritics: false,
            ..MarkOptions::default()
        };
        assert_eq!(PatternBuilder::new(&options).build("a.b"), r"()(a\.b)");
        assert_eq!(matches(&options, "c++", "c++ and cxx"), vec!["c++"]);
    }

    #[test]
    fn merges_blanks_into_optional_whitespace() {
        let options = MarkOptions {
            diacritics: false,
            ..MarkOptions::default()
        };
        assert_eq!(PatternBuilder::new(&options).build("new  york"), r"()(new\s*york)");
        assert_eq!(matches(&options, "new york", "newyork, new\nyork"), vec!["newyork", "new\nyork"]);
    }

    #[test]
    fn folds_diacritics_once_per_class() {
        let pattern = fold_diacritics("aa");
        assert_eq!(pattern, "[aàáâãäåāą][aàáâãäåāą]");

        let options = MarkOptions::default();
        assert_eq!(matches(&options, "café", "Cafe CAFÉ cafè"), vec!["Cafe", "CAFÉ", "cafè"]);

        let strict = MarkOptions {
            diacritics: false,
            ..MarkOptions::default()
        };
        assert!(matches(&strict, "café", "cafe").is_empty());
    }

    #[test]
    fn synonyms_become_alternations() {
        let mut options = MarkOptions {
            diacritics: false,
            ..MarkOptions::default()
        };
        options.synonyms.insert("say".into(), "talk".into());

        assert_eq!(PatternBuilder::new(&options).build("Say"), "()((?:say|talk))");
        assert_eq!(matches(&options, "say", "let's talk"), vec!["talk"]);
    }

    #[test]
    fn synonyms_respect_case_sensitivity() {
        let mut options = MarkOptions {
            diacritics: false,
            case_sensitive: true,
            ..MarkOptions::default()
        };
        options.synonyms.insert("say".into(), "talk".into());
        assert_eq!(PatternBuilder::new(&options).build("Say"), "()(Say)");
    }

    #[test]
    fn accuracy_modes() {
        let text = "cats category cat.";
        assert_eq!(
            matches(&with_accuracy(AccuracyMode::Partially), "cat", text),
            vec!["cat", "cat", "cat"]
        );
        assert_eq!(matches(&with_accuracy(AccuracyMode::Exactly), "cat", text), vec!["cat"]);
        assert_eq!(
            matches(&with_accuracy(AccuracyMode::Complementary), "cat", text),
            vec!["cats", "category", "cat."]
        );
    }

    #[test]
    fn exactly_allows_adjacent_terms() {
        let options = with_accuracy(AccuracyMode::Exactly);
        assert_eq!(matches(&options, "cat", "cat cat,cat"), vec!["cat", "cat", "cat"]);
        assert!(matches(&options, "cat", "concat cats").is_empty());
    }

    #[test]
    fn explicit_limiters_replace_defaults() {
        let options = MarkOptions {
            accuracy: Accuracy::Limited {
                value: AccuracyMode::Exactly,
                limiters: vec!["-".into()],
            },
            ..MarkOptions::default()
        };
        assert_eq!(matches(&options, "cat", "cat-x cat."), vec!["cat"]);

        let options = MarkOptions {
            accuracy: Accuracy::Limited {
                value: AccuracyMode::Complementary,
                limiters: vec!["-".into()],
            },
            ..MarkOptions::default()
        };
        assert_eq!(matches(&options, "cat", "wildcat-food"), vec!["wildcat"]);
    }

    #[test]
    fn custom_patterns_skip_empty_matches() {
        let pattern = Pattern::from_regex(Regex::new("x*").unwrap());
        assert_eq!(pattern.find_at("abxxc", 0), Some(PatternMatch { start: 2, end: 4 }));
        assert_eq!(pattern.find_at("abc", 0), None);
    }
}
