//! Search term normalization: splitting, deduplication and longest-first order
use std::collections::HashSet;

/// Raw search input: a single term or a list of terms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Terms(Vec<String>);

impl Terms {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<&str> for Terms {
    fn from(term: &str) -> Self {
        Terms(vec![term.to_string()])
    }
}

impl From<String> for Terms {
    fn from(term: String) -> Self {
        Terms(vec![term])
    }
}

impl From<Vec<String>> for Terms {
    fn from(terms: Vec<String>) -> Self {
        Terms(terms)
    }
}

impl From<Vec<&str>> for Terms {
    fn from(terms: Vec<&str>) -> Self {
        Terms(terms.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Terms {
    fn from(terms: &[&str]) -> Self {
        Terms(terms.iter().map(|t| t.to_string()).collect())
    }
}

impl From<&[String]> for Terms {
    fn from(terms: &[String]) -> Self {
        Terms(terms.to_vec())
    }
}

impl<const N: usize> From<[&str; N]> for Terms {
    fn from(terms: [&str; N]) -> Self {
        Terms(terms.iter().map(|t| t.to_string()).collect())
    }
}

/// Deduplicated keywords, longest first. Longer keywords have to be wrapped
/// before their substrings get a chance to consume the shared characters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keywords {
    keywords: Vec<String>,
}

impl Keywords {
    pub fn normalize(terms: &Terms, separate_words: bool) -> Self {
        let tokens: Vec<&str> = if separate_words {
            terms.0.iter().flat_map(|term| term.split(' ')).collect()
        } else {
            terms.0.iter().map(String::as_str).collect()
        };

        let mut seen = HashSet::new();
        let mut keywords: Vec<String> = tokens
            .into_iter()
            .filter(|token| !token.trim().is_empty())
            .filter(|token| seen.insert(*token))
            .map(str::to_string)
            .collect();
        // stable, so equal lengths keep their input order
        keywords.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));

        Self { keywords }
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.keywords
    }
}
