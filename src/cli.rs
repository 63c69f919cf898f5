use crate::options::{Accuracy, AccuracyMode, MarkOptions};
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::fmt;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Highlight search terms inside XML/XHTML documents", long_about = None)]
pub struct Cli {
    #[clap(long, global = true, value_parser, default_value_t = false)]
    pub verbose: bool,

    #[clap(long, global = true, value_parser)]
    pub log: Option<PathBuf>,

    #[clap(long, global = true, value_parser)]
    pub config: Option<PathBuf>,

    /// Print prometheus counters to stderr when done
    #[clap(long, global = true, value_parser, default_value_t = false)]
    pub metrics: bool,

    /// Emit the summary as JSON
    #[clap(long, global = true, value_parser, default_value_t = false)]
    pub json: bool,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Wrap every occurrence of the given terms in marker elements
    Mark {
        path: PathBuf,

        #[clap(required = true)]
        terms: Vec<String>,

        #[clap(flatten)]
        marker: MarkerArgs,

        #[clap(flatten)]
        search: SearchArgs,

        #[clap(long, value_parser)]
        accuracy: Option<AccuracyArg>,

        /// Boundary characters for exactly/complementary, e.g. ".,-"
        #[clap(long, value_parser)]
        limiters: Option<String>,

        /// Do not split terms on spaces
        #[clap(long, value_parser, default_value_t = false)]
        whole_terms: bool,

        #[clap(long, value_parser, default_value_t = false)]
        no_diacritics: bool,

        /// Synonym pair, e.g. `--synonym say=talk`
        #[clap(long = "synonym", value_parser = parse_synonym)]
        synonyms: Vec<(String, String)>,

        #[clap(flatten)]
        output: OutputArgs,
    },
    /// Wrap every match of a regular expression
    Regex {
        path: PathBuf,

        pattern: String,

        #[clap(flatten)]
        marker: MarkerArgs,

        #[clap(flatten)]
        search: SearchArgs,

        #[clap(flatten)]
        output: OutputArgs,
    },
    /// Remove markers inserted by earlier runs
    Unmark {
        path: PathBuf,

        #[clap(flatten)]
        marker: MarkerArgs,

        #[clap(flatten)]
        output: OutputArgs,
    },
    Completions {
        #[clap(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct MarkerArgs {
    /// Marker element name (default: mark)
    #[clap(long, value_parser)]
    pub element: Option<String>,

    #[clap(long = "class", value_parser)]
    pub class_name: Option<String>,

    /// Extra exclusion selectors
    #[clap(long, value_parser, use_value_delimiter = true)]
    pub exclude: Vec<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SearchArgs {
    #[clap(long, value_parser, default_value_t = false)]
    pub across_elements: bool,

    #[clap(long, value_parser, default_value_t = false)]
    pub case_sensitive: bool,

    /// Load local iframe sources and search them too
    #[clap(long, value_parser, default_value_t = false)]
    pub frames: bool,

    #[clap(long, value_parser)]
    pub frame_timeout_ms: Option<u64>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    #[clap(short, long, value_parser, conflicts_with = "in_place")]
    pub output: Option<PathBuf>,

    /// Rewrite input files (required for directories)
    #[clap(long, value_parser, default_value_t = false)]
    pub in_place: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AccuracyArg {
    #[default]
    Partially,
    Exactly,
    Complementary,
}

impl From<AccuracyArg> for AccuracyMode {
    fn from(arg: AccuracyArg) -> Self {
        match arg {
            AccuracyArg::Partially => AccuracyMode::Partially,
            AccuracyArg::Exactly => AccuracyMode::Exactly,
            AccuracyArg::Complementary => AccuracyMode::Complementary,
        }
    }
}

impl fmt::Display for AccuracyArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", AccuracyMode::from(*self))
    }
}

fn parse_synonym(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((term, synonym)) if !term.trim().is_empty() && !synonym.trim().is_empty() => {
            Ok((term.trim().to_string(), synonym.trim().to_string()))
        }
        _ => Err(format!("expected TERM=SYNONYM, got '{value}'")),
    }
}

impl MarkerArgs {
    pub fn apply(&self, options: &mut MarkOptions) {
        if let Some(element) = &self.element {
            options.element = element.clone();
        }
        if let Some(class_name) = &self.class_name {
            options.class_name = class_name.clone();
        }
        options.exclude.extend(self.exclude.iter().cloned());
    }
}

impl SearchArgs {
    pub fn apply(&self, options: &mut MarkOptions) {
        options.across_elements |= self.across_elements;
        options.case_sensitive |= self.case_sensitive;
        options.iframes |= self.frames;
        if self.frame_timeout_ms.is_some() {
            options.frame_timeout_ms = self.frame_timeout_ms;
        }
    }
}

/// Overrides for the keyword-only flags of `mark`.
pub fn apply_keyword_flags(
    options: &mut MarkOptions,
    accuracy: Option<AccuracyArg>,
    limiters: Option<&str>,
    whole_terms: bool,
    no_diacritics: bool,
    synonyms: &[(String, String)],
) {
    let mode = accuracy
        .map(AccuracyMode::from)
        .unwrap_or_else(|| options.accuracy.mode());
    options.accuracy = match limiters {
        Some(limiters) => Accuracy::Limited {
            value: mode,
            limiters: limiters.chars().map(String::from).collect(),
        },
        None if accuracy.is_some() => Accuracy::Mode(mode),
        None => options.accuracy.clone(),
    };
    if whole_terms {
        options.separate_word_search = false;
    }
    if no_diacritics {
        options.diacritics = false;
    }
    for (term, synonym) in synonyms {
        options.synonyms.insert(term.clone(), synonym.clone());
    }
}
