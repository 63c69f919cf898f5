//! Command execution for the `treemark` binary
use crate::cli::{apply_keyword_flags, Cli, Commands, OutputArgs};
use crate::config::Config;
use crate::dom::{Document, NodeId};
use crate::error::{MarkError, Result};
use crate::files::{load_local_frames, read_document, write_document, write_frames, FrameFile};
use crate::keywords::Keywords;
use crate::mark::{Mark, MarkHandler};
use crate::metrics::Metrics;
use crate::options::MarkOptions;
use crate::search::PatternCache;
use crate::walker::markup_files;
use clap::CommandFactory;
use colored::Colorize;
use log::{debug, info, warn};
use regex::RegexBuilder;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Outcome for one processed file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub markers: usize,
    pub unmatched: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary {
    pub command: String,
    pub files: Vec<FileReport>,
    pub total_markers: usize,
    pub elapsed_ms: u128,
}

/// Feeds marking events into a [`FileReport`] and the counters.
struct Tally<'a> {
    metrics: &'a Metrics,
    report: &'a mut FileReport,
}

impl MarkHandler for Tally<'_> {
    fn each(&mut self, _doc: &Document, _marker: NodeId) {
        self.metrics.markers_created.inc();
    }

    fn no_match(&mut self, term: &str) {
        self.metrics.keywords_without_match.inc();
        self.report.unmatched.push(term.to_string());
    }

    fn done(&mut self, total: usize) {
        self.report.markers = total;
    }
}

enum Job<'a> {
    Keywords(&'a [String]),
    Regex(regex::Regex),
    Unmark,
}

pub struct TreemarkApp {
    config: Config,
    metrics: Metrics,
    cache: Arc<PatternCache>,
}

impl TreemarkApp {
    pub fn new(config: Config) -> Self {
        let cache = Arc::new(PatternCache::new(config.cache.pattern_cache_size));
        Self {
            config,
            metrics: Metrics::new(),
            cache,
        }
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub async fn run(&self, cli: &Cli) -> Result<()> {
        let start_time = Instant::now();
        let mut options = self.config.mark.clone();
        options.debug |= cli.verbose;

        let (name, path, output, job) = match &cli.command {
            Commands::Mark {
                path,
                terms,
                marker,
                search,
                accuracy,
                limiters,
                whole_terms,
                no_diacritics,
                synonyms,
                output,
            } => {
                marker.apply(&mut options);
                search.apply(&mut options);
                apply_keyword_flags(
                    &mut options,
                    *accuracy,
                    limiters.as_deref(),
                    *whole_terms,
                    *no_diacritics,
                    synonyms,
                );
                ("mark", path, output, Job::Keywords(terms))
            }
            Commands::Regex {
                path,
                pattern,
                marker,
                search,
                output,
            } => {
                marker.apply(&mut options);
                search.apply(&mut options);
                let regex = RegexBuilder::new(pattern)
                    .case_insensitive(!options.case_sensitive)
                    .multi_line(true)
                    .build()?;
                ("regex", path, output, Job::Regex(regex))
            }
            Commands::Unmark {
                path,
                marker,
                output,
            } => {
                marker.apply(&mut options);
                ("unmark", path, output, Job::Unmark)
            }
            Commands::Completions { shell } => {
                let mut cmd = Cli::command();
                clap_complete::generate(*shell, &mut cmd, "treemark", &mut std::io::stdout());
                return Ok(());
            }
        };

        let mut summary = Summary {
            command: name.to_string(),
            ..Summary::default()
        };
        for file in targets(path, output)? {
            let report = self.process(&file, &job, &options, output).await;
            summary.total_markers += report.markers;
            summary.files.push(report);
        }
        summary.elapsed_ms = start_time.elapsed().as_millis();

        info!(
            "{} finished: {} file(s), {} marker(s) in {:.2?}",
            name,
            summary.files.len(),
            summary.total_markers,
            start_time.elapsed()
        );
        self.print_summary(&summary, cli.json)?;
        if cli.metrics {
            eprint!("{}", self.metrics.gather());
        }

        match summary.files.iter().find_map(|f| f.error.as_ref()) {
            Some(err) if summary.files.len() == 1 => Err(MarkError::Other(err.clone())),
            _ => Ok(()),
        }
    }

    async fn process(
        &self,
        file: &Path,
        job: &Job<'_>,
        options: &MarkOptions,
        output: &OutputArgs,
    ) -> FileReport {
        let mut report = FileReport {
            path: file.to_path_buf(),
            ..FileReport::default()
        };
        if let Err(err) = self.process_inner(file, job, options, output, &mut report).await {
            warn!("{}: {err}", file.display());
            report.error = Some(err.to_string());
        }
        report
    }

    async fn process_inner(
        &self,
        file: &Path,
        job: &Job<'_>,
        options: &MarkOptions,
        output: &OutputArgs,
        report: &mut FileReport,
    ) -> Result<()> {
        debug!("Processing {}", file.display());
        let mut doc = read_document(file)?;
        let frames: Vec<FrameFile> = if options.iframes {
            let base = file.parent().unwrap_or(Path::new("."));
            load_local_frames(&mut doc, base)
        } else {
            Vec::new()
        };

        let mark = Mark::new(doc.root()).with_cache(Arc::clone(&self.cache));
        match job {
            Job::Keywords(terms) => {
                let keywords = Keywords::normalize(&terms.to_vec().into(), options.separate_word_search);
                self.metrics.keywords_searched.inc_by(keywords.len() as u64);
                let mut tally = Tally {
                    metrics: &self.metrics,
                    report,
                };
                mark.mark(&mut doc, terms.to_vec(), options, &mut tally).await;
            }
            Job::Regex(regex) => {
                self.metrics.keywords_searched.inc();
                let mut tally = Tally {
                    metrics: &self.metrics,
                    report,
                };
                mark.mark_regex(&mut doc, regex, options, &mut tally).await;
            }
            Job::Unmark => {
                let removed = mark.unmark(&mut doc, options, || {});
                self.metrics.markers_removed.inc_by(removed as u64);
                report.markers = removed;
            }
        }

        emit(&doc, file, &frames, output)
    }

    fn print_summary(&self, summary: &Summary, json: bool) -> Result<()> {
        if json {
            let rendered = serde_json::to_string_pretty(summary)
                .map_err(|e| MarkError::Other(e.to_string()))?;
            eprintln!("{rendered}");
            return Ok(());
        }
        if !self.config.display.show_summary {
            return Ok(());
        }

        colored::control::set_override(self.config.display.color);
        let verb = if summary.command == "unmark" {
            "removed"
        } else {
            "created"
        };
        for file in &summary.files {
            match &file.error {
                Some(err) => eprintln!("{} {}", file.path.display().to_string().red(), err),
                None => {
                    eprintln!(
                        "{}: {} marker(s) {}",
                        file.path.display().to_string().cyan(),
                        file.markers,
                        verb
                    );
                    if !file.unmatched.is_empty() {
                        eprintln!("  {} {}", "no match:".yellow(), file.unmatched.join(", "));
                    }
                }
            }
        }
        eprint!(
            "{} {} marker(s) {} in {} file(s)",
            "Summary:".green().bold(),
            summary.total_markers,
            verb,
            summary.files.len()
        );
        if self.config.display.show_timing {
            eprint!(" ({} ms)", summary.elapsed_ms);
        }
        eprintln!();
        Ok(())
    }
}

/// Files a command works on. Directories are only accepted when results
/// go back into the files themselves.
fn targets(path: &Path, output: &OutputArgs) -> Result<Vec<PathBuf>> {
    if path.is_dir() {
        if !output.in_place {
            return Err(MarkError::Config(format!(
                "{} is a directory; use --in-place to rewrite its files",
                path.display()
            )));
        }
        return Ok(markup_files(path, true));
    }
    if !path.exists() {
        return Err(MarkError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )));
    }
    Ok(vec![path.to_path_buf()])
}

fn emit(doc: &Document, source: &Path, frames: &[FrameFile], output: &OutputArgs) -> Result<()> {
    if output.in_place {
        write_document(doc, source)?;
        write_frames(doc, frames)?;
    } else if let Some(target) = &output.output {
        write_document(doc, target)?;
    } else {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", doc.to_markup())?;
    }
    Ok(())
}

