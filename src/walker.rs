use ignore::{DirEntry, WalkBuilder};
use std::path::Path;

pub const MARKUP_EXTENSIONS: [&str; 4] = ["html", "htm", "xhtml", "xml"];

pub fn is_markup_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| MARKUP_EXTENSIONS.iter().any(|m| m.eq_ignore_ascii_case(ext)))
}

pub fn walk_dir(path: &Path, recursive: bool, show_hidden: bool) -> impl Iterator<Item = DirEntry> {
    let max_depth = if recursive { None } else { Some(1) };
    WalkBuilder::new(path)
        .hidden(!show_hidden)
        .git_global(!show_hidden)
        .git_ignore(!show_hidden)
        .git_exclude(!show_hidden)
        .ignore(!show_hidden)
        .max_depth(max_depth)
        .build()
        .filter_map(Result::ok)
}

/// Markup files below `path`, honouring ignore files, in a stable order.
pub fn markup_files(path: &Path, recursive: bool) -> Vec<std::path::PathBuf> {
    let mut files: Vec<_> = walk_dir(path, recursive, false)
        .filter(|entry| entry.path().is_file() && is_markup_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}
