//! Markup documents on disk, including local `iframe` sources
use crate::dom::{Document, NodeId};
use crate::error::{MarkError, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Nesting bound for frames loaded from disk, so self-embedding pages end.
const MAX_FRAME_DEPTH: usize = 8;

/// A sub-document that was attached from a local file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameFile {
    pub iframe: NodeId,
    pub path: PathBuf,
}

pub fn read_document(path: &Path) -> Result<Document> {
    let markup = fs::read_to_string(path)?;
    Document::parse(&markup)
}

pub fn write_document(doc: &Document, path: &Path) -> Result<()> {
    fs::write(path, doc.to_markup())?;
    Ok(())
}

fn is_remote(src: &str) -> bool {
    let src = src.trim_start();
    src.starts_with("http://") || src.starts_with("https://") || src.starts_with("//")
}

/// Resolves every `iframe src` of `doc` against `base`. Local files are
/// parsed, attached and signalled ready; remote or unreadable sources are
/// signalled failed so a pass skips them.
pub fn load_local_frames(doc: &mut Document, base: &Path) -> Vec<FrameFile> {
    let mut loaded = Vec::new();
    load_frames_below(doc, doc.root(), base, 0, &mut loaded);
    loaded
}

fn load_frames_below(
    doc: &mut Document,
    context: NodeId,
    base: &Path,
    depth: usize,
    loaded: &mut Vec<FrameFile>,
) {
    let iframes: Vec<NodeId> = doc
        .descendants(context)
        .into_iter()
        .filter(|node| doc.frame(*node).is_some())
        .collect();

    for iframe in iframes {
        let Some(handle) = doc.frame_handle(iframe) else {
            continue;
        };
        let src = doc.attr(iframe, "src").unwrap_or_default().trim().to_string();

        if src.is_empty() || is_remote(&src) || depth >= MAX_FRAME_DEPTH {
            debug!("Not loading frame source {src:?}");
            handle.set_failed();
            continue;
        }

        let path = base.join(&src);
        match read_document(&path).and_then(|sub| doc.attach_frame(iframe, sub)) {
            Ok(_) => {
                let sub_base = path.parent().map(Path::to_path_buf).unwrap_or_default();
                loaded.push(FrameFile {
                    iframe,
                    path: path.clone(),
                });
                if let Some(content) = doc.frame(iframe).and_then(|f| f.content()) {
                    load_frames_below(doc, content, &sub_base, depth + 1, loaded);
                }
                handle.set_ready();
            }
            Err(err) => {
                warn!("Could not load frame {}: {err}", path.display());
                handle.set_failed();
            }
        }
    }
}

/// Writes the current content of every loaded frame back to its file.
pub fn write_frames(doc: &Document, frames: &[FrameFile]) -> Result<()> {
    for frame in frames {
        let content = doc
            .frame(frame.iframe)
            .and_then(|f| f.content())
            .ok_or(MarkError::NotFrame(frame.iframe))?;
        fs::write(&frame.path, doc.markup_of(content))?;
    }
    Ok(())
}
