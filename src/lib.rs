//! Find search terms in the visible text of a document tree and wrap each
//! occurrence in a marker element, or remove such markers again.
//!
//! ```no_run
//! use treemark::{Document, Mark, MarkOptions};
//!
//! # async fn demo() -> treemark::Result<()> {
//! let mut doc = Document::parse("<p>Hello world</p>")?;
//! let mark = Mark::new(doc.root());
//! let total = mark.mark(&mut doc, "world", &MarkOptions::default(), &mut ()).await;
//! assert_eq!(total, 1);
//! # Ok(())
//! # }
//! ```
pub mod app;
pub mod cli;
pub mod config;
pub mod dom;
pub mod error;
pub mod files;
pub mod keywords;
pub mod mark;
pub mod metrics;
pub mod options;
pub mod pattern;
pub mod search;
pub mod traversal;
pub mod unmark;
pub mod walker;

pub use crate::dom::{Document, FrameHandle, FrameState, NodeId, Selector, SelectorScope};
pub use crate::error::{MarkError, Result};
pub use crate::keywords::{Keywords, Terms};
pub use crate::mark::{Callbacks, Context, Mark, MarkHandler};
pub use crate::options::{Accuracy, AccuracyMode, MarkOptions};
pub use crate::pattern::{Pattern, PatternBuilder};
pub use crate::search::PatternCache;
