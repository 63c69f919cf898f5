use crate::dom::NodeId;
use std::io;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarkError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Markup error: {0}")]
    Markup(#[from] quick_xml::Error),

    #[error("Markup attribute error: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("Unbalanced markup: {0}")]
    UnbalancedMarkup(String),

    #[error("Invalid selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },

    #[error("Offset {offset} is not a valid split point in a text of {len} bytes")]
    InvalidOffset { offset: usize, len: usize },

    #[error("Node {0:?} is not a text node")]
    NotText(NodeId),

    #[error("Node {0:?} is not an iframe")]
    NotFrame(NodeId),

    #[error("Node {0:?} is not attached to a parent")]
    Detached(NodeId),

    #[error("iframe \"{0}\" could not be accessed")]
    FrameInaccessible(String),

    #[error("iframe did not become ready within {0:?}")]
    FrameTimeout(Duration),

    #[error("iframe readiness signal was dropped")]
    FrameClosed,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("An unexpected error occurred: {0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, MarkError>;
