//! Record error types

use thiserror::Error;

/// Errors raised while turning a record string into a [`Packet`](crate::Packet)
#[derive(Debug, Error)]
pub enum RecordError {
    /// The record is not well-formed XML
    #[error("invalid XML: {0}")]
    Xml(#[from] xmltree::ParseError),

    /// The record parsed, but its top-level element is not a log packet
    #[error("unexpected top-level element <{0}>, expected <dm_log_packet>")]
    UnexpectedRoot(String),
}
