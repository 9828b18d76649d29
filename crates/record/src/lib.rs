//! Dmsift - Record
//!
//! Data model for baseband diagnostic log records.
//!
//! # Overview
//!
//! A diagnostic log file is a concatenation of sibling top-level
//! `<dm_log_packet> … </dm_log_packet>` elements. This crate owns the
//! vocabulary the rest of the workspace speaks:
//!
//! - [`Job`] - one record string plus its sequence number and source span
//! - [`Packet`] - the parsed tree of one record, with field accessors
//! - [`PacketTime`] - the packet timestamp converted to unix time (UTC+8)
//!
//! Tree-walking helpers ([`subtrees_with_attr`], [`disjoint_subtrees_with_attr`],
//! [`has_subtree_with_attr`]) are free functions because extraction code
//! searches arbitrary subtrees, not just the packet root.
//!
//! The crate is deliberately free of any concurrency concern - jobs and
//! packets are plain owned values that move through the pipeline.

mod error;
mod job;
mod packet;
mod timestamp;

pub use error::RecordError;
pub use job::Job;
pub use packet::{
    child_elements, disjoint_subtrees_with_attr, element_text, has_attr,
    has_subtree_with_attr, subtrees_with_attr, Packet,
};
pub use timestamp::{PacketTime, TIMEZONE_OFFSET_SECS};

// Re-exported so downstream crates name the tree type without a direct
// dependency on the XML crate.
pub use xmltree::Element;
