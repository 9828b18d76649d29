//! Dmsift - Actions
//!
//! Everything the engine runs *per record*: the mode registry that builds
//! an action pipeline, the extractor catalog, and the executor-side
//! context those actions mutate.
//!
//! # Modes
//!
//! | Mode | Behavior |
//! |------|----------|
//! | extract | Pluck fields from selected packet types, one line per finding |
//! | range | Echo records whose timestamp falls in configured unix ranges |
//! | dedup | Echo records whose timestamp is not older than the newest seen |
//! | reorder | Re-sort records by timestamp within a sliding tolerance window |
//! | type-filter | Echo records whose type_id fully matches a regex |
//!
//! # Ordering and state
//!
//! Actions do their tree walking on the worker that parsed the record, then
//! defer all output and all cross-record state changes into the one task
//! they submit. Those tasks run on the executor thread in input order, so
//! the mutable state in [`ExecContext`] - the output sink, the last-seen
//! PDCP stamp, the disruption set, the dedup high-water mark, the reorder
//! window - needs no locking and behaves exactly as a sequential run.
//!
//! Per-record problems (an unparseable timestamp, a missing field) are soft:
//! they become `tracing` warnings emitted from inside the deferred task, so
//! even diagnostics appear in input order.

mod catalog;
mod context;
mod dedup;
mod extract;
mod range;
mod registry;
mod reorder;
mod type_filter;

pub use catalog::ExtractorKind;
pub use context::{DisruptionKind, ExecContext, PdcpDirection};
pub use range::parse_time_ranges;
pub use registry::{build_pipeline, Mode};
pub use reorder::ReorderWindow;
