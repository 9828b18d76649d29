//! Field extraction routines, one module per protocol layer
//!
//! Each routine follows the same two-phase shape: walk the owned tree on
//! the worker thread and collect everything worth printing into owned
//! strings, then submit one deferred task that writes those strings (and
//! touches cross-record state) on the executor thread. Nothing borrowed
//! from the tree crosses into the task.

pub(crate) mod mac;
pub(crate) mod nas;
pub(crate) mod pdcp;
pub(crate) mod phy;
pub(crate) mod rlc;
pub(crate) mod rrc;

use dmsift_pipeline::{EngineError, SubmitHandle};
use dmsift_record::{Job, Packet};

use crate::context::ExecContext;

/// `all_packet_type`: one `TS $ type` line per record.
pub(crate) fn packet_type(
    packet: Packet,
    _job: Job,
    submit: SubmitHandle<ExecContext>,
) -> Result<(), EngineError> {
    let timestamp = packet.timestamp_display();
    let type_id = packet.type_id();
    submit.submit(move |ctx| ctx.write_line(&format!("{timestamp} $ {type_id}")));
    Ok(())
}

/// Render the warning for a search that found an unexpected number of
/// nodes where exactly one was expected.
pub(crate) fn unexpected_count_warning(
    timestamp: &str,
    what: &str,
    found: usize,
    job: &Job,
) -> String {
    format!(
        "packet at {} (timestamp = {timestamp}): found {found} {what} nodes, expected exactly 1",
        job.span()
    )
}
