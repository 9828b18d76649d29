//! MAC-layer extraction: random-access attempts and triggers

use dmsift_pipeline::{EngineError, SubmitHandle};
use dmsift_record::{element_text, subtrees_with_attr, Job, Packet};

use crate::context::ExecContext;

fn joined_values(packet: &Packet, key: &str, prefix: &str) -> String {
    subtrees_with_attr(packet.root(), "key", key)
        .iter()
        .map(|el| format!("{prefix}{}", element_text(el)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `mac_rach_attempt`: random-access results.
pub(crate) fn rach_attempt(
    packet: Packet,
    _job: Job,
    submit: SubmitHandle<ExecContext>,
) -> Result<(), EngineError> {
    let timestamp = packet.timestamp_display();
    let results = joined_values(&packet, "Rach result", "Result: ");
    submit.submit(move |ctx| {
        ctx.write_line(&format!("{timestamp} $ LTE_MAC_Rach_Attempt $ {results}"))
    });
    Ok(())
}

/// `mac_rach_trigger`: random-access trigger reasons, stamped with the last
/// PDCP data timestamp to relate the trigger to data-plane activity.
pub(crate) fn rach_trigger(
    packet: Packet,
    _job: Job,
    submit: SubmitHandle<ExecContext>,
) -> Result<(), EngineError> {
    let timestamp = packet.timestamp_display();
    let reasons = joined_values(&packet, "Rach reason", "Reason: ");
    submit.submit(move |ctx| {
        ctx.write_line(&format!(
            "{timestamp} $ LTE_MAC_Rach_Trigger $ {reasons}, LastPDCPPacketTimestamp: {}",
            ctx.pdcp_timestamp
        ))
    });
    Ok(())
}
