//! NAS-layer extraction
//!
//! Tracking-area-update outcomes are read from the decoded message type
//! fields, e.g.
//!
//! ```text
//! <field name="nas_eps.nas_msg_emm_type"
//!        showname="NAS EPS Mobility Management Message Type:
//!                  Tracking area update accept (0x49)" />
//! ```
//!
//! Records carrying none of the sought message types emit nothing.

use dmsift_pipeline::{EngineError, SubmitHandle};
use dmsift_record::{subtrees_with_attr, Job, Packet};

use crate::context::ExecContext;

fn emm_type_shownames(packet: &Packet) -> Vec<String> {
    subtrees_with_attr(packet.root(), "name", "nas_eps.nas_msg_emm_type")
        .iter()
        .filter_map(|el| el.attributes.get("showname").cloned())
        .collect()
}

fn flag(value: bool) -> u8 {
    u8::from(value)
}

/// `nas_emm_ota_incoming`: tracking-area-update accept / reject.
pub(crate) fn emm_ota_incoming(
    packet: Packet,
    _job: Job,
    submit: SubmitHandle<ExecContext>,
) -> Result<(), EngineError> {
    let timestamp = packet.timestamp_display();
    let mut accept = false;
    let mut reject = false;
    for showname in emm_type_shownames(&packet) {
        if showname.contains("Tracking area update accept") {
            accept = true;
            break;
        }
        if showname.contains("Tracking area update reject") {
            reject = true;
            break;
        }
    }

    if !accept && !reject {
        submit.submit(|_ctx| Ok(()));
        return Ok(());
    }

    let line = format!(
        "{timestamp} $ LTE_NAS_EMM_OTA_Incoming_Packet $ Tracking area update accept: {}, \
         Tracking area update reject: {}",
        flag(accept),
        flag(reject)
    );
    submit.submit(move |ctx| ctx.write_line(&line));
    Ok(())
}

/// `nas_emm_ota_outgoing`: tracking-area-update request.
pub(crate) fn emm_ota_outgoing(
    packet: Packet,
    _job: Job,
    submit: SubmitHandle<ExecContext>,
) -> Result<(), EngineError> {
    let timestamp = packet.timestamp_display();
    let request = emm_type_shownames(&packet)
        .iter()
        .any(|s| s.contains("Tracking area update request"));

    if !request {
        submit.submit(|_ctx| Ok(()));
        return Ok(());
    }

    let line = format!(
        "{timestamp} $ LTE_NAS_EMM_OTA_Outgoing_Packet $ Tracking area update request: 1"
    );
    submit.submit(move |ctx| ctx.write_line(&line));
    Ok(())
}
