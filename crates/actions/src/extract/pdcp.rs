//! PDCP-layer extraction
//!
//! PDCP cipher-data records carry a list of PDU descriptors under a
//! `PDCPUL CIPH DATA` / `PDCPDL CIPH DATA` key:
//!
//! ```text
//! <pair key="PDCPUL CIPH DATA" type="list">
//!     <list>
//!         <item type="dict">
//!             <dict>
//!                 <pair key="Bearer ID">3</pair>
//!                 <pair key="PDU Size">1412</pair>
//!             </dict>
//!         </item>
//!     </list>
//! </pair>
//! ```
//!
//! `pdcp_cipher_data_pdu` prints each PDU's size and bearer.
//! `action_pdcp_cipher_data_pdu` prints nothing per PDU: it maintains the
//! last-data-PDU stamp and reports the first data PDU after a connection
//! disruption. Only full-size PDUs (1412 bytes) count as data, since the
//! captures are taken with the TCP link saturated.

use dmsift_pipeline::{EngineError, SubmitHandle};
use dmsift_record::{
    child_elements, element_text, has_attr, subtrees_with_attr, Element, Job, Packet,
};
use tracing::warn;

use crate::context::{ExecContext, PdcpDirection};

const UPLINK_TYPE: &str = "LTE_PDCP_UL_Cipher_Data_PDU";
const DOWNLINK_TYPE: &str = "LTE_PDCP_DL_Cipher_Data_PDU";

fn list_key(direction: PdcpDirection) -> &'static str {
    match direction {
        PdcpDirection::Uplink => "PDCPUL CIPH DATA",
        _ => "PDCPDL CIPH DATA",
    }
}

/// `(PDU Size, Bearer ID)` pairs under the given list key, with warnings
/// for descriptors missing either field.
fn collect_pdus(
    root: &Element,
    key: &str,
    timestamp: &str,
    warnings: &mut Vec<String>,
) -> Vec<(String, String)> {
    let mut pdus = Vec::new();
    for list in subtrees_with_attr(root, "key", key) {
        for item in subtrees_with_attr(list, "type", "dict") {
            let Some(dict) = item.get_child("dict") else {
                continue;
            };
            let mut size = String::new();
            let mut bearer = String::new();
            for field in child_elements(dict) {
                if has_attr(field, "key", "Bearer ID") {
                    bearer = element_text(field);
                } else if has_attr(field, "key", "PDU Size") {
                    size = element_text(field);
                }
            }
            if size.is_empty() {
                warnings.push(format!(
                    "packet timestamp = {timestamp}: found a {key} descriptor with no PDU size, skipping"
                ));
                continue;
            }
            if bearer.is_empty() {
                warnings.push(format!(
                    "packet timestamp = {timestamp}: found a {key} descriptor with no bearer id, skipping"
                ));
                continue;
            }
            pdus.push((size, bearer));
        }
    }
    pdus
}

/// `pdcp_cipher_data_pdu`: print size and bearer of every PDU.
pub(crate) fn cipher_data_pdu(
    packet: Packet,
    _job: Job,
    submit: SubmitHandle<ExecContext>,
) -> Result<(), EngineError> {
    let timestamp = packet.timestamp_display();
    let mut warnings = Vec::new();
    let uplink = collect_pdus(packet.root(), list_key(PdcpDirection::Uplink), &timestamp, &mut warnings);
    let downlink = collect_pdus(
        packet.root(),
        list_key(PdcpDirection::Downlink),
        &timestamp,
        &mut warnings,
    );

    submit.submit(move |ctx| {
        for w in &warnings {
            warn!("{w}");
        }
        for (size, bearer) in &uplink {
            ctx.write_line(&format!(
                "{timestamp} $ {UPLINK_TYPE} $ PDU Size: {size}, Bearer ID: {bearer}"
            ))?;
        }
        for (size, bearer) in &downlink {
            ctx.write_line(&format!(
                "{timestamp} $ {DOWNLINK_TYPE} $ PDU Size: {size}, Bearer ID: {bearer}"
            ))?;
        }
        Ok(())
    });
    Ok(())
}

/// `action_pdcp_cipher_data_pdu`: track the last full-size data PDU and
/// report the first one after each disruption.
pub(crate) fn update_data_stamp(
    packet: Packet,
    _job: Job,
    submit: SubmitHandle<ExecContext>,
) -> Result<(), EngineError> {
    let timestamp = packet.timestamp_display();
    let direction = match packet.type_id().as_str() {
        UPLINK_TYPE => PdcpDirection::Uplink,
        DOWNLINK_TYPE => PdcpDirection::Downlink,
        other => {
            return Err(EngineError::bug(format!(
                "PDCP stamp extractor invoked on a record of type {other:?}"
            )))
        }
    };

    // Only full-size PDUs count as data traffic.
    let data_pdu_present = subtrees_with_attr(packet.root(), "key", list_key(direction))
        .iter()
        .any(|list| {
            subtrees_with_attr(list, "key", "PDU Size")
                .iter()
                .any(|size| element_text(size) == "1412")
        });

    if !data_pdu_present {
        submit.submit(|_ctx| Ok(()));
        return Ok(());
    }

    submit.submit(move |ctx| {
        for kind in ctx.disruptions.drain() {
            ctx.write_line(&format!(
                "{timestamp} $ FirstPDCPPacketAfterDisruption $ Disruption Type: {}, Direction: {}",
                kind.label(),
                direction.as_str()
            ))?;
        }
        ctx.pdcp_timestamp = timestamp;
        ctx.pdcp_direction = direction;
        Ok(())
    });
    Ok(())
}
