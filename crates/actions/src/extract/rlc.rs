//! RLC-layer extraction: acknowledged-mode PDU dumps and radio-bearer
//! configuration changes

use dmsift_pipeline::{EngineError, SubmitHandle};
use dmsift_record::{
    child_elements, disjoint_subtrees_with_attr, element_text, Job, Packet,
};

use crate::context::ExecContext;

/// Which direction of a paired extractor is running.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Link {
    Downlink,
    Uplink,
}

/// `rlc_dl_am_all_pdu` / `rlc_ul_am_all_pdu`: one line per PDU with every
/// field of its descriptor. Control-NACK fields are flattened to their
/// sequence numbers; data length indicators are elided.
pub(crate) fn am_all_pdu(
    packet: Packet,
    _job: Job,
    submit: SubmitHandle<ExecContext>,
    link: Link,
) -> Result<(), EngineError> {
    let (list_key, tag) = match link {
        Link::Downlink => ("RLCDL PDUs", "LTE_RLC_DL_AM_All_PDU"),
        Link::Uplink => ("RLCUL PDUs", "LTE_RLC_UL_AM_All_PDU"),
    };

    let timestamp = packet.timestamp_display();
    let mut block = String::new();

    for pdu_list in disjoint_subtrees_with_attr(packet.root(), "key", list_key) {
        for pdu in disjoint_subtrees_with_attr(pdu_list, "type", "dict") {
            let Some(dict) = pdu.get_child("dict") else {
                continue;
            };
            let fields = child_elements(dict)
                .filter_map(|field| {
                    let key = field.attributes.get("key")?;
                    let value = match key.as_str() {
                        "RLC CTRL NACK" => disjoint_subtrees_with_attr(field, "key", "NACK_SN")
                            .iter()
                            .map(|sn| element_text(sn))
                            .collect::<Vec<_>>()
                            .join("/"),
                        "RLC DATA LI" => "OMITTED".to_string(),
                        _ => element_text(field),
                    };
                    Some(format!("{key}: {value}"))
                })
                .collect::<Vec<_>>()
                .join(", ");
            block.push_str(&format!("{timestamp} $ {tag} $ {fields}\n"));
        }
    }

    submit.submit(move |ctx| ctx.write_block(&block));
    Ok(())
}

/// `rlc_dl_config_log` / `rlc_ul_config_log`: one line per radio bearer in
/// each configuration category, stamped with the configuration reason.
///
/// A record without a `Reason` field is a hard input error.
pub(crate) fn config_log(
    packet: Packet,
    job: Job,
    submit: SubmitHandle<ExecContext>,
    link: Link,
) -> Result<(), EngineError> {
    const CATEGORIES: [&str; 3] = ["Added/Modified RBs", "Released RBs", "Active RBs"];

    let tag = match link {
        Link::Downlink => "LTE_RLC_DL_Config_Log_Packet",
        Link::Uplink => "LTE_RLC_UL_Config_Log_Packet",
    };

    let timestamp = packet.timestamp_display();
    let reasons = disjoint_subtrees_with_attr(packet.root(), "key", "Reason");
    if reasons.len() != 1 {
        return Err(EngineError::input(format!(
            "{tag} record at {} has no single \"Reason\" field",
            job.span()
        )));
    }
    let reason = element_text(reasons[0]);

    let mut block = String::new();
    for category in CATEGORIES {
        for rb_list in disjoint_subtrees_with_attr(packet.root(), "key", category) {
            for rb in disjoint_subtrees_with_attr(rb_list, "type", "dict") {
                let Some(dict) = rb.get_child("dict") else {
                    continue;
                };
                block.push_str(&format!(
                    "{timestamp} $ {tag} $ Reason: {reason}, Category: {category}"
                ));
                for field in child_elements(dict) {
                    if let Some(key) = field.attributes.get("key") {
                        block.push_str(&format!(", {key}: {}", element_text(field)));
                    }
                }
                block.push('\n');
            }
        }
    }

    submit.submit(move |ctx| ctx.write_block(&block));
    Ok(())
}
