//! PHY-layer extraction: PDSCH allocations, decode statistics, and
//! serving-cell measurements

use dmsift_pipeline::{EngineError, SubmitHandle};
use dmsift_record::{
    child_elements, disjoint_subtrees_with_attr, element_text, subtrees_with_attr, Element, Job,
    Packet,
};

use crate::context::ExecContext;

/// `phy_pdsch`: the fixed set of top-level allocation fields, in record
/// order.
pub(crate) fn pdsch(
    packet: Packet,
    _job: Job,
    submit: SubmitHandle<ExecContext>,
) -> Result<(), EngineError> {
    const TARGET_KEYS: [&str; 8] = [
        "System Frame Number",
        "Subframe Number",
        "Number of Tx Antennas(M)",
        "Number of Rx Antennas(N)",
        "TBS 0",
        "MCS 0",
        "TBS 1",
        "MCS 1",
    ];

    let timestamp = packet.timestamp_display();
    let fields = packet
        .pairs()
        .filter(|(key, _)| TARGET_KEYS.contains(key))
        .map(|(key, el)| format!("{key}: {}", element_text(el)))
        .collect::<Vec<_>>()
        .join(", ");

    submit.submit(move |ctx| {
        ctx.write_line(&format!("{timestamp} $ LTE_PHY_PDSCH_Packet $ {fields}"))
    });
    Ok(())
}

/// All `key: value` renderings of the dict entries directly under `el`.
fn dict_fields(el: &Element) -> Vec<String> {
    let Some(dict) = el.get_child("dict") else {
        return Vec::new();
    };
    child_elements(dict)
        .filter_map(|field| {
            field
                .attributes
                .get("key")
                .map(|key| format!("{key}: {}", element_text(field)))
        })
        .collect()
}

/// `phy_pdsch_stat`: one line per transport block, carrying the enclosing
/// record's fields plus the block's own.
pub(crate) fn pdsch_stat(
    packet: Packet,
    _job: Job,
    submit: SubmitHandle<ExecContext>,
) -> Result<(), EngineError> {
    let timestamp = packet.timestamp_display();
    let mut block = String::new();

    for record_list in disjoint_subtrees_with_attr(packet.root(), "key", "Records") {
        for record in disjoint_subtrees_with_attr(record_list, "type", "dict") {
            let Some(dict) = record.get_child("dict") else {
                continue;
            };
            let mut record_fields: Vec<String> = Vec::new();
            let mut transport_blocks: Vec<String> = Vec::new();
            for entry in child_elements(dict) {
                let Some(key) = entry.attributes.get("key") else {
                    continue;
                };
                if key == "Transport Blocks" {
                    transport_blocks = disjoint_subtrees_with_attr(entry, "type", "dict")
                        .iter()
                        .map(|tb| dict_fields(tb).join(", "))
                        .collect();
                } else {
                    record_fields.push(format!("{key}: {}", element_text(entry)));
                }
            }
            let prefix = record_fields.join(", ");
            for tb in &transport_blocks {
                block.push_str(&timestamp);
                block.push_str(" $ LTE_PHY_PDSCH_Stat_Indication $ ");
                block.push_str(&prefix);
                if !prefix.is_empty() {
                    block.push_str(", ");
                }
                block.push_str(tb);
                block.push('\n');
            }
        }
    }

    submit.submit(move |ctx| ctx.write_block(&block));
    Ok(())
}

/// `phy_serv_cell_meas`: RSRP of the primary serving cell's subpackets.
pub(crate) fn serv_cell_meas(
    packet: Packet,
    _job: Job,
    submit: SubmitHandle<ExecContext>,
) -> Result<(), EngineError> {
    let timestamp = packet.timestamp_display();
    let mut block = String::new();

    for subpackets in subtrees_with_attr(packet.root(), "key", "Subpackets") {
        let Some(list) = subpackets.get_child("list") else {
            continue;
        };
        for item in child_elements(list) {
            let Some(dict) = item.get_child("dict") else {
                continue;
            };
            let mut primary = None;
            let mut rsrp = String::new();
            for pair in child_elements(dict) {
                match pair.attributes.get("key").map(String::as_str) {
                    Some("Serving Cell Index") => {
                        primary = Some(element_text(pair) == "PCell");
                    }
                    Some("RSRP") => rsrp = element_text(pair),
                    _ => {}
                }
                if primary.is_some() && !rsrp.is_empty() {
                    break;
                }
            }
            if primary == Some(true) && !rsrp.is_empty() {
                block.push_str(&format!(
                    "{timestamp} $ LTE_PHY_Serv_Cell_Measurement $ RSRP: {rsrp}\n"
                ));
            }
        }
    }

    submit.submit(move |ctx| ctx.write_block(&block));
    Ok(())
}
