//! End-to-end tests for the extractor catalog, including the cross-record
//! disruption bookkeeping that only works because tasks run in input order.

mod common;

use common::{record, run_mode, try_run_mode};
use dmsift_actions::Mode;

fn extract(names: &[&str]) -> Mode {
    Mode::Extract(names.iter().map(|s| s.to_string()).collect())
}

const TS1: &str = "2020-01-01 10:00:00.000000";
const TS2: &str = "2020-01-01 10:00:01.000000";
const TS3: &str = "2020-01-01 10:00:02.000000";

fn pdcp_ul_record(timestamp: &str, pdu_size: &str) -> String {
    format!(
        "<dm_log_packet>\
         <pair key=\"type_id\">LTE_PDCP_UL_Cipher_Data_PDU</pair>\
         <pair key=\"timestamp\">{timestamp}</pair>\
         <pair key=\"PDCPUL CIPH DATA\" type=\"list\"><list>\
         <item type=\"dict\"><dict>\
         <pair key=\"Bearer ID\">3</pair>\
         <pair key=\"PDU Size\">{pdu_size}</pair>\
         </dict></item>\
         </list></pair>\
         </dm_log_packet>\n"
    )
}

fn rrc_request_record(timestamp: &str) -> String {
    format!(
        "<dm_log_packet>\
         <pair key=\"type_id\">LTE_RRC_OTA_Packet</pair>\
         <pair key=\"timestamp\">{timestamp}</pair>\
         <field showname=\"rrcConnectionRequest\"/>\
         </dm_log_packet>\n"
    )
}

#[test]
fn serv_cell_info_dumps_all_fields() {
    let input = format!(
        "<dm_log_packet>\
         <pair key=\"type_id\">LTE_RRC_Serv_Cell_Info</pair>\
         <pair key=\"timestamp\">{TS1}</pair>\
         <pair key=\"Cell ID\">42</pair>\
         <pair key=\"Downlink frequency\">1850</pair>\
         <pair key=\"Uplink frequency\">19850</pair>\
         <pair key=\"Downlink bandwidth\">20 MHz</pair>\
         <pair key=\"Uplink bandwidth\">20 MHz</pair>\
         <pair key=\"Cell Identity\">123456</pair>\
         <pair key=\"TAC\">7</pair>\
         </dm_log_packet>"
    );
    let out = run_mode(extract(&["rrc_serv_cell_info"]), &input, 2);
    assert_eq!(
        out,
        format!(
            "{TS1} $ LTE_RRC_Serv_Cell_Info $ Cell ID: 42, \
             Downlink frequency: 1850, Uplink frequency: 19850, \
             Downlink bandwidth: 20 MHz, Uplink bandwidth: 20 MHz, \
             Cell Identity: 123456, TAC: 7\n"
        )
    );
}

#[test]
fn pdcp_cipher_data_pdu_prints_size_and_bearer() {
    let out = run_mode(
        extract(&["pdcp_cipher_data_pdu"]),
        &pdcp_ul_record(TS1, "1412"),
        2,
    );
    assert_eq!(
        out,
        format!("{TS1} $ LTE_PDCP_UL_Cipher_Data_PDU $ PDU Size: 1412, Bearer ID: 3\n")
    );
}

#[test]
fn mac_rach_extractors_report_results_and_reasons() {
    let input = format!(
        "<dm_log_packet>\
         <pair key=\"type_id\">LTE_MAC_Rach_Attempt</pair>\
         <pair key=\"timestamp\">{TS1}</pair>\
         <pair key=\"Rach result\">Success</pair>\
         </dm_log_packet>\
         <dm_log_packet>\
         <pair key=\"type_id\">LTE_MAC_Rach_Trigger</pair>\
         <pair key=\"timestamp\">{TS2}</pair>\
         <pair key=\"Rach reason\">CONNECTION_REQ</pair>\
         </dm_log_packet>"
    );
    let out = run_mode(extract(&["mac_rach_attempt", "mac_rach_trigger"]), &input, 2);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines[0],
        format!("{TS1} $ LTE_MAC_Rach_Attempt $ Result: Success")
    );
    assert_eq!(
        lines[1],
        format!(
            "{TS2} $ LTE_MAC_Rach_Trigger $ Reason: CONNECTION_REQ, \
             LastPDCPPacketTimestamp: unknown"
        )
    );
}

#[test]
fn nas_incoming_reports_tracking_area_update() {
    let input = format!(
        "<dm_log_packet>\
         <pair key=\"type_id\">LTE_NAS_EMM_OTA_Incoming_Packet</pair>\
         <pair key=\"timestamp\">{TS1}</pair>\
         <field name=\"nas_eps.nas_msg_emm_type\" \
                showname=\"NAS EPS Mobility Management Message Type: \
                           Tracking area update accept (0x49)\"/>\
         </dm_log_packet>"
    );
    let out = run_mode(extract(&["nas_emm_ota_incoming"]), &input, 2);
    assert_eq!(
        out,
        format!(
            "{TS1} $ LTE_NAS_EMM_OTA_Incoming_Packet $ \
             Tracking area update accept: 1, Tracking area update reject: 0\n"
        )
    );
}

#[test]
fn nas_incoming_without_update_messages_is_silent() {
    let input = record("LTE_NAS_EMM_OTA_Incoming_Packet", TS1);
    let out = run_mode(extract(&["nas_emm_ota_incoming"]), &input, 2);
    assert!(out.is_empty());
}

#[test]
fn phy_pdsch_dumps_the_fixed_key_set() {
    let input = format!(
        "<dm_log_packet>\
         <pair key=\"type_id\">LTE_PHY_PDSCH_Packet</pair>\
         <pair key=\"timestamp\">{TS1}</pair>\
         <pair key=\"System Frame Number\">512</pair>\
         <pair key=\"Subframe Number\">3</pair>\
         <pair key=\"Something Else\">ignored</pair>\
         <pair key=\"TBS 0\">1234</pair>\
         </dm_log_packet>"
    );
    let out = run_mode(extract(&["phy_pdsch"]), &input, 2);
    assert_eq!(
        out,
        format!(
            "{TS1} $ LTE_PHY_PDSCH_Packet $ System Frame Number: 512, \
             Subframe Number: 3, TBS 0: 1234\n"
        )
    );
}

#[test]
fn phy_serv_cell_meas_reports_primary_cell_rsrp() {
    let input = format!(
        "<dm_log_packet>\
         <pair key=\"type_id\">LTE_PHY_Serv_Cell_Measurement</pair>\
         <pair key=\"timestamp\">{TS1}</pair>\
         <pair key=\"Subpackets\" type=\"list\"><list>\
         <item type=\"dict\"><dict>\
         <pair key=\"Serving Cell Index\">PCell</pair>\
         <pair key=\"RSRP\">-95.3</pair>\
         </dict></item>\
         <item type=\"dict\"><dict>\
         <pair key=\"Serving Cell Index\">SCell</pair>\
         <pair key=\"RSRP\">-101.0</pair>\
         </dict></item>\
         </list></pair>\
         </dm_log_packet>"
    );
    let out = run_mode(extract(&["phy_serv_cell_meas"]), &input, 2);
    assert_eq!(
        out,
        format!("{TS1} $ LTE_PHY_Serv_Cell_Measurement $ RSRP: -95.3\n")
    );
}

#[test]
fn phy_pdsch_stat_emits_one_line_per_transport_block() {
    let input = format!(
        "<dm_log_packet>\
         <pair key=\"type_id\">LTE_PHY_PDSCH_Stat_Indication</pair>\
         <pair key=\"timestamp\">{TS1}</pair>\
         <pair key=\"Records\" type=\"list\"><list>\
         <item type=\"dict\"><dict>\
         <pair key=\"Frame Num\">100</pair>\
         <pair key=\"Transport Blocks\" type=\"list\"><list>\
         <item type=\"dict\"><dict>\
         <pair key=\"TB Index\">0</pair>\
         <pair key=\"CRC Result\">Pass</pair>\
         </dict></item>\
         <item type=\"dict\"><dict>\
         <pair key=\"TB Index\">1</pair>\
         <pair key=\"CRC Result\">Fail</pair>\
         </dict></item>\
         </list></pair>\
         </dict></item>\
         </list></pair>\
         </dm_log_packet>"
    );
    let out = run_mode(extract(&["phy_pdsch_stat"]), &input, 2);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(
        lines[0],
        format!(
            "{TS1} $ LTE_PHY_PDSCH_Stat_Indication $ Frame Num: 100, \
             TB Index: 0, CRC Result: Pass"
        )
    );
    assert!(lines[1].ends_with("TB Index: 1, CRC Result: Fail"));
}

#[test]
fn rlc_am_all_pdu_flattens_nack_and_elides_li() {
    let input = format!(
        "<dm_log_packet>\
         <pair key=\"type_id\">LTE_RLC_DL_AM_All_PDU</pair>\
         <pair key=\"timestamp\">{TS1}</pair>\
         <pair key=\"RLCDL PDUs\" type=\"list\"><list>\
         <item type=\"dict\"><dict>\
         <pair key=\"SN\">17</pair>\
         <pair key=\"RLC DATA LI\">123,456</pair>\
         <pair key=\"RLC CTRL NACK\" type=\"list\"><list>\
         <item type=\"dict\"><dict><pair key=\"NACK_SN\">5</pair></dict></item>\
         <item type=\"dict\"><dict><pair key=\"NACK_SN\">9</pair></dict></item>\
         </list></pair>\
         </dict></item>\
         </list></pair>\
         </dm_log_packet>"
    );
    let out = run_mode(extract(&["rlc_dl_am_all_pdu"]), &input, 2);
    assert_eq!(
        out,
        format!(
            "{TS1} $ LTE_RLC_DL_AM_All_PDU $ SN: 17, RLC DATA LI: OMITTED, \
             RLC CTRL NACK: 5/9\n"
        )
    );
}

#[test]
fn rlc_config_log_reports_each_bearer_with_reason() {
    let input = format!(
        "<dm_log_packet>\
         <pair key=\"type_id\">LTE_RLC_DL_Config_Log_Packet</pair>\
         <pair key=\"timestamp\">{TS1}</pair>\
         <pair key=\"Reason\">CONFIGURATION</pair>\
         <pair key=\"Released RBs\" type=\"list\"><list>\
         <item type=\"dict\"><dict>\
         <pair key=\"Released RB Cfg Index\">2</pair>\
         </dict></item>\
         </list></pair>\
         </dm_log_packet>"
    );
    let out = run_mode(extract(&["rlc_dl_config_log"]), &input, 2);
    assert_eq!(
        out,
        format!(
            "{TS1} $ LTE_RLC_DL_Config_Log_Packet $ Reason: CONFIGURATION, \
             Category: Released RBs, Released RB Cfg Index: 2\n"
        )
    );
}

#[test]
fn rlc_config_log_without_reason_is_fatal() {
    let input = record("LTE_RLC_DL_Config_Log_Packet", TS1);
    let err = try_run_mode(extract(&["rlc_dl_config_log"]), &input, 2).unwrap_err();
    assert!(err.to_string().contains("Reason"));
}

#[test]
fn rrc_ota_connection_request_reports_last_pdcp_stamp() {
    let out = run_mode(extract(&["rrc_ota"]), &rrc_request_record(TS1), 2);
    assert_eq!(
        out,
        format!(
            "{TS1} $ rrcConnectionRequest $ \
             LastPDCPPacketTimestamp: unknown, Direction: unknown\n"
        )
    );
}

#[test]
fn disruption_chain_links_rrc_events_to_the_next_data_pdu() {
    // 1. A connection request disrupts the link.
    // 2. The next full-size PDCP data PDU is reported and stamps the state.
    // 3. A later connection request reports that stamp.
    let input = format!(
        "{}{}{}",
        rrc_request_record(TS1),
        pdcp_ul_record(TS2, "1412"),
        rrc_request_record(TS3),
    );
    let out = run_mode(
        extract(&["rrc_ota", "action_pdcp_cipher_data_pdu"]),
        &input,
        4,
    );
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        format!(
            "{TS1} $ rrcConnectionRequest $ \
             LastPDCPPacketTimestamp: unknown, Direction: unknown"
        )
    );
    assert_eq!(
        lines[1],
        format!(
            "{TS2} $ FirstPDCPPacketAfterDisruption $ \
             Disruption Type: rrcConnectionRequest, Direction: uplink"
        )
    );
    assert_eq!(
        lines[2],
        format!(
            "{TS3} $ rrcConnectionRequest $ \
             LastPDCPPacketTimestamp: {TS2}, Direction: uplink"
        )
    );
}

#[test]
fn small_pdcp_pdus_do_not_update_the_stamp() {
    let input = format!(
        "{}{}{}",
        rrc_request_record(TS1),
        pdcp_ul_record(TS2, "64"), // not a full-size data PDU
        rrc_request_record(TS3),
    );
    let out = run_mode(
        extract(&["rrc_ota", "action_pdcp_cipher_data_pdu"]),
        &input,
        4,
    );
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].contains("LastPDCPPacketTimestamp: unknown"));
}

#[test]
fn first_match_wins_between_overlapping_extractors() {
    // Both pdcp extractors claim the same packet types; only the first
    // configured one runs.
    let out = run_mode(
        extract(&["pdcp_cipher_data_pdu", "action_pdcp_cipher_data_pdu"]),
        &pdcp_ul_record(TS1, "1412"),
        2,
    );
    assert_eq!(out.lines().count(), 1);
    assert!(out.contains("PDU Size: 1412"));
}
