//! Extractor catalog - named per-packet-type extraction routines
//!
//! Extract mode enables a user-selected subset of this catalog. Each entry
//! is keyed by the record's `type_id`; the enabled entries form the action
//! pipeline in the order the user named them, first match wins. The set is
//! a closed enum so dispatch is a plain match instead of a table of
//! callbacks, and a forgotten arm is a compile error.

use dmsift_pipeline::{EngineError, RecordAction, SubmitHandle};
use dmsift_record::{Job, Packet};

use crate::context::ExecContext;
use crate::extract;

/// The extraction routines selectable with `--extract`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractorKind {
    RrcOta,
    RrcServCellInfo,
    PdcpCipherDataPdu,
    /// Compound: does not print PDU details, but maintains the last-PDCP
    /// stamp and reports the first data PDU after a connection disruption.
    PdcpCipherDataPduStamp,
    NasEmmOtaIncoming,
    NasEmmOtaOutgoing,
    MacRachAttempt,
    MacRachTrigger,
    PhyPdschStat,
    PhyPdsch,
    PhyServCellMeas,
    RlcDlAmAllPdu,
    RlcUlAmAllPdu,
    RlcDlConfigLog,
    RlcUlConfigLog,
    /// Unconditional: prints every record's timestamp and type.
    AllPacketType,
}

impl ExtractorKind {
    /// Resolve a `--extract` name. Unknown names return `None`; the
    /// registry warns and skips them.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "rrc_ota" => Self::RrcOta,
            "rrc_serv_cell_info" => Self::RrcServCellInfo,
            "pdcp_cipher_data_pdu" => Self::PdcpCipherDataPdu,
            "action_pdcp_cipher_data_pdu" => Self::PdcpCipherDataPduStamp,
            "nas_emm_ota_incoming" => Self::NasEmmOtaIncoming,
            "nas_emm_ota_outgoing" => Self::NasEmmOtaOutgoing,
            "mac_rach_attempt" => Self::MacRachAttempt,
            "mac_rach_trigger" => Self::MacRachTrigger,
            "phy_pdsch_stat" => Self::PhyPdschStat,
            "phy_pdsch" => Self::PhyPdsch,
            "phy_serv_cell_meas" => Self::PhyServCellMeas,
            "rlc_dl_am_all_pdu" => Self::RlcDlAmAllPdu,
            "rlc_ul_am_all_pdu" => Self::RlcUlAmAllPdu,
            "rlc_dl_config_log" => Self::RlcDlConfigLog,
            "rlc_ul_config_log" => Self::RlcUlConfigLog,
            "all_packet_type" => Self::AllPacketType,
            _ => return None,
        })
    }

    /// The packet types this extractor claims, for the startup log line.
    pub fn claimed_types(self) -> &'static str {
        match self {
            Self::RrcOta => "LTE_RRC_OTA_Packet",
            Self::RrcServCellInfo => "LTE_RRC_Serv_Cell_Info",
            Self::PdcpCipherDataPdu | Self::PdcpCipherDataPduStamp => {
                "LTE_PDCP_UL_Cipher_Data_PDU and LTE_PDCP_DL_Cipher_Data_PDU"
            }
            Self::NasEmmOtaIncoming => "LTE_NAS_EMM_OTA_Incoming_Packet",
            Self::NasEmmOtaOutgoing => "LTE_NAS_EMM_OTA_Outgoing_Packet",
            Self::MacRachAttempt => "LTE_MAC_Rach_Attempt",
            Self::MacRachTrigger => "LTE_MAC_Rach_Trigger",
            Self::PhyPdschStat => "LTE_PHY_PDSCH_Stat_Indication",
            Self::PhyPdsch => "LTE_PHY_PDSCH_Packet",
            Self::PhyServCellMeas => "LTE_PHY_Serv_Cell_Measurement",
            Self::RlcDlAmAllPdu => "LTE_RLC_DL_AM_All_PDU",
            Self::RlcUlAmAllPdu => "LTE_RLC_UL_AM_All_PDU",
            Self::RlcDlConfigLog => "LTE_RLC_DL_Config_Log_Packet",
            Self::RlcUlConfigLog => "LTE_RLC_UL_Config_Log_Packet",
            Self::AllPacketType => "every packet type",
        }
    }

    fn claims(self, packet: &Packet) -> bool {
        let type_id = packet.type_id();
        match self {
            Self::RrcOta => type_id == "LTE_RRC_OTA_Packet",
            Self::RrcServCellInfo => type_id == "LTE_RRC_Serv_Cell_Info",
            Self::PdcpCipherDataPdu | Self::PdcpCipherDataPduStamp => {
                type_id == "LTE_PDCP_UL_Cipher_Data_PDU"
                    || type_id == "LTE_PDCP_DL_Cipher_Data_PDU"
            }
            Self::NasEmmOtaIncoming => type_id == "LTE_NAS_EMM_OTA_Incoming_Packet",
            Self::NasEmmOtaOutgoing => type_id == "LTE_NAS_EMM_OTA_Outgoing_Packet",
            Self::MacRachAttempt => type_id == "LTE_MAC_Rach_Attempt",
            Self::MacRachTrigger => type_id == "LTE_MAC_Rach_Trigger",
            Self::PhyPdschStat => type_id == "LTE_PHY_PDSCH_Stat_Indication",
            Self::PhyPdsch => type_id == "LTE_PHY_PDSCH_Packet",
            Self::PhyServCellMeas => type_id == "LTE_PHY_Serv_Cell_Measurement",
            Self::RlcDlAmAllPdu => type_id == "LTE_RLC_DL_AM_All_PDU",
            Self::RlcUlAmAllPdu => type_id == "LTE_RLC_UL_AM_All_PDU",
            Self::RlcDlConfigLog => type_id == "LTE_RLC_DL_Config_Log_Packet",
            Self::RlcUlConfigLog => type_id == "LTE_RLC_UL_Config_Log_Packet",
            Self::AllPacketType => true,
        }
    }
}

/// Pipeline entry for one enabled extractor.
pub(crate) struct CatalogEntry {
    kind: ExtractorKind,
}

impl CatalogEntry {
    pub(crate) fn new(kind: ExtractorKind) -> Self {
        Self { kind }
    }
}

impl RecordAction<ExecContext> for CatalogEntry {
    fn applies(&self, packet: &Packet, _job: &Job) -> bool {
        self.kind.claims(packet)
    }

    fn run(
        &self,
        packet: Packet,
        job: Job,
        submit: SubmitHandle<ExecContext>,
    ) -> Result<(), EngineError> {
        match self.kind {
            ExtractorKind::RrcOta => extract::rrc::ota(packet, job, submit),
            ExtractorKind::RrcServCellInfo => extract::rrc::serv_cell_info(packet, job, submit),
            ExtractorKind::PdcpCipherDataPdu => extract::pdcp::cipher_data_pdu(packet, job, submit),
            ExtractorKind::PdcpCipherDataPduStamp => {
                extract::pdcp::update_data_stamp(packet, job, submit)
            }
            ExtractorKind::NasEmmOtaIncoming => extract::nas::emm_ota_incoming(packet, job, submit),
            ExtractorKind::NasEmmOtaOutgoing => extract::nas::emm_ota_outgoing(packet, job, submit),
            ExtractorKind::MacRachAttempt => extract::mac::rach_attempt(packet, job, submit),
            ExtractorKind::MacRachTrigger => extract::mac::rach_trigger(packet, job, submit),
            ExtractorKind::PhyPdschStat => extract::phy::pdsch_stat(packet, job, submit),
            ExtractorKind::PhyPdsch => extract::phy::pdsch(packet, job, submit),
            ExtractorKind::PhyServCellMeas => extract::phy::serv_cell_meas(packet, job, submit),
            ExtractorKind::RlcDlAmAllPdu => {
                extract::rlc::am_all_pdu(packet, job, submit, extract::rlc::Link::Downlink)
            }
            ExtractorKind::RlcUlAmAllPdu => {
                extract::rlc::am_all_pdu(packet, job, submit, extract::rlc::Link::Uplink)
            }
            ExtractorKind::RlcDlConfigLog => {
                extract::rlc::config_log(packet, job, submit, extract::rlc::Link::Downlink)
            }
            ExtractorKind::RlcUlConfigLog => {
                extract::rlc::config_log(packet, job, submit, extract::rlc::Link::Uplink)
            }
            ExtractorKind::AllPacketType => extract::packet_type(packet, job, submit),
        }
    }

    fn unconditional(&self) -> bool {
        self.kind == ExtractorKind::AllPacketType
    }
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
