//! RRC-layer extraction
//!
//! `rrc_ota` mines LTE_RRC_OTA_Packet records for measurement-configuration
//! changes, measurement reports, and the connection-control messages that
//! disrupt the data plane. `rrc_serv_cell_info` dumps the serving-cell
//! scalar fields.

use dmsift_pipeline::{EngineError, SubmitHandle};
use dmsift_record::{
    has_subtree_with_attr, subtrees_with_attr, Element, Job, Packet,
};
use tracing::warn;

use crate::context::{DisruptionKind, ExecContext};
use crate::extract::unexpected_count_warning;

fn showname(el: &Element) -> String {
    el.attributes.get("showname").cloned().unwrap_or_default()
}

/// Everything an LTE_RRC_OTA_Packet record contributes to the output,
/// collected on the worker and rendered on the executor.
#[derive(Default)]
struct OtaSummary {
    timestamp: String,
    warnings: Vec<String>,

    /// `(eventId showname, reportConfigId showname)` per added report config.
    report_config_adds: Vec<(String, String)>,
    removed_config_ids: Vec<String>,
    /// `(measId showname, reportConfigId showname)` per added measurement id.
    measure_id_adds: Vec<(String, String)>,
    removed_measure_ids: Vec<String>,
    measurement_reports: Vec<String>,

    reestablishment_request: bool,
    reestablishment_cause: String,
    reestablishment_complete: bool,
    reestablishment_reject: bool,
    reconfiguration: bool,
    mobility_control_info: bool,
    target_cells: String,
    reconfiguration_complete: bool,
    release: bool,
    connection_request: bool,
    connection_setup: bool,
    connection_reject: bool,
}

/// Collect `(inner showname, reportConfigId showname)` pairs from container
/// elements that are expected to hold exactly one `reportConfigId` and one
/// `inner_name` node each.
fn collect_paired_ids(
    root: &Element,
    container_name: &str,
    inner_name: &str,
    timestamp: &str,
    job: &Job,
    warnings: &mut Vec<String>,
) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for container in subtrees_with_attr(root, "name", container_name) {
        let config_ids = subtrees_with_attr(container, "name", "lte-rrc.reportConfigId");
        if config_ids.len() != 1 {
            warnings.push(unexpected_count_warning(
                timestamp,
                "lte-rrc.reportConfigId",
                config_ids.len(),
                job,
            ));
            continue;
        }
        let inner = subtrees_with_attr(container, "name", inner_name);
        if inner.len() != 1 {
            warnings.push(unexpected_count_warning(
                timestamp,
                inner_name,
                inner.len(),
                job,
            ));
            continue;
        }
        pairs.push((showname(inner[0]), showname(config_ids[0])));
    }
    pairs
}

/// Collect shownames of `id_name` nodes under every `container_name` node.
fn collect_removed_ids(root: &Element, container_name: &str, id_name: &str) -> Vec<String> {
    let mut ids = Vec::new();
    for container in subtrees_with_attr(root, "name", container_name) {
        for node in subtrees_with_attr(container, "name", id_name) {
            ids.push(showname(node));
        }
    }
    ids
}

fn summarize(packet: &Packet, job: &Job) -> OtaSummary {
    let root = packet.root();
    let mut s = OtaSummary {
        timestamp: packet.timestamp_display(),
        ..Default::default()
    };

    s.report_config_adds = collect_paired_ids(
        root,
        "lte-rrc.ReportConfigToAddMod_element",
        "lte-rrc.eventId",
        &s.timestamp,
        job,
        &mut s.warnings,
    );
    s.removed_config_ids = collect_removed_ids(
        root,
        "lte-rrc.reportConfigToRemoveList",
        "lte-rrc.ReportConfigId",
    );
    s.measure_id_adds = collect_paired_ids(
        root,
        "lte-rrc.MeasIdToAddMod_element",
        "lte-rrc.measId",
        &s.timestamp,
        job,
        &mut s.warnings,
    );
    s.removed_measure_ids =
        collect_removed_ids(root, "lte-rrc.measIdToRemoveList", "lte-rrc.MeasId");
    s.measurement_reports =
        collect_removed_ids(root, "lte-rrc.measResults_element", "lte-rrc.measId");

    s.reestablishment_request =
        has_subtree_with_attr(root, "showname", "rrcConnectionReestablishmentRequest");
    s.reestablishment_cause = subtrees_with_attr(root, "name", "lte-rrc.reestablishmentCause")
        .iter()
        .map(|el| showname(el))
        .collect::<Vec<_>>()
        .join(", ");
    s.reestablishment_complete =
        has_subtree_with_attr(root, "showname", "rrcConnectionReestablishmentComplete");
    s.reestablishment_reject =
        has_subtree_with_attr(root, "showname", "rrcConnectionReestablishmentReject");

    let reconf_nodes = subtrees_with_attr(root, "showname", "rrcConnectionReconfiguration");
    s.reconfiguration = !reconf_nodes.is_empty();
    s.mobility_control_info = reconf_nodes
        .iter()
        .any(|node| has_subtree_with_attr(node, "showname", "mobilityControlInfo"));
    if s.mobility_control_info {
        s.target_cells = subtrees_with_attr(root, "name", "lte-rrc.targetPhysCellId")
            .iter()
            .map(|el| showname(el))
            .collect::<Vec<_>>()
            .join(", ");
    }

    s.reconfiguration_complete =
        has_subtree_with_attr(root, "showname", "rrcConnectionReconfigurationComplete");
    s.release = has_subtree_with_attr(root, "showname", "rrcConnectionRelease");
    s.connection_request = has_subtree_with_attr(root, "showname", "rrcConnectionRequest");
    s.connection_setup = has_subtree_with_attr(root, "showname", "rrcConnectionSetup");
    s.connection_reject = has_subtree_with_attr(root, "showname", "rrcConnectionReject");

    s
}

impl OtaSummary {
    /// Render on the executor thread, where the last-PDCP stamp and the
    /// disruption set live.
    fn render(self, ctx: &mut ExecContext) -> Result<(), EngineError> {
        for w in &self.warnings {
            warn!("{w}");
        }
        let ts = &self.timestamp;

        for id in &self.removed_config_ids {
            ctx.write_line(&format!("{ts} $ reportConfigToRemoveList $ {id}"))?;
        }
        for id in &self.removed_measure_ids {
            ctx.write_line(&format!("{ts} $ measIdToRemoveList $ {id}"))?;
        }
        for (event, config) in &self.report_config_adds {
            ctx.write_line(&format!("{ts} $ ReportConfigToAddMod $ {event}, {config}"))?;
        }
        for (meas, config) in &self.measure_id_adds {
            ctx.write_line(&format!("{ts} $ MeasIdToAddMod $ {meas}, {config}"))?;
        }
        for report in &self.measurement_reports {
            ctx.write_line(&format!("{ts} $ measResults $ {report}"))?;
        }

        if self.reestablishment_request {
            let mut line =
                format!("{ts} $ rrcConnectionReestablishmentRequest $ {}", ctx.pdcp_stamp_display());
            if !self.reestablishment_cause.is_empty() {
                line.push_str(", ");
                line.push_str(&self.reestablishment_cause);
            }
            ctx.write_line(&line)?;
            ctx.disruptions.mark(DisruptionKind::ReestablishmentRequest);
        }
        if self.reestablishment_complete {
            ctx.write_line(&format!("{ts} $ rrcConnectionReestablishmentComplete $"))?;
            ctx.disruptions.mark(DisruptionKind::ReestablishmentComplete);
        }
        if self.reestablishment_reject {
            ctx.write_line(&format!("{ts} $ rrcConnectionReestablishmentReject $"))?;
        }
        if self.reconfiguration {
            let mobility = if self.mobility_control_info {
                format!("1, {}", self.target_cells)
            } else {
                "0".to_string()
            };
            ctx.write_line(&format!(
                "{ts} $ rrcConnectionReconfiguration $ mobilityControlInfo: {mobility}, {}",
                ctx.pdcp_stamp_display()
            ))?;
            ctx.disruptions.mark(DisruptionKind::Reconfiguration);
        }
        if self.reconfiguration_complete {
            ctx.write_line(&format!("{ts} $ rrcConnectionReconfigurationComplete $"))?;
            ctx.disruptions.mark(DisruptionKind::ReconfigurationComplete);
        }
        if self.release {
            ctx.write_line(&format!("{ts} $ rrcConnectionRelease $"))?;
        }
        if self.connection_request {
            ctx.write_line(&format!(
                "{ts} $ rrcConnectionRequest $ {}",
                ctx.pdcp_stamp_display()
            ))?;
            ctx.disruptions.mark(DisruptionKind::ConnectionRequest);
        }
        if self.connection_setup {
            ctx.write_line(&format!("{ts} $ rrcConnectionSetup $"))?;
            ctx.disruptions.mark(DisruptionKind::ConnectionSetup);
        }
        if self.connection_reject {
            ctx.write_line(&format!("{ts} $ rrcConnectionReject $"))?;
        }
        Ok(())
    }
}

/// `rrc_ota` extraction entry point.
pub(crate) fn ota(
    packet: Packet,
    job: Job,
    submit: SubmitHandle<ExecContext>,
) -> Result<(), EngineError> {
    let summary = summarize(&packet, &job);
    submit.submit(move |ctx| summary.render(ctx));
    Ok(())
}

/// `rrc_serv_cell_info`: dump the serving-cell scalar fields.
pub(crate) fn serv_cell_info(
    packet: Packet,
    job: Job,
    submit: SubmitHandle<ExecContext>,
) -> Result<(), EngineError> {
    const FIELDS: [&str; 7] = [
        "Cell ID",
        "Downlink frequency",
        "Uplink frequency",
        "Downlink bandwidth",
        "Uplink bandwidth",
        "Cell Identity",
        "TAC",
    ];

    let timestamp = packet.timestamp_display();
    let values: Vec<String> = FIELDS
        .iter()
        .map(|field| {
            packet
                .pair(field)
                .map(|v| v.into_owned())
                .unwrap_or_default()
        })
        .collect();

    let missing: Vec<&str> = FIELDS
        .iter()
        .zip(&values)
        .filter(|(_, v)| v.is_empty())
        .map(|(f, _)| *f)
        .collect();
    let missing_warning = (!missing.is_empty()).then(|| {
        format!(
            "packet at {} (timestamp = {timestamp}): serving-cell record is missing fields: {}",
            job.span(),
            missing.join(", ")
        )
    });

    submit.submit(move |ctx| {
        if let Some(w) = &missing_warning {
            warn!("{w}");
        }
        let fields = FIELDS
            .iter()
            .zip(&values)
            .map(|(f, v)| format!("{f}: {v}"))
            .collect::<Vec<_>>()
            .join(", ");
        ctx.write_line(&format!("{timestamp} $ LTE_RRC_Serv_Cell_Info $ {fields}"))
    });
    Ok(())
}
