//! Mode registry - builds the action pipeline for a run
//!
//! The mode is decided once at startup. Extract mode assembles one pipeline
//! entry per enabled catalog extractor, in the order the user named them;
//! every other mode is a single unconditional action. The pipeline itself
//! guarantees a terminal catch-all when the last entry is conditional.

use dmsift_pipeline::{ActionPipeline, EngineError, RecordAction};
use tracing::{info, warn};

use crate::catalog::{CatalogEntry, ExtractorKind};
use crate::context::ExecContext;
use crate::dedup::DedupEcho;
use crate::range::RangeEcho;
use crate::reorder::ReorderInsert;
use crate::type_filter::TypeMatchEcho;

/// The per-record behavior of a run, selected on the command line.
#[derive(Debug, Clone)]
pub enum Mode {
    /// Run the named catalog extractors.
    Extract(Vec<String>),
    /// Echo records within any of the inclusive unix-second ranges.
    Range(Vec<(i64, i64)>),
    /// Echo records whose timestamp is not older than the newest emitted.
    Dedup,
    /// Re-sort records by timestamp within a microsecond tolerance window.
    /// The matching context must be built with
    /// [`ExecContext::with_reorder`](crate::ExecContext::with_reorder).
    Reorder { tolerance_micros: i64 },
    /// Echo records whose type_id fully matches the regex.
    TypeFilter(String),
}

/// Build the action pipeline for a mode.
pub fn build_pipeline(mode: Mode) -> Result<ActionPipeline<ExecContext>, EngineError> {
    let entries: Vec<Box<dyn RecordAction<ExecContext>>> = match mode {
        Mode::Extract(names) => {
            let mut entries: Vec<Box<dyn RecordAction<ExecContext>>> = Vec::new();
            for name in &names {
                match ExtractorKind::from_name(name) {
                    Some(kind) => {
                        info!(extractor = %name, claims = kind.claimed_types(), "extractor enabled");
                        entries.push(Box::new(CatalogEntry::new(kind)));
                    }
                    None => warn!(extractor = %name, "unknown extractor, skipping"),
                }
            }
            entries
        }
        Mode::Range(ranges) => vec![Box::new(RangeEcho::new(ranges))],
        Mode::Dedup => vec![Box::new(DedupEcho)],
        Mode::Reorder { tolerance_micros } => {
            if tolerance_micros <= 0 {
                return Err(EngineError::argument(format!(
                    "reorder window size must be greater than 0, given: {tolerance_micros}"
                )));
            }
            vec![Box::new(ReorderInsert)]
        }
        Mode::TypeFilter(pattern) => vec![Box::new(TypeMatchEcho::new(&pattern)?)],
    };
    Ok(ActionPipeline::new(entries))
}
