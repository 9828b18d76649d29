//! Job - one unit of work produced by the splitter

/// One record string carved out of an input stream, annotated with its
/// position in the run.
///
/// Jobs are created by the splitter, travel through the bounded work queue
/// exactly once, and are consumed by the extractor that parses them.
#[derive(Debug)]
pub struct Job {
    /// Dense sequence number: starts at 0 and increases by one per record
    /// across the whole run, in input order. This is the sole link between
    /// parallel extraction and ordered output.
    pub seq: u64,

    /// The record text, exactly one top-level element.
    pub text: String,

    /// Name of the input the record came from (file path or "stdin").
    pub source_name: String,

    /// 1-based line of the record's first byte.
    pub start_line: u64,

    /// 1-based line of the record's last byte.
    pub end_line: u64,
}

impl Job {
    /// Human-readable source span, used in warnings and parse errors.
    pub fn span(&self) -> String {
        format!(
            "{}:{}-{}",
            self.source_name, self.start_line, self.end_line
        )
    }
}
