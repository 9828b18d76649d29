//! Record scanner - lexical splitting of concatenated top-level elements
//!
//! The scanner is a byte-level state machine that recognizes only the
//! shapes `<`, `</`, `>` and `/>` and counts tag depth. It does not
//! validate XML; a malformed record is carried through verbatim and
//! rejected later by the real parser.
//!
//! # Design
//!
//! - **Push-fed and pure**: callers feed arbitrary byte chunks; the record
//!   boundaries and line spans produced are a function of the byte stream
//!   alone, never of how it was chunked.
//! - **Quote-aware**: inside a tag, a `"`- or `'`-quoted attribute value
//!   suspends recognition of `<`, `>` and `/`, so `<a attr="/>" />` is a
//!   single record.
//! - **Chunked fast path**: open tags in this format are long attribute
//!   runs. While inside one, 16-byte blocks that contain no structural
//!   byte are appended wholesale with a bulk newline count. The scalar
//!   path and the fast path are bit-identical by construction.

/// Width of the fast-path block scan.
const CHUNK_WIDTH: usize = 16;

/// One record carved out of the stream, with its 1-based line span.
#[derive(Debug, PartialEq, Eq)]
pub struct RawRecord {
    pub text: String,
    pub start_line: u64,
    pub end_line: u64,
}

/// Machine states. `AngleClosed` with depth 0 is both the initial and the
/// emit-ready state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Outside any tag
    AngleClosed,
    /// Just saw `<`; the next byte decides opening vs closing tag
    AngleOpen,
    /// Inside an opening tag
    CreatingSubtree,
    /// Saw `/` inside an opening tag; may be the start of `/>`
    CreatingField,
    /// Inside a closing tag
    ClosingSubtree,
}

/// Lexical splitter state machine.
pub struct RecordScanner {
    state: ScanState,
    depth: i32,
    /// Active attribute-value quote byte, if any.
    quote: Option<u8>,
    /// Bytes of the record being accumulated.
    buf: Vec<u8>,
    in_record: bool,
    /// Current 1-based line number; newlines between records count too.
    line: u64,
    start_line: u64,
    /// Armed on entering an opening tag; enables the block scan.
    accel_armed: bool,
    chunk_accel: bool,
}

impl RecordScanner {
    pub fn new() -> Self {
        Self::with_chunk_accel(true)
    }

    /// Construct with the block fast path toggled, for equivalence tests.
    pub fn with_chunk_accel(chunk_accel: bool) -> Self {
        Self {
            state: ScanState::AngleClosed,
            depth: 0,
            quote: None,
            buf: Vec::new(),
            in_record: false,
            line: 1,
            start_line: 1,
            accel_armed: false,
            chunk_accel,
        }
    }

    /// Feed one chunk of input, appending completed records to `out`.
    pub fn feed(&mut self, bytes: &[u8], out: &mut Vec<RawRecord>) {
        let mut i = 0;
        while i < bytes.len() {
            let b = bytes[i];
            i += 1;

            if !self.in_record {
                if b == b'<' {
                    self.begin_record();
                } else {
                    if b == b'\n' {
                        self.line += 1;
                    }
                    continue;
                }
            } else if b == b'\n' {
                self.line += 1;
            }

            self.buf.push(b);
            self.step(b);

            if self.depth == 0 && self.state == ScanState::AngleClosed {
                self.emit(out);
                continue;
            }

            // Fast path: while creating an opening tag, swallow whole blocks
            // that contain no structural byte.
            if self.accel_armed {
                if self.chunk_accel && self.state == ScanState::CreatingSubtree {
                    i = self.scan_blocks(bytes, i);
                }
                self.accel_armed = false;
            }
        }
    }

    /// Signal the end of one input. A partially accumulated record is
    /// discarded; its line span is returned so the caller can log it.
    /// Line numbering restarts at 1 for the next input.
    pub fn end_of_input(&mut self) -> Option<(u64, u64)> {
        let truncated = self.in_record.then_some((self.start_line, self.line));
        self.state = ScanState::AngleClosed;
        self.depth = 0;
        self.quote = None;
        self.buf.clear();
        self.in_record = false;
        self.line = 1;
        self.accel_armed = false;
        truncated
    }

    fn begin_record(&mut self) {
        self.in_record = true;
        self.start_line = self.line;
        self.state = ScanState::AngleClosed;
        self.depth = 0;
        self.quote = None;
        self.buf.clear();
    }

    fn emit(&mut self, out: &mut Vec<RawRecord>) {
        out.push(RawRecord {
            text: String::from_utf8_lossy(&self.buf).into_owned(),
            start_line: self.start_line,
            end_line: self.line,
        });
        self.buf.clear();
        self.in_record = false;
        self.quote = None;
    }

    /// One transition of the state machine.
    fn step(&mut self, b: u8) {
        match self.state {
            ScanState::AngleClosed => {
                if b == b'<' {
                    self.state = ScanState::AngleOpen;
                }
            }
            ScanState::AngleOpen => {
                if b == b'/' {
                    self.state = ScanState::ClosingSubtree;
                } else {
                    self.state = ScanState::CreatingSubtree;
                    self.accel_armed = true;
                }
            }
            ScanState::CreatingSubtree => {
                if let Some(q) = self.quote {
                    if b == q {
                        self.quote = None;
                    }
                } else {
                    match b {
                        b'>' => {
                            self.state = ScanState::AngleClosed;
                            self.depth += 1;
                        }
                        b'/' => self.state = ScanState::CreatingField,
                        b'"' | b'\'' => self.quote = Some(b),
                        _ => {}
                    }
                }
            }
            ScanState::CreatingField => {
                if b == b'>' {
                    // It really was `/>`: the tag closes without a subtree.
                    self.state = ScanState::AngleClosed;
                } else {
                    self.state = ScanState::CreatingSubtree;
                    if b == b'"' || b == b'\'' {
                        self.quote = Some(b);
                    }
                }
            }
            ScanState::ClosingSubtree => {
                if b == b'>' {
                    self.state = ScanState::AngleClosed;
                    self.depth -= 1;
                }
            }
        }
    }

    /// Consume whole blocks from `bytes[i..]` while they contain no byte the
    /// state machine cares about. Returns the new cursor.
    fn scan_blocks(&mut self, bytes: &[u8], mut i: usize) -> usize {
        while i + CHUNK_WIDTH <= bytes.len() {
            let block = &bytes[i..i + CHUNK_WIDTH];
            if block.iter().any(|&b| is_structural(b)) {
                break;
            }
            self.line += block.iter().filter(|&&b| b == b'\n').count() as u64;
            self.buf.extend_from_slice(block);
            i += CHUNK_WIDTH;
        }
        i
    }
}

impl Default for RecordScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Bytes the state machine must see one at a time. Quote characters are
/// included so the fast path never skips over a quote toggle.
#[inline]
fn is_structural(b: u8) -> bool {
    matches!(b, b'<' | b'>' | b'/' | b'"' | b'\'')
}

#[cfg(test)]
#[path = "scanner_test.rs"]
mod tests;
