//! Shared harness: run a mode over in-memory input and capture the output.

use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};

use dmsift_actions::{build_pipeline, ExecContext, Mode};
use dmsift_pipeline::{Engine, EngineError, InputSource};

/// Output sink the test keeps a handle to while the engine owns the writer.
#[derive(Clone, Default)]
pub struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Run one mode over the input and return the full output text.
pub fn run_mode(mode: Mode, input: &str, workers: usize) -> String {
    try_run_mode(mode, input, workers).expect("run failed")
}

pub fn try_run_mode(
    mode: Mode,
    input: &str,
    workers: usize,
) -> Result<String, EngineError> {
    let buf = SharedBuf::default();
    let context = match &mode {
        Mode::Reorder { tolerance_micros } => {
            ExecContext::with_reorder(Box::new(buf.clone()), *tolerance_micros)?
        }
        _ => ExecContext::new(Box::new(buf.clone())),
    };
    let pipeline = build_pipeline(mode)?;
    let inputs = vec![InputSource::new(
        "test-input",
        Box::new(Cursor::new(input.as_bytes().to_vec())),
    )];
    let context = Engine::new(workers, inputs, pipeline, context)?.run()?;
    context.finish()?;
    Ok(buf.contents())
}

/// A minimal record with a type and a timestamp.
pub fn record(type_id: &str, timestamp: &str) -> String {
    format!(
        "<dm_log_packet><pair key=\"type_id\">{type_id}</pair>\
         <pair key=\"timestamp\">{timestamp}</pair></dm_log_packet>\n"
    )
}
