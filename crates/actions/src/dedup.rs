//! Dedup mode - drop records that go back in time
//!
//! Concatenating overlapping captures produces duplicated stretches. A
//! record is kept only when its microsecond timestamp is at least the
//! newest one already emitted; ties pass, regressions are dropped with a
//! warning naming both timestamps.

use dmsift_pipeline::{EngineError, RecordAction, SubmitHandle};
use dmsift_record::{Job, Packet, PacketTime};
use tracing::warn;

use crate::context::ExecContext;

pub(crate) struct DedupEcho;

impl RecordAction<ExecContext> for DedupEcho {
    fn applies(&self, _packet: &Packet, _job: &Job) -> bool {
        true
    }

    fn run(
        &self,
        packet: Packet,
        job: Job,
        submit: SubmitHandle<ExecContext>,
    ) -> Result<(), EngineError> {
        let timestamp = packet.timestamp_display();
        let Some(time) = PacketTime::parse(&timestamp) else {
            submit.submit(move |_ctx| {
                warn!(
                    timestamp = %timestamp,
                    "record timestamp is unparseable, dropping"
                );
                Ok(())
            });
            return Ok(());
        };

        let micros = time.unix_micros();
        let text = job.text;
        submit.submit(move |ctx| {
            if micros >= ctx.dedup.newest_micros {
                ctx.write_line(&text)?;
                ctx.dedup.newest_micros = micros;
                ctx.dedup.newest_repr = timestamp;
            } else {
                warn!(
                    dropped = %timestamp,
                    newest = %ctx.dedup.newest_repr,
                    "dropping record older than the newest already emitted"
                );
            }
            Ok(())
        });
        Ok(())
    }

    fn unconditional(&self) -> bool {
        true
    }
}
