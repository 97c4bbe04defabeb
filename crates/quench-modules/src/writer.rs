//! Plain-text event writer.
//!
//! Output format:
//!
//! ```text
//! # quench ascii v1 events=4 reuse_period=2 seed=7
//! # event 0 cycle 0 upstream=regenerated
//! # hadrons 2
//! 211 3.141593 0.250000 1.570796
//! -211 2.000000 -0.500000 4.712389
//! # soft 0
//! ...
//! # end events=4 aborted=false
//! ```

use std::io::Write;

use quench_core::{ResourceUse, TaskError, TaskKind};
use quench_resource::Reader;
use quench_task::{ExecContext, FinishContext, InitContext, Task};
use tracing::debug;

use crate::data::Hadron;

fn io_failure(err: std::io::Error) -> TaskError {
    TaskError::failed(format!("write failed: {err}"))
}

/// Writes one block per event listing every hadron stream it is attached
/// to. A [`TaskKind::Sink`], so it must be the last task of the tree.
pub struct AsciiWriter<W: Write + Send> {
    out: W,
    streams: Vec<(String, Reader<Vec<Hadron>>)>,
    written: u64,
}

impl<W: Write + Send> AsciiWriter<W> {
    /// Write to `out`. Attach streams with [`stream`](Self::stream).
    pub fn new(out: W) -> Self {
        Self {
            out,
            streams: Vec::new(),
            written: 0,
        }
    }

    /// Add a hadron stream, written under `label` in every event block.
    pub fn stream(mut self, label: impl Into<String>, reader: Reader<Vec<Hadron>>) -> Self {
        self.streams.push((label.into(), reader));
        self
    }

    /// Events written so far.
    pub fn events_written(&self) -> u64 {
        self.written
    }

    /// Consume the writer and return the underlying sink.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Task for AsciiWriter<W> {
    fn name(&self) -> &str {
        "ascii_writer"
    }

    fn kind(&self) -> TaskKind {
        TaskKind::Sink
    }

    fn resources(&self) -> Vec<ResourceUse> {
        self.streams.iter().map(|(_, r)| r.usage()).collect()
    }

    fn init(&mut self, ctx: &InitContext<'_>) -> Result<(), TaskError> {
        let run = ctx.run();
        writeln!(
            self.out,
            "# quench ascii v1 events={} reuse_period={} seed={}",
            run.total_events, run.reuse_period, run.seed
        )
        .map_err(io_failure)
    }

    fn exec(&mut self, ctx: &ExecContext<'_>) -> Result<(), TaskError> {
        let upstream = if ctx.regenerate_upstream() {
            "regenerated"
        } else {
            "reused"
        };
        writeln!(
            self.out,
            "# event {} cycle {} upstream={upstream}",
            ctx.event().0,
            ctx.cycle().0
        )
        .map_err(io_failure)?;

        for (label, reader) in &self.streams {
            let hadrons = reader.read(Clone::clone)?;
            writeln!(self.out, "# {label} {}", hadrons.len()).map_err(io_failure)?;
            for h in &hadrons {
                writeln!(
                    self.out,
                    "{} {:.6} {:.6} {:.6}",
                    h.pid, h.pt, h.eta, h.phi
                )
                .map_err(io_failure)?;
            }
        }
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self, ctx: &FinishContext<'_>) -> Result<(), TaskError> {
        writeln!(
            self.out,
            "# end events={} aborted={}",
            self.written,
            ctx.aborted()
        )
        .map_err(io_failure)?;
        self.out.flush().map_err(io_failure)?;
        debug!(events = self.written, "ascii writer flushed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys;
    use crate::testing::{plan, RUN};
    use quench_core::EventIndex;
    use quench_resource::ResourceRegistry;

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk full"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writes_header_blocks_and_trailer() {
        let mut reg = ResourceRegistry::new();
        let hadrons = reg.register(keys::HADRONS, Vec::new()).unwrap();
        let mut writer = AsciiWriter::new(Vec::new())
            .stream("hadrons", reg.reader(keys::HADRONS).unwrap());

        writer.init(&InitContext::new(&RUN)).unwrap();
        for event in 0..2 {
            hadrons
                .publish(EventIndex(event), |h| {
                    *h = vec![Hadron {
                        pid: 211,
                        pt: 1.5,
                        eta: 0.0,
                        phi: 0.25,
                    }]
                })
                .unwrap();
            let p = plan(event);
            writer.exec(&ExecContext::new(&RUN, &p)).unwrap();
        }
        writer.finish(&FinishContext::new(&RUN, 2, false)).unwrap();
        assert_eq!(writer.events_written(), 2);

        let text = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "# quench ascii v1 events=4 reuse_period=2 seed=99");
        assert_eq!(lines[1], "# event 0 cycle 0 upstream=regenerated");
        assert_eq!(lines[2], "# hadrons 1");
        assert_eq!(lines[3], "211 1.500000 0.000000 0.250000");
        assert_eq!(lines[4], "# event 1 cycle 0 upstream=reused");
        assert_eq!(lines.last(), Some(&"# end events=2 aborted=false"));
    }

    #[test]
    fn io_errors_become_task_failures() {
        let mut writer = AsciiWriter::new(Broken);
        match writer.init(&InitContext::new(&RUN)) {
            Err(TaskError::ExecutionFailed { reason }) => assert!(reason.contains("disk full")),
            other => panic!("expected ExecutionFailed, got {other:?}"),
        }
    }

    #[test]
    fn writer_is_a_sink() {
        let writer = AsciiWriter::new(Vec::new());
        assert_eq!(writer.kind(), TaskKind::Sink);
        assert!(writer.resources().is_empty());
    }
}
