// ── Result delivery ──
//
// The orchestrator hands each finished run to exactly one sink and awaits
// it before moving on, then delivers a single completion. Calls are never
// concurrent.

use futures_util::future::BoxFuture;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

use crate::model::{Sample, TestMode};

/// Summary delivered once when a sequence ends through `Stopping`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub mode: TestMode,
    /// Samples delivered during the sequence.
    pub runs: u32,
    /// Whether the sequence ended because of `stop()`.
    pub cancelled: bool,
}

/// Receiver of orchestrator output.
pub trait SampleSink: Send + Sync {
    fn on_sample(&self, sample: Sample) -> BoxFuture<'_, ()>;

    fn on_complete(&self, summary: RunSummary) -> BoxFuture<'_, ()>;
}

/// Sink output as an ordered event stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    Sample(Sample),
    Completed(RunSummary),
}

/// A sink that forwards into a bounded channel.
///
/// A full channel applies backpressure to the measurement loop. Events are
/// dropped once the receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<RunEvent>,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<RunEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    async fn forward(&self, event: RunEvent) {
        if self.tx.send(event).await.is_err() {
            debug!("run event receiver dropped");
        }
    }
}

impl SampleSink for ChannelSink {
    fn on_sample(&self, sample: Sample) -> BoxFuture<'_, ()> {
        Box::pin(self.forward(RunEvent::Sample(sample)))
    }

    fn on_complete(&self, summary: RunSummary) -> BoxFuture<'_, ()> {
        Box::pin(self.forward(RunEvent::Completed(summary)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_sink_keeps_order() {
        let (sink, mut rx) = ChannelSink::new(4);
        let summary = RunSummary {
            mode: TestMode::Static,
            runs: 0,
            cancelled: true,
        };
        sink.on_complete(summary).await;
        drop(sink);
        assert_eq!(rx.recv().await, Some(RunEvent::Completed(summary)));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn dropped_receiver_is_ignored() {
        let (sink, rx) = ChannelSink::new(1);
        drop(rx);
        sink.on_complete(RunSummary {
            mode: TestMode::Drive,
            runs: 3,
            cancelled: true,
        })
        .await;
    }
}
