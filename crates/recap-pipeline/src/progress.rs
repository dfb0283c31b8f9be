use async_trait::async_trait;
use recap_types::ProgressEvent;
use tokio::sync::mpsc;

/// Receives stage transitions as the pipeline runs
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn report(&self, event: ProgressEvent);
}

pub struct NoopProgress;

#[async_trait]
impl ProgressSink for NoopProgress {
    async fn report(&self, _event: ProgressEvent) {}
}

/// Forwards events into a channel; a dropped receiver is ignored
pub struct ChannelProgress {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelProgress {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl ProgressSink for ChannelProgress {
    async fn report(&self, event: ProgressEvent) {
        let _ = self.tx.send(event);
    }
}
