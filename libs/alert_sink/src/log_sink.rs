use crate::{AlertSink, SinkError};
use async_trait::async_trait;
use tracing::info;

/// Writes alerts to the log. Used when no remote channel is configured.
#[derive(Debug, Default)]
pub struct LogSink;

impl LogSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AlertSink for LogSink {
    async fn notify(&self, text: &str) -> Result<(), SinkError> {
        info!(target: "alerts", "{}", text);
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}
