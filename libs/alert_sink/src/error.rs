/// Errors produced while delivering an alert
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SinkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Send failed: {error} (status: {status:?})")]
    SendFailed { error: String, status: Option<u16> },

    /// The remote end accepted the request but refused the alert
    #[error("Alert rejected: {0}")]
    Rejected(String),

    /// Rejected locally without calling the sink
    #[error("Circuit breaker is open for {sink}, retry in {retry_after_ms} ms")]
    CircuitOpen { sink: String, retry_after_ms: u64 },

    #[error("Timeout after {0} ms")]
    Timeout(u64),

    #[error("Sink closed")]
    Closed,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SinkError {
    /// Check if another attempt might succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            SinkError::ConnectionFailed(_)
            | SinkError::CircuitOpen { .. }
            | SinkError::Timeout(_) => true,
            // 429 and server errors are worth retrying, other statuses are not
            SinkError::SendFailed { status, .. } => match status {
                Some(code) => *code == 429 || *code >= 500,
                None => true,
            },
            SinkError::Rejected(_) | SinkError::Closed | SinkError::InvalidConfig(_) => false,
        }
    }

    pub fn connection_failed(msg: impl Into<String>) -> Self {
        SinkError::ConnectionFailed(msg.into())
    }

    pub fn send_failed(msg: impl Into<String>) -> Self {
        SinkError::SendFailed {
            error: msg.into(),
            status: None,
        }
    }

    pub fn http_status(msg: impl Into<String>, status: u16) -> Self {
        SinkError::SendFailed {
            error: msg.into(),
            status: Some(status),
        }
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        SinkError::InvalidConfig(msg.into())
    }
}

impl From<reqwest::Error> for SinkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SinkError::Timeout(0)
        } else if err.is_connect() {
            SinkError::ConnectionFailed(err.to_string())
        } else {
            SinkError::SendFailed {
                error: err.to_string(),
                status: err.status().map(|s| s.as_u16()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverability() {
        assert!(SinkError::connection_failed("refused").is_recoverable());
        assert!(SinkError::http_status("rate limited", 429).is_recoverable());
        assert!(SinkError::http_status("bad gateway", 502).is_recoverable());
        assert!(!SinkError::http_status("bad request", 400).is_recoverable());
        assert!(!SinkError::Rejected("chat not found".into()).is_recoverable());
        assert!(!SinkError::Closed.is_recoverable());
    }
}
