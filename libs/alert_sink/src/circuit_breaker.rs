//! Circuit Breaker for AlertSink
//!
//! Stops hammering a failing alert destination and lets it recover.
//!
//! ```text
//! CLOSED ──failure_threshold──> OPEN ──timeout──> HALF_OPEN
//!   │                            │                   │
//!   └──────────────── success ───┴─── failure ──────┘
//! ```
//!
//! - **CLOSED**: Normal operation, alerts pass through
//! - **OPEN**: Sink is failing, alerts fail immediately with `CircuitOpen`
//! - **HALF_OPEN**: Probing recovery with a limited number of calls

use crate::{AlertSink, SinkError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn is_closed(&self) -> bool {
        matches!(self, CircuitState::Closed)
    }

    pub fn is_open(&self) -> bool {
        matches!(self, CircuitState::Open)
    }

    pub fn is_half_open(&self) -> bool {
        matches!(self, CircuitState::HalfOpen)
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before opening the circuit
    pub failure_threshold: usize,
    /// Wait before probing again (OPEN -> HALF_OPEN)
    pub recovery_timeout: Duration,
    /// Successes needed in half-open to close the circuit
    pub success_threshold: usize,
    /// Calls allowed through while half-open
    pub half_open_max_calls: usize,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(30),
            success_threshold: 1,
            half_open_max_calls: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerStats {
    pub current_state: CircuitState,
    pub consecutive_failures: usize,
    pub total_calls: u64,
    pub total_failures: u64,
    pub total_successes: u64,
    pub calls_rejected: u64,
    pub state_changed_at: Instant,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    consecutive_failures: usize,
    consecutive_successes: usize,
    half_open_calls: usize,
    opened_at: Option<Instant>,
    state_changed_at: Instant,
}

impl BreakerState {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            consecutive_successes: 0,
            half_open_calls: 0,
            opened_at: None,
            state_changed_at: Instant::now(),
        }
    }

    fn transition_to(&mut self, new_state: CircuitState, sink: &str) {
        if self.state == new_state {
            return;
        }

        tracing::info!(
            sink = sink,
            "Circuit breaker state transition: {:?} -> {:?}",
            self.state,
            new_state
        );
        self.state = new_state;
        self.state_changed_at = Instant::now();

        match new_state {
            CircuitState::Closed => {
                self.consecutive_failures = 0;
                self.half_open_calls = 0;
                self.opened_at = None;
            }
            CircuitState::Open => {
                self.consecutive_successes = 0;
                self.half_open_calls = 0;
                self.opened_at = Some(Instant::now());
            }
            CircuitState::HalfOpen => {
                self.consecutive_successes = 0;
                self.half_open_calls = 0;
            }
        }
    }
}

/// Wraps an [`AlertSink`] with circuit breaker protection
#[derive(Debug)]
pub struct CircuitBreakerSink<T: AlertSink> {
    inner: T,
    config: CircuitBreakerConfig,
    state: RwLock<BreakerState>,
    total_calls: AtomicU64,
    total_failures: AtomicU64,
    total_successes: AtomicU64,
    calls_rejected: AtomicU64,
}

impl<T: AlertSink> CircuitBreakerSink<T> {
    pub fn new(inner: T, config: CircuitBreakerConfig) -> Self {
        Self {
            inner,
            config,
            state: RwLock::new(BreakerState::new()),
            total_calls: AtomicU64::new(0),
            total_failures: AtomicU64::new(0),
            total_successes: AtomicU64::new(0),
            calls_rejected: AtomicU64::new(0),
        }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub async fn stats(&self) -> CircuitBreakerStats {
        let guard = self.state.read().await;
        CircuitBreakerStats {
            current_state: guard.state,
            consecutive_failures: guard.consecutive_failures,
            total_calls: self.total_calls.load(Ordering::Relaxed),
            total_failures: self.total_failures.load(Ordering::Relaxed),
            total_successes: self.total_successes.load(Ordering::Relaxed),
            calls_rejected: self.calls_rejected.load(Ordering::Relaxed),
            state_changed_at: guard.state_changed_at,
        }
    }

    /// Force a state (for testing)
    pub async fn force_state(&self, state: CircuitState) {
        let mut guard = self.state.write().await;
        guard.transition_to(state, self.inner.name());
    }

    /// `Err` carries how long until the breaker will let a trial call through
    async fn admit(&self) -> Result<(), Duration> {
        let mut guard = self.state.write().await;

        match guard.state {
            CircuitState::Closed => Ok(()),
            CircuitState::Open => {
                let remaining = guard
                    .opened_at
                    .map(|at| self.config.recovery_timeout.saturating_sub(at.elapsed()))
                    .unwrap_or(Duration::ZERO);
                if remaining.is_zero() {
                    guard.transition_to(CircuitState::HalfOpen, self.inner.name());
                    guard.half_open_calls += 1;
                    Ok(())
                } else {
                    Err(remaining)
                }
            }
            CircuitState::HalfOpen => {
                if guard.half_open_calls < self.config.half_open_max_calls {
                    guard.half_open_calls += 1;
                    Ok(())
                } else {
                    // Probe in flight elsewhere
                    Err(Duration::ZERO)
                }
            }
        }
    }

    async fn record_result(&self, success: bool) {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        if success {
            self.total_successes.fetch_add(1, Ordering::Relaxed);
        } else {
            self.total_failures.fetch_add(1, Ordering::Relaxed);
        }

        let mut guard = self.state.write().await;
        let name = self.inner.name();

        if success {
            guard.consecutive_failures = 0;
            guard.consecutive_successes += 1;
            if guard.state.is_half_open()
                && guard.consecutive_successes >= self.config.success_threshold
            {
                guard.transition_to(CircuitState::Closed, name);
            }
        } else {
            guard.consecutive_successes = 0;
            guard.consecutive_failures += 1;
            match guard.state {
                CircuitState::Closed => {
                    if guard.consecutive_failures >= self.config.failure_threshold {
                        guard.transition_to(CircuitState::Open, name);
                    }
                }
                // A failed trial call reopens immediately
                CircuitState::HalfOpen => guard.transition_to(CircuitState::Open, name),
                CircuitState::Open => guard.opened_at = Some(Instant::now()),
            }
        }
    }
}

#[async_trait]
impl<T: AlertSink> AlertSink for CircuitBreakerSink<T> {
    async fn notify(&self, text: &str) -> Result<(), SinkError> {
        if let Err(retry_after) = self.admit().await {
            self.calls_rejected.fetch_add(1, Ordering::Relaxed);
            return Err(SinkError::CircuitOpen {
                sink: self.inner.name().to_string(),
                retry_after_ms: retry_after.as_millis() as u64,
            });
        }

        let result = self.inner.notify(text).await;
        match &result {
            Ok(()) => self.record_result(true).await,
            // A refused alert says nothing about the sink's health
            Err(e) if e.is_recoverable() => self.record_result(false).await,
            Err(_) => {}
        }
        result
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{CollectorSink, FailingSink};
    use tokio::time::sleep;

    fn quick_config() -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: 2,
            recovery_timeout: Duration::from_millis(50),
            success_threshold: 1,
            half_open_max_calls: 1,
        }
    }

    #[tokio::test]
    async fn test_opens_after_threshold() {
        let breaker = CircuitBreakerSink::new(FailingSink::default(), quick_config());

        assert!(breaker.notify("a").await.is_err());
        assert!(breaker.stats().await.current_state.is_closed());
        assert!(breaker.notify("b").await.is_err());
        assert!(breaker.stats().await.current_state.is_open());

        let err = breaker.notify("c").await.unwrap_err();
        assert!(matches!(err, SinkError::CircuitOpen { retry_after_ms, .. } if retry_after_ms <= 50));
        assert_eq!(breaker.stats().await.calls_rejected, 1);
        assert_eq!(breaker.inner().attempts(), 2);
    }

    #[tokio::test]
    async fn test_half_open_success_closes() {
        let sink = CollectorSink::new();
        sink.fail_next(2);
        let breaker = CircuitBreakerSink::new(sink, quick_config());

        let _ = breaker.notify("a").await;
        let _ = breaker.notify("b").await;
        assert!(breaker.stats().await.current_state.is_open());

        sleep(Duration::from_millis(80)).await;

        breaker.notify("c").await.unwrap();
        let stats = breaker.stats().await;
        assert!(stats.current_state.is_closed());
        assert_eq!(stats.total_successes, 1);
        assert_eq!(breaker.inner().received(), vec!["c".to_string()]);
    }

    #[tokio::test]
    async fn test_half_open_failure_reopens() {
        let breaker = CircuitBreakerSink::new(FailingSink::default(), quick_config());
        breaker.force_state(CircuitState::Open).await;

        sleep(Duration::from_millis(80)).await;

        assert!(matches!(
            breaker.notify("retry").await,
            Err(SinkError::SendFailed { .. })
        ));
        assert!(breaker.stats().await.current_state.is_open());
    }

    #[tokio::test]
    async fn test_rejected_alerts_do_not_open_circuit() {
        let sink = FailingSink::new(SinkError::Rejected("message is too long".into()));
        let breaker = CircuitBreakerSink::new(sink, quick_config());

        for text in ["a", "b", "c"] {
            assert!(matches!(
                breaker.notify(text).await,
                Err(SinkError::Rejected(_))
            ));
        }

        let stats = breaker.stats().await;
        assert!(stats.current_state.is_closed());
        assert_eq!(stats.consecutive_failures, 0);
        assert_eq!(stats.calls_rejected, 0);
        assert_eq!(breaker.inner().attempts(), 3);
    }

    #[tokio::test]
    async fn test_open_circuit_reports_time_until_retry() {
        let config = CircuitBreakerConfig {
            recovery_timeout: Duration::from_secs(30),
            ..quick_config()
        };
        let breaker = CircuitBreakerSink::new(FailingSink::default(), config);
        breaker.force_state(CircuitState::Open).await;

        match breaker.notify("a").await {
            Err(SinkError::CircuitOpen { retry_after_ms, .. }) => {
                assert!(retry_after_ms > 29_000 && retry_after_ms <= 30_000)
            }
            other => panic!("expected CircuitOpen, got {:?}", other),
        }
        assert_eq!(breaker.inner().attempts(), 0);
    }
}
