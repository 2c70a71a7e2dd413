//! Middleware types and traits
//!
//! A middleware observes every Bot API call the host makes, together with its
//! result, and turns it into log entries. It never influences the call.

use async_trait::async_trait;
use bot_api_types::{ApiCall, ApiResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::LogError;

/// What the host hands to every middleware after a call returns
#[derive(Debug, Clone, Copy)]
pub struct CallContext<'a> {
    pub call: &'a ApiCall,
    /// `None` when the call failed or returned nothing
    pub result: Option<&'a ApiResponse>,
}

impl<'a> CallContext<'a> {
    pub fn new(call: &'a ApiCall, result: Option<&'a ApiResponse>) -> Self {
        Self { call, result }
    }
}

/// Per-invocation summary returned by a middleware
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MiddlewareOutcome {
    /// Entries accepted by the sink
    pub written: usize,
    /// Events deliberately not logged (excluded or binary)
    pub skipped: usize,
    /// Events dropped because of an error
    pub failures: Vec<LogError>,
}

impl MiddlewareOutcome {
    pub fn record(&mut self, result: Result<(), LogError>) {
        match result {
            Ok(()) => self.written += 1,
            Err(e) => self.failures.push(e),
        }
    }

    pub fn skip(&mut self) {
        self.skipped += 1;
    }

    pub fn fail(&mut self, error: LogError) {
        self.failures.push(error);
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Execution order, lower runs first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MiddlewarePriority {
    /// Access checks
    Critical = 0,
    High = 100,
    Normal = 500,
    /// Logging
    Low = 900,
    Lowest = 1000,
}

impl Default for MiddlewarePriority {
    fn default() -> Self {
        MiddlewarePriority::Normal
    }
}

#[async_trait]
pub trait Middleware: Send + Sync {
    /// Unique identifier for this middleware
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    fn priority(&self) -> MiddlewarePriority {
        MiddlewarePriority::Normal
    }

    fn enabled(&self) -> bool {
        true
    }

    /// Handle one finished call. Must not fail: problems go into the outcome.
    async fn on_request_result(&self, ctx: &CallContext<'_>) -> MiddlewareOutcome;
}

/// Counters kept by the pipeline for each middleware
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MiddlewareStats {
    pub invocations: u64,
    pub written: u64,
    pub skipped: u64,
    pub failures: u64,
    /// Invocations that panicked
    pub panics: u64,
    pub avg_execution_ms: f64,
    pub max_execution_ms: u64,
}

impl MiddlewareStats {
    pub fn record_execution(&mut self, duration_ms: u64, outcome: &MiddlewareOutcome) {
        self.invocations += 1;

        let total = self.avg_execution_ms * (self.invocations - 1) as f64;
        self.avg_execution_ms = (total + duration_ms as f64) / self.invocations as f64;

        if duration_ms > self.max_execution_ms {
            self.max_execution_ms = duration_ms;
        }

        self.written += outcome.written as u64;
        self.skipped += outcome.skipped as u64;
        self.failures += outcome.failures.len() as u64;
    }

    pub fn record_panic(&mut self, duration_ms: u64) {
        self.record_execution(duration_ms, &MiddlewareOutcome::default());
        self.panics += 1;
    }
}

pub type BoxedMiddleware = Arc<dyn Middleware>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_record() {
        let mut outcome = MiddlewareOutcome::default();
        outcome.record(Ok(()));
        outcome.record(Err(LogError::Persistence("down".into())));
        outcome.skip();
        assert_eq!(outcome.written, 1);
        assert_eq!(outcome.skipped, 1);
        assert!(!outcome.is_clean());
    }

    #[test]
    fn test_stats_average() {
        let mut stats = MiddlewareStats::default();
        let outcome = MiddlewareOutcome { written: 2, skipped: 1, failures: vec![] };
        stats.record_execution(10, &outcome);
        stats.record_execution(20, &outcome);
        stats.record_panic(30);

        assert_eq!(stats.invocations, 3);
        assert_eq!(stats.written, 4);
        assert_eq!(stats.panics, 1);
        assert_eq!(stats.max_execution_ms, 30);
        assert!((stats.avg_execution_ms - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_priority_order() {
        assert!(MiddlewarePriority::Critical < MiddlewarePriority::Low);
        assert_eq!(MiddlewarePriority::default(), MiddlewarePriority::Normal);
    }
}
