//! MiddlewarePipeline - registration and execution of middlewares
//!
//! The pipeline is the only thing the host calls. It runs every enabled
//! middleware in priority order, records statistics, and absorbs whatever
//! goes wrong, panics included: the host's call has already completed and
//! logging must not change its outcome.

use bot_api_types::{ApiCall, ApiResponse};
use dashmap::DashMap;
use futures_util::FutureExt;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use super::types::{BoxedMiddleware, CallContext, MiddlewareOutcome, MiddlewareStats};

/// What happened during one pipeline run, returned for inspection only
#[derive(Debug, Default)]
pub struct PipelineReport {
    /// Outcome per middleware id, in execution order
    pub outcomes: Vec<(String, MiddlewareOutcome)>,
    /// Middlewares that panicked
    pub panicked: Vec<String>,
}

impl PipelineReport {
    pub fn written(&self) -> usize {
        self.outcomes.iter().map(|(_, o)| o.written).sum()
    }

    pub fn failures(&self) -> usize {
        self.outcomes.iter().map(|(_, o)| o.failures.len()).sum()
    }

    pub fn outcome(&self, id: &str) -> Option<&MiddlewareOutcome> {
        self.outcomes.iter().find(|(i, _)| i == id).map(|(_, o)| o)
    }
}

pub struct MiddlewarePipeline {
    middlewares: DashMap<String, BoxedMiddleware>,
    /// Ids sorted by priority
    order: RwLock<Vec<String>>,
    stats: DashMap<String, MiddlewareStats>,
}

impl MiddlewarePipeline {
    pub fn new() -> Self {
        Self {
            middlewares: DashMap::new(),
            order: RwLock::new(Vec::new()),
            stats: DashMap::new(),
        }
    }

    /// Register a middleware. A middleware with the same id is replaced.
    pub fn register(&self, middleware: BoxedMiddleware) {
        let id = middleware.id().to_string();
        let name = middleware.name().to_string();

        if self.middlewares.insert(id.clone(), middleware).is_none() {
            self.order.write().push(id.clone());
        }
        self.sort_by_priority();
        self.stats.insert(id, MiddlewareStats::default());

        log::info!("[MIDDLEWARES] Registered middleware: {}", name);
    }

    pub fn unregister(&self, id: &str) {
        if self.middlewares.remove(id).is_some() {
            self.order.write().retain(|m| m != id);
            self.stats.remove(id);
            log::debug!("[MIDDLEWARES] Unregistered middleware: {}", id);
        }
    }

    fn sort_by_priority(&self) {
        let middlewares = &self.middlewares;
        // Stable sort keeps registration order within a priority
        self.order.write().sort_by_key(|id| {
            middlewares
                .get(id)
                .map(|m| m.priority() as i32)
                .unwrap_or(i32::MAX)
        });
    }

    /// Hand a finished call to every middleware.
    ///
    /// `result` is `None` when the call failed. Never fails.
    pub async fn on_request_result(
        &self,
        call: &ApiCall,
        result: Option<&ApiResponse>,
    ) -> PipelineReport {
        let ids: Vec<String> = self.order.read().clone();
        let ctx = CallContext::new(call, result);
        let mut report = PipelineReport::default();

        for id in ids {
            let middleware = match self.middlewares.get(&id) {
                Some(m) => m.clone(),
                None => continue,
            };
            if !middleware.enabled() {
                continue;
            }

            let start = Instant::now();
            let run = AssertUnwindSafe(middleware.on_request_result(&ctx))
                .catch_unwind()
                .await;
            let duration_ms = start.elapsed().as_millis() as u64;

            match run {
                Ok(outcome) => {
                    for failure in &outcome.failures {
                        log::warn!(
                            "[MIDDLEWARES] {} dropped an event of {}: {}",
                            id,
                            call.method(),
                            failure
                        );
                    }
                    if let Some(mut stats) = self.stats.get_mut(&id) {
                        stats.record_execution(duration_ms, &outcome);
                    }
                    log::debug!(
                        "[MIDDLEWARES] {} handled {} in {}ms: {} written, {} skipped",
                        id,
                        call.method(),
                        duration_ms,
                        outcome.written,
                        outcome.skipped
                    );
                    report.outcomes.push((id, outcome));
                }
                Err(_) => {
                    log::error!("[MIDDLEWARES] {} panicked while handling {}", id, call.method());
                    if let Some(mut stats) = self.stats.get_mut(&id) {
                        stats.record_panic(duration_ms);
                    }
                    report.panicked.push(id);
                }
            }
        }

        report
    }

    pub fn get_stats(&self, id: &str) -> Option<MiddlewareStats> {
        self.stats.get(id).map(|s| s.clone())
    }

    pub fn get_all_stats(&self) -> HashMap<String, MiddlewareStats> {
        self.stats
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Registered ids in execution order
    pub fn middleware_ids(&self) -> Vec<String> {
        self.order.read().clone()
    }

    pub fn middleware_count(&self) -> usize {
        self.middlewares.len()
    }
}

impl Default for MiddlewarePipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LogError;
    use crate::middleware::types::{Middleware, MiddlewarePriority};
    use async_trait::async_trait;
    use bot_api_types::requests::SendDice;
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct TestMiddleware {
        id: String,
        priority: MiddlewarePriority,
        seen: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    #[async_trait]
    impl Middleware for TestMiddleware {
        fn id(&self) -> &str {
            &self.id
        }

        fn name(&self) -> &str {
            &self.id
        }

        fn priority(&self) -> MiddlewarePriority {
            self.priority
        }

        async fn on_request_result(&self, _ctx: &CallContext<'_>) -> MiddlewareOutcome {
            self.seen.lock().push(self.id.clone());
            let mut outcome = MiddlewareOutcome::default();
            if self.fail {
                outcome.fail(LogError::Persistence("down".into()));
            } else {
                outcome.record(Ok(()));
            }
            outcome
        }
    }

    struct PanickingMiddleware;

    #[async_trait]
    impl Middleware for PanickingMiddleware {
        fn id(&self) -> &str {
            "panicking"
        }

        fn name(&self) -> &str {
            "Panicking"
        }

        fn priority(&self) -> MiddlewarePriority {
            MiddlewarePriority::Critical
        }

        async fn on_request_result(&self, _ctx: &CallContext<'_>) -> MiddlewareOutcome {
            panic!("boom");
        }
    }

    fn test_middleware(
        id: &str,
        priority: MiddlewarePriority,
        seen: &Arc<Mutex<Vec<String>>>,
        fail: bool,
    ) -> Arc<TestMiddleware> {
        Arc::new(TestMiddleware {
            id: id.to_string(),
            priority,
            seen: seen.clone(),
            fail,
        })
    }

    fn dice() -> ApiCall {
        ApiCall::SendDice(SendDice { chat_id: 1, emoji: None })
    }

    #[tokio::test]
    async fn test_registration() {
        let pipeline = MiddlewarePipeline::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        pipeline.register(test_middleware("a", MiddlewarePriority::Normal, &seen, false));
        pipeline.register(test_middleware("a", MiddlewarePriority::Normal, &seen, false));
        assert_eq!(pipeline.middleware_count(), 1);
        assert_eq!(pipeline.middleware_ids(), vec!["a".to_string()]);

        pipeline.unregister("a");
        assert_eq!(pipeline.middleware_count(), 0);
        assert!(pipeline.get_stats("a").is_none());
    }

    #[tokio::test]
    async fn test_priority_order() {
        let pipeline = MiddlewarePipeline::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        pipeline.register(test_middleware("late", MiddlewarePriority::Low, &seen, false));
        pipeline.register(test_middleware("early", MiddlewarePriority::High, &seen, false));

        pipeline.on_request_result(&dice(), None).await;
        assert_eq!(*seen.lock(), vec!["early".to_string(), "late".to_string()]);
    }

    #[tokio::test]
    async fn test_failures_are_contained() {
        let pipeline = MiddlewarePipeline::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        pipeline.register(test_middleware("broken", MiddlewarePriority::High, &seen, true));
        pipeline.register(test_middleware("fine", MiddlewarePriority::Low, &seen, false));

        let report = pipeline.on_request_result(&dice(), None).await;
        assert_eq!(report.failures(), 1);
        assert_eq!(report.written(), 1);
        assert_eq!(pipeline.get_stats("broken").unwrap().failures, 1);
        assert_eq!(pipeline.get_stats("fine").unwrap().written, 1);
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let pipeline = MiddlewarePipeline::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        pipeline.register(Arc::new(PanickingMiddleware));
        pipeline.register(test_middleware("after", MiddlewarePriority::Low, &seen, false));

        let report = pipeline.on_request_result(&dice(), None).await;
        assert_eq!(report.panicked, vec!["panicking".to_string()]);
        assert_eq!(*seen.lock(), vec!["after".to_string()]);
        assert_eq!(pipeline.get_stats("panicking").unwrap().panics, 1);

        // Still usable afterwards
        let report = pipeline.on_request_result(&dice(), None).await;
        assert_eq!(report.written(), 1);
    }
}
