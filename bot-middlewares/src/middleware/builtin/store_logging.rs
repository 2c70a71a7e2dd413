//! Store logging middleware - writes every request and result to the log store
//!
//! Requests are written as `OUT` entries with every field, results as `IN`
//! entries without nulls. Polling results are split so that each update
//! becomes its own row.

use async_trait::async_trait;
use bot_api_types::ApiCall;
use std::sync::Arc;

use crate::batch::{self, Inbound};
use crate::entry::{Direction, LogEntry};
use crate::error::LogError;
use crate::middleware::types::{CallContext, Middleware, MiddlewareOutcome, MiddlewarePriority};
use crate::registry::{self, Loggable};
use crate::serializer;
use crate::sink::LogSink;

pub struct StoreLoggingMiddleware {
    app_name: String,
    host: String,
    sink: Arc<dyn LogSink>,
}

impl StoreLoggingMiddleware {
    pub fn new(app_name: impl Into<String>, host: impl Into<String>, sink: Arc<dyn LogSink>) -> Self {
        Self {
            app_name: app_name.into(),
            host: host.into(),
            sink,
        }
    }

    fn log_event<T: Loggable + ?Sized>(&self, direction: Direction, event: &T) -> Result<(), LogError> {
        let serializer = serializer::resolve(event)?;
        let data = serializer.encode(event)?;
        let entry = LogEntry::new(&self.app_name, &self.host, direction, serializer.label(), data);
        self.sink.write(&entry)
    }

    fn log_inbound<T: Loggable + ?Sized>(
        &self,
        call: &ApiCall,
        event: &T,
        outcome: &mut MiddlewareOutcome,
    ) {
        let label = event.descriptor().label;
        if event.descriptor().excluded || event.is_binary() {
            log::debug!("[BOT_LOG] Skipping {} result {}", call.method(), label);
            outcome.skip();
            return;
        }
        if let Err(e) = self.log_event(Direction::In, event) {
            log::warn!("[BOT_LOG] Dropped IN {}: {}", label, e);
            outcome.fail(e);
            return;
        }
        outcome.record(Ok(()));
    }
}

#[async_trait]
impl Middleware for StoreLoggingMiddleware {
    fn id(&self) -> &str {
        "builtin.store_logging"
    }

    fn name(&self) -> &str {
        "Store Logging"
    }

    fn description(&self) -> &str {
        "Writes requests and results to the bot_log table"
    }

    fn priority(&self) -> MiddlewarePriority {
        MiddlewarePriority::Low
    }

    async fn on_request_result(&self, ctx: &CallContext<'_>) -> MiddlewareOutcome {
        let mut outcome = MiddlewareOutcome::default();
        let call = ctx.call;

        if registry::is_excluded(call) {
            outcome.skip();
        } else {
            match self.log_event(Direction::Out, call) {
                Ok(()) => outcome.record(Ok(())),
                Err(e) => {
                    log::warn!("[BOT_LOG] Dropped OUT {}: {}", call.descriptor().label, e);
                    outcome.fail(e);
                }
            }
        }

        let Some(response) = ctx.result else {
            return outcome;
        };

        match batch::expand(call, response) {
            Ok(Inbound::Batch(updates)) => {
                for update in updates {
                    self.log_inbound(call, update, &mut outcome);
                }
            }
            Ok(Inbound::Single(response)) => {
                if registry::is_excluded(call) {
                    outcome.skip();
                } else {
                    self.log_inbound(call, response, &mut outcome);
                }
            }
            Err(e) => {
                log::warn!("[BOT_LOG] Cannot expand {} result: {}", call.method(), e);
                outcome.fail(e);
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::middleware::MiddlewarePipeline;
    use crate::sink::memory::testing::{FlakySink, PanickingSink};
    use crate::sink::{LazyStoreSink, MemorySink, StoreSink};
    use bot_api_types::requests::{DownloadFile, GetMe, GetUpdates, SendMessage};
    use bot_api_types::{ApiResponse, Update};
    use serde_json::{Value, json};
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn store_config(url: Option<String>) -> Config {
        Config {
            bot_log_url: url,
            host: "h".to_string(),
            app_name: "bot".to_string(),
            pool_size: 4,
            console_logging: false,
            allowed_users: HashSet::new(),
        }
    }

    fn ctx<'a>(call: &'a ApiCall, result: Option<&'a ApiResponse>) -> CallContext<'a> {
        CallContext::new(call, result)
    }

    fn send_text() -> ApiCall {
        ApiCall::SendTextMessage(SendMessage {
            chat_id: 42,
            text: "hi".to_string(),
            parse_mode: None,
            disable_notification: false,
            reply_to_message_id: None,
            reply_markup: None,
        })
    }

    fn sent_message() -> ApiResponse {
        ApiResponse::Message(
            serde_json::from_value(json!({
                "message_id": 7,
                "date": 1700000000,
                "chat": {"id": 42, "type": "private", "first_name": "Ada"},
                "text": "hi"
            }))
            .unwrap(),
        )
    }

    fn mixed_updates() -> ApiResponse {
        let updates: Vec<Update> = serde_json::from_value(json!([
            {"update_id": 1, "message": {
                "message_id": 1, "date": 0,
                "chat": {"id": 5, "type": "private"},
                "from": {"id": 5, "first_name": "Bo"},
                "text": "hello"
            }},
            {"update_id": 2, "callback_query": {
                "id": "cb", "from": {"id": 5, "first_name": "Bo"},
                "chat_instance": "ci", "data": "ok"
            }},
            {"update_id": 3, "from_the_future": {"x": 1}}
        ]))
        .unwrap();
        ApiResponse::Updates(updates)
    }

    #[tokio::test]
    async fn test_excluded_call_writes_nothing() {
        let sink = Arc::new(MemorySink::new());
        let middleware = StoreLoggingMiddleware::new("bot", "h", sink.clone());

        let call = ApiCall::GetMe(GetMe {});
        let me = ApiResponse::User(serde_json::from_value(json!({"id": 1, "is_bot": true, "first_name": "B"})).unwrap());
        let outcome = middleware.on_request_result(&ctx(&call, Some(&me))).await;

        assert!(sink.is_empty());
        assert_eq!(outcome.skipped, 2);
    }

    #[tokio::test]
    async fn test_request_and_result() {
        let sink = Arc::new(MemorySink::new());
        let middleware = StoreLoggingMiddleware::new("shop-bot", "worker-1", sink.clone());

        let call = send_text();
        let result = sent_message();
        let outcome = middleware.on_request_result(&ctx(&call, Some(&result))).await;
        assert_eq!(outcome.written, 2);

        let entries = sink.entries();
        assert_eq!(entries[0].direction, Direction::Out);
        assert_eq!(entries[0].class_name, "SendTextMessage");
        assert_eq!(entries[0].app_name, "shop-bot");
        assert!(entries.iter().all(|e| e.host == "worker-1"));
        let out: Value = serde_json::from_str(&entries[0].data).unwrap();
        assert!(out["parse_mode"].is_null());
        assert!(out.as_object().unwrap().contains_key("parse_mode"));

        assert_eq!(entries[1].direction, Direction::In);
        assert_eq!(entries[1].class_name, "Message");
        assert!(!entries[1].data.contains("null"));
    }

    #[tokio::test]
    async fn test_failed_call_logs_only_request() {
        let sink = Arc::new(MemorySink::new());
        let middleware = StoreLoggingMiddleware::new("bot", "h", sink.clone());

        let call = send_text();
        middleware.on_request_result(&ctx(&call, None)).await;

        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].direction, Direction::Out);
    }

    #[tokio::test]
    async fn test_polling_result_is_split() {
        let sink = Arc::new(MemorySink::new());
        let middleware = StoreLoggingMiddleware::new("bot", "h", sink.clone());

        let call = ApiCall::GetUpdates(GetUpdates::default());
        let result = mixed_updates();
        let outcome = middleware.on_request_result(&ctx(&call, Some(&result))).await;

        let entries = sink.entries();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.direction == Direction::In));
        assert_eq!(entries[0].class_name, "MessageUpdate");
        assert_eq!(entries[1].class_name, "CallbackQueryUpdate");
        assert_eq!(outcome.failures.len(), 1);
        assert!(matches!(
            &outcome.failures[0],
            LogError::Serialization { type_name, .. } if type_name == "UnknownUpdate"
        ));
    }

    #[tokio::test]
    async fn test_binary_result_is_skipped() {
        let sink = Arc::new(MemorySink::new());
        let middleware = StoreLoggingMiddleware::new("bot", "h", sink.clone());

        let call = ApiCall::DownloadFile(DownloadFile { file_path: "photos/1.jpg".to_string() });
        let result = ApiResponse::Bytes(vec![0xff, 0xd8]);
        let outcome = middleware.on_request_result(&ctx(&call, Some(&result))).await;

        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].direction, Direction::Out);
        assert_eq!(outcome.skipped, 1);
    }

    #[tokio::test]
    async fn test_sink_failure_does_not_stop_the_batch() {
        let sink = Arc::new(FlakySink::failing_on([0]));
        let middleware = StoreLoggingMiddleware::new("bot", "h", sink.clone());

        let call = ApiCall::GetUpdates(GetUpdates::default());
        let result = mixed_updates();
        let outcome = middleware.on_request_result(&ctx(&call, Some(&result))).await;

        assert_eq!(sink.attempts(), 2);
        assert_eq!(sink.accepted.entries()[0].class_name, "CallbackQueryUpdate");
        assert_eq!(outcome.written, 1);
        assert_eq!(outcome.failures.len(), 2);
    }

    #[tokio::test]
    async fn test_unconfigured_store() {
        let sink = LazyStoreSink::new(store_config(None));
        let middleware = StoreLoggingMiddleware::new("bot", "h", Arc::new(sink));

        let call = send_text();
        let first = middleware.on_request_result(&ctx(&call, None)).await;
        assert!(first.failures[0].is_configuration());

        let result = sent_message();
        let second = middleware.on_request_result(&ctx(&call, Some(&result))).await;
        assert_eq!(second.failures.len(), 2);
        assert!(second.failures.iter().all(LogError::is_configuration));
    }

    #[tokio::test]
    async fn test_rows_reach_the_store() {
        let store = StoreSink::open(":memory:", 1).unwrap();
        store.ensure_schema().unwrap();
        let store = Arc::new(store);
        let middleware = StoreLoggingMiddleware::new("bot", "worker-1", store.clone());

        let call = send_text();
        let result = sent_message();
        middleware.on_request_result(&ctx(&call, Some(&result))).await;

        let rows = store.recent_entries(10).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.host == "worker-1"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_calls_share_one_store() {
        const CALLS: usize = 16;
        let dir = TempDir::new().unwrap();
        let url = dir.path().join("bot_log.db").display().to_string();
        let store = Arc::new(LazyStoreSink::new(store_config(Some(url))));

        let pipeline = Arc::new(MiddlewarePipeline::new());
        pipeline.register(Arc::new(StoreLoggingMiddleware::new("bot", "worker-1", store.clone())));

        let tasks: Vec<_> = (0..CALLS)
            .map(|_| {
                let pipeline = pipeline.clone();
                tokio::spawn(async move {
                    let call = send_text();
                    let result = sent_message();
                    pipeline.on_request_result(&call, Some(&result)).await
                })
            })
            .collect();
        for task in tasks {
            let report = task.await.unwrap();
            assert_eq!(report.written(), 2);
            assert_eq!(report.failures(), 0);
        }

        assert_eq!(store.connect_attempts(), 1);
        let rows = store.store().unwrap().recent_entries(CALLS * 4).unwrap();
        assert_eq!(rows.len(), 2 * CALLS);
        let outgoing = rows.iter().filter(|e| e.direction == Direction::Out).count();
        assert_eq!(outgoing, CALLS);
        assert!(rows.iter().all(|e| e.host == "worker-1"));
    }

    #[tokio::test]
    #[should_panic(expected = "sink exploded")]
    async fn test_sink_panic_propagates_to_pipeline() {
        let middleware = StoreLoggingMiddleware::new("bot", "h", Arc::new(PanickingSink));
        let call = send_text();
        middleware.on_request_result(&ctx(&call, None)).await;
    }
}
