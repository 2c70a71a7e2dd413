//! Console logging middleware - prints incoming updates, one line each

use async_trait::async_trait;
use std::sync::Arc;

use crate::batch::{self, Inbound};
use crate::entry::{Direction, LogEntry};
use crate::formatter;
use crate::middleware::types::{CallContext, Middleware, MiddlewareOutcome, MiddlewarePriority};
use crate::registry::Loggable;
use crate::sink::{ConsoleSink, LogSink};

pub struct ConsoleLoggingMiddleware {
    app_name: String,
    host: String,
    sink: Arc<dyn LogSink>,
}

impl ConsoleLoggingMiddleware {
    /// Print to standard output
    pub fn new(app_name: impl Into<String>, host: impl Into<String>) -> Self {
        Self::with_sink(app_name, host, Arc::new(ConsoleSink::stdout()))
    }

    pub fn with_sink(
        app_name: impl Into<String>,
        host: impl Into<String>,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            host: host.into(),
            sink,
        }
    }
}

#[async_trait]
impl Middleware for ConsoleLoggingMiddleware {
    fn id(&self) -> &str {
        "builtin.console_logging"
    }

    fn name(&self) -> &str {
        "Console Logging"
    }

    fn description(&self) -> &str {
        "Prints received updates to standard output"
    }

    fn priority(&self) -> MiddlewarePriority {
        MiddlewarePriority::Lowest
    }

    async fn on_request_result(&self, ctx: &CallContext<'_>) -> MiddlewareOutcome {
        let mut outcome = MiddlewareOutcome::default();

        let Some(response) = ctx.result else {
            return outcome;
        };
        if !batch::is_batch_call(ctx.call) {
            return outcome;
        }

        let updates = match batch::expand(ctx.call, response) {
            Ok(Inbound::Batch(updates)) => updates,
            Ok(Inbound::Single(_)) => return outcome,
            Err(e) => {
                log::warn!("[CONSOLE_LOG] Cannot expand {} result: {}", ctx.call.method(), e);
                outcome.fail(e);
                return outcome;
            }
        };

        for update in updates {
            let label = update.descriptor().label;
            let line = match formatter::format_update(update) {
                Ok(line) => line,
                Err(e) => {
                    log::info!("[CONSOLE_LOG] Skipping update {}: {}", update.update_id, e);
                    outcome.skip();
                    continue;
                }
            };
            let entry = LogEntry::new(&self.app_name, &self.host, Direction::In, label, line);
            outcome.record(self.sink.write(&entry));
        }

        outcome
    }
}
