//! Middleware system for observing Bot API traffic
//!
//! The host calls [`MiddlewarePipeline::on_request_result`] once per finished
//! call. Each registered middleware turns the call and its result into log
//! entries; none of them can fail the call.
//!
//! # Example
//!
//! ```rust,ignore
//! let config = Config::from_env();
//! let pipeline = create_default_pipeline(&config)?;
//!
//! let result = client.execute(&call).await.ok();
//! pipeline.on_request_result(&call, result.as_ref()).await;
//! ```

pub mod builtin;
mod pipeline;
mod types;

use std::sync::Arc;

pub use pipeline::{MiddlewarePipeline, PipelineReport};
pub use types::{
    BoxedMiddleware, CallContext, Middleware, MiddlewareOutcome, MiddlewarePriority,
    MiddlewareStats,
};

use crate::config::Config;
use crate::error::LogError;
use crate::sink::StoreSink;
use builtin::{ConsoleLoggingMiddleware, StoreLoggingMiddleware};

/// Pipeline with the store middleware and, unless disabled, the console one.
///
/// Fails when the log store cannot be opened.
pub fn create_default_pipeline(config: &Config) -> Result<MiddlewarePipeline, LogError> {
    let store = StoreSink::from_config(config)?;
    let pipeline = MiddlewarePipeline::new();

    pipeline.register(Arc::new(StoreLoggingMiddleware::new(
        config.app_name.clone(),
        config.host.clone(),
        Arc::new(store),
    )));
    if config.console_logging {
        pipeline.register(Arc::new(ConsoleLoggingMiddleware::new(
            config.app_name.clone(),
            config.host.clone(),
        )));
    }

    Ok(pipeline)
}
