//! Middlewares that record Telegram Bot API traffic.
//!
//! Every request the bot sends and every result it receives can be written to
//! a SQL log store (`bot_log` table) and, for polled updates, printed to the
//! console. Logging never affects the call being logged.

pub mod access;
pub mod batch;
pub mod config;
pub mod entry;
pub mod error;
pub mod formatter;
pub mod middleware;
pub mod registry;
pub mod replay;
pub mod serializer;
pub mod sink;

pub use access::{AccessDenied, AccessList};
pub use config::Config;
pub use entry::{Direction, LogEntry};
pub use error::LogError;
pub use middleware::{create_default_pipeline, MiddlewarePipeline, PipelineReport};
pub use sink::{ConsoleSink, LazyStoreSink, LogSink, MemorySink, StoreSink};
