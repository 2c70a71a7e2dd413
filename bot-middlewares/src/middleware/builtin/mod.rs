//! Built-in middlewares
//!
//! - Store logging: requests and results into the `bot_log` table
//! - Console logging: received updates to standard output

mod console_logging;
mod store_logging;

pub use console_logging::ConsoleLoggingMiddleware;
pub use store_logging::StoreLoggingMiddleware;
