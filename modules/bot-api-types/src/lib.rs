//! Shared Bot API types observed by the logging middlewares.
//!
//! Calls, results and updates are closed sum types: a new update kind or call
//! has to be added here before anything downstream can log it.

pub mod chat;
pub mod message;
pub mod requests;
pub mod response;
pub mod update;

pub use chat::{Chat, ChatType, User};
pub use message::{Message, MessageContent, MessageId};
pub use requests::{ApiCall, ApiCallType};
pub use response::{ApiResponse, ApiResponseType, File};
pub use update::{Update, UpdateKind, UpdateType};
