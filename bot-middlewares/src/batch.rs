//! Splits a polling result into the updates it carries.

use bot_api_types::{ApiCall, ApiResponse, Update};

use crate::error::LogError;
use crate::registry::Loggable;

/// What an inbound result should be logged as
#[derive(Debug, Clone, Copy)]
pub enum Inbound<'a> {
    /// Each update is an independent event
    Batch(&'a [Update]),
    Single(&'a ApiResponse),
}

impl<'a> Inbound<'a> {
    /// Number of events the result expands to
    pub fn len(&self) -> usize {
        match self {
            Inbound::Batch(updates) => updates.len(),
            Inbound::Single(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn is_batch_call(call: &ApiCall) -> bool {
    matches!(call, ApiCall::GetUpdates(_))
}

/// A polling call whose result is not an update list cannot be expanded and
/// yields an error instead of a single entry.
pub fn expand<'a>(call: &ApiCall, response: &'a ApiResponse) -> Result<Inbound<'a>, LogError> {
    if !is_batch_call(call) {
        return Ok(Inbound::Single(response));
    }
    match response {
        ApiResponse::Updates(updates) => Ok(Inbound::Batch(updates)),
        other => Err(LogError::Serialization {
            type_name: other.descriptor().label.to_string(),
            reason: format!("{} result is not an update list", call.method()),
        }),
    }
}
