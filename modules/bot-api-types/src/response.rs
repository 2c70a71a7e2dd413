//! Successful results of Bot API calls.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{EnumDiscriminants, EnumIter, IntoStaticStr};

use crate::chat::{Chat, User};
use crate::message::{Message, MessageId};
use crate::update::{ChatMember, Update};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
    pub file_id: String,
    pub file_unique_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, EnumDiscriminants)]
#[strum_discriminants(name(ApiResponseType), derive(Hash, EnumIter, IntoStaticStr))]
pub enum ApiResponse {
    /// Result of `getUpdates`: a batch of independent updates
    Updates(Vec<Update>),
    Message(Message),
    MessageId(MessageId),
    User(User),
    Chat(Chat),
    ChatMember(ChatMember),
    File(File),
    Bool(bool),
    /// Raw binary content (file downloads)
    Bytes(Vec<u8>),
    /// Any other JSON result
    Json(Value),
}

impl ApiResponse {
    pub fn response_type(&self) -> ApiResponseType {
        ApiResponseType::from(self)
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, ApiResponse::Bytes(_))
    }

    /// JSON form of the result. Binary content has none.
    pub fn payload(&self) -> Option<serde_json::Result<Value>> {
        use serde_json::to_value;
        let value = match self {
            ApiResponse::Updates(updates) => to_value(updates),
            ApiResponse::Message(m) => to_value(m),
            ApiResponse::MessageId(id) => to_value(id),
            ApiResponse::User(u) => to_value(u),
            ApiResponse::Chat(c) => to_value(c),
            ApiResponse::ChatMember(m) => to_value(m),
            ApiResponse::File(f) => to_value(f),
            ApiResponse::Bool(b) => Ok(Value::Bool(*b)),
            ApiResponse::Bytes(_) => return None,
            ApiResponse::Json(v) => Ok(v.clone()),
        };
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_has_no_payload() {
        let bytes = ApiResponse::Bytes(vec![0, 1, 2]);
        assert!(bytes.is_binary());
        assert!(bytes.payload().is_none());
        assert_eq!(bytes.response_type(), ApiResponseType::Bytes);
    }

    #[test]
    fn test_bool_payload() {
        let ok = ApiResponse::Bool(true);
        assert_eq!(ok.payload().unwrap().unwrap(), Value::Bool(true));
    }
}
