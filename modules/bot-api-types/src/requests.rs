//! Outgoing Bot API calls.
//!
//! Each call variant wraps its request parameters. On the wire (and in replay
//! files) a call is `{"method": "sendMessage", "params": {...}}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{EnumDiscriminants, EnumIter, IntoStaticStr};

use crate::response::ApiResponse;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetUpdates {
    pub offset: Option<i64>,
    pub limit: Option<u32>,
    pub timeout: Option<u32>,
    #[serde(default)]
    pub allowed_updates: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteWebhook {
    #[serde(default)]
    pub drop_pending_updates: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetMe {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendMessage {
    pub chat_id: i64,
    pub text: String,
    #[serde(default)]
    pub parse_mode: Option<String>,
    #[serde(default)]
    pub disable_notification: bool,
    #[serde(default)]
    pub reply_to_message_id: Option<i64>,
    #[serde(default)]
    pub reply_markup: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendPhoto {
    pub chat_id: i64,
    /// file_id or URL
    pub photo: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub parse_mode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendDocument {
    pub chat_id: i64,
    pub document: String,
    #[serde(default)]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendPoll {
    pub chat_id: i64,
    pub question: String,
    pub options: Vec<String>,
    #[serde(default = "default_true")]
    pub is_anonymous: bool,
    #[serde(default)]
    pub allows_multiple_answers: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendDice {
    pub chat_id: i64,
    #[serde(default)]
    pub emoji: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwardMessage {
    pub chat_id: i64,
    pub from_chat_id: i64,
    pub message_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopyMessage {
    pub chat_id: i64,
    pub from_chat_id: i64,
    pub message_id: i64,
    #[serde(default)]
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditMessageText {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: String,
    #[serde(default)]
    pub parse_mode: Option<String>,
    #[serde(default)]
    pub reply_markup: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteMessage {
    pub chat_id: i64,
    pub message_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerCallbackQuery {
    pub callback_query_id: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub show_alert: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerInlineQuery {
    pub inline_query_id: String,
    pub results: Vec<Value>,
    #[serde(default)]
    pub cache_time: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendChatAction {
    pub chat_id: i64,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetChat {
    pub chat_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetChatMember {
    pub chat_id: i64,
    pub user_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetMyCommands {
    pub commands: Vec<BotCommand>,
    #[serde(default)]
    pub language_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotCommand {
    pub command: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetFile {
    pub file_id: String,
}

/// Fetches file bytes from the file endpoint; the result is raw binary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadFile {
    pub file_path: String,
}

/// Every outbound call the middlewares know how to observe.
///
/// Variant names are the type labels written to the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, EnumDiscriminants)]
#[serde(tag = "method", content = "params")]
#[strum_discriminants(name(ApiCallType), derive(Hash, EnumIter, IntoStaticStr))]
pub enum ApiCall {
    #[serde(rename = "getUpdates")]
    GetUpdates(GetUpdates),
    #[serde(rename = "deleteWebhook")]
    DeleteWebhook(DeleteWebhook),
    #[serde(rename = "getMe")]
    GetMe(GetMe),
    #[serde(rename = "sendMessage")]
    SendTextMessage(SendMessage),
    #[serde(rename = "sendPhoto")]
    SendPhoto(SendPhoto),
    #[serde(rename = "sendDocument")]
    SendDocument(SendDocument),
    #[serde(rename = "sendPoll")]
    SendPoll(SendPoll),
    #[serde(rename = "sendDice")]
    SendDice(SendDice),
    #[serde(rename = "forwardMessage")]
    ForwardMessage(ForwardMessage),
    #[serde(rename = "copyMessage")]
    CopyMessage(CopyMessage),
    #[serde(rename = "editMessageText")]
    EditChatMessageText(EditMessageText),
    #[serde(rename = "deleteMessage")]
    DeleteMessage(DeleteMessage),
    #[serde(rename = "answerCallbackQuery")]
    AnswerCallbackQuery(AnswerCallbackQuery),
    #[serde(rename = "answerInlineQuery")]
    AnswerInlineQuery(AnswerInlineQuery),
    #[serde(rename = "sendChatAction")]
    SendChatAction(SendChatAction),
    #[serde(rename = "getChat")]
    GetChat(GetChat),
    #[serde(rename = "getChatMember")]
    GetChatMember(GetChatMember),
    #[serde(rename = "setMyCommands")]
    SetMyCommands(SetMyCommands),
    #[serde(rename = "getFile")]
    GetFile(GetFile),
    #[serde(rename = "downloadFile")]
    DownloadFile(DownloadFile),
}

impl ApiCall {
    pub fn call_type(&self) -> ApiCallType {
        ApiCallType::from(self)
    }

    /// Bot API method name
    pub fn method(&self) -> &'static str {
        match self {
            ApiCall::GetUpdates(_) => "getUpdates",
            ApiCall::DeleteWebhook(_) => "deleteWebhook",
            ApiCall::GetMe(_) => "getMe",
            ApiCall::SendTextMessage(_) => "sendMessage",
            ApiCall::SendPhoto(_) => "sendPhoto",
            ApiCall::SendDocument(_) => "sendDocument",
            ApiCall::SendPoll(_) => "sendPoll",
            ApiCall::SendDice(_) => "sendDice",
            ApiCall::ForwardMessage(_) => "forwardMessage",
            ApiCall::CopyMessage(_) => "copyMessage",
            ApiCall::EditChatMessageText(_) => "editMessageText",
            ApiCall::DeleteMessage(_) => "deleteMessage",
            ApiCall::AnswerCallbackQuery(_) => "answerCallbackQuery",
            ApiCall::AnswerInlineQuery(_) => "answerInlineQuery",
            ApiCall::SendChatAction(_) => "sendChatAction",
            ApiCall::GetChat(_) => "getChat",
            ApiCall::GetChatMember(_) => "getChatMember",
            ApiCall::SetMyCommands(_) => "setMyCommands",
            ApiCall::GetFile(_) => "getFile",
            ApiCall::DownloadFile(_) => "downloadFile",
        }
    }

    /// Request parameters as a JSON object, every field included
    pub fn params(&self) -> serde_json::Result<Value> {
        use serde_json::to_value;
        match self {
            ApiCall::GetUpdates(p) => to_value(p),
            ApiCall::DeleteWebhook(p) => to_value(p),
            ApiCall::GetMe(p) => to_value(p),
            ApiCall::SendTextMessage(p) => to_value(p),
            ApiCall::SendPhoto(p) => to_value(p),
            ApiCall::SendDocument(p) => to_value(p),
            ApiCall::SendPoll(p) => to_value(p),
            ApiCall::SendDice(p) => to_value(p),
            ApiCall::ForwardMessage(p) => to_value(p),
            ApiCall::CopyMessage(p) => to_value(p),
            ApiCall::EditChatMessageText(p) => to_value(p),
            ApiCall::DeleteMessage(p) => to_value(p),
            ApiCall::AnswerCallbackQuery(p) => to_value(p),
            ApiCall::AnswerInlineQuery(p) => to_value(p),
            ApiCall::SendChatAction(p) => to_value(p),
            ApiCall::GetChat(p) => to_value(p),
            ApiCall::GetChatMember(p) => to_value(p),
            ApiCall::SetMyCommands(p) => to_value(p),
            ApiCall::GetFile(p) => to_value(p),
            ApiCall::DownloadFile(p) => to_value(p),
        }
    }

    /// Decode the `result` field of a successful response to this call.
    ///
    /// `downloadFile` results are taken as text and kept as raw bytes.
    pub fn parse_response(&self, result: Value) -> serde_json::Result<ApiResponse> {
        use serde_json::from_value as parse;
        Ok(match self {
            ApiCall::GetUpdates(_) => ApiResponse::Updates(parse(result)?),
            ApiCall::SendTextMessage(_)
            | ApiCall::SendPhoto(_)
            | ApiCall::SendDocument(_)
            | ApiCall::SendPoll(_)
            | ApiCall::SendDice(_)
            | ApiCall::ForwardMessage(_) => ApiResponse::Message(parse(result)?),
            // Inline messages answer `true` instead of the edited message
            ApiCall::EditChatMessageText(_) => match result {
                Value::Bool(ok) => ApiResponse::Bool(ok),
                other => ApiResponse::Message(parse(other)?),
            },
            ApiCall::CopyMessage(_) => ApiResponse::MessageId(parse(result)?),
            ApiCall::GetMe(_) => ApiResponse::User(parse(result)?),
            ApiCall::GetChat(_) => ApiResponse::Chat(parse(result)?),
            ApiCall::GetChatMember(_) => ApiResponse::ChatMember(parse(result)?),
            ApiCall::GetFile(_) => ApiResponse::File(parse(result)?),
            ApiCall::DeleteWebhook(_)
            | ApiCall::DeleteMessage(_)
            | ApiCall::AnswerCallbackQuery(_)
            | ApiCall::AnswerInlineQuery(_)
            | ApiCall::SendChatAction(_)
            | ApiCall::SetMyCommands(_) => ApiResponse::Bool(parse(result)?),
            ApiCall::DownloadFile(_) => match result {
                Value::String(text) => ApiResponse::Bytes(text.into_bytes()),
                other => ApiResponse::Bytes(parse(other)?),
            },
        })
    }
}
