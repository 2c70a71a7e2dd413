//! Static per-type metadata for everything the middlewares can log.
//!
//! Every concrete call, result and update type maps to one `TypeDescriptor`
//! through an exhaustive `match`, so a new type in `bot-api-types` does not
//! compile until it is given a label, an encoding and an actor rule here.

use bot_api_types::{ApiCall, ApiCallType, ApiResponse, ApiResponseType, Update, UpdateType};
use serde_json::Value;

/// How a payload is turned into the `data` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// Every field, `null`s and defaults included (outbound requests)
    Full,
    /// `null` fields dropped recursively (inbound results)
    Compact,
}

/// Which identity the text formatter shows for an update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorRule {
    /// The user in `from`
    Sender,
    /// The user the update is about (member, join requester, business owner)
    Subject,
    /// The chat the update happened in
    Chat,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub label: &'static str,
    /// `None` means the type cannot be written to the durable sink
    pub encoding: Option<Encoding>,
    pub actor: ActorRule,
    pub excluded: bool,
}

impl TypeDescriptor {
    const fn request(label: &'static str) -> Self {
        Self { label, encoding: Some(Encoding::Full), actor: ActorRule::None, excluded: false }
    }

    const fn control_request(label: &'static str) -> Self {
        Self { label, encoding: Some(Encoding::Full), actor: ActorRule::None, excluded: true }
    }

    const fn result(label: &'static str) -> Self {
        Self { label, encoding: Some(Encoding::Compact), actor: ActorRule::None, excluded: false }
    }

    const fn update(label: &'static str, actor: ActorRule) -> Self {
        Self { label, encoding: Some(Encoding::Compact), actor, excluded: false }
    }

    const fn unencodable(label: &'static str) -> Self {
        Self { label, encoding: None, actor: ActorRule::None, excluded: false }
    }
}

macro_rules! descriptor {
    ($value:expr) => {{
        const DESCRIPTOR: TypeDescriptor = $value;
        &DESCRIPTOR
    }};
}

/// Polling, webhook teardown and self-identity calls are never logged.
pub fn call_descriptor(call_type: ApiCallType) -> &'static TypeDescriptor {
    use ApiCallType as T;
    match call_type {
        T::GetUpdates => descriptor!(TypeDescriptor::control_request("GetUpdates")),
        T::DeleteWebhook => descriptor!(TypeDescriptor::control_request("DeleteWebhook")),
        T::GetMe => descriptor!(TypeDescriptor::control_request("GetMe")),
        T::SendTextMessage => descriptor!(TypeDescriptor::request("SendTextMessage")),
        T::SendPhoto => descriptor!(TypeDescriptor::request("SendPhoto")),
        T::SendDocument => descriptor!(TypeDescriptor::request("SendDocument")),
        T::SendPoll => descriptor!(TypeDescriptor::request("SendPoll")),
        T::SendDice => descriptor!(TypeDescriptor::request("SendDice")),
        T::ForwardMessage => descriptor!(TypeDescriptor::request("ForwardMessage")),
        T::CopyMessage => descriptor!(TypeDescriptor::request("CopyMessage")),
        T::EditChatMessageText => descriptor!(TypeDescriptor::request("EditChatMessageText")),
        T::DeleteMessage => descriptor!(TypeDescriptor::request("DeleteMessage")),
        T::AnswerCallbackQuery => descriptor!(TypeDescriptor::request("AnswerCallbackQuery")),
        T::AnswerInlineQuery => descriptor!(TypeDescriptor::request("AnswerInlineQuery")),
        T::SendChatAction => descriptor!(TypeDescriptor::request("SendChatAction")),
        T::GetChat => descriptor!(TypeDescriptor::request("GetChat")),
        T::GetChatMember => descriptor!(TypeDescriptor::request("GetChatMember")),
        T::SetMyCommands => descriptor!(TypeDescriptor::request("SetMyCommands")),
        T::GetFile => descriptor!(TypeDescriptor::request("GetFile")),
        T::DownloadFile => descriptor!(TypeDescriptor::request("DownloadFile")),
    }
}

pub fn response_descriptor(response_type: ApiResponseType) -> &'static TypeDescriptor {
    use ApiResponseType as T;
    match response_type {
        T::Updates => descriptor!(TypeDescriptor::result("UpdateList")),
        T::Message => descriptor!(TypeDescriptor::result("Message")),
        T::MessageId => descriptor!(TypeDescriptor::result("MessageId")),
        T::User => descriptor!(TypeDescriptor::result("User")),
        T::Chat => descriptor!(TypeDescriptor::result("Chat")),
        T::ChatMember => descriptor!(TypeDescriptor::result("ChatMember")),
        T::File => descriptor!(TypeDescriptor::result("File")),
        T::Bool => descriptor!(TypeDescriptor::result("Boolean")),
        T::Bytes => descriptor!(TypeDescriptor::unencodable("ByteArray")),
        T::Json => descriptor!(TypeDescriptor::result("JsonElement")),
    }
}

pub fn update_descriptor(update_type: UpdateType) -> &'static TypeDescriptor {
    use ActorRule::{Chat, Sender, Subject};
    use UpdateType as T;
    match update_type {
        T::Message => descriptor!(TypeDescriptor::update("MessageUpdate", Sender)),
        T::EditedMessage => descriptor!(TypeDescriptor::update("EditMessageUpdate", Sender)),
        T::ChannelPost => descriptor!(TypeDescriptor::update("ChannelPostUpdate", Sender)),
        T::EditedChannelPost => {
            descriptor!(TypeDescriptor::update("EditChannelPostUpdate", Sender))
        }
        T::BusinessConnection => {
            descriptor!(TypeDescriptor::update("BusinessConnectionUpdate", Subject))
        }
        T::BusinessMessage => descriptor!(TypeDescriptor::update("BusinessMessageUpdate", Sender)),
        T::EditedBusinessMessage => {
            descriptor!(TypeDescriptor::update("EditBusinessMessageUpdate", Sender))
        }
        T::DeletedBusinessMessages => {
            descriptor!(TypeDescriptor::update("DeletedBusinessMessageUpdate", Chat))
        }
        T::MessageReaction => {
            descriptor!(TypeDescriptor::update("ChatMessageReactionUpdatedUpdate", Chat))
        }
        T::MessageReactionCount => {
            descriptor!(TypeDescriptor::update("ChatMessageReactionsCountUpdatedUpdate", Chat))
        }
        T::InlineQuery => descriptor!(TypeDescriptor::update("InlineQueryUpdate", Sender)),
        T::ChosenInlineResult => {
            descriptor!(TypeDescriptor::update("ChosenInlineResultUpdate", Sender))
        }
        T::CallbackQuery => descriptor!(TypeDescriptor::update("CallbackQueryUpdate", Sender)),
        T::ShippingQuery => descriptor!(TypeDescriptor::update("ShippingQueryUpdate", Sender)),
        T::PreCheckoutQuery => {
            descriptor!(TypeDescriptor::update("PreCheckoutQueryUpdate", Sender))
        }
        T::PurchasedPaidMedia => {
            descriptor!(TypeDescriptor::update("PaidMediaPurchasedUpdate", Sender))
        }
        T::Poll => descriptor!(TypeDescriptor::update("PollUpdate", ActorRule::None)),
        T::PollAnswer => descriptor!(TypeDescriptor::update("PollAnswerUpdate", Sender)),
        T::MyChatMember => {
            descriptor!(TypeDescriptor::update("MyChatMemberUpdatedUpdate", Subject))
        }
        T::ChatMember => {
            descriptor!(TypeDescriptor::update("CommonChatMemberUpdatedUpdate", Subject))
        }
        T::ChatJoinRequest => {
            descriptor!(TypeDescriptor::update("ChatJoinRequestUpdate", Subject))
        }
        T::ChatBoost => descriptor!(TypeDescriptor::update("ChatBoostUpdatedUpdate", Chat)),
        T::RemovedChatBoost => {
            descriptor!(TypeDescriptor::update("ChatBoostRemovedUpdate", Chat))
        }
        T::Unknown => descriptor!(TypeDescriptor::unencodable("UnknownUpdate")),
    }
}

/// Anything that can become a log entry.
pub trait Loggable {
    fn descriptor(&self) -> &'static TypeDescriptor;

    /// JSON form of the event; `None` for raw binary content
    fn payload(&self) -> Option<serde_json::Result<Value>>;

    fn is_binary(&self) -> bool {
        false
    }
}

impl Loggable for ApiCall {
    fn descriptor(&self) -> &'static TypeDescriptor {
        call_descriptor(self.call_type())
    }

    fn payload(&self) -> Option<serde_json::Result<Value>> {
        Some(self.params())
    }
}

impl Loggable for ApiResponse {
    fn descriptor(&self) -> &'static TypeDescriptor {
        response_descriptor(self.response_type())
    }

    fn payload(&self) -> Option<serde_json::Result<Value>> {
        ApiResponse::payload(self)
    }

    fn is_binary(&self) -> bool {
        ApiResponse::is_binary(self)
    }
}

impl Loggable for Update {
    fn descriptor(&self) -> &'static TypeDescriptor {
        update_descriptor(self.update_type())
    }

    fn payload(&self) -> Option<serde_json::Result<Value>> {
        Some(self.to_wire().map(Value::Object))
    }
}

/// Whether the call's type is in the exclusion set
pub fn is_excluded(call: &ApiCall) -> bool {
    call.descriptor().excluded
}
