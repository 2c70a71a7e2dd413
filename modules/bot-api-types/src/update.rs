//! Incoming updates returned by `getUpdates` (or pushed to a webhook).

use serde::de::{self, Deserializer};
use serde::ser::{self, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{EnumDiscriminants, EnumIter, IntoStaticStr};

use crate::chat::{Chat, User};
use crate::message::{Message, Poll};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Box<Message>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_message_id: Option<String>,
    pub chat_instance: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_short_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineQuery {
    pub id: String,
    pub from: User,
    pub query: String,
    pub offset: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChosenInlineResult {
    pub result_id: String,
    pub from: User,
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_message_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingQuery {
    pub id: String,
    pub from: User,
    pub invoice_payload: String,
    pub shipping_address: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreCheckoutQuery {
    pub id: String,
    pub from: User,
    pub currency: String,
    pub total_amount: i64,
    pub invoice_payload: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollAnswer {
    pub poll_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voter_chat: Option<Chat>,
    pub option_ids: Vec<u32>,
}

/// Membership state of one user; status-specific fields are kept as-is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMember {
    pub status: String,
    pub user: User,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMemberUpdated {
    pub chat: Chat,
    pub from: User,
    pub date: i64,
    pub old_chat_member: ChatMember,
    pub new_chat_member: ChatMember,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatJoinRequest {
    pub chat: Chat,
    pub from: User,
    pub user_chat_id: i64,
    pub date: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageReactionUpdated {
    pub chat: Chat,
    pub message_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_chat: Option<Chat>,
    pub date: i64,
    #[serde(default)]
    pub old_reaction: Vec<Value>,
    #[serde(default)]
    pub new_reaction: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageReactionCountUpdated {
    pub chat: Chat,
    pub message_id: i64,
    pub date: i64,
    #[serde(default)]
    pub reactions: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatBoostUpdated {
    pub chat: Chat,
    pub boost: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatBoostRemoved {
    pub chat: Chat,
    pub boost_id: String,
    pub remove_date: i64,
    pub source: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessConnection {
    pub id: String,
    pub user: User,
    pub user_chat_id: i64,
    pub date: i64,
    #[serde(default)]
    pub can_reply: bool,
    #[serde(default)]
    pub is_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessMessagesDeleted {
    pub business_connection_id: String,
    pub chat: Chat,
    pub message_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaidMediaPurchased {
    pub from: User,
    pub paid_media_payload: String,
}

/// One update as delivered by the Bot API
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub update_id: i64,
    pub kind: UpdateKind,
}

#[derive(Debug, Clone, PartialEq, EnumDiscriminants)]
#[strum_discriminants(name(UpdateType), derive(Hash, EnumIter, IntoStaticStr))]
pub enum UpdateKind {
    Message(Message),
    EditedMessage(Message),
    ChannelPost(Message),
    EditedChannelPost(Message),
    BusinessConnection(BusinessConnection),
    BusinessMessage(Message),
    EditedBusinessMessage(Message),
    DeletedBusinessMessages(BusinessMessagesDeleted),
    MessageReaction(MessageReactionUpdated),
    MessageReactionCount(MessageReactionCountUpdated),
    InlineQuery(InlineQuery),
    ChosenInlineResult(ChosenInlineResult),
    CallbackQuery(CallbackQuery),
    ShippingQuery(ShippingQuery),
    PreCheckoutQuery(PreCheckoutQuery),
    PurchasedPaidMedia(PaidMediaPurchased),
    Poll(Poll),
    PollAnswer(PollAnswer),
    MyChatMember(ChatMemberUpdated),
    ChatMember(ChatMemberUpdated),
    ChatJoinRequest(ChatJoinRequest),
    ChatBoost(ChatBoostUpdated),
    RemovedChatBoost(ChatBoostRemoved),
    /// An update kind this crate does not model; every field except `update_id`
    Unknown(Value),
}

impl UpdateType {
    /// Key carrying the payload in the wire object. `Unknown` has none.
    pub fn wire_key(self) -> Option<&'static str> {
        let key = match self {
            UpdateType::Message => "message",
            UpdateType::EditedMessage => "edited_message",
            UpdateType::ChannelPost => "channel_post",
            UpdateType::EditedChannelPost => "edited_channel_post",
            UpdateType::BusinessConnection => "business_connection",
            UpdateType::BusinessMessage => "business_message",
            UpdateType::EditedBusinessMessage => "edited_business_message",
            UpdateType::DeletedBusinessMessages => "deleted_business_messages",
            UpdateType::MessageReaction => "message_reaction",
            UpdateType::MessageReactionCount => "message_reaction_count",
            UpdateType::InlineQuery => "inline_query",
            UpdateType::ChosenInlineResult => "chosen_inline_result",
            UpdateType::CallbackQuery => "callback_query",
            UpdateType::ShippingQuery => "shipping_query",
            UpdateType::PreCheckoutQuery => "pre_checkout_query",
            UpdateType::PurchasedPaidMedia => "purchased_paid_media",
            UpdateType::Poll => "poll",
            UpdateType::PollAnswer => "poll_answer",
            UpdateType::MyChatMember => "my_chat_member",
            UpdateType::ChatMember => "chat_member",
            UpdateType::ChatJoinRequest => "chat_join_request",
            UpdateType::ChatBoost => "chat_boost",
            UpdateType::RemovedChatBoost => "removed_chat_boost",
            UpdateType::Unknown => return None,
        };
        Some(key)
    }

    pub fn from_wire_key(key: &str) -> Option<Self> {
        use strum::IntoEnumIterator;
        UpdateType::iter().find(|t| t.wire_key() == Some(key))
    }
}

impl UpdateKind {
    pub fn update_type(&self) -> UpdateType {
        UpdateType::from(self)
    }

    /// The message carried by message-like updates
    pub fn message(&self) -> Option<&Message> {
        match self {
            UpdateKind::Message(m)
            | UpdateKind::EditedMessage(m)
            | UpdateKind::ChannelPost(m)
            | UpdateKind::EditedChannelPost(m)
            | UpdateKind::BusinessMessage(m)
            | UpdateKind::EditedBusinessMessage(m) => Some(m),
            _ => None,
        }
    }

    /// The user who sent or triggered the update (`from`)
    pub fn sender(&self) -> Option<&User> {
        match self {
            UpdateKind::Message(m)
            | UpdateKind::EditedMessage(m)
            | UpdateKind::ChannelPost(m)
            | UpdateKind::EditedChannelPost(m)
            | UpdateKind::BusinessMessage(m)
            | UpdateKind::EditedBusinessMessage(m) => m.from.as_ref(),
            UpdateKind::InlineQuery(q) => Some(&q.from),
            UpdateKind::ChosenInlineResult(r) => Some(&r.from),
            UpdateKind::CallbackQuery(q) => Some(&q.from),
            UpdateKind::ShippingQuery(q) => Some(&q.from),
            UpdateKind::PreCheckoutQuery(q) => Some(&q.from),
            UpdateKind::PurchasedPaidMedia(p) => Some(&p.from),
            UpdateKind::PollAnswer(a) => a.user.as_ref(),
            UpdateKind::MyChatMember(u) | UpdateKind::ChatMember(u) => Some(&u.from),
            UpdateKind::ChatJoinRequest(r) => Some(&r.from),
            UpdateKind::MessageReaction(r) => r.user.as_ref(),
            UpdateKind::BusinessConnection(c) => Some(&c.user),
            UpdateKind::DeletedBusinessMessages(_)
            | UpdateKind::MessageReactionCount(_)
            | UpdateKind::Poll(_)
            | UpdateKind::ChatBoost(_)
            | UpdateKind::RemovedChatBoost(_)
            | UpdateKind::Unknown(_) => None,
        }
    }

    /// The user whose state the update is about: the member whose status
    /// changed, the join requester, the business account owner
    pub fn subject(&self) -> Option<&User> {
        match self {
            UpdateKind::MyChatMember(u) | UpdateKind::ChatMember(u) => {
                Some(&u.new_chat_member.user)
            }
            UpdateKind::ChatJoinRequest(r) => Some(&r.from),
            UpdateKind::BusinessConnection(c) => Some(&c.user),
            _ => None,
        }
    }

    /// The chat the update happened in, when it has one
    pub fn chat(&self) -> Option<&Chat> {
        match self {
            UpdateKind::Message(m)
            | UpdateKind::EditedMessage(m)
            | UpdateKind::ChannelPost(m)
            | UpdateKind::EditedChannelPost(m)
            | UpdateKind::BusinessMessage(m)
            | UpdateKind::EditedBusinessMessage(m) => Some(&m.chat),
            UpdateKind::DeletedBusinessMessages(d) => Some(&d.chat),
            UpdateKind::MessageReaction(r) => Some(&r.chat),
            UpdateKind::MessageReactionCount(r) => Some(&r.chat),
            UpdateKind::MyChatMember(u) | UpdateKind::ChatMember(u) => Some(&u.chat),
            UpdateKind::ChatJoinRequest(r) => Some(&r.chat),
            UpdateKind::ChatBoost(b) => Some(&b.chat),
            UpdateKind::RemovedChatBoost(b) => Some(&b.chat),
            UpdateKind::CallbackQuery(q) => q.message.as_ref().map(|m| &m.chat),
            UpdateKind::BusinessConnection(_)
            | UpdateKind::InlineQuery(_)
            | UpdateKind::ChosenInlineResult(_)
            | UpdateKind::ShippingQuery(_)
            | UpdateKind::PreCheckoutQuery(_)
            | UpdateKind::PurchasedPaidMedia(_)
            | UpdateKind::Poll(_)
            | UpdateKind::PollAnswer(_)
            | UpdateKind::Unknown(_) => None,
        }
    }

    fn from_fields(fields: Map<String, Value>) -> serde_json::Result<Self> {
        let found = fields
            .keys()
            .find_map(|key| UpdateType::from_wire_key(key).map(|t| (key.clone(), t)));

        let Some((key, update_type)) = found else {
            return Ok(UpdateKind::Unknown(Value::Object(fields)));
        };
        let payload = fields.get(&key).cloned().unwrap_or(Value::Null);

        // A malformed payload is kept raw so the rest of a batch still parses
        match Self::parse_kind(update_type, payload) {
            Ok(kind) => Ok(kind),
            Err(e) => {
                log::warn!("Unparseable {} update kept as unknown: {}", key, e);
                Ok(UpdateKind::Unknown(Value::Object(fields)))
            }
        }
    }

    fn parse_kind(update_type: UpdateType, payload: Value) -> serde_json::Result<Self> {
        use serde_json::from_value as parse;
        Ok(match update_type {
            UpdateType::Message => UpdateKind::Message(parse(payload)?),
            UpdateType::EditedMessage => UpdateKind::EditedMessage(parse(payload)?),
            UpdateType::ChannelPost => UpdateKind::ChannelPost(parse(payload)?),
            UpdateType::EditedChannelPost => UpdateKind::EditedChannelPost(parse(payload)?),
            UpdateType::BusinessConnection => UpdateKind::BusinessConnection(parse(payload)?),
            UpdateType::BusinessMessage => UpdateKind::BusinessMessage(parse(payload)?),
            UpdateType::EditedBusinessMessage => {
                UpdateKind::EditedBusinessMessage(parse(payload)?)
            }
            UpdateType::DeletedBusinessMessages => {
                UpdateKind::DeletedBusinessMessages(parse(payload)?)
            }
            UpdateType::MessageReaction => UpdateKind::MessageReaction(parse(payload)?),
            UpdateType::MessageReactionCount => UpdateKind::MessageReactionCount(parse(payload)?),
            UpdateType::InlineQuery => UpdateKind::InlineQuery(parse(payload)?),
            UpdateType::ChosenInlineResult => UpdateKind::ChosenInlineResult(parse(payload)?),
            UpdateType::CallbackQuery => UpdateKind::CallbackQuery(parse(payload)?),
            UpdateType::ShippingQuery => UpdateKind::ShippingQuery(parse(payload)?),
            UpdateType::PreCheckoutQuery => UpdateKind::PreCheckoutQuery(parse(payload)?),
            UpdateType::PurchasedPaidMedia => UpdateKind::PurchasedPaidMedia(parse(payload)?),
            UpdateType::Poll => UpdateKind::Poll(parse(payload)?),
            UpdateType::PollAnswer => UpdateKind::PollAnswer(parse(payload)?),
            UpdateType::MyChatMember => UpdateKind::MyChatMember(parse(payload)?),
            UpdateType::ChatMember => UpdateKind::ChatMember(parse(payload)?),
            UpdateType::ChatJoinRequest => UpdateKind::ChatJoinRequest(parse(payload)?),
            UpdateType::ChatBoost => UpdateKind::ChatBoost(parse(payload)?),
            UpdateType::RemovedChatBoost => UpdateKind::RemovedChatBoost(parse(payload)?),
            UpdateType::Unknown => UpdateKind::Unknown(payload),
        })
    }

    fn payload(&self) -> serde_json::Result<Value> {
        use serde_json::to_value;
        match self {
            UpdateKind::Message(m)
            | UpdateKind::EditedMessage(m)
            | UpdateKind::ChannelPost(m)
            | UpdateKind::EditedChannelPost(m)
            | UpdateKind::BusinessMessage(m)
            | UpdateKind::EditedBusinessMessage(m) => to_value(m),
            UpdateKind::BusinessConnection(c) => to_value(c),
            UpdateKind::DeletedBusinessMessages(d) => to_value(d),
            UpdateKind::MessageReaction(r) => to_value(r),
            UpdateKind::MessageReactionCount(r) => to_value(r),
            UpdateKind::InlineQuery(q) => to_value(q),
            UpdateKind::ChosenInlineResult(r) => to_value(r),
            UpdateKind::CallbackQuery(q) => to_value(q),
            UpdateKind::ShippingQuery(q) => to_value(q),
            UpdateKind::PreCheckoutQuery(q) => to_value(q),
            UpdateKind::PurchasedPaidMedia(p) => to_value(p),
            UpdateKind::Poll(p) => to_value(p),
            UpdateKind::PollAnswer(a) => to_value(a),
            UpdateKind::MyChatMember(u) | UpdateKind::ChatMember(u) => to_value(u),
            UpdateKind::ChatJoinRequest(r) => to_value(r),
            UpdateKind::ChatBoost(b) => to_value(b),
            UpdateKind::RemovedChatBoost(b) => to_value(b),
            UpdateKind::Unknown(raw) => Ok(raw.clone()),
        }
    }
}

impl Update {
    pub fn update_type(&self) -> UpdateType {
        self.kind.update_type()
    }

    /// Wire representation: `{"update_id": .., "<kind>": payload}`
    pub fn to_wire(&self) -> serde_json::Result<Map<String, Value>> {
        let mut fields = Map::new();
        fields.insert("update_id".to_string(), Value::from(self.update_id));
        match (self.update_type().wire_key(), self.kind.payload()?) {
            (Some(key), payload) => {
                fields.insert(key.to_string(), payload);
            }
            (None, Value::Object(raw)) => fields.extend(raw),
            (None, other) => {
                fields.insert("payload".to_string(), other);
            }
        }
        Ok(fields)
    }
}

impl<'de> Deserialize<'de> for Update {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut fields = Map::<String, Value>::deserialize(deserializer)?;
        let update_id = fields
            .remove("update_id")
            .and_then(|v| v.as_i64())
            .ok_or_else(|| de::Error::missing_field("update_id"))?;
        let kind = UpdateKind::from_fields(fields).map_err(de::Error::custom)?;
        Ok(Update { update_id, kind })
    }
}

impl Serialize for Update {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_wire()
            .map_err(ser::Error::custom)?
            .serialize(serializer)
    }
}
