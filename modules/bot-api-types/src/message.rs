//! Messages and their content.
//!
//! Telegram flattens the content of a message into the message object itself
//! (`{"message_id": 1, "text": "hi"}`), so `Message` is (de)serialized by hand:
//! the first content key it knows becomes `MessageContent`, and every field it
//! does not model is kept in `Message::extra` and written back unchanged.

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::ser::{self, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::IntoStaticStr;

use crate::chat::{Chat, User};

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub message_id: i64,
    pub date: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub sender_chat: Option<Chat>,
    pub edit_date: Option<i64>,
    pub business_connection_id: Option<String>,
    pub media_group_id: Option<String>,
    pub content: MessageContent,
    /// Fields with no typed model (`reply_to_message`, `forward_origin`,
    /// `reply_markup`, ...), verbatim
    pub extra: Map<String, Value>,
}

/// Wire shape of `Message`; everything not named here lands in `rest`
#[derive(Serialize, Deserialize)]
struct MessageWire {
    message_id: i64,
    date: i64,
    chat: Chat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    from: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sender_chat: Option<Chat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    edit_date: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    business_connection_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    media_group_id: Option<String>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

/// Result of `copyMessage`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageId {
    pub message_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEntity {
    #[serde(rename = "type")]
    pub kind: String,
    pub offset: i64,
    pub length: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    pub file_unique_id: String,
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

/// Any downloadable media: animation, video, video note, audio, document, voice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRef {
    pub file_id: String,
    pub file_unique_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sticker {
    pub file_id: String,
    pub file_unique_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub phone_number: String,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dice {
    pub emoji: String,
    pub value: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Giveaway {
    pub chats: Vec<Chat>,
    pub winners_selection_date: i64,
    pub winner_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prize_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GiveawayWinners {
    pub chat: Chat,
    pub giveaway_message_id: i64,
    pub winner_count: u32,
    #[serde(default)]
    pub winners: Vec<User>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub title: String,
    pub description: String,
    pub start_parameter: String,
    pub currency: String,
    pub total_amount: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_period: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub location: Location,
    pub title: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollOption {
    pub text: String,
    pub voter_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poll {
    pub id: String,
    pub question: String,
    pub options: Vec<PollOption>,
    pub total_voter_count: u32,
    #[serde(default)]
    pub is_closed: bool,
    #[serde(default)]
    pub is_anonymous: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub chat: Chat,
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaidMediaInfo {
    pub star_count: u32,
    pub paid_media: Vec<Value>,
}

/// What a message carries. Media variants keep their caption alongside.
#[derive(Debug, Clone, PartialEq, IntoStaticStr)]
pub enum MessageContent {
    Text {
        text: String,
        entities: Vec<MessageEntity>,
    },
    Photo {
        photo: Vec<PhotoSize>,
        caption: Option<String>,
    },
    Animation {
        animation: FileRef,
        caption: Option<String>,
    },
    Video {
        video: FileRef,
        caption: Option<String>,
    },
    VideoNote(FileRef),
    Audio {
        audio: FileRef,
        caption: Option<String>,
    },
    Document {
        document: FileRef,
        caption: Option<String>,
    },
    Voice {
        voice: FileRef,
        caption: Option<String>,
    },
    Sticker(Sticker),
    Contact(Contact),
    Dice(Dice),
    Game(Game),
    Giveaway(Giveaway),
    GiveawayWinners(GiveawayWinners),
    Invoice(Invoice),
    Location(Location),
    LiveLocation(Location),
    Venue(Venue),
    Poll(Poll),
    Story(Story),
    PaidMedia(PaidMediaInfo),
    /// Content this crate has no model for; the raw fields are preserved
    Unknown(Map<String, Value>),
}

impl MessageContent {
    /// Variant name, used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        self.into()
    }

    pub fn caption(&self) -> Option<&str> {
        match self {
            MessageContent::Photo { caption, .. }
            | MessageContent::Animation { caption, .. }
            | MessageContent::Video { caption, .. }
            | MessageContent::Audio { caption, .. }
            | MessageContent::Document { caption, .. }
            | MessageContent::Voice { caption, .. } => caption.as_deref(),
            _ => None,
        }
    }

    /// Split message fields into the content and the fields left over.
    fn from_fields(mut fields: Map<String, Value>) -> serde_json::Result<(Self, Map<String, Value>)> {
        Ok(match Self::take_content(&mut fields)? {
            Some(content) => (content, fields),
            None => (MessageContent::Unknown(fields), Map::new()),
        })
    }

    fn take_content(fields: &mut Map<String, Value>) -> serde_json::Result<Option<Self>> {
        if let Some(text) = take::<String>(fields, "text")? {
            let entities = take(fields, "entities")?.unwrap_or_default();
            return Ok(Some(MessageContent::Text { text, entities }));
        }
        // Animations arrive with a duplicate `document` key, check them first.
        // The duplicate stays in the leftovers.
        if let Some(animation) = take(fields, "animation")? {
            let caption = take(fields, "caption")?;
            return Ok(Some(MessageContent::Animation { animation, caption }));
        }
        if let Some(photo) = take(fields, "photo")? {
            let caption = take(fields, "caption")?;
            return Ok(Some(MessageContent::Photo { photo, caption }));
        }
        if let Some(video) = take(fields, "video")? {
            let caption = take(fields, "caption")?;
            return Ok(Some(MessageContent::Video { video, caption }));
        }
        if let Some(note) = take(fields, "video_note")? {
            return Ok(Some(MessageContent::VideoNote(note)));
        }
        if let Some(audio) = take(fields, "audio")? {
            let caption = take(fields, "caption")?;
            return Ok(Some(MessageContent::Audio { audio, caption }));
        }
        if let Some(document) = take(fields, "document")? {
            let caption = take(fields, "caption")?;
            return Ok(Some(MessageContent::Document { document, caption }));
        }
        if let Some(voice) = take(fields, "voice")? {
            let caption = take(fields, "caption")?;
            return Ok(Some(MessageContent::Voice { voice, caption }));
        }
        if let Some(sticker) = take(fields, "sticker")? {
            return Ok(Some(MessageContent::Sticker(sticker)));
        }
        if let Some(contact) = take(fields, "contact")? {
            return Ok(Some(MessageContent::Contact(contact)));
        }
        if let Some(dice) = take(fields, "dice")? {
            return Ok(Some(MessageContent::Dice(dice)));
        }
        if let Some(game) = take(fields, "game")? {
            return Ok(Some(MessageContent::Game(game)));
        }
        if let Some(giveaway) = take(fields, "giveaway")? {
            return Ok(Some(MessageContent::Giveaway(giveaway)));
        }
        if let Some(winners) = take(fields, "giveaway_winners")? {
            return Ok(Some(MessageContent::GiveawayWinners(winners)));
        }
        if let Some(invoice) = take(fields, "invoice")? {
            return Ok(Some(MessageContent::Invoice(invoice)));
        }
        // Venues also carry a top-level `location`
        if let Some(venue) = take(fields, "venue")? {
            return Ok(Some(MessageContent::Venue(venue)));
        }
        if let Some(location) = take::<Location>(fields, "location")? {
            return Ok(Some(if location.live_period.is_some() {
                MessageContent::LiveLocation(location)
            } else {
                MessageContent::Location(location)
            }));
        }
        if let Some(poll) = take(fields, "poll")? {
            return Ok(Some(MessageContent::Poll(poll)));
        }
        if let Some(story) = take(fields, "story")? {
            return Ok(Some(MessageContent::Story(story)));
        }
        if let Some(paid) = take(fields, "paid_media")? {
            return Ok(Some(MessageContent::PaidMedia(paid)));
        }
        Ok(None)
    }

    fn to_fields(&self) -> serde_json::Result<Map<String, Value>> {
        let mut fields = Map::new();
        match self {
            MessageContent::Text { text, entities } => {
                put(&mut fields, "text", text)?;
                if !entities.is_empty() {
                    put(&mut fields, "entities", entities)?;
                }
            }
            MessageContent::Photo { photo, caption } => {
                put(&mut fields, "photo", photo)?;
                put_caption(&mut fields, caption)?;
            }
            MessageContent::Animation { animation, caption } => {
                put(&mut fields, "animation", animation)?;
                put_caption(&mut fields, caption)?;
            }
            MessageContent::Video { video, caption } => {
                put(&mut fields, "video", video)?;
                put_caption(&mut fields, caption)?;
            }
            MessageContent::VideoNote(note) => put(&mut fields, "video_note", note)?,
            MessageContent::Audio { audio, caption } => {
                put(&mut fields, "audio", audio)?;
                put_caption(&mut fields, caption)?;
            }
            MessageContent::Document { document, caption } => {
                put(&mut fields, "document", document)?;
                put_caption(&mut fields, caption)?;
            }
            MessageContent::Voice { voice, caption } => {
                put(&mut fields, "voice", voice)?;
                put_caption(&mut fields, caption)?;
            }
            MessageContent::Sticker(sticker) => put(&mut fields, "sticker", sticker)?,
            MessageContent::Contact(contact) => put(&mut fields, "contact", contact)?,
            MessageContent::Dice(dice) => put(&mut fields, "dice", dice)?,
            MessageContent::Game(game) => put(&mut fields, "game", game)?,
            MessageContent::Giveaway(giveaway) => put(&mut fields, "giveaway", giveaway)?,
            MessageContent::GiveawayWinners(winners) => {
                put(&mut fields, "giveaway_winners", winners)?
            }
            MessageContent::Invoice(invoice) => put(&mut fields, "invoice", invoice)?,
            MessageContent::Location(location) | MessageContent::LiveLocation(location) => {
                put(&mut fields, "location", location)?
            }
            MessageContent::Venue(venue) => put(&mut fields, "venue", venue)?,
            MessageContent::Poll(poll) => put(&mut fields, "poll", poll)?,
            MessageContent::Story(story) => put(&mut fields, "story", story)?,
            MessageContent::PaidMedia(paid) => put(&mut fields, "paid_media", paid)?,
            MessageContent::Unknown(raw) => fields = raw.clone(),
        }
        Ok(fields)
    }
}

fn take<T: DeserializeOwned>(
    fields: &mut Map<String, Value>,
    key: &str,
) -> serde_json::Result<Option<T>> {
    fields.remove(key).map(serde_json::from_value).transpose()
}

fn put<T: Serialize>(fields: &mut Map<String, Value>, key: &str, value: &T) -> serde_json::Result<()> {
    fields.insert(key.to_string(), serde_json::to_value(value)?);
    Ok(())
}

fn put_caption(fields: &mut Map<String, Value>, caption: &Option<String>) -> serde_json::Result<()> {
    if let Some(caption) = caption {
        put(fields, "caption", caption)?;
    }
    Ok(())
}

impl<'de> Deserialize<'de> for Message {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = MessageWire::deserialize(deserializer)?;
        let (content, extra) = MessageContent::from_fields(wire.rest).map_err(de::Error::custom)?;
        Ok(Message {
            message_id: wire.message_id,
            date: wire.date,
            chat: wire.chat,
            from: wire.from,
            sender_chat: wire.sender_chat,
            edit_date: wire.edit_date,
            business_connection_id: wire.business_connection_id,
            media_group_id: wire.media_group_id,
            content,
            extra,
        })
    }
}

impl Serialize for Message {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut rest = self.extra.clone();
        rest.extend(self.content.to_fields().map_err(ser::Error::custom)?);
        MessageWire {
            message_id: self.message_id,
            date: self.date,
            chat: self.chat.clone(),
            from: self.from.clone(),
            sender_chat: self.sender_chat.clone(),
            edit_date: self.edit_date,
            business_connection_id: self.business_connection_id.clone(),
            media_group_id: self.media_group_id.clone(),
            rest,
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message_with(extra: Value) -> Message {
        let mut base = json!({
            "message_id": 7,
            "date": 1_700_000_000,
            "chat": {"id": 42, "type": "private", "first_name": "Ada"},
            "from": {"id": 42, "is_bot": false, "first_name": "Ada"}
        });
        if let (Some(base), Some(extra)) = (base.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                base.insert(k.clone(), v.clone());
            }
        }
        serde_json::from_value(base).unwrap()
    }

    #[test]
    fn test_text_message() {
        let msg = message_with(json!({"text": "/start"}));
        assert_eq!(msg.message_id, 7);
        assert_eq!(msg.from.as_ref().map(|u| u.id), Some(42));
        match msg.content {
            MessageContent::Text { ref text, ref entities } => {
                assert_eq!(text, "/start");
                assert!(entities.is_empty());
            }
            other => panic!("unexpected content {:?}", other),
        }
    }

    #[test]
    fn test_animation_wins_over_document() {
        let file = json!({"file_id": "a", "file_unique_id": "u"});
        let msg = message_with(json!({"animation": file, "document": file}));
        assert_eq!(msg.content.kind_name(), "Animation");
    }

    #[test]
    fn test_venue_wins_over_location() {
        let msg = message_with(json!({
            "location": {"latitude": 1.0, "longitude": 2.0},
            "venue": {
                "location": {"latitude": 1.0, "longitude": 2.0},
                "title": "Cafe",
                "address": "Main st"
            }
        }));
        assert_eq!(msg.content.kind_name(), "Venue");
    }

    #[test]
    fn test_live_location() {
        let msg = message_with(json!({
            "location": {"latitude": 1.0, "longitude": 2.0, "live_period": 60}
        }));
        assert_eq!(msg.content.kind_name(), "LiveLocation");
    }

    #[test]
    fn test_unknown_content_is_preserved() {
        let msg = message_with(json!({"new_chat_title": "Renamed"}));
        match &msg.content {
            MessageContent::Unknown(raw) => {
                assert_eq!(raw.get("new_chat_title"), Some(&json!("Renamed")));
            }
            other => panic!("unexpected content {:?}", other),
        }

        let back = serde_json::to_value(&msg).unwrap();
        assert_eq!(back["new_chat_title"], json!("Renamed"));
    }

    #[test]
    fn test_caption_is_flattened_on_serialize() {
        let msg = message_with(json!({
            "photo": [{"file_id": "p", "file_unique_id": "u", "width": 10, "height": 10}],
            "caption": "look"
        }));
        assert_eq!(msg.content.caption(), Some("look"));

        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["caption"], json!("look"));
        assert_eq!(value["photo"][0]["width"], json!(10));
    }

    #[test]
    fn test_unmodeled_fields_survive_a_round_trip() {
        let raw = json!({
            "message_id": 7,
            "date": 1,
            "chat": {"id": 5, "type": "private"},
            "text": "re",
            "caption_entities": [],
            "reply_to_message": {
                "message_id": 6, "date": 0,
                "chat": {"id": 5, "type": "private"},
                "text": "original"
            },
            "forward_origin": {"type": "hidden_user", "date": 0, "sender_user_name": "X"},
            "reply_markup": {"inline_keyboard": []}
        });
        let msg: Message = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(msg.content.kind_name(), "Text");
        assert!(msg.extra.contains_key("reply_to_message"));
        assert!(msg.extra.contains_key("forward_origin"));

        assert_eq!(serde_json::to_value(&msg).unwrap(), raw);
    }

    #[test]
    fn test_duplicate_keys_are_kept() {
        let file = json!({"file_id": "a", "file_unique_id": "u"});
        let msg = message_with(json!({"animation": file, "document": file}));
        let back = serde_json::to_value(&msg).unwrap();
        assert_eq!(back["document"], file);
        assert_eq!(back["animation"], file);
    }
}
