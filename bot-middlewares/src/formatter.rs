//! One-line, human-readable rendering of incoming updates for the console.
//!
//! Lines look like `"<actor> - <summary>"`. The actor comes from the
//! registry's actor rule; users render as `id(first last)`, chats as their id.

use bot_api_types::message::{FileRef, Poll};
use bot_api_types::{Chat, Message, MessageContent, Update, UpdateKind, User};
use serde_json::Value;

use crate::error::LogError;
use crate::registry::{ActorRule, Loggable};

pub fn format_user(user: Option<&User>) -> String {
    user.map(|u| format!("{}({})", u.id, u.full_name()))
        .unwrap_or_default()
}

pub fn format_chat(chat: Option<&Chat>) -> String {
    chat.map(|c| c.id.to_string()).unwrap_or_default()
}

/// Render an update, or fail with `LogError::Format` when its type is unknown.
pub fn format_update(update: &Update) -> Result<String, LogError> {
    let descriptor = update.descriptor();
    let summary = summarize(&update.kind).ok_or_else(|| LogError::Format {
        type_name: descriptor.label.to_string(),
    })?;

    let actor = match descriptor.actor {
        ActorRule::Sender => format_user(update.kind.sender()),
        ActorRule::Subject => format_user(update.kind.subject()),
        ActorRule::Chat => format_chat(update.kind.chat()),
        ActorRule::None => String::new(),
    };

    Ok(format!("{} - {}", actor, summary))
}

fn summarize(kind: &UpdateKind) -> Option<String> {
    let summary = match kind {
        UpdateKind::Message(m) | UpdateKind::ChannelPost(m) | UpdateKind::BusinessMessage(m) => {
            format!("Receive: {}", format_content(m))
        }
        UpdateKind::EditedMessage(m)
        | UpdateKind::EditedChannelPost(m)
        | UpdateKind::EditedBusinessMessage(m) => format!("Edit: {}", format_content(m)),
        UpdateKind::InlineQuery(q) => {
            format!("InlineQuery(id={}, query={:?}, offset={:?})", q.id, q.query, q.offset)
        }
        UpdateKind::ChosenInlineResult(r) => {
            format!("ChosenInlineResult(result_id={}, query={:?})", r.result_id, r.query)
        }
        UpdateKind::CallbackQuery(q) => {
            let payload = q
                .data
                .as_deref()
                .or(q.game_short_name.as_deref())
                .unwrap_or("");
            format!("CallbackQuery(id={}, data={:?})", q.id, payload)
        }
        UpdateKind::ShippingQuery(q) => {
            format!("ShippingQuery(id={}, payload={:?})", q.id, q.invoice_payload)
        }
        UpdateKind::PreCheckoutQuery(q) => format!(
            "PreCheckoutQuery(id={}, amount={} {}, payload={:?})",
            q.id, q.total_amount, q.currency, q.invoice_payload
        ),
        UpdateKind::Poll(p) => format_poll(p),
        UpdateKind::PollAnswer(a) => {
            format!("PollAnswer(poll_id={}, options={:?})", a.poll_id, a.option_ids)
        }
        UpdateKind::MyChatMember(u) | UpdateKind::ChatMember(u) => format!(
            "ChatMemberUpdated(chat={}, {} -> {})",
            u.chat.id, u.old_chat_member.status, u.new_chat_member.status
        ),
        UpdateKind::ChatJoinRequest(r) => format!(
            "ChatJoinRequest(chat={}, bio={:?})",
            r.chat.id,
            r.bio.as_deref().unwrap_or("")
        ),
        UpdateKind::MessageReaction(r) => format!(
            "MessageReaction(message_id={}, old=[{}], new=[{}])",
            r.message_id,
            reaction_emojis(&r.old_reaction),
            reaction_emojis(&r.new_reaction)
        ),
        UpdateKind::MessageReactionCount(r) => format!(
            "MessageReactionCount(message_id={}, reactions={})",
            r.message_id,
            r.reactions.len()
        ),
        UpdateKind::ChatBoost(b) => format!(
            "ChatBoostUpdated(boost_id={})",
            b.boost.get("boost_id").and_then(Value::as_str).unwrap_or("?")
        ),
        UpdateKind::RemovedChatBoost(b) => format!(
            "ChatBoostRemoved(boost_id={}, remove_date={})",
            b.boost_id, b.remove_date
        ),
        UpdateKind::BusinessConnection(c) => format!(
            "BusinessConnection(id={}, enabled={}, can_reply={})",
            c.id, c.is_enabled, c.can_reply
        ),
        UpdateKind::DeletedBusinessMessages(d) => format!(
            "DeletedBusinessMessages(connection={}, message_ids={:?})",
            d.business_connection_id, d.message_ids
        ),
        UpdateKind::PurchasedPaidMedia(p) => {
            format!("PaidMediaPurchased(payload={:?})", p.paid_media_payload)
        }
        UpdateKind::Unknown(_) => return None,
    };
    Some(summary)
}

/// Summary of what a message carries. Unknown content is still rendered,
/// with a diagnostic naming its fields.
pub fn format_content(message: &Message) -> String {
    let content = &message.content;
    let base = match content {
        MessageContent::Text { text, .. } => format!("Text({})", text),
        MessageContent::Photo { photo, .. } => match photo.iter().max_by_key(|p| u64::from(p.width) * u64::from(p.height)) {
            Some(largest) => format!("Photo({}x{})", largest.width, largest.height),
            None => "Photo".to_string(),
        },
        MessageContent::Animation { animation, .. } => format_file("Animation", animation),
        MessageContent::Video { video, .. } => format_file("Video", video),
        MessageContent::VideoNote(note) => format_file("VideoNote", note),
        MessageContent::Audio { audio, .. } => format_file("Audio", audio),
        MessageContent::Document { document, .. } => format_file("Document", document),
        MessageContent::Voice { voice, .. } => format_file("Voice", voice),
        MessageContent::Sticker(s) => match (&s.emoji, &s.set_name) {
            (Some(emoji), Some(set)) => format!("Sticker({} {})", emoji, set),
            (Some(emoji), None) => format!("Sticker({})", emoji),
            (None, Some(set)) => format!("Sticker({})", set),
            (None, None) => "Sticker".to_string(),
        },
        MessageContent::Contact(c) => format!(
            "Contact({}{}, {})",
            c.first_name,
            c.last_name.as_deref().map(|l| format!(" {}", l)).unwrap_or_default(),
            c.phone_number
        ),
        MessageContent::Dice(d) => format!("Dice({} = {})", d.emoji, d.value),
        MessageContent::Game(g) => format!("Game({})", g.title),
        MessageContent::Giveaway(g) => {
            format!("Giveaway(winners={}, chats={})", g.winner_count, g.chats.len())
        }
        MessageContent::GiveawayWinners(w) => format!(
            "GiveawayWinners(message_id={}, winners={})",
            w.giveaway_message_id, w.winner_count
        ),
        MessageContent::Invoice(i) => {
            format!("Invoice({}, {} {})", i.title, i.total_amount, i.currency)
        }
        MessageContent::Location(l) => format!("Location({}, {})", l.latitude, l.longitude),
        MessageContent::LiveLocation(l) => format!(
            "LiveLocation({}, {}, {}s)",
            l.latitude,
            l.longitude,
            l.live_period.unwrap_or(0)
        ),
        MessageContent::Venue(v) => format!("Venue({}, {})", v.title, v.address),
        MessageContent::Poll(p) => format_poll(p),
        MessageContent::Story(s) => format!("Story({}/{})", s.chat.id, s.id),
        MessageContent::PaidMedia(p) => {
            format!("PaidMedia({} items, {} stars)", p.paid_media.len(), p.star_count)
        }
        MessageContent::Unknown(raw) => {
            let keys: Vec<&str> = raw.keys().map(String::as_str).collect();
            log::info!("[CONSOLE_LOG] Unknown content type: {}", keys.join(","));
            format!("<unknown content: {}>", keys.join(","))
        }
    };

    match content.caption() {
        Some(caption) => format!("{} {:?}", base, caption),
        None => base,
    }
}

fn format_file(kind: &str, file: &FileRef) -> String {
    let name = file.file_name.as_deref().unwrap_or(&file.file_id);
    match file.duration {
        Some(secs) => format!("{}({}, {}s)", kind, name, secs),
        None => format!("{}({})", kind, name),
    }
}

fn format_poll(poll: &Poll) -> String {
    let options: Vec<String> = poll
        .options
        .iter()
        .map(|o| format!("{}:{}", o.text, o.voter_count))
        .collect();
    format!(
        "Poll({:?} [{}]{})",
        poll.question,
        options.join(", "),
        if poll.is_closed { " closed" } else { "" }
    )
}

fn reaction_emojis(reactions: &[Value]) -> String {
    reactions
        .iter()
        .map(|r| {
            r.get("emoji")
                .or_else(|| r.get("custom_emoji_id"))
                .and_then(Value::as_str)
                .or_else(|| r.get("type").and_then(Value::as_str))
                .unwrap_or("?")
                .to_string()
        })
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ada() -> Value {
        json!({"id": 42, "is_bot": false, "first_name": "Ada", "last_name": "Lovelace"})
    }

    fn update(value: Value) -> Update {
        serde_json::from_value(value).unwrap()
    }

    fn message(extra: Value) -> Value {
        let mut base = json!({
            "message_id": 1,
            "date": 0,
            "chat": {"id": 42, "type": "private", "first_name": "Ada"},
            "from": ada()
        });
        if let (Some(base), Some(extra)) = (base.as_object_mut(), extra.as_object()) {
            base.extend(extra.clone());
        }
        base
    }

    #[test]
    fn test_text_message() {
        let u = update(json!({"update_id": 1, "message": message(json!({"text": "hi"}))}));
        assert_eq!(format_update(&u).unwrap(), "42(Ada Lovelace) - Receive: Text(hi)");
    }

    #[test]
    fn test_edited_message() {
        let u = update(json!({"update_id": 1, "edited_message": message(json!({"text": "fixed"}))}));
        assert_eq!(format_update(&u).unwrap(), "42(Ada Lovelace) - Edit: Text(fixed)");
    }

    #[test]
    fn test_photo_with_caption_uses_largest_size() {
        let u = update(json!({"update_id": 1, "message": message(json!({
            "photo": [
                {"file_id": "s", "file_unique_id": "s", "width": 90, "height": 90},
                {"file_id": "l", "file_unique_id": "l", "width": 800, "height": 600}
            ],
            "caption": "cat"
        }))}));
        assert_eq!(
            format_update(&u).unwrap(),
            "42(Ada Lovelace) - Receive: Photo(800x600) \"cat\""
        );
    }

    #[test]
    fn test_callback_query() {
        let u = update(json!({"update_id": 2, "callback_query": {
            "id": "cb", "from": ada(), "chat_instance": "x", "data": "yes"
        }}));
        assert_eq!(
            format_update(&u).unwrap(),
            "42(Ada Lovelace) - CallbackQuery(id=cb, data=\"yes\")"
        );
    }

    #[test]
    fn test_poll_has_no_actor() {
        let u = update(json!({"update_id": 3, "poll": {
            "id": "p", "question": "Tea?", "total_voter_count": 1,
            "options": [{"text": "yes", "voter_count": 1}, {"text": "no", "voter_count": 0}]
        }}));
        assert_eq!(format_update(&u).unwrap(), " - Poll(\"Tea?\" [yes:1, no:0])");
    }

    #[test]
    fn test_chat_boost_actor_is_chat() {
        let u = update(json!({"update_id": 4, "chat_boost": {
            "chat": {"id": -100, "type": "channel", "title": "News"},
            "boost": {"boost_id": "b1"}
        }}));
        assert_eq!(format_update(&u).unwrap(), "-100 - ChatBoostUpdated(boost_id=b1)");
    }

    #[test]
    fn test_member_update_actor_is_member() {
        let u = update(json!({"update_id": 5, "my_chat_member": {
            "chat": {"id": -5, "type": "group", "title": "G"},
            "from": {"id": 1, "first_name": "Admin"},
            "date": 0,
            "old_chat_member": {"status": "member", "user": ada()},
            "new_chat_member": {"status": "kicked", "user": ada()}
        }}));
        assert_eq!(
            format_update(&u).unwrap(),
            "42(Ada Lovelace) - ChatMemberUpdated(chat=-5, member -> kicked)"
        );
    }

    #[test]
    fn test_unknown_update_is_a_format_error() {
        let u = update(json!({"update_id": 6, "brand_new": {}}));
        assert_eq!(
            format_update(&u),
            Err(LogError::Format { type_name: "UnknownUpdate".to_string() })
        );
    }

    #[test]
    fn test_unknown_content_still_renders() {
        let u = update(json!({"update_id": 7, "message": message(json!({"new_chat_title": "T"}))}));
        assert_eq!(
            format_update(&u).unwrap(),
            "42(Ada Lovelace) - Receive: <unknown content: new_chat_title>"
        );
    }

    #[test]
    fn test_format_user_without_last_name() {
        let user: User = serde_json::from_value(json!({"id": 9, "first_name": "Bo"})).unwrap();
        assert_eq!(format_user(Some(&user)), "9(Bo)");
        assert_eq!(format_user(None), "");
    }
}
