//! Allow list of users permitted to talk to the bot.

use bot_api_types::Update;
use std::collections::HashSet;
use std::fmt;

use crate::config::Config;

/// Returned when a user is not on the allow list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessDenied;

impl fmt::Display for AccessDenied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("User access restricted")
    }
}

impl std::error::Error for AccessDenied {}

#[derive(Debug, Clone, Default)]
pub struct AccessList {
    allowed: HashSet<i64>,
}

impl AccessList {
    pub fn new(allowed: impl IntoIterator<Item = i64>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.allowed_users.iter().copied())
    }

    pub fn check(&self, user_id: i64) -> Result<(), AccessDenied> {
        if self.allowed.contains(&user_id) {
            Ok(())
        } else {
            log::info!("[ACCESS] Denied user {}", user_id);
            Err(AccessDenied)
        }
    }

    /// Check the user who sent the update. Updates without one are denied.
    pub fn check_update(&self, update: &Update) -> Result<(), AccessDenied> {
        match update.kind.sender() {
            Some(user) => self.check(user.id),
            None => {
                log::info!("[ACCESS] Denied update {} without a sender", update.update_id);
                Err(AccessDenied)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn update(value: serde_json::Value) -> Update {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_check() {
        let access = AccessList::new([1, 2]);
        assert!(access.check(1).is_ok());
        assert_eq!(access.check(3), Err(AccessDenied));
        assert_eq!(AccessDenied.to_string(), "User access restricted");
    }

    #[test]
    fn test_check_update_uses_sender() {
        let access = AccessList::new([7]);
        let allowed = update(json!({"update_id": 1, "callback_query": {
            "id": "c", "from": {"id": 7, "first_name": "A"}, "chat_instance": "i"
        }}));
        let denied = update(json!({"update_id": 2, "inline_query": {
            "id": "q", "from": {"id": 8, "first_name": "B"}, "query": "", "offset": ""
        }}));
        assert!(access.check_update(&allowed).is_ok());
        assert!(access.check_update(&denied).is_err());
    }

    #[test]
    fn test_update_without_sender_is_denied() {
        let access = AccessList::new([7]);
        let poll = update(json!({"update_id": 3, "poll": {
            "id": "p", "question": "?", "options": [], "total_voter_count": 0
        }}));
        assert_eq!(access.check_update(&poll), Err(AccessDenied));
    }

    #[test]
    fn test_empty_list_denies_everyone() {
        let access = AccessList::default();
        assert!(access.is_empty());
        assert!(access.check(1).is_err());
    }
}
