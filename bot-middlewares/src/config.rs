use std::collections::HashSet;
use std::env;

pub mod env_vars {
    pub const BOT_LOG_URL: &str = "BOT_LOG_URL";
    pub const HOST: &str = "HOST";
    pub const BOT_APP_NAME: &str = "BOT_APP_NAME";
    pub const BOT_LOG_POOL_SIZE: &str = "BOT_LOG_POOL_SIZE";
    pub const BOT_LOG_CONSOLE: &str = "BOT_LOG_CONSOLE";
    pub const BOT_ALLOWED_USERS: &str = "BOT_ALLOWED_USERS";
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Address of the log store; the durable sink cannot be created without it
    pub bot_log_url: Option<String>,
    /// Label written to the `host` column
    pub host: String,
    pub app_name: String,
    pub pool_size: u32,
    pub console_logging: bool,
    pub allowed_users: HashSet<i64>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            bot_log_url: env::var(env_vars::BOT_LOG_URL).ok().filter(|s| !s.trim().is_empty()),
            host: env::var(env_vars::HOST).unwrap_or_else(|_| local_hostname()),
            app_name: env::var(env_vars::BOT_APP_NAME).unwrap_or_else(|_| "bot".to_string()),
            pool_size: env::var(env_vars::BOT_LOG_POOL_SIZE)
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(4),
            console_logging: env::var(env_vars::BOT_LOG_CONSOLE)
                .map(|s| parse_flag(&s))
                .unwrap_or(true),
            allowed_users: env::var(env_vars::BOT_ALLOWED_USERS)
                .map(|s| parse_user_ids(&s))
                .unwrap_or_default(),
        }
    }
}

/// Host name of this machine: `HOSTNAME`, then `/etc/hostname`, then `localhost`.
pub fn local_hostname() -> String {
    if let Ok(name) = env::var("HOSTNAME") {
        if !name.trim().is_empty() {
            return name.trim().to_string();
        }
    }
    std::fs::read_to_string("/etc/hostname")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

fn parse_user_ids(value: &str) -> HashSet<i64> {
    value
        .split(',')
        .filter_map(|part| {
            let part = part.trim();
            match part.parse() {
                Ok(id) => Some(id),
                Err(_) => {
                    if !part.is_empty() {
                        log::warn!("Ignoring invalid user id in {}: {}", env_vars::BOT_ALLOWED_USERS, part);
                    }
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("off"));
        assert!(!parse_flag(" FALSE "));
    }

    #[test]
    fn test_parse_user_ids_skips_garbage() {
        let ids = parse_user_ids("1, 2,abc,,3");
        assert_eq!(ids.len(), 3);
        assert!(ids.contains(&2));
    }

    #[test]
    fn test_local_hostname_is_never_empty() {
        assert!(!local_hostname().is_empty());
    }
}
