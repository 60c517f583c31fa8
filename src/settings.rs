// src/settings.rs
//! Runtime settings on top of an opaque key-value store.
//!
//! Only `check_interval` (minutes) is tunable. Values are validated before
//! anything is written.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::AppConfig;

pub const CHECK_INTERVAL_MIN: u32 = 5;
pub const CHECK_INTERVAL_MAX: u32 = 1440;

const KEY_CHECK_INTERVAL: &str = "check_interval";

/// String key-value storage backing `Settings`.
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
}

#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    map: RwLock<HashMap<String, String>>,
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.map
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value);
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub check_interval: Option<i64>,
}

/// What the settings endpoint shows. The bot token is always masked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingsView {
    pub check_interval: u32,
    pub moderation_group_id: String,
    pub channel_id: String,
    pub bot_token: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("check_interval is required")]
    Missing,
    #[error("check_interval must be between {min} and {max} minutes, got {value}")]
    OutOfRange { value: i64, min: u32, max: u32 },
}

pub struct Settings {
    store: Box<dyn SettingsStore>,
    default_interval: u32,
    moderation_group_id: String,
    channel_id: String,
    bot_token_mask: &'static str,
}

impl Settings {
    pub fn new(store: Box<dyn SettingsStore>, cfg: &AppConfig) -> Self {
        Self {
            store,
            default_interval: cfg.check_interval_minutes,
            moderation_group_id: cfg.moderation_chat_id.clone(),
            channel_id: cfg.publish_channel_id.clone(),
            bot_token_mask: cfg.masked_bot_token(),
        }
    }

    /// In-memory store seeded from config.
    pub fn in_memory(cfg: &AppConfig) -> Self {
        Self::new(Box::<MemorySettingsStore>::default(), cfg)
    }

    /// Current interval in minutes. A stored value that no longer parses or is
    /// out of range reads as the configured default.
    pub fn check_interval(&self) -> u32 {
        self.store
            .get(KEY_CHECK_INTERVAL)
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|m| (CHECK_INTERVAL_MIN..=CHECK_INTERVAL_MAX).contains(m))
            .unwrap_or(self.default_interval)
    }

    pub fn view(&self) -> SettingsView {
        SettingsView {
            check_interval: self.check_interval(),
            moderation_group_id: self.moderation_group_id.clone(),
            channel_id: self.channel_id.clone(),
            bot_token: self.bot_token_mask,
        }
    }

    pub fn save(&self, update: SettingsUpdate) -> Result<SettingsView, SettingsError> {
        let value = update.check_interval.ok_or(SettingsError::Missing)?;
        let minutes = u32::try_from(value)
            .ok()
            .filter(|m| (CHECK_INTERVAL_MIN..=CHECK_INTERVAL_MAX).contains(m))
            .ok_or(SettingsError::OutOfRange {
                value,
                min: CHECK_INTERVAL_MIN,
                max: CHECK_INTERVAL_MAX,
            })?;
        self.store.set(KEY_CHECK_INTERVAL, minutes.to_string());
        info!(check_interval = minutes, "settings saved");
        Ok(self.view())
    }
}
