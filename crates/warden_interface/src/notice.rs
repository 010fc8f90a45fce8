//! Platform-neutral notification payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Colour of a blocked-action notice.
pub const BLOCKED_COLOR: u32 = 0xff0000;
/// Colour of an authorized-action notice.
pub const AUTHORIZED_COLOR: u32 = 0x00ff00;

/// A rendered notification, sent as an embed by the Discord sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    /// Heading
    pub title: String,
    /// Body text
    pub description: String,
    /// RGB accent colour
    pub color: u32,
    /// Key/value fields
    pub fields: Vec<NoticeField>,
    /// Footer line
    pub footer: String,
    /// When the recorded decision was made
    pub timestamp: DateTime<Utc>,
}

/// One field of a [`Notice`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeField {
    /// Field label
    pub name: String,
    /// Field value
    pub value: String,
    /// Render next to neighbouring fields
    pub inline: bool,
}

impl NoticeField {
    /// Inline field.
    pub fn inline(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline: true,
        }
    }
}
