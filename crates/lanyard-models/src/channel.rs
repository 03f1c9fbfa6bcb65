use serde::{Deserialize, Serialize};

/// Channel kinds carried in the `kind` field.
pub const CHANNEL_TEXT: i32 = 0;
pub const CHANNEL_VOICE: i32 = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: i64,
    pub guild_id: Option<i64>,
    pub name: String,
    pub kind: i32,
    #[serde(default)]
    pub position: i32,
}
