use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceState {
    pub user_id: i64,
    pub channel_id: Option<i64>,
    pub guild_id: Option<i64>,
    pub session_id: String,
    #[serde(default)]
    pub deaf: bool,
    #[serde(default)]
    pub mute: bool,
    #[serde(default)]
    pub self_deaf: bool,
    #[serde(default)]
    pub self_mute: bool,
    #[serde(default)]
    pub suppress: bool,
}

/// Session-ready parameters for the voice handshake, delivered after the
/// server acknowledges an outbound voice-state update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceServerUpdate {
    pub guild_id: i64,
    /// `None` while the voice server is being allocated; a follow-up event
    /// carries the final endpoint.
    pub endpoint: Option<String>,
    pub token: String,
}
