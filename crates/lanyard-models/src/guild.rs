use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::emoji::Emoji;
use crate::member::Member;
use crate::presence::Presence;
use crate::role::Role;
use crate::voice::VoiceState;

/// Scalar guild metadata plus the lists that are rebuilt wholesale on every
/// guild update: roles, emoji, feature flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guild {
    pub id: i64,
    pub name: String,
    pub icon: Option<String>,
    pub splash: Option<String>,
    pub owner_id: i64,
    pub region: String,
    pub afk_channel_id: Option<i64>,
    pub afk_timeout: i32,
    pub verification_level: i32,
    pub mfa_level: i32,
    pub default_message_notifications: i32,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub emojis: Vec<Emoji>,
    #[serde(default)]
    pub features: Vec<String>,
}

/// The extended guild payload carried by GUILD_CREATE: full metadata plus
/// channel, member, presence, and voice-state lists.
///
/// When `unavailable` is set the remote service is reporting an outage for
/// this guild and the payload carries no usable content beyond the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildSnapshot {
    #[serde(flatten)]
    pub guild: Guild,
    /// Large guilds omit most members from the snapshot; the roster arrives
    /// via a later sync or an explicit member download.
    #[serde(default)]
    pub large: bool,
    #[serde(default)]
    pub unavailable: bool,
    #[serde(default)]
    pub member_count: i32,
    #[serde(default)]
    pub channels: Vec<Channel>,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub presences: Vec<Presence>,
    #[serde(default)]
    pub voice_states: Vec<VoiceState>,
}

/// The post-snapshot synchronization payload (GUILD_SYNC), sent only on
/// user-authenticated connections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildSync {
    pub guild_id: i64,
    #[serde(default)]
    pub large: bool,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub presences: Vec<Presence>,
}
