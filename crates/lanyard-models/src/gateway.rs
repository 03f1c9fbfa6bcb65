use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::emoji::Emoji;
use crate::guild::{Guild, GuildSnapshot, GuildSync};
use crate::member::Member;
use crate::presence::Presence;
use crate::user::User;
use crate::voice::{VoiceServerUpdate, VoiceState};

/// A decoded dispatch event. The tag mirrors the `t` field of the wire
/// frame, the payload its `d` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", content = "d", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GatewayEvent {
    Ready(Ready),
    GuildCreate(GuildSnapshot),
    GuildUpdate(Guild),
    GuildDelete(GuildDelete),
    GuildSync(GuildSync),
    GuildEmojisUpdate(GuildEmojisUpdate),
    ChannelCreate(Channel),
    ChannelUpdate(Channel),
    ChannelDelete(Channel),
    GuildRoleCreate(GuildRoleCreate),
    GuildRoleUpdate(GuildRoleCreate),
    GuildRoleDelete(GuildRoleDelete),
    GuildMemberAdd(GuildMemberAdd),
    GuildMemberUpdate(GuildMemberAdd),
    GuildMemberRemove(GuildMemberRemove),
    GuildMembersChunk(GuildMembersChunk),
    PresenceUpdate(Presence),
    VoiceStateUpdate(VoiceState),
    VoiceServerUpdate(VoiceServerUpdate),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ready {
    pub user: User,
    #[serde(default)]
    pub session_id: String,
}

/// `unavailable: true` means an outage, not a removal; the guild stays
/// cached but its contents can no longer be trusted to be complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildDelete {
    pub id: i64,
    #[serde(default)]
    pub unavailable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildEmojisUpdate {
    pub guild_id: i64,
    #[serde(default)]
    pub emojis: Vec<Emoji>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildRoleCreate {
    pub guild_id: i64,
    pub role: crate::role::Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildRoleDelete {
    pub guild_id: i64,
    pub role_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildMemberAdd {
    pub guild_id: i64,
    #[serde(flatten)]
    pub member: Member,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildMemberRemove {
    pub guild_id: i64,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildMembersChunk {
    pub guild_id: i64,
    #[serde(default)]
    pub members: Vec<Member>,
}
