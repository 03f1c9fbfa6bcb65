//! Inbound event dispatch and the outbound gateway seam.
//!
//! The connection owner decodes frames into [`GatewayEvent`] values and
//! feeds them to [`Cache::apply`]; requests the cache originates (voice
//! state updates, member download requests) go out through [`GatewaySink`].

use async_trait::async_trait;
use lanyard_models::GatewayEvent;

use crate::channel::CachedChannel;
use crate::error::GatewayError;
use crate::state::Cache;

/// Outbound control-channel requests. Implemented by the connection owner.
#[async_trait]
pub trait GatewaySink: Send + Sync {
    /// Announce the caller's voice state: join/move with `Some(channel_id)`,
    /// leave with `None`.
    async fn voice_state_update(
        &self,
        guild_id: i64,
        channel_id: Option<i64>,
        self_mute: bool,
        self_deaf: bool,
    ) -> Result<(), GatewayError>;

    /// Ask the server to stream the guild's full member roster in chunks.
    async fn request_guild_members(&self, guild_id: i64) -> Result<(), GatewayError>;
}

impl Cache {
    /// Apply one decoded gateway event to the cached view.
    ///
    /// Entity-level inconsistencies (events for unknown guilds, presences
    /// for unknown users) are logged and absorbed; they never escalate.
    pub async fn apply(&self, event: &GatewayEvent) {
        match event {
            GatewayEvent::Ready(ready) => {
                self.set_current_user(ready.user.clone());
            }

            GatewayEvent::GuildCreate(snapshot) => {
                let guild = self.ensure_guild(snapshot.guild.id);
                guild.apply_snapshot(self, snapshot);
            }
            GatewayEvent::GuildUpdate(model) => match self.guild(model.id) {
                Some(guild) => guild.apply_update(model),
                None => unknown_guild("GUILD_UPDATE", model.id),
            },
            GatewayEvent::GuildDelete(delete) => {
                if delete.unavailable {
                    // Outage, not removal: keep the cached data, stop
                    // trusting its completeness.
                    match self.guild(delete.id) {
                        Some(guild) => guild.set_unavailable(),
                        None => unknown_guild("GUILD_DELETE", delete.id),
                    }
                } else {
                    self.remove_guild(delete.id).await;
                }
            }
            GatewayEvent::GuildSync(sync) => match self.guild(sync.guild_id) {
                Some(guild) => guild.apply_sync(self, sync),
                None => unknown_guild("GUILD_SYNC", sync.guild_id),
            },
            GatewayEvent::GuildEmojisUpdate(update) => match self.guild(update.guild_id) {
                Some(guild) => guild.apply_emoji_update(&update.emojis),
                None => unknown_guild("GUILD_EMOJIS_UPDATE", update.guild_id),
            },

            GatewayEvent::ChannelCreate(model) | GatewayEvent::ChannelUpdate(model) => {
                match model.guild_id.and_then(|id| self.guild(id)) {
                    Some(guild) => {
                        guild.add_channel(self, model);
                    }
                    None => {
                        // Guild-less channels (DMs) only live in the global
                        // table.
                        self.put_channel(CachedChannel::from_model(model));
                    }
                }
            }
            GatewayEvent::ChannelDelete(model) => {
                match model.guild_id.and_then(|id| self.guild(id)) {
                    Some(guild) => {
                        guild.remove_channel(self, model.id);
                    }
                    None => {
                        self.remove_channel(model.id);
                    }
                }
            }

            GatewayEvent::GuildRoleCreate(create) | GatewayEvent::GuildRoleUpdate(create) => {
                match self.guild(create.guild_id) {
                    Some(guild) => {
                        guild.add_role(&create.role);
                    }
                    None => unknown_guild("GUILD_ROLE_CREATE", create.guild_id),
                }
            }
            GatewayEvent::GuildRoleDelete(delete) => match self.guild(delete.guild_id) {
                Some(guild) => {
                    guild.remove_role(delete.role_id);
                }
                None => unknown_guild("GUILD_ROLE_DELETE", delete.guild_id),
            },

            GatewayEvent::GuildMemberAdd(add) => match self.guild(add.guild_id) {
                Some(guild) => {
                    guild.add_or_update_member(self, &add.member);
                    guild.adjust_member_count(1);
                }
                None => unknown_guild("GUILD_MEMBER_ADD", add.guild_id),
            },
            GatewayEvent::GuildMemberUpdate(update) => match self.guild(update.guild_id) {
                Some(guild) => {
                    guild.add_or_update_member(self, &update.member);
                }
                None => unknown_guild("GUILD_MEMBER_UPDATE", update.guild_id),
            },
            GatewayEvent::GuildMemberRemove(remove) => match self.guild(remove.guild_id) {
                Some(guild) => {
                    guild.remove_member(self, remove.user.id);
                    guild.adjust_member_count(-1);
                }
                None => unknown_guild("GUILD_MEMBER_REMOVE", remove.guild_id),
            },
            GatewayEvent::GuildMembersChunk(chunk) => match self.guild(chunk.guild_id) {
                Some(guild) => guild.apply_member_chunk(self, &chunk.members),
                None => unknown_guild("GUILD_MEMBERS_CHUNK", chunk.guild_id),
            },

            GatewayEvent::PresenceUpdate(presence) => {
                match presence.guild_id.and_then(|id| self.guild(id)) {
                    Some(guild) => {
                        guild.add_or_update_presence(self, presence);
                    }
                    None => {
                        // Presence outside any cached guild still refreshes
                        // the global user record if we hold one.
                        self.touch_user(&presence.user);
                    }
                }
            }

            GatewayEvent::VoiceStateUpdate(state) => {
                let Some(guild) = state.guild_id.and_then(|id| self.guild(id)) else {
                    return;
                };
                if state.channel_id.is_some() {
                    guild.update_voice_state(self, state);
                } else {
                    // The user left every voice channel in the guild.
                    guild.remove_voice_state(state.user_id);
                }
            }
            GatewayEvent::VoiceServerUpdate(update) => {
                let Some(guild) = self.guild(update.guild_id) else {
                    unknown_guild("VOICE_SERVER_UPDATE", update.guild_id);
                    return;
                };
                let Some(endpoint) = update.endpoint.as_deref() else {
                    // Voice server still allocating; a follow-up event will
                    // carry the endpoint.
                    tracing::debug!(guild_id = update.guild_id, "voice endpoint not yet allocated");
                    return;
                };
                guild
                    .voice()
                    .finish_connect(self, &guild, endpoint, &update.token)
                    .await;
            }
        }
    }
}

fn unknown_guild(event: &str, guild_id: i64) {
    tracing::debug!(event, guild_id, "event for a guild not in the cache");
}
