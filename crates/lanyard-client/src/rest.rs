//! The REST seam: thin request forwarders keyed by guild id.
//!
//! The cache never performs HTTP itself; the connection owner injects a
//! [`Rest`] implementation and [`CachedGuild`] forwards its own id into it.

use async_trait::async_trait;
use lanyard_models::{Channel, Guild, Role, User};
use serde::{Deserialize, Serialize};

use crate::error::RestError;
use crate::guild::CachedGuild;

/// Fields of a guild that can be modified remotely. `None` leaves a field
/// untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GuildEdit {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub region: Option<String>,
    pub afk_channel_id: Option<i64>,
    pub afk_timeout: Option<i32>,
    pub verification_level: Option<i32>,
    pub default_message_notifications: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RoleEdit {
    pub name: Option<String>,
    pub permissions: Option<i64>,
    pub color: Option<i32>,
    pub hoist: Option<bool>,
    pub mentionable: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ban {
    pub user: User,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Invite {
    pub code: String,
    pub channel_id: i64,
    pub uses: i32,
    pub max_uses: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Integration {
    pub id: i64,
    pub name: String,
    pub kind: String,
    pub enabled: bool,
}

/// Request/response operations against the remote service.
#[async_trait]
pub trait Rest: Send + Sync {
    async fn modify_guild(&self, guild_id: i64, edit: GuildEdit) -> Result<Guild, RestError>;
    async fn delete_guild(&self, guild_id: i64) -> Result<(), RestError>;

    async fn bans(&self, guild_id: i64) -> Result<Vec<Ban>, RestError>;
    async fn add_ban(&self, guild_id: i64, user_id: i64, prune_days: i32) -> Result<(), RestError>;
    async fn remove_ban(&self, guild_id: i64, user_id: i64) -> Result<(), RestError>;

    async fn create_channel(&self, guild_id: i64, name: &str, kind: i32) -> Result<Channel, RestError>;
    async fn create_role(&self, guild_id: i64, edit: RoleEdit) -> Result<Role, RestError>;

    /// Kick members inactive for `days`; `simulate` only counts them.
    async fn prune_members(&self, guild_id: i64, days: i32, simulate: bool) -> Result<i32, RestError>;

    async fn integrations(&self, guild_id: i64) -> Result<Vec<Integration>, RestError>;
    async fn invites(&self, guild_id: i64) -> Result<Vec<Invite>, RestError>;
}

impl CachedGuild {
    pub async fn modify(&self, rest: &dyn Rest, edit: GuildEdit) -> Result<Guild, RestError> {
        rest.modify_guild(self.id(), edit).await
    }

    pub async fn delete(&self, rest: &dyn Rest) -> Result<(), RestError> {
        rest.delete_guild(self.id()).await
    }

    pub async fn bans(&self, rest: &dyn Rest) -> Result<Vec<Ban>, RestError> {
        rest.bans(self.id()).await
    }

    pub async fn add_ban(
        &self,
        rest: &dyn Rest,
        user_id: i64,
        prune_days: i32,
    ) -> Result<(), RestError> {
        rest.add_ban(self.id(), user_id, prune_days).await
    }

    pub async fn remove_ban(&self, rest: &dyn Rest, user_id: i64) -> Result<(), RestError> {
        rest.remove_ban(self.id(), user_id).await
    }

    pub async fn create_text_channel(
        &self,
        rest: &dyn Rest,
        name: &str,
    ) -> Result<Channel, RestError> {
        rest.create_channel(self.id(), name, lanyard_models::channel::CHANNEL_TEXT)
            .await
    }

    pub async fn create_voice_channel(
        &self,
        rest: &dyn Rest,
        name: &str,
    ) -> Result<Channel, RestError> {
        rest.create_channel(self.id(), name, lanyard_models::channel::CHANNEL_VOICE)
            .await
    }

    pub async fn create_role(&self, rest: &dyn Rest, edit: RoleEdit) -> Result<Role, RestError> {
        rest.create_role(self.id(), edit).await
    }

    pub async fn prune_members(
        &self,
        rest: &dyn Rest,
        days: i32,
        simulate: bool,
    ) -> Result<i32, RestError> {
        rest.prune_members(self.id(), days, simulate).await
    }

    pub async fn integrations(&self, rest: &dyn Rest) -> Result<Vec<Integration>, RestError> {
        rest.integrations(self.id()).await
    }

    pub async fn invites(&self, rest: &dyn Rest) -> Result<Vec<Invite>, RestError> {
        rest.invites(self.id()).await
    }
}
