use chrono::{DateTime, Utc};
use lanyard_models::Channel;

/// A channel as held by the global channel table. Channel updates replace
/// the whole entry, so the value itself is immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedChannel {
    pub id: i64,
    pub guild_id: Option<i64>,
    pub name: String,
    pub kind: i32,
    pub position: i32,
}

impl CachedChannel {
    pub fn from_model(model: &Channel) -> Self {
        Self {
            id: model.id,
            guild_id: model.guild_id,
            name: model.name.clone(),
            kind: model.kind,
            position: model.position,
        }
    }

    pub fn is_voice(&self) -> bool {
        self.kind == lanyard_models::channel::CHANNEL_VOICE
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        lanyard_util::snowflake::created_at(self.id)
    }
}
