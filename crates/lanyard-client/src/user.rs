use chrono::{DateTime, Utc};
use lanyard_models::User;
use parking_lot::RwLock;

/// The global user record. One instance exists per user id no matter how
/// many guilds the user shares with us; the cache reference-counts it and
/// drops it when the last guild releases its reference.
#[derive(Debug)]
pub struct CachedUser {
    id: i64,
    data: RwLock<User>,
}

impl CachedUser {
    pub(crate) fn new(model: &User) -> Self {
        Self {
            id: model.id,
            data: RwLock::new(model.clone()),
        }
    }

    /// Overwrite the mutable profile fields from a newer payload.
    pub(crate) fn update(&self, model: &User) {
        *self.data.write() = model.clone();
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn username(&self) -> String {
        self.data.read().username.clone()
    }

    pub fn discriminator(&self) -> String {
        self.data.read().discriminator.clone()
    }

    pub fn avatar(&self) -> Option<String> {
        self.data.read().avatar.clone()
    }

    pub fn is_bot(&self) -> bool {
        self.data.read().bot
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        lanyard_util::snowflake::created_at(self.id)
    }
}
