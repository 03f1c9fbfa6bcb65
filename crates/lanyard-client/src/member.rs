use std::sync::Arc;

use chrono::{DateTime, Utc};
use lanyard_models::{Member, Presence};

use crate::user::CachedUser;

/// Per-guild member state wrapping a shared global user record.
///
/// Values are immutable; an update builds a new `CachedMember` and replaces
/// the table entry, so concurrent readers never observe a half-applied
/// update.
#[derive(Debug, Clone)]
pub struct CachedMember {
    user: Arc<CachedUser>,
    nick: Option<String>,
    roles: Vec<i64>,
    joined_at: Option<DateTime<Utc>>,
    deaf: bool,
    mute: bool,
    status: Option<String>,
}

impl CachedMember {
    pub(crate) fn from_model(user: Arc<CachedUser>, model: &Member) -> Self {
        Self {
            user,
            nick: model.nick.clone(),
            roles: model.roles.clone(),
            joined_at: model.joined_at,
            deaf: model.deaf,
            mute: model.mute,
            status: None,
        }
    }

    /// A member first seen through a presence entry: no membership details
    /// yet, just the user and their status.
    pub(crate) fn from_presence(user: Arc<CachedUser>, presence: &Presence) -> Self {
        Self {
            user,
            nick: None,
            roles: Vec::new(),
            joined_at: None,
            deaf: false,
            mute: false,
            status: Some(presence.status.clone()),
        }
    }

    pub(crate) fn with_update(&self, model: &Member) -> Self {
        Self {
            user: Arc::clone(&self.user),
            nick: model.nick.clone(),
            roles: model.roles.clone(),
            joined_at: model.joined_at.or(self.joined_at),
            deaf: model.deaf,
            mute: model.mute,
            status: self.status.clone(),
        }
    }

    pub(crate) fn with_presence(&self, presence: &Presence) -> Self {
        let mut next = self.clone();
        next.status = Some(presence.status.clone());
        next
    }

    pub fn user(&self) -> &Arc<CachedUser> {
        &self.user
    }

    pub fn id(&self) -> i64 {
        self.user.id()
    }

    /// Nickname if set, otherwise the global username.
    pub fn display_name(&self) -> String {
        self.nick.clone().unwrap_or_else(|| self.user.username())
    }

    pub fn nick(&self) -> Option<&str> {
        self.nick.as_deref()
    }

    pub fn roles(&self) -> &[i64] {
        &self.roles
    }

    pub fn joined_at(&self) -> Option<DateTime<Utc>> {
        self.joined_at
    }

    pub fn is_deafened(&self) -> bool {
        self.deaf
    }

    pub fn is_muted(&self) -> bool {
        self.mute
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }
}
