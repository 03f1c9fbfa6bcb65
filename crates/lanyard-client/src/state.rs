//! Shared cache state: the guild registry and the guild-independent global
//! tables (channels, reference-counted users).

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use lanyard_models::User;
use parking_lot::RwLock;

use crate::channel::CachedChannel;
use crate::gateway::GatewaySink;
use crate::guild::CachedGuild;
use crate::user::CachedUser;
use crate::voice::MediaTransport;

/// How the connection authenticated. Readiness barrier resolution depends on
/// it: automated clients are synced by the snapshot itself, human-user
/// connections wait for a dedicated GUILD_SYNC event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthKind {
    Bot,
    User,
}

struct UserEntry {
    user: Arc<CachedUser>,
    /// Number of guilds currently holding this user as a member.
    refs: u32,
}

/// The cache root. Owns the guild registry, the global channel table, and
/// the reference-counted global user table, plus the injected seams the
/// voice coordinator talks through.
pub struct Cache {
    auth: AuthKind,
    gateway: Arc<dyn GatewaySink>,
    media: Arc<dyn MediaTransport>,
    current_user: RwLock<Option<User>>,
    channels: DashMap<i64, Arc<CachedChannel>>,
    users: DashMap<i64, UserEntry>,
    guilds: DashMap<i64, Arc<CachedGuild>>,
}

impl Cache {
    pub fn new(
        auth: AuthKind,
        gateway: Arc<dyn GatewaySink>,
        media: Arc<dyn MediaTransport>,
    ) -> Self {
        Self {
            auth,
            gateway,
            media,
            current_user: RwLock::new(None),
            channels: DashMap::new(),
            users: DashMap::new(),
            guilds: DashMap::new(),
        }
    }

    pub fn auth(&self) -> AuthKind {
        self.auth
    }

    pub(crate) fn gateway(&self) -> &Arc<dyn GatewaySink> {
        &self.gateway
    }

    pub(crate) fn media(&self) -> &Arc<dyn MediaTransport> {
        &self.media
    }

    /// Record the authenticated user, delivered by the READY event.
    pub fn set_current_user(&self, user: User) {
        *self.current_user.write() = Some(user);
    }

    pub fn current_user(&self) -> Option<User> {
        self.current_user.read().clone()
    }

    pub fn current_user_id(&self) -> Option<i64> {
        self.current_user.read().as_ref().map(|user| user.id)
    }

    // Channels

    pub fn channel(&self, id: i64) -> Option<Arc<CachedChannel>> {
        self.channels.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    pub(crate) fn put_channel(&self, channel: CachedChannel) -> Arc<CachedChannel> {
        let channel = Arc::new(channel);
        self.channels.insert(channel.id, Arc::clone(&channel));
        channel
    }

    pub(crate) fn remove_channel(&self, id: i64) -> Option<Arc<CachedChannel>> {
        self.channels.remove(&id).map(|(_, channel)| channel)
    }

    // Users

    /// Look up a global user without taking a reference.
    pub fn user(&self, id: i64) -> Option<Arc<CachedUser>> {
        self.users.get(&id).map(|entry| Arc::clone(&entry.user))
    }

    /// Take a guild reference on the global user record, creating it on
    /// first sight and refreshing its profile fields otherwise. Every call
    /// must be paired with a later [`Cache::release_user`].
    pub(crate) fn acquire_user(&self, model: &User) -> Arc<CachedUser> {
        match self.users.entry(model.id) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                entry.refs += 1;
                entry.user.update(model);
                Arc::clone(&entry.user)
            }
            Entry::Vacant(vacant) => {
                let user = Arc::new(CachedUser::new(model));
                vacant.insert(UserEntry {
                    user: Arc::clone(&user),
                    refs: 1,
                });
                user
            }
        }
    }

    /// Refresh profile fields without touching the reference count.
    pub(crate) fn touch_user(&self, model: &User) {
        if let Some(entry) = self.users.get(&model.id) {
            entry.user.update(model);
        }
    }

    /// Drop one guild reference; the record is destroyed when the last
    /// reference goes.
    pub(crate) fn release_user(&self, id: i64) {
        if let Entry::Occupied(mut occupied) = self.users.entry(id) {
            let entry = occupied.get_mut();
            entry.refs = entry.refs.saturating_sub(1);
            if entry.refs == 0 {
                occupied.remove();
            }
        }
    }

    // Guilds

    pub fn guild(&self, id: i64) -> Option<Arc<CachedGuild>> {
        self.guilds.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn guilds(&self) -> Vec<Arc<CachedGuild>> {
        self.guilds
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// The guild for an id, created empty on first reference. Guilds come
    /// into existence with the first snapshot event naming them.
    pub(crate) fn ensure_guild(&self, id: i64) -> Arc<CachedGuild> {
        match self.guilds.entry(id) {
            Entry::Occupied(occupied) => Arc::clone(occupied.get()),
            Entry::Vacant(vacant) => {
                let guild = Arc::new(CachedGuild::new(id));
                vacant.insert(Arc::clone(&guild));
                tracing::debug!(guild_id = id, "guild created");
                guild
            }
        }
    }

    /// Drop a guild and everything it holds: member references on global
    /// users, channel registrations, and any live voice session.
    pub(crate) async fn remove_guild(&self, id: i64) -> Option<Arc<CachedGuild>> {
        let (_, guild) = self.guilds.remove(&id)?;
        guild.voice().disconnect().await;
        for member in guild.members() {
            self.release_user(member.id());
        }
        for channel_id in guild.channel_ids() {
            self.remove_channel(channel_id);
        }
        tracing::debug!(guild_id = id, "guild removed");
        Some(guild)
    }
}
