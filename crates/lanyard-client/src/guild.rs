//! The per-guild state container.
//!
//! Applies snapshot, sync, and incremental gateway events to the cached
//! view and exposes non-blocking lookups plus the two readiness barriers
//! that gate consumers until the view is trustworthy.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use lanyard_models::{
    Channel, Emoji, Guild, GuildSnapshot, GuildSync, Member, Presence, Role, VoiceState,
};
use parking_lot::RwLock;

use crate::channel::CachedChannel;
use crate::collections::{SwapMap, SwapSet};
use crate::error::GatewayError;
use crate::member::CachedMember;
use crate::signal::OnceSignal;
use crate::state::{AuthKind, Cache};
use crate::voice::VoiceCoordinator;

/// Scalar guild attributes, swapped wholesale on every metadata update.
#[derive(Debug, Clone, Default)]
pub struct GuildMeta {
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
}

impl GuildMeta {
    fn from_model(model: &Guild) -> Self {
        Self {
            name: model.name.clone(),
            icon: model.icon.clone(),
            splash: model.splash.clone(),
            owner_id: model.owner_id,
            region: model.region.clone(),
            afk_channel_id: model.afk_channel_id,
            afk_timeout: model.afk_timeout,
            verification_level: model.verification_level,
            mfa_level: model.mfa_level,
            default_message_notifications: model.default_message_notifications,
        }
    }
}

/// A user's voice presence in this guild. The channel reference is resolved
/// against the global channel table when the event is applied, not cached
/// across events; an unresolvable channel is stored as `None`.
#[derive(Debug, Clone)]
pub struct CachedVoiceState {
    pub user_id: i64,
    pub session_id: String,
    pub channel: Option<Arc<CachedChannel>>,
    pub deaf: bool,
    pub mute: bool,
    pub self_deaf: bool,
    pub self_mute: bool,
    pub suppress: bool,
}

impl CachedVoiceState {
    fn resolve(cache: &Cache, model: &VoiceState) -> Self {
        let channel = model.channel_id.and_then(|id| cache.channel(id));
        if channel.is_none() && model.channel_id.is_some() {
            tracing::warn!(
                user_id = model.user_id,
                channel_id = model.channel_id,
                "voice state references a channel missing from the cache"
            );
        }
        Self {
            user_id: model.user_id,
            session_id: model.session_id.clone(),
            channel,
            deaf: model.deaf,
            mute: model.mute,
            self_deaf: model.self_deaf,
            self_mute: model.self_mute,
            suppress: model.suppress,
        }
    }

    pub fn channel_id(&self) -> Option<i64> {
        self.channel.as_ref().map(|channel| channel.id)
    }
}

/// The cached state of one guild.
pub struct CachedGuild {
    id: i64,
    available: AtomicBool,
    meta: RwLock<Arc<GuildMeta>>,
    emojis: RwLock<Arc<Vec<Emoji>>>,
    features: RwLock<Arc<Vec<String>>>,
    channels: SwapSet<i64>,
    roles: SwapMap<i64, Arc<Role>>,
    members: SwapMap<i64, Arc<CachedMember>>,
    voice_states: SwapMap<i64, Arc<CachedVoiceState>>,
    /// Server-reported roster size; an estimate for large guilds.
    member_count: AtomicI64,
    /// Members actually present in the table. Kept in lockstep with every
    /// insert and remove.
    downloaded_members: AtomicI64,
    sync_signal: RwLock<Arc<OnceSignal<()>>>,
    download_signal: RwLock<Arc<OnceSignal<()>>>,
    voice: VoiceCoordinator,
}

impl CachedGuild {
    pub(crate) fn new(id: i64) -> Self {
        Self {
            id,
            available: AtomicBool::new(false),
            meta: RwLock::new(Arc::new(GuildMeta::default())),
            emojis: RwLock::new(Arc::new(Vec::new())),
            features: RwLock::new(Arc::new(Vec::new())),
            channels: SwapSet::new(),
            roles: SwapMap::new(),
            members: SwapMap::new(),
            voice_states: SwapMap::new(),
            member_count: AtomicI64::new(0),
            downloaded_members: AtomicI64::new(0),
            sync_signal: RwLock::new(Arc::new(OnceSignal::new())),
            download_signal: RwLock::new(Arc::new(OnceSignal::new())),
            voice: VoiceCoordinator::new(id),
        }
    }

    // Event application

    /// Apply a full guild snapshot (GUILD_CREATE).
    pub(crate) fn apply_snapshot(&self, cache: &Cache, snapshot: &GuildSnapshot) {
        self.available.store(!snapshot.unavailable, Ordering::SeqCst);
        if snapshot.unavailable {
            // An unavailable snapshot carries no usable content. Collections
            // stay as they are: present, possibly empty.
            tracing::info!(guild_id = self.id, "guild unavailable");
            return;
        }

        self.apply_update(&snapshot.guild);

        let channels = DashSet::new();
        for model in &snapshot.channels {
            let mut model = model.clone();
            model.guild_id = Some(self.id);
            cache.put_channel(CachedChannel::from_model(&model));
            channels.insert(model.id);
        }
        self.channels.replace(channels);

        self.rebuild_members(cache, &snapshot.members, &snapshot.presences);
        self.member_count
            .store(snapshot.member_count as i64, Ordering::SeqCst);

        let voice_states = DashMap::new();
        for model in &snapshot.voice_states {
            voice_states.insert(
                model.user_id,
                Arc::new(CachedVoiceState::resolve(cache, model)),
            );
        }
        self.voice_states.replace(voice_states);

        // Fresh barriers for every snapshot; resolution rules depend on the
        // connection's auth and the large flag.
        let sync = Arc::new(OnceSignal::new());
        let download = Arc::new(OnceSignal::new());
        *self.sync_signal.write() = Arc::clone(&sync);
        *self.download_signal.write() = Arc::clone(&download);
        if cache.auth() != AuthKind::User {
            sync.set(());
            if !snapshot.large {
                download.set(());
            }
        }

        tracing::debug!(
            guild_id = self.id,
            channels = self.channels.len(),
            members = self.members.len(),
            large = snapshot.large,
            "guild snapshot applied"
        );
    }

    /// Apply scalar metadata (GUILD_UPDATE, or the scalar part of a
    /// snapshot): overwrite the meta block and rebuild the emoji, feature,
    /// and role lists wholesale.
    pub(crate) fn apply_update(&self, model: &Guild) {
        *self.meta.write() = Arc::new(GuildMeta::from_model(model));
        *self.emojis.write() = Arc::new(model.emojis.clone());
        *self.features.write() = Arc::new(model.features.clone());

        if model.roles.is_empty() {
            // Legal, but usually an upstream omission worth being able to see.
            tracing::debug!(guild_id = self.id, "guild update carried no roles");
        }
        let roles = DashMap::new();
        for role in &model.roles {
            roles.insert(role.id, Arc::new(role.clone()));
        }
        self.roles.replace(roles);
    }

    /// Apply a post-snapshot synchronization event (GUILD_SYNC). This is the
    /// only path that resolves the sync barrier on user-authenticated
    /// connections.
    pub(crate) fn apply_sync(&self, cache: &Cache, sync: &GuildSync) {
        self.rebuild_members(cache, &sync.members, &sync.presences);
        self.sync_signal.read().set(());
        if !sync.large {
            self.download_signal.read().set(());
        }
        tracing::debug!(guild_id = self.id, members = self.members.len(), "guild synced");
    }

    /// Replace the emoji list; nothing else is touched.
    pub(crate) fn apply_emoji_update(&self, emojis: &[Emoji]) {
        *self.emojis.write() = Arc::new(emojis.to_vec());
    }

    fn rebuild_members(&self, cache: &Cache, members: &[Member], presences: &[Presence]) {
        let table = DashMap::new();
        for model in members {
            let user = cache.acquire_user(&model.user);
            table.insert(model.user.id, Arc::new(CachedMember::from_model(user, model)));
        }
        self.downloaded_members
            .store(table.len() as i64, Ordering::SeqCst);

        for presence in presences {
            match table.entry(presence.user.id) {
                Entry::Occupied(mut occupied) => {
                    let updated = Arc::new(occupied.get().with_presence(presence));
                    occupied.insert(updated);
                }
                Entry::Vacant(_) => {
                    // Contract violation by the remote service: presences in
                    // a snapshot must reference bundled members. Skip it.
                    tracing::warn!(
                        guild_id = self.id,
                        user_id = presence.user.id,
                        "presence for a user absent from the member list"
                    );
                }
            }
        }

        let old = self.members.replace(table);
        for entry in old.iter() {
            cache.release_user(*entry.key());
        }
    }

    // Incremental operations

    pub(crate) fn add_channel(&self, cache: &Cache, model: &Channel) -> Arc<CachedChannel> {
        let mut model = model.clone();
        model.guild_id = Some(self.id);
        let channel = cache.put_channel(CachedChannel::from_model(&model));
        self.channels.insert(channel.id);
        channel
    }

    pub(crate) fn remove_channel(&self, cache: &Cache, id: i64) -> Option<Arc<CachedChannel>> {
        if self.channels.remove(&id) {
            cache.remove_channel(id)
        } else {
            None
        }
    }

    pub(crate) fn add_role(&self, model: &Role) -> Arc<Role> {
        let role = Arc::new(model.clone());
        self.roles.insert(role.id, Arc::clone(&role));
        role
    }

    pub(crate) fn remove_role(&self, id: i64) -> Option<Arc<Role>> {
        self.roles.remove(&id)
    }

    /// Insert or update a member from a membership payload. Inserts keep
    /// `downloaded_members` in lockstep with the table.
    pub(crate) fn add_or_update_member(&self, cache: &Cache, model: &Member) -> Arc<CachedMember> {
        let table = self.members.load();
        let member = match table.entry(model.user.id) {
            Entry::Occupied(mut occupied) => {
                cache.touch_user(&model.user);
                let updated = Arc::new(occupied.get().with_update(model));
                occupied.insert(Arc::clone(&updated));
                updated
            }
            Entry::Vacant(vacant) => {
                let user = cache.acquire_user(&model.user);
                let member = Arc::new(CachedMember::from_model(user, model));
                vacant.insert(Arc::clone(&member));
                self.downloaded_members.fetch_add(1, Ordering::SeqCst);
                member
            }
        };
        member
    }

    /// Insert or update a member from a standalone presence payload.
    pub(crate) fn add_or_update_presence(
        &self,
        cache: &Cache,
        presence: &Presence,
    ) -> Arc<CachedMember> {
        let table = self.members.load();
        let member = match table.entry(presence.user.id) {
            Entry::Occupied(mut occupied) => {
                cache.touch_user(&presence.user);
                let updated = Arc::new(occupied.get().with_presence(presence));
                occupied.insert(Arc::clone(&updated));
                updated
            }
            Entry::Vacant(vacant) => {
                let user = cache.acquire_user(&presence.user);
                let member = Arc::new(CachedMember::from_presence(user, presence));
                vacant.insert(Arc::clone(&member));
                self.downloaded_members.fetch_add(1, Ordering::SeqCst);
                member
            }
        };
        member
    }

    /// Remove a member, releasing the guild's reference on the global user.
    pub(crate) fn remove_member(&self, cache: &Cache, id: i64) -> Option<Arc<CachedMember>> {
        let removed = self.members.remove(&id)?;
        self.downloaded_members.fetch_sub(1, Ordering::SeqCst);
        cache.release_user(id);
        Some(removed)
    }

    /// Apply one chunk of a requested member download. Resolves the
    /// downloaded barrier once the roster is complete.
    pub(crate) fn apply_member_chunk(&self, cache: &Cache, members: &[Member]) {
        for model in members {
            self.add_or_update_member(cache, model);
        }
        let expected = self.member_count.load(Ordering::SeqCst);
        if expected > 0 && self.downloaded_members.load(Ordering::SeqCst) >= expected {
            self.complete_member_download();
        }
    }

    /// The remote service reported an outage for this guild: the cached
    /// collections stay, but completeness can no longer be assumed.
    pub(crate) fn set_unavailable(&self) {
        self.available.store(false, Ordering::SeqCst);
        tracing::info!(guild_id = self.id, "guild became unavailable");
    }

    /// Nudge the server-reported roster estimate for single-member joins and
    /// leaves.
    pub(crate) fn adjust_member_count(&self, delta: i64) {
        self.member_count.fetch_add(delta, Ordering::SeqCst);
    }

    pub(crate) fn update_voice_state(&self, cache: &Cache, model: &VoiceState) -> Arc<CachedVoiceState> {
        let state = Arc::new(CachedVoiceState::resolve(cache, model));
        self.voice_states.insert(model.user_id, Arc::clone(&state));
        state
    }

    pub(crate) fn remove_voice_state(&self, user_id: i64) -> Option<Arc<CachedVoiceState>> {
        self.voice_states.remove(&user_id)
    }

    // Lookups and views

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        lanyard_util::snowflake::created_at(self.id)
    }

    /// Whether the remote service currently reports this guild as available.
    /// While unavailable the collections are present but possibly empty.
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    pub fn meta(&self) -> Arc<GuildMeta> {
        Arc::clone(&self.meta.read())
    }

    pub fn name(&self) -> String {
        self.meta.read().name.clone()
    }

    pub fn owner_id(&self) -> i64 {
        self.meta.read().owner_id
    }

    pub fn emojis(&self) -> Arc<Vec<Emoji>> {
        Arc::clone(&self.emojis.read())
    }

    pub fn features(&self) -> Arc<Vec<String>> {
        Arc::clone(&self.features.read())
    }

    /// Server-reported roster size (an estimate for large guilds).
    pub fn member_count(&self) -> i64 {
        self.member_count.load(Ordering::SeqCst)
    }

    /// Members actually present in the cache.
    pub fn downloaded_member_count(&self) -> i64 {
        self.downloaded_members.load(Ordering::SeqCst)
    }

    /// A channel of this guild. Entries whose global record no longer points
    /// back at this guild are treated as stale and filtered out.
    pub fn channel(&self, cache: &Cache, id: i64) -> Option<Arc<CachedChannel>> {
        let channel = cache.channel(id)?;
        (channel.guild_id == Some(self.id)).then_some(channel)
    }

    pub fn channels(&self, cache: &Cache) -> Vec<Arc<CachedChannel>> {
        self.channels
            .load()
            .iter()
            .filter_map(|id| self.channel(cache, *id))
            .collect()
    }

    pub(crate) fn channel_ids(&self) -> Vec<i64> {
        self.channels.items()
    }

    pub fn role(&self, id: i64) -> Option<Arc<Role>> {
        self.roles.get(&id)
    }

    /// The implicit everyone role shares the guild's id.
    pub fn everyone_role(&self) -> Option<Arc<Role>> {
        self.role(self.id)
    }

    pub fn roles(&self) -> Vec<Arc<Role>> {
        self.roles.values()
    }

    pub fn member(&self, id: i64) -> Option<Arc<CachedMember>> {
        self.members.get(&id)
    }

    pub fn members(&self) -> Vec<Arc<CachedMember>> {
        self.members.values()
    }

    /// The authenticated user's member entry, if downloaded.
    pub fn current_user(&self, cache: &Cache) -> Option<Arc<CachedMember>> {
        self.member(cache.current_user_id()?)
    }

    pub fn voice_state(&self, user_id: i64) -> Option<Arc<CachedVoiceState>> {
        self.voice_states.get(&user_id)
    }

    pub fn voice_states(&self) -> Vec<Arc<CachedVoiceState>> {
        self.voice_states.values()
    }

    // Readiness barriers

    /// Whether role/channel/member base data has been loaded.
    pub fn is_synced(&self) -> bool {
        self.sync_signal.read().is_set()
    }

    /// Whether the full member roster is present.
    pub fn has_all_members(&self) -> bool {
        self.download_signal.read().is_set()
    }

    pub async fn wait_synced(&self) {
        let signal = Arc::clone(&self.sync_signal.read());
        signal.wait().await;
    }

    pub async fn wait_all_members(&self) {
        let signal = Arc::clone(&self.download_signal.read());
        signal.wait().await;
    }

    pub(crate) fn complete_member_download(&self) {
        self.download_signal.read().set(());
    }

    /// Ask the gateway for the full member roster. The downloaded barrier
    /// resolves once the chunks have all been applied.
    pub async fn download_members(&self, cache: &Cache) -> Result<(), GatewayError> {
        cache.gateway().request_guild_members(self.id).await
    }

    // Voice

    pub fn voice(&self) -> &VoiceCoordinator {
        &self.voice
    }

    /// Connect to a voice channel in this guild, tearing down any previous
    /// session first. Resolves to a live session handle once the handshake
    /// completes.
    pub async fn connect_voice(
        &self,
        cache: &Cache,
        channel_id: i64,
        self_mute: bool,
        self_deaf: bool,
    ) -> Result<Arc<crate::voice::VoiceSession>, crate::error::VoiceError> {
        self.voice.connect(cache, channel_id, self_mute, self_deaf).await
    }

    /// Tear down the guild's voice session, if any. Idempotent.
    pub async fn disconnect_voice(&self) {
        self.voice.disconnect().await;
    }
}
