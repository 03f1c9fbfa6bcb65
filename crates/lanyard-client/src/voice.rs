//! Voice session coordination.
//!
//! At most one media session exists per guild. Connecting is always "connect
//! fresh": any previous session or pending attempt is torn down first. The
//! connect request goes out over the gateway; the correlated confirmation
//! (session-ready parameters) arrives asynchronously on the network-receive
//! path and completes the handshake through [`VoiceCoordinator::finish_connect`].
//!
//! All transitions are serialized by one async mutex, which is never held
//! across the wait for the confirmation: the receive path needs that same
//! mutex to deliver it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::VoiceError;
use crate::guild::CachedGuild;
use crate::signal::OnceSignal;
use crate::state::Cache;

/// How long a connect attempt waits for its confirmation.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Parameters handed to the media layer to drive its handshake.
#[derive(Debug, Clone)]
pub struct MediaConnect {
    pub guild_id: i64,
    pub channel_id: Option<i64>,
    pub user_id: i64,
    /// Session token from the caller's own voice state.
    pub session_id: String,
    /// Endpoint resolved by the voice server.
    pub endpoint: String,
    pub token: String,
}

/// The media-layer seam. Implementations open the transport, drive its
/// handshake, and keep the [`SessionMonitor`]: they signal it when the
/// transport drops, and shut the transport down when it resolves from the
/// cache side.
#[async_trait]
pub trait MediaTransport: Send + Sync {
    async fn connect(&self, params: MediaConnect, monitor: SessionMonitor) -> Result<(), VoiceError>;
}

/// A live (or once-live) voice session handle.
pub struct VoiceSession {
    guild_id: i64,
    channel_id: Option<i64>,
    /// Resolves exactly once, with the disconnect cause if there was one.
    closed: OnceSignal<Option<VoiceError>>,
}

impl VoiceSession {
    fn new(guild_id: i64, channel_id: Option<i64>) -> Arc<Self> {
        Arc::new(Self {
            guild_id,
            channel_id,
            closed: OnceSignal::new(),
        })
    }

    pub fn guild_id(&self) -> i64 {
        self.guild_id
    }

    pub fn channel_id(&self) -> Option<i64> {
        self.channel_id
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_set()
    }

    /// Resolves when the session ends, with the underlying cause for
    /// transport failures and `None` for deliberate teardown.
    pub async fn closed(&self) -> Option<VoiceError> {
        self.closed.wait().await
    }

    fn close(&self, cause: Option<VoiceError>) {
        self.closed.set(cause);
    }
}

impl std::fmt::Debug for VoiceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceSession")
            .field("guild_id", &self.guild_id)
            .field("channel_id", &self.channel_id)
            .field("closed", &self.closed.is_set())
            .finish()
    }
}

/// Shared view of a session's closed signal, handed to the media transport.
/// Either side may signal closure; both observe it.
#[derive(Clone)]
pub struct SessionMonitor {
    session: Arc<VoiceSession>,
}

impl SessionMonitor {
    /// Report that the transport dropped, with the cause if one is known.
    pub fn disconnected(&self, cause: Option<VoiceError>) {
        self.session.close(cause);
    }

    /// Resolves when the session closes, from either side.
    pub async fn wait(&self) -> Option<VoiceError> {
        self.session.closed().await
    }

    pub fn is_closed(&self) -> bool {
        self.session.is_closed()
    }
}

/// The pending-result handle correlating a connect request with its
/// asynchronous confirmation.
type Pending = Arc<OnceSignal<Result<Arc<VoiceSession>, VoiceError>>>;

#[derive(Default)]
struct VoiceSlot {
    pending: Option<Pending>,
    session: Option<Arc<VoiceSession>>,
}

/// Owns the 0-or-1 voice session of a guild and serializes every state
/// transition through one gate.
pub struct VoiceCoordinator {
    guild_id: i64,
    gate: Arc<Mutex<VoiceSlot>>,
}

impl VoiceCoordinator {
    pub(crate) fn new(guild_id: i64) -> Self {
        Self {
            guild_id,
            gate: Arc::new(Mutex::new(VoiceSlot::default())),
        }
    }

    /// Connect to a voice channel. Tears down any previous attempt or
    /// session, sends the voice-state update, then waits for the correlated
    /// confirmation outside the gate, racing it against [`CONNECT_TIMEOUT`].
    pub async fn connect(
        &self,
        cache: &Cache,
        channel_id: i64,
        self_mute: bool,
        self_deaf: bool,
    ) -> Result<Arc<VoiceSession>, VoiceError> {
        let pending: Pending = {
            let mut slot = self.gate.lock().await;
            Self::teardown(&mut slot);
            let pending: Pending = Arc::new(OnceSignal::new());
            slot.pending = Some(Arc::clone(&pending));
            let send = cache
                .gateway()
                .voice_state_update(self.guild_id, Some(channel_id), self_mute, self_deaf)
                .await;
            if let Err(err) = send {
                Self::teardown(&mut slot);
                return Err(err.into());
            }
            pending
        };

        let outcome = match tokio::time::timeout(CONNECT_TIMEOUT, pending.wait()).await {
            Ok(result) => result,
            Err(_) => Err(VoiceError::ConnectTimeout),
        };

        match outcome {
            Ok(session) => Ok(session),
            // Superseded by a newer connect or an explicit disconnect; the
            // successor owns the slot now, leave it alone.
            Err(VoiceError::Cancelled) => Err(VoiceError::Cancelled),
            Err(err) => {
                self.teardown_if_current(&pending).await;
                Err(err)
            }
        }
    }

    /// Tear down the pending attempt and live session, if any. Idempotent.
    pub async fn disconnect(&self) {
        let mut slot = self.gate.lock().await;
        Self::teardown(&mut slot);
    }

    /// The current live session handle, if one exists.
    pub async fn current_session(&self) -> Option<Arc<VoiceSession>> {
        self.gate.lock().await.session.clone()
    }

    /// Complete the handshake with the session-ready parameters delivered by
    /// the network-receive path.
    pub(crate) async fn finish_connect(
        &self,
        cache: &Cache,
        guild: &CachedGuild,
        endpoint: &str,
        token: &str,
    ) {
        let mut slot = self.gate.lock().await;

        // The media layer needs the session token from our own voice state,
        // which the server sent ahead of these parameters.
        let voice_state = cache
            .current_user_id()
            .and_then(|id| guild.voice_state(id));
        let Some(voice_state) = voice_state else {
            tracing::warn!(
                guild_id = self.guild_id,
                "session-ready parameters arrived without own voice state"
            );
            if let Some(pending) = &slot.pending {
                pending.set(Err(VoiceError::MissingVoiceState));
            }
            Self::teardown(&mut slot);
            return;
        };

        let session = match &slot.session {
            Some(session) => Arc::clone(session),
            None => {
                let session = VoiceSession::new(self.guild_id, voice_state.channel_id());
                if let Some(pending) = slot.pending.clone() {
                    self.watch_initial_disconnect(Arc::clone(&session), pending);
                }
                slot.session = Some(Arc::clone(&session));
                session
            }
        };

        let params = MediaConnect {
            guild_id: self.guild_id,
            channel_id: voice_state.channel_id(),
            user_id: voice_state.user_id,
            session_id: voice_state.session_id.clone(),
            endpoint: endpoint.to_owned(),
            token: token.to_owned(),
        };
        let monitor = SessionMonitor {
            session: Arc::clone(&session),
        };

        match cache.media().connect(params, monitor).await {
            Ok(()) => {
                if let Some(pending) = &slot.pending {
                    pending.set(Ok(Arc::clone(&session)));
                }
                tracing::info!(guild_id = self.guild_id, "voice session established");
            }
            Err(VoiceError::Cancelled) => {
                // The attempt was withdrawn while the handshake ran; tear
                // down quietly.
                Self::teardown(&mut slot);
            }
            Err(err) => {
                if let Some(pending) = &slot.pending {
                    pending.set(Err(err.clone()));
                }
                tracing::warn!(guild_id = self.guild_id, error = %err, "voice handshake failed");
                Self::teardown(&mut slot);
            }
        }
    }

    /// Arm the disconnect watcher for a freshly constructed session. A
    /// disconnect before the original pending result resolves is the initial
    /// failure: fail the pending with the cause (or a cancellation if none)
    /// and release the handle. A disconnect after success is a reconnect
    /// opportunity, deliberately not implemented.
    fn watch_initial_disconnect(&self, session: Arc<VoiceSession>, pending: Pending) {
        let gate = Arc::clone(&self.gate);
        tokio::spawn(async move {
            let cause = session.closed().await;
            if pending.is_set() {
                return;
            }
            pending.set(Err(cause.unwrap_or(VoiceError::Cancelled)));
            let mut slot = gate.lock().await;
            let still_ours = slot
                .session
                .as_ref()
                .is_some_and(|current| Arc::ptr_eq(current, &session));
            if still_ours {
                slot.session = None;
            }
        });
    }

    /// Teardown for a specific failed attempt: runs only while that attempt
    /// is still the coordinator's current one, so a late timeout can never
    /// destroy a replacement attempt.
    async fn teardown_if_current(&self, pending: &Pending) {
        let mut slot = self.gate.lock().await;
        let current = slot
            .pending
            .as_ref()
            .is_some_and(|p| Arc::ptr_eq(p, pending));
        if current {
            Self::teardown(&mut slot);
        }
    }

    /// Cancel the pending attempt and close the live session. Best-effort:
    /// nothing here can fail, so a new connect is never blocked by cleanup
    /// of a previous one.
    fn teardown(slot: &mut VoiceSlot) {
        if let Some(pending) = slot.pending.take() {
            pending.set(Err(VoiceError::Cancelled));
        }
        if let Some(session) = slot.session.take() {
            session.close(None);
        }
    }
}
