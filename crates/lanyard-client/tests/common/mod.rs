//! Shared fixtures: recording gateway sink, scriptable media transport, and
//! payload builders.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use lanyard_client::{
    AuthKind, Cache, GatewayError, GatewaySink, MediaConnect, MediaTransport, SessionMonitor,
    VoiceError,
};
use lanyard_models::gateway::{GatewayEvent, Ready};
use lanyard_models::{
    Channel, Guild, GuildSnapshot, Member, Presence, User, VoiceState,
};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("lanyard=debug")),
            )
            .with_test_writer()
            .init();
    });
}

/// Our own user id in every test.
pub const SELF_ID: i64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceSend {
    pub guild_id: i64,
    pub channel_id: Option<i64>,
    pub self_mute: bool,
    pub self_deaf: bool,
}

/// Records outbound gateway requests; optionally fails them.
#[derive(Default)]
pub struct RecordingGateway {
    pub voice_sends: Mutex<Vec<VoiceSend>>,
    pub member_requests: Mutex<Vec<i64>>,
    pub fail_sends: AtomicBool,
}

#[async_trait]
impl GatewaySink for RecordingGateway {
    async fn voice_state_update(
        &self,
        guild_id: i64,
        channel_id: Option<i64>,
        self_mute: bool,
        self_deaf: bool,
    ) -> Result<(), GatewayError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(GatewayError("socket closed".into()));
        }
        self.voice_sends.lock().unwrap().push(VoiceSend {
            guild_id,
            channel_id,
            self_mute,
            self_deaf,
        });
        Ok(())
    }

    async fn request_guild_members(&self, guild_id: i64) -> Result<(), GatewayError> {
        self.member_requests.lock().unwrap().push(guild_id);
        Ok(())
    }
}

/// What the scripted media transport should do when asked to connect.
#[derive(Clone)]
pub enum MediaScript {
    /// Handshake succeeds.
    Succeed,
    /// Handshake fails outright.
    Fail(VoiceError),
    /// The transport drops mid-handshake: it signals the monitor with the
    /// given cause, then reports its own cancellation.
    DropMidHandshake(VoiceError),
}

pub struct ScriptedMedia {
    pub script: Mutex<MediaScript>,
    pub connects: Mutex<Vec<MediaConnect>>,
    pub monitors: Mutex<Vec<SessionMonitor>>,
}

impl ScriptedMedia {
    pub fn new(script: MediaScript) -> Self {
        Self {
            script: Mutex::new(script),
            connects: Mutex::new(Vec::new()),
            monitors: Mutex::new(Vec::new()),
        }
    }

    pub fn set_script(&self, script: MediaScript) {
        *self.script.lock().unwrap() = script;
    }

    pub fn last_monitor(&self) -> SessionMonitor {
        self.monitors.lock().unwrap().last().cloned().expect("no media connect recorded")
    }
}

#[async_trait]
impl MediaTransport for ScriptedMedia {
    async fn connect(
        &self,
        params: MediaConnect,
        monitor: SessionMonitor,
    ) -> Result<(), VoiceError> {
        self.connects.lock().unwrap().push(params);
        self.monitors.lock().unwrap().push(monitor.clone());
        let script = self.script.lock().unwrap().clone();
        match script {
            MediaScript::Succeed => Ok(()),
            MediaScript::Fail(err) => Err(err),
            MediaScript::DropMidHandshake(cause) => {
                monitor.disconnected(Some(cause));
                // Leave the disconnect watcher time to observe the closure
                // before the handshake reports back.
                tokio::time::sleep(Duration::from_millis(50)).await;
                Err(VoiceError::Cancelled)
            }
        }
    }
}

pub struct Fixture {
    pub cache: Arc<Cache>,
    pub gateway: Arc<RecordingGateway>,
    pub media: Arc<ScriptedMedia>,
}

pub fn fixture(auth: AuthKind) -> Fixture {
    init_tracing();
    let gateway = Arc::new(RecordingGateway::default());
    let media = Arc::new(ScriptedMedia::new(MediaScript::Succeed));
    let cache = Arc::new(Cache::new(auth, gateway.clone(), media.clone()));
    Fixture {
        cache,
        gateway,
        media,
    }
}

/// Fixture with the READY event already applied.
pub async fn ready_fixture(auth: AuthKind) -> Fixture {
    let fx = fixture(auth);
    fx.cache
        .apply(&GatewayEvent::Ready(Ready {
            user: user(SELF_ID),
            session_id: "gw-session".into(),
        }))
        .await;
    fx
}

// Payload builders

pub fn user(id: i64) -> User {
    User {
        id,
        username: format!("user-{id}"),
        discriminator: "0001".into(),
        avatar: None,
        bot: false,
    }
}

pub fn member(id: i64) -> Member {
    Member {
        user: user(id),
        nick: None,
        roles: Vec::new(),
        joined_at: None,
        deaf: false,
        mute: false,
    }
}

pub fn presence(id: i64, status: &str) -> Presence {
    Presence {
        user: user(id),
        guild_id: None,
        status: status.into(),
        activities: Vec::new(),
    }
}

pub fn channel(id: i64, guild_id: i64, kind: i32) -> Channel {
    Channel {
        id,
        guild_id: Some(guild_id),
        name: format!("channel-{id}"),
        kind,
        position: 0,
    }
}

pub fn guild_model(id: i64) -> Guild {
    Guild {
        id,
        name: format!("guild-{id}"),
        icon: None,
        splash: None,
        owner_id: SELF_ID,
        region: "eu-west".into(),
        afk_channel_id: None,
        afk_timeout: 300,
        verification_level: 1,
        mfa_level: 0,
        default_message_notifications: 0,
        roles: Vec::new(),
        emojis: Vec::new(),
        features: Vec::new(),
    }
}

pub fn snapshot(id: i64, members: Vec<Member>) -> GuildSnapshot {
    let member_count = members.len() as i32;
    GuildSnapshot {
        guild: guild_model(id),
        large: false,
        unavailable: false,
        member_count,
        channels: Vec::new(),
        members,
        presences: Vec::new(),
        voice_states: Vec::new(),
    }
}

pub fn voice_state(guild_id: i64, user_id: i64, channel_id: Option<i64>) -> VoiceState {
    VoiceState {
        user_id,
        channel_id,
        guild_id: Some(guild_id),
        session_id: format!("voice-session-{user_id}"),
        deaf: false,
        mute: false,
        self_deaf: false,
        self_mute: false,
        suppress: false,
    }
}
