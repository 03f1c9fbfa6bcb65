//! Client-side cache and synchronization engine for one guild.
//!
//! A long-lived gateway connection feeds snapshot and incremental events into
//! the [`Cache`]; application code reads the resulting view through
//! non-blocking lookups, waits on the per-guild readiness barriers, and
//! drives voice sessions through the [`voice::VoiceCoordinator`].

pub mod channel;
pub mod collections;
pub mod error;
pub mod gateway;
pub mod guild;
pub mod member;
pub mod rest;
pub mod signal;
pub mod state;
pub mod user;
pub mod voice;

pub use channel::CachedChannel;
pub use error::{GatewayError, RestError, VoiceError};
pub use gateway::GatewaySink;
pub use guild::{CachedGuild, CachedVoiceState, GuildMeta};
pub use member::CachedMember;
pub use rest::Rest;
pub use signal::OnceSignal;
pub use state::{AuthKind, Cache};
pub use user::CachedUser;
pub use voice::{
    MediaConnect, MediaTransport, SessionMonitor, VoiceSession, CONNECT_TIMEOUT,
};
