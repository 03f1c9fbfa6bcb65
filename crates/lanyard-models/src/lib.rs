//! Wire-level payload types delivered by the gateway and REST layers.
//!
//! These structs describe what arrives on the socket; the cached, concurrent
//! representations live in `lanyard-client`.

pub mod channel;
pub mod emoji;
pub mod gateway;
pub mod guild;
pub mod member;
pub mod presence;
pub mod role;
pub mod user;
pub mod voice;

pub use channel::Channel;
pub use emoji::Emoji;
pub use gateway::GatewayEvent;
pub use guild::{Guild, GuildSnapshot, GuildSync};
pub use member::Member;
pub use presence::Presence;
pub use role::Role;
pub use user::User;
pub use voice::{VoiceServerUpdate, VoiceState};
