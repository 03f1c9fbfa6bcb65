use serde::{Deserialize, Serialize};

use crate::user::User;

/// A presence entry bundled with guild snapshots and sync payloads, or
/// delivered standalone as PRESENCE_UPDATE.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Presence {
    pub user: User,
    pub guild_id: Option<i64>,
    pub status: String,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub name: String,
    pub activity_type: i32,
    pub details: Option<String>,
    pub state: Option<String>,
}
