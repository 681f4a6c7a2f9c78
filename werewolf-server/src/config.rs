use std::time::Duration;

use clap::Parser;
use serde::{Deserialize, Serialize};

/// How a day vote with several top-scoring candidates is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TiePolicy {
    /// The tied candidate who received the earliest ballot is eliminated.
    #[default]
    FirstSeen,
    /// Nobody is eliminated.
    NoElimination,
}

/// Per-room rules, sent by the host with `createRoom`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameConfig {
    pub first_night_kill: bool,
    pub wild_child_transform: bool,
    /// Reject role configurations that don't match the roster instead of
    /// padding with civilians / truncating.
    pub strict_roles: bool,
    pub tie_policy: TiePolicy,
    pub night_secs: u64,
    pub discuss_secs: u64,
    pub vote_secs: u64,
    pub last_words_secs: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            first_night_kill: true,
            wild_child_transform: true,
            strict_roles: false,
            tie_policy: TiePolicy::FirstSeen,
            night_secs: 30,
            discuss_secs: 120,
            vote_secs: 60,
            last_words_secs: 30,
        }
    }
}

impl GameConfig {
    pub fn night(&self) -> Duration {
        Duration::from_secs(self.night_secs)
    }

    pub fn discuss(&self) -> Duration {
        Duration::from_secs(self.discuss_secs)
    }

    pub fn vote(&self) -> Duration {
        Duration::from_secs(self.vote_secs)
    }

    pub fn last_words(&self) -> Duration {
        Duration::from_secs(self.last_words_secs)
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "werewolf-server", about = "Werewolf game server over websockets")]
pub struct ServerConfig {
    /// Address the websocket endpoint binds to.
    #[arg(long, env = "WEREWOLF_BIND", default_value = "0.0.0.0:8080")]
    pub bind: String,
}
