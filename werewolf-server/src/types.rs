use std::fmt;

use serde::{Deserialize, Serialize};

pub type PlayerId = String;
pub type RoomId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Lobby,
    Night,
    DayDiscuss,
    DayVote,
    LastWords,
    Ended,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Lobby => "lobby",
            Phase::Night => "night",
            Phase::DayDiscuss => "dayDiscuss",
            Phase::DayVote => "dayVote",
            Phase::LastWords => "lastWords",
            Phase::Ended => "ended",
        };
        f.write_str(name)
    }
}

/// Who took the game. Werewolves and villagers are the two factions; the
/// rest are neutral endings owned by a single role (or the lover pair).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Winner {
    Werewolves,
    Villagers,
    Lovers,
    Idiot,
    Bomber,
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Winner::Werewolves => "werewolves",
            Winner::Villagers => "villagers",
            Winner::Lovers => "lovers",
            Winner::Idiot => "idiot",
            Winner::Bomber => "bomber",
        };
        f.write_str(name)
    }
}
