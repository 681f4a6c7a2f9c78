use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use super::role::{Faction, Role};
use crate::types::{Phase, PlayerId, Winner};

/// Identifies one armed phase timer. A timer whose token no longer matches
/// the game's current token is stale and must be ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimerToken(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Reveal {
    Inspection { target: PlayerId, hostile: bool },
    Lover { partner: PlayerId },
    Transformed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience<'a> {
    Everyone,
    Player(&'a PlayerId),
    /// Consumed by the room itself (timers), never sent.
    Internal,
}

/// Everything the engine tells the outside world. The room adapter decides
/// who receives what via [`Event::audience`] and [`Event::view_for`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Event {
    #[serde(rename_all = "camelCase")]
    RoleAssigned {
        player: PlayerId,
        role: Role,
        faction: Faction,
        ability_text: &'static str,
    },
    #[serde(rename_all = "camelCase")]
    NightResult {
        day: u32,
        deaths: Vec<PlayerId>,
        narration: Vec<String>,
        private_reveals: BTreeMap<PlayerId, Vec<Reveal>>,
    },
    #[serde(rename_all = "camelCase")]
    VoteResult {
        day: u32,
        tally: Vec<(PlayerId, usize)>,
        eliminated: Option<PlayerId>,
        deaths: Vec<PlayerId>,
        narration: Vec<String>,
        winner: Option<Winner>,
    },
    #[serde(rename_all = "camelCase")]
    DuelResult {
        duelist: PlayerId,
        target: PlayerId,
        deaths: Vec<PlayerId>,
        narration: Vec<String>,
        winner: Option<Winner>,
    },
    #[serde(rename_all = "camelCase")]
    PhaseChanged {
        phase: Phase,
        day: u32,
        speaker: Option<PlayerId>,
        duration: u64,
    },
    #[serde(rename_all = "camelCase")]
    GameOver {
        winner: Winner,
        narration: Vec<String>,
        roles: BTreeMap<PlayerId, Role>,
    },
    #[serde(rename_all = "camelCase")]
    Rejected { player: PlayerId, reason: String },
    #[serde(skip)]
    ArmTimer { token: TimerToken, after: Duration },
}

impl Event {
    pub fn rejected(player: &PlayerId, err: &impl std::fmt::Display) -> Self {
        Event::Rejected {
            player: player.clone(),
            reason: err.to_string(),
        }
    }

    /// Frame target name on the wire.
    pub fn target(&self) -> &'static str {
        match self {
            Event::RoleAssigned { .. } => "role",
            Event::NightResult { .. } => "nightResult",
            Event::VoteResult { .. } => "voteResult",
            Event::DuelResult { .. } => "duelResult",
            Event::PhaseChanged { .. } => "phase",
            Event::GameOver { .. } => "gameOver",
            Event::Rejected { .. } => "rejected",
            Event::ArmTimer { .. } => "armTimer",
        }
    }

    pub fn audience(&self) -> Audience<'_> {
        match self {
            Event::RoleAssigned { player, .. } | Event::Rejected { player, .. } => {
                Audience::Player(player)
            }
            Event::ArmTimer { .. } => Audience::Internal,
            _ => Audience::Everyone,
        }
    }

    /// Payload as `viewer` may see it: night reveals are cut down to the
    /// viewer's own. `None` when the viewer must not get this event at all.
    pub fn view_for(&self, viewer: &PlayerId) -> Option<Value> {
        match self.audience() {
            Audience::Internal => return None,
            Audience::Player(p) if p != viewer => return None,
            _ => {}
        }
        if let Event::NightResult {
            day,
            deaths,
            narration,
            private_reveals,
        } = self
        {
            let own: BTreeMap<&PlayerId, &Vec<Reveal>> =
                private_reveals.iter().filter(|(id, _)| *id == viewer).collect();
            return Some(serde_json::json!({
                "day": day,
                "deaths": deaths,
                "narration": narration,
                "privateReveals": own,
            }));
        }
        serde_json::to_value(self).ok()
    }
}
