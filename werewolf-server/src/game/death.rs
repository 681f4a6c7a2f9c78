use std::collections::{HashSet, VecDeque};

use serde::Serialize;
use tracing::debug;

use super::engine::Game;
use crate::types::PlayerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Cause {
    WolfKill,
    Poison,
    Detonation,
    Vote,
    Revenge,
    Shot,
    Blast,
    Duel,
    Heartbreak,
}

impl Cause {
    /// General immunity only stops poison and gunshots.
    pub fn pierces_immunity(self) -> bool {
        !matches!(self, Cause::Poison | Cause::Shot)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fate {
    /// Victim first, then any lover cascade, each id once.
    Died(Vec<PlayerId>),
    Immune,
    AlreadyGone,
}

impl Fate {
    pub fn deaths(&self) -> &[PlayerId] {
        match self {
            Fate::Died(ids) => ids,
            _ => &[],
        }
    }
}

impl Game {
    /// Kill `victim` and run the lover cascade as a worklist. Cascade
    /// narration is appended here; the primary death is narrated by the caller.
    pub(crate) fn kill(&mut self, victim: &PlayerId, cause: Cause, narration: &mut Vec<String>) -> Fate {
        match self.player(victim) {
            Some(p) if p.is_alive => {
                if p.is_immune() && !cause.pierces_immunity() {
                    return Fate::Immune;
                }
            }
            _ => return Fate::AlreadyGone,
        }

        let mut died = Vec::new();
        let mut seen: HashSet<PlayerId> = HashSet::new();
        let mut queue = VecDeque::from([(victim.clone(), cause)]);

        while let Some((id, cause)) = queue.pop_front() {
            if !seen.insert(id.clone()) {
                continue;
            }
            let Some(p) = self.player_mut(&id) else { continue };
            if !p.is_alive {
                continue;
            }
            p.is_alive = false;
            p.can_vote = false;
            debug!(room = %self.room_id, player = %id, ?cause, "player died");
            died.push(id.clone());

            if let Some(partner) = self.lover_of(&id) {
                if self.is_alive(&partner) && !seen.contains(&partner) {
                    narration.push(format!(
                        "{} follows their lover {} into death",
                        self.name_of(&partner),
                        self.name_of(&id)
                    ));
                    queue.push_back((partner, Cause::Heartbreak));
                }
            }
        }

        Fate::Died(died)
    }

    pub(crate) fn lover_of(&self, id: &PlayerId) -> Option<PlayerId> {
        match &self.lovers {
            Some((a, b)) if a == id => Some(b.clone()),
            Some((a, b)) if b == id => Some(a.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::engine::tests::game_with;
    use crate::game::role::Role;

    #[test]
    fn lover_dies_once_with_partner() {
        let mut g = game_with(&[Role::NormalWolf, Role::Seer, Role::Civilian, Role::Civilian]);
        g.lovers = Some(("p2".into(), "p3".into()));
        let mut log = Vec::new();

        let fate = g.kill(&"p2".into(), Cause::WolfKill, &mut log);
        assert_eq!(fate, Fate::Died(vec!["p2".into(), "p3".into()]));
        assert_eq!(log.len(), 1);

        let again = g.kill(&"p3".into(), Cause::Poison, &mut log);
        assert_eq!(again, Fate::AlreadyGone);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn immunity_blocks_poison_and_shots_only() {
        let mut g = game_with(&[Role::NormalWolf, Role::OldRogue, Role::Civilian, Role::Civilian]);
        let mut log = Vec::new();
        assert_eq!(g.kill(&"p2".into(), Cause::Poison, &mut log), Fate::Immune);
        assert_eq!(g.kill(&"p2".into(), Cause::Shot, &mut log), Fate::Immune);
        assert!(g.is_alive(&"p2".into()));
        assert_eq!(g.kill(&"p2".into(), Cause::Blast, &mut log).deaths().len(), 1);
    }

    #[test]
    fn cascade_reaches_immune_partner() {
        let mut g = game_with(&[Role::NormalWolf, Role::OldRogue, Role::Seer, Role::Civilian]);
        g.lovers = Some(("p2".into(), "p3".into()));
        let mut log = Vec::new();
        let fate = g.kill(&"p3".into(), Cause::WolfKill, &mut log);
        assert_eq!(fate.deaths(), ["p3".to_string(), "p2".to_string()]);
    }
}
