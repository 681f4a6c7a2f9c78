use tracing::info;

use super::death::{Cause, Fate};
use super::engine::Game;
use super::role::{Ability, RoleState};
use crate::config::TiePolicy;
use crate::types::PlayerId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ballot {
    pub voter: PlayerId,
    pub target: PlayerId,
}

/// Count ballots per target, keeping targets in the order their first ballot
/// arrived.
pub fn tally<'a>(targets: impl IntoIterator<Item = &'a PlayerId>) -> Vec<(PlayerId, usize)> {
    let mut counts: Vec<(PlayerId, usize)> = Vec::new();
    for t in targets {
        match counts.iter_mut().find(|(id, _)| id == t) {
            Some((_, n)) => *n += 1,
            None => counts.push((t.clone(), 1)),
        }
    }
    counts
}

/// Plurality winner of a tally. Ties go to the earliest candidate under
/// `FirstSeen` and to nobody under `NoElimination`.
pub fn leader(tally: &[(PlayerId, usize)], policy: TiePolicy) -> Option<PlayerId> {
    let max = tally.iter().map(|(_, n)| *n).max().filter(|n| *n > 0)?;
    let mut top = tally.iter().filter(|(_, n)| *n == max);
    let (first, _) = top.next()?;
    if top.next().is_some() && policy == TiePolicy::NoElimination {
        return None;
    }
    Some(first.clone())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteOutcome {
    pub tally: Vec<(PlayerId, usize)>,
    pub eliminated: Option<PlayerId>,
    pub deaths: Vec<PlayerId>,
    pub narration: Vec<String>,
}

impl VoteOutcome {
    fn record(&mut self, fate: &Fate) {
        for id in fate.deaths() {
            if !self.deaths.contains(id) {
                self.deaths.push(id.clone());
            }
        }
    }
}

/// Tally the day's ballots and apply the elected player's reaction. Ballots
/// from players who died before the tally, or naming a dead player, are dropped.
pub fn resolve(game: &mut Game) -> VoteOutcome {
    let ballots: Vec<Ballot> = std::mem::take(&mut game.ballots)
        .into_iter()
        .filter(|b| game.is_alive(&b.voter) && game.is_alive(&b.target))
        .collect();

    let mut out = VoteOutcome {
        tally: tally(ballots.iter().map(|b| &b.target)),
        ..VoteOutcome::default()
    };

    let Some(target) = leader(&out.tally, game.config.tie_policy) else {
        out.narration.push(if out.tally.is_empty() {
            "Nobody received a vote; no one leaves the village".to_string()
        } else {
            "The vote is tied; no one leaves the village".to_string()
        });
        info!(room = %game.room_id, day = game.day, "vote ended with no elimination");
        return out;
    };
    out.eliminated = Some(target.clone());

    let Some(elected) = game.player(&target).cloned() else { return out };
    let name = elected.name.clone();
    let parting = ballots
        .iter()
        .find(|b| b.voter == target && b.target != target)
        .map(|b| b.target.clone());

    if elected.has(Ability::SurvivesVote) {
        if let Some(p) = game.player_mut(&target) {
            p.can_vote = false;
            p.state = RoleState::Idiot { exposed: true };
        }
        out.narration
            .push(format!("{name} is revealed as the idiot: they live on but lose their vote"));
    } else if elected.has(Ability::BlastVoters) {
        let (wolves_before, others_before) = game.camp_counts(&target);

        let fate = game.kill(&target, Cause::Vote, &mut out.narration);
        out.record(&fate);
        out.narration.push(format!("{name} was voted out and detonates!"));

        for b in ballots.iter().filter(|b| b.target == target) {
            let fate = game.kill(&b.voter, Cause::Blast, &mut out.narration);
            if let Fate::Died(_) = fate {
                out.narration
                    .push(format!("{} was caught in the blast", game.name_of(&b.voter)));
            }
            out.record(&fate);
        }

        let (wolves_after, others_after) = game.camp_counts(&target);
        if (wolves_before > 0 && wolves_after == 0) || (others_before > 0 && others_after == 0) {
            game.bomber_triumph = true;
        }
    } else {
        let fate = game.kill(&target, Cause::Vote, &mut out.narration);
        out.record(&fate);
        out.narration.push(format!("{name} was voted out"));

        let parting_cause = if elected.has(Ability::RevengeOnVote) {
            Some(Cause::Revenge)
        } else if elected.has(Ability::ShootOnVote) {
            Some(Cause::Shot)
        } else {
            None
        };

        if let (Some(cause), Some(victim)) = (parting_cause, parting) {
            let victim_name = game.name_of(&victim);
            match game.kill(&victim, cause, &mut out.narration) {
                fate @ Fate::Died(_) => {
                    out.narration.push(format!("{name} takes {victim_name} down with them"));
                    out.record(&fate);
                }
                Fate::Immune => out
                    .narration
                    .push(format!("{name} fires at {victim_name}, who shrugs it off")),
                Fate::AlreadyGone => {}
            }
        }
    }

    info!(
        room = %game.room_id,
        day = game.day,
        eliminated = %target,
        deaths = out.deaths.len(),
        "vote resolved"
    );
    out
}

impl Game {
    /// Living (werewolves, everyone else), not counting `except`.
    pub(crate) fn camp_counts(&self, except: &PlayerId) -> (usize, usize) {
        self.players
            .iter()
            .filter(|p| p.is_alive && &p.id != except)
            .fold((0, 0), |(w, o), p| {
                if p.is_werewolf() {
                    (w + 1, o)
                } else {
                    (w, o + 1)
                }
            })
    }
}
