//! Night resolution: submissions are collected per actor and slot, then
//! resolved in one pass through a fixed, ordered list of steps.
use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::death::{Cause, Fate};
use super::engine::Game;
use super::event::Reveal;
use super::role::{Ability, Faction, RoleState};
use super::vote;
use crate::config::TiePolicy;
use crate::error::EngineError;
use crate::types::PlayerId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum NightAction {
    Pair { first: PlayerId, second: PlayerId },
    Mentor { target: PlayerId },
    Guard { target: PlayerId },
    Kill { target: PlayerId },
    Potion {
        #[serde(default)]
        save: Option<PlayerId>,
        #[serde(default)]
        poison: Option<PlayerId>,
    },
    Inspect { target: PlayerId },
    Silence { target: PlayerId },
    Detonate {
        #[serde(default)]
        take: Option<PlayerId>,
    },
}

/// One submission slot per actor per kind of action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Pair,
    Mentor,
    Guard,
    Kill,
    Potion,
    Inspect,
    Silence,
    Detonate,
}

impl NightAction {
    pub fn slot(&self) -> Slot {
        match self {
            NightAction::Pair { .. } => Slot::Pair,
            NightAction::Mentor { .. } => Slot::Mentor,
            NightAction::Guard { .. } => Slot::Guard,
            NightAction::Kill { .. } => Slot::Kill,
            NightAction::Potion { .. } => Slot::Potion,
            NightAction::Inspect { .. } => Slot::Inspect,
            NightAction::Silence { .. } => Slot::Silence,
            NightAction::Detonate { .. } => Slot::Detonate,
        }
    }
}

/// Tonight's submissions in arrival order.
#[derive(Debug, Clone, Default)]
pub struct NightSubmissions {
    entries: Vec<(PlayerId, NightAction)>,
}

impl NightSubmissions {
    pub fn has(&self, actor: &PlayerId, slot: Slot) -> bool {
        self.entries.iter().any(|(a, act)| a == actor && act.slot() == slot)
    }

    pub fn push(&mut self, actor: PlayerId, action: NightAction) {
        self.entries.push((actor, action));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn of(&self, slot: Slot) -> impl Iterator<Item = (&PlayerId, &NightAction)> {
        self.entries
            .iter()
            .filter(move |(_, act)| act.slot() == slot)
            .map(|(a, act)| (a, act))
    }
}

/// The resolution steps, in precedence order. Each later step sees what the
/// earlier ones did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Lovers,
    Mentor,
    Guard,
    WolfKill,
    Antidote,
    Poison,
    Inspect,
    Silence,
    Detonate,
    Transform,
}

pub const PIPELINE: [Step; 10] = [
    Step::Lovers,
    Step::Mentor,
    Step::Guard,
    Step::WolfKill,
    Step::Antidote,
    Step::Poison,
    Step::Inspect,
    Step::Silence,
    Step::Detonate,
    Step::Transform,
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NightOutcome {
    pub deaths: Vec<PlayerId>,
    pub narration: Vec<String>,
    pub reveals: BTreeMap<PlayerId, Vec<Reveal>>,
}

/// Working state shared by the steps of one night.
struct Night<'g> {
    game: &'g mut Game,
    subs: NightSubmissions,
    /// A blood-moon detonation voids the good side's actions.
    good_voided: bool,
    protected: HashSet<PlayerId>,
    /// Wolves' chosen victim, and whether that death is still going ahead.
    attacked: Option<PlayerId>,
    kill_pending: bool,
    out: NightOutcome,
}

impl Night<'_> {
    fn record(&mut self, fate: &Fate) {
        for id in fate.deaths() {
            if !self.out.deaths.contains(id) {
                self.out.deaths.push(id.clone());
            }
        }
    }

    fn reveal(&mut self, to: &PlayerId, reveal: Reveal) {
        self.out.reveals.entry(to.clone()).or_default().push(reveal);
    }

    fn say(&mut self, line: impl Into<String>) {
        self.out.narration.push(line.into());
    }

    fn kill(&mut self, victim: &PlayerId, cause: Cause) -> Fate {
        let fate = self.game.kill(victim, cause, &mut self.out.narration);
        self.record(&fate);
        fate
    }
}

impl Step {
    fn run(self, n: &mut Night<'_>) {
        match self {
            Step::Lovers => lovers(n),
            Step::Mentor => mentor(n),
            Step::Guard => guard(n),
            Step::WolfKill => wolf_kill(n),
            Step::Antidote => antidote(n),
            Step::Poison => poison(n),
            Step::Inspect => inspect(n),
            Step::Silence => silence(n),
            Step::Detonate => detonate(n),
            Step::Transform => transform(n),
        }
    }
}

/// Resolve tonight's submissions against the game and clear them.
pub fn resolve(game: &mut Game) -> NightOutcome {
    resolve_with(game, &PIPELINE)
}

pub(crate) fn resolve_with(game: &mut Game, steps: &[Step]) -> NightOutcome {
    let subs = std::mem::take(&mut game.night);
    let good_voided = subs.of(Slot::Detonate).any(|(actor, _)| {
        game.player(actor)
            .is_some_and(|p| p.can_detonate() && p.has(Ability::DetonationVoidsGood))
    });

    let mut night = Night {
        game,
        subs,
        good_voided,
        protected: HashSet::new(),
        attacked: None,
        kill_pending: false,
        out: NightOutcome::default(),
    };
    if good_voided {
        night.say("A blood moon rises: the village's powers fail tonight");
    }

    for step in steps {
        debug!(room = %night.game.room_id, day = night.game.day, ?step, "night step");
        step.run(&mut night);
    }

    if night.out.deaths.is_empty() {
        night.say("The night passes without a death");
    }
    info!(
        room = %night.game.room_id,
        day = night.game.day,
        deaths = night.out.deaths.len(),
        "night resolved"
    );
    night.out
}

fn lovers(n: &mut Night<'_>) {
    if n.game.day != 1 || n.game.lovers.is_some() {
        return;
    }
    let pair = n.subs.of(Slot::Pair).find_map(|(actor, act)| match act {
        NightAction::Pair { first, second } => Some((actor.clone(), first.clone(), second.clone())),
        _ => None,
    });
    let Some((cupid, first, second)) = pair else { return };
    if first == second || !n.game.is_alive(&first) || !n.game.is_alive(&second) {
        return;
    }
    if let Some(p) = n.game.player_mut(&cupid) {
        p.state = RoleState::Cupid { paired: true };
    }
    n.game.lovers = Some((first.clone(), second.clone()));
    n.reveal(&first, Reveal::Lover { partner: second.clone() });
    n.reveal(&second, Reveal::Lover { partner: first });
    n.say("Cupid's arrow has found two hearts");
}

fn mentor(n: &mut Night<'_>) {
    if n.game.day != 1 {
        return;
    }
    let picks: Vec<(PlayerId, PlayerId)> = n
        .subs
        .of(Slot::Mentor)
        .filter_map(|(actor, act)| match act {
            NightAction::Mentor { target } => Some((actor.clone(), target.clone())),
            _ => None,
        })
        .collect();
    for (child, target) in picks {
        if child == target || n.game.player(&target).is_none() {
            continue;
        }
        if let Some(p) = n.game.player_mut(&child) {
            if let RoleState::WildChild { mentor: mentor @ None, .. } = &mut p.state {
                *mentor = Some(target);
            }
        }
    }
}

fn guard(n: &mut Night<'_>) {
    if n.good_voided {
        return;
    }
    let picks: Vec<(PlayerId, PlayerId)> = n
        .subs
        .of(Slot::Guard)
        .filter_map(|(actor, act)| match act {
            NightAction::Guard { target } => Some((actor.clone(), target.clone())),
            _ => None,
        })
        .collect();
    for (guard, target) in picks {
        let Some(p) = n.game.player_mut(&guard) else { continue };
        if p.last_target() == Some(&target) {
            n.say("The guard cannot shield the same player two nights running");
            continue;
        }
        p.remember_target(&target);
        n.protected.insert(target);
    }
}

fn wolf_kill(n: &mut Night<'_>) {
    let day = n.game.day;
    if day == 1 && !n.game.config.first_night_kill {
        n.say("The wolves hold back on the first night");
        return;
    }

    let ballots: Vec<&PlayerId> = n
        .subs
        .of(Slot::Kill)
        .filter(|(actor, _)| {
            n.game.player(actor).is_some_and(|p| p.can_hunt(day))
                && !n.subs.has(actor, Slot::Detonate)
        })
        .filter_map(|(_, act)| match act {
            NightAction::Kill { target } => Some(target),
            _ => None,
        })
        .filter(|target| n.game.is_alive(target))
        .collect();

    let tally = vote::tally(ballots);
    let Some(target) = vote::leader(&tally, TiePolicy::FirstSeen) else { return };

    if n.protected.contains(&target) {
        n.say("The wolves struck, but their prey was shielded");
        n.attacked = Some(target);
        return;
    }
    n.attacked = Some(target);
    n.kill_pending = true;
}

fn antidote(n: &mut Night<'_>) {
    if !n.good_voided {
        let saves: Vec<(PlayerId, PlayerId)> = n
            .subs
            .of(Slot::Potion)
            .filter_map(|(actor, act)| match act {
                NightAction::Potion { save: Some(s), .. } => Some((actor.clone(), s.clone())),
                _ => None,
            })
            .collect();
        for (witch, save) in saves {
            if !n.kill_pending || n.attacked.as_ref() != Some(&save) {
                continue;
            }
            let Some(p) = n.game.player_mut(&witch) else { continue };
            if let RoleState::Witch { antidotes, .. } = &mut p.state {
                if *antidotes > 0 {
                    *antidotes -= 1;
                    n.kill_pending = false;
                    n.say("A potion pulled someone back from the brink");
                }
            }
        }
    }

    if n.kill_pending {
        if let Some(target) = n.attacked.clone() {
            if let Fate::Died(_) = n.kill(&target, Cause::WolfKill) {
                let name = n.game.name_of(&target);
                n.say(format!("{name} was killed by the wolves"));
            }
        }
        n.kill_pending = false;
    }
}

fn poison(n: &mut Night<'_>) {
    if n.good_voided {
        return;
    }
    let doses: Vec<(PlayerId, PlayerId)> = n
        .subs
        .of(Slot::Potion)
        .filter_map(|(actor, act)| match act {
            NightAction::Potion { poison: Some(t), .. } => Some((actor.clone(), t.clone())),
            _ => None,
        })
        .collect();
    for (witch, target) in doses {
        let Some(p) = n.game.player_mut(&witch).filter(|p| p.is_alive) else { continue };
        let RoleState::Witch { poisons, .. } = &mut p.state else { continue };
        if *poisons == 0 {
            continue;
        }
        *poisons -= 1;

        match n.kill(&target, Cause::Poison) {
            Fate::Died(_) => {
                let name = n.game.name_of(&target);
                n.say(format!("{name} was found poisoned"));
            }
            Fate::Immune => n.say("A poison was poured, but it had no effect"),
            Fate::AlreadyGone => {}
        }
    }
}

fn inspect(n: &mut Night<'_>) {
    if n.good_voided {
        return;
    }
    let checks: Vec<(PlayerId, PlayerId)> = n
        .subs
        .of(Slot::Inspect)
        .filter_map(|(actor, act)| match act {
            NightAction::Inspect { target } => Some((actor.clone(), target.clone())),
            _ => None,
        })
        .collect();
    for (seer, target) in checks {
        if !n.game.is_alive(&seer) {
            continue;
        }
        let Some(hostile) = n.game.player(&target).map(|p| p.reads_hostile()) else {
            continue;
        };
        n.reveal(&seer, Reveal::Inspection { target, hostile });
    }
}

fn silence(n: &mut Night<'_>) {
    if n.good_voided {
        return;
    }
    let picks: Vec<(PlayerId, PlayerId)> = n
        .subs
        .of(Slot::Silence)
        .filter_map(|(actor, act)| match act {
            NightAction::Silence { target } => Some((actor.clone(), target.clone())),
            _ => None,
        })
        .collect();
    for (elder, target) in picks {
        let Some(p) = n.game.player_mut(&elder).filter(|p| p.is_alive) else { continue };
        if p.last_target() == Some(&target) {
            n.say("The elder cannot silence the same player two nights running");
            continue;
        }
        p.remember_target(&target);

        let Some(t) = n.game.player_mut(&target) else { continue };
        if !t.is_alive {
            continue;
        }
        if !t.can_be_silenced() {
            n.say("The elder's silence slid off its target");
            continue;
        }
        t.silenced_today = true;
        let name = t.name.clone();
        n.say(format!("{name} has been silenced for the day"));
    }
}

fn detonate(n: &mut Night<'_>) {
    let blasts: Vec<(PlayerId, Option<PlayerId>)> = n
        .subs
        .of(Slot::Detonate)
        .filter_map(|(actor, act)| match act {
            NightAction::Detonate { take } => Some((actor.clone(), take.clone())),
            _ => None,
        })
        .collect();
    for (actor, take) in blasts {
        let Some(p) = n.game.player_mut(&actor) else { continue };
        if !p.can_detonate() {
            continue;
        }
        p.state = RoleState::Detonator { used: true };
        let takes = p.has(Ability::DetonationTakesTarget);
        let name = p.name.clone();

        n.kill(&actor, Cause::Detonation);
        n.say(format!("{name} self-detonated"));

        if let Some(victim) = take.filter(|v| takes && *v != actor) {
            if let Fate::Died(_) = n.kill(&victim, Cause::Detonation) {
                let victim_name = n.game.name_of(&victim);
                n.say(format!("{victim_name} was caught in the blast"));
            }
        }
    }
}

fn transform(n: &mut Night<'_>) {
    if !n.game.config.wild_child_transform {
        return;
    }
    let orphans: Vec<PlayerId> = n
        .game
        .players
        .iter()
        .filter(|p| p.is_alive)
        .filter_map(|p| match &p.state {
            RoleState::WildChild {
                mentor: Some(m),
                transformed: false,
            } if !n.game.is_alive(m) => Some(p.id.clone()),
            _ => None,
        })
        .collect();
    for id in orphans {
        if let Some(p) = n.game.player_mut(&id) {
            p.faction = Faction::Werewolf;
            if let RoleState::WildChild { transformed, .. } = &mut p.state {
                *transformed = true;
            }
        }
        n.reveal(&id, Reveal::Transformed);
    }
}

impl Game {
    /// Validate a night submission without touching state.
    pub(crate) fn check_night_action(
        &self,
        actor: &PlayerId,
        action: &NightAction,
    ) -> Result<(), EngineError> {
        let p = self.living(actor)?;
        let day = self.day;
        let inel = |action: &'static str| EngineError::Ineligible {
            role: p.role.key(),
            action,
        };

        if self.night.has(actor, action.slot()) {
            return Err(EngineError::LateAction);
        }

        match action {
            NightAction::Pair { first, second } => {
                if day != 1 || !p.can_pair() {
                    return Err(inel("pair lovers"));
                }
                if first == second {
                    return Err(EngineError::InvalidTarget("lovers must be two different players"));
                }
                self.living(first)?;
                self.living(second)?;
            }
            NightAction::Mentor { target } => {
                if day != 1 || !p.can_choose_mentor() {
                    return Err(inel("choose a mentor"));
                }
                if target == actor {
                    return Err(EngineError::InvalidTarget("cannot mentor yourself"));
                }
                self.living(target)?;
            }
            NightAction::Guard { target } => {
                if !p.can_guard() {
                    return Err(inel("guard"));
                }
                self.living(target)?;
            }
            NightAction::Kill { target } => {
                if !p.can_hunt(day) || !self.kill_allowed() {
                    return Err(inel("kill"));
                }
                self.living(target)?;
            }
            NightAction::Potion { save, poison } => {
                let RoleState::Witch { antidotes, poisons } = &p.state else {
                    return Err(inel("use potions"));
                };
                if let Some(s) = save {
                    if *antidotes == 0 {
                        return Err(inel("save: antidote spent"));
                    }
                    self.living(s)?;
                }
                if let Some(t) = poison {
                    if *poisons == 0 {
                        return Err(inel("poison: poison spent"));
                    }
                    self.living(t)?;
                }
            }
            NightAction::Inspect { target } => {
                if !p.has(Ability::Inspect) {
                    return Err(inel("inspect"));
                }
                if target == actor {
                    return Err(EngineError::InvalidTarget("cannot inspect yourself"));
                }
                self.living(target)?;
            }
            NightAction::Silence { target } => {
                if !p.can_silence() {
                    return Err(inel("silence"));
                }
                self.living(target)?;
            }
            NightAction::Detonate { take } => {
                if !p.can_detonate() {
                    return Err(inel("self-detonate"));
                }
                if let Some(t) = take {
                    if !p.has(Ability::DetonationTakesTarget) {
                        return Err(inel("take a target when detonating"));
                    }
                    if t == actor {
                        return Err(EngineError::InvalidTarget("cannot take yourself"));
                    }
                    self.living(t)?;
                }
            }
        }
        Ok(())
    }

    pub(crate) fn kill_allowed(&self) -> bool {
        self.day > 1 || self.config.first_night_kill
    }

    /// Slots a living player still owes tonight before the night can close early.
    pub(crate) fn required_slots(&self, id: &PlayerId) -> Vec<Slot> {
        let Some(p) = self.player(id).filter(|p| p.is_alive) else {
            return Vec::new();
        };
        let mut slots = Vec::new();
        if self.day == 1 && p.can_pair() {
            slots.push(Slot::Pair);
        }
        if self.day == 1 && p.can_choose_mentor() {
            slots.push(Slot::Mentor);
        }
        if p.can_guard() {
            slots.push(Slot::Guard);
        }
        if p.can_hunt(self.day) && self.kill_allowed() && !self.night.has(id, Slot::Detonate) {
            slots.push(Slot::Kill);
        }
        if p.has_potion() {
            slots.push(Slot::Potion);
        }
        if p.has(Ability::Inspect) {
            slots.push(Slot::Inspect);
        }
        if p.can_silence() {
            slots.push(Slot::Silence);
        }
        slots
    }

    pub(crate) fn night_complete(&self) -> bool {
        self.players.iter().all(|p| {
            self.required_slots(&p.id)
                .into_iter()
                .all(|slot| self.night.has(&p.id, slot))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::engine::tests::game_with;
    use crate::game::role::Role;

    fn submit(g: &mut Game, actor: &str, action: NightAction) {
        g.check_night_action(&actor.to_string(), &action).unwrap();
        g.night.push(actor.to_string(), action);
    }

    fn kill(t: &str) -> NightAction {
        NightAction::Kill { target: t.into() }
    }

    #[test]
    fn guard_cancels_kill() {
        let mut g = game_with(&[Role::NormalWolf, Role::Guard, Role::Civilian, Role::Civilian]);
        submit(&mut g, "p1", kill("p3"));
        submit(&mut g, "p2", NightAction::Guard { target: "p3".into() });
        let out = resolve(&mut g);
        assert!(out.deaths.is_empty());
        assert!(g.is_alive(&"p3".into()));
    }

    #[test]
    fn guard_repeat_is_a_narrated_no_op() {
        let mut g = game_with(&[Role::NormalWolf, Role::Guard, Role::Civilian, Role::Civilian, Role::Civilian]);
        submit(&mut g, "p2", NightAction::Guard { target: "p3".into() });
        resolve(&mut g);

        g.day = 2;
        submit(&mut g, "p1", kill("p3"));
        submit(&mut g, "p2", NightAction::Guard { target: "p3".into() });
        let out = resolve(&mut g);
        assert_eq!(out.deaths, vec!["p3".to_string()]);
        assert!(out.narration.iter().any(|l| l.contains("two nights running")));
    }

    #[test]
    fn antidote_only_saves_the_wolves_victim() {
        let mut g = game_with(&[Role::NormalWolf, Role::Witch, Role::Civilian, Role::Civilian]);
        submit(&mut g, "p1", kill("p3"));
        submit(
            &mut g,
            "p2",
            NightAction::Potion {
                save: Some("p4".into()),
                poison: None,
            },
        );
        let out = resolve(&mut g);
        assert_eq!(out.deaths, vec!["p3".to_string()]);
        assert_eq!(
            g.player(&"p2".into()).unwrap().state,
            RoleState::Witch {
                antidotes: 1,
                poisons: 1
            }
        );
    }

    #[test]
    fn antidote_cancels_kill_and_is_spent() {
        let mut g = game_with(&[Role::NormalWolf, Role::Witch, Role::Civilian, Role::Civilian]);
        submit(&mut g, "p1", kill("p3"));
        submit(
            &mut g,
            "p2",
            NightAction::Potion {
                save: Some("p3".into()),
                poison: None,
            },
        );
        let out = resolve(&mut g);
        assert!(out.deaths.is_empty());
        assert!(matches!(
            g.player(&"p2".into()).unwrap().state,
            RoleState::Witch { antidotes: 0, .. }
        ));
    }

    #[test]
    fn poison_on_immune_target_still_spends_the_charge() {
        let mut g = game_with(&[Role::NormalWolf, Role::Witch, Role::OldRogue, Role::Civilian]);
        submit(
            &mut g,
            "p2",
            NightAction::Potion {
                save: None,
                poison: Some("p3".into()),
            },
        );
        let out = resolve(&mut g);
        assert!(out.deaths.is_empty());
        assert!(g.is_alive(&"p3".into()));
        assert!(matches!(
            g.player(&"p2".into()).unwrap().state,
            RoleState::Witch { poisons: 0, .. }
        ));
    }

    #[test]
    fn bomber_inspects_as_hostile() {
        let mut g = game_with(&[Role::NormalWolf, Role::Seer, Role::Bomber, Role::Civilian]);
        submit(&mut g, "p2", NightAction::Inspect { target: "p3".into() });
        let out = resolve(&mut g);
        assert_eq!(
            out.reveals[&"p2".to_string()],
            vec![Reveal::Inspection {
                target: "p3".into(),
                hostile: true
            }]
        );
    }

    #[test]
    fn old_rogue_cannot_be_silenced() {
        let mut g = game_with(&[Role::NormalWolf, Role::Silencer, Role::OldRogue, Role::Civilian]);
        submit(&mut g, "p2", NightAction::Silence { target: "p3".into() });
        resolve(&mut g);
        assert!(!g.player(&"p3".into()).unwrap().silenced_today);
    }

    #[test]
    fn apostle_does_not_vote_on_first_night() {
        let g = game_with(&[Role::BloodMoonApostle, Role::Seer, Role::Civilian, Role::Civilian]);
        let err = g.check_night_action(&"p1".into(), &kill("p3")).unwrap_err();
        assert!(matches!(err, EngineError::Ineligible { .. }));
    }

    #[test]
    fn first_night_kill_can_be_disabled() {
        let mut g = game_with(&[Role::NormalWolf, Role::Seer, Role::Civilian, Role::Civilian]);
        g.config.first_night_kill = false;
        assert!(g.check_night_action(&"p1".into(), &kill("p3")).is_err());
        g.night.push("p1".into(), kill("p3"));
        let out = resolve(&mut g);
        assert!(out.deaths.is_empty());
    }

    #[test]
    fn white_wolf_detonation_takes_a_target() {
        let mut g = game_with(&[Role::WhiteWolf, Role::NormalWolf, Role::Seer, Role::Civilian, Role::Civilian]);
        submit(&mut g, "p1", NightAction::Detonate { take: Some("p3".into()) });
        submit(&mut g, "p2", kill("p4"));
        let out = resolve(&mut g);
        assert_eq!(out.deaths, vec!["p4".to_string(), "p1".to_string(), "p3".to_string()]);
    }

    #[test]
    fn old_rogue_falls_to_the_wolves() {
        let mut g = game_with(&[Role::NormalWolf, Role::OldRogue, Role::Civilian, Role::Civilian]);
        submit(&mut g, "p1", kill("p2"));
        let out = resolve(&mut g);
        assert_eq!(out.deaths, vec!["p2".to_string()]);
        assert!(!g.is_alive(&"p2".into()));
    }

    #[test]
    fn white_wolf_blast_takes_the_old_rogue() {
        let mut g = game_with(&[Role::WhiteWolf, Role::NormalWolf, Role::OldRogue, Role::Civilian, Role::Civilian]);
        submit(&mut g, "p1", NightAction::Detonate { take: Some("p3".into()) });
        let out = resolve(&mut g);
        assert_eq!(out.deaths, vec!["p1".to_string(), "p3".to_string()]);
        assert!(!g.is_alive(&"p3".into()));
    }

    #[test]
    fn blood_moon_voids_good_actions() {
        let mut g = game_with(&[
            Role::BloodMoonApostle,
            Role::NormalWolf,
            Role::Guard,
            Role::Seer,
            Role::Civilian,
        ]);
        g.day = 2;
        submit(&mut g, "p1", NightAction::Detonate { take: None });
        submit(&mut g, "p2", kill("p5"));
        submit(&mut g, "p3", NightAction::Guard { target: "p5".into() });
        submit(&mut g, "p4", NightAction::Inspect { target: "p2".into() });
        let out = resolve(&mut g);
        assert!(out.deaths.contains(&"p5".to_string()));
        assert!(out.deaths.contains(&"p1".to_string()));
        assert!(out.reveals.is_empty());
    }

    #[test]
    fn wild_child_turns_when_mentor_dies() {
        let mut g = game_with(&[Role::NormalWolf, Role::WildChild, Role::Seer, Role::Civilian]);
        submit(&mut g, "p2", NightAction::Mentor { target: "p3".into() });
        submit(&mut g, "p1", kill("p3"));
        let out = resolve(&mut g);
        assert_eq!(out.deaths, vec!["p3".to_string()]);
        let child = g.player(&"p2".into()).unwrap();
        assert_eq!(child.faction, Faction::Werewolf);
        assert_eq!(out.reveals[&"p2".to_string()], vec![Reveal::Transformed]);
        assert!(!out.narration.iter().any(|l| l.contains("wild child")));
    }

    #[test]
    fn witch_killed_tonight_does_not_poison() {
        let mut g = game_with(&[
            Role::Civilian,
            Role::NormalWolf,
            Role::Seer,
            Role::Civilian,
            Role::Civilian,
            Role::Witch,
        ]);
        submit(&mut g, "p2", kill("p6"));
        submit(
            &mut g,
            "p6",
            NightAction::Potion {
                save: None,
                poison: Some("p1".into()),
            },
        );
        let out = resolve(&mut g);
        assert_eq!(out.deaths, vec!["p6".to_string()]);
        assert!(g.is_alive(&"p1".into()));
    }

    #[test]
    fn seer_killed_tonight_learns_nothing() {
        let mut g = game_with(&[Role::NormalWolf, Role::Seer, Role::Civilian, Role::Civilian]);
        submit(&mut g, "p1", kill("p2"));
        submit(&mut g, "p2", NightAction::Inspect { target: "p1".into() });
        let out = resolve(&mut g);
        assert_eq!(out.deaths, vec!["p2".to_string()]);
        assert!(out.reveals.is_empty());
    }

    #[test]
    fn silencer_killed_tonight_silences_nobody() {
        let mut g = game_with(&[Role::NormalWolf, Role::Silencer, Role::Civilian, Role::Civilian]);
        submit(&mut g, "p1", kill("p2"));
        submit(&mut g, "p2", NightAction::Silence { target: "p3".into() });
        resolve(&mut g);
        assert!(!g.player(&"p3".into()).unwrap().silenced_today);
    }

    #[test]
    fn second_submission_to_a_slot_is_late() {
        let mut g = game_with(&[Role::NormalWolf, Role::Seer, Role::Civilian, Role::Civilian]);
        submit(&mut g, "p1", kill("p3"));
        assert_eq!(
            g.check_night_action(&"p1".into(), &kill("p4")).unwrap_err(),
            EngineError::LateAction
        );
    }

    #[test]
    fn steps_run_independently() {
        let mut g = game_with(&[Role::NormalWolf, Role::Seer, Role::Civilian, Role::Civilian]);
        submit(&mut g, "p1", kill("p3"));
        submit(&mut g, "p2", NightAction::Inspect { target: "p1".into() });
        let out = resolve_with(&mut g, &[Step::Inspect]);
        assert!(out.deaths.is_empty());
        assert_eq!(out.reveals.len(), 1);
    }

    #[test]
    fn wolf_ballots_pick_the_plurality() {
        let mut g = game_with(&[
            Role::NormalWolf,
            Role::NormalWolf,
            Role::WerewolfKing,
            Role::Civilian,
            Role::Civilian,
            Role::Civilian,
            Role::Civilian,
        ]);
        submit(&mut g, "p1", kill("p4"));
        submit(&mut g, "p2", kill("p5"));
        submit(&mut g, "p3", kill("p5"));
        let out = resolve(&mut g);
        assert_eq!(out.deaths, vec!["p5".to_string()]);
    }
}
