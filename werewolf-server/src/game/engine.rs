//! The per-room game: state plus the phase machine that drives the
//! resolvers. Every command either returns the events it produced or an
//! error, in which case nothing changed.
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::time::Duration;

use rand::Rng;
use tracing::{debug, info, warn};

use super::assign::{self, RoleCounts};
use super::death::Cause;
use super::event::{Event, TimerToken};
use super::night::{self, NightAction, NightSubmissions};
use super::player::Player;
use super::role::{Ability, RoleState};
use super::vote::{self, Ballot};
use super::win;
use crate::config::GameConfig;
use crate::error::EngineError;
use crate::types::{Phase, PlayerId, RoomId, Winner};

pub const MIN_PLAYERS: usize = 4;

#[derive(Debug)]
pub struct Game {
    pub(crate) room_id: RoomId,
    pub(crate) config: GameConfig,
    pub(crate) phase: Phase,
    pub(crate) day: u32,
    pub(crate) players: Vec<Player>,
    pub(crate) lovers: Option<(PlayerId, PlayerId)>,
    pub(crate) night: NightSubmissions,
    pub(crate) ballots: Vec<Ballot>,
    pub(crate) winner: Option<Winner>,
    /// Set when a bomber's blast wiped out one side.
    pub(crate) bomber_triumph: bool,
    timer: TimerToken,
    speaker: Option<PlayerId>,
    speakers: VecDeque<PlayerId>,
    /// Where the game goes once the last-words queue runs dry.
    after_speeches: Phase,
}

impl Game {
    pub fn new(room_id: RoomId, config: GameConfig) -> Self {
        Self {
            room_id,
            config,
            phase: Phase::Lobby,
            day: 1,
            players: Vec::new(),
            lovers: None,
            night: NightSubmissions::default(),
            ballots: Vec::new(),
            winner: None,
            bomber_triumph: false,
            timer: TimerToken(0),
            speaker: None,
            speakers: VecDeque::new(),
            after_speeches: Phase::DayDiscuss,
        }
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn winner(&self) -> Option<Winner> {
        self.winner
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn lovers(&self) -> Option<&(PlayerId, PlayerId)> {
        self.lovers.as_ref()
    }

    pub fn speaker(&self) -> Option<&PlayerId> {
        self.speaker.as_ref()
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }

    pub(crate) fn player_mut(&mut self, id: &PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| &p.id == id)
    }

    pub fn is_alive(&self, id: &PlayerId) -> bool {
        self.player(id).is_some_and(|p| p.is_alive)
    }

    pub(crate) fn name_of(&self, id: &PlayerId) -> String {
        self.player(id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| "someone".to_string())
    }

    pub(crate) fn living(&self, id: &PlayerId) -> Result<&Player, EngineError> {
        match self.player(id) {
            None => Err(EngineError::UnknownPlayer(id.clone())),
            Some(p) if !p.is_alive => Err(EngineError::DeadPlayer(id.clone())),
            Some(p) => Ok(p),
        }
    }

    fn ensure_phase(&self, allowed: &[Phase]) -> Result<(), EngineError> {
        if self.phase == Phase::Ended {
            return Err(EngineError::TerminalState);
        }
        if !allowed.contains(&self.phase) {
            return Err(EngineError::WrongPhase { actual: self.phase });
        }
        Ok(())
    }

    /// Whether `id` may talk right now: silenced players keep quiet for the
    /// day, last words belong to the speaker alone, the dead only talk once
    /// the game is over.
    pub fn can_speak(&self, id: &PlayerId) -> bool {
        match self.phase {
            Phase::Lobby | Phase::Ended => true,
            Phase::Night => false,
            Phase::LastWords => self.speaker.as_ref() == Some(id),
            Phase::DayDiscuss | Phase::DayVote => self
                .player(id)
                .is_some_and(|p| p.is_alive && !p.silenced_today),
        }
    }

    /// Lobby → Night: deal roles to the roster and open the first night.
    pub fn assign_roles<R: Rng + ?Sized>(
        &mut self,
        roster: &[(PlayerId, String)],
        counts: &RoleCounts,
        rng: &mut R,
    ) -> Result<Vec<Event>, EngineError> {
        self.ensure_phase(&[Phase::Lobby])?;
        if roster.len() < MIN_PLAYERS {
            return Err(EngineError::NotEnoughPlayers {
                needed: MIN_PLAYERS,
                have: roster.len(),
            });
        }
        let mut seen = HashSet::new();
        if let Some((dup, _)) = roster.iter().find(|(id, _)| !seen.insert(id)) {
            return Err(EngineError::DuplicatePlayer(dup.clone()));
        }

        let roles = assign::build(counts, roster.len(), self.config.strict_roles)?;
        self.players = assign::assign(roster, roles, rng)?;
        info!(room = %self.room_id, players = self.players.len(), "roles assigned");

        let mut events: Vec<Event> = self
            .players
            .iter()
            .map(|p| Event::RoleAssigned {
                player: p.id.clone(),
                role: p.role,
                faction: p.faction,
                ability_text: p.role.descriptor().text,
            })
            .collect();
        self.enter_night(&mut events);
        Ok(events)
    }

    pub fn submit_night_action(
        &mut self,
        actor: &PlayerId,
        action: NightAction,
    ) -> Result<Vec<Event>, EngineError> {
        self.ensure_phase(&[Phase::Night])?;
        self.check_night_action(actor, &action)?;
        debug!(room = %self.room_id, player = %actor, slot = ?action.slot(), "night action");
        self.night.push(actor.clone(), action);

        let mut events = Vec::new();
        if self.night_complete() {
            self.finish_night(&mut events);
        }
        Ok(events)
    }

    pub fn submit_vote(&mut self, voter: &PlayerId, target: &PlayerId) -> Result<Vec<Event>, EngineError> {
        self.ensure_phase(&[Phase::DayVote])?;
        let p = self.living(voter)?;
        if !p.can_vote {
            return Err(EngineError::NoVotingRights(voter.clone()));
        }
        self.living(target)?;
        if self.ballots.iter().any(|b| &b.voter == voter) {
            return Err(EngineError::AlreadyVoted);
        }

        debug!(room = %self.room_id, voter = %voter, target = %target, "ballot");
        self.ballots.push(Ballot {
            voter: voter.clone(),
            target: target.clone(),
        });

        let mut events = Vec::new();
        if self.votes_complete() {
            self.finish_vote(&mut events);
        }
        Ok(events)
    }

    /// A knight's duel, any time during the day. A werewolf target dies;
    /// anyone else costs the knight their life.
    pub fn invoke_duel(&mut self, actor: &PlayerId, target: &PlayerId) -> Result<Vec<Event>, EngineError> {
        self.ensure_phase(&[Phase::DayDiscuss, Phase::DayVote, Phase::LastWords])?;
        let knight = self.living(actor)?;
        if !knight.has(Ability::Duel) {
            return Err(EngineError::Ineligible {
                role: knight.role.key(),
                action: "duel",
            });
        }
        if !knight.can_duel() {
            return Err(EngineError::DuelUsed);
        }
        if actor == target {
            return Err(EngineError::InvalidTarget("cannot duel yourself"));
        }
        let hostile = self.living(target)?.is_werewolf();

        if let Some(k) = self.player_mut(actor) {
            k.state = RoleState::Knight { duel_used: true };
        }

        let mut narration = Vec::new();
        let (knight_name, target_name) = (self.name_of(actor), self.name_of(target));
        let loser = if hostile {
            narration.push(format!("{knight_name} duels {target_name}: a werewolf! {target_name} falls"));
            target
        } else {
            narration.push(format!("{knight_name} duels {target_name}: innocent. The knight falls"));
            actor
        };
        let fate = self.kill(loser, Cause::Duel, &mut narration);
        info!(room = %self.room_id, duelist = %actor, target = %target, hostile, "duel");

        let mut events = Vec::new();
        let winner = self.settle_winner();
        events.push(Event::DuelResult {
            duelist: actor.clone(),
            target: target.clone(),
            deaths: fate.deaths().to_vec(),
            narration,
            winner,
        });
        if winner.is_some() {
            self.end_game(&mut events);
        } else if self.phase == Phase::DayVote && self.votes_complete() {
            self.finish_vote(&mut events);
        }
        Ok(events)
    }

    /// The current last-words speaker yields the floor early.
    pub fn end_speech(&mut self, actor: &PlayerId) -> Result<Vec<Event>, EngineError> {
        self.ensure_phase(&[Phase::LastWords])?;
        if self.speaker.as_ref() != Some(actor) {
            return Err(EngineError::NotSpeaker);
        }
        let mut events = Vec::new();
        self.next_speaker(&mut events);
        Ok(events)
    }

    /// A phase timer went off. Stale tokens (the phase already moved on) are
    /// ignored so a late timer can never advance the game twice.
    pub fn timer_fired(&mut self, token: TimerToken) -> Vec<Event> {
        let mut events = Vec::new();
        if token != self.timer || self.phase == Phase::Ended {
            debug!(room = %self.room_id, ?token, current = ?self.timer, "stale timer ignored");
            return events;
        }
        match self.phase {
            Phase::Night => self.finish_night(&mut events),
            Phase::DayDiscuss => {
                let after = self.config.vote();
                self.enter(Phase::DayVote, None, after, &mut events);
            }
            Phase::DayVote => self.finish_vote(&mut events),
            Phase::LastWords => self.next_speaker(&mut events),
            Phase::Lobby | Phase::Ended => {}
        }
        events
    }

    fn enter(&mut self, phase: Phase, speaker: Option<PlayerId>, after: Duration, events: &mut Vec<Event>) {
        self.phase = phase;
        self.speaker = speaker.clone();
        self.timer = TimerToken(self.timer.0 + 1);
        info!(room = %self.room_id, %phase, day = self.day, "phase changed");
        events.push(Event::PhaseChanged {
            phase,
            day: self.day,
            speaker,
            duration: after.as_secs(),
        });
        events.push(Event::ArmTimer {
            token: self.timer,
            after,
        });
    }

    fn enter_night(&mut self, events: &mut Vec<Event>) {
        for p in &mut self.players {
            p.silenced_today = false;
        }
        self.night = NightSubmissions::default();
        let after = self.config.night();
        self.enter(Phase::Night, None, after, events);
        if self.night_complete() {
            self.finish_night(events);
        }
    }

    fn finish_night(&mut self, events: &mut Vec<Event>) {
        let outcome = night::resolve(self);
        events.push(Event::NightResult {
            day: self.day,
            deaths: outcome.deaths.clone(),
            narration: outcome.narration,
            private_reveals: outcome.reveals,
        });
        if self.settle_winner().is_some() {
            self.end_game(events);
            return;
        }
        self.start_speeches(outcome.deaths, Phase::DayDiscuss, events);
    }

    fn votes_complete(&self) -> bool {
        self.players
            .iter()
            .filter(|p| p.is_alive && p.can_vote)
            .all(|p| self.ballots.iter().any(|b| b.voter == p.id))
    }

    fn finish_vote(&mut self, events: &mut Vec<Event>) {
        let outcome = vote::resolve(self);
        let winner = self.settle_winner();
        events.push(Event::VoteResult {
            day: self.day,
            tally: outcome.tally,
            eliminated: outcome.eliminated,
            deaths: outcome.deaths.clone(),
            narration: outcome.narration,
            winner,
        });
        if winner.is_some() {
            self.end_game(events);
            return;
        }
        self.start_speeches(outcome.deaths, Phase::Night, events);
    }

    fn start_speeches(&mut self, dead: Vec<PlayerId>, then: Phase, events: &mut Vec<Event>) {
        self.speakers = dead.into();
        self.after_speeches = then;
        self.next_speaker(events);
    }

    fn next_speaker(&mut self, events: &mut Vec<Event>) {
        if let Some(next) = self.speakers.pop_front() {
            let after = self.config.last_words();
            self.enter(Phase::LastWords, Some(next), after, events);
            return;
        }
        match self.after_speeches {
            Phase::Night => {
                self.day += 1;
                self.ballots.clear();
                self.enter_night(events);
            }
            _ => {
                let after = self.config.discuss();
                self.enter(Phase::DayDiscuss, None, after, events);
            }
        }
    }

    /// Run the win check and record the result. Once set, the winner never
    /// changes.
    fn settle_winner(&mut self) -> Option<Winner> {
        if self.winner.is_none() {
            self.winner = win::evaluate(self);
        }
        self.winner
    }

    fn end_game(&mut self, events: &mut Vec<Event>) {
        let Some(winner) = self.winner else {
            warn!(room = %self.room_id, "end_game without a winner");
            return;
        };
        self.phase = Phase::Ended;
        self.speaker = None;
        self.speakers.clear();
        self.timer = TimerToken(self.timer.0 + 1);
        info!(room = %self.room_id, %winner, day = self.day, "game over");

        let roles: BTreeMap<PlayerId, _> = self.players.iter().map(|p| (p.id.clone(), p.role)).collect();
        let survivors: Vec<String> = self
            .players
            .iter()
            .filter(|p| p.is_alive)
            .map(|p| p.name.clone())
            .collect();
        events.push(Event::PhaseChanged {
            phase: Phase::Ended,
            day: self.day,
            speaker: None,
            duration: 0,
        });
        events.push(Event::GameOver {
            winner,
            narration: vec![
                format!("Victory for the {winner} on day {}", self.day),
                format!("Survivors: {}", survivors.join(", ")),
            ],
            roles,
        });
    }
}
