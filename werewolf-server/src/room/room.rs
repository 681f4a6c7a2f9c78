use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use actix::Addr;
use rand::Rng;
use serde_json::json;
use tracing::{debug, info};

use crate::{
    config::GameConfig,
    error::RoomError,
    game::{assign::RoleCounts, Event, Game, NightAction, TimerToken},
    message::Outgoing,
    types::{Phase, PlayerId, RoomId},
    ws::client::{ServerText, WsClient},
};

pub const MAX_PLAYERS: usize = 12;

pub type SharedRoom = Arc<Mutex<Room>>;

/// Lock a room even if a previous holder panicked; the game state is only
/// ever mutated through commands that either fully apply or not at all.
pub fn lock(room: &SharedRoom) -> MutexGuard<'_, Room> {
    room.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct Member {
    pub id: PlayerId,
    pub name: String,
    pub addr: Option<Addr<WsClient>>,
}

/// One lobby plus the game played in it. Every command goes through
/// [`run`] so the resulting events reach the right sockets and phase timers
/// get armed.
pub struct Room {
    id: RoomId,
    host: PlayerId,
    members: Vec<Member>,
    game: Game,
}

impl Room {
    pub fn new(id: RoomId, host: Member, config: GameConfig) -> Self {
        info!(room = %id, host = %host.id, "room created");
        let room = Self {
            game: Game::new(id.clone(), config),
            id,
            host: host.id.clone(),
            members: vec![host],
        };
        room.broadcast_lobby();
        room
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn host(&self) -> &PlayerId {
        &self.host
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn join(&mut self, member: Member) -> Result<Vec<Event>, RoomError> {
        if self.game.phase() != Phase::Lobby {
            return Err(RoomError::AlreadyStarted);
        }
        if self.members.len() >= MAX_PLAYERS {
            return Err(RoomError::RoomFull(MAX_PLAYERS));
        }
        info!(room = %self.id, player = %member.id, name = %member.name, "join");
        self.members.push(member);
        self.broadcast_lobby();
        Ok(Vec::new())
    }

    /// Drop a member's socket. In the lobby the seat is freed (and the host
    /// handed on); once the game runs the player stays in it, disconnected.
    /// Returns true when nobody is connected any more.
    pub fn leave(&mut self, id: &PlayerId) -> bool {
        if self.game.phase() == Phase::Lobby {
            self.members.retain(|m| &m.id != id);
            if &self.host == id {
                if let Some(next) = self.members.first() {
                    self.host = next.id.clone();
                }
            }
            self.broadcast_lobby();
        } else if let Some(m) = self.members.iter_mut().find(|m| &m.id == id) {
            m.addr = None;
        }
        info!(room = %self.id, player = %id, "left");
        self.members.iter().all(|m| m.addr.is_none())
    }

    pub fn start<R: Rng + ?Sized>(
        &mut self,
        actor: &PlayerId,
        roles: &RoleCounts,
        rng: &mut R,
    ) -> Result<Vec<Event>, RoomError> {
        if actor != &self.host {
            return Err(RoomError::NotHost);
        }
        if self.game.phase() != Phase::Lobby {
            return Err(RoomError::AlreadyStarted);
        }
        let roster: Vec<(PlayerId, String)> = self
            .members
            .iter()
            .map(|m| (m.id.clone(), m.name.clone()))
            .collect();
        let events = self.game.assign_roles(&roster, roles, rng)?;

        let players: Vec<_> = self
            .game
            .players()
            .iter()
            .map(|p| json!({ "id": p.id, "name": p.name, "seat": p.seat }))
            .collect();
        self.broadcast("gameStart", json!({ "players": players }));
        Ok(events)
    }

    pub fn night_action(&mut self, actor: &PlayerId, action: NightAction) -> Result<Vec<Event>, RoomError> {
        Ok(self.game.submit_night_action(actor, action)?)
    }

    pub fn vote(&mut self, voter: &PlayerId, target: &PlayerId) -> Result<Vec<Event>, RoomError> {
        let events = self.game.submit_vote(voter, target)?;
        self.broadcast("voteUpdate", json!({ "voter": voter, "target": target }));
        Ok(events)
    }

    pub fn duel(&mut self, actor: &PlayerId, target: &PlayerId) -> Result<Vec<Event>, RoomError> {
        Ok(self.game.invoke_duel(actor, target)?)
    }

    pub fn end_speech(&mut self, actor: &PlayerId) -> Result<Vec<Event>, RoomError> {
        Ok(self.game.end_speech(actor)?)
    }

    pub fn timer_fired(&mut self, token: TimerToken) -> Result<Vec<Event>, RoomError> {
        Ok(self.game.timer_fired(token))
    }

    pub fn chat(&mut self, from: &PlayerId, text: String) -> Result<Vec<Event>, RoomError> {
        if !self.game.can_speak(from) {
            return Err(RoomError::Muted);
        }
        let name = self
            .members
            .iter()
            .find(|m| &m.id == from)
            .map(|m| m.name.clone())
            .ok_or(RoomError::NotInRoom)?;
        self.broadcast("chat", json!({ "from": from, "name": name, "text": text }));
        Ok(Vec::new())
    }

    fn broadcast_lobby(&self) {
        let players: Vec<_> = self
            .members
            .iter()
            .map(|m| json!({ "id": m.id, "name": m.name }))
            .collect();
        self.broadcast(
            "lobby",
            json!({ "roomId": self.id, "host": self.host, "players": players }),
        );
    }

    fn broadcast(&self, target: &str, payload: serde_json::Value) {
        let frame = Outgoing::new(target, payload).to_text();
        for addr in self.members.iter().filter_map(|m| m.addr.as_ref()) {
            addr.do_send(ServerText(frame.clone()));
        }
    }

    /// Send each event to the members allowed to see it and hand back the
    /// timers the engine asked for.
    fn deliver(&self, events: &[Event]) -> Vec<(TimerToken, Duration)> {
        let mut timers = Vec::new();
        for ev in events {
            if let Event::ArmTimer { token, after } = ev {
                timers.push((*token, *after));
                continue;
            }
            debug!(room = %self.id, target = ev.target(), "deliver");
            for m in &self.members {
                let (Some(addr), Some(view)) = (m.addr.as_ref(), ev.view_for(&m.id)) else {
                    continue;
                };
                addr.do_send(ServerText(Outgoing::new(ev.target(), view).to_text()));
            }
        }
        timers
    }
}

/// Apply one command to the room, publish what it produced and arm any
/// phase timers. Errors leave the room untouched and go back to the caller.
pub fn run<F>(room: &SharedRoom, command: F) -> Result<(), RoomError>
where
    F: FnOnce(&mut Room) -> Result<Vec<Event>, RoomError>,
{
    let timers = {
        let mut guard = lock(room);
        let events = command(&mut *guard)?;
        guard.deliver(&events)
    };
    for (token, after) in timers {
        arm_timer(room.clone(), token, after);
    }
    Ok(())
}

fn arm_timer(room: SharedRoom, token: TimerToken, after: Duration) {
    actix_web::rt::spawn(async move {
        actix_web::rt::time::sleep(after).await;
        // timer_fired never fails; stale tokens come back as no events
        let _ = run(&room, |r| r.timer_fired(token));
    });
}
