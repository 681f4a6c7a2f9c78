use actix::{Actor, ActorContext, AsyncContext, Handler, Message, StreamHandler};
use actix_web_actors::ws;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::{
    error::RoomError,
    game::Event,
    message::{to_client_event, ClientEvent, Incoming, Outgoing},
    room::{room, Member, RoomRegistry, SharedRegistry, SharedRoom},
    types::PlayerId,
};

/// One websocket connection. A client creates or joins a single room and
/// then plays in it.
pub struct WsClient {
    pub id: PlayerId,
    registry: SharedRegistry,
    room: Option<SharedRoom>,
}

impl WsClient {
    pub fn new(id: PlayerId, registry: SharedRegistry) -> Self {
        Self {
            id,
            registry,
            room: None,
        }
    }
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct ServerText(pub String);

impl Handler<ServerText> for WsClient {
    type Result = ();
    fn handle(&mut self, msg: ServerText, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

impl Actor for WsClient {
    type Context = ws::WebsocketContext<Self>;

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        let Some(shared) = self.room.take() else { return };
        let (room_id, empty) = {
            let mut r = room::lock(&shared);
            let empty = r.leave(&self.id);
            (r.id().clone(), empty)
        };
        if empty {
            RoomRegistry::lock(&self.registry).remove_if_empty(&room_id);
        }
    }
}

impl WsClient {
    fn handle_text(&mut self, raw: String, ctx: &mut ws::WebsocketContext<Self>) {
        let event = match serde_json::from_str::<Incoming>(&raw)
            .map_err(|e| format!("malformed frame: {e}"))
            .and_then(to_client_event)
        {
            Ok(event) => event,
            Err(reason) => {
                warn!(player = %self.id, %reason, "bad frame");
                self.reject(&reason, ctx);
                return;
            }
        };
        debug!(player = %self.id, ?event, "command");

        if let Err(err) = self.dispatch(event, ctx) {
            debug!(player = %self.id, %err, "rejected");
            self.reject(&err, ctx);
        }
    }

    fn dispatch(&mut self, event: ClientEvent, ctx: &mut ws::WebsocketContext<Self>) -> Result<(), RoomError> {
        let me = self.id.clone();
        match event {
            ClientEvent::CreateRoom { name, config } => {
                self.ensure_roomless()?;
                let member = self.member(name, ctx);
                let shared = RoomRegistry::lock(&self.registry).create(member, config)?;
                let room_id = room::lock(&shared).id().clone();
                self.room = Some(shared);
                self.joined(&room_id, ctx);
                Ok(())
            }
            ClientEvent::JoinRoom { room_id, name } => {
                self.ensure_roomless()?;
                let shared = RoomRegistry::lock(&self.registry).get(&room_id)?;
                let member = self.member(name, ctx);
                room::run(&shared, |r| r.join(member))?;
                self.room = Some(shared);
                self.joined(&room_id, ctx);
                Ok(())
            }
            ClientEvent::StartGame { roles } => {
                room::run(self.current()?, |r| r.start(&me, &roles, &mut rand::rng()))
            }
            ClientEvent::NightAction(action) => room::run(self.current()?, |r| r.night_action(&me, action)),
            ClientEvent::Vote { target } => room::run(self.current()?, |r| r.vote(&me, &target)),
            ClientEvent::Duel { target } => room::run(self.current()?, |r| r.duel(&me, &target)),
            ClientEvent::EndSpeech => room::run(self.current()?, |r| r.end_speech(&me)),
            ClientEvent::Chat { text } => room::run(self.current()?, |r| r.chat(&me, text)),
        }
    }

    fn member(&self, name: String, ctx: &ws::WebsocketContext<Self>) -> Member {
        Member {
            id: self.id.clone(),
            name,
            addr: Some(ctx.address()),
        }
    }

    fn current(&self) -> Result<&SharedRoom, RoomError> {
        self.room.as_ref().ok_or(RoomError::NotInRoom)
    }

    fn ensure_roomless(&self) -> Result<(), RoomError> {
        match &self.room {
            Some(shared) => Err(RoomError::AlreadyInRoom(room::lock(shared).id().clone())),
            None => Ok(()),
        }
    }

    fn joined(&self, room_id: &str, ctx: &mut ws::WebsocketContext<Self>) {
        info!(player = %self.id, room = %room_id, "joined");
        let frame = Outgoing::new("joined", json!({ "roomId": room_id, "playerId": self.id }));
        ctx.text(frame.to_text());
    }

    fn reject(&self, reason: &impl std::fmt::Display, ctx: &mut ws::WebsocketContext<Self>) {
        let ev = Event::rejected(&self.id, reason);
        if let Some(view) = ev.view_for(&self.id) {
            ctx.text(Outgoing::new(ev.target(), view).to_text());
        }
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsClient {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(payload)) => ctx.pong(&payload),
            Ok(ws::Message::Text(raw)) => self.handle_text(raw.to_string(), ctx),
            Ok(ws::Message::Close(reason)) => {
                info!(player = %self.id, ?reason, "disconnected");
                ctx.close(reason);
                ctx.stop();
            }
            Err(e) => {
                warn!(player = %self.id, error = %e, "protocol error");
                ctx.stop();
            }
            _ => {}
        }
    }
}
