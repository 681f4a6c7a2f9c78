use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::info;

use super::room::{self, Member, Room, SharedRoom};
use crate::config::GameConfig;
use crate::error::RoomError;
use crate::types::RoomId;
use crate::utils::room_code;

pub type SharedRegistry = Arc<Mutex<RoomRegistry>>;

/// Every open room, keyed by its 4-digit code.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomId, SharedRoom>,
}

impl RoomRegistry {
    pub fn shared() -> SharedRegistry {
        Arc::new(Mutex::new(Self::default()))
    }

    pub fn lock(registry: &SharedRegistry) -> MutexGuard<'_, RoomRegistry> {
        registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a room with `host` as its first member.
    pub fn create(&mut self, host: Member, config: GameConfig) -> Result<SharedRoom, RoomError> {
        let code = room_code(&mut rand::rng(), |c| self.rooms.contains_key(c))?;
        let room = Arc::new(Mutex::new(Room::new(code.clone(), host, config)));
        self.rooms.insert(code, room.clone());
        Ok(room)
    }

    pub fn get(&self, id: &RoomId) -> Result<SharedRoom, RoomError> {
        self.rooms
            .get(id)
            .cloned()
            .ok_or_else(|| RoomError::NoSuchRoom(id.clone()))
    }

    /// Forget a room once nobody is connected to it.
    pub fn remove_if_empty(&mut self, id: &RoomId) {
        let empty = self
            .rooms
            .get(id)
            .is_some_and(|r| room::lock(r).members().iter().all(|m| m.addr.is_none()));
        if empty {
            self.rooms.remove(id);
            info!(room = %id, "room closed");
        }
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
