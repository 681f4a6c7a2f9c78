use rand::Rng;

use crate::error::RoomError;
use crate::types::RoomId;

const CODES: u32 = 10_000;
const RANDOM_TRIES: usize = 32;

/// A fresh 4-digit room code not yet in use. A few random draws first, then
/// a scan from a random offset so a free code is found whenever one exists.
pub fn room_code<R: Rng + ?Sized>(rng: &mut R, taken: impl Fn(&str) -> bool) -> Result<RoomId, RoomError> {
    let fmt = |n: u32| format!("{n:04}");
    for _ in 0..RANDOM_TRIES {
        let code = fmt(rng.random_range(0..CODES));
        if !taken(&code) {
            return Ok(code);
        }
    }
    let start = rng.random_range(0..CODES);
    (0..CODES)
        .map(|i| fmt((start + i) % CODES))
        .find(|code| !taken(code))
        .ok_or(RoomError::NoFreeRoomCode)
}
