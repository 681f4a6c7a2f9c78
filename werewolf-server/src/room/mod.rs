pub mod registry;
pub mod room;

pub use registry::{RoomRegistry, SharedRegistry};
pub use room::{Member, Room, SharedRoom};
