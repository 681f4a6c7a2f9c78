pub mod assign;
pub mod death;
pub mod engine;
pub mod event;
pub mod night;
pub mod player;
pub mod role;
pub mod vote;
pub mod win;

pub use engine::Game;
pub use event::{Event, TimerToken};
pub use night::NightAction;
