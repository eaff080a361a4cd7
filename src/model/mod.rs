pub mod avatar;
pub mod game_state;
pub mod message;
pub mod session;
pub mod update;
