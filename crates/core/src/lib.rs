pub mod bootstrap;
pub mod config;
pub mod error;
pub mod game;
pub mod generic_types;
pub mod identity;
pub mod presentation;
pub mod realtime_api;
pub mod scenario;
pub mod session_state;
pub mod storage;

pub use generic_types::{AgentActivity, StageInput};
pub use identity::PlayerIdentity;
