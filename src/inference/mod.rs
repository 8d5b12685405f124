pub mod client;
pub mod encode;
pub mod orchestrator;
pub mod state;
