//! Core server modules: configuration, shared state, HTTP server, background
//! tasks.

pub mod config;
pub mod server;
pub mod state;
pub mod tasks;

pub use config::Config;
pub use server::Server;
pub use state::ServerState;
