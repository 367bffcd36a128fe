//! Core server components: configuration, state, startup errors and the serve loop

pub mod config;
pub mod error;
pub mod server;
pub mod state;

pub use config::Config;
pub use error::{ServerError, ServerResult};
pub use server::Server;
pub use state::ServerState;
