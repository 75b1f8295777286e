//! CLINIQ Server — the HTTP/JSON surface over the auth gateway, access
//! guard, and resource repositories.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

pub use config::Config;
pub use routes::router;
pub use state::{AppState, build_state};
