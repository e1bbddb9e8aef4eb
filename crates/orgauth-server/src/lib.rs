pub mod bootstrap;
pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod server;

pub use bootstrap::{BootstrapStats, Stores};
pub use config::{AppConfig, BootstrapConfig, LoggingConfig, ServerConfig};
pub use observability::init_tracing;
pub use server::{AppState, OrgAuthServer, ServerBuilder, build_app};
