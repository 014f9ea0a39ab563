pub mod backend;
pub mod config;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod response;
pub mod server;

pub use config::{AppConfig, LoggingConfig, ServerConfig, SheetsBackend, SheetsConfig};
pub use error::GatewayError;
pub use gateway::RowGateway;
pub use observability::init_tracing;
pub use response::Envelope;
pub use server::{AppState, RowGateServer, ServerBuilder, build_app};
