pub mod config;

pub use config::parse::{parse_server_config, ParserState};
pub use config::render::{render_client_config, render_server_config, InlineMaterials, ServerParams};
pub use config::types::{BlockName, ConfigError, ConfigErrorKind, ServerConfig};
