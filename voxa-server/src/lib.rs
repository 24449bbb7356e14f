// voxa-server library: configuration and HTTP router, shared with the binary
// and the integration tests

pub mod http;
pub mod settings;

pub use http::{create_router, AppState};
pub use settings::{ServerConfig, VoxaConfig};
