mod config;
mod listener;
mod shutdown;

pub use config::ServerConfig;
pub use listener::start_node;
pub use listener::NodeHandle;
pub use listener::ServerError;
