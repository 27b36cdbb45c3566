pub mod cli;
pub mod config;
pub mod error;

pub use config::{ClusterConfig, Config};
pub use error::{FedAdminError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
