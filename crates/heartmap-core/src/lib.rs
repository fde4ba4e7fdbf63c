pub mod config;
pub mod error;
pub mod types;

pub use config::HeartMapConfig;
pub use error::{HeartMapError, Result};
pub use types::*;
