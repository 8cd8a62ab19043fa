pub mod config;
pub mod error;
pub mod types;

pub use config::CinemapConfig;
pub use error::{CinemapError, Result};
pub use types::*;
