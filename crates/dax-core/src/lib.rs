pub mod config;
pub mod error;
pub mod password;
pub mod types;

pub use config::DaxConfig;
pub use error::{DaxError, Result};
pub use types::*;
