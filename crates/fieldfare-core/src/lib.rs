pub mod config;
pub mod error;
pub mod types;

pub use config::FieldfareConfig;
pub use error::{FieldfareError, Result};
pub use types::*;
