pub mod config;
pub mod error;
pub mod types;

pub use config::BillSearchConfig;
pub use error::{BillSearchError, Result};
pub use types::*;
