pub mod access;
pub mod bulk;
pub mod client;
pub mod config;
pub mod duration;
pub mod error;
pub mod models;
pub mod session;

mod utils;

static UA: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36";

pub use crate::bulk::BulkOptions;
pub use crate::client::{TradingView, ValidateUsername};
pub use crate::config::Config;
pub use crate::duration::AccessDuration;
pub use crate::models::*;
pub use crate::session::SessionStore;

pub type Result<T> = std::result::Result<T, Error>;

pub use error::{Error, LoginError};

// Re-exporting some commonly used types
pub use async_trait::async_trait;
