//! Core types, configuration, and utilities for the StockPulse client.

mod config;
mod error;
mod logging;
mod paths;
mod slug;

pub use config::{Config, DEFAULT_LOG_LEVEL, ENV_ANON_KEY, ENV_BACKEND_URL, ENV_LOG_LEVEL};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;
pub use slug::slugify;
