pub mod config;
pub mod error;

pub use config::TickerConfig;
pub use error::*;
