pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::storage::LocalStorage;
pub use config::TomlConfig;
pub use core::{engine::ScrapeEngine, history::DailyHistory, pipeline::ScrapePipeline};
pub use utils::error::{Result, ScrapeError};
