pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliArgs;

pub use adapters::LocalStorage;
pub use app::build_finder;
pub use config::{credentials::Credentials, search_config::SearchConfig, AppConfig};
pub use core::engine::{DiscountFinder, RunOptions, RunSummary};
pub use utils::error::{DiscountError, Result};
