pub mod api_client;
pub mod category;
pub mod dedup;
pub mod dispatch;
pub mod engine;
pub mod evaluator;
pub mod message;
pub mod orchestrator;
pub mod retry;
pub mod signing;

pub use crate::domain::ports::{MarketplaceApi, Publisher, Storage};
pub use crate::utils::error::Result;
