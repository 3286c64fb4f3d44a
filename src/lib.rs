pub mod api;
pub mod config;
pub mod database;
pub mod embeddings;
pub mod errors;
pub mod insights;
pub mod llm;
pub mod logging;
pub mod matching;
pub mod models;
pub mod onboarding;
pub mod places;
pub mod planner;
pub mod weather;

pub use config::AppConfig;
pub use errors::*;
