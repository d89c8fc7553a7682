//! Weekly restaurant recommender
//!
//! Finds well-rated restaurants around a fixed origin, estimates how long it
//! takes to get there, and picks a handful the user has not been to recently.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
pub mod telemetry;

pub use config::Config;
pub use error::{AppError, AppResult};
