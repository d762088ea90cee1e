pub mod db;
pub mod error;
pub mod models;
pub mod projection;
pub mod service;
pub mod stats;
pub mod transfer;
pub mod trend;
pub mod validation;

pub use error::{Result, TrackerError, ValidationError};
