pub mod checkpoint;
pub mod config;
pub mod data;
pub mod error;
pub mod model;
pub mod telemetry;
pub mod training;

pub use config::SeqGanConfig;
pub use error::{Result, SeqGanError};
