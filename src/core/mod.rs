pub mod engine;
pub mod export;
pub mod history;
pub mod parser;
pub mod pipeline;

pub use crate::domain::model::{Availability, LoadOutcome, Observation, PassAvailability, RawPage};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
