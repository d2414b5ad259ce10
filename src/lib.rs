pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod ingest;
pub mod records;
pub mod report;
pub mod utils;

pub use config::Config;
pub use engine::{validate, EligibilityIndex, ValidationOptions, ValidationRun};
pub use error::{ReconError, Result};
pub use records::{ClaimRecord, EligibilityRecord, FinalStatus, ValidationResult};
