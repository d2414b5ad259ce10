pub mod mapping;
pub mod models;

pub use mapping::{normalize_eligibility, normalize_report, ReportFormat};
pub use models::{
    CellValue, ClaimOutcome, ClaimRecord, EligibilityRecord, FinalStatus, RawRow, SourceKind,
    ValidationResult,
};
