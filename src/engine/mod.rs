//! Matching and validation engine: a pure function from eligibility records
//! and claims to per-claim verdicts.

pub mod dates;
pub mod identifiers;
pub mod index;
pub mod matcher;
pub mod rules;
pub mod validator;

pub use dates::{format_date, is_same_day, parse_date, DateOrder};
pub use identifiers::{normalize_clinician, normalize_member_id};
pub use index::EligibilityIndex;
pub use matcher::{find_eligibility_for_claim, ClaimMatcher, Rejection};
pub use rules::{is_service_category_valid, CategoryCheck, CategoryTextSource};
pub use validator::{validate, ClaimValidator, RunDiagnostics, ValidationOptions, ValidationRun};
