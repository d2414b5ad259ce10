use chrono::NaiveDate;
use std::fmt;
use tracing::debug;

use super::{
    dates::{is_same_day, parse_date},
    identifiers::clinician_matches,
    index::EligibilityIndex,
    rules::{is_service_category_valid, CategoryTextSource},
};
use crate::records::EligibilityRecord;

/// Why a candidate eligibility record was passed over
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    DateMismatch,
    ClinicianMismatch,
    Category(String),
    NotEligible(String),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::DateMismatch => write!(f, "answered on a different day"),
            Rejection::ClinicianMismatch => write!(f, "clinician differs"),
            Rejection::Category(reason) => write!(f, "{}", reason),
            Rejection::NotEligible(status) => write!(f, "status is '{}'", status),
        }
    }
}

/// Finds the eligibility record that covers a claim
pub struct ClaimMatcher<'a> {
    index: &'a EligibilityIndex,
    text_source: CategoryTextSource,
}

impl<'a> ClaimMatcher<'a> {
    pub fn new(index: &'a EligibilityIndex, text_source: CategoryTextSource) -> Self {
        Self { index, text_source }
    }

    /// First candidate, in source order, that passes every check
    pub fn find(
        &self,
        claim_date: Option<NaiveDate>,
        member_id_raw: &str,
        claim_clinicians: &[String],
    ) -> Option<&'a EligibilityRecord> {
        let candidates = self.index.candidates(member_id_raw);
        if candidates.is_empty() {
            debug!("No eligibility records for member {}", member_id_raw.trim());
            return None;
        }

        candidates.iter().find(|candidate| {
            match self.evaluate(candidate, claim_date, claim_clinicians) {
                Ok(()) => true,
                Err(rejection) => {
                    debug!(
                        "Skipping eligibility {} for member {}: {}",
                        candidate.request_number,
                        member_id_raw.trim(),
                        rejection
                    );
                    false
                }
            }
        })
    }

    /// Run the four match checks against one candidate
    pub fn evaluate(
        &self,
        candidate: &EligibilityRecord,
        claim_date: Option<NaiveDate>,
        claim_clinicians: &[String],
    ) -> Result<(), Rejection> {
        // Eligibility exports are day-first regardless of the report's origin
        let answered = parse_date(candidate.match_date(), false);
        if !is_same_day(claim_date, answered) {
            return Err(Rejection::DateMismatch);
        }

        if !clinician_matches(claim_clinicians, &candidate.clinician) {
            return Err(Rejection::ClinicianMismatch);
        }

        let check = is_service_category_valid(
            &candidate.service_category,
            &candidate.consultation_status,
            self.category_text(candidate),
        );
        if !check.valid {
            return Err(Rejection::Category(check.reason.unwrap_or_default()));
        }

        if !candidate.is_eligible() {
            return Err(Rejection::NotEligible(candidate.status.clone()));
        }

        Ok(())
    }

    fn category_text<'r>(&self, candidate: &'r EligibilityRecord) -> &'r str {
        match self.text_source {
            CategoryTextSource::Department => &candidate.department,
            CategoryTextSource::PackageName => &candidate.package_name,
        }
    }
}

/// Convenience wrapper using the default category text policy
pub fn find_eligibility_for_claim<'a>(
    index: &'a EligibilityIndex,
    claim_date: Option<NaiveDate>,
    member_id_raw: &str,
    claim_clinicians: &[String],
) -> Option<&'a EligibilityRecord> {
    ClaimMatcher::new(index, CategoryTextSource::default()).find(
        claim_date,
        member_id_raw,
        claim_clinicians,
    )
}
