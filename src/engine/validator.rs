use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info};

use super::{
    dates::{format_date, parse_date},
    identifiers::{has_leading_zero, is_vvip},
    index::EligibilityIndex,
    matcher::ClaimMatcher,
    rules::{is_service_category_valid, CategoryTextSource},
};
use crate::records::{ClaimOutcome, ClaimRecord, EligibilityRecord, FinalStatus, ValidationResult};

pub const VVIP_REMARK: &str = "VVIP member, eligibility check bypassed";
pub const LEADING_ZERO_REMARK: &str = "Member ID has a leading zero; claim marked as invalid.";

/// Settings fixed for the duration of one run
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationOptions {
    /// Month-first reading of ambiguous claim dates
    pub prefer_mdy: bool,
    pub text_source: CategoryTextSource,
}

/// Side-channel counters for a run. Never feeds back into matching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunDiagnostics {
    /// Eligibility request numbers that satisfied at least one claim
    pub used_requests: BTreeSet<String>,
    pub dropped_blank_claim_id: usize,
    pub dropped_blank_member_id: usize,
    pub unparsed_dates: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationRun {
    pub results: Vec<ValidationResult>,
    pub diagnostics: RunDiagnostics,
}

pub struct ClaimValidator<'a> {
    index: &'a EligibilityIndex,
    options: ValidationOptions,
}

impl<'a> ClaimValidator<'a> {
    pub fn new(index: &'a EligibilityIndex, options: ValidationOptions) -> Self {
        Self { index, options }
    }

    /// Validate every claim in input order
    pub fn validate(&self, claims: &[ClaimRecord]) -> ValidationRun {
        info!(
            "Validating {} claims against {} eligibility records (prefer MDY: {}, category text: {})",
            claims.len(),
            self.index.len(),
            self.options.prefer_mdy,
            self.options.text_source
        );

        let mut diagnostics = RunDiagnostics::default();
        let results: Vec<ValidationResult> = claims
            .iter()
            .filter_map(|claim| self.validate_claim(claim, &mut diagnostics))
            .collect();

        let valid = results.iter().filter(|r| r.is_valid()).count();
        info!(
            "Validation complete: {} valid, {} invalid, {} dropped",
            valid,
            results.len() - valid,
            diagnostics.dropped_blank_claim_id + diagnostics.dropped_blank_member_id
        );

        ValidationRun { results, diagnostics }
    }

    /// Verdict for a single claim; `None` when the row lacks a claim or member ID
    pub fn validate_claim(
        &self,
        claim: &ClaimRecord,
        diagnostics: &mut RunDiagnostics,
    ) -> Option<ValidationResult> {
        let claim_id = claim.claim_id.trim();
        if claim_id.is_empty() {
            diagnostics.dropped_blank_claim_id += 1;
            return None;
        }

        let member_id = claim.member_id_raw.trim();
        if member_id.is_empty() {
            debug!("Claim {} has no member ID, skipping", claim_id);
            diagnostics.dropped_blank_member_id += 1;
            return None;
        }

        let claim_date = parse_date(&claim.claim_date_raw, self.options.prefer_mdy);
        let encounter_date = claim_date.as_ref().map(format_date).unwrap_or_default();
        if claim_date.is_none() && !claim.claim_date_raw.is_blank() {
            debug!(
                "Claim {} has an unrecognised date '{}'",
                claim_id,
                claim.claim_date_raw.as_text()
            );
            diagnostics.unparsed_dates += 1;
        }

        if is_vvip(member_id) {
            debug!("Claim {} is a VVIP member, bypassing eligibility", claim_id);
            return Some(ValidationResult {
                claim_id: claim_id.to_string(),
                member_id: member_id.to_string(),
                encounter_date,
                package_name: claim.package_name.clone(),
                provider: String::new(),
                clinician: claim.clinician.clone(),
                department: claim.department.clone(),
                insurance_company: claim.insurance_company.clone(),
                claim_status: claim.claim_status.clone(),
                service_category: String::new(),
                consultation_status: String::new(),
                status: String::new(),
                remarks: vec![VVIP_REMARK.to_string()],
                final_status: FinalStatus::Valid,
                outcome: ClaimOutcome::VvipExempt,
                matched: None,
            });
        }

        let leading_zero = has_leading_zero(member_id);
        let clinicians: Vec<String> = if claim.clinician.trim().is_empty() {
            Vec::new()
        } else {
            vec![claim.clinician.clone()]
        };

        let matcher = ClaimMatcher::new(self.index, self.options.text_source);
        let matched = matcher.find(claim_date, member_id, &clinicians);

        let mut remarks = Vec::new();
        if leading_zero {
            remarks.push(LEADING_ZERO_REMARK.to_string());
        }

        let mut outcome = match matched {
            None => {
                let shown_date = if encounter_date.is_empty() {
                    claim.claim_date_raw.as_text()
                } else {
                    encounter_date.clone()
                };
                remarks.push(format!(
                    "No matching eligibility found for {} on {}",
                    member_id, shown_date
                ));
                ClaimOutcome::NoMatch
            }
            Some(record) if !record.is_eligible() => {
                remarks.push(format!("Eligibility status: {}", record.status));
                ClaimOutcome::StatusMismatch
            }
            Some(record) => {
                let check = is_service_category_valid(
                    &record.service_category,
                    &record.consultation_status,
                    self.claim_category_text(claim),
                );
                if check.valid {
                    ClaimOutcome::Valid
                } else {
                    remarks.push(check.reason.unwrap_or_default());
                    ClaimOutcome::CategoryMismatch
                }
            }
        };

        if leading_zero {
            outcome = ClaimOutcome::LeadingZero;
        }

        if let Some(record) = matched {
            if !record.request_number.is_empty() {
                diagnostics.used_requests.insert(record.request_number.clone());
            }
        }

        let final_status = if outcome == ClaimOutcome::Valid {
            FinalStatus::Valid
        } else {
            FinalStatus::Invalid
        };
        debug!("Claim {} -> {} ({:?})", claim_id, final_status, outcome);

        Some(build_result(
            claim,
            claim_id,
            member_id,
            encounter_date,
            matched,
            remarks,
            final_status,
            outcome,
        ))
    }

    fn claim_category_text<'c>(&self, claim: &'c ClaimRecord) -> &'c str {
        match self.options.text_source {
            CategoryTextSource::Department => &claim.department,
            CategoryTextSource::PackageName => &claim.package_name,
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn build_result(
    claim: &ClaimRecord,
    claim_id: &str,
    member_id: &str,
    encounter_date: String,
    matched: Option<&EligibilityRecord>,
    remarks: Vec<String>,
    final_status: FinalStatus,
    outcome: ClaimOutcome,
) -> ValidationResult {
    let pick = |value: Option<&String>| -> String {
        value
            .filter(|v| !v.trim().is_empty())
            .cloned()
            .unwrap_or_default()
    };
    let or_claim = |primary: String, fallbacks: &[&String]| -> String {
        if !primary.is_empty() {
            return primary;
        }
        fallbacks
            .iter()
            .find(|v| !v.trim().is_empty())
            .map(|v| v.to_string())
            .unwrap_or_default()
    };

    let payer = pick(matched.map(|e| &e.payer_name));

    ValidationResult {
        claim_id: claim_id.to_string(),
        member_id: member_id.to_string(),
        encounter_date,
        package_name: or_claim(pick(matched.map(|e| &e.package_name)), &[&claim.package_name]),
        provider: payer.clone(),
        clinician: or_claim(pick(matched.map(|e| &e.clinician)), &[&claim.clinician]),
        department: claim.department.clone(),
        insurance_company: or_claim(payer, &[&claim.insurance_company, &claim.package_name]),
        claim_status: claim.claim_status.clone(),
        service_category: pick(matched.map(|e| &e.service_category)),
        consultation_status: pick(matched.map(|e| &e.consultation_status)),
        status: pick(matched.map(|e| &e.status)),
        remarks,
        final_status,
        outcome,
        matched: matched.cloned(),
    }
}

/// Validate `claims` against `index` in one pass
pub fn validate(
    claims: &[ClaimRecord],
    index: &EligibilityIndex,
    options: ValidationOptions,
) -> ValidationRun {
    ClaimValidator::new(index, options).validate(claims)
}
