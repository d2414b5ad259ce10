use once_cell::sync::Lazy;
use regex::Regex;

/// Raw member IDs carrying this prefix skip eligibility checking entirely
pub const VVIP_PREFIX: &str = "(VVIP)";

static LEADING_ZERO_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^0+\d+$").unwrap());
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Canonical member ID used as the eligibility lookup key.
///
/// Trims surrounding whitespace and strips a leading run of zeros ("0045" -> "45").
/// The same policy applies to eligibility and claim IDs so lookups line up.
pub fn normalize_member_id(raw: &str) -> String {
    raw.trim().trim_start_matches('0').to_string()
}

/// Canonical clinician name for equality checks (never for display)
pub fn normalize_clinician(raw: &str) -> String {
    WHITESPACE_RUN
        .replace_all(raw.trim(), " ")
        .to_lowercase()
}

/// Whether the raw member ID is an all-digit value written with a leading zero
pub fn has_leading_zero(raw: &str) -> bool {
    LEADING_ZERO_ID.is_match(raw.trim())
}

pub fn is_vvip(raw: &str) -> bool {
    raw.trim().starts_with(VVIP_PREFIX)
}

/// True if any claim clinician matches the eligibility clinician.
///
/// Missing data on either side never blocks a match.
pub fn clinician_matches(claim_clinicians: &[String], eligibility_clinician: &str) -> bool {
    let target = normalize_clinician(eligibility_clinician);
    if target.is_empty() {
        return true;
    }

    let mut supplied = claim_clinicians
        .iter()
        .map(|c| normalize_clinician(c))
        .filter(|c| !c.is_empty())
        .peekable();

    if supplied.peek().is_none() {
        return true;
    }

    supplied.any(|c| c == target)
}
