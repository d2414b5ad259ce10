use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category -> keywords, one of which must appear in the checked text
const PACKAGE_RULES: &[(&str, &[&str])] = &[
    ("dental services", &["dental", "orthodontic"]),
    ("physiotherapy", &["physio"]),
    ("other op services", &["physio", "diet", "occupational", "speech"]),
    ("consultation", &[]),
];

/// Service types an elective consultation must not cover
const ELECTIVE_EXCLUSIONS: &[&str] = &["dental", "physio", "diet", "occupational", "speech"];

/// Which record field supplies the text the category rule is checked against.
///
/// The matcher reads the field from the eligibility candidate, the validator
/// re-checks it against the same field on the claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryTextSource {
    #[default]
    Department,
    PackageName,
}

impl fmt::Display for CategoryTextSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryTextSource::Department => write!(f, "department"),
            CategoryTextSource::PackageName => write!(f, "package_name"),
        }
    }
}

impl FromStr for CategoryTextSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "department" => Ok(CategoryTextSource::Department),
            "package_name" | "package" => Ok(CategoryTextSource::PackageName),
            other => Err(format!(
                "unknown category text source '{}' (expected department or package_name)",
                other
            )),
        }
    }
}

/// Outcome of a service-category check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCheck {
    pub valid: bool,
    pub reason: Option<String>,
}

impl CategoryCheck {
    fn pass() -> Self {
        Self { valid: true, reason: None }
    }

    fn fail(reason: String) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
        }
    }
}

/// Check that `text` is compatible with the eligibility's service category.
///
/// Categories outside the table, a blank category and blank text always pass.
pub fn is_service_category_valid(
    category: &str,
    consultation_status: &str,
    text: &str,
) -> CategoryCheck {
    let cat = category.trim().to_lowercase();
    if cat.is_empty() {
        return CategoryCheck::pass();
    }

    let haystack = text.to_lowercase();

    if cat == "consultation" && consultation_status.trim().eq_ignore_ascii_case("elective") {
        if ELECTIVE_EXCLUSIONS.iter().any(|t| haystack.contains(t)) {
            return CategoryCheck::fail(format!(
                "Consultation (Elective) cannot include restricted service types. Found: \"{}\"",
                text
            ));
        }
        return CategoryCheck::pass();
    }

    let required = PACKAGE_RULES
        .iter()
        .find(|(name, _)| *name == cat)
        .map(|(_, keywords)| *keywords)
        .unwrap_or(&[]);

    if !required.is_empty()
        && !haystack.trim().is_empty()
        && !required.iter().any(|k| haystack.contains(k))
    {
        return CategoryCheck::fail(format!(
            "{} requires related package. Found: \"{}\"",
            category.trim(),
            text
        ));
    }

    CategoryCheck::pass()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dental_inclusion() {
        assert!(is_service_category_valid("Dental Services", "", "General Dental Checkup").valid);
        assert!(is_service_category_valid("dental services", "", "Orthodontic review").valid);

        let lab = is_service_category_valid("Dental Services", "", "Lab Panel");
        assert!(!lab.valid);
        assert!(lab.reason.unwrap().contains("requires related package"));
    }

    #[test]
    fn test_other_op_services_keywords() {
        assert!(is_service_category_valid("Other OP Services", "", "Speech Therapy").valid);
        assert!(is_service_category_valid("Other OP Services", "", "Dietician").valid);
        assert!(!is_service_category_valid("Other OP Services", "", "Radiology").valid);
    }

    #[test]
    fn test_elective_consultation_excludes_restricted_types() {
        let check = is_service_category_valid("Consultation", "Elective", "Dental Clinic");
        assert!(!check.valid);
        assert!(check.reason.unwrap().contains("restricted service types"));

        assert!(is_service_category_valid("Consultation", "elective", "General Practice").valid);
    }

    #[test]
    fn test_non_elective_consultation_is_unrestricted() {
        assert!(is_service_category_valid("Consultation", "Emergency", "Dental Clinic").valid);
        assert!(is_service_category_valid("Consultation", "", "Physiotherapy").valid);
    }

    #[test]
    fn test_unknown_or_blank_category_passes() {
        assert!(is_service_category_valid("Pharmacy", "", "Anything").valid);
        assert!(is_service_category_valid("", "", "Lab Panel").valid);
    }

    #[test]
    fn test_blank_text_passes_inclusion_rules() {
        assert!(is_service_category_valid("Physiotherapy", "", "").valid);
        assert!(is_service_category_valid("Dental Services", "", "   ").valid);
    }

    #[test]
    fn test_text_source_parsing() {
        assert_eq!("package-name".parse(), Ok(CategoryTextSource::PackageName));
        assert_eq!("Department".parse(), Ok(CategoryTextSource::Department));
        assert!("payer".parse::<CategoryTextSource>().is_err());
    }
}
