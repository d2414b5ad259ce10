use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A single spreadsheet cell as it arrives from ingestion
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Number(_) => false,
            CellValue::Text(s) => s.trim().is_empty(),
        }
    }

    /// Text rendering; whole numbers print without a fractional part
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            CellValue::Number(n) => n.to_string(),
            CellValue::Text(s) => s.clone(),
        }
    }

    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => CellValue::Empty,
            serde_json::Value::Number(n) => n.as_f64().map(CellValue::Number).unwrap_or_default(),
            serde_json::Value::String(s) if s.is_empty() => CellValue::Empty,
            serde_json::Value::String(s) => CellValue::Text(s.clone()),
            serde_json::Value::Bool(b) => CellValue::Text(b.to_string()),
            other => CellValue::Text(other.to_string()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value.to_string())
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// One loosely typed input row: header -> cell
pub type RawRow = HashMap<String, CellValue>;

/// Where a report came from; decides the ambiguous-date convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    Csv,
    Spreadsheet,
}

/// One insurer response for one member on one day
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EligibilityRecord {
    pub request_number: String,
    pub member_id_raw: String,
    pub answered_on: CellValue,
    pub ordered_on: CellValue,
    pub status: String,
    pub clinician: String,
    pub payer_name: String,
    pub service_category: String,
    pub package_name: String,
    pub department: String,
    pub consultation_status: String,
}

impl EligibilityRecord {
    /// The date a claim must fall on; `Answered On` with `Ordered On` as fallback
    pub fn match_date(&self) -> &CellValue {
        if self.answered_on.is_blank() {
            &self.ordered_on
        } else {
            &self.answered_on
        }
    }

    pub fn is_eligible(&self) -> bool {
        self.status.trim().eq_ignore_ascii_case("eligible")
    }
}

/// One billing claim line in canonical shape
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub claim_id: String,
    pub member_id_raw: String,
    pub claim_date_raw: CellValue,
    pub clinician: String,
    pub department: String,
    pub package_name: String,
    pub insurance_company: String,
    pub claim_status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinalStatus {
    Valid,
    Invalid,
    /// Display bucket only; the validator never produces it
    Unknown,
}

impl fmt::Display for FinalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinalStatus::Valid => write!(f, "valid"),
            FinalStatus::Invalid => write!(f, "invalid"),
            FinalStatus::Unknown => write!(f, "unknown"),
        }
    }
}

impl std::str::FromStr for FinalStatus {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "valid" => Ok(FinalStatus::Valid),
            "invalid" => Ok(FinalStatus::Invalid),
            _ => Ok(FinalStatus::Unknown),
        }
    }
}

/// Terminal state a claim reached during validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimOutcome {
    VvipExempt,
    LeadingZero,
    NoMatch,
    StatusMismatch,
    CategoryMismatch,
    Valid,
}

/// Verdict for one claim, formatted for display and export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub claim_id: String,
    pub member_id: String,
    pub encounter_date: String,
    pub package_name: String,
    pub provider: String,
    pub clinician: String,
    pub department: String,
    pub insurance_company: String,
    pub claim_status: String,
    pub service_category: String,
    pub consultation_status: String,
    /// Eligibility status copied from the match, empty if none
    pub status: String,
    pub remarks: Vec<String>,
    pub final_status: FinalStatus,
    pub outcome: ClaimOutcome,
    pub matched: Option<EligibilityRecord>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.final_status == FinalStatus::Valid
    }

    pub fn remarks_joined(&self) -> String {
        self.remarks.join("; ")
    }

    pub fn matched_request_number(&self) -> Option<&str> {
        self.matched
            .as_ref()
            .map(|m| m.request_number.as_str())
            .filter(|r| !r.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_text_rendering() {
        assert_eq!(CellValue::Number(784123.0).as_text(), "784123");
        assert_eq!(CellValue::Number(1.5).as_text(), "1.5");
        assert_eq!(CellValue::Empty.as_text(), "");
        assert!(CellValue::Text("  ".into()).is_blank());
        assert!(!CellValue::Number(0.0).is_blank());
    }

    #[test]
    fn test_cell_from_json() {
        assert_eq!(CellValue::from_json(&serde_json::json!(45352)), CellValue::Number(45352.0));
        assert_eq!(CellValue::from_json(&serde_json::json!("")), CellValue::Empty);
        assert_eq!(CellValue::from_json(&serde_json::json!(null)), CellValue::Empty);
        assert_eq!(CellValue::from_json(&serde_json::json!("x")), CellValue::Text("x".into()));
    }

    #[test]
    fn test_match_date_falls_back_to_ordered_on() {
        let rec = EligibilityRecord {
            ordered_on: "02/03/2024".into(),
            ..Default::default()
        };
        assert_eq!(rec.match_date(), &CellValue::Text("02/03/2024".into()));

        let answered = EligibilityRecord {
            answered_on: "01/03/2024".into(),
            ordered_on: "02/03/2024".into(),
            ..Default::default()
        };
        assert_eq!(answered.match_date(), &CellValue::Text("01/03/2024".into()));
    }

    #[test]
    fn test_final_status_round_trip_names() {
        assert_eq!(FinalStatus::Invalid.to_string(), "invalid");
        assert_eq!("VALID".parse::<FinalStatus>(), Ok(FinalStatus::Valid));
        assert_eq!("pending".parse::<FinalStatus>(), Ok(FinalStatus::Unknown));
    }
}
