//! Header fallback mapping from loosely typed rows into canonical records.
//!
//! Every logical field has an ordered list of candidate headers; the first
//! non-blank cell wins. This runs once at ingestion so the engine only ever
//! sees `EligibilityRecord` and `ClaimRecord`.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::models::{CellValue, ClaimRecord, EligibilityRecord, RawRow};

/// Member-ID headers seen in eligibility exports, in preference order
pub const ELIGIBILITY_MEMBER_ID_KEYS: &[&str] = &[
    "Card Number / DHA Member ID",
    "Card Number",
    "PatientCardID",
    "Patient Insurance Card No",
    "Member ID",
    "MemberID",
];

fn first_cell<'a>(row: &'a RawRow, keys: &[&str]) -> Option<&'a CellValue> {
    keys.iter()
        .filter_map(|k| row.get(*k))
        .find(|cell| !cell.is_blank())
}

fn first_text(row: &RawRow, keys: &[&str]) -> String {
    first_cell(row, keys)
        .map(|cell| cell.as_text().trim().to_string())
        .unwrap_or_default()
}

impl EligibilityRecord {
    /// Build a record from an eligibility export row; `None` if no member ID is present
    pub fn from_row(row: &RawRow) -> Option<Self> {
        let member_id_raw = first_text(row, ELIGIBILITY_MEMBER_ID_KEYS);
        if member_id_raw.is_empty() {
            return None;
        }

        Some(Self {
            request_number: first_text(row, &["Eligibility Request Number"]),
            member_id_raw,
            answered_on: first_cell(row, &["Answered On"]).cloned().unwrap_or_default(),
            ordered_on: first_cell(row, &["Ordered On"]).cloned().unwrap_or_default(),
            status: first_text(row, &["Status"]),
            clinician: first_text(row, &["Clinician"]),
            payer_name: first_text(row, &["Payer Name"]),
            service_category: first_text(row, &["Service Category"]),
            package_name: first_text(row, &["Package Name"]),
            department: first_text(row, &["Department", "Clinic"]),
            consultation_status: first_text(row, &["Consultation Status"]),
        })
    }
}

/// Known claim report layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    /// Insta HIS export, keyed by "Pri. Claim No"
    Insta,
    /// Odoo export, keyed by "Pri. Claim ID"
    Odoo,
    /// Clinic export with ClaimID / PatientCardID columns
    ClinicExport,
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::Insta => write!(f, "Insta"),
            ReportFormat::Odoo => write!(f, "Odoo"),
            ReportFormat::ClinicExport => write!(f, "ClinicExport"),
        }
    }
}

/// Candidate headers per canonical claim field
struct ClaimLayout {
    claim_id: &'static [&'static str],
    member_id: &'static [&'static str],
    claim_date: &'static [&'static str],
    clinician: &'static [&'static str],
    department: &'static [&'static str],
    package_name: &'static [&'static str],
    insurance_company: &'static [&'static str],
    claim_status: &'static [&'static str],
}

const INSTA_LAYOUT: ClaimLayout = ClaimLayout {
    claim_id: &["Pri. Claim No"],
    member_id: &["Pri. Patient Insurance Card No"],
    claim_date: &["Encounter Date"],
    clinician: &["Clinician License"],
    department: &["Department"],
    package_name: &["Pri. Payer Name"],
    insurance_company: &["Pri. Payer Name"],
    claim_status: &["Codification Status"],
};

const ODOO_LAYOUT: ClaimLayout = ClaimLayout {
    claim_id: &["Pri. Claim ID"],
    member_id: &["Pri. Member ID"],
    claim_date: &["Adm/Reg. Date"],
    clinician: &["Admitting License"],
    department: &["Admitting Department"],
    package_name: &["Pri. Plan Type"],
    insurance_company: &["Pri. Plan Type"],
    claim_status: &["Codification Status"],
};

const CLINIC_LAYOUT: ClaimLayout = ClaimLayout {
    claim_id: &["ClaimID", "Pri. Claim No"],
    member_id: &["PatientCardID", "Patient Insurance Card No"],
    claim_date: &["ClaimDate", "Encounter Date"],
    clinician: &["Clinician License", "Clinician"],
    department: &["Clinic", "Department"],
    package_name: &["Insurance Company"],
    insurance_company: &["Insurance Company", "Pri. Payer Name"],
    claim_status: &["VisitStatus", "Codification Status"],
};

impl ReportFormat {
    /// Detect the layout from the first data row's headers
    pub fn detect(first_row: Option<&RawRow>) -> Self {
        match first_row {
            Some(row) if row.contains_key("Pri. Claim No") => ReportFormat::Insta,
            Some(row) if row.contains_key("Pri. Claim ID") => ReportFormat::Odoo,
            _ => ReportFormat::ClinicExport,
        }
    }

    fn layout(self) -> &'static ClaimLayout {
        match self {
            ReportFormat::Insta => &INSTA_LAYOUT,
            ReportFormat::Odoo => &ODOO_LAYOUT,
            ReportFormat::ClinicExport => &CLINIC_LAYOUT,
        }
    }

    /// Header among `headers` holding the claim ID for this layout, ignoring case and spacing
    pub fn claim_id_header<'h>(
        self,
        headers: impl IntoIterator<Item = &'h String>,
    ) -> Option<&'h String> {
        let headers: Vec<&String> = headers.into_iter().collect();
        self.layout().claim_id.iter().find_map(|candidate| {
            let wanted = squash_header(candidate);
            headers.iter().copied().find(|h| squash_header(h) == wanted)
        })
    }

    pub fn to_claim(self, row: &RawRow) -> ClaimRecord {
        let layout = self.layout();
        ClaimRecord {
            claim_id: first_text(row, layout.claim_id),
            member_id_raw: first_text(row, layout.member_id),
            claim_date_raw: first_cell(row, layout.claim_date).cloned().unwrap_or_default(),
            clinician: first_text(row, layout.clinician),
            department: first_text(row, layout.department),
            package_name: first_text(row, layout.package_name),
            insurance_company: first_text(row, layout.insurance_company),
            claim_status: first_text(row, layout.claim_status),
        }
    }
}

fn squash_header(header: &str) -> String {
    header.split_whitespace().collect::<String>().to_lowercase()
}

/// Map report rows into claims, dropping rows without a claim ID
pub fn normalize_report(rows: &[RawRow]) -> (ReportFormat, Vec<ClaimRecord>) {
    let format = ReportFormat::detect(rows.first());
    let claims = rows
        .iter()
        .map(|row| format.to_claim(row))
        .filter(|claim| !claim.claim_id.trim().is_empty())
        .collect();
    (format, claims)
}

/// Map eligibility rows into records, dropping rows without a member ID
pub fn normalize_eligibility(rows: &[RawRow]) -> Vec<EligibilityRecord> {
    rows.iter().filter_map(EligibilityRecord::from_row).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs.iter().map(|(k, v)| (k.to_string(), CellValue::from(*v))).collect()
    }

    #[test]
    fn test_member_id_key_preference() {
        let r = row(&[
            ("Member ID", "555"),
            ("Card Number", "  "),
            ("Card Number / DHA Member ID", "00123"),
            ("Status", "Eligible"),
        ]);
        let rec = EligibilityRecord::from_row(&r).unwrap();
        assert_eq!(rec.member_id_raw, "00123");
        assert_eq!(rec.status, "Eligible");

        let fallback = row(&[("Card Number / DHA Member ID", ""), ("MemberID", "777")]);
        assert_eq!(EligibilityRecord::from_row(&fallback).unwrap().member_id_raw, "777");
    }

    #[test]
    fn test_eligibility_without_member_id_is_dropped() {
        let r = row(&[("Status", "Eligible"), ("Answered On", "01/03/2024")]);
        assert!(EligibilityRecord::from_row(&r).is_none());
    }

    #[test]
    fn test_numeric_member_id_renders_without_decimals() {
        let mut r = RawRow::new();
        r.insert("Card Number".to_string(), CellValue::Number(784123.0));
        assert_eq!(EligibilityRecord::from_row(&r).unwrap().member_id_raw, "784123");
    }

    #[test]
    fn test_department_falls_back_to_clinic() {
        let r = row(&[("Card Number", "1"), ("Clinic", "Physiotherapy")]);
        assert_eq!(EligibilityRecord::from_row(&r).unwrap().department, "Physiotherapy");
    }

    #[test]
    fn test_detects_insta_report() {
        let rows = vec![row(&[
            ("Pri. Claim No", "C-1"),
            ("Pri. Patient Insurance Card No", "0784"),
            ("Encounter Date", "01/03/2024"),
            ("Clinician License", "GD123"),
            ("Department", "Dental"),
            ("Pri. Payer Name", "Daman"),
            ("Codification Status", "Coded"),
        ])];
        let (format, claims) = normalize_report(&rows);
        assert_eq!(format, ReportFormat::Insta);
        assert_eq!(claims[0].claim_id, "C-1");
        assert_eq!(claims[0].member_id_raw, "0784");
        assert_eq!(claims[0].package_name, "Daman");
        assert_eq!(claims[0].insurance_company, "Daman");
        assert_eq!(claims[0].claim_status, "Coded");
    }

    #[test]
    fn test_detects_odoo_report() {
        let rows = vec![row(&[
            ("Pri. Claim ID", "O-9"),
            ("Pri. Member ID", "42"),
            ("Adm/Reg. Date", "2024-03-01"),
            ("Admitting Department", "Physio"),
            ("Pri. Plan Type", "Thiqa"),
        ])];
        let (format, claims) = normalize_report(&rows);
        assert_eq!(format, ReportFormat::Odoo);
        assert_eq!(claims[0].member_id_raw, "42");
        assert_eq!(claims[0].department, "Physio");
        assert_eq!(claims[0].insurance_company, "Thiqa");
    }

    #[test]
    fn test_claim_id_header_per_layout() {
        let headers = vec!["Claim ID ".to_string(), "Pri. Claim No".to_string()];
        assert_eq!(
            ReportFormat::Insta.claim_id_header(&headers),
            Some(&"Pri. Claim No".to_string())
        );
        assert_eq!(
            ReportFormat::ClinicExport.claim_id_header(&headers),
            Some(&"Claim ID ".to_string())
        );

        let spaced = vec!["claim id".to_string()];
        assert_eq!(
            ReportFormat::ClinicExport.claim_id_header(&spaced),
            Some(&"claim id".to_string())
        );
        assert_eq!(ReportFormat::Odoo.claim_id_header(&spaced), None);
    }

    #[test]
    fn test_clinic_export_fallbacks_and_blank_claims() {
        let rows = vec![
            row(&[
                ("ClaimID", "X1"),
                ("Patient Insurance Card No", "9"),
                ("ClaimDate", "01/03/2024"),
                ("Clinician", "Dr A"),
                ("Insurance Company", "Daman"),
                ("VisitStatus", "Closed"),
            ]),
            row(&[("ClaimID", "  "), ("PatientCardID", "10")]),
        ];
        let (format, claims) = normalize_report(&rows);
        assert_eq!(format, ReportFormat::ClinicExport);
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].member_id_raw, "9");
        assert_eq!(claims[0].clinician, "Dr A");
        assert_eq!(claims[0].package_name, "Daman");
        assert_eq!(claims[0].claim_status, "Closed");
    }
}
