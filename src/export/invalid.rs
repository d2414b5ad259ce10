use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

use crate::{
    error::Result,
    records::{FinalStatus, ValidationResult},
};

pub const EXPORT_HEADERS: [&str; 11] = [
    "Claim ID",
    "Member ID",
    "Encounter Date",
    "Package Name",
    "Provider",
    "Clinician",
    "Service Category",
    "Consultation Status",
    "Eligibility Status",
    "Final Status",
    "Remarks",
];

const SHEET_NAME: &str = "Invalid Claims";

/// File type of the invalid-claims export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "xlsx" => Ok(ExportFormat::Xlsx),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(format!("unknown export format '{}' (expected xlsx or csv)", other)),
        }
    }
}

/// One line of the invalid-claims export
#[derive(Debug, Serialize)]
pub struct InvalidClaimRow<'a> {
    #[serde(rename = "Claim ID")]
    pub claim_id: &'a str,
    #[serde(rename = "Member ID")]
    pub member_id: &'a str,
    #[serde(rename = "Encounter Date")]
    pub encounter_date: &'a str,
    #[serde(rename = "Package Name")]
    pub package_name: &'a str,
    #[serde(rename = "Provider")]
    pub provider: &'a str,
    #[serde(rename = "Clinician")]
    pub clinician: &'a str,
    #[serde(rename = "Service Category")]
    pub service_category: &'a str,
    #[serde(rename = "Consultation Status")]
    pub consultation_status: &'a str,
    #[serde(rename = "Eligibility Status")]
    pub eligibility_status: &'a str,
    #[serde(rename = "Final Status")]
    pub final_status: String,
    #[serde(rename = "Remarks")]
    pub remarks: String,
}

impl<'a> From<&'a ValidationResult> for InvalidClaimRow<'a> {
    fn from(r: &'a ValidationResult) -> Self {
        Self {
            claim_id: &r.claim_id,
            member_id: &r.member_id,
            encounter_date: &r.encounter_date,
            package_name: &r.package_name,
            provider: &r.provider,
            clinician: &r.clinician,
            service_category: &r.service_category,
            consultation_status: &r.consultation_status,
            eligibility_status: &r.status,
            final_status: r.final_status.to_string(),
            remarks: r.remarks_joined(),
        }
    }
}

impl InvalidClaimRow<'_> {
    /// Cells in `EXPORT_HEADERS` order
    pub fn cells(&self) -> [&str; 11] {
        [
            self.claim_id,
            self.member_id,
            self.encounter_date,
            self.package_name,
            self.provider,
            self.clinician,
            self.service_category,
            self.consultation_status,
            self.eligibility_status,
            &self.final_status,
            &self.remarks,
        ]
    }
}

/// Invalid results only, in their original order
pub fn invalid_rows(results: &[ValidationResult]) -> Vec<InvalidClaimRow<'_>> {
    results
        .iter()
        .filter(|r| r.final_status == FinalStatus::Invalid)
        .map(InvalidClaimRow::from)
        .collect()
}

/// Write invalid results as CSV; returns the number of rows written
pub fn write_invalid_claims<W: Write>(writer: W, results: &[ValidationResult]) -> Result<usize> {
    let rows = invalid_rows(results);
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in &rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(rows.len())
}

/// Build an xlsx workbook of the invalid results with a bold header row
pub fn invalid_claims_workbook(results: &[ValidationResult]) -> Result<(Vec<u8>, usize)> {
    let rows = invalid_rows(results);
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;
    for (col, title) in EXPORT_HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &bold)?;
    }
    for (idx, row) in rows.iter().enumerate() {
        for (col, value) in row.cells().iter().enumerate() {
            sheet.write_string(idx as u32 + 1, col as u16, *value)?;
        }
    }

    Ok((workbook.save_to_buffer()?, rows.len()))
}

/// Render invalid results in `format`; returns the bytes and the row count
pub fn render_invalid_claims(
    results: &[ValidationResult],
    format: ExportFormat,
) -> Result<(Vec<u8>, usize)> {
    match format {
        ExportFormat::Xlsx => invalid_claims_workbook(results),
        ExportFormat::Csv => {
            let mut buf = Vec::new();
            let written = write_invalid_claims(&mut buf, results)?;
            Ok((buf, written))
        }
    }
}

pub fn export_file_name(prefix: &str, date: NaiveDate, format: ExportFormat) -> String {
    format!("{}_{}.{}", prefix, date.format("%Y-%m-%d"), format.extension())
}

/// Path the export for `date` would be written to
pub fn export_path(dir: &Path, prefix: &str, date: NaiveDate, format: ExportFormat) -> PathBuf {
    dir.join(export_file_name(prefix, date, format))
}

/// Write the invalid claims file; `None` when there is nothing to export
pub async fn export_invalid_claims(
    results: &[ValidationResult],
    path: &Path,
    format: ExportFormat,
) -> Result<Option<usize>> {
    if !results.iter().any(|r| r.final_status == FinalStatus::Invalid) {
        return Ok(None);
    }

    let (bytes, written) = render_invalid_claims(results, format)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(path, bytes).await?;

    info!("Exported {} invalid claims to {} ({})", written, path.display(), format);
    Ok(Some(written))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::ClaimOutcome;

    fn result(id: &str, status: FinalStatus, remarks: &[&str]) -> ValidationResult {
        ValidationResult {
            claim_id: id.to_string(),
            member_id: "42".to_string(),
            encounter_date: "01/03/2024".to_string(),
            package_name: "Gold".to_string(),
            provider: "Daman".to_string(),
            clinician: "GD1".to_string(),
            department: String::new(),
            insurance_company: "Daman".to_string(),
            claim_status: String::new(),
            service_category: "Consultation".to_string(),
            consultation_status: "Elective".to_string(),
            status: "Eligible".to_string(),
            remarks: remarks.iter().map(|r| r.to_string()).collect(),
            final_status: status,
            outcome: if status == FinalStatus::Valid {
                ClaimOutcome::Valid
            } else {
                ClaimOutcome::NoMatch
            },
            matched: None,
        }
    }

    #[test]
    fn test_writes_only_invalid_rows_with_joined_remarks() {
        let results = vec![
            result("C1", FinalStatus::Valid, &[]),
            result("C2", FinalStatus::Invalid, &["first", "second"]),
        ];

        let mut buf = Vec::new();
        let written = write_invalid_claims(&mut buf, &results).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(written, 1);
        assert_eq!(
            lines[0],
            "Claim ID,Member ID,Encounter Date,Package Name,Provider,Clinician,Service Category,Consultation Status,Eligibility Status,Final Status,Remarks"
        );
        assert_eq!(
            lines[1],
            "C2,42,01/03/2024,Gold,Daman,GD1,Consultation,Elective,Eligible,invalid,first; second"
        );
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_workbook_reads_back_with_headers() {
        let results = vec![
            result("C1", FinalStatus::Valid, &[]),
            result("C2", FinalStatus::Invalid, &["first", "second"]),
        ];

        let (bytes, written) = render_invalid_claims(&results, ExportFormat::Xlsx).unwrap();
        assert_eq!(written, 1);

        let rows = crate::ingest::parse_workbook(
            bytes,
            crate::ingest::HeaderStrategy::Report,
            &crate::config::IngestConfig::default(),
            "export",
        )
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["Claim ID"].as_text(), "C2");
        assert_eq!(rows[0]["Remarks"].as_text(), "first; second");
        assert_eq!(rows[0]["Final Status"].as_text(), "invalid");
        assert_eq!(rows[0].len(), EXPORT_HEADERS.len());
    }

    #[test]
    fn test_file_name_carries_date_and_extension() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(
            export_file_name("invalid_claims", date, ExportFormat::Csv),
            "invalid_claims_2024-03-01.csv"
        );
        assert_eq!(
            export_file_name("invalid_claims", date, ExportFormat::Xlsx),
            "invalid_claims_2024-03-01.xlsx"
        );
    }

    #[test]
    fn test_export_format_parsing() {
        assert_eq!("XLSX".parse::<ExportFormat>().unwrap(), ExportFormat::Xlsx);
        assert_eq!("csv".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert!("xml".parse::<ExportFormat>().is_err());
        assert_eq!(ExportFormat::default(), ExportFormat::Xlsx);
    }

    #[tokio::test]
    async fn test_no_file_when_everything_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        let outcome = export_invalid_claims(
            &[result("C1", FinalStatus::Valid, &[])],
            &path,
            ExportFormat::Xlsx,
        )
        .await
        .unwrap();
        assert!(outcome.is_none());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_export_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");
        let outcome = export_invalid_claims(
            &[result("C9", FinalStatus::Invalid, &["x"])],
            &path,
            ExportFormat::Csv,
        )
        .await
        .unwrap();
        assert_eq!(outcome, Some(1));
        assert!(tokio::fs::read_to_string(&path).await.unwrap().contains("C9"));
    }
}
