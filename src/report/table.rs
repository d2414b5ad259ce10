use colored::Colorize;
use std::fmt;

use crate::{
    engine::{format_date, parse_date, EligibilityIndex},
    records::{CellValue, EligibilityRecord, FinalStatus, ValidationResult},
    utils,
};

/// Insurers shown by the Daman/Thiqa toggle
pub const DAMAN_THIQA: &[&str] = &["daman", "thiqa"];

const RESULT_WIDTHS: [usize; 8] = [14, 20, 12, 14, 18, 10, 48, 14];
const LOOKUP_WIDTHS: [usize; 7] = [4, 18, 12, 14, 14, 18, 24];

/// Restricts displayed rows to insurers containing one of the needles
#[derive(Debug, Clone, Default)]
pub struct PayerFilter {
    needles: Vec<String>,
}

impl PayerFilter {
    pub fn new<S: AsRef<str>>(needles: &[S]) -> Self {
        Self {
            needles: needles
                .iter()
                .map(|n| n.as_ref().trim().to_lowercase())
                .filter(|n| !n.is_empty())
                .collect(),
        }
    }

    pub fn daman_thiqa() -> Self {
        Self::new(DAMAN_THIQA)
    }

    pub fn is_active(&self) -> bool {
        !self.needles.is_empty()
    }

    pub fn accepts(&self, result: &ValidationResult) -> bool {
        if !self.is_active() {
            return true;
        }
        let payer = if result.insurance_company.trim().is_empty() {
            &result.package_name
        } else {
            &result.insurance_company
        };
        let payer = payer.to_lowercase();
        self.needles.iter().any(|n| payer.contains(n.as_str()))
    }
}

/// Rows that make it to the screen: a member ID is required and the payer filter must pass
pub fn visible_results<'a>(
    results: &'a [ValidationResult],
    filter: &PayerFilter,
) -> Vec<&'a ValidationResult> {
    results
        .iter()
        .filter(|r| !r.member_id.trim().is_empty())
        .filter(|r| filter.accepts(r))
        .collect()
}

/// What the Details column points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailsCell {
    /// Request number of the matched eligibility
    Request(String),
    /// Member has eligibilities, none matched
    ViewAll,
    NotAvailable,
}

impl fmt::Display for DetailsCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetailsCell::Request(r) => write!(f, "{}", r),
            DetailsCell::ViewAll => write!(f, "View All"),
            DetailsCell::NotAvailable => write!(f, "N/A"),
        }
    }
}

pub fn details_cell(result: &ValidationResult, index: &EligibilityIndex) -> DetailsCell {
    if let Some(request) = result.matched_request_number() {
        return DetailsCell::Request(request.to_string());
    }
    if index.has_member(&result.member_id) {
        DetailsCell::ViewAll
    } else {
        DetailsCell::NotAvailable
    }
}

/// Print the results table; `verbose` prints remarks without truncation
pub fn print_results_table(results: &[&ValidationResult], index: &EligibilityIndex, verbose: bool) {
    if results.is_empty() {
        println!("{}", "No claims to display".yellow());
        return;
    }

    let total_width: usize = RESULT_WIDTHS.iter().sum::<usize>() + 2 * RESULT_WIDTHS.len();
    utils::print_table_border(total_width);
    utils::print_table_row(
        &[
            "Claim ID",
            "Member ID",
            "Encounter",
            "Clinician",
            "Service Category",
            "Status",
            "Remarks",
            "Details",
        ],
        &RESULT_WIDTHS,
    );
    utils::print_table_border(total_width);

    for result in results {
        let remarks = if result.remarks.is_empty() {
            "No remarks".dimmed().to_string()
        } else if verbose {
            result.remarks_joined()
        } else {
            utils::truncate(&result.remarks_joined(), RESULT_WIDTHS[6])
        };
        let status = utils::format_eligibility_status(&result.status);
        let details = details_cell(result, index).to_string();
        let claim_id = match result.final_status {
            FinalStatus::Valid => result.claim_id.green().to_string(),
            FinalStatus::Invalid => result.claim_id.red().to_string(),
            FinalStatus::Unknown => result.claim_id.yellow().to_string(),
        };

        utils::print_table_row(
            &[
                &claim_id,
                &utils::truncate(&result.member_id, RESULT_WIDTHS[1]),
                &result.encounter_date,
                &utils::truncate(&result.clinician, RESULT_WIDTHS[3]),
                &utils::truncate(&result.service_category, RESULT_WIDTHS[4]),
                &status,
                &remarks,
                &details,
            ],
            &RESULT_WIDTHS,
        );
    }
    utils::print_table_border(total_width);
}

/// Display a date-like cell as DD/MM/YYYY when it parses, raw text otherwise
pub fn display_date(cell: &CellValue) -> String {
    parse_date(cell, false)
        .map(|d| format_date(&d))
        .unwrap_or_else(|| cell.as_text())
}

/// Non-empty fields of an eligibility record, dates rendered for display
pub fn eligibility_details(record: &EligibilityRecord) -> Vec<(&'static str, String)> {
    let fields = [
        ("Eligibility Request Number", record.request_number.clone()),
        ("Card Number / DHA Member ID", record.member_id_raw.clone()),
        ("Answered On", display_date(&record.answered_on)),
        ("Ordered On", display_date(&record.ordered_on)),
        ("Status", record.status.clone()),
        ("Clinician", record.clinician.clone()),
        ("Payer Name", record.payer_name.clone()),
        ("Service Category", record.service_category.clone()),
        ("Consultation Status", record.consultation_status.clone()),
        ("Package Name", record.package_name.clone()),
        ("Department", record.department.clone()),
    ];

    fields
        .into_iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .collect()
}

/// Print every eligibility record held for `member`
pub fn print_member_eligibilities(index: &EligibilityIndex, member: &str, detailed: bool) {
    let records = index.candidates(member);
    if records.is_empty() {
        println!("No eligibilities found for {}", member.trim());
        return;
    }

    println!("\n{}", format!("Eligibilities for {}", member.trim()).cyan().bold());
    let total_width: usize = LOOKUP_WIDTHS.iter().sum::<usize>() + 2 * LOOKUP_WIDTHS.len();
    utils::print_table_border(total_width);
    utils::print_table_row(
        &[
            "#",
            "Request No",
            "Answered On",
            "Status",
            "Clinician",
            "Service Category",
            "Package",
        ],
        &LOOKUP_WIDTHS,
    );
    utils::print_table_border(total_width);

    for (i, record) in records.iter().enumerate() {
        utils::print_table_row(
            &[
                &(i + 1).to_string(),
                &record.request_number,
                &display_date(record.match_date()),
                &utils::format_eligibility_status(&record.status),
                &utils::truncate(&record.clinician, LOOKUP_WIDTHS[4]),
                &utils::truncate(&record.service_category, LOOKUP_WIDTHS[5]),
                &utils::truncate(&record.package_name, LOOKUP_WIDTHS[6]),
            ],
            &LOOKUP_WIDTHS,
        );
    }
    utils::print_table_border(total_width);

    if detailed {
        for record in records {
            println!();
            for (field, value) in eligibility_details(record) {
                println!("  {:<28} {}", field, value);
            }
        }
    }
}
