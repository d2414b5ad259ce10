use colored::Colorize;
use serde::Serialize;

use crate::{
    engine::RunDiagnostics,
    records::{FinalStatus, ValidationResult},
};

/// Counts for a set of displayed results
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationSummary {
    pub total_claims: usize,
    pub valid: usize,
    pub invalid: usize,
    pub unknown: usize,
}

impl ValidationSummary {
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a ValidationResult>) -> Self {
        let mut summary = Self::default();
        for result in results {
            summary.total_claims += 1;
            match result.final_status {
                FinalStatus::Valid => summary.valid += 1,
                FinalStatus::Invalid => summary.invalid += 1,
                FinalStatus::Unknown => summary.unknown += 1,
            }
        }
        summary
    }

    /// One-line summary shown above the results table
    pub fn headline(&self) -> String {
        format!(
            "Processed {} claims: {} valid, {} unknown, {} invalid",
            self.total_claims, self.valid, self.unknown, self.invalid
        )
    }

    /// Get valid rate as percentage
    pub fn valid_rate(&self) -> f64 {
        if self.total_claims == 0 {
            0.0
        } else {
            (self.valid as f64 / self.total_claims as f64) * 100.0
        }
    }

    /// Print a formatted summary to console
    pub fn print_summary(&self, diagnostics: &RunDiagnostics) {
        println!("\n{}", "=== Validation Summary ===".cyan().bold());
        println!("Claims:            {}", self.total_claims);
        println!("Valid:             {} ✓", self.valid.to_string().green());
        println!("Invalid:           {} ✗", self.invalid.to_string().red());
        println!("Unknown:           {}", self.unknown.to_string().yellow());
        println!("Valid rate:        {:.1}%", self.valid_rate());
        println!("Eligibilities used: {}", diagnostics.used_requests.len());

        let dropped = diagnostics.dropped_blank_claim_id + diagnostics.dropped_blank_member_id;
        if dropped > 0 {
            println!("Skipped rows:      {} (missing claim or member ID)", dropped);
        }
        if diagnostics.unparsed_dates > 0 {
            println!(
                "Unreadable dates:  {}",
                diagnostics.unparsed_dates.to_string().yellow()
            );
        }
        println!("{}", "==========================".cyan());
    }
}
