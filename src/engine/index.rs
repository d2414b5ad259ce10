use std::collections::HashMap;
use tracing::debug;

use super::identifiers::normalize_member_id;
use crate::records::{EligibilityRecord, RawRow};

/// Eligibility records grouped by normalized member ID.
///
/// Each group keeps the order of the source file; the matcher relies on it
/// to break ties in favour of the earlier row.
#[derive(Debug, Clone, Default)]
pub struct EligibilityIndex {
    by_member: HashMap<String, Vec<EligibilityRecord>>,
    total: usize,
}

impl EligibilityIndex {
    pub fn build(records: impl IntoIterator<Item = EligibilityRecord>) -> Self {
        let mut index = Self::default();

        for record in records {
            if record.member_id_raw.trim().is_empty() {
                continue;
            }
            let key = normalize_member_id(&record.member_id_raw);
            index.by_member.entry(key).or_default().push(record);
            index.total += 1;
        }

        debug!(
            "Indexed {} eligibility records across {} members",
            index.total,
            index.by_member.len()
        );
        index
    }

    /// Build straight from export rows; rows without a member ID are skipped
    pub fn from_rows(rows: &[RawRow]) -> Self {
        Self::build(rows.iter().filter_map(EligibilityRecord::from_row))
    }

    /// All records for a member, in source order
    pub fn candidates(&self, member_id_raw: &str) -> &[EligibilityRecord] {
        self.by_member
            .get(&normalize_member_id(member_id_raw))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_member(&self, member_id_raw: &str) -> bool {
        !self.candidates(member_id_raw).is_empty()
    }

    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn member_count(&self) -> usize {
        self.by_member.len()
    }
}
