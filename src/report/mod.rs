pub mod summary;
pub mod table;

pub use summary::ValidationSummary;
pub use table::{
    details_cell, eligibility_details, print_member_eligibilities, print_results_table,
    visible_results, DetailsCell, PayerFilter,
};
