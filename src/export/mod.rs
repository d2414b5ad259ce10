pub mod invalid;

pub use invalid::{
    export_file_name, export_invalid_claims, export_path, invalid_claims_workbook,
    render_invalid_claims, write_invalid_claims, ExportFormat, InvalidClaimRow, EXPORT_HEADERS,
};
