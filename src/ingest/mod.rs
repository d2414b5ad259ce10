pub mod reader;

pub use reader::{
    load_eligibility, load_report, parse_csv, parse_json, parse_workbook, read_rows,
    HeaderStrategy, LoadedReport,
};
