use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("Workbook write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Could not detect header row in {path}")]
    HeaderNotFound { path: String },

    #[error("Unsupported input format: {path} (expected .csv, .xlsx, .xls, .ods or .json)")]
    UnsupportedFormat { path: String },

    #[error("No rows to process: {0}")]
    EmptyInput(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ReconError>;
