use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::{
    config::IngestConfig,
    error::{ReconError, Result},
    records::{
        normalize_eligibility, normalize_report, CellValue, ClaimRecord, EligibilityRecord,
        RawRow, ReportFormat, SourceKind,
    },
};

/// Markers that identify the header row of a claim report
const REPORT_HEADER_MARKERS: &[&str] = &["pri. claim no", "claimid", "member"];

/// How the header row of a sheet is located
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderStrategy {
    /// First row with enough non-empty cells, else the first row
    Eligibility,
    /// First row mentioning a claim/member column, else the first dense row
    Report,
}

/// Claims read from a report file plus what was learned about its origin
#[derive(Debug, Clone)]
pub struct LoadedReport {
    pub format: ReportFormat,
    pub source: SourceKind,
    pub claims: Vec<ClaimRecord>,
}

/// Read rows from a `.csv`, `.json` or spreadsheet (`.xlsx`, `.xls`, `.xlsm`, `.ods`) file
pub async fn read_rows(
    path: &Path,
    strategy: HeaderStrategy,
    settings: &IngestConfig,
) -> Result<(Vec<RawRow>, SourceKind)> {
    let label = path.display().to_string();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => {
            let bytes = tokio::fs::read(path).await?;
            let rows = parse_csv(&bytes, strategy, settings, &label)?;
            Ok((rows, SourceKind::Csv))
        }
        "xlsx" | "xlsm" | "xls" | "ods" => {
            let bytes = tokio::fs::read(path).await?;
            let rows = parse_workbook(bytes, strategy, settings, &label)?;
            Ok((rows, SourceKind::Spreadsheet))
        }
        "json" => {
            let bytes = tokio::fs::read(path).await?;
            Ok((parse_json(&bytes)?, SourceKind::Spreadsheet))
        }
        _ => Err(ReconError::UnsupportedFormat { path: label }),
    }
}

/// Parse a JSON array of header -> value objects
pub fn parse_json(bytes: &[u8]) -> Result<Vec<RawRow>> {
    let objects: Vec<serde_json::Map<String, serde_json::Value>> = serde_json::from_slice(bytes)?;
    Ok(objects
        .iter()
        .map(|obj| {
            obj.iter()
                .map(|(k, v)| (k.trim().to_string(), CellValue::from_json(v)))
                .collect()
        })
        .collect())
}

/// Parse CSV bytes, locating the header row with `strategy`
pub fn parse_csv(
    bytes: &[u8],
    strategy: HeaderStrategy,
    settings: &IngestConfig,
    label: &str,
) -> Result<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut grid: Vec<Vec<CellValue>> = Vec::new();
    for record in reader.byte_records() {
        let record = record?;
        grid.push(
            record
                .iter()
                .map(|cell| CellValue::from(String::from_utf8_lossy(cell).as_ref()))
                .collect(),
        );
    }

    let rows = rows_from_grid(&grid, strategy, settings, label)?;
    match strategy {
        HeaderStrategy::Report => Ok(dedupe_by_claim_id(rows, label)),
        HeaderStrategy::Eligibility => Ok(rows),
    }
}

/// Parse the first sheet of a workbook, locating the header row with `strategy`.
/// Numeric and date cells stay numeric so serial dates survive.
pub fn parse_workbook(
    bytes: Vec<u8>,
    strategy: HeaderStrategy,
    settings: &IngestConfig,
    label: &str,
) -> Result<Vec<RawRow>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ReconError::EmptyInput(label.to_string()))??;

    let grid: Vec<Vec<CellValue>> = range
        .rows()
        .map(|row| row.iter().map(sheet_cell).collect())
        .collect();

    rows_from_grid(&grid, strategy, settings, label)
}

fn sheet_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::from(s.as_str()),
        Data::Bool(b) => CellValue::Text(b.to_string()),
        Data::Error(_) | Data::Empty => CellValue::Empty,
    }
}

/// Turn a cell grid into header-keyed rows below the detected header row
fn rows_from_grid(
    grid: &[Vec<CellValue>],
    strategy: HeaderStrategy,
    settings: &IngestConfig,
    label: &str,
) -> Result<Vec<RawRow>> {
    if grid.is_empty() {
        return Err(ReconError::EmptyInput(label.to_string()));
    }

    let header_idx = detect_header_row(grid, strategy, settings).ok_or_else(|| {
        ReconError::HeaderNotFound {
            path: label.to_string(),
        }
    })?;
    debug!("{}: header row at line {}", label, header_idx + 1);

    let headers: Vec<String> = grid[header_idx]
        .iter()
        .map(|h| h.as_text().trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    Ok(grid[header_idx + 1..]
        .iter()
        .filter(|cells| cells.iter().any(|c| !c.is_blank()))
        .map(|cells| {
            headers
                .iter()
                .enumerate()
                .filter(|(_, h)| !h.is_empty())
                .map(|(idx, h)| (h.clone(), cells.get(idx).cloned().unwrap_or_default()))
                .collect()
        })
        .collect())
}

fn non_empty_cells(row: &[CellValue]) -> usize {
    row.iter().filter(|c| !c.is_blank()).count()
}

fn detect_header_row(
    grid: &[Vec<CellValue>],
    strategy: HeaderStrategy,
    settings: &IngestConfig,
) -> Option<usize> {
    let window = grid.len().min(settings.header_scan_rows);
    let dense = || (0..window).find(|&i| non_empty_cells(&grid[i]) >= settings.min_header_cells);

    match strategy {
        HeaderStrategy::Eligibility => dense().or(Some(0)),
        HeaderStrategy::Report => (0..window)
            .find(|&i| {
                let joined = grid[i]
                    .iter()
                    .map(CellValue::as_text)
                    .collect::<Vec<_>>()
                    .join(",")
                    .to_lowercase();
                REPORT_HEADER_MARKERS.iter().any(|m| joined.contains(m))
            })
            .or_else(dense),
    }
}

/// Keep the first row per claim ID; rows without one are dropped
fn dedupe_by_claim_id(rows: Vec<RawRow>, label: &str) -> Vec<RawRow> {
    let claim_header = rows.first().and_then(|first| {
        ReportFormat::detect(Some(first))
            .claim_id_header(first.keys())
            .cloned()
    });
    let Some(claim_header) = claim_header else {
        return rows;
    };

    let total = rows.len();
    let mut seen = HashSet::new();
    let unique: Vec<RawRow> = rows
        .into_iter()
        .filter(|row| {
            let id = row.get(&claim_header).map(CellValue::as_text).unwrap_or_default();
            !id.trim().is_empty() && seen.insert(id)
        })
        .collect();

    if unique.len() < total {
        warn!(
            "{}: dropped {} duplicate or blank rows by '{}'",
            label,
            total - unique.len(),
            claim_header
        );
    }
    unique
}

/// Load and normalize an eligibility export
pub async fn load_eligibility(path: &Path, settings: &IngestConfig) -> Result<Vec<EligibilityRecord>> {
    let (rows, _) = read_rows(path, HeaderStrategy::Eligibility, settings).await?;
    let records = normalize_eligibility(&rows);
    info!(
        "Loaded {} eligibility records from {} ({} rows without member ID)",
        records.len(),
        path.display(),
        rows.len() - records.len()
    );
    Ok(records)
}

/// Load a claim report and map it to canonical claims
pub async fn load_report(path: &Path, settings: &IngestConfig) -> Result<LoadedReport> {
    let (rows, source) = read_rows(path, HeaderStrategy::Report, settings).await?;
    let (format, claims) = normalize_report(&rows);
    info!(
        "Loaded {} claims from {} ({} layout, {:?} source)",
        claims.len(),
        path.display(),
        format,
        source
    );
    Ok(LoadedReport {
        format,
        source,
        claims,
    })
}
