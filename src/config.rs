use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::engine::{CategoryTextSource, DateOrder};
use crate::export::ExportFormat;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
pub const ENV_PREFIX: &str = "CLAIMS";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct MatchingConfig {
    /// Which text the service-category rule is checked against
    #[serde(default)]
    pub category_text_source: CategoryTextSource,
    /// Day/month tie-break for ambiguous numeric claim dates
    #[serde(default)]
    pub date_order: DateOrder,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct IngestConfig {
    pub header_scan_rows: usize,
    pub min_header_cells: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            header_scan_rows: 10,
            min_header_cells: 3,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct DisplayConfig {
    /// Only show rows whose insurer contains one of these substrings (empty = show all)
    #[serde(default)]
    pub payer_filter: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ExportConfig {
    pub output_dir: String,
    pub file_prefix: String,
    /// Export file type: "xlsx" or "csv"
    pub format: ExportFormat,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: ".".to_string(),
            file_prefix: "invalid_claims".to_string(),
            format: ExportFormat::Xlsx,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "clinic_claims_reconciler=info,claims_recon=info,warn".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from defaults, an optional TOML file and `CLAIMS__*` environment variables
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let explicit = path.is_some();
        let path = path.unwrap_or(DEFAULT_CONFIG_PATH);
        if explicit && !Path::new(path).exists() {
            anyhow::bail!("Configuration file not found: {}", path);
        }

        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("display.payer_filter")
                    .try_parsing(true),
            )
            .build()?;

        let cfg: Config = config.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.ingest.header_scan_rows == 0 {
            anyhow::bail!("ingest.header_scan_rows must be at least 1");
        }
        if self.export.file_prefix.trim().is_empty() {
            anyhow::bail!("export.file_prefix must not be empty");
        }
        Ok(())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = Config::default();
        assert_eq!(cfg.ingest.header_scan_rows, 10);
        assert_eq!(cfg.ingest.min_header_cells, 3);
        assert_eq!(cfg.matching.category_text_source, CategoryTextSource::Department);
        assert_eq!(cfg.matching.date_order, DateOrder::Auto);
        assert_eq!(cfg.export.file_prefix, "invalid_claims");
        assert!(cfg.display.payer_filter.is_empty());
    }

    #[test]
    fn loads_values_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[matching]\ncategory_text_source = \"package_name\"\ndate_order = \"mdy\"\n\n[display]\npayer_filter = [\"daman\"]"
        )
        .unwrap();

        let cfg = Config::load(Some(file.path().to_str().unwrap())).unwrap();
        assert_eq!(cfg.matching.category_text_source, CategoryTextSource::PackageName);
        assert_eq!(cfg.matching.date_order, DateOrder::Mdy);
        assert_eq!(cfg.display.payer_filter, vec!["daman".to_string()]);
        assert_eq!(cfg.ingest.header_scan_rows, 10);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[export]\noutput_dir = \"out\"\n\n[ingest]\nmin_header_cells = 2"
        )
        .unwrap();

        let cfg = Config::load(Some(file.path().to_str().unwrap())).unwrap();
        assert_eq!(cfg.export.output_dir, "out");
        assert_eq!(cfg.export.file_prefix, "invalid_claims");
        assert_eq!(cfg.export.format, ExportFormat::Xlsx);
        assert_eq!(cfg.ingest.min_header_cells, 2);
        assert_eq!(cfg.ingest.header_scan_rows, 10);
        assert_eq!(cfg.logging.filter, LoggingConfig::default().filter);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        assert!(Config::load(Some("/definitely/not/here.toml")).is_err());
    }

    #[test]
    fn renders_as_toml() {
        let rendered = Config::default().to_toml().unwrap();
        assert!(rendered.contains("[matching]"));
        assert!(rendered.contains("category_text_source = \"department\""));
    }
}
