use clap::{Args, Parser, Subcommand, ValueEnum};
use clinic_claims_reconciler::{
    engine::{CategoryTextSource, DateOrder},
    export::ExportFormat,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "claims-recon")]
#[command(about = "Reconcile clinic billing claims against insurance eligibility exports")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file (defaults to config/default.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

/// How `validate` prints its results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Input files shared by the reconciliation commands
#[derive(Args, Clone)]
pub struct InputArgs {
    /// Eligibility export (.xlsx, .xls, .ods, .csv or .json)
    #[arg(short, long)]
    pub eligibility: PathBuf,

    /// Claims report (.xlsx, .xls, .ods, .csv or .json)
    #[arg(short, long)]
    pub report: PathBuf,

    /// How to read ambiguous claim dates: auto, dmy or mdy
    #[arg(long)]
    pub date_order: Option<DateOrder>,

    /// Field checked by the service-category rule: department or package_name
    #[arg(long)]
    pub category_text: Option<CategoryTextSource>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate claims and show the verdict table
    Validate {
        #[command(flatten)]
        inputs: InputArgs,

        /// Only show Daman / Thiqa claims
        #[arg(long)]
        daman_thiqa: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Show every remark in full
        #[arg(short, long)]
        verbose: bool,
    },

    /// Export invalid claims to an xlsx or CSV file
    Export {
        #[command(flatten)]
        inputs: InputArgs,

        /// File type of the export: xlsx or csv (defaults to export.format)
        #[arg(short, long)]
        format: Option<ExportFormat>,

        /// Directory to write the export into
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Overwrite an existing export without asking
        #[arg(short, long)]
        yes: bool,
    },

    /// List every eligibility record held for a member
    Lookup {
        /// Eligibility export (.xlsx, .xls, .ods, .csv or .json)
        #[arg(short, long)]
        eligibility: PathBuf,

        /// Member ID (leading zeros are ignored)
        member: String,

        /// Print all fields of each record
        #[arg(short, long)]
        detailed: bool,
    },

    /// Print the effective configuration
    Config,
}
