mod cli;

use clap::Parser;
use cli::{Cli, Commands, InputArgs, OutputFormat};
use clinic_claims_reconciler::{
    config::Config,
    engine::{validate, EligibilityIndex, ValidationOptions, ValidationRun},
    error::{self, ReconError},
    export::{self, ExportFormat},
    ingest::{self, LoadedReport},
    records::FinalStatus,
    report::{self, PayerFilter, ValidationSummary},
    utils,
};
use colored::*;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}", format!("Failed to load configuration: {}", e).red());
            std::process::exit(1);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Validate {
            inputs,
            daman_thiqa,
            format,
            verbose,
        } => {
            info!("Validating {} against {}", inputs.report.display(), inputs.eligibility.display());
            validate_claims(&config, &inputs, daman_thiqa, format, verbose).await
        }

        Commands::Export {
            inputs,
            format,
            output_dir,
            yes,
        } => {
            info!("Exporting invalid claims...");
            let format = format.unwrap_or(config.export.format);
            export_invalid(&config, &inputs, format, output_dir, yes).await
        }

        Commands::Lookup {
            eligibility,
            member,
            detailed,
        } => lookup_member(&config, &eligibility, &member, detailed).await,

        Commands::Config => show_config(&config),
    };

    if let Err(e) = result {
        error!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

/// Everything one reconciliation pass produces
struct Reconciliation {
    index: EligibilityIndex,
    report: LoadedReport,
    run: ValidationRun,
}

async fn reconcile(config: &Config, inputs: &InputArgs) -> error::Result<Reconciliation> {
    let (eligibility, report) = tokio::try_join!(
        ingest::load_eligibility(&inputs.eligibility, &config.ingest),
        ingest::load_report(&inputs.report, &config.ingest),
    )?;

    if eligibility.is_empty() {
        return Err(ReconError::EmptyInput(format!(
            "{} has no eligibility rows with a member ID",
            inputs.eligibility.display()
        )));
    }
    if report.claims.is_empty() {
        return Err(ReconError::EmptyInput(format!(
            "{} has no claim rows",
            inputs.report.display()
        )));
    }

    let date_order = inputs.date_order.unwrap_or(config.matching.date_order);
    let options = ValidationOptions {
        prefer_mdy: date_order.prefer_mdy(report.source),
        text_source: inputs
            .category_text
            .unwrap_or(config.matching.category_text_source),
    };

    let index = EligibilityIndex::build(eligibility);
    let run = validate(&report.claims, &index, options);

    Ok(Reconciliation { index, report, run })
}

async fn validate_claims(
    config: &Config,
    inputs: &InputArgs,
    daman_thiqa: bool,
    format: OutputFormat,
    verbose: bool,
) -> error::Result<()> {
    let recon = reconcile(config, inputs).await?;

    let filter = if daman_thiqa {
        PayerFilter::daman_thiqa()
    } else {
        PayerFilter::new(&config.display.payer_filter)
    };
    let shown = report::visible_results(&recon.run.results, &filter);

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }

    let summary = ValidationSummary::from_results(shown.iter().copied());
    println!("{}", summary.headline().cyan().bold());
    println!(
        "Report layout: {}  |  Payer filter: {}",
        recon.report.format,
        if filter.is_active() { "ON".green() } else { "OFF".normal() }
    );

    report::print_results_table(&shown, &recon.index, verbose);
    summary.print_summary(&recon.run.diagnostics);

    Ok(())
}

async fn export_invalid(
    config: &Config,
    inputs: &InputArgs,
    format: ExportFormat,
    output_dir: Option<PathBuf>,
    yes: bool,
) -> error::Result<()> {
    let recon = reconcile(config, inputs).await?;

    if !recon
        .run
        .results
        .iter()
        .any(|r| r.final_status == FinalStatus::Invalid)
    {
        println!("{}", "No invalid entries to export.".yellow());
        return Ok(());
    }

    let dir = output_dir.unwrap_or_else(|| PathBuf::from(&config.export.output_dir));
    let path = export::export_path(
        &dir,
        &config.export.file_prefix,
        chrono::Local::now().date_naive(),
        format,
    );

    if path.exists() && !yes && !utils::confirm_action(&format!("Overwrite {}?", path.display()))? {
        println!("Cancelled");
        return Ok(());
    }

    if let Some(written) = export::export_invalid_claims(&recon.run.results, &path, format).await? {
        println!(
            "{}",
            format!("✓ Exported {} invalid claims to {}", written, path.display()).green()
        );
    }

    Ok(())
}

async fn lookup_member(
    config: &Config,
    eligibility: &Path,
    member: &str,
    detailed: bool,
) -> error::Result<()> {
    let records = ingest::load_eligibility(eligibility, &config.ingest).await?;
    let index = EligibilityIndex::build(records);
    report::print_member_eligibilities(&index, member, detailed);
    Ok(())
}

fn show_config(config: &Config) -> error::Result<()> {
    println!("{}", "=== Effective Configuration ===".cyan().bold());
    println!("{}", config.to_toml()?);
    Ok(())
}
