use crate::infra::{parse_evaluated_at, ConfiguredMappingStore};
use chrono::{NaiveDateTime, Utc};
use clap::{Args, ValueEnum};
use inspection_ai::config::AppConfig;
use inspection_ai::error::AppError;
use inspection_ai::telemetry;
use inspection_ai::workflows::inspection::report::{
    report_filename, JsonReportRenderer, ReportFormat, ReportRenderer,
};
use inspection_ai::workflows::inspection::{
    BatchEvaluation, InspectionService, PropertyOutcome, Trade, TradeStatus,
};
use std::fmt::Write as _;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Args, Debug, Default)]
pub(crate) struct MappingStoreArgs {
    /// Trade mapping CSV to use instead of INSPECTION_MAPPING_PATH
    #[arg(long)]
    pub(crate) mappings: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// Inspection CSV export to evaluate
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Only report on this property
    #[arg(long)]
    pub(crate) property: Option<String>,
    /// Evaluation timestamp stamped on the reports (defaults to now, UTC)
    #[arg(long, value_parser = parse_evaluated_at)]
    pub(crate) at: Option<NaiveDateTime>,
    /// Print the full evaluation as JSON instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
    /// Write one JSON report model per evaluated property into this directory
    #[arg(long)]
    pub(crate) out_dir: Option<PathBuf>,
    /// Document type the written report models are destined for
    #[arg(long, value_enum, default_value_t = FormatArg::Excel)]
    pub(crate) format: FormatArg,
    #[command(flatten)]
    pub(crate) store: MappingStoreArgs,
}

#[derive(Args, Debug)]
pub(crate) struct UpsertArgs {
    /// Raw trade label as it appears in inspection exports
    pub(crate) raw_label: String,
    /// Canonical trade, by name ("Flooring - Tiles") or key ("flooring_tiles")
    #[arg(long, value_parser = parse_trade)]
    pub(crate) trade: Trade,
    #[command(flatten)]
    pub(crate) store: MappingStoreArgs,
}

#[derive(Args, Debug)]
pub(crate) struct DeactivateArgs {
    pub(crate) raw_label: String,
    #[command(flatten)]
    pub(crate) store: MappingStoreArgs,
}

#[derive(Args, Debug)]
pub(crate) struct UnmappedArgs {
    /// Inspection CSV export to analyse
    #[arg(long)]
    pub(crate) csv: PathBuf,
    #[command(flatten)]
    pub(crate) store: MappingStoreArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum FormatArg {
    Excel,
    Word,
}

impl From<FormatArg> for ReportFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Excel => ReportFormat::Excel,
            FormatArg::Word => ReportFormat::Word,
        }
    }
}

fn parse_trade(raw: &str) -> Result<Trade, String> {
    raw.parse::<Trade>().map_err(|err| err.to_string())
}

fn load_service(
    args: &MappingStoreArgs,
) -> Result<InspectionService<ConfiguredMappingStore>, AppError> {
    let config = AppConfig::load()?;
    telemetry::init_for_cli(&config.telemetry)?;

    let path = args.mappings.clone().or(config.inspection.mapping_path);
    let store = ConfiguredMappingStore::from_path(path);
    info!(source = %store.describe(), "loading trade mappings");
    Ok(InspectionService::from_store(
        Arc::new(store),
        config.inspection.policy,
    )?)
}

pub(crate) fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let service = load_service(&args.store)?;
    let evaluated_at = args.at.unwrap_or_else(|| Utc::now().naive_utc());

    let mut evaluation = service.evaluate_csv(File::open(&args.csv)?, evaluated_at)?;
    if let Some(property) = args.property.as_deref() {
        evaluation
            .properties
            .retain(|outcome| outcome.property_id().as_str() == property);
        if evaluation.properties.is_empty() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("property '{property}' does not appear in {}", args.csv.display()),
            )
            .into());
        }
    }

    if let Some(dir) = args.out_dir.as_deref() {
        let written = write_reports(&evaluation, dir, args.format.into(), evaluated_at)?;
        for path in &written {
            eprintln!("wrote {}", path.display());
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&evaluation)?);
    } else {
        print!("{}", format_evaluation(&evaluation, evaluated_at));
    }
    Ok(())
}

pub(crate) fn run_mappings_list(args: MappingStoreArgs) -> Result<(), AppError> {
    let service = load_service(&args)?;
    let entries = service.mappings();
    println!("{} trade mapping(s)", entries.len());
    for entry in entries {
        let state = if entry.active { "" } else { " (inactive)" };
        println!(
            "- {} -> {}{}",
            entry.raw_label,
            entry.canonical_trade.label(),
            state
        );
    }
    Ok(())
}

pub(crate) fn run_mappings_upsert(args: UpsertArgs) -> Result<(), AppError> {
    let service = load_service(&args.store)?;
    let outcome = service.upsert_mapping(&args.raw_label, args.trade)?;
    println!("{}", serde_json::to_string(&outcome)?);
    Ok(())
}

pub(crate) fn run_mappings_deactivate(args: DeactivateArgs) -> Result<(), AppError> {
    let service = load_service(&args.store)?;
    service.deactivate_mapping(&args.raw_label)?;
    println!("deactivated '{}'", args.raw_label.trim());
    Ok(())
}

pub(crate) fn run_mappings_unmapped(args: UnmappedArgs) -> Result<(), AppError> {
    let service = load_service(&args.store)?;
    let report = service.unmapped_terms(File::open(&args.csv)?)?;
    if report.is_empty() {
        println!("every trade label in {} is mapped", args.csv.display());
        return Ok(());
    }
    println!(
        "{} unmapped label(s), {} occurrence(s)",
        report.len(),
        report.total_occurrences()
    );
    for term in report.terms() {
        println!("- {} ({})", term.raw_label, term.occurrences);
    }
    Ok(())
}

fn write_reports(
    evaluation: &BatchEvaluation,
    dir: &Path,
    format: ReportFormat,
    evaluated_at: NaiveDateTime,
) -> Result<Vec<PathBuf>, AppError> {
    std::fs::create_dir_all(dir)?;
    let renderer = JsonReportRenderer { pretty: true };
    let mut written = Vec::new();
    for report in evaluation.properties.iter().filter_map(PropertyOutcome::report) {
        let name = report_filename(report.property_id.as_str(), format, evaluated_at);
        let path = dir.join(format!("{name}.json"));
        std::fs::write(&path, renderer.render(report.clone())?)?;
        written.push(path);
    }
    Ok(written)
}

fn format_evaluation(evaluation: &BatchEvaluation, evaluated_at: NaiveDateTime) -> String {
    let summary = &evaluation.summary;
    let mut out = String::new();
    let _ = writeln!(out, "Settlement readiness (evaluated {evaluated_at})");
    let _ = writeln!(
        out,
        "- {} rows read | {} records | {} skipped | {} properties",
        summary.rows_read, summary.records, summary.skipped_rows, summary.properties
    );
    let _ = writeln!(
        out,
        "- Ready {} | Not Ready {} | Incomplete {} | Failed {}",
        summary.ready, summary.not_ready, summary.incomplete, summary.failed
    );

    for outcome in &evaluation.properties {
        match outcome {
            PropertyOutcome::Evaluated { report, .. } => {
                let jurisdiction = report.jurisdiction.as_deref().unwrap_or("no jurisdiction");
                let _ = writeln!(
                    out,
                    "\n{} [{}]: {}{}",
                    report.property_id,
                    jurisdiction,
                    report.overall_status_label,
                    if report.mapping_warning {
                        " (unmapped trade labels present)"
                    } else {
                        ""
                    }
                );
                let _ = writeln!(
                    out,
                    "  {} | {} defect(s) | {} critical, {} major, {} minor",
                    report.summary.defect_band_label,
                    report.summary.total_records,
                    report.summary.critical_findings,
                    report.summary.major_findings,
                    report.summary.minor_findings
                );
                for section in &report.trade_sections {
                    let marker = match section.status {
                        TradeStatus::Fail => "x",
                        TradeStatus::Incomplete => "?",
                        TradeStatus::Pass => "-",
                    };
                    let _ = writeln!(
                        out,
                        "  {marker} {}: {} ({} finding(s))",
                        section.trade_label, section.status_label, section.finding_count
                    );
                }
                for reason in &report.summary.reasons {
                    let _ = writeln!(out, "  ! {reason}");
                }
            }
            PropertyOutcome::Failed {
                property_id,
                message,
                ..
            } => {
                let _ = writeln!(out, "\n{property_id}: not evaluated ({message})");
            }
        }
    }

    if !summary.unmapped_terms.is_empty() {
        let _ = writeln!(out, "\nUnmapped trade labels:");
        for term in &summary.unmapped_terms {
            let _ = writeln!(out, "  - {} ({})", term.raw_label, term.occurrences);
        }
    }
    if !summary.unattributed_rows.is_empty() {
        let _ = writeln!(out, "\nRows without a property:");
        for row in &summary.unattributed_rows {
            let _ = writeln!(out, "  - line {}: {}", row.line, row.detail);
        }
    }
    out
}
