use crate::awards::{AwardEngine, AwardSummaryDocument, HonourRoll, OperatorId, SummitCatalog};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::render::{render_compute_outcome, render_honour_roll, render_operator};
use crate::server;
use crate::sources::{
    collect_activations, ActivationBatch, ActivationCsvImporter, CatalogImporter,
    InMemoryCallsignDirectory, SnapshotSource,
};
use crate::telemetry;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "Summit Award",
    about = "Compute and publish the summits-activated award honour roll",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Compute award summaries from a catalog and activation exports
    Compute(ComputeArgs),
    /// Print the honour roll from a saved award summary
    Report(ReportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Summit catalog CSV to serve
    #[arg(long)]
    pub(crate) catalog: Option<PathBuf>,
    /// Award summary JSON to serve
    #[arg(long)]
    pub(crate) summary: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct ComputeArgs {
    /// Summit catalog CSV (summitCode,name,latitude,longitude,altM,points,Region)
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Activation snapshot (.json, keyed by summit code) or flat export (.csv)
    #[arg(long)]
    activations: PathBuf,
    /// Optional operator directory CSV (userId,callsign)
    #[arg(long)]
    callsigns: Option<PathBuf>,
    /// Where to write the award summary JSON
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// Award summary JSON produced by `compute`
    #[arg(long)]
    summary: Option<PathBuf>,
    /// Only list operators whose callsign contains this text
    #[arg(long)]
    search: Option<String>,
    /// Show the remaining summits for this operator id
    #[arg(long)]
    operator: Option<u64>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Compute(args) => run_compute(args),
        Command::Report(args) => run_report(args),
    }
}

fn run_compute(args: ComputeArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let catalog_path = args.catalog.unwrap_or(config.awards.catalog_path.clone());
    let output = args.output.unwrap_or(config.awards.summary_path.clone());

    let catalog = CatalogImporter::from_path(&catalog_path)?;
    let batch = load_activations(&args.activations, &catalog)?;
    let directory = args
        .callsigns
        .map(InMemoryCallsignDirectory::from_path)
        .transpose()?;

    let thresholds = config.awards.thresholds_for(catalog.len());
    let mut engine =
        AwardEngine::new(&catalog, &thresholds).with_date_range(config.awards.date_range);
    if let Some(directory) = directory.as_ref() {
        engine = engine.with_directory(directory);
    }

    let document = engine.document(&batch.records);
    document.save(&output)?;
    render_compute_outcome(&document, &batch, &output);
    Ok(())
}

fn load_activations(path: &Path, catalog: &SummitCatalog) -> Result<ActivationBatch, AppError> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        let source = SnapshotSource::from_path(path)?;
        Ok(collect_activations(catalog, &source))
    } else {
        Ok(ActivationCsvImporter::from_path(path)?)
    }
}

fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let path = args.summary.unwrap_or(config.awards.summary_path);
    let document = AwardSummaryDocument::load(&path)?;
    let roll = HonourRoll::new(document.summaries);

    let entries = match args.search.as_deref() {
        Some(term) => roll.search_entries(term),
        None => roll.entries(),
    };
    render_honour_roll(&entries, document.generated_at);

    if let Some(id) = args.operator {
        let operator = OperatorId(id);
        let summary = roll
            .operator(operator)
            .ok_or(AppError::OperatorNotFound(operator))?;
        render_operator(summary);
    }

    Ok(())
}
