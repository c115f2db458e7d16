use crate::fetch::run_fetch;
use crate::import::run_import;
use crate::render::render_summary;
use clap::{Args, Parser, Subcommand};
use energy_providers::config::PipelineConfig;
use energy_providers::error::AppError;
use energy_providers::providers::MergePolicy;
use energy_providers::telemetry;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "update-energyproviders",
    about = "Merge utility service-area data into the energy providers dataset",
    version
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import a utility-map spreadsheet export (default command)
    Import(ImportArgs),
    /// Fetch providers from every API in the API list
    Fetch(FetchArgs),
}

#[derive(Args, Debug, Default, Clone)]
pub(crate) struct OutputArgs {
    /// Override the configured provider collection path
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// How incoming providers are reconciled: `exact` or `union`
    #[arg(long, value_parser = parse_policy)]
    pub(crate) policy: Option<MergePolicy>,
    /// Run every stage but do not write the collection
    #[arg(long)]
    pub(crate) dry_run: bool,
}

#[derive(Args, Debug, Default, Clone)]
pub(crate) struct ImportArgs {
    /// Spreadsheet export (CSV) to read
    #[arg(long)]
    pub(crate) input: Option<PathBuf>,
    /// ZIP to city reference CSV used when the export has no city column
    #[arg(long)]
    pub(crate) zip_reference: Option<PathBuf>,
    #[command(flatten)]
    pub(crate) output: OutputArgs,
}

#[derive(Args, Debug, Default, Clone)]
pub(crate) struct FetchArgs {
    /// JSON list of `{ "name", "url" }` entries
    #[arg(long)]
    pub(crate) apis: Option<PathBuf>,
    #[command(flatten)]
    pub(crate) output: OutputArgs,
}

fn parse_policy(raw: &str) -> Result<MergePolicy, String> {
    MergePolicy::parse(raw).ok_or_else(|| format!("unknown merge policy '{raw}' (use exact or union)"))
}

impl OutputArgs {
    fn apply(&self, config: &mut PipelineConfig) {
        if let Some(output) = &self.output {
            config.paths.output = output.clone();
        }
        if let Some(policy) = self.policy {
            config.merge_policy = policy;
        }
    }
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Import(ImportArgs::default()));

    let mut config = PipelineConfig::load()?;
    match &command {
        Command::Import(args) => {
            if let Some(input) = &args.input {
                config.paths.input = input.clone();
            }
            if let Some(reference) = &args.zip_reference {
                config.paths.zip_reference = Some(reference.clone());
            }
            args.output.apply(&mut config);
        }
        Command::Fetch(args) => {
            if let Some(apis) = &args.apis {
                config.paths.apis = apis.clone();
            }
            args.output.apply(&mut config);
        }
    }

    telemetry::init(&config.telemetry)?;

    let summary = match command {
        Command::Import(args) => run_import(&config, args.output.dry_run)?,
        Command::Fetch(args) => run_fetch(&config, args.output.dry_run).await?,
    };

    render_summary(&summary, config.merge_policy);
    Ok(())
}
