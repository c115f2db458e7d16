use energy_providers::config::PipelineConfig;
use energy_providers::error::AppError;
use energy_providers::providers::{JsonFileStore, ProviderPipeline, RunSummary};
use energy_providers::sources::{SpreadsheetSource, ZipCityReference};
use tracing::info;

pub(crate) fn run_import(config: &PipelineConfig, dry_run: bool) -> Result<RunSummary, AppError> {
    let mut source = SpreadsheetSource::new(&config.paths.input);
    match &config.paths.zip_reference {
        Some(path) => source = source.with_city_reference(ZipCityReference::from_path(path)?),
        None => info!("no ZIP reference configured, relying on the export's city column"),
    }

    let pipeline = ProviderPipeline::new(
        JsonFileStore::new(&config.paths.output),
        config.merge_policy,
    )
    .dry_run(dry_run);

    Ok(pipeline.run_source(&source)?)
}
