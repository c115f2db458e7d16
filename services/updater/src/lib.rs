mod cli;
mod fetch;
mod import;
mod render;

use energy_providers::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
