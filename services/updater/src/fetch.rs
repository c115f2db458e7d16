use energy_providers::config::PipelineConfig;
use energy_providers::error::AppError;
use energy_providers::providers::{
    decode_feed, FeedProvider, JsonFileStore, ProviderBatch, ProviderPipeline, RunSummary,
};
use energy_providers::sources::{load_api_list, ApiEndpoint};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug)]
pub(crate) enum FetchError {
    Http(reqwest::Error),
    Decode(serde_json::Error),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Http(err) => write!(f, "request failed: {}", err),
            FetchError::Decode(err) => write!(f, "response is not a provider list: {}", err),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Http(err) => Some(err),
            FetchError::Decode(err) => Some(err),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err)
    }
}

/// Pulls providers from every configured API and merges them in one run.
pub(crate) async fn run_fetch(
    config: &PipelineConfig,
    dry_run: bool,
) -> Result<RunSummary, AppError> {
    let apis = load_api_list(&config.paths.apis)?;
    let client = reqwest::Client::new();
    let entries = collect_feeds(&apis, |api| fetch_providers(client.clone(), api)).await;
    merge_feeds(config, entries, dry_run)
}

/// Queries each API in list order. An API that fails is logged and skipped;
/// entries from the others are still returned.
async fn collect_feeds<F, Fut>(apis: &[ApiEndpoint], mut fetch: F) -> Vec<FeedProvider>
where
    F: FnMut(ApiEndpoint) -> Fut,
    Fut: Future<Output = Result<Vec<FeedProvider>, FetchError>>,
{
    let mut entries = Vec::new();
    for api in apis {
        info!(api = %api.name, "fetching providers");
        match fetch(api.clone()).await {
            Ok(batch) => {
                info!(api = %api.name, providers = batch.len(), "fetched providers");
                entries.extend(batch);
            }
            Err(err) => warn!(api = %api.name, error = %err, "skipping API"),
        }
    }
    entries
}

fn merge_feeds(
    config: &PipelineConfig,
    entries: Vec<FeedProvider>,
    dry_run: bool,
) -> Result<RunSummary, AppError> {
    let pipeline = ProviderPipeline::new(
        JsonFileStore::new(&config.paths.output),
        config.merge_policy,
    )
    .dry_run(dry_run);

    Ok(pipeline.run(ProviderBatch::Feed(entries))?)
}

async fn fetch_providers(
    client: reqwest::Client,
    api: ApiEndpoint,
) -> Result<Vec<FeedProvider>, FetchError> {
    let body = client
        .get(&api.url)
        .timeout(REQUEST_TIMEOUT)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    decode_providers(&body)
}

fn decode_providers(body: &str) -> Result<Vec<FeedProvider>, FetchError> {
    decode_feed(body).map_err(FetchError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use energy_providers::config::{AppEnvironment, LogFormat, PathConfig, TelemetryConfig};
    use energy_providers::providers::{MergePolicy, ProviderStore};

    const GRID_WEST: &str = r#"[
        {"name": "Grid West", "service_areas": [{"city": "Boise", "state": "Idaho", "zip_codes": [83702]}]},
        {"service_areas": [{"city": "Nampa", "state": "Idaho", "zip_codes": ["83651", null]}]}
    ]"#;

    fn config(output: std::path::PathBuf) -> PipelineConfig {
        PipelineConfig {
            environment: AppEnvironment::Test,
            paths: PathConfig {
                input: "unused.csv".into(),
                output,
                apis: "apis.json".into(),
                zip_reference: None,
            },
            merge_policy: MergePolicy::Exact,
            telemetry: TelemetryConfig {
                log_level: "info".to_string(),
                ansi: false,
                format: LogFormat::Compact,
            },
        }
    }

    fn endpoint(name: &str) -> ApiEndpoint {
        ApiEndpoint {
            name: name.to_string(),
            url: format!("https://{name}.example.test/providers"),
        }
    }

    #[test]
    fn decodes_provider_arrays() {
        let body = r#"[{"name": "Grid West", "service_areas": [{"city": "Boise", "state": "Idaho", "zip_codes": [83702]}]}]"#;
        let providers = decode_providers(body).expect("decodes");
        assert_eq!(providers.len(), 1);
        assert_eq!(
            providers[0].service_areas[0].zip_codes,
            vec![Some("83702".to_string())]
        );
    }

    #[test]
    fn empty_body_is_an_empty_batch() {
        assert!(decode_providers("  ").expect("empty ok").is_empty());
    }

    #[test]
    fn non_list_body_is_a_decode_error() {
        let error = decode_providers(r#"{"error": "rate limited"}"#).expect_err("not a list");
        assert!(matches!(error, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn failing_api_is_skipped_and_the_rest_are_merged() {
        let dir = tempfile::tempdir().expect("tempdir");
        let output = dir.path().join("energyproviders.json");
        let apis = vec![endpoint("outage"), endpoint("grid-west")];

        let mut requested = Vec::new();
        let entries = collect_feeds(&apis, |api| {
            requested.push(api.name.clone());
            let result = if api.name == "outage" {
                decode_providers("<html>502 Bad Gateway</html>")
            } else {
                decode_providers(GRID_WEST)
            };
            async move { result }
        })
        .await;

        assert_eq!(requested, vec!["outage", "grid-west"]);
        assert_eq!(entries.len(), 2);

        let summary = merge_feeds(&config(output.clone()), entries, false).expect("merge runs");
        assert_eq!(summary.merge.appended, 2);
        assert_eq!(summary.field_issues.len(), 2);
        assert!(summary.persisted);

        let stored = JsonFileStore::new(&output).load().expect("collection written");
        assert_eq!(
            stored.find("Grid West").expect("grid west").service_areas[0].zip_codes,
            vec!["83702"]
        );
        assert_eq!(
            stored.find("Unknown").expect("nameless entry").service_areas[0].zip_codes,
            vec!["83651"]
        );
    }

    #[tokio::test]
    async fn all_apis_failing_leaves_nothing_to_merge() {
        let apis = vec![endpoint("outage")];
        let entries = collect_feeds(&apis, |_| async { decode_providers("not json") }).await;
        assert!(entries.is_empty());
    }
}
