use super::domain::Provider;
use super::feed::FeedProvider;
use super::grouping::{build_providers, group_into_service_areas};
use super::merge::{merge_with_policy, MergePolicy, MergeReport};
use super::normalizer::{normalize_feed, normalize_rows, FieldIssue, ResolvedRow};
use super::store::{ProviderStore, StoreError};
use crate::sources::SourceError;
use serde::Serialize;
use tracing::{info, warn};

/// What a source hands to the pipeline.
#[derive(Debug, Clone)]
pub enum ProviderBatch {
    /// Tabular rows that still need normalizing and grouping.
    Rows(Vec<ResolvedRow>),
    /// Provider entries decoded from API feeds, possibly incomplete.
    Feed(Vec<FeedProvider>),
}

/// The swappable fetch/read stage.
pub trait RecordSource {
    fn describe(&self) -> String;
    fn load(&self) -> Result<ProviderBatch, SourceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("could not read provider source: {0}")]
    Source(#[from] SourceError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub rows_read: usize,
    pub field_issues: Vec<FieldIssue>,
    pub providers_built: usize,
    pub merge: MergeReport,
    pub total_providers: usize,
    pub persisted: bool,
    pub destination: String,
}

pub struct ProviderPipeline<S> {
    store: S,
    policy: MergePolicy,
    dry_run: bool,
}

impl<S: ProviderStore> ProviderPipeline<S> {
    pub fn new(store: S, policy: MergePolicy) -> Self {
        Self {
            store,
            policy,
            dry_run: false,
        }
    }

    /// Runs every stage except writing the collection back.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reads the whole source before touching the store, so an unreadable
    /// source leaves the persisted collection untouched.
    pub fn run_source(&self, source: &dyn RecordSource) -> Result<RunSummary, PipelineError> {
        info!(source = %source.describe(), "reading provider source");
        let batch = source.load()?;
        self.run(batch)
    }

    pub fn run(&self, batch: ProviderBatch) -> Result<RunSummary, PipelineError> {
        let (incoming, rows_read, field_issues) = prepare(batch);
        let providers_built = incoming.len();

        // Stored documents may predate padding and the "name" key.
        let mut collection = self.store.load()?.canonicalize();
        let existing = collection.len();
        let report = merge_with_policy(&mut collection, incoming, self.policy);

        info!(
            policy = self.policy.label(),
            existing,
            appended = report.appended,
            updated = report.updated,
            skipped = report.skipped,
            "merged providers"
        );

        if self.dry_run {
            info!(destination = %self.store.describe(), "dry run, collection not written");
        } else {
            self.store.save(&collection)?;
        }

        Ok(RunSummary {
            rows_read,
            field_issues,
            providers_built,
            merge: report,
            total_providers: collection.len(),
            persisted: !self.dry_run,
            destination: self.store.describe(),
        })
    }
}

fn prepare(batch: ProviderBatch) -> (Vec<Provider>, usize, Vec<FieldIssue>) {
    let (providers, rows_read, issues) = match batch {
        ProviderBatch::Rows(rows) => {
            let rows_read = rows.len();
            let normalized = normalize_rows(rows);
            let providers = build_providers(group_into_service_areas(normalized.records));
            (providers, rows_read, normalized.issues)
        }
        ProviderBatch::Feed(entries) => {
            let rows_read = entries.len();
            let normalized = normalize_feed(entries);
            (normalized.providers, rows_read, normalized.issues)
        }
    };

    if !issues.is_empty() {
        warn!(
            issues = issues.len(),
            "entries had missing fields and were kept with sentinel values"
        );
    }
    (providers, rows_read, issues)
}
