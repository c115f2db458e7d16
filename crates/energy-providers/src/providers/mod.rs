pub mod domain;
mod feed;
mod grouping;
mod merge;
mod normalizer;
mod pipeline;
pub mod store;
mod zip;

pub use domain::{Provider, ProviderCollection, RawRecord, ServiceArea, UNKNOWN};
pub use feed::{decode_feed, FeedProvider, FeedServiceArea};
pub use grouping::{build_providers, group_into_service_areas, GroupedServiceAreas, ServiceAreaKey};
pub use merge::{merge, merge_with_policy, MergePolicy, MergeReport};
pub use normalizer::{
    normalize_feed, normalize_feed_provider, normalize_row, normalize_rows, FieldIssue,
    MissingField, NormalizedBatch, NormalizedFeed, ResolvedRow,
};
pub use pipeline::{PipelineError, ProviderBatch, ProviderPipeline, RecordSource, RunSummary};
pub use store::{JsonFileStore, ProviderStore, StoreError};
pub use zip::{zfill_zip, ZIP_WIDTH};
