//! Top-level operations: create, read, update, delete, search and store info

use futures::future::join_all;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::config::IngestConfig;
use crate::error::{Error, Result};
use crate::ingestion::builder::sanitize_type;
use crate::ingestion::files::require_files;
use crate::ingestion::{
    expand_pattern, Batch, ChunkedDocument, CreatePlanOptions, IngestPipeline, IngestPlan,
};
use crate::providers::RemoteStore;
use crate::retrieval::fetch_all;
use crate::types::{DocumentRecord, PageSelector, Pager};

/// Options for a create run
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    /// Glob pattern or directory
    pub pattern: Option<String>,
    /// Directory ids are made relative to (and relative patterns resolve against)
    pub base_dir: PathBuf,
    /// Identifier for the first file
    pub id_override: Option<String>,
    /// Record type
    pub doc_type: Option<String>,
}

/// Options for an update run
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    pub pattern: Option<String>,
    pub base_dir: PathBuf,
    pub doc_type: Option<String>,
}

/// Options for a delete run
#[derive(Debug, Clone, Default)]
pub struct DeleteOptions {
    /// Files whose names are the keys to delete
    pub pattern: Option<String>,
    /// Keys used when the pattern matches nothing
    pub ids: Vec<String>,
    pub base_dir: PathBuf,
}

/// Options for a search
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub query: String,
    pub doc_type: Option<String>,
    pub page: Option<PageSelector>,
    pub sort: Option<String>,
    pub desc: bool,
    pub limit: Option<u32>,
    pub last_key: Option<String>,
}

/// A submission that did not go through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// What was being submitted (file, batch or chunk)
    pub target: String,
    pub message: String,
    pub status: Option<u16>,
}

impl Failure {
    fn new(target: impl Into<String>, error: &Error) -> Self {
        Self {
            target: target.into(),
            message: error.to_string(),
            status: error.status(),
        }
    }
}

/// Outcome of a create or update run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Files turned into records
    pub objects: usize,
    /// Sum of their on-disk sizes
    pub total_bytes: u64,
    /// Records the store accepted
    pub submitted: usize,
    /// Bulk calls that succeeded
    pub batches: usize,
    /// Chunk records the store accepted
    pub chunks: usize,
    /// Files left out, with the reason
    pub skipped: Vec<String>,
    /// Everything that failed
    pub failures: Vec<Failure>,
}

impl RunReport {
    fn from_plan(plan: &IngestPlan) -> Self {
        Self {
            objects: plan.objects,
            total_bytes: plan.total_bytes,
            skipped: plan.skipped.iter().map(|s| s.error.to_string()).collect(),
            failures: plan
                .failures
                .iter()
                .map(|f| Failure::new(f.path.clone(), &f.error))
                .collect(),
            ..Default::default()
        }
    }

    /// No failure of any kind; skips do not count
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BulkMode {
    Create,
    Update,
}

/// Store identity and version
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub store: String,
    pub version: String,
    pub me: Value,
}

/// Upload every file matched by the pattern
pub async fn create_all(
    store: &dyn RemoteStore,
    config: &IngestConfig,
    options: &CreateOptions,
) -> Result<RunReport> {
    let files = match options.pattern.as_deref() {
        Some(pattern) => expand_pattern(pattern, &options.base_dir, &config.ingestion.default_media_type)?,
        None => Vec::new(),
    };
    require_files(options.pattern.as_deref(), &files)?;

    let pipeline = IngestPipeline::new(&config.ingestion, options.doc_type.as_deref())?;
    let plan = pipeline.plan_create(
        &files,
        &CreatePlanOptions {
            id_override: options.id_override.clone(),
        },
    );
    tracing::info!(
        "Planned {} object(s) in {} batch(es), {} chunked document(s)",
        plan.objects,
        plan.batches.len(),
        plan.chunked.len()
    );

    Ok(submit_plan(store, plan, BulkMode::Create).await)
}

/// Update objects from the JSON files matched by the pattern
pub async fn update_all(
    store: &dyn RemoteStore,
    config: &IngestConfig,
    options: &UpdateOptions,
) -> Result<RunReport> {
    let files = match options.pattern.as_deref() {
        Some(pattern) => expand_pattern(pattern, &options.base_dir, &config.ingestion.default_media_type)?,
        None => Vec::new(),
    };
    require_files(options.pattern.as_deref(), &files)?;

    let pipeline = IngestPipeline::new(&config.ingestion, options.doc_type.as_deref())?;
    let plan = pipeline.plan_update(&files);

    Ok(submit_plan(store, plan, BulkMode::Update).await)
}

/// Read objects by storage key
pub async fn read_all(store: &dyn RemoteStore, ids: &[String]) -> Result<Vec<DocumentRecord>> {
    if ids.is_empty() {
        return Err(Error::validation("Must specify object id(s)"));
    }
    store.read_many(ids).await
}

/// Delete objects.
///
/// Keys come from the names of the files matched by the pattern; when it
/// matches nothing the explicit ids are used as given.
pub async fn delete_all(store: &dyn RemoteStore, options: &DeleteOptions) -> Result<Vec<String>> {
    let matched = match options.pattern.as_deref() {
        Some(pattern) => expand_pattern(pattern, &options.base_dir, "text/plain")?
            .into_iter()
            .filter(|f| f.is_file)
            .collect(),
        None => Vec::new(),
    };

    let ids: Vec<String> = if matched.is_empty() {
        options.ids.iter().filter(|id| !id.is_empty()).cloned().collect()
    } else {
        matched.iter().map(|f| f.file_name()).collect()
    };

    if ids.is_empty() {
        return Err(Error::NoFiles("nothing to delete".into()));
    }

    store.delete_many(&ids).await?;
    tracing::info!("Deleted {} object(s)", ids.len());
    Ok(ids)
}

/// Run a query; `page = all` walks every page
pub async fn search(
    store: &dyn RemoteStore,
    config: &IngestConfig,
    options: &SearchOptions,
) -> Result<Vec<DocumentRecord>> {
    let doc_type = options.doc_type.as_deref().and_then(sanitize_type);
    let mut pager = Pager {
        page: 0,
        sort_by: options.sort.clone(),
        desc: options.desc,
        limit: options.limit.or(config.search.default_limit),
        last_key: options.last_key.clone(),
    };

    match options.page {
        Some(PageSelector::All) => {
            let query = options.query.clone();
            fetch_all(pager, &config.search.page_all_sort_key, |p| {
                let doc_type = doc_type.clone();
                let query = query.clone();
                async move { store.query(doc_type.as_deref(), &query, &p).await }
            })
            .await
        }
        Some(PageSelector::Number(n)) => {
            pager.page = n;
            store.query(doc_type.as_deref(), &options.query, &pager).await
        }
        None => store.query(doc_type.as_deref(), &options.query, &pager).await,
    }
}

/// Check connectivity: who we are and what the server runs
pub async fn ping(store: &dyn RemoteStore) -> Result<ConnectionInfo> {
    let me = store.me().await?;
    let version = store.server_version().await?;
    Ok(ConnectionInfo {
        store: store.name().to_string(),
        version,
        me,
    })
}

pub async fn me(store: &dyn RemoteStore) -> Result<Value> {
    store.me().await
}

pub async fn app_settings(store: &dyn RemoteStore) -> Result<Value> {
    store.app_settings().await
}

pub async fn rebuild_index(store: &dyn RemoteStore, destination: Option<&str>) -> Result<Value> {
    store.rebuild_index(destination).await
}

/// Submit a plan: chunk chains and bulk calls run concurrently with each
/// other; chunks of one document go one after another.
async fn submit_plan(store: &dyn RemoteStore, plan: IngestPlan, mode: BulkMode) -> RunReport {
    let mut report = RunReport::from_plan(&plan);

    let chains = plan.chunked.iter().map(|doc| submit_chunks(store, doc));
    let bulk = plan
        .batches
        .iter()
        .enumerate()
        .map(|(i, batch)| submit_batch(store, i, batch, mode));
    let (chain_results, batch_results) = futures::join!(join_all(chains), join_all(bulk));

    for (accepted, failure) in chain_results {
        report.chunks += accepted;
        report.submitted += accepted;
        if let Some(failure) = failure {
            report.failures.push(failure);
        }
    }
    for result in batch_results {
        match result {
            Ok(accepted) => {
                report.batches += 1;
                report.submitted += accepted;
            }
            Err(failure) => report.failures.push(failure),
        }
    }

    report
}

/// Submit one document's chunks in order, stopping at the first failure
async fn submit_chunks(store: &dyn RemoteStore, doc: &ChunkedDocument) -> (usize, Option<Failure>) {
    tracing::info!(
        "Uploading {} ({} KB of text) as {} chunk(s)",
        doc.id,
        doc.encoded_size / 1024,
        doc.chunks.len()
    );
    let mut accepted = 0;
    for chunk in &doc.chunks {
        let index = chunk.chunk_index.unwrap_or_default();
        match store.create_one(chunk).await {
            Ok(_) => {
                accepted += 1;
                tracing::info!(
                    "Created object chunk {} of {} with size {} KB",
                    index,
                    doc.id,
                    chunk.text().map(str::len).unwrap_or(0) / 1024
                );
            }
            Err(e) => {
                tracing::error!("Failed to create chunk {} of {}: {}", index, doc.id, e);
                let target = format!("{} (chunk {})", doc.source, index);
                return (accepted, Some(Failure::new(target, &e)));
            }
        }
    }
    (accepted, None)
}

async fn submit_batch(
    store: &dyn RemoteStore,
    index: usize,
    batch: &Batch,
    mode: BulkMode,
) -> std::result::Result<usize, Failure> {
    let result = match mode {
        BulkMode::Create => store.create_many(&batch.records).await,
        BulkMode::Update => store.update_many(&batch.records).await,
    };
    match result {
        Ok(records) => {
            tracing::info!(
                "Batch {}: {} {} object(s) ({} KB)",
                index,
                if mode == BulkMode::Create { "created" } else { "updated" },
                records.len(),
                batch.size / 1024
            );
            Ok(records.len())
        }
        Err(e) => {
            tracing::error!("Batch {} failed: {}", index, e);
            Err(Failure::new(format!("batch {}", index), &e))
        }
    }
}

/// Resolve the base directory, defaulting to the working directory
pub fn base_dir_or_cwd(base_dir: Option<&Path>) -> PathBuf {
    base_dir
        .map(Path::to_path_buf)
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::FileIssue;
    use crate::providers::InMemoryStore;

    #[test]
    fn test_report_from_plan() {
        let plan = IngestPlan {
            objects: 2,
            total_bytes: 2048,
            skipped: vec![FileIssue {
                path: "logo.png".into(),
                error: Error::skipped("logo.png", "isn't JSON, HTML nor text"),
            }],
            failures: vec![FileIssue {
                path: "bad.json".into(),
                error: Error::file_parse("bad.json", "expected value"),
            }],
            ..Default::default()
        };
        let report = RunReport::from_plan(&plan);
        assert_eq!(report.objects, 2);
        assert_eq!(report.skipped, vec!["Skipping 'logo.png' - isn't JSON, HTML nor text"]);
        assert_eq!(report.failures[0].target, "bad.json");
        assert_eq!(report.failures[0].status, None);
        assert!(!report.is_success());
    }

    #[test]
    fn test_empty_plan_submits_nothing() {
        let store = InMemoryStore::new();
        let report = tokio_test::block_on(submit_plan(&store, IngestPlan::default(), BulkMode::Create));
        assert!(report.is_success());
        assert_eq!(report.submitted, 0);
        assert_eq!(store.call_count(), 0);
    }

    #[test]
    fn test_read_needs_ids() {
        let store = InMemoryStore::new();
        let err = tokio_test::block_on(read_all(&store, &[])).unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Must specify object id(s)");
    }

    #[test]
    fn test_base_dir_defaults_to_cwd() {
        let dir = Path::new("/tmp/somewhere");
        assert_eq!(base_dir_or_cwd(Some(dir)), dir.to_path_buf());
        assert!(base_dir_or_cwd(None).is_absolute());
    }
}
