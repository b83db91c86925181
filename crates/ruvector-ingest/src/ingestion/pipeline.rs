//! File-to-record planning for create and update runs

use crate::config::IngestionConfig;
use crate::error::{Error, Result};
use crate::types::{DocumentRecord, Extracted};

use super::batcher::{Batch, Batcher};
use super::builder::{own_id, resolve_id, ObjectBuilder};
use super::chunker::ByteChunker;
use super::extractor::{MediaKind, TextExtractor};
use super::files::InputFile;

/// Chunk records of one oversized file, submitted one after another
#[derive(Debug, Clone)]
pub struct ChunkedDocument {
    /// Identifier before encoding
    pub id: String,
    /// Source path, relative
    pub source: String,
    /// Chunk records in emission order
    pub chunks: Vec<DocumentRecord>,
    /// Encoded text size before chunking
    pub encoded_size: usize,
}

/// A file that did not produce records
#[derive(Debug)]
pub struct FileIssue {
    pub path: String,
    pub error: Error,
}

/// Everything a run will submit, built before the first remote call
#[derive(Debug, Default)]
pub struct IngestPlan {
    /// Size-bounded groups for bulk calls
    pub batches: Vec<Batch>,
    /// Oversized documents split into chunks
    pub chunked: Vec<ChunkedDocument>,
    /// Files left out on purpose (wrong type, not a file)
    pub skipped: Vec<FileIssue>,
    /// Files that failed to read, parse or validate
    pub failures: Vec<FileIssue>,
    /// Files turned into records
    pub objects: usize,
    /// Sum of the on-disk sizes of those files
    pub total_bytes: u64,
}

impl IngestPlan {
    /// Records headed for bulk calls
    pub fn batched_records(&self) -> usize {
        self.batches.iter().map(Batch::len).sum()
    }

    fn skip(&mut self, file: &InputFile, error: Error) {
        tracing::warn!("{}", error);
        self.skipped.push(FileIssue {
            path: file.relative.clone(),
            error,
        });
    }

    fn fail(&mut self, file: &InputFile, error: Error) {
        tracing::error!("{}: {}", file.relative, error);
        self.failures.push(FileIssue {
            path: file.relative.clone(),
            error,
        });
    }
}

/// Options for a create run
#[derive(Debug, Clone, Default)]
pub struct CreatePlanOptions {
    /// Identifier for the first file
    pub id_override: Option<String>,
}

/// Main ingestion pipeline
pub struct IngestPipeline {
    extractor: TextExtractor,
    builder: ObjectBuilder,
    chunker: ByteChunker,
    max_batch_size: u64,
}

impl IngestPipeline {
    /// Create a pipeline from config and the run's record type
    pub fn new(config: &IngestionConfig, doc_type: Option<&str>) -> Result<Self> {
        Ok(Self {
            extractor: TextExtractor::new(config.sanitize),
            builder: ObjectBuilder::new(doc_type, config.encode_ids),
            chunker: ByteChunker::new(config.max_document_size, config.boundary_scan_limit)?,
            max_batch_size: config.max_document_size as u64,
        })
    }

    /// Plan a create run over `files` in order
    pub fn plan_create(&self, files: &[InputFile], options: &CreatePlanOptions) -> IngestPlan {
        let mut plan = IngestPlan::default();
        let mut batcher = Batcher::new(self.max_batch_size);

        for (index, file) in files.iter().enumerate() {
            if !file.is_file {
                plan.skip(file, Error::InvalidFile(file.path.display().to_string()));
                continue;
            }
            if MediaKind::from_media_type(&file.media_type).is_none() {
                plan.skip(
                    file,
                    Error::skipped(file.path.display().to_string(), "isn't JSON, HTML nor text"),
                );
                continue;
            }

            match self.plan_create_file(index, file, options, &mut batcher, &mut plan) {
                Ok(()) => {
                    plan.objects += 1;
                    plan.total_bytes += file.size;
                }
                Err(e) if e.is_skip() => plan.skip(file, e),
                Err(e) => plan.fail(file, e),
            }
        }

        plan.batches = batcher.finish();
        plan
    }

    fn plan_create_file(
        &self,
        index: usize,
        file: &InputFile,
        options: &CreatePlanOptions,
        batcher: &mut Batcher,
        plan: &mut IngestPlan,
    ) -> Result<()> {
        let content = std::fs::read(&file.path)?;
        let override_id = options.id_override.as_deref();

        match self.extractor.extract(&content, &file.media_type)? {
            Extracted::Json(value) => {
                let id = resolve_id(index, override_id, None, &file.relative)?;
                let records = self.builder.build_json(value, &id, &file.relative)?;
                tracing::info!("Creating {} ({} object(s))", id, records.len());
                batcher.add_group(records, file.size);
            }
            Extracted::Text(result) => {
                let id = resolve_id(index, override_id, result.url.as_deref(), &file.relative)?;
                let fields = result.to_fields();
                let encoded_size = result.text.len();

                if self.chunker.needs_chunking(encoded_size) {
                    tracing::warn!(
                        "{} is larger than {} KB - splitting into chunks",
                        id,
                        self.chunker.max_size() / 1024
                    );
                    let chunks = self
                        .chunker
                        .chunk(&result.text, &id)
                        .into_iter()
                        .map(|c| self.builder.build_chunk(&fields, &id, c.index, &c.text))
                        .collect::<Result<Vec<_>>>()?;
                    plan.chunked.push(ChunkedDocument {
                        id,
                        source: file.relative.clone(),
                        chunks,
                        encoded_size,
                    });
                } else {
                    let record = self.builder.build(fields, &id)?;
                    tracing::info!("Creating {}", id);
                    batcher.add(record, file.size);
                }
            }
        }
        Ok(())
    }

    /// Plan an update run: JSON files only, keyed by their own `id`
    pub fn plan_update(&self, files: &[InputFile]) -> IngestPlan {
        let mut plan = IngestPlan::default();
        let mut batcher = Batcher::new(self.max_batch_size);

        for file in files {
            if MediaKind::from_media_type(&file.media_type) != Some(MediaKind::Json) {
                plan.skip(
                    file,
                    Error::skipped(file.path.display().to_string(), "skipped because it is not a JSON file"),
                );
                continue;
            }
            if !file.is_file {
                plan.skip(file, Error::InvalidFile(file.path.display().to_string()));
                continue;
            }

            match self.plan_update_file(file, &mut batcher) {
                Ok(()) => {
                    plan.objects += 1;
                    plan.total_bytes += file.size;
                }
                Err(e) => plan.fail(file, e),
            }
        }

        plan.batches = batcher.finish();
        plan
    }

    fn plan_update_file(&self, file: &InputFile, batcher: &mut Batcher) -> Result<()> {
        let content = std::fs::read(&file.path)?;
        let value: serde_json::Value = serde_json::from_slice(&content)?;
        let id = value
            .as_object()
            .and_then(own_id)
            .unwrap_or_else(|| file.relative.clone());
        let records = self.builder.build_json(value, &id, &file.relative)?;
        tracing::info!("Updating {}", id);
        batcher.add_group(records, file.size);
        Ok(())
    }
}
