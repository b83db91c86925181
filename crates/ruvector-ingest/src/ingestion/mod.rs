//! File ingestion pipeline: extraction, record building, chunking, batching

pub mod batcher;
pub mod builder;
pub mod chunker;
pub mod extractor;
pub mod files;
mod pipeline;

pub use batcher::{add_to_current_batch, Batch, Batcher};
pub use builder::{resolve_id, sanitize_type, ObjectBuilder};
pub use chunker::{ByteChunker, TextChunk};
pub use extractor::{MediaKind, TextExtractor};
pub use files::{expand_pattern, InputFile};
pub use pipeline::{ChunkedDocument, CreatePlanOptions, FileIssue, IngestPipeline, IngestPlan};
