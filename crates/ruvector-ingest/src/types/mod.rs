//! Core types for records and paging

pub mod pager;
pub mod record;

pub use pager::{PageSelector, Pager};
pub use record::{DocumentRecord, Extracted, ExtractionResult};
