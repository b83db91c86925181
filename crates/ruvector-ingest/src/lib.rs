//! ruvector-ingest: batch upload of local files to a remote document store
//!
//! Files matched by a glob pattern are turned into text (plain text, HTML with
//! its title and canonical URL, or JSON objects), packed into size-capped
//! batches and submitted to the store. Oversized text documents are split
//! into chunks on whitespace and uploaded one chunk at a time.
//!
//! The crate also covers reading, updating, deleting and searching stored
//! objects, with `page = all` walking every page of a query.

pub mod commands;
pub mod config;
pub mod error;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod types;

pub use commands::{
    create_all, delete_all, read_all, search, update_all, CreateOptions, DeleteOptions, Failure,
    RunReport, SearchOptions, UpdateOptions,
};
pub use config::IngestConfig;
pub use error::{Error, Result};
pub use providers::{HttpStore, InMemoryStore, RemoteStore};
pub use types::{DocumentRecord, PageSelector, Pager};
