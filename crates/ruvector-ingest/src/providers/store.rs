//! Remote document store provider trait

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::types::{DocumentRecord, Pager};

/// Trait for the remote document store
///
/// Implementations:
/// - `HttpStore`: REST API over HTTP
/// - `InMemoryStore`: process-local map, for tests and dry runs
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Create a single record
    async fn create_one(&self, record: &DocumentRecord) -> Result<DocumentRecord>;

    /// Create many records in one call
    async fn create_many(&self, records: &[DocumentRecord]) -> Result<Vec<DocumentRecord>>;

    /// Update many records in one call
    async fn update_many(&self, records: &[DocumentRecord]) -> Result<Vec<DocumentRecord>>;

    /// Read records by storage key
    async fn read_many(&self, ids: &[String]) -> Result<Vec<DocumentRecord>>;

    /// Delete records by storage key
    async fn delete_many(&self, ids: &[String]) -> Result<()>;

    /// Run a query and return one page of results
    async fn query(
        &self,
        doc_type: Option<&str>,
        query: &str,
        pager: &Pager,
    ) -> Result<Vec<DocumentRecord>>;

    /// Identity the client is authenticated as
    async fn me(&self) -> Result<Value>;

    /// Server version string
    async fn server_version(&self) -> Result<String>;

    /// Settings of the app the client belongs to
    async fn app_settings(&self) -> Result<Value>;

    /// Rebuild the search index, optionally into another index
    async fn rebuild_index(&self, destination: Option<&str>) -> Result<Value>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
