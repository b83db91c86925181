//! In-process document store

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Error, Result};
use crate::types::{DocumentRecord, Pager};

use super::store::RemoteStore;

/// Page size when the pager has no limit
const DEFAULT_PAGE_SIZE: usize = 30;

/// Map-backed [`RemoteStore`].
///
/// Records are kept by storage key. Queries match the query string against
/// the record's name and text (`*` or empty matches everything) and page
/// through results in key order. Individual keys can be made to fail to
/// exercise error paths.
#[derive(Default)]
pub struct InMemoryStore {
    records: RwLock<BTreeMap<String, DocumentRecord>>,
    failing_ids: RwLock<HashSet<String>>,
    calls: AtomicUsize,
    log: RwLock<Vec<String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call touching this storage key fail with a 500
    pub fn fail_on(&self, id: impl Into<String>) {
        self.failing_ids.write().insert(id.into());
    }

    /// Insert records directly, without counting a call
    pub fn seed(&self, records: impl IntoIterator<Item = DocumentRecord>) {
        let mut map = self.records.write();
        for record in records {
            map.insert(record.id.clone(), record);
        }
    }

    /// Number of remote calls served
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Operation log, one entry per call (`create:<name>`, `create_many:<n>`, ...)
    pub fn log(&self) -> Vec<String> {
        self.log.read().clone()
    }

    pub fn get(&self, id: &str) -> Option<DocumentRecord> {
        self.records.read().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    fn record_call(&self, entry: String) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.log.write().push(entry);
    }

    fn check(&self, ids: impl IntoIterator<Item = impl AsRef<str>>) -> Result<()> {
        let failing = self.failing_ids.read();
        for id in ids {
            if failing.contains(id.as_ref()) {
                return Err(Error::submission(
                    Some(500),
                    format!("rejected object '{}'", id.as_ref()),
                ));
            }
        }
        Ok(())
    }

    fn matches(record: &DocumentRecord, doc_type: Option<&str>, query: &str) -> bool {
        if let Some(t) = doc_type {
            if record.doc_type.as_deref() != Some(t) {
                return false;
            }
        }
        let query = query.trim();
        if query.is_empty() || query == "*" {
            return true;
        }
        record.name.contains(query) || record.text().is_some_and(|t| t.contains(query))
    }
}

#[async_trait]
impl RemoteStore for InMemoryStore {
    async fn create_one(&self, record: &DocumentRecord) -> Result<DocumentRecord> {
        self.record_call(format!("create:{}", record.name));
        self.check([&record.id])?;
        self.records.write().insert(record.id.clone(), record.clone());
        Ok(record.clone())
    }

    async fn create_many(&self, records: &[DocumentRecord]) -> Result<Vec<DocumentRecord>> {
        self.record_call(format!("create_many:{}", records.len()));
        self.check(records.iter().map(|r| &r.id))?;
        let mut map = self.records.write();
        for record in records {
            map.insert(record.id.clone(), record.clone());
        }
        Ok(records.to_vec())
    }

    async fn update_many(&self, records: &[DocumentRecord]) -> Result<Vec<DocumentRecord>> {
        self.record_call(format!("update_many:{}", records.len()));
        self.check(records.iter().map(|r| &r.id))?;
        let mut map = self.records.write();
        let mut updated = Vec::new();
        for record in records {
            if let Some(existing) = map.get_mut(&record.id) {
                existing.fields.extend(record.fields.clone());
                if record.doc_type.is_some() {
                    existing.doc_type = record.doc_type.clone();
                }
                updated.push(existing.clone());
            }
        }
        Ok(updated)
    }

    async fn read_many(&self, ids: &[String]) -> Result<Vec<DocumentRecord>> {
        self.record_call(format!("read_many:{}", ids.len()));
        self.check(ids)?;
        let map = self.records.read();
        Ok(ids.iter().filter_map(|id| map.get(id).cloned()).collect())
    }

    async fn delete_many(&self, ids: &[String]) -> Result<()> {
        self.record_call(format!("delete_many:{}", ids.len()));
        self.check(ids)?;
        let mut map = self.records.write();
        for id in ids {
            map.remove(id);
        }
        Ok(())
    }

    async fn query(
        &self,
        doc_type: Option<&str>,
        query: &str,
        pager: &Pager,
    ) -> Result<Vec<DocumentRecord>> {
        self.record_call(format!("query:{}", pager.page));
        let limit = pager.limit.map(|l| l as usize).unwrap_or(DEFAULT_PAGE_SIZE).max(1);
        let skip = (pager.page.max(1) as usize - 1) * limit;
        let map = self.records.read();
        Ok(map
            .values()
            .filter(|r| Self::matches(r, doc_type, query))
            .skip(skip)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn me(&self) -> Result<Value> {
        self.record_call("me".into());
        Ok(json!({"id": "app:memory", "type": "app", "name": "memory"}))
    }

    async fn server_version(&self) -> Result<String> {
        self.record_call("version".into());
        Ok(env!("CARGO_PKG_VERSION").to_string())
    }

    async fn app_settings(&self) -> Result<Value> {
        self.record_call("settings".into());
        Ok(json!({}))
    }

    async fn rebuild_index(&self, destination: Option<&str>) -> Result<Value> {
        self.record_call("reindex".into());
        Ok(json!({
            "reindexed": self.records.read().len(),
            "destinationIndex": destination,
        }))
    }

    fn name(&self) -> &str {
        "memory"
    }
}
