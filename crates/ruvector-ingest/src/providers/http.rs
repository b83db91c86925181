//! REST client for the remote document store, with retry

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::types::{DocumentRecord, Pager};

use super::store::RemoteStore;

/// Object type used when a record has none
const DEFAULT_TYPE: &str = "sysprop";

/// HTTP implementation of [`RemoteStore`]
pub struct HttpStore {
    client: Client,
    base_url: String,
    jwt: Option<String>,
    max_retries: u32,
}

impl HttpStore {
    /// Create a client from store configuration
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()?;

        let base_url = format!(
            "{}/{}",
            config.endpoint.trim_end_matches('/'),
            config.api_path.trim_matches('/')
        );

        Ok(Self {
            client,
            base_url,
            jwt: config.jwt.clone().filter(|t| !t.is_empty()),
            max_retries: config.max_retries,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.is_empty() {
            self.base_url.clone()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.jwt {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request, retrying transport errors and 5xx with exponential backoff
    async fn send<F>(&self, what: &str, build: F) -> Result<Value>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            match Self::execute(build()).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let delay = Duration::from_secs(2u64.pow(attempt));
                    tracing::warn!(
                        "{} failed (attempt {}/{}), retrying in {:?}: {}",
                        what,
                        attempt + 1,
                        self.max_retries + 1,
                        delay,
                        e
                    );
                    last_error = Some(e);
                    sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| Error::internal(format!("{}: no attempt made", what))))
    }

    async fn execute(request: RequestBuilder) -> Result<Value> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_else(|| body.clone());
            return Err(Error::submission(Some(status.as_u16()), message));
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    fn wire_list(records: &[DocumentRecord]) -> Value {
        Value::Array(records.iter().map(DocumentRecord::to_wire).collect())
    }

    fn ids_query(ids: &[String]) -> Vec<(&'static str, String)> {
        ids.iter().map(|id| ("ids", id.clone())).collect()
    }
}

/// Records from a list response, or from a search response's `items`
fn records_from(value: Value) -> Vec<DocumentRecord> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut object) => match object.remove("items") {
            Some(Value::Array(items)) => items,
            _ => vec![Value::Object(object)],
        },
        _ => Vec::new(),
    };
    items.into_iter().map(DocumentRecord::from_wire).collect()
}

#[async_trait]
impl RemoteStore for HttpStore {
    async fn create_one(&self, record: &DocumentRecord) -> Result<DocumentRecord> {
        let doc_type = record.doc_type.as_deref().unwrap_or(DEFAULT_TYPE);
        let body = record.to_wire();
        tracing::debug!("POST /{} {}", doc_type, record.name);
        let value = self
            .send("create", || self.request(Method::POST, doc_type).json(&body))
            .await?;
        Ok(DocumentRecord::from_wire(value))
    }

    async fn create_many(&self, records: &[DocumentRecord]) -> Result<Vec<DocumentRecord>> {
        let body = Self::wire_list(records);
        tracing::debug!("POST /_batch ({} records)", records.len());
        let value = self
            .send("batch create", || self.request(Method::POST, "_batch").json(&body))
            .await?;
        Ok(records_from(value))
    }

    async fn update_many(&self, records: &[DocumentRecord]) -> Result<Vec<DocumentRecord>> {
        let body = Self::wire_list(records);
        tracing::debug!("PATCH /_batch ({} records)", records.len());
        let value = self
            .send("batch update", || self.request(Method::PATCH, "_batch").json(&body))
            .await?;
        Ok(records_from(value))
    }

    async fn read_many(&self, ids: &[String]) -> Result<Vec<DocumentRecord>> {
        let query = Self::ids_query(ids);
        let value = self
            .send("batch read", || self.request(Method::GET, "_batch").query(&query))
            .await?;
        Ok(records_from(value))
    }

    async fn delete_many(&self, ids: &[String]) -> Result<()> {
        let query = Self::ids_query(ids);
        self.send("batch delete", || self.request(Method::DELETE, "_batch").query(&query))
            .await?;
        Ok(())
    }

    async fn query(
        &self,
        doc_type: Option<&str>,
        query: &str,
        pager: &Pager,
    ) -> Result<Vec<DocumentRecord>> {
        let mut params = pager.to_query();
        params.push(("q", if query.is_empty() { "*".to_string() } else { query.to_string() }));
        if let Some(t) = doc_type {
            params.push(("type", t.to_string()));
        }
        tracing::debug!("GET /search/default page={}", pager.page);
        let value = self
            .send("search", || self.request(Method::GET, "search/default").query(&params))
            .await?;
        Ok(records_from(value))
    }

    async fn me(&self) -> Result<Value> {
        self.send("me", || self.request(Method::GET, "_me")).await
    }

    async fn server_version(&self) -> Result<String> {
        let value = self.send("version", || self.request(Method::GET, "")).await?;
        value
            .get("version")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::submission(None, "version missing from server info"))
    }

    async fn app_settings(&self) -> Result<Value> {
        self.send("settings", || self.request(Method::GET, "_settings")).await
    }

    async fn rebuild_index(&self, destination: Option<&str>) -> Result<Value> {
        let params: Vec<(&str, String)> = destination
            .map(|d| vec![("destinationIndex", d.to_string())])
            .unwrap_or_default();
        self.send("reindex", || self.request(Method::POST, "_reindex").query(&params))
            .await
    }

    fn name(&self) -> &str {
        "http"
    }
}
