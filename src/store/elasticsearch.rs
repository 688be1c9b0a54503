use crate::config::types::StoreConfig;
use crate::pipeline::batch::Batch;
use crate::store::traits::{BulkItemError, BulkOutcome, ClusterInfo, IndexStore, StoreError};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Upper bound for the backoff between retries
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// HTTP client writing to an Elasticsearch-compatible `_bulk` endpoint
#[derive(Debug)]
pub struct ElasticsearchStore {
    base_url: String,
    index: String,
    client: reqwest::Client,
    username: Option<String>,
    password: Option<String>,
    max_retries: usize,
    retry_interval: Duration,
}

impl ElasticsearchStore {
    pub fn new(config: &StoreConfig, index: &str) -> Result<Self> {
        let base_url = normalize_host(&config.host)?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .danger_accept_invalid_certs(!config.verify_certs)
            .build()?;

        Ok(Self {
            base_url,
            index: index.to_string(),
            client,
            username: config.username.clone(),
            password: config.password.clone(),
            max_retries: config.max_retries,
            retry_interval: config.retry_interval,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, url);
        match &self.username {
            Some(user) => builder.basic_auth(user, self.password.as_deref()),
            None => builder,
        }
    }

    async fn send_bulk(&self, body: &str) -> Result<BulkOutcome> {
        let response = self
            .request(Method::POST, "/_bulk")
            .header(CONTENT_TYPE, "application/x-ndjson")
            .body(body.to_string())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::Status {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let parsed: BulkResponse = response.json().await?;
        Ok(parsed.into_outcome())
    }

    /// Retry a request with exponential backoff
    pub async fn with_retry<F, Fut, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempts = 0;
        let mut backoff = self.retry_interval;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    attempts += 1;
                    if attempts > self.max_retries {
                        if self.max_retries == 0 {
                            return Err(e);
                        }
                        return Err(StoreError::MaxRetriesExceeded {
                            attempts,
                            last_error: e.to_string(),
                        });
                    }

                    tracing::warn!(
                        index = %self.index,
                        attempt = attempts,
                        backoff_ms = backoff.as_millis(),
                        error = %e,
                        "Bulk request failed, retrying"
                    );

                    tokio::time::sleep(backoff).await;
                    backoff = std::cmp::min(backoff * 2, MAX_BACKOFF);
                }
            }
        }
    }
}

#[async_trait]
impl IndexStore for ElasticsearchStore {
    async fn info(&self) -> Result<ClusterInfo> {
        let response = self.request(Method::GET, "/").send().await?;

        if !response.status().is_success() {
            return Err(StoreError::Status {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let root: RootResponse = response.json().await?;
        Ok(ClusterInfo {
            cluster_name: root.cluster_name,
            version: root.version.number,
        })
    }

    async fn bulk_write(&self, batch: &Batch) -> Result<BulkOutcome> {
        if batch.is_empty() {
            return Ok(BulkOutcome::empty());
        }

        let body = render_bulk_body(&self.index, batch)?;
        let body = body.as_str();
        self.with_retry(|| self.send_bulk(body)).await
    }
}

/// Prefix a scheme when missing and strip trailing slashes
pub fn normalize_host(host: &str) -> Result<String> {
    let host = host.trim();
    if host.is_empty() {
        return Err(StoreError::InvalidEndpoint(host.to_string()));
    }

    let with_scheme = if host.contains("://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    };

    reqwest::Url::parse(&with_scheme)
        .map_err(|_| StoreError::InvalidEndpoint(host.to_string()))?;

    Ok(with_scheme.trim_end_matches('/').to_string())
}

/// NDJSON body with a `create` action per document
pub fn render_bulk_body(index: &str, batch: &Batch) -> Result<String> {
    let action = serde_json::to_string(&serde_json::json!({ "create": { "_index": index } }))?;

    let mut body = String::with_capacity(batch.len() * 512);
    for document in &batch.documents {
        body.push_str(&action);
        body.push('\n');
        body.push_str(&serde_json::to_string(document)?);
        body.push('\n');
    }
    Ok(body)
}

// ===== Response Types =====

#[derive(Debug, Deserialize)]
struct RootResponse {
    cluster_name: String,
    version: VersionInfo,
}

#[derive(Debug, Deserialize)]
struct VersionInfo {
    number: String,
}

#[derive(Debug, Deserialize)]
struct BulkResponse {
    #[serde(default)]
    items: Vec<HashMap<String, BulkItem>>,
}

#[derive(Debug, Deserialize)]
struct BulkItem {
    status: u16,
    #[serde(default)]
    error: Option<BulkItemErrorBody>,
}

#[derive(Debug, Deserialize)]
struct BulkItemErrorBody {
    #[serde(rename = "type", default)]
    error_type: String,
    #[serde(default)]
    reason: Option<String>,
}

impl BulkResponse {
    fn into_outcome(self) -> BulkOutcome {
        let mut outcome = BulkOutcome::empty();

        for item in self.items.into_iter().flat_map(|op| op.into_values()) {
            let succeeded = (200..300).contains(&item.status) && item.error.is_none();
            if succeeded {
                outcome.success_count += 1;
                continue;
            }

            let (error_type, reason) = match item.error {
                Some(body) => (body.error_type, body.reason.unwrap_or_default()),
                None => ("unknown".to_string(), String::new()),
            };
            outcome.errors.push(BulkItemError {
                status: item.status,
                error_type,
                reason,
            });
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Synthesizer;
    use crate::pipeline::batch::BatchAssembler;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn test_config(host: &str) -> StoreConfig {
        StoreConfig {
            host: host.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("localhost:9200").unwrap(), "http://localhost:9200");
        assert_eq!(
            normalize_host("https://es.internal:9200/").unwrap(),
            "https://es.internal:9200"
        );
        assert!(matches!(
            normalize_host("  "),
            Err(StoreError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn test_render_bulk_body_uses_create_actions() {
        let mut assembler = BatchAssembler::with_rng(
            Arc::new(Synthesizer::default()),
            3,
            StdRng::seed_from_u64(9),
        );
        let batch = assembler.assemble();
        let body = render_bulk_body("test-logs", &batch).unwrap();

        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(body.ends_with('\n'));
        for pair in lines.chunks(2) {
            let action: serde_json::Value = serde_json::from_str(pair[0]).unwrap();
            assert_eq!(action["create"]["_index"], "test-logs");
            let source: serde_json::Value = serde_json::from_str(pair[1]).unwrap();
            assert!(source["@timestamp"].is_string());
        }
    }

    #[test]
    fn test_bulk_response_outcome() {
        let raw = r#"{
            "took": 3,
            "errors": true,
            "items": [
                {"create": {"_index": "logs", "status": 201}},
                {"create": {"_index": "logs", "status": 409,
                    "error": {"type": "version_conflict_engine_exception", "reason": "document already exists"}}},
                {"create": {"_index": "logs", "status": 201}}
            ]
        }"#;
        let parsed: BulkResponse = serde_json::from_str(raw).unwrap();
        let outcome = parsed.into_outcome();

        assert_eq!(outcome.success_count, 2);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].status, 409);
        assert_eq!(outcome.errors[0].error_type, "version_conflict_engine_exception");
    }

    #[tokio::test]
    async fn test_empty_batch_skips_request() {
        // Nothing listens on port 1; an empty batch must not touch the network
        let store = ElasticsearchStore::new(&test_config("127.0.0.1:1"), "logs").unwrap();
        let batch = BatchAssembler::new(Arc::new(Synthesizer::default()), 0).assemble();

        let outcome = store.bulk_write(&batch).await.unwrap();
        assert_eq!(outcome, BulkOutcome::empty());
    }

    #[tokio::test]
    async fn test_unreachable_store_is_transport_error() {
        let store = ElasticsearchStore::new(&test_config("127.0.0.1:1"), "logs").unwrap();
        let batch = BatchAssembler::new(Arc::new(Synthesizer::default()), 1).assemble();

        let result = store.bulk_write(&batch).await;
        assert!(matches!(result, Err(StoreError::Http(_))));
    }
}
