use super::bulk::{build_bulk_body, inspect_response, INDEX_PATH};
use super::{IndexError, IndexSink, LoadError, LoadOutcome, PartialLoadError};
use crate::config::IndexConfig;
use crate::trail::LogRecord;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use tracing::debug;

/// Bulk loader for an Elasticsearch node.
#[derive(Debug, Clone)]
pub struct ElasticsearchIndex {
    client: reqwest::Client,
    bulk_url: String,
    strict: bool,
}

impl ElasticsearchIndex {
    pub fn new(config: &IndexConfig) -> Result<Self, LoadError> {
        let client = reqwest::Client::builder().build()?;

        Ok(Self {
            client,
            bulk_url: format!("{}/{}/_bulk", config.base_url, INDEX_PATH),
            strict: config.strict_bulk,
        })
    }

    pub fn bulk_url(&self) -> &str {
        &self.bulk_url
    }
}

#[async_trait]
impl IndexSink for ElasticsearchIndex {
    async fn load(&self, records: &[LogRecord]) -> Result<LoadOutcome, IndexError> {
        if records.is_empty() {
            return Ok(LoadOutcome { indexed: 0 });
        }

        let body = build_bulk_body(records).map_err(LoadError::Encode)?;

        let response = self
            .client
            .post(&self.bulk_url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(LoadError::from)?;

        let status = response.status();
        let text = response.text().await.map_err(LoadError::from)?;

        if status != StatusCode::OK {
            return Err(LoadError::Rejected {
                status: status.as_u16(),
                body: text,
            }
            .into());
        }

        if self.strict {
            let failures = inspect_response(&text).map_err(LoadError::MalformedResponse)?;
            if let Some(failures) = failures {
                return Err(PartialLoadError {
                    failed: failures.failed,
                    total: records.len(),
                    first_reason: failures.first_reason,
                }
                .into());
            }
        }

        debug!(url = %self.bulk_url, records = records.len(), "Upload OK");

        Ok(LoadOutcome {
            indexed: records.len(),
        })
    }
}
