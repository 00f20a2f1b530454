//! Elasticsearch bulk protocol: request body construction and response
//! inspection.
//!
//! Each record becomes two newline-terminated lines:
//!
//! ```text
//! {"index":{"_id":"<eventID>"}}
//! {...record...}
//! ```

use crate::trail::LogRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Index and type every record is written to.
pub const INDEX_PATH: &str = "cloudtrail/event";

#[derive(Serialize)]
struct IndexIntent<'a> {
    index: IntentTarget<'a>,
}

#[derive(Serialize)]
struct IntentTarget<'a> {
    #[serde(rename = "_id")]
    id: &'a str,
}

/// Build the newline-delimited bulk body, keyed by event id so a redelivered
/// file overwrites instead of duplicating.
pub fn build_bulk_body(records: &[LogRecord]) -> Result<String, serde_json::Error> {
    let mut body = String::new();

    for record in records {
        let intent = IndexIntent {
            index: IntentTarget {
                id: &record.event_id,
            },
        };
        body.push_str(&serde_json::to_string(&intent)?);
        body.push('\n');
        body.push_str(&serde_json::to_string(record)?);
        body.push('\n');
    }

    Ok(body)
}

#[derive(Debug, Deserialize)]
struct BulkResponse {
    #[serde(default)]
    errors: bool,
    #[serde(default)]
    items: Vec<HashMap<String, BulkItem>>,
}

#[derive(Debug, Deserialize)]
struct BulkItem {
    #[serde(default)]
    status: u16,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

/// Per-document failures found inside a 200 bulk response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkFailures {
    pub failed: usize,
    pub first_reason: Option<String>,
}

/// Look for per-item failures in a bulk response body.
///
/// Returns `None` when the response reports no errors.
pub fn inspect_response(body: &str) -> Result<Option<BulkFailures>, serde_json::Error> {
    let response: BulkResponse = serde_json::from_str(body)?;
    if !response.errors {
        return Ok(None);
    }

    let mut failed = 0;
    let mut first_reason = None;
    for item in response.items.iter().flat_map(|item| item.values()) {
        if item.error.is_none() && item.status < 300 {
            continue;
        }
        failed += 1;
        if first_reason.is_none() {
            first_reason = item.error.as_ref().map(describe_error);
        }
    }

    Ok(Some(BulkFailures {
        failed,
        first_reason,
    }))
}

fn describe_error(error: &serde_json::Value) -> String {
    match error.get("reason").and_then(|r| r.as_str()) {
        Some(reason) => reason.to_string(),
        None => error.to_string(),
    }
}
