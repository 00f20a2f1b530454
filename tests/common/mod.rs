#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{Request, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use traildash::blob::{FetchError, ObjectFetcher};
use traildash::queue::{MessageQueue, QueueError, ReceivedMessage};

pub const BUCKET: &str = "trail-bucket";

/// Queue held entirely in memory. Records every delete and send.
#[derive(Default)]
pub struct MemoryQueue {
    pending: Mutex<VecDeque<ReceivedMessage>>,
    deleted: Mutex<Vec<String>>,
    sent: Mutex<Vec<String>>,
    fail_receive: bool,
    fail_delete: bool,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_receive: true,
            ..Self::default()
        }
    }

    /// Delivers messages normally but refuses every delete.
    pub fn failing_delete() -> Self {
        Self {
            fail_delete: true,
            ..Self::default()
        }
    }

    pub fn push(&self, message_id: &str, body: String, receipt_handle: &str) {
        self.pending.lock().unwrap().push_back(ReceivedMessage {
            message_id: Some(message_id.to_string()),
            body,
            receipt_handle: receipt_handle.to_string(),
        });
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageQueue for MemoryQueue {
    async fn receive(&self) -> Result<Option<ReceivedMessage>, QueueError> {
        if self.fail_receive {
            return Err(QueueError::Receive("connection refused".to_string()));
        }
        Ok(self.pending.lock().unwrap().pop_front())
    }

    async fn delete(&self, receipt_handle: &str) -> Result<(), QueueError> {
        if self.fail_delete {
            return Err(QueueError::Delete("access denied".to_string()));
        }
        self.deleted
            .lock()
            .unwrap()
            .push(receipt_handle.to_string());
        Ok(())
    }

    async fn send(&self, body: &str) -> Result<(), QueueError> {
        self.sent.lock().unwrap().push(body.to_string());
        Ok(())
    }
}

/// Object store held in memory, counting fetches.
#[derive(Default)]
pub struct MemoryFetcher {
    objects: Mutex<HashMap<(String, String), Bytes>>,
    fetches: AtomicUsize,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, bucket: &str, key: &str, bytes: impl Into<Bytes>) {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), bytes.into());
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectFetcher for MemoryFetcher {
    async fn fetch(&self, bucket: &str, key: &str) -> Result<Bytes, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    async fn list(&self, bucket: &str, prefix: Option<&str>) -> Result<Vec<String>, FetchError> {
        let mut keys: Vec<String> = self
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter(|(b, k)| b == bucket && prefix.map_or(true, |p| k.starts_with(p)))
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}

/// SNS envelope around a CloudTrail delivery notification.
pub fn notification_body(bucket: &str, keys: &[&str]) -> String {
    let inner = json!({ "s3Bucket": bucket, "s3ObjectKey": keys });
    json!({
        "Type": "Notification",
        "MessageId": "sns-message-1",
        "TopicArn": "arn:aws:sns:us-east-1:123456789012:cloudtrail",
        "Message": inner.to_string(),
    })
    .to_string()
}

pub fn validation_body() -> String {
    json!({
        "Type": "Notification",
        "MessageId": "sns-validation-1",
        "Message": "CloudTrail validation message.",
    })
    .to_string()
}

pub fn event(id: &str, name: &str) -> Value {
    json!({
        "eventVersion": "1.02",
        "eventID": id,
        "eventName": name,
        "eventSource": "ec2.amazonaws.com",
        "eventTime": "2015-01-01T00:00:00Z",
        "eventType": "AwsApiCall",
        "awsRegion": "us-east-1",
        "sourceIPAddress": "10.0.0.1",
        "userAgent": "aws-cli/1.7",
        "requestID": format!("req-{}", id),
        "recipientAccountId": "123456789012",
        "userIdentity": { "type": "IAMUser", "userName": "alice" },
        "requestParameters": { "instancesSet": { "items": [{ "instanceId": "i-1" }] } },
        "responseElements": null,
    })
}

/// Gzip a `{"Records": [...]}` file the way CloudTrail stores it.
pub fn trail_file(records: &[Value]) -> Vec<u8> {
    let file = json!({ "Records": records }).to_string();
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(file.as_bytes()).unwrap();
    encoder.finish().unwrap()
}

/// What the fake search engine saw.
#[derive(Default)]
pub struct FakeEsState {
    pub bulk_bodies: Mutex<Vec<String>>,
    pub docs: Mutex<HashMap<String, Value>>,
    pub bulk_reply: Mutex<Option<(StatusCode, String)>>,
}

/// A search engine stand-in on an ephemeral port.
pub struct FakeEs {
    pub base_url: String,
    pub state: Arc<FakeEsState>,
}

impl FakeEs {
    pub async fn start() -> Self {
        let state = Arc::new(FakeEsState::default());

        let app = Router::new()
            .route("/cloudtrail/event/_bulk", post(bulk))
            .fallback(echo)
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn reply_with(&self, status: StatusCode, body: Value) {
        *self.state.bulk_reply.lock().unwrap() = Some((status, body.to_string()));
    }

    pub fn doc_count(&self) -> usize {
        self.state.docs.lock().unwrap().len()
    }

    pub fn bulk_requests(&self) -> Vec<String> {
        self.state.bulk_bodies.lock().unwrap().clone()
    }
}

async fn bulk(State(state): State<Arc<FakeEsState>>, body: String) -> Response {
    state.bulk_bodies.lock().unwrap().push(body.clone());

    if let Some((status, reply)) = state.bulk_reply.lock().unwrap().clone() {
        return (status, reply).into_response();
    }

    let lines: Vec<&str> = body.lines().collect();
    let mut items = Vec::new();
    let mut docs = state.docs.lock().unwrap();
    for pair in lines.chunks(2) {
        let action: Value = serde_json::from_str(pair[0]).unwrap();
        let id = action["index"]["_id"].as_str().unwrap().to_string();
        let doc: Value = serde_json::from_str(pair[1]).unwrap();
        docs.insert(id.clone(), doc);
        items.push(json!({ "index": { "_id": id, "status": 201 } }));
    }

    axum::Json(json!({ "took": 1, "errors": false, "items": items })).into_response()
}

/// Reflects the request back so proxy tests can see what arrived upstream.
async fn echo(request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();

    let reflected = json!({
        "method": parts.method.as_str(),
        "path": parts.uri.path(),
        "query": parts.uri.query(),
        "host": parts.headers.get("host").and_then(|h| h.to_str().ok()),
        "custom": parts.headers.get("x-dashboard").and_then(|h| h.to_str().ok()),
        "body": String::from_utf8_lossy(&body),
    });

    let mut response = (StatusCode::CREATED, reflected.to_string()).into_response();
    response
        .headers_mut()
        .insert("x-upstream", HeaderValue::from_static("fake-es"));
    response
}
