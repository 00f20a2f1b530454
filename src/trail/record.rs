use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Free-form JSON object kept verbatim and in source order.
pub type FreeForm = Map<String, Value>;

/// One CloudTrail event.
///
/// Only `eventID` is required since it becomes the search document id.
/// `responseElements` and other unlisted fields are dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub event_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub user_agent: String,
    #[serde(rename = "eventID")]
    pub event_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub event_source: String,
    #[serde(rename = "sourceIPAddress", default, deserialize_with = "null_as_empty")]
    pub source_ip_address: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub event_type: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub event_version: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub event_time: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub aws_region: String,
    #[serde(rename = "requestID", default, deserialize_with = "null_as_empty")]
    pub request_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub recipient_account_id: String,
    #[serde(default)]
    pub user_identity: Option<FreeForm>,
    #[serde(default)]
    pub request_parameters: Option<FreeForm>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
