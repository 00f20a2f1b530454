use super::record::LogRecord;
use flate2::read::MultiGzDecoder;
use serde::Deserialize;
use std::io::Read;
use thiserror::Error;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("error decompressing CloudTrail file: {0}")]
    Gzip(#[from] std::io::Error),

    #[error("error unmarshaling CloudTrail JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct TrailFile {
    #[serde(rename = "Records")]
    records: Vec<LogRecord>,
}

/// Decode a CloudTrail log file into its records, in file order.
///
/// Gzip input is detected by its magic bytes and may span several members.
/// A single bad record fails the whole file.
pub fn parse_batch(bytes: &[u8]) -> Result<Vec<LogRecord>, ParseError> {
    if bytes.starts_with(&GZIP_MAGIC) {
        let mut decoded = Vec::new();
        MultiGzDecoder::new(bytes).read_to_end(&mut decoded)?;
        return parse_json(&decoded);
    }
    parse_json(bytes)
}

fn parse_json(bytes: &[u8]) -> Result<Vec<LogRecord>, ParseError> {
    let file: TrailFile = serde_json::from_slice(bytes)?;
    Ok(file.records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    const FILE: &str = r#"{
        "Records": [
            {
                "eventVersion": "1.02",
                "userIdentity": {"type": "IAMUser", "userName": "alice", "accountId": "123"},
                "eventTime": "2015-03-01T12:00:00Z",
                "eventSource": "ec2.amazonaws.com",
                "eventName": "RunInstances",
                "awsRegion": "us-east-1",
                "sourceIPAddress": "10.0.0.1",
                "userAgent": "console.amazonaws.com",
                "requestParameters": {"instanceType": "t2.micro", "minCount": 1},
                "responseElements": {"reservationId": "r-1"},
                "requestID": "req-1",
                "eventID": "e1",
                "eventType": "AwsApiCall",
                "recipientAccountId": "123"
            },
            {"eventID": "e2", "eventName": "DescribeInstances", "someFutureField": true}
        ]
    }"#;

    #[test]
    fn test_parse_plain_json() {
        let records = parse_batch(FILE.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].event_id, "e1");
        assert_eq!(records[0].event_name, "RunInstances");
        assert_eq!(records[0].source_ip_address, "10.0.0.1");
        assert_eq!(
            records[0].user_identity.as_ref().unwrap()["userName"],
            "alice"
        );
        assert_eq!(records[1].event_id, "e2");
    }

    #[test]
    fn test_parse_gzip() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(FILE.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();

        let records = parse_batch(&compressed).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_parse_multi_member_gzip() {
        let (head, tail) = FILE.split_at(FILE.len() / 2);
        let mut compressed = Vec::new();
        for part in [head, tail] {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(part.as_bytes()).unwrap();
            compressed.extend(encoder.finish().unwrap());
        }

        let records = parse_batch(&compressed).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].event_id, "e2");
    }

    #[test]
    fn test_one_bad_record_fails_batch() {
        let file = r#"{"Records": [{"eventID": "e1"}, {"eventName": "NoId"}]}"#;
        assert!(matches!(parse_batch(file.as_bytes()), Err(ParseError::Json(_))));
    }

    #[test]
    fn test_missing_records_field() {
        assert!(parse_batch(br#"{"records": []}"#).is_err());
    }

    #[test]
    fn test_empty_records() {
        assert!(parse_batch(br#"{"Records": []}"#).unwrap().is_empty());
    }

    #[test]
    fn test_truncated_gzip() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(FILE.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();

        assert!(parse_batch(&compressed[..compressed.len() / 2]).is_err());
    }

    #[test]
    fn test_free_form_maps_keep_order() {
        let file = r#"{"Records": [{"eventID": "e1", "requestParameters": {"z": 1, "a": {"n": [1, 2]}, "m": null}}]}"#;
        let records = parse_batch(file.as_bytes()).unwrap();

        let keys: Vec<_> = records[0]
            .request_parameters
            .as_ref()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }
}
