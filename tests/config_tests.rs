use clap::Parser;
use std::time::Duration;
use traildash::config::{Config, ConfigError, Settings, TlsMode};

#[derive(Parser)]
struct TestCli {
    #[command(flatten)]
    settings: Settings,
}

fn parse(args: &[&str]) -> Settings {
    let mut argv = vec!["traildash"];
    argv.extend_from_slice(args);
    TestCli::try_parse_from(argv).unwrap().settings
}

#[test]
fn test_flags_build_config() {
    let settings = parse(&[
        "--queue-url",
        "https://sqs.eu-west-1.amazonaws.com/123456789012/cloudtrail",
        "--region",
        "eu-west-1",
        "--es-url",
        "https://search.internal:9200/",
        "--listen",
        "127.0.0.1:8080",
        "--web-root",
        "/srv/kibana",
        "--max-concurrency",
        "32",
        "--sqs-persist",
        "--strict-bulk",
        "--retry-delay-secs",
        "9",
    ]);

    let config = Config::from_settings(settings).unwrap();

    assert_eq!(config.queue.region, "eu-west-1");
    assert!(config.queue.persist);
    assert_eq!(config.index.base_url, "https://search.internal:9200");
    assert!(config.index.strict_bulk);
    assert_eq!(config.web.listen, "127.0.0.1:8080".parse().unwrap());
    assert_eq!(config.web.root.to_str(), Some("/srv/kibana"));
    assert_eq!(config.web.max_concurrency, 32);
    assert!(config.web.auth.is_none());
    assert_eq!(config.retry_delay, Duration::from_secs(9));
}

#[test]
fn test_tls_flags() {
    let settings = parse(&[
        "--queue-url",
        "https://sqs.us-east-1.amazonaws.com/1/q",
        "--tls",
        "self-signed",
        "--tls-dir",
        "/etc/traildash/ssl",
        "--tls-hosts",
        "dash.example.com, 10.0.0.5",
    ]);

    let config = Config::from_settings(settings).unwrap();

    assert_eq!(config.tls.mode, TlsMode::SelfSigned);
    assert_eq!(config.tls.hosts, vec!["dash.example.com", "10.0.0.5"]);
    assert_eq!(
        config.tls.cert_path().to_str(),
        Some("/etc/traildash/ssl/cert.pem")
    );
}

#[test]
fn test_legacy_tls_mode_spelling() {
    let settings = parse(&["--tls", "selfsigned"]);
    assert_eq!(settings.tls_mode, TlsMode::SelfSigned);
}

#[test]
fn test_unknown_tls_mode_rejected() {
    let result = TestCli::try_parse_from(["traildash", "--tls", "sometimes"]);
    assert!(result.is_err());
}

#[test]
fn test_auth_flags_pair() {
    let settings = parse(&[
        "--queue-url",
        "https://sqs.us-east-1.amazonaws.com/1/q",
        "--auth-user",
        "admin",
        "--auth-password",
        "hunter2",
    ]);

    let auth = Config::from_settings(settings).unwrap().web.auth.unwrap();
    assert_eq!(auth.user, "admin");
    assert_eq!(auth.password, "hunter2");
}

#[test]
fn test_invalid_values_reported_together() {
    let settings = parse(&[
        "--queue-url",
        "https://sqs.us-east-1.amazonaws.com/1/q",
        "--es-url",
        "not a url",
        "--listen",
        "nowhere",
        "--max-concurrency",
        "0",
    ]);

    match Config::from_settings(settings) {
        Err(ConfigError::ValidationList(errors)) => assert_eq!(errors.len(), 3),
        other => panic!("expected validation errors, got {:?}", other),
    }
}

#[test]
fn test_debug_flag_reaches_config() {
    let settings = parse(&[
        "--queue-url",
        "https://sqs.us-east-1.amazonaws.com/1/q",
        "--debug",
    ]);
    assert!(Config::from_settings(settings).unwrap().debug);
}
