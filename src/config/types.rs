use clap::builder::FalseyValueParser;
use clap::{Args, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_ES_URL: &str = "http://127.0.0.1:9200";
pub const DEFAULT_LISTEN: &str = "0.0.0.0:7000";
pub const DEFAULT_WEB_ROOT: &str = "kibana";
pub const DEFAULT_MAX_CONCURRENCY: usize = 256;
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 5;
pub const DEFAULT_TLS_DIR: &str = "ssl";
pub const DEFAULT_TLS_HOSTS: &str = "localhost";

/// Raw settings as read from flags or the environment.
///
/// Nothing here is validated; [`Config::from_settings`] turns this into the
/// immutable [`Config`] every task receives.
#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// AWS SQS queue URL
    #[arg(long = "queue-url", env = "AWS_SQS_URL")]
    pub queue_url: Option<String>,

    /// AWS region (SQS and S3 regions must match)
    #[arg(long, env = "AWS_REGION", default_value = DEFAULT_REGION)]
    pub region: String,

    /// Elasticsearch URL
    #[arg(long = "es-url", env = "ES_URL", default_value = DEFAULT_ES_URL)]
    pub es_url: String,

    /// Listen IP and port for the web interface
    #[arg(long, env = "WEB_LISTEN", default_value = DEFAULT_LISTEN)]
    pub listen: String,

    /// Directory holding the dashboard assets
    #[arg(long = "web-root", env = "WEB_ROOT", default_value = DEFAULT_WEB_ROOT)]
    pub web_root: PathBuf,

    /// Basic auth user for the web interface
    #[arg(long = "auth-user", env = "WEB_AUTH_USER")]
    pub auth_user: Option<String>,

    /// Basic auth password for the web interface
    #[arg(long = "auth-password", env = "WEB_AUTH_PASSWORD", hide_env_values = true)]
    pub auth_password: Option<String>,

    /// Maximum number of proxied requests handled at once
    #[arg(long = "max-concurrency", env = "WEB_MAX_CONCURRENCY", default_value_t = DEFAULT_MAX_CONCURRENCY)]
    pub max_concurrency: usize,

    /// Enable debugging output
    #[arg(long, env = "DEBUG", value_parser = FalseyValueParser::new())]
    pub debug: bool,

    /// Keep finished SQS messages instead of deleting them
    #[arg(long = "sqs-persist", env = "SQS_PERSIST", value_parser = FalseyValueParser::new())]
    pub sqs_persist: bool,

    /// Treat per-document bulk failures as errors
    #[arg(long = "strict-bulk", env = "ES_STRICT_BULK", value_parser = FalseyValueParser::new())]
    pub strict_bulk: bool,

    /// Seconds to pause after a failed ingestion step
    #[arg(long = "retry-delay-secs", env = "RETRY_DELAY_SECS", default_value_t = DEFAULT_RETRY_DELAY_SECS)]
    pub retry_delay_secs: u64,

    /// TLS mode for the web interface
    #[arg(long = "tls", env = "TLS_MODE", value_enum, default_value_t = TlsMode::Off)]
    pub tls_mode: TlsMode,

    /// Directory holding cert.pem and key.pem
    #[arg(long = "tls-dir", env = "TLS_DIR", default_value = DEFAULT_TLS_DIR)]
    pub tls_dir: PathBuf,

    /// Comma separated host names and IPs for the self-signed certificate
    #[arg(long = "tls-hosts", env = "TLS_HOSTS", default_value = DEFAULT_TLS_HOSTS)]
    pub tls_hosts: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            queue_url: None,
            region: DEFAULT_REGION.to_string(),
            es_url: DEFAULT_ES_URL.to_string(),
            listen: DEFAULT_LISTEN.to_string(),
            web_root: PathBuf::from(DEFAULT_WEB_ROOT),
            auth_user: None,
            auth_password: None,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            debug: false,
            sqs_persist: false,
            strict_bulk: false,
            retry_delay_secs: DEFAULT_RETRY_DELAY_SECS,
            tls_mode: TlsMode::Off,
            tls_dir: PathBuf::from(DEFAULT_TLS_DIR),
            tls_hosts: DEFAULT_TLS_HOSTS.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TlsMode {
    /// Plain HTTP
    Off,
    /// Load cert.pem and key.pem from the TLS directory
    Custom,
    /// Generate cert.pem and key.pem on first run if absent
    #[value(name = "self-signed", alias = "selfsigned")]
    SelfSigned,
}

/// Validated, immutable configuration shared read-only by every task.
#[derive(Debug, Clone)]
pub struct Config {
    pub queue: QueueConfig,
    pub index: IndexConfig,
    pub web: WebConfig,
    pub tls: TlsConfig,
    pub retry_delay: Duration,
    pub debug: bool,
}

#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub url: String,
    pub region: String,
    /// Skip deleting messages after a successful load
    pub persist: bool,
}

#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// Search engine base URL without a trailing slash
    pub base_url: String,
    pub strict_bulk: bool,
}

#[derive(Debug, Clone)]
pub struct WebConfig {
    pub listen: SocketAddr,
    pub root: PathBuf,
    pub auth: Option<BasicCredentials>,
    pub max_concurrency: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub user: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub mode: TlsMode,
    pub dir: PathBuf,
    pub hosts: Vec<String>,
}

impl TlsConfig {
    pub fn cert_path(&self) -> PathBuf {
        self.dir.join("cert.pem")
    }

    pub fn key_path(&self) -> PathBuf {
        self.dir.join("key.pem")
    }
}
