use super::types::*;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("validation failed:\n{}", .0.join("\n"))]
    ValidationList(Vec<String>),

    #[error("validation failed: {0}")]
    Validation(String),
}

impl Config {
    /// Validate raw settings and build the immutable configuration.
    ///
    /// Every problem is reported at once rather than one per run.
    pub fn from_settings(settings: Settings) -> Result<Self, ConfigError> {
        let mut errors = Vec::new();

        let queue_url = match settings.queue_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => {
                errors.push(
                    "Must specify SQS url with --queue-url or by setting AWS_SQS_URL env var."
                        .to_string(),
                );
                String::new()
            }
        };

        if settings.region.trim().is_empty() {
            errors.push("AWS region cannot be empty".to_string());
        }

        let base_url = match validate_es_url(&settings.es_url) {
            Ok(url) => url,
            Err(e) => {
                errors.push(e);
                String::new()
            }
        };

        let listen = match settings.listen.parse::<SocketAddr>() {
            Ok(addr) => Some(addr),
            Err(e) => {
                errors.push(format!(
                    "invalid listen address '{}': {}",
                    settings.listen, e
                ));
                None
            }
        };

        let auth = match (settings.auth_user, settings.auth_password) {
            (Some(user), Some(password)) if !user.is_empty() => {
                Some(BasicCredentials { user, password })
            }
            (None, None) => None,
            _ => {
                errors.push(
                    "WEB_AUTH_USER and WEB_AUTH_PASSWORD must be set together".to_string(),
                );
                None
            }
        };

        if settings.max_concurrency == 0 {
            errors.push("max concurrency must be greater than zero".to_string());
        }

        let hosts: Vec<String> = settings
            .tls_hosts
            .split(',')
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(String::from)
            .collect();
        if settings.tls_mode == TlsMode::SelfSigned && hosts.is_empty() {
            errors.push("self-signed TLS requires at least one host in TLS_HOSTS".to_string());
        }

        if !errors.is_empty() {
            return Err(ConfigError::ValidationList(errors));
        }

        let listen = listen.ok_or_else(|| {
            ConfigError::Validation(format!("invalid listen address '{}'", settings.listen))
        })?;

        Ok(Config {
            queue: QueueConfig {
                url: queue_url,
                region: settings.region.trim().to_string(),
                persist: settings.sqs_persist,
            },
            index: IndexConfig {
                base_url,
                strict_bulk: settings.strict_bulk,
            },
            web: WebConfig {
                listen,
                root: settings.web_root,
                auth,
                max_concurrency: settings.max_concurrency,
            },
            tls: TlsConfig {
                mode: settings.tls_mode,
                dir: settings.tls_dir,
                hosts,
            },
            retry_delay: Duration::from_secs(settings.retry_delay_secs),
            debug: settings.debug,
        })
    }
}

/// Checks the search engine URL and strips any trailing slash so paths can
/// be appended directly.
fn validate_es_url(raw: &str) -> Result<String, String> {
    let url = reqwest::Url::parse(raw)
        .map_err(|e| format!("invalid Elasticsearch URL '{}': {}", raw, e))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(format!(
            "Elasticsearch URL '{}' must use http or https",
            raw
        ));
    }
    if url.host_str().is_none() {
        return Err(format!("Elasticsearch URL '{}' has no host", raw));
    }

    Ok(raw.trim_end_matches('/').to_string())
}
