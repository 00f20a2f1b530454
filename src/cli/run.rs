use crate::blob::S3Fetcher;
use crate::config::Config;
use crate::index::{ElasticsearchIndex, LoadError};
use crate::pipeline::{FixedDelay, IngestionLoop};
use crate::queue::SqsQueue;
use crate::tls::{self, TlsError};
use crate::web::{self, AppState, ServerError};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("search engine client error: {0}")]
    Index(#[from] LoadError),

    #[error("TLS error: {0}")]
    Tls(#[from] TlsError),

    #[error("{0}")]
    Web(#[from] ServerError),

    #[error("web server task failed: {0}")]
    Join(#[from] JoinError),
}

/// Start the ingestion loop and the web server side by side and block until
/// a shutdown signal arrives or the server dies.
pub async fn run(config: Config) -> Result<(), RunError> {
    info!(
        queue_url = %config.queue.url,
        region = %config.queue.region,
        es_url = %config.index.base_url,
        persist = config.queue.persist,
        "Starting traildash"
    );

    let queue = Arc::new(SqsQueue::connect(&config.queue).await);
    let fetcher = Arc::new(S3Fetcher::new(config.queue.region.clone()));
    let index = Arc::new(ElasticsearchIndex::new(&config.index)?);

    let ingest = IngestionLoop::new(queue, fetcher, index, config.queue.persist)
        .with_retry_policy(FixedDelay::new(config.retry_delay));

    // Everything that can fail at startup happens before any task is spawned.
    let server_config = tls::prepare(&config.tls)?;
    let app = web::router(AppState::new(&config.web, &config.index)?, &config.web);
    let listener = web::bind(&config.web).await?;

    let ingest_handle = tokio::spawn(ingest.run());
    let mut web_handle = tokio::spawn(web::serve(listener, app, server_config));

    let outcome = tokio::select! {
        signal = shutdown_signal() => {
            info!(signal, "Shutdown signal received");
            Ok(())
        }
        result = &mut web_handle => {
            match result {
                Ok(Ok(())) => {
                    info!("Web server exited");
                    Ok(())
                }
                Ok(Err(e)) => {
                    error!(error = %e, "Web server failed");
                    Err(RunError::Web(e))
                }
                Err(e) => {
                    error!(error = %e, "Web server task panicked");
                    Err(RunError::Join(e))
                }
            }
        }
    };

    web_handle.abort();
    ingest_handle.abort();
    info!("Shutdown complete");

    outcome
}

#[cfg(unix)]
async fn shutdown_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let (Ok(mut term), Ok(mut hup)) = (
        signal(SignalKind::terminate()),
        signal(SignalKind::hangup()),
    ) else {
        let _ = tokio::signal::ctrl_c().await;
        return "SIGINT";
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => "SIGINT",
        _ = term.recv() => "SIGTERM",
        _ = hup.recv() => "SIGHUP",
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> &'static str {
    let _ = tokio::signal::ctrl_c().await;
    "ctrl-c"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_panicked_task_is_an_error() {
        let handle = tokio::spawn(async { panic!("listener gone") });
        let join_error = handle.await.unwrap_err();
        assert!(join_error.is_panic());

        let err = RunError::from(join_error);
        assert!(matches!(err, RunError::Join(_)));
        assert!(err.to_string().starts_with("web server task failed"));
    }
}
