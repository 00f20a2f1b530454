use clap::{CommandFactory, Parser, Subcommand};
use traildash::config::{Config, Settings};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "traildash", version)]
#[command(
    about = "Ships AWS CloudTrail logs into Elasticsearch and serves a guarded dashboard",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest from SQS and serve the dashboard (default)
    Run,
    /// Queue every log file already in a bucket for ingestion
    Backfill {
        /// S3 bucket holding the CloudTrail logs
        #[arg(long, env = "AWS_S3_BUCKET")]
        bucket: String,

        /// Only queue keys under this prefix
        prefix: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match Config::from_settings(cli.settings) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}\n", e);
            let _ = Cli::command().print_help();
            std::process::exit(1);
        }
    };

    let default_filter = if config.debug {
        "traildash=debug,tower_http=debug"
    } else {
        "traildash=info,tower_http=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Some(Commands::Run) | None => {
            traildash::cli::run::run(config).await?;
        }
        Some(Commands::Backfill { bucket, prefix }) => {
            let queued =
                traildash::cli::backfill::backfill(&config, &bucket, prefix.as_deref()).await?;
            println!("{} items queued", queued);
        }
    }

    Ok(())
}
