//! Ask a question about an OpenShift or Kubernetes cluster.
//!
//! Reads `OPENROUTER_KEY` (and the optional `KUBEAGENT_*` settings) from the
//! environment or a `.env` file. Prints the answer, a blank line, and the
//! usage summary on stdout. Logs go to stderr; set `RUST_LOG` to adjust.
//!
//! ```sh
//! kubeagent "list all namespaces"
//! ```

use clap::Parser;
use kubeagent_ocp::AssistConfig;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_LOG_FILTER: &str = "kubeagent=info,kubeagent_ocp=info";

/// Exit status after Ctrl-C, as a shell reports SIGINT.
const EXIT_INTERRUPTED: i32 = 130;

/// Ask a question about your OpenShift or Kubernetes cluster.
#[derive(Parser)]
#[command(name = "kubeagent", version)]
struct Cli {
    /// The question, e.g. "list all namespaces".
    question: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = match AssistConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let router = match config
        .build_engine()
        .and_then(|engine| config.build_router(engine))
    {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: failed to set up the assistant: {e}");
            std::process::exit(1);
        }
    };

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            interrupt.cancel();
        }
    });

    match router.run(&cli.question, cancel).await {
        Ok(answer) => {
            println!("{}", answer.answer);
            println!();
            println!("{}", answer.usage);
        }
        Err(e) if e.is_cancelled() => {
            eprintln!("Cancelled.");
            std::process::exit(EXIT_INTERRUPTED);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
