// Pass Protector - Application Entry Point
//
// Parses CLI arguments, initializes structured logging (with a filter that
// never emits password values), and dispatches to the command handler.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pass_protector::cli::{execute, Cli};
use pass_protector::PassError;

#[tokio::main]
async fn main() {
    // RUST_LOG=pass_protector=debug for verbose output. Logs go to stderr so
    // stdout stays clean for piping copied values.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pass_protector=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match execute(cli.command).await {
        Ok(()) => {}
        Err(PassError::Reported) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
