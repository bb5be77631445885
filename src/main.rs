// Entrypoint for the seeding CLI.
// - Keeps `main` small: load `.env`, set up logging, parse, dispatch.
// - Exit code 0 only when every attempted operation succeeded; partial
//   failures print their summary and exit 1.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use maestro_seed::cli::{self, Cli};

fn main() -> anyhow::Result<()> {
    // `.env` is a convenience for local runs; its absence is fine.
    dotenvy::dotenv().ok();

    // Quiet by default; RUST_LOG=debug surfaces per-request diagnostics.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let code = cli::run(cli)?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
