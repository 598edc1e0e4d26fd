use publisher::common::verbosity::Verbosity;
use publisher::presentation::cli::CliApp;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let app = CliApp::new();
    init_logging(app.verbosity());
    app.run()
}

/// `RUST_LOG` wins over the `-v` derived default
fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
