mod cli;

use clap::Parser;
use cli::commands;

fn main() {
    let cli = cli::Cli::parse();

    // Logs go to stderr so reports on stdout stay clean
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = commands::clean::handle(&cli) {
        commands::display_error(&err);
        std::process::exit(1);
    }
}
