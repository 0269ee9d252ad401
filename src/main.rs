use std::io;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use librib::config::Config;
use librib::shell::{Session, ShellOptions};

fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    // Initialize logging; RUST_LOG directives win over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::default().add_directive(LevelFilter::from_level(config.log_level).into())
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    tracing::info!("Opening routing table {}", config.table_file.display());

    let mut session = match Session::open(&config.table_file, ShellOptions::from(&config)) {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("Could not parse routing table: {}", e);
            return Err(e.into());
        }
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    session.run(stdin.lock(), &mut stdout.lock())?;
    Ok(())
}
