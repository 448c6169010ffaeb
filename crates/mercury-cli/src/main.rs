use clap::Parser;
use mercury_server::ServerConfig;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let mut config = ServerConfig::load(&cli.config)?;
    if let Some(data) = &cli.data {
        config.data_path = data.clone();
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose {
            "debug"
        } else {
            config.log_filter.as_str()
        })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    commands::run_command(cli, config)
}
