use anyhow::{Context, Result};
use clap::Parser;
use joulefreq::{Cli, Config, Pipeline};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    if verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    } else if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut config = Config::load_from(cli.config.as_deref())?;
    cli.apply_to_config(&mut config);
    config.validate()?;

    if !config.output.color {
        colored::control::set_override(false);
    }

    if cli.verbose {
        eprintln!("Configuration: {:?}", config);
    }

    let source = cli.source_or(&config).to_string();
    Pipeline::new(config)
        .run(&source)
        .with_context(|| format!("could not analyze {}", source))?;

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("Error: analysis failed: {:#}", e);
        std::process::exit(1);
    }
}
