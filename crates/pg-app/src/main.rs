use anyhow::Result;
use clap::Parser;
use pg_app::{cli, commands};
use pg_core::config::{PixglyphConfig, load_config};

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Charger la config, puis les overrides CLI
    let mut config = resolve_config(&cli)?;
    cli.apply_overrides(&mut config);

    // 4. Exécuter
    commands::execute(&cli.command, &config)
}

fn resolve_config(cli: &cli::Cli) -> Result<PixglyphConfig> {
    if cli.config.exists() {
        load_config(&cli.config)
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        Ok(PixglyphConfig::default())
    }
}
