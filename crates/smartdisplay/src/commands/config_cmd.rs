//! Config subcommand handlers.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let out = render_config(&cfg, global.output)?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Init { url, force } => {
            let path = config::config_path();
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }
            // Validate before writing anything.
            smartdisplay_config::parse_backend(&url)?;

            let cfg = config::starter_config(&url);
            config::save_config_to(&cfg, &path)?;
            if !global.quiet {
                eprintln!("Wrote {}", path.display());
            }
            Ok(())
        }
    }
}

/// TOML for interactive formats, serde for structured ones.
fn render_config(cfg: &Config, format: OutputFormat) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::Table | OutputFormat::Plain => toml::to_string_pretty(cfg)?,
        OutputFormat::Json => output::render_json_pretty(cfg),
        OutputFormat::JsonCompact => output::render_json_compact(cfg),
        OutputFormat::Yaml => output::render_yaml(cfg),
    })
}
