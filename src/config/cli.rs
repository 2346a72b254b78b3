use crate::config::toml_config::TomlConfig;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Validate the given codes once and print the results as JSON
    Check {
        #[arg(required = true)]
        codes: Vec<String>,
    },
    /// Read one request per line from stdin and answer each with a JSON line
    Serve {
        /// Reload the master data every N seconds (0 disables)
        #[arg(long)]
        reload_interval: Option<u64>,
    },
}

#[derive(Debug, Clone, Parser)]
#[command(name = "hsn-validator")]
#[command(about = "Validate HSN classification codes against a master data file")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Master data file (CSV or TSV); overrides the config file
    #[arg(long)]
    pub data: Option<String>,

    #[arg(long)]
    pub code_column: Option<String>,

    #[arg(long)]
    pub description_column: Option<String>,

    /// Disable keyword and code-prefix guardrails
    #[arg(long)]
    pub no_guardrails: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    /// Load the config file (or defaults) and apply command-line overrides.
    pub fn resolve(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };

        if let Some(data) = &self.data {
            config.data.path = data.clone();
        }
        if let Some(column) = &self.code_column {
            config.data.code_column = column.clone();
        }
        if let Some(column) = &self.description_column {
            config.data.description_column = column.clone();
        }
        if self.no_guardrails {
            config.guardrails.enabled = false;
        }
        if let Command::Serve {
            reload_interval: Some(secs),
        } = self.command
        {
            config.service.reload_interval_seconds = secs;
        }

        config.validate()?;
        Ok(config)
    }
}
