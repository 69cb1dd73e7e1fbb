//! Handles settings for the application. Configuration is read from
//! `config/splitwise.toml` (or the file given with `--config`) and from
//! `SPLITWISE_*` environment variables, e.g. `SPLITWISE_SERVER__PORT=8080`.
use clap::Parser;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "config/splitwise.toml";

#[derive(Debug, Parser)]
#[command(name = "splitwise", version, about = "Shared expense splitting service")]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    #[default]
    Memory,
    /// Path of the database file, created when missing.
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Server {
    pub bind: String,
    pub port: u16,
    pub database: Database,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3000,
            database: Database::Memory,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub server: Server,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let args = Args::parse();
        let path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
        Self::from_sources(path)
    }

    fn from_sources(path: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("SPLITWISE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
