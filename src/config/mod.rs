//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "brusio";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_FEED_PAGE_SIZE: u32 = 10;
const DEFAULT_CACHE_TTL_SECS: u64 = 20;

/// Command-line arguments for the brusio binary.
#[derive(Debug, Parser)]
#[command(name = "brusio", version, about = "Brusio community blog server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "BRUSIO_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP service.
    Serve(ServeArgs),
    /// Apply pending database migrations and exit.
    #[command(name = "migrate")]
    Migrate(MigrateArgs),
    /// Manage community groups.
    Group(GroupArgs),
}

#[derive(Debug, Args, Clone)]
pub struct GroupArgs {
    #[command(subcommand)]
    pub command: GroupCommand,
}

#[derive(Debug, Subcommand, Clone)]
pub enum GroupCommand {
    /// Provision a new group.
    Add(GroupAddArgs),
    /// List existing groups.
    List,
}

#[derive(Debug, Args, Clone)]
pub struct GroupAddArgs {
    /// Display title of the group.
    #[arg(long, value_name = "TITLE")]
    pub title: String,

    /// URL-safe slug; derived from the title when omitted.
    #[arg(long, value_name = "SLUG")]
    pub slug: Option<String>,

    /// Free-form description.
    #[arg(long, value_name = "TEXT", default_value = "")]
    pub description: String,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct MigrateArgs {
    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,

    /// Override the number of posts per feed page.
    #[arg(long = "feed-page-size", value_name = "N")]
    pub feed_page_size: Option<u32>,

    /// Override the global feed cache TTL in seconds.
    #[arg(long = "cache-ttl-secs", value_name = "SECS")]
    pub cache_ttl_secs: Option<u64>,

    /// Disable the global feed response cache.
    #[arg(long = "no-cache", action = clap::ArgAction::SetTrue)]
    pub no_cache: bool,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read configuration: {0}")]
    Source(#[from] config::ConfigError),
    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            graceful_shutdown_secs: DEFAULT_GRACEFUL_SHUTDOWN_SECS,
        }
    }
}

impl ServerSettings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn graceful_shutdown(&self) -> Duration {
        Duration::from_secs(self.graceful_shutdown_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: DEFAULT_DB_MAX_CONNECTIONS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: LogLevel,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    /// Posts per feed page, shared by every feed variant.
    pub page_size: u32,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_FEED_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub logging: LoggingSettings,
    pub feed: FeedSettings,
    pub cache: CacheSettings,
}

impl Settings {
    fn validate(&self) -> Result<(), SettingsError> {
        if self.database.url.trim().is_empty() {
            return Err(SettingsError::Invalid {
                message: "database.url must be set (file, BRUSIO_DATABASE__URL, or --database-url)"
                    .to_string(),
            });
        }
        if self.feed.page_size == 0 {
            return Err(SettingsError::Invalid {
                message: "feed.page_size must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Parse CLI arguments and produce settings with overrides applied.
pub fn load_with_cli() -> Result<(CliArgs, Settings), SettingsError> {
    let cli = CliArgs::parse();
    let mut settings = load(cli.config_file.as_deref())?;

    match &cli.command {
        Some(Command::Serve(args)) => apply_serve_overrides(&mut settings, &args.overrides),
        Some(Command::Migrate(args)) => {
            if let Some(url) = &args.database_url {
                settings.database.url = url.clone();
            }
        }
        Some(Command::Group(_)) | None => {}
    }

    settings.validate()?;
    Ok((cli, settings))
}

/// Load settings from the layered sources, without CLI overrides.
pub fn load(config_file: Option<&std::path::Path>) -> Result<Settings, SettingsError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = config_file {
        builder = builder.add_source(File::from(path));
    }

    builder = builder.add_source(Environment::with_prefix("BRUSIO").separator("__"));

    let settings = builder.build()?.try_deserialize::<Settings>()?;
    Ok(settings)
}

fn apply_serve_overrides(settings: &mut Settings, overrides: &ServeOverrides) {
    if let Some(host) = &overrides.server_host {
        settings.server.host = host.clone();
    }
    if let Some(port) = overrides.server_port {
        settings.server.port = port;
    }
    if let Some(url) = &overrides.database_url {
        settings.database.url = url.clone();
    }
    if let Some(page_size) = overrides.feed_page_size {
        settings.feed.page_size = page_size;
    }
    if let Some(ttl) = overrides.cache_ttl_secs {
        settings.cache.ttl_secs = ttl;
    }
    if overrides.no_cache {
        settings.cache.enabled = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_section() {
        let settings = Settings::default();
        assert_eq!(settings.server.bind_address(), "127.0.0.1:3000");
        assert_eq!(settings.feed.page_size, 10);
        assert_eq!(settings.cache.ttl_secs, 20);
        assert!(settings.cache.enabled);
        assert_eq!(settings.logging.level, LogLevel::Info);
        assert_eq!(settings.logging.format, LogFormat::Compact);
    }

    #[test]
    fn validation_requires_database_url() {
        let settings = Settings::default();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.database.url = "postgres://localhost/brusio".to_string();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn group_subcommand_parses() {
        let cli = CliArgs::try_parse_from([
            "brusio",
            "group",
            "add",
            "--title",
            "Rust Enthusiasts",
            "--slug",
            "rustaceans",
        ])
        .unwrap();

        let Some(Command::Group(args)) = cli.command else {
            panic!("expected the group subcommand");
        };
        let GroupCommand::Add(add) = args.command else {
            panic!("expected group add");
        };
        assert_eq!(add.title, "Rust Enthusiasts");
        assert_eq!(add.slug.as_deref(), Some("rustaceans"));
        assert_eq!(add.description, "");
    }

    #[test]
    fn serve_overrides_take_precedence() {
        let mut settings = Settings::default();
        settings.database.url = "postgres://localhost/brusio".to_string();

        let overrides = ServeOverrides {
            server_host: Some("0.0.0.0".to_string()),
            server_port: Some(8080),
            feed_page_size: Some(25),
            cache_ttl_secs: Some(5),
            no_cache: true,
            ..ServeOverrides::default()
        };
        apply_serve_overrides(&mut settings, &overrides);

        assert_eq!(settings.server.bind_address(), "0.0.0.0:8080");
        assert_eq!(settings.feed.page_size, 25);
        assert_eq!(settings.cache.ttl_secs, 5);
        assert!(!settings.cache.enabled);
    }
}
