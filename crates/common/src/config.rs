//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Staff management configuration.
    #[serde(default)]
    pub staff: StaffConfig,
    /// Scheduler configuration.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Application-wide flags.
    #[serde(default)]
    pub app: AppConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of the back office, used for generated links.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Staff management configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StaffConfig {
    /// Name of the system role every staff member receives on creation.
    #[serde(default = "default_staff_role")]
    pub system_role: String,
}

impl Default for StaffConfig {
    fn default() -> Self {
        Self {
            system_role: default_staff_role(),
        }
    }
}

/// Periodic command scheduler configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Whether the scheduler runs inside the server process.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Console program that executes scheduled commands.
    #[serde(default = "default_command_program")]
    pub command_program: String,
    /// Arguments placed before the command name.
    #[serde(default = "default_command_args")]
    pub command_args: Vec<String>,
    /// Register the hourly `demo:cleanup` command (also requires `app.demo_mode`).
    #[serde(default)]
    pub demo_cleanup: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command_program: default_command_program(),
            command_args: default_command_args(),
            demo_cleanup: false,
        }
    }
}

/// Application-wide flags.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Demo deployments periodically reset their data.
    #[serde(default)]
    pub demo_mode: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

fn default_staff_role() -> String {
    "Staff".to_string()
}

fn default_command_program() -> String {
    "bin/console".to_string()
}

const fn default_command_args() -> Vec<String> {
    Vec::new()
}

const fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `LECTERN_ENV`)
    /// 4. Environment variables with `LECTERN__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("LECTERN_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("LECTERN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("LECTERN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
