//! Defines the CLI application

use pgsequence::{MigratorError, ScriptError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(clap::Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// Database URL
    #[arg(short = 'D', long, env = "PGSEQUENCE_DB_URL")]
    pub db_url: Option<String>,

    /// Sequence scripts directory path
    #[arg(short = 'M', long, default_value = "./sequences")]
    pub scripts: PathBuf,

    /// Configuration file (TOML); command line flags take precedence
    #[arg(short = 'c', long, env = "PGSEQUENCE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Allow creating changelog table if not exists.
    #[arg(long, default_value = "false")]
    pub auto_initialize: bool,

    /// Set changelog table name
    #[arg(long)]
    pub changelog_table_name: Option<String>,

    /// Limit migration to the specified version (if not defined apply all).
    #[arg(long)]
    pub target_version: Option<String>,

    /// Order script versions with semver rules instead of plain string comparison
    #[arg(long, default_value = "false")]
    pub semver: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Show loaded configuration and sequence scripts
    ShowScripts,

    /// Print the SQL of every script without touching the database
    ShowSql(ShowSqlArgs),

    /// Display log of applied scripts
    ShowChangelog,

    /// Display pending migration plan
    ShowPlan,

    /// Check the overall status of sequence scripts
    ///
    /// The current status is printed on stdout.
    /// Returns exit code 0 for `up-to-date`, or non-zero otherwise.
    Status,

    /// Apply pending sequence scripts
    Migrate,

    /// Roll back the most recently applied scripts
    Rollback(RollbackArgs),
}

#[derive(clap::Args, Debug, Copy, Clone)]
pub struct ShowSqlArgs {
    /// Print the statements that would roll each script back
    #[arg(short = 'r', long, default_value = "false")]
    pub revert: bool,
}

#[derive(clap::Args, Debug, Copy, Clone)]
pub struct RollbackArgs {
    /// Number of applied scripts to roll back
    #[arg(short = 's', long, default_value = "1")]
    pub steps: usize,
}

/// An Error occurred during a migration cycle
#[derive(Debug, Error)]
pub enum CliError {
    #[error("unknown command")]
    UnknownCommand,

    #[error("missing database URL (use --db-url or PGSEQUENCE_DB_URL)")]
    MissingDbUrl,

    #[allow(dead_code)]
    #[error("built without a database driver (enable the `postgresql` feature)")]
    NoDriver,

    #[error(transparent)]
    IoError(std::io::Error),

    #[error(transparent)]
    MigratorError(MigratorError),

    #[error(transparent)]
    TimeError(time::Error),
}

impl From<MigratorError> for CliError {
    fn from(err: MigratorError) -> CliError {
        CliError::MigratorError(err)
    }
}

impl From<ScriptError> for CliError {
    fn from(err: ScriptError) -> CliError {
        CliError::MigratorError(MigratorError::ScriptError(err))
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> CliError {
        CliError::IoError(err)
    }
}

impl From<time::error::InvalidFormatDescription> for CliError {
    fn from(err: time::error::InvalidFormatDescription) -> CliError {
        CliError::TimeError(time::Error::InvalidFormatDescription(err))
    }
}

impl From<time::error::Format> for CliError {
    fn from(err: time::error::Format) -> CliError {
        CliError::TimeError(time::Error::Format(err))
    }
}
