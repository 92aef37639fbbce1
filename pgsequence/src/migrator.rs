use crate::changelog::Changelog;
use crate::drivers::AsyncClient;
use pgsequence_core::command::{CommandError, SequenceCommand};
use pgsequence_core::script::{order_scripts, ScriptError, SequenceScript};
use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
#[cfg(feature = "tokio-postgres")]
use tokio_postgres::error::Error as PgError;

/// An Error occurred during a migration cycle
#[derive(Debug, Error)]
pub enum MigratorError {
    #[error(transparent)]
    ScriptError(ScriptError),

    #[error(transparent)]
    CommandError(CommandError),

    #[error("unknown target version {version} (try {})", .available.as_deref().unwrap_or("-"))]
    UnknownTarget {
        version: String,
        available: Option<String>,
    },

    #[error("no pgsequence_log table available")]
    NoLogTable(),

    #[error("unknown migration in database `{log}`")]
    UnknownMigration { log: Changelog },

    #[error("missing migration in database `{script}`")]
    MissingMigration { script: SequenceScript },

    #[error("conflicted migration - db: `{log}`, script: `{script}`")]
    ConflictedMigration {
        log: Changelog,
        script: SequenceScript,
    },

    #[error("cannot read config file `{path}`")]
    ConfigFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[cfg(feature = "toml")]
    #[error("invalid config file `{path}`")]
    InvalidConfig {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[cfg(feature = "tokio-postgres")]
    #[error(transparent)]
    PgError(PgError),

    #[error("driver error: {0}")]
    DriverError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<ScriptError> for MigratorError {
    fn from(err: ScriptError) -> MigratorError {
        MigratorError::ScriptError(err)
    }
}

impl From<CommandError> for MigratorError {
    fn from(err: CommandError) -> MigratorError {
        MigratorError::CommandError(err)
    }
}

#[cfg(feature = "tokio-postgres")]
impl From<PgError> for MigratorError {
    fn from(err: PgError) -> MigratorError {
        MigratorError::PgError(err)
    }
}

#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Allow create pgsequence log table if not exists.
    pub auto_initialize: bool,

    /// Table name for pgsequence_log table (should include DB schema).
    pub log_table_name: Option<String>,

    /// Limit migration to specified version (if not defined apply all).
    pub target_version: Option<String>,

    /// Optional description of the application that applies migrations.
    pub apply_by: Option<String>,
}

impl Config {
    pub fn effective_log_table_name(&self) -> &str {
        self.log_table_name.as_deref().unwrap_or("pgsequence_log")
    }

    /// Read the configuration from a TOML file. Missing keys keep their defaults.
    #[cfg(feature = "toml")]
    pub fn from_toml_file(path: impl Into<PathBuf>) -> Result<Config, MigratorError> {
        let path = path.into();
        let source = std::fs::read_to_string(&path).map_err(|e| MigratorError::ConfigFile {
            path: path.clone(),
            source: e,
        })?;
        toml::from_str(&source).map_err(|e| MigratorError::InvalidConfig { path, source: e })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// Applies sequence scripts in version order and rolls them back by
/// inverting their recorded commands.
pub struct Migrator {
    config: Config,
    version_comparator: fn(&str, &str) -> Ordering,
    scripts: Vec<SequenceScript>,
    changelog: Vec<Changelog>,
    plans: Vec<MigrationPlan>,
}

impl Migrator {
    pub fn new(config: Config, version_comparator: fn(&str, &str) -> Ordering) -> Self {
        Migrator {
            config,
            version_comparator,
            scripts: Vec::new(),
            changelog: Vec::new(),
            plans: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn scripts(&self) -> &Vec<SequenceScript> {
        &self.scripts
    }

    pub fn changelog(&self) -> &Vec<Changelog> {
        &self.changelog
    }

    pub fn plans(&self) -> &Vec<MigrationPlan> {
        &self.plans
    }

    pub fn set_scripts(&mut self, mut scripts: Vec<SequenceScript>) -> Result<(), MigratorError> {
        order_scripts(&mut scripts, self.version_comparator)?;
        self.scripts = scripts;
        Ok(())
    }

    /// Read changelog from the database, ordered by version.
    pub async fn read_changelog(
        &mut self,
        client: &mut impl AsyncClient,
    ) -> Result<(), MigratorError> {
        let mut changelog = client
            .get_changelog(
                self.config.effective_log_table_name(),
                self.config.auto_initialize,
            )
            .await?;
        changelog.sort_by(|a, b| (self.version_comparator)(a.version(), b.version()));
        log::debug!("read {} changelog entries", changelog.len());
        self.changelog = changelog;
        self.plans.clear();
        Ok(())
    }

    fn find_script(&self, version: &str) -> Option<&SequenceScript> {
        self.scripts
            .binary_search_by(|a| (self.version_comparator)(a.version(), version))
            .ok()
            .map(|index| &self.scripts[index])
    }

    fn is_applied(&self, version: &str) -> bool {
        self.changelog
            .binary_search_by(|a| (self.version_comparator)(a.version(), version))
            .is_ok()
    }

    fn within_target(&self, version: &str) -> bool {
        match &self.config.target_version {
            Some(target_version) => matches!(
                (self.version_comparator)(version, target_version),
                Ordering::Less | Ordering::Equal
            ),
            None => true,
        }
    }

    /// Verify the changelog against the loaded scripts.
    pub fn check_changelog(&self) -> Result<(), MigratorError> {
        // Check if target version is known.
        if let Some(target_version) = &self.config.target_version {
            if let Err(index) = self
                .scripts
                .binary_search_by(|a| (self.version_comparator)(a.version(), target_version))
            {
                return Err(MigratorError::UnknownTarget {
                    version: target_version.clone(),
                    available: if 1 <= index {
                        Some(self.scripts[index - 1].version().to_string())
                    } else {
                        None
                    },
                });
            }
        }

        // Check if all applied migrations in the database are known.
        for log in self.changelog.iter() {
            match self.find_script(log.version()) {
                Some(script) => {
                    if log.checksum() != script.checksum() {
                        return Err(MigratorError::ConflictedMigration {
                            log: log.clone(),
                            script: script.clone(),
                        });
                    }
                }
                None => return Err(MigratorError::UnknownMigration { log: log.clone() }),
            }
        }

        // Check that no older script was skipped.
        if let Some(last) = self.changelog.last() {
            for script in self.scripts.iter().take_while(|s| {
                (self.version_comparator)(s.version(), last.version()) == Ordering::Less
            }) {
                if !self.is_applied(script.version()) {
                    return Err(MigratorError::MissingMigration {
                        script: script.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Plan every script newer than the last applied one, up to the target version.
    pub fn make_plan(&mut self) -> Result<(), MigratorError> {
        let last_version = self.changelog.last().map(|log| log.version().to_string());
        let plans: Vec<MigrationPlan> = self
            .scripts
            .iter()
            .skip_while(|s| match &last_version {
                Some(last_version) => matches!(
                    (self.version_comparator)(s.version(), last_version),
                    Ordering::Less | Ordering::Equal
                ),
                None => false,
            })
            .take_while(|s| self.within_target(s.version()))
            .map(|script| MigrationPlan {
                script: script.clone(),
                direction: Direction::Up,
                commands: script.commands().to_vec(),
                log: Changelog::new(
                    script.version().to_string(),
                    Some(script.name().to_string()),
                    script.checksum().to_string(),
                    self.config.apply_by.clone(),
                    None,
                ),
            })
            .collect();
        self.plans = plans;
        Ok(())
    }

    /// Plan the rollback of the last `steps` applied scripts, newest first.
    ///
    /// Nothing is planned when any of them holds an irreversible command.
    pub fn make_rollback_plan(&mut self, steps: usize) -> Result<(), MigratorError> {
        self.plans.clear();
        let mut plans = Vec::new();
        for log in self.changelog.iter().rev().take(steps) {
            let script = self
                .find_script(log.version())
                .ok_or_else(|| MigratorError::UnknownMigration { log: log.clone() })?;
            let commands = script.recorder().inverse_commands()?;
            plans.push(MigrationPlan {
                script: script.clone(),
                direction: Direction::Down,
                commands,
                log: log.clone(),
            });
        }
        self.plans = plans;
        Ok(())
    }

    /// Apply one plan. Its commands and the changelog update are committed
    /// together, so a failing command leaves neither behind.
    pub async fn apply_plan(
        &self,
        client: &mut impl AsyncClient,
        plan: &MigrationPlan,
    ) -> Result<(), MigratorError> {
        client
            .apply_plan(self.config.effective_log_table_name(), plan)
            .await?;
        match plan.direction() {
            Direction::Up => log::info!("applied {}", plan.script()),
            Direction::Down => log::info!("reverted {}", plan.script()),
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct MigrationPlan {
    script: SequenceScript,
    direction: Direction,
    commands: Vec<SequenceCommand>,
    log: Changelog,
}

impl MigrationPlan {
    pub fn script(&self) -> &SequenceScript {
        &self.script
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn commands(&self) -> &[SequenceCommand] {
        &self.commands
    }

    /// Changelog row inserted when going up, or removed when going down.
    pub fn log(&self) -> &Changelog {
        &self.log
    }
}
