//! In-memory client recording every statement, for unit tests.

use crate::changelog::Changelog;
use crate::drivers::AsyncClient;
use crate::migrator::{Direction, MigrationPlan, MigratorError};
use async_trait::async_trait;

#[derive(Debug, Default)]
pub(crate) struct RecordingClient {
    pub statements: Vec<String>,
    pub type_map_reloads: usize,
    pub changelog: Vec<Changelog>,
    /// Statements starting with this prefix fail.
    pub fail_on: Option<String>,
    /// Reading the changelog fails like a missing log table.
    pub missing_log_table: bool,
}

impl RecordingClient {
    fn check(&self, sql: &str) -> Result<(), MigratorError> {
        match &self.fail_on {
            Some(prefix) if sql.starts_with(prefix.as_str()) => Err(MigratorError::DriverError(
                format!("statement failed: {sql}").into(),
            )),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl AsyncClient for RecordingClient {
    async fn execute(&mut self, sql: &str) -> Result<u64, MigratorError> {
        self.check(sql)?;
        self.statements.push(sql.to_string());
        Ok(0)
    }

    async fn reload_type_map(&mut self) -> Result<(), MigratorError> {
        self.type_map_reloads += 1;
        Ok(())
    }

    async fn get_changelog(
        &mut self,
        _log_table_name: &str,
        auto_initialize: bool,
    ) -> Result<Vec<Changelog>, MigratorError> {
        if self.missing_log_table && !auto_initialize {
            return Err(MigratorError::NoLogTable());
        }
        Ok(self.changelog.clone())
    }

    async fn apply_plan(
        &mut self,
        _log_table_name: &str,
        plan: &MigrationPlan,
    ) -> Result<(), MigratorError> {
        // Statements only land once the whole plan went through.
        let mut pending = Vec::with_capacity(plan.commands().len());
        for command in plan.commands() {
            let sql = command.to_sql_with(|name| self.quote_table_name(name));
            self.check(&sql)?;
            pending.push(sql);
        }
        self.statements.extend(pending);
        match plan.direction() {
            Direction::Up => self.changelog.push(plan.log().clone()),
            Direction::Down => self
                .changelog
                .retain(|log| log.version() != plan.log().version()),
        }
        self.type_map_reloads += 1;
        Ok(())
    }
}
