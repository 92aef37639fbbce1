use super::AsyncClient;
use crate::changelog::Changelog;
use crate::migrator::{Direction, MigrationPlan, MigratorError};
use async_trait::async_trait;
use tokio_postgres::error::SqlState;
use tokio_postgres::Client;

pub(crate) const CREATE_TABLE_QUERY: &str = "CREATE TABLE IF NOT EXISTS %LOG_TABLE_NAME%(
    version text NOT NULL PRIMARY KEY,
    name text,
    checksum text NOT NULL,
    apply_by text,
    applied_at timestamptz
);";

pub(crate) const GET_LOG_QUERY: &str =
    "SELECT version, name, checksum, apply_by, applied_at FROM %LOG_TABLE_NAME%;";

pub(crate) const INSERT_LOG_QUERY: &str = "INSERT INTO %LOG_TABLE_NAME% (version, name, checksum, apply_by, applied_at) VALUES ($1, $2, $3, $4, clock_timestamp());";

pub(crate) const DELETE_LOG_QUERY: &str = "DELETE FROM %LOG_TABLE_NAME% WHERE version = $1;";

fn log_query(query: &str, log_table_name: &str) -> String {
    query.replace("%LOG_TABLE_NAME%", log_table_name)
}

#[async_trait]
impl AsyncClient for Client {
    async fn execute(&mut self, sql: &str) -> Result<u64, MigratorError> {
        Ok(Client::execute(self, sql, &[]).await?)
    }

    async fn reload_type_map(&mut self) -> Result<(), MigratorError> {
        self.clear_type_cache();
        Ok(())
    }

    async fn get_changelog(
        &mut self,
        log_table_name: &str,
        auto_initialize: bool,
    ) -> Result<Vec<Changelog>, MigratorError> {
        if auto_initialize {
            self.batch_execute(&log_query(CREATE_TABLE_QUERY, log_table_name))
                .await?;
        }

        let rows = match self
            .query(&log_query(GET_LOG_QUERY, log_table_name), &[])
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                return match e.as_db_error() {
                    Some(db_error) if db_error.code().eq(&SqlState::UNDEFINED_TABLE) => {
                        Err(MigratorError::NoLogTable())
                    }
                    _ => Err(MigratorError::PgError(e)),
                }
            }
        };

        let mut log = Vec::with_capacity(rows.len());
        for row in rows.into_iter() {
            log.push(Changelog::new(
                row.try_get(0)?,
                row.try_get(1)?,
                row.try_get(2)?,
                row.try_get(3)?,
                row.try_get(4)?,
            ));
        }
        Ok(log)
    }

    async fn apply_plan(
        &mut self,
        log_table_name: &str,
        plan: &MigrationPlan,
    ) -> Result<(), MigratorError> {
        let statements: Vec<String> = plan
            .commands()
            .iter()
            .map(|command| command.to_sql_with(|name| self.quote_table_name(name)))
            .collect();

        let transaction = self.transaction().await?;
        for sql in statements.iter() {
            log::debug!("{sql}");
            transaction.execute(sql.as_str(), &[]).await?;
        }
        let log = plan.log();
        match plan.direction() {
            Direction::Up => {
                transaction
                    .execute(
                        &log_query(INSERT_LOG_QUERY, log_table_name),
                        &[&log.version(), &log.name(), &log.checksum(), &log.apply_by()],
                    )
                    .await?;
            }
            Direction::Down => {
                transaction
                    .execute(
                        &log_query(DELETE_LOG_QUERY, log_table_name),
                        &[&log.version()],
                    )
                    .await?;
            }
        }
        transaction.commit().await?;
        self.clear_type_cache();
        Ok(())
    }
}
