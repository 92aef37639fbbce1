#[cfg(feature = "tokio-postgres")]
mod tokio_postgres;

use crate::changelog::Changelog;
use crate::migrator::{MigrationPlan, MigratorError};
use async_trait::async_trait;
use pgsequence_core::ident;

/// Capabilities the host connection provides.
///
/// Statements are executed exactly as given; errors of the underlying
/// connection are returned unchanged.
#[async_trait]
pub trait AsyncClient: Send {
    /// Execute a single statement and return the number of affected rows.
    async fn execute(&mut self, sql: &str) -> Result<u64, MigratorError>;

    fn quote_table_name(&self, name: &str) -> String {
        ident::quote_table_name(name)
    }

    /// Drop any cached type information after DDL changed the catalog.
    async fn reload_type_map(&mut self) -> Result<(), MigratorError>;

    async fn get_changelog(
        &mut self,
        log_table_name: &str,
        auto_initialize: bool,
    ) -> Result<Vec<Changelog>, MigratorError>;

    /// Run every command of the plan and insert or delete its changelog row
    /// in one transaction, then reload the type map.
    async fn apply_plan(
        &mut self,
        log_table_name: &str,
        plan: &MigrationPlan,
    ) -> Result<(), MigratorError>;
}

#[cfg(feature = "tokio-postgres")]
pub struct AsyncDriver {
    client: ::tokio_postgres::Client,
}

#[cfg(feature = "tokio-postgres")]
impl AsyncDriver {
    pub async fn connect(db_url: &str) -> Result<Self, MigratorError> {
        let (client, connection) = ::tokio_postgres::connect(db_url, ::tokio_postgres::NoTls).await?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                log::error!("connection error: {}", e);
            }
        });
        Ok(Self { client })
    }

    pub fn get_async_client(&mut self) -> &mut impl AsyncClient {
        &mut self.client
    }
}
