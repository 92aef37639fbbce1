use crate::drivers::AsyncClient;
use crate::migrator::MigratorError;
use async_trait::async_trait;
use pgsequence_core::command::SequenceCommand;
use pgsequence_core::sequence::{
    alter_sequence_sql, create_sequence_sql, drop_sequence_sql, AlterSequenceOptions,
    CreateSequenceOptions, DropSequenceOptions,
};

async fn execute_ddl<C>(client: &mut C, sql: &str) -> Result<u64, MigratorError>
where
    C: AsyncClient + ?Sized,
{
    log::debug!("{sql}");
    let rows = client.execute(sql).await?;
    client.reload_type_map().await?;
    Ok(rows)
}

/// Sequence DDL on top of any [`AsyncClient`].
///
/// Each method renders one statement with the client's identifier quoting,
/// executes it and then reloads the client's type map.
///
/// ```rust,ignore
/// use pgsequence::{AsyncDriver, CreateSequenceOptions, SequenceMethods};
///
/// let mut driver = AsyncDriver::connect("postgres://localhost/shop").await?;
/// let client = driver.get_async_client();
/// client
///     .create_sequence(
///         "order_id_seq",
///         &CreateSequenceOptions {
///             start: 1000,
///             ..Default::default()
///         },
///     )
///     .await?;
/// ```
#[async_trait]
pub trait SequenceMethods: AsyncClient {
    async fn create_sequence(
        &mut self,
        name: &str,
        options: &CreateSequenceOptions,
    ) -> Result<u64, MigratorError> {
        let sql = create_sequence_sql(&self.quote_table_name(name), options);
        execute_ddl(self, &sql).await
    }

    /// Alter a sequence. Unlike [`SequenceMethods::create_sequence`] nothing
    /// is defaulted.
    async fn alter_sequence(
        &mut self,
        name: &str,
        options: &AlterSequenceOptions,
    ) -> Result<u64, MigratorError> {
        let sql = alter_sequence_sql(&self.quote_table_name(name), options);
        execute_ddl(self, &sql).await
    }

    async fn drop_sequence(
        &mut self,
        name: &str,
        options: &DropSequenceOptions,
    ) -> Result<u64, MigratorError> {
        let sql = drop_sequence_sql(&self.quote_table_name(name), options);
        execute_ddl(self, &sql).await
    }

    /// Run a recorded command.
    async fn run_command(&mut self, command: &SequenceCommand) -> Result<u64, MigratorError> {
        match command {
            SequenceCommand::Create { name, options } => self.create_sequence(name, options).await,
            SequenceCommand::Alter { name, options } => self.alter_sequence(name, options).await,
            SequenceCommand::Drop { name, options } => self.drop_sequence(name, options).await,
        }
    }
}

impl<T: AsyncClient + ?Sized> SequenceMethods for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingClient;
    use pgsequence_core::sequence::{DropBehavior, Restart};

    #[tokio::test]
    async fn create_executes_then_reloads() {
        let mut client = RecordingClient::default();
        client
            .create_sequence(
                "order_id_seq",
                &CreateSequenceOptions {
                    start: 500,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(
            client.statements,
            vec!["CREATE SEQUENCE \"order_id_seq\" INCREMENT BY 1 NO MINVALUE NO MAXVALUE START WITH 500 CACHE 1 NO CYCLE"]
        );
        assert_eq!(client.type_map_reloads, 1);
    }

    #[tokio::test]
    async fn alter_and_drop_use_client_quoting() {
        let mut client = RecordingClient::default();
        client
            .alter_sequence(
                "sales.order_id_seq",
                &AlterSequenceOptions {
                    restart: Some(Restart::Default),
                    owned_by: Some("orders.id".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        client
            .drop_sequence(
                "sales.order_id_seq",
                &DropSequenceOptions {
                    if_exists: true,
                    drop_behavior: Some(DropBehavior::Cascade),
                },
            )
            .await
            .unwrap();

        assert_eq!(
            client.statements,
            vec![
                "ALTER SEQUENCE \"sales\".\"order_id_seq\" NO MINVALUE NO MAXVALUE RESTART NO CYCLE OWNED BY orders.id",
                "DROP SEQUENCE IF EXISTS \"sales\".\"order_id_seq\" CASCADE",
            ]
        );
        assert_eq!(client.type_map_reloads, 2);
    }

    #[tokio::test]
    async fn execution_errors_pass_through() {
        let mut client = RecordingClient {
            fail_on: Some("DROP SEQUENCE".to_string()),
            ..Default::default()
        };
        let err = client
            .drop_sequence("order_id_seq", &DropSequenceOptions::default())
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "driver error: statement failed: DROP SEQUENCE \"order_id_seq\" RESTRICT"
        );
        // The type map is only reloaded after a successful statement.
        assert_eq!(client.type_map_reloads, 0);
        assert!(client.changelog.is_empty());
    }

    #[tokio::test]
    async fn run_command_dispatches_by_verb() {
        let mut client = RecordingClient::default();
        let command = SequenceCommand::Create {
            name: "s".to_string(),
            options: CreateSequenceOptions::default(),
        };
        client.run_command(&command.invert().unwrap()).await.unwrap();
        assert_eq!(client.statements, vec!["DROP SEQUENCE \"s\" RESTRICT"]);
    }
}
