//! Recording of sequence commands and their inversion for rollbacks.

use crate::ident::quote_table_name;
use crate::sequence::{
    alter_sequence_sql, create_sequence_sql, drop_sequence_sql, AlterSequenceOptions,
    CreateSequenceOptions, DropSequenceOptions,
};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    /// The command has no inverse, the migration cannot be rolled back.
    #[error("{verb} is irreversible (sequence `{name}`)")]
    IrreversibleMigration { verb: CommandVerb, name: String },

    #[error("invalid sequence command `{verb}`")]
    InvalidVerb { verb: String },
}

#[derive(Ord, PartialOrd, Eq, PartialEq, Clone, Copy, Debug, Hash)]
pub enum CommandVerb {
    CreateSequence,
    AlterSequence,
    DropSequence,
}

impl FromStr for CommandVerb {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<CommandVerb, CommandError> {
        match s {
            "create_sequence" => Ok(CommandVerb::CreateSequence),
            "alter_sequence" => Ok(CommandVerb::AlterSequence),
            "drop_sequence" => Ok(CommandVerb::DropSequence),
            _ => Err(CommandError::InvalidVerb { verb: s.into() }),
        }
    }
}

impl fmt::Display for CommandVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandVerb::CreateSequence => write!(f, "create_sequence"),
            CommandVerb::AlterSequence => write!(f, "alter_sequence"),
            CommandVerb::DropSequence => write!(f, "drop_sequence"),
        }
    }
}

/// One recorded sequence operation with its arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SequenceCommand {
    Create {
        name: String,
        options: CreateSequenceOptions,
    },
    Alter {
        name: String,
        options: AlterSequenceOptions,
    },
    Drop {
        name: String,
        options: DropSequenceOptions,
    },
}

impl SequenceCommand {
    pub fn verb(&self) -> CommandVerb {
        match self {
            SequenceCommand::Create { .. } => CommandVerb::CreateSequence,
            SequenceCommand::Alter { .. } => CommandVerb::AlterSequence,
            SequenceCommand::Drop { .. } => CommandVerb::DropSequence,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            SequenceCommand::Create { name, .. }
            | SequenceCommand::Alter { name, .. }
            | SequenceCommand::Drop { name, .. } => name,
        }
    }

    pub fn is_reversible(&self) -> bool {
        matches!(self, SequenceCommand::Create { .. })
    }

    /// Compute the command that undoes this one.
    ///
    /// Only a create can be undone: dropping a freshly created sequence
    /// restores the previous state. An alter does not know the values it
    /// replaced and a drop loses the sequence with its current value.
    pub fn invert(&self) -> Result<SequenceCommand, CommandError> {
        match self {
            SequenceCommand::Create { name, .. } => Ok(SequenceCommand::Drop {
                name: name.clone(),
                options: DropSequenceOptions::default(),
            }),
            SequenceCommand::Alter { name, .. } | SequenceCommand::Drop { name, .. } => {
                Err(CommandError::IrreversibleMigration {
                    verb: self.verb(),
                    name: name.clone(),
                })
            }
        }
    }

    /// Render the statement with the given quoting function.
    pub fn to_sql_with(&self, quote: impl Fn(&str) -> String) -> String {
        match self {
            SequenceCommand::Create { name, options } => create_sequence_sql(&quote(name), options),
            SequenceCommand::Alter { name, options } => alter_sequence_sql(&quote(name), options),
            SequenceCommand::Drop { name, options } => drop_sequence_sql(&quote(name), options),
        }
    }

    /// Render the statement with PostgreSQL identifier quoting.
    pub fn to_sql(&self) -> String {
        self.to_sql_with(quote_table_name)
    }
}

impl fmt::Display for SequenceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.verb(), self.name())
    }
}

/// In-memory log of the sequence commands issued by one migration run.
#[derive(Clone, Debug, Default)]
pub struct CommandRecorder {
    commands: Vec<SequenceCommand>,
}

impl CommandRecorder {
    pub fn new() -> Self {
        CommandRecorder::default()
    }

    /// Rebuild a recorder from a stored list of commands.
    pub fn replay(commands: impl IntoIterator<Item = SequenceCommand>) -> Self {
        let mut recorder = CommandRecorder::new();
        for command in commands {
            recorder.record(command);
        }
        recorder
    }

    pub fn record(&mut self, command: SequenceCommand) {
        log::trace!("recording {command}");
        self.commands.push(command);
    }

    pub fn create_sequence(&mut self, name: impl Into<String>, options: CreateSequenceOptions) {
        self.record(SequenceCommand::Create {
            name: name.into(),
            options,
        });
    }

    pub fn alter_sequence(&mut self, name: impl Into<String>, options: AlterSequenceOptions) {
        self.record(SequenceCommand::Alter {
            name: name.into(),
            options,
        });
    }

    pub fn drop_sequence(&mut self, name: impl Into<String>, options: DropSequenceOptions) {
        self.record(SequenceCommand::Drop {
            name: name.into(),
            options,
        });
    }

    pub fn commands(&self) -> &[SequenceCommand] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<SequenceCommand> {
        self.commands
    }

    pub fn is_reversible(&self) -> bool {
        self.commands.iter().all(SequenceCommand::is_reversible)
    }

    /// Inverse of the whole log, newest command first.
    ///
    /// Fails on the first irreversible command without returning a partial
    /// inverse.
    pub fn inverse_commands(&self) -> Result<Vec<SequenceCommand>, CommandError> {
        self.commands
            .iter()
            .rev()
            .map(SequenceCommand::invert)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::DropBehavior;

    fn create_options(start: i64) -> CreateSequenceOptions {
        CreateSequenceOptions {
            start,
            ..Default::default()
        }
    }

    #[test]
    fn verb_from_str() {
        assert_eq!(
            CommandVerb::from_str("create_sequence").unwrap(),
            CommandVerb::CreateSequence
        );
        assert_eq!(
            CommandVerb::from_str("alter_sequence").unwrap(),
            CommandVerb::AlterSequence
        );
        assert_eq!(
            CommandVerb::from_str("drop_sequence").unwrap(),
            CommandVerb::DropSequence
        );
        assert_eq!(
            CommandVerb::from_str("rename_sequence"),
            Err(CommandError::InvalidVerb {
                verb: "rename_sequence".to_string()
            })
        );
        assert_eq!(CommandVerb::AlterSequence.to_string(), "alter_sequence");
    }

    #[test]
    fn new_recorder_is_empty() {
        assert!(CommandRecorder::new().commands().is_empty());
    }

    #[test]
    fn records_commands_in_order() {
        let mut recorder = CommandRecorder::new();
        recorder.create_sequence("test_seq", create_options(1000));
        recorder.alter_sequence(
            "test_seq",
            AlterSequenceOptions {
                increment_by: Some(2),
                ..Default::default()
            },
        );
        recorder.drop_sequence(
            "test_seq",
            DropSequenceOptions {
                if_exists: true,
                ..Default::default()
            },
        );

        let verbs: Vec<CommandVerb> = recorder.commands().iter().map(|c| c.verb()).collect();
        assert_eq!(
            verbs,
            vec![
                CommandVerb::CreateSequence,
                CommandVerb::AlterSequence,
                CommandVerb::DropSequence
            ]
        );
        assert_eq!(
            recorder.commands()[0],
            SequenceCommand::Create {
                name: "test_seq".to_string(),
                options: create_options(1000),
            }
        );
    }

    #[test]
    fn records_duplicates() {
        let mut recorder = CommandRecorder::new();
        recorder.create_sequence("test_seq", CreateSequenceOptions::default());
        recorder.create_sequence("test_seq", CreateSequenceOptions::default());
        assert_eq!(
            recorder
                .commands()
                .iter()
                .filter(|c| c.verb() == CommandVerb::CreateSequence)
                .count(),
            2
        );
    }

    #[test]
    fn create_inverts_to_default_drop() {
        let create = SequenceCommand::Create {
            name: "test_seq".to_string(),
            options: create_options(1000),
        };
        let inverse = create.invert().unwrap();
        assert_eq!(
            inverse,
            SequenceCommand::Drop {
                name: "test_seq".to_string(),
                options: DropSequenceOptions {
                    if_exists: false,
                    drop_behavior: Some(DropBehavior::Restrict),
                },
            }
        );
        assert_eq!(inverse.to_sql(), "DROP SEQUENCE \"test_seq\" RESTRICT");
    }

    #[test]
    fn alter_and_drop_are_irreversible() {
        let alter = SequenceCommand::Alter {
            name: "test_seq".to_string(),
            options: AlterSequenceOptions::default(),
        };
        assert_eq!(
            alter.invert(),
            Err(CommandError::IrreversibleMigration {
                verb: CommandVerb::AlterSequence,
                name: "test_seq".to_string(),
            })
        );

        let drop = SequenceCommand::Drop {
            name: "test_seq".to_string(),
            options: DropSequenceOptions::default(),
        };
        let err = drop.invert().unwrap_err();
        assert_eq!(
            err.to_string(),
            "drop_sequence is irreversible (sequence `test_seq`)"
        );
    }

    #[test]
    fn inverse_commands_reverse_order() {
        let mut recorder = CommandRecorder::new();
        recorder.create_sequence("first_seq", CreateSequenceOptions::default());
        recorder.create_sequence("second_seq", CreateSequenceOptions::default());
        assert!(recorder.is_reversible());

        let names: Vec<String> = recorder
            .inverse_commands()
            .unwrap()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(names, vec!["second_seq", "first_seq"]);
    }

    #[test]
    fn inverse_commands_fail_fast() {
        let recorder = CommandRecorder::replay(vec![
            SequenceCommand::Create {
                name: "first_seq".to_string(),
                options: CreateSequenceOptions::default(),
            },
            SequenceCommand::Alter {
                name: "first_seq".to_string(),
                options: AlterSequenceOptions::default(),
            },
        ]);
        assert!(!recorder.is_reversible());
        assert!(matches!(
            recorder.inverse_commands(),
            Err(CommandError::IrreversibleMigration {
                verb: CommandVerb::AlterSequence,
                ..
            })
        ));
    }

    #[test]
    fn to_sql_with_custom_quoting() {
        let command = SequenceCommand::Drop {
            name: "seq".to_string(),
            options: DropSequenceOptions {
                if_exists: true,
                drop_behavior: None,
            },
        };
        assert_eq!(
            command.to_sql_with(|name| format!("public.{name}")),
            "DROP SEQUENCE IF EXISTS public.seq"
        );
    }
}
