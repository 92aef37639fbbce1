use crate::command::{CommandError, CommandRecorder, CommandVerb, SequenceCommand};
use crate::sequence::{AlterSequenceOptions, CreateSequenceOptions, DropSequenceOptions};
use regex::Regex;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use version_compare::Cmp;
use walkdir::{DirEntry, WalkDir};

/// An Error occurred while loading sequence scripts
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("invalid regex pattern")]
    InvalidRegex(regex::Error),

    #[error("invalid script path `{path}`")]
    InvalidScriptPath {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid script file `{path}`")]
    InvalidScriptFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("wrong filename format of script `{file_stem}`")]
    InvalidFilename { file_stem: String },

    #[error("invalid TOML in script `{version} {name}`")]
    InvalidToml {
        version: String,
        name: String,
        source: toml::de::Error,
    },

    #[error("invalid command #{index} in script `{version} {name}`")]
    InvalidCommand {
        version: String,
        name: String,
        index: usize,
        source: CommandError,
    },

    #[error("invalid options of command #{index} in script `{version} {name}`")]
    InvalidOptions {
        version: String,
        name: String,
        index: usize,
        source: toml::de::Error,
    },

    #[error("versions `{version}` must be unique (check `{name1}` and `{name2}`)")]
    RepeatedVersion {
        version: String,
        name1: String,
        name2: String,
    },
}

#[derive(Deserialize)]
struct ScriptFile {
    #[serde(default)]
    commands: Vec<CommandEntry>,
}

#[derive(Deserialize)]
struct CommandEntry {
    verb: String,
    name: String,
    #[serde(flatten)]
    options: toml::Table,
}

/// A versioned list of sequence commands loaded from a `.toml` file.
#[derive(Clone, Debug, PartialEq)]
pub struct SequenceScript {
    version: String,
    name: String,
    checksum: String,
    commands: Vec<SequenceCommand>,
}

impl SequenceScript {
    /// Parse a script from its TOML source.
    ///
    /// ```toml
    /// [[commands]]
    /// verb = "create_sequence"
    /// name = "order_id_seq"
    /// start = 1000
    /// ```
    pub fn parse(version: &str, name: &str, source: &str) -> Result<SequenceScript, ScriptError> {
        let mut hasher = Sha256::new();
        hasher.update(source);
        let checksum = format!("{:x}", hasher.finalize());

        let file: ScriptFile = toml::from_str(source).map_err(|e| ScriptError::InvalidToml {
            version: version.to_string(),
            name: name.to_string(),
            source: e,
        })?;

        let mut commands = Vec::with_capacity(file.commands.len());
        for (index, entry) in file.commands.into_iter().enumerate() {
            let verb =
                CommandVerb::from_str(&entry.verb).map_err(|e| ScriptError::InvalidCommand {
                    version: version.to_string(),
                    name: name.to_string(),
                    index,
                    source: e,
                })?;
            let options = toml::Value::Table(entry.options);
            let invalid_options = |e| ScriptError::InvalidOptions {
                version: version.to_string(),
                name: name.to_string(),
                index,
                source: e,
            };
            let command = match verb {
                CommandVerb::CreateSequence => SequenceCommand::Create {
                    name: entry.name,
                    options: options
                        .try_into::<CreateSequenceOptions>()
                        .map_err(invalid_options)?,
                },
                CommandVerb::AlterSequence => SequenceCommand::Alter {
                    name: entry.name,
                    options: options
                        .try_into::<AlterSequenceOptions>()
                        .map_err(invalid_options)?,
                },
                CommandVerb::DropSequence => SequenceCommand::Drop {
                    name: entry.name,
                    options: options
                        .try_into::<DropSequenceOptions>()
                        .map_err(invalid_options)?,
                },
            };
            commands.push(command);
        }

        Ok(SequenceScript {
            version: version.to_string(),
            name: name.to_string(),
            checksum,
            commands,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    pub fn checksum32(&self) -> &str {
        &self.checksum[0..8]
    }

    pub fn commands(&self) -> &[SequenceCommand] {
        &self.commands
    }

    /// Replay the script's commands into a fresh recorder.
    pub fn recorder(&self) -> CommandRecorder {
        CommandRecorder::replay(self.commands.iter().cloned())
    }

    pub fn is_reversible(&self) -> bool {
        self.commands.iter().all(SequenceCommand::is_reversible)
    }
}

impl std::fmt::Display for SequenceScript {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(fmt, "{} {} ({})", self.version, self.name, self.checksum32())
    }
}

/// Find sequence scripts on file system recursively across given a location
pub fn find_script_files(
    location: impl AsRef<Path>,
) -> Result<impl Iterator<Item = PathBuf>, ScriptError> {
    let location: &Path = location.as_ref();
    let location = location
        .canonicalize()
        .map_err(|err| ScriptError::InvalidScriptPath {
            path: location.to_path_buf(),
            source: err,
        })?;

    let file_paths = WalkDir::new(location)
        .into_iter()
        .filter_map(Result::ok)
        .map(DirEntry::into_path)
        .filter(|entry| {
            entry.is_file()
                && match entry.extension() {
                    Some(ext) => ext == OsStr::new("toml"),
                    None => false,
                }
        });

    Ok(file_paths)
}

/// Simple regex pattern for `{version}_{name}.toml` filename naming convention.
///
/// The version part must be alphanumeric with optional dots and dashes.
/// For example, `1.0.0-001`, `20240201T1123`, `00001`.
///
/// The name part must be alphanumeric with optional dots, dashes, and underscores.
/// For example, `create_order_seq`, `restart_invoice_seq`.
pub static SIMPLE_FILENAME_PATTERN: &str = r"^([[:alnum:].\-]+)_([[:alnum:]._\-]+)$";

/// Default comparator for script versions. Usually requires fixed size of version parts.
pub fn simple_compare(a: &str, b: &str) -> Ordering {
    a.cmp(b)
}

/// Compare two versions using the `version_compare` crate.
/// Allow semver naming conventions.
///
/// For example, 1.0.0, 5.0.0, 5.3.0, 10.2.3, 10.10.1 will maintain the appropriate order.
pub fn version_compare(a: &str, b: &str) -> Ordering {
    let a = version_compare::Version::from(a);
    let b = version_compare::Version::from(b);
    match (a, b) {
        (Some(l), Some(r)) => match l.compare(r) {
            Cmp::Lt | Cmp::Le => Ordering::Less,
            Cmp::Eq => Ordering::Equal,
            Cmp::Gt | Cmp::Ge | Cmp::Ne => Ordering::Greater,
        },
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

fn load_script(regex: &Regex, path: &Path) -> Result<SequenceScript, ScriptError> {
    let source = std::fs::read_to_string(path).map_err(|e| {
        let path = path.to_owned();
        match e.kind() {
            std::io::ErrorKind::NotFound => ScriptError::InvalidScriptPath { path, source: e },
            _ => ScriptError::InvalidScriptFile { path, source: e },
        }
    })?;

    let file_stem = path
        .file_stem()
        .and_then(|os_str| os_str.to_str())
        .ok_or_else(|| ScriptError::InvalidScriptPath {
            path: path.to_owned(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, "Invalid file name"),
        })?;
    let invalid_filename = || ScriptError::InvalidFilename {
        file_stem: file_stem.to_string(),
    };
    let captures = regex.captures(file_stem).ok_or_else(invalid_filename)?;
    let version = captures.get(1).ok_or_else(invalid_filename)?.as_str();
    let name = captures.get(2).ok_or_else(invalid_filename)?.as_str();

    log::debug!("loading sequence script {}", path.display());
    SequenceScript::parse(version, name, &source)
}

/// Loads sequence scripts from the given paths.
pub fn load_scripts(
    scripts: &mut Vec<SequenceScript>,
    file_paths: impl Iterator<Item = PathBuf>,
    filename_pattern: &str,
) -> Result<(), ScriptError> {
    let regex = Regex::new(filename_pattern).map_err(ScriptError::InvalidRegex)?;
    for path in file_paths {
        scripts.push(load_script(&regex, &path)?);
    }
    Ok(())
}

/// The script collection is ordered by version and verified.
pub fn order_scripts(
    scripts: &mut [SequenceScript],
    version_comparator: fn(&str, &str) -> Ordering,
) -> Result<(), ScriptError> {
    scripts.sort_by(|a, b| (version_comparator)(a.version(), b.version()));

    for pair in scripts.windows(2) {
        if (version_comparator)(pair[0].version(), pair[1].version()) == Ordering::Equal {
            return Err(ScriptError::RepeatedVersion {
                version: pair[1].version().to_string(),
                name1: pair[0].name().to_string(),
                name2: pair[1].name().to_string(),
            });
        }
    }
    Ok(())
}
