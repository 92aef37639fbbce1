//! Option types and SQL rendering for `CREATE`, `ALTER` and `DROP SEQUENCE`.
//!
//! Renderers take a name that is already quoted, so the caller decides how
//! identifiers are quoted (see [`crate::ident::quote_table_name`]).

use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("invalid drop behavior `{0}` (expected `cascade` or `restrict`)")]
pub struct InvalidDropBehavior(String);

/// What happens to objects that depend on a dropped sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropBehavior {
    Cascade,
    Restrict,
}

impl DropBehavior {
    pub fn as_sql(&self) -> &'static str {
        match self {
            DropBehavior::Cascade => "CASCADE",
            DropBehavior::Restrict => "RESTRICT",
        }
    }
}

impl FromStr for DropBehavior {
    type Err = InvalidDropBehavior;

    fn from_str(s: &str) -> Result<DropBehavior, InvalidDropBehavior> {
        match s {
            "cascade" => Ok(DropBehavior::Cascade),
            "restrict" => Ok(DropBehavior::Restrict),
            _ => Err(InvalidDropBehavior(s.to_string())),
        }
    }
}

impl fmt::Display for DropBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropBehavior::Cascade => write!(f, "cascade"),
            DropBehavior::Restrict => write!(f, "restrict"),
        }
    }
}

/// `RESTART` clause of `ALTER SEQUENCE`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Restart {
    /// Bare `RESTART`, back to the sequence's start value.
    Default,
    /// `RESTART WITH n`.
    With(i64),
}

/// Options of `CREATE SEQUENCE`.
///
/// The `Default` impl carries the defaults merged under every create:
/// start 1, increment 1, cache 1, no cycle.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CreateSequenceOptions {
    pub if_not_exists: bool,
    pub data_type: Option<String>,
    pub start: i64,
    pub increment_by: i64,
    pub minvalue: Option<i64>,
    pub maxvalue: Option<i64>,
    pub cache: i64,
    pub cycle: bool,
    /// `table.column` owning the sequence.
    pub owned_by: Option<String>,
}

impl Default for CreateSequenceOptions {
    fn default() -> Self {
        CreateSequenceOptions {
            if_not_exists: false,
            data_type: None,
            start: 1,
            increment_by: 1,
            minvalue: None,
            maxvalue: None,
            cache: 1,
            cycle: false,
            owned_by: None,
        }
    }
}

impl CreateSequenceOptions {
    pub fn if_not_exists(mut self, if_not_exists: bool) -> Self {
        self.if_not_exists = if_not_exists;
        self
    }

    /// Data type, e.g. `integer`; emitted as given.
    pub fn data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }

    pub fn start(mut self, start: i64) -> Self {
        self.start = start;
        self
    }

    pub fn increment_by(mut self, increment_by: i64) -> Self {
        self.increment_by = increment_by;
        self
    }

    pub fn minvalue(mut self, minvalue: i64) -> Self {
        self.minvalue = Some(minvalue);
        self
    }

    pub fn maxvalue(mut self, maxvalue: i64) -> Self {
        self.maxvalue = Some(maxvalue);
        self
    }

    pub fn cache(mut self, cache: i64) -> Self {
        self.cache = cache;
        self
    }

    pub fn cycle(mut self, cycle: bool) -> Self {
        self.cycle = cycle;
        self
    }

    /// `table.column` owning the sequence; emitted as given.
    pub fn owned_by(mut self, owned_by: impl Into<String>) -> Self {
        self.owned_by = Some(owned_by.into());
        self
    }
}

/// Options of `ALTER SEQUENCE`.
///
/// Nothing is defaulted here. Note that `minvalue`, `maxvalue`, `cycle` and
/// `owned_by` are always rendered, so leaving them out resets the sequence to
/// `NO MINVALUE`, `NO MAXVALUE`, `NO CYCLE` and `OWNED BY NONE`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlterSequenceOptions {
    pub if_exists: bool,
    pub data_type: Option<String>,
    pub increment_by: Option<i64>,
    pub minvalue: Option<i64>,
    pub maxvalue: Option<i64>,
    pub start: Option<i64>,
    #[serde(deserialize_with = "deserialize_restart")]
    pub restart: Option<Restart>,
    pub cache: Option<i64>,
    pub cycle: bool,
    pub owned_by: Option<String>,
}

/// Options of `DROP SEQUENCE`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DropSequenceOptions {
    pub if_exists: bool,
    /// `None` leaves the clause out and lets the server apply its default.
    #[serde(deserialize_with = "deserialize_drop_behavior")]
    pub drop_behavior: Option<DropBehavior>,
}

impl Default for DropSequenceOptions {
    fn default() -> Self {
        DropSequenceOptions {
            if_exists: false,
            drop_behavior: Some(DropBehavior::Restrict),
        }
    }
}

// `restart = true` is a bare RESTART, `restart = 42` restarts with a value.
fn deserialize_restart<'de, D>(deserializer: D) -> Result<Option<Restart>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawRestart {
        Flag(bool),
        With(i64),
    }

    Ok(match RawRestart::deserialize(deserializer)? {
        RawRestart::Flag(true) => Some(Restart::Default),
        RawRestart::Flag(false) => None,
        RawRestart::With(value) => Some(Restart::With(value)),
    })
}

// Anything but `cascade`/`restrict` drops the clause instead of failing.
fn deserialize_drop_behavior<'de, D>(deserializer: D) -> Result<Option<DropBehavior>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match DropBehavior::from_str(&raw) {
        Ok(behavior) => Ok(Some(behavior)),
        Err(e) => {
            log::warn!("{e}, leaving the drop behavior clause out");
            Ok(None)
        }
    }
}

fn push_min_max(sql: &mut String, minvalue: Option<i64>, maxvalue: Option<i64>) {
    match minvalue {
        Some(minvalue) => sql.push_str(&format!(" MINVALUE {minvalue}")),
        None => sql.push_str(" NO MINVALUE"),
    }
    match maxvalue {
        Some(maxvalue) => sql.push_str(&format!(" MAXVALUE {maxvalue}")),
        None => sql.push_str(" NO MAXVALUE"),
    }
}

fn push_cycle(sql: &mut String, cycle: bool) {
    sql.push_str(if cycle { " CYCLE" } else { " NO CYCLE" });
}

/// Render `CREATE SEQUENCE` for an already quoted name.
pub fn create_sequence_sql(quoted_name: &str, options: &CreateSequenceOptions) -> String {
    let mut sql = String::from("CREATE SEQUENCE");
    if options.if_not_exists {
        sql.push_str(" IF NOT EXISTS");
    }
    sql.push_str(&format!(" {quoted_name}"));

    if let Some(data_type) = &options.data_type {
        sql.push_str(&format!(" AS {data_type}"));
    }
    sql.push_str(&format!(" INCREMENT BY {}", options.increment_by));
    push_min_max(&mut sql, options.minvalue, options.maxvalue);
    sql.push_str(&format!(" START WITH {}", options.start));
    sql.push_str(&format!(" CACHE {}", options.cache));
    push_cycle(&mut sql, options.cycle);
    if let Some(owned_by) = &options.owned_by {
        sql.push_str(&format!(" OWNED BY {owned_by}"));
    }
    sql
}

/// Render `ALTER SEQUENCE` for an already quoted name.
pub fn alter_sequence_sql(quoted_name: &str, options: &AlterSequenceOptions) -> String {
    let mut sql = String::from("ALTER SEQUENCE");
    if options.if_exists {
        sql.push_str(" IF EXISTS");
    }
    sql.push_str(&format!(" {quoted_name}"));

    if let Some(data_type) = &options.data_type {
        sql.push_str(&format!(" AS {data_type}"));
    }
    if let Some(increment_by) = options.increment_by {
        sql.push_str(&format!(" INCREMENT BY {increment_by}"));
    }
    push_min_max(&mut sql, options.minvalue, options.maxvalue);
    if let Some(start) = options.start {
        sql.push_str(&format!(" START WITH {start}"));
    }
    match options.restart {
        Some(Restart::Default) => sql.push_str(" RESTART"),
        Some(Restart::With(value)) => sql.push_str(&format!(" RESTART WITH {value}")),
        None => (),
    }
    if let Some(cache) = options.cache {
        sql.push_str(&format!(" CACHE {cache}"));
    }
    push_cycle(&mut sql, options.cycle);
    match &options.owned_by {
        Some(owned_by) => sql.push_str(&format!(" OWNED BY {owned_by}")),
        None => sql.push_str(" OWNED BY NONE"),
    }
    sql
}

/// Render `DROP SEQUENCE` for an already quoted name.
pub fn drop_sequence_sql(quoted_name: &str, options: &DropSequenceOptions) -> String {
    let mut sql = String::from("DROP SEQUENCE");
    if options.if_exists {
        sql.push_str(" IF EXISTS");
    }
    sql.push_str(&format!(" {quoted_name}"));
    if let Some(drop_behavior) = options.drop_behavior {
        sql.push_str(&format!(" {}", drop_behavior.as_sql()));
    }
    sql
}
