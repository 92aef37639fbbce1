/*!
PostgreSQL sequence DDL and reversible sequence migrations for Rust.

`pgsequence` renders `CREATE SEQUENCE`, `ALTER SEQUENCE` and `DROP SEQUENCE`
statements from typed options and runs them on a provided database
connection. Every client implementing [`AsyncClient`] gets the
[`SequenceMethods`] extension trait; a tokio-postgres `Client` implements it
out of the box.

Sequence changes can also be kept as versioned `.toml` scripts and applied with
the [`Migrator`], which records applied scripts in a changelog table and rolls
them back by inverting their commands. Only `create_sequence` has an inverse;
rolling back a script that alters or drops a sequence fails before anything is
executed.

## Usage

- Scripts must be named `{version}_{name}.toml` and hold an array of
  `[[commands]]` tables with `verb`, `name` and the verb's options.
- Scripts can be applied either from Rust code or via `pgsequence_cli`.

### Example
```rust,ignore
use pgsequence::{find_script_files, load_scripts, version_compare, AsyncDriver, Config, Migrator};

let mut scripts = Vec::new();
load_scripts(&mut scripts, find_script_files("./sequences")?, pgsequence::SIMPLE_FILENAME_PATTERN)?;

let mut driver = AsyncDriver::connect("postgres://localhost/shop").await?;
let mut migrator = Migrator::new(Config::default(), version_compare);
migrator.set_scripts(scripts)?;
migrator.read_changelog(driver.get_async_client()).await?;
migrator.check_changelog()?;
migrator.make_plan()?;
for plan in migrator.plans() {
    migrator.apply_plan(driver.get_async_client(), plan).await?;
}
```
*/

mod changelog;
mod drivers;
mod migrator;
mod sequence;
#[cfg(test)]
mod testing;

pub use changelog::Changelog;
pub use drivers::AsyncClient;
#[cfg(feature = "tokio-postgres")]
pub use drivers::AsyncDriver;
pub use migrator::{Config, Direction, MigrationPlan, Migrator, MigratorError};
pub use sequence::SequenceMethods;

pub use pgsequence_core::command::{CommandError, CommandRecorder, CommandVerb, SequenceCommand};
pub use pgsequence_core::ident::quote_table_name;
pub use pgsequence_core::script::{
    find_script_files, load_scripts, simple_compare, version_compare, ScriptError,
    SequenceScript, SIMPLE_FILENAME_PATTERN,
};
pub use pgsequence_core::sequence::{
    AlterSequenceOptions, CreateSequenceOptions, DropBehavior, DropSequenceOptions, Restart,
};
