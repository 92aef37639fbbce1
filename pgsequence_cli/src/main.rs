//! Main entry point for the pgsequence cli tool

mod cli;

use crate::cli::{CliError, Command};
use clap::Parser;
use cli::Cli;
use comfy_table::{Cell, Table};
#[cfg(feature = "postgresql")]
use console::{Style, Term};
#[cfg(feature = "postgresql")]
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use pgsequence::{
    find_script_files, load_scripts, simple_compare, version_compare, Changelog, Config,
    Direction, Migrator, MigratorError, SequenceCommand, SIMPLE_FILENAME_PATTERN,
};
use std::time::Instant;

fn main() {
    human_panic::setup_panic!(human_panic::Metadata::new(
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    ));
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = crate::inner_main() {
        eprintln!("{e}");
        std::process::exit(1)
    }
}

fn inner_main() -> Result<(), CliError> {
    let cli = Cli::parse();
    match cli.command {
        Some(Command::Status) => match migrator_command(&cli) {
            Ok(_) => Ok(()),
            Err(e) => {
                log::error!("{e}");
                println!(
                    "{}",
                    match e {
                        CliError::IoError(_) => "io-error",
                        CliError::MigratorError(e) => match e {
                            MigratorError::NoLogTable() => "db-uninitialized",
                            #[cfg(feature = "postgresql")]
                            MigratorError::PgError(_) => "db-error",
                            MigratorError::ScriptError(_) => "script-error",
                            _ => "internal-error",
                        },
                        _ => "internal-error",
                    }
                );
                std::process::exit(1)
            }
        },
        Some(_) => migrator_command(&cli),
        None => Err(CliError::UnknownCommand),
    }
}

fn load_config(cli: &Cli) -> Result<Config, CliError> {
    let mut config = match &cli.config {
        Some(path) => Config::from_toml_file(path)?,
        None => Config::default(),
    };
    if cli.auto_initialize {
        config.auto_initialize = true;
    }
    if let Some(changelog_table_name) = &cli.changelog_table_name {
        config.log_table_name = Some(changelog_table_name.clone());
    }
    if let Some(target_version) = &cli.target_version {
        config.target_version = Some(target_version.clone());
    }
    if config.apply_by.is_none() {
        config.apply_by = Some(format!(
            "{} {}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        ));
    }
    Ok(config)
}

fn command_list(commands: &[SequenceCommand]) -> String {
    if commands.is_empty() {
        return "-".to_string();
    }
    commands
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

fn show_scripts(migrator: &Migrator) {
    let mut table = Table::new();
    table
        .load_preset(comfy_table::presets::UTF8_FULL_CONDENSED)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS)
        .set_header(vec!["Version", "Name", "Commands", "Reversible", "Checksum"]);
    for script in migrator.scripts() {
        table.add_row(vec![
            Cell::new(script.version()),
            Cell::new(script.name()),
            Cell::new(command_list(script.commands())),
            if script.is_reversible() {
                Cell::new("yes").fg(comfy_table::Color::Green)
            } else {
                Cell::new("no").fg(comfy_table::Color::Red)
            },
            Cell::new(script.checksum32()),
        ]);
    }
    println!("Sequence scripts:\n{table}");
}

fn show_sql(migrator: &Migrator, revert: bool) -> Result<(), CliError> {
    if revert {
        for script in migrator.scripts().iter().rev() {
            let commands = script
                .recorder()
                .inverse_commands()
                .map_err(MigratorError::from)?;
            println!("-- revert {script}");
            for command in commands {
                println!("{};", command.to_sql());
            }
        }
    } else {
        for script in migrator.scripts() {
            println!("-- {script}");
            for command in script.commands() {
                println!("{};", command.to_sql());
            }
        }
    }
    Ok(())
}

fn show_plan(migrator: &Migrator) {
    if migrator.plans().is_empty() {
        println!("No pending migrations.");
    } else {
        let mut table = Table::new();
        table
            .load_preset(comfy_table::presets::UTF8_FULL_CONDENSED)
            .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS)
            .set_header(vec!["Version", "Name", "Direction", "Commands"]);
        for plan in migrator.plans() {
            table.add_row(vec![
                Cell::new(plan.script().version()),
                Cell::new(plan.script().name()),
                Cell::new(plan.direction().to_string()).fg(match plan.direction() {
                    Direction::Up => comfy_table::Color::Green,
                    Direction::Down => comfy_table::Color::Red,
                }),
                Cell::new(command_list(plan.commands())),
            ]);
        }
        if let Some(target_version) = &migrator.config().target_version {
            table.add_row(vec![
                Cell::new(target_version).fg(comfy_table::Color::Magenta),
                Cell::new(""),
                Cell::new("target").fg(comfy_table::Color::Magenta),
            ]);
        }
        println!("Pending migrations:\n{table}");
    }
}

fn show_changelog(logs: &[Changelog]) -> Result<(), CliError> {
    let mut table = Table::new();
    table
        .load_preset(comfy_table::presets::UTF8_FULL_CONDENSED)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS)
        .set_header(vec!["Version", "Name", "Checksum", "Applied by", "Applied at"]);
    if logs.is_empty() {
        table.add_row(vec![
            Cell::new(""),
            Cell::new("Log is empty.").fg(comfy_table::Color::Cyan),
        ]);
    } else {
        let format = time::format_description::parse(
            "[year]-[month]-[day] [weekday repr:short] [hour]:[minute]:[second]",
        )?;
        for log in logs {
            table.add_row(vec![
                Cell::new(log.version()).fg(comfy_table::Color::Green),
                Cell::new(log.name().unwrap_or("-")),
                Cell::new(log.checksum32()),
                Cell::new(log.apply_by().unwrap_or("-")),
                match log.applied_at() {
                    Some(ts) => Cell::new(ts.format(&format)?),
                    None => Cell::new("unknown").fg(comfy_table::Color::Yellow),
                },
            ]);
        }
    }
    println!("{table}");
    Ok(())
}

#[cfg(feature = "postgresql")]
async fn run_plans(
    migrator: &Migrator,
    driver: &mut pgsequence::AsyncDriver,
    start: &Instant,
) -> Result<(), CliError> {
    let len = migrator.plans().len();

    let green_bold = Style::new().green().bold();
    let red_bold = Style::new().red().bold();
    if 0 < len {
        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::with_template(if Term::stdout().size().1 > 80 {
                "{prefix:>12.cyan.bold} [{bar:57}] {pos}/{len} {wide_msg}"
            } else {
                "{prefix:>12.cyan.bold} [{bar:57}] {pos}/{len}"
            })
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
        );
        pb.set_prefix("Sequences");

        let mut result = Ok(());
        for plan in migrator.plans() {
            let (doing, done) = match plan.direction() {
                Direction::Up => ("Applying", "Applied"),
                Direction::Down => ("Reverting", "Reverted"),
            };
            pb.set_message(format!("{doing} {}...", plan.script()));
            result = migrator.apply_plan(driver.get_async_client(), plan).await;

            let err_text;
            let line = format!(
                "{:>12} {}",
                match &result {
                    Ok(_) => green_bold.apply_to(done),
                    Err(e) => {
                        err_text = format!("Failed - {}", e);
                        red_bold.apply_to(err_text.as_str())
                    }
                },
                plan.script(),
            );
            pb.println(line);

            if result.is_err() {
                break;
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        if result.is_ok() {
            println!(
                "{:>12} Sequences migrated in {}",
                green_bold.apply_to("Finished"),
                HumanDuration(start.elapsed())
            );
        }

        result.map_err(|e| e.into())
    } else {
        println!(
            "{:>12} No pending migrations.",
            green_bold.apply_to("Finished"),
        );
        Ok(())
    }
}

#[cfg(feature = "postgresql")]
fn database_command(cli: &Cli, mut migrator: Migrator, start: &Instant) -> Result<(), CliError> {
    let db_url = cli.db_url.as_deref().ok_or(CliError::MissingDbUrl)?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let mut driver = pgsequence::AsyncDriver::connect(db_url).await?;
        migrator.read_changelog(driver.get_async_client()).await?;
        match cli.command {
            Some(Command::ShowChangelog) => show_changelog(migrator.changelog()),
            Some(Command::ShowPlan) => {
                migrator.make_plan()?;
                println!("Loaded sequence scripts: {}", migrator.scripts().len());
                show_plan(&migrator);
                migrator.check_changelog()?;
                Ok(())
            }
            Some(Command::Status) => {
                migrator.check_changelog()?;
                migrator.make_plan()?;
                if migrator.plans().is_empty() {
                    println!("up-to-date");
                } else {
                    println!("pending-migrations");
                    std::process::exit(10);
                }
                Ok(())
            }
            Some(Command::Migrate) => {
                migrator.check_changelog()?;
                migrator.make_plan()?;
                run_plans(&migrator, &mut driver, start).await
            }
            Some(Command::Rollback(args)) => {
                migrator.check_changelog()?;
                migrator.make_rollback_plan(args.steps)?;
                run_plans(&migrator, &mut driver, start).await
            }
            _ => Err(CliError::UnknownCommand),
        }
    })
}

#[cfg(not(feature = "postgresql"))]
fn database_command(_cli: &Cli, _migrator: Migrator, _start: &Instant) -> Result<(), CliError> {
    Err(CliError::NoDriver)
}

fn migrator_command(cli: &Cli) -> Result<(), CliError> {
    let start = Instant::now();
    let config = load_config(cli)?;

    let script_files = find_script_files(cli.scripts.as_path())?;
    let mut scripts = Vec::new();
    load_scripts(&mut scripts, script_files, SIMPLE_FILENAME_PATTERN)?;

    let mut migrator = Migrator::new(
        config,
        if cli.semver {
            version_compare
        } else {
            simple_compare
        },
    );
    migrator.set_scripts(scripts)?;

    match cli.command {
        Some(Command::ShowScripts) => {
            show_scripts(&migrator);
            Ok(())
        }
        Some(Command::ShowSql(args)) => show_sql(&migrator, args.revert),
        Some(_) => database_command(cli, migrator, &start),
        None => Err(CliError::UnknownCommand),
    }
}
