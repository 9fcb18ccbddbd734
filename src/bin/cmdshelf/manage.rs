use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;

use cmdshelf::store::{CommandStore, StoreError};

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Print the full command text under each name
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Display name (defaults to the command's first line)
    #[arg(short, long, default_value = "")]
    name: String,

    /// Shell command text
    command: String,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Position of the command, as shown by `list`
    index: usize,

    /// Display name (defaults to the command's first line)
    #[arg(short, long, default_value = "")]
    name: String,

    /// Shell command text
    command: String,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Position of the command, as shown by `list`
    index: usize,

    /// Do not ask for confirmation
    #[arg(short, long)]
    yes: bool,
}

#[derive(Args, Debug)]
pub struct PathArgs {
    /// JSON file path
    path: PathBuf,
}

type CliResult = Result<ExitCode, Box<dyn std::error::Error>>;

/// Print every entry as `index  name`.
///
/// # Errors
///
/// Returns an error if stdout cannot be written.
pub fn list(args: &ListArgs, store: &CommandStore) -> CliResult {
    let mut stdout = std::io::stdout().lock();
    if store.is_empty() {
        writeln!(stdout, "No commands stored in {}", store.path().display())?;
        return Ok(ExitCode::SUCCESS);
    }
    let width = (store.len() - 1).to_string().len();
    for (index, entry) in store.entries().iter().enumerate() {
        if args.verbose {
            writeln!(stdout, "{index:>width$}  {}", entry.name)?;
            for line in entry.command.lines() {
                writeln!(stdout, "{:width$}    {line}", "")?;
            }
        } else if entry.name == entry.summary() {
            writeln!(stdout, "{index:>width$}  {}", entry.name)?;
        } else {
            writeln!(stdout, "{index:>width$}  {}  ({})", entry.name, entry.summary())?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// # Errors
///
/// Returns the store error if the command is blank or saving fails.
pub fn add(args: &AddArgs, store: &mut CommandStore) -> CliResult {
    let index = store.add(&args.name, &args.command)?;
    println!("Added command {index}");
    Ok(ExitCode::SUCCESS)
}

/// # Errors
///
/// Returns the store error if the index is out of range, the command is
/// blank, or saving fails.
pub fn update(args: &UpdateArgs, store: &mut CommandStore) -> CliResult {
    store.update(args.index, &args.name, &args.command)?;
    println!("Updated command {}", args.index);
    Ok(ExitCode::SUCCESS)
}

/// Delete an entry, asking first unless `--yes` was given.
///
/// # Errors
///
/// Returns the store error if the index is out of range or saving fails, or
/// the prompt error if the terminal cannot be read.
pub fn delete(args: &DeleteArgs, store: &mut CommandStore) -> CliResult {
    let entry = store.get(args.index).ok_or(StoreError::Index {
        index: args.index,
        len: store.len(),
    })?;
    if !args.yes {
        let confirmed = inquire::Confirm::new(&format!(
            "Are you sure you want to delete '{}'?",
            entry.name
        ))
        .with_default(false)
        .prompt()?;
        if !confirmed {
            eprintln!("Nothing deleted");
            return Ok(ExitCode::FAILURE);
        }
    }
    let removed = store.delete(args.index)?;
    println!("Deleted '{}'", removed.name);
    Ok(ExitCode::SUCCESS)
}

/// # Errors
///
/// Returns the store error if the file cannot be written.
pub fn export(args: &PathArgs, store: &CommandStore) -> CliResult {
    store.export_to(&args.path)?;
    println!(
        "Commands exported to {} ({})",
        args.path.display(),
        store.len()
    );
    Ok(ExitCode::SUCCESS)
}

/// # Errors
///
/// Returns the store error if the file cannot be read or validated, or
/// saving fails.
pub fn import(args: &PathArgs, store: &mut CommandStore) -> CliResult {
    let count = store.import_from(&args.path)?;
    println!("Imported {count} command(s) from {}", args.path.display());
    Ok(ExitCode::SUCCESS)
}
