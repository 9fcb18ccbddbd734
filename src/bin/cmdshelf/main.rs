mod manage;
mod run;
mod tui;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::LevelFilter;

use cmdshelf::logger::{self, Sink};
use cmdshelf::open_store;
use cmdshelf::tui::log_state::LogBuffer;

#[derive(Parser, Debug)]
#[command(name = "cmdshelf", about = "Keep named shell commands at hand and run them")]
struct Cli {
    /// Path to the command store (defaults to the user's config directory)
    #[arg(short, long, env = "CMDSHELF_STORE", global = true)]
    store: Option<PathBuf>,

    /// Log file path (enables file logging in addition to the log panel)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the stored commands with their indexes
    List(manage::ListArgs),
    /// Add a command to the end of the list
    Add(manage::AddArgs),
    /// Replace the command at an index
    Update(manage::UpdateArgs),
    /// Remove the command at an index
    Delete(manage::DeleteArgs),
    /// Run the command at an index, streaming its output
    Run(run::RunArgs),
    /// Write all commands to a JSON file
    Export(manage::PathArgs),
    /// Replace all commands with the content of a JSON file
    Import(manage::PathArgs),
}

impl Commands {
    fn mutates(&self) -> bool {
        matches!(
            self,
            Commands::Add(_) | Commands::Update(_) | Commands::Delete(_) | Commands::Import(_)
        )
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let log_file = cli.log_file.as_ref().map(std::fs::File::create).transpose()?;

    let Some(command) = cli.command else {
        let log_buffer = LogBuffer::new();
        logger::init(Sink::Panel(log_buffer.clone()), log_file, LevelFilter::Info)?;
        let (store, load_error) = open_store(cli.store)?;
        return tui::run(store, load_error, log_buffer).await;
    };

    logger::init(Sink::Stderr, log_file, LevelFilter::Warn)?;
    // A corrupt store is reported by the logger and read as empty, but never
    // overwritten from the command line
    let (mut store, load_error) = open_store(cli.store)?;
    if let Some(e) = load_error
        && command.mutates()
    {
        return Err(e.into());
    }

    match command {
        Commands::List(ref args) => manage::list(args, &store),
        Commands::Add(ref args) => manage::add(args, &mut store),
        Commands::Update(ref args) => manage::update(args, &mut store),
        Commands::Delete(ref args) => manage::delete(args, &mut store),
        Commands::Run(ref args) => run::run(args, &store).await,
        Commands::Export(ref args) => manage::export(args, &store),
        Commands::Import(ref args) => manage::import(args, &mut store),
    }
}
