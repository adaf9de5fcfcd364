use std::path::PathBuf;
use std::process::ExitCode;
use clap::{Parser, Subcommand};
use log::{LevelFilter, debug};
use commands::{build_interpreter, inspect, repl, run};

mod commands;
mod config;

#[derive(Parser, Debug)]
#[command(name = "tong")]
#[command(version, about = "Run TONG programs or start an interactive session.")]
struct Cli {
    /// Configuration file (defaults to ./tong.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,

    /// Run parallel work on a thread pool
    #[arg(long)]
    threads: bool,

    /// Program to run when no subcommand is given
    #[arg()]
    file: Option<PathBuf>,

    #[command(subcommand)]
    subcommand: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a program file
    Run {
        file: PathBuf,
    },
    /// Start the interactive session
    Repl,
    /// Print the token stream of a file
    Tokens {
        file: PathBuf,
    },
    /// Print the syntax tree of a file as JSON
    Ast {
        file: PathBuf,

        #[arg(long, default_value_t = false)]
        compact: bool,
    },
}

fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = config::resolve(cli.config.as_deref())?;

    let console_level = if cli.verbose {
        LevelFilter::Debug
    } else {
        config.logging.console_filter()?
    };
    tong_logger::init(config.logging.directory.as_ref(), console_level, config.logging.file_filter()?)?;
    debug!("Loaded configuration: {:?}", config);

    let runtime = &config.runtime;
    match (cli.subcommand, cli.file) {
        (Some(Commands::Run { file }), _) | (None, Some(file)) => {
            let interpreter = build_interpreter(runtime, cli.threads)?;
            run::run_file(&file, &interpreter)
        }
        (Some(Commands::Repl), _) | (None, None) => repl::start(|| build_interpreter(runtime, cli.threads)),
        (Some(Commands::Tokens { file }), _) => inspect::print_tokens(&file),
        (Some(Commands::Ast { file, compact }), _) => inspect::print_ast(&file, !compact),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match dispatch(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
