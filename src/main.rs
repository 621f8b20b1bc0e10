use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use plasticine_basic::console::{SeededRandom, StdConsole, ThreadRandom};
use plasticine_basic::{parse, tokenize, BasicError, Executor, RandomSource};

/// Runs a Plasticine BASIC program from a file.
#[derive(Parser, Debug)]
#[command(name = "plasticine", version, about, long_about = None)]
struct Args {
    /// Path of the program to run
    #[arg(short, long)]
    file: PathBuf,

    /// Print the token stream and statement count to stderr before running
    #[arg(short, long)]
    verbose: bool,

    /// Seed for RANDOM, for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let source = match fs::read_to_string(&args.file) {
        Ok(source) => source,
        Err(e) => {
            eprintln!(
                "Failed to read the input file '{}': {}",
                args.file.display(),
                e
            );
            return ExitCode::FAILURE;
        }
    };

    let mut random: Box<dyn RandomSource> = match args.seed {
        Some(seed) => Box::new(SeededRandom::new(seed)),
        None => Box::new(ThreadRandom::new()),
    };

    match run(&source, args.verbose, random.as_mut()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(source: &str, verbose: bool, random: &mut dyn RandomSource) -> Result<(), BasicError> {
    let tokens = tokenize(source)?;
    if verbose {
        for token in &tokens {
            eprintln!(
                "{:?} '{}' @ {}:{}",
                token.kind,
                token.lexeme.escape_debug(),
                token.line,
                token.column
            );
        }
    }

    let program = parse(&tokens)?;
    if verbose {
        eprintln!("{} statements", program.len());
    }

    let mut console = StdConsole::new();
    let mut executor = Executor::new(&mut console, random);
    let result = executor.execute(&program);
    drop(executor);
    // Colors go back to normal before any error is reported
    if let Err(e) = console.reset_colors() {
        eprintln!("Failed to reset terminal colors: {}", e);
    }
    result?;
    Ok(())
}
