use clap::Parser;
use std::path::PathBuf;

use excalc::env::Environment;
use excalc::number::Backend;
use excalc::run_line;

#[derive(Parser)]
#[command(name = "excalc")]
#[command(about = "An exact-arithmetic calculator language")]
#[command(version)]
struct Cli {
    /// Source file to evaluate as a single expression
    source: Option<PathBuf>,

    /// Evaluate an expression directly
    #[arg(short = 'e', long, allow_hyphen_values = true)]
    eval: Option<String>,

    /// Start interactive REPL (the default when no source is given)
    #[arg(short, long)]
    interactive: bool,

    /// Use exact rational arithmetic instead of arbitrary-precision decimals
    #[arg(long)]
    exact: bool,
}

fn main() {
    let cli = Cli::parse();
    let backend = if cli.exact {
        Backend::Exact
    } else {
        Backend::Decimal
    };

    if let Some(expr) = &cli.eval {
        run_batch(expr, backend);
    } else if cli.interactive {
        run_repl(backend);
    } else if let Some(path) = &cli.source {
        match std::fs::read_to_string(path) {
            Ok(source) => run_batch(&source, backend),
            Err(e) => {
                eprintln!("excalc: cannot read {}: {}", path.display(), e);
                std::process::exit(1);
            }
        }
    } else {
        run_repl(backend);
    }
}

/// Batch mode: the whole input is one expression; errors are not caught.
fn run_batch(source: &str, backend: Backend) {
    let mut environment = Environment::with_builtins();
    match run_line(source, &mut environment, backend) {
        Ok(value) => println!("{value}"),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

fn run_repl(backend: Backend) {
    println!("excalc {} — interactive mode", env!("CARGO_PKG_VERSION"));
    println!("Type expressions. Ctrl-D exits.\n");

    let mut rl = match rustyline::DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("excalc: cannot initialize line editor: {e}");
            std::process::exit(1);
        }
    };

    let mut environment = Environment::with_builtins();

    loop {
        match rl.readline("excalc> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);
                match run_line(trimmed, &mut environment, backend) {
                    Ok(value) => println!("{value}"),
                    Err(e) => eprintln!("{e}"),
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                // Scope state is kept; only the pending input is dropped.
                eprintln!("interrupted");
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                break;
            }
            Err(e) => {
                eprintln!("excalc: {e}");
                break;
            }
        }
    }
}
