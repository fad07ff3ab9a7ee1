//! rill - REPL and file runner for the Rill Scheme interpreter
//!
//! Usage:
//!   rill                      # interactive REPL
//!   rill program.scm          # load files, then exit
//!   rill -i program.scm       # load files, then drop into the REPL
//!   rill -e '(+ 1 2)'         # evaluate one expression and print it
//!
//! Multi-line forms continue on the next prompt until the parens
//! balance. History persists in ~/.rill_history. Set RILL_LOG (e.g.
//! RILL_LOG=rill_runtime=debug) for runtime diagnostics on stderr.

use clap::Parser;
use rill_runtime::{Interpreter, Value, write_value};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rill")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "R5RS-style Scheme interpreter", long_about = None)]
struct Args {
    /// Source files to load in order
    files: Vec<PathBuf>,

    /// Evaluate one expression, print its result, and exit
    #[arg(short = 'e', long = "eval", value_name = "EXPR")]
    expr: Option<String>,

    /// Enter the REPL after loading files
    #[arg(short, long)]
    interactive: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("RILL_LOG"))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut interp = Interpreter::new();

    if let Some(expr) = &args.expr {
        match interp.eval_str(expr) {
            Ok(v) => {
                println!("{}", write_value(&interp, v));
                std::process::exit(interp.take_exit().unwrap_or(0));
            }
            Err(c) => {
                eprintln!("rill: {c}");
                std::process::exit(1);
            }
        }
    }

    for file in &args.files {
        if let Err(c) = interp.load_path(&file.display().to_string()) {
            eprintln!("rill: {}: {c}", file.display());
            std::process::exit(1);
        }
        if let Some(code) = interp.take_exit() {
            std::process::exit(code);
        }
    }

    if args.files.is_empty() || args.interactive {
        std::process::exit(repl(&mut interp));
    }
}

fn history_path() -> Option<PathBuf> {
    home::home_dir().map(|h| h.join(".rill_history"))
}

fn repl(interp: &mut Interpreter) -> i32 {
    let mut editor = match DefaultEditor::new() {
        Ok(e) => e,
        Err(e) => {
            eprintln!("rill: cannot initialize line editor: {e}");
            return 1;
        }
    };
    let history = history_path();
    if let Some(path) = &history {
        let _ = editor.load_history(path);
    }

    // pending text accumulates until the reader stops reporting an
    // incomplete form
    let mut pending = String::new();
    let code = loop {
        let prompt = if pending.is_empty() { ">> " } else { " … " };
        match editor.readline(prompt) {
            Ok(line) => {
                pending.push_str(&line);
                pending.push('\n');
                match interp.eval_str(&pending) {
                    Err(c) if c.is_incomplete() => continue,
                    result => {
                        let _ = editor.add_history_entry(pending.trim());
                        pending.clear();
                        match result {
                            Ok(Value::Undefined) => {}
                            Ok(v) => println!("{}", write_value(interp, v)),
                            Err(c) => eprintln!("error: {c}"),
                        }
                        if let Some(code) = interp.take_exit() {
                            break code;
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                pending.clear();
            }
            Err(ReadlineError::Eof) => break 0,
            Err(e) => {
                eprintln!("rill: {e}");
                break 1;
            }
        }
    };

    if let Some(path) = &history {
        let _ = editor.save_history(path);
    }
    code
}
