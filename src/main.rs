#[macro_use]
extern crate maplit;

mod builtin;
mod equality;
mod error;
mod expr;
mod read;
mod runtime;

use std::fs;
use std::io::{self, BufRead, IsTerminal, Read, Write};
use std::process;

use crate::builtin::initial_environment;
use crate::error::Result;
use crate::expr::Expr;
use crate::read::read_all;
use crate::runtime::{evaluate_all, Environment};

fn main() {
    let mut source_path: Option<String> = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "-v" | "--version" => {
                println!("v{}", env!("CARGO_PKG_VERSION"));
                return;
            }
            "-h" | "--help" => {
                println!("Usage: lis [-v | --version] [sourcefile]");
                println!();
                println!("With no source file, reads from stdin; if stdin is a terminal,");
                println!("starts an interactive session instead.");
                return;
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown argument: {}", other);
                process::exit(2);
            }
            path => {
                if source_path.is_some() {
                    eprintln!("At most one source file expected");
                    process::exit(2);
                }
                source_path = Some(path.to_string());
            }
        }
    }

    let env = initial_environment();
    match source_path {
        Some(path) => match fs::read_to_string(&path) {
            Ok(source) => run_source(&source, &env),
            Err(err) => {
                eprintln!("Failed to read {}: {}", path, err);
                process::exit(1);
            }
        },
        None => {
            if io::stdin().is_terminal() {
                repl(&env);
            } else {
                let mut source = String::new();
                if let Err(err) = io::stdin().read_to_string(&mut source) {
                    eprintln!("IO error reading input: {}", err);
                    process::exit(1);
                }
                run_source(&source, &env);
            }
        }
    }
}

/// Evaluate a whole source text; any error terminates the process with a
/// nonzero status.
fn run_source(source: &str, env: &Environment) {
    let result = read_all(source)
        .collect::<Result<Vec<Expr>>>()
        .and_then(|exprs| evaluate_all(&exprs, env));
    if let Err(err) = result {
        eprintln!("{}", err);
        process::exit(1);
    }
}

/// Interactive read-eval-print loop. Errors are printed and the loop
/// continues with the next line; EOF ends the session.
fn repl(env: &Environment) {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("lis> ");
        if io::stdout().flush().is_err() {
            return;
        }
        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(err)) => {
                eprintln!("IO error reading input: {}", err);
                return;
            }
            None => {
                println!();
                return;
            }
        };
        for item in read_all(&line) {
            match item.and_then(|expr| expr.eval(env)) {
                Ok(Some(value)) => println!("{}", value),
                Ok(None) => {}
                Err(err) => {
                    println!("{}", err);
                    break;
                }
            }
        }
    }
}
