//! RegexLint CLI - command-line diagnostics for PCRE patterns.
//!
//! The CLI is the binding-agnostic layer between editors/CI and the core
//! library. Every command reads a pattern from a file argument or stdin and
//! prints JSON on stdout; parse failures exit with status 1 and still
//! produce structured diagnostics.
//!
//! # Usage
//!
//! ```bash
//! relint-cli diagnostics pattern.txt
//! echo '/(a+)+$/' | relint-cli profile
//! relint-cli score pattern.txt
//! relint-cli emit pattern.txt
//! ```
//!
//! # Output format (diagnostics)
//!
//! ```json
//! {
//!     "success": false,
//!     "diagnostics": [
//!         {
//!             "range": {"start": {"line": 0, "character": 3},
//!                       "end": {"line": 0, "character": 4}},
//!             "severity": 1,
//!             "message": "...",
//!             "source": "RegexLint",
//!             "code": "unbalanced_group"
//!         }
//!     ],
//!     "version": "0.4.0"
//! }
//! ```

use clap::{Parser, Subcommand};
use relint_core::emitters::pcre::PcreEmitter;
use relint_core::{parse, profile, score, Analyze, ParseError, Regex};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a pattern and report LSP-style diagnostics
    Diagnostics {
        /// Input file path (omit for stdin)
        file: Option<PathBuf>,

        /// Read from stdin instead of a file
        #[arg(long)]
        stdin: bool,
    },

    /// Run the ReDoS profiler and print the result
    Profile {
        /// Input file path (omit for stdin)
        file: Option<PathBuf>,

        /// Read from stdin instead of a file
        #[arg(long)]
        stdin: bool,
    },

    /// Print the complexity score
    Score {
        /// Input file path (omit for stdin)
        file: Option<PathBuf>,

        /// Read from stdin instead of a file
        #[arg(long)]
        stdin: bool,
    },

    /// Re-emit the parsed pattern in canonical form
    Emit {
        /// Input file path (omit for stdin)
        file: Option<PathBuf>,

        /// Read from stdin instead of a file
        #[arg(long)]
        stdin: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let (file, stdin) = match &cli.command {
        Commands::Diagnostics { file, stdin }
        | Commands::Profile { file, stdin }
        | Commands::Score { file, stdin }
        | Commands::Emit { file, stdin } => (file.clone(), *stdin),
    };

    let source = match read_input(file, stdin) {
        Ok(text) => text.trim_end_matches(['\r', '\n']).to_string(),
        Err(err) => {
            eprintln!("Error reading input: {}", err);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Diagnostics { .. } => run_diagnostics(&source),
        Commands::Profile { .. } => with_parsed(&source, |regex| {
            let result = profile(regex);
            println!("{}", serde_json::to_string_pretty(&result).unwrap());
        }),
        Commands::Score { .. } => with_parsed(&source, |regex| {
            println!("{}", serde_json::json!({ "score": score(regex) }));
        }),
        Commands::Emit { .. } => with_parsed(&source, |regex| {
            let mut emitter = PcreEmitter::new();
            println!("{}", emitter.visit_regex(regex));
        }),
    }
}

fn run_diagnostics(source: &str) -> ExitCode {
    match parse(source) {
        Ok(_) => {
            println!(
                "{}",
                serde_json::json!({
                    "success": true,
                    "diagnostics": [],
                    "version": env!("CARGO_PKG_VERSION"),
                })
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            print_failure(&err);
            ExitCode::FAILURE
        }
    }
}

fn with_parsed(source: &str, action: impl FnOnce(&Regex)) -> ExitCode {
    match parse(source) {
        Ok(regex) => {
            action(&regex);
            ExitCode::SUCCESS
        }
        Err(err) => {
            print_failure(&err);
            ExitCode::FAILURE
        }
    }
}

fn print_failure(err: &ParseError) {
    println!(
        "{}",
        serde_json::json!({
            "success": false,
            "diagnostics": [err.to_lsp_diagnostic()],
            "version": env!("CARGO_PKG_VERSION"),
        })
    );
}

fn read_input(file: Option<PathBuf>, stdin: bool) -> io::Result<String> {
    if stdin || file.is_none() {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        fs::read_to_string(file.unwrap())
    }
}
