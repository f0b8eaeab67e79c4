// Copyright (c) ONNX Project Contributors
// SPDX-License-Identifier: Apache-2.0

//! `sonnxc`: compile an S-ONNX model source file to three-address IR.
//!
//! IR goes to stdout; diagnostics go to stderr; the exit code is 0 on
//! success and 1 on any failure. `RUST_LOG` controls tracing
//! verbosity, which is also routed to stderr so it never mixes with
//! the emitted IR.

use anyhow::{Context, Result};
use clap::Parser;
use sonnx_core::{compile_source, parse_source, pretty};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sonnxc", version, about = "S-ONNX model compiler front-end")]
struct Cli {
    /// Path to the model source file
    input: PathBuf,

    /// Print the AST as s-expressions instead of compiling
    #[arg(long)]
    dump_ast: bool,
}

fn run(cli: &Cli) -> Result<String> {
    let source = std::fs::read_to_string(&cli.input)
        .with_context(|| format!("cannot read '{}'", cli.input.display()))?;
    debug!(path = %cli.input.display(), bytes = source.len(), "compiling");
    let text = if cli.dump_ast {
        pretty::dump(&parse_source(&source)?)
    } else {
        compile_source(&source)?
    };
    Ok(text)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(text) => {
            print!("{text}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
