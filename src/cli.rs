//! The lbir command-line interface.
//!
//! Thin dispatch over the library entry points. Exit status is 0 on
//! success and 1 when the grammar is defective or the input does not parse.

use std::path::{Path, PathBuf};
use std::{fs, process};

use clap::{Parser, Subcommand};

use crate::diagnostics::{print_error, LbError, SourceContext};
use crate::parser::{check_grammar, parse_file, parse_with, ParseOptions};

#[derive(Debug, Parser)]
#[command(
    name = "lbir",
    version,
    about = "Front-end parser for the LB intermediate language."
)]
pub struct LbirArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse an LB program, optionally exporting the parse tree.
    Parse {
        /// The LB source file to parse.
        #[arg(required = true)]
        file: PathBuf,
        /// Write the parse tree as a Graphviz dot file.
        #[arg(long, value_name = "PATH")]
        export_dot: Option<PathBuf>,
        /// Print rule entry/success trace lines while parsing.
        #[arg(long)]
        trace: bool,
    },
    /// Parse an LB program and print its parse tree as JSON.
    Tree {
        /// The LB source file to parse.
        #[arg(required = true)]
        file: PathBuf,
    },
    /// Run the grammar well-formedness check and report.
    Check,
}

/// The main entry point for the CLI.
pub fn run() {
    let args = LbirArgs::parse();

    let result = match args.command {
        Command::Parse {
            file,
            export_dot,
            trace,
        } => handle_parse(&file, export_dot.as_deref(), trace),
        Command::Tree { file } => handle_tree(&file),
        Command::Check => handle_check(),
    };

    if let Err(error) = result {
        print_error(error);
        process::exit(1);
    }
}

fn handle_parse(file: &Path, export_dot: Option<&Path>, trace: bool) -> Result<(), LbError> {
    parse_file(file, export_dot, ParseOptions { trace })?;
    println!("ok: {}", file.display());
    Ok(())
}

fn handle_tree(file: &Path) -> Result<(), LbError> {
    let source = fs::read_to_string(file).map_err(|e| LbError::io(file, &e))?;
    let ctx = SourceContext::from_file(file.display().to_string(), source.clone());
    let tree = parse_with(&source, &ctx, ParseOptions::default())?;
    let json = serde_json::to_string_pretty(&tree)
        .map_err(|e| LbError::internal(format!("cannot serialize parse tree: {e}")))?;
    println!("{json}");
    Ok(())
}

fn handle_check() -> Result<(), LbError> {
    check_grammar()?;
    println!("grammar ok: {} rules", crate::grammar::lb::LB.grammar.len());
    Ok(())
}
