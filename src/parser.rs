//! Top-level parsing entry points.
//!
//! Wires the pieces together: the well-formedness analysis runs exactly once
//! per process (and always before any input is touched), then the engine
//! evaluates the LB grammar over the whole input, driving the tree builder.
//! The input buffer is owned by the caller and every returned tree node
//! borrows from it.

use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;

use crate::diagnostics::{LbError, SourceContext};
use crate::engine::{Engine, NoOpEvents};
use crate::export;
use crate::grammar::analyze::{analyze, Defect};
use crate::grammar::lb::LB;
use crate::tree::{ParseNode, TreeBuilder};

/// Configuration for a parse run. Tracing is the only knob today.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Print rule entry/success trace lines on stderr.
    pub trace: bool,
}

// The grammar is fixed at build time, so its analysis is a one-time
// self-test rather than a per-parse cost.
static ANALYSIS: Lazy<Result<(), Vec<Defect>>> = Lazy::new(|| analyze(&LB.grammar));

/// Verifies the LB grammar itself. Runs the analysis on first use and
/// reports the cached result afterwards.
pub fn check_grammar() -> Result<(), LbError> {
    ANALYSIS
        .clone()
        .map_err(LbError::grammar_defect)
}

/// Parses LB source text into a tree rooted at the program node.
pub fn parse<'src>(source: &'src str, ctx: &SourceContext) -> Result<ParseNode<'src>, LbError> {
    parse_with(source, ctx, ParseOptions::default())
}

/// [`parse`] with explicit options.
pub fn parse_with<'src>(
    source: &'src str,
    ctx: &SourceContext,
    options: ParseOptions,
) -> Result<ParseNode<'src>, LbError> {
    check_grammar()?;
    let lb = &*LB;
    let mut builder = TreeBuilder::new(&lb.grammar, source);
    let mut engine = Engine::new(&lb.grammar, source).with_trace(options.trace);
    match engine.parse(lb.program, &mut builder) {
        Ok(_) => builder
            .finish()
            .ok_or_else(|| LbError::internal("engine succeeded but no root node was built")),
        Err(failure) => Err(LbError::parse_failure(ctx, failure)),
    }
}

/// Runs the grammar as a pure recognizer: no tree, no trace, just pass/fail.
pub fn validate(source: &str, ctx: &SourceContext) -> Result<(), LbError> {
    check_grammar()?;
    let lb = &*LB;
    let mut engine = Engine::new(&lb.grammar, source);
    engine
        .parse(lb.program, &mut NoOpEvents)
        .map(|_| ())
        .map_err(|failure| LbError::parse_failure(ctx, failure))
}

/// Parses a file, optionally exporting the finished tree as Graphviz dot.
///
/// The grammar check happens before the file is opened: a defective grammar
/// aborts without touching the filesystem.
pub fn parse_file(
    path: &Path,
    export_dot: Option<&Path>,
    options: ParseOptions,
) -> Result<(), LbError> {
    check_grammar()?;
    let source = fs::read_to_string(path).map_err(|e| LbError::io(path, &e))?;
    let ctx = SourceContext::from_file(path.display().to_string(), source.clone());
    let tree = parse_with(&source, &ctx, options)?;
    if let Some(dot_path) = export_dot {
        let mut file = fs::File::create(dot_path).map_err(|e| LbError::io(dot_path, &e))?;
        export::write_dot(&mut file, &tree).map_err(|e| LbError::io(dot_path, &e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grammar_self_test_passes() {
        assert!(check_grammar().is_ok());
    }

    #[test]
    fn validate_accepts_without_building_a_tree() {
        let source = "void main() {\n}\n";
        let ctx = SourceContext::from_file("main.lb", source);
        assert!(validate(source, &ctx).is_ok());
    }

    #[test]
    fn validate_rejects_garbage() {
        let source = "this is not LB";
        let ctx = SourceContext::from_file("junk.lb", source);
        assert!(validate(source, &ctx).is_err());
    }
}
