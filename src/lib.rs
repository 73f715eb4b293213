//! Front-end parser for the LB instruction-oriented intermediate language.
//!
//! The crate is a small PEG toolkit plus one fixed grammar: [`grammar`]
//! holds the rule arena and the LB rule graph, [`engine`] evaluates it with
//! backtracking and observer hooks, [`tree`] materializes spanned parse
//! nodes for the captured rules, and [`parser`] ties them together behind
//! `parse`/`validate`/`parse_file`. Errors surface as [`LbError`] with
//! miette diagnostics.

pub use crate::diagnostics::{print_error, ErrorKind, LbError, SourceContext};
pub use crate::engine::{Cursor, Engine, Events, MatchFailure, NoOpEvents};
pub use crate::grammar::{Grammar, RuleId};
pub use crate::parser::{parse, parse_file, parse_with, validate, ParseOptions};
pub use crate::tree::{ParseNode, Span, TreeBuilder};

pub mod cli;
pub mod diagnostics;
pub mod engine;
pub mod export;
pub mod grammar;
pub mod parser;
pub mod tree;
