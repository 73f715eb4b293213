//! Error handling and diagnostic reporting.
//!
//! There are only two fatal failure modes in the front end: the grammar
//! itself is unsound (a programmer error, caught before any input is read)
//! or the input does not match the grammar anywhere. Both terminate the
//! whole operation; there is no partial or recoverable result. Individual
//! rule mismatches during parsing are ordinary control flow and never
//! surface here.

use std::fmt;
use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceSpan};
use thiserror::Error;

use crate::engine::MatchFailure;
use crate::grammar::analyze::Defect;

pub type SourceArc = Arc<NamedSource<String>>;

/// Source text plus a display name, for attaching to diagnostics.
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub name: String,
    pub content: String,
}

impl SourceContext {
    pub fn from_file(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn to_named_source(&self) -> SourceArc {
        Arc::new(NamedSource::new(self.name.clone(), self.content.clone()))
    }
}

/// What went wrong.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    /// The fixed grammar is structurally unsound. Never caused by input.
    GrammarDefect { defects: Vec<Defect> },
    /// Every alternative was exhausted without matching the whole input.
    /// `offset` is the furthest position any attempt reached; `attempted`
    /// names the rules being tried there.
    ParseFailure {
        offset: usize,
        attempted: Vec<&'static str>,
    },
    /// The input file could not be read.
    Io { path: String, message: String },
    /// An engine/builder invariant broke. Always a bug.
    Internal { message: String },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::GrammarDefect { defects } => {
                write!(f, "the grammar is unsound ({} defect", defects.len())?;
                if defects.len() != 1 {
                    write!(f, "s")?;
                }
                write!(f, ")")
            }
            ErrorKind::ParseFailure { attempted, .. } => {
                write!(f, "no grammar rule matched the input")?;
                if !attempted.is_empty() {
                    write!(f, "; tried {}", attempted.join(", "))?;
                }
                Ok(())
            }
            ErrorKind::Io { path, message } => write!(f, "cannot read {}: {}", path, message),
            ErrorKind::Internal { message } => write!(f, "internal error: {}", message),
        }
    }
}

impl ErrorKind {
    pub const fn code(&self) -> &'static str {
        match self {
            ErrorKind::GrammarDefect { .. } => "lbir::grammar",
            ErrorKind::ParseFailure { .. } => "lbir::parse",
            ErrorKind::Io { .. } => "lbir::io",
            ErrorKind::Internal { .. } => "lbir::internal",
        }
    }
}

/// The single error type for every front-end failure mode.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct LbError {
    pub kind: ErrorKind,
    source_code: Option<SourceArc>,
    primary_span: SourceSpan,
    help: Option<String>,
}

impl LbError {
    pub fn grammar_defect(defects: Vec<Defect>) -> Self {
        let listing = defects
            .iter()
            .map(Defect::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            kind: ErrorKind::GrammarDefect { defects },
            source_code: None,
            primary_span: unspanned(),
            help: Some(listing),
        }
    }

    pub fn parse_failure(ctx: &SourceContext, failure: MatchFailure) -> Self {
        Self {
            kind: ErrorKind::ParseFailure {
                offset: failure.offset,
                attempted: failure.attempted,
            },
            source_code: Some(ctx.to_named_source()),
            primary_span: SourceSpan::from(failure.offset..failure.offset),
            help: None,
        }
    }

    pub fn io(path: &std::path::Path, error: &std::io::Error) -> Self {
        Self {
            kind: ErrorKind::Io {
                path: path.display().to_string(),
                message: error.to_string(),
            },
            source_code: None,
            primary_span: unspanned(),
            help: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Internal {
                message: message.into(),
            },
            source_code: None,
            primary_span: unspanned(),
            help: Some("this is a bug in lbir; please report it".to_string()),
        }
    }

    fn primary_label(&self) -> String {
        match &self.kind {
            ErrorKind::GrammarDefect { .. } => "grammar defect".into(),
            ErrorKind::ParseFailure { attempted, .. } => {
                if attempted.is_empty() {
                    "no rule matched here".into()
                } else {
                    format!("while matching {}", attempted.join(", "))
                }
            }
            ErrorKind::Io { .. } => "unreadable input".into(),
            ErrorKind::Internal { .. } => "internal error".into(),
        }
    }
}

impl Diagnostic for LbError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.kind.code()))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        self.source_code.as_ref()?;
        let label = LabeledSpan::new_with_span(Some(self.primary_label()), self.primary_span);
        Some(Box::new(std::iter::once(label)))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        self.source_code
            .as_ref()
            .map(|s| s.as_ref() as &dyn miette::SourceCode)
    }
}

/// Placeholder span for errors with no source location.
pub fn unspanned() -> SourceSpan {
    SourceSpan::from(0..0)
}

/// Renders an error with full miette diagnostics on stderr.
pub fn print_error(error: LbError) {
    let report = miette::Report::new(error);
    eprintln!("{report:?}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_failure_reports_position_and_rules() {
        let ctx = SourceContext::from_file("bad.lb", "int64 foo(");
        let err = LbError::parse_failure(
            &ctx,
            MatchFailure {
                offset: 10,
                attempted: vec!["function", "scope"],
            },
        );
        assert_eq!(err.kind.code(), "lbir::parse");
        let rendered = format!("{}", err);
        assert!(rendered.contains("function"));
        assert!(rendered.contains("scope"));
    }

    #[test]
    fn grammar_defect_lists_every_defect_in_help() {
        let defects = vec![
            Defect {
                rule: "expr".into(),
                message: "can recurse without consuming input".into(),
            },
            Defect {
                rule: "stars".into(),
                message: "repetition over a rule that can match empty input".into(),
            },
        ];
        let err = LbError::grammar_defect(defects);
        let report = miette::Report::new(err);
        let output = format!("{report:?}");
        assert!(output.contains("expr"));
        assert!(output.contains("stars"));
    }
}
