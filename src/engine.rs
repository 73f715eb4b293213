//! Execution engine for the LB grammar.
//!
//! Evaluates a rule graph against an input buffer with classic PEG
//! semantics: ordered choice tries alternatives in listed order and the
//! first success wins; sequences backtrack as a unit; repetition is greedy
//! and never gives iterations back. There is no memoization, so identical
//! sub-ranges may be re-attempted under different choice branches, which is
//! fine at this grammar's size.
//!
//! Evaluation is purely recursive and single-threaded. Stack depth tracks
//! the nesting depth of the input (nested scopes); pathologically deep input
//! can exhaust the call stack. That limitation is accepted and documented
//! here rather than guarded against.

use std::io::Write;

use serde::Serialize;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::grammar::{Grammar, RuleExpr, RuleId};

/// A copyable position into the input buffer. The byte offset drives
/// matching; line and column exist for diagnostics and traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cursor {
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

impl Cursor {
    pub fn start() -> Self {
        Self {
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// Advances over `matched`, keeping line/column in step.
    fn advance(&mut self, matched: &str) {
        for ch in matched.chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.offset += matched.len();
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Hooks the engine fires while evaluating rules.
///
/// `enter` fires when a rule is attempted, `success` when it matched (with
/// the entry and final cursors), `failure` after the cursor has been
/// restored to the entry position. Every hook runs synchronously inside the
/// evaluation; the same grammar can be run with tree building, with a no-op
/// observer for pure validation, or with anything else that fits this seam.
pub trait Events {
    fn enter(&mut self, _rule: RuleId, _at: Cursor) {}
    fn success(&mut self, _rule: RuleId, _begin: Cursor, _end: Cursor) {}
    fn failure(&mut self, _rule: RuleId, _at: Cursor) {}
}

/// Observer that does nothing: runs the grammar as a pure recognizer.
pub struct NoOpEvents;

impl Events for NoOpEvents {}

/// Why a top-level parse did not succeed: the furthest byte offset at which
/// a leaf match failed, and the named rules being attempted there.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchFailure {
    pub offset: usize,
    pub attempted: Vec<&'static str>,
}

/// Evaluates one grammar against one input buffer.
///
/// The input is borrowed read-only for the engine's whole lifetime; cursors
/// and tree spans index into it without copying.
pub struct Engine<'g, 'src> {
    grammar: &'g Grammar,
    input: &'src str,
    trace: bool,
    furthest: usize,
    attempted: Vec<&'static str>,
    // Stack of named rules currently being attempted, innermost last.
    active: Vec<&'static str>,
}

impl<'g, 'src> Engine<'g, 'src> {
    pub fn new(grammar: &'g Grammar, input: &'src str) -> Self {
        Self {
            grammar,
            input,
            trace: false,
            furthest: 0,
            attempted: Vec::new(),
            active: Vec::new(),
        }
    }

    /// Enables rule-entry/success trace lines on stderr. Off by default;
    /// tracing is purely diagnostic.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Runs `root` against the whole input.
    ///
    /// Returns the final cursor on success. On failure every hook fired for
    /// a partially-matched alternative has been balanced by a `failure`
    /// hook, and the [`MatchFailure`] reports the furthest position reached.
    pub fn parse(&mut self, root: RuleId, events: &mut dyn Events) -> Result<Cursor, MatchFailure> {
        match self.eval(root, Cursor::start(), events) {
            Some(end) => Ok(end),
            None => Err(MatchFailure {
                offset: self.furthest,
                attempted: std::mem::take(&mut self.attempted),
            }),
        }
    }

    fn eval(&mut self, id: RuleId, at: Cursor, events: &mut dyn Events) -> Option<Cursor> {
        let grammar = self.grammar;
        let rule = grammar.rule(id);
        if let Some(label) = rule.label {
            self.active.push(label);
            if self.trace {
                self.trace_enter(label, at);
            }
        }
        events.enter(id, at);

        let result = self.eval_expr(&rule.expr, at, events);

        match result {
            Some(end) => {
                if let Some(label) = rule.label {
                    if self.trace {
                        self.trace_success(label, at, end);
                    }
                    self.active.pop();
                }
                events.success(id, at, end);
                Some(end)
            }
            None => {
                if rule.label.is_some() {
                    self.active.pop();
                }
                events.failure(id, at);
                None
            }
        }
    }

    fn eval_expr(&mut self, expr: &RuleExpr, at: Cursor, events: &mut dyn Events) -> Option<Cursor> {
        match expr {
            RuleExpr::Literal(s) => {
                if self.rest(at).starts_with(s) {
                    Some(self.advanced(at, s.len()))
                } else {
                    self.leaf_failed(at);
                    None
                }
            }
            RuleExpr::OneOf(set) => self.match_char(at, |ch| set.contains(ch)),
            RuleExpr::Range(lo, hi) => self.match_char(at, |ch| (*lo..=*hi).contains(&ch)),
            RuleExpr::Identifier => {
                let rest = self.rest(at);
                match rest.chars().next() {
                    Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => {}
                    _ => {
                        self.leaf_failed(at);
                        return None;
                    }
                }
                let len = rest
                    .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_'))
                    .unwrap_or(rest.len());
                Some(self.advanced(at, len))
            }
            RuleExpr::Eol => {
                let rest = self.rest(at);
                if rest.starts_with("\r\n") {
                    Some(self.advanced(at, 2))
                } else if rest.starts_with('\n') {
                    Some(self.advanced(at, 1))
                } else {
                    self.leaf_failed(at);
                    None
                }
            }
            RuleExpr::Eof => {
                if at.offset == self.input.len() {
                    Some(at)
                } else {
                    self.leaf_failed(at);
                    None
                }
            }
            RuleExpr::RestOfLine => {
                let rest = self.rest(at);
                let len = match rest.find('\n') {
                    Some(pos) => pos + 1,
                    None => rest.len(),
                };
                Some(self.advanced(at, len))
            }
            RuleExpr::Seq(parts) => {
                let mut cursor = at;
                for part in parts {
                    cursor = self.eval(*part, cursor, events)?;
                }
                Some(cursor)
            }
            RuleExpr::Choice(alternatives) => {
                for alternative in alternatives {
                    if let Some(end) = self.eval(*alternative, at, events) {
                        return Some(end);
                    }
                }
                None
            }
            RuleExpr::Repeat { rule, at_least_one } => {
                let mut cursor = at;
                let mut matched = 0usize;
                while let Some(end) = self.eval(*rule, cursor, events) {
                    // A body that matched nothing would repeat forever; the
                    // analyzer rejects such grammars before parsing starts.
                    if end.offset == cursor.offset {
                        break;
                    }
                    cursor = end;
                    matched += 1;
                }
                if *at_least_one && matched == 0 {
                    None
                } else {
                    Some(cursor)
                }
            }
            RuleExpr::Optional(rule) => Some(self.eval(*rule, at, events).unwrap_or(at)),
            // Unfilled placeholders never survive analysis.
            RuleExpr::Placeholder => None,
        }
    }

    fn rest(&self, at: Cursor) -> &'src str {
        &self.input[at.offset..]
    }

    fn advanced(&self, at: Cursor, len: usize) -> Cursor {
        let mut next = at;
        next.advance(&self.input[at.offset..at.offset + len]);
        next
    }

    fn match_char(&mut self, at: Cursor, pred: impl Fn(char) -> bool) -> Option<Cursor> {
        match self.rest(at).chars().next() {
            Some(ch) if pred(ch) => Some(self.advanced(at, ch.len_utf8())),
            _ => {
                self.leaf_failed(at);
                None
            }
        }
    }

    /// Records a leaf-level mismatch for furthest-failure reporting.
    fn leaf_failed(&mut self, at: Cursor) {
        let label = self.active.last().copied().unwrap_or("input");
        if at.offset > self.furthest {
            self.furthest = at.offset;
            self.attempted.clear();
            self.attempted.push(label);
        } else if at.offset == self.furthest && !self.attempted.contains(&label) {
            self.attempted.push(label);
        }
    }

    fn trace_enter(&self, label: &str, at: Cursor) {
        let mut out = StandardStream::stderr(ColorChoice::Auto);
        let _ = out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)));
        let _ = write!(out, "parse {label}");
        let _ = out.reset();
        let _ = writeln!(out, " at {at}: \"{}\"", excerpt(self.rest(at)));
    }

    fn trace_success(&self, label: &str, begin: Cursor, end: Cursor) {
        let mut out = StandardStream::stderr(ColorChoice::Auto);
        let _ = out.set_color(ColorSpec::new().set_fg(Some(Color::Green)));
        let _ = write!(out, "match {label}");
        let _ = out.reset();
        let _ = writeln!(
            out,
            " at {begin}: \"{}\"",
            excerpt(&self.input[begin.offset..end.offset])
        );
    }
}

/// Short single-line preview of input text for trace output.
fn excerpt(text: &str) -> String {
    text.chars()
        .take(10)
        .map(|ch| if ch == '\n' || ch == '\r' { '⏎' } else { ch })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc_grammar() -> (Grammar, RuleId) {
        let mut g = Grammar::new();
        let a = g.literal("a");
        let b = g.literal("b");
        let c = g.literal("c");
        let ab = g.seq(&[a, b]);
        let root = g.choice(&[ab, c]);
        g.name(root, "root");
        (g, root)
    }

    #[test]
    fn ordered_choice_first_match_wins() {
        let (g, root) = abc_grammar();
        let mut engine = Engine::new(&g, "ab");
        let end = engine.parse(root, &mut NoOpEvents).unwrap();
        assert_eq!(end.offset, 2);
    }

    #[test]
    fn failed_alternative_restores_cursor_for_the_next_one() {
        let (g, root) = abc_grammar();
        // The "ab" alternative consumes 'a' speculatively and then fails;
        // the second alternative must start back at offset 0.
        let mut engine = Engine::new(&g, "c");
        let end = engine.parse(root, &mut NoOpEvents).unwrap();
        assert_eq!(end.offset, 1);
    }

    #[test]
    fn repetition_is_greedy_and_stops_cleanly() {
        let mut g = Grammar::new();
        let a = g.literal("a");
        let root = g.star(a);
        g.name(root, "as");
        let mut engine = Engine::new(&g, "aaab");
        let end = engine.parse(root, &mut NoOpEvents).unwrap();
        assert_eq!(end.offset, 3);
    }

    #[test]
    fn plus_requires_one_occurrence() {
        let mut g = Grammar::new();
        let a = g.literal("a");
        let root = g.plus(a);
        g.name(root, "as");
        let mut engine = Engine::new(&g, "b");
        assert!(engine.parse(root, &mut NoOpEvents).is_err());
    }

    #[test]
    fn failure_reports_furthest_position_and_rule() {
        let mut g = Grammar::new();
        let kw = g.literal("goto");
        let root = g.name(kw, "goto");
        let mut engine = Engine::new(&g, "gox");
        let failure = engine.parse(root, &mut NoOpEvents).unwrap_err();
        assert_eq!(failure.offset, 0);
        assert_eq!(failure.attempted, vec!["goto"]);
    }

    #[test]
    fn cursor_tracks_lines_and_columns() {
        let mut cursor = Cursor::start();
        cursor.advance("ab\ncd");
        assert_eq!(cursor.offset, 5);
        assert_eq!(cursor.line, 2);
        assert_eq!(cursor.column, 3);
    }
}
