//! Grammar representation for the LB parser.
//!
//! A grammar is an arena of immutable rules built once at startup. Each rule
//! is a tagged expression over other rules, so the whole grammar forms a
//! directed graph that may contain recursion through placeholders. Rules
//! carry no runtime state; all parse state lives in the engine.

pub mod analyze;
pub mod lb;

/// Handle to a rule inside a [`Grammar`]. Cheap to copy and compare; later
/// compiler phases dispatch on the `RuleId` stored in each tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleId(u32);

impl RuleId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// The expression forms a rule can take.
///
/// Leaves match text directly; compound forms reference other rules by id.
/// `Placeholder` is a forward declaration that must be filled before the
/// grammar is used; the analyzer rejects grammars that leave one unfilled.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleExpr {
    /// Exact string match.
    Literal(&'static str),
    /// Any single character from the set.
    OneOf(&'static str),
    /// A single character in the inclusive range.
    Range(char, char),
    /// `[A-Za-z_][A-Za-z0-9_]*`.
    Identifier,
    /// `\r\n` or `\n`.
    Eol,
    /// End of input; consumes nothing.
    Eof,
    /// Everything up to and including the next line terminator (or to end of
    /// input). Always succeeds.
    RestOfLine,
    /// All parts in order; fails as a unit with the cursor restored.
    Seq(Vec<RuleId>),
    /// Ordered choice: first success wins. Listed order is load-bearing.
    Choice(Vec<RuleId>),
    /// Greedy repetition. Never backtracks into an already-matched iteration.
    Repeat { rule: RuleId, at_least_one: bool },
    /// Match the rule or consume nothing.
    Optional(RuleId),
    /// Forward declaration, see [`Grammar::placeholder`].
    Placeholder,
}

/// One rule in the arena: an expression plus optional identity.
///
/// Rules with a label show up in traces and diagnostics; rules that are also
/// captured materialize a tree node on success. Everything else is purely
/// structural.
#[derive(Debug)]
pub struct Rule {
    pub expr: RuleExpr,
    pub label: Option<&'static str>,
    pub captured: bool,
}

/// An immutable rule graph. Construction happens through the combinator
/// methods below; after that the grammar is shared read-only by the engine.
#[derive(Debug)]
pub struct Grammar {
    rules: Vec<Rule>,
}

impl Grammar {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id.index()]
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = RuleId> {
        (0..self.rules.len() as u32).map(RuleId)
    }

    /// Display name for a rule, falling back to its index for anonymous ones.
    pub fn display_name(&self, id: RuleId) -> String {
        match self.rule(id).label {
            Some(label) => label.to_string(),
            None => format!("rule#{}", id.index()),
        }
    }

    fn push(&mut self, expr: RuleExpr) -> RuleId {
        let id = RuleId(self.rules.len() as u32);
        self.rules.push(Rule {
            expr,
            label: None,
            captured: false,
        });
        id
    }

    // ------------------------------------------------------------------
    // Leaf combinators
    // ------------------------------------------------------------------

    pub fn literal(&mut self, s: &'static str) -> RuleId {
        self.push(RuleExpr::Literal(s))
    }

    pub fn one_of(&mut self, chars: &'static str) -> RuleId {
        self.push(RuleExpr::OneOf(chars))
    }

    pub fn range(&mut self, lo: char, hi: char) -> RuleId {
        self.push(RuleExpr::Range(lo, hi))
    }

    pub fn identifier(&mut self) -> RuleId {
        self.push(RuleExpr::Identifier)
    }

    pub fn eol(&mut self) -> RuleId {
        self.push(RuleExpr::Eol)
    }

    pub fn eof(&mut self) -> RuleId {
        self.push(RuleExpr::Eof)
    }

    pub fn rest_of_line(&mut self) -> RuleId {
        self.push(RuleExpr::RestOfLine)
    }

    // ------------------------------------------------------------------
    // Compound combinators
    // ------------------------------------------------------------------

    pub fn seq(&mut self, parts: &[RuleId]) -> RuleId {
        self.push(RuleExpr::Seq(parts.to_vec()))
    }

    pub fn choice(&mut self, alternatives: &[RuleId]) -> RuleId {
        self.push(RuleExpr::Choice(alternatives.to_vec()))
    }

    pub fn star(&mut self, rule: RuleId) -> RuleId {
        self.push(RuleExpr::Repeat {
            rule,
            at_least_one: false,
        })
    }

    pub fn plus(&mut self, rule: RuleId) -> RuleId {
        self.push(RuleExpr::Repeat {
            rule,
            at_least_one: true,
        })
    }

    pub fn opt(&mut self, rule: RuleId) -> RuleId {
        self.push(RuleExpr::Optional(rule))
    }

    /// `r1 sep r2 sep … sep rn`: splices `sep` between every adjacent pair.
    /// The LB grammar uses this with an optional-spaces rule so inter-token
    /// whitespace never has to be written out by hand.
    pub fn interleaved(&mut self, sep: RuleId, parts: &[RuleId]) -> RuleId {
        let mut spliced = Vec::with_capacity(parts.len() * 2);
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                spliced.push(sep);
            }
            spliced.push(*part);
        }
        self.push(RuleExpr::Seq(spliced))
    }

    /// `item (sep item)*`.
    pub fn separated(&mut self, item: RuleId, sep: RuleId) -> RuleId {
        let tail = self.seq(&[sep, item]);
        let tails = self.star(tail);
        self.seq(&[item, tails])
    }

    // ------------------------------------------------------------------
    // Naming, capture, and recursion
    // ------------------------------------------------------------------

    /// Attaches a display label to an existing rule and returns its id.
    pub fn name(&mut self, id: RuleId, label: &'static str) -> RuleId {
        self.rules[id.index()].label = Some(label);
        id
    }

    /// Labels a rule and marks it as captured: on success it produces a
    /// retained tree node spanning its match.
    pub fn capture(&mut self, id: RuleId, label: &'static str) -> RuleId {
        let rule = &mut self.rules[id.index()];
        rule.label = Some(label);
        rule.captured = true;
        id
    }

    /// Forward declaration for recursive rules. The returned id may be
    /// referenced immediately; [`Grammar::fill`] supplies the body later.
    pub fn placeholder(&mut self) -> RuleId {
        self.push(RuleExpr::Placeholder)
    }

    pub fn fill(&mut self, id: RuleId, body: RuleId) {
        debug_assert!(
            matches!(self.rules[id.index()].expr, RuleExpr::Placeholder),
            "fill() target must be an unfilled placeholder"
        );
        self.rules[id.index()].expr = RuleExpr::Seq(vec![body]);
    }
}

impl Default for Grammar {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleaved_splices_separator_between_parts() {
        let mut g = Grammar::new();
        let sep = g.literal(" ");
        let a = g.literal("a");
        let b = g.literal("b");
        let c = g.literal("c");
        let rule = g.interleaved(sep, &[a, b, c]);
        assert_eq!(g.rule(rule).expr, RuleExpr::Seq(vec![a, sep, b, sep, c]));
    }

    #[test]
    fn capture_sets_label_and_flag() {
        let mut g = Grammar::new();
        let lit = g.literal("x");
        let id = g.capture(lit, "x");
        assert!(g.rule(id).captured);
        assert_eq!(g.rule(id).label, Some("x"));
        assert_eq!(g.display_name(id), "x");
    }

    #[test]
    fn fill_replaces_placeholder() {
        let mut g = Grammar::new();
        let fwd = g.placeholder();
        let body = g.literal("y");
        g.fill(fwd, body);
        assert_eq!(g.rule(fwd).expr, RuleExpr::Seq(vec![body]));
    }
}
