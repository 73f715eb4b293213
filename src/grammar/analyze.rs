//! Static well-formedness analysis of a rule graph.
//!
//! Runs once over the whole grammar before any input is read. It detects the
//! structural defects the rule representation can diagnose without parsing:
//! rules that can be re-entered without the cursor advancing, repetition over
//! a rule that can match empty input, and unfilled placeholders. Any defect
//! aborts the whole run; this never depends on user input.

use super::{Grammar, RuleExpr, RuleId};

/// A single structural problem found in the grammar.
#[derive(Debug, Clone, PartialEq)]
pub struct Defect {
    /// Display name of the offending rule.
    pub rule: String,
    pub message: String,
}

impl std::fmt::Display for Defect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.rule, self.message)
    }
}

/// Checks the whole grammar, returning every defect found.
pub fn analyze(grammar: &Grammar) -> Result<(), Vec<Defect>> {
    let nullable = compute_nullable(grammar);
    let mut defects = Vec::new();

    for id in grammar.ids() {
        match &grammar.rule(id).expr {
            RuleExpr::Placeholder => defects.push(Defect {
                rule: grammar.display_name(id),
                message: "placeholder was never filled".to_string(),
            }),
            RuleExpr::Repeat { rule, .. } if nullable[rule.index()] => defects.push(Defect {
                rule: grammar.display_name(id),
                message: "repetition over a rule that can match empty input".to_string(),
            }),
            _ => {}
        }
    }

    detect_unguarded_recursion(grammar, &nullable, &mut defects);

    if defects.is_empty() {
        Ok(())
    } else {
        Err(defects)
    }
}

/// Fixpoint over "can this rule succeed without consuming input".
fn compute_nullable(grammar: &Grammar) -> Vec<bool> {
    let mut nullable = vec![false; grammar.len()];
    let mut changed = true;
    while changed {
        changed = false;
        for id in grammar.ids() {
            if nullable[id.index()] {
                continue;
            }
            let now = match &grammar.rule(id).expr {
                RuleExpr::Literal(s) => s.is_empty(),
                RuleExpr::OneOf(_)
                | RuleExpr::Range(_, _)
                | RuleExpr::Identifier
                | RuleExpr::Eol => false,
                // Succeeds without consuming anything.
                RuleExpr::Eof => true,
                // Matches empty at end of input.
                RuleExpr::RestOfLine => true,
                RuleExpr::Seq(parts) => parts.iter().all(|p| nullable[p.index()]),
                RuleExpr::Choice(alts) => alts.iter().any(|a| nullable[a.index()]),
                RuleExpr::Repeat { rule, at_least_one } => {
                    !at_least_one || nullable[rule.index()]
                }
                RuleExpr::Optional(_) => true,
                RuleExpr::Placeholder => false,
            };
            if now {
                nullable[id.index()] = true;
                changed = true;
            }
        }
    }
    nullable
}

/// Edges a rule can take before any input is guaranteed to be consumed.
fn head_edges(grammar: &Grammar, nullable: &[bool], id: RuleId) -> Vec<RuleId> {
    match &grammar.rule(id).expr {
        RuleExpr::Seq(parts) => {
            // Every prefix that can be crossed on empty input, plus the
            // first rule that must consume.
            let mut heads = Vec::new();
            for part in parts {
                heads.push(*part);
                if !nullable[part.index()] {
                    break;
                }
            }
            heads
        }
        RuleExpr::Choice(alts) => alts.clone(),
        RuleExpr::Repeat { rule, .. } | RuleExpr::Optional(rule) => vec![*rule],
        _ => Vec::new(),
    }
}

fn detect_unguarded_recursion(grammar: &Grammar, nullable: &[bool], defects: &mut Vec<Defect>) {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Unvisited,
        InProgress,
        Done,
    }

    fn visit(
        grammar: &Grammar,
        nullable: &[bool],
        id: RuleId,
        states: &mut [State],
        flagged: &mut Vec<RuleId>,
    ) {
        match states[id.index()] {
            State::Done => return,
            State::InProgress => {
                if !flagged.contains(&id) {
                    flagged.push(id);
                }
                return;
            }
            State::Unvisited => {}
        }
        states[id.index()] = State::InProgress;
        for next in head_edges(grammar, nullable, id) {
            visit(grammar, nullable, next, states, flagged);
        }
        states[id.index()] = State::Done;
    }

    let mut states = vec![State::Unvisited; grammar.len()];
    let mut flagged = Vec::new();
    for id in grammar.ids() {
        visit(grammar, nullable, id, &mut states, &mut flagged);
    }

    for id in flagged {
        defects.push(Defect {
            rule: grammar.display_name(id),
            message: "can recurse without consuming input".to_string(),
        });
    }
}
