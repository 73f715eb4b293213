//! Parse tree construction.
//!
//! Only rules in the grammar's captured set leave a trace in the tree;
//! everything else is structural and its matched text is absorbed into the
//! nearest enclosing captured rule's span. The builder is an [`Events`]
//! observer: it opens a scaffold when a captured rule is entered, finalizes
//! it on success, and discards it (with everything built underneath) on
//! failure, so no partial tree ever survives a failed alternative.

use serde::{Deserialize, Serialize};

use crate::engine::{Cursor, Events};
use crate::grammar::{Grammar, RuleId};

/// A `[start, end)` byte range in the source text.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// One node of the finished parse tree.
///
/// `text` borrows the matched substring from the caller-owned input buffer,
/// so the buffer must outlive the tree. Children appear in left-to-right
/// match order; every child span lies inside this node's span and child
/// spans never overlap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseNode<'src> {
    /// Identity of the rule that produced this node; later phases dispatch
    /// on it.
    #[serde(skip)]
    pub rule: RuleId,
    /// Display name of the rule, for diagnostics and export.
    pub label: &'static str,
    pub span: Span,
    pub text: &'src str,
    pub children: Vec<ParseNode<'src>>,
}

impl<'src> ParseNode<'src> {
    /// True once the node has been completed with its matched span.
    /// Scaffolds under construction never escape the builder, so every node
    /// a consumer can observe reports `true`.
    pub fn has_content(&self) -> bool {
        self.span.end >= self.span.start
    }

    pub fn child(&self, index: usize) -> &ParseNode<'src> {
        &self.children[index]
    }
}

impl<'src> std::ops::Index<usize> for ParseNode<'src> {
    type Output = ParseNode<'src>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.children[index]
    }
}

/// Restore point recorded at every rule entry so a failing rule can undo
/// exactly the scaffolds and attachments made underneath it.
#[derive(Debug, Clone, Copy)]
struct Mark {
    scaffolds: usize,
    children: usize,
}

/// [`Events`] observer that materializes a [`ParseNode`] tree for the
/// captured subset of rules.
pub struct TreeBuilder<'g, 'src> {
    grammar: &'g Grammar,
    source: &'src str,
    scaffolds: Vec<ParseNode<'src>>,
    marks: Vec<Mark>,
    root: Option<ParseNode<'src>>,
}

impl<'g, 'src> TreeBuilder<'g, 'src> {
    pub fn new(grammar: &'g Grammar, source: &'src str) -> Self {
        Self {
            grammar,
            source,
            scaffolds: Vec::new(),
            marks: Vec::new(),
            root: None,
        }
    }

    /// The finished tree, if the root rule succeeded.
    pub fn finish(self) -> Option<ParseNode<'src>> {
        self.root
    }

    fn attach_point_len(&self) -> usize {
        self.scaffolds.last().map_or(0, |s| s.children.len())
    }
}

impl<'g, 'src> Events for TreeBuilder<'g, 'src> {
    fn enter(&mut self, rule: RuleId, at: Cursor) {
        self.marks.push(Mark {
            scaffolds: self.scaffolds.len(),
            children: self.attach_point_len(),
        });
        if self.grammar.rule(rule).captured {
            self.scaffolds.push(ParseNode {
                rule,
                label: self.grammar.rule(rule).label.unwrap_or(""),
                span: Span {
                    start: at.offset,
                    end: at.offset,
                },
                text: "",
                children: Vec::new(),
            });
        }
    }

    fn success(&mut self, rule: RuleId, begin: Cursor, end: Cursor) {
        self.marks.pop();
        if !self.grammar.rule(rule).captured {
            return;
        }
        let mut node = self
            .scaffolds
            .pop()
            .expect("captured rule succeeded without an open scaffold");
        node.span = Span {
            start: begin.offset,
            end: end.offset,
        };
        node.text = &self.source[begin.offset..end.offset];
        match self.scaffolds.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.root = Some(node),
        }
    }

    fn failure(&mut self, _rule: RuleId, _at: Cursor) {
        let mark = self
            .marks
            .pop()
            .expect("failure hook without a matching enter");
        self.scaffolds.truncate(mark.scaffolds);
        if let Some(top) = self.scaffolds.last_mut() {
            top.children.truncate(mark.children);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;

    /// root := item+ ; item := ("ab" | "a") with both alternatives captured.
    fn captured_grammar() -> (Grammar, RuleId) {
        let mut g = Grammar::new();
        let ab_lit = g.literal("ab");
        let ab = g.capture(ab_lit, "ab");
        let a_lit = g.literal("a");
        let a = g.capture(a_lit, "a");
        let item = g.choice(&[ab, a]);
        let items = g.plus(item);
        let root = g.capture(items, "root");
        (g, root)
    }

    #[test]
    fn builds_children_in_match_order() {
        let (g, root) = captured_grammar();
        let source = "abab";
        let mut builder = TreeBuilder::new(&g, source);
        let mut engine = Engine::new(&g, source);
        engine.parse(root, &mut builder).unwrap();
        let tree = builder.finish().unwrap();

        assert_eq!(tree.label, "root");
        assert_eq!(tree.text, "abab");
        assert_eq!(tree.children.len(), 2);
        assert_eq!(tree[0].text, "ab");
        assert_eq!(tree[1].text, "ab");
        assert_eq!(tree[0].span, Span { start: 0, end: 2 });
        assert_eq!(tree[1].span, Span { start: 2, end: 4 });
    }

    #[test]
    fn failed_alternative_leaves_no_node_behind() {
        // "ab" wins over "a" when both could start; on "aa" the first
        // alternative fails after its speculative entry and only "a" nodes
        // may appear.
        let (g, root) = captured_grammar();
        let source = "aa";
        let mut builder = TreeBuilder::new(&g, source);
        let mut engine = Engine::new(&g, source);
        engine.parse(root, &mut builder).unwrap();
        let tree = builder.finish().unwrap();

        assert_eq!(tree.children.len(), 2);
        assert!(tree.children.iter().all(|c| c.label == "a"));
    }

    #[test]
    fn no_tree_without_a_successful_root() {
        let (g, root) = captured_grammar();
        let source = "xx";
        let mut builder = TreeBuilder::new(&g, source);
        let mut engine = Engine::new(&g, source);
        assert!(engine.parse(root, &mut builder).is_err());
        assert!(builder.finish().is_none());
    }
}
