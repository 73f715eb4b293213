//! Graphviz export of a finished parse tree.
//!
//! A pure consumer: it reads labels, matched text, and child order off the
//! tree and feeds nothing back into parsing. Render with e.g.
//! `dot -Tsvg tree.dot -o tree.svg`.

use std::io;

use crate::tree::ParseNode;

/// Writes the tree as a Graphviz digraph, one graph node per tree node
/// labeled `rule: "matched text"`, edges in child order.
pub fn write_dot<W: io::Write>(out: &mut W, root: &ParseNode<'_>) -> io::Result<()> {
    writeln!(out, "digraph parse_tree {{")?;
    writeln!(out, "  node [shape=box];")?;
    let mut counter = 0usize;
    emit(out, root, &mut counter)?;
    writeln!(out, "}}")
}

fn emit<W: io::Write>(out: &mut W, node: &ParseNode<'_>, counter: &mut usize) -> io::Result<usize> {
    let id = *counter;
    *counter += 1;
    writeln!(
        out,
        "  n{} [label=\"{}: \\\"{}\\\"\"];",
        id,
        node.label,
        escape(node.text)
    )?;
    for child in &node.children {
        let child_id = emit(out, child, counter)?;
        writeln!(out, "  n{} -> n{};", id, child_id)?;
    }
    Ok(id)
}

/// Escapes text for use inside a dot double-quoted label.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::SourceContext;

    #[test]
    fn dot_output_contains_every_captured_node() {
        let source = "void main() {\n  x <- 1\n}\n";
        let ctx = SourceContext::from_file("main.lb", source);
        let tree = parse(source, &ctx).unwrap();

        let mut buffer = Vec::new();
        write_dot(&mut buffer, &tree).unwrap();
        let dot = String::from_utf8(buffer).unwrap();

        assert!(dot.starts_with("digraph parse_tree {"));
        assert!(dot.contains("program"));
        assert!(dot.contains("function"));
        assert!(dot.contains("assign"));
        assert!(dot.trim_end().ends_with('}'));
    }

    #[test]
    fn escape_handles_quotes_backslashes_and_newlines() {
        assert_eq!(escape(r#"a"b"#), r#"a\"b"#);
        assert_eq!(escape(r"a\b"), r"a\\b");
        assert_eq!(escape("a\nb"), r"a\nb");
    }
}
