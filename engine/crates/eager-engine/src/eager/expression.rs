//! Parser for eager-load expressions, for executors consuming the compiled form.
//!
//! ```text
//! expression := "" | list
//! list       := "[" segment ("," segment)* "]" | segment
//! segment    := (alias ":")? name ("(" name ("," name)* ")")? ("." list)?
//! ```
//!
//! An aliased segment attaches its rows under the alias instead of the relation name.

use std::fmt;

use itertools::Itertools;

/// One relation of an eager expression with the modifiers to apply to its query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationNode {
    pub name: String,
    pub alias: Option<String>,
    pub modifiers: Vec<String>,
    pub children: Vec<RelationNode>,
}

impl RelationNode {
    /// Where the loaded rows go in their owner row.
    pub fn key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

impl fmt::Display for RelationNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(alias) = &self.alias {
            write!(f, "{alias}:")?;
        }

        f.write_str(&self.name)?;

        if !self.modifiers.is_empty() {
            write!(f, "({})", self.modifiers.join(", "))?;
        }

        match self.children.as_slice() {
            [] => Ok(()),
            [child] => write!(f, ".{child}"),
            children => write!(f, ".[{}]", children.iter().join(", ")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed eager expression at offset {offset}: {message}")]
pub struct ExpressionError {
    pub offset: usize,
    pub message: String,
}

/// The compiled form of `nodes`, empty when there is nothing to load.
pub fn render(nodes: &[RelationNode]) -> String {
    if nodes.is_empty() {
        return String::new();
    }

    format!("[{}]", nodes.iter().join(", "))
}

pub fn parse(input: &str) -> Result<Vec<RelationNode>, ExpressionError> {
    let mut parser = Parser { input, position: 0 };

    if parser.peek().is_none() {
        return Ok(Vec::new());
    }

    let nodes = parser.list()?;

    match parser.peek() {
        Some(c) => Err(parser.error(format!("unexpected `{}`", c as char))),
        None => Ok(nodes),
    }
}

struct Parser<'a> {
    input: &'a str,
    position: usize,
}

impl Parser<'_> {
    fn list(&mut self) -> Result<Vec<RelationNode>, ExpressionError> {
        if !self.eat(b'[') {
            return Ok(vec![self.segment()?]);
        }

        let mut nodes = vec![self.segment()?];

        while self.eat(b',') {
            nodes.push(self.segment()?);
        }

        self.expect(b']')?;

        Ok(nodes)
    }

    fn segment(&mut self) -> Result<RelationNode, ExpressionError> {
        let mut name = self.name()?;
        let mut alias = None;

        if self.eat(b':') {
            alias = Some(std::mem::replace(&mut name, self.name()?));
        }

        let mut modifiers = Vec::new();

        if self.eat(b'(') {
            modifiers.push(self.name()?);

            while self.eat(b',') {
                modifiers.push(self.name()?);
            }

            self.expect(b')')?;
        }

        let children = if self.eat(b'.') { self.list()? } else { Vec::new() };

        Ok(RelationNode {
            name,
            alias,
            modifiers,
            children,
        })
    }

    fn name(&mut self) -> Result<String, ExpressionError> {
        self.skip_whitespace();

        let start = self.position;
        let length = self.input[start..]
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || matches!(*b, b'_' | b'$'))
            .count();

        if length == 0 {
            return Err(self.error("expected a name"));
        }

        self.position += length;

        Ok(self.input[start..self.position].to_string())
    }

    fn skip_whitespace(&mut self) {
        self.position += self.input[self.position..]
            .bytes()
            .take_while(u8::is_ascii_whitespace)
            .count();
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_whitespace();
        self.input.as_bytes().get(self.position).copied()
    }

    fn eat(&mut self, expected: u8) -> bool {
        if self.peek() == Some(expected) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: u8) -> Result<(), ExpressionError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected `{}`", expected as char)))
        }
    }

    fn error(&self, message: impl Into<String>) -> ExpressionError {
        ExpressionError {
            offset: self.position,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str, modifiers: &[&str], children: Vec<RelationNode>) -> RelationNode {
        RelationNode {
            name: name.to_string(),
            alias: None,
            modifiers: modifiers.iter().map(ToString::to_string).collect(),
            children,
        }
    }

    #[test]
    fn empty() {
        assert_eq!(Vec::<RelationNode>::new(), parse("").unwrap());
        assert_eq!(Vec::<RelationNode>::new(), parse("  ").unwrap());
    }

    #[test]
    fn compiled_form() {
        let nodes = parse("[posts(s0, f1).[comments(s2), tags(s3)], author.posts(f4)]").unwrap();

        assert_eq!(
            vec![
                node(
                    "posts",
                    &["s0", "f1"],
                    vec![node("comments", &["s2"], vec![]), node("tags", &["s3"], vec![])]
                ),
                node("author", &[], vec![node("posts", &["f4"], vec![])]),
            ],
            nodes
        );
    }

    #[test]
    fn aliased_segments() {
        let nodes = parse("[recent:posts(s0, f1), oldest:posts(f2).author]").unwrap();

        let keys = nodes.iter().map(RelationNode::key).collect::<Vec<_>>();
        assert_eq!(vec!["recent", "oldest"], keys);
        assert!(nodes.iter().all(|node| node.name == "posts"));
        assert_eq!(vec!["s0", "f1"], nodes[0].modifiers);
        assert_eq!("author", nodes[1].children[0].key());
    }

    #[test]
    fn render_is_the_inverse_of_parse() {
        for expression in [
            "",
            "[posts]",
            "[posts(s0, f1).[comments(s2), tags(s3)], author.posts(f4)]",
            "[a:posts(s0).author(s1), b:posts(s2, f3).comments]",
        ] {
            assert_eq!(expression, render(&parse(expression).unwrap()));
        }
    }

    #[test]
    fn bare_segment() {
        assert_eq!(vec![node("posts", &[], vec![])], parse("posts").unwrap());
    }

    #[test]
    fn errors() {
        insta::assert_snapshot!(parse("[posts(s0").unwrap_err(), @"malformed eager expression at offset 9: expected `)`");
        insta::assert_snapshot!(parse("[posts, ]").unwrap_err(), @"malformed eager expression at offset 8: expected a name");
        insta::assert_snapshot!(parse("[posts] x").unwrap_err(), @"malformed eager expression at offset 8: unexpected `x`");
        insta::assert_snapshot!(parse("[recent:]").unwrap_err(), @"malformed eager expression at offset 8: expected a name");
    }
}
