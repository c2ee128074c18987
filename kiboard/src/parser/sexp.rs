use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SExpError {
    #[error("Unexpected end of input")]
    UnexpectedEof,
    #[error("Unexpected token: {0}")]
    UnexpectedToken(String),
    #[error("Trailing content at position {0}")]
    TrailingContent(usize),
}

/// One node of a board document.
///
/// Quoted strings are kept apart from bare symbols so that a document can be
/// written back with the same quoting it was read with.
#[derive(Debug, Clone, PartialEq)]
pub enum SExp {
    Atom(String),
    Str(String),
    List(Vec<SExp>),
}

impl SExp {
    pub fn list<I: IntoIterator<Item = SExp>>(items: I) -> Self {
        SExp::List(items.into_iter().collect())
    }

    pub fn atom(s: impl Into<String>) -> Self {
        SExp::Atom(s.into())
    }

    /// Text of a symbol or a quoted string.
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            SExp::Atom(s) | SExp::Str(s) => Some(s),
            SExp::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[SExp]> {
        match self {
            SExp::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut Vec<SExp>> {
        match self {
            SExp::List(items) => Some(items),
            _ => None,
        }
    }

    /// Leading symbol of a list, e.g. `via` for `(via (at 1 2) ...)`.
    pub fn tag(&self) -> Option<&str> {
        self.as_list()
            .and_then(|items| items.first())
            .and_then(|first| first.as_atom())
    }

    fn is_tagged(&self, key: &str) -> bool {
        self.tag() == Some(key)
    }

    /// Value of a `(key value)` child, or the whole child when it has more
    /// than one value.
    pub fn get(&self, key: &str) -> Option<&SExp> {
        let child = self.find(key)?;
        match child.as_list() {
            Some(sublist) if sublist.len() == 2 => Some(&sublist[1]),
            Some(sublist) if sublist.len() > 2 => Some(child),
            _ => None,
        }
    }

    /// First child list tagged with `key`.
    pub fn find(&self, key: &str) -> Option<&SExp> {
        self.as_list()?.iter().find(|item| item.is_tagged(key))
    }

    pub fn find_mut(&mut self, key: &str) -> Option<&mut SExp> {
        self.as_list_mut()?.iter_mut().find(|item| item.is_tagged(key))
    }

    /// All child lists tagged with `key`.
    pub fn get_all(&self, key: &str) -> Vec<&SExp> {
        match self.as_list() {
            Some(items) => items.iter().filter(|item| item.is_tagged(key)).collect(),
            None => Vec::new(),
        }
    }

    /// Child list tagged with `key`, appended as `(key)` when missing.
    ///
    /// Returns `None` only when `self` is not a list.
    pub fn ensure_child(&mut self, key: &str) -> Option<&mut SExp> {
        let items = self.as_list_mut()?;
        let index = match items.iter().position(|item| item.is_tagged(key)) {
            Some(index) => index,
            None => {
                items.push(SExp::list([SExp::atom(key)]));
                items.len() - 1
            }
        };
        items.get_mut(index)
    }

    /// Replace the values of the `key` child with `values`, keeping its tag.
    /// The child is created when missing.
    pub fn set_values(&mut self, key: &str, values: &[String]) -> bool {
        let Some(child) = self.ensure_child(key) else {
            return false;
        };
        let Some(items) = child.as_list_mut() else {
            return false;
        };
        items.truncate(1);
        items.extend(values.iter().map(|v| SExp::Atom(v.clone())));
        true
    }

    /// Multi-line rendering with two-space indentation. Lists that only hold
    /// atoms or flat lists stay on one line.
    pub fn to_pretty_string(&self) -> String {
        let mut out = String::new();
        self.write_pretty(&mut out, 0);
        out.push('\n');
        out
    }

    fn write_pretty(&self, out: &mut String, depth: usize) {
        let items = match self {
            SExp::List(items) => items,
            atom => {
                out.push_str(&atom.to_string());
                return;
            }
        };
        let nested = items
            .iter()
            .any(|item| item.as_list().map_or(false, |l| l.iter().any(|i| i.as_list().is_some())));
        if !nested {
            out.push_str(&self.to_string());
            return;
        }
        out.push('(');
        for (i, item) in items.iter().enumerate() {
            if item.as_list().is_some() {
                out.push('\n');
                out.push_str(&"  ".repeat(depth + 1));
                item.write_pretty(out, depth + 1);
            } else {
                if i > 0 {
                    out.push(' ');
                }
                item.write_pretty(out, depth + 1);
            }
        }
        out.push('\n');
        out.push_str(&"  ".repeat(depth));
        out.push(')');
    }
}

impl fmt::Display for SExp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SExp::Atom(s) => write!(f, "{}", s),
            SExp::Str(s) => {
                let escaped = s
                    .replace('\\', "\\\\")
                    .replace('"', "\\\"")
                    .replace('\n', "\\n");
                write!(f, "\"{}\"", escaped)
            }
            SExp::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Child-index path from the document root to one node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    pub fn root() -> Self {
        NodePath(Vec::new())
    }

    pub fn child(&self, index: usize) -> Self {
        let mut path = self.0.clone();
        path.push(index);
        NodePath(path)
    }

    pub fn resolve<'a>(&self, root: &'a SExp) -> Option<&'a SExp> {
        self.0
            .iter()
            .try_fold(root, |node, &index| node.as_list()?.get(index))
    }

    pub fn resolve_mut<'a>(&self, root: &'a mut SExp) -> Option<&'a mut SExp> {
        self.0
            .iter()
            .try_fold(root, |node, &index| node.as_list_mut()?.get_mut(index))
    }
}

pub struct SExpParser {
    input: Vec<char>,
    pos: usize,
}

impl SExpParser {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
        }
    }

    /// Parse a single top-level expression; only whitespace may follow it.
    pub fn parse(&mut self) -> Result<SExp, SExpError> {
        self.skip_whitespace();
        if self.is_eof() {
            return Err(SExpError::UnexpectedEof);
        }
        let sexp = self.parse_sexp()?;
        self.skip_whitespace();
        if !self.is_eof() {
            return Err(SExpError::TrailingContent(self.pos));
        }
        Ok(sexp)
    }

    fn parse_sexp(&mut self) -> Result<SExp, SExpError> {
        self.skip_whitespace();

        if self.is_eof() {
            return Err(SExpError::UnexpectedEof);
        }

        match self.peek() {
            '(' => self.parse_list(),
            ')' => Err(SExpError::UnexpectedToken(format!(
                "unbalanced ')' at position {}",
                self.pos
            ))),
            '"' => self.parse_string(),
            _ => self.parse_symbol(),
        }
    }

    fn parse_list(&mut self) -> Result<SExp, SExpError> {
        self.expect_char('(')?;
        let mut items = Vec::new();

        loop {
            self.skip_whitespace();

            if self.is_eof() {
                return Err(SExpError::UnexpectedEof);
            }

            if self.peek() == ')' {
                self.advance();
                break;
            }

            items.push(self.parse_sexp()?);
        }

        Ok(SExp::List(items))
    }

    fn parse_string(&mut self) -> Result<SExp, SExpError> {
        self.expect_char('"')?;
        let mut s = String::new();
        let mut escaped = false;

        loop {
            if self.is_eof() {
                return Err(SExpError::UnexpectedEof);
            }
            let ch = self.peek();
            self.advance();

            if escaped {
                match ch {
                    'n' => s.push('\n'),
                    't' => s.push('\t'),
                    'r' => s.push('\r'),
                    _ => s.push(ch),
                }
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                break;
            } else {
                s.push(ch);
            }
        }

        Ok(SExp::Str(s))
    }

    fn parse_symbol(&mut self) -> Result<SExp, SExpError> {
        let mut s = String::new();

        while !self.is_eof() {
            let ch = self.peek();
            if ch.is_whitespace() || ch == '(' || ch == ')' || ch == '"' {
                break;
            }
            s.push(ch);
            self.advance();
        }

        if s.is_empty() {
            Err(SExpError::UnexpectedToken("empty symbol".to_string()))
        } else {
            Ok(SExp::Atom(s))
        }
    }

    fn skip_whitespace(&mut self) {
        while !self.is_eof() && self.peek().is_whitespace() {
            self.advance();
        }
    }

    fn peek(&self) -> char {
        self.input.get(self.pos).copied().unwrap_or('\0')
    }

    fn advance(&mut self) {
        if self.pos < self.input.len() {
            self.pos += 1;
        }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn expect_char(&mut self, expected: char) -> Result<(), SExpError> {
        if self.is_eof() {
            return Err(SExpError::UnexpectedEof);
        }

        let ch = self.peek();
        if ch == expected {
            self.advance();
            Ok(())
        } else {
            Err(SExpError::UnexpectedToken(format!(
                "Expected '{}', found '{}'",
                expected, ch
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> SExp {
        SExpParser::new(input).parse().unwrap()
    }

    #[test]
    fn test_parse_atom_and_string() {
        assert_eq!(parse("hello"), SExp::Atom("hello".to_string()));
        assert_eq!(parse("\"hello world\""), SExp::Str("hello world".to_string()));
        assert_eq!(parse("\"a \\\"b\\\"\""), SExp::Str("a \"b\"".to_string()));
    }

    #[test]
    fn test_parse_nested() {
        let result = parse("(a (b c) d)");
        let items = result.as_list().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[1].as_list().unwrap().len(), 2);
        assert_eq!(result.tag(), Some("a"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(SExpParser::new("(a (b)").parse(), Err(SExpError::UnexpectedEof)));
        assert!(matches!(SExpParser::new("\"open").parse(), Err(SExpError::UnexpectedEof)));
        assert!(matches!(SExpParser::new("(a) b").parse(), Err(SExpError::TrailingContent(_))));
        assert!(matches!(SExpParser::new(")").parse(), Err(SExpError::UnexpectedToken(_))));
        assert!(matches!(SExpParser::new("   ").parse(), Err(SExpError::UnexpectedEof)));
    }

    #[test]
    fn test_get_and_find() {
        let sexp = parse("(via (at 1 2) (size 0.6) (drill 0.3) (net 1))");
        assert_eq!(sexp.get("size").and_then(|s| s.as_atom()), Some("0.6"));
        assert_eq!(sexp.get("at").and_then(|s| s.tag()), Some("at"));
        assert!(sexp.find("layers").is_none());
        assert_eq!(parse("(x (pad 1) (pad 2) (other))").get_all("pad").len(), 2);
    }

    #[test]
    fn test_set_values_updates_and_creates() {
        let mut sexp = parse("(via (size 0.6) (net 1))");
        assert!(sexp.set_values("size", &["0.8".to_string()]));
        assert!(sexp.set_values("drill", &["0.4".to_string()]));
        assert_eq!(sexp.to_string(), "(via (size 0.8) (net 1) (drill 0.4))");
    }

    #[test]
    fn test_display_round_trip_keeps_quoting() {
        let source = "(net 2 \"Net-(R1-Pad1)\") (layer F.Cu)";
        let wrapped = format!("(x {})", source);
        let sexp = parse(&wrapped);
        assert_eq!(sexp.to_string(), wrapped);
        assert_eq!(parse(&sexp.to_pretty_string()), sexp);
    }

    #[test]
    fn test_pretty_keeps_flat_lists_inline() {
        let sexp = parse("(kicad_pcb (version 4) (module R (at 1 2) (fp_text reference R1 (effects (font (size 1 1))))))");
        let pretty = sexp.to_pretty_string();
        assert!(pretty.contains("\n  (version 4)"));
        assert!(pretty.contains("(at 1 2)"));
        assert_eq!(parse(&pretty), sexp);
    }

    #[test]
    fn test_node_path() {
        let mut sexp = parse("(a (b (c 1)) (d 2))");
        let path = NodePath::root().child(1).child(1);
        assert_eq!(path.resolve(&sexp).and_then(|n| n.tag()), Some("c"));
        if let Some(node) = path.resolve_mut(&mut sexp) {
            node.set_values("e", &["3".to_string()]);
        }
        assert_eq!(sexp.to_string(), "(a (b (c 1 (e 3))) (d 2))");
        assert!(NodePath::root().child(9).resolve(&sexp).is_none());
    }
}
