//! A small Jinja-style template language.
//!
//! Supported syntax:
//!
//! | Syntax | Meaning |
//! |--------|---------|
//! | `{{ seller_name }}`, `{{ item.net_amount }}` | Value lookup, HTML-escaped; undefined renders empty |
//! | `{% for item in items %}…{% endfor %}` | Loop over a list, with `loop.index`, `loop.index0`, `loop.first`, `loop.last`, `loop.length` |
//! | `{% if path %}…{% else %}…{% endif %}` | Truthiness test, also `if not path` |
//! | `{% if tax_split == "intra_state" %}` | Comparison with a string literal (`==`, `!=`) |
//! | `{# … #}` | Comment |
//!
//! Numeric path segments index into lists (`items.0.description`).

use std::borrow::Cow;

use once_cell::sync::Lazy;
use quick_xml::escape::escape;
use regex::Regex;
use serde_json::{Value, json};

use crate::core::CollaboratorError;

static TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{\{(.*?)\}\}|\{%(.*?)%\}|\{#.*?#\}").unwrap());

static PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z0-9_]+)*$").unwrap());

static CONDITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(not\s+)?([^\s=!"]+)(?:\s*(==|!=)\s*"([^"]*)")?$"#).unwrap()
});

fn syntax(message: impl Into<String>) -> CollaboratorError {
    CollaboratorError::Template(message.into())
}

/// Dotted lookup path, e.g. `item.net_amount`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Path(Vec<String>);

impl Path {
    fn parse(text: &str) -> Result<Self, CollaboratorError> {
        let text = text.trim();
        if !PATH.is_match(text) {
            return Err(syntax(format!("invalid expression '{text}'")));
        }
        Ok(Self(text.split('.').map(str::to_string).collect()))
    }

    fn display(&self) -> String {
        self.0.join(".")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Comparison {
    Truthy,
    Equals(String),
    NotEquals(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Condition {
    negated: bool,
    path: Path,
    comparison: Comparison,
}

impl Condition {
    fn parse(text: &str) -> Result<Self, CollaboratorError> {
        let caps = CONDITION
            .captures(text.trim())
            .ok_or_else(|| syntax(format!("invalid condition '{}'", text.trim())))?;
        let path = Path::parse(&caps[2])?;
        let literal = caps.get(4).map(|m| m.as_str().to_string()).unwrap_or_default();
        let comparison = match caps.get(3).map(|m| m.as_str()) {
            Some("==") => Comparison::Equals(literal),
            Some(_) => Comparison::NotEquals(literal),
            None => Comparison::Truthy,
        };
        Ok(Self {
            negated: caps.get(1).is_some(),
            path,
            comparison,
        })
    }

    fn holds(&self, value: Option<&Value>) -> bool {
        let result = match &self.comparison {
            Comparison::Truthy => value.is_some_and(is_truthy),
            Comparison::Equals(literal) => value.and_then(Value::as_str) == Some(literal.as_str()),
            Comparison::NotEquals(literal) => value.and_then(Value::as_str) != Some(literal.as_str()),
        };
        result != self.negated
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Text(String),
    Expr(Path),
    For {
        var: String,
        list: Path,
        body: Vec<Node>,
    },
    If {
        condition: Condition,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
}

enum Token<'a> {
    Text(&'a str),
    Expr(Path),
    For { var: String, list: Path },
    EndFor,
    If(Condition),
    Else,
    EndIf,
}

/// Where a nested block stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    Eof,
    EndFor,
    Else,
    EndIf,
}

impl Stop {
    fn tag(self) -> &'static str {
        match self {
            Self::Eof => "end of template",
            Self::EndFor => "{% endfor %}",
            Self::Else => "{% else %}",
            Self::EndIf => "{% endif %}",
        }
    }
}

/// A parsed template, reusable across renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    /// Parse template source. Fails on unclosed or stray block tags, unknown
    /// statements and malformed expressions.
    pub fn parse(source: &str) -> Result<Self, CollaboratorError> {
        let tokens = tokenize(source)?;
        let mut iter = tokens.into_iter();
        let (nodes, stop) = parse_nodes(&mut iter, 0)?;
        if stop != Stop::Eof {
            return Err(syntax(format!("unexpected {}", stop.tag())));
        }
        Ok(Self { nodes })
    }

    /// Render against a JSON context (normally an object).
    pub fn render(&self, context: &Value) -> Result<String, CollaboratorError> {
        let mut out = String::new();
        let mut scope = Scope {
            root: context,
            frames: Vec::new(),
        };
        render_nodes(&self.nodes, &mut scope, &mut out)?;
        Ok(out)
    }
}

fn tokenize(source: &str) -> Result<Vec<Token<'_>>, CollaboratorError> {
    let mut tokens = Vec::new();
    let mut last = 0;

    for caps in TAG.captures_iter(source) {
        let Some(whole) = caps.get(0) else { continue };
        push_text(&mut tokens, &source[last..whole.start()])?;
        last = whole.end();

        if let Some(expr) = caps.get(1) {
            tokens.push(Token::Expr(Path::parse(expr.as_str())?));
        } else if let Some(stmt) = caps.get(2) {
            tokens.push(statement(stmt.as_str())?);
        }
    }
    push_text(&mut tokens, &source[last..])?;
    Ok(tokens)
}

fn push_text<'a>(tokens: &mut Vec<Token<'a>>, text: &'a str) -> Result<(), CollaboratorError> {
    for opener in ["{{", "{%", "{#"] {
        if text.contains(opener) {
            return Err(syntax(format!("unclosed '{opener}' tag")));
        }
    }
    if !text.is_empty() {
        tokens.push(Token::Text(text));
    }
    Ok(())
}

fn statement(text: &str) -> Result<Token<'static>, CollaboratorError> {
    let text = text.trim();
    let (keyword, rest) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
    let rest = rest.trim();

    match keyword {
        "for" => {
            let words: Vec<&str> = rest.split_whitespace().collect();
            match words.as_slice() {
                [var, "in", list] if PATH.is_match(var) && !var.contains('.') => Ok(Token::For {
                    var: var.to_string(),
                    list: Path::parse(list)?,
                }),
                _ => Err(syntax(format!("invalid for loop '{text}'"))),
            }
        }
        "if" => Ok(Token::If(Condition::parse(rest)?)),
        "else" if rest.is_empty() => Ok(Token::Else),
        "endfor" if rest.is_empty() => Ok(Token::EndFor),
        "endif" if rest.is_empty() => Ok(Token::EndIf),
        _ => Err(syntax(format!("unknown statement '{text}'"))),
    }
}

/// Deepest allowed nesting of `for` and `if` blocks.
const MAX_NESTING: usize = 64;

fn parse_nodes<'a>(
    tokens: &mut impl Iterator<Item = Token<'a>>,
    depth: usize,
) -> Result<(Vec<Node>, Stop), CollaboratorError> {
    let mut nodes = Vec::new();
    while let Some(token) = tokens.next() {
        if matches!(token, Token::For { .. } | Token::If(_)) && depth >= MAX_NESTING {
            return Err(syntax(format!("blocks nested deeper than {MAX_NESTING}")));
        }
        match token {
            Token::Text(text) => nodes.push(Node::Text(text.to_string())),
            Token::Expr(path) => nodes.push(Node::Expr(path)),
            Token::For { var, list } => {
                let (body, stop) = parse_nodes(tokens, depth + 1)?;
                if stop != Stop::EndFor {
                    return Err(syntax(format!(
                        "for loop over '{}' closed by {}",
                        list.display(),
                        stop.tag()
                    )));
                }
                nodes.push(Node::For { var, list, body });
            }
            Token::If(condition) => {
                let (then, stop) = parse_nodes(tokens, depth + 1)?;
                let otherwise = match stop {
                    Stop::EndIf => Vec::new(),
                    Stop::Else => match parse_nodes(tokens, depth + 1)? {
                        (otherwise, Stop::EndIf) => otherwise,
                        (_, stop) => {
                            return Err(syntax(format!("else block closed by {}", stop.tag())));
                        }
                    },
                    stop => {
                        return Err(syntax(format!("if block closed by {}", stop.tag())));
                    }
                };
                nodes.push(Node::If {
                    condition,
                    then,
                    otherwise,
                });
            }
            Token::EndFor => return Ok((nodes, Stop::EndFor)),
            Token::Else => return Ok((nodes, Stop::Else)),
            Token::EndIf => return Ok((nodes, Stop::EndIf)),
        }
    }
    Ok((nodes, Stop::Eof))
}

/// Loop variables shadow the root context, innermost first.
struct Scope<'a> {
    root: &'a Value,
    frames: Vec<(String, Value)>,
}

impl Scope<'_> {
    fn lookup(&self, path: &Path) -> Option<&Value> {
        let (head, tail) = path.0.split_first()?;
        let start = self
            .frames
            .iter()
            .rev()
            .find(|(name, _)| name == head)
            .map(|(_, value)| value)
            .or_else(|| self.root.get(head.as_str()))?;

        tail.iter().try_fold(start, |value, segment| match value {
            Value::Array(list) => segment.parse::<usize>().ok().and_then(|i| list.get(i)),
            _ => value.get(segment.as_str()),
        })
    }
}

fn render_nodes(
    nodes: &[Node],
    scope: &mut Scope<'_>,
    out: &mut String,
) -> Result<(), CollaboratorError> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Expr(path) => {
                if let Some(value) = scope.lookup(path) {
                    out.push_str(&escape(display(value).as_ref()));
                }
            }
            Node::If {
                condition,
                then,
                otherwise,
            } => {
                let branch = if condition.holds(scope.lookup(&condition.path)) {
                    then
                } else {
                    otherwise
                };
                render_nodes(branch, scope, out)?;
            }
            Node::For { var, list, body } => {
                let items = match scope.lookup(list) {
                    None | Some(Value::Null) => Vec::new(),
                    Some(Value::Array(items)) => items.clone(),
                    Some(_) => {
                        return Err(syntax(format!("'{}' is not a list", list.display())));
                    }
                };
                let length = items.len();
                for (index, item) in items.into_iter().enumerate() {
                    let meta = json!({
                        "index": index + 1,
                        "index0": index,
                        "first": index == 0,
                        "last": index + 1 == length,
                        "length": length,
                    });
                    scope.frames.push(("loop".to_string(), meta));
                    scope.frames.push((var.clone(), item));
                    let result = render_nodes(body, scope, out);
                    scope.frames.truncate(scope.frames.len() - 2);
                    result?;
                }
            }
        }
    }
    Ok(())
}

fn display(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Null => Cow::Borrowed(""),
        Value::String(s) => Cow::Borrowed(s),
        Value::Bool(b) => Cow::Owned(b.to_string()),
        Value::Number(n) => Cow::Owned(n.to_string()),
        other => Cow::Owned(other.to_string()),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
