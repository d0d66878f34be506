//! Triple type for knowledge graphs.
//!
//! A triple represents a (subject, predicate, object) statement.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A (subject, predicate, object) triple.
///
/// All three terms are plain strings. Tabular values are rendered to text
/// before they become part of a triple.
///
/// # Example
///
/// ```rust
/// use lattix_core::Triple;
///
/// let triple = Triple::new("setosa", "has_sepal_length", "5.1");
/// assert_eq!(triple.subject, "setosa");
/// assert_eq!(triple.predicate, "has_sepal_length");
/// assert_eq!(triple.object, "5.1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Triple {
    /// Subject entity.
    pub subject: String,
    /// Predicate (relation label).
    pub predicate: String,
    /// Object entity.
    pub object: String,
}

impl Triple {
    /// Create a new triple.
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }

    /// Borrow the three terms as an array, in (s, p, o) order.
    pub fn as_array(&self) -> [&str; 3] {
        [&self.subject, &self.predicate, &self.object]
    }

    /// Parse from N-Triples format.
    ///
    /// Accepts `<s> <p> <o> .` as well as a quoted literal in object position.
    /// Surrounding `<...>` and quotes are stripped, and `\uXXXX`,
    /// `\UXXXXXXXX`, `\n`, `\r`, `\t`, `\"` and `\\` escapes are decoded.
    pub fn from_ntriples(line: &str) -> Result<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Err(Error::ParseTriple("Empty or comment line".into()));
        }

        let mut parts = Vec::new();
        let mut current = String::new();
        let mut in_uri = false;
        let mut in_literal = false;
        let mut chars = line.chars();

        while let Some(c) = chars.next() {
            match c {
                '\\' if in_uri || in_literal => {
                    current.push(unescape(&mut chars, line)?);
                }
                '<' if !in_literal && !in_uri => {
                    in_uri = true;
                }
                '>' if in_uri => {
                    in_uri = false;
                    parts.push(std::mem::take(&mut current));
                }
                '"' if !in_uri => {
                    if in_literal {
                        parts.push(std::mem::take(&mut current));
                    }
                    in_literal = !in_literal;
                }
                '.' if !in_uri && !in_literal && parts.len() >= 3 => break,
                _ if in_uri || in_literal => current.push(c),
                _ => {}
            }
        }

        if parts.len() < 3 {
            return Err(Error::ParseTriple(format!(
                "Expected 3 terms, got {}: {}",
                parts.len(),
                line
            )));
        }

        let mut parts = parts.into_iter();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(s), Some(p), Some(o)) => Ok(Self::new(s, p, o)),
            _ => Err(Error::ParseTriple(line.to_string())),
        }
    }

    /// Convert to N-Triples format.
    ///
    /// The object is written as a literal: tabular values (numbers, labels)
    /// are rarely IRIs. Characters an IRI may not contain are written as
    /// `\uXXXX` escapes, so any string survives [`Triple::from_ntriples`].
    pub fn to_ntriples(&self) -> String {
        format!(
            "<{}> <{}> \"{}\" .",
            escape_iri(&self.subject),
            escape_iri(&self.predicate),
            escape_literal(&self.object)
        )
    }
}

/// Decode the escape following a backslash.
fn unescape(chars: &mut std::str::Chars<'_>, line: &str) -> Result<char> {
    let bad = || Error::ParseTriple(format!("Invalid escape in: {line}"));
    let hex = |chars: &mut std::str::Chars<'_>, n: usize| {
        let digits: String = chars.take(n).collect();
        if digits.len() != n || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32)
    };

    match chars.next().ok_or_else(bad)? {
        'n' => Ok('\n'),
        'r' => Ok('\r'),
        't' => Ok('\t'),
        'b' => Ok('\u{8}'),
        'f' => Ok('\u{c}'),
        '"' => Ok('"'),
        '\'' => Ok('\''),
        '\\' => Ok('\\'),
        'u' => hex(chars, 4).ok_or_else(bad),
        'U' => hex(chars, 8).ok_or_else(bad),
        _ => Err(bad()),
    }
}

fn escape_iri(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c <= ' ' || matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\') {
            out.push_str(&format!("\\u{:04X}", c as u32));
        } else {
            out.push(c);
        }
    }
    out
}

fn escape_literal(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            _ => out.push(c),
        }
    }
    out
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.subject, self.predicate, self.object)
    }
}

impl<S: Into<String>> From<(S, S, S)> for Triple {
    fn from((s, p, o): (S, S, S)) -> Self {
        Self::new(s, p, o)
    }
}
