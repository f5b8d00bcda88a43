//! A small where-clause evaluator for local attribute tables.
//!
//! Supported grammar (keywords are case-insensitive):
//!
//! ```text
//! clause     := condition ( AND condition )*
//! condition  := operand op operand
//!             | operand IS [NOT] NULL
//! op         := = | != | <> | < | <= | > | >=
//! operand    := field | number | 'text'
//! ```
//!
//! Anything else is rejected with [`ConnectorError::Filter`].

use crate::core::error::ConnectorError;
use crate::zonal::records::Record;
use serde_json::Value as Json;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Number(f64),
    Text(String),
    Op(Op),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Field(String),
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Compare(Operand, Op, Operand),
    IsNull(Operand, bool),
}

/// A parsed where clause: a conjunction of conditions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WhereClause {
    conditions: Vec<Condition>,
}

impl WhereClause {
    /// Parse a where clause. Blank text matches every record.
    pub fn parse(text: &str) -> Result<Self, ConnectorError> {
        let tokens = tokenize(text)?;
        let mut conditions = Vec::new();
        let mut rest = tokens.as_slice();
        while !rest.is_empty() {
            let (condition, tail) = parse_condition(rest, text)?;
            conditions.push(condition);
            rest = match tail {
                [] => tail,
                [Token::Ident(kw), more @ ..] if kw.eq_ignore_ascii_case("and") && !more.is_empty() => more,
                _ => return Err(unsupported(text)),
            };
        }
        Ok(Self { conditions })
    }

    /// Whether a record satisfies every condition.
    pub fn matches(&self, record: &Record) -> bool {
        self.conditions.iter().all(|c| c.matches(record))
    }

    /// Whether the clause has no conditions.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

fn unsupported(text: &str) -> ConnectorError {
    ConnectorError::Filter(text.trim().to_string())
}

fn tokenize(text: &str) -> Result<Vec<Token>, ConnectorError> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c == '\'' {
            let mut value = String::new();
            i += 1;
            loop {
                match chars.get(i) {
                    None => return Err(unsupported(text)),
                    Some('\'') if chars.get(i + 1) == Some(&'\'') => {
                        value.push('\'');
                        i += 2;
                    }
                    Some('\'') => {
                        i += 1;
                        break;
                    }
                    Some(&ch) => {
                        value.push(ch);
                        i += 1;
                    }
                }
            }
            tokens.push(Token::Text(value));
        } else if c.is_ascii_digit() || c == '.' || (c == '-' && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit() || *n == '.')) {
            let start = i;
            i += 1;
            while i < chars.len() && (chars[i].is_ascii_digit() || matches!(chars[i], '.' | 'e' | 'E')) {
                i += 1;
            }
            let literal: String = chars[start..i].iter().collect();
            let number = literal.parse::<f64>().map_err(|_| unsupported(text))?;
            tokens.push(Token::Number(number));
        } else if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(Token::Ident(chars[start..i].iter().collect()));
        } else {
            let next = chars.get(i + 1).copied();
            let (op, width) = match (c, next) {
                ('<', Some('=')) => (Op::Le, 2),
                ('>', Some('=')) => (Op::Ge, 2),
                ('<', Some('>')) | ('!', Some('=')) => (Op::Ne, 2),
                ('=', _) => (Op::Eq, 1),
                ('<', _) => (Op::Lt, 1),
                ('>', _) => (Op::Gt, 1),
                _ => return Err(unsupported(text)),
            };
            tokens.push(Token::Op(op));
            i += width;
        }
    }
    Ok(tokens)
}

fn operand(token: &Token) -> Option<Operand> {
    match token {
        Token::Ident(name) if !is_keyword(name) => Some(Operand::Field(name.clone())),
        Token::Number(n) => Some(Operand::Number(*n)),
        Token::Text(s) => Some(Operand::Text(s.clone())),
        _ => None,
    }
}

fn is_keyword(word: &str) -> bool {
    ["and", "or", "not", "is", "null", "in", "like"]
        .iter()
        .any(|kw| word.eq_ignore_ascii_case(kw))
}

fn keyword(token: Option<&Token>, word: &str) -> bool {
    matches!(token, Some(Token::Ident(w)) if w.eq_ignore_ascii_case(word))
}

fn parse_condition<'a>(tokens: &'a [Token], text: &str) -> Result<(Condition, &'a [Token]), ConnectorError> {
    let left = tokens.first().and_then(operand).ok_or_else(|| unsupported(text))?;
    match tokens.get(1) {
        Some(Token::Op(op)) => {
            let right = tokens.get(2).and_then(operand).ok_or_else(|| unsupported(text))?;
            Ok((Condition::Compare(left, *op, right), &tokens[3..]))
        }
        t if keyword(t, "is") => {
            if keyword(tokens.get(2), "null") {
                Ok((Condition::IsNull(left, true), &tokens[3..]))
            } else if keyword(tokens.get(2), "not") && keyword(tokens.get(3), "null") {
                Ok((Condition::IsNull(left, false), &tokens[4..]))
            } else {
                Err(unsupported(text))
            }
        }
        _ => Err(unsupported(text)),
    }
}

#[derive(Debug, PartialEq)]
enum Scalar<'a> {
    Null,
    Number(f64),
    Text(&'a str),
}

impl Operand {
    fn resolve<'a>(&'a self, record: &'a Record) -> Scalar<'a> {
        match self {
            Operand::Number(n) => Scalar::Number(*n),
            Operand::Text(s) => Scalar::Text(s),
            Operand::Field(name) => {
                let value = record.get(name.as_str()).or_else(|| {
                    record
                        .iter()
                        .find(|(k, _)| k.eq_ignore_ascii_case(name))
                        .map(|(_, v)| v)
                });
                match value {
                    Some(Json::Number(n)) => n.as_f64().map(Scalar::Number).unwrap_or(Scalar::Null),
                    Some(Json::String(s)) => Scalar::Text(s),
                    Some(Json::Bool(b)) => Scalar::Number(if *b { 1.0 } else { 0.0 }),
                    _ => Scalar::Null,
                }
            }
        }
    }
}

fn compare(left: &Scalar<'_>, right: &Scalar<'_>) -> Option<Ordering> {
    match (left, right) {
        (Scalar::Number(a), Scalar::Number(b)) => a.partial_cmp(b),
        (Scalar::Text(a), Scalar::Text(b)) => Some(a.cmp(b)),
        (Scalar::Number(a), Scalar::Text(b)) => b.trim().parse::<f64>().ok().and_then(|b| a.partial_cmp(&b)),
        (Scalar::Text(a), Scalar::Number(b)) => a.trim().parse::<f64>().ok().and_then(|a| a.partial_cmp(b)),
        _ => None,
    }
}

impl Condition {
    fn matches(&self, record: &Record) -> bool {
        match self {
            Condition::IsNull(operand, want_null) => {
                (operand.resolve(record) == Scalar::Null) == *want_null
            }
            Condition::Compare(left, op, right) => {
                let Some(ordering) = compare(&left.resolve(record), &right.resolve(record)) else {
                    return false;
                };
                match op {
                    Op::Eq => ordering == Ordering::Equal,
                    Op::Ne => ordering != Ordering::Equal,
                    Op::Lt => ordering == Ordering::Less,
                    Op::Le => ordering != Ordering::Greater,
                    Op::Gt => ordering == Ordering::Greater,
                    Op::Ge => ordering != Ordering::Less,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Json) -> Record {
        match value {
            Json::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_blank_clause_matches_everything() {
        let clause = WhereClause::parse("  ").unwrap();
        assert!(clause.is_empty());
        assert!(clause.matches(&record(json!({}))));
    }

    #[test]
    fn test_comparisons() {
        let r = record(json!({"height": 12.5, "kind": "oak", "count": "7"}));
        let cases = [
            ("height > 10", true),
            ("height >= 12.5", true),
            ("height < 12.5", false),
            ("HEIGHT <= 13", true),
            ("kind = 'oak'", true),
            ("kind <> 'pine'", true),
            ("kind != 'oak'", false),
            ("count = 7", true),
            ("1 = 1", true),
            ("height > -1", true),
        ];
        for (text, expected) in cases {
            assert_eq!(WhereClause::parse(text).unwrap().matches(&r), expected, "{}", text);
        }
    }

    #[test]
    fn test_conjunction_and_null_checks() {
        let r = record(json!({"a": 1, "b": null}));
        assert!(WhereClause::parse("a = 1 AND b IS NULL").unwrap().matches(&r));
        assert!(!WhereClause::parse("a = 1 and b is not null").unwrap().matches(&r));
        assert!(WhereClause::parse("missing IS NULL").unwrap().matches(&r));
        assert!(!WhereClause::parse("b > 0").unwrap().matches(&r));
    }

    #[test]
    fn test_quoted_text_with_escaped_quote() {
        let r = record(json!({"name": "O'Brien"}));
        assert!(WhereClause::parse("name = 'O''Brien'").unwrap().matches(&r));
    }

    #[test]
    fn test_unsupported_filters() {
        for text in ["a = 1 OR b = 2", "a IN (1, 2)", "a =", "name = 'open", "a = 1 AND", "a LIKE 'x%'"] {
            assert!(
                matches!(WhereClause::parse(text), Err(ConnectorError::Filter(_))),
                "{}",
                text
            );
        }
    }
}
