// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recursive-descent parser for the filter expression language.
//
// Precedence, lowest first:
//
// ```text
// OR
// AND
// NOT
// =  <>  !=  <  <=  >  >=  [NOT] IN (..)  IS [NOT] NULL  [NOT] LIKE  [NOT] ILIKE
// ||
// +  -
// *  /  %
// unary -
// literal | column | $var | @var | function(..) | ( expr )
// ```

use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

use crate::FEATURE_ID_TOKEN;
use crate::ast::{BinaryOp, Node, UnaryOp};
use crate::eval::{self, EvalContext};
use crate::lexer::{Spanned, Token, tokenize};

/// Words that cannot be used as bare column names.
const RESERVED: [&str; 10] = [
    "AND", "OR", "NOT", "IN", "IS", "LIKE", "ILIKE", "NULL", "TRUE", "FALSE",
];

/// Deepest nesting of parentheses, function calls, `NOT` and unary minus.
const MAX_NESTING: usize = 64;

/// Tallest syntax tree accepted, long operator chains included.
const MAX_TREE_DEPTH: usize = 512;

const TOO_DEEP: &str = "expression nested too deeply";

/// Built-in functions with their (min, max) argument counts.
const FUNCTIONS: [(&str, usize, usize); 6] = [
    ("upper", 1, 1),
    ("lower", 1, 1),
    ("length", 1, 1),
    ("to_string", 1, 1),
    ("to_int", 1, 1),
    ("coalesce", 1, usize::MAX),
];

/// A syntax error with the byte offset it was detected at.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    message: String,
    offset: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }

    /// Parser error text, as echoed back to callers.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Byte offset into the source.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// A parsed filter expression.
///
/// An empty (or all-whitespace) source parses to an expression with no root;
/// it evaluates to NULL and therefore matches nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    root: Option<Node>,
}

impl Expression {
    /// Parse `source`.
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        let tokens = tokenize(source)?;
        let root = if tokens.is_empty() {
            None
        } else {
            let mut parser = Parser {
                tokens: &tokens,
                pos: 0,
                end: source.len(),
                depth: 0,
            };
            let node = parser.parse_or()?;
            if let Some(extra) = parser.peek() {
                return Err(ParseError::new(
                    format!("syntax error, unexpected {}", extra.token.describe()),
                    extra.offset,
                ));
            }
            Some(node)
        };

        debug!(expression = source, "expression parsed");
        Ok(Self {
            source: source.to_owned(),
            root,
        })
    }

    /// Wrap an already-built tree; the source text is its rendering.
    pub fn from_node(root: Node) -> Self {
        Self {
            source: root.dump(),
            root: Some(root),
        }
    }

    /// Parser error text for `source`, or `None` when it parses cleanly.
    pub fn parser_error_string(source: &str) -> Option<String> {
        Self::parse(source).err().map(|e| e.message)
    }

    /// The original source text.
    pub fn expression(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> Option<&Node> {
        self.root.as_ref()
    }

    /// True when the expression has no content.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Column names referenced anywhere in the tree, in first-seen order.
    pub fn referenced_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        if let Some(root) = &self.root {
            root.walk(&mut |node| {
                if let Node::Column(name) = node {
                    if !columns.contains(name) {
                        columns.push(name.clone());
                    }
                }
            });
        }
        columns
    }

    /// True when the tree references the `$id` row-identifier variable.
    pub fn uses_feature_id(&self) -> bool {
        let mut found = false;
        if let Some(root) = &self.root {
            let id_var = &FEATURE_ID_TOKEN[1..];
            root.walk(&mut |node| {
                if matches!(node, Node::FeatureVariable(v) if v.eq_ignore_ascii_case(id_var)) {
                    found = true;
                }
            });
        }
        found
    }

    /// Evaluate against a feature.
    pub fn evaluate(&self, ctx: &dyn EvalContext) -> Value {
        match &self.root {
            Some(root) => eval::evaluate(root, ctx),
            None => Value::Null,
        }
    }

    /// Evaluate as a filter: only a true result selects the feature.
    pub fn matches(&self, ctx: &dyn EvalContext) -> bool {
        eval::to_bool(&self.evaluate(ctx)) == Some(true)
    }
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
    end: usize,
    /// Current nesting, bounded by `MAX_NESTING`.
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    fn peek_token(&self) -> Option<&Token> {
        self.peek().map(|s| &s.token)
    }

    fn peek_keyword(&self, kw: &str) -> bool {
        self.peek_token().is_some_and(|t| t.is_keyword(kw))
    }

    fn peek_keyword_at(&self, ahead: usize, kw: &str) -> bool {
        self.tokens
            .get(self.pos + ahead)
            .is_some_and(|s| s.token.is_keyword(kw))
    }

    fn advance(&mut self) -> Option<&Spanned> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek_token() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, kw: &str) -> bool {
        if self.peek_keyword(kw) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn unexpected(&self) -> ParseError {
        match self.peek() {
            Some(s) => ParseError::new(
                format!("syntax error, unexpected {}", s.token.describe()),
                s.offset,
            ),
            None => ParseError::new("syntax error, unexpected end of file", self.end),
        }
    }

    fn expect(&mut self, token: &Token) -> Result<(), ParseError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn offset(&self) -> usize {
        self.peek().map_or(self.end, |s| s.offset)
    }

    /// Run `parse` one nesting level down.
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(ParseError::new(TOO_DEEP, self.offset()));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Left-associative `operand (op operand)*`.
    fn chain(
        &mut self,
        operand: fn(&mut Self) -> Result<Node, ParseError>,
        next_op: fn(&Self) -> Option<BinaryOp>,
    ) -> Result<Node, ParseError> {
        let mut left = operand(self)?;
        let mut left_depth = None;
        while let Some(op) = next_op(self) {
            let offset = self.offset();
            self.pos += 1;
            let right = operand(self)?;
            let height = left_depth
                .unwrap_or_else(|| left.depth())
                .max(right.depth())
                + 1;
            if height > MAX_TREE_DEPTH {
                return Err(ParseError::new(TOO_DEEP, offset));
            }
            left_depth = Some(height);
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_or(&mut self) -> Result<Node, ParseError> {
        self.chain(Self::parse_and, |p| {
            p.peek_keyword("OR").then_some(BinaryOp::Or)
        })
    }

    fn parse_and(&mut self) -> Result<Node, ParseError> {
        self.chain(Self::parse_not, |p| {
            p.peek_keyword("AND").then_some(BinaryOp::And)
        })
    }

    fn parse_not(&mut self) -> Result<Node, ParseError> {
        if self.eat_keyword("NOT") {
            let operand = self.nested(Self::parse_not)?;
            return Ok(Node::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Node, ParseError> {
        let left = self.parse_concat()?;

        let op = match self.peek_token() {
            Some(Token::Eq) => Some(BinaryOp::Eq),
            Some(Token::Ne) => Some(BinaryOp::Ne),
            Some(Token::Lt) => Some(BinaryOp::Lt),
            Some(Token::Le) => Some(BinaryOp::Le),
            Some(Token::Gt) => Some(BinaryOp::Gt),
            Some(Token::Ge) => Some(BinaryOp::Ge),
            _ => None,
        };
        if let Some(op) = op {
            self.pos += 1;
            let right = self.parse_concat()?;
            return Ok(binary(op, left, right));
        }

        if self.eat_keyword("IS") {
            let negated = self.eat_keyword("NOT");
            if !self.eat_keyword("NULL") {
                return Err(self.unexpected());
            }
            return Ok(Node::IsNull {
                operand: Box::new(left),
                negated,
            });
        }

        // `NOT` here only introduces `NOT IN` / `NOT LIKE` / `NOT ILIKE`.
        let negated = self.peek_keyword("NOT")
            && (self.peek_keyword_at(1, "IN")
                || self.peek_keyword_at(1, "LIKE")
                || self.peek_keyword_at(1, "ILIKE"));
        if negated {
            self.pos += 1;
        }

        if self.eat_keyword("IN") {
            self.expect(&Token::LParen)?;
            let list = self.nested(Self::parse_list)?;
            if list.is_empty() {
                return Err(self.unexpected());
            }
            return Ok(Node::InList {
                operand: Box::new(left),
                list,
                negated,
            });
        }

        for (kw, case_insensitive) in [("LIKE", false), ("ILIKE", true)] {
            if self.eat_keyword(kw) {
                let pattern = self.parse_concat()?;
                return Ok(Node::Like {
                    operand: Box::new(left),
                    pattern: Box::new(pattern),
                    case_insensitive,
                    negated,
                });
            }
        }

        Ok(left)
    }

    fn parse_concat(&mut self) -> Result<Node, ParseError> {
        self.chain(Self::parse_additive, |p| match p.peek_token() {
            Some(Token::Concat) => Some(BinaryOp::Concat),
            _ => None,
        })
    }

    fn parse_additive(&mut self) -> Result<Node, ParseError> {
        self.chain(Self::parse_multiplicative, |p| match p.peek_token() {
            Some(Token::Plus) => Some(BinaryOp::Add),
            Some(Token::Minus) => Some(BinaryOp::Sub),
            _ => None,
        })
    }

    fn parse_multiplicative(&mut self) -> Result<Node, ParseError> {
        self.chain(Self::parse_unary, |p| match p.peek_token() {
            Some(Token::Star) => Some(BinaryOp::Mul),
            Some(Token::Slash) => Some(BinaryOp::Div),
            Some(Token::Percent) => Some(BinaryOp::Mod),
            _ => None,
        })
    }

    fn parse_unary(&mut self) -> Result<Node, ParseError> {
        if self.eat(&Token::Minus) {
            let operand = self.nested(Self::parse_unary)?;
            return Ok(match operand {
                Node::Literal(Value::Number(n)) if n.is_i64() => {
                    Node::Literal(json!(-n.as_i64().unwrap_or_default()))
                }
                Node::Literal(Value::Number(n)) if n.is_f64() => {
                    Node::Literal(json!(-n.as_f64().unwrap_or_default()))
                }
                other => Node::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(other),
                },
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Node, ParseError> {
        let Some(spanned) = self.advance().cloned() else {
            return Err(self.unexpected());
        };

        match spanned.token {
            Token::Integer(i) => Ok(Node::Literal(json!(i))),
            Token::Decimal(d) => Ok(Node::Literal(json!(d))),
            Token::Str(s) => Ok(Node::Literal(Value::String(s))),
            Token::QuotedIdent(name) => Ok(Node::Column(name)),
            Token::Dollar(name) => Ok(Node::FeatureVariable(name)),
            Token::At(name) => Ok(Node::ContextVariable(name)),
            Token::LParen => {
                let inner = self.nested(Self::parse_or)?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Token::Word(word) => {
                if word.eq_ignore_ascii_case("NULL") {
                    return Ok(Node::Literal(Value::Null));
                }
                if word.eq_ignore_ascii_case("TRUE") {
                    return Ok(Node::Literal(Value::Bool(true)));
                }
                if word.eq_ignore_ascii_case("FALSE") {
                    return Ok(Node::Literal(Value::Bool(false)));
                }
                if RESERVED.iter().any(|r| word.eq_ignore_ascii_case(r)) {
                    return Err(ParseError::new(
                        format!("syntax error, unexpected {}", word.to_ascii_uppercase()),
                        spanned.offset,
                    ));
                }
                if self.eat(&Token::LParen) {
                    let args = self.nested(Self::parse_list)?;
                    return function(word, args, spanned.offset);
                }
                Ok(Node::Column(word))
            }
            _ => {
                self.pos -= 1;
                Err(self.unexpected())
            }
        }
    }

    /// Parse `expr, expr, ... )` after an opening parenthesis.
    fn parse_list(&mut self) -> Result<Vec<Node>, ParseError> {
        let mut items = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(items);
        }
        loop {
            items.push(self.parse_or()?);
            if self.eat(&Token::Comma) {
                continue;
            }
            self.expect(&Token::RParen)?;
            return Ok(items);
        }
    }
}

fn binary(op: BinaryOp, left: Node, right: Node) -> Node {
    Node::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn function(name: String, args: Vec<Node>, offset: usize) -> Result<Node, ParseError> {
    let lower = name.to_ascii_lowercase();
    let Some(&(_, min, max)) = FUNCTIONS.iter().find(|(f, _, _)| *f == lower) else {
        return Err(ParseError::new(
            format!("Function is not known: {name}"),
            offset,
        ));
    };
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            min.to_string()
        } else {
            format!("at least {min}")
        };
        return Err(ParseError::new(
            format!(
                "{lower} function is called with wrong number of arguments: expected {expected}, got {}",
                args.len()
            ),
            offset,
        ));
    }
    Ok(Node::Function { name: lower, args })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root(src: &str) -> Node {
        Expression::parse(src).unwrap().root().cloned().unwrap()
    }

    #[test]
    fn parses_feature_id_equality() {
        assert_eq!(
            root("$id = 42"),
            binary(
                BinaryOp::Eq,
                Node::FeatureVariable("id".into()),
                Node::Literal(json!(42))
            )
        );
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let node = root("a = 1 OR b = 2 AND c = 3");
        let Node::Binary { op, right, .. } = node else {
            panic!("expected binary");
        };
        assert_eq!(op, BinaryOp::Or);
        assert!(matches!(*right, Node::Binary { op: BinaryOp::And, .. }));
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert!(Expression::parse("\"a\" in (1, 2) and not \"b\" is null").is_ok());
        assert!(Expression::parse("\"name\" NOT ILIKE 'x%'").is_ok());
    }

    #[test]
    fn in_list_rewrite_shape() {
        assert_eq!(root(r#""gid" IN (42)"#).dump(), r#""gid" IN (42)"#);
    }

    #[test]
    fn negative_literals_fold() {
        assert_eq!(root("-5"), Node::Literal(json!(-5)));
    }

    #[test]
    fn unbalanced_parentheses_fail() {
        let err = Expression::parse("(\"gid\" = 1").unwrap_err();
        assert_eq!(err.message(), "syntax error, unexpected end of file");
        let err = Expression::parse("\"gid\" = 1)").unwrap_err();
        assert_eq!(err.message(), "syntax error, unexpected ')'");
    }

    #[test]
    fn deep_nesting_is_rejected() {
        for src in [
            format!("{}1{}", "(".repeat(5_000), ")".repeat(5_000)),
            format!("{}TRUE", "NOT ".repeat(5_000)),
            format!("{}1", "- ".repeat(5_000)),
            format!("{}1{}", "upper(".repeat(5_000), ")".repeat(5_000)),
            format!("\"gid\" IN ({}1{})", "(".repeat(5_000), ")".repeat(5_000)),
        ] {
            let err = Expression::parse(&src).unwrap_err();
            assert_eq!(err.message(), "expression nested too deeply");
        }
    }

    #[test]
    fn reasonable_nesting_still_parses() {
        let src = format!("{}\"gid\" = 1{}", "(".repeat(40), ")".repeat(40));
        assert_eq!(root(&src).dump(), r#"("gid" = 1)"#);
    }

    #[test]
    fn long_operator_chains_are_bounded() {
        let sum = vec!["1"; 5_000].join(" + ");
        assert_eq!(Expression::parse(&sum).unwrap_err().message(), TOO_DEEP);

        let ids: Vec<String> = (1..=300).map(|i| format!("$id = {i}")).collect();
        assert_eq!(root(&ids.join(" OR ")).depth(), 301);
    }

    #[test]
    fn dangling_operator_fails() {
        let err = Expression::parse("\"gid\" =").unwrap_err();
        assert_eq!(err.message(), "syntax error, unexpected end of file");
        assert_eq!(err.offset(), 7);
    }

    #[test]
    fn reserved_word_as_operand_fails() {
        let err = Expression::parse("AND = 1").unwrap_err();
        assert_eq!(err.message(), "syntax error, unexpected AND");
    }

    #[test]
    fn unknown_function_fails() {
        let err = Expression::parse("frobnicate(1)").unwrap_err();
        assert_eq!(err.message(), "Function is not known: frobnicate");
    }

    #[test]
    fn wrong_arity_fails() {
        assert!(Expression::parse("upper('a', 'b')").is_err());
        assert!(Expression::parse("coalesce(NULL, 'a', 'b')").is_ok());
    }

    #[test]
    fn empty_source_has_no_root() {
        let expr = Expression::parse("   ").unwrap();
        assert!(expr.is_empty());
        assert_eq!(Expression::parser_error_string(""), None);
    }

    #[test]
    fn report_filter_parses_as_empty_column() {
        assert_eq!(root("\"\""), Node::Column(String::new()));
    }

    #[test]
    fn referenced_columns_deduplicated() {
        let expr = Expression::parse("\"a\" = 1 OR \"b\" = 2 OR \"a\" = 3").unwrap();
        assert_eq!(expr.referenced_columns(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn detects_feature_id_usage() {
        assert!(Expression::parse("$id IN (3, 4)").unwrap().uses_feature_id());
        assert!(!Expression::parse("\"id\" = 3").unwrap().uses_feature_id());
    }

    #[test]
    fn from_node_round_trips_through_source() {
        let expr = Expression::from_node(Node::InList {
            operand: Box::new(Node::Column("gid".into())),
            list: vec![Node::Literal(serde_json::json!(42))],
            negated: false,
        });
        assert_eq!(expr.expression(), r#""gid" IN (42)"#);
        assert_eq!(Expression::parse(expr.expression()).unwrap(), expr);
    }
}
