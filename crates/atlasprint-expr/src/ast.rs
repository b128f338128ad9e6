// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Expression syntax tree.

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Concat,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Or => "OR",
            Self::And => "AND",
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Concat => "||",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
        }
    }
}

/// A node of a parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Literal(Value),
    Column(String),
    /// `$name` feature variable (`$id` is the row identifier).
    FeatureVariable(String),
    /// `@name` context variable.
    ContextVariable(String),
    Unary {
        op: UnaryOp,
        operand: Box<Node>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    InList {
        operand: Box<Node>,
        list: Vec<Node>,
        negated: bool,
    },
    IsNull {
        operand: Box<Node>,
        negated: bool,
    },
    Like {
        operand: Box<Node>,
        pattern: Box<Node>,
        case_insensitive: bool,
        negated: bool,
    },
    Function {
        name: String,
        args: Vec<Node>,
    },
}

impl Node {
    /// Visit this node and every descendant, depth first.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Node)) {
        visit(self);
        match self {
            Self::Unary { operand, .. } | Self::IsNull { operand, .. } => operand.walk(visit),
            Self::Binary { left, right, .. } => {
                left.walk(visit);
                right.walk(visit);
            }
            Self::InList { operand, list, .. } => {
                operand.walk(visit);
                for item in list {
                    item.walk(visit);
                }
            }
            Self::Like {
                operand, pattern, ..
            } => {
                operand.walk(visit);
                pattern.walk(visit);
            }
            Self::Function { args, .. } => {
                for arg in args {
                    arg.walk(visit);
                }
            }
            Self::Literal(_)
            | Self::Column(_)
            | Self::FeatureVariable(_)
            | Self::ContextVariable(_) => {}
        }
    }

    /// Height of the tree rooted here; a leaf is 1.
    pub fn depth(&self) -> usize {
        let deepest = match self {
            Self::Unary { operand, .. } | Self::IsNull { operand, .. } => operand.depth(),
            Self::Binary { left, right, .. }
            | Self::Like {
                operand: left,
                pattern: right,
                ..
            } => left.depth().max(right.depth()),
            Self::InList { operand, list, .. } => {
                list.iter().map(Node::depth).fold(operand.depth(), usize::max)
            }
            Self::Function { args, .. } => args.iter().map(Node::depth).max().unwrap_or(0),
            Self::Literal(_)
            | Self::Column(_)
            | Self::FeatureVariable(_)
            | Self::ContextVariable(_) => 0,
        };
        deepest + 1
    }

    /// Render back to expression source (fully parenthesised binaries).
    pub fn dump(&self) -> String {
        match self {
            Self::Literal(Value::Null) => "NULL".into(),
            Self::Literal(Value::String(s)) => format!("'{}'", s.replace('\'', "''")),
            Self::Literal(Value::Bool(b)) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
            Self::Literal(v) => v.to_string(),
            Self::Column(name) => quote_column(name),
            Self::FeatureVariable(name) => format!("${name}"),
            Self::ContextVariable(name) => format!("@{name}"),
            Self::Unary {
                op: UnaryOp::Not,
                operand,
            } => format!("NOT {}", operand.dump()),
            Self::Unary {
                op: UnaryOp::Neg,
                operand,
            } => format!("-{}", operand.dump()),
            Self::Binary { op, left, right } => {
                format!("({} {} {})", left.dump(), op.symbol(), right.dump())
            }
            Self::InList {
                operand,
                list,
                negated,
            } => {
                let items: Vec<String> = list.iter().map(Node::dump).collect();
                let not = if *negated { "NOT " } else { "" };
                format!("{} {not}IN ({})", operand.dump(), items.join(", "))
            }
            Self::IsNull { operand, negated } => {
                let not = if *negated { "NOT " } else { "" };
                format!("{} IS {not}NULL", operand.dump())
            }
            Self::Like {
                operand,
                pattern,
                case_insensitive,
                negated,
            } => {
                let not = if *negated { "NOT " } else { "" };
                let kw = if *case_insensitive { "ILIKE" } else { "LIKE" };
                format!("{} {not}{kw} {}", operand.dump(), pattern.dump())
            }
            Self::Function { name, args } => {
                let args: Vec<String> = args.iter().map(Node::dump).collect();
                format!("{name}({})", args.join(", "))
            }
        }
    }
}

/// Quote a column name, doubling embedded quotes.
pub fn quote_column(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
