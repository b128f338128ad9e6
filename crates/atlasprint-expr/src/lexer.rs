// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Lexer — splits a filter expression into positioned tokens.
//
// Quoting rules:
//   'text'   string literal, '' escapes a quote
//   "name"   column reference, "" escapes a quote
//   $name    built-in feature variable ($id, $area, ...)
//   @name    context variable

use crate::parser::ParseError;

/// A lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Integer(i64),
    Decimal(f64),
    Str(String),
    QuotedIdent(String),
    /// Bare word: keyword, function name, or unquoted column.
    Word(String),
    /// `$name`, stored without the sigil.
    Dollar(String),
    /// `@name`, stored without the sigil.
    At(String),
    LParen,
    RParen,
    Comma,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Concat,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Token {
    /// Short rendering used in "unexpected ..." messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Integer(i) => i.to_string(),
            Self::Decimal(d) => d.to_string(),
            Self::Str(s) => format!("'{s}'"),
            Self::QuotedIdent(s) => format!("\"{s}\""),
            Self::Word(w) => w.to_ascii_uppercase(),
            Self::Dollar(v) => format!("${v}"),
            Self::At(v) => format!("@{v}"),
            Self::LParen => "'('".into(),
            Self::RParen => "')'".into(),
            Self::Comma => "','".into(),
            Self::Plus => "'+'".into(),
            Self::Minus => "'-'".into(),
            Self::Star => "'*'".into(),
            Self::Slash => "'/'".into(),
            Self::Percent => "'%'".into(),
            Self::Concat => "'||'".into(),
            Self::Eq => "'='".into(),
            Self::Ne => "'<>'".into(),
            Self::Lt => "'<'".into(),
            Self::Le => "'<='".into(),
            Self::Gt => "'>'".into(),
            Self::Ge => "'>='".into(),
        }
    }

    /// True when this is the bare keyword `kw` (case-insensitive).
    pub fn is_keyword(&self, kw: &str) -> bool {
        matches!(self, Self::Word(w) if w.eq_ignore_ascii_case(kw))
    }
}

/// A token together with its byte offset in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub offset: usize,
}

/// Tokenize `source`.
pub fn tokenize(source: &str) -> Result<Vec<Spanned>, ParseError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];
        if c.is_ascii_whitespace() {
            pos += 1;
            continue;
        }

        let start = pos;
        let token = match c {
            b'(' => single(&mut pos, Token::LParen),
            b')' => single(&mut pos, Token::RParen),
            b',' => single(&mut pos, Token::Comma),
            b'+' => single(&mut pos, Token::Plus),
            b'-' => single(&mut pos, Token::Minus),
            b'*' => single(&mut pos, Token::Star),
            b'/' => single(&mut pos, Token::Slash),
            b'%' => single(&mut pos, Token::Percent),
            b'=' => single(&mut pos, Token::Eq),
            b'|' if bytes.get(pos + 1) == Some(&b'|') => {
                pos += 2;
                Token::Concat
            }
            b'!' if bytes.get(pos + 1) == Some(&b'=') => {
                pos += 2;
                Token::Ne
            }
            b'<' => match bytes.get(pos + 1) {
                Some(b'=') => {
                    pos += 2;
                    Token::Le
                }
                Some(b'>') => {
                    pos += 2;
                    Token::Ne
                }
                _ => single(&mut pos, Token::Lt),
            },
            b'>' => match bytes.get(pos + 1) {
                Some(b'=') => {
                    pos += 2;
                    Token::Ge
                }
                _ => single(&mut pos, Token::Gt),
            },
            b'\'' => Token::Str(quoted(source, &mut pos, '\'', "string literal")?),
            b'"' => Token::QuotedIdent(quoted(source, &mut pos, '"', "column name")?),
            b'$' | b'@' => {
                pos += 1;
                let name = word(source, &mut pos);
                if name.is_empty() {
                    return Err(ParseError::new(
                        format!("syntax error, unexpected '{}'", c as char),
                        start,
                    ));
                }
                if c == b'$' {
                    Token::Dollar(name)
                } else {
                    Token::At(name)
                }
            }
            b'0'..=b'9' | b'.' => number(source, &mut pos)?,
            _ if is_word_start(source, pos) => Token::Word(word(source, &mut pos)),
            _ => {
                let ch = source[pos..].chars().next().unwrap_or('?');
                return Err(ParseError::new(
                    format!("syntax error, unexpected character '{ch}'"),
                    start,
                ));
            }
        };

        tokens.push(Spanned {
            token,
            offset: start,
        });
    }

    Ok(tokens)
}

fn single(pos: &mut usize, token: Token) -> Token {
    *pos += 1;
    token
}

fn is_word_start(source: &str, pos: usize) -> bool {
    source[pos..]
        .chars()
        .next()
        .is_some_and(|ch| ch.is_alphabetic() || ch == '_')
}

/// Consume `[A-Za-z0-9_]*` (plus any unicode letters).
fn word(source: &str, pos: &mut usize) -> String {
    let rest = &source[*pos..];
    let len = rest
        .char_indices()
        .find(|(_, ch)| !(ch.is_alphanumeric() || *ch == '_'))
        .map_or(rest.len(), |(i, _)| i);
    *pos += len;
    rest[..len].to_string()
}

/// Consume a quoted run where a doubled quote is an escaped quote.
fn quoted(source: &str, pos: &mut usize, quote: char, what: &str) -> Result<String, ParseError> {
    let start = *pos;
    let mut out = String::new();
    let mut chars = source[start + 1..].char_indices().peekable();

    while let Some((i, ch)) = chars.next() {
        if ch == quote {
            if chars.peek().map(|(_, next)| *next) == Some(quote) {
                out.push(quote);
                chars.next();
                continue;
            }
            *pos = start + 1 + i + ch.len_utf8();
            return Ok(out);
        }
        out.push(ch);
    }

    Err(ParseError::new(format!("unterminated {what}"), start))
}

fn number(source: &str, pos: &mut usize) -> Result<Token, ParseError> {
    let start = *pos;
    let bytes = source.as_bytes();
    let mut seen_dot = false;
    let mut end = start;

    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => end += 1,
            b'.' if !seen_dot => {
                seen_dot = true;
                end += 1;
            }
            _ => break,
        }
    }

    let text = &source[start..end];
    *pos = end;

    if text == "." {
        return Err(ParseError::new("syntax error, unexpected '.'", start));
    }
    if seen_dot {
        text.parse::<f64>()
            .map(Token::Decimal)
            .map_err(|_| ParseError::new(format!("invalid number '{text}'"), start))
    } else {
        text.parse::<i64>()
            .map(Token::Integer)
            .map_err(|_| ParseError::new(format!("integer out of range '{text}'"), start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<Token> {
        tokenize(src).unwrap().into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn tokenizes_feature_id_filter() {
        assert_eq!(
            kinds("$id = 42"),
            vec![Token::Dollar("id".into()), Token::Eq, Token::Integer(42)]
        );
    }

    #[test]
    fn quoted_identifier_and_string_escapes() {
        assert_eq!(
            kinds(r#""it""s" = 'O''Hara'"#),
            vec![
                Token::QuotedIdent("it\"s".into()),
                Token::Eq,
                Token::Str("O'Hara".into()),
            ]
        );
    }

    #[test]
    fn empty_quoted_identifier() {
        assert_eq!(kinds(r#""""#), vec![Token::QuotedIdent(String::new())]);
    }

    #[test]
    fn comparison_operators() {
        assert_eq!(
            kinds("<> != <= >= < > ||"),
            vec![
                Token::Ne,
                Token::Ne,
                Token::Le,
                Token::Ge,
                Token::Lt,
                Token::Gt,
                Token::Concat,
            ]
        );
    }

    #[test]
    fn decimals_and_offsets() {
        let tokens = tokenize("a >= 2.5").unwrap();
        assert_eq!(tokens[2].token, Token::Decimal(2.5));
        assert_eq!(tokens[2].offset, 5);
    }

    #[test]
    fn unterminated_string_is_error() {
        let err = tokenize("name = 'abc").unwrap_err();
        assert_eq!(err.message(), "unterminated string literal");
        assert_eq!(err.offset(), 7);
    }

    #[test]
    fn stray_character_is_error() {
        let err = tokenize("a # b").unwrap_err();
        assert!(err.message().contains("unexpected character '#'"));
    }

    #[test]
    fn unicode_column_names() {
        assert_eq!(kinds("région"), vec![Token::Word("région".into())]);
    }
}
