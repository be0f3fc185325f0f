//! Parser for Lua data modules
//!
//! Handles the subset of Lua used by literal data modules: an optional run of
//! `local name = <exp>` statements followed by `return <exp>`. Expressions are
//! table constructors, numbers, strings, booleans, `nil`, identifiers,
//! parenthesized expressions and the unary operators `-` and `not`.
//!
//! Negative literals stay as [`LuaNode::Neg`] over a positive number, the way
//! the grammar defines them; [`LuaNode::as_number`] folds them back.

use crate::error::{Error, Result};
use std::collections::HashMap;

/// A node of the parsed expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum LuaNode {
    Table(Vec<TableEntry>),
    Number(f64),
    Str(String),
    Bool(bool),
    Nil,
    Neg(Box<LuaNode>),
    Not(Box<LuaNode>),
    Ident(String),
}

/// One `key = value` slot of a table constructor
#[derive(Debug, Clone, PartialEq)]
pub struct TableEntry {
    pub key: TableKey,
    pub value: LuaNode,
}

/// How a table entry was keyed
#[derive(Debug, Clone, PartialEq)]
pub enum TableKey {
    /// `[exp] = value`
    Expr(LuaNode),
    /// `name = value`
    Name(String),
    /// A positional value, numbered from 1
    Positional(usize),
}

impl TableKey {
    /// Whether this key addresses the string field `key`
    pub fn matches(&self, key: &str) -> bool {
        match self {
            TableKey::Name(name) => name == key,
            TableKey::Expr(LuaNode::Str(s)) => s == key,
            _ => false,
        }
    }

    /// The key as a string, when it is one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TableKey::Name(name) => Some(name),
            TableKey::Expr(LuaNode::Str(s)) => Some(s),
            _ => None,
        }
    }
}

impl LuaNode {
    /// Entries of a table node
    pub fn as_table(&self) -> Option<&[TableEntry]> {
        match self {
            LuaNode::Table(entries) => Some(entries),
            _ => None,
        }
    }

    /// Entries of a table node, or nothing for other nodes
    pub fn entries(&self) -> &[TableEntry] {
        self.as_table().unwrap_or(&[])
    }

    /// Look up a string-keyed field; a later duplicate key wins, as in Lua
    pub fn field(&self, key: &str) -> Option<&LuaNode> {
        self.entries()
            .iter()
            .rev()
            .find(|e| e.key.matches(key))
            .map(|e| &e.value)
    }

    /// Numeric value, folding unary minus over a numeric operand
    pub fn as_number(&self) -> Option<f64> {
        match self {
            LuaNode::Number(n) => Some(*n),
            LuaNode::Neg(inner) => inner.as_number().map(|n| -n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            LuaNode::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Parse a data module and return the value it evaluates to
pub fn parse_chunk(source: &str) -> Result<LuaNode> {
    let tokens = Lexer::new(source).tokenize()?;
    Parser::new(tokens).chunk()
}

const KEYWORDS: &[&str] = &[
    "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "goto", "if",
    "in", "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
];

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Name(String),
    Number(f64),
    Str(String),
    Sym(char),
    Eof,
}

#[derive(Debug, Clone)]
struct Spanned {
    token: Token,
    line: usize,
    column: usize,
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::LuaParse {
            line: self.line,
            column: self.column,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn tokenize(mut self) -> Result<Vec<Spanned>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia()?;
            let (line, column) = (self.line, self.column);
            let token = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push(Spanned {
                token,
                line,
                column,
            });
            if done {
                return Ok(tokens);
            }
        }
    }

    /// Skip whitespace and comments
    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('-') if self.peek_at(1) == Some('-') => {
                    self.bump();
                    self.bump();
                    if self.peek() == Some('[') && self.long_bracket_level().is_some() {
                        self.long_bracket()?;
                    } else {
                        while let Some(c) = self.peek() {
                            if c == '\n' {
                                break;
                            }
                            self.bump();
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn next_token(&mut self) -> Result<Token> {
        let Some(c) = self.peek() else {
            return Ok(Token::Eof);
        };

        match c {
            '[' if self.long_bracket_level().is_some() => Ok(Token::Str(self.long_bracket()?)),
            '"' | '\'' => self.short_string(),
            '.' if self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) => self.number(),
            c if c.is_ascii_digit() => self.number(),
            c if c.is_ascii_alphabetic() || c == '_' => Ok(Token::Name(self.name())),
            '{' | '}' | '[' | ']' | '=' | ',' | ';' | '(' | ')' | '-' => {
                self.bump();
                Ok(Token::Sym(c))
            }
            other => Err(self.error(format!("unexpected character '{}'", other))),
        }
    }

    fn name(&mut self) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                out.push(c);
                self.bump();
            } else {
                break;
            }
        }
        out
    }

    fn number(&mut self) -> Result<Token> {
        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x') | Some('X')) {
            self.bump();
            self.bump();
            let mut digits = String::new();
            while let Some(c) = self.peek() {
                if c.is_ascii_hexdigit() {
                    digits.push(c);
                    self.bump();
                } else {
                    break;
                }
            }
            return u64::from_str_radix(&digits, 16)
                .map(|n| Token::Number(n as f64))
                .map_err(|_| self.error(format!("malformed hex number '0x{}'", digits)));
        }

        let mut text = String::new();
        while let Some(c) = self.peek() {
            let exponent_sign = (c == '+' || c == '-') && text.ends_with(|e: char| e == 'e' || e == 'E');
            if c.is_ascii_digit() || c == '.' || c == 'e' || c == 'E' || exponent_sign {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if self.peek().is_some_and(|c| c.is_ascii_alphabetic() || c == '_') {
            return Err(self.error(format!("malformed number near '{}'", text)));
        }
        text.parse::<f64>()
            .map(Token::Number)
            .map_err(|_| self.error(format!("malformed number '{}'", text)))
    }

    fn short_string(&mut self) -> Result<Token> {
        let quote = self.bump().unwrap_or('"');
        let mut out = String::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(self.error("unfinished string"));
            };
            match c {
                c if c == quote => return Ok(Token::Str(out)),
                '\n' => return Err(self.error("unfinished string")),
                '\\' => self.escape(&mut out)?,
                c => out.push(c),
            }
        }
    }

    fn escape(&mut self, out: &mut String) -> Result<()> {
        let Some(c) = self.bump() else {
            return Err(self.error("unfinished string"));
        };
        match c {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\u{7}'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '\\' | '"' | '\'' | '\n' => out.push(c),
            'z' => {
                while self.peek().is_some_and(char::is_whitespace) {
                    self.bump();
                }
            }
            'x' => {
                let hex: String = (0..2).filter_map(|_| self.bump()).collect();
                let code = u32::from_str_radix(&hex, 16)
                    .map_err(|_| self.error(format!("invalid escape '\\x{}'", hex)))?;
                out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            'u' => {
                if self.bump() != Some('{') {
                    return Err(self.error("missing '{' in \\u{xxxx}"));
                }
                let mut hex = String::new();
                while let Some(c) = self.bump() {
                    if c == '}' {
                        break;
                    }
                    hex.push(c);
                }
                let code = u32::from_str_radix(&hex, 16)
                    .map_err(|_| self.error(format!("invalid escape '\\u{{{}}}'", hex)))?;
                out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            d if d.is_ascii_digit() => {
                let mut digits = d.to_string();
                while digits.len() < 3 && self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    digits.extend(self.bump());
                }
                let code: u32 = digits.parse().unwrap_or(0);
                if code > 255 {
                    return Err(self.error(format!("decimal escape too large '\\{}'", digits)));
                }
                out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            other => return Err(self.error(format!("invalid escape '\\{}'", other))),
        }
        Ok(())
    }

    /// Level of a long bracket opening at the cursor (`[[` is 0, `[==[` is 2)
    fn long_bracket_level(&self) -> Option<usize> {
        let mut offset = 1;
        while self.peek_at(offset) == Some('=') {
            offset += 1;
        }
        (self.peek_at(offset) == Some('[')).then_some(offset - 1)
    }

    /// Read a long bracket and return its contents
    fn long_bracket(&mut self) -> Result<String> {
        let level = self
            .long_bracket_level()
            .ok_or_else(|| self.error("invalid long bracket"))?;
        for _ in 0..level + 2 {
            self.bump();
        }
        if self.peek() == Some('\n') {
            self.bump();
        }

        let mut out = String::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(self.error("unfinished long string or comment"));
            };
            if c == ']' {
                let closes = (0..level).all(|i| self.peek_at(i) == Some('='))
                    && self.peek_at(level) == Some(']');
                if closes {
                    for _ in 0..=level {
                        self.bump();
                    }
                    return Ok(out);
                }
            }
            out.push(c);
        }
    }
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Spanned>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn current(&self) -> &Spanned {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.pos.min(last)]
    }

    fn peek(&self) -> &Token {
        &self.current().token
    }

    fn peek_next(&self) -> Option<&Token> {
        self.tokens.get(self.pos + 1).map(|s| &s.token)
    }

    fn advance(&mut self) -> Token {
        let token = self.current().token.clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn error(&self, message: impl Into<String>) -> Error {
        let span = self.current();
        Error::LuaParse {
            line: span.line,
            column: span.column,
            message: message.into(),
        }
    }

    fn is_sym(&self, c: char) -> bool {
        *self.peek() == Token::Sym(c)
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Token::Name(n) if n == keyword)
    }

    fn expect_sym(&mut self, c: char) -> Result<()> {
        if self.is_sym(c) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("expected '{}', found {}", c, describe(self.peek()))))
        }
    }

    fn expect_eof(&self) -> Result<()> {
        match self.peek() {
            Token::Eof => Ok(()),
            other => Err(self.error(format!("expected end of input, found {}", describe(other)))),
        }
    }

    fn chunk(&mut self) -> Result<LuaNode> {
        let mut locals: HashMap<String, LuaNode> = HashMap::new();

        while self.is_keyword("local") {
            self.advance();
            let name = match self.advance() {
                Token::Name(n) if !KEYWORDS.contains(&n.as_str()) => n,
                other => return Err(self.error(format!("expected name, found {}", describe(&other)))),
            };
            self.expect_sym('=')?;
            let value = self.exp()?;
            if self.is_sym(';') {
                self.advance();
            }
            locals.insert(name, value);
        }

        if self.is_keyword("return") {
            self.advance();
        }
        let value = self.exp()?;
        if self.is_sym(';') {
            self.advance();
        }
        self.expect_eof()?;

        match value {
            LuaNode::Ident(name) => locals
                .remove(&name)
                .ok_or_else(|| self.error(format!("undefined name '{}'", name))),
            other => Ok(other),
        }
    }

    fn exp(&mut self) -> Result<LuaNode> {
        match self.peek().clone() {
            Token::Sym('-') => {
                self.advance();
                Ok(LuaNode::Neg(Box::new(self.exp()?)))
            }
            Token::Sym('{') => self.table(),
            Token::Sym('(') => {
                self.advance();
                let inner = self.exp()?;
                self.expect_sym(')')?;
                Ok(inner)
            }
            Token::Number(n) => {
                self.advance();
                Ok(LuaNode::Number(n))
            }
            Token::Str(s) => {
                self.advance();
                Ok(LuaNode::Str(s))
            }
            Token::Name(name) => match name.as_str() {
                "true" => {
                    self.advance();
                    Ok(LuaNode::Bool(true))
                }
                "false" => {
                    self.advance();
                    Ok(LuaNode::Bool(false))
                }
                "nil" => {
                    self.advance();
                    Ok(LuaNode::Nil)
                }
                "not" => {
                    self.advance();
                    Ok(LuaNode::Not(Box::new(self.exp()?)))
                }
                kw if KEYWORDS.contains(&kw) => {
                    Err(self.error(format!("unsupported keyword '{}'", kw)))
                }
                _ => {
                    self.advance();
                    Ok(LuaNode::Ident(name))
                }
            },
            other => Err(self.error(format!("unexpected {}", describe(&other)))),
        }
    }

    fn table(&mut self) -> Result<LuaNode> {
        self.expect_sym('{')?;
        let mut entries = Vec::new();
        let mut index = 1;

        loop {
            if self.is_sym('}') {
                self.advance();
                break;
            }

            let entry = if self.is_sym('[') {
                self.advance();
                let key = self.exp()?;
                self.expect_sym(']')?;
                self.expect_sym('=')?;
                TableEntry {
                    key: TableKey::Expr(key),
                    value: self.exp()?,
                }
            } else if let (Token::Name(name), Some(Token::Sym('='))) = (self.peek(), self.peek_next()) {
                if KEYWORDS.contains(&name.as_str()) {
                    return Err(self.error(format!("unsupported keyword '{}'", name)));
                }
                let key = TableKey::Name(name.clone());
                self.advance();
                self.advance();
                TableEntry {
                    key,
                    value: self.exp()?,
                }
            } else {
                let entry = TableEntry {
                    key: TableKey::Positional(index),
                    value: self.exp()?,
                };
                index += 1;
                entry
            };
            entries.push(entry);

            match self.peek() {
                Token::Sym(',') | Token::Sym(';') => {
                    self.advance();
                }
                Token::Sym('}') => {
                    self.advance();
                    break;
                }
                other => {
                    return Err(self.error(format!("expected ',' or '}}', found {}", describe(other))))
                }
            }
        }

        Ok(LuaNode::Table(entries))
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Name(n) => format!("'{}'", n),
        Token::Number(n) => format!("number {}", n),
        Token::Str(_) => "string".to_string(),
        Token::Sym(c) => format!("'{}'", c),
        Token::Eof => "end of input".to_string(),
    }
}
