// Data-only evaluator for the addon's SavedVariables table literal
use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// Global the addon assigns its database to at the top of the save file.
pub const DB_GLOBAL: &str = "WoWStatTrackerDB";

/// Nesting limit for tables and unary operators, same as the game client's parser.
pub const MAX_DEPTH: usize = 200;

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    Str(String),
    Table(Table),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Table(_) => "table",
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Table key. Integral numbers collapse to `Int` so `[2]` and `[2.0]` address
/// the same slot; other floats are kept by bit pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Int(i64),
    Float(u64),
    Str(String),
    Bool(bool),
}

impl Key {
    /// Returns `None` for NaN, which cannot index a table.
    pub fn from_number(n: f64) -> Option<Key> {
        if n.is_nan() {
            return None;
        }
        if n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 {
            Some(Key::Int(n as i64))
        } else {
            Some(Key::Float(n.to_bits()))
        }
    }

    fn from_value(v: Value) -> Result<Key, &'static str> {
        match v {
            Value::Nil => Err("table index is nil"),
            Value::Bool(b) => Ok(Key::Bool(b)),
            Value::Number(n) => Key::from_number(n).ok_or("table index is NaN"),
            Value::Str(s) => Ok(Key::Str(s)),
            Value::Table(_) => Err("table used as table index"),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Key::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(i) => write!(f, "{}", i),
            Key::Float(bits) => write!(f, "{}", f64::from_bits(*bits)),
            Key::Str(s) => f.write_str(s),
            Key::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(s.to_string())
    }
}

impl From<i64> for Key {
    fn from(i: i64) -> Self {
        Key::Int(i)
    }
}

/// Associative table preserving source order of its keys.
#[derive(Debug, Clone, Default)]
pub struct Table {
    entries: Vec<(Key, Value)>,
    index: HashMap<Key, usize>,
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Assigning `Nil` removes the key, as in the source language.
    pub fn insert(&mut self, key: Key, value: Value) {
        if let Value::Nil = value {
            if let Some(i) = self.index.remove(&key) {
                self.entries.remove(i);
                for slot in self.index.values_mut() {
                    if *slot > i {
                        *slot -= 1;
                    }
                }
            }
            return;
        }
        match self.index.get(&key) {
            Some(&i) => self.entries[i].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    pub fn get(&self, key: &Key) -> Option<&Value> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.get(&Key::from(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// True when the keys are exactly `1..=len`.
    pub fn is_sequence(&self) -> bool {
        let n = self.entries.len() as i64;
        !self.entries.is_empty()
            && self
                .entries
                .iter()
                .all(|(k, _)| matches!(k, Key::Int(i) if (1..=n).contains(i)))
    }

    /// Entries with integer keys, ascending. Other keys are ignored.
    pub fn int_entries(&self) -> Vec<(i64, &Value)> {
        let mut out: Vec<(i64, &Value)> = self
            .entries
            .iter()
            .filter_map(|(k, v)| k.as_int().map(|i| (i, v)))
            .collect();
        out.sort_by_key(|(i, _)| *i);
        out
    }

    /// All values: integer keys ascending, then the rest in source order.
    pub fn ordered_values(&self) -> Vec<&Value> {
        let mut out: Vec<&Value> = self.int_entries().into_iter().map(|(_, v)| v).collect();
        out.extend(
            self.entries
                .iter()
                .filter(|(k, _)| k.as_int().is_none())
                .map(|(_, v)| v),
        );
        out
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LiteralError {
    #[error("empty input")]
    Empty,
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: &'static str },
    #[error("unexpected {found:?} at offset {offset}, expected {expected}")]
    Unexpected {
        found: char,
        offset: usize,
        expected: &'static str,
    },
    #[error("malformed number at offset {offset}")]
    InvalidNumber { offset: usize },
    #[error("invalid escape sequence at offset {offset}")]
    InvalidEscape { offset: usize },
    #[error("unfinished string starting at offset {offset}")]
    UnterminatedString { offset: usize },
    #[error("unfinished long comment starting at offset {offset}")]
    UnterminatedComment { offset: usize },
    #[error("`{name}` at offset {offset} is not a data literal")]
    NotALiteral { name: String, offset: usize },
    #[error("{reason} at offset {offset}")]
    BadKey { reason: &'static str, offset: usize },
    #[error("nesting deeper than {} levels at offset {offset}", MAX_DEPTH)]
    TooDeep { offset: usize },
    #[error("trailing input at offset {offset}")]
    TrailingInput { offset: usize },
}

/// Skip leading whitespace and BOM bytes, then the `WoWStatTrackerDB =` assignment if present.
pub fn strip_prefix(text: &[u8]) -> &[u8] {
    let start = text
        .iter()
        .position(|&b| !matches!(b, b' ' | b'\t' | b'\r' | b'\n') && !UTF8_BOM.contains(&b))
        .unwrap_or(text.len());
    let body = &text[start..];
    let Some(rest) = body.strip_prefix(DB_GLOBAL.as_bytes()) else {
        return body;
    };
    // `WoWStatTrackerDBx = ...` is a different global
    if rest.first().is_some_and(|b| is_ident_byte(*b)) {
        return body;
    }
    let rest = trim_blank(rest);
    match rest.strip_prefix(b"=") {
        Some(after) if !after.starts_with(b"=") => trim_blank(after),
        _ => body,
    }
}

fn trim_blank(s: &[u8]) -> &[u8] {
    let n = s
        .iter()
        .take_while(|&&b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
        .count();
    &s[n..]
}

/// Parse a whole save file (prefix optional) into a value.
pub fn parse_value(text: &[u8]) -> Result<Value, LiteralError> {
    let body = strip_prefix(text);
    let mut ev = Evaluator::new(body);
    ev.parse_document()
}

/// Evaluate save-file text and return the root table.
///
/// Every call builds its own [`Evaluator`] and drops it before returning, so no
/// state survives between calls. Empty input, syntax errors and a non-table
/// root all yield `None`; the reason is logged at debug level.
pub fn evaluate(text: &[u8]) -> Option<Table> {
    match parse_value(text) {
        Ok(Value::Table(t)) => Some(t),
        Ok(other) => {
            tracing::debug!(kind = other.type_name(), "saved variables root is not a table");
            None
        }
        Err(e) => {
            tracing::debug!(error = %e, "saved variables did not evaluate");
            None
        }
    }
}

/// Recursive-descent evaluator over the literal subset of the source language.
///
/// Only constructors are understood: tables, strings, numbers, booleans, nil
/// and unary minus. Names other than `true`/`false`/`nil` are rejected, so
/// nothing in the input can reach globals, call functions or touch the host.
#[derive(Debug)]
pub struct Evaluator<'a> {
    src: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> Evaluator<'a> {
    pub fn new(src: &'a [u8]) -> Self {
        Self {
            src,
            pos: 0,
            depth: 0,
        }
    }
    /// One expression followed only by trivia.
    pub fn parse_document(&mut self) -> Result<Value, LiteralError> {
        self.skip_trivia()?;
        if self.pos >= self.src.len() {
            return Err(LiteralError::Empty);
        }
        let v = self.parse_expr()?;
        self.skip_trivia()?;
        if self.pos < self.src.len() {
            return Err(LiteralError::TrailingInput { offset: self.pos });
        }
        Ok(v)
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }
    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.src.get(self.pos + ahead).copied()
    }

    fn unexpected(&self, expected: &'static str) -> LiteralError {
        match self.peek() {
            None => LiteralError::UnexpectedEof { expected },
            Some(_) => {
                let end = (self.pos + 4).min(self.src.len());
                let found = String::from_utf8_lossy(&self.src[self.pos..end])
                    .chars()
                    .next()
                    .unwrap_or(char::REPLACEMENT_CHARACTER);
                LiteralError::Unexpected {
                    found,
                    offset: self.pos,
                    expected,
                }
            }
        }
    }

    fn expect(&mut self, b: u8, expected: &'static str) -> Result<(), LiteralError> {
        self.skip_trivia()?;
        if self.peek() == Some(b) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn enter(&mut self) -> Result<(), LiteralError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(LiteralError::TooDeep { offset: self.pos });
        }
        Ok(())
    }
    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn skip_trivia(&mut self) -> Result<(), LiteralError> {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\r' | b'\n' | 0x0B | 0x0C) => self.pos += 1,
                Some(b'-') if self.peek_at(1) == Some(b'-') => {
                    let start = self.pos;
                    self.pos += 2;
                    if let Some(level) = self.long_bracket_level() {
                        self.read_long_bracket(level)
                            .map_err(|_| LiteralError::UnterminatedComment { offset: start })?;
                    } else {
                        while let Some(b) = self.peek() {
                            if b == b'\n' {
                                break;
                            }
                            self.pos += 1;
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// `[`, `=`*n, `[` at the cursor gives `Some(n)`.
    fn long_bracket_level(&self) -> Option<usize> {
        if self.peek() != Some(b'[') {
            return None;
        }
        let mut n = 0;
        while self.peek_at(1 + n) == Some(b'=') {
            n += 1;
        }
        (self.peek_at(1 + n) == Some(b'[')).then_some(n)
    }

    /// Consume a long bracket of the given level and return its contents.
    fn read_long_bracket(&mut self, level: usize) -> Result<&'a [u8], LiteralError> {
        let src = self.src;
        let start = self.pos;
        self.pos += level + 2;
        // first newline right after the opener is not part of the contents
        match (self.peek(), self.peek_at(1)) {
            (Some(b'\r'), Some(b'\n')) | (Some(b'\n'), Some(b'\r')) => self.pos += 2,
            (Some(b'\r' | b'\n'), _) => self.pos += 1,
            _ => {}
        }
        let body_start = self.pos;
        while self.pos < src.len() {
            if src[self.pos] == b']' {
                let closes = (1..=level).all(|i| self.peek_at(i) == Some(b'='))
                    && self.peek_at(level + 1) == Some(b']');
                if closes {
                    let body = &src[body_start..self.pos];
                    self.pos += level + 2;
                    return Ok(body);
                }
            }
            self.pos += 1;
        }
        Err(LiteralError::UnterminatedString { offset: start })
    }

    fn parse_expr(&mut self) -> Result<Value, LiteralError> {
        self.skip_trivia()?;
        match self.peek() {
            None => Err(LiteralError::UnexpectedEof {
                expected: "expression",
            }),
            Some(b'{') => {
                self.enter()?;
                let t = self.parse_table()?;
                self.leave();
                Ok(Value::Table(t))
            }
            Some(b'"' | b'\'') => self.parse_short_string().map(Value::Str),
            Some(b'[') => match self.long_bracket_level() {
                Some(level) => {
                    let body = self.read_long_bracket(level)?;
                    Ok(Value::Str(String::from_utf8_lossy(body).into_owned()))
                }
                None => Err(self.unexpected("expression")),
            },
            Some(b'-') => {
                let at = self.pos;
                self.pos += 1;
                self.enter()?;
                let inner = self.parse_expr()?;
                self.leave();
                match inner {
                    Value::Number(n) => Ok(Value::Number(-n)),
                    other => Err(LiteralError::NotALiteral {
                        name: format!("-{}", other.type_name()),
                        offset: at,
                    }),
                }
            }
            Some(b'0'..=b'9') => self.parse_number().map(Value::Number),
            Some(b'.') if self.peek_at(1).is_some_and(|b| b.is_ascii_digit()) => {
                self.parse_number().map(Value::Number)
            }
            Some(b) if is_ident_start(b) => {
                let at = self.pos;
                match self.read_ident() {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    "nil" => Ok(Value::Nil),
                    other => Err(LiteralError::NotALiteral {
                        name: other.to_string(),
                        offset: at,
                    }),
                }
            }
            Some(_) => Err(self.unexpected("expression")),
        }
    }

    fn read_ident(&mut self) -> &'a str {
        let src = self.src;
        let start = self.pos;
        while self.peek().is_some_and(is_ident_byte) {
            self.pos += 1;
        }
        // identifiers are ASCII by construction
        std::str::from_utf8(&src[start..self.pos]).unwrap_or_default()
    }

    fn parse_table(&mut self) -> Result<Table, LiteralError> {
        self.pos += 1; // '{'
        let mut table = Table::new();
        let mut next_index: i64 = 1;
        loop {
            self.skip_trivia()?;
            match self.peek() {
                None => return Err(LiteralError::UnexpectedEof { expected: "'}'" }),
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(table);
                }
                _ => {}
            }

            let at = self.pos;
            if self.peek() == Some(b'[') && self.long_bracket_level().is_none() {
                // [expr] = expr
                self.pos += 1;
                let k = self.parse_expr()?;
                self.expect(b']', "']'")?;
                self.expect(b'=', "'='")?;
                let v = self.parse_expr()?;
                let key = Key::from_value(k)
                    .map_err(|reason| LiteralError::BadKey { reason, offset: at })?;
                table.insert(key, v);
            } else if self.peek().is_some_and(is_ident_start) && self.is_named_field() {
                // name = expr
                let name = self.read_ident().to_string();
                self.expect(b'=', "'='")?;
                let v = self.parse_expr()?;
                table.insert(Key::Str(name), v);
            } else {
                let v = self.parse_expr()?;
                table.insert(Key::Int(next_index), v);
                next_index += 1;
            }

            self.skip_trivia()?;
            match self.peek() {
                Some(b',' | b';') => self.pos += 1,
                Some(b'}') => {}
                _ => return Err(self.unexpected("',' or '}'")),
            }
        }
    }

    /// Lookahead: identifier followed by a single `=`.
    fn is_named_field(&mut self) -> bool {
        let save = self.pos;
        self.read_ident();
        let ok = self.skip_trivia().is_ok()
            && self.peek() == Some(b'=')
            && self.peek_at(1) != Some(b'=');
        self.pos = save;
        ok
    }

    fn parse_number(&mut self) -> Result<f64, LiteralError> {
        let start = self.pos;
        let n = if self.peek() == Some(b'0') && matches!(self.peek_at(1), Some(b'x' | b'X')) {
            self.pos += 2;
            let digits_start = self.pos;
            while self.peek().is_some_and(|b| b.is_ascii_hexdigit()) {
                self.pos += 1;
            }
            let digits = std::str::from_utf8(&self.src[digits_start..self.pos]).unwrap_or_default();
            if digits.is_empty() {
                return Err(LiteralError::InvalidNumber { offset: start });
            }
            digits
                .bytes()
                .fold(0f64, |acc, d| acc * 16.0 + (d as char).to_digit(16).unwrap_or(0) as f64)
        } else {
            while self.peek().is_some_and(|b| b.is_ascii_digit() || b == b'.') {
                self.pos += 1;
            }
            if matches!(self.peek(), Some(b'e' | b'E')) {
                self.pos += 1;
                if matches!(self.peek(), Some(b'+' | b'-')) {
                    self.pos += 1;
                }
                while self.peek().is_some_and(|b| b.is_ascii_digit()) {
                    self.pos += 1;
                }
            }
            std::str::from_utf8(&self.src[start..self.pos])
                .ok()
                .and_then(|s| s.parse::<f64>().ok())
                .ok_or(LiteralError::InvalidNumber { offset: start })?
        };
        // `12abc` and `1.2.3` are single malformed tokens in the source language
        if self.peek().is_some_and(|b| is_ident_byte(b) || b == b'.') {
            return Err(LiteralError::InvalidNumber { offset: start });
        }
        Ok(n)
    }

    fn parse_short_string(&mut self) -> Result<String, LiteralError> {
        let start = self.pos;
        let quote = self.src[self.pos];
        self.pos += 1;
        let mut buf: Vec<u8> = Vec::new();
        loop {
            let Some(b) = self.peek() else {
                return Err(LiteralError::UnterminatedString { offset: start });
            };
            self.pos += 1;
            match b {
                b'\n' | b'\r' => return Err(LiteralError::UnterminatedString { offset: start }),
                b'\\' => self.read_escape(&mut buf)?,
                _ if b == quote => break,
                _ => buf.push(b),
            }
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    fn read_escape(&mut self, buf: &mut Vec<u8>) -> Result<(), LiteralError> {
        let at = self.pos - 1;
        let Some(c) = self.peek() else {
            return Err(LiteralError::UnterminatedString { offset: at });
        };
        self.pos += 1;
        match c {
            b'a' => buf.push(0x07),
            b'b' => buf.push(0x08),
            b'f' => buf.push(0x0C),
            b'n' => buf.push(b'\n'),
            b'r' => buf.push(b'\r'),
            b't' => buf.push(b'\t'),
            b'v' => buf.push(0x0B),
            b'\\' | b'"' | b'\'' => buf.push(c),
            b'\n' | b'\r' => {
                buf.push(b'\n');
                // \r\n and \n\r count as one line break
                if let Some(next) = self.peek()
                    && (next == b'\n' || next == b'\r')
                    && next != c
                {
                    self.pos += 1;
                }
            }
            b'0'..=b'9' => {
                let mut code = (c - b'0') as u32;
                for _ in 0..2 {
                    match self.peek() {
                        Some(d @ b'0'..=b'9') => {
                            code = code * 10 + (d - b'0') as u32;
                            self.pos += 1;
                        }
                        _ => break,
                    }
                }
                let byte = u8::try_from(code)
                    .map_err(|_| LiteralError::InvalidEscape { offset: at })?;
                buf.push(byte);
            }
            _ => return Err(LiteralError::InvalidEscape { offset: at }),
        }
        Ok(())
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
