//! Recursive-descent parser for JSON text

use std::str::FromStr;

use crate::scratch::ScratchStack;
use crate::types::{ObjectMap, ParseError, Result, Value};

/// Single-shot JSON parser: one cursor over the input, one scratch stack,
/// one root value out.
///
/// The cursor reads end-of-input (and any embedded NUL byte) as a zero
/// terminator, so every production can dispatch on a plain byte without
/// separate end checks; content after a NUL is never reached.
pub struct Parser<'a> {
    input: &'a str,
    pos: usize,
    scratch: ScratchStack,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            scratch: ScratchStack::new(),
        }
    }

    /// Parse the whole input as exactly one JSON value surrounded by
    /// optional whitespace.
    pub fn parse(mut self) -> Result<Value> {
        self.skip_whitespace();
        let value = self.parse_value()?;
        self.skip_whitespace();
        if self.cur() != 0 {
            return Err(ParseError::RootNotSingular);
        }
        Ok(value)
    }

    // -------------------------------------------------------------------------
    // Cursor primitives
    // -------------------------------------------------------------------------

    fn byte_at(&self, pos: usize) -> u8 {
        self.input.as_bytes().get(pos).copied().unwrap_or(0)
    }

    fn cur(&self) -> u8 {
        self.byte_at(self.pos)
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.cur(), b' ' | b'\t' | b'\n' | b'\r') {
            self.bump();
        }
    }

    // -------------------------------------------------------------------------
    // Productions
    // -------------------------------------------------------------------------

    fn parse_value(&mut self) -> Result<Value> {
        match self.cur() {
            b't' => self.parse_literal(b"true", Value::Bool(true)),
            b'f' => self.parse_literal(b"false", Value::Bool(false)),
            b'n' => self.parse_literal(b"null", Value::Null),
            b'"' => self.parse_string(),
            b'[' => self.parse_array(),
            b'{' => self.parse_object(),
            0 => Err(ParseError::UnexpectedSymbol),
            _ => self.parse_number(),
        }
    }

    fn parse_literal(&mut self, keyword: &[u8], value: Value) -> Result<Value> {
        for (i, &expected) in keyword.iter().enumerate() {
            if self.byte_at(self.pos + i) != expected {
                return Err(ParseError::InvalidValue);
            }
        }
        self.pos += keyword.len();
        Ok(value)
    }

    /// number = [ '-' ] int [ frac ] [ exp ]
    /// int    = '0' | [1-9] [0-9]*
    /// frac   = '.' [0-9]+
    /// exp    = ('e'|'E') ['+'|'-'] [0-9]+
    fn parse_number(&mut self) -> Result<Value> {
        let start = self.pos;
        let mut end = self.pos;

        if self.byte_at(end) == b'-' {
            end += 1;
        }

        if self.byte_at(end) == b'0' {
            end += 1;
            // A digit or hex marker here would extend the lexeme beyond
            // what the grammar admits (leading zeros, 0x...).
            if matches!(self.byte_at(end), b'0'..=b'9' | b'x' | b'X') {
                return Err(ParseError::InvalidValue);
            }
        } else {
            if !matches!(self.byte_at(end), b'1'..=b'9') {
                return Err(ParseError::InvalidValue);
            }
            while self.byte_at(end).is_ascii_digit() {
                end += 1;
            }
        }

        if self.byte_at(end) == b'.' {
            end += 1;
            if !self.byte_at(end).is_ascii_digit() {
                return Err(ParseError::InvalidValue);
            }
            while self.byte_at(end).is_ascii_digit() {
                end += 1;
            }
        }

        if matches!(self.byte_at(end), b'e' | b'E') {
            end += 1;
            if matches!(self.byte_at(end), b'+' | b'-') {
                end += 1;
            }
            if !self.byte_at(end).is_ascii_digit() {
                return Err(ParseError::InvalidValue);
            }
            while self.byte_at(end).is_ascii_digit() {
                end += 1;
            }
        }

        // The scanned lexeme is pure ASCII, so the slice is sound. A
        // conversion failure on a lexeme the scan accepted is defensive.
        let number =
            f64::from_str(&self.input[start..end]).map_err(|_| ParseError::InvalidValue)?;
        // from_str signals out-of-range by returning an infinity; the
        // grammar admits no infinity literal, so this is always overflow.
        if number.is_infinite() {
            return Err(ParseError::NumberTooLarge);
        }
        self.pos = end;
        Ok(Value::Number(number))
    }

    fn parse_string(&mut self) -> Result<Value> {
        let len = self.parse_string_raw()?;
        let bytes = self.scratch.pop(len);
        // The segment is valid UTF-8: raw bytes come from a &str and escape
        // decoding emits whole scalar-value sequences.
        let text = String::from_utf8(bytes.to_vec()).expect("scratch emits valid utf-8");
        Ok(Value::String(text))
    }

    /// Decode one string production into the scratch stack and return the
    /// decoded byte length. On any failure the scratch is unwound to the
    /// top-mark captured at entry.
    fn parse_string_raw(&mut self) -> Result<usize> {
        let mark = self.scratch.top();
        self.bump(); // opening quote
        loop {
            let cur = self.cur();
            self.bump();
            match cur {
                b'"' => return Ok(self.scratch.top() - mark),
                b'\\' => {
                    let introducer = self.cur();
                    self.bump();
                    match introducer {
                        b'"' => self.scratch.push_byte(b'"'),
                        b'\\' => self.scratch.push_byte(b'\\'),
                        b'/' => self.scratch.push_byte(b'/'),
                        b'b' => self.scratch.push_byte(0x08),
                        b'f' => self.scratch.push_byte(0x0C),
                        b'n' => self.scratch.push_byte(b'\n'),
                        b'r' => self.scratch.push_byte(b'\r'),
                        b't' => self.scratch.push_byte(b'\t'),
                        b'u' => match self.parse_escaped_code_point() {
                            Ok(code_point) => self.emit_utf8(code_point),
                            Err(status) => {
                                self.scratch.set_top(mark);
                                return Err(status);
                            }
                        },
                        _ => {
                            self.scratch.set_top(mark);
                            return Err(ParseError::InvalidStringEscape);
                        }
                    }
                }
                0 => {
                    self.scratch.set_top(mark);
                    return Err(ParseError::MissQuotationMark);
                }
                c if c < 0x20 => {
                    self.scratch.set_top(mark);
                    return Err(ParseError::InvalidStringChar);
                }
                c => self.scratch.push_byte(c),
            }
        }
    }

    /// Decode the hex digits of a `\u` escape, consuming a second
    /// `\uXXXX` unit when the first is a high surrogate.
    fn parse_escaped_code_point(&mut self) -> Result<u32> {
        let high = self.parse_hex4()?;
        if (0xD800..=0xDBFF).contains(&high) {
            if self.cur() != b'\\' {
                return Err(ParseError::InvalidUnicodeSurrogate);
            }
            self.bump();
            if self.cur() != b'u' {
                return Err(ParseError::InvalidUnicodeSurrogate);
            }
            self.bump();
            let low = self.parse_hex4()?;
            if !(0xDC00..=0xDFFF).contains(&low) {
                return Err(ParseError::InvalidUnicodeSurrogate);
            }
            return Ok((((high - 0xD800) << 10) | (low - 0xDC00)) + 0x10000);
        }
        Ok(high)
    }

    fn parse_hex4(&mut self) -> Result<u32> {
        let mut acc = 0u32;
        for _ in 0..4 {
            let digit = match self.cur() {
                c @ b'0'..=b'9' => (c - b'0') as u32,
                c @ b'A'..=b'F' => (c - b'A' + 10) as u32,
                c @ b'a'..=b'f' => (c - b'a' + 10) as u32,
                _ => return Err(ParseError::InvalidUnicodeHex),
            };
            acc = (acc << 4) | digit;
            self.bump();
        }
        Ok(acc)
    }

    fn emit_utf8(&mut self, code_point: u32) {
        if code_point <= 0x7F {
            self.scratch.push_byte(code_point as u8);
        } else if code_point <= 0x7FF {
            self.scratch.push_byte(0xC0 | (code_point >> 6) as u8);
            self.scratch.push_byte(0x80 | (code_point & 0x3F) as u8);
        } else if code_point <= 0xFFFF {
            self.scratch.push_byte(0xE0 | (code_point >> 12) as u8);
            self.scratch.push_byte(0x80 | ((code_point >> 6) & 0x3F) as u8);
            self.scratch.push_byte(0x80 | (code_point & 0x3F) as u8);
        } else {
            self.scratch.push_byte(0xF0 | (code_point >> 18) as u8);
            self.scratch.push_byte(0x80 | ((code_point >> 12) & 0x3F) as u8);
            self.scratch.push_byte(0x80 | ((code_point >> 6) & 0x3F) as u8);
            self.scratch.push_byte(0x80 | (code_point & 0x3F) as u8);
        }
    }

    fn parse_array(&mut self) -> Result<Value> {
        self.bump(); // '['
        let mut elements = Vec::new();
        self.skip_whitespace();
        if self.cur() == b']' {
            self.bump();
            return Ok(Value::Array(elements));
        }
        loop {
            elements.push(self.parse_value()?);
            self.skip_whitespace();
            match self.cur() {
                b',' => {
                    self.bump();
                    self.skip_whitespace();
                }
                b']' => {
                    self.bump();
                    return Ok(Value::Array(elements));
                }
                _ => return Err(ParseError::MissArraySymbol),
            }
        }
    }

    fn parse_object(&mut self) -> Result<Value> {
        self.bump(); // '{'
        let mut members = ObjectMap::new();
        self.skip_whitespace();
        if self.cur() == b'}' {
            self.bump();
            return Ok(Value::Object(members));
        }
        loop {
            if self.cur() != b'"' {
                return Err(ParseError::MissObjectKey);
            }
            // The key stays on the scratch while the member value is
            // parsed; nested strings push and drain above it.
            let key_len = self.parse_string_raw()?;
            self.skip_whitespace();
            if self.cur() != b':' {
                return Err(ParseError::MissObjectSymbol);
            }
            self.bump();
            self.skip_whitespace();
            let value = self.parse_value()?;
            let key_bytes = self.scratch.pop(key_len);
            let key =
                String::from_utf8(key_bytes.to_vec()).expect("scratch emits valid utf-8");
            // First writer wins on duplicate keys.
            members.entry(key).or_insert(value);
            self.skip_whitespace();
            match self.cur() {
                b',' => {
                    self.bump();
                    self.skip_whitespace();
                }
                b'}' => {
                    self.bump();
                    return Ok(Value::Object(members));
                }
                _ => return Err(ParseError::MissObjectSymbol),
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
