//! Text to token conversion
//!
//! Accepts the syntax produced by `Token`'s `Display`: decimal or `0x` hex
//! integers, `true`/`false`, `0x` hex bytes, quoted strings, `[..]` arrays
//! and `(..)` tuples. A top-level `string` may also be given unquoted.

use abikit_primitives::Address;

use super::token::{parse_u256, Token, I256};
use super::types::ParamType;
use crate::AbiError;

/// Parse `text` as a value of type `ty`
pub fn tokenize(ty: &ParamType, text: &str) -> Result<Token, AbiError> {
    ty.validate()?;

    let trimmed = text.trim();
    if *ty == ParamType::String && !trimmed.starts_with('"') {
        return Ok(Token::String(text.to_string()));
    }

    let mut reader = Reader { src: text, pos: 0 };
    let token = reader.value(ty)?;
    reader.skip_ws();
    if reader.pos != text.len() {
        return Err(AbiError::parse(reader.pos, "unexpected trailing input"));
    }
    Ok(token)
}

/// Parse one value per type, e.g. from command line arguments
pub fn tokenize_all<S: AsRef<str>>(types: &[ParamType], values: &[S]) -> Result<Vec<Token>, AbiError> {
    if types.len() != values.len() {
        return Err(AbiError::ArityMismatch {
            expected: types.len(),
            got: values.len(),
        });
    }
    types
        .iter()
        .zip(values)
        .map(|(ty, value)| tokenize(ty, value.as_ref()))
        .collect()
}

struct Reader<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Reader<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn expect(&mut self, c: char) -> Result<(), AbiError> {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            Ok(())
        } else {
            Err(AbiError::parse(self.pos, format!("expected `{c}`")))
        }
    }

    fn value(&mut self, ty: &ParamType) -> Result<Token, AbiError> {
        self.skip_ws();
        match ty {
            ParamType::Array(inner) => Ok(Token::Array(self.list(inner)?)),
            ParamType::FixedArray(inner, size) => {
                let start = self.pos;
                let items = self.list(inner)?;
                if items.len() != *size {
                    return Err(AbiError::parse(
                        start,
                        format!("expected {size} elements for {ty}, got {}", items.len()),
                    ));
                }
                Ok(Token::FixedArray(items))
            }
            ParamType::Tuple(params) => {
                self.expect('(')?;
                let mut items = Vec::with_capacity(params.len());
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        self.expect(',')?;
                    }
                    items.push(self.value(&param.kind)?);
                }
                self.expect(')')?;
                Ok(Token::Tuple(items))
            }
            ParamType::String if self.peek() == Some('"') => self.quoted().map(Token::String),
            _ => {
                let start = self.pos;
                let atom = self.atom();
                elementary(ty, atom).map_err(|e| match e {
                    AbiError::Parse { .. } => e,
                    other => AbiError::parse(start, other.to_string()),
                })
            }
        }
    }

    fn list(&mut self, inner: &ParamType) -> Result<Vec<Token>, AbiError> {
        self.expect('[')?;
        let mut items = Vec::new();
        self.skip_ws();
        if self.peek() == Some(']') {
            self.pos += 1;
            return Ok(items);
        }
        loop {
            items.push(self.value(inner)?);
            self.skip_ws();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some(']') => {
                    self.pos += 1;
                    return Ok(items);
                }
                _ => return Err(AbiError::parse(self.pos, "expected `,` or `]`")),
            }
        }
    }

    /// Raw text up to the next delimiter
    fn atom(&mut self) -> &'a str {
        let rest = self.rest();
        let end = rest
            .find(|c: char| matches!(c, ',' | ']' | ')'))
            .unwrap_or(rest.len());
        self.pos += end;
        rest[..end].trim()
    }

    fn quoted(&mut self) -> Result<String, AbiError> {
        let start = self.pos;
        self.pos += 1;
        let mut out = String::new();
        let mut chars = self.rest().char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => {
                    self.pos += i + 1;
                    return Ok(out);
                }
                '\\' => {
                    let escaped = match chars.next() {
                        Some((_, 'n')) => '\n',
                        Some((_, 't')) => '\t',
                        Some((_, 'r')) => '\r',
                        Some((_, '0')) => '\0',
                        Some((_, c @ ('\\' | '"' | '\''))) => c,
                        Some((j, 'u')) => unicode_escape(&mut chars, start + 1 + j)?,
                        _ => return Err(AbiError::parse(start + 1 + i, "invalid escape")),
                    };
                    out.push(escaped);
                }
                c => out.push(c),
            }
        }
        Err(AbiError::parse(start, "unterminated string"))
    }
}

fn unicode_escape(chars: &mut std::str::CharIndices<'_>, position: usize) -> Result<char, AbiError> {
    let bad = || AbiError::parse(position, "invalid unicode escape");
    if chars.next().map(|(_, c)| c) != Some('{') {
        return Err(bad());
    }
    let mut digits = String::new();
    for (_, c) in chars.by_ref() {
        if c == '}' {
            let code = u32::from_str_radix(&digits, 16).map_err(|_| bad())?;
            return char::from_u32(code).ok_or_else(bad);
        }
        digits.push(c);
    }
    Err(bad())
}

fn elementary(ty: &ParamType, text: &str) -> Result<Token, AbiError> {
    match ty {
        ParamType::Address => Ok(Token::Address(Address::from_hex(text)?)),
        ParamType::Uint(_) => Ok(Token::Uint(parse_u256(text)?)),
        ParamType::Int(_) => Ok(Token::Int(text.parse::<I256>()?)),
        ParamType::Bool => match text {
            "true" => Ok(Token::Bool(true)),
            "false" => Ok(Token::Bool(false)),
            other => Err(AbiError::InvalidEncodingType {
                expected: "bool".into(),
                found: format!("`{other}`"),
            }),
        },
        ParamType::Bytes => Ok(Token::Bytes(hex_bytes(text)?)),
        ParamType::FixedBytes(size) => {
            let data = hex_bytes(text)?;
            if data.len() != *size {
                return Err(AbiError::InvalidEncodingType {
                    expected: ty.to_string(),
                    found: format!("{} bytes", data.len()),
                });
            }
            Ok(Token::FixedBytes(data))
        }
        ParamType::String => Ok(Token::String(text.to_string())),
        _ => Err(AbiError::NotSupported(format!("{ty} is not elementary"))),
    }
}

fn hex_bytes(text: &str) -> Result<Vec<u8>, AbiError> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .ok_or_else(|| AbiError::InvalidHex(format!("missing 0x prefix in `{text}`")))?;
    Ok(hex::decode(digits)?)
}
