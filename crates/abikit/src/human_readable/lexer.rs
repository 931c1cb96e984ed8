//! Tokenizer for human-readable ABI declarations

use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

use crate::AbiError;

/// A lexical token borrowed from the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token<'input> {
    Identifier(&'input str),
    Number(&'input str),

    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    OpenBrace,
    CloseBrace,
    Comma,
    Semicolon,

    Function,
    Event,
    Error,
    Constructor,
    Fallback,
    Receive,
    Struct,
    Tuple,
    Returns,
    Indexed,
    Anonymous,

    Pure,
    View,
    Payable,
    NonPayable,
    Constant,

    Public,
    External,
    Internal,
    Private,
    Virtual,
    Override,

    Memory,
    Storage,
    Calldata,

    Uint(usize),
    Int(usize),
    FixedBytes(usize),
    Bytes,
    String,
    Bool,
    Address,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Token::Identifier(id) | Token::Number(id) => return f.write_str(id),
            Token::Uint(bits) => return write!(f, "uint{bits}"),
            Token::Int(bits) => return write!(f, "int{bits}"),
            Token::FixedBytes(size) => return write!(f, "bytes{size}"),
            Token::OpenParen => "(",
            Token::CloseParen => ")",
            Token::OpenBracket => "[",
            Token::CloseBracket => "]",
            Token::OpenBrace => "{",
            Token::CloseBrace => "}",
            Token::Comma => ",",
            Token::Semicolon => ";",
            Token::Function => "function",
            Token::Event => "event",
            Token::Error => "error",
            Token::Constructor => "constructor",
            Token::Fallback => "fallback",
            Token::Receive => "receive",
            Token::Struct => "struct",
            Token::Tuple => "tuple",
            Token::Returns => "returns",
            Token::Indexed => "indexed",
            Token::Anonymous => "anonymous",
            Token::Pure => "pure",
            Token::View => "view",
            Token::Payable => "payable",
            Token::NonPayable => "nonpayable",
            Token::Constant => "constant",
            Token::Public => "public",
            Token::External => "external",
            Token::Internal => "internal",
            Token::Private => "private",
            Token::Virtual => "virtual",
            Token::Override => "override",
            Token::Memory => "memory",
            Token::Storage => "storage",
            Token::Calldata => "calldata",
            Token::Bytes => "bytes",
            Token::String => "string",
            Token::Bool => "bool",
            Token::Address => "address",
        };
        f.write_str(text)
    }
}

/// Token paired with the byte offset it starts at
pub(crate) type Spanned<'input> = (usize, Token<'input>);

#[derive(Clone, Debug)]
pub(crate) struct Lexer<'input> {
    input: &'input str,
    chars: Peekable<CharIndices<'input>>,
}

impl<'input> Lexer<'input> {
    pub(crate) fn new(input: &'input str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    /// Lex the whole input; the first bad character rejects it
    pub(crate) fn tokenize(input: &'input str) -> Result<Vec<Spanned<'input>>, AbiError> {
        Lexer::new(input).collect()
    }

    fn take_while(&mut self, start: usize, pred: impl Fn(char) -> bool) -> &'input str {
        let mut end = self.input.len();
        while let Some(&(i, ch)) = self.chars.peek() {
            if !pred(ch) {
                end = i;
                break;
            }
            self.chars.next();
        }
        &self.input[start..end]
    }

    fn next_token(&mut self) -> Option<Result<Spanned<'input>, AbiError>> {
        loop {
            let (start, ch) = self.chars.next()?;
            let token = match ch {
                c if c.is_whitespace() => continue,
                c if c.is_ascii_alphabetic() || c == '_' || c == '$' => {
                    let word =
                        self.take_while(start, |c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
                    keyword(word).unwrap_or(Token::Identifier(word))
                }
                c if c.is_ascii_digit() => Token::Number(self.take_while(start, |c| c.is_ascii_digit())),
                '(' => Token::OpenParen,
                ')' => Token::CloseParen,
                '[' => Token::OpenBracket,
                ']' => Token::CloseBracket,
                '{' => Token::OpenBrace,
                '}' => Token::CloseBrace,
                ',' => Token::Comma,
                ';' => Token::Semicolon,
                other => {
                    return Some(Err(AbiError::parse(
                        start,
                        format!("unexpected character `{other}`"),
                    )))
                }
            };
            return Some(Ok((start, token)));
        }
    }
}

impl<'input> Iterator for Lexer<'input> {
    type Item = Result<Spanned<'input>, AbiError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

fn keyword(word: &str) -> Option<Token<'_>> {
    let token = match word {
        "function" => Token::Function,
        "event" => Token::Event,
        "error" => Token::Error,
        "constructor" => Token::Constructor,
        "fallback" => Token::Fallback,
        "receive" => Token::Receive,
        "struct" => Token::Struct,
        "tuple" => Token::Tuple,
        "returns" => Token::Returns,
        "indexed" => Token::Indexed,
        "anonymous" => Token::Anonymous,
        "pure" => Token::Pure,
        "view" => Token::View,
        "payable" => Token::Payable,
        "nonpayable" => Token::NonPayable,
        "constant" => Token::Constant,
        "public" => Token::Public,
        "external" => Token::External,
        "internal" => Token::Internal,
        "private" => Token::Private,
        "virtual" => Token::Virtual,
        "override" => Token::Override,
        "memory" => Token::Memory,
        "storage" => Token::Storage,
        "calldata" => Token::Calldata,
        "uint" => Token::Uint(256),
        "int" => Token::Int(256),
        "byte" => Token::FixedBytes(1),
        "bytes" => Token::Bytes,
        "string" => Token::String,
        "bool" => Token::Bool,
        "address" => Token::Address,
        _ => return sized_keyword(word),
    };
    Some(token)
}

/// `uintN`, `intN` and `bytesN`; sizes are checked by the parser
fn sized_keyword(word: &str) -> Option<Token<'_>> {
    let size = |digits: &str| -> Option<usize> {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    };
    if let Some(digits) = word.strip_prefix("uint") {
        return size(digits).map(Token::Uint);
    }
    if let Some(digits) = word.strip_prefix("int") {
        return size(digits).map(Token::Int);
    }
    word.strip_prefix("bytes").and_then(size).map(Token::FixedBytes)
}
