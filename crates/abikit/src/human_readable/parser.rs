//! Recursive descent parser for human-readable ABI declarations
//!
//! Declarations are parsed into a small syntax tree first; named types are
//! resolved against the `struct` declarations of the same document once the
//! whole input has been read, so structs may be declared in any order.

use std::collections::HashMap;

use super::lexer::{Lexer, Spanned, Token};
use crate::abi::{Param, ParamType};
use crate::item::{
    AbiItem, ConstructorDef, ErrorDef, EventDef, FallbackDef, FunctionDef, ReceiveDef,
    StateMutability,
};
use crate::AbiError;

/// Type expression before struct names are resolved
#[derive(Debug, Clone)]
enum TypeExpr {
    Elementary(ParamType),
    Tuple(Vec<ParamExpr>),
    Named(String, usize),
    Array(Box<TypeExpr>),
    FixedArray(Box<TypeExpr>, usize),
}

#[derive(Debug, Clone)]
struct ParamExpr {
    kind: TypeExpr,
    name: String,
    indexed: bool,
}

#[derive(Debug)]
enum Decl {
    Function {
        name: String,
        inputs: Vec<ParamExpr>,
        outputs: Vec<ParamExpr>,
        state_mutability: StateMutability,
    },
    Constructor {
        inputs: Vec<ParamExpr>,
        state_mutability: StateMutability,
    },
    Event {
        name: String,
        inputs: Vec<ParamExpr>,
        anonymous: bool,
    },
    Error {
        name: String,
        inputs: Vec<ParamExpr>,
    },
    Fallback(StateMutability),
    Receive,
    Struct {
        name: String,
        position: usize,
        fields: Vec<ParamExpr>,
    },
}

pub(crate) struct Parser<'input> {
    tokens: Vec<Spanned<'input>>,
    index: usize,
    end: usize,
}

impl<'input> Parser<'input> {
    pub(crate) fn new(input: &'input str) -> Result<Self, AbiError> {
        Ok(Self {
            tokens: Lexer::tokenize(input)?,
            index: 0,
            end: input.len(),
        })
    }

    // ==================== Token cursor ====================

    fn peek(&self) -> Option<Token<'input>> {
        self.tokens.get(self.index).map(|(_, t)| *t)
    }

    fn peek_nth(&self, n: usize) -> Option<Token<'input>> {
        self.tokens.get(self.index + n).map(|(_, t)| *t)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.index).map(|(pos, _)| *pos).unwrap_or(self.end)
    }

    fn is_done(&self) -> bool {
        self.index >= self.tokens.len()
    }

    fn eat(&mut self, expected: Token<'_>) -> bool {
        if self.peek() == Some(expected) {
            self.index += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token<'_>) -> Result<(), AbiError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("`{expected}`")))
        }
    }

    fn unexpected(&self, wanted: &str) -> AbiError {
        match self.peek() {
            Some(token) => AbiError::parse(
                self.position(),
                format!("expected {wanted}, found `{token}`"),
            ),
            None => AbiError::parse(self.end, format!("expected {wanted}, found end of input")),
        }
    }

    fn identifier(&mut self) -> Result<String, AbiError> {
        match self.peek() {
            Some(Token::Identifier(name)) => {
                self.index += 1;
                Ok(name.to_string())
            }
            _ => Err(self.unexpected("an identifier")),
        }
    }

    fn finish(&self) -> Result<(), AbiError> {
        if self.is_done() {
            Ok(())
        } else {
            Err(self.unexpected("end of input"))
        }
    }

    // ==================== Declarations ====================

    fn declarations(&mut self) -> Result<Vec<Decl>, AbiError> {
        let mut decls = Vec::new();
        loop {
            while self.eat(Token::Semicolon) {}
            if self.is_done() {
                return Ok(decls);
            }
            decls.push(self.declaration()?);
        }
    }

    fn declaration(&mut self) -> Result<Decl, AbiError> {
        match self.peek() {
            Some(Token::Function) => {
                self.index += 1;
                self.function()
            }
            // Bare `name(..)` is shorthand for a function
            Some(Token::Identifier(_)) if self.peek_nth(1) == Some(Token::OpenParen) => {
                self.function()
            }
            Some(Token::Constructor) => {
                self.index += 1;
                let inputs = self.params(false)?;
                let state_mutability = self.modifiers();
                Ok(Decl::Constructor {
                    inputs,
                    state_mutability,
                })
            }
            Some(Token::Event) => {
                self.index += 1;
                let name = self.identifier()?;
                let inputs = self.params(true)?;
                let anonymous = self.eat(Token::Anonymous);
                Ok(Decl::Event {
                    name,
                    inputs,
                    anonymous,
                })
            }
            Some(Token::Error) => {
                self.index += 1;
                let name = self.identifier()?;
                let inputs = self.params(false)?;
                Ok(Decl::Error { name, inputs })
            }
            Some(Token::Fallback) => {
                self.index += 1;
                self.expect(Token::OpenParen)?;
                self.expect(Token::CloseParen)?;
                Ok(Decl::Fallback(self.modifiers()))
            }
            Some(Token::Receive) => {
                self.index += 1;
                self.expect(Token::OpenParen)?;
                self.expect(Token::CloseParen)?;
                self.modifiers();
                Ok(Decl::Receive)
            }
            Some(Token::Struct) => {
                self.index += 1;
                let position = self.position();
                let name = self.identifier()?;
                let fields = self.struct_fields()?;
                Ok(Decl::Struct {
                    name,
                    position,
                    fields,
                })
            }
            _ => Err(self.unexpected("a declaration")),
        }
    }

    fn function(&mut self) -> Result<Decl, AbiError> {
        let name = self.identifier()?;
        let inputs = self.params(false)?;
        let mut state_mutability = StateMutability::NonPayable;
        let mut outputs = Vec::new();
        loop {
            if self.eat(Token::Returns) {
                outputs = self.params(false)?;
                continue;
            }
            match self.modifier() {
                Some(Some(m)) => state_mutability = m,
                Some(None) => {}
                None => break,
            }
        }
        Ok(Decl::Function {
            name,
            inputs,
            outputs,
            state_mutability,
        })
    }

    /// Consume trailing modifiers; the last mutability keyword wins
    fn modifiers(&mut self) -> StateMutability {
        let mut state_mutability = StateMutability::NonPayable;
        while let Some(modifier) = self.modifier() {
            if let Some(m) = modifier {
                state_mutability = m;
            }
        }
        state_mutability
    }

    /// Consume one visibility/mutability/inheritance keyword.
    ///
    /// `Some(Some(m))` for mutability keywords, `Some(None)` for the rest.
    fn modifier(&mut self) -> Option<Option<StateMutability>> {
        let mutability = match self.peek()? {
            Token::Pure => Some(StateMutability::Pure),
            Token::View | Token::Constant => Some(StateMutability::View),
            Token::Payable => Some(StateMutability::Payable),
            Token::NonPayable => Some(StateMutability::NonPayable),
            Token::Public
            | Token::External
            | Token::Internal
            | Token::Private
            | Token::Virtual
            | Token::Override => None,
            _ => return None,
        };
        self.index += 1;
        Some(mutability)
    }

    fn struct_fields(&mut self) -> Result<Vec<ParamExpr>, AbiError> {
        self.expect(Token::OpenBrace)?;
        let mut fields = Vec::new();
        while !self.eat(Token::CloseBrace) {
            let kind = self.type_expr()?;
            let name = self.identifier()?;
            self.expect(Token::Semicolon)?;
            fields.push(ParamExpr {
                kind,
                name,
                indexed: false,
            });
        }
        Ok(fields)
    }

    // ==================== Parameters and types ====================

    /// Parenthesized parameter list; `indexed` is only accepted for events
    fn params(&mut self, event: bool) -> Result<Vec<ParamExpr>, AbiError> {
        self.expect(Token::OpenParen)?;
        let mut params = Vec::new();
        if self.eat(Token::CloseParen) {
            return Ok(params);
        }
        loop {
            params.push(self.param(event)?);
            if self.eat(Token::CloseParen) {
                return Ok(params);
            }
            self.expect(Token::Comma)?;
        }
    }

    fn param(&mut self, event: bool) -> Result<ParamExpr, AbiError> {
        let kind = self.type_expr()?;
        while matches!(
            self.peek(),
            Some(Token::Memory | Token::Storage | Token::Calldata)
        ) {
            self.index += 1;
        }
        let indexed = if self.peek() == Some(Token::Indexed) {
            if !event {
                return Err(AbiError::parse(
                    self.position(),
                    "`indexed` is only allowed on event parameters",
                ));
            }
            self.index += 1;
            true
        } else {
            false
        };
        let name = match self.peek() {
            Some(Token::Identifier(name)) => {
                self.index += 1;
                name.to_string()
            }
            _ => String::new(),
        };
        Ok(ParamExpr {
            kind,
            name,
            indexed,
        })
    }

    fn type_expr(&mut self) -> Result<TypeExpr, AbiError> {
        let position = self.position();
        let bad_width = |err: AbiError| AbiError::parse(position, err.to_string());
        let mut kind = match self.peek() {
            Some(Token::Uint(bits)) => {
                TypeExpr::Elementary(ParamType::uint(bits).map_err(bad_width)?)
            }
            Some(Token::Int(bits)) => TypeExpr::Elementary(ParamType::int(bits).map_err(bad_width)?),
            Some(Token::FixedBytes(size)) => {
                TypeExpr::Elementary(ParamType::fixed_bytes(size).map_err(bad_width)?)
            }
            Some(Token::Bytes) => TypeExpr::Elementary(ParamType::Bytes),
            Some(Token::String) => TypeExpr::Elementary(ParamType::String),
            Some(Token::Bool) => TypeExpr::Elementary(ParamType::Bool),
            Some(Token::Address) => TypeExpr::Elementary(ParamType::Address),
            Some(Token::Identifier(name)) => TypeExpr::Named(name.to_string(), position),
            Some(Token::Tuple) => {
                self.index += 1;
                TypeExpr::Tuple(self.params(false)?)
            }
            Some(Token::OpenParen) => TypeExpr::Tuple(self.params(false)?),
            _ => return Err(self.unexpected("a type")),
        };
        if !matches!(kind, TypeExpr::Tuple(_)) {
            self.index += 1;
        }
        if kind_is_address(&kind) {
            self.eat(Token::Payable);
        }

        while self.eat(Token::OpenBracket) {
            kind = match self.peek() {
                Some(Token::CloseBracket) => {
                    self.index += 1;
                    TypeExpr::Array(Box::new(kind))
                }
                Some(Token::Number(digits)) => {
                    let size_position = self.position();
                    self.index += 1;
                    let size: usize = digits.parse().map_err(|_| {
                        AbiError::parse(size_position, format!("array size `{digits}` is too large"))
                    })?;
                    if size == 0 {
                        return Err(AbiError::parse(size_position, "fixed array size must be non-zero"));
                    }
                    self.expect(Token::CloseBracket)?;
                    TypeExpr::FixedArray(Box::new(kind), size)
                }
                _ => return Err(self.unexpected("`]` or an array size")),
            };
        }
        Ok(kind)
    }
}

fn kind_is_address(kind: &TypeExpr) -> bool {
    matches!(kind, TypeExpr::Elementary(ParamType::Address))
}

// ==================== Struct resolution ====================

struct Resolver {
    structs: HashMap<String, (usize, Vec<ParamExpr>)>,
    visiting: Vec<String>,
}

impl Resolver {
    fn new(decls: &[Decl]) -> Result<Self, AbiError> {
        let mut structs = HashMap::new();
        for decl in decls {
            if let Decl::Struct {
                name,
                position,
                fields,
            } = decl
            {
                if structs
                    .insert(name.clone(), (*position, fields.clone()))
                    .is_some()
                {
                    return Err(AbiError::parse(*position, format!("duplicate struct `{name}`")));
                }
            }
        }
        Ok(Self {
            structs,
            visiting: Vec::new(),
        })
    }

    fn params(&mut self, exprs: &[ParamExpr]) -> Result<Vec<Param>, AbiError> {
        exprs.iter().map(|expr| self.param(expr)).collect()
    }

    fn param(&mut self, expr: &ParamExpr) -> Result<Param, AbiError> {
        Ok(Param {
            name: expr.name.clone(),
            kind: self.kind(&expr.kind)?,
            indexed: expr.indexed,
            internal_type: internal_type(&expr.kind),
        })
    }

    fn kind(&mut self, expr: &TypeExpr) -> Result<ParamType, AbiError> {
        match expr {
            TypeExpr::Elementary(ty) => Ok(ty.clone()),
            TypeExpr::Tuple(params) => Ok(ParamType::Tuple(self.params(params)?)),
            TypeExpr::Array(inner) => Ok(ParamType::array(self.kind(inner)?)),
            TypeExpr::FixedArray(inner, size) => Ok(ParamType::fixed_array(self.kind(inner)?, *size)),
            TypeExpr::Named(name, position) => {
                if self.visiting.contains(name) {
                    return Err(AbiError::parse(*position, format!("recursive struct `{name}`")));
                }
                let fields = match self.structs.get(name) {
                    Some((_, fields)) => fields.clone(),
                    None => {
                        return Err(AbiError::parse(*position, format!("unknown type `{name}`")))
                    }
                };
                self.visiting.push(name.clone());
                let params = self.params(&fields);
                self.visiting.pop();
                Ok(ParamType::Tuple(params?))
            }
        }
    }

    fn item(&mut self, decl: Decl) -> Result<Option<AbiItem>, AbiError> {
        let item = match decl {
            Decl::Function {
                name,
                inputs,
                outputs,
                state_mutability,
            } => AbiItem::Function(FunctionDef {
                name,
                inputs: self.params(&inputs)?,
                outputs: self.params(&outputs)?,
                state_mutability,
            }),
            Decl::Constructor {
                inputs,
                state_mutability,
            } => AbiItem::Constructor(ConstructorDef {
                inputs: self.params(&inputs)?,
                state_mutability,
            }),
            Decl::Event {
                name,
                inputs,
                anonymous,
            } => AbiItem::Event(EventDef {
                name,
                inputs: self.params(&inputs)?,
                anonymous,
            }),
            Decl::Error { name, inputs } => AbiItem::Error(ErrorDef {
                name,
                inputs: self.params(&inputs)?,
            }),
            Decl::Fallback(state_mutability) => AbiItem::Fallback(FallbackDef { state_mutability }),
            Decl::Receive => AbiItem::Receive(ReceiveDef::default()),
            Decl::Struct { .. } => return Ok(None),
        };
        Ok(Some(item))
    }
}

/// `struct Name[..]` for parameters whose base type is a named struct
fn internal_type(expr: &TypeExpr) -> Option<String> {
    match expr {
        TypeExpr::Named(name, _) => Some(format!("struct {name}")),
        TypeExpr::Array(inner) => internal_type(inner).map(|base| format!("{base}[]")),
        TypeExpr::FixedArray(inner, size) => {
            internal_type(inner).map(|base| format!("{base}[{size}]"))
        }
        TypeExpr::Elementary(_) | TypeExpr::Tuple(_) => None,
    }
}

// ==================== Entry points ====================

impl Parser<'_> {
    /// Every declaration of a document, structs resolved and dropped
    pub(crate) fn parse_items(mut self) -> Result<Vec<AbiItem>, AbiError> {
        let decls = self.declarations()?;
        let mut resolver = Resolver::new(&decls)?;
        let mut items = Vec::with_capacity(decls.len());
        for decl in decls {
            if let Some(item) = resolver.item(decl)? {
                items.push(item);
            }
        }
        Ok(items)
    }

    /// A single declaration; structs are not available
    pub(crate) fn parse_item(mut self) -> Result<AbiItem, AbiError> {
        if self.is_done() {
            return Err(self.unexpected("a declaration"));
        }
        let decl = self.declaration()?;
        while self.eat(Token::Semicolon) {}
        self.finish()?;
        Resolver::new(&[])?
            .item(decl)?
            .ok_or_else(|| AbiError::parse(0, "expected a function, event, error or constructor"))
    }

    /// A single type, e.g. `(uint256,address)[]`
    pub(crate) fn parse_type(mut self) -> Result<ParamType, AbiError> {
        let expr = self.type_expr()?;
        self.finish()?;
        Resolver::new(&[])?.kind(&expr)
    }

    /// A comma separated parameter list, with or without parentheses
    pub(crate) fn parse_params(mut self) -> Result<Vec<Param>, AbiError> {
        let exprs = if self.peek() == Some(Token::OpenParen) && self.closes_at_end() {
            self.params(true)?
        } else if self.is_done() {
            Vec::new()
        } else {
            let mut exprs = vec![self.param(true)?];
            while self.eat(Token::Comma) {
                exprs.push(self.param(true)?);
            }
            exprs
        };
        self.finish()?;
        Resolver::new(&[])?.params(&exprs)
    }

    /// Whether the opening parenthesis is closed by the last token
    fn closes_at_end(&self) -> bool {
        let mut depth = 0usize;
        for (i, (_, token)) in self.tokens.iter().enumerate().skip(self.index) {
            match token {
                Token::OpenParen => depth += 1,
                Token::CloseParen => {
                    depth -= 1;
                    if depth == 0 {
                        return i + 1 == self.tokens.len();
                    }
                }
                _ => {}
            }
        }
        false
    }
}
