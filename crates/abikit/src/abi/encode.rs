//! ABI encoding
//!
//! Every value is checked against its declared type while it is written. The
//! output buffer is reserved up front, up to a bounded size, and dropped on the
//! first error, so callers either get a complete encoding or nothing.

use abikit_primitives::{Selector, U256};

use super::token::{Token, I256};
use super::types::ParamType;
use crate::AbiError;

/// Upper bound on the buffer reserved before any token has been checked
const MAX_PRESIZE: usize = 64 * 1024;

/// Encode tokens against their declared parameter types
pub fn encode(types: &[ParamType], tokens: &[Token]) -> Result<Vec<u8>, AbiError> {
    if types.len() != tokens.len() {
        return Err(AbiError::ArityMismatch {
            expected: types.len(),
            got: tokens.len(),
        });
    }
    for ty in types {
        ty.validate()?;
    }

    let slots: Vec<_> = types.iter().zip(tokens).collect();
    let size = sequence_size(&slots);
    let mut encoder = Encoder::with_capacity(size.min(MAX_PRESIZE));
    encoder.encode_sequence(&slots)?;

    tracing::trace!("Encoded {} params into {} bytes", types.len(), size);
    Ok(encoder.finish())
}

/// Encode tokens, inferring each type from the token itself.
///
/// Integers are encoded as 256-bit values; prefer [`encode`] when the
/// parameter types are known.
pub fn encode_tokens(tokens: &[Token]) -> Result<Vec<u8>, AbiError> {
    let types: Vec<ParamType> = tokens.iter().map(|t| t.type_of()).collect();
    encode(&types, tokens)
}

/// Encode a function call: selector followed by the encoded arguments
pub fn encode_function_call(
    selector: Selector,
    types: &[ParamType],
    tokens: &[Token],
) -> Result<Vec<u8>, AbiError> {
    let args = encode(types, tokens)?;
    let mut data = Vec::with_capacity(Selector::LEN + args.len());
    data.extend_from_slice(selector.as_bytes());
    data.extend_from_slice(&args);
    Ok(data)
}

/// Compute function selector (first 4 bytes of keccak256(signature))
pub fn function_selector(signature: &str) -> Selector {
    Selector::from_signature(signature)
}

type Slot<'a> = (&'a ParamType, &'a Token);

struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    fn with_capacity(size: usize) -> Self {
        Self {
            buf: Vec::with_capacity(size),
        }
    }

    fn finish(self) -> Vec<u8> {
        self.buf
    }

    fn push_word(&mut self, word: &[u8; 32]) {
        self.buf.extend_from_slice(word);
    }

    fn push_usize(&mut self, value: usize) {
        self.push_word(&u256_word(U256::from(value)));
    }

    /// Length-prefixed, right-padded byte payload
    fn push_dynamic_bytes(&mut self, data: &[u8]) {
        self.push_usize(data.len());
        self.buf.extend_from_slice(data);
        self.buf.resize(self.buf.len() + padding_for(data.len()), 0);
    }

    /// One head-tail block: heads in order, then tails in the same order.
    /// Offsets are relative to the first head word of this block.
    fn encode_sequence(&mut self, slots: &[Slot<'_>]) -> Result<(), AbiError> {
        let head_len: usize = slots.iter().map(|(ty, _)| ty.head_size()).sum();
        let mut tail_offset = head_len;

        for (ty, token) in slots {
            if ty.is_dynamic() {
                self.push_usize(tail_offset);
                tail_offset += encoded_size(ty, token);
            } else {
                self.encode_token(ty, token)?;
            }
        }

        for (ty, token) in slots.iter().filter(|(ty, _)| ty.is_dynamic()) {
            self.encode_token(ty, token)?;
        }
        Ok(())
    }

    fn encode_token(&mut self, ty: &ParamType, token: &Token) -> Result<(), AbiError> {
        match (ty, token) {
            (ParamType::Address, Token::Address(addr)) => self.push_word(&addr.to_word()),
            (ParamType::Uint(bits), _) => self.push_word(&uint_word(*bits, ty, token)?),
            (ParamType::Int(bits), _) => self.push_word(&int_word(*bits, ty, token)?),
            (ParamType::Bool, Token::Bool(b)) => {
                let mut word = [0u8; 32];
                word[31] = u8::from(*b);
                self.push_word(&word);
            }
            (ParamType::FixedBytes(size), Token::FixedBytes(data) | Token::Bytes(data)) => {
                if data.len() != *size {
                    return Err(AbiError::InvalidEncodingType {
                        expected: ty.to_string(),
                        found: format!("{} bytes", data.len()),
                    });
                }
                let mut word = [0u8; 32];
                word[..data.len()].copy_from_slice(data);
                self.push_word(&word);
            }
            (ParamType::Bytes, Token::Bytes(data) | Token::FixedBytes(data)) => {
                self.push_dynamic_bytes(data)
            }
            (ParamType::String, Token::String(s)) => self.push_dynamic_bytes(s.as_bytes()),
            (ParamType::Array(_), _) => {
                let slots = compound_slots(ty, token)?;
                self.push_usize(slots.len());
                self.encode_sequence(&slots)?;
            }
            (ParamType::FixedArray(..) | ParamType::Tuple(_), _) => {
                let slots = compound_slots(ty, token)?;
                self.encode_sequence(&slots)?;
            }
            _ => return Err(mismatch(ty, token)),
        }
        Ok(())
    }
}

/// Pair each member of a compound token with its declared type
fn compound_slots<'a>(ty: &'a ParamType, token: &'a Token) -> Result<Vec<Slot<'a>>, AbiError> {
    match (ty, token) {
        (ParamType::Array(inner), Token::Array(items) | Token::FixedArray(items)) => {
            Ok(items.iter().map(|item| (inner.as_ref(), item)).collect())
        }
        (ParamType::FixedArray(inner, size), Token::FixedArray(items) | Token::Array(items)) => {
            if items.len() != *size {
                return Err(AbiError::ArityMismatch {
                    expected: *size,
                    got: items.len(),
                });
            }
            Ok(items.iter().map(|item| (inner.as_ref(), item)).collect())
        }
        (ParamType::Tuple(params), Token::Tuple(items)) => {
            if items.len() != params.len() {
                return Err(AbiError::ArityMismatch {
                    expected: params.len(),
                    got: items.len(),
                });
            }
            Ok(params.iter().map(|p| &p.kind).zip(items).collect())
        }
        _ => Err(mismatch(ty, token)),
    }
}

/// Total bytes a token occupies when written by `encode_token`
fn encoded_size(ty: &ParamType, token: &Token) -> usize {
    if !ty.is_dynamic() {
        return ty.head_size();
    }
    match (ty, token) {
        (ParamType::Bytes, Token::Bytes(data) | Token::FixedBytes(data)) => {
            32 + data.len() + padding_for(data.len())
        }
        (ParamType::String, Token::String(s)) => 32 + s.len() + padding_for(s.len()),
        (ParamType::Array(_), _) => 32 + compound_size(ty, token),
        _ => compound_size(ty, token),
    }
}

fn compound_size(ty: &ParamType, token: &Token) -> usize {
    // Malformed compounds are rejected while writing; their size is irrelevant.
    compound_slots(ty, token)
        .map(|slots| sequence_size(&slots))
        .unwrap_or(0)
}

fn sequence_size(slots: &[Slot<'_>]) -> usize {
    slots
        .iter()
        .map(|(ty, token)| {
            if ty.is_dynamic() {
                32 + encoded_size(ty, token)
            } else {
                ty.head_size()
            }
        })
        .sum()
}

pub(crate) fn uint_word(bits: usize, ty: &ParamType, token: &Token) -> Result<[u8; 32], AbiError> {
    let value = match token {
        Token::Uint(v) => *v,
        Token::Int(i) if !i.is_negative() => i.abs(),
        Token::Int(_) => {
            return Err(AbiError::InvalidEncodingType {
                expected: ty.to_string(),
                found: token.kind_name().to_string(),
            })
        }
        _ => return Err(mismatch(ty, token)),
    };
    if value.bits() > bits {
        return Err(AbiError::Overflow(ty.to_string()));
    }
    Ok(u256_word(value))
}

pub(crate) fn int_word(bits: usize, ty: &ParamType, token: &Token) -> Result<[u8; 32], AbiError> {
    let value = match token {
        Token::Int(i) => *i,
        Token::Uint(v) => I256::new(*v, false),
        _ => return Err(mismatch(ty, token)),
    };
    if !value.fits(bits) {
        return Err(AbiError::Overflow(ty.to_string()));
    }
    Ok(value.to_word())
}

pub(crate) fn u256_word(value: U256) -> [u8; 32] {
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    word
}

pub(crate) fn padding_for(len: usize) -> usize {
    len.div_ceil(32) * 32 - len
}

pub(crate) fn mismatch(ty: &ParamType, token: &Token) -> AbiError {
    AbiError::InvalidEncodingType {
        expected: ty.to_string(),
        found: token.kind_name().to_string(),
    }
}
