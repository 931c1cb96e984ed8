//! ABI decoding

use abikit_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use super::encode::padding_for;
use super::token::{Token, I256};
use super::types::ParamType;
use crate::AbiError;

/// Default cap for a single length word and for the total number of decoded
/// array elements.
pub const DEFAULT_MAX_LENGTH: usize = 1 << 20;

/// Decoder behaviour switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Accept bytes after the last consumed word and non-canonical padding
    pub allow_junk_data: bool,
    /// Largest accepted `bytes`/`string` length, and budget for the total
    /// number of array elements across the whole payload
    pub max_length: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            allow_junk_data: false,
            max_length: DEFAULT_MAX_LENGTH,
        }
    }
}

impl DecodeOptions {
    /// Options tolerating trailing junk, as returned by some RPC nodes
    pub fn lenient() -> Self {
        Self {
            allow_junk_data: true,
            ..Self::default()
        }
    }
}

/// Decode tokens from ABI-encoded data
pub fn decode(
    types: &[ParamType],
    data: &[u8],
    options: &DecodeOptions,
) -> Result<Vec<Token>, AbiError> {
    for ty in types {
        ty.validate()?;
    }

    let mut decoder = Decoder {
        data,
        options,
        consumed: 0,
        elements: 0,
    };
    let types: Vec<&ParamType> = types.iter().collect();
    let tokens = decoder.decode_sequence(&types, 0)?;

    let consumed = decoder.consumed;
    if consumed > data.len() {
        return Err(AbiError::InvalidDecodeDataSize {
            needed: consumed,
            available: data.len(),
        });
    }
    if consumed < data.len() {
        if !options.allow_junk_data {
            return Err(AbiError::JunkDataNotAllowed {
                consumed,
                total: data.len(),
            });
        }
        tracing::warn!(
            "Ignoring {} trailing bytes after ABI payload",
            data.len() - consumed
        );
    }

    Ok(tokens)
}

struct Decoder<'a> {
    data: &'a [u8],
    options: &'a DecodeOptions,
    /// Furthest byte read so far, padding included
    consumed: usize,
    /// Array elements allocated so far
    elements: usize,
}

impl<'a> Decoder<'a> {
    fn strict(&self) -> bool {
        !self.options.allow_junk_data
    }

    fn word(&mut self, pos: usize) -> Result<&'a [u8; 32], AbiError> {
        let data: &'a [u8] = self.data;
        let end = pos.checked_add(32).ok_or_else(|| AbiError::InvalidOffset(pos.to_string()))?;
        let word = data
            .get(pos..end)
            .and_then(|w| <&[u8; 32]>::try_from(w).ok())
            .ok_or(AbiError::InvalidDecodeDataSize {
                needed: end,
                available: data.len(),
            })?;
        self.consumed = self.consumed.max(end);
        Ok(word)
    }

    /// Offset word at `pos`, resolved against the block starting at `base`
    fn read_offset(&mut self, pos: usize, base: usize) -> Result<usize, AbiError> {
        let raw = U256::from_big_endian(self.word(pos)?);
        let start = small(raw)
            .and_then(|offset| base.checked_add(offset))
            .filter(|start| *start < self.data.len())
            .ok_or_else(|| AbiError::InvalidOffset(format!("{raw:#x} at byte {pos}")))?;
        tracing::trace!("Offset at byte {} resolves to {}", pos, start);
        Ok(start)
    }

    /// Length word at `pos`, bounded by the configured limit and by how many
    /// `unit`-sized items the rest of the buffer could hold
    fn read_length(&mut self, pos: usize, unit: usize) -> Result<usize, AbiError> {
        let raw = U256::from_big_endian(self.word(pos)?);
        let remaining = self.data.len().saturating_sub(pos + 32);
        let limit = self.options.max_length.min(remaining / unit.max(1));
        match small(raw) {
            Some(len) if len <= limit => Ok(len),
            Some(len) => Err(AbiError::LengthMismatch { length: len, limit }),
            None => Err(AbiError::LengthMismatch {
                length: usize::MAX,
                limit,
            }),
        }
    }

    fn reserve_elements(&mut self, count: usize) -> Result<(), AbiError> {
        self.elements = self.elements.saturating_add(count);
        if self.elements > self.options.max_length {
            return Err(AbiError::LengthMismatch {
                length: self.elements,
                limit: self.options.max_length,
            });
        }
        Ok(())
    }

    /// Decode a head-tail block starting at `base`
    fn decode_sequence(&mut self, types: &[&ParamType], base: usize) -> Result<Vec<Token>, AbiError> {
        let mut tokens = Vec::with_capacity(types.len());
        let mut head = base;

        for ty in types {
            let token = if ty.is_dynamic() {
                let start = self.read_offset(head, base)?;
                self.decode_at(ty, start)?
            } else {
                self.decode_at(ty, head)?
            };
            tokens.push(token);
            head += ty.head_size();
        }

        Ok(tokens)
    }

    /// Decode `ty` laid out at `pos` (head position for static types, tail
    /// start for dynamic ones)
    fn decode_at(&mut self, ty: &ParamType, pos: usize) -> Result<Token, AbiError> {
        match ty {
            ParamType::Address => {
                let word = self.word(pos)?;
                if self.strict() && word[..12].iter().any(|b| *b != 0) {
                    return Err(non_canonical(ty, pos));
                }
                Ok(Token::Address(Address::from_word(word)))
            }
            ParamType::Uint(bits) => {
                let value = U256::from_big_endian(self.word(pos)?);
                if self.strict() && value.bits() > *bits {
                    return Err(non_canonical(ty, pos));
                }
                Ok(Token::Uint(value))
            }
            ParamType::Int(bits) => {
                let value = I256::from_word(self.word(pos)?);
                if self.strict() && !value.fits(*bits) {
                    return Err(non_canonical(ty, pos));
                }
                Ok(Token::Int(value))
            }
            ParamType::Bool => {
                let word = self.word(pos)?;
                let high_clear = word[..31].iter().all(|b| *b == 0);
                if self.strict() && !(high_clear && word[31] <= 1) {
                    return Err(non_canonical(ty, pos));
                }
                Ok(Token::Bool(word.iter().any(|b| *b != 0)))
            }
            ParamType::FixedBytes(size) => {
                let word = self.word(pos)?;
                if self.strict() && word[*size..].iter().any(|b| *b != 0) {
                    return Err(non_canonical(ty, pos));
                }
                Ok(Token::FixedBytes(word[..*size].to_vec()))
            }
            ParamType::Bytes => Ok(Token::Bytes(self.decode_bytes(ty, pos)?)),
            ParamType::String => {
                let bytes = self.decode_bytes(ty, pos)?;
                let s = String::from_utf8(bytes).map_err(|e| AbiError::InvalidUtf8(e.to_string()))?;
                Ok(Token::String(s))
            }
            ParamType::Array(inner) => {
                let len = self.read_length(pos, inner.head_size())?;
                self.reserve_elements(len)?;
                let types = vec![inner.as_ref(); len];
                Ok(Token::Array(self.decode_sequence(&types, pos + 32)?))
            }
            ParamType::FixedArray(inner, size) => {
                self.reserve_elements(*size)?;
                let types = vec![inner.as_ref(); *size];
                Ok(Token::FixedArray(self.decode_sequence(&types, pos)?))
            }
            ParamType::Tuple(params) => {
                let types: Vec<&ParamType> = params.iter().map(|p| &p.kind).collect();
                Ok(Token::Tuple(self.decode_sequence(&types, pos)?))
            }
        }
    }

    /// Length-prefixed payload of `bytes`/`string`
    fn decode_bytes(&mut self, ty: &ParamType, pos: usize) -> Result<Vec<u8>, AbiError> {
        let len = self.read_length(pos, 1)?;
        let start = pos + 32;
        let end = start + len;
        let padded_end = end + padding_for(len);

        let content = &self.data[start..end];
        if let Some(padding) = self.data.get(end..padded_end) {
            if self.strict() && padding.iter().any(|b| *b != 0) {
                return Err(non_canonical(ty, pos));
            }
        }
        self.consumed = self.consumed.max(padded_end);
        Ok(content.to_vec())
    }
}

/// `U256` narrowed to `usize` when it fits
fn small(value: U256) -> Option<usize> {
    if value.bits() > 64 {
        return None;
    }
    usize::try_from(value.low_u64()).ok()
}

fn non_canonical(ty: &ParamType, position: usize) -> AbiError {
    AbiError::InvalidPadding {
        ty: ty.to_string(),
        position,
    }
}
