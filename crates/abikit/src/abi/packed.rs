//! Non-standard packed encoding (`abi.encodePacked`)
//!
//! Elementary values use their minimal width, dynamic values are written
//! without a length, and array elements are padded to a full word. Packed
//! output is ambiguous and cannot be decoded.

use super::encode::{int_word, mismatch, padding_for, uint_word};
use super::token::Token;
use super::types::ParamType;
use crate::AbiError;

/// Packed-encode tokens against their declared types
pub fn encode_packed(types: &[ParamType], tokens: &[Token]) -> Result<Vec<u8>, AbiError> {
    if types.len() != tokens.len() {
        return Err(AbiError::ArityMismatch {
            expected: types.len(),
            got: tokens.len(),
        });
    }

    let mut out = Vec::new();
    for (ty, token) in types.iter().zip(tokens) {
        ty.validate()?;
        pack(&mut out, ty, token, false)?;
    }
    Ok(out)
}

fn pack(out: &mut Vec<u8>, ty: &ParamType, token: &Token, in_array: bool) -> Result<(), AbiError> {
    match (ty, token) {
        (ParamType::Address, Token::Address(addr)) => {
            if in_array {
                out.extend_from_slice(&addr.to_word());
            } else {
                out.extend_from_slice(addr.as_bytes());
            }
        }
        (ParamType::Uint(bits), _) => {
            let word = uint_word(*bits, ty, token)?;
            out.extend_from_slice(trim(&word, *bits, in_array));
        }
        (ParamType::Int(bits), _) => {
            let word = int_word(*bits, ty, token)?;
            out.extend_from_slice(trim(&word, *bits, in_array));
        }
        (ParamType::Bool, Token::Bool(b)) => {
            if in_array {
                out.extend_from_slice(&[0u8; 31]);
            }
            out.push(u8::from(*b));
        }
        (ParamType::FixedBytes(size), Token::FixedBytes(data) | Token::Bytes(data)) => {
            if data.len() != *size {
                return Err(AbiError::InvalidEncodingType {
                    expected: ty.to_string(),
                    found: format!("{} bytes", data.len()),
                });
            }
            out.extend_from_slice(data);
            if in_array {
                out.resize(out.len() + padding_for(data.len()), 0);
            }
        }
        (ParamType::Bytes | ParamType::String, _) if in_array => {
            return Err(AbiError::NotSupported(format!(
                "packed encoding of {ty} inside an array"
            )));
        }
        (ParamType::Bytes, Token::Bytes(data) | Token::FixedBytes(data)) => {
            out.extend_from_slice(data)
        }
        (ParamType::String, Token::String(s)) => out.extend_from_slice(s.as_bytes()),
        (ParamType::Array(inner), Token::Array(items) | Token::FixedArray(items))
        | (ParamType::FixedArray(inner, _), Token::FixedArray(items) | Token::Array(items)) => {
            if let ParamType::FixedArray(_, size) = ty {
                if items.len() != *size {
                    return Err(AbiError::ArityMismatch {
                        expected: *size,
                        got: items.len(),
                    });
                }
            }
            if matches!(
                inner.as_ref(),
                ParamType::Array(_) | ParamType::FixedArray(..) | ParamType::Tuple(_)
            ) {
                return Err(AbiError::NotSupported(format!("packed encoding of {ty}")));
            }
            for item in items {
                pack(out, inner, item, true)?;
            }
        }
        (ParamType::Tuple(_), _) => {
            return Err(AbiError::NotSupported(format!("packed encoding of {ty}")));
        }
        _ => return Err(mismatch(ty, token)),
    }
    Ok(())
}

/// Low-order `bits / 8` bytes of a word, or the whole word inside arrays
fn trim(word: &[u8; 32], bits: usize, in_array: bool) -> &[u8] {
    if in_array {
        word
    } else {
        &word[32 - bits / 8..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abikit_primitives::Address;

    #[test]
    fn test_packed_elementary() {
        let addr = Address::from_bytes([0x11; 20]);
        let packed = encode_packed(
            &[
                ParamType::Int(16),
                ParamType::FixedBytes(1),
                ParamType::Uint(16),
                ParamType::String,
                ParamType::Address,
                ParamType::Bool,
            ],
            &[
                Token::int(-1),
                Token::FixedBytes(vec![0x42]),
                Token::uint(3u64),
                Token::string("Hello, world!"),
                Token::Address(addr),
                Token::bool(true),
            ],
        )
        .unwrap();

        let mut expected = hex::decode("ffff42000348656c6c6f2c20776f726c6421").unwrap();
        expected.extend_from_slice(&[0x11; 20]);
        expected.push(0x01);
        assert_eq!(packed, expected);
    }

    #[test]
    fn test_packed_array_elements_are_padded() {
        let packed = encode_packed(
            &[ParamType::array(ParamType::Uint(8))],
            &[Token::Array(vec![Token::uint(1u64), Token::uint(2u64)])],
        )
        .unwrap();
        assert_eq!(packed.len(), 64);
        assert_eq!(packed[31], 1);
        assert_eq!(packed[63], 2);
    }

    #[test]
    fn test_packed_checks_overflow() {
        let err = encode_packed(&[ParamType::Uint(8)], &[Token::uint(256u64)]).unwrap_err();
        assert_eq!(err, AbiError::Overflow("uint8".into()));
    }

    #[test]
    fn test_packed_rejects_tuples_and_nested_dynamic() {
        let tuple = ParamType::tuple([ParamType::Bool]);
        assert!(matches!(
            encode_packed(&[tuple], &[Token::Tuple(vec![Token::bool(true)])]),
            Err(AbiError::NotSupported(_))
        ));

        let strings = ParamType::array(ParamType::String);
        assert!(matches!(
            encode_packed(&[strings], &[Token::Array(vec![Token::string("a")])]),
            Err(AbiError::NotSupported(_))
        ));
    }
}
