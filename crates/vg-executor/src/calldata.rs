// calldata.rs — Recognizing and decoding token payloads.
//
// A payload is a 4-byte function selector followed by 32-byte argument
// words. The executor only needs to look inside four ERC-20 functions:
//
//   transfer(address,uint256)                 recipient in word 0
//   transferFrom(address,address,uint256)     recipient in word 1
//   approve(address,uint256)                  spender in word 0
//   increaseAllowance(address,uint256)        spender in word 0
//
// For these the payload length is fixed and checked before any word is
// read. Every other selector is opaque.

use alloy_primitives::{keccak256, Address, Bytes, Selector, U256};

use crate::error::CalldataError;

pub const TRANSFER: Selector = Selector::new([0xa9, 0x05, 0x9c, 0xbb]);
pub const TRANSFER_FROM: Selector = Selector::new([0x23, 0xb8, 0x72, 0xdd]);
pub const APPROVE: Selector = Selector::new([0x09, 0x5e, 0xa7, 0xb3]);
pub const INCREASE_ALLOWANCE: Selector = Selector::new([0x39, 0x50, 0x93, 0x51]);

const SELECTOR_LEN: usize = 4;
const WORD_LEN: usize = 32;

/// Which authorization check a token function needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenFunctionKind {
    /// Moves tokens: the recipient must be authorized.
    Transfer,
    /// Grants spending rights: the spender must be an active target.
    Approval,
}

/// Argument layout of a recognized token function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenFunction {
    pub selector: Selector,
    pub signature: &'static str,
    pub kind: TokenFunctionKind,
    /// Number of 32-byte argument words.
    pub words: usize,
    /// Word holding the recipient or spender.
    pub address_word: usize,
}

impl TokenFunction {
    /// Exact payload length: selector plus argument words.
    pub fn payload_len(&self) -> usize {
        SELECTOR_LEN + self.words * WORD_LEN
    }
}

pub const TOKEN_FUNCTIONS: [TokenFunction; 4] = [
    TokenFunction {
        selector: TRANSFER,
        signature: "transfer(address,uint256)",
        kind: TokenFunctionKind::Transfer,
        words: 2,
        address_word: 0,
    },
    TokenFunction {
        selector: TRANSFER_FROM,
        signature: "transferFrom(address,address,uint256)",
        kind: TokenFunctionKind::Transfer,
        words: 3,
        address_word: 1,
    },
    TokenFunction {
        selector: APPROVE,
        signature: "approve(address,uint256)",
        kind: TokenFunctionKind::Approval,
        words: 2,
        address_word: 0,
    },
    TokenFunction {
        selector: INCREASE_ALLOWANCE,
        signature: "increaseAllowance(address,uint256)",
        kind: TokenFunctionKind::Approval,
        words: 2,
        address_word: 0,
    },
];

/// Look up a recognized token function by selector.
pub fn token_function(selector: Selector) -> Option<&'static TokenFunction> {
    TOKEN_FUNCTIONS.iter().find(|f| f.selector == selector)
}

/// First four bytes of `keccak256(signature)`.
pub fn function_selector(signature: &str) -> Selector {
    Selector::from_slice(&keccak256(signature.as_bytes())[..SELECTOR_LEN])
}

/// A decoded token payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenCall {
    /// `transfer` or `transferFrom`. `from` is set for `transferFrom`.
    Transfer {
        from: Option<Address>,
        recipient: Address,
        amount: U256,
    },
    /// `approve` or `increaseAllowance`.
    Approval { spender: Address, amount: U256 },
}

/// The function selector of a payload.
pub fn selector_of(payload: &[u8]) -> Result<Selector, CalldataError> {
    payload
        .get(..SELECTOR_LEN)
        .map(Selector::from_slice)
        .ok_or(CalldataError::TooShort { len: payload.len() })
}

/// Decode a payload if its selector is a recognized token function.
///
/// Returns `Ok(None)` for every other selector.
pub fn decode_token_call(payload: &[u8]) -> Result<Option<TokenCall>, CalldataError> {
    let selector = selector_of(payload)?;
    let Some(function) = token_function(selector) else {
        return Ok(None);
    };

    let expected = function.payload_len();
    if payload.len() != expected {
        return Err(CalldataError::LengthMismatch {
            signature: function.signature,
            expected,
            actual: payload.len(),
        });
    }

    let target = read_address(payload, function.address_word)?;
    let amount = U256::from_be_slice(word(payload, function.words - 1));

    let call = match function.kind {
        TokenFunctionKind::Transfer => TokenCall::Transfer {
            from: if function.address_word > 0 {
                Some(read_address(payload, 0)?)
            } else {
                None
            },
            recipient: target,
            amount,
        },
        TokenFunctionKind::Approval => TokenCall::Approval {
            spender: target,
            amount,
        },
    };
    Ok(Some(call))
}

// Callers check the payload length first.
fn word(payload: &[u8], index: usize) -> &[u8] {
    let start = SELECTOR_LEN + index * WORD_LEN;
    &payload[start..start + WORD_LEN]
}

fn read_address(payload: &[u8], index: usize) -> Result<Address, CalldataError> {
    let word = word(payload, index);
    if word[..12].iter().any(|&b| b != 0) {
        return Err(CalldataError::DirtyAddressPadding { word: index });
    }
    Ok(Address::from_slice(&word[12..]))
}

fn address_word(address: Address) -> [u8; WORD_LEN] {
    let mut word = [0u8; WORD_LEN];
    word[12..].copy_from_slice(address.as_slice());
    word
}

fn encode(selector: Selector, words: &[[u8; WORD_LEN]]) -> Bytes {
    let mut payload = Vec::with_capacity(SELECTOR_LEN + words.len() * WORD_LEN);
    payload.extend_from_slice(selector.as_slice());
    for word in words {
        payload.extend_from_slice(word);
    }
    payload.into()
}

pub fn encode_transfer(recipient: Address, amount: U256) -> Bytes {
    encode(TRANSFER, &[address_word(recipient), amount.to_be_bytes::<32>()])
}

pub fn encode_transfer_from(from: Address, recipient: Address, amount: U256) -> Bytes {
    encode(
        TRANSFER_FROM,
        &[address_word(from), address_word(recipient), amount.to_be_bytes::<32>()],
    )
}

pub fn encode_approve(spender: Address, amount: U256) -> Bytes {
    encode(APPROVE, &[address_word(spender), amount.to_be_bytes::<32>()])
}

pub fn encode_increase_allowance(spender: Address, amount: U256) -> Bytes {
    encode(
        INCREASE_ALLOWANCE,
        &[address_word(spender), amount.to_be_bytes::<32>()],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::with_last_byte(byte)
    }

    #[test]
    fn selectors_match_signatures() {
        for function in TOKEN_FUNCTIONS {
            assert_eq!(
                function_selector(function.signature),
                function.selector,
                "{}",
                function.signature
            );
        }
    }

    #[test]
    fn decodes_transfer() {
        let payload = encode_transfer(addr(7), U256::from(100));
        assert_eq!(payload.len(), 68);
        assert_eq!(
            decode_token_call(&payload).unwrap(),
            Some(TokenCall::Transfer {
                from: None,
                recipient: addr(7),
                amount: U256::from(100),
            })
        );
    }

    #[test]
    fn transfer_from_recipient_is_second_word() {
        let payload = encode_transfer_from(addr(1), addr(2), U256::from(5));
        assert_eq!(payload.len(), 100);
        match decode_token_call(&payload).unwrap() {
            Some(TokenCall::Transfer { from, recipient, .. }) => {
                assert_eq!(from, Some(addr(1)));
                assert_eq!(recipient, addr(2));
            }
            other => panic!("expected transfer, got {:?}", other),
        }
    }

    #[test]
    fn decodes_approvals() {
        for payload in [
            encode_approve(addr(3), U256::MAX),
            encode_increase_allowance(addr(3), U256::MAX),
        ] {
            assert_eq!(
                decode_token_call(&payload).unwrap(),
                Some(TokenCall::Approval {
                    spender: addr(3),
                    amount: U256::MAX,
                })
            );
        }
    }

    #[test]
    fn short_payload_has_no_selector() {
        assert_eq!(
            selector_of(&[0xa9, 0x05, 0x9c]),
            Err(CalldataError::TooShort { len: 3 })
        );
        assert_eq!(selector_of(&[]), Err(CalldataError::TooShort { len: 0 }));
    }

    #[test]
    fn wrong_length_is_rejected_before_decoding() {
        let mut payload = encode_transfer(addr(7), U256::from(1)).to_vec();
        payload.push(0);
        assert_eq!(
            decode_token_call(&payload),
            Err(CalldataError::LengthMismatch {
                signature: "transfer(address,uint256)",
                expected: 68,
                actual: 69,
            })
        );

        // Selector alone.
        assert!(matches!(
            decode_token_call(TRANSFER.as_slice()),
            Err(CalldataError::LengthMismatch { actual: 4, .. })
        ));
    }

    #[test]
    fn dirty_padding_is_rejected() {
        let mut payload = encode_transfer(addr(7), U256::from(1)).to_vec();
        payload[4] = 0xff;
        assert_eq!(
            decode_token_call(&payload),
            Err(CalldataError::DirtyAddressPadding { word: 0 })
        );
    }

    #[test]
    fn unknown_selector_is_opaque() {
        let payload = [0x61, 0x7b, 0xa0, 0x37, 1, 2, 3];
        assert_eq!(decode_token_call(&payload).unwrap(), None);
        assert_eq!(
            selector_of(&payload).unwrap(),
            Selector::new([0x61, 0x7b, 0xa0, 0x37])
        );
    }
}
