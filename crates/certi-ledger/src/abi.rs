//! # Registry Contract ABI
//!
//! Calldata encoding and return-data decoding for the deployed registry
//! contract. Only the shapes the contract uses are supported: `address`,
//! `uint256` (restricted to `u64` on decode), `bool`, and `string`.
//!
//! Layout follows the Solidity ABI head/tail scheme: static values occupy
//! one 32-byte head word each; a `string` head word holds the byte offset
//! of its tail, which is a length word followed by the UTF-8 bytes padded
//! to a word boundary.

use certi_core::Identity;

/// `owner()`
pub const OWNER_SELECTOR: &str = "8da5cb5b";
/// `isIssuer(address)`
pub const IS_ISSUER_SELECTOR: &str = "877b9a67";
/// `addIssuer(address)`
pub const ADD_ISSUER_SELECTOR: &str = "20694db0";
/// `addDocument(string,string)`
pub const ADD_DOCUMENT_SELECTOR: &str = "4d2b1978";
/// `verifyDocument(address,uint256)`
pub const VERIFY_DOCUMENT_SELECTOR: &str = "bab1104e";
/// `getDocumentCount(address)`
pub const GET_DOCUMENT_COUNT_SELECTOR: &str = "3b993fe0";
/// `getDocument(address,uint256)`
pub const GET_DOCUMENT_SELECTOR: &str = "cee4f70b";
/// `Error(string)`, the standard revert payload.
pub const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

const WORD: usize = 32;

/// ABI decoding failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AbiError {
    /// Input was not valid hex.
    #[error("invalid hex: {0}")]
    InvalidHex(String),
    /// A read ran past the end of the data.
    #[error("read of {len} bytes at offset {offset} exceeds {available} available")]
    OutOfBounds {
        /// Requested start.
        offset: usize,
        /// Requested length.
        len: usize,
        /// Data length.
        available: usize,
    },
    /// An integer does not fit the target type.
    #[error("integer does not fit in 64 bits")]
    Overflow,
    /// An address word has non-zero high bytes.
    #[error("address word has non-zero padding")]
    InvalidAddress,
    /// A bool word is neither 0 nor 1.
    #[error("bool word is not 0 or 1")]
    InvalidBool,
    /// String bytes are not UTF-8.
    #[error("string is not valid UTF-8")]
    InvalidUtf8,
}

/// A value to encode.
#[derive(Debug, Clone, Copy)]
pub enum Token<'a> {
    /// `address`
    Address(&'a Identity),
    /// `uint256`
    Uint(u64),
    /// `string`
    Str(&'a str),
}

fn uint_word(value: u64) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&value.to_be_bytes());
    word
}

fn address_word(identity: &Identity) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 20..].copy_from_slice(&identity.to_bytes());
    word
}

/// Encode a parameter list (no selector).
pub fn encode_params(tokens: &[Token<'_>]) -> Vec<u8> {
    let head_len = tokens.len() * WORD;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for token in tokens {
        match token {
            Token::Address(identity) => head.extend_from_slice(&address_word(identity)),
            Token::Uint(value) => head.extend_from_slice(&uint_word(*value)),
            Token::Str(s) => {
                head.extend_from_slice(&uint_word((head_len + tail.len()) as u64));
                let bytes = s.as_bytes();
                tail.extend_from_slice(&uint_word(bytes.len() as u64));
                tail.extend_from_slice(bytes);
                let padding = (WORD - bytes.len() % WORD) % WORD;
                tail.resize(tail.len() + padding, 0);
            }
        }
    }

    head.extend_from_slice(&tail);
    head
}

/// Encode `selector ++ params` as `0x`-prefixed hex calldata.
pub fn encode_call(selector: &str, tokens: &[Token<'_>]) -> String {
    format!("0x{selector}{}", hex::encode(encode_params(tokens)))
}

/// Decode `0x`-prefixed (or bare) hex into bytes.
pub fn decode_hex(input: &str) -> Result<Vec<u8>, AbiError> {
    let trimmed = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);
    hex::decode(trimmed).map_err(|e| AbiError::InvalidHex(e.to_string()))
}

fn slice(data: &[u8], offset: usize, len: usize) -> Result<&[u8], AbiError> {
    offset
        .checked_add(len)
        .and_then(|end| data.get(offset..end))
        .ok_or(AbiError::OutOfBounds {
            offset,
            len,
            available: data.len(),
        })
}

fn word_at(data: &[u8], slot: usize) -> Result<&[u8], AbiError> {
    slice(data, slot * WORD, WORD)
}

fn word_to_u64(word: &[u8]) -> Result<u64, AbiError> {
    if word[..WORD - 8].iter().any(|b| *b != 0) {
        return Err(AbiError::Overflow);
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&word[WORD - 8..]);
    Ok(u64::from_be_bytes(buf))
}

/// Decode the `uint256` in head slot `slot`.
pub fn decode_uint(data: &[u8], slot: usize) -> Result<u64, AbiError> {
    word_to_u64(word_at(data, slot)?)
}

/// Decode the `bool` in head slot `slot`.
pub fn decode_bool(data: &[u8], slot: usize) -> Result<bool, AbiError> {
    match decode_uint(data, slot) {
        Ok(0) => Ok(false),
        Ok(1) => Ok(true),
        Ok(_) | Err(AbiError::Overflow) => Err(AbiError::InvalidBool),
        Err(e) => Err(e),
    }
}

/// Decode the `address` in head slot `slot`.
pub fn decode_address(data: &[u8], slot: usize) -> Result<Identity, AbiError> {
    let word = word_at(data, slot)?;
    if word[..WORD - 20].iter().any(|b| *b != 0) {
        return Err(AbiError::InvalidAddress);
    }
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&word[WORD - 20..]);
    Ok(Identity::from_bytes(bytes))
}

/// Decode the `string` whose offset sits in head slot `slot`.
pub fn decode_string(data: &[u8], slot: usize) -> Result<String, AbiError> {
    let offset = usize::try_from(decode_uint(data, slot)?).map_err(|_| AbiError::Overflow)?;
    let len = usize::try_from(word_to_u64(slice(data, offset, WORD)?)?)
        .map_err(|_| AbiError::Overflow)?;
    let start = offset.checked_add(WORD).ok_or(AbiError::Overflow)?;
    let bytes = slice(data, start, len)?;
    String::from_utf8(bytes.to_vec()).map_err(|_| AbiError::InvalidUtf8)
}

/// Return data of `getDocument(address,uint256)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentTuple {
    /// Blob store reference.
    pub ipfs_hash: String,
    /// Document name.
    pub name: String,
    /// Attester, or the zero address.
    pub verified_by: Identity,
    /// Verification flag.
    pub is_verified: bool,
}

/// Decode `(string,string,address,bool)`.
pub fn decode_document_tuple(data: &[u8]) -> Result<DocumentTuple, AbiError> {
    Ok(DocumentTuple {
        ipfs_hash: decode_string(data, 0)?,
        name: decode_string(data, 1)?,
        verified_by: decode_address(data, 2)?,
        is_verified: decode_bool(data, 3)?,
    })
}

/// Extract the message from `Error(string)` revert data, if that is what it is.
pub fn decode_revert_reason(data: &[u8]) -> Option<String> {
    let payload = data.strip_prefix(&ERROR_STRING_SELECTOR[..])?;
    decode_string(payload, 0).ok()
}
