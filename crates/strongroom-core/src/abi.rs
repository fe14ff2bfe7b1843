//! Contract ABI encoding
//!
//! Call data is a 4-byte selector followed by 32-byte words. Static values
//! are left-padded into a single word; dynamic values (`bytes`, arrays) put
//! an offset word in the head and their length-prefixed contents in the tail.

use serde::{Deserialize, Serialize};

use crate::hash::keccak256;
use crate::types::{Address, Uint256};

/// Fixed selectors of the deployed contract family
pub mod selectors {
    /// `execTransactionFromModule(address,uint256,bytes,uint8)`
    pub const EXEC_TRANSACTION_FROM_MODULE: [u8; 4] = [0x46, 0x87, 0x21, 0xa7];
    /// `multiSend(bytes)`
    pub const MULTI_SEND: [u8; 4] = [0x8d, 0x80, 0xff, 0x0a];
    /// `swapOwner(address,address,address)`
    pub const SWAP_OWNER: [u8; 4] = [0xe3, 0x18, 0xb5, 0x2b];
    /// `addOwnerWithThreshold(address,uint256)`
    pub const ADD_OWNER_WITH_THRESHOLD: [u8; 4] = [0x0d, 0x58, 0x2f, 0x13];
    /// `removeOwner(address,address,uint256)`
    pub const REMOVE_OWNER: [u8; 4] = [0xf8, 0xdc, 0x5d, 0xd9];
    /// `changeThreshold(uint256)`
    pub const CHANGE_THRESHOLD: [u8; 4] = [0x69, 0x4e, 0x80, 0xc3];
    /// `setGuard(address)`
    pub const SET_GUARD: [u8; 4] = [0xe1, 0x9a, 0x9d, 0xd9];
    /// `setNameHash(bytes32)`
    pub const SET_NAME_HASH: [u8; 4] = [0x3a, 0xfb, 0xdc, 0xf4];
    /// `updateWhitelist(bytes32[])`
    pub const UPDATE_WHITELIST: [u8; 4] = [0x7a, 0xae, 0xa4, 0xf6];
    /// `enableModule(address)`
    pub const ENABLE_MODULE: [u8; 4] = [0x61, 0x0b, 0x59, 0x25];
    /// `disableModule(address,address)`
    pub const DISABLE_MODULE: [u8; 4] = [0xe0, 0x09, 0xcf, 0xde];
    /// `setup(address[],uint256,address,bytes,address,address,uint256,address)`
    pub const SAFE_SETUP: [u8; 4] = [0xb6, 0x3e, 0x80, 0x0d];
    /// `censoSetup(address,address,address,bytes32)`
    pub const CENSO_SETUP: [u8; 4] = [0xed, 0x6a, 0x2e, 0xd6];
    /// ERC-20 `transfer(address,uint256)`
    pub const ERC20_TRANSFER: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];
    /// ERC-721 `safeTransferFrom(address,address,uint256)`
    pub const ERC721_SAFE_TRANSFER_FROM: [u8; 4] = [0x42, 0x84, 0x2e, 0x0e];
    /// ERC-1155 `safeTransferFrom(address,address,uint256,uint256,bytes)`
    pub const ERC1155_SAFE_TRANSFER_FROM: [u8; 4] = [0xf2, 0x42, 0x43, 0x2a];
}

/// Safe transaction operation type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    #[default]
    Call,
    DelegateCall,
}

impl Operation {
    pub fn as_u8(self) -> u8 {
        match self {
            Operation::Call => 0,
            Operation::DelegateCall => 1,
        }
    }
}

/// A single ABI argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Address(Address),
    Uint(Uint256),
    FixedBytes32([u8; 32]),
    Bytes(Vec<u8>),
    Array(Vec<Token>),
}

impl Token {
    pub fn uint(value: u64) -> Self {
        Token::Uint(Uint256::from_u64(value))
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, Token::Bytes(_) | Token::Array(_))
    }
}

/// Compute a selector from a canonical function signature
pub fn function_selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Append `bytes` left-padded with zeros to `pad_to` bytes.
///
/// Values already `pad_to` bytes or longer are appended unchanged.
pub fn append_padded(buf: &mut Vec<u8>, bytes: &[u8], pad_to: usize) {
    if bytes.len() < pad_to {
        buf.resize(buf.len() + pad_to - bytes.len(), 0);
    }
    buf.extend_from_slice(bytes);
}

/// An address as a left-padded word
pub fn address_word(address: &Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

/// A `u64` as a left-padded big-endian word
pub fn u64_word(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

fn append_length(buf: &mut Vec<u8>, len: usize) {
    append_padded(buf, &(len as u64).to_be_bytes(), 32);
}

/// Append raw bytes followed by zero padding to the next word boundary
fn append_right_padded(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(bytes);
    let rem = bytes.len() % 32;
    if rem != 0 {
        buf.resize(buf.len() + 32 - rem, 0);
    }
}

/// Encode a sequence of arguments with head/tail layout
pub fn encode(tokens: &[Token]) -> Vec<u8> {
    let head_size = tokens.len() * 32;
    let mut head = Vec::with_capacity(head_size);
    let mut tail = Vec::new();

    for token in tokens {
        match token {
            Token::Address(address) => append_padded(&mut head, address.as_bytes(), 32),
            Token::Uint(value) => head.extend_from_slice(&value.to_be_bytes()),
            Token::FixedBytes32(bytes) => head.extend_from_slice(bytes),
            Token::Bytes(data) => {
                append_length(&mut head, head_size + tail.len());
                append_length(&mut tail, data.len());
                append_right_padded(&mut tail, data);
            }
            Token::Array(items) => {
                append_length(&mut head, head_size + tail.len());
                append_length(&mut tail, items.len());
                tail.extend_from_slice(&encode(items));
            }
        }
    }

    head.extend_from_slice(&tail);
    head
}

/// Selector followed by encoded arguments
pub fn encode_call(selector: [u8; 4], tokens: &[Token]) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + tokens.len() * 32);
    data.extend_from_slice(&selector);
    data.extend_from_slice(&encode(tokens));
    data
}

/// One sub-call inside a `multiSend` batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiSendTx {
    pub operation: Operation,
    pub to: Address,
    pub value: Uint256,
    pub data: Vec<u8>,
}

impl MultiSendTx {
    /// Plain call with zero value
    pub fn call(to: Address, data: Vec<u8>) -> Self {
        Self {
            operation: Operation::Call,
            to,
            value: Uint256::ZERO,
            data,
        }
    }

    /// Packed form: operation(1) to(20) value(32) dataLength(32) data
    pub fn append_packed(&self, buf: &mut Vec<u8>) {
        buf.push(self.operation.as_u8());
        buf.extend_from_slice(self.to.as_bytes());
        buf.extend_from_slice(&self.value.to_be_bytes());
        append_length(buf, self.data.len());
        buf.extend_from_slice(&self.data);
    }
}

/// `multiSend(bytes)` call data over the packed sub-calls
pub fn multisend(transactions: &[MultiSendTx]) -> Vec<u8> {
    let mut packed = Vec::new();
    for tx in transactions {
        tx.append_packed(&mut packed);
    }
    encode_call(selectors::MULTI_SEND, &[Token::Bytes(packed)])
}

/// `execTransactionFromModule(to, value, data, operation)` call data
pub fn exec_transaction_from_module(
    to: Address,
    value: Uint256,
    data: &[u8],
    operation: Operation,
) -> Vec<u8> {
    encode_call(
        selectors::EXEC_TRANSACTION_FROM_MODULE,
        &[
            Token::Address(to),
            Token::Uint(value),
            Token::Bytes(data.to_vec()),
            Token::uint(u64::from(operation.as_u8())),
        ],
    )
}
