//! Core value types: addresses, 256-bit words and hashes

use std::fmt;
use std::str::FromStr;

use alloy_primitives::{B256, U256};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// Decode a hex string, with or without a `0x` prefix.
///
/// Odd-length input and non-hex characters are rejected, never truncated.
pub fn parse_hex(s: &str) -> Result<Vec<u8>> {
    let stripped = strip_hex_prefix(s);
    if stripped.len() % 2 != 0 {
        return Err(Error::InvalidHex(format!("odd length hex string: {}", s)));
    }
    Ok(hex::decode(stripped)?)
}

/// Encode bytes as a `0x`-prefixed lowercase hex string.
pub fn to_prefixed_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// EVM account or contract address (20 bytes)
///
/// Ordering is byte order, which matches the lexicographic order of the
/// lowercase hex form.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(alloy_primitives::Address);

impl Address {
    /// The zero address
    pub const ZERO: Address = Address(alloy_primitives::Address::ZERO);

    /// Create a new Address from bytes
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(alloy_primitives::Address::new(bytes))
    }

    /// Get the bytes of the address
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0 .0 .0
    }

    /// Parse from hex, case-insensitive, `0x` optional
    ///
    /// Mixed-case input is not checked against its EIP-55 checksum.
    pub fn from_hex(s: &str) -> Result<Self> {
        alloy_primitives::Address::from_str(strip_hex_prefix(s))
            .map(Self)
            .map_err(|e| Error::InvalidHex(format!("invalid address {}: {}", s, e)))
    }

    /// Lowercase `0x`-prefixed hex
    pub fn to_hex(&self) -> String {
        to_prefixed_hex(self.0.as_slice())
    }

    /// Take the low 20 bytes of a 32-byte word
    pub fn from_word(word: &[u8; 32]) -> Self {
        Self(alloy_primitives::Address::from_word(B256::new(*word)))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

/// Head-of-list marker used by the Safe owner list and the whitelist guard
pub const SENTINEL: Address = Address::new([
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1,
]);

impl From<alloy_primitives::Address> for Address {
    fn from(address: alloy_primitives::Address) -> Self {
        Self(address)
    }
}

impl From<Address> for alloy_primitives::Address {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Address::from_hex(&s).map_err(de::Error::custom)
    }
}

/// Unsigned 256-bit integer, serialized as a decimal string
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Uint256(U256);

impl Uint256 {
    pub const ZERO: Uint256 = Uint256(U256::ZERO);

    pub fn from_be_bytes(bytes: [u8; 32]) -> Self {
        Self(U256::from_be_bytes(bytes))
    }

    pub fn from_u64(value: u64) -> Self {
        Self(U256::from(value))
    }

    pub fn from_u128(value: u128) -> Self {
        Self(U256::from(value))
    }

    /// Big-endian 32-byte ABI word
    pub fn to_be_bytes(&self) -> [u8; 32] {
        self.0.to_be_bytes::<32>()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Parse a base-10 string
    pub fn from_dec_str(s: &str) -> Result<Self> {
        if s.is_empty() || !s.bytes().all(|c| c.is_ascii_digit()) {
            return Err(Error::InvalidAmount(format!("not a decimal integer: {:?}", s)));
        }
        U256::from_str_radix(s, 10)
            .map(Self)
            .map_err(|e| Error::InvalidAmount(format!("{}: {}", e, s)))
    }

    /// Parse a hex string; odd digit counts are accepted here since amounts
    /// are numbers, not byte strings
    pub fn from_hex(s: &str) -> Result<Self> {
        let digits = strip_hex_prefix(s);
        if digits.is_empty() {
            return Err(Error::InvalidAmount(format!("empty hex amount: {:?}", s)));
        }
        if !digits.bytes().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidHex(format!("not a hex integer: {:?}", s)));
        }
        U256::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|e| Error::InvalidAmount(format!("{}: {}", e, s)))
    }

    /// Render as a base-10 string
    pub fn to_dec_string(&self) -> String {
        self.0.to_string()
    }
}

impl From<u64> for Uint256 {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl From<u128> for Uint256 {
    fn from(value: u128) -> Self {
        Self::from_u128(value)
    }
}

impl From<U256> for Uint256 {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl From<Uint256> for U256 {
    fn from(value: Uint256) -> Self {
        value.0
    }
}

impl FromStr for Uint256 {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.starts_with("0x") || s.starts_with("0X") {
            Self::from_hex(s)
        } else {
            Self::from_dec_str(s)
        }
    }
}

impl fmt::Display for Uint256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for Uint256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uint256({})", self.0)
    }
}

impl Serialize for Uint256 {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_dec_string())
    }
}

impl<'de> Deserialize<'de> for Uint256 {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct Uint256Visitor;

        impl<'de> de::Visitor<'de> for Uint256Visitor {
            type Value = Uint256;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a decimal string, a 0x hex string or an unsigned integer")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<Uint256, E> {
                Ok(Uint256::from_u64(value))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<Uint256, E> {
                value.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(Uint256Visitor)
    }
}

/// The 32-byte EIP-712 digest a device key signs
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignableHash(#[serde(with = "hex_bytes_32")] pub [u8; 32]);

impl SignableHash {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        to_prefixed_hex(&self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = parse_hex(s)?;
        let bytes: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| Error::InvalidHex(format!("expected 32-byte hash: {}", s)))?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for SignableHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignableHash({})", self.to_hex())
    }
}

impl AsRef<[u8]> for SignableHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Serde helper for 32-byte arrays as `0x` hex strings
pub mod hex_bytes_32 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::to_prefixed_hex(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 32], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = super::parse_hex(&s).map_err(serde::de::Error::custom)?;
        bytes
            .as_slice()
            .try_into()
            .map_err(|_| serde::de::Error::custom("expected 32 bytes"))
    }
}

/// Serde helper for variable-length byte strings as `0x` hex strings
pub mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::to_prefixed_hex(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_hex(&s).map_err(serde::de::Error::custom)
    }
}
