//! Device public keys and the owner addresses they control

use k256::ecdsa::{signature::hazmat::PrehashVerifier, Signature as K256Signature, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};
use crate::hash::keccak256;
use crate::types::{parse_hex, to_prefixed_hex, Address, SignableHash};

/// Compressed secp256k1 public key (33 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey(pub [u8; 33]);

impl PublicKey {
    /// Create a new PublicKey from compressed bytes
    pub fn new(bytes: [u8; 33]) -> Self {
        Self(bytes)
    }

    /// Get the compressed bytes
    pub fn as_bytes(&self) -> &[u8; 33] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        to_prefixed_hex(&self.0)
    }

    /// Parse a compressed (33-byte) or uncompressed (65-byte) SEC1 key
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = parse_hex(s)?;
        let key = k256::PublicKey::from_sec1_bytes(&bytes)
            .map_err(|e| Error::Crypto(format!("Invalid public key: {}", e)))?;
        let encoded = key.to_encoded_point(true);
        let compressed: [u8; 33] = encoded
            .as_bytes()
            .try_into()
            .map_err(|_| Error::Crypto("Failed to compress public key".to_string()))?;
        Ok(Self(compressed))
    }

    /// Ethereum address: last 20 bytes of keccak256 of the uncompressed point
    pub fn to_address(&self) -> Result<Address> {
        let key = k256::PublicKey::from_sec1_bytes(&self.0)
            .map_err(|e| Error::Crypto(format!("Invalid public key: {}", e)))?;
        let uncompressed = key.to_encoded_point(false);
        // Skip the 0x04 prefix
        let hash = keccak256(&uncompressed.as_bytes()[1..]);
        Ok(Address::from_word(&hash))
    }

    /// Verify a 64-byte `r || s` signature over a signable hash
    pub fn verify_signable_hash(&self, hash: &SignableHash, signature: &[u8; 64]) -> Result<()> {
        let verifying_key = VerifyingKey::from_sec1_bytes(&self.0)
            .map_err(|e| Error::Crypto(format!("Invalid public key: {}", e)))?;
        let sig = K256Signature::from_slice(signature)
            .map_err(|e| Error::Crypto(format!("Invalid signature format: {}", e)))?;
        verifying_key
            .verify_prehash(hash.as_bytes(), &sig)
            .map_err(|_| Error::Crypto("Signature verification failed".to_string()))
    }
}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PublicKey::from_hex(&s).map_err(de::Error::custom)
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::{signature::hazmat::PrehashSigner, SigningKey};

    // secp256k1 generator, i.e. the public key of private key 1
    const GENERATOR: &str = "0x0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

    #[test]
    fn test_address_of_private_key_one() {
        let key = PublicKey::from_hex(GENERATOR).unwrap();
        assert_eq!(
            key.to_address().unwrap().to_hex(),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn test_uncompressed_input_is_compressed() {
        let uncompressed = "0x0479be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8";
        let key = PublicKey::from_hex(uncompressed).unwrap();
        assert_eq!(key.to_hex(), GENERATOR);
    }

    #[test]
    fn test_invalid_key_rejected() {
        assert!(matches!(
            PublicKey::from_hex(&format!("0x05{}", "11".repeat(32))),
            Err(Error::Crypto(_))
        ));
    }

    #[test]
    fn test_verify_signable_hash() {
        let signing_key = SigningKey::from_slice(&[0x42; 32]).unwrap();
        let point = signing_key.verifying_key().to_encoded_point(true);
        let key = PublicKey::new(point.as_bytes().try_into().unwrap());

        let hash = SignableHash::new(keccak256(b"strongroom"));
        let signature: K256Signature = signing_key.sign_prehash(hash.as_bytes()).unwrap();
        let bytes: [u8; 64] = signature.to_bytes().as_slice().try_into().unwrap();

        assert!(key.verify_signable_hash(&hash, &bytes).is_ok());

        let other = SignableHash::new(keccak256(b"other"));
        assert!(key.verify_signable_hash(&other, &bytes).is_err());
    }
}
