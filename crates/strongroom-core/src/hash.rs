//! Keccak-256, SHA-256 and EIP-712 hashing for Safe transactions
//!
//! The signable hash is `keccak256(0x19 0x01 domainHash structHash)` with the
//! domain reduced to `(chainId, verifyingContract)`. `chainId` and `nonce`
//! are written as 8-byte big-endian values zero-padded to a word, which is
//! what the deployed verifier accepts.

use sha2::Sha256;
use sha3::{Digest, Keccak256};

use crate::abi::{address_word, u64_word, Operation};
use crate::types::{Address, SignableHash, Uint256};

/// EIP-712 domain type string
pub const DOMAIN_TYPE: &str = "EIP712Domain(uint256 chainId,address verifyingContract)";

/// Safe transaction type string
pub const SAFE_TX_TYPE: &str = "SafeTx(address to,uint256 value,bytes data,uint8 operation,uint256 safeTxGas,uint256 baseGas,uint256 gasPrice,address gasToken,address refundReceiver,uint256 nonce)";

/// Keccak-256 with pre-standard Keccak padding, not NIST SHA3-256
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// Keccak-256 over the concatenation of several slices
pub fn keccak256_multi(data: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    for d in data {
        hasher.update(d);
    }
    hasher.finalize().into()
}

/// Hash data using SHA256
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// `keccak256(typeHash(domain) ++ chainId ++ verifyingContract)`
pub fn domain_hash(chain_id: u64, verifying_contract: &Address) -> [u8; 32] {
    keccak256_multi(&[
        &keccak256(DOMAIN_TYPE.as_bytes()),
        &u64_word(chain_id),
        &address_word(verifying_contract),
    ])
}

/// The fields of a Safe transaction that owners sign over.
///
/// Gas and refund fields are always zero for transactions built here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeTxPayload {
    pub to: Address,
    pub value: Uint256,
    pub data: Vec<u8>,
    pub operation: Operation,
    pub nonce: u64,
}

impl SafeTxPayload {
    pub fn struct_hash(&self) -> [u8; 32] {
        let zero_word = [0u8; 32];
        keccak256_multi(&[
            &keccak256(SAFE_TX_TYPE.as_bytes()),
            &address_word(&self.to),
            &self.value.to_be_bytes(),
            &keccak256(&self.data),
            &u64_word(u64::from(self.operation.as_u8())),
            // safeTxGas, baseGas, gasPrice
            &zero_word,
            &zero_word,
            &zero_word,
            // gasToken, refundReceiver
            &address_word(&Address::ZERO),
            &address_word(&Address::ZERO),
            &u64_word(self.nonce),
        ])
    }

    /// The hash a device key signs for this transaction on `safe`
    pub fn signable_hash(&self, chain_id: u64, safe: &Address) -> SignableHash {
        let domain = domain_hash(chain_id, safe);
        let message = self.struct_hash();
        SignableHash::new(keccak256_multi(&[&[0x19, 0x01], &domain, &message]))
    }
}

/// Signable hash of a Safe transaction
pub fn compute_safe_transaction_hash(
    chain_id: u64,
    safe_address: &Address,
    to: &Address,
    value: Uint256,
    data: &[u8],
    operation: Operation,
    nonce: u64,
) -> SignableHash {
    SafeTxPayload {
        to: *to,
        value,
        data: data.to_vec(),
        operation,
        nonce,
    }
    .signable_hash(chain_id, safe_address)
}
