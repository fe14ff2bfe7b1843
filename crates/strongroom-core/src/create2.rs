//! CREATE2 address prediction for the recovery contract
//!
//! The recovery contract is a Safe proxy deployed by the proxy factory's
//! `createProxyWithNonce`, so its address follows from the factory, the
//! setup call it is initialised with, a salt nonce and the proxy init code.

use serde::{Deserialize, Serialize};

use crate::abi::address_word;
use crate::calls::{censo_setup, safe_setup};
use crate::error::Result;
use crate::hash::{keccak256, keccak256_multi};
use crate::policy::Policy;
use crate::types::{hex_bytes, Address};

/// `keccak256(0xff ++ deployer ++ salt ++ initCodeHash)[12..]`
pub fn create2_address(deployer: &Address, salt: &[u8; 32], init_code_hash: &[u8; 32]) -> Address {
    let hash = keccak256_multi(&[&[0xff], deployer.as_bytes(), salt, init_code_hash]);
    Address::from_word(&hash)
}

/// Address of a Safe proxy created with `createProxyWithNonce(singleton, initializer, saltNonce)`
pub fn safe_proxy_address(
    factory: &Address,
    singleton: &Address,
    proxy_creation_code: &[u8],
    initializer: &[u8],
    salt_nonce: &[u8; 32],
) -> Address {
    let salt = keccak256_multi(&[&keccak256(initializer), salt_nonce]);
    let init_code_hash = keccak256_multi(&[proxy_creation_code, &address_word(singleton)]);
    create2_address(factory, &salt, &init_code_hash)
}

/// Everything that determines where an organisation's recovery contract lands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryDeployment {
    pub factory: Address,
    pub singleton: Address,
    #[serde(with = "hex_bytes")]
    pub proxy_creation_code: Vec<u8>,
    /// Contract delegate-called with `censoSetup` during Safe setup
    pub setup_contract: Address,
    pub guard: Address,
    pub vault: Address,
    pub fallback_handler: Address,
    pub owners: Vec<Address>,
    pub threshold: u64,
    pub org_name: String,
}

impl RecoveryDeployment {
    /// `keccak256("Recovery-" ++ orgName)`
    pub fn salt_nonce(&self) -> [u8; 32] {
        keccak256(format!("Recovery-{}", self.org_name).as_bytes())
    }

    /// Safe `setup` call embedding `censoSetup(guard, vault, fallbackHandler, nameHash)`
    pub fn initializer(&self) -> Vec<u8> {
        let setup_data = censo_setup(
            &self.guard,
            &self.vault,
            &self.fallback_handler,
            keccak256(self.org_name.as_bytes()),
        );
        safe_setup(
            &self.owners,
            self.threshold,
            &self.setup_contract,
            &setup_data,
            &self.fallback_handler,
        )
    }

    /// Predicted address; the owner set must form a valid policy
    pub fn address(&self) -> Result<Address> {
        Policy::new(self.owners.clone(), self.threshold)?;
        Ok(safe_proxy_address(
            &self.factory,
            &self.singleton,
            &self.proxy_creation_code,
            &self.initializer(),
            &self.salt_nonce(),
        ))
    }
}
