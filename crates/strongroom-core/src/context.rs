//! Per-request chain context supplied by the backend

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Address;

/// Deployed contracts the compiler needs to know about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractName {
    MultiSend,
    /// Guard with neither whitelist nor dApp access
    Guard,
    WhitelistGuard,
    DAppsGuard,
    WhitelistDAppsGuard,
    ProxyFactory,
    SafeSingleton,
    /// Delegate-called during recovery Safe setup (`censoSetup`)
    RecoverySetup,
    RecoveryGuard,
    FallbackHandler,
    #[serde(other)]
    Unknown,
}

impl ContractName {
    /// Guard variant enforcing the requested settings
    pub fn guard_for(whitelist_enabled: bool, dapps_enabled: bool) -> Self {
        match (whitelist_enabled, dapps_enabled) {
            (false, false) => ContractName::Guard,
            (true, false) => ContractName::WhitelistGuard,
            (false, true) => ContractName::DAppsGuard,
            (true, true) => ContractName::WhitelistDAppsGuard,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedContract {
    pub name: ContractName,
    pub address: Address,
}

/// Chain state for one compilation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmTransaction {
    #[serde(default)]
    pub chain_id: Option<u64>,
    #[serde(default)]
    pub safe_nonce: u64,
    #[serde(default)]
    pub vault_address: Option<Address>,
    #[serde(default)]
    pub contract_addresses: Vec<NamedContract>,
}

impl EvmTransaction {
    pub fn new(chain_id: u64, safe_nonce: u64, vault_address: Address) -> Self {
        Self {
            chain_id: Some(chain_id),
            safe_nonce,
            vault_address: Some(vault_address),
            contract_addresses: Vec::new(),
        }
    }

    /// Add a named contract address
    pub fn with_contract(mut self, name: ContractName, address: Address) -> Self {
        self.contract_addresses.push(NamedContract { name, address });
        self
    }

    /// Chain id; zero counts as missing
    pub fn chain_id(&self) -> Result<u64> {
        match self.chain_id {
            Some(id) if id != 0 => Ok(id),
            _ => Err(Error::MissingChain),
        }
    }

    pub fn vault(&self) -> Result<Address> {
        self.vault_address.ok_or(Error::MissingVault)
    }

    /// First contract registered under `name`
    pub fn contract(&self, name: ContractName) -> Option<Address> {
        self.contract_addresses
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.address)
    }

    pub fn require_contract(&self, name: ContractName) -> Result<Address> {
        self.contract(name)
            .ok_or_else(|| Error::MissingContractAddresses(format!("{:?}", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_variants() {
        assert_eq!(ContractName::guard_for(false, false), ContractName::Guard);
        assert_eq!(ContractName::guard_for(true, false), ContractName::WhitelistGuard);
        assert_eq!(ContractName::guard_for(false, true), ContractName::DAppsGuard);
        assert_eq!(
            ContractName::guard_for(true, true),
            ContractName::WhitelistDAppsGuard
        );
    }

    #[test]
    fn test_missing_values() {
        let ctx = EvmTransaction::default();
        assert_eq!(ctx.chain_id(), Err(Error::MissingChain));
        assert_eq!(ctx.vault(), Err(Error::MissingVault));
        assert!(matches!(
            ctx.require_contract(ContractName::MultiSend),
            Err(Error::MissingContractAddresses(_))
        ));

        let zero_chain = EvmTransaction {
            chain_id: Some(0),
            ..Default::default()
        };
        assert_eq!(zero_chain.chain_id(), Err(Error::MissingChain));
    }

    #[test]
    fn test_backend_json() {
        let json = r#"{
            "chainId": 5,
            "safeNonce": 12,
            "vaultAddress": "0x1111111111111111111111111111111111111111",
            "contractAddresses": [
                {"name": "MultiSend", "address": "0x2222222222222222222222222222222222222222"},
                {"name": "SomethingNew", "address": "0x3333333333333333333333333333333333333333"}
            ]
        }"#;
        let ctx: EvmTransaction = serde_json::from_str(json).unwrap();
        assert_eq!(ctx.chain_id().unwrap(), 5);
        assert_eq!(ctx.safe_nonce, 12);
        assert_eq!(
            ctx.contract(ContractName::MultiSend),
            Some(Address::new([0x22; 20]))
        );
        assert_eq!(ctx.contract_addresses[1].name, ContractName::Unknown);
    }
}
