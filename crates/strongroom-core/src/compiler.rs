//! Compiles vault operations into Safe transactions and their signable hashes
//!
//! Configuration changes are signed by the vault's owners. A change aimed at
//! the vault itself is a Safe transaction from the vault to itself (or a
//! delegatecall into MultiSend for batches). A change aimed at a wallet owned
//! by the vault goes through module execution: the vault calls
//! `wallet.execTransactionFromModule(...)`. Asset transfers are signed on the
//! source wallet and call the token directly.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::abi::{exec_transaction_from_module, multisend, MultiSendTx, Operation};
use crate::calls;
use crate::context::{ContractName, EvmTransaction};
use crate::create2::RecoveryDeployment;
use crate::error::{Error, Result};
use crate::hash::SafeTxPayload;
use crate::policy::{diff_policies, Policy, SafeTx};
use crate::types::{hex_bytes, Address, SignableHash, Uint256};
use crate::whitelist::{diff_whitelist, WhitelistEntry, WhitelistUpdate};

/// Which Safe a configuration change applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "address", rename_all = "snake_case")]
pub enum ConfigTarget {
    Vault,
    Wallet(Address),
}

/// Encoding strategy for owner-manager calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum PolicyUpdateData {
    /// One call made directly on the Safe
    Single(#[serde(with = "hex_bytes")] Vec<u8>),
    /// `multiSend` call data, delegate-called by the Safe
    Multisend(#[serde(with = "hex_bytes")] Vec<u8>),
}

impl PolicyUpdateData {
    /// Encode `transactions` against the Safe at `safe`
    pub fn from_transactions(safe: &Address, transactions: &[SafeTx]) -> Result<Self> {
        match transactions {
            [] => Err(Error::InvalidPolicy(
                "current and target policies are identical".to_string(),
            )),
            [single] => Ok(PolicyUpdateData::Single(single.encode())),
            many => {
                let batch: Vec<MultiSendTx> = many
                    .iter()
                    .map(|tx| MultiSendTx::call(*safe, tx.encode()))
                    .collect();
                Ok(PolicyUpdateData::Multisend(multisend(&batch)))
            }
        }
    }
}

/// A Safe transaction ready for device signing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledTransaction {
    pub chain_id: u64,
    /// The Safe whose owners sign; also the EIP-712 verifying contract
    pub safe: Address,
    pub to: Address,
    pub value: Uint256,
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
    pub operation: Operation,
    pub nonce: u64,
    pub signable_hash: SignableHash,
}

/// A call to be made by the target Safe on itself or a helper
struct InnerCall {
    to: Address,
    data: Vec<u8>,
    operation: Operation,
}

fn finish(ctx: &EvmTransaction, safe: Address, payload: SafeTxPayload) -> Result<CompiledTransaction> {
    let chain_id = ctx.chain_id()?;
    let signable_hash = payload.signable_hash(chain_id, &safe);
    debug!(
        safe = %safe,
        to = %payload.to,
        nonce = payload.nonce,
        hash = %signable_hash.to_hex(),
        "compiled safe transaction"
    );
    Ok(CompiledTransaction {
        chain_id,
        safe,
        to: payload.to,
        value: payload.value,
        data: payload.data,
        operation: payload.operation,
        nonce: payload.nonce,
        signable_hash,
    })
}

/// Wrap a call the target Safe must make, signed by the vault
fn config_transaction(
    ctx: &EvmTransaction,
    target: ConfigTarget,
    call: InnerCall,
) -> Result<CompiledTransaction> {
    let vault = ctx.vault()?;
    let payload = match target {
        ConfigTarget::Vault => SafeTxPayload {
            to: call.to,
            value: Uint256::ZERO,
            data: call.data,
            operation: call.operation,
            nonce: ctx.safe_nonce,
        },
        ConfigTarget::Wallet(wallet) => SafeTxPayload {
            to: wallet,
            value: Uint256::ZERO,
            data: exec_transaction_from_module(call.to, Uint256::ZERO, &call.data, call.operation),
            operation: Operation::Call,
            nonce: ctx.safe_nonce,
        },
    };
    finish(ctx, vault, payload)
}

fn target_address(ctx: &EvmTransaction, target: ConfigTarget) -> Result<Address> {
    match target {
        ConfigTarget::Vault => ctx.vault(),
        ConfigTarget::Wallet(wallet) => Ok(wallet),
    }
}

/// Guard switch for whitelist and dApp enforcement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardUpdate {
    pub target: ConfigTarget,
    /// Guard installed today, used when no deployed guard matches the settings
    #[serde(default)]
    pub current_guard: Option<Address>,
    pub whitelist_enabled: bool,
    pub dapps_enabled: bool,
}

/// Resolve the guard contract for the requested settings
pub fn resolve_guard(ctx: &EvmTransaction, update: &GuardUpdate) -> Result<Address> {
    let name = ContractName::guard_for(update.whitelist_enabled, update.dapps_enabled);
    if let Some(guard) = ctx.contract(name) {
        return Ok(guard);
    }
    match update.current_guard {
        Some(current) => {
            warn!(?name, guard = %current, "no deployed guard matches settings, keeping current guard");
            Ok(current)
        }
        None => Err(Error::MissingContractAddresses(format!("{:?}", name))),
    }
}

/// `setGuard` on the target via module execution
pub fn guard_update(ctx: &EvmTransaction, update: &GuardUpdate) -> Result<CompiledTransaction> {
    let guard = resolve_guard(ctx, update)?;
    let to = target_address(ctx, update.target)?;
    config_transaction(
        ctx,
        update.target,
        InnerCall {
            to,
            data: calls::set_guard(&guard),
            operation: Operation::Call,
        },
    )
}

/// Whitelist reconciliation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhitelistChange {
    pub target: ConfigTarget,
    /// Addresses in on-chain list order
    pub current_addresses: Vec<Address>,
    pub target_destinations: Vec<WhitelistEntry>,
}

/// `updateWhitelist` on the target via module execution
pub fn whitelist_update(
    ctx: &EvmTransaction,
    change: &WhitelistChange,
) -> Result<CompiledTransaction> {
    let update = diff_whitelist(&change.current_addresses, &change.target_destinations)?;
    compile_whitelist_update(ctx, change.target, &update)
}

/// Compile an already computed whitelist update
pub fn compile_whitelist_update(
    ctx: &EvmTransaction,
    target: ConfigTarget,
    update: &WhitelistUpdate,
) -> Result<CompiledTransaction> {
    let to = target_address(ctx, target)?;
    config_transaction(
        ctx,
        target,
        InnerCall {
            to,
            data: calls::update_whitelist(&update.all_changes()),
            operation: Operation::Call,
        },
    )
}

/// Owner/threshold change request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyChange {
    pub target: ConfigTarget,
    pub current: Policy,
    pub target_policy: Policy,
}

/// Owner-manager calls for a policy change, single or batched
pub fn policy_update(ctx: &EvmTransaction, change: &PolicyChange) -> Result<CompiledTransaction> {
    let diff = diff_policies(&change.current, &change.target_policy)?;
    compile_policy_transactions(ctx, change.target, &diff.transactions)
}

/// Compile an already computed owner-manager sequence
pub fn compile_policy_transactions(
    ctx: &EvmTransaction,
    target: ConfigTarget,
    transactions: &[SafeTx],
) -> Result<CompiledTransaction> {
    let safe = target_address(ctx, target)?;
    let call = match PolicyUpdateData::from_transactions(&safe, transactions)? {
        PolicyUpdateData::Single(data) => InnerCall {
            to: safe,
            data,
            operation: Operation::Call,
        },
        PolicyUpdateData::Multisend(data) => InnerCall {
            to: ctx.require_contract(ContractName::MultiSend)?,
            data,
            operation: Operation::DelegateCall,
        },
    };
    config_transaction(ctx, target, call)
}

/// `setNameHash(keccak256(newName))` via module execution
pub fn name_update(
    ctx: &EvmTransaction,
    target: ConfigTarget,
    new_name: &str,
) -> Result<CompiledTransaction> {
    let to = target_address(ctx, target)?;
    config_transaction(
        ctx,
        target,
        InnerCall {
            to,
            data: calls::set_name_hash(new_name),
            operation: Operation::Call,
        },
    )
}

/// Module changes for the recovery contract, executed by the vault directly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecoverySafeTx {
    EnableRecoveryContract {
        recovery_contract: Address,
    },
    DisableRecoveryContract {
        prev_module: Address,
        module: Address,
    },
}

impl RecoverySafeTx {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            RecoverySafeTx::EnableRecoveryContract { recovery_contract } => {
                calls::enable_module(recovery_contract)
            }
            RecoverySafeTx::DisableRecoveryContract { prev_module, module } => {
                calls::disable_module(prev_module, module)
            }
        }
    }
}

/// Vault-signed module change, no module wrapping
pub fn recovery_update(ctx: &EvmTransaction, tx: &RecoverySafeTx) -> Result<CompiledTransaction> {
    let vault = ctx.vault()?;
    let payload = SafeTxPayload {
        to: vault,
        value: Uint256::ZERO,
        data: tx.encode(),
        operation: Operation::Call,
        nonce: ctx.safe_nonce,
    };
    finish(ctx, vault, payload)
}

/// Inputs for enabling an organisation's recovery contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryEnablement {
    pub org_name: String,
    pub recovery_policy: Policy,
    #[serde(with = "hex_bytes")]
    pub proxy_creation_code: Vec<u8>,
}

/// Assemble the deployment parameters from the context's named contracts
pub fn recovery_deployment(
    ctx: &EvmTransaction,
    enablement: &RecoveryEnablement,
) -> Result<RecoveryDeployment> {
    Ok(RecoveryDeployment {
        factory: ctx.require_contract(ContractName::ProxyFactory)?,
        singleton: ctx.require_contract(ContractName::SafeSingleton)?,
        proxy_creation_code: enablement.proxy_creation_code.clone(),
        setup_contract: ctx.require_contract(ContractName::RecoverySetup)?,
        guard: ctx.require_contract(ContractName::RecoveryGuard)?,
        vault: ctx.vault()?,
        fallback_handler: ctx.require_contract(ContractName::FallbackHandler)?,
        owners: enablement.recovery_policy.owners.clone(),
        threshold: enablement.recovery_policy.threshold,
        org_name: enablement.org_name.clone(),
    })
}

/// `enableModule(predictedRecoveryAddress)` on the vault
pub fn recovery_enablement(
    ctx: &EvmTransaction,
    enablement: &RecoveryEnablement,
) -> Result<CompiledTransaction> {
    let recovery_contract = recovery_deployment(ctx, enablement)?.address()?;
    debug!(recovery = %recovery_contract, "derived recovery contract address");
    recovery_update(
        ctx,
        &RecoverySafeTx::EnableRecoveryContract { recovery_contract },
    )
}

/// Asset moved by a transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "standard", rename_all = "snake_case")]
pub enum Asset {
    Native {
        amount: Uint256,
    },
    Erc20 {
        token: Address,
        amount: Uint256,
    },
    Erc721 {
        token: Address,
        token_id: Uint256,
    },
    Erc1155 {
        token: Address,
        token_id: Uint256,
        amount: Uint256,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    /// Source wallet; the vault when absent
    #[serde(default)]
    pub wallet: Option<Address>,
    pub recipient: Address,
    pub asset: Asset,
}

/// Direct transfer signed on the source Safe
pub fn transfer(ctx: &EvmTransaction, request: &TransferRequest) -> Result<CompiledTransaction> {
    let safe = match request.wallet {
        Some(wallet) => wallet,
        None => ctx.vault()?,
    };
    let recipient = &request.recipient;

    let (to, value, data) = match &request.asset {
        Asset::Native { amount } => (*recipient, *amount, Vec::new()),
        Asset::Erc20 { token, amount } => {
            (*token, Uint256::ZERO, calls::erc20_transfer(recipient, *amount))
        }
        Asset::Erc721 { token, token_id } => (
            *token,
            Uint256::ZERO,
            calls::erc721_safe_transfer_from(&safe, recipient, *token_id),
        ),
        Asset::Erc1155 {
            token,
            token_id,
            amount,
        } => (
            *token,
            Uint256::ZERO,
            calls::erc1155_safe_transfer_from(&safe, recipient, *token_id, *amount, &[]),
        ),
    };

    finish(
        ctx,
        safe,
        SafeTxPayload {
            to,
            value,
            data,
            operation: Operation::Call,
            nonce: ctx.safe_nonce,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::selectors;
    use crate::hash::compute_safe_transaction_hash;

    fn addr(tag: u8) -> Address {
        Address::new([tag; 20])
    }

    fn ctx() -> EvmTransaction {
        EvmTransaction::new(1, 7, addr(0x7a))
            .with_contract(ContractName::MultiSend, addr(0x55))
            .with_contract(ContractName::Guard, addr(0x60))
            .with_contract(ContractName::WhitelistGuard, addr(0x61))
    }

    fn policy(tags: &[u8], threshold: u64) -> Policy {
        Policy::new(tags.iter().map(|t| addr(*t)).collect(), threshold).unwrap()
    }

    #[test]
    fn test_guard_update_wallet_uses_module_execution() {
        let update = GuardUpdate {
            target: ConfigTarget::Wallet(addr(0x3a)),
            current_guard: None,
            whitelist_enabled: true,
            dapps_enabled: false,
        };
        let tx = guard_update(&ctx(), &update).unwrap();
        assert_eq!(tx.safe, addr(0x7a));
        assert_eq!(tx.to, addr(0x3a));
        assert_eq!(tx.operation, Operation::Call);
        assert_eq!(tx.nonce, 7);
        assert_eq!(
            tx.data,
            exec_transaction_from_module(
                addr(0x3a),
                Uint256::ZERO,
                &calls::set_guard(&addr(0x61)),
                Operation::Call
            )
        );
        assert_eq!(
            tx.signable_hash,
            compute_safe_transaction_hash(
                1,
                &addr(0x7a),
                &addr(0x3a),
                Uint256::ZERO,
                &tx.data,
                Operation::Call,
                7
            )
        );
    }

    #[test]
    fn test_guard_fallback_to_current() {
        let update = GuardUpdate {
            target: ConfigTarget::Vault,
            current_guard: Some(addr(0x99)),
            whitelist_enabled: true,
            dapps_enabled: true,
        };
        assert_eq!(resolve_guard(&ctx(), &update).unwrap(), addr(0x99));

        let no_current = GuardUpdate {
            current_guard: None,
            ..update
        };
        assert!(matches!(
            resolve_guard(&ctx(), &no_current),
            Err(Error::MissingContractAddresses(_))
        ));
    }

    #[test]
    fn test_single_policy_change_on_vault() {
        let change = PolicyChange {
            target: ConfigTarget::Vault,
            current: policy(&[0xa, 0xb, 0xc], 2),
            target_policy: policy(&[0xd, 0xb, 0xc], 2),
        };
        let tx = policy_update(&ctx(), &change).unwrap();
        assert_eq!(tx.to, addr(0x7a));
        assert_eq!(tx.operation, Operation::Call);
        assert_eq!(&tx.data[..4], &selectors::SWAP_OWNER);
    }

    #[test]
    fn test_batched_policy_change_on_wallet() {
        let change = PolicyChange {
            target: ConfigTarget::Wallet(addr(0x3a)),
            current: policy(&[0xa], 1),
            target_policy: policy(&[0xa, 0xb, 0xc], 2),
        };
        let tx = policy_update(&ctx(), &change).unwrap();
        assert_eq!(tx.to, addr(0x3a));
        assert_eq!(&tx.data[..4], &selectors::EXEC_TRANSACTION_FROM_MODULE);
        // inner target is MultiSend, delegate-called
        assert_eq!(&tx.data[4 + 12..4 + 32], addr(0x55).as_bytes());
        assert_eq!(tx.data[4 + 127], 1);
        assert_eq!(&tx.data[4 + 160..4 + 164], &selectors::MULTI_SEND);
    }

    #[test]
    fn test_batched_vault_change_needs_multisend() {
        let ctx = EvmTransaction::new(1, 0, addr(0x7a));
        let change = PolicyChange {
            target: ConfigTarget::Vault,
            current: policy(&[0xa], 1),
            target_policy: policy(&[0xb, 0xc], 2),
        };
        assert!(matches!(
            policy_update(&ctx, &change),
            Err(Error::MissingContractAddresses(_))
        ));
    }

    #[test]
    fn test_identical_policies_rejected() {
        let change = PolicyChange {
            target: ConfigTarget::Vault,
            current: policy(&[0xa], 1),
            target_policy: policy(&[0xa], 1),
        };
        assert!(matches!(
            policy_update(&ctx(), &change),
            Err(Error::InvalidPolicy(_))
        ));
    }

    #[test]
    fn test_missing_vault_and_chain() {
        let mut no_vault = ctx();
        no_vault.vault_address = None;
        assert_eq!(
            name_update(&no_vault, ConfigTarget::Vault, "x"),
            Err(Error::MissingVault)
        );

        let mut no_chain = ctx();
        no_chain.chain_id = None;
        assert_eq!(
            name_update(&no_chain, ConfigTarget::Wallet(addr(1)), "x"),
            Err(Error::MissingChain)
        );
    }

    #[test]
    fn test_recovery_update_is_direct() {
        let tx = recovery_update(
            &ctx(),
            &RecoverySafeTx::EnableRecoveryContract {
                recovery_contract: addr(0x42),
            },
        )
        .unwrap();
        assert_eq!(tx.safe, addr(0x7a));
        assert_eq!(tx.to, addr(0x7a));
        assert_eq!(tx.data, calls::enable_module(&addr(0x42)));
    }

    #[test]
    fn test_recovery_enablement_requires_contracts() {
        let enablement = RecoveryEnablement {
            org_name: "Acme".to_string(),
            recovery_policy: policy(&[1, 2], 1),
            proxy_creation_code: vec![0x60],
        };
        assert!(matches!(
            recovery_enablement(&ctx(), &enablement),
            Err(Error::MissingContractAddresses(_))
        ));

        let full = ctx()
            .with_contract(ContractName::ProxyFactory, addr(0xf0))
            .with_contract(ContractName::SafeSingleton, addr(0xf1))
            .with_contract(ContractName::RecoverySetup, addr(0xf2))
            .with_contract(ContractName::RecoveryGuard, addr(0xf3))
            .with_contract(ContractName::FallbackHandler, addr(0xf4));
        let tx = recovery_enablement(&full, &enablement).unwrap();
        let expected = recovery_deployment(&full, &enablement)
            .unwrap()
            .address()
            .unwrap();
        assert_eq!(tx.data, calls::enable_module(&expected));
    }

    #[test]
    fn test_erc20_transfer_from_wallet() {
        let request = TransferRequest {
            wallet: Some(addr(0x3a)),
            recipient: addr(0xbb),
            asset: Asset::Erc20 {
                token: addr(0xcc),
                amount: Uint256::from_u64(1000),
            },
        };
        let tx = transfer(&ctx(), &request).unwrap();
        assert_eq!(tx.safe, addr(0x3a));
        assert_eq!(tx.to, addr(0xcc));
        assert!(tx.value.is_zero());
        assert_eq!(tx.data, calls::erc20_transfer(&addr(0xbb), Uint256::from_u64(1000)));
    }

    #[test]
    fn test_native_transfer_defaults_to_vault() {
        let request = TransferRequest {
            wallet: None,
            recipient: addr(0xbb),
            asset: Asset::Native {
                amount: Uint256::from_u64(5),
            },
        };
        let tx = transfer(&ctx(), &request).unwrap();
        assert_eq!(tx.safe, addr(0x7a));
        assert_eq!(tx.to, addr(0xbb));
        assert_eq!(tx.value, Uint256::from_u64(5));
        assert!(tx.data.is_empty());
    }

    #[test]
    fn test_erc721_from_is_signing_safe() {
        let request = TransferRequest {
            wallet: Some(addr(0x3a)),
            recipient: addr(0xbb),
            asset: Asset::Erc721 {
                token: addr(0xcc),
                token_id: Uint256::from_u64(9),
            },
        };
        let tx = transfer(&ctx(), &request).unwrap();
        assert_eq!(&tx.data[..4], &selectors::ERC721_SAFE_TRANSFER_FROM);
        assert_eq!(&tx.data[16..36], addr(0x3a).as_bytes());
    }
}
