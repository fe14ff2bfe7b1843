//! Strongroom Core - Safe multisig transaction compiler
//!
//! Turns vault configuration changes (owners, whitelist, guard, name,
//! recovery) and asset transfers into Safe call data plus the EIP-712 hash
//! that device keys sign. Owner and whitelist changes are computed as
//! minimal mutation sequences over the contracts' sentinel-headed linked
//! lists.

pub mod abi;
pub mod calls;
pub mod compiler;
pub mod context;
pub mod create2;
pub mod error;
pub mod hash;
pub mod keys;
pub mod policy;
pub mod request;
pub mod types;
pub mod whitelist;

pub use abi::{function_selector, multisend, MultiSendTx, Operation, Token};
pub use compiler::{
    Asset, CompiledTransaction, ConfigTarget, GuardUpdate, PolicyChange, PolicyUpdateData,
    RecoveryEnablement, RecoverySafeTx, TransferRequest, WhitelistChange,
};
pub use context::{ContractName, EvmTransaction, NamedContract};
pub use create2::{create2_address, safe_proxy_address, RecoveryDeployment};
pub use error::{Error, Result};
pub use hash::{compute_safe_transaction_hash, domain_hash, keccak256, SafeTxPayload};
pub use keys::PublicKey;
pub use policy::{diff_policies, Policy, PolicyDiff, SafeTx};
pub use request::{compile, CompileRequest};
pub use types::{parse_hex, Address, SignableHash, Uint256, SENTINEL};
pub use whitelist::{diff_whitelist, name_hash, RemovalInstruction, WhitelistEntry, WhitelistUpdate};
