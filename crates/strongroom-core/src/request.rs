//! Backend request envelope
//!
//! Each request carries the chain context it was issued against together
//! with one operation to compile.

use serde::{Deserialize, Serialize};

use crate::compiler::{
    self, CompiledTransaction, ConfigTarget, GuardUpdate, PolicyChange, RecoveryEnablement,
    RecoverySafeTx, TransferRequest, WhitelistChange,
};
use crate::context::EvmTransaction;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CompileRequest {
    GuardUpdate {
        context: EvmTransaction,
        update: GuardUpdate,
    },
    WhitelistUpdate {
        context: EvmTransaction,
        change: WhitelistChange,
    },
    PolicyUpdate {
        context: EvmTransaction,
        change: PolicyChange,
    },
    NameUpdate {
        context: EvmTransaction,
        target: ConfigTarget,
        name: String,
    },
    Recovery {
        context: EvmTransaction,
        transaction: RecoverySafeTx,
    },
    RecoveryEnablement {
        context: EvmTransaction,
        enablement: RecoveryEnablement,
    },
    Transfer {
        context: EvmTransaction,
        transfer: TransferRequest,
    },
}

impl CompileRequest {
    pub fn context(&self) -> &EvmTransaction {
        match self {
            CompileRequest::GuardUpdate { context, .. }
            | CompileRequest::WhitelistUpdate { context, .. }
            | CompileRequest::PolicyUpdate { context, .. }
            | CompileRequest::NameUpdate { context, .. }
            | CompileRequest::Recovery { context, .. }
            | CompileRequest::RecoveryEnablement { context, .. }
            | CompileRequest::Transfer { context, .. } => context,
        }
    }

    /// Short operation name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            CompileRequest::GuardUpdate { .. } => "guard_update",
            CompileRequest::WhitelistUpdate { .. } => "whitelist_update",
            CompileRequest::PolicyUpdate { .. } => "policy_update",
            CompileRequest::NameUpdate { .. } => "name_update",
            CompileRequest::Recovery { .. } => "recovery",
            CompileRequest::RecoveryEnablement { .. } => "recovery_enablement",
            CompileRequest::Transfer { .. } => "transfer",
        }
    }

    /// Parse a request from backend JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Compile any request into a signable Safe transaction
pub fn compile(request: &CompileRequest) -> Result<CompiledTransaction> {
    tracing::debug!(kind = request.kind(), "compiling request");
    match request {
        CompileRequest::GuardUpdate { context, update } => compiler::guard_update(context, update),
        CompileRequest::WhitelistUpdate { context, change } => {
            compiler::whitelist_update(context, change)
        }
        CompileRequest::PolicyUpdate { context, change } => compiler::policy_update(context, change),
        CompileRequest::NameUpdate {
            context,
            target,
            name,
        } => compiler::name_update(context, *target, name),
        CompileRequest::Recovery {
            context,
            transaction,
        } => compiler::recovery_update(context, transaction),
        CompileRequest::RecoveryEnablement {
            context,
            enablement,
        } => compiler::recovery_enablement(context, enablement),
        CompileRequest::Transfer { context, transfer } => compiler::transfer(context, transfer),
    }
}
