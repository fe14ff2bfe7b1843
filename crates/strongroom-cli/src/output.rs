//! Result printing in text or JSON

use std::io::Write;

use serde::Serialize;
use serde_json::json;
use strongroom_core::{
    Address, CompiledTransaction, Operation, PolicyDiff, SafeTx, SignableHash, WhitelistUpdate,
};

use crate::config::OutputFormat;
use crate::error::Result;

/// Writes command results in the configured format
pub struct Printer<W: Write> {
    out: W,
    format: OutputFormat,
    hex_prefix: bool,
}

impl<W: Write> Printer<W> {
    pub fn new(out: W, format: OutputFormat, hex_prefix: bool) -> Self {
        Self {
            out,
            format,
            hex_prefix,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn hex(&self, bytes: &[u8]) -> String {
        if self.hex_prefix {
            format!("0x{}", hex::encode(bytes))
        } else {
            hex::encode(bytes)
        }
    }

    fn json<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let text = serde_json::to_string_pretty(value)?;
        writeln!(self.out, "{}", text)?;
        Ok(())
    }

    pub fn compiled(&mut self, tx: &CompiledTransaction) -> Result<()> {
        if self.format == OutputFormat::Json {
            return self.json(tx);
        }
        let operation = match tx.operation {
            Operation::Call => "call",
            Operation::DelegateCall => "delegatecall",
        };
        let lines = [
            ("chain id", tx.chain_id.to_string()),
            ("safe", self.hex(tx.safe.as_bytes())),
            ("to", self.hex(tx.to.as_bytes())),
            ("value", tx.value.to_string()),
            ("operation", operation.to_string()),
            ("nonce", tx.nonce.to_string()),
            ("data", self.hex(&tx.data)),
            ("signable hash", self.hex(tx.signable_hash.as_bytes())),
        ];
        for (label, value) in lines {
            writeln!(self.out, "{:<14} {}", format!("{}:", label), value)?;
        }
        Ok(())
    }

    pub fn policy_diff(&mut self, diff: &PolicyDiff) -> Result<()> {
        if self.format == OutputFormat::Json {
            let transactions: Vec<_> = diff
                .transactions
                .iter()
                .map(|tx| json!({ "transaction": tx, "data": format!("0x{}", hex::encode(tx.encode())) }))
                .collect();
            return self.json(&json!({
                "transactions": transactions,
                "resultingPolicy": diff.resulting_policy,
            }));
        }
        if diff.transactions.is_empty() {
            writeln!(self.out, "No changes")?;
        }
        for (i, tx) in diff.transactions.iter().enumerate() {
            let line = self.describe(tx);
            let data = self.hex(&tx.encode());
            writeln!(self.out, "{}. {}", i + 1, line)?;
            writeln!(self.out, "   {}", data)?;
        }
        let owners: Vec<String> = diff
            .resulting_policy
            .owners
            .iter()
            .map(|o| self.hex(o.as_bytes()))
            .collect();
        writeln!(
            self.out,
            "Resulting policy: {} of [{}]",
            diff.resulting_policy.threshold,
            owners.join(", ")
        )?;
        Ok(())
    }

    fn describe(&self, tx: &SafeTx) -> String {
        match tx {
            SafeTx::SwapOwner {
                prev,
                old_owner,
                new_owner,
            } => format!(
                "swapOwner prev={} old={} new={}",
                self.hex(prev.as_bytes()),
                self.hex(old_owner.as_bytes()),
                self.hex(new_owner.as_bytes())
            ),
            SafeTx::AddOwnerWithThreshold { owner, threshold } => format!(
                "addOwnerWithThreshold owner={} threshold={}",
                self.hex(owner.as_bytes()),
                threshold
            ),
            SafeTx::RemoveOwner {
                prev,
                owner,
                threshold,
            } => format!(
                "removeOwner prev={} owner={} threshold={}",
                self.hex(prev.as_bytes()),
                self.hex(owner.as_bytes()),
                threshold
            ),
            SafeTx::ChangeThreshold { threshold } => {
                format!("changeThreshold threshold={}", threshold)
            }
        }
    }

    /// Instructions plus the list the guard would hold afterwards
    pub fn whitelist_update(&mut self, update: &WhitelistUpdate, resulting: &[Address]) -> Result<()> {
        if self.format == OutputFormat::Json {
            let changes: Vec<String> = update
                .all_changes()
                .iter()
                .map(|c| format!("0x{}", hex::encode(c)))
                .collect();
            return self.json(&json!({
                "removes": update.removes,
                "adds": update.adds,
                "changes": changes,
                "resultingWhitelist": resulting,
            }));
        }
        if update.is_empty() {
            writeln!(self.out, "No changes")?;
        }
        for removal in &update.removes {
            let prev = self.hex(removal.prev.as_bytes());
            writeln!(self.out, "remove {} after {}", removal.count, prev)?;
        }
        for entry in &update.adds {
            let address = self.hex(entry.address.as_bytes());
            writeln!(self.out, "add {} ({})", address, entry.name)?;
        }
        writeln!(self.out, "Resulting whitelist: {} entries", resulting.len())?;
        Ok(())
    }

    pub fn signable_hash(&mut self, hash: &SignableHash) -> Result<()> {
        if self.format == OutputFormat::Json {
            return self.json(&json!({ "signableHash": hash }));
        }
        let line = self.hex(hash.as_bytes());
        writeln!(self.out, "{}", line)?;
        Ok(())
    }

    pub fn address(&mut self, address: &Address) -> Result<()> {
        if self.format == OutputFormat::Json {
            return self.json(&json!({ "address": address }));
        }
        let line = self.hex(address.as_bytes());
        writeln!(self.out, "{}", line)?;
        Ok(())
    }
}
