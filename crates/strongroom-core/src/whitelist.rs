//! Address whitelist held by the wallet guard contract
//!
//! The guard stores the whitelist as a sentinel-headed linked list of
//! `(nameHash, address)` words. An update is a list of 32-byte instructions:
//! removals `count(12) ++ prev(20)` delete `count` nodes after `prev`, and
//! additions `nameHash(12) ++ address(20)` insert at the head. Removals run
//! first since both kinds address the same list.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::hash::sha256;
use crate::types::{Address, SENTINEL};

/// A named whitelisted destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistEntry {
    pub address: Address,
    pub name: String,
}

impl WhitelistEntry {
    pub fn new(address: Address, name: impl Into<String>) -> Self {
        Self {
            address,
            name: name.into(),
        }
    }

    /// `nameHash(12) ++ address(20)`
    pub fn encode(&self) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[..12].copy_from_slice(&name_hash(&self.name));
        word[12..].copy_from_slice(self.address.as_bytes());
        word
    }
}

/// First 12 bytes of SHA-256 over the UTF-8 name.
///
/// The guard contract hashes names with SHA-256, unlike every other hash in
/// this crate.
pub fn name_hash(name: &str) -> [u8; 12] {
    let digest = sha256(name.as_bytes());
    let mut out = [0u8; 12];
    out.copy_from_slice(&digest[..12]);
    out
}

/// Remove `count` consecutive nodes following `prev`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalInstruction {
    pub count: u64,
    pub prev: Address,
}

impl RemovalInstruction {
    /// `count(12, big-endian) ++ prev(20)`
    pub fn encode(&self) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[4..12].copy_from_slice(&self.count.to_be_bytes());
        word[12..].copy_from_slice(self.prev.as_bytes());
        word
    }
}

/// Instructions reconciling the on-chain whitelist with a target
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistUpdate {
    pub removes: Vec<RemovalInstruction>,
    pub adds: Vec<WhitelistEntry>,
}

impl WhitelistUpdate {
    pub fn is_empty(&self) -> bool {
        self.removes.is_empty() && self.adds.is_empty()
    }

    /// Encoded instructions, removals before additions
    pub fn all_changes(&self) -> Vec<[u8; 32]> {
        self.removes
            .iter()
            .map(RemovalInstruction::encode)
            .chain(self.adds.iter().map(WhitelistEntry::encode))
            .collect()
    }

    /// Replay the instructions against `current` as the guard would
    pub fn apply(&self, current: &[Address]) -> Result<Vec<Address>> {
        let mut list = current.to_vec();

        for removal in &self.removes {
            let start = if removal.prev == SENTINEL {
                0
            } else {
                list.iter()
                    .position(|a| *a == removal.prev)
                    .ok_or_else(|| {
                        Error::InvalidWhitelist(format!("{} is not whitelisted", removal.prev))
                    })?
                    + 1
            };
            let end = usize::try_from(removal.count)
                .ok()
                .and_then(|count| start.checked_add(count))
                .filter(|end| removal.count != 0 && *end <= list.len())
                .ok_or_else(|| {
                    Error::InvalidWhitelist(format!(
                        "cannot remove {} entries after {}",
                        removal.count, removal.prev
                    ))
                })?;
            list.drain(start..end);
        }

        for entry in &self.adds {
            if list.contains(&entry.address) {
                return Err(Error::InvalidWhitelist(format!(
                    "{} is already whitelisted",
                    entry.address
                )));
            }
            list.insert(0, entry.address);
        }

        Ok(list)
    }
}

fn prev_of(list: &[Address], address: &Address) -> Result<Address> {
    match list.iter().position(|a| a == address) {
        Some(0) => Ok(SENTINEL),
        Some(i) => Ok(list[i - 1]),
        None => Err(Error::InvalidWhitelist(format!(
            "{} not found in current whitelist",
            address
        ))),
    }
}

fn check_address(address: &Address) -> Result<()> {
    if *address == SENTINEL || address.is_zero() {
        return Err(Error::InvalidWhitelist(format!(
            "reserved address {} cannot be whitelisted",
            address
        )));
    }
    Ok(())
}

/// Compute the update turning the on-chain list `current` into `target`.
///
/// Additions are sorted by address. Removals group each maximal run of
/// consecutive removed nodes into one instruction anchored at the node
/// before the run. Duplicate target addresses keep their first name.
pub fn diff_whitelist(current: &[Address], target: &[WhitelistEntry]) -> Result<WhitelistUpdate> {
    let mut seen = HashSet::with_capacity(current.len());
    for address in current {
        check_address(address)?;
        if !seen.insert(*address) {
            return Err(Error::InvalidWhitelist(format!(
                "duplicate address {} in current whitelist",
                address
            )));
        }
    }

    let mut wanted: BTreeMap<Address, &WhitelistEntry> = BTreeMap::new();
    for entry in target {
        check_address(&entry.address)?;
        wanted.entry(entry.address).or_insert(entry);
    }

    let mut removes = Vec::new();
    let mut i = 0;
    while i < current.len() {
        if wanted.contains_key(&current[i]) {
            i += 1;
            continue;
        }
        let start = i;
        while i < current.len() && !wanted.contains_key(&current[i]) {
            i += 1;
        }
        removes.push(RemovalInstruction {
            count: (i - start) as u64,
            prev: prev_of(current, &current[start])?,
        });
    }

    let adds: Vec<WhitelistEntry> = wanted
        .values()
        .filter(|entry| !seen.contains(&entry.address))
        .map(|entry| (*entry).clone())
        .collect();

    debug!(
        removes = removes.len(),
        adds = adds.len(),
        "computed whitelist diff"
    );

    Ok(WhitelistUpdate { removes, adds })
}
