//! Owner policy of a Safe and the minimal mutation sequence between two policies
//!
//! On chain the owners form a singly linked list headed by [`SENTINEL`]. The
//! order of [`Policy::owners`] mirrors that list, so every mutation that needs
//! a predecessor (`swapOwner`, `removeOwner`) must look it up in the list as
//! it stands after the preceding mutations.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::abi::{encode_call, selectors, Token};
use crate::error::{Error, Result};
use crate::keys::PublicKey;
use crate::types::{Address, SENTINEL};

/// Owners and confirmation threshold of a Safe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Owners in on-chain list order, head first
    pub owners: Vec<Address>,
    /// Required confirmations
    pub threshold: u64,
}

impl Policy {
    /// Create a validated policy
    pub fn new(owners: Vec<Address>, threshold: u64) -> Result<Self> {
        let policy = Self { owners, threshold };
        policy.validate()?;
        Ok(policy)
    }

    /// Build a policy from compressed device public keys, in the given order
    pub fn from_public_keys(keys: &[PublicKey], threshold: u64) -> Result<Self> {
        let owners = keys
            .iter()
            .map(PublicKey::to_address)
            .collect::<Result<Vec<_>>>()?;
        Self::new(owners, threshold)
    }

    /// Check there are no duplicate owners and `1 <= threshold <= |owners|`
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.owners.len());
        for owner in &self.owners {
            if *owner == SENTINEL || owner.is_zero() {
                return Err(Error::InvalidPolicy(format!("reserved owner address {}", owner)));
            }
            if !seen.insert(*owner) {
                return Err(Error::InvalidPolicy(format!("duplicate owner {}", owner)));
            }
        }
        if self.threshold < 1 || self.threshold > self.owners.len() as u64 {
            return Err(Error::InvalidPolicy(format!(
                "threshold {} outside 1..={}",
                self.threshold,
                self.owners.len()
            )));
        }
        Ok(())
    }

    pub fn contains(&self, owner: &Address) -> bool {
        self.owners.contains(owner)
    }

    /// The list predecessor of `owner`, or [`SENTINEL`] for the head
    pub fn prev_of(&self, owner: &Address) -> Result<Address> {
        match self.owners.iter().position(|o| o == owner) {
            Some(0) => Ok(SENTINEL),
            Some(i) => Ok(self.owners[i - 1]),
            None => Err(Error::Consistency(format!("owner {} not in policy", owner))),
        }
    }

    /// Same owner set and threshold, ignoring list order
    pub fn is_equivalent(&self, other: &Policy) -> bool {
        let mine: BTreeSet<_> = self.owners.iter().collect();
        let theirs: BTreeSet<_> = other.owners.iter().collect();
        self.threshold == other.threshold && mine == theirs
    }

    fn check_threshold(&self, op: &str) -> Result<()> {
        if self.threshold < 1 || self.threshold > self.owners.len() as u64 {
            return Err(Error::Consistency(format!(
                "{}: threshold {} outside 1..={}",
                op,
                self.threshold,
                self.owners.len()
            )));
        }
        Ok(())
    }
}

/// One owner-manager call on a Safe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SafeTx {
    SwapOwner {
        prev: Address,
        old_owner: Address,
        new_owner: Address,
    },
    AddOwnerWithThreshold {
        owner: Address,
        threshold: u64,
    },
    RemoveOwner {
        prev: Address,
        owner: Address,
        threshold: u64,
    },
    ChangeThreshold {
        threshold: u64,
    },
}

impl SafeTx {
    /// Call data for this mutation
    pub fn encode(&self) -> Vec<u8> {
        match self {
            SafeTx::SwapOwner {
                prev,
                old_owner,
                new_owner,
            } => encode_call(
                selectors::SWAP_OWNER,
                &[
                    Token::Address(*prev),
                    Token::Address(*old_owner),
                    Token::Address(*new_owner),
                ],
            ),
            SafeTx::AddOwnerWithThreshold { owner, threshold } => encode_call(
                selectors::ADD_OWNER_WITH_THRESHOLD,
                &[Token::Address(*owner), Token::uint(*threshold)],
            ),
            SafeTx::RemoveOwner {
                prev,
                owner,
                threshold,
            } => encode_call(
                selectors::REMOVE_OWNER,
                &[
                    Token::Address(*prev),
                    Token::Address(*owner),
                    Token::uint(*threshold),
                ],
            ),
            SafeTx::ChangeThreshold { threshold } => {
                encode_call(selectors::CHANGE_THRESHOLD, &[Token::uint(*threshold)])
            }
        }
    }

    /// Apply this mutation the way the Safe owner manager does
    pub fn apply(&self, policy: &Policy) -> Result<Policy> {
        let mut next = policy.clone();
        match *self {
            SafeTx::SwapOwner {
                prev,
                old_owner,
                new_owner,
            } => {
                check_new_owner(policy, &new_owner, "swapOwner")?;
                let actual = policy.prev_of(&old_owner)?;
                if actual != prev {
                    return Err(Error::Consistency(format!(
                        "swapOwner: prev {} does not point to {} (expected {})",
                        prev, old_owner, actual
                    )));
                }
                if let Some(slot) = next.owners.iter_mut().find(|o| **o == old_owner) {
                    *slot = new_owner;
                }
                next.check_threshold("swapOwner")?;
            }
            SafeTx::AddOwnerWithThreshold { owner, threshold } => {
                check_new_owner(policy, &owner, "addOwnerWithThreshold")?;
                next.owners.insert(0, owner);
                next.threshold = threshold;
                next.check_threshold("addOwnerWithThreshold")?;
            }
            SafeTx::RemoveOwner {
                prev,
                owner,
                threshold,
            } => {
                let actual = policy.prev_of(&owner)?;
                if actual != prev {
                    return Err(Error::Consistency(format!(
                        "removeOwner: prev {} does not point to {} (expected {})",
                        prev, owner, actual
                    )));
                }
                next.owners.retain(|o| *o != owner);
                next.threshold = threshold;
                next.check_threshold("removeOwner")?;
            }
            SafeTx::ChangeThreshold { threshold } => {
                next.threshold = threshold;
                next.check_threshold("changeThreshold")?;
            }
        }
        Ok(next)
    }

    /// The same mutation carrying a different threshold, when it has one to carry
    fn with_threshold(self, new_threshold: u64) -> Option<SafeTx> {
        match self {
            SafeTx::AddOwnerWithThreshold { owner, .. } => Some(SafeTx::AddOwnerWithThreshold {
                owner,
                threshold: new_threshold,
            }),
            SafeTx::RemoveOwner { prev, owner, .. } => Some(SafeTx::RemoveOwner {
                prev,
                owner,
                threshold: new_threshold,
            }),
            SafeTx::SwapOwner { .. } | SafeTx::ChangeThreshold { .. } => None,
        }
    }
}

fn check_new_owner(policy: &Policy, owner: &Address, op: &str) -> Result<()> {
    if *owner == SENTINEL || owner.is_zero() {
        return Err(Error::Consistency(format!("{}: reserved owner address {}", op, owner)));
    }
    if policy.contains(owner) {
        return Err(Error::Consistency(format!("{}: {} is already an owner", op, owner)));
    }
    Ok(())
}

/// Result of diffing two policies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDiff {
    /// Mutations to apply in order
    pub transactions: Vec<SafeTx>,
    /// The policy after applying `transactions` to the current one
    pub resulting_policy: Policy,
}

/// Compute the owner-manager calls that turn `current` into `target`.
///
/// Removed owners are first swapped for added ones (both sorted by address),
/// leftover additions are inserted at the head, leftover removals lower the
/// threshold as the list shrinks, and a final threshold change is folded into
/// the last add/remove when there is one.
///
/// Addresses are compared as bytes, which is the order of their lowercase hex
/// strings. Mixed-case (EIP-55) inputs are normalised on parse and sort by
/// their lowercase form.
pub fn diff_policies(current: &Policy, target: &Policy) -> Result<PolicyDiff> {
    current.validate()?;
    target.validate()?;

    let current_set: BTreeSet<Address> = current.owners.iter().copied().collect();
    let target_set: BTreeSet<Address> = target.owners.iter().copied().collect();
    let added: Vec<Address> = target_set.difference(&current_set).copied().collect();
    let removed: Vec<Address> = current_set.difference(&target_set).copied().collect();
    let swaps = added.len().min(removed.len());

    let mut working = current.clone();
    let mut transactions = Vec::with_capacity(added.len().max(removed.len()) + 1);

    for (old_owner, new_owner) in removed.iter().zip(added.iter()) {
        let tx = SafeTx::SwapOwner {
            prev: working.prev_of(old_owner)?,
            old_owner: *old_owner,
            new_owner: *new_owner,
        };
        working = push_applied(&mut transactions, tx, &working)?;
    }

    let extra_added = &added[swaps..];
    for owner in extra_added {
        let tx = SafeTx::AddOwnerWithThreshold {
            owner: *owner,
            threshold: working.threshold,
        };
        working = push_applied(&mut transactions, tx, &working)?;
    }

    let extra_removed = &removed[swaps..];
    let base_threshold = working.threshold;
    for (i, owner) in extra_removed.iter().enumerate() {
        let threshold = base_threshold.saturating_sub(1 + i as u64).max(1);
        let tx = SafeTx::RemoveOwner {
            prev: working.prev_of(owner)?,
            owner: *owner,
            threshold,
        };
        working = push_applied(&mut transactions, tx, &working)?;
    }

    if working.threshold != target.threshold {
        let only_swaps = extra_added.is_empty() && extra_removed.is_empty();
        let folded = if transactions.is_empty() || only_swaps {
            None
        } else {
            transactions
                .last()
                .and_then(|tx| tx.with_threshold(target.threshold))
        };

        match folded {
            Some(tx) => {
                debug!(?tx, "folding threshold change into last transaction");
                if let Some(last) = transactions.last_mut() {
                    *last = tx;
                }
                working.threshold = target.threshold;
                working.check_threshold("threshold fold")?;
            }
            None => {
                let tx = SafeTx::ChangeThreshold {
                    threshold: target.threshold,
                };
                working = push_applied(&mut transactions, tx, &working)?;
            }
        }
    }

    if !working.is_equivalent(target) {
        return Err(Error::Consistency(
            "policy diff did not converge on the target".to_string(),
        ));
    }

    debug!(
        transactions = transactions.len(),
        added = added.len(),
        removed = removed.len(),
        "computed policy diff"
    );

    Ok(PolicyDiff {
        transactions,
        resulting_policy: working,
    })
}

fn push_applied(transactions: &mut Vec<SafeTx>, tx: SafeTx, working: &Policy) -> Result<Policy> {
    let next = tx.apply(working)?;
    debug!(?tx, "policy diff step");
    transactions.push(tx);
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner(tag: u8) -> Address {
        Address::new([tag; 20])
    }

    fn policy(tags: &[u8], threshold: u64) -> Policy {
        Policy::new(tags.iter().map(|t| owner(*t)).collect(), threshold).unwrap()
    }

    #[test]
    fn test_single_swap_at_head() {
        let current = policy(&[0xa, 0xb, 0xc], 2);
        let target = policy(&[0xd, 0xb, 0xc], 2);
        let diff = diff_policies(&current, &target).unwrap();

        assert_eq!(
            diff.transactions,
            vec![SafeTx::SwapOwner {
                prev: SENTINEL,
                old_owner: owner(0xa),
                new_owner: owner(0xd),
            }]
        );
        assert_eq!(diff.resulting_policy, target);
    }

    #[test]
    fn test_add_prepends_owner() {
        let current = policy(&[0xa], 1);
        let target = policy(&[0xa, 0xb], 1);
        let diff = diff_policies(&current, &target).unwrap();

        assert_eq!(
            diff.transactions,
            vec![SafeTx::AddOwnerWithThreshold {
                owner: owner(0xb),
                threshold: 1,
            }]
        );
        assert_eq!(diff.resulting_policy.owners, vec![owner(0xb), owner(0xa)]);
        assert_eq!(diff.resulting_policy.threshold, 1);
    }

    #[test]
    fn test_no_change_emits_nothing() {
        let current = policy(&[0xa, 0xb], 2);
        let diff = diff_policies(&current, &current).unwrap();
        assert!(diff.transactions.is_empty());
        assert_eq!(diff.resulting_policy, current);
    }

    #[test]
    fn test_threshold_only_change() {
        let current = policy(&[0xa, 0xb, 0xc], 1);
        let target = policy(&[0xa, 0xb, 0xc], 3);
        let diff = diff_policies(&current, &target).unwrap();
        assert_eq!(diff.transactions, vec![SafeTx::ChangeThreshold { threshold: 3 }]);
    }

    #[test]
    fn test_swap_then_standalone_threshold_change() {
        let current = policy(&[0xa, 0xb, 0xc], 2);
        let target = policy(&[0xd, 0xb, 0xc], 3);
        let diff = diff_policies(&current, &target).unwrap();
        assert_eq!(diff.transactions.len(), 2);
        assert!(matches!(diff.transactions[0], SafeTx::SwapOwner { .. }));
        assert_eq!(diff.transactions[1], SafeTx::ChangeThreshold { threshold: 3 });
    }

    #[test]
    fn test_threshold_folded_into_add() {
        let current = policy(&[0xa], 1);
        let target = policy(&[0xa, 0xb, 0xc], 2);
        let diff = diff_policies(&current, &target).unwrap();
        assert_eq!(
            diff.transactions,
            vec![
                SafeTx::AddOwnerWithThreshold {
                    owner: owner(0xb),
                    threshold: 1,
                },
                SafeTx::AddOwnerWithThreshold {
                    owner: owner(0xc),
                    threshold: 2,
                },
            ]
        );
        assert_eq!(
            diff.resulting_policy.owners,
            vec![owner(0xc), owner(0xb), owner(0xa)]
        );
        assert_eq!(diff.resulting_policy.threshold, 2);
    }

    #[test]
    fn test_removals_lower_threshold_then_fold() {
        let current = policy(&[0xa, 0xb, 0xc, 0xd], 3);
        let target = policy(&[0xa, 0xd], 2);
        let diff = diff_policies(&current, &target).unwrap();
        assert_eq!(
            diff.transactions,
            vec![
                SafeTx::RemoveOwner {
                    prev: owner(0xa),
                    owner: owner(0xb),
                    threshold: 2,
                },
                // prev recomputed after 0xb left the list; threshold folded to target
                SafeTx::RemoveOwner {
                    prev: owner(0xa),
                    owner: owner(0xc),
                    threshold: 2,
                },
            ]
        );
        assert_eq!(diff.resulting_policy.owners, vec![owner(0xa), owner(0xd)]);
    }

    #[test]
    fn test_removal_threshold_floor_is_one() {
        let current = policy(&[0xa, 0xb, 0xc], 1);
        let target = policy(&[0xc], 1);
        let diff = diff_policies(&current, &target).unwrap();
        assert_eq!(
            diff.transactions,
            vec![
                SafeTx::RemoveOwner {
                    prev: SENTINEL,
                    owner: owner(0xa),
                    threshold: 1,
                },
                SafeTx::RemoveOwner {
                    prev: SENTINEL,
                    owner: owner(0xb),
                    threshold: 1,
                },
            ]
        );
    }

    #[test]
    fn test_swaps_use_sorted_pairs() {
        let current = policy(&[0x0c, 0x0a, 0x05], 2);
        let target = policy(&[0x0e, 0x0d, 0x05], 2);
        let diff = diff_policies(&current, &target).unwrap();
        assert_eq!(
            diff.transactions,
            vec![
                SafeTx::SwapOwner {
                    prev: owner(0x0c),
                    old_owner: owner(0x0a),
                    new_owner: owner(0x0d),
                },
                SafeTx::SwapOwner {
                    prev: SENTINEL,
                    old_owner: owner(0x0c),
                    new_owner: owner(0x0e),
                },
            ]
        );
        assert_eq!(
            diff.resulting_policy.owners,
            vec![owner(0x0e), owner(0x0d), owner(0x05)]
        );
    }

    #[test]
    fn test_invalid_policies_rejected() {
        let dup = Policy {
            owners: vec![owner(1), owner(1)],
            threshold: 1,
        };
        assert!(matches!(dup.validate(), Err(Error::InvalidPolicy(_))));

        let zero = Policy {
            owners: vec![owner(1)],
            threshold: 0,
        };
        assert!(matches!(
            diff_policies(&zero, &policy(&[1], 1)),
            Err(Error::InvalidPolicy(_))
        ));

        let too_high = Policy {
            owners: vec![owner(1)],
            threshold: 2,
        };
        assert!(matches!(
            diff_policies(&policy(&[1], 1), &too_high),
            Err(Error::InvalidPolicy(_))
        ));
    }

    #[test]
    fn test_prev_of_missing_owner() {
        let p = policy(&[0xa], 1);
        assert!(matches!(p.prev_of(&owner(0xb)), Err(Error::Consistency(_))));
    }

    #[test]
    fn test_apply_swap_with_wrong_prev() {
        let p = policy(&[0xa, 0xb], 1);
        let tx = SafeTx::SwapOwner {
            prev: SENTINEL,
            old_owner: owner(0xb),
            new_owner: owner(0xc),
        };
        assert!(matches!(tx.apply(&p), Err(Error::Consistency(_))));
    }

    #[test]
    fn test_apply_remove_below_threshold() {
        let p = policy(&[0xa, 0xb], 2);
        let tx = SafeTx::RemoveOwner {
            prev: SENTINEL,
            owner: owner(0xa),
            threshold: 2,
        };
        assert!(matches!(tx.apply(&p), Err(Error::Consistency(_))));
    }

    #[test]
    fn test_encode_swap_owner() {
        let tx = SafeTx::SwapOwner {
            prev: SENTINEL,
            old_owner: owner(0xa),
            new_owner: owner(0xd),
        };
        let data = tx.encode();
        assert_eq!(data.len(), 4 + 96);
        assert_eq!(&data[..4], &selectors::SWAP_OWNER);
        assert_eq!(data[35], 1);
        assert_eq!(&data[48..68], owner(0xa).as_bytes());
        assert_eq!(&data[80..100], owner(0xd).as_bytes());
    }

    #[test]
    fn test_safe_tx_serde() {
        let tx = SafeTx::ChangeThreshold { threshold: 2 };
        let json = serde_json::to_string(&tx).unwrap();
        assert_eq!(json, r#"{"type":"change_threshold","threshold":2}"#);
        let back: SafeTx = serde_json::from_str(&json).unwrap();
        assert_eq!(tx, back);
    }

    #[test]
    fn test_mixed_case_owners_sort_as_lowercase() {
        let lower = |json: &str| -> Policy { serde_json::from_str(&json.to_lowercase()).unwrap() };
        let current_json = r#"{"owners": ["0x1111111111111111111111111111111111111111", "0xA0aAaAAaaaaaaaaaaaaaaAaaaaAaaAaAaaaaAaaA", "0xAbABababAbabaBAbabAbAbabAbababAbAbaBabAB"], "threshold": 2}"#;
        let target_json = r#"{"owners": ["0x1111111111111111111111111111111111111111", "0xC0Cc0CC0c0C0c0c0C0C0c0C0c0c0C0c0c0c0C0C0", "0xCbcBcbcBcBCbcbCbcbCBcBcBCbcbCBcbcbCbCbcb"], "threshold": 2}"#;
        let current: Policy = serde_json::from_str(current_json).unwrap();
        let target: Policy = serde_json::from_str(target_json).unwrap();

        let diff = diff_policies(&current, &target).unwrap();
        assert_eq!(diff, diff_policies(&lower(current_json), &lower(target_json)).unwrap());

        // 0xa0.. is swapped before 0xab.., although "0xAb" < "0xa0" as raw strings
        match &diff.transactions[0] {
            SafeTx::SwapOwner { old_owner, .. } => {
                assert_eq!(old_owner.as_bytes()[0], 0xa0);
            }
            other => panic!("expected swap, got {:?}", other),
        }
    }
}
