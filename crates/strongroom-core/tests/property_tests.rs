//! Property-based tests for strongroom-core using proptest
//!
//! These tests verify invariants that should hold for all valid inputs.

use std::collections::BTreeSet;

use proptest::prelude::*;
use strongroom_core::{
    abi::append_padded,
    compute_safe_transaction_hash,
    create2::RecoveryDeployment,
    diff_policies, diff_whitelist,
    policy::Policy,
    Address, Operation, Uint256, WhitelistEntry,
};

// ============================================
// Strategies
// ============================================

/// Owners drawn from a small pool so current and target overlap often
fn arb_owners() -> impl Strategy<Value = Vec<Address>> {
    let pool: Vec<Address> = (0x10u8..0x1c).map(|t| Address::new([t; 20])).collect();
    prop::sample::subsequence(pool, 1..=8).prop_shuffle()
}

fn arb_policy() -> impl Strategy<Value = Policy> {
    arb_owners().prop_flat_map(|owners| {
        let n = owners.len() as u64;
        (Just(owners), 1..=n).prop_map(|(owners, threshold)| Policy { owners, threshold })
    })
}

fn arb_address_list(max: usize) -> impl Strategy<Value = Vec<Address>> {
    let pool: Vec<Address> = (0x20u8..0x30).map(|t| Address::new([t; 20])).collect();
    prop::sample::subsequence(pool, 0..=max).prop_shuffle()
}

fn arb_address() -> impl Strategy<Value = Address> {
    any::<[u8; 20]>().prop_map(Address::new)
}

fn arb_operation() -> impl Strategy<Value = Operation> {
    prop_oneof![Just(Operation::Call), Just(Operation::DelegateCall)]
}

fn owner_set(policy: &Policy) -> BTreeSet<Address> {
    policy.owners.iter().copied().collect()
}

// ============================================
// Property Tests
// ============================================

proptest! {
    // ----------------------------------------
    // Policy Diff Properties
    // ----------------------------------------

    #[test]
    fn policy_diff_reaches_target(current in arb_policy(), target in arb_policy()) {
        prop_assume!(!current.is_equivalent(&target));

        let diff = diff_policies(&current, &target).unwrap();
        let mut policy = current.clone();
        for tx in &diff.transactions {
            policy = tx.apply(&policy).unwrap();
        }

        prop_assert_eq!(owner_set(&policy), owner_set(&target));
        prop_assert_eq!(policy.threshold, target.threshold);
        prop_assert_eq!(&policy, &diff.resulting_policy);
    }

    #[test]
    fn policy_diff_is_minimal(current in arb_policy(), target in arb_policy()) {
        let diff = diff_policies(&current, &target).unwrap();
        let added = owner_set(&target).difference(&owner_set(&current)).count();
        let removed = owner_set(&current).difference(&owner_set(&target)).count();
        prop_assert!(diff.transactions.len() <= added.max(removed) + 1);
    }

    #[test]
    fn policy_diff_identity_is_empty(current in arb_policy()) {
        let diff = diff_policies(&current, &current).unwrap();
        prop_assert!(diff.transactions.is_empty());
    }

    // ----------------------------------------
    // Whitelist Properties
    // ----------------------------------------

    #[test]
    fn whitelist_update_reconciles(current in arb_address_list(10), wanted in arb_address_list(10)) {
        let target: Vec<WhitelistEntry> = wanted
            .iter()
            .map(|a| WhitelistEntry::new(*a, format!("dest {}", a)))
            .collect();
        let update = diff_whitelist(&current, &target).unwrap();

        let result: BTreeSet<Address> = update.apply(&current).unwrap().into_iter().collect();
        let expected: BTreeSet<Address> = wanted.iter().copied().collect();
        prop_assert_eq!(result, expected);
    }

    #[test]
    fn whitelist_adds_never_touch_current(current in arb_address_list(10), wanted in arb_address_list(10)) {
        let target: Vec<WhitelistEntry> = wanted
            .iter()
            .map(|a| WhitelistEntry::new(*a, "x"))
            .collect();
        let update = diff_whitelist(&current, &target).unwrap();

        for entry in &update.adds {
            prop_assert!(!current.contains(&entry.address));
        }
        let removed_count: u64 = update.removes.iter().map(|r| r.count).sum();
        let kept = current.iter().filter(|a| wanted.contains(a)).count();
        prop_assert_eq!(removed_count as usize, current.len() - kept);
    }

    // ----------------------------------------
    // Hash Properties
    // ----------------------------------------

    #[test]
    fn safe_tx_hash_is_deterministic(
        chain_id in 1u64..,
        safe in arb_address(),
        to in arb_address(),
        value in any::<u128>(),
        data in prop::collection::vec(any::<u8>(), 0..200),
        operation in arb_operation(),
        nonce in any::<u64>(),
    ) {
        let value = Uint256::from_u128(value);
        let a = compute_safe_transaction_hash(chain_id, &safe, &to, value, &data, operation, nonce);
        let b = compute_safe_transaction_hash(chain_id, &safe, &to, value, &data, operation, nonce);
        prop_assert_eq!(a, b);

        let bumped = compute_safe_transaction_hash(
            chain_id, &safe, &to, value, &data, operation, nonce.wrapping_add(1),
        );
        prop_assert_ne!(a, bumped);
    }

    #[test]
    fn address_padding_is_left_aligned_zeroes(address in arb_address()) {
        let mut buf = Vec::new();
        append_padded(&mut buf, address.as_bytes(), 32);
        prop_assert_eq!(buf.len(), 32);
        prop_assert_eq!(&buf[..12], &[0u8; 12]);
        prop_assert_eq!(&buf[12..], address.as_bytes());
    }

    #[test]
    fn uint256_decimal_matches_u128(value in any::<u128>()) {
        let parsed = Uint256::from_dec_str(&value.to_string()).unwrap();
        prop_assert_eq!(parsed, Uint256::from_u128(value));
        prop_assert_eq!(parsed.to_dec_string(), value.to_string());
    }

    // ----------------------------------------
    // CREATE2 Properties
    // ----------------------------------------

    #[test]
    fn recovery_address_tracks_org_name(org in "[A-Za-z0-9 ]{1,24}", other in "[A-Za-z0-9 ]{1,24}") {
        let deployment = |name: &str| RecoveryDeployment {
            factory: Address::new([0xfa; 20]),
            singleton: Address::new([0x5a; 20]),
            proxy_creation_code: vec![0x60, 0x80],
            setup_contract: Address::new([0x5e; 20]),
            guard: Address::new([0x6a; 20]),
            vault: Address::new([0x7a; 20]),
            fallback_handler: Address::new([0xfb; 20]),
            owners: vec![Address::new([0x11; 20])],
            threshold: 1,
            org_name: name.to_string(),
        };

        prop_assert_eq!(
            deployment(&org).address().unwrap(),
            deployment(&org).address().unwrap()
        );
        if org != other {
            prop_assert_ne!(
                deployment(&org).address().unwrap(),
                deployment(&other).address().unwrap()
            );
        }
    }
}
