#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use strongroom_core::{diff_policies, Address, Policy};

#[derive(Debug, Arbitrary)]
struct Input {
    current: Vec<u8>,
    current_threshold: u8,
    target: Vec<u8>,
    target_threshold: u8,
}

// Small tags keep owner sets overlapping; tag 0 and 1 hit the reserved addresses
fn owners(tags: &[u8]) -> Vec<Address> {
    tags.iter()
        .take(12)
        .map(|t| {
            let mut bytes = [0u8; 20];
            bytes[19] = t % 16;
            Address::new(bytes)
        })
        .collect()
}

fuzz_target!(|input: Input| {
    let current = Policy {
        owners: owners(&input.current),
        threshold: u64::from(input.current_threshold % 14),
    };
    let target = Policy {
        owners: owners(&input.target),
        threshold: u64::from(input.target_threshold % 14),
    };

    // Invalid policies must be rejected, never panic
    let Ok(diff) = diff_policies(&current, &target) else {
        return;
    };

    let mut policy = current.clone();
    for tx in &diff.transactions {
        policy = tx.apply(&policy).expect("emitted transaction must apply");
    }
    assert!(policy.is_equivalent(&target));
});
