#![no_main]

use std::collections::BTreeSet;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use strongroom_core::{diff_whitelist, Address, WhitelistEntry};

#[derive(Debug, Arbitrary)]
struct Input {
    current: Vec<u8>,
    target: Vec<(u8, String)>,
}

fn address(tag: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[19] = tag % 32;
    Address::new(bytes)
}

fuzz_target!(|input: Input| {
    let current: Vec<Address> = input.current.iter().take(24).map(|t| address(*t)).collect();
    let target: Vec<WhitelistEntry> = input
        .target
        .into_iter()
        .take(24)
        .map(|(t, name)| WhitelistEntry::new(address(t), name))
        .collect();

    let Ok(update) = diff_whitelist(&current, &target) else {
        return;
    };

    let result: BTreeSet<Address> = update
        .apply(&current)
        .expect("update must apply to its own source")
        .into_iter()
        .collect();
    let expected: BTreeSet<Address> = target.iter().map(|e| e.address).collect();
    assert_eq!(result, expected);

    // Encoding must not panic either
    let _ = update.all_changes();
});
