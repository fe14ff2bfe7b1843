#![no_main]

use libfuzzer_sys::fuzz_target;
use strongroom_core::{parse_hex, Address, Uint256};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Must never panic, whatever the input
        if let Ok(bytes) = parse_hex(s) {
            let stripped = s
                .strip_prefix("0x")
                .or_else(|| s.strip_prefix("0X"))
                .unwrap_or(s);
            assert_eq!(bytes.len() * 2, stripped.len());
        }

        if let Ok(address) = Address::from_hex(s) {
            assert_eq!(Address::from_hex(&address.to_hex()).unwrap(), address);
        }

        if let Ok(value) = s.parse::<Uint256>() {
            assert_eq!(Uint256::from_dec_str(&value.to_dec_string()).unwrap(), value);
        }
    }
});
