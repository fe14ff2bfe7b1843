//! Call data for the Safe, guard and token contracts

use crate::abi::{encode_call, selectors, Token};
use crate::hash::keccak256;
use crate::types::{Address, Uint256};

/// `setGuard(guard)`
pub fn set_guard(guard: &Address) -> Vec<u8> {
    encode_call(selectors::SET_GUARD, &[Token::Address(*guard)])
}

/// `setNameHash(keccak256(name))`
pub fn set_name_hash(name: &str) -> Vec<u8> {
    encode_call(
        selectors::SET_NAME_HASH,
        &[Token::FixedBytes32(keccak256(name.as_bytes()))],
    )
}

/// `updateWhitelist(bytes32[])` over encoded whitelist instructions
pub fn update_whitelist(changes: &[[u8; 32]]) -> Vec<u8> {
    let items = changes.iter().map(|c| Token::FixedBytes32(*c)).collect();
    encode_call(selectors::UPDATE_WHITELIST, &[Token::Array(items)])
}

/// `enableModule(module)`
pub fn enable_module(module: &Address) -> Vec<u8> {
    encode_call(selectors::ENABLE_MODULE, &[Token::Address(*module)])
}

/// `disableModule(prevModule, module)`
pub fn disable_module(prev_module: &Address, module: &Address) -> Vec<u8> {
    encode_call(
        selectors::DISABLE_MODULE,
        &[Token::Address(*prev_module), Token::Address(*module)],
    )
}

/// ERC-20 `transfer(to, amount)`
pub fn erc20_transfer(to: &Address, amount: Uint256) -> Vec<u8> {
    encode_call(
        selectors::ERC20_TRANSFER,
        &[Token::Address(*to), Token::Uint(amount)],
    )
}

/// ERC-721 `safeTransferFrom(from, to, tokenId)`
pub fn erc721_safe_transfer_from(from: &Address, to: &Address, token_id: Uint256) -> Vec<u8> {
    encode_call(
        selectors::ERC721_SAFE_TRANSFER_FROM,
        &[Token::Address(*from), Token::Address(*to), Token::Uint(token_id)],
    )
}

/// ERC-1155 `safeTransferFrom(from, to, id, amount, data)`
pub fn erc1155_safe_transfer_from(
    from: &Address,
    to: &Address,
    token_id: Uint256,
    amount: Uint256,
    data: &[u8],
) -> Vec<u8> {
    encode_call(
        selectors::ERC1155_SAFE_TRANSFER_FROM,
        &[
            Token::Address(*from),
            Token::Address(*to),
            Token::Uint(token_id),
            Token::Uint(amount),
            Token::Bytes(data.to_vec()),
        ],
    )
}

/// `censoSetup(guard, vault, fallbackHandler, nameHash)`
pub fn censo_setup(
    guard: &Address,
    vault: &Address,
    fallback_handler: &Address,
    name_hash: [u8; 32],
) -> Vec<u8> {
    encode_call(
        selectors::CENSO_SETUP,
        &[
            Token::Address(*guard),
            Token::Address(*vault),
            Token::Address(*fallback_handler),
            Token::FixedBytes32(name_hash),
        ],
    )
}

/// Safe `setup(owners, threshold, to, data, fallbackHandler, 0, 0, 0)`
///
/// Payment token, payment and payment receiver are always zero.
pub fn safe_setup(
    owners: &[Address],
    threshold: u64,
    to: &Address,
    data: &[u8],
    fallback_handler: &Address,
) -> Vec<u8> {
    encode_call(
        selectors::SAFE_SETUP,
        &[
            Token::Array(owners.iter().map(|o| Token::Address(*o)).collect()),
            Token::uint(threshold),
            Token::Address(*to),
            Token::Bytes(data.to_vec()),
            Token::Address(*fallback_handler),
            Token::Address(Address::ZERO),
            Token::Uint(Uint256::ZERO),
            Token::Address(Address::ZERO),
        ],
    )
}
