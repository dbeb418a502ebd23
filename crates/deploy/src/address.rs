//! Address helpers.

use alloy_core::primitives::Address;

/// Whether `value` looks like an EVM address (`0x` followed by 40 hex digits).
pub fn is_evm_address(value: &str) -> bool {
    value.len() == 42
        && value.starts_with("0x")
        && value[2..].chars().all(|c| c.is_ascii_hexdigit())
}

/// EIP-55 checksum an EVM-shaped address, returning other addresses unchanged.
pub fn normalize_address(value: &str) -> String {
    if !is_evm_address(value) {
        return value.to_string();
    }

    match value.parse::<Address>() {
        Ok(address) => address.to_checksum(None),
        Err(err) => {
            tracing::warn!(address = value, error = %err, "Failed to checksum address");
            value.to_string()
        }
    }
}

/// Derive a checksummed address from the first 20 bytes of a digest.
pub(crate) fn address_from_digest(digest: &[u8]) -> String {
    Address::from_slice(&digest[..20]).to_checksum(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_known_vector() {
        assert_eq!(
            normalize_address("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"),
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        );
    }

    #[test]
    fn test_non_evm_addresses_pass_through() {
        assert_eq!(normalize_address("cosmos1abcdef"), "cosmos1abcdef");
        assert_eq!(normalize_address("0x1234"), "0x1234");
        assert!(!is_evm_address("0xZZaeb6053f3e94c9b9a09f33669435e7ef1beaed"));
    }
}
