//! Remote router mesh construction.

use crate::{ChainMap, RemoteRouter, RemoteRouters};

/// Remote routers `chain` must enroll: every other deployed chain, in address order.
pub fn remote_routers_for(chain: &str, addresses: &ChainMap<String>) -> RemoteRouters {
    addresses
        .iter()
        .filter(|(other, _)| other.as_str() != chain)
        .map(|(other, address)| {
            (
                other.clone(),
                RemoteRouter {
                    address: address.clone(),
                },
            )
        })
        .collect::<ChainMap<_>>()
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addresses(chains: &[(&str, &str)]) -> ChainMap<String> {
        chains
            .iter()
            .map(|(chain, address)| (chain.to_string(), address.to_string()))
            .collect()
    }

    #[test]
    fn test_mesh_excludes_self() {
        let addresses = addresses(&[("alpha", "0xAAA"), ("beta", "0xBBB"), ("gamma", "0xCCC")]);

        let routers = remote_routers_for("alpha", &addresses);
        assert_eq!(routers.len(), 2);
        assert!(!routers.contains_key("alpha"));
        assert_eq!(routers["beta"].address, "0xBBB");
        assert_eq!(routers["gamma"].address, "0xCCC");
    }

    #[test]
    fn test_mesh_is_complete_for_every_chain() {
        let chains: Vec<(String, String)> = (0..6)
            .map(|i| (format!("chain-{i}"), format!("0x{i:040x}")))
            .collect();
        let addresses: ChainMap<String> = chains.into_iter().collect();

        for chain in addresses.keys() {
            let routers = remote_routers_for(chain, &addresses);
            assert_eq!(routers.len(), addresses.len() - 1);
            assert!(!routers.contains_key(chain));
            for (other, router) in routers.iter() {
                assert_eq!(&router.address, &addresses[other]);
            }
        }
    }

    #[test]
    fn test_single_chain_has_no_remote_routers() {
        let addresses = addresses(&[("alpha", "0xAAA")]);
        assert!(remote_routers_for("alpha", &addresses).is_empty());
    }
}
