//! Progress logging and status tables.

use comfy_table::{Table, presets::UTF8_FULL};
use tokio::task::JoinHandle;
use warpcake_deploy::{ChainMap, ChainRegistry, DeploymentSnapshot, StatusTracker, WarpRouteConfig};

/// Log every chain status change until the returned task is aborted.
pub fn spawn_progress(tracker: &StatusTracker) -> JoinHandle<()> {
    let mut rx = tracker.subscribe();

    tokio::spawn(async move {
        let mut last = DeploymentSnapshot::default();

        while rx.changed().await.is_ok() {
            let snapshot = rx.borrow_and_update().clone();

            for (chain, entry) in &snapshot.statuses {
                if last.status(chain) == Some(entry.status) {
                    continue;
                }

                match &entry.error {
                    Some(error) => tracing::warn!(
                        chain = %chain,
                        status = entry.status.label(),
                        error = %error,
                        "Chain status changed"
                    ),
                    None => tracing::info!(
                        chain = %chain,
                        status = entry.status.label(),
                        "Chain status changed"
                    ),
                }
            }

            last = snapshot;
        }
    })
}

/// Final status of every tracked chain.
pub fn status_table(snapshot: &DeploymentSnapshot) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Chain", "Status", "Address", "Details"]);

    for (chain, entry) in &snapshot.statuses {
        let address = snapshot
            .deployed_addresses
            .get(chain)
            .cloned()
            .unwrap_or_else(|| "-".to_string());
        let details = match &entry.error {
            Some(error) => error.clone(),
            None => entry.tx_hashes.join(", "),
        };

        table.add_row(vec![
            chain.clone(),
            entry.status.label().to_string(),
            address,
            details,
        ]);
    }

    table
}

/// Routes of a plan with the metadata of their chain.
pub fn routes_table(routes: &ChainMap<WarpRouteConfig>, chains: &ChainRegistry) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Chain", "Protocol", "Domain", "Token", "Owner"]);

    for (chain, config) in routes {
        let (protocol, domain) = match chains.try_get(chain) {
            Some(metadata) => (metadata.protocol.to_string(), metadata.domain_id.to_string()),
            None => ("unknown".to_string(), "-".to_string()),
        };

        table.add_row(vec![
            chain.clone(),
            protocol,
            domain,
            config.token.kind().to_string(),
            config.owner.clone(),
        ]);
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use warpcake_deploy::{ChainStatus, DeploymentStatus};

    #[test]
    fn test_status_table_shows_errors_and_addresses() {
        let snapshot = DeploymentSnapshot::new(
            ChainMap::from([
                (
                    "alpha".to_string(),
                    ChainStatus {
                        status: DeploymentStatus::Complete,
                        error: None,
                        tx_hashes: vec!["0xtx".to_string()],
                    },
                ),
                (
                    "beta".to_string(),
                    ChainStatus {
                        status: DeploymentStatus::Failed,
                        error: Some("insufficient gas".to_string()),
                        tx_hashes: vec![],
                    },
                ),
            ]),
            ChainMap::from([("alpha".to_string(), "0xAAA".to_string())]),
        );

        let rendered = status_table(&snapshot).to_string();
        assert!(rendered.contains("alpha"));
        assert!(rendered.contains("0xAAA"));
        assert!(rendered.contains("0xtx"));
        assert!(rendered.contains("Complete"));
        assert!(rendered.contains("insufficient gas"));
    }
}
