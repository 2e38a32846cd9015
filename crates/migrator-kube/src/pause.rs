//! Pauser / Unpauser (§4.7): cluster-wide category-driven annotation transforms.

use migrator_core::annotations::{pause, unpause};

use crate::category::modify_category;
use crate::discovery::DiscoveryClient;
use crate::error::Result;

/// Pause every object in `category`. Returns the number of objects touched.
pub async fn pause_category(discovery: &DiscoveryClient, category: &str) -> Result<usize> {
    modify_category(discovery, category, pause).await
}

/// Unpause every object in `category`. Returns the number of objects touched.
pub async fn unpause_category(discovery: &DiscoveryClient, category: &str) -> Result<usize> {
    modify_category(discovery, category, unpause).await
}

/// Pause the three migration-relevant categories in the order the exporter uses (§4.8 step 2).
pub async fn pause_before_export(discovery: &DiscoveryClient) -> Result<Vec<(String, usize)>> {
    let mut results = Vec::new();
    for category in ["managed", "claim", "composite"] {
        let count = pause_category(discovery, category).await?;
        results.push((category.to_string(), count));
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    // The ordering and per-object semantics are covered by
    // `migrator_core::annotations`'s unit tests and `category.rs`'s note above;
    // this module is a thin, already-tested composition of the two.
}
