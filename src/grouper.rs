//! Partitioning of chain-tagged items into per-chain groups
//!
//! Groups are ordered so the wallet's active chain comes first and the rest follow by
//! ascending chain id, which keeps network-switch prompts to a minimum.

use alloy::primitives::ChainId;
use std::collections::BTreeMap;

/// Anything that must be written on a specific chain
pub trait ChainScoped {
    fn chain_id(&self) -> ChainId;
}

/// Items of one chain, in their original relative order
#[derive(Debug, Clone, PartialEq)]
pub struct ChainGroup<T> {
    pub chain_id: ChainId,
    pub items: Vec<T>,
    /// Whether this chain is the wallet's active chain
    pub is_current_chain: bool,
}

/// Group items by chain
///
/// Grouping is stable. An empty input gives an empty output.
pub fn group_by_chain<T: ChainScoped>(
    items: impl IntoIterator<Item = T>,
    active_chain: Option<ChainId>,
) -> Vec<ChainGroup<T>> {
    let mut by_chain: BTreeMap<ChainId, Vec<T>> = BTreeMap::new();
    for item in items {
        by_chain.entry(item.chain_id()).or_default().push(item);
    }

    let mut groups: Vec<ChainGroup<T>> = by_chain
        .into_iter()
        .map(|(chain_id, items)| ChainGroup {
            chain_id,
            items,
            is_current_chain: Some(chain_id) == active_chain,
        })
        .collect();

    // BTreeMap iteration already gives ascending ids; only the active group moves.
    if let Some(pos) = groups.iter().position(|g| g.is_current_chain) {
        let current = groups.remove(pos);
        groups.insert(0, current);
    }

    groups
}
