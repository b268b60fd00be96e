//! Chain ids, contract addresses and polling defaults

use alloy::primitives::{address, Address, ChainId};

/// Optimism mainnet
pub const OPTIMISM: ChainId = 10;
/// Arbitrum One
pub const ARBITRUM: ChainId = 42161;
/// Celo mainnet
pub const CELO: ChainId = 42220;
/// Polygon PoS
pub const POLYGON: ChainId = 137;
/// Base mainnet
pub const BASE: ChainId = 8453;
/// Ethereum Sepolia testnet
pub const SEPOLIA: ChainId = 11155111;
/// Optimism Sepolia testnet
pub const OPTIMISM_SEPOLIA: ChainId = 11155420;

/// EAS predeploy on OP-stack chains
pub const EAS_OP_STACK: Address = address!("4200000000000000000000000000000000000021");
pub const EAS_ARBITRUM: Address = address!("bD75f629A22Dc1ceD33dDA0b68c546A1c035c458");
pub const EAS_CELO: Address = address!("72E1d8ccf5299fb36fEfD8CC4394B8ef7e98Af92");
pub const EAS_POLYGON: Address = address!("5E634ef5355f45A855d02D66eCD687b1502AF790");
pub const EAS_SEPOLIA: Address = address!("C2679fBD37d54388Ce493F1DB75320D236e1815e");

/// Default indexer API
pub const DEFAULT_INDEXER_URL: &str = "https://gapapi.karmahq.xyz";

/// Path of the indexer's transaction listener, relative to the indexer base URL
pub const ATTESTATION_LISTENER_PATH: &str = "attestation-listener";

/// Delay between confirmation polls
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1500;

/// Confirmation polls before giving up (1000 x 1.5s is roughly 25 minutes)
pub const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 1000;

/// EAS contract address for a supported chain
pub fn eas_address(chain_id: ChainId) -> Option<Address> {
    match chain_id {
        OPTIMISM | BASE | OPTIMISM_SEPOLIA => Some(EAS_OP_STACK),
        ARBITRUM => Some(EAS_ARBITRUM),
        CELO => Some(EAS_CELO),
        POLYGON => Some(EAS_POLYGON),
        SEPOLIA => Some(EAS_SEPOLIA),
        _ => None,
    }
}

/// Human readable network name, used in logs and progress messages
pub fn chain_name(chain_id: ChainId) -> &'static str {
    match chain_id {
        OPTIMISM => "optimism",
        ARBITRUM => "arbitrum",
        CELO => "celo",
        POLYGON => "polygon",
        BASE => "base",
        SEPOLIA => "sepolia",
        OPTIMISM_SEPOLIA => "optimism-sepolia",
        _ => "unknown",
    }
}
