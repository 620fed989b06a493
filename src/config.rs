//! Verification configuration

use crate::constants::*;
use crate::error::{Result, TxError};
use crate::types::Network;
use serde::{Deserialize, Serialize};

/// Bounds applied to a single script evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionLimits {
    pub max_stack_size: usize,
    pub max_ops: usize,
    pub max_script_size: usize,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            max_stack_size: MAX_STACK_SIZE,
            max_ops: MAX_SCRIPT_OPS,
            max_script_size: MAX_SCRIPT_SIZE,
        }
    }
}

/// Top-level configuration for [`crate::TxProof`]
///
/// ```
/// use tx_proof::config::ProofConfig;
/// use tx_proof::Network;
///
/// let config = ProofConfig::from_json_str(r#"{"network": "mainnet"}"#).unwrap();
/// assert_eq!(config.network, Network::Mainnet);
/// assert!(config.enforce_low_s);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProofConfig {
    /// Network used when parsing transactions and deriving addresses
    pub network: Network,
    /// Reject signatures whose `s` is above N/2
    pub enforce_low_s: bool,
    pub limits: ExecutionLimits,
}

impl Default for ProofConfig {
    fn default() -> Self {
        Self {
            network: Network::Testnet,
            enforce_low_s: true,
            limits: ExecutionLimits::default(),
        }
    }
}

impl ProofConfig {
    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| TxError::Serialization(e.to_string()))
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| TxError::Serialization(e.to_string()))
    }
}
