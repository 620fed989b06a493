//! # tx-proof
//!
//! Arithmetic, signatures and script evaluation needed to build, sign and
//! verify legacy Bitcoin transactions.
//!
//! ## Architecture
//!
//! The crate is layered leaf-first:
//! - [`field`]: prime field arithmetic behind the [`field::PrimeField`] trait
//! - [`curve`]: Weierstrass group law generic over any prime field
//! - [`secp256k1`]: curve constants, ECDSA, SEC/DER encodings, keys
//! - [`op`] and [`script`]: opcode table and the stack machine
//! - [`transaction`]: wire codec, signature hashing, per-input verification
//! - [`resolver`]: lookup of spent transactions, with an optional cache
//!
//! ## Design Principles
//!
//! 1. **Values, not state**: field elements, points and signatures are immutable
//! 2. **Failure is a value**: an invalid script or signature is `Ok(false)`;
//!    malformed data and failed lookups are errors
//! 3. **Explicit collaborators**: previous transactions come from a caller-owned
//!    [`resolver::TxResolver`]; the crate holds no global caches
//!
//! ## Usage
//!
//! ```rust
//! use tx_proof::script::{Command, Script};
//! use tx_proof::TxProof;
//! use num_bigint::BigUint;
//!
//! let proof = TxProof::new();
//! let unlock = Script::new(vec![Command::Data(vec![2])]).unwrap();
//! let lock = Script::new(vec![Command::Data(vec![2]), Command::Op(0x87)]).unwrap();
//! assert!(proof.verify_script(&unlock, &lock, &BigUint::from(0u32)));
//! ```

pub mod config;
pub mod constants;
pub mod curve;
pub mod encoding;
pub mod error;
pub mod field;
pub mod op;
pub mod resolver;
pub mod script;
pub mod secp256k1;
pub mod transaction;
pub mod types;

// Re-export commonly used types
pub use config::{ExecutionLimits, ProofConfig};
pub use constants::*;
pub use error::{Result, TxError};
pub use resolver::{CachingResolver, MemoryResolver, TxResolver};
pub use script::{Command, Script};
pub use secp256k1::{PrivateKey, S256Point, Signature};
pub use transaction::{Tx, TxIn, TxOut};
pub use types::*;

use num_bigint::BigUint;

/// Verification and signing under one [`ProofConfig`]
///
/// # Examples
///
/// ```
/// use tx_proof::{ProofConfig, TxProof, Network};
///
/// let proof = TxProof::with_config(ProofConfig {
///     network: Network::Mainnet,
///     ..ProofConfig::default()
/// });
/// assert_eq!(proof.config().network, Network::Mainnet);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TxProof {
    config: ProofConfig,
}

impl TxProof {
    /// Testnet, low-s enforced, default execution limits
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ProofConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProofConfig {
        &self.config
    }

    /// Parse a hex transaction on the configured network
    ///
    /// # Examples
    ///
    /// ```
    /// use tx_proof::TxProof;
    ///
    /// let proof = TxProof::new();
    /// assert!(proof.parse_transaction("not hex").is_err());
    /// ```
    pub fn parse_transaction(&self, raw: &str) -> Result<Tx> {
        Tx::from_hex(raw, self.config.network)
    }

    /// Structural checks that need no resolver
    pub fn check_transaction(&self, tx: &Tx) -> Result<ValidationResult> {
        transaction::check_transaction(tx)
    }

    /// Fee check followed by every input's scripts
    pub fn verify_transaction<R: TxResolver + ?Sized>(
        &self,
        tx: &Tx,
        resolver: &R,
    ) -> Result<bool> {
        tx.verify_with(resolver, &self.config)
    }

    pub fn verify_input<R: TxResolver + ?Sized>(
        &self,
        tx: &Tx,
        input_index: usize,
        resolver: &R,
    ) -> Result<bool> {
        tx.verify_input_with(input_index, resolver, &self.config)
    }

    /// Sign a P2PKH input; returns whether the signed input verifies
    pub fn sign_input<R: TxResolver + ?Sized>(
        &self,
        tx: &mut Tx,
        input_index: usize,
        key: &PrivateKey,
        resolver: &R,
    ) -> Result<bool> {
        tx.sign_input(input_index, key, resolver)
    }

    /// Evaluate `script_sig` followed by `script_pubkey` against the signature hash `z`
    ///
    /// # Examples
    ///
    /// ```
    /// use tx_proof::{Command, Script, TxProof};
    /// use num_bigint::BigUint;
    ///
    /// let proof = TxProof::new();
    /// // OP_RETURN always fails
    /// let lock = Script::new(vec![Command::Op(0x6a)]).unwrap();
    /// assert!(!proof.verify_script(&Script::empty(), &lock, &BigUint::from(0u32)));
    /// ```
    pub fn verify_script(&self, script_sig: &Script, script_pubkey: &Script, z: &BigUint) -> bool {
        script_sig
            .combine(script_pubkey)
            .evaluate_with(z, &self.config.limits, self.config.enforce_low_s)
    }
}
