//! Curve parameters and protocol constants

/// Field prime p = 2^256 - 2^32 - 977, big-endian hex
pub const SECP256K1_P_HEX: &str =
    "fffffffffffffffffffffffffffffffffffffffffffffffffffffffefffffc2f";

/// Group order N, big-endian hex
pub const SECP256K1_N_HEX: &str =
    "fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141";

/// Generator x-coordinate
pub const SECP256K1_GX_HEX: &str =
    "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

/// Generator y-coordinate
pub const SECP256K1_GY_HEX: &str =
    "483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8";

/// Curve coefficient a
pub const SECP256K1_A: u64 = 0;

/// Curve coefficient b
pub const SECP256K1_B: u64 = 7;

/// Signature hash type: commit to all inputs and outputs
pub const SIGHASH_ALL: u32 = 1;

/// Sequence number for final transaction input
pub const SEQUENCE_FINAL: u32 = 0xffffffff;

/// Maximum money supply: 21,000,000 BTC in satoshis
pub const MAX_MONEY: u64 = 21_000_000 * 100_000_000;

/// Maximum transaction size: 1MB
pub const MAX_TX_SIZE: usize = 1_000_000;

/// Maximum script length
pub const MAX_SCRIPT_SIZE: usize = 10_000;

/// Maximum stack size during script execution
pub const MAX_STACK_SIZE: usize = 1000;

/// Maximum number of non-push operations in script
pub const MAX_SCRIPT_OPS: usize = 201;

/// Largest data push the wire format can express (OP_PUSHDATA2)
pub const MAX_PUSH_SIZE: usize = 0xffff;

/// Maximum size of a script number operand
pub const MAX_SCRIPT_NUM_SIZE: usize = 4;

/// Maximum number of public keys in a multisig check
pub const MAX_MULTISIG_KEYS: usize = 20;
