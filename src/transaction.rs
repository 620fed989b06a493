//! Legacy transactions: wire codec, ids, signature hashing, verification and signing

use crate::config::ProofConfig;
use crate::constants::*;
use crate::encoding::{
    encode_varint, hash256, read_hash, read_u32_le, read_u64_le, read_varint,
};
use crate::error::{Result, TxError};
use crate::op::decode_num;
use crate::resolver::TxResolver;
use crate::script::{Command, Script};
use crate::secp256k1::{hash_to_int, PrivateKey};
use crate::types::*;
use num_bigint::BigUint;
use std::collections::HashSet;
use std::fmt;
use std::io::Read;
use tracing::{debug, warn};

/// Transaction input
///
/// The output it spends is not stored inline; [`TxIn::value`] and
/// [`TxIn::script_pubkey`] look it up through a [`TxResolver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxIn {
    /// Id of the spent transaction in display byte order
    pub prev_txid: Hash,
    pub prev_index: u32,
    pub script_sig: Script,
    pub sequence: u32,
}

impl TxIn {
    pub fn new(prev_txid: Hash, prev_index: u32, script_sig: Script) -> Self {
        Self {
            prev_txid,
            prev_index,
            script_sig,
            sequence: SEQUENCE_FINAL,
        }
    }

    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let mut prev_txid = read_hash(reader)?;
        prev_txid.reverse();
        let prev_index = read_u32_le(reader)?;
        let script_sig = Script::parse(reader)?;
        let sequence = read_u32_le(reader)?;
        Ok(Self {
            prev_txid,
            prev_index,
            script_sig,
            sequence,
        })
    }

    pub fn serialize(&self) -> Vec<u8> {
        self.serialize_with_script(&self.script_sig)
    }

    fn serialize_with_script(&self, script: &Script) -> Vec<u8> {
        let mut result = Vec::new();
        result.extend(self.prev_txid.iter().rev());
        result.extend_from_slice(&self.prev_index.to_le_bytes());
        result.extend(script.serialize());
        result.extend_from_slice(&self.sequence.to_le_bytes());
        result
    }

    fn prev_output<R: TxResolver + ?Sized>(&self, resolver: &R, network: Network) -> Result<TxOut> {
        let prev = resolver.resolve(&self.prev_txid, network)?;
        prev.outputs
            .get(self.prev_index as usize)
            .cloned()
            .ok_or_else(|| {
                TxError::Resolution(format!(
                    "transaction {} has no output {}",
                    prev.id(),
                    self.prev_index
                ))
            })
    }

    /// Amount of the spent output
    pub fn value<R: TxResolver + ?Sized>(&self, resolver: &R, network: Network) -> Result<u64> {
        Ok(self.prev_output(resolver, network)?.amount)
    }

    /// Locking script of the spent output
    pub fn script_pubkey<R: TxResolver + ?Sized>(
        &self,
        resolver: &R,
        network: Network,
    ) -> Result<Script> {
        Ok(self.prev_output(resolver, network)?.script_pubkey)
    }
}

/// Transaction output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOut {
    pub amount: u64,
    pub script_pubkey: Script,
}

impl TxOut {
    pub fn new(amount: u64, script_pubkey: Script) -> Self {
        Self {
            amount,
            script_pubkey,
        }
    }

    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let amount = read_u64_le(reader)?;
        let script_pubkey = Script::parse(reader)?;
        Ok(Self {
            amount,
            script_pubkey,
        })
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut result = self.amount.to_le_bytes().to_vec();
        result.extend(self.script_pubkey.serialize());
        result
    }
}

/// A legacy (non-witness) transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tx {
    pub version: u32,
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<TxOut>,
    pub lock_time: u32,
    pub network: Network,
}

impl Tx {
    pub fn new(
        version: u32,
        inputs: Vec<TxIn>,
        outputs: Vec<TxOut>,
        lock_time: u32,
        network: Network,
    ) -> Self {
        Self {
            version,
            inputs,
            outputs,
            lock_time,
            network,
        }
    }

    pub fn parse<R: Read>(reader: &mut R, network: Network) -> Result<Self> {
        let version = read_u32_le(reader)?;
        let num_inputs = read_varint(reader)?;
        let mut inputs = Vec::new();
        for _ in 0..num_inputs {
            inputs.push(TxIn::parse(reader)?);
        }
        let num_outputs = read_varint(reader)?;
        let mut outputs = Vec::new();
        for _ in 0..num_outputs {
            outputs.push(TxOut::parse(reader)?);
        }
        let lock_time = read_u32_le(reader)?;
        Ok(Self {
            version,
            inputs,
            outputs,
            lock_time,
            network,
        })
    }

    /// Parse a complete hex-encoded transaction; trailing bytes are rejected
    pub fn from_hex(raw: &str, network: Network) -> Result<Self> {
        let bytes = hex::decode(raw.trim())
            .map_err(|e| TxError::MalformedEncoding(format!("transaction hex: {}", e)))?;
        let mut cursor = bytes.as_slice();
        let tx = Self::parse(&mut cursor, network)?;
        if !cursor.is_empty() {
            return Err(TxError::MalformedEncoding(format!(
                "{} trailing bytes after transaction",
                cursor.len()
            )));
        }
        Ok(tx)
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut result = self.version.to_le_bytes().to_vec();
        result.extend(encode_varint(self.inputs.len() as u64));
        for input in &self.inputs {
            result.extend(input.serialize());
        }
        result.extend(encode_varint(self.outputs.len() as u64));
        for output in &self.outputs {
            result.extend(output.serialize());
        }
        result.extend_from_slice(&self.lock_time.to_le_bytes());
        result
    }

    /// hash256 of the serialization in display (reversed) byte order
    pub fn hash(&self) -> Hash {
        let mut hash = hash256(&self.serialize());
        hash.reverse();
        hash
    }

    /// Hex transaction id
    pub fn id(&self) -> String {
        hex::encode(self.hash())
    }

    /// A single input spending the null outpoint
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1
            && self.inputs[0].prev_txid == [0u8; 32]
            && self.inputs[0].prev_index == 0xffffffff
    }

    /// Block height committed in a coinbase's first push (BIP34)
    pub fn coinbase_height(&self) -> Option<u32> {
        if !self.is_coinbase() {
            return None;
        }
        match self.inputs[0].script_sig.cmds().first() {
            Some(Command::Data(data)) if data.len() <= MAX_SCRIPT_NUM_SIZE => {
                u32::try_from(decode_num(data)).ok()
            }
            _ => None,
        }
    }

    /// Input value minus output value; negative when outputs overspend
    pub fn fee<R: TxResolver + ?Sized>(&self, resolver: &R) -> Result<i64> {
        let mut input_sum: u128 = 0;
        for input in &self.inputs {
            input_sum += input.value(resolver, self.network)? as u128;
        }
        let output_sum: u128 = self.outputs.iter().map(|o| o.amount as u128).sum();
        i64::try_from(input_sum as i128 - output_sum as i128)
            .map_err(|_| TxError::Range(format!("fee of transaction {} overflows", self.id())))
    }

    fn input(&self, input_index: usize) -> Result<&TxIn> {
        self.inputs.get(input_index).ok_or_else(|| {
            TxError::Range(format!(
                "input {} out of range for {} inputs",
                input_index,
                self.inputs.len()
            ))
        })
    }

    /// Signature hash of one input under SIGHASH_ALL
    pub fn sig_hash<R: TxResolver + ?Sized>(
        &self,
        input_index: usize,
        resolver: &R,
    ) -> Result<BigUint> {
        let script_pubkey = self.input(input_index)?.script_pubkey(resolver, self.network)?;
        self.sig_hash_with_script(input_index, &script_pubkey)
    }

    /// Signature hash with `script_code` standing in for the spent locking
    /// script, as done for a P2SH redeem script
    pub fn sig_hash_with_script(
        &self,
        input_index: usize,
        script_code: &Script,
    ) -> Result<BigUint> {
        self.input(input_index)?;
        let empty = Script::empty();
        let mut modified = self.version.to_le_bytes().to_vec();
        modified.extend(encode_varint(self.inputs.len() as u64));
        for (i, input) in self.inputs.iter().enumerate() {
            let script = if i == input_index { script_code } else { &empty };
            modified.extend(input.serialize_with_script(script));
        }
        modified.extend(encode_varint(self.outputs.len() as u64));
        for output in &self.outputs {
            modified.extend(output.serialize());
        }
        modified.extend_from_slice(&self.lock_time.to_le_bytes());
        modified.extend_from_slice(&SIGHASH_ALL.to_le_bytes());
        Ok(hash_to_int(&hash256(&modified)))
    }

    /// Verify one input under [`ProofConfig::default`]
    ///
    /// The default enforces low-s, so an otherwise valid high-s signature
    /// (common before BIP62) verifies as `false`. Use
    /// [`Tx::verify_input_with`] with `enforce_low_s: false` to accept it.
    pub fn verify_input<R: TxResolver + ?Sized>(
        &self,
        input_index: usize,
        resolver: &R,
    ) -> Result<bool> {
        self.verify_input_with(input_index, resolver, &ProofConfig::default())
    }

    /// Run the unlocking script followed by the spent locking script
    ///
    /// Script failure is `Ok(false)`; resolution failure is an error.
    pub fn verify_input_with<R: TxResolver + ?Sized>(
        &self,
        input_index: usize,
        resolver: &R,
        config: &ProofConfig,
    ) -> Result<bool> {
        let input = self.input(input_index)?;
        let script_pubkey = input.script_pubkey(resolver, self.network)?;

        let z = if script_pubkey.is_p2sh() {
            let Some(raw) = input.script_sig.cmds().last().and_then(Command::data) else {
                debug!(txid = %self.id(), input = input_index, "p2sh input without redeem script");
                return Ok(false);
            };
            match Script::parse_raw(raw) {
                Ok(redeem) => self.sig_hash_with_script(input_index, &redeem)?,
                Err(e) => {
                    debug!(
                        txid = %self.id(),
                        input = input_index,
                        error = %e,
                        "malformed redeem script"
                    );
                    return Ok(false);
                }
            }
        } else {
            self.sig_hash_with_script(input_index, &script_pubkey)?
        };

        let combined = input.script_sig.combine(&script_pubkey);
        let valid = combined.evaluate_with(&z, &config.limits, config.enforce_low_s);
        if !valid {
            debug!(txid = %self.id(), input = input_index, "input failed verification");
        }
        Ok(valid)
    }

    /// Verify the whole transaction under [`ProofConfig::default`]
    ///
    /// The default enforces low-s, so inputs carrying otherwise valid
    /// high-s signatures (common before BIP62) make this `false`. Use
    /// [`Tx::verify_with`] with `enforce_low_s: false` to accept them.
    pub fn verify<R: TxResolver + ?Sized>(&self, resolver: &R) -> Result<bool> {
        self.verify_with(resolver, &ProofConfig::default())
    }

    /// Fee check, then every input in order, stopping at the first failure
    pub fn verify_with<R: TxResolver + ?Sized>(
        &self,
        resolver: &R,
        config: &ProofConfig,
    ) -> Result<bool> {
        let fee = self.fee(resolver)?;
        if fee < 0 {
            warn!(txid = %self.id(), fee, "outputs exceed inputs");
            return Ok(false);
        }
        for input_index in 0..self.inputs.len() {
            if !self.verify_input_with(input_index, resolver, config)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Sign a P2PKH input with `key` and re-verify it
    ///
    /// The unlocking script becomes `<DER signature + SIGHASH_ALL> <compressed SEC>`.
    /// Any other kind of spent output is a `Signing` error.
    pub fn sign_input<R: TxResolver + ?Sized>(
        &mut self,
        input_index: usize,
        key: &PrivateKey,
        resolver: &R,
    ) -> Result<bool> {
        let script_pubkey = self.input(input_index)?.script_pubkey(resolver, self.network)?;
        if !script_pubkey.is_p2pkh() {
            return Err(TxError::Signing(format!(
                "input {} spends a non-p2pkh output: {}",
                input_index, script_pubkey
            )));
        }
        let z = self.sig_hash_with_script(input_index, &script_pubkey)?;
        let mut sig = key.sign(&z)?.der();
        sig.push(SIGHASH_ALL as u8);
        let sec = key.point().sec(true);
        self.inputs[input_index].script_sig =
            Script::new(vec![Command::Data(sig), Command::Data(sec)])?;

        let valid = self.verify_input(input_index, resolver)?;
        if !valid {
            warn!(txid = %self.id(), input = input_index, "signed input failed verification");
        }
        Ok(valid)
    }
}

impl fmt::Display for Tx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "tx: {}", self.id())?;
        writeln!(f, "version: {}", self.version)?;
        writeln!(f, "inputs:")?;
        for input in &self.inputs {
            writeln!(
                f,
                "  {}:{} {}",
                hex::encode(input.prev_txid),
                input.prev_index,
                input.script_sig
            )?;
        }
        writeln!(f, "outputs:")?;
        for output in &self.outputs {
            writeln!(f, "  {} {}", output.amount, output.script_pubkey)?;
        }
        write!(f, "locktime: {}", self.lock_time)
    }
}

/// Structural checks that need no previous outputs
pub fn check_transaction(tx: &Tx) -> Result<ValidationResult> {
    if tx.inputs.is_empty() || tx.outputs.is_empty() {
        return Ok(ValidationResult::Invalid("Empty inputs or outputs".to_string()));
    }

    let mut total: u64 = 0;
    for (i, output) in tx.outputs.iter().enumerate() {
        if output.amount > MAX_MONEY {
            return Ok(ValidationResult::Invalid(format!(
                "Invalid output value {} at index {}",
                output.amount, i
            )));
        }
        total += output.amount;
        if total > MAX_MONEY {
            return Ok(ValidationResult::Invalid(format!("Total output value {} too large", total)));
        }
    }

    let size = tx.serialize().len();
    if size > MAX_TX_SIZE {
        return Ok(ValidationResult::Invalid(format!("Transaction too large: {} bytes", size)));
    }

    let mut seen = HashSet::new();
    for input in &tx.inputs {
        if !seen.insert((input.prev_txid, input.prev_index)) {
            return Ok(ValidationResult::Invalid(format!(
                "Duplicate input {}:{}",
                hex::encode(input.prev_txid),
                input.prev_index
            )));
        }
    }

    if tx.is_coinbase() {
        let len = tx.inputs[0].script_sig.raw_serialize().len();
        if !(2..=100).contains(&len) {
            return Ok(ValidationResult::Invalid(format!("Coinbase script size {}", len)));
        }
    } else if tx.inputs.iter().any(|input| input.prev_txid == [0u8; 32]) {
        return Ok(ValidationResult::Invalid("Null previous output".to_string()));
    }

    Ok(ValidationResult::Valid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::MemoryResolver;
    use crate::script::p2pkh_script;

    const RAW_TX: &str = "0100000001813f79011acb80925dfe69b3def355fe914bd1d96a3f5f71bf8303c6a989c7d1000000006b483045022100ed81ff192e75a3fd2304004dcadb746fa5e24c5031ccfcf21320b0277457c98f02207a986d955c6e0cb35d446a89d3f56100f4d7f67801c31967743a9c8e10615bed01210349fc4e631e3624a545de3f89f5d8684c7b8138bd94bdd531d2e213bf016b278afeffffff02a135ef01000000001976a914bc3b654dca7e56b04dca18f2566cdaf02e8d9ada88ac99c39800000000001976a9141c4bc762dd5423e332166702cb75f40df79fea1288ac19430600";

    /// Answers every lookup with the same transaction
    struct FixedResolver(Tx);

    impl TxResolver for FixedResolver {
        fn resolve(&self, _txid: &Hash, _network: Network) -> Result<Tx> {
            Ok(self.0.clone())
        }
    }

    fn prev_for_raw_tx(amount: u64) -> Tx {
        let h160 = hex::decode("a802fc56c704ce87c42d7c92eb75e7896bdc41ae").unwrap();
        let output = TxOut::new(amount, p2pkh_script(&h160.try_into().unwrap()));
        Tx::new(1, vec![], vec![output], 0, Network::Mainnet)
    }

    #[test]
    fn test_parse_fields() {
        let tx = Tx::from_hex(RAW_TX, Network::Mainnet).unwrap();
        assert_eq!(tx.version, 1);
        assert_eq!(tx.inputs.len(), 1);
        assert_eq!(
            hex::encode(tx.inputs[0].prev_txid),
            "d1c789a9c60383bf715f3f6ad9d14b91fe55f3deb369fe5d9280cb1a01793f81"
        );
        assert_eq!(tx.inputs[0].prev_index, 0);
        assert_eq!(tx.inputs[0].sequence, 0xfffffffe);
        assert_eq!(tx.outputs.len(), 2);
        assert_eq!(tx.outputs[0].amount, 32454049);
        assert_eq!(tx.outputs[1].amount, 10011545);
        assert!(tx.outputs[1].script_pubkey.is_p2pkh());
        assert_eq!(tx.lock_time, 410393);
    }

    #[test]
    fn test_serialize_round_trip() {
        let tx = Tx::from_hex(RAW_TX, Network::Mainnet).unwrap();
        assert_eq!(hex::encode(tx.serialize()), RAW_TX);
        assert_eq!(Tx::from_hex(&hex::encode(tx.serialize()), Network::Mainnet).unwrap(), tx);
    }

    #[test]
    fn test_non_minimal_push_keeps_wire_bytes() {
        let prev = "11".repeat(32);
        let outputs = "01e80300000000000000";
        let raw = format!("0100000001{prev}00000000054c03aabbccffffffff{outputs}00000000");
        let tx = Tx::from_hex(&raw, Network::Testnet).unwrap();
        assert_eq!(hex::encode(tx.serialize()), raw);

        let mut expected_id = hash256(&hex::decode(&raw).unwrap());
        expected_id.reverse();
        assert_eq!(tx.hash(), expected_id);

        // the spent locking script's encoding is hashed as written
        let lock = Script::parse_raw(&hex::decode("4d0300aabbcc87").unwrap()).unwrap();
        let preimage = format!(
            "0100000001{prev}00000000074d0300aabbcc87ffffffff{outputs}0000000001000000"
        );
        assert_eq!(
            tx.sig_hash_with_script(0, &lock).unwrap(),
            hash_to_int(&hash256(&hex::decode(preimage).unwrap()))
        );
    }

    #[test]
    fn test_id() {
        let tx = Tx::from_hex(RAW_TX, Network::Mainnet).unwrap();
        assert_eq!(tx.id(), "452c629d67e41baec3ac6f04fe744b4b9617f8f859c63b3002f8684e7a4fee03");
    }

    #[test]
    fn test_truncated_and_trailing() {
        let half = &RAW_TX[..RAW_TX.len() / 2];
        assert!(matches!(
            Tx::from_hex(half, Network::Mainnet),
            Err(TxError::MalformedEncoding(_))
        ));
        let padded = format!("{}00", RAW_TX);
        assert!(Tx::from_hex(&padded, Network::Mainnet).is_err());
    }

    #[test]
    fn test_sig_hash() {
        let tx = Tx::from_hex(RAW_TX, Network::Mainnet).unwrap();
        let resolver = FixedResolver(prev_for_raw_tx(50_000_000));
        let z = tx.sig_hash(0, &resolver).unwrap();
        assert_eq!(
            format!("{:x}", z),
            "27e0c5994dec7824e56dec6b2fcb342eb7cdb0d0957c2fce9882f715e85d81a6"
        );
    }

    #[test]
    fn test_verify_real_input() {
        let tx = Tx::from_hex(RAW_TX, Network::Mainnet).unwrap();
        let resolver = FixedResolver(prev_for_raw_tx(50_000_000));
        assert!(tx.verify_input(0, &resolver).unwrap());
        assert!(tx.verify(&resolver).unwrap());
        assert_eq!(tx.fee(&resolver).unwrap(), 50_000_000 - 32454049 - 10011545);
    }

    #[test]
    fn test_verify_fails_on_tampered_output() {
        let mut tx = Tx::from_hex(RAW_TX, Network::Mainnet).unwrap();
        tx.outputs[0].amount -= 1;
        let resolver = FixedResolver(prev_for_raw_tx(50_000_000));
        assert!(!tx.verify_input(0, &resolver).unwrap());
    }

    #[test]
    fn test_fee_invariant() {
        let tx = Tx::from_hex(RAW_TX, Network::Mainnet).unwrap();
        // valid signature, but outputs exceed the spent amount
        let resolver = FixedResolver(prev_for_raw_tx(1_000));
        assert!(tx.verify_input(0, &resolver).unwrap());
        assert!(tx.fee(&resolver).unwrap() < 0);
        assert!(!tx.verify(&resolver).unwrap());
    }

    #[test]
    fn test_resolution_error_propagates() {
        let tx = Tx::from_hex(RAW_TX, Network::Mainnet).unwrap();
        let empty = MemoryResolver::new();
        assert!(matches!(tx.verify(&empty), Err(TxError::Resolution(_))));
        assert!(matches!(tx.verify_input(0, &empty), Err(TxError::Resolution(_))));

        // referenced output index past the end
        let mut tx = tx;
        tx.inputs[0].prev_index = 5;
        let resolver = FixedResolver(prev_for_raw_tx(50_000_000));
        assert!(matches!(tx.sig_hash(0, &resolver), Err(TxError::Resolution(_))));
    }

    #[test]
    fn test_input_index_out_of_range() {
        let tx = Tx::from_hex(RAW_TX, Network::Mainnet).unwrap();
        let resolver = FixedResolver(prev_for_raw_tx(50_000_000));
        assert!(matches!(tx.sig_hash(3, &resolver), Err(TxError::Range(_))));
    }

    #[test]
    fn test_sign_input() {
        let key = PrivateKey::new(BigUint::from(8_675_309u32)).unwrap();
        let h160 = key.point().hash160(true);
        let prev = Tx::new(
            1,
            vec![TxIn::new([0x11; 32], 0, Script::empty())],
            vec![TxOut::new(10_000, p2pkh_script(&h160))],
            0,
            Network::Testnet,
        );
        let resolver: MemoryResolver = [prev.clone()].into_iter().collect();

        let mut tx = Tx::new(
            1,
            vec![TxIn::new(prev.hash(), 0, Script::empty())],
            vec![TxOut::new(9_000, p2pkh_script(&[0x22; 20]))],
            0,
            Network::Testnet,
        );
        assert!(tx.sign_input(0, &key, &resolver).unwrap());
        assert_eq!(tx.inputs[0].script_sig.cmds().len(), 2);
        assert!(tx.verify(&resolver).unwrap());

        // a different key produces a script that fails
        let other = PrivateKey::new(BigUint::from(12345u32)).unwrap();
        let mut forged = tx.clone();
        assert!(!forged.sign_input(0, &other, &resolver).unwrap());
    }

    #[test]
    fn test_sign_non_p2pkh_rejected() {
        let key = PrivateKey::new(BigUint::from(8_675_309u32)).unwrap();
        let prev = Tx::new(
            1,
            vec![TxIn::new([0x11; 32], 0, Script::empty())],
            vec![TxOut::new(10_000, crate::script::p2sh_script(&[0x33; 20]))],
            0,
            Network::Testnet,
        );
        let resolver: MemoryResolver = [prev.clone()].into_iter().collect();
        let mut tx = Tx::new(
            1,
            vec![TxIn::new(prev.hash(), 0, Script::empty())],
            vec![TxOut::new(9_000, p2pkh_script(&[0x22; 20]))],
            0,
            Network::Testnet,
        );
        assert!(matches!(
            tx.sign_input(0, &key, &resolver),
            Err(TxError::Signing(_))
        ));
        assert!(tx.inputs[0].script_sig.is_empty());
    }

    #[test]
    fn test_coinbase() {
        // push of 0x069c06 = 433158 in little-endian script number form
        let script_sig = Script::new(vec![
            Command::Data(vec![0x06, 0x9c, 0x06]),
            Command::Data(vec![0xaa; 8]),
        ])
        .unwrap();
        let coinbase = Tx::new(
            1,
            vec![TxIn {
                prev_txid: [0u8; 32],
                prev_index: 0xffffffff,
                script_sig,
                sequence: SEQUENCE_FINAL,
            }],
            vec![TxOut::new(1_250_000_000, p2pkh_script(&[1; 20]))],
            0,
            Network::Mainnet,
        );
        assert!(coinbase.is_coinbase());
        assert_eq!(coinbase.coinbase_height(), Some(433158));
        assert_eq!(check_transaction(&coinbase).unwrap(), ValidationResult::Valid);

        let tx = Tx::from_hex(RAW_TX, Network::Mainnet).unwrap();
        assert!(!tx.is_coinbase());
        assert_eq!(tx.coinbase_height(), None);
    }

    #[test]
    fn test_check_transaction() {
        let tx = Tx::from_hex(RAW_TX, Network::Mainnet).unwrap();
        assert_eq!(check_transaction(&tx).unwrap(), ValidationResult::Valid);

        let mut empty = tx.clone();
        empty.outputs.clear();
        assert!(matches!(check_transaction(&empty).unwrap(), ValidationResult::Invalid(_)));

        let mut rich = tx.clone();
        rich.outputs[0].amount = MAX_MONEY + 1;
        assert!(matches!(check_transaction(&rich).unwrap(), ValidationResult::Invalid(_)));

        let mut duplicate = tx.clone();
        duplicate.inputs.push(tx.inputs[0].clone());
        assert!(matches!(check_transaction(&duplicate).unwrap(), ValidationResult::Invalid(_)));
    }
}
