//! Script commands, wire codec and the execution engine
//!
//! A [`Script`] is an ordered list of [`Command`]s. Evaluation walks an index
//! over the immutable command list; conditional branches jump to targets
//! resolved once before execution starts.

use crate::config::ExecutionLimits;
use crate::constants::*;
use crate::encoding::{
    decode_base58_check, encode_base58_check, encode_varint, hash160, read_bytes, read_u16_le,
    read_u8, read_varint,
};
use crate::error::{Result, TxError};
use crate::op::{
    self, OpContext, OP_0, OP_16, OP_CHECKSIG, OP_DUP, OP_ELSE, OP_ENDIF, OP_EQUAL,
    OP_EQUALVERIFY, OP_HASH160, OP_IF, OP_NOTIF, OP_PUSHDATA1, OP_PUSHDATA2,
};
use crate::types::{ByteString, Network};
use num_bigint::BigUint;
use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use tracing::debug;

/// One element of a script: an opcode or a data push
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    Op(u8),
    /// Data written with the shortest push encoding
    Data(ByteString),
    /// Data written behind a wider `OP_PUSHDATA1`/`OP_PUSHDATA2` prefix than
    /// it needs, as found on the wire
    Push(u8, ByteString),
}

impl Command {
    /// The pushed bytes, whatever the encoding
    pub fn data(&self) -> Option<&[u8]> {
        match self {
            Command::Op(_) => None,
            Command::Data(data) | Command::Push(_, data) => Some(data),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Op(code) => match op::op_name(*code) {
                Some(name) => write!(f, "{}", name),
                None => write!(f, "OP_[{}]", code),
            },
            Command::Data(data) | Command::Push(_, data) => write!(f, "{}", hex::encode(data)),
        }
    }
}

/// Prefix byte of the shortest push of `len` bytes
fn minimal_push_prefix(len: usize) -> u8 {
    match len {
        1..=0x4b => len as u8,
        0 | 0x4c..=0xff => OP_PUSHDATA1,
        _ => OP_PUSHDATA2,
    }
}

fn push_limit(prefix: u8) -> usize {
    if prefix == OP_PUSHDATA1 {
        0xff
    } else {
        MAX_PUSH_SIZE
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct Script {
    cmds: Vec<Command>,
}

impl Script {
    /// Build a script, rejecting pushes the wire format cannot express
    ///
    /// A [`Command::Push`] whose prefix is already the shortest one becomes a
    /// plain [`Command::Data`].
    pub fn new(cmds: Vec<Command>) -> Result<Self> {
        let mut checked = Vec::with_capacity(cmds.len());
        for cmd in cmds {
            let cmd = match cmd {
                Command::Data(data) if data.len() > MAX_PUSH_SIZE => {
                    return Err(TxError::MalformedEncoding(format!(
                        "push of {} bytes exceeds {}",
                        data.len(),
                        MAX_PUSH_SIZE
                    )));
                }
                Command::Push(prefix, _) if prefix != OP_PUSHDATA1 && prefix != OP_PUSHDATA2 => {
                    return Err(TxError::MalformedEncoding(format!(
                        "push prefix {:#04x} is not OP_PUSHDATA1 or OP_PUSHDATA2",
                        prefix
                    )));
                }
                Command::Push(prefix, data) if data.len() > push_limit(prefix) => {
                    return Err(TxError::MalformedEncoding(format!(
                        "push of {} bytes does not fit prefix {:#04x}",
                        data.len(),
                        prefix
                    )));
                }
                Command::Push(prefix, data) if prefix == minimal_push_prefix(data.len()) => {
                    Command::Data(data)
                }
                cmd => cmd,
            };
            checked.push(cmd);
        }
        Ok(Self { cmds: checked })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn cmds(&self) -> &[Command] {
        &self.cmds
    }

    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    /// Parse a varint-length-prefixed script
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let length = read_varint(reader)?;
        let raw = read_bytes(reader, length as usize)?;
        Self::parse_raw(&raw)
    }

    /// Parse script bytes without a length prefix
    pub fn parse_raw(raw: &[u8]) -> Result<Self> {
        let mut cursor = raw;
        let mut cmds = Vec::new();
        while !cursor.is_empty() {
            let current = read_u8(&mut cursor)?;
            let cmd = match current {
                // 0x01-0x4b: push the next `current` bytes
                0x01..=0x4b => Command::Data(read_bytes(&mut cursor, current as usize)?),
                OP_PUSHDATA1 | OP_PUSHDATA2 => {
                    let len = if current == OP_PUSHDATA1 {
                        read_u8(&mut cursor)? as usize
                    } else {
                        read_u16_le(&mut cursor)? as usize
                    };
                    let data = read_bytes(&mut cursor, len)?;
                    // keep the wire prefix so serialization gives back the same bytes
                    if current == minimal_push_prefix(len) {
                        Command::Data(data)
                    } else {
                        Command::Push(current, data)
                    }
                }
                code => Command::Op(code),
            };
            cmds.push(cmd);
        }
        Ok(Self { cmds })
    }

    /// Script bytes without the length prefix
    pub fn raw_serialize(&self) -> Vec<u8> {
        let mut result = Vec::new();
        for cmd in &self.cmds {
            match cmd {
                Command::Op(code) => result.push(*code),
                Command::Data(data) => {
                    write_push(&mut result, minimal_push_prefix(data.len()), data)
                }
                Command::Push(prefix, data) => write_push(&mut result, *prefix, data),
            }
        }
        result
    }

    /// Varint length followed by the script bytes
    pub fn serialize(&self) -> Vec<u8> {
        let raw = self.raw_serialize();
        let mut result = encode_varint(raw.len() as u64);
        result.extend(raw);
        result
    }

    /// Commands of `self` followed by those of `other`
    pub fn combine(&self, other: &Script) -> Script {
        let mut cmds = self.cmds.clone();
        cmds.extend(other.cmds.iter().cloned());
        Script { cmds }
    }

    /// OP_DUP OP_HASH160 <20 bytes> OP_EQUALVERIFY OP_CHECKSIG
    pub fn is_p2pkh(&self) -> bool {
        matches!(
            self.cmds.as_slice(),
            [
                Command::Op(OP_DUP),
                Command::Op(OP_HASH160),
                Command::Data(h),
                Command::Op(OP_EQUALVERIFY),
                Command::Op(OP_CHECKSIG)
            ] if h.len() == 20
        )
    }

    /// OP_HASH160 <20 bytes> OP_EQUAL
    pub fn is_p2sh(&self) -> bool {
        is_p2sh_pattern(&self.cmds)
    }

    /// Locking script for a base58check address of either kind
    pub fn from_address(address: &str) -> Result<Self> {
        let decoded = decode_address(address)?;
        Ok(match decoded.kind {
            AddressKind::P2pkh => p2pkh_script(&decoded.hash),
            AddressKind::P2sh => p2sh_script(&decoded.hash),
        })
    }

    /// Address this locking script pays to, if it is a standard pattern
    pub fn address(&self, network: Network) -> Option<String> {
        let (prefix, hash) = if self.is_p2pkh() {
            (network.p2pkh_prefix(), &self.cmds[2])
        } else if self.is_p2sh() {
            (network.p2sh_prefix(), &self.cmds[1])
        } else {
            return None;
        };
        let Command::Data(hash) = hash else {
            return None;
        };
        let mut payload = vec![prefix];
        payload.extend_from_slice(hash);
        Some(encode_base58_check(&payload))
    }

    /// Evaluate with default limits and low-s enforcement
    pub fn evaluate(&self, z: &BigUint) -> bool {
        self.evaluate_with(z, &ExecutionLimits::default(), true)
    }

    /// Evaluate against the signature hash `z`
    ///
    /// Returns `false` if any operation fails, a limit is exceeded, or the
    /// final stack is empty or topped by an empty element.
    pub fn evaluate_with(
        &self,
        z: &BigUint,
        limits: &ExecutionLimits,
        enforce_low_s: bool,
    ) -> bool {
        let size = self.raw_serialize().len();
        if size > limits.max_script_size {
            debug!(size, limit = limits.max_script_size, "script too large");
            return false;
        }
        let mut machine = Machine {
            stack: Vec::new(),
            altstack: Vec::new(),
            op_count: 0,
            z,
            limits,
            enforce_low_s,
        };
        if !machine.run(&self.cmds) {
            return false;
        }
        match machine.stack.pop() {
            None => false,
            Some(top) => !top.is_empty(),
        }
    }
}

impl std::ops::Add for Script {
    type Output = Script;

    fn add(mut self, other: Script) -> Script {
        self.cmds.extend(other.cmds);
        self
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.cmds.iter().map(|cmd| cmd.to_string()).collect();
        write!(f, "{}", parts.join(" "))
    }
}

/// Prefix byte, length in the width `prefix` implies, then the data
fn write_push(out: &mut Vec<u8>, prefix: u8, data: &[u8]) {
    out.push(prefix);
    match prefix {
        OP_PUSHDATA1 => out.push(data.len() as u8),
        // bounded by MAX_PUSH_SIZE at construction
        OP_PUSHDATA2 => out.extend_from_slice(&(data.len() as u16).to_le_bytes()),
        _ => {}
    }
    out.extend_from_slice(data);
}

fn is_p2sh_pattern(cmds: &[Command]) -> bool {
    matches!(
        cmds,
        [Command::Op(OP_HASH160), Command::Data(h), Command::Op(OP_EQUAL)] if h.len() == 20
    )
}

/// Pay-to-pubkey-hash locking script
pub fn p2pkh_script(h160: &[u8; 20]) -> Script {
    Script {
        cmds: vec![
            Command::Op(OP_DUP),
            Command::Op(OP_HASH160),
            Command::Data(h160.to_vec()),
            Command::Op(OP_EQUALVERIFY),
            Command::Op(OP_CHECKSIG),
        ],
    }
}

/// Pay-to-script-hash locking script
pub fn p2sh_script(h160: &[u8; 20]) -> Script {
    Script {
        cmds: vec![
            Command::Op(OP_HASH160),
            Command::Data(h160.to_vec()),
            Command::Op(OP_EQUAL),
        ],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    P2pkh,
    P2sh,
}

/// A base58check address split into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAddress {
    pub network: Network,
    pub kind: AddressKind,
    pub hash: [u8; 20],
}

pub fn decode_address(address: &str) -> Result<DecodedAddress> {
    let payload = decode_base58_check(address)?;
    if payload.len() != 21 {
        return Err(TxError::MalformedEncoding(format!(
            "address payload is {} bytes, expected 21",
            payload.len()
        )));
    }
    let (network, kind) = match payload[0] {
        0x00 => (Network::Mainnet, AddressKind::P2pkh),
        0x05 => (Network::Mainnet, AddressKind::P2sh),
        0x6f => (Network::Testnet, AddressKind::P2pkh),
        0xc4 => (Network::Testnet, AddressKind::P2sh),
        version => {
            return Err(TxError::MalformedEncoding(format!(
                "unknown address version {:#04x}",
                version
            )))
        }
    };
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&payload[1..]);
    Ok(DecodedAddress { network, kind, hash })
}

/// Map each IF/NOTIF to its ELSE (or ENDIF) and each ELSE to its ENDIF
///
/// `None` when branches are unbalanced.
fn branch_targets(cmds: &[Command]) -> Option<HashMap<usize, usize>> {
    let mut targets = HashMap::new();
    let mut open: Vec<(usize, Option<usize>)> = Vec::new();
    for (index, cmd) in cmds.iter().enumerate() {
        match cmd {
            Command::Op(OP_IF) | Command::Op(OP_NOTIF) => open.push((index, None)),
            Command::Op(OP_ELSE) => {
                let branch = open.last_mut()?;
                if branch.1.is_some() {
                    return None;
                }
                branch.1 = Some(index);
            }
            Command::Op(OP_ENDIF) => {
                let (start, middle) = open.pop()?;
                match middle {
                    Some(else_index) => {
                        targets.insert(start, else_index);
                        targets.insert(else_index, index);
                    }
                    None => {
                        targets.insert(start, index);
                    }
                }
            }
            _ => {}
        }
    }
    open.is_empty().then_some(targets)
}

/// Interpreter state for one evaluation
struct Machine<'a> {
    stack: Vec<ByteString>,
    altstack: Vec<ByteString>,
    op_count: usize,
    z: &'a BigUint,
    limits: &'a ExecutionLimits,
    enforce_low_s: bool,
}

impl Machine<'_> {
    fn run(&mut self, cmds: &[Command]) -> bool {
        let Some(targets) = branch_targets(cmds) else {
            debug!("unbalanced conditional");
            return false;
        };

        let mut pc = 0;
        while pc < cmds.len() {
            match &cmds[pc] {
                Command::Data(data) | Command::Push(_, data) => {
                    self.stack.push(data.clone());
                    // <redeem script> OP_HASH160 <hash> OP_EQUAL
                    if pc + 4 == cmds.len() && is_p2sh_pattern(&cmds[pc + 1..]) {
                        return self.run_redeem_script(data, &cmds[pc + 2]);
                    }
                }
                Command::Op(code) => {
                    let code = *code;
                    if code > OP_16 {
                        self.op_count += 1;
                        if self.op_count > self.limits.max_ops {
                            debug!(
                                index = pc,
                                limit = self.limits.max_ops,
                                "operation limit exceeded"
                            );
                            return false;
                        }
                    }
                    match code {
                        OP_IF | OP_NOTIF => {
                            let Some(top) = self.stack.pop() else {
                                debug!(opcode = code, index = pc, "script halted");
                                return false;
                            };
                            let take = op::is_true(&top) == (code == OP_IF);
                            if !take {
                                // past the ELSE or ENDIF
                                pc = targets[&pc] + 1;
                                continue;
                            }
                        }
                        // reached only at the end of a taken branch
                        OP_ELSE => {
                            pc = targets[&pc] + 1;
                            continue;
                        }
                        OP_ENDIF => {}
                        _ => {
                            let mut ctx = OpContext {
                                altstack: &mut self.altstack,
                                z: self.z,
                                enforce_low_s: self.enforce_low_s,
                            };
                            if !op::execute(code, &mut self.stack, &mut ctx) {
                                debug!(
                                    opcode = code,
                                    name = op::op_name(code),
                                    index = pc,
                                    "script halted"
                                );
                                return false;
                            }
                        }
                    }
                }
            }
            if self.stack.len() + self.altstack.len() > self.limits.max_stack_size {
                debug!(index = pc, limit = self.limits.max_stack_size, "stack overflow");
                return false;
            }
            pc += 1;
        }
        true
    }

    /// Check the pushed redeem script against `expected` and run it
    fn run_redeem_script(&mut self, redeem: &[u8], expected: &Command) -> bool {
        let Command::Data(expected) = expected else {
            return false;
        };
        if hash160(redeem).as_slice() != expected.as_slice() {
            debug!("redeem script hash mismatch");
            return false;
        }
        // the redeem script push is consumed by the hash check
        self.stack.pop();
        match Script::parse_raw(redeem) {
            Ok(script) => self.run(&script.cmds),
            Err(e) => {
                debug!(error = %e, "malformed redeem script");
                false
            }
        }
    }
}

/// Push a small integer as its canonical opcode
pub fn small_int(n: u8) -> Command {
    match n {
        0 => Command::Op(OP_0),
        1..=16 => Command::Op(op::OP_1 + n - 1),
        _ => Command::Data(vec![n]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::*;
    use num_traits::Zero;

    fn ops(cmds: Vec<Command>) -> Script {
        Script::new(cmds).unwrap()
    }

    fn z() -> BigUint {
        BigUint::zero()
    }

    #[test]
    fn test_parse_p2pkh() {
        let raw = hex::decode("1976a914bc3b654dca7e56b04dca18f2566cdaf02e8d9ada88ac").unwrap();
        let script = Script::parse(&mut raw.as_slice()).unwrap();
        assert!(script.is_p2pkh());
        assert_eq!(script.cmds().len(), 5);
        assert_eq!(script.serialize(), raw);
        assert_eq!(
            script.to_string(),
            "OP_DUP OP_HASH160 bc3b654dca7e56b04dca18f2566cdaf02e8d9ada OP_EQUALVERIFY OP_CHECKSIG"
        );
    }

    #[test]
    fn test_parse_pushdata() {
        let data = vec![0xab; 100];
        let script = ops(vec![Command::Data(data.clone()), Command::Op(OP_DROP)]);
        let raw = script.raw_serialize();
        assert_eq!(&raw[..2], &[OP_PUSHDATA1, 100]);
        assert_eq!(Script::parse_raw(&raw).unwrap(), script);

        let data = vec![0xcd; 300];
        let script = ops(vec![Command::Data(data)]);
        let raw = script.raw_serialize();
        assert_eq!(&raw[..3], &[OP_PUSHDATA2, 0x2c, 0x01]);
        assert_eq!(Script::parse_raw(&raw).unwrap(), script);
    }

    #[test]
    fn test_non_minimal_push_serializes_unchanged() {
        for hex_script in ["054c03aabbcc", "064d0300aabbcc", "024c00", "034d0000"] {
            let raw = hex::decode(hex_script).unwrap();
            let script = Script::parse(&mut raw.as_slice()).unwrap();
            assert_eq!(script.serialize(), raw, "{}", hex_script);
        }

        let raw = hex::decode("4c03aabbcc").unwrap();
        let script = Script::parse_raw(&raw).unwrap();
        assert_eq!(script.cmds(), &[Command::Push(OP_PUSHDATA1, vec![0xaa, 0xbb, 0xcc])]);
        assert_eq!(script.cmds()[0].data(), Some(&[0xaa, 0xbb, 0xcc][..]));
        assert_eq!(script.to_string(), "aabbcc");

        // same data, different encodings, different scripts
        let direct = ops(vec![Command::Data(vec![0xaa, 0xbb, 0xcc])]);
        assert_ne!(script, direct);
        assert_eq!(direct.raw_serialize(), hex::decode("03aabbcc").unwrap());
    }

    #[test]
    fn test_non_minimal_push_executes() {
        let raw = hex::decode("4d0300aabbcc").unwrap();
        let pushed = Script::parse_raw(&raw).unwrap();
        let check = ops(vec![Command::Data(vec![0xaa, 0xbb, 0xcc]), Command::Op(OP_EQUAL)]);
        assert!(pushed.combine(&check).evaluate(&z()));
    }

    #[test]
    fn test_explicit_push_construction() {
        // a prefix that is already the shortest collapses to plain data
        let script = ops(vec![Command::Push(OP_PUSHDATA1, vec![0x11; 100])]);
        assert_eq!(script.cmds(), &[Command::Data(vec![0x11; 100])]);

        let script = ops(vec![Command::Push(OP_PUSHDATA2, vec![0x11; 2])]);
        assert_eq!(script.raw_serialize(), hex::decode("4d02001111").unwrap());
        assert_eq!(Script::parse_raw(&script.raw_serialize()).unwrap(), script);

        assert!(matches!(
            Script::new(vec![Command::Push(OP_DUP, vec![1])]),
            Err(TxError::MalformedEncoding(_))
        ));
        assert!(Script::new(vec![Command::Push(OP_PUSHDATA1, vec![0; 0x100])]).is_err());
    }

    #[test]
    fn test_parse_length_mismatch() {
        // declares 5 bytes, pushes 20
        let raw = hex::decode("0514aabbcc").unwrap();
        assert!(matches!(
            Script::parse(&mut raw.as_slice()),
            Err(TxError::MalformedEncoding(_))
        ));
        // push runs past the declared length
        let raw = hex::decode("0203aabb").unwrap();
        assert!(Script::parse(&mut raw.as_slice()).is_err());
    }

    #[test]
    fn test_oversized_push_rejected() {
        let result = Script::new(vec![Command::Data(vec![0; MAX_PUSH_SIZE + 1])]);
        assert!(matches!(result, Err(TxError::MalformedEncoding(_))));
    }

    #[test]
    fn test_evaluate_terminal_state() {
        assert!(!Script::empty().evaluate(&z()));
        assert!(!ops(vec![Command::Op(OP_0)]).evaluate(&z()));
        assert!(ops(vec![Command::Op(OP_1)]).evaluate(&z()));
        assert!(ops(vec![Command::Data(vec![0x00])]).evaluate(&z()));
    }

    #[test]
    fn test_evaluate_arithmetic() {
        // 2 3 ADD 5 EQUAL
        let script = ops(vec![
            small_int(2),
            small_int(3),
            Command::Op(OP_ADD),
            small_int(5),
            Command::Op(OP_EQUAL),
        ]);
        assert!(script.evaluate(&z()));
    }

    #[test]
    fn test_halt_on_failure() {
        let script = ops(vec![Command::Op(OP_1), Command::Op(OP_RETURN), Command::Op(OP_1)]);
        assert!(!script.evaluate(&z()));
        let script = ops(vec![Command::Op(OP_1), Command::Op(OP_CAT)]);
        assert!(!script.evaluate(&z()));
    }

    #[test]
    fn test_conditionals() {
        let branch = |cond: u8| {
            ops(vec![
                small_int(cond),
                Command::Op(OP_IF),
                small_int(7),
                Command::Op(OP_ELSE),
                small_int(9),
                Command::Op(OP_ENDIF),
                small_int(9),
                Command::Op(OP_EQUAL),
            ])
        };
        assert!(!branch(1).evaluate(&z()));
        assert!(branch(0).evaluate(&z()));

        // NOTIF without ELSE
        let script = ops(vec![
            Command::Op(OP_1),
            small_int(1),
            Command::Op(OP_NOTIF),
            Command::Op(OP_RETURN),
            Command::Op(OP_ENDIF),
        ]);
        assert!(script.evaluate(&z()));
    }

    #[test]
    fn test_nested_conditionals() {
        // 1 IF 0 IF RETURN ELSE 5 ENDIF ELSE RETURN ENDIF
        let script = ops(vec![
            small_int(1),
            Command::Op(OP_IF),
            small_int(0),
            Command::Op(OP_IF),
            Command::Op(OP_RETURN),
            Command::Op(OP_ELSE),
            small_int(5),
            Command::Op(OP_ENDIF),
            Command::Op(OP_ELSE),
            Command::Op(OP_RETURN),
            Command::Op(OP_ENDIF),
        ]);
        assert!(script.evaluate(&z()));
    }

    #[test]
    fn test_unbalanced_conditionals() {
        assert!(!ops(vec![small_int(1), Command::Op(OP_IF), small_int(1)]).evaluate(&z()));
        assert!(!ops(vec![small_int(1), Command::Op(OP_ENDIF)]).evaluate(&z()));
        assert!(!ops(vec![
            small_int(1),
            Command::Op(OP_IF),
            Command::Op(OP_ELSE),
            Command::Op(OP_ELSE),
            Command::Op(OP_ENDIF),
        ])
        .evaluate(&z()));
    }

    #[test]
    fn test_stack_limit() {
        let script = ops(vec![small_int(1); 10]);
        let limits = ExecutionLimits {
            max_stack_size: 5,
            ..ExecutionLimits::default()
        };
        assert!(!script.evaluate_with(&z(), &limits, true));
        assert!(script.evaluate(&z()));
    }

    #[test]
    fn test_op_limit() {
        let mut cmds = vec![small_int(1)];
        cmds.extend(std::iter::repeat(Command::Op(OP_NOP)).take(3));
        let script = ops(cmds);
        let limits = ExecutionLimits {
            max_ops: 2,
            ..ExecutionLimits::default()
        };
        assert!(!script.evaluate_with(&z(), &limits, true));
        assert!(script.evaluate(&z()));
    }

    #[test]
    fn test_script_size_limit() {
        let script = ops(vec![Command::Data(vec![1; 600])]);
        let limits = ExecutionLimits {
            max_script_size: 520,
            ..ExecutionLimits::default()
        };
        assert!(!script.evaluate_with(&z(), &limits, true));
    }

    #[test]
    fn test_p2sh_redeem() {
        // redeem script: 2 ADD 5 EQUAL, satisfied by pushing 3
        let redeem = ops(vec![
            small_int(2),
            Command::Op(OP_ADD),
            small_int(5),
            Command::Op(OP_EQUAL),
        ]);
        let redeem_bytes = redeem.raw_serialize();
        let lock = p2sh_script(&hash160(&redeem_bytes));
        assert!(lock.is_p2sh());

        let unlock = ops(vec![small_int(3), Command::Data(redeem_bytes.clone())]);
        assert!(unlock.combine(&lock).evaluate(&z()));

        let wrong = ops(vec![small_int(4), Command::Data(redeem_bytes)]);
        assert!(!wrong.combine(&lock).evaluate(&z()));

        let other = ops(vec![small_int(3), Command::Data(vec![OP_1])]);
        assert!(!other.combine(&lock).evaluate(&z()));
    }

    #[test]
    fn test_combine_and_add() {
        let a = ops(vec![small_int(1)]);
        let b = ops(vec![Command::Op(OP_VERIFY)]);
        assert_eq!(a.combine(&b), a.clone() + b.clone());
        assert_eq!(a.combine(&b).cmds().len(), 2);
    }

    #[test]
    fn test_addresses() {
        let hash = hex::decode("f54a5851e9372b87810a8e60cdd2e7cfd80b6e31").unwrap();
        let mut h160 = [0u8; 20];
        h160.copy_from_slice(&hash);
        let lock = p2pkh_script(&h160);
        assert_eq!(
            lock.address(Network::Mainnet).unwrap(),
            "1PMycacnJaSqwwJqjawXBErnLsZ7RkXUAs"
        );
        let decoded = decode_address("1PMycacnJaSqwwJqjawXBErnLsZ7RkXUAs").unwrap();
        assert_eq!(decoded.network, Network::Mainnet);
        assert_eq!(decoded.kind, AddressKind::P2pkh);
        assert_eq!(Script::from_address("1PMycacnJaSqwwJqjawXBErnLsZ7RkXUAs").unwrap(), lock);

        let p2sh = p2sh_script(&h160);
        let address = p2sh.address(Network::Testnet).unwrap();
        assert_eq!(Script::from_address(&address).unwrap(), p2sh);
        assert_eq!(decode_address(&address).unwrap().kind, AddressKind::P2sh);

        assert!(ops(vec![small_int(1)]).address(Network::Mainnet).is_none());
    }
}
