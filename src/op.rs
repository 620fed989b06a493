//! Opcode table and the per-opcode stack operations
//!
//! [`execute`] covers every byte value: each opcode is either a real operation
//! or an explicit reserved/disabled/invalid arm that fails the script.
//! Branching opcodes (`OP_IF`, `OP_NOTIF`, `OP_ELSE`, `OP_ENDIF`) move the
//! program counter and are resolved by the interpreter in [`crate::script`].

use crate::constants::*;
use crate::encoding::{hash160, hash256};
use crate::secp256k1::{S256Point, Signature};
use crate::types::ByteString;
use num_bigint::BigUint;
use ripemd::Ripemd160;
use sha1::Sha1;
use sha2::{Digest, Sha256};

pub const OP_0: u8 = 0x00;
pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;
pub const OP_PUSHDATA4: u8 = 0x4e;
pub const OP_1NEGATE: u8 = 0x4f;
pub const OP_RESERVED: u8 = 0x50;
pub const OP_1: u8 = 0x51;
pub const OP_2: u8 = 0x52;
pub const OP_16: u8 = 0x60;
pub const OP_NOP: u8 = 0x61;
pub const OP_VER: u8 = 0x62;
pub const OP_IF: u8 = 0x63;
pub const OP_NOTIF: u8 = 0x64;
pub const OP_VERIF: u8 = 0x65;
pub const OP_VERNOTIF: u8 = 0x66;
pub const OP_ELSE: u8 = 0x67;
pub const OP_ENDIF: u8 = 0x68;
pub const OP_VERIFY: u8 = 0x69;
pub const OP_RETURN: u8 = 0x6a;
pub const OP_TOALTSTACK: u8 = 0x6b;
pub const OP_FROMALTSTACK: u8 = 0x6c;
pub const OP_2DROP: u8 = 0x6d;
pub const OP_2DUP: u8 = 0x6e;
pub const OP_3DUP: u8 = 0x6f;
pub const OP_2OVER: u8 = 0x70;
pub const OP_2ROT: u8 = 0x71;
pub const OP_2SWAP: u8 = 0x72;
pub const OP_IFDUP: u8 = 0x73;
pub const OP_DEPTH: u8 = 0x74;
pub const OP_DROP: u8 = 0x75;
pub const OP_DUP: u8 = 0x76;
pub const OP_NIP: u8 = 0x77;
pub const OP_OVER: u8 = 0x78;
pub const OP_PICK: u8 = 0x79;
pub const OP_ROLL: u8 = 0x7a;
pub const OP_ROT: u8 = 0x7b;
pub const OP_SWAP: u8 = 0x7c;
pub const OP_TUCK: u8 = 0x7d;
pub const OP_CAT: u8 = 0x7e;
pub const OP_SUBSTR: u8 = 0x7f;
pub const OP_LEFT: u8 = 0x80;
pub const OP_RIGHT: u8 = 0x81;
pub const OP_SIZE: u8 = 0x82;
pub const OP_INVERT: u8 = 0x83;
pub const OP_AND: u8 = 0x84;
pub const OP_OR: u8 = 0x85;
pub const OP_XOR: u8 = 0x86;
pub const OP_EQUAL: u8 = 0x87;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_RESERVED1: u8 = 0x89;
pub const OP_RESERVED2: u8 = 0x8a;
pub const OP_1ADD: u8 = 0x8b;
pub const OP_1SUB: u8 = 0x8c;
pub const OP_2MUL: u8 = 0x8d;
pub const OP_2DIV: u8 = 0x8e;
pub const OP_NEGATE: u8 = 0x8f;
pub const OP_ABS: u8 = 0x90;
pub const OP_NOT: u8 = 0x91;
pub const OP_0NOTEQUAL: u8 = 0x92;
pub const OP_ADD: u8 = 0x93;
pub const OP_SUB: u8 = 0x94;
pub const OP_MUL: u8 = 0x95;
pub const OP_DIV: u8 = 0x96;
pub const OP_MOD: u8 = 0x97;
pub const OP_LSHIFT: u8 = 0x98;
pub const OP_RSHIFT: u8 = 0x99;
pub const OP_BOOLAND: u8 = 0x9a;
pub const OP_BOOLOR: u8 = 0x9b;
pub const OP_NUMEQUAL: u8 = 0x9c;
pub const OP_NUMEQUALVERIFY: u8 = 0x9d;
pub const OP_NUMNOTEQUAL: u8 = 0x9e;
pub const OP_LESSTHAN: u8 = 0x9f;
pub const OP_GREATERTHAN: u8 = 0xa0;
pub const OP_LESSTHANOREQUAL: u8 = 0xa1;
pub const OP_GREATERTHANOREQUAL: u8 = 0xa2;
pub const OP_MIN: u8 = 0xa3;
pub const OP_MAX: u8 = 0xa4;
pub const OP_WITHIN: u8 = 0xa5;
pub const OP_RIPEMD160: u8 = 0xa6;
pub const OP_SHA1: u8 = 0xa7;
pub const OP_SHA256: u8 = 0xa8;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_HASH256: u8 = 0xaa;
pub const OP_CODESEPARATOR: u8 = 0xab;
pub const OP_CHECKSIG: u8 = 0xac;
pub const OP_CHECKSIGVERIFY: u8 = 0xad;
pub const OP_CHECKMULTISIG: u8 = 0xae;
pub const OP_CHECKMULTISIGVERIFY: u8 = 0xaf;
pub const OP_NOP1: u8 = 0xb0;
pub const OP_CHECKLOCKTIMEVERIFY: u8 = 0xb1;
pub const OP_CHECKSEQUENCEVERIFY: u8 = 0xb2;
pub const OP_NOP4: u8 = 0xb3;
pub const OP_NOP10: u8 = 0xb9;

/// Human-readable opcode name, `None` for data-push lengths and unassigned bytes
pub fn op_name(code: u8) -> Option<&'static str> {
    let name = match code {
        OP_0 => "OP_0",
        OP_PUSHDATA1 => "OP_PUSHDATA1",
        OP_PUSHDATA2 => "OP_PUSHDATA2",
        OP_PUSHDATA4 => "OP_PUSHDATA4",
        OP_1NEGATE => "OP_1NEGATE",
        OP_RESERVED => "OP_RESERVED",
        0x51 => "OP_1",
        0x52 => "OP_2",
        0x53 => "OP_3",
        0x54 => "OP_4",
        0x55 => "OP_5",
        0x56 => "OP_6",
        0x57 => "OP_7",
        0x58 => "OP_8",
        0x59 => "OP_9",
        0x5a => "OP_10",
        0x5b => "OP_11",
        0x5c => "OP_12",
        0x5d => "OP_13",
        0x5e => "OP_14",
        0x5f => "OP_15",
        0x60 => "OP_16",
        OP_NOP => "OP_NOP",
        OP_VER => "OP_VER",
        OP_IF => "OP_IF",
        OP_NOTIF => "OP_NOTIF",
        OP_VERIF => "OP_VERIF",
        OP_VERNOTIF => "OP_VERNOTIF",
        OP_ELSE => "OP_ELSE",
        OP_ENDIF => "OP_ENDIF",
        OP_VERIFY => "OP_VERIFY",
        OP_RETURN => "OP_RETURN",
        OP_TOALTSTACK => "OP_TOALTSTACK",
        OP_FROMALTSTACK => "OP_FROMALTSTACK",
        OP_2DROP => "OP_2DROP",
        OP_2DUP => "OP_2DUP",
        OP_3DUP => "OP_3DUP",
        OP_2OVER => "OP_2OVER",
        OP_2ROT => "OP_2ROT",
        OP_2SWAP => "OP_2SWAP",
        OP_IFDUP => "OP_IFDUP",
        OP_DEPTH => "OP_DEPTH",
        OP_DROP => "OP_DROP",
        OP_DUP => "OP_DUP",
        OP_NIP => "OP_NIP",
        OP_OVER => "OP_OVER",
        OP_PICK => "OP_PICK",
        OP_ROLL => "OP_ROLL",
        OP_ROT => "OP_ROT",
        OP_SWAP => "OP_SWAP",
        OP_TUCK => "OP_TUCK",
        OP_CAT => "OP_CAT",
        OP_SUBSTR => "OP_SUBSTR",
        OP_LEFT => "OP_LEFT",
        OP_RIGHT => "OP_RIGHT",
        OP_SIZE => "OP_SIZE",
        OP_INVERT => "OP_INVERT",
        OP_AND => "OP_AND",
        OP_OR => "OP_OR",
        OP_XOR => "OP_XOR",
        OP_EQUAL => "OP_EQUAL",
        OP_EQUALVERIFY => "OP_EQUALVERIFY",
        OP_RESERVED1 => "OP_RESERVED1",
        OP_RESERVED2 => "OP_RESERVED2",
        OP_1ADD => "OP_1ADD",
        OP_1SUB => "OP_1SUB",
        OP_2MUL => "OP_2MUL",
        OP_2DIV => "OP_2DIV",
        OP_NEGATE => "OP_NEGATE",
        OP_ABS => "OP_ABS",
        OP_NOT => "OP_NOT",
        OP_0NOTEQUAL => "OP_0NOTEQUAL",
        OP_ADD => "OP_ADD",
        OP_SUB => "OP_SUB",
        OP_MUL => "OP_MUL",
        OP_DIV => "OP_DIV",
        OP_MOD => "OP_MOD",
        OP_LSHIFT => "OP_LSHIFT",
        OP_RSHIFT => "OP_RSHIFT",
        OP_BOOLAND => "OP_BOOLAND",
        OP_BOOLOR => "OP_BOOLOR",
        OP_NUMEQUAL => "OP_NUMEQUAL",
        OP_NUMEQUALVERIFY => "OP_NUMEQUALVERIFY",
        OP_NUMNOTEQUAL => "OP_NUMNOTEQUAL",
        OP_LESSTHAN => "OP_LESSTHAN",
        OP_GREATERTHAN => "OP_GREATERTHAN",
        OP_LESSTHANOREQUAL => "OP_LESSTHANOREQUAL",
        OP_GREATERTHANOREQUAL => "OP_GREATERTHANOREQUAL",
        OP_MIN => "OP_MIN",
        OP_MAX => "OP_MAX",
        OP_WITHIN => "OP_WITHIN",
        OP_RIPEMD160 => "OP_RIPEMD160",
        OP_SHA1 => "OP_SHA1",
        OP_SHA256 => "OP_SHA256",
        OP_HASH160 => "OP_HASH160",
        OP_HASH256 => "OP_HASH256",
        OP_CODESEPARATOR => "OP_CODESEPARATOR",
        OP_CHECKSIG => "OP_CHECKSIG",
        OP_CHECKSIGVERIFY => "OP_CHECKSIGVERIFY",
        OP_CHECKMULTISIG => "OP_CHECKMULTISIG",
        OP_CHECKMULTISIGVERIFY => "OP_CHECKMULTISIGVERIFY",
        OP_NOP1 => "OP_NOP1",
        OP_CHECKLOCKTIMEVERIFY => "OP_CHECKLOCKTIMEVERIFY",
        OP_CHECKSEQUENCEVERIFY => "OP_CHECKSEQUENCEVERIFY",
        0xb3 => "OP_NOP4",
        0xb4 => "OP_NOP5",
        0xb5 => "OP_NOP6",
        0xb6 => "OP_NOP7",
        0xb7 => "OP_NOP8",
        0xb8 => "OP_NOP9",
        0xb9 => "OP_NOP10",
        _ => return None,
    };
    Some(name)
}

/// Encode an integer as a minimal little-endian sign-magnitude script number
pub fn encode_num(num: i64) -> ByteString {
    if num == 0 {
        return vec![];
    }
    let negative = num < 0;
    let mut abs = num.unsigned_abs();
    let mut result = Vec::new();
    while abs > 0 {
        result.push((abs & 0xff) as u8);
        abs >>= 8;
    }
    // the top bit of the last byte carries the sign
    if result.last().map_or(false, |&b| b & 0x80 != 0) {
        result.push(if negative { 0x80 } else { 0x00 });
    } else if negative {
        let last = result.len() - 1;
        result[last] |= 0x80;
    }
    result
}

/// Decode a script number of at most 8 bytes
pub fn decode_num(element: &[u8]) -> i64 {
    let Some((&last, _)) = element.split_last() else {
        return 0;
    };
    let negative = last & 0x80 != 0;
    let mut result: i64 = 0;
    for (i, &byte) in element.iter().enumerate().take(8) {
        let byte = if i == element.len() - 1 { byte & 0x7f } else { byte };
        result |= (byte as i64) << (8 * i);
    }
    if negative {
        -result
    } else {
        result
    }
}

/// Script truthiness: any non-zero byte, ignoring a lone sign bit in the last byte
pub fn is_true(element: &[u8]) -> bool {
    element.iter().enumerate().any(|(i, &byte)| {
        byte != 0 && !(i == element.len() - 1 && byte == 0x80)
    })
}

fn encode_bool(value: bool) -> ByteString {
    encode_num(value as i64)
}

/// Inputs an operation may consume beyond the main stack
#[derive(Debug)]
pub struct OpContext<'a> {
    pub altstack: &'a mut Vec<ByteString>,
    /// Signature hash consumed by the CHECKSIG family
    pub z: &'a BigUint,
    pub enforce_low_s: bool,
}

/// Execute one non-branching opcode; `false` halts the script
pub fn execute(code: u8, stack: &mut Vec<ByteString>, ctx: &mut OpContext<'_>) -> bool {
    match code {
        OP_0 => {
            stack.push(vec![]);
            true
        }

        // push lengths are consumed by the parser and never dispatched
        0x01..=OP_PUSHDATA4 => false,

        OP_1NEGATE => {
            stack.push(encode_num(-1));
            true
        }

        OP_RESERVED | OP_VER | OP_VERIF | OP_VERNOTIF | OP_RESERVED1 | OP_RESERVED2 => false,

        OP_1..=OP_16 => {
            stack.push(encode_num((code - OP_1 + 1) as i64));
            true
        }

        OP_NOP | OP_CODESEPARATOR | OP_NOP1..=OP_NOP10 => true,

        // resolved by the interpreter's jump table
        OP_IF | OP_NOTIF | OP_ELSE | OP_ENDIF => false,

        OP_VERIFY => match stack.pop() {
            Some(item) => is_true(&item),
            None => false,
        },

        OP_RETURN => false,

        OP_TOALTSTACK => match stack.pop() {
            Some(item) => {
                ctx.altstack.push(item);
                true
            }
            None => false,
        },

        OP_FROMALTSTACK => match ctx.altstack.pop() {
            Some(item) => {
                stack.push(item);
                true
            }
            None => false,
        },

        OP_2DROP => {
            if stack.len() < 2 {
                return false;
            }
            stack.truncate(stack.len() - 2);
            true
        }

        OP_2DUP => {
            if stack.len() < 2 {
                return false;
            }
            let top = stack[stack.len() - 2..].to_vec();
            stack.extend(top);
            true
        }

        OP_3DUP => {
            if stack.len() < 3 {
                return false;
            }
            let top = stack[stack.len() - 3..].to_vec();
            stack.extend(top);
            true
        }

        OP_2OVER => {
            if stack.len() < 4 {
                return false;
            }
            let pair = stack[stack.len() - 4..stack.len() - 2].to_vec();
            stack.extend(pair);
            true
        }

        OP_2ROT => {
            if stack.len() < 6 {
                return false;
            }
            let start = stack.len() - 6;
            let pair: Vec<ByteString> = stack.drain(start..start + 2).collect();
            stack.extend(pair);
            true
        }

        OP_2SWAP => {
            if stack.len() < 4 {
                return false;
            }
            let start = stack.len() - 4;
            stack[start..].rotate_left(2);
            true
        }

        OP_IFDUP => match stack.last().cloned() {
            Some(item) => {
                if is_true(&item) {
                    stack.push(item);
                }
                true
            }
            None => false,
        },

        OP_DEPTH => {
            stack.push(encode_num(stack.len() as i64));
            true
        }

        OP_DROP => stack.pop().is_some(),

        OP_DUP => match stack.last().cloned() {
            Some(item) => {
                stack.push(item);
                true
            }
            None => false,
        },

        OP_NIP => {
            if stack.len() < 2 {
                return false;
            }
            stack.remove(stack.len() - 2);
            true
        }

        OP_OVER => {
            if stack.len() < 2 {
                return false;
            }
            stack.push(stack[stack.len() - 2].clone());
            true
        }

        OP_PICK | OP_ROLL => {
            let Some(n) = pop_num(stack) else {
                return false;
            };
            if n < 0 || n as usize >= stack.len() {
                return false;
            }
            let index = stack.len() - 1 - n as usize;
            let item = if code == OP_PICK {
                stack[index].clone()
            } else {
                stack.remove(index)
            };
            stack.push(item);
            true
        }

        OP_ROT => {
            if stack.len() < 3 {
                return false;
            }
            let third = stack.remove(stack.len() - 3);
            stack.push(third);
            true
        }

        OP_SWAP => {
            if stack.len() < 2 {
                return false;
            }
            let len = stack.len();
            stack.swap(len - 1, len - 2);
            true
        }

        OP_TUCK => {
            if stack.len() < 2 {
                return false;
            }
            let top = stack[stack.len() - 1].clone();
            stack.insert(stack.len() - 2, top);
            true
        }

        // disabled splice and bitwise operations
        OP_CAT | OP_SUBSTR | OP_LEFT | OP_RIGHT => false,
        OP_INVERT | OP_AND | OP_OR | OP_XOR => false,

        OP_SIZE => match stack.last() {
            Some(item) => {
                let size = item.len() as i64;
                stack.push(encode_num(size));
                true
            }
            None => false,
        },

        OP_EQUAL | OP_EQUALVERIFY => {
            if stack.len() < 2 {
                return false;
            }
            let a = stack.pop().unwrap_or_default();
            let b = stack.pop().unwrap_or_default();
            if code == OP_EQUALVERIFY {
                return a == b;
            }
            stack.push(encode_bool(a == b));
            true
        }

        OP_1ADD | OP_1SUB | OP_NEGATE | OP_ABS | OP_NOT | OP_0NOTEQUAL => {
            let Some(a) = pop_num(stack) else {
                return false;
            };
            let result = match code {
                OP_1ADD => a + 1,
                OP_1SUB => a - 1,
                OP_NEGATE => -a,
                OP_ABS => a.abs(),
                OP_NOT => (a == 0) as i64,
                _ => (a != 0) as i64,
            };
            stack.push(encode_num(result));
            true
        }

        // disabled arithmetic
        OP_2MUL | OP_2DIV | OP_MUL | OP_DIV | OP_MOD | OP_LSHIFT | OP_RSHIFT => false,

        OP_ADD | OP_SUB | OP_BOOLAND | OP_BOOLOR | OP_NUMEQUAL | OP_NUMEQUALVERIFY
        | OP_NUMNOTEQUAL | OP_LESSTHAN | OP_GREATERTHAN | OP_LESSTHANOREQUAL
        | OP_GREATERTHANOREQUAL | OP_MIN | OP_MAX => {
            let Some(b) = pop_num(stack) else {
                return false;
            };
            let Some(a) = pop_num(stack) else {
                return false;
            };
            let result = match code {
                OP_ADD => a + b,
                OP_SUB => a - b,
                OP_BOOLAND => (a != 0 && b != 0) as i64,
                OP_BOOLOR => (a != 0 || b != 0) as i64,
                OP_NUMEQUAL | OP_NUMEQUALVERIFY => (a == b) as i64,
                OP_NUMNOTEQUAL => (a != b) as i64,
                OP_LESSTHAN => (a < b) as i64,
                OP_GREATERTHAN => (a > b) as i64,
                OP_LESSTHANOREQUAL => (a <= b) as i64,
                OP_GREATERTHANOREQUAL => (a >= b) as i64,
                OP_MIN => a.min(b),
                _ => a.max(b),
            };
            if code == OP_NUMEQUALVERIFY {
                return result == 1;
            }
            stack.push(encode_num(result));
            true
        }

        OP_WITHIN => {
            let Some(max) = pop_num(stack) else {
                return false;
            };
            let Some(min) = pop_num(stack) else {
                return false;
            };
            let Some(x) = pop_num(stack) else {
                return false;
            };
            stack.push(encode_bool(min <= x && x < max));
            true
        }

        OP_RIPEMD160 | OP_SHA1 | OP_SHA256 | OP_HASH160 | OP_HASH256 => {
            let Some(item) = stack.pop() else {
                return false;
            };
            let digest = match code {
                OP_RIPEMD160 => Ripemd160::digest(&item).to_vec(),
                OP_SHA1 => Sha1::digest(&item).to_vec(),
                OP_SHA256 => Sha256::digest(&item).to_vec(),
                OP_HASH160 => hash160(&item).to_vec(),
                _ => hash256(&item).to_vec(),
            };
            stack.push(digest);
            true
        }

        OP_CHECKSIG | OP_CHECKSIGVERIFY => {
            let Some(valid) = check_sig(stack, ctx) else {
                return false;
            };
            if code == OP_CHECKSIGVERIFY {
                return valid;
            }
            stack.push(encode_bool(valid));
            true
        }

        OP_CHECKMULTISIG | OP_CHECKMULTISIGVERIFY => {
            let Some(valid) = check_multisig(stack, ctx) else {
                return false;
            };
            if code == OP_CHECKMULTISIGVERIFY {
                return valid;
            }
            stack.push(encode_bool(valid));
            true
        }

        0xba..=0xff => false,
    }
}

fn pop_num(stack: &mut Vec<ByteString>) -> Option<i64> {
    let element = stack.pop()?;
    if element.len() > MAX_SCRIPT_NUM_SIZE {
        return None;
    }
    Some(decode_num(&element))
}

/// Decode a signature with its trailing hash-type byte; `Ok(None)` for the empty signature
fn decode_signature(bytes: &[u8]) -> Result<Option<Signature>, ()> {
    let Some((_hash_type, der)) = bytes.split_last() else {
        return Ok(None);
    };
    Signature::parse_der(der).map(Some).map_err(|_| ())
}

/// `None` when an operand is missing or malformed
fn check_sig(stack: &mut Vec<ByteString>, ctx: &OpContext<'_>) -> Option<bool> {
    if stack.len() < 2 {
        return None;
    }
    let sec = stack.pop()?;
    let sig_bytes = stack.pop()?;
    let point = S256Point::parse_sec(&sec).ok()?;
    let signature = decode_signature(&sig_bytes).ok()?;
    Some(match signature {
        Some(sig) => point.verify_with(ctx.z, &sig, ctx.enforce_low_s),
        None => false,
    })
}

/// m-of-n check; signatures must appear in the same order as their keys
fn check_multisig(stack: &mut Vec<ByteString>, ctx: &OpContext<'_>) -> Option<bool> {
    let n = pop_num(stack)?;
    if n < 0 || n as usize > MAX_MULTISIG_KEYS || stack.len() < n as usize {
        return None;
    }
    let secs = stack.split_off(stack.len() - n as usize);
    let m = pop_num(stack)?;
    if m < 0 || m > n || stack.len() < m as usize + 1 {
        return None;
    }
    let sig_bytes = stack.split_off(stack.len() - m as usize);
    // the historical extra element consumed by CHECKMULTISIG
    stack.pop()?;

    let points = secs
        .iter()
        .map(|sec| S256Point::parse_sec(sec).ok())
        .collect::<Option<Vec<_>>>()?;
    let mut signatures = Vec::with_capacity(sig_bytes.len());
    for bytes in &sig_bytes {
        match decode_signature(bytes).ok()? {
            Some(sig) => signatures.push(sig),
            None => return Some(false),
        }
    }

    let mut keys = points.iter();
    for sig in &signatures {
        let matched = keys
            .by_ref()
            .any(|point| point.verify_with(ctx.z, sig, ctx.enforce_low_s));
        if !matched {
            return Some(false);
        }
    }
    Some(true)
}
