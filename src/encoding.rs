//! Byte-level helpers: hashes, compact-size varints and little-endian integers

use crate::error::{Result, TxError};
use crate::types::Hash;
use bitcoin_hashes::{sha256d, Hash as BitcoinHash};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};
use std::io::Read;

/// SHA256(SHA256(x))
pub fn hash256(data: &[u8]) -> Hash {
    let result = sha256d::Hash::hash(data);
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result[..]);
    hash
}

/// RIPEMD160(SHA256(x))
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let sha256_hash = Sha256::digest(data);
    let ripemd160_hash = Ripemd160::digest(sha256_hash);
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&ripemd160_hash);
    hash
}

/// Read a compact-size unsigned integer
///
/// 0x00..=0xfc: the byte itself; 0xfd: next 2 bytes LE; 0xfe: next 4 bytes LE;
/// 0xff: next 8 bytes LE.
pub fn read_varint<R: Read>(reader: &mut R) -> Result<u64> {
    let prefix = read_u8(reader)?;
    match prefix {
        0xfd => {
            let mut buf = [0u8; 2];
            reader.read_exact(&mut buf)?;
            Ok(u16::from_le_bytes(buf) as u64)
        }
        0xfe => Ok(read_u32_le(reader)? as u64),
        0xff => read_u64_le(reader),
        n => Ok(n as u64),
    }
}

/// Encode a compact-size unsigned integer
pub fn encode_varint(n: u64) -> Vec<u8> {
    if n < 0xfd {
        vec![n as u8]
    } else if n <= 0xffff {
        let mut out = vec![0xfd];
        out.extend_from_slice(&(n as u16).to_le_bytes());
        out
    } else if n <= 0xffff_ffff {
        let mut out = vec![0xfe];
        out.extend_from_slice(&(n as u32).to_le_bytes());
        out
    } else {
        let mut out = vec![0xff];
        out.extend_from_slice(&n.to_le_bytes());
        out
    }
}

pub fn read_u8<R: Read>(reader: &mut R) -> Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

pub fn read_u16_le<R: Read>(reader: &mut R) -> Result<u16> {
    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

pub fn read_u32_le<R: Read>(reader: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

pub fn read_u64_le<R: Read>(reader: &mut R) -> Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

pub fn read_hash<R: Read>(reader: &mut R) -> Result<Hash> {
    let mut hash = [0u8; 32];
    reader.read_exact(&mut hash)?;
    Ok(hash)
}

/// Base58 with a 4-byte double-SHA256 checksum
pub fn encode_base58_check(payload: &[u8]) -> String {
    bs58::encode(payload).with_check().into_string()
}

/// Decode base58check, returning the payload without its checksum
pub fn decode_base58_check(encoded: &str) -> Result<Vec<u8>> {
    bs58::decode(encoded)
        .with_check(None)
        .into_vec()
        .map_err(|e| TxError::MalformedEncoding(format!("invalid base58check {}: {}", encoded, e)))
}

/// Read exactly `len` bytes
pub fn read_bytes<R: Read>(reader: &mut R, len: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let read = reader.take(len as u64).read_to_end(&mut buf)?;
    if read != len {
        return Err(TxError::MalformedEncoding(format!(
            "expected {} bytes, found {}",
            len, read
        )));
    }
    Ok(buf)
}
