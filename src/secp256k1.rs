//! secp256k1 parameters, ECDSA and the SEC/DER/base58 encodings built on them
//!
//! Coordinates live in the field of the prime `p`; scalars, nonces and
//! signature components live in the field of the group order `N`. Both are
//! [`FieldElement`]s, so mixing them by accident fails with `FieldMismatch`.

use crate::constants::*;
use crate::curve::{Curve, Point};
use crate::encoding::{encode_base58_check, hash160};
use crate::error::{Result, TxError};
use crate::field::{unsigned_exponent, FieldElement, PrimeField};
use crate::types::Network;
use hmac::{Hmac, Mac};
use num_bigint::BigUint;
use num_traits::Zero;
use sha2::Sha256;
use std::fmt;
use std::sync::LazyLock;

fn parse_hex_constant(hex: &str) -> BigUint {
    BigUint::parse_bytes(hex.as_bytes(), 16).expect("curve constants are valid hex")
}

static FIELD_PRIME: LazyLock<BigUint> = LazyLock::new(|| parse_hex_constant(SECP256K1_P_HEX));

static GROUP_ORDER: LazyLock<BigUint> = LazyLock::new(|| parse_hex_constant(SECP256K1_N_HEX));

static CURVE: LazyLock<Curve<FieldElement>> = LazyLock::new(|| {
    let a = FieldElement::new(BigUint::from(SECP256K1_A), FIELD_PRIME.clone())
        .expect("a lies in the field");
    let b = FieldElement::new(BigUint::from(SECP256K1_B), FIELD_PRIME.clone())
        .expect("b lies in the field");
    Curve::new(a, b)
});

static GENERATOR: LazyLock<S256Point> = LazyLock::new(|| {
    S256Point::new(
        parse_hex_constant(SECP256K1_GX_HEX),
        parse_hex_constant(SECP256K1_GY_HEX),
    )
    .expect("generator lies on secp256k1")
});

/// The coordinate field prime p
pub fn field_prime() -> &'static BigUint {
    &FIELD_PRIME
}

/// The group order N
pub fn group_order() -> &'static BigUint {
    &GROUP_ORDER
}

/// y^2 = x^3 + 7 over F_p
pub fn curve() -> &'static Curve<FieldElement> {
    &CURVE
}

/// Element of the scalar field F_N; `value` is reduced first
pub fn scalar(value: &BigUint) -> Result<FieldElement> {
    FieldElement::reduced(value, group_order())
}

fn coordinate(value: BigUint) -> Result<FieldElement> {
    FieldElement::new(value, field_prime().clone())
}

fn to_32_bytes(value: &BigUint) -> [u8; 32] {
    let bytes = value.to_bytes_be();
    let mut out = [0u8; 32];
    let start = 32usize.saturating_sub(bytes.len());
    out[start..].copy_from_slice(&bytes[bytes.len().saturating_sub(32)..]);
    out
}

/// A point on secp256k1
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S256Point(Point<FieldElement>);

impl S256Point {
    pub fn new(x: BigUint, y: BigUint) -> Result<Self> {
        Ok(Self(Point::new(coordinate(x)?, coordinate(y)?, curve().clone())?))
    }

    pub fn infinity() -> Self {
        Self(Point::infinity(curve().clone()))
    }

    /// The published generator G
    pub fn generator() -> &'static S256Point {
        &GENERATOR
    }

    pub fn point(&self) -> &Point<FieldElement> {
        &self.0
    }

    pub fn x(&self) -> Option<&BigUint> {
        self.0.x().map(FieldElement::value)
    }

    pub fn y(&self) -> Option<&BigUint> {
        self.0.y().map(FieldElement::value)
    }

    pub fn is_infinity(&self) -> bool {
        self.0.is_infinity()
    }

    pub fn try_add(&self, other: &Self) -> Result<Self> {
        Ok(Self(self.0.try_add(&other.0)?))
    }

    /// `coefficient * self`, with the coefficient reduced modulo N first
    pub fn scale(&self, coefficient: &BigUint) -> Result<Self> {
        Ok(Self(self.0.scale(&(coefficient % group_order()))?))
    }

    /// ECDSA verification of `sig` over the message hash `z`
    ///
    /// Malformed signatures (`r` or `s` outside `[1, N-1]`) yield `false`.
    pub fn verify(&self, z: &BigUint, sig: &Signature) -> bool {
        self.verify_with(z, sig, false)
    }

    /// Like [`S256Point::verify`], optionally rejecting high-s signatures
    pub fn verify_with(&self, z: &BigUint, sig: &Signature, enforce_low_s: bool) -> bool {
        if enforce_low_s && !sig.is_low_s() {
            return false;
        }
        self.try_verify(z, sig).unwrap_or(false)
    }

    fn try_verify(&self, z: &BigUint, sig: &Signature) -> Result<bool> {
        let n = group_order();
        if self.is_infinity() || !sig.in_range() {
            return Ok(false);
        }
        let s_inv = scalar(&sig.s)?.inverse()?;
        let u = scalar(z)?.try_mul(&s_inv)?;
        let v = scalar(&sig.r)?.try_mul(&s_inv)?;
        let total = Self::generator()
            .scale(u.value())?
            .try_add(&self.scale(v.value())?)?;
        Ok(match total.x() {
            Some(x) => x % n == sig.r,
            None => false,
        })
    }

    /// SEC1 encoding: 0x02/0x03 ++ x when compressed, 0x04 ++ x ++ y otherwise
    ///
    /// The identity encodes as the single byte 0x00.
    pub fn sec(&self, compressed: bool) -> Vec<u8> {
        let (x, y) = match (self.x(), self.y()) {
            (Some(x), Some(y)) => (x, y),
            _ => return vec![0x00],
        };
        let mut out = Vec::with_capacity(65);
        if compressed {
            out.push(if y % 2u32 == BigUint::zero() { 0x02 } else { 0x03 });
            out.extend_from_slice(&to_32_bytes(x));
        } else {
            out.push(0x04);
            out.extend_from_slice(&to_32_bytes(x));
            out.extend_from_slice(&to_32_bytes(y));
        }
        out
    }

    /// Parse a 33-byte compressed or 65-byte uncompressed SEC public key
    pub fn parse_sec(bytes: &[u8]) -> Result<Self> {
        let malformed =
            |e: TxError| TxError::MalformedEncoding(format!("invalid SEC point: {}", e));
        match (bytes.first().copied(), bytes.len()) {
            (Some(0x04), 65) => {
                let x = BigUint::from_bytes_be(&bytes[1..33]);
                let y = BigUint::from_bytes_be(&bytes[33..65]);
                Self::new(x, y).map_err(malformed)
            }
            (Some(prefix @ (0x02 | 0x03)), 33) => {
                let x = coordinate(BigUint::from_bytes_be(&bytes[1..])).map_err(malformed)?;
                let alpha = x
                    .try_mul(&x)
                    .and_then(|x2| x2.try_mul(&x))
                    .and_then(|x3| x3.try_add(&curve().b))
                    .map_err(malformed)?;
                let beta = sqrt(&alpha);
                if beta.try_mul(&beta).map_err(malformed)? != alpha {
                    return Err(TxError::MalformedEncoding(format!(
                        "x {} has no point on secp256k1",
                        x.value()
                    )));
                }
                let beta_is_even = beta.value() % 2u32 == BigUint::zero();
                let want_even = prefix == 0x02;
                let y = if beta_is_even == want_even { beta } else { beta.neg() };
                Ok(Self(Point::new(x, y, curve().clone()).map_err(malformed)?))
            }
            _ => Err(TxError::MalformedEncoding(format!(
                "invalid SEC encoding of {} bytes",
                bytes.len()
            ))),
        }
    }

    pub fn hash160(&self, compressed: bool) -> [u8; 20] {
        hash160(&self.sec(compressed))
    }

    /// Base58check P2PKH address
    pub fn address(&self, compressed: bool, network: Network) -> String {
        let mut payload = vec![network.p2pkh_prefix()];
        payload.extend_from_slice(&self.hash160(compressed));
        encode_base58_check(&payload)
    }
}

impl fmt::Display for S256Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.x(), self.y()) {
            (Some(x), Some(y)) => write!(
                f,
                "S256Point({}, {})",
                hex::encode(to_32_bytes(x)),
                hex::encode(to_32_bytes(y))
            ),
            _ => write!(f, "S256Point(infinity)"),
        }
    }
}

/// Square root in F_p; valid because p % 4 == 3
fn sqrt(value: &FieldElement) -> FieldElement {
    let exponent = (field_prime() + 1u32) / 4u32;
    value.pow(&unsigned_exponent(&exponent))
}

/// An ECDSA signature `(r, s)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    pub r: BigUint,
    pub s: BigUint,
}

impl Signature {
    pub fn new(r: BigUint, s: BigUint) -> Self {
        Self { r, s }
    }

    fn in_range(&self) -> bool {
        let n = group_order();
        !self.r.is_zero() && &self.r < n && !self.s.is_zero() && &self.s < n
    }

    /// `s <= N/2`
    pub fn is_low_s(&self) -> bool {
        self.s <= group_order() / 2u32
    }

    /// DER encoding: 0x30 len 0x02 len(r) r 0x02 len(s) s
    pub fn der(&self) -> Vec<u8> {
        let r = der_integer(&self.r);
        let s = der_integer(&self.s);
        let mut out = Vec::with_capacity(2 + r.len() + s.len());
        out.push(0x30);
        out.push((r.len() + s.len()) as u8);
        out.extend_from_slice(&r);
        out.extend_from_slice(&s);
        out
    }

    /// Parse a strict DER signature (without a trailing hash-type byte)
    pub fn parse_der(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 8 || bytes.len() > 72 {
            return Err(TxError::MalformedEncoding(format!(
                "DER signature of {} bytes",
                bytes.len()
            )));
        }
        if bytes[0] != 0x30 {
            return Err(TxError::MalformedEncoding(
                "DER signature must start with 0x30".to_string(),
            ));
        }
        if bytes[1] as usize != bytes.len() - 2 {
            return Err(TxError::MalformedEncoding(format!(
                "DER length byte {} does not match {} remaining bytes",
                bytes[1],
                bytes.len() - 2
            )));
        }
        let (r, pos) = parse_der_integer(bytes, 2)?;
        let (s, pos) = parse_der_integer(bytes, pos)?;
        if pos != bytes.len() {
            return Err(TxError::MalformedEncoding(format!(
                "{} trailing bytes after DER signature",
                bytes.len() - pos
            )));
        }
        Ok(Self { r, s })
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({:x}, {:x})", self.r, self.s)
    }
}

fn der_integer(value: &BigUint) -> Vec<u8> {
    let mut bytes = value.to_bytes_be();
    if bytes[0] & 0x80 != 0 {
        bytes.insert(0, 0x00);
    }
    let mut out = Vec::with_capacity(bytes.len() + 2);
    out.push(0x02);
    out.push(bytes.len() as u8);
    out.extend_from_slice(&bytes);
    out
}

fn parse_der_integer(bytes: &[u8], pos: usize) -> Result<(BigUint, usize)> {
    if pos + 2 > bytes.len() || bytes[pos] != 0x02 {
        return Err(TxError::MalformedEncoding(format!(
            "expected DER integer marker at offset {}",
            pos
        )));
    }
    let len = bytes[pos + 1] as usize;
    let start = pos + 2;
    let end = start + len;
    if len == 0 || end > bytes.len() {
        return Err(TxError::MalformedEncoding(format!(
            "DER integer length {} at offset {} exceeds signature",
            len, pos
        )));
    }
    if bytes[start] & 0x80 != 0 {
        return Err(TxError::MalformedEncoding(
            "negative DER integer".to_string(),
        ));
    }
    // a leading zero is only allowed to clear the sign bit
    if len > 1 && bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0 {
        return Err(TxError::MalformedEncoding(format!(
            "DER integer at offset {} has excess zero padding",
            pos
        )));
    }
    Ok((BigUint::from_bytes_be(&bytes[start..end]), end))
}

type HmacSha256 = Hmac<Sha256>;

fn hmac_sha256(key: &[u8], parts: &[&[u8]]) -> [u8; 32] {
    let mut mac =
        <HmacSha256 as Mac>::new_from_slice(key).expect("HMAC accepts keys of any length");
    for part in parts {
        mac.update(part);
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

/// RFC 6979 deterministic nonce stream (HMAC-SHA256)
struct NonceGenerator {
    k: [u8; 32],
    v: [u8; 32],
    retry: bool,
}

impl NonceGenerator {
    fn new(secret: &BigUint, z: &BigUint) -> Self {
        let secret_bytes = to_32_bytes(secret);
        let z_bytes = to_32_bytes(&(z % group_order()));
        let mut k = [0u8; 32];
        let mut v = [1u8; 32];
        k = hmac_sha256(&k, &[&v, &[0x00], &secret_bytes, &z_bytes]);
        v = hmac_sha256(&k, &[&v]);
        k = hmac_sha256(&k, &[&v, &[0x01], &secret_bytes, &z_bytes]);
        v = hmac_sha256(&k, &[&v]);
        Self { k, v, retry: false }
    }

    /// Next candidate in `[1, N-1]`
    fn next_nonce(&mut self) -> BigUint {
        loop {
            if self.retry {
                self.k = hmac_sha256(&self.k, &[&self.v, &[0x00]]);
                self.v = hmac_sha256(&self.k, &[&self.v]);
            }
            self.retry = true;
            self.v = hmac_sha256(&self.k, &[&self.v]);
            let candidate = BigUint::from_bytes_be(&self.v);
            if !candidate.is_zero() && &candidate < group_order() {
                return candidate;
            }
        }
    }
}

/// A secret scalar together with its public point
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey {
    secret: BigUint,
    point: S256Point,
}

impl PrivateKey {
    /// `secret` must lie in `[1, N-1]`
    pub fn new(secret: BigUint) -> Result<Self> {
        if secret.is_zero() || &secret >= group_order() {
            return Err(TxError::Range(
                "private key must lie in [1, N-1]".to_string(),
            ));
        }
        let point = S256Point::generator().scale(&secret)?;
        Ok(Self { secret, point })
    }

    pub fn secret(&self) -> &BigUint {
        &self.secret
    }

    pub fn point(&self) -> &S256Point {
        &self.point
    }

    /// Deterministic low-s ECDSA signature over the message hash `z`
    pub fn sign(&self, z: &BigUint) -> Result<Signature> {
        let n = group_order();
        let e = scalar(z)?;
        let d = scalar(&self.secret)?;
        let mut nonces = NonceGenerator::new(&self.secret, z);
        loop {
            let k = nonces.next_nonce();
            let r = match S256Point::generator().scale(&k)?.x() {
                Some(x) => x % n,
                None => continue,
            };
            if r.is_zero() {
                continue;
            }
            let k_inv = scalar(&k)?.inverse()?;
            let s = e.try_add(&scalar(&r)?.try_mul(&d)?)?.try_mul(&k_inv)?;
            if s.is_zero() {
                continue;
            }
            let mut s = s.value().clone();
            if s > n / 2u32 {
                s = n - s;
            }
            return Ok(Signature { r, s });
        }
    }

    /// Wallet import format
    pub fn wif(&self, compressed: bool, network: Network) -> String {
        let mut payload = vec![network.wif_prefix()];
        payload.extend_from_slice(&to_32_bytes(&self.secret));
        if compressed {
            payload.push(0x01);
        }
        encode_base58_check(&payload)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("point", &self.point)
            .finish_non_exhaustive()
    }
}

/// Interpret a 32-byte big-endian digest as an integer
pub fn hash_to_int(hash: &[u8]) -> BigUint {
    BigUint::from_bytes_be(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::hash256;
    use num_traits::One;

    fn key(secret: u64) -> PrivateKey {
        PrivateKey::new(BigUint::from(secret)).unwrap()
    }

    #[test]
    fn test_constants() {
        let p = (BigUint::one() << 256usize) - (BigUint::one() << 32usize) - 977u32;
        assert_eq!(field_prime(), &p);
        assert_eq!(field_prime() % 4u32, BigUint::from(3u32));
        assert!(!S256Point::generator().is_infinity());
    }

    #[test]
    fn test_order_of_generator() {
        // the generic multiplication does not reduce the coefficient
        let g = S256Point::generator().point();
        assert!(g.scale(group_order()).unwrap().is_infinity());
        let n_minus_one = group_order() - 1u32;
        let minus_g = S256Point::generator().scale(&n_minus_one).unwrap();
        assert_eq!(minus_g.point(), &g.negate().unwrap());
        assert!(minus_g.try_add(S256Point::generator()).unwrap().is_infinity());
    }

    #[test]
    fn test_scale_reduces_modulo_order() {
        let g = S256Point::generator();
        let big = group_order() + 5u32;
        assert_eq!(g.scale(&big).unwrap(), g.scale(&BigUint::from(5u32)).unwrap());
    }

    #[test]
    fn test_scalar_and_coordinate_fields_do_not_mix() {
        let s = scalar(&BigUint::from(5u32)).unwrap();
        let c = coordinate(BigUint::from(5u32)).unwrap();
        assert!(matches!(s.try_add(&c), Err(TxError::FieldMismatch(_))));
    }

    #[test]
    fn test_sign_verify_round_trip() {
        let pk = key(12345);
        let z = hash_to_int(&hash256(b"Programming Bitcoin!"));
        let sig = pk.sign(&z).unwrap();
        assert!(sig.is_low_s());
        assert!(pk.point().verify(&z, &sig));
        assert!(pk.point().verify_with(&z, &sig, true));

        // different message
        assert!(!pk.point().verify(&(&z + 1u32), &sig));
        // different key
        assert!(!key(12346).point().verify(&z, &sig));
        // flipped bits
        let bad_r = Signature::new(&sig.r ^ BigUint::one(), sig.s.clone());
        assert!(!pk.point().verify(&z, &bad_r));
        let bad_s = Signature::new(sig.r.clone(), &sig.s ^ (BigUint::one() << 7usize));
        assert!(!pk.point().verify(&z, &bad_s));
    }

    #[test]
    fn test_high_s_accepted_unless_enforced() {
        let pk = key(0xdeadbeef);
        let z = hash_to_int(&hash256(b"low s"));
        let sig = pk.sign(&z).unwrap();
        let high = Signature::new(sig.r.clone(), group_order() - &sig.s);
        assert!(!high.is_low_s());
        assert!(pk.point().verify(&z, &high));
        assert!(!pk.point().verify_with(&z, &high, true));
    }

    #[test]
    fn test_signing_is_deterministic() {
        let pk = key(7);
        let z = hash_to_int(&hash256(b"nonce"));
        assert_eq!(pk.sign(&z).unwrap(), pk.sign(&z).unwrap());
        let other = hash_to_int(&hash256(b"other"));
        assert_ne!(pk.sign(&z).unwrap().r, pk.sign(&other).unwrap().r);
    }

    #[test]
    fn test_verify_rejects_out_of_range() {
        let pk = key(2);
        let z = BigUint::from(1u32);
        let n = group_order().clone();
        for sig in [
            Signature::new(BigUint::zero(), BigUint::one()),
            Signature::new(BigUint::one(), BigUint::zero()),
            Signature::new(n.clone(), BigUint::one()),
            Signature::new(BigUint::one(), n),
        ] {
            assert!(!pk.point().verify(&z, &sig));
        }
        assert!(!S256Point::infinity().verify(&z, &Signature::new(BigUint::one(), BigUint::one())));
    }

    #[test]
    fn test_private_key_range() {
        assert!(matches!(PrivateKey::new(BigUint::zero()), Err(TxError::Range(_))));
        assert!(PrivateKey::new(group_order().clone()).is_err());
        assert!(PrivateKey::new(group_order() - 1u32).is_ok());
    }

    #[test]
    fn test_sec_round_trip() {
        let point = key(5000).point().clone();
        for compressed in [true, false] {
            let sec = point.sec(compressed);
            assert_eq!(sec.len(), if compressed { 33 } else { 65 });
            assert_eq!(S256Point::parse_sec(&sec).unwrap(), point);
        }
        assert_eq!(S256Point::infinity().sec(true), vec![0x00]);
    }

    #[test]
    fn test_parse_sec_rejects_garbage() {
        assert!(S256Point::parse_sec(&[]).is_err());
        assert!(S256Point::parse_sec(&[0x02; 32]).is_err());
        let mut off_curve = S256Point::generator().sec(false);
        off_curve[64] ^= 1;
        assert!(matches!(
            S256Point::parse_sec(&off_curve),
            Err(TxError::MalformedEncoding(_))
        ));
        // x = 5 has no square root of x^3 + 7
        let mut no_root = vec![0x02];
        no_root.extend_from_slice(&to_32_bytes(&BigUint::from(5u32)));
        assert!(S256Point::parse_sec(&no_root).is_err());
    }

    #[test]
    fn test_der_vector() {
        let r =
            parse_hex_constant("37206a0610995c58074999cb9767b87af4c4978db68c06e8e6e81d282047a7c6");
        let s =
            parse_hex_constant("8ca63759c1157ebeaec0d03cecca119fc9a75bf8e6d0fa65c841c8e2738cdaec");
        let sig = Signature::new(r, s);
        let der = sig.der();
        assert_eq!(
            hex::encode(&der),
            "3045022037206a0610995c58074999cb9767b87af4c4978db68c06e8e6e81d282047a7c60221008ca63759c1157ebeaec0d03cecca119fc9a75bf8e6d0fa65c841c8e2738cdaec"
        );
        assert_eq!(Signature::parse_der(&der).unwrap(), sig);
    }

    #[test]
    fn test_parse_der_rejects_bad_lengths() {
        let sig = Signature::new(BigUint::from(1u32), BigUint::from(2u32));
        let der = sig.der();
        assert_eq!(hex::encode(&der), "3006020101020102");
        assert_eq!(Signature::parse_der(&der).unwrap(), sig);

        let mut wrong_total = der.clone();
        wrong_total[1] = 7;
        assert!(Signature::parse_der(&wrong_total).is_err());

        let mut trailing = der.clone();
        trailing.push(0x00);
        trailing[1] = 7;
        assert!(Signature::parse_der(&trailing).is_err());

        let mut wrong_marker = der.clone();
        wrong_marker[0] = 0x31;
        assert!(Signature::parse_der(&wrong_marker).is_err());

        let mut overlong_r = der;
        overlong_r[3] = 5;
        assert!(Signature::parse_der(&overlong_r).is_err());
    }

    #[test]
    fn test_parse_der_rejects_padded_integers() {
        // r = 1 written as 00 01
        let padded_r = hex::decode("300702020001020102").unwrap();
        assert!(matches!(
            Signature::parse_der(&padded_r),
            Err(TxError::MalformedEncoding(_))
        ));
        let padded_s = hex::decode("30070201010202007f").unwrap();
        assert!(Signature::parse_der(&padded_s).is_err());

        // the zero byte that clears the sign bit is required, not padding
        let sig = Signature::new(BigUint::from(0x80u32), BigUint::from(0xffu32));
        let der = sig.der();
        assert_eq!(hex::encode(&der), "300802020080020200ff");
        assert_eq!(Signature::parse_der(&der).unwrap(), sig);
    }
}
