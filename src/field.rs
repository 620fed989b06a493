//! Prime field arithmetic
//!
//! [`PrimeField`] is the contract curve arithmetic is written against;
//! [`FieldElement`] implements it over an arbitrary prime modulus carried at
//! runtime. Elements are immutable: every operation returns a new element, and
//! combining elements of different moduli is an error rather than a coercion.

use crate::error::{Result, TxError};
use num_bigint::{BigInt, BigUint};
use num_traits::{One, Signed, Zero};
use std::fmt;

/// Arithmetic a curve needs from its coordinate field
pub trait PrimeField: Clone + PartialEq + fmt::Debug {
    fn try_add(&self, rhs: &Self) -> Result<Self>;
    fn try_sub(&self, rhs: &Self) -> Result<Self>;
    fn try_mul(&self, rhs: &Self) -> Result<Self>;
    fn try_div(&self, rhs: &Self) -> Result<Self>;
    /// Exponentiation by a signed exponent
    fn pow(&self, exponent: &BigInt) -> Self;
    /// Multiply by a small integer constant of the same field
    fn scale(&self, k: u64) -> Self;
    /// Additive inverse
    fn neg(&self) -> Self;
    fn is_zero(&self) -> bool;
}

/// Element of the field of integers modulo a prime
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldElement {
    value: BigUint,
    modulus: BigUint,
}

impl FieldElement {
    /// Create an element; `value` must lie in `[0, modulus)`
    ///
    /// # Examples
    ///
    /// ```
    /// use tx_proof::field::FieldElement;
    ///
    /// assert!(FieldElement::from_u64(7, 13).is_ok());
    /// assert!(FieldElement::from_u64(13, 13).is_err());
    /// ```
    pub fn new(value: BigUint, modulus: BigUint) -> Result<Self> {
        if modulus < BigUint::from(2u32) {
            return Err(TxError::Range(format!("modulus {} is not a prime", modulus)));
        }
        if value >= modulus {
            return Err(TxError::Range(format!(
                "{} not in field range 0 to {}",
                value,
                &modulus - 1u32
            )));
        }
        Ok(Self { value, modulus })
    }

    pub fn from_u64(value: u64, modulus: u64) -> Result<Self> {
        Self::new(BigUint::from(value), BigUint::from(modulus))
    }

    /// Create an element from any integer by reducing it into range
    pub fn reduced(value: &BigUint, modulus: &BigUint) -> Result<Self> {
        if modulus.is_zero() {
            return Err(TxError::Range("modulus 0 is not a prime".to_string()));
        }
        Self::new(value % modulus, modulus.clone())
    }

    pub fn value(&self) -> &BigUint {
        &self.value
    }

    pub fn modulus(&self) -> &BigUint {
        &self.modulus
    }

    /// Multiplicative inverse via Fermat's little theorem: a^(p-2)
    pub fn inverse(&self) -> Result<Self> {
        if self.value.is_zero() {
            return Err(TxError::DivisionByZero(format!(
                "0 has no inverse modulo {}",
                self.modulus
            )));
        }
        let exponent = &self.modulus - 2u32;
        Ok(self.with_value(self.value.modpow(&exponent, &self.modulus)))
    }

    fn with_value(&self, value: BigUint) -> Self {
        Self {
            value,
            modulus: self.modulus.clone(),
        }
    }

    fn check_same_field(&self, rhs: &Self, op: &str) -> Result<()> {
        if self.modulus != rhs.modulus {
            return Err(TxError::FieldMismatch(format!(
                "cannot {} elements of F_{} and F_{}",
                op, self.modulus, rhs.modulus
            )));
        }
        Ok(())
    }
}

impl PrimeField for FieldElement {
    fn try_add(&self, rhs: &Self) -> Result<Self> {
        self.check_same_field(rhs, "add")?;
        Ok(self.with_value((&self.value + &rhs.value) % &self.modulus))
    }

    fn try_sub(&self, rhs: &Self) -> Result<Self> {
        self.check_same_field(rhs, "subtract")?;
        Ok(self.with_value((&self.value + &self.modulus - &rhs.value) % &self.modulus))
    }

    fn try_mul(&self, rhs: &Self) -> Result<Self> {
        self.check_same_field(rhs, "multiply")?;
        Ok(self.with_value((&self.value * &rhs.value) % &self.modulus))
    }

    fn try_div(&self, rhs: &Self) -> Result<Self> {
        self.check_same_field(rhs, "divide")?;
        let inverse = rhs.inverse()?;
        Ok(self.with_value((&self.value * &inverse.value) % &self.modulus))
    }

    /// Negative exponents are brought into range by adding multiples of p - 1,
    /// which is only sound when the modulus is prime.
    fn pow(&self, exponent: &BigInt) -> Self {
        let exponent = if exponent.is_negative() {
            let order = BigInt::from(&self.modulus - 1u32);
            let mut e = exponent % &order;
            if e.is_negative() {
                e += &order;
            }
            e
        } else {
            exponent.clone()
        };
        // exponent is non-negative here
        self.with_value(self.value.modpow(exponent.magnitude(), &self.modulus))
    }

    fn scale(&self, k: u64) -> Self {
        self.with_value((&self.value * BigUint::from(k)) % &self.modulus)
    }

    fn neg(&self) -> Self {
        if self.value.is_zero() {
            return self.clone();
        }
        self.with_value(&self.modulus - &self.value)
    }

    fn is_zero(&self) -> bool {
        self.value.is_zero()
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement_{}({})", self.modulus, self.value)
    }
}

/// Signed exponent helper for callers holding machine integers
pub fn exponent(e: i64) -> BigInt {
    BigInt::from(e)
}

/// Lift an unsigned value into a non-negative exponent
pub fn unsigned_exponent(e: &BigUint) -> BigInt {
    BigInt::from(e.clone())
}

/// The multiplicative identity of the field with the given modulus
pub fn one(modulus: &BigUint) -> Result<FieldElement> {
    FieldElement::new(BigUint::one(), modulus.clone())
}
