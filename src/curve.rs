//! Weierstrass curve group law over any [`PrimeField`]
//!
//! Points on `y^2 = x^3 + a*x + b` are validated when built, so an off-curve
//! [`Point`] is never observable. The identity is an explicit
//! [`Coordinates::Infinity`] variant rather than a pair of absent coordinates.

use crate::error::{Result, TxError};
use crate::field::PrimeField;
use num_bigint::BigUint;
use num_traits::{One, Zero};
use std::fmt;

/// Curve parameters `a` and `b`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Curve<F> {
    pub a: F,
    pub b: F,
}

impl<F: PrimeField> Curve<F> {
    pub fn new(a: F, b: F) -> Self {
        Self { a, b }
    }

    /// y^2 == x^3 + a*x + b
    pub fn contains(&self, x: &F, y: &F) -> Result<bool> {
        let lhs = y.try_mul(y)?;
        let rhs = x
            .try_mul(x)?
            .try_mul(x)?
            .try_add(&self.a.try_mul(x)?)?
            .try_add(&self.b)?;
        Ok(lhs.try_sub(&rhs)?.is_zero())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Coordinates<F> {
    /// The group identity
    Infinity,
    Affine { x: F, y: F },
}

/// A point on a specific curve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Point<F> {
    coords: Coordinates<F>,
    curve: Curve<F>,
}

impl<F: PrimeField> Point<F> {
    /// Build an affine point, failing with `NotOnCurve` if it violates the curve equation
    pub fn new(x: F, y: F, curve: Curve<F>) -> Result<Self> {
        if !curve.contains(&x, &y)? {
            return Err(TxError::NotOnCurve(format!("({:?}, {:?})", x, y)));
        }
        Ok(Self {
            coords: Coordinates::Affine { x, y },
            curve,
        })
    }

    pub fn infinity(curve: Curve<F>) -> Self {
        Self {
            coords: Coordinates::Infinity,
            curve,
        }
    }

    /// Build from optional coordinates: both absent is the identity, one absent is rejected
    pub fn from_coordinates(x: Option<F>, y: Option<F>, curve: Curve<F>) -> Result<Self> {
        match (x, y) {
            (None, None) => Ok(Self::infinity(curve)),
            (Some(x), Some(y)) => Self::new(x, y, curve),
            (x, y) => Err(TxError::NotOnCurve(format!(
                "only one coordinate present: ({:?}, {:?})",
                x, y
            ))),
        }
    }

    pub fn coordinates(&self) -> &Coordinates<F> {
        &self.coords
    }

    pub fn curve(&self) -> &Curve<F> {
        &self.curve
    }

    pub fn x(&self) -> Option<&F> {
        match &self.coords {
            Coordinates::Affine { x, .. } => Some(x),
            Coordinates::Infinity => None,
        }
    }

    pub fn y(&self) -> Option<&F> {
        match &self.coords {
            Coordinates::Affine { y, .. } => Some(y),
            Coordinates::Infinity => None,
        }
    }

    pub fn is_infinity(&self) -> bool {
        matches!(self.coords, Coordinates::Infinity)
    }

    /// Reflection across the x-axis
    pub fn negate(&self) -> Result<Self> {
        match &self.coords {
            Coordinates::Infinity => Ok(self.clone()),
            Coordinates::Affine { x, y } => Self::new(x.clone(), y.neg(), self.curve.clone()),
        }
    }

    /// Chord-and-tangent addition
    pub fn try_add(&self, other: &Self) -> Result<Self> {
        if self.curve != other.curve {
            return Err(TxError::CurveMismatch(format!(
                "points are on different curves: {:?} and {:?}",
                self.curve, other.curve
            )));
        }
        let (x1, y1, x2, y2) = match (&self.coords, &other.coords) {
            (Coordinates::Infinity, _) => return Ok(other.clone()),
            (_, Coordinates::Infinity) => return Ok(self.clone()),
            (Coordinates::Affine { x: x1, y: y1 }, Coordinates::Affine { x: x2, y: y2 }) => {
                (x1, y1, x2, y2)
            }
        };

        if x1 == x2 && y1 != y2 {
            return Ok(Self::infinity(self.curve.clone()));
        }

        let slope = if x1 != x2 {
            y2.try_sub(y1)?.try_div(&x2.try_sub(x1)?)?
        } else {
            // tangent is vertical when y == 0
            if y1.is_zero() {
                return Ok(Self::infinity(self.curve.clone()));
            }
            x1.try_mul(x1)?
                .scale(3)
                .try_add(&self.curve.a)?
                .try_div(&y1.scale(2))?
        };

        let x3 = slope.try_mul(&slope)?.try_sub(x1)?.try_sub(x2)?;
        let y3 = slope.try_mul(&x1.try_sub(&x3)?)?.try_sub(y1)?;
        Self::new(x3, y3, self.curve.clone())
    }

    pub fn double(&self) -> Result<Self> {
        self.try_add(self)
    }

    /// Double-and-add scalar multiplication `coefficient * self`
    pub fn scale(&self, coefficient: &BigUint) -> Result<Self> {
        let mut coef = coefficient.clone();
        let mut current = self.clone();
        let mut result = Self::infinity(self.curve.clone());
        while !coef.is_zero() {
            if &coef % 2u32 == BigUint::one() {
                result = result.try_add(&current)?;
            }
            coef >>= 1usize;
            if !coef.is_zero() {
                current = current.double()?;
            }
        }
        Ok(result)
    }
}

impl<F: PrimeField + fmt::Display> fmt::Display for Point<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.coords {
            Coordinates::Infinity => write!(f, "Point(infinity)"),
            Coordinates::Affine { x, y } => write!(
                f,
                "Point({}, {})_{}_{}",
                x, y, self.curve.a, self.curve.b
            ),
        }
    }
}
