//! # Short Weierstrass Curves over F_p
//!
//! `y^2 = x^3 + ax + b (mod p)` with affine points. The point at infinity
//! is represented as `(0, 0)`; this never collides with a real point because
//! `b` is non-zero modulo `p` for every curve the key generator samples.

use super::errors::{ArithmeticError, KeyGenerationError};
use super::modular::{add_mod, modular_inverse, modulo, mul_mod, to_binary};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Affine point. `Point::IDENTITY` is the point at infinity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: u64,
    pub y: u64,
}

impl Point {
    pub const IDENTITY: Point = Point { x: 0, y: 0 };

    pub const fn new(x: u64, y: u64) -> Self {
        Self { x, y }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_identity() {
            write!(f, "O")
        } else {
            write!(f, "({}, {})", self.x, self.y)
        }
    }
}

// =============================================================================
// GROUP LAW
// =============================================================================

/// The group law needs only `p` and `a`, so verifiers that never see `b`
/// use this directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CurveArithmetic {
    pub p: u64,
    pub a: u64,
}

impl CurveArithmetic {
    pub fn new(p: u64, a: u64) -> Self {
        Self { p, a }
    }

    /// `P + Q`.
    pub fn add(&self, lhs: Point, rhs: Point) -> Result<Point, ArithmeticError> {
        if lhs.is_identity() {
            return Ok(rhs);
        }
        if rhs.is_identity() {
            return Ok(lhs);
        }
        if lhs.x == rhs.x {
            if add_mod(lhs.y, rhs.y, self.p) == 0 {
                return Ok(Point::IDENTITY);
            }
            return self.double(lhs);
        }

        let p = self.p;
        let numerator = i128::from(rhs.y) - i128::from(lhs.y);
        let denominator = i128::from(rhs.x) - i128::from(lhs.x);
        let slope = mul_mod(modulo(numerator, p), modular_inverse(denominator, p)?, p);
        Ok(self.finish(slope, lhs, rhs.x))
    }

    /// `2P`. A point with `y = 0` has order two.
    pub fn double(&self, point: Point) -> Result<Point, ArithmeticError> {
        if point.is_identity() || point.y == 0 {
            return Ok(Point::IDENTITY);
        }

        let p = self.p;
        let numerator = add_mod(mul_mod(3, mul_mod(point.x, point.x, p), p), self.a % p, p);
        let denominator = i128::from(mul_mod(2, point.y, p));
        let slope = mul_mod(numerator, modular_inverse(denominator, p)?, p);
        Ok(self.finish(slope, point, point.x))
    }

    /// Shared tail of addition and doubling:
    /// `x3 = m^2 - x1 - x2`, `y3 = m(x1 - x3) - y1`.
    fn finish(&self, slope: u64, first: Point, other_x: u64) -> Point {
        let p = self.p;
        let x3 = modulo(
            i128::from(mul_mod(slope, slope, p)) - i128::from(first.x) - i128::from(other_x),
            p,
        );
        let dx = modulo(i128::from(first.x) - i128::from(x3), p);
        let y3 = modulo(i128::from(mul_mod(slope, dx, p)) - i128::from(first.y), p);
        Point::new(x3, y3)
    }

    /// `-P`.
    pub fn negate(&self, point: Point) -> Point {
        if point.is_identity() {
            return point;
        }
        Point::new(point.x, modulo(-i128::from(point.y), self.p))
    }

    /// `kP` by double-and-add over the bits of `k`, lowest first.
    pub fn multiply(&self, k: u64, point: Point) -> Result<Point, ArithmeticError> {
        let mut result = Point::IDENTITY;
        let mut addend = point;
        let bits = to_binary(k);
        let last = bits.len().saturating_sub(1);
        for (i, bit) in bits.into_iter().enumerate() {
            if bit {
                result = self.add(result, addend)?;
            }
            if i < last {
                addend = self.double(addend)?;
            }
        }
        Ok(result)
    }

    /// `kP` with `k` reduced modulo `order`, the order of `P`.
    pub fn double_and_add(&self, k: u64, point: Point, order: u64) -> Result<Point, ArithmeticError> {
        if order == 0 {
            return Err(ArithmeticError::ZeroModulus);
        }
        let k = k % order;
        if k == 0 || point.is_identity() {
            return Ok(Point::IDENTITY);
        }
        if k == 1 {
            return Ok(point);
        }
        self.multiply(k, point)
    }

    /// Order of `P` by repeated addition, or `None` if it exceeds `limit`.
    pub fn order_of(&self, point: Point, limit: u64) -> Result<Option<u64>, ArithmeticError> {
        if point.is_identity() {
            return Ok(Some(1));
        }
        let mut multiple = self.double(point)?;
        let mut k = 2u64;
        while !multiple.is_identity() {
            if k >= limit {
                return Ok(None);
            }
            multiple = self.add(multiple, point)?;
            k += 1;
        }
        Ok(Some(k))
    }
}

// =============================================================================
// CURVE
// =============================================================================

/// A non-singular curve `y^2 = x^3 + ax + b` over `F_p`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Curve {
    pub p: u64,
    pub a: u64,
    pub b: u64,
}

impl Curve {
    pub fn new(p: u64, a: u64, b: u64) -> Result<Self, KeyGenerationError> {
        if p < 3 {
            return Err(KeyGenerationError::ModulusTooSmall(p));
        }
        if !Self::is_non_singular(p, a, b) {
            return Err(KeyGenerationError::SingularCurve { p, a, b });
        }
        Ok(Self { p, a, b })
    }

    /// `4a^3 + 27b^2 != 0 (mod p)`.
    pub fn is_non_singular(p: u64, a: u64, b: u64) -> bool {
        let a = a % p;
        let b = b % p;
        let a_cubed = mul_mod(mul_mod(a, a, p), a, p);
        let b_squared = mul_mod(b, b, p);
        add_mod(mul_mod(4, a_cubed, p), mul_mod(27, b_squared, p), p) != 0
    }

    pub fn arithmetic(&self) -> CurveArithmetic {
        CurveArithmetic::new(self.p, self.a)
    }

    /// `x^3 + ax + b mod p`.
    pub fn rhs(&self, x: u64) -> u64 {
        let p = self.p;
        let x = x % p;
        let x_cubed = mul_mod(mul_mod(x, x, p), x, p);
        add_mod(add_mod(x_cubed, mul_mod(self.a, x, p), p), self.b % p, p)
    }

    /// True for the identity and for affine points satisfying the equation.
    pub fn contains(&self, point: Point) -> bool {
        if point.is_identity() {
            return true;
        }
        point.x < self.p && point.y < self.p && mul_mod(point.y, point.y, self.p) == self.rhs(point.x)
    }

    /// Every affine point, ordered by `x`, then `y < p - y`.
    ///
    /// Uses a table of quadratic residues: each `x` whose right-hand side is
    /// a non-zero residue contributes two points, a zero right-hand side
    /// contributes `(x, 0)`.
    pub fn enumerate_points(&self) -> Vec<Point> {
        let p = self.p;
        let mut roots: HashMap<u64, u64> = HashMap::with_capacity((p / 2) as usize);
        for y in 1..=(p - 1) / 2 {
            roots.entry(mul_mod(y, y, p)).or_insert(y);
        }

        let mut points = Vec::with_capacity(p as usize);
        for x in 0..p {
            let fx = self.rhs(x);
            if fx == 0 {
                points.push(Point::new(x, 0));
            } else if let Some(&y) = roots.get(&fx) {
                points.push(Point::new(x, y));
                points.push(Point::new(x, p - y));
            }
        }
        points
    }

    /// `|E(F_p)|` including the point at infinity.
    pub fn group_order(&self) -> u64 {
        self.enumerate_points().len() as u64 + 1
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "y^2 = x^3 + {}x + {} (mod {})", self.a, self.b, self.p)
    }
}
