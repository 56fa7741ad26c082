//! # Key Generation
//!
//! Every node draws its own small curve and key pair at startup:
//!
//! 1. sample a 4-digit prime `p` and 3-digit primes `a`, `b` until the curve
//!    is non-singular;
//! 2. enumerate its points and pick a generator `G` of prime order `n`;
//! 3. draw `d` in `[1, n)` and publish `Q = dG`.

use super::curve::{Curve, Point};
use super::errors::KeyGenerationError;
use super::primes::{generate_prime, is_prime};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, trace};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Decimal digits of the field prime.
pub const FIELD_PRIME_DIGITS: u32 = 4;

/// Decimal digits of the curve coefficients `a` and `b`.
pub const COEFFICIENT_DIGITS: u32 = 3;

/// Curves sampled before key generation gives up.
pub const MAX_CURVE_ATTEMPTS: usize = 64;

/// Points whose order is computed on one curve before it is discarded.
pub const MAX_ORDER_PROBES: usize = 16;

/// Public half of a key pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    pub curve: Curve,
    /// Generator
    pub g: Point,
    /// Prime order of `g`
    pub n: u64,
    /// `d * g`
    pub q: Point,
}

/// Secret scalar `d`. Zeroed on drop, never printed.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey {
    scalar: u64,
}

impl PrivateKey {
    pub(crate) fn new(scalar: u64) -> Self {
        Self { scalar }
    }

    pub(crate) fn scalar(&self) -> u64 {
        self.scalar
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(***)")
    }
}

/// A node's signing identity.
#[derive(Clone, Debug)]
pub struct KeyPair {
    public: PublicKey,
    private: PrivateKey,
}

impl KeyPair {
    /// Build a key pair from explicit parameters, deriving `Q = dG`.
    pub fn from_parts(curve: Curve, g: Point, n: u64, d: u64) -> Result<Self, KeyGenerationError> {
        if n < 2 {
            return Err(KeyGenerationError::InvalidKeyMaterial(format!("order {n} is below 2")));
        }
        if d == 0 || d >= n {
            return Err(KeyGenerationError::InvalidKeyMaterial(format!(
                "private scalar must lie in [1, {n})"
            )));
        }
        if g.is_identity() || !curve.contains(g) {
            return Err(KeyGenerationError::InvalidKeyMaterial(format!(
                "generator {g} is not a point of {curve}"
            )));
        }

        let q = curve.arithmetic().double_and_add(d, g, n)?;
        Ok(Self {
            public: PublicKey { curve, g, n, q },
            private: PrivateKey::new(d),
        })
    }

    pub fn public(&self) -> &PublicKey {
        &self.public
    }

    pub(crate) fn private(&self) -> &PrivateKey {
        &self.private
    }
}

/// Draw primes until `4a^3 + 27b^2 != 0 (mod p)`.
pub fn sample_curve<R: Rng + ?Sized>(rng: &mut R) -> Result<Curve, KeyGenerationError> {
    let mut last_error = None;
    for _ in 0..MAX_CURVE_ATTEMPTS {
        let p = generate_prime(FIELD_PRIME_DIGITS, rng)?;
        let a = generate_prime(COEFFICIENT_DIGITS, rng)?;
        let b = generate_prime(COEFFICIENT_DIGITS, rng)?;
        match Curve::new(p, a, b) {
            Ok(curve) => return Ok(curve),
            Err(err) => {
                trace!(p, a, b, "Sampled singular curve");
                last_error = Some(err);
            }
        }
    }
    Err(last_error.unwrap_or(KeyGenerationError::NoPrimeOrderPoint {
        attempts: MAX_CURVE_ATTEMPTS,
    }))
}

/// Find a point of prime order on `curve`.
///
/// If the group order itself is prime every point qualifies. Otherwise up to
/// [`MAX_ORDER_PROBES`] points with `y != 0` are probed, starting at a random
/// offset, and the first one of prime order wins.
pub fn find_prime_order_point<R: Rng + ?Sized>(
    curve: &Curve,
    rng: &mut R,
) -> Result<Option<(Point, u64)>, KeyGenerationError> {
    let points = curve.enumerate_points();
    if points.is_empty() {
        return Ok(None);
    }
    let group_order = points.len() as u64 + 1;

    if is_prime(group_order, rng) {
        let g = points[rng.gen_range(0..points.len())];
        return Ok(Some((g, group_order)));
    }

    let arithmetic = curve.arithmetic();
    let start = rng.gen_range(0..points.len());
    let candidates = points
        .iter()
        .cycle()
        .skip(start)
        .take(points.len())
        .filter(|point| point.y != 0)
        .take(MAX_ORDER_PROBES);

    for &point in candidates {
        if let Some(order) = arithmetic.order_of(point, group_order)? {
            if is_prime(order, rng) {
                return Ok(Some((point, order)));
            }
        }
    }
    Ok(None)
}

/// Generate a fresh key pair on a freshly sampled curve.
pub fn generate_key<R: Rng + ?Sized>(rng: &mut R) -> Result<KeyPair, KeyGenerationError> {
    for attempt in 1..=MAX_CURVE_ATTEMPTS {
        let curve = sample_curve(rng)?;
        match find_prime_order_point(&curve, rng)? {
            Some((g, n)) => {
                let d = rng.gen_range(1..n);
                let key_pair = KeyPair::from_parts(curve, g, n, d)?;
                debug!(attempt, p = curve.p, a = curve.a, b = curve.b, n, "Generated key pair");
                return Ok(key_pair);
            }
            None => trace!(attempt, p = curve.p, "No prime-order point, resampling curve"),
        }
    }
    Err(KeyGenerationError::NoPrimeOrderPoint {
        attempts: MAX_CURVE_ATTEMPTS,
    })
}
