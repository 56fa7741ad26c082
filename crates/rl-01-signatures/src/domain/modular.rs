//! # Modular Arithmetic
//!
//! Integer arithmetic over `Z/mZ` for moduli below 2^63.
//!
//! Products are formed in `u128` and signed intermediates in `i128`, so no
//! operation here overflows or loses precision.

use super::errors::ArithmeticError;

/// Reduce `a` into `[0, m)`, also for negative `a`.
///
/// `m` must be non-zero.
pub fn modulo(a: i128, m: u64) -> u64 {
    let r = a.rem_euclid(i128::from(m));
    r as u64
}

/// `a * b mod m` without overflow.
pub fn mul_mod(a: u64, b: u64, m: u64) -> u64 {
    ((u128::from(a) * u128::from(b)) % u128::from(m)) as u64
}

/// `a + b mod m` without overflow.
pub fn add_mod(a: u64, b: u64, m: u64) -> u64 {
    ((u128::from(a) + u128::from(b)) % u128::from(m)) as u64
}

/// Square-and-multiply exponentiation. `mod_pow(_, _, 1) == 0`.
pub fn mod_pow(base: u64, mut exp: u64, modulus: u64) -> u64 {
    if modulus == 1 {
        return 0;
    }
    let mut result = 1u64;
    let mut base = base % modulus;
    while exp > 0 {
        if exp & 1 == 1 {
            result = mul_mod(result, base, modulus);
        }
        base = mul_mod(base, base, modulus);
        exp >>= 1;
    }
    result
}

/// Multiplicative inverse of `a` modulo `n` by the extended Euclidean
/// algorithm. The result lies in `[0, n)`.
pub fn modular_inverse(a: i128, n: u64) -> Result<u64, ArithmeticError> {
    if n == 0 {
        return Err(ArithmeticError::ZeroModulus);
    }

    let (mut old_r, mut r) = (i128::from(modulo(a, n)), i128::from(n));
    let (mut old_s, mut s) = (1i128, 0i128);
    while r != 0 {
        let q = old_r / r;
        (old_r, r) = (r, old_r - q * r);
        (old_s, s) = (s, old_s - q * s);
    }

    if old_r != 1 {
        return Err(ArithmeticError::NoInverse { value: a, modulus: n });
    }
    Ok(modulo(old_s, n))
}

/// Bits of `n`, lowest first. `to_binary(0)` is empty.
pub fn to_binary(mut n: u64) -> Vec<bool> {
    let mut bits = Vec::with_capacity(64);
    while n > 0 {
        bits.push(n & 1 == 1);
        n >>= 1;
    }
    bits
}
