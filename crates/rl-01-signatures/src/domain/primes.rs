//! # Primality
//!
//! Trial division by the primes below 1000 followed by Miller–Rabin.

use super::errors::ArithmeticError;
use super::modular::{mod_pow, mul_mod};
use rand::Rng;

/// Miller–Rabin rounds after trial division.
pub const MILLER_RABIN_ROUNDS: usize = 5;

/// Largest digit count [`generate_prime`] accepts.
pub const MAX_PRIME_DIGITS: u32 = 18;

/// The 168 primes below 1000.
pub const SMALL_PRIMES: [u64; 168] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89,
    97, 101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191,
    193, 197, 199, 211, 223, 227, 229, 233, 239, 241, 251, 257, 263, 269, 271, 277, 281, 283, 293,
    307, 311, 313, 317, 331, 337, 347, 349, 353, 359, 367, 373, 379, 383, 389, 397, 401, 409, 419,
    421, 431, 433, 439, 443, 449, 457, 461, 463, 467, 479, 487, 491, 499, 503, 509, 521, 523, 541,
    547, 557, 563, 569, 571, 577, 587, 593, 599, 601, 607, 613, 617, 619, 631, 641, 643, 647, 653,
    659, 661, 673, 677, 683, 691, 701, 709, 719, 727, 733, 739, 743, 751, 757, 761, 769, 773, 787,
    797, 809, 811, 821, 823, 827, 829, 839, 853, 857, 859, 863, 877, 881, 883, 887, 907, 911, 919,
    929, 937, 941, 947, 953, 967, 971, 977, 983, 991, 997,
];

/// Probabilistic primality test.
///
/// Exact for `n < 1000`. Above that, a composite survives all
/// [`MILLER_RABIN_ROUNDS`] random bases with probability at most `4^-5`.
pub fn is_prime<R: Rng + ?Sized>(n: u64, rng: &mut R) -> bool {
    if n < 2 {
        return false;
    }
    for &q in SMALL_PRIMES.iter() {
        if n == q {
            return true;
        }
        if n % q == 0 {
            return false;
        }
    }
    miller_rabin(n, MILLER_RABIN_ROUNDS, rng)
}

/// `n` must be odd and greater than 3.
fn miller_rabin<R: Rng + ?Sized>(n: u64, rounds: usize, rng: &mut R) -> bool {
    let mut d = n - 1;
    let mut r = 0u32;
    while d % 2 == 0 {
        d /= 2;
        r += 1;
    }

    'witness: for _ in 0..rounds {
        let a = rng.gen_range(2..=n - 2);
        let mut x = mod_pow(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..r {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

/// A random prime with exactly `digits` decimal digits.
///
/// Starts from a random odd candidate and steps by two; if the search runs
/// past the digit width it restarts from a fresh candidate.
pub fn generate_prime<R: Rng + ?Sized>(digits: u32, rng: &mut R) -> Result<u64, ArithmeticError> {
    if digits == 0 || digits > MAX_PRIME_DIGITS {
        return Err(ArithmeticError::InvalidDigits(digits));
    }
    let low = 10u64.pow(digits - 1);
    let high = 10u64.pow(digits) - 1;

    loop {
        let mut candidate = rng.gen_range(low..=high) | 1;
        while candidate <= high {
            if is_prime(candidate, rng) {
                return Ok(candidate);
            }
            candidate += 2;
        }
    }
}
