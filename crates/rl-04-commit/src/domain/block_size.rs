//! Declared block sizes.
//!
//! Blocks carry a declared size rather than a measured one. It is either a
//! constant or drawn from a normal distribution, and never smaller than the
//! header plus the transactions it holds.

use crate::error::ConfigError;
use rand::Rng;
use serde::Deserialize;
use std::f64::consts::TAU;
use std::fmt;
use std::str::FromStr;

/// Mean of the default size distribution, in bytes.
pub const DEFAULT_MEAN_BLOCK_SIZE: f64 = 603.4;

/// Standard deviation of the default size distribution, in bytes.
pub const DEFAULT_BLOCK_SIZE_STD_DEV: f64 = 60.0;

/// How the aggregator sizes a block.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum BlockSizePolicy {
    Fixed { bytes: u32 },
    Gaussian { mean: f64, std_dev: f64 },
}

impl Default for BlockSizePolicy {
    fn default() -> Self {
        BlockSizePolicy::Gaussian {
            mean: DEFAULT_MEAN_BLOCK_SIZE,
            std_dev: DEFAULT_BLOCK_SIZE_STD_DEV,
        }
    }
}

impl BlockSizePolicy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            BlockSizePolicy::Fixed { .. } => Ok(()),
            BlockSizePolicy::Gaussian { mean, std_dev } => {
                if !mean.is_finite() || mean < 0.0 {
                    return Err(ConfigError::InvalidBlockSize(format!("mean {mean}")));
                }
                if !std_dev.is_finite() || std_dev < 0.0 {
                    return Err(ConfigError::InvalidBlockSize(format!("standard deviation {std_dev}")));
                }
                Ok(())
            }
        }
    }

    /// Draw a size, raised to `floor` if it falls below.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, floor: u32) -> u32 {
        let raw = match *self {
            BlockSizePolicy::Fixed { bytes } => f64::from(bytes),
            BlockSizePolicy::Gaussian { mean, std_dev } => mean + std_dev * standard_normal(rng),
        };
        let size = if raw.is_finite() && raw > 0.0 {
            raw.round().min(f64::from(u32::MAX)) as u32
        } else {
            0
        };
        size.max(floor)
    }
}

/// One draw from N(0, 1) by the Box-Muller transform.
fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // gen() is in [0, 1); flip it so ln() never sees zero
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos()
}

impl fmt::Display for BlockSizePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockSizePolicy::Fixed { bytes } => write!(f, "fixed:{bytes}"),
            BlockSizePolicy::Gaussian { mean, std_dev } => write!(f, "gaussian:{mean}:{std_dev}"),
        }
    }
}

/// Parses `fixed:<bytes>`, `gaussian` or `gaussian:<mean>:<std_dev>`.
impl FromStr for BlockSizePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidBlockSize(format!("cannot parse '{s}'"));
        let parts: Vec<&str> = s.trim().split(':').collect();
        let policy = match parts.as_slice() {
            ["fixed", bytes] => BlockSizePolicy::Fixed {
                bytes: bytes.parse().map_err(|_| invalid())?,
            },
            ["gaussian"] => BlockSizePolicy::default(),
            ["gaussian", mean, std_dev] => BlockSizePolicy::Gaussian {
                mean: mean.parse().map_err(|_| invalid())?,
                std_dev: std_dev.parse().map_err(|_| invalid())?,
            },
            _ => return Err(invalid()),
        };
        policy.validate()?;
        Ok(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_fixed_size_respects_floor() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(BlockSizePolicy::Fixed { bytes: 1000 }.sample(&mut rng, 181), 1000);
        assert_eq!(BlockSizePolicy::Fixed { bytes: 50 }.sample(&mut rng, 181), 181);
    }

    #[test]
    fn test_gaussian_mean_is_close() {
        let mut rng = StdRng::seed_from_u64(7);
        let policy = BlockSizePolicy::default();
        let draws = 2_000;
        let total: u64 = (0..draws).map(|_| u64::from(policy.sample(&mut rng, 0))).sum();
        let mean = total as f64 / draws as f64;
        assert!((mean - DEFAULT_MEAN_BLOCK_SIZE).abs() < 10.0, "mean {mean}");
    }

    #[test]
    fn test_zero_spread_is_constant() {
        let mut rng = StdRng::seed_from_u64(3);
        let policy = BlockSizePolicy::Gaussian {
            mean: 400.0,
            std_dev: 0.0,
        };
        assert!((0..20).all(|_| policy.sample(&mut rng, 181) == 400));
    }

    #[test]
    fn test_parse() {
        assert_eq!("fixed:800".parse(), Ok(BlockSizePolicy::Fixed { bytes: 800 }));
        assert_eq!("gaussian".parse(), Ok(BlockSizePolicy::default()));
        assert_eq!(
            "gaussian:500:25.5".parse(),
            Ok(BlockSizePolicy::Gaussian {
                mean: 500.0,
                std_dev: 25.5
            })
        );
        assert!("fixed".parse::<BlockSizePolicy>().is_err());
        assert!("gaussian:500:-1".parse::<BlockSizePolicy>().is_err());
        assert!("poisson:3".parse::<BlockSizePolicy>().is_err());
    }

    #[test]
    fn test_display_round_trips() {
        let policy = BlockSizePolicy::Gaussian {
            mean: 603.4,
            std_dev: 60.0,
        };
        assert_eq!(policy.to_string(), "gaussian:603.4:60");
        assert_eq!(policy.to_string().parse(), Ok(policy));
    }
}
