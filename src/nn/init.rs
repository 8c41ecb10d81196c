//! Weight initialization.
//!
//! Every initializer draws from a caller-supplied RNG so that a model built
//! from the same seed is bit-for-bit reproducible.
//!
//! # Usage Example
//! ```
//! use carousel::nn::init::{uniform_init, Initializer};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let mut weights = vec![0.0; 16];
//! uniform_init(&mut weights, -0.1, 0.1, &mut rng).unwrap();
//! assert!(weights.iter().all(|&w| (-0.1..0.1).contains(&w)));
//!
//! let init = Initializer::Normal { mean: 0.0, std_dev: 0.05 };
//! init.initialize(&mut weights, &mut rng).unwrap();
//! ```

use crate::error::{CarouselError, Result};
use rand::{distributions::Uniform, Rng};
use rand_distr::Normal;

/// Fills `values` with samples from a uniform distribution over `[low, high)`.
///
/// # Errors
/// `ConfigurationError` if either bound or their span is not finite, or if
/// `low >= high`.
pub fn uniform_init<R: Rng>(
    values: &mut [f64],
    low: f64,
    high: f64,
    rng: &mut R,
) -> Result<()> {
    if !low.is_finite() || !high.is_finite() || low >= high || !(high - low).is_finite() {
        return Err(CarouselError::config(format!(
            "uniform init needs finite bounds with low < high, got [{low}, {high})"
        )));
    }
    let uniform = Uniform::new(low, high);
    values.iter_mut().for_each(|v| *v = rng.sample(&uniform));
    Ok(())
}

/// Fills `values` with samples from a normal distribution.
///
/// # Errors
/// `ConfigurationError` if `mean` is not finite or `std_dev` is negative or not finite.
pub fn normal_init<R: Rng>(
    values: &mut [f64],
    mean: f64,
    std_dev: f64,
    rng: &mut R,
) -> Result<()> {
    if !mean.is_finite() || !std_dev.is_finite() || std_dev < 0.0 {
        return Err(CarouselError::config(format!(
            "normal init needs a finite mean and a finite non-negative std_dev, got mean={mean}, std_dev={std_dev}"
        )));
    }
    let normal = Normal::new(mean, std_dev)
        .map_err(|e| CarouselError::config(format!("normal init: {e}")))?;
    values.iter_mut().for_each(|v| *v = rng.sample(&normal));
    Ok(())
}

/// Initialization scheme for the gate weights and biases.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Initializer {
    /// Uniform over `[low, high)`.
    Uniform { low: f64, high: f64 },
    /// Gaussian with the given mean and standard deviation.
    Normal { mean: f64, std_dev: f64 },
}

impl Default for Initializer {
    /// Uniform over `[-0.1, 0.1)`.
    fn default() -> Self {
        Initializer::Uniform {
            low: -0.1,
            high: 0.1,
        }
    }
}

impl Initializer {
    /// Checks the scheme's parameters without drawing any samples.
    pub fn validate(&self) -> Result<()> {
        self.initialize(&mut [], &mut rand::rngs::mock::StepRng::new(0, 1))
    }

    /// Fills `values` according to this scheme.
    pub fn initialize<R: Rng>(&self, values: &mut [f64], rng: &mut R) -> Result<()> {
        match *self {
            Initializer::Uniform { low, high } => uniform_init(values, low, high, rng),
            Initializer::Normal { mean, std_dev } => normal_init(values, mean, std_dev, rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_uniform_init_range_and_determinism() {
        let mut a = vec![0.0; 200];
        let mut b = vec![0.0; 200];
        uniform_init(&mut a, -0.1, 0.1, &mut StdRng::seed_from_u64(3)).unwrap();
        uniform_init(&mut b, -0.1, 0.1, &mut StdRng::seed_from_u64(3)).unwrap();

        assert_eq!(a, b);
        assert!(a.iter().all(|&v| v >= -0.1 && v < 0.1));
        assert!(a.iter().any(|&v| v != a[0]));
    }

    #[test]
    fn test_uniform_init_rejects_bad_bounds() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut v = vec![0.0; 4];
        assert!(matches!(
            uniform_init(&mut v, 0.1, 0.1, &mut rng),
            Err(CarouselError::ConfigurationError(_))
        ));
        assert!(uniform_init(&mut v, f64::NEG_INFINITY, 0.0, &mut rng).is_err());
        assert_eq!(v, vec![0.0; 4]);
    }

    #[test]
    fn test_uniform_init_rejects_overflowing_span() {
        let mut v = vec![0.0; 4];
        assert!(matches!(
            uniform_init(&mut v, -1e308, 1e308, &mut StdRng::seed_from_u64(0)),
            Err(CarouselError::ConfigurationError(_))
        ));
        assert!(Initializer::Uniform { low: -f64::MAX, high: f64::MAX }
            .validate()
            .is_err());
        assert_eq!(v, vec![0.0; 4]);
    }

    #[test]
    fn test_normal_init() {
        let mut v = vec![0.0; 1000];
        normal_init(&mut v, 1.0, 0.01, &mut StdRng::seed_from_u64(11)).unwrap();
        let mean = v.iter().sum::<f64>() / v.len() as f64;
        assert!((mean - 1.0).abs() < 0.01);

        assert!(normal_init(&mut v, 0.0, -1.0, &mut StdRng::seed_from_u64(0)).is_err());
        assert!(normal_init(&mut v, f64::NAN, 1.0, &mut StdRng::seed_from_u64(0)).is_err());
    }

    #[test]
    fn test_normal_init_rejects_negative_std_dev() {
        let mut v = vec![0.5; 3];
        assert!(matches!(
            normal_init(&mut v, 0.0, -1.0, &mut StdRng::seed_from_u64(0)),
            Err(CarouselError::ConfigurationError(_))
        ));
        assert_eq!(v, vec![0.5; 3]);
        assert!(Initializer::Normal { mean: 0.0, std_dev: -0.1 }.validate().is_err());

        // Zero spread is a valid, if degenerate, scheme.
        normal_init(&mut v, 0.25, 0.0, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(v, vec![0.25; 3]);
    }

    #[test]
    fn test_initializer_validate() {
        assert!(Initializer::default().validate().is_ok());
        assert!(Initializer::Uniform { low: 1.0, high: -1.0 }.validate().is_err());
        assert!(Initializer::Normal { mean: 0.0, std_dev: f64::INFINITY }
            .validate()
            .is_err());
    }
}
