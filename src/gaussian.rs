//! Gaussian random numbers for weight initialization and perturbation.

use rand::distributions::Distribution;
use rand::Rng;

/// A normal distribution sampled with the polar (Marsaglia) form of the
/// Box–Muller transform.
///
/// Each draw produces two independent values. `sample` keeps the first and
/// discards the second, so one `sample` always consumes the same random
/// stream as one `sample_pair`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Gaussian {
    mean: f64,
    stddev: f64,
}

impl Gaussian {
    /// Creates a distribution with the given `mean` and standard deviation.
    ///
    /// A negative `stddev` is accepted and behaves like its absolute value.
    pub fn new(mean: f64, stddev: f64) -> Self {
        Gaussian { mean, stddev }
    }

    /// The standard normal distribution, `N(0, 1)`.
    pub fn standard() -> Self {
        Gaussian::new(0.0, 1.0)
    }

    /// Draws two independent values.
    pub fn sample_pair<R: Rng + ?Sized>(&self, rng: &mut R) -> (f64, f64) {
        let (u, v, s) = loop {
            let u = 2.0 * rng.gen::<f64>() - 1.0;
            let v = 2.0 * rng.gen::<f64>() - 1.0;
            let s = u * u + v * v;
            if s > 0.0 && s <= 1.0 {
                break (u, v, s);
            }
        };
        let t = (-2.0 * s.ln() / s).sqrt();
        (self.mean + self.stddev * u * t, self.mean + self.stddev * v * t)
    }
}

impl Distribution<f64> for Gaussian {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.sample_pair(rng).0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn seeded_draws_are_reproducible() {
        let gaussian = Gaussian::new(1.0, 2.0);
        let mut a = ChaCha8Rng::seed_from_u64(11);
        let mut b = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..100 {
            assert_eq!(gaussian.sample_pair(&mut a), gaussian.sample_pair(&mut b));
        }
    }

    #[test]
    fn sample_is_first_of_pair() {
        let gaussian = Gaussian::standard();
        let mut a = ChaCha8Rng::seed_from_u64(3);
        let mut b = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..20 {
            assert_eq!(gaussian.sample(&mut a), gaussian.sample_pair(&mut b).0);
        }
    }

    #[test]
    fn zero_stddev_returns_mean() {
        let gaussian = Gaussian::new(-4.5, 0.0);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(gaussian.sample_pair(&mut rng), (-4.5, -4.5));
    }

    #[test]
    fn moments_are_close_to_parameters() {
        let gaussian = Gaussian::new(3.0, 0.5);
        let mut rng = ChaCha8Rng::seed_from_u64(1234);
        let n = 20_000;
        let mut values = Vec::with_capacity(2 * n);
        for _ in 0..n {
            let (a, b) = gaussian.sample_pair(&mut rng);
            values.push(a);
            values.push(b);
        }
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>()
            / values.len() as f64;
        assert!((mean - 3.0).abs() < 0.02, "mean = {}", mean);
        assert!((variance.sqrt() - 0.5).abs() < 0.02, "stddev = {}", variance.sqrt());
    }
}
