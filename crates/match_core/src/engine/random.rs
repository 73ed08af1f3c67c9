//! Per-trial random streams
//!
//! Every trial owns one [`RandomStream`]. The request seed keys a ChaCha8
//! generator and the run index selects its stream number, so two run indices
//! under one seed read disjoint keystreams and never share state.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Clone)]
pub struct RandomStream {
    rng: ChaCha8Rng,
    seed: u64,
    run_index: u64,
    draws: u64,
}

impl RandomStream {
    /// Independent stream for `run_index` under `seed`.
    pub fn derive(seed: u64, run_index: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(run_index);
        Self { rng, seed, run_index, draws: 0 }
    }

    /// Uniform draw in `[0, 1)` with 53 bits of precision.
    #[inline]
    pub fn next_uniform(&mut self) -> f64 {
        self.draws += 1;
        self.rng.gen::<f64>()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn run_index(&self) -> u64 {
        self.run_index
    }

    /// Number of draws taken so far.
    pub fn draws(&self) -> u64 {
        self.draws
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_draws(seed: u64, run_index: u64, n: usize) -> Vec<f64> {
        let mut stream = RandomStream::derive(seed, run_index);
        (0..n).map(|_| stream.next_uniform()).collect()
    }

    #[test]
    fn test_determinism() {
        assert_eq!(first_draws(42, 7, 1000), first_draws(42, 7, 1000));
    }

    #[test]
    fn test_draws_in_unit_interval() {
        for x in first_draws(1, 0, 10_000) {
            assert!((0.0..1.0).contains(&x), "draw {x} outside [0, 1)");
        }
    }

    #[test]
    fn test_different_run_indices_differ() {
        let base = first_draws(42, 0, 1000);
        for run_index in 1..200 {
            assert_ne!(base, first_draws(42, run_index, 1000), "run {run_index}");
        }
    }

    #[test]
    fn test_different_seeds_differ_per_index() {
        for run_index in 0..50 {
            assert_ne!(first_draws(42, run_index, 1000), first_draws(43, run_index, 1000));
        }
    }

    #[test]
    fn test_large_run_indices_distinct() {
        let a = first_draws(9, 999_999, 32);
        let b = first_draws(9, 999_998, 32);
        assert_ne!(a, b);
    }

    #[test]
    fn test_mean_and_cross_correlation() {
        let n = 20_000;
        let xs = first_draws(2024, 0, n);
        let ys = first_draws(2024, 1, n);

        let mean_x = xs.iter().sum::<f64>() / n as f64;
        let mean_y = ys.iter().sum::<f64>() / n as f64;
        assert!((mean_x - 0.5).abs() < 0.01, "mean {mean_x}");
        assert!((mean_y - 0.5).abs() < 0.01, "mean {mean_y}");

        let cov: f64 = xs.iter().zip(&ys).map(|(x, y)| (x - mean_x) * (y - mean_y)).sum();
        let var_x: f64 = xs.iter().map(|x| (x - mean_x).powi(2)).sum();
        let var_y: f64 = ys.iter().map(|y| (y - mean_y).powi(2)).sum();
        let r = cov / (var_x.sqrt() * var_y.sqrt());
        assert!(r.abs() < 0.05, "correlation {r}");
    }

    #[test]
    fn test_draw_counter() {
        let mut stream = RandomStream::derive(5, 3);
        for _ in 0..17 {
            stream.next_uniform();
        }
        assert_eq!(stream.draws(), 17);
        assert_eq!(stream.seed(), 5);
        assert_eq!(stream.run_index(), 3);
    }
}
