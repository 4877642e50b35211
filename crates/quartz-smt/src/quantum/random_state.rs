//! Random candidate states for the sampling fallback strategy.

use num_complex::Complex64;
use rand::Rng;

/// Draw a random amplitude vector with unit L2 norm: each component is
/// uniform in `[-1, 1]` on both axes, then the whole vector is scaled so
/// the squared moduli sum to 1.
pub fn sample_state<R: Rng + ?Sized>(dim: usize, rng: &mut R) -> Vec<Complex64> {
    loop {
        let raw: Vec<Complex64> = (0..dim)
            .map(|_| Complex64::new(rng.gen_range(-1.0..=1.0), rng.gen_range(-1.0..=1.0)))
            .collect();
        let norm: f64 = raw.iter().map(|a| a.norm_sqr()).sum::<f64>().sqrt();
        if norm > 1e-12 {
            return raw.into_iter().map(|a| a / norm).collect();
        }
        // All components landed at zero; draw again.
    }
}
