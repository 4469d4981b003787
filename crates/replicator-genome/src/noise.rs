//! Gaussian noise drawn from the simulation's uniform stream.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Draw from `Normal(mean, std_dev)` with the Box-Muller transform.
pub fn gaussian(rng: &mut ChaCha8Rng, mean: f64, std_dev: f64) -> f64 {
    let u1 = rng.gen::<f64>().max(f64::MIN_POSITIVE);
    let u2 = rng.gen::<f64>();
    let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
    mean + z * std_dev
}
