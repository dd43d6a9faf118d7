// src/simulation/noise_models.rs
//! Gaussian noise source for synthetic recordings

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Zero-mean Gaussian noise generator.
///
/// Seeded generators are reproducible; unseeded ones draw their seed from the
/// operating system.
pub struct NoiseModel {
    rng: StdRng,
    spare: Option<f64>,
}

impl NoiseModel {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng, spare: None }
    }

    /// One standard normal deviate
    pub fn standard_normal(&mut self) -> f64 {
        if let Some(z) = self.spare.take() {
            return z;
        }
        let (z0, z1) = self.box_muller_transform();
        self.spare = Some(z1);
        z0
    }

    /// One N(0, sd^2) deviate
    pub fn sample(&mut self, sd: f64) -> f64 {
        self.standard_normal() * sd
    }

    /// Add N(0, sd^2) noise to every element in place. A zero `sd` leaves the
    /// data untouched.
    pub fn add_noise(&mut self, data: &mut Array1<f64>, sd: f64) {
        if sd == 0.0 {
            return;
        }
        data.iter_mut().for_each(|v| *v += self.sample(sd));
    }

    fn box_muller_transform(&mut self) -> (f64, f64) {
        // u1 in (0, 1] keeps the logarithm finite
        let u1 = 1.0 - self.rng.gen::<f64>();
        let u2 = self.rng.gen::<f64>();
        let r = (-2.0 * u1.ln()).sqrt();
        let theta = 2.0 * std::f64::consts::PI * u2;
        (r * theta.cos(), r * theta.sin())
    }
}
