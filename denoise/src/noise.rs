//! Synthetic salt-and-pepper noise.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};
use crate::raster::Raster;

/// Sets a `density` fraction of pixels to 0 or 255 with equal probability,
/// all channels of a pixel alike. Returns the number of corrupted pixels.
///
/// The same `seed` always corrupts the same pixels.
pub fn add_salt_and_pepper(raster: &mut Raster, density: f64, seed: u64) -> Result<usize> {
    if !(0.0..=1.0).contains(&density) {
        return Err(Error::InvalidConfig(format!(
            "noise density {} outside 0..=1",
            density
        )));
    }

    let channels = raster.channels();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut corrupted = 0;

    for pixel in raster.data_mut().chunks_exact_mut(channels) {
        if rng.random::<f64>() < density {
            let value = if rng.random_bool(0.5) { 255 } else { 0 };
            pixel.fill(value);
            corrupted += 1;
        }
    }

    tracing::debug!(density, seed, corrupted, "Injected salt-and-pepper noise");

    Ok(corrupted)
}
