//! Gamma-shaped velocity mapping.
//!
//! gamma < 1 lifts soft playing, gamma > 1 needs a harder touch for the same
//! output, gamma = 1 is linear.
use super::mapping::{clamp_gamma, clamp_velocity, MappingConfig};

pub fn apply_velocity(velocity: u8, config: &MappingConfig) -> u8 {
    let x = clamp_velocity(velocity as i32) as f64 / 127.0;
    let shaped = x.powf(clamp_gamma(config.gamma()));
    let min = config.vel_min() as f64;
    let max = config.vel_max() as f64;
    // An inverted range is not rejected; the final clamp keeps it valid.
    let out = (min + shaped * (max - min)).round();
    clamp_velocity(out as i32)
}
