use super::transpose::clamp_transpose;

pub const VELOCITY_MIN: u8 = 1;
pub const VELOCITY_MAX: u8 = 127;
pub const GAMMA_MIN: f64 = 0.4;
pub const GAMMA_MAX: f64 = 2.5;
pub const GAMMA_DEFAULT: f64 = 1.0;

pub fn clamp_velocity(value: i32) -> u8 {
    value.clamp(VELOCITY_MIN as i32, VELOCITY_MAX as i32) as u8
}

/// NaN falls back to the linear curve; infinities saturate like any other value.
pub fn clamp_gamma(value: f64) -> f64 {
    if value.is_nan() {
        GAMMA_DEFAULT
    } else {
        value.clamp(GAMMA_MIN, GAMMA_MAX)
    }
}

/// Live engine configuration.
///
/// Fields are private so every value that reaches the engine went through a
/// clamp. Updates produce a new value instead of mutating in place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MappingConfig {
    transpose: i32,
    vel_min: u8,
    vel_max: u8,
    gamma: f64,
    thru: bool,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            transpose: 0,
            vel_min: VELOCITY_MIN,
            vel_max: VELOCITY_MAX,
            gamma: GAMMA_DEFAULT,
            thru: true,
        }
    }
}

impl MappingConfig {
    pub fn new(transpose: i32, vel_min: i32, vel_max: i32, gamma: f64, thru: bool) -> Self {
        Self {
            transpose: clamp_transpose(transpose),
            vel_min: clamp_velocity(vel_min),
            vel_max: clamp_velocity(vel_max),
            gamma: clamp_gamma(gamma),
            thru,
        }
    }

    pub fn transpose(&self) -> i32 {
        self.transpose
    }

    pub fn vel_min(&self) -> u8 {
        self.vel_min
    }

    pub fn vel_max(&self) -> u8 {
        self.vel_max
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn thru(&self) -> bool {
        self.thru
    }

    pub fn with_transpose(self, transpose: i32) -> Self {
        Self { transpose: clamp_transpose(transpose), ..self }
    }

    pub fn with_vel_min(self, vel_min: i32) -> Self {
        Self { vel_min: clamp_velocity(vel_min), ..self }
    }

    pub fn with_vel_max(self, vel_max: i32) -> Self {
        Self { vel_max: clamp_velocity(vel_max), ..self }
    }

    pub fn with_gamma(self, gamma: f64) -> Self {
        Self { gamma: clamp_gamma(gamma), ..self }
    }

    pub fn with_thru(self, thru: bool) -> Self {
        Self { thru, ..self }
    }

    pub fn shift_transpose(self, delta: i32) -> Self {
        self.with_transpose(self.transpose.saturating_add(delta))
    }

    /// Apply a partial update. Each present field is clamped on its own.
    pub fn apply(&self, patch: &MappingPatch) -> Self {
        let mut next = *self;
        if let Some(t) = patch.transpose {
            next = next.with_transpose(t);
        }
        if let Some(v) = patch.vel_min {
            next = next.with_vel_min(v);
        }
        if let Some(v) = patch.vel_max {
            next = next.with_vel_max(v);
        }
        if let Some(g) = patch.gamma {
            next = next.with_gamma(g);
        }
        if let Some(thru) = patch.thru {
            next = next.with_thru(thru);
        }
        next
    }
}

impl std::fmt::Display for MappingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "transpose {:+} | velocity {}..{} | gamma {:.2} | thru {}",
            self.transpose,
            self.vel_min,
            self.vel_max,
            self.gamma,
            if self.thru { "on" } else { "off" }
        )
    }
}

/// Partial, unvalidated configuration update.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MappingPatch {
    pub transpose: Option<i32>,
    pub vel_min: Option<i32>,
    pub vel_max: Option<i32>,
    pub gamma: Option<f64>,
    pub thru: Option<bool>,
}

impl MappingPatch {
    pub fn transpose(value: i32) -> Self {
        Self { transpose: Some(value), ..Self::default() }
    }

    pub fn vel_range(min: i32, max: i32) -> Self {
        Self { vel_min: Some(min), vel_max: Some(max), ..Self::default() }
    }

    pub fn gamma(value: f64) -> Self {
        Self { gamma: Some(value), ..Self::default() }
    }

    pub fn thru(value: bool) -> Self {
        Self { thru: Some(value), ..Self::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_clamps_every_field() {
        let c = MappingConfig::new(100, 0, 300, 9.0, false);
        assert_eq!(c.transpose(), 24);
        assert_eq!(c.vel_min(), 1);
        assert_eq!(c.vel_max(), 127);
        assert_eq!(c.gamma(), 2.5);
        assert!(!c.thru());
    }

    #[test]
    fn gamma_non_finite() {
        assert_eq!(clamp_gamma(f64::NAN), 1.0);
        assert_eq!(clamp_gamma(f64::INFINITY), 2.5);
        assert_eq!(clamp_gamma(f64::NEG_INFINITY), 0.4);
    }

    #[test]
    fn apply_leaves_base_untouched() {
        let base = MappingConfig::default();
        let patch = MappingPatch { transpose: Some(-30), gamma: Some(0.1), ..Default::default() };
        let next = base.apply(&patch);
        assert_eq!(base, MappingConfig::default());
        assert_eq!(next.transpose(), -24);
        assert_eq!(next.gamma(), 0.4);
        assert_eq!(next.vel_min(), 1);
        assert!(next.thru());
    }

    #[test]
    fn inverted_range_is_stored_as_given() {
        let c = MappingConfig::default().apply(&MappingPatch::vel_range(100, 20));
        assert_eq!((c.vel_min(), c.vel_max()), (100, 20));
    }

    #[test]
    fn shift_saturates() {
        let c = MappingConfig::default().with_transpose(23);
        assert_eq!(c.shift_transpose(1).transpose(), 24);
        assert_eq!(c.shift_transpose(5).transpose(), 24);
        assert_eq!(c.shift_transpose(i32::MIN).transpose(), -24);
    }
}
