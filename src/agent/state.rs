//! Quantized state keys for the value table.
//!
//! A [`StateKey`] is a bucketed summary of the ball's kinematics. Raw samples
//! coming out of the physics world are scaled by `10^precision` and rounded to
//! the nearest integer, so two samples that land in the same bucket are the
//! same state. Readings outside the sanity bound (including NaN/infinity) are
//! mapped to bucket zero.

use std::{
    fmt,
    ops::{Add, Mul, Sub},
};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Largest precision accepted by [`QuantizerConfig::validate`].
pub const MAX_PRECISION: u32 = 6;

/// A two-dimensional sample as reported by the physics world.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn dot(&self, other: Vec2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Rotated a quarter turn; the velocity direction of a point at `self`
    /// relative to a pivot spinning with positive angular velocity.
    pub fn perp(&self) -> Vec2 {
        Vec2::new(-self.y, self.x)
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// Everything the environment reports about the ball and flippers in one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BallSnapshot {
    pub position: Vec2,
    pub velocity: Vec2,
    pub left_flipper_active: bool,
    pub right_flipper_active: bool,
}

/// Quantized, totally ordered key identifying a state in the value table.
///
/// Field order defines the lexicographic ordering: position x, position y,
/// velocity x, velocity y, then the flipper flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateKey {
    pos_x: i32,
    pos_y: i32,
    vel_x: i32,
    vel_y: i32,
    left_flipper: bool,
    right_flipper: bool,
}

impl StateKey {
    /// Build a key directly from bucket values.
    pub const fn from_buckets(pos_x: i32, pos_y: i32, vel_x: i32, vel_y: i32) -> Self {
        Self {
            pos_x,
            pos_y,
            vel_x,
            vel_y,
            left_flipper: false,
            right_flipper: false,
        }
    }

    pub const fn with_flippers(mut self, left: bool, right: bool) -> Self {
        self.left_flipper = left;
        self.right_flipper = right;
        self
    }

    /// Position buckets `(x, y)`.
    pub fn position_buckets(&self) -> (i32, i32) {
        (self.pos_x, self.pos_y)
    }

    /// Velocity buckets `(x, y)`.
    pub fn velocity_buckets(&self) -> (i32, i32) {
        (self.vel_x, self.vel_y)
    }

    pub fn flippers(&self) -> (bool, bool) {
        (self.left_flipper, self.right_flipper)
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{},{}|{},{}|{}{}]",
            self.pos_x,
            self.pos_y,
            self.vel_x,
            self.vel_y,
            if self.left_flipper { 'L' } else { '-' },
            if self.right_flipper { 'R' } else { '-' },
        )
    }
}

/// Settings controlling how raw samples are bucketed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantizerConfig {
    /// Decimal places kept for the ball position
    pub position_precision: u32,
    /// Decimal places kept for the ball velocity
    pub velocity_precision: u32,
    /// Readings with a larger magnitude are treated as glitches and zeroed
    pub sanity_bound: f64,
    /// Whether velocity contributes to the key (otherwise its buckets are zero)
    pub include_velocity: bool,
    /// Whether the flipper flags contribute to the key
    pub include_flippers: bool,
}

impl Default for QuantizerConfig {
    fn default() -> Self {
        Self {
            position_precision: 2,
            velocity_precision: 1,
            sanity_bound: 10.0,
            include_velocity: true,
            include_flippers: false,
        }
    }
}

impl QuantizerConfig {
    /// Check that the precisions fit in the bucket representation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] for precisions above
    /// [`MAX_PRECISION`] or a non-positive / non-finite sanity bound.
    pub fn validate(&self) -> Result<()> {
        if self.position_precision > MAX_PRECISION || self.velocity_precision > MAX_PRECISION {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "precision must be at most {MAX_PRECISION} (position={}, velocity={})",
                    self.position_precision, self.velocity_precision
                ),
            });
        }
        if !(self.sanity_bound.is_finite() && self.sanity_bound > 0.0) {
            return Err(Error::InvalidConfiguration {
                message: format!("sanity bound {} must be positive", self.sanity_bound),
            });
        }
        Ok(())
    }
}

/// Turns raw kinematic samples into [`StateKey`]s.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Quantizer {
    config: QuantizerConfig,
}

impl Quantizer {
    pub fn new(config: QuantizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &QuantizerConfig {
        &self.config
    }

    /// Quantize a position/velocity pair, ignoring flipper state.
    pub fn quantize(&self, position: Vec2, velocity: Vec2) -> StateKey {
        let (pos_x, pos_y) = (
            self.bucket(position.x, self.config.position_precision),
            self.bucket(position.y, self.config.position_precision),
        );
        let (vel_x, vel_y) = if self.config.include_velocity {
            (
                self.bucket(velocity.x, self.config.velocity_precision),
                self.bucket(velocity.y, self.config.velocity_precision),
            )
        } else {
            (0, 0)
        };
        StateKey::from_buckets(pos_x, pos_y, vel_x, vel_y)
    }

    /// Quantize a full environment snapshot.
    pub fn quantize_snapshot(&self, snapshot: &BallSnapshot) -> StateKey {
        let key = self.quantize(snapshot.position, snapshot.velocity);
        if self.config.include_flippers {
            key.with_flippers(snapshot.left_flipper_active, snapshot.right_flipper_active)
        } else {
            key
        }
    }

    /// Representative raw values of a key's buckets: `[pos_x, pos_y, vel_x, vel_y]`.
    pub fn decode(&self, key: &StateKey) -> [f64; 4] {
        let pos_scale = scale(self.config.position_precision);
        let vel_scale = scale(self.config.velocity_precision);
        [
            f64::from(key.pos_x) / pos_scale,
            f64::from(key.pos_y) / pos_scale,
            f64::from(key.vel_x) / vel_scale,
            f64::from(key.vel_y) / vel_scale,
        ]
    }

    fn bucket(&self, raw: f64, precision: u32) -> i32 {
        quantize_component(raw, precision, self.config.sanity_bound)
    }
}

fn scale(precision: u32) -> f64 {
    10f64.powi(precision as i32)
}

/// Round `raw` to `precision` decimal places and return the integer bucket.
///
/// Non-finite readings and readings whose magnitude exceeds `bound` map to 0.
pub fn quantize_component(raw: f64, precision: u32, bound: f64) -> i32 {
    if !raw.is_finite() || raw.abs() > bound {
        return 0;
    }
    (raw * scale(precision)).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quantizer() -> Quantizer {
        Quantizer::new(QuantizerConfig::default())
    }

    #[test]
    fn test_component_rounding() {
        assert_eq!(quantize_component(0.234, 2, 10.0), 23);
        assert_eq!(quantize_component(0.235_1, 2, 10.0), 24);
        assert_eq!(quantize_component(-1.26, 1, 10.0), -13);
        assert_eq!(quantize_component(3.0, 0, 10.0), 3);
    }

    #[test]
    fn test_out_of_range_is_zeroed() {
        assert_eq!(quantize_component(10.5, 2, 10.0), 0);
        assert_eq!(quantize_component(-42.0, 2, 10.0), 0);
        assert_eq!(quantize_component(f64::NAN, 2, 10.0), 0);
        assert_eq!(quantize_component(f64::INFINITY, 1, 10.0), 0);
        assert_eq!(quantize_component(10.0, 1, 10.0), 100);
    }

    #[test]
    fn test_same_bucket_same_state() {
        let q = quantizer();
        let a = q.quantize(Vec2::new(0.251, 0.5), Vec2::new(1.21, -0.04));
        let b = q.quantize(Vec2::new(0.249, 0.504), Vec2::new(1.18, 0.04));
        assert_eq!(a, b);
    }

    #[test]
    fn test_position_finer_than_velocity() {
        let q = quantizer();
        let a = q.quantize(Vec2::new(0.25, 0.5), Vec2::new(1.21, 0.0));
        let b = q.quantize(Vec2::new(0.26, 0.5), Vec2::new(1.21, 0.0));
        let c = q.quantize(Vec2::new(0.25, 0.5), Vec2::new(1.23, 0.0));
        assert_ne!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_lexicographic_order() {
        let a = StateKey::from_buckets(1, 9, 9, 9);
        let b = StateKey::from_buckets(2, 0, 0, 0);
        let c = StateKey::from_buckets(2, 0, 0, 1);
        assert!(a < b);
        assert!(b < c);
        assert_eq!(b.cmp(&b), std::cmp::Ordering::Equal);
    }

    #[test]
    fn test_velocity_can_be_excluded() {
        let q = Quantizer::new(QuantizerConfig {
            include_velocity: false,
            ..QuantizerConfig::default()
        });
        let a = q.quantize(Vec2::new(0.1, 0.2), Vec2::new(3.0, -2.0));
        let b = q.quantize(Vec2::new(0.1, 0.2), Vec2::new(-1.0, 0.5));
        assert_eq!(a, b);
        assert_eq!(a.velocity_buckets(), (0, 0));
    }

    #[test]
    fn test_flippers_only_when_enabled() {
        let snapshot = BallSnapshot {
            position: Vec2::new(0.1, 0.2),
            velocity: Vec2::default(),
            left_flipper_active: true,
            right_flipper_active: false,
        };
        assert_eq!(quantizer().quantize_snapshot(&snapshot).flippers(), (false, false));

        let with_flippers = Quantizer::new(QuantizerConfig {
            include_flippers: true,
            ..QuantizerConfig::default()
        });
        assert_eq!(
            with_flippers.quantize_snapshot(&snapshot).flippers(),
            (true, false)
        );
    }

    #[test]
    fn test_decode_requantizes_to_same_key() {
        let q = quantizer();
        let key = q.quantize(Vec2::new(0.137, 0.912), Vec2::new(-2.34, 4.05));
        let [px, py, vx, vy] = q.decode(&key);
        assert_eq!(q.quantize(Vec2::new(px, py), Vec2::new(vx, vy)), key);
    }

    #[test]
    fn test_validate_rejects_large_precision() {
        let config = QuantizerConfig {
            position_precision: 9,
            ..QuantizerConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(QuantizerConfig::default().validate().is_ok());
    }
}
