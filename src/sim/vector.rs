//! 2D vector operations used by the physics passes
//!
//! World vectors are `glam::DVec2` (f64 for stable energy bookkeeping).
//! `DVec2` already covers add/sub/dot/scale/divide; [`VectorExt`] adds the
//! magnitude-oriented operations the integrator and collision resolver need.

use glam::DVec2;

/// World-space 2D vector (metres, m/s, m/s²)
pub type Vector2 = DVec2;

/// Magnitude helpers on top of `DVec2`
pub trait VectorExt: Sized {
    /// Euclidean length, always ≥ 0
    fn magnitude(self) -> f64;

    /// Unit vector in the same direction, `None` for the zero vector
    fn normalized(self) -> Option<Self>;

    /// Same direction with the given length. The zero vector stays zero.
    fn with_magnitude(self, magnitude: f64) -> Self;

    /// Mirror across the line perpendicular to `normal` (any non-zero length)
    fn reflection(self, normal: Self) -> Self;

    /// Same direction, length raised to `exponent`. The zero vector stays zero.
    fn raise_magnitude(self, exponent: f64) -> Self;

    /// Shorten by `amount`, clamped at zero (never flips direction)
    fn reduce_magnitude_by(self, amount: f64) -> Self;
}

impl VectorExt for DVec2 {
    #[inline]
    fn magnitude(self) -> f64 {
        self.length()
    }

    #[inline]
    fn normalized(self) -> Option<Self> {
        self.try_normalize()
    }

    fn with_magnitude(self, magnitude: f64) -> Self {
        self.normalized()
            .map(|unit| unit * magnitude)
            .unwrap_or(DVec2::ZERO)
    }

    fn reflection(self, normal: Self) -> Self {
        let len_sq = normal.length_squared();
        if len_sq == 0.0 {
            return self;
        }
        self - normal * (2.0 * self.dot(normal) / len_sq)
    }

    fn raise_magnitude(self, exponent: f64) -> Self {
        let magnitude = self.magnitude();
        if magnitude == 0.0 {
            return self;
        }
        self.with_magnitude(magnitude.powf(exponent))
    }

    fn reduce_magnitude_by(self, amount: f64) -> Self {
        let magnitude = self.magnitude();
        if amount >= magnitude {
            return DVec2::ZERO;
        }
        self * ((magnitude - amount) / magnitude)
    }
}
