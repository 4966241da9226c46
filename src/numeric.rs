//! Numeric guards and lookup curves shared by every stage.
//!
//! Every stage funnels intermediate values through these helpers so that a
//! NaN or infinity is replaced before it is stored.

/// Return `value` if finite, otherwise `fallback`
#[inline]
pub fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// Signal fallback: non-finite signals become silence
#[inline]
pub fn finite_signal(value: f64) -> f64 {
    finite_or(value, 0.0)
}

/// Multiplier fallback: non-finite multipliers become identity
#[inline]
pub fn finite_multiplier(value: f64) -> f64 {
    finite_or(value, 1.0)
}

/// Clamp to [0, 1]; NaN maps to 0
#[inline]
pub fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Clamp to [lo, hi]; NaN maps to `lo`
#[inline]
pub fn clamp_finite(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        lo
    } else {
        value.clamp(lo, hi)
    }
}

/// Linear interpolation with `t` clamped to [0, 1]
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * clamp01(t)
}

/// Piecewise-linear gain curve over log-frequency.
///
/// Points must be sorted by frequency. Queries outside the table hold the
/// end values; invalid frequencies return the gain of the first point.
#[derive(Debug, Clone, Copy)]
pub struct ResponseCurve {
    points: &'static [(f64, f64)],
}

impl ResponseCurve {
    pub const fn new(points: &'static [(f64, f64)]) -> Self {
        Self { points }
    }

    /// Gain at `frequency_hz`
    pub fn sample(&self, frequency_hz: f64) -> f64 {
        let Some(&(first_hz, first_gain)) = self.points.first() else {
            return 1.0;
        };
        if !frequency_hz.is_finite() || frequency_hz <= first_hz {
            return first_gain;
        }

        for pair in self.points.windows(2) {
            let (f0, g0) = pair[0];
            let (f1, g1) = pair[1];
            if frequency_hz <= f1 {
                let t = (frequency_hz / f0).ln() / (f1 / f0).ln();
                return finite_or(lerp(g0, g1, t), g0);
            }
        }

        self.points.last().map(|&(_, g)| g).unwrap_or(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CURVE: ResponseCurve = ResponseCurve::new(&[(100.0, 0.5), (1000.0, 1.0), (10000.0, 0.0)]);

    #[test]
    fn test_fallbacks() {
        assert_eq!(finite_signal(f64::NAN), 0.0);
        assert_eq!(finite_multiplier(f64::INFINITY), 1.0);
        assert_eq!(clamp01(f64::NAN), 0.0);
        assert_eq!(clamp01(2.0), 1.0);
        assert_eq!(clamp_finite(f64::NAN, 3.0, 4.0), 3.0);
    }

    #[test]
    fn test_curve_interpolates_in_log_frequency() {
        assert!((CURVE.sample(1000.0) - 1.0).abs() < 1e-9);
        // Geometric midpoint of 100..1000
        let mid = CURVE.sample((100.0f64 * 1000.0).sqrt());
        assert!((mid - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_curve_holds_end_values() {
        assert_eq!(CURVE.sample(10.0), 0.5);
        assert_eq!(CURVE.sample(50_000.0), 0.0);
        assert_eq!(CURVE.sample(f64::NAN), 0.5);
        assert_eq!(CURVE.sample(-5.0), 0.5);
    }
}
