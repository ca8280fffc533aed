//! Feedback mechanics: map a color's current share to an unnormalized draw weight.

/// Linear feedback: weight = x (classic Pólya draw).
#[inline]
pub fn linear(x: f64) -> f64 {
    x
}

/// Quadratic feedback: weight = x². Majorities are amplified.
#[inline]
pub fn quadratic(x: f64) -> f64 {
    x * x
}

/// Arthur S-curve: f(x) = 3x² − 2x³.
/// Fixed points at 0, ½ and 1; below ½ a color is under-drawn, above ½ over-drawn.
#[inline]
pub fn arthur_s_curve(x: f64) -> f64 {
    let x2 = x * x;
    3.0 * x2 - 2.0 * x2 * x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s_curve_fixed_points_are_exact() {
        assert_eq!(arthur_s_curve(0.0), 0.0);
        assert_eq!(arthur_s_curve(0.5), 0.5);
        assert_eq!(arthur_s_curve(1.0), 1.0);
    }

    #[test]
    fn s_curve_is_monotone_on_unit_interval() {
        let mut prev = arthur_s_curve(0.0);
        for i in 1..=1000 {
            let y = arthur_s_curve(i as f64 / 1000.0);
            assert!(y >= prev, "f decreased at x={}", i as f64 / 1000.0);
            prev = y;
        }
    }

    #[test]
    fn s_curve_pushes_away_from_half() {
        assert!(arthur_s_curve(0.3) < 0.3);
        assert!(arthur_s_curve(0.7) > 0.7);
    }

    #[test]
    fn quadratic_and_linear() {
        assert_eq!(linear(0.25), 0.25);
        assert_eq!(quadratic(0.5), 0.25);
        assert_eq!(quadratic(1.0), 1.0);
    }
}
