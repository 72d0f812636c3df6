//! Joint angle calculation using dot product
//!
//! Calculates the included angle at a vertex landmark from the vectors
//! vertex→first and vertex→second, in 3D.

use crate::bridge::Landmark;
use nalgebra::Vector3;

impl Landmark {
    /// Position as a 3D vector, missing depth treated as 0
    pub fn position(&self) -> Vector3<f32> {
        Vector3::new(self.x, self.y, self.z.unwrap_or(0.0))
    }
}

/// Angle at `b` in degrees, in [0, 180]
///
/// Uses dot product formula: cos(θ) = (v1 · v2) / (|v1| × |v2|)
///
/// Returns 0 when any point is absent or a ray has zero length. Callers
/// must check landmark presence before trusting a 0 reading.
pub fn joint_angle(a: Option<&Landmark>, b: Option<&Landmark>, c: Option<&Landmark>) -> f32 {
    match (a, b, c) {
        (Some(a), Some(b), Some(c)) => angle_between(a.position(), b.position(), c.position()),
        _ => 0.0,
    }
}

/// Angle at `vertex` between the rays to `first` and `second`, in degrees
pub fn angle_between(first: Vector3<f32>, vertex: Vector3<f32>, second: Vector3<f32>) -> f32 {
    let v1 = first - vertex;
    let v2 = second - vertex;

    let mag1 = v1.norm();
    let mag2 = v2.norm();

    // Only exactly coincident points are degenerate; short rays keep
    // their angle at any scale
    if mag1 == 0.0 || mag2 == 0.0 {
        return 0.0;
    }

    // Clamp guards acos against floating-point overshoot
    let cos_angle = (v1.dot(&v2) / (mag1 * mag2)).clamp(-1.0, 1.0);
    cos_angle.acos().to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn lm(x: f32, y: f32, z: f32) -> Landmark {
        Landmark::with_depth(x, y, z, 1.0)
    }

    #[test]
    fn test_straight_limb() {
        let angle = joint_angle(Some(&lm(0.0, 0.0, 0.0)), Some(&lm(0.5, 0.0, 0.0)), Some(&lm(1.0, 0.0, 0.0)));
        assert!((angle - 180.0).abs() < 0.01);
    }

    #[test]
    fn test_right_angle() {
        let angle = joint_angle(Some(&lm(0.0, 0.0, 0.0)), Some(&lm(0.5, 0.0, 0.0)), Some(&lm(0.5, 0.5, 0.0)));
        assert!((angle - 90.0).abs() < 0.01);
    }

    #[test]
    fn test_depth_contributes() {
        // Same image-plane positions, second ray tilted out of plane
        let flat = joint_angle(Some(&lm(0.0, 0.0, 0.0)), Some(&lm(0.5, 0.0, 0.0)), Some(&lm(1.0, 0.0, 0.0)));
        let tilted = joint_angle(Some(&lm(0.0, 0.0, 0.0)), Some(&lm(0.5, 0.0, 0.0)), Some(&lm(1.0, 0.0, 0.5)));
        assert!((tilted - 135.0).abs() < 0.01);
        assert!(tilted < flat);
    }

    #[test]
    fn test_missing_point_is_zero() {
        let a = lm(0.0, 0.0, 0.0);
        let b = lm(0.5, 0.0, 0.0);
        assert_eq!(joint_angle(None, Some(&b), Some(&a)), 0.0);
        assert_eq!(joint_angle(Some(&a), None, Some(&a)), 0.0);
        assert_eq!(joint_angle(Some(&a), Some(&b), None), 0.0);
    }

    #[test]
    fn test_coincident_points_are_zero() {
        let p = lm(0.3, 0.3, 0.0);
        assert_eq!(joint_angle(Some(&p), Some(&p), Some(&lm(0.9, 0.1, 0.0))), 0.0);
    }

    #[test]
    fn test_result_stays_in_range() {
        let points = [
            lm(0.1, 0.9, -0.2),
            lm(0.7, 0.2, 0.4),
            lm(0.33, 0.33, 0.0),
            lm(1.0, 1.0, 1.0),
            lm(0.0, 0.5, -1.0),
        ];
        for a in &points {
            for b in &points {
                for c in &points {
                    let angle = joint_angle(Some(a), Some(b), Some(c));
                    assert!((0.0..=180.0).contains(&angle), "angle {angle} out of range");
                }
            }
        }
    }

    #[test]
    fn test_invariant_under_scale_and_translation() {
        let a = Vector3::new(0.42, 0.31, 0.05);
        let b = Vector3::new(0.47, 0.52, -0.02);
        let c = Vector3::new(0.61, 0.66, 0.10);
        let base = angle_between(a, b, c);

        for scale in [1e-6_f32, 1e-3, 0.25, 2.0, 7.5] {
            let scaled = angle_between(a * scale, b * scale, c * scale);
            assert_relative_eq!(scaled, base, epsilon = 1e-3);
        }

        let offset = Vector3::new(3.0, -1.5, 0.75);
        let moved = angle_between(a + offset, b + offset, c + offset);
        assert_relative_eq!(moved, base, epsilon = 1e-3);
    }
}
