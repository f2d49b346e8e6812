//! Math types and small acoustic helpers for AcousTrace

pub use glam::{Quat, Vec3};

/// Smallest positive value used in place of zero before dividing.
pub const EPSILON: f32 = 1.0e-4;

/// Position and orientation of a listener in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * (-Vec3::Z)
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    pub fn look_at(&mut self, target: Vec3) {
        let forward = (target - self.position).normalize_or_zero();
        if forward != Vec3::ZERO {
            self.rotation = Quat::from_rotation_arc(-Vec3::Z, forward);
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

/// Linear blend that returns exactly `a` at t = 0 and exactly `b` at t = 1.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

/// Interpolates two frequencies in log space, which tracks perceived pitch
/// better than a linear blend.
pub fn log_lerp(from_hz: f32, to_hz: f32, t: f32) -> f32 {
    let from = from_hz.max(EPSILON).ln();
    let to = to_hz.max(EPSILON).ln();
    lerp(from, to, t.clamp(0.0, 1.0)).exp()
}

pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        return -100.0;
    }
    20.0 * linear.log10()
}

/// Clamps a distance or duration to a positive minimum so it can be divided by.
pub fn positive(value: f32) -> f32 {
    if value.is_finite() { value.max(EPSILON) } else { EPSILON }
}

/// Azimuth and elevation in degrees of `direction` in the frame described by
/// `forward`, `right` and `up`. Azimuth is positive towards `right`.
pub fn direction_angles(direction: Vec3, forward: Vec3, right: Vec3, up: Vec3) -> (f32, f32) {
    let dir = direction.normalize_or_zero();
    if dir == Vec3::ZERO {
        return (0.0, 0.0);
    }
    let azimuth = dir.dot(right).atan2(dir.dot(forward)).to_degrees();
    let elevation = dir.dot(up).clamp(-1.0, 1.0).asin().to_degrees();
    (azimuth, elevation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_lerp_endpoints() {
        assert!((log_lerp(20000.0, 500.0, 0.0) - 20000.0).abs() < 0.5);
        assert!((log_lerp(20000.0, 500.0, 1.0) - 500.0).abs() < 0.01);
        // geometric mean at the midpoint
        assert!((log_lerp(20000.0, 500.0, 0.5) - 3162.28).abs() < 1.0);
    }

    #[test]
    fn test_db_conversion() {
        assert!((db_to_linear(0.0) - 1.0).abs() < 1e-6);
        assert!((db_to_linear(-20.0) - 0.1).abs() < 1e-6);
        assert!((linear_to_db(0.1) + 20.0).abs() < 1e-4);
        assert_eq!(linear_to_db(0.0), -100.0);
    }

    #[test]
    fn test_positive_clamps() {
        assert_eq!(positive(0.0), EPSILON);
        assert_eq!(positive(-3.0), EPSILON);
        assert_eq!(positive(f32::NAN), EPSILON);
        assert_eq!(positive(2.0), 2.0);
    }

    #[test]
    fn test_direction_angles() {
        let pose = Pose::identity();
        let (az, el) = direction_angles(pose.right(), pose.forward(), pose.right(), pose.up());
        assert!((az - 90.0).abs() < 1e-3);
        assert!(el.abs() < 1e-3);

        let (az, el) = direction_angles(pose.up(), pose.forward(), pose.right(), pose.up());
        assert!((el - 90.0).abs() < 1e-3);
        assert!(az.abs() < 1e-3);
    }

    #[test]
    fn test_pose_axes() {
        let pose = Pose::identity();
        assert_eq!(pose.forward(), Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(pose.up(), Vec3::Y);
        assert_eq!(pose.right(), Vec3::X);
    }
}
