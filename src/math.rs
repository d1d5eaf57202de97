use glam::DVec2;

/// Tolerance below which a separation distance is treated as degenerate.
pub const GEOMETRY_EPSILON: f64 = 1e-9;

/// Scalar z component of the 2D cross product `a x b`.
pub fn cross(a: DVec2, b: DVec2) -> f64 {
    a.perp_dot(b)
}

/// Rotates `v` counter-clockwise by `angle` radians around the origin.
pub fn rotate_by_angle(v: DVec2, angle: f64) -> DVec2 {
    DVec2::from_angle(angle).rotate(v)
}

/// Rotates `v` counter-clockwise by `angle` radians around `pivot`.
pub fn rotate_around_point(v: DVec2, pivot: DVec2, angle: f64) -> DVec2 {
    pivot + rotate_by_angle(v - pivot, angle)
}

#[cfg(test)]
mod test {
    use std::f64::consts::FRAC_PI_2;

    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn cross_follows_right_hand_rule() {
        assert_relative_eq!(cross(DVec2::X, DVec2::Y), 1.0);
        assert_relative_eq!(cross(DVec2::Y, DVec2::X), -1.0);
        assert_relative_eq!(cross(DVec2::X, DVec2::X), 0.0);
    }

    #[test]
    fn quarter_turn_maps_x_to_y() {
        let v = rotate_by_angle(DVec2::X, FRAC_PI_2);
        assert_relative_eq!(v.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(v.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn rotation_round_trip() {
        let v = DVec2::new(1.3, -0.7);
        let back = rotate_by_angle(rotate_by_angle(v, 0.83), -0.83);
        assert_relative_eq!(back.x, v.x, epsilon = 1e-12);
        assert_relative_eq!(back.y, v.y, epsilon = 1e-12);
    }

    #[test]
    fn rotate_around_point_keeps_pivot_fixed() {
        let pivot = DVec2::new(2.0, 1.0);
        let rotated = rotate_around_point(pivot, pivot, 1.2);
        assert_relative_eq!(rotated.x, pivot.x);
        assert_relative_eq!(rotated.y, pivot.y);

        let v = rotate_around_point(DVec2::new(3.0, 1.0), pivot, FRAC_PI_2);
        assert_relative_eq!(v.x, 2.0, epsilon = 1e-12);
        assert_relative_eq!(v.y, 2.0, epsilon = 1e-12);
    }
}
