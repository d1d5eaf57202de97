//! Rigid body state and local/world transforms.
//!
//! A body owns its kinematic state (pose, velocity) and the per-substep
//! force/torque accumulators. Integration is driven by the
//! [`PhysicsSystem`](crate::system::PhysicsSystem); everything here is a pure
//! query on the current state.

use glam::DVec2;

use crate::error::{SimError, SimResult};
use crate::math;

/// Shape of a rigid body, described in body-local space around the center of mass.
#[derive(Clone, Debug)]
pub enum Geometry {
    /// Uniform disc.
    Disc {
        /// Disc radius in sim units.
        radius: f64,
    },
    /// Axis-aligned rectangle (in local space).
    Rect {
        /// Full width in sim units.
        width: f64,
        /// Full height in sim units.
        height: f64,
        /// Corners in local space, counter-clockwise starting bottom-left.
        local_vertices: [DVec2; 4],
    },
}

/// Axis-aligned bounding region around a body's current pose.
///
/// Recomputed from the pose on demand; a picking aid, not a simulation
/// invariant.
#[derive(Clone, Debug)]
pub struct BoundingBox2D {
    pub center: DVec2,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox2D {
    pub fn new(center: DVec2, width: f64, height: f64) -> Self {
        Self {
            center,
            width,
            height,
        }
    }

    /// Whether `point` lies inside the box (inclusive bounds).
    pub fn contains(&self, point: DVec2) -> bool {
        (point.x - self.center.x).abs() <= 0.5 * self.width
            && (point.y - self.center.y).abs() <= 0.5 * self.height
    }
}

/// A single rigid body.
///
/// `force` and `tau` accumulate over one substep and are zeroed by the
/// integrator. `prev_pos`/`prev_theta` are overwritten at the start of every
/// substep and read afterwards to re-derive velocity from the net pose change.
#[derive(Clone, Debug)]
pub struct RigidBody {
    pub pos: DVec2,
    pub prev_pos: DVec2,
    pub vel: DVec2,
    pub force: DVec2,
    pub mass: f64,

    pub theta: f64,
    pub prev_theta: f64,
    pub omega: f64,
    pub tau: f64,
    /// Scalar moment of inertia about the center of mass.
    pub inertia: f64,

    pub geometry: Geometry,
}

impl RigidBody {
    /// Creates a disc body. Inertia is `m r^2 / 2`.
    pub fn disc(pos: DVec2, radius: f64, mass: f64) -> SimResult<Self> {
        check_mass(mass)?;
        check_extent("radius", radius)?;

        Ok(Self::with_geometry(
            pos,
            mass,
            0.5 * mass * radius * radius,
            Geometry::Disc { radius },
        ))
    }

    /// Creates a rectangular body. Inertia is `m (w^2 + h^2) / 12`.
    pub fn rect(pos: DVec2, width: f64, height: f64, mass: f64) -> SimResult<Self> {
        check_mass(mass)?;
        check_extent("width", width)?;
        check_extent("height", height)?;

        let (hw, hh) = (0.5 * width, 0.5 * height);
        let local_vertices = [
            DVec2::new(-hw, -hh),
            DVec2::new(hw, -hh),
            DVec2::new(hw, hh),
            DVec2::new(-hw, hh),
        ];

        Ok(Self::with_geometry(
            pos,
            mass,
            mass * (width * width + height * height) / 12.0,
            Geometry::Rect {
                width,
                height,
                local_vertices,
            },
        ))
    }

    fn with_geometry(pos: DVec2, mass: f64, inertia: f64, geometry: Geometry) -> Self {
        Self {
            pos,
            prev_pos: pos,
            vel: DVec2::ZERO,
            force: DVec2::ZERO,
            mass,
            theta: 0.0,
            prev_theta: 0.0,
            omega: 0.0,
            tau: 0.0,
            inertia,
            geometry,
        }
    }

    /// Maps an offset around the center of mass to world space.
    pub fn local_to_world(&self, r: DVec2) -> DVec2 {
        math::rotate_by_angle(r, self.theta) + self.pos
    }

    /// Maps a world-space point back to an offset around the center of mass.
    pub fn world_to_local(&self, w: DVec2) -> DVec2 {
        math::rotate_by_angle(w - self.pos, -self.theta)
    }

    /// Velocity of the body-fixed point `r` due to angular velocity alone.
    ///
    /// Magnitude `|r| * omega`, perpendicular to the rotated offset.
    pub fn local_point_velocity(&self, r: DVec2) -> DVec2 {
        math::rotate_by_angle(r, self.theta).perp() * self.omega
    }

    /// Full world velocity of the body-fixed point `r`.
    pub fn point_velocity(&self, r: DVec2) -> DVec2 {
        self.vel + self.local_point_velocity(r)
    }

    /// Translational plus rotational kinetic energy.
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.vel.length_squared() + 0.5 * self.inertia * self.omega * self.omega
    }

    /// World-space bounding region around the current pose.
    pub fn bounding_box(&self) -> BoundingBox2D {
        match &self.geometry {
            Geometry::Disc { radius } => {
                BoundingBox2D::new(self.pos, 2.0 * radius, 2.0 * radius)
            }
            Geometry::Rect { local_vertices, .. } => {
                let mut min = DVec2::INFINITY;
                let mut max = DVec2::NEG_INFINITY;
                for &v in local_vertices {
                    let w = self.local_to_world(v);
                    min = min.min(w);
                    max = max.max(w);
                }
                BoundingBox2D::new(0.5 * (min + max), max.x - min.x, max.y - min.y)
            }
        }
    }
}

fn check_mass(mass: f64) -> SimResult<()> {
    if !mass.is_finite() || mass <= 0.0 {
        return Err(SimError::NonPositiveMass(mass));
    }
    Ok(())
}

fn check_extent(name: &'static str, value: f64) -> SimResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(SimError::NonPositiveDimension { name, value });
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use std::f64::consts::FRAC_PI_4;

    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn rejects_invalid_construction() {
        assert_eq!(
            RigidBody::disc(DVec2::ZERO, 0.5, -1.0).unwrap_err(),
            SimError::NonPositiveMass(-1.0)
        );
        assert_eq!(
            RigidBody::disc(DVec2::ZERO, 0.0, 1.0).unwrap_err(),
            SimError::NonPositiveDimension {
                name: "radius",
                value: 0.0
            }
        );
        assert!(RigidBody::rect(DVec2::ZERO, 1.0, f64::NAN, 1.0).is_err());
    }

    #[test]
    fn inertia_matches_closed_form() {
        let disc = RigidBody::disc(DVec2::ZERO, 0.5, 2.0).unwrap();
        assert_relative_eq!(disc.inertia, 0.25);

        let rect = RigidBody::rect(DVec2::ZERO, 2.0, 1.0, 3.0).unwrap();
        assert_relative_eq!(rect.inertia, 3.0 * 5.0 / 12.0);
    }

    #[test]
    fn transform_round_trip() {
        let mut body = RigidBody::disc(DVec2::new(2.0, 3.0), 0.5, 1.0).unwrap();
        body.theta = 0.7;

        let r = DVec2::new(0.3, -0.4);
        let back = body.world_to_local(body.local_to_world(r));
        assert_relative_eq!(back.x, r.x, epsilon = 1e-12);
        assert_relative_eq!(back.y, r.y, epsilon = 1e-12);
    }

    #[test]
    fn point_velocity_is_perpendicular_to_arm() {
        let mut body = RigidBody::disc(DVec2::ZERO, 0.5, 1.0).unwrap();
        body.omega = 2.0;

        let v = body.local_point_velocity(DVec2::X);
        assert_relative_eq!(v.x, 0.0);
        assert_relative_eq!(v.y, 2.0);

        body.vel = DVec2::new(1.0, 0.0);
        let v = body.point_velocity(DVec2::X);
        assert_relative_eq!(v.x, 1.0);
        assert_relative_eq!(v.y, 2.0);
    }

    #[test]
    fn kinetic_energy_sums_linear_and_angular_parts() {
        let mut body = RigidBody::disc(DVec2::ZERO, 1.0, 2.0).unwrap();
        body.vel = DVec2::new(3.0, 0.0);
        body.omega = 2.0;
        // 0.5*2*9 + 0.5*1*4
        assert_relative_eq!(body.kinetic_energy(), 11.0);
    }

    #[test]
    fn bounding_box_follows_rotation() {
        let mut body = RigidBody::rect(DVec2::new(1.0, 1.0), 2.0, 2.0, 1.0).unwrap();
        let bb = body.bounding_box();
        assert_relative_eq!(bb.width, 2.0, epsilon = 1e-12);

        body.theta = FRAC_PI_4;
        let bb = body.bounding_box();
        assert_relative_eq!(bb.width, 2.0 * 2.0_f64.sqrt(), epsilon = 1e-12);
        assert!(bb.contains(DVec2::new(1.0, 1.0 + 1.2)));
        assert!(!bb.contains(DVec2::new(3.0, 3.0)));
    }
}
