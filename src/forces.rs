//! Force generators.
//!
//! Each generator adds into the force/torque accumulators of zero or more
//! bodies once per substep. Contributions are always additive so generators
//! stack; conservative generators also report the work currently stored in
//! the body transforms.

use glam::DVec2;

use crate::body::RigidBody;
use crate::math;
use crate::system::Tunables;

/// Springs shorter than this rest length are clamped up to it so the force
/// direction stays defined.
pub const MIN_REST_LENGTH: f64 = 1e-6;

/// Fraction of the linear damping coefficient applied to angular velocity.
const ANGULAR_DAMPING_RATIO: f64 = 0.1;

/// The closed set of force generators.
///
/// `Gravity` and `EnergyDamping` read their coefficients from [`Tunables`]
/// every substep, so external UI can adjust them live.
#[derive(Clone, Debug)]
pub enum ForceGenerator {
    /// Uniform downward gravity on every body.
    Gravity,
    /// Velocity-proportional dissipation, linear and angular.
    EnergyDamping,
    /// Elastic link between two body-fixed attachment points.
    SpringJoint(SpringJoint),
    /// Spring from one body-fixed point to an external pointer target.
    MouseSpring(MouseSpring),
}

impl ForceGenerator {
    /// Accumulates this generator's forces and torques into `bodies`.
    pub fn apply(&self, bodies: &mut [RigidBody], tunables: &Tunables) {
        match self {
            Self::Gravity => {
                for body in bodies.iter_mut() {
                    body.force += DVec2::NEG_Y * (tunables.gravity * body.mass);
                }
            }
            Self::EnergyDamping => {
                for body in bodies.iter_mut() {
                    body.force -= body.vel * tunables.damping;
                    body.tau -= ANGULAR_DAMPING_RATIO * tunables.damping * body.omega;
                }
            }
            Self::SpringJoint(spring) => spring.apply(bodies, tunables),
            Self::MouseSpring(mouse) => mouse.apply(bodies, tunables),
        }
    }

    /// Work currently stored in the body transforms, zero for dissipative
    /// generators.
    pub fn potential_energy(&self, bodies: &[RigidBody], tunables: &Tunables) -> f64 {
        match self {
            Self::Gravity => bodies
                .iter()
                .map(|body| body.pos.y * body.mass * tunables.gravity)
                .sum(),
            Self::EnergyDamping => 0.0,
            Self::SpringJoint(spring) => spring.potential_energy(bodies, tunables),
            Self::MouseSpring(mouse) => mouse.potential_energy(bodies, tunables),
        }
    }
}

/// Elastic two-body link between local offsets `r_a` and `r_b`.
#[derive(Clone, Debug)]
pub struct SpringJoint {
    pub body_a: usize,
    pub body_b: usize,
    /// Attachment offset in body-a local space.
    pub r_a: DVec2,
    /// Attachment offset in body-b local space.
    pub r_b: DVec2,
    pub rest_length: f64,
    /// Per-joint stiffness; `None` falls back to [`Tunables::spring_stiffness`].
    pub stiffness: Option<f64>,
}

impl SpringJoint {
    pub fn new(
        body_a: usize,
        body_b: usize,
        r_a: DVec2,
        r_b: DVec2,
        rest_length: f64,
        stiffness: Option<f64>,
    ) -> Self {
        Self {
            body_a,
            body_b,
            r_a,
            r_b,
            rest_length: rest_length.max(MIN_REST_LENGTH),
            stiffness,
        }
    }

    fn separation(&self, bodies: &[RigidBody]) -> (DVec2, DVec2, DVec2) {
        let a = &bodies[self.body_a];
        let b = &bodies[self.body_b];
        let world_a = a.local_to_world(self.r_a);
        let world_b = b.local_to_world(self.r_b);
        (world_a, world_b, world_b - world_a)
    }

    fn apply(&self, bodies: &mut [RigidBody], tunables: &Tunables) {
        let (_, _, delta) = self.separation(bodies);
        let len = delta.length();
        if len < MIN_REST_LENGTH {
            // No defined direction; skip this substep.
            return;
        }

        let k = self.stiffness.unwrap_or(tunables.spring_stiffness);
        let force = delta / len * (k * (len - self.rest_length));

        let arm_a = math::rotate_by_angle(self.r_a, bodies[self.body_a].theta);
        let arm_b = math::rotate_by_angle(self.r_b, bodies[self.body_b].theta);

        let body_a = &mut bodies[self.body_a];
        body_a.force += force;
        body_a.tau += math::cross(arm_a, force);

        let body_b = &mut bodies[self.body_b];
        body_b.force -= force;
        body_b.tau += math::cross(arm_b, -force);
    }

    fn potential_energy(&self, bodies: &[RigidBody], tunables: &Tunables) -> f64 {
        let (_, _, delta) = self.separation(bodies);
        let k = self.stiffness.unwrap_or(tunables.spring_stiffness);
        let stretch = delta.length() - self.rest_length;
        0.5 * k * stretch * stretch
    }
}

/// Pointer-driven spring.
///
/// Activation and the target point are owned by the external input
/// collaborator; while no body is grabbed the generator applies nothing.
#[derive(Clone, Debug, Default)]
pub struct MouseSpring {
    grabbed: Option<Grab>,
    target: DVec2,
}

#[derive(Clone, Copy, Debug)]
struct Grab {
    body: usize,
    local: DVec2,
}

impl MouseSpring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches the spring to `body` at the local offset `local`, pulling
    /// toward `target`.
    pub fn grab(&mut self, body: usize, local: DVec2, target: DVec2) {
        self.grabbed = Some(Grab { body, local });
        self.target = target;
    }

    /// Moves the pointer target while a body is grabbed.
    pub fn set_target(&mut self, target: DVec2) {
        self.target = target;
    }

    /// Releases the grabbed body; the spring goes inactive.
    pub fn release(&mut self) {
        self.grabbed = None;
    }

    pub fn is_active(&self) -> bool {
        self.grabbed.is_some()
    }

    /// Index of the grabbed body, if any.
    pub fn grabbed_body(&self) -> Option<usize> {
        self.grabbed.map(|g| g.body)
    }

    fn apply(&self, bodies: &mut [RigidBody], tunables: &Tunables) {
        let Some(grab) = self.grabbed else {
            return;
        };

        let body = &bodies[grab.body];
        let attach = body.local_to_world(grab.local);
        let arm = math::rotate_by_angle(grab.local, body.theta);
        let force = (self.target - attach) * tunables.spring_stiffness;

        let body = &mut bodies[grab.body];
        body.force += force;
        body.tau += math::cross(arm, force);
    }

    fn potential_energy(&self, bodies: &[RigidBody], tunables: &Tunables) -> f64 {
        let Some(grab) = self.grabbed else {
            return 0.0;
        };

        let attach = bodies[grab.body].local_to_world(grab.local);
        0.5 * tunables.spring_stiffness * (self.target - attach).length_squared()
    }
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;

    use super::*;

    fn two_discs() -> Vec<RigidBody> {
        vec![
            RigidBody::disc(DVec2::new(0.0, 0.0), 0.5, 1.0).unwrap(),
            RigidBody::disc(DVec2::new(3.0, 0.0), 0.5, 1.0).unwrap(),
        ]
    }

    #[test]
    fn gravity_scales_with_mass_and_accumulates() {
        let mut bodies = vec![RigidBody::disc(DVec2::ZERO, 0.5, 2.0).unwrap()];
        let tunables = Tunables::default();

        let gravity = ForceGenerator::Gravity;
        gravity.apply(&mut bodies, &tunables);
        assert_relative_eq!(bodies[0].force.y, -2.0 * tunables.gravity);

        // A second application must add, never overwrite.
        gravity.apply(&mut bodies, &tunables);
        assert_relative_eq!(bodies[0].force.y, -4.0 * tunables.gravity);
    }

    #[test]
    fn damping_opposes_motion_and_stores_nothing() {
        let mut bodies = vec![RigidBody::disc(DVec2::ZERO, 0.5, 1.0).unwrap()];
        bodies[0].vel = DVec2::new(2.0, 0.0);
        bodies[0].omega = 3.0;

        let mut tunables = Tunables::default();
        tunables.damping = 0.5;

        let damping = ForceGenerator::EnergyDamping;
        damping.apply(&mut bodies, &tunables);

        assert_relative_eq!(bodies[0].force.x, -1.0);
        assert_relative_eq!(bodies[0].tau, -0.15);
        assert_relative_eq!(damping.potential_energy(&bodies, &tunables), 0.0);
    }

    #[test]
    fn stretched_spring_pulls_bodies_together() {
        let mut bodies = two_discs();
        let tunables = Tunables::default();

        let spring = ForceGenerator::SpringJoint(SpringJoint::new(
            0,
            1,
            DVec2::ZERO,
            DVec2::ZERO,
            2.0,
            Some(10.0),
        ));
        spring.apply(&mut bodies, &tunables);

        // Stretched by 1: magnitude 10, equal and opposite.
        assert_relative_eq!(bodies[0].force.x, 10.0);
        assert_relative_eq!(bodies[1].force.x, -10.0);
        assert_relative_eq!(spring.potential_energy(&bodies, &tunables), 5.0);
    }

    #[test]
    fn offset_spring_generates_torque() {
        let mut bodies = two_discs();
        let tunables = Tunables::default();

        // Attachment above body 0's center; the pull toward body 1 twists it.
        let spring = SpringJoint::new(0, 1, DVec2::new(0.0, 0.3), DVec2::ZERO, 1.0, Some(10.0));
        spring.apply(&mut bodies, &tunables);
        assert!(bodies[0].tau < 0.0);
    }

    #[test]
    fn rest_length_is_clamped_positive() {
        let spring = SpringJoint::new(0, 1, DVec2::ZERO, DVec2::ZERO, 0.0, None);
        assert!(spring.rest_length > 0.0);
    }

    #[test]
    fn inactive_mouse_spring_is_a_no_op() {
        let mut bodies = two_discs();
        let tunables = Tunables::default();
        let mouse = ForceGenerator::MouseSpring(MouseSpring::new());

        mouse.apply(&mut bodies, &tunables);
        assert_relative_eq!(bodies[0].force.length(), 0.0);
        assert_relative_eq!(mouse.potential_energy(&bodies, &tunables), 0.0);
    }

    #[test]
    fn grabbed_mouse_spring_pulls_toward_target() {
        let mut bodies = two_discs();
        let tunables = Tunables::default();

        let mut mouse = MouseSpring::new();
        mouse.grab(0, DVec2::ZERO, DVec2::new(0.0, 2.0));
        assert_eq!(mouse.grabbed_body(), Some(0));

        mouse.apply(&mut bodies, &tunables);
        assert!(bodies[0].force.y > 0.0);
        assert!(mouse.potential_energy(&bodies, &tunables) > 0.0);

        mouse.release();
        assert!(!mouse.is_active());
    }
}
