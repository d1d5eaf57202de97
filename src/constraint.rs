//! Bilateral constraints solved by position correction.
//!
//! Each constraint defines a scalar condition `C = 0` over body poses. Per
//! substep the solver computes a Lagrange multiplier
//! `lambda = -C / (sum(w) + alpha / h^2)` from the generalized inverse masses
//! `w = 1/m + cross(arm, n)^2 / I` and corrects positions and orientations
//! directly. Velocities are never touched here; the system re-derives them
//! from the net pose change of the substep, which is what makes the
//! corrections act like impulses.
//!
//! The last multiplier and gradient direction are kept so the applied force
//! can be recovered as `lambda / h^2 * n`.

use glam::DVec2;

use crate::body::RigidBody;
use crate::math;

/// World axis fixed by an [`AxisFix`] constraint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    /// Unit vector along the axis; the constraint gradient.
    pub fn unit(self) -> DVec2 {
        match self {
            Self::X => DVec2::X,
            Self::Y => DVec2::Y,
        }
    }
}

/// The closed set of constraint types.
#[derive(Clone, Debug)]
pub enum Constraint {
    /// Two-body distance link between offset points.
    OffsetLink(OffsetLink),
    /// Single-body prismatic constraint fixing one world coordinate of an
    /// offset point.
    AxisFix(AxisFix),
}

impl Constraint {
    /// Solves the constraint once against the just-integrated poses.
    pub fn solve(&mut self, bodies: &mut [RigidBody], h: f64) {
        match self {
            Self::OffsetLink(link) => link.solve(bodies, h),
            Self::AxisFix(fix) => fix.solve(bodies, h),
        }
    }

    /// Force applied during the last solve, `lambda / h^2` along the gradient.
    pub fn force(&self, h: f64) -> DVec2 {
        let (lambda, n) = match self {
            Self::OffsetLink(link) => (link.lambda, link.n),
            Self::AxisFix(fix) => (fix.lambda, fix.axis.unit()),
        };
        n * (lambda / (h * h))
    }
}

/// Keeps two offset points at a fixed distance: `C = |p_b - p_a| - rest`.
///
/// The gradient is the unit separation normal from point a to point b.
#[derive(Clone, Debug)]
pub struct OffsetLink {
    /// Compliance; 0 is rigid, larger is softer.
    pub alpha: f64,
    pub body_a: usize,
    pub body_b: usize,
    /// Attachment offset in body-a local space.
    pub r_a: DVec2,
    /// Attachment offset in body-b local space.
    pub r_b: DVec2,
    pub rest_length: f64,

    lambda: f64,
    n: DVec2,
}

impl OffsetLink {
    pub fn new(
        alpha: f64,
        body_a: usize,
        body_b: usize,
        r_a: DVec2,
        r_b: DVec2,
        rest_length: f64,
    ) -> Self {
        Self {
            alpha,
            body_a,
            body_b,
            r_a,
            r_b,
            rest_length,
            lambda: 0.0,
            n: DVec2::ZERO,
        }
    }

    fn solve(&mut self, bodies: &mut [RigidBody], h: f64) {
        let k = self.alpha / (h * h);

        let a = &bodies[self.body_a];
        let b = &bodies[self.body_b];

        let world_a = a.local_to_world(self.r_a);
        let world_b = b.local_to_world(self.r_b);
        let dist = world_a.distance(world_b);
        debug_assert!(
            dist.is_finite() && dist > math::GEOMETRY_EPSILON,
            "link separation degenerated"
        );

        let c = dist - self.rest_length;
        let n = (world_b - world_a) / dist;

        let arm_a = math::rotate_by_angle(self.r_a, a.theta);
        let arm_b = math::rotate_by_angle(self.r_b, b.theta);
        let cross_a = math::cross(arm_a, n);
        let cross_b = math::cross(arm_b, n);

        let w_a = 1.0 / a.mass + cross_a * cross_a / a.inertia;
        let w_b = 1.0 / b.mass + cross_b * cross_b / b.inertia;

        let lambda = -c / (w_a + w_b + k);

        let a = &mut bodies[self.body_a];
        a.pos -= n * (w_a * lambda);
        a.theta -= lambda * cross_a / a.inertia;

        let b = &mut bodies[self.body_b];
        b.pos += n * (w_b * lambda);
        b.theta += lambda * cross_b / b.inertia;

        self.lambda = lambda;
        self.n = n;
    }

    /// Current constraint value against `bodies`.
    pub fn evaluate(&self, bodies: &[RigidBody]) -> f64 {
        let world_a = bodies[self.body_a].local_to_world(self.r_a);
        let world_b = bodies[self.body_b].local_to_world(self.r_b);
        world_a.distance(world_b) - self.rest_length
    }
}

/// Pins one world coordinate of an offset point: `C = n . p - target`.
///
/// The rotational lever arm is the derivative of the offset's world
/// coordinate with respect to the body angle.
#[derive(Clone, Debug)]
pub struct AxisFix {
    /// Compliance; 0 is rigid, larger is softer.
    pub alpha: f64,
    pub body: usize,
    /// Attachment offset in body-local space.
    pub r: DVec2,
    pub axis: Axis,
    /// Target world coordinate along `axis`.
    pub target: f64,

    lambda: f64,
}

impl AxisFix {
    pub fn new(alpha: f64, body: usize, r: DVec2, axis: Axis, target: f64) -> Self {
        Self {
            alpha,
            body,
            r,
            axis,
            target,
            lambda: 0.0,
        }
    }

    fn solve(&mut self, bodies: &mut [RigidBody], h: f64) {
        let k = self.alpha / (h * h);
        let n = self.axis.unit();

        let body = &bodies[self.body];
        let c = body.local_to_world(self.r).dot(n) - self.target;
        debug_assert!(c.is_finite(), "axis constraint degenerated");

        let arm = math::rotate_by_angle(self.r, body.theta);
        let cross_r = math::cross(arm, n);
        let w = 1.0 / body.mass + cross_r * cross_r / body.inertia;

        let lambda = -c / (w + k);

        let body = &mut bodies[self.body];
        body.pos += n * (w * lambda);
        body.theta += lambda * cross_r / body.inertia;

        self.lambda = lambda;
    }

    /// Current constraint value against `bodies`.
    pub fn evaluate(&self, bodies: &[RigidBody]) -> f64 {
        bodies[self.body].local_to_world(self.r).dot(self.axis.unit()) - self.target
    }
}
