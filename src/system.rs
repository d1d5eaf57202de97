//! The physics system: owns all bodies, force generators and constraints and
//! drives the fixed-substep simulation loop.
//!
//! Per substep the phases run strictly in order: force generators accumulate,
//! the integrator advances velocity then position (symplectic Euler), poses
//! are corrected by the constraints, and velocities are re-derived from the
//! net pose change. Constraints are solved once per substep in insertion
//! order, so later constraints see earlier corrections (Gauss-Seidel); this
//! sequential sharing is load-bearing for convergence.

use glam::DVec2;
use tracing::debug;

use crate::body::{Geometry, RigidBody};
use crate::constraint::{Axis, AxisFix, Constraint, OffsetLink};
use crate::error::{SimError, SimResult};
use crate::forces::{ForceGenerator, MouseSpring};
use crate::math;

/// Live-tunable simulation parameters.
///
/// Read every step, never cached, so external UI can adjust them while the
/// simulation runs.
#[derive(Clone, Debug)]
pub struct Tunables {
    /// Gravitational acceleration, straight down.
    pub gravity: f64,
    /// Linear damping coefficient; a tenth of it damps angular velocity.
    pub damping: f64,
    /// Stiffness for springs without an explicit per-joint value, and for
    /// the pointer spring.
    pub spring_stiffness: f64,
    sub_steps: u32,
}

impl Tunables {
    /// Number of substeps a frame's `dt` is divided into.
    pub fn sub_steps(&self) -> u32 {
        self.sub_steps
    }

    /// Sets the substep count; must be at least 1.
    pub fn set_sub_steps(&mut self, sub_steps: u32) -> SimResult<()> {
        if sub_steps == 0 {
            return Err(SimError::InvalidSubstepCount);
        }
        self.sub_steps = sub_steps;
        Ok(())
    }
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            gravity: 9.82,
            damping: 0.5,
            spring_stiffness: 100.0,
            sub_steps: 5,
        }
    }
}

/// Owns the scene and advances it.
///
/// Starts paused; nothing moves until [`set_running`](Self::set_running)
/// flips the state.
#[derive(Clone, Debug)]
pub struct PhysicsSystem {
    bodies: Vec<RigidBody>,
    generators: Vec<ForceGenerator>,
    constraints: Vec<Constraint>,
    tunables: Tunables,
    running: bool,
    /// Generators reinstalled on reset.
    base_generators: Vec<ForceGenerator>,
    /// Substep size of the most recent step, for force recovery.
    last_sub_dt: f64,
}

impl PhysicsSystem {
    pub fn builder() -> PhysicsSystemBuilder {
        PhysicsSystemBuilder::default()
    }

    /// Adds a body and returns its stable index.
    pub fn add_body(&mut self, body: RigidBody) -> usize {
        self.bodies.push(body);
        let index = self.bodies.len() - 1;
        debug!(index, "added rigid body");
        index
    }

    /// Adds a force generator.
    pub fn add_generator(&mut self, generator: ForceGenerator) {
        self.generators.push(generator);
    }

    /// Adds a two-body distance link between local offsets `r_a` and `r_b`.
    ///
    /// `rest_length` of `None` measures the offset-point distance of the
    /// current poses at creation time. Degenerate geometry (coincident
    /// attachment points) is rejected here rather than guarded per solve.
    pub fn add_link_joint(
        &mut self,
        alpha: f64,
        body_a: usize,
        body_b: usize,
        r_a: DVec2,
        r_b: DVec2,
        rest_length: Option<f64>,
    ) -> SimResult<usize> {
        check_compliance(alpha)?;
        self.check_body_index(body_a)?;
        self.check_body_index(body_b)?;

        let world_a = self.bodies[body_a].local_to_world(r_a);
        let world_b = self.bodies[body_b].local_to_world(r_b);
        let current = world_a.distance(world_b);
        if current < math::GEOMETRY_EPSILON {
            return Err(SimError::DegenerateConstraint);
        }

        let rest_length = match rest_length {
            Some(rest) if !rest.is_finite() || rest <= 0.0 => {
                return Err(SimError::InvalidRestLength(rest))
            }
            Some(rest) => rest,
            None => current,
        };

        self.constraints.push(Constraint::OffsetLink(OffsetLink::new(
            alpha,
            body_a,
            body_b,
            r_a,
            r_b,
            rest_length,
        )));
        let index = self.constraints.len() - 1;
        debug!(index, body_a, body_b, rest_length, "added link joint");
        Ok(index)
    }

    /// Adds a prismatic joint pinning one world coordinate of the offset
    /// point `r` on `body`.
    ///
    /// A `target` of `None` pins the coordinate where it currently is.
    pub fn add_axis_joint(
        &mut self,
        alpha: f64,
        body: usize,
        r: DVec2,
        axis: Axis,
        target: Option<f64>,
    ) -> SimResult<usize> {
        check_compliance(alpha)?;
        self.check_body_index(body)?;

        let target =
            target.unwrap_or_else(|| self.bodies[body].local_to_world(r).dot(axis.unit()));

        self.constraints
            .push(Constraint::AxisFix(AxisFix::new(alpha, body, r, axis, target)));
        let index = self.constraints.len() - 1;
        debug!(index, body, target, "added axis joint");
        Ok(index)
    }

    /// Advances the simulation by `dt`, split into the configured substeps.
    ///
    /// Does nothing while paused.
    pub fn step(&mut self, dt: f64) {
        if !self.running || dt <= 0.0 {
            return;
        }

        let sub_steps = self.tunables.sub_steps;
        let h = dt / f64::from(sub_steps);
        self.last_sub_dt = h;

        for _ in 0..sub_steps {
            for generator in &self.generators {
                generator.apply(&mut self.bodies, &self.tunables);
            }

            for body in &mut self.bodies {
                body.prev_pos = body.pos;
                body.prev_theta = body.theta;

                body.vel += body.force * (h / body.mass);
                body.pos += body.vel * h;
                body.force = DVec2::ZERO;

                body.omega += body.tau / body.inertia * h;
                body.theta += body.omega * h;
                body.tau = 0.0;
            }

            // Positional ground clamp for discs; intentionally not a contact
            // response, velocity is left to the derivation below.
            for body in &mut self.bodies {
                if let Geometry::Disc { radius } = body.geometry {
                    if body.pos.y < radius {
                        body.pos.y = radius;
                    }
                }
            }

            for constraint in &mut self.constraints {
                constraint.solve(&mut self.bodies, h);
            }

            for body in &mut self.bodies {
                body.vel = (body.pos - body.prev_pos) / h;
                body.omega = (body.theta - body.prev_theta) / h;
            }
        }
    }

    /// Sum of body kinetic energy and generator potential energy.
    ///
    /// A diagnostic only; never feeds back into the solver.
    pub fn total_energy(&self) -> f64 {
        let kinetic: f64 = self.bodies.iter().map(RigidBody::kinetic_energy).sum();
        let potential: f64 = self
            .generators
            .iter()
            .map(|g| g.potential_energy(&self.bodies, &self.tunables))
            .sum();
        kinetic + potential
    }

    pub fn bodies(&self) -> &[RigidBody] {
        &self.bodies
    }

    pub fn body(&self, index: usize) -> Option<&RigidBody> {
        self.bodies.get(index)
    }

    pub fn body_mut(&mut self, index: usize) -> Option<&mut RigidBody> {
        self.bodies.get_mut(index)
    }

    /// First body (in insertion order) whose bounding region contains `point`.
    pub fn body_containing_point(&self, point: DVec2) -> Option<usize> {
        self.bodies
            .iter()
            .position(|body| body.bounding_box().contains(point))
    }

    /// Force the constraint applied during the last solve, for diagnostics.
    pub fn constraint_force(&self, index: usize) -> Option<DVec2> {
        self.constraints
            .get(index)
            .map(|constraint| constraint.force(self.last_sub_dt))
    }

    pub fn tunables(&self) -> &Tunables {
        &self.tunables
    }

    pub fn tunables_mut(&mut self) -> &mut Tunables {
        &mut self.tunables
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Switches between running and paused. While paused, forces and
    /// constraints are skipped entirely.
    pub fn set_running(&mut self, running: bool) {
        if self.running != running {
            debug!(running, "run state changed");
        }
        self.running = running;
    }

    pub fn toggle_running(&mut self) {
        self.set_running(!self.running);
    }

    /// Clears the scene and reinstalls the builder's default generators.
    /// The system comes back paused.
    pub fn reset(&mut self) {
        self.bodies.clear();
        self.constraints.clear();
        self.generators = self.base_generators.clone();
        self.running = false;
        debug!("scene reset");
    }

    /// Grabs the body under `point` with the pointer spring, if the system
    /// has one and a body is hit. Returns the grabbed body index.
    pub fn grab_body(&mut self, point: DVec2) -> Option<usize> {
        let index = self.body_containing_point(point)?;
        let local = self.bodies[index].world_to_local(point);

        let mouse = self.mouse_spring_mut()?;
        mouse.grab(index, local, point);
        debug!(index, "grabbed body");
        Some(index)
    }

    /// Moves the pointer-spring target while a body is grabbed.
    pub fn drag_to(&mut self, point: DVec2) {
        if let Some(mouse) = self.mouse_spring_mut() {
            if mouse.is_active() {
                mouse.set_target(point);
            }
        }
    }

    /// Releases the pointer spring.
    pub fn release_grab(&mut self) {
        if let Some(mouse) = self.mouse_spring_mut() {
            mouse.release();
        }
    }

    fn mouse_spring_mut(&mut self) -> Option<&mut MouseSpring> {
        self.generators.iter_mut().find_map(|g| match g {
            ForceGenerator::MouseSpring(mouse) => Some(mouse),
            _ => None,
        })
    }

    fn check_body_index(&self, index: usize) -> SimResult<()> {
        if index >= self.bodies.len() {
            return Err(SimError::BodyIndexOutOfRange {
                index,
                len: self.bodies.len(),
            });
        }
        Ok(())
    }
}

fn check_compliance(alpha: f64) -> SimResult<()> {
    if !alpha.is_finite() || alpha < 0.0 {
        return Err(SimError::NegativeCompliance(alpha));
    }
    Ok(())
}

/// Builder for `PhysicsSystem`.
pub struct PhysicsSystemBuilder {
    gravity: bool,
    damping: bool,
    mouse_spring: bool,
    tunables: Tunables,
}

impl PhysicsSystemBuilder {
    /// Get an instance of `PhysicsSystemBuilder` with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// If a gravity generator should be installed
    pub fn gravity(mut self, gravity: bool) -> Self {
        self.gravity = gravity;
        self
    }

    /// If an energy damping generator should be installed
    pub fn damping(mut self, damping: bool) -> Self {
        self.damping = damping;
        self
    }

    /// If a pointer-driven spring should be installed for picking and dragging
    pub fn mouse_spring(mut self, mouse_spring: bool) -> Self {
        self.mouse_spring = mouse_spring;
        self
    }

    /// Gravitational acceleration magnitude
    pub fn gravity_force(mut self, gravity_force: f64) -> Self {
        self.tunables.gravity = gravity_force;
        self
    }

    /// Linear damping coefficient.
    /// `0.0` -> no dissipation.
    /// A tenth of it is applied to angular velocity.
    pub fn damping_coefficient(mut self, damping_coefficient: f64) -> Self {
        self.tunables.damping = damping_coefficient;
        self
    }

    /// Fallback stiffness for springs and the pointer spring
    pub fn spring_stiffness(mut self, spring_stiffness: f64) -> Self {
        self.tunables.spring_stiffness = spring_stiffness;
        self
    }

    /// How many substeps a frame's `dt` is divided into.
    /// Smaller substeps improve constraint stiffness for a given compliance.
    /// Clamped to at least 1.
    pub fn sub_steps(mut self, sub_steps: u32) -> Self {
        self.tunables.sub_steps = sub_steps.max(1);
        self
    }

    /// Constructs an instance of `PhysicsSystem`
    pub fn build(self) -> PhysicsSystem {
        let mut generators = Vec::new();
        if self.gravity {
            generators.push(ForceGenerator::Gravity);
        }
        if self.damping {
            generators.push(ForceGenerator::EnergyDamping);
        }
        if self.mouse_spring {
            generators.push(ForceGenerator::MouseSpring(MouseSpring::new()));
        }

        let last_sub_dt = (1.0 / 120.0) / f64::from(self.tunables.sub_steps);

        PhysicsSystem {
            bodies: Vec::new(),
            base_generators: generators.clone(),
            generators,
            constraints: Vec::new(),
            tunables: self.tunables,
            running: false,
            last_sub_dt,
        }
    }
}

impl Default for PhysicsSystemBuilder {
    /// Get an instance of `PhysicsSystemBuilder` with default values
    fn default() -> Self {
        Self {
            gravity: true,
            damping: false,
            mouse_spring: false,
            tunables: Tunables::default(),
        }
    }
}
