//! Position-based 2D rigid body dynamics.
//!
//! Bodies are advanced with symplectic Euler under accumulated forces, then
//! bilateral constraints correct poses directly with compliant (XPBD-style)
//! Lagrange multipliers; velocities are re-derived from the net pose change
//! of each substep.
//!
//! # Example
//! ```rust
//! use glam::DVec2;
//! use rigid2d::body::RigidBody;
//! use rigid2d::system::PhysicsSystem;
//!
//! # fn main() -> rigid2d::error::SimResult<()> {
//! let mut system = PhysicsSystem::builder().damping(true).sub_steps(8).build();
//!
//! let a = system.add_body(RigidBody::disc(DVec2::new(4.0, 4.0), 0.5, 1.0)?);
//! let b = system.add_body(RigidBody::disc(DVec2::new(6.0, 4.0), 0.5, 1.0)?);
//! system.add_link_joint(0.0, a, b, DVec2::new(0.2, 0.2), DVec2::new(-0.2, 0.2), None)?;
//!
//! system.set_running(true);
//! for _ in 0..600 {
//!     system.step(1.0 / 120.0);
//! }
//! println!("system energy: {}", system.total_energy());
//! # Ok(())
//! # }
//! ```

pub mod body;
pub mod constraint;
pub mod error;
pub mod forces;
pub mod math;
pub mod system;
