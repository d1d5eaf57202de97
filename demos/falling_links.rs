use glam::DVec2;
use rand::Rng;
use rigid2d::body::RigidBody;
use rigid2d::constraint::Axis;
use rigid2d::system::PhysicsSystem;

fn main() {
    let mut rng = rand::thread_rng();

    // Configure the system
    let mut system = PhysicsSystem::builder()
        .damping(true)
        .damping_coefficient(0.8)
        .sub_steps(8)
        .build();

    // Build a chain of linked discs hanging from a pinned anchor
    let mut prev = None;
    for i in 0..12 {
        let jitter = rng.gen_range(-0.05..0.05);
        let pos = DVec2::new(4.0 + 0.5 * i as f64, 8.0 + jitter);
        let id = system.add_body(RigidBody::disc(pos, 0.2, 1.0).unwrap());

        if let Some(prev) = prev {
            system
                .add_link_joint(
                    1e-4,
                    prev,
                    id,
                    DVec2::new(0.1, 0.0),
                    DVec2::new(-0.1, 0.0),
                    None,
                )
                .unwrap();
        }
        prev = Some(id);
    }

    system
        .add_axis_joint(0.0, 0, DVec2::ZERO, Axis::X, None)
        .unwrap();
    system
        .add_axis_joint(0.0, 0, DVec2::ZERO, Axis::Y, None)
        .unwrap();

    // Run 10k simulation steps
    system.set_running(true);
    for step in 0..10_000 {
        system.step(1.0 / 120.0);

        if step % 1000 == 0 {
            let tip = system.bodies().last().unwrap();
            println!(
                "step {step:>5}: energy {:>10.4}, chain tip at ({:.3}, {:.3})",
                system.total_energy(),
                tip.pos.x,
                tip.pos.y
            );
        }
    }
}
