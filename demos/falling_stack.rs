use glam::Vec2;
use impulse2d::*;

fn lcg(seed: &mut u32) -> u32 {
    *seed = seed.wrapping_mul(1664525).wrapping_add(1013904223);
    *seed
}

fn main() -> Result<()> {
    env_logger::init();

    let mut world = PhysicsWorld::new(WorldConfig {
        cell_size: 2.0,
        enable_timing: true,
        ..Default::default()
    })?;

    // Ground plus two walls; +y is down.
    world.create_box(60.0, 2.0, Vec2::new(0.0, 30.0), true)?;
    world.create_box(2.0, 30.0, Vec2::new(-30.0, 15.0), true)?;
    world.create_box(2.0, 30.0, Vec2::new(30.0, 15.0), true)?;

    let mut seed = 7u32;
    let mut handles = Vec::new();
    for row in 0..10 {
        for col in 0..12 {
            let jitter = (lcg(&mut seed) as f32 / u32::MAX as f32) * 0.4 - 0.2;
            let pos = Vec2::new(col as f32 * 2.2 - 12.0 + jitter, row as f32 * -2.2 + 20.0);
            let h = if (row + col) % 3 == 0 {
                world.create_circle(0.8, pos, false)?
            } else {
                let desc = BodyDesc::new(Shape::rect(1.6, 1.2)?, pos).with_rotation(jitter);
                world.add(desc)?
            };
            handles.push(h);
        }
    }

    let frames = 600;
    for frame in 0..frames {
        world.step();
        if frame % 120 == 0 || frame == frames - 1 {
            let s = world.stats();
            if let Some(t) = world.timing() {
                println!(
                    "frame={} bodies={} pairs={}/{} manifolds={} contacts={} step={:.3}ms (broad={:.3}ms narrow={:.3}ms solve={:.3}ms)",
                    frame,
                    s.bodies,
                    s.unique_pairs,
                    s.candidate_pairs,
                    s.manifolds,
                    s.contacts,
                    t.step_ms,
                    t.broadphase_ms,
                    t.narrowphase_ms,
                    t.solve_ms
                );
            }
        }
        // Knock a body out halfway through.
        if frame == frames / 2 {
            if let Some(&h) = handles.first() {
                world.remove(h);
            }
        }
    }

    let (lowest, highest) = world
        .bodies()
        .filter(|(_, b)| !b.is_static())
        .fold((f32::MIN, f32::MAX), |(lo, hi), (_, b)| (lo.max(b.position.y), hi.min(b.position.y)));
    println!("settled: {} bodies, y in [{:.2}, {:.2}]", world.body_count(), highest, lowest);
    Ok(())
}
