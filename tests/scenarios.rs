use glam::Vec2;
use impulse2d::*;

use std::collections::HashSet;

const DT: f32 = 1.0 / 60.0;

fn world() -> PhysicsWorld {
    PhysicsWorld::new(WorldConfig::default()).unwrap()
}

/// Static 40x2 ground whose top face sits at y = 11 (+y is down).
fn ground(w: &mut PhysicsWorld) -> BodyHandle {
    w.create_box(40.0, 2.0, Vec2::new(0.0, 12.0), true).unwrap()
}

#[test]
fn box_aabb_matches_creation_transform() {
    let mut w = world();
    let b = w.create_box(2.0, 2.0, Vec2::new(5.0, 5.0), false).unwrap();
    let aabb = w.body(b).unwrap().shape().aabb();
    assert!((aabb.center() - Vec2::new(5.0, 5.0)).length() < 1e-5);
    assert!((aabb.half_extents() - Vec2::ONE).length() < 1e-5);
}

#[test]
fn dropped_circle_bounces_then_settles() {
    let mut w = world();
    ground(&mut w);
    // Bottom of the circle starts 10 units above the ground's top face.
    let ball = w.create_circle(1.0, Vec2::new(0.0, 0.0), false).unwrap();

    let mut prev_vy = 0.0f32;
    let mut bounced = false;
    for _ in 0..120 {
        w.step();
        let vy = w.body(ball).unwrap().velocity.y;
        if prev_vy > 0.0 && vy < 0.0 {
            bounced = true;
        }
        prev_vy = vy;
    }
    assert!(bounced, "vertical velocity never reversed");
    let body = w.body(ball).unwrap();
    assert!(body.velocity.y.abs() * DT < 0.05, "vy = {}", body.velocity.y);
    // Resting on top of the ground, not sunk into it.
    assert!(body.position.y > 9.8 && body.position.y < 10.1, "y = {}", body.position.y);
}

#[test]
fn resting_circle_without_restitution_stays_within_slop() {
    let mut w = world();
    ground(&mut w);
    let material = Material { restitution: 0.0, ..Default::default() };
    let desc = BodyDesc::new(Shape::circle(1.0).unwrap(), Vec2::new(0.0, 10.0)).with_material(material);
    let ball = w.add(desc).unwrap();

    for _ in 0..120 {
        w.step();
    }
    let body = w.body(ball).unwrap();
    assert!(body.velocity.y.abs() < 0.01, "vy = {}", body.velocity.y);
    let slop = w.config().penetration_slop;
    for m in w.manifolds() {
        assert!(m.penetration <= slop + 0.01, "penetration = {}", m.penetration);
    }
}

#[test]
fn full_correction_leaves_circle_touching_box_corner() {
    let cfg = WorldConfig {
        gravity: Vec2::ZERO,
        penetration_slop: 0.0,
        correction_percent: 1.0,
        ..Default::default()
    };
    let mut w = PhysicsWorld::new(cfg).unwrap();
    w.create_box(2.0, 2.0, Vec2::ZERO, true).unwrap();
    let ball = w.create_circle(0.5, Vec2::new(1.3, 1.3), false).unwrap();
    w.step();
    let gap = (w.body(ball).unwrap().position - Vec2::ONE).length() - 0.5;
    assert!(gap.abs() < 1e-3, "gap from corner = {}", gap);
}

#[test]
fn box_settles_on_ground() {
    let mut w = world();
    ground(&mut w);
    let crate_box = w.create_box(2.0, 2.0, Vec2::new(0.0, 9.0), false).unwrap();
    for _ in 0..180 {
        w.step();
    }
    let body = w.body(crate_box).unwrap();
    assert!(body.velocity.length() < 0.1, "v = {:?}", body.velocity);
    assert!(body.orientation.abs() < 0.05, "angle = {}", body.orientation);
    assert!(body.position.y > 9.9 && body.position.y < 10.1, "y = {}", body.position.y);
    assert_eq!(w.manifolds().len(), 1);
}

#[test]
fn non_overlapping_bounds_never_collide() {
    let cfg = WorldConfig { cell_size: 100.0, gravity: Vec2::ZERO, ..Default::default() };
    let mut w = PhysicsWorld::new(cfg).unwrap();
    // Same grid cell, disjoint bounds.
    w.create_circle(1.0, Vec2::new(0.0, 0.0), false).unwrap();
    w.create_box(2.0, 2.0, Vec2::new(3.0, 0.0), false).unwrap();
    // Overlapping bounds, circle off the box corner: rejected by the exact test.
    w.create_box(2.0, 2.0, Vec2::new(20.0, 20.0), false).unwrap();
    w.create_circle(1.0, Vec2::new(21.8, 21.8), false).unwrap();
    w.step();
    assert_eq!(w.stats().unique_pairs, 6);
    assert!(w.manifolds().is_empty());
}

#[test]
fn each_pair_yields_at_most_one_manifold() {
    // Tiny cells so every overlapping pair shares many of them.
    let cfg = WorldConfig { cell_size: 0.25, ..Default::default() };
    let mut w = PhysicsWorld::new(cfg).unwrap();
    for i in 0..5 {
        for j in 0..5 {
            let p = Vec2::new(i as f32 * 1.5, j as f32 * 1.5);
            if (i + j) % 2 == 0 {
                w.create_circle(1.0, p, false).unwrap();
            } else {
                w.create_box(2.0, 2.0, p, false).unwrap();
            }
        }
    }
    w.step();
    let stats = w.stats();
    assert!(stats.candidate_pairs > stats.unique_pairs);
    assert!(!w.manifolds().is_empty());

    let mut seen = HashSet::new();
    for m in w.manifolds() {
        assert!(m.a.index < m.b.index);
        assert!(seen.insert((m.a, m.b)), "duplicate manifold for {:?}/{:?}", m.a, m.b);
    }
}

#[test]
fn static_bodies_never_move() {
    let mut w = world();
    let a = w.create_box(4.0, 4.0, Vec2::ZERO, true).unwrap();
    let b = w.create_circle(2.0, Vec2::new(1.0, 1.0), true).unwrap();
    for _ in 0..30 {
        w.step();
    }
    assert!(w.manifolds().is_empty());
    for h in [a, b] {
        let body = w.body(h).unwrap();
        assert_eq!(body.velocity, Vec2::ZERO);
        assert_eq!(body.angular_velocity, 0.0);
    }
    assert_eq!(w.body(a).unwrap().position, Vec2::ZERO);
    assert_eq!(w.body(b).unwrap().position, Vec2::new(1.0, 1.0));
}

fn pile() -> (PhysicsWorld, Vec<BodyHandle>) {
    let mut w = world();
    let mut handles = vec![ground(&mut w)];
    for i in 0..6 {
        let x = (i % 3) as f32 * 1.7 - 1.7;
        let y = 6.0 - (i / 3) as f32 * 2.1;
        let h = if i % 2 == 0 {
            w.create_circle(0.8, Vec2::new(x, y), false).unwrap()
        } else {
            w.create_polygon(
                &[Vec2::new(-0.8, -0.6), Vec2::new(0.9, -0.7), Vec2::new(0.7, 0.8), Vec2::new(-0.6, 0.7)],
                Vec2::new(x, y),
                false,
            )
            .unwrap()
        };
        handles.push(h);
    }
    (w, handles)
}

#[test]
fn removal_takes_effect_next_step_only() {
    let (mut w1, handles) = pile();
    let (mut w2, _) = pile();
    for _ in 0..40 {
        w1.step();
        w2.step();
    }
    let victim = handles[3];
    assert!(w2.remove(victim));

    // Marking changes nothing about the state produced by the last step.
    assert_eq!(w1.manifolds().len(), w2.manifolds().len());
    for &h in &handles {
        let (b1, b2) = (w1.body(h).unwrap(), w2.body(h).unwrap());
        assert_eq!(b1.position, b2.position);
        assert_eq!(b1.velocity, b2.velocity);
    }

    w1.step();
    w2.step();
    assert!(w2.body(victim).is_none());
    assert!(w1.body(victim).is_some());
    assert_eq!(w2.body_count() + 1, w1.body_count());
    assert!(w2.manifolds().iter().all(|m| m.a != victim && m.b != victim));
}

#[test]
fn stepping_is_deterministic() {
    let (mut w1, handles) = pile();
    let (mut w2, _) = pile();
    for _ in 0..90 {
        w1.step();
        w2.step();
    }
    for &h in &handles {
        let (b1, b2) = (w1.body(h).unwrap(), w2.body(h).unwrap());
        assert_eq!(b1.position, b2.position);
        assert_eq!(b1.orientation, b2.orientation);
    }
}

#[test]
fn rendering_view_lists_live_bodies() {
    let (mut w, handles) = pile();
    w.step();
    let seen: Vec<BodyHandle> = w.bodies().map(|(h, _)| h).collect();
    assert_eq!(seen.len(), handles.len());
    for h in handles {
        assert!(seen.contains(&h));
    }
}
