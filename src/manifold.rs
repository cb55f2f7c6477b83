//! Contact manifold for one body pair and the sequential-impulse solver that
//! resolves it.
//!
//! A manifold lives for a single tick: `solve` fills it from the narrow phase,
//! `initialize` precomputes the per-contact effective masses, `apply_impulse`
//! runs once per solver pass, and `positional_correction` nudges the bodies
//! apart after velocities have been integrated. Accumulated impulses carry over
//! between the passes of one tick, never between ticks.

use glam::Vec2;

use crate::body::Rigidbody;
use crate::narrowphase::Narrowphase;
use crate::types::*;

/// One contact point plus its solver state.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ContactPoint {
    /// World-space contact position.
    pub position: Vec2,
    /// Total normal impulse applied so far this tick (≥ 0).
    pub normal_impulse: f32,
    /// Total friction impulse applied so far this tick.
    pub tangent_impulse: f32,
    ra: Vec2,
    rb: Vec2,
    normal_mass: f32,
    tangent_mass: f32,
    velocity_bias: f32,
}

/// Contact set between bodies `a` and `b` for the current tick.
#[derive(Clone, Debug)]
pub struct Manifold {
    pub a: BodyHandle,
    pub b: BodyHandle,
    /// Points from `a` to `b`.
    pub normal: Vec2,
    pub penetration: f32,
    contacts: [ContactPoint; 2],
    contact_count: usize,
    restitution: f32,
    static_friction: f32,
    dynamic_friction: f32,
}

impl Manifold {
    pub fn new(a: BodyHandle, b: BodyHandle) -> Self {
        Self {
            a,
            b,
            normal: Vec2::ZERO,
            penetration: 0.0,
            contacts: [ContactPoint::default(); 2],
            contact_count: 0,
            restitution: 0.0,
            static_friction: 0.0,
            dynamic_friction: 0.0,
        }
    }

    pub fn contacts(&self) -> &[ContactPoint] {
        &self.contacts[..self.contact_count]
    }

    pub fn contact_count(&self) -> usize {
        self.contact_count
    }

    /// Run the narrow phase for this pair. Returns whether any contact exists.
    pub fn solve(&mut self, a: &Rigidbody, b: &Rigidbody) -> bool {
        self.contact_count = 0;
        let Some(hit) = Narrowphase::collide(a.shape(), b.shape()) else {
            return false;
        };
        self.normal = hit.normal;
        self.penetration = hit.penetration;
        for (slot, &p) in self.contacts.iter_mut().zip(hit.points()) {
            *slot = ContactPoint { position: p, ..Default::default() };
        }
        self.contact_count = hit.points().len();
        self.contact_count > 0
    }

    /// Mix materials and precompute lever arms, effective masses and the
    /// restitution target for every contact. Call once per tick, after forces
    /// are integrated.
    pub fn initialize(&mut self, a: &Rigidbody, b: &Rigidbody, gravity: Vec2, dt: f32) {
        self.restitution = a.material.restitution.min(b.material.restitution);
        self.static_friction = (a.material.static_friction * b.material.static_friction).sqrt();
        self.dynamic_friction = (a.material.dynamic_friction * b.material.dynamic_friction).sqrt();

        let n = self.normal;
        let t = tangent_of(n);
        // Contacts slower than one tick of gravity are resting; they get no bounce.
        let resting_speed2 = (gravity * dt).length_squared() + EPSILON;

        for c in &mut self.contacts[..self.contact_count] {
            c.ra = c.position - a.position;
            c.rb = c.position - b.position;
            c.normal_mass = effective_mass(a, b, c.ra, c.rb, n);
            c.tangent_mass = effective_mass(a, b, c.ra, c.rb, t);
            c.normal_impulse = 0.0;
            c.tangent_impulse = 0.0;

            let rv = b.velocity_at(c.rb) - a.velocity_at(c.ra);
            let vn = rv.dot(n);
            c.velocity_bias = if rv.length_squared() < resting_speed2 || vn >= 0.0 {
                0.0
            } else {
                -self.restitution * vn
            };
        }
    }

    /// One solver pass over every contact.
    pub fn apply_impulse(&mut self, a: &mut Rigidbody, b: &mut Rigidbody) {
        if a.inv_mass() + b.inv_mass() == 0.0 {
            return;
        }
        let n = self.normal;
        let t = tangent_of(n);

        for c in &mut self.contacts[..self.contact_count] {
            let rv = b.velocity_at(c.rb) - a.velocity_at(c.ra);
            let vn = rv.dot(n);
            if vn >= 0.0 {
                continue;
            }

            // Normal impulse, accumulated total never pulls.
            let lambda = -(vn - c.velocity_bias) * c.normal_mass;
            let old = c.normal_impulse;
            c.normal_impulse = (old + lambda).max(0.0);
            let impulse = n * (c.normal_impulse - old);
            a.apply_impulse(-impulse, c.ra);
            b.apply_impulse(impulse, c.rb);

            // Coulomb friction against the updated normal impulse.
            let rv = b.velocity_at(c.rb) - a.velocity_at(c.ra);
            let lambda_t = -rv.dot(t) * c.tangent_mass;
            let old_t = c.tangent_impulse;
            let candidate = old_t + lambda_t;
            c.tangent_impulse = if candidate.abs() <= self.static_friction * c.normal_impulse {
                candidate
            } else {
                let max = self.dynamic_friction * c.normal_impulse;
                candidate.clamp(-max, max)
            };
            let friction = t * (c.tangent_impulse - old_t);
            a.apply_impulse(-friction, c.ra);
            b.apply_impulse(friction, c.rb);
        }
    }

    /// Push the bodies apart along the normal by `percent` of the penetration
    /// beyond `slop`, split by inverse mass.
    pub fn positional_correction(&self, a: &mut Rigidbody, b: &mut Rigidbody, slop: f32, percent: f32) {
        let inv_sum = a.inv_mass() + b.inv_mass();
        if inv_sum == 0.0 {
            return;
        }
        let correction = self.normal * ((self.penetration - slop).max(0.0) / inv_sum * percent);
        a.position -= correction * a.inv_mass();
        b.position += correction * b.inv_mass();
    }
}

fn tangent_of(n: Vec2) -> Vec2 {
    Vec2::new(n.y, -n.x)
}

fn effective_mass(a: &Rigidbody, b: &Rigidbody, ra: Vec2, rb: Vec2, dir: Vec2) -> f32 {
    let rn_a = ra.perp_dot(dir);
    let rn_b = rb.perp_dot(dir);
    let k = a.inv_mass() + b.inv_mass() + a.inv_inertia() * rn_a * rn_a + b.inv_inertia() * rn_b * rn_b;
    if k > 0.0 { 1.0 / k } else { 0.0 }
}
