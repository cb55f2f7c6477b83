use glam::Vec2;

use crate::error::{PhysicsError, Result};
use crate::shape::Shape;
use crate::types::*;

/// Everything needed to create a body through [`crate::PhysicsWorldApi::add`].
#[derive(Clone, Debug)]
pub struct BodyDesc {
    pub shape: Shape,
    pub position: Vec2,
    /// Initial orientation in radians.
    pub rotation: f32,
    pub density: f32,
    pub is_static: bool,
    pub material: Material,
    pub linear_damping: f32,
    pub angular_damping: f32,
}

impl BodyDesc {
    pub fn new(shape: Shape, position: Vec2) -> Self {
        Self {
            shape,
            position,
            rotation: 0.0,
            density: 1.0,
            is_static: false,
            material: Material::default(),
            linear_damping: 0.0,
            angular_damping: 0.0,
        }
    }

    pub fn with_rotation(mut self, radians: f32) -> Self {
        self.rotation = radians;
        self
    }

    pub fn with_density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    pub fn fixed(mut self) -> Self {
        self.is_static = true;
        self
    }
}

/// Dynamic state of one rigid body. Owns its collision shape.
#[derive(Clone, Debug)]
pub struct Rigidbody {
    pub position: Vec2,
    /// Orientation in radians.
    pub orientation: f32,
    pub velocity: Vec2,
    pub angular_velocity: f32,
    pub force: Vec2,
    pub torque: f32,
    pub material: Material,
    pub linear_damping: f32,
    pub angular_damping: f32,

    mass: f32,
    inv_mass: f32,
    inertia: f32,
    inv_inertia: f32,
    shape: Shape,
}

impl Rigidbody {
    /// Validate `desc` and build the body: bind the shape, derive mass from
    /// density, then apply the static flag.
    pub fn from_desc(desc: BodyDesc) -> Result<Self> {
        if !desc.position.is_finite() || !desc.rotation.is_finite() {
            return Err(PhysicsError::NonFinite("initial transform"));
        }
        let mut body = Self {
            position: desc.position,
            orientation: desc.rotation,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            force: Vec2::ZERO,
            torque: 0.0,
            material: desc.material,
            linear_damping: desc.linear_damping,
            angular_damping: desc.angular_damping,
            mass: 0.0,
            inv_mass: 0.0,
            inertia: 0.0,
            inv_inertia: 0.0,
            shape: desc.shape,
        };
        body.shape.initialize();
        body.compute_mass(desc.density)?;
        if desc.is_static {
            body.set_static();
        }
        body.sync_shape();
        Ok(body)
    }

    /// Recompute mass and inertia from the shape. Turns a static body dynamic.
    pub fn compute_mass(&mut self, density: f32) -> Result<()> {
        let data = self.shape.compute_mass(density)?;
        self.mass = data.mass;
        self.inv_mass = if data.mass > 0.0 { 1.0 / data.mass } else { 0.0 };
        self.inertia = data.inertia;
        self.inv_inertia = if data.inertia > 0.0 { 1.0 / data.inertia } else { 0.0 };
        self.sync_shape();
        Ok(())
    }

    /// Infinite mass and inertia; the body stops being integrated.
    pub fn set_static(&mut self) {
        self.mass = 0.0;
        self.inv_mass = 0.0;
        self.inertia = 0.0;
        self.inv_inertia = 0.0;
        self.velocity = Vec2::ZERO;
        self.angular_velocity = 0.0;
    }

    pub fn is_static(&self) -> bool {
        self.inv_mass == 0.0
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn inv_mass(&self) -> f32 {
        self.inv_mass
    }

    pub fn inertia(&self) -> f32 {
        self.inertia
    }

    pub fn inv_inertia(&self) -> f32 {
        self.inv_inertia
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub(crate) fn shape_mut(&mut self) -> &mut Shape {
        &mut self.shape
    }

    /// Accumulate a force for the next step. Cleared at the end of every step.
    pub fn apply_force(&mut self, force: Vec2) {
        self.force += force;
    }

    pub fn apply_torque(&mut self, torque: f32) {
        self.torque += torque;
    }

    /// Instant velocity change from an impulse applied at `contact` (relative
    /// to the centre of mass).
    pub fn apply_impulse(&mut self, impulse: Vec2, contact: Vec2) {
        self.velocity += self.inv_mass * impulse;
        self.angular_velocity += self.inv_inertia * contact.perp_dot(impulse);
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.sync_shape();
    }

    pub fn set_rotation(&mut self, radians: f32) {
        self.orientation = radians;
        self.sync_shape();
    }

    /// Velocity of a point at `r` from the centre of mass.
    pub fn velocity_at(&self, r: Vec2) -> Vec2 {
        self.velocity + r.perp() * self.angular_velocity
    }

    pub(crate) fn integrate_forces(&mut self, gravity: Vec2, dt: f32) {
        if self.is_static() {
            return;
        }
        self.velocity += (self.force * self.inv_mass + gravity) * dt;
        self.angular_velocity += self.torque * self.inv_inertia * dt;

        // Exact solution of dv/dt = -c v over one step.
        self.velocity *= (-self.linear_damping * dt).exp();
        self.angular_velocity *= (-self.angular_damping * dt).exp();
    }

    pub(crate) fn integrate_velocity(&mut self, dt: f32) {
        if self.is_static() {
            return;
        }
        self.position += self.velocity * dt;
        self.orientation += self.angular_velocity * dt;
    }

    pub(crate) fn clear_forces(&mut self) {
        self.force = Vec2::ZERO;
        self.torque = 0.0;
    }

    /// Push position and orientation into the shape and refresh its bounds.
    pub fn sync_shape(&mut self) {
        self.shape.set_position(self.position);
        self.shape.set_rotation(self.orientation);
        self.shape.compute_aabb();
    }
}
