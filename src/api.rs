use glam::{Mat2, Vec2};

use crate::body::{BodyDesc, Rigidbody};
use crate::error::Result;
use crate::manifold::Manifold;
use crate::shape::Polygon;
use crate::types::*;

/// Public API contract for the simulation world.
pub trait PhysicsWorldApi {
    /// Construct a new world. Fails if the config is unusable.
    fn new(cfg: WorldConfig) -> Result<Self>
    where
        Self: Sized;

    // --- Stepping ----------------------------------------------------------

    /// Advance one tick of `cfg.dt`.
    fn step(&mut self);

    /// Advance one tick of an explicit duration.
    fn step_dt(&mut self, dt: f32);

    // --- Bodies ------------------------------------------------------------

    /// Validate and insert a body. It takes part from the next step on.
    fn add(&mut self, desc: BodyDesc) -> Result<BodyHandle>;

    /// Convenience: circle with density 1.
    fn create_circle(&mut self, radius: f32, position: Vec2, is_static: bool) -> Result<BodyHandle>;

    /// Convenience: convex hull of `vertices` with density 1. The hull is
    /// re-centred on its centroid and the centroid lands on `position`.
    fn create_polygon(&mut self, vertices: &[Vec2], position: Vec2, is_static: bool) -> Result<BodyHandle>;

    /// Convenience: axis-aligned box of full `width` x `height` with density 1.
    fn create_box(&mut self, width: f32, height: f32, position: Vec2, is_static: bool) -> Result<BodyHandle>;

    /// Mark a body for removal at the start of the next step. Returns `false`
    /// for unknown, stale or already-pending handles.
    fn remove(&mut self, handle: BodyHandle) -> bool;

    /// Drop every body, pending removal and manifold right away.
    fn clear(&mut self);

    fn body(&self, handle: BodyHandle) -> Option<&Rigidbody>;

    fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Rigidbody>;

    /// Read-only view of every live body, in slot order.
    fn bodies(&self) -> Box<dyn Iterator<Item = (BodyHandle, &Rigidbody)> + '_>;

    /// Contacts kept by the last step.
    fn manifolds(&self) -> &[Manifold];
}

/// Narrow-phase primitive signatures. Normals point from the first argument to
/// the second.
pub trait NarrowphaseApi {
    fn circle_circle(ca: Vec2, ra: f32, cb: Vec2, rb: f32) -> Option<Collision>;

    fn circle_polygon(center: Vec2, radius: f32, poly: &Polygon, pos: Vec2, rot: Mat2) -> Option<Collision>;

    fn polygon_circle(poly: &Polygon, pos: Vec2, rot: Mat2, center: Vec2, radius: f32) -> Option<Collision>;

    fn polygon_polygon(
        pa: &Polygon,
        pos_a: Vec2,
        rot_a: Mat2,
        pb: &Polygon,
        pos_b: Vec2,
        rot_b: Mat2,
    ) -> Option<Collision>;
}

