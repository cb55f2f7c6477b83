use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{PhysicsError, Result};

/// Small tolerance shared by the narrow phase and the solver.
pub const EPSILON: f32 = 0.0001;

/// Gravity multiplier applied to 9.8 in the default config.
pub const GRAVITY_SCALE: f32 = 3.0;

/// Hard cap on convex polygon vertex count.
pub const MAX_POLYGON_VERTICES: usize = 64;

/// Generation-checked handle to a body stored in a [`crate::PhysicsWorld`].
///
/// Handles stay valid until the body is excised at the start of the step that
/// follows its removal; after that the slot may be reused with a new generation
/// and the old handle resolves to nothing.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyHandle {
    pub index: u32,
    pub generation: u32,
}

/// Axis-aligned bounding box (min/max corners).
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn from_center_half_extents(center: Vec2, half_extents: Vec2) -> Self {
        Self { min: center - half_extents, max: center + half_extents }
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    /// Touching boxes count as overlapping.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        if self.max.x < other.min.x || self.min.x > other.max.x {
            return false;
        }
        if self.max.y < other.min.y || self.min.y > other.max.y {
            return false;
        }
        true
    }
}

/// Surface coefficients used when mixing two bodies at a contact.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub restitution: f32,
    pub static_friction: f32,
    pub dynamic_friction: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self { restitution: 0.2, static_friction: 0.4, dynamic_friction: 0.2 }
    }
}

/// Mass properties derived from a shape and a density.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct MassData {
    pub mass: f32,
    pub inertia: f32,
    /// Centroid in the shape's local frame before re-centring.
    pub centroid: Vec2,
}

/// Narrow-phase result for one shape pair.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Collision {
    /// Unit normal pointing from shape A towards shape B.
    pub normal: Vec2,
    /// Penetration depth (≥ 0).
    pub penetration: f32,
    points: [Vec2; 2],
    count: usize,
}

impl Collision {
    pub fn single(normal: Vec2, penetration: f32, point: Vec2) -> Self {
        Self { normal, penetration, points: [point, Vec2::ZERO], count: 1 }
    }

    pub fn pair(normal: Vec2, penetration: f32, p0: Vec2, p1: Vec2) -> Self {
        Self { normal, penetration, points: [p0, p1], count: 2 }
    }

    /// World-space contact points (one or two).
    pub fn points(&self) -> &[Vec2] {
        &self.points[..self.count]
    }

    /// Same contact seen from the other shape.
    pub fn flipped(mut self) -> Self {
        self.normal = -self.normal;
        self
    }
}

/// World-level configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Fixed tick duration used by `step()`.
    pub dt: f32,
    /// Impulse passes per tick.
    pub iterations: u32,
    /// Screen space: +y points down.
    pub gravity: Vec2,
    /// Broad-phase grid cell size in world units. Should be a bit larger than a
    /// typical body.
    pub cell_size: f32,
    /// Penetration tolerated before positional correction kicks in.
    pub penetration_slop: f32,
    /// Fraction of the remaining penetration removed per tick.
    pub correction_percent: f32,
    /// Enable per-phase timing (adds small overhead when true).
    pub enable_timing: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            dt: 1.0 / 60.0,
            iterations: 20,
            gravity: Vec2::new(0.0, 9.8 * GRAVITY_SCALE),
            cell_size: 4.0,
            penetration_slop: 0.05,
            correction_percent: 0.4,
            enable_timing: false,
        }
    }
}

impl WorldConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(PhysicsError::InvalidConfig("dt must be positive and finite"));
        }
        if self.iterations == 0 {
            return Err(PhysicsError::InvalidConfig("iterations must be at least 1"));
        }
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(PhysicsError::InvalidConfig("cell_size must be positive and finite"));
        }
        if !self.gravity.is_finite() {
            return Err(PhysicsError::InvalidConfig("gravity must be finite"));
        }
        if self.penetration_slop < 0.0 || !(0.0..=1.0).contains(&self.correction_percent) {
            return Err(PhysicsError::InvalidConfig("correction terms out of range"));
        }
        Ok(())
    }
}

/// Debug/performance statistics for the last completed step.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct WorldStats {
    pub bodies: usize,
    /// Bodies excised at the start of this step.
    pub excised: usize,
    pub cells: usize,
    /// Sum of per-cell pair counts (n*(n-1)/2), counts duplicates across cells.
    pub candidate_pairs: usize,
    /// Unique pairs encountered when deduplicated across cells.
    pub unique_pairs: usize,
    pub manifolds: usize,
    pub contacts: usize,
}

/// Timing breakdown for the last completed step.
#[derive(Copy, Clone, Debug, Default)]
pub struct WorldTiming {
    pub step_ms: f64,
    pub broadphase_ms: f64,
    pub narrowphase_ms: f64,
    pub solve_ms: f64,
}
